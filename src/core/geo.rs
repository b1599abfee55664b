//! Purpose: Convert wire-level geometry and style primitives to engine-native types and back.
//! Exports: `Coordinate`, `Argb`, `Rgba`, `MapPoint`, `MapSize`, `MapRect`, `EdgePadding`,
//! `ScreenPoint`, `coordinate_from_value`, `coordinate_json`, `WORLD_SIZE`.
//! Role: Stateless codec between `{lat, lon}` / packed ARGB values and engine geometry.
//! Invariants: Coordinates are never clamped or validated; out-of-range values pass through.
//! Invariants: ARGB decoding treats the high byte as alpha.

use serde_json::{Map, Value, json};

/// Width and height of the projected world in map points (2^28).
pub const WORLD_SIZE: f64 = 268_435_456.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite and inside the geographic range.
    pub fn is_in_range(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Parse a `{lat, lon}` object. Returns `None` when the shape is wrong.
pub fn coordinate_from_value(value: &Value) -> Option<Coordinate> {
    let object = value.as_object()?;
    let latitude = object.get("lat")?.as_f64()?;
    let longitude = object.get("lon")?.as_f64()?;
    Some(Coordinate::new(latitude, longitude))
}

pub fn coordinate_json(coordinate: Coordinate) -> Value {
    json!({
        "lat": coordinate.latitude,
        "lon": coordinate.longitude,
    })
}

pub(crate) fn coordinate_map(coordinate: Coordinate) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("lat".to_string(), json!(coordinate.latitude));
    map.insert("lon".to_string(), json!(coordinate.longitude));
    map
}

/// Packed 32-bit color, alpha in the most significant byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Argb(pub u32);

impl Argb {
    /// Accepts unsigned 32-bit integers and their signed 32-bit reinterpretation.
    pub fn from_value(value: &Value) -> Option<Self> {
        if let Some(unsigned) = value.as_u64() {
            return u32::try_from(unsigned).ok().map(Argb);
        }
        let signed = value.as_i64()?;
        i32::try_from(signed).ok().map(|signed| Argb(signed as u32))
    }

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn blue(self) -> u8 {
        self.0 as u8
    }

    pub fn to_rgba(self) -> Rgba {
        Rgba {
            red: f64::from(self.red()) / 255.0,
            green: f64::from(self.green()) / 255.0,
            blue: f64::from(self.blue()) / 255.0,
            alpha: f64::from(self.alpha()) / 255.0,
        }
    }
}

/// Engine-native color with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Rgba {
    pub fn to_argb(self) -> Argb {
        let channel =
            |component: f64| -> u32 { (component.clamp(0.0, 1.0) * 255.0).round() as u32 };
        Argb(
            channel(self.alpha) << 24
                | channel(self.red) << 16
                | channel(self.green) << 8
                | channel(self.blue),
        )
    }
}

/// Web-Mercator projected point; origin at the north-west corner of the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    pub fn from_coordinate(coordinate: Coordinate) -> Self {
        let x = (coordinate.longitude + 180.0) / 360.0 * WORLD_SIZE;
        let lat = coordinate.latitude.to_radians();
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0
            * WORLD_SIZE;
        Self { x, y }
    }

    pub fn to_coordinate(self) -> Coordinate {
        let longitude = self.x / WORLD_SIZE * 360.0 - 180.0;
        let n = std::f64::consts::PI * (1.0 - 2.0 * self.y / WORLD_SIZE);
        let latitude = n.sinh().atan().to_degrees();
        Coordinate::new(latitude, longitude)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapRect {
    pub origin: MapPoint,
    pub size: MapSize,
}

impl MapRect {
    /// Smallest rect containing both points, regardless of which corner each one is.
    pub fn spanning(a: MapPoint, b: MapPoint) -> Self {
        Self {
            origin: MapPoint {
                x: a.x.min(b.x),
                y: a.y.min(b.y),
            },
            size: MapSize {
                width: (a.x - b.x).abs(),
                height: (a.y - b.y).abs(),
            },
        }
    }

    pub fn center(&self) -> MapPoint {
        MapPoint {
            x: self.origin.x + self.size.width / 2.0,
            y: self.origin.y + self.size.height / 2.0,
        }
    }

    pub fn max_point(&self) -> MapPoint {
        MapPoint {
            x: self.origin.x + self.size.width,
            y: self.origin.y + self.size.height,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgePadding {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl EdgePadding {
    pub fn uniform(padding: f64) -> Self {
        Self {
            top: padding,
            left: padding,
            bottom: padding,
            right: padding,
        }
    }
}

/// Point in the map view's own coordinate space, in view units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn coordinate_parses_numeric_lat_lon() {
        let coordinate = coordinate_from_value(&json!({"lat": 1, "lon": 2.5})).expect("coord");
        assert_eq!(coordinate, Coordinate::new(1.0, 2.5));
    }

    #[test]
    fn coordinate_rejects_wrong_shape() {
        assert!(coordinate_from_value(&json!({"lat": "1", "lon": 2})).is_none());
        assert!(coordinate_from_value(&json!({"lat": 1})).is_none());
        assert!(coordinate_from_value(&json!([1, 2])).is_none());
    }

    #[test]
    fn out_of_range_coordinates_pass_through() {
        let coordinate = coordinate_from_value(&json!({"lat": 120.0, "lon": -400.0})).expect("coord");
        assert_eq!(coordinate.latitude, 120.0);
        assert!(!coordinate.is_in_range());
    }

    #[test]
    fn argb_decodes_alpha_from_high_byte() {
        let color = Argb(0x331E_88E5);
        assert_eq!(color.alpha(), 0x33);
        assert_eq!(color.red(), 0x1E);
        assert_eq!(color.green(), 0x88);
        assert_eq!(color.blue(), 0xE5);
        let rgba = color.to_rgba();
        assert!(close(rgba.alpha, 51.0 / 255.0));
        assert!(close(rgba.blue, 229.0 / 255.0));
        assert_eq!(rgba.to_argb(), color);
    }

    #[test]
    fn argb_accepts_signed_representation() {
        assert_eq!(Argb::from_value(&json!(-1)), Some(Argb(0xFFFF_FFFF)));
        assert_eq!(Argb::from_value(&json!(0xFF43_A047u32)), Some(Argb(0xFF43_A047)));
        assert_eq!(Argb::from_value(&json!(0x1_0000_0000u64)), None);
        assert_eq!(Argb::from_value(&json!(1.5)), None);
    }

    #[test]
    fn projection_origin_is_world_center() {
        let point = MapPoint::from_coordinate(Coordinate::new(0.0, 0.0));
        assert!(close(point.x, WORLD_SIZE / 2.0));
        assert!((point.y - WORLD_SIZE / 2.0).abs() < 1e-6);
    }

    #[test]
    fn projection_inverts() {
        let coordinate = Coordinate::new(47.6, -122.3);
        let back = MapPoint::from_coordinate(coordinate).to_coordinate();
        assert!((back.latitude - coordinate.latitude).abs() < 1e-9);
        assert!((back.longitude - coordinate.longitude).abs() < 1e-9);
    }

    #[test]
    fn spanning_rect_ignores_corner_order() {
        let a = MapPoint { x: 10.0, y: 40.0 };
        let b = MapPoint { x: 30.0, y: 5.0 };
        let rect = MapRect::spanning(a, b);
        assert_eq!(rect, MapRect::spanning(b, a));
        assert_eq!(rect.origin, MapPoint { x: 10.0, y: 5.0 });
        assert_eq!(rect.size, MapSize { width: 20.0, height: 35.0 });
    }
}
