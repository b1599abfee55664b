//! Purpose: Resolve camera argument bundles into one concrete camera update.
//! Exports: `CameraSpec`, `CameraUpdate`, `Region`, `CoordinateSpan`, `Perspective`, `BoundsFit`,
//! `CameraSnapshot`, `resolve`, `fit_bounds`.
//! Role: Pure policy; applying the update is the engine's job.
//! Invariants: Altitude wins over spans; spans apply only when both are present.
//! Invariants: Bounds fitting is independent of corner order and of any stored camera.

use serde_json::{Map, Value, json};

use super::geo::{
    Coordinate, EdgePadding, MapPoint, MapRect, coordinate_from_value, coordinate_json,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSpec {
    pub target: Coordinate,
    pub altitude: Option<f64>,
    pub heading: Option<f64>,
    pub pitch: Option<f64>,
    pub lat_delta: Option<f64>,
    pub lon_delta: Option<f64>,
}

impl CameraSpec {
    pub fn at(target: Coordinate) -> Self {
        Self {
            target,
            altitude: None,
            heading: None,
            pitch: None,
            lat_delta: None,
            lon_delta: None,
        }
    }

    /// Parse `{target: {lat, lon}, altitude?, heading?, pitch?, latDelta?, lonDelta?}`.
    pub fn from_value(value: &Value) -> Result<Self, &'static str> {
        let object = value.as_object().ok_or("camera must be an object")?;
        let target = object
            .get("target")
            .and_then(coordinate_from_value)
            .ok_or("camera requires `target` with numeric `lat`/`lon`")?;
        Ok(Self {
            target,
            altitude: optional_number(object, "altitude"),
            heading: optional_number(object, "heading"),
            pitch: optional_number(object, "pitch"),
            lat_delta: optional_number(object, "latDelta"),
            lon_delta: optional_number(object, "lonDelta"),
        })
    }
}

/// Non-numeric values are ignored so the field falls back to its default.
fn optional_number(object: &Map<String, Value>, key: &str) -> Option<f64> {
    match object.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let number = value.as_f64();
            if number.is_none() {
                tracing::debug!(key, "ignoring non-numeric camera field");
            }
            number
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateSpan {
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl CoordinateSpan {
    pub fn square(delta: f64) -> Self {
        Self {
            latitude_delta: delta,
            longitude_delta: delta,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    pub center: Coordinate,
    pub span: CoordinateSpan,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Perspective {
    pub center: Coordinate,
    pub altitude: f64,
    pub heading: f64,
    pub pitch: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundsFit {
    pub rect: MapRect,
    pub padding: EdgePadding,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraUpdate {
    Region(Region),
    Perspective(Perspective),
    Fit(BoundsFit),
}

pub fn resolve(spec: &CameraSpec, default_span_degrees: f64) -> CameraUpdate {
    if let Some(altitude) = spec.altitude {
        return CameraUpdate::Perspective(Perspective {
            center: spec.target,
            altitude,
            heading: spec.heading.unwrap_or(0.0),
            pitch: spec.pitch.unwrap_or(0.0),
        });
    }
    let span = match (spec.lat_delta, spec.lon_delta) {
        (Some(latitude_delta), Some(longitude_delta)) => CoordinateSpan {
            latitude_delta,
            longitude_delta,
        },
        _ => CoordinateSpan::square(default_span_degrees),
    };
    CameraUpdate::Region(Region {
        center: spec.target,
        span,
    })
}

pub fn fit_bounds(north_east: Coordinate, south_west: Coordinate, padding: f64) -> BoundsFit {
    let rect = MapRect::spanning(
        MapPoint::from_coordinate(north_east),
        MapPoint::from_coordinate(south_west),
    );
    BoundsFit {
        rect,
        padding: EdgePadding::uniform(padding),
    }
}

/// Settled camera as reported in `regionChanged`: region and perspective together.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSnapshot {
    pub center: Coordinate,
    pub span: CoordinateSpan,
    pub altitude: f64,
    pub pitch: f64,
    pub heading: f64,
}

impl CameraSnapshot {
    pub fn to_json(&self) -> Value {
        json!({
            "target": coordinate_json(self.center),
            "latDelta": self.span.latitude_delta,
            "lonDelta": self.span.longitude_delta,
            "altitude": self.altitude,
            "pitch": self.pitch,
            "heading": self.heading,
        })
    }
}
