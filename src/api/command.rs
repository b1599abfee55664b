//! Purpose: Parse `(commandName, args)` into a strongly typed command, once, at the boundary.
//! Exports: `Command`, `MapType`, `SetCamera`, `FitBounds`, `AddAnnotation`, `AddPolyline`,
//! `AddPolygon`, `AddCircle`, `COMMAND_NAMES`.
//! Role: Validation layer in front of the dispatcher; nothing past here re-inspects JSON.
//! Invariants: Unknown names fail with `UnsupportedCommand` before args are looked at.
//! Invariants: Missing or wrong-typed required arguments fail with `InvalidArguments(name)`.
//! Invariants: Wrong-typed optional arguments are ignored and the default applies.
//! Invariants: Optional fields that are `null` are treated as absent.

use serde_json::{Map, Value};
use tracing::debug;

use crate::core::camera::CameraSpec;
use crate::core::error::Error;
use crate::core::geo::{Argb, Coordinate, coordinate_from_value};

pub const COMMAND_NAMES: &[&str] = &[
    "setCamera",
    "fitBounds",
    "setMapType",
    "addAnnotation",
    "removeAnnotation",
    "addPolyline",
    "addPolygon",
    "addCircle",
    "removeOverlay",
    "clearOverlays",
    "showsUserLocation",
];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MapType {
    Standard,
    Satellite,
    Hybrid,
}

impl MapType {
    /// Codes other than 1 and 2 select the standard map.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => MapType::Satellite,
            2 => MapType::Hybrid,
            _ => MapType::Standard,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SetCamera {
    pub camera: CameraSpec,
    pub animated: Option<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FitBounds {
    pub north_east: Coordinate,
    pub south_west: Coordinate,
    pub padding: Option<f64>,
    pub animated: Option<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AddAnnotation {
    pub id: Option<String>,
    pub position: Coordinate,
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AddPolyline {
    pub id: Option<String>,
    pub points: Vec<Coordinate>,
    pub color: Option<Argb>,
    pub width: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AddPolygon {
    pub id: Option<String>,
    pub points: Vec<Coordinate>,
    pub stroke_color: Option<Argb>,
    pub fill_color: Option<Argb>,
    pub width: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AddCircle {
    pub id: Option<String>,
    pub center: Coordinate,
    pub radius: f64,
    pub stroke_color: Option<Argb>,
    pub fill_color: Option<Argb>,
    pub width: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SetCamera(SetCamera),
    FitBounds(FitBounds),
    SetMapType(MapType),
    AddAnnotation(AddAnnotation),
    RemoveAnnotation { id: String },
    AddPolyline(AddPolyline),
    AddPolygon(AddPolygon),
    AddCircle(AddCircle),
    RemoveOverlay { id: String },
    ClearOverlays,
    ShowsUserLocation { value: bool },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetCamera(_) => "setCamera",
            Command::FitBounds(_) => "fitBounds",
            Command::SetMapType(_) => "setMapType",
            Command::AddAnnotation(_) => "addAnnotation",
            Command::RemoveAnnotation { .. } => "removeAnnotation",
            Command::AddPolyline(_) => "addPolyline",
            Command::AddPolygon(_) => "addPolygon",
            Command::AddCircle(_) => "addCircle",
            Command::RemoveOverlay { .. } => "removeOverlay",
            Command::ClearOverlays => "clearOverlays",
            Command::ShowsUserLocation { .. } => "showsUserLocation",
        }
    }

    pub fn parse(name: &str, args: Option<&Value>) -> Result<Self, Error> {
        let command = COMMAND_NAMES
            .iter()
            .copied()
            .find(|known| *known == name)
            .ok_or_else(|| Error::unsupported_command(name))?;
        if command == "clearOverlays" {
            return Ok(Command::ClearOverlays);
        }

        let empty = Map::new();
        let map = match args {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(Error::invalid_arguments(command)
                    .with_message("arguments must be an object"));
            }
        };
        let args = Args { command, map };

        let parsed = match command {
            "setCamera" => {
                let camera = args.required("camera")?;
                let camera = CameraSpec::from_value(camera)
                    .map_err(|message| Error::invalid_arguments(command).with_message(message))?;
                Command::SetCamera(SetCamera {
                    camera,
                    animated: args.optional_bool("animated"),
                })
            }
            "fitBounds" => Command::FitBounds(FitBounds {
                north_east: args.required_coordinate("ne")?,
                south_west: args.required_coordinate("sw")?,
                padding: args.optional_number("padding"),
                animated: args.optional_bool("animated"),
            }),
            "setMapType" => Command::SetMapType(MapType::from_code(args.required_int("type")?)),
            "addAnnotation" => Command::AddAnnotation(AddAnnotation {
                id: args.optional_string("id"),
                position: args.required_coordinate("pos")?,
                title: args.optional_string("title"),
                subtitle: args.optional_string("subtitle"),
            }),
            "removeAnnotation" => Command::RemoveAnnotation {
                id: args.required_string("id")?,
            },
            "addPolyline" => Command::AddPolyline(AddPolyline {
                id: args.optional_string("id"),
                points: args.required_points("points")?,
                color: args.optional_color("color"),
                width: args.optional_width("width")?,
            }),
            "addPolygon" => Command::AddPolygon(AddPolygon {
                id: args.optional_string("id"),
                points: args.required_points("points")?,
                stroke_color: args.optional_color("strokeColor"),
                fill_color: args.optional_color("fillColor"),
                width: args.optional_width("width")?,
            }),
            "addCircle" => Command::AddCircle(AddCircle {
                id: args.optional_string("id"),
                center: args.required_coordinate("center")?,
                radius: args.required_number("radius")?,
                stroke_color: args.optional_color("strokeColor"),
                fill_color: args.optional_color("fillColor"),
                width: args.optional_width("width")?,
            }),
            "removeOverlay" => Command::RemoveOverlay {
                id: args.required_string("id")?,
            },
            "showsUserLocation" => Command::ShowsUserLocation {
                value: args.required_bool("value")?,
            },
            _ => return Err(Error::unsupported_command(name)),
        };
        Ok(parsed)
    }
}

struct Args<'a> {
    command: &'static str,
    map: &'a Map<String, Value>,
}

impl<'a> Args<'a> {
    fn invalid(&self, message: String) -> Error {
        Error::invalid_arguments(self.command).with_message(message)
    }

    fn present(&self, key: &str) -> Option<&'a Value> {
        match self.map.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    fn required(&self, key: &str) -> Result<&'a Value, Error> {
        self.present(key)
            .ok_or_else(|| self.invalid(format!("missing `{key}`")))
    }

    fn required_coordinate(&self, key: &str) -> Result<Coordinate, Error> {
        coordinate_from_value(self.required(key)?)
            .ok_or_else(|| self.invalid(format!("`{key}` must be {{lat, lon}} numbers")))
    }

    fn required_points(&self, key: &str) -> Result<Vec<Coordinate>, Error> {
        let items = self
            .required(key)?
            .as_array()
            .ok_or_else(|| self.invalid(format!("`{key}` must be an array")))?;
        items
            .iter()
            .map(|item| {
                coordinate_from_value(item).ok_or_else(|| {
                    self.invalid(format!("every `{key}` entry must be {{lat, lon}} numbers"))
                })
            })
            .collect()
    }

    fn required_string(&self, key: &str) -> Result<String, Error> {
        self.required(key)?
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| self.invalid(format!("`{key}` must be a string")))
    }

    fn required_number(&self, key: &str) -> Result<f64, Error> {
        self.required(key)?
            .as_f64()
            .ok_or_else(|| self.invalid(format!("`{key}` must be a number")))
    }

    fn required_int(&self, key: &str) -> Result<i64, Error> {
        let value = self.required(key)?;
        value
            .as_i64()
            .or_else(|| {
                value
                    .as_f64()
                    .filter(|number| number.is_finite() && number.fract() == 0.0)
                    .filter(|number| (i64::MIN as f64..=i64::MAX as f64).contains(number))
                    .map(|number| number as i64)
            })
            .ok_or_else(|| self.invalid(format!("`{key}` must be an integer")))
    }

    fn required_bool(&self, key: &str) -> Result<bool, Error> {
        self.required(key)?
            .as_bool()
            .ok_or_else(|| self.invalid(format!("`{key}` must be a boolean")))
    }

    /// Wrong-typed optional values fall back to the default, like absent ones.
    fn optional<T>(&self, key: &str, convert: impl Fn(&'a Value) -> Option<T>) -> Option<T> {
        let value = self.present(key)?;
        let converted = convert(value);
        if converted.is_none() {
            debug!(command = self.command, key, "ignoring wrong-typed optional argument");
        }
        converted
    }

    fn optional_string(&self, key: &str) -> Option<String> {
        self.optional(key, |value| value.as_str().map(ToString::to_string))
    }

    fn optional_number(&self, key: &str) -> Option<f64> {
        self.optional(key, Value::as_f64)
    }

    fn optional_width(&self, key: &str) -> Result<Option<f64>, Error> {
        match self.optional_number(key) {
            Some(width) if !(width.is_finite() && width > 0.0) => {
                Err(self.invalid(format!("`{key}` must be a positive number")))
            }
            width => Ok(width),
        }
    }

    fn optional_bool(&self, key: &str) -> Option<bool> {
        self.optional(key, Value::as_bool)
    }

    fn optional_color(&self, key: &str) -> Option<Argb> {
        self.optional(key, Argb::from_value)
    }
}
