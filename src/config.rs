//! Purpose: Tunables for one bridge instance (camera fallbacks, shape style defaults, gestures).
//! Exports: `BridgeConfig`, `ShapeDefaults`.
//! Role: Plain data with serde defaults; optionally loaded from a JSON file by the binary.
//! Invariants: Every field has a default, so `{}` is a complete configuration.
//! Invariants: A shape block, when given, is given in full.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::core::error::{Error, ErrorKind};
use crate::core::geo::Argb;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShapeDefaults {
    pub stroke: u32,
    #[serde(default)]
    pub fill: Option<u32>,
    pub width: f64,
}

impl ShapeDefaults {
    pub fn stroke(&self) -> Argb {
        Argb(self.stroke)
    }

    pub fn fill(&self) -> Option<Argb> {
        self.fill.map(Argb)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Span used when a camera carries neither altitude nor both deltas.
    pub default_span_degrees: f64,
    pub fit_padding: f64,
    pub default_animated: bool,
    pub long_press_min_duration_ms: u64,
    pub polyline: ShapeDefaults,
    pub polygon: ShapeDefaults,
    pub circle: ShapeDefaults,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_span_degrees: 0.05,
            fit_padding: 24.0,
            default_animated: true,
            long_press_min_duration_ms: 450,
            polyline: ShapeDefaults {
                stroke: 0xFF1E_88E5,
                fill: None,
                width: 3.0,
            },
            polygon: ShapeDefaults {
                stroke: 0xFF1E_88E5,
                fill: Some(0x331E_88E5),
                width: 2.0,
            },
            circle: ShapeDefaults {
                stroke: 0xFF43_A047,
                fill: Some(0x3343_A047),
                width: 2.0,
            },
        }
    }
}

impl BridgeConfig {
    pub fn from_json_str(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("invalid bridge config: {err}"))
                .with_source(err)
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read config {}", path.display()))
                .with_source(err)
        })?;
        Self::from_json_str(&text)
    }

    pub fn long_press_min_duration(&self) -> Duration {
        Duration::from_millis(self.long_press_min_duration_ms)
    }
}
