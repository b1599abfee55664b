//! Purpose: Define the public Rust API boundary for the map bridge.
//! Exports: `MapBridge`, command types, engine/permission traits, the headless engine,
//! and the core types those signatures mention.
//! Role: Public, additive-only surface; platform glue depends on this module only.
//! Invariants: Everything a host or engine adapter needs is reachable from here.

mod bridge;
mod channel;
mod command;
mod engine;
mod headless;

pub use crate::config::{BridgeConfig, ShapeDefaults};
pub use crate::core::camera::{
    BoundsFit, CameraSnapshot, CameraSpec, CameraUpdate, CoordinateSpan, Perspective, Region,
};
pub use crate::core::error::{Error, ErrorKind, to_exit_code};
pub use crate::core::events::{
    Delivery, EventEnvelope, EventSink, GesturePhase, MapEvent, SubscriptionState,
};
pub use crate::core::geo::{
    Argb, Coordinate, EdgePadding, MapPoint, MapRect, MapSize, Rgba, ScreenPoint,
};
pub use crate::core::registry::{
    DecorationHandle, DecorationRef, DecorationRegistry, PointMarker, Shape, Style,
};
pub use bridge::{MapBridge, RenderStyle};
pub use channel::{ChannelNames, VIEW_TYPE_ID};
pub use command::{
    AddAnnotation, AddCircle, AddPolygon, AddPolyline, COMMAND_NAMES, Command, FitBounds,
    MapType, SetCamera,
};
pub use engine::{LocationPermissions, MapEngine, NoPermissionPrompt};
pub use headless::{CountingPermissions, RecordedDecoration, RecordingEngine, Viewport};
