//! Purpose: Collaborator contracts the bridge drives: the rendering engine and location permissions.
//! Exports: `MapEngine`, `LocationPermissions`, `NoPermissionPrompt`.
//! Role: Seams between the bridge and the platform; the bridge never owns a rendering surface.
//! Invariants: Engines identify decorations only by `DecorationHandle`.
//! Invariants: Permission requests are fire-and-forget; no outcome flows back.

use crate::api::command::MapType;
use crate::core::camera::{BoundsFit, CameraSnapshot, Perspective, Region};
use crate::core::geo::{Coordinate, ScreenPoint};
use crate::core::registry::{DecorationHandle, DecorationRef};

/// The map widget. Calls are synchronous; animations run on after the call returns.
pub trait MapEngine {
    fn add_decoration(&mut self, handle: DecorationHandle, decoration: DecorationRef<'_>);
    fn remove_decoration(&mut self, handle: DecorationHandle);

    fn set_region(&mut self, region: Region, animated: bool);
    fn set_camera(&mut self, camera: Perspective, animated: bool);
    fn set_visible_rect(&mut self, fit: BoundsFit, animated: bool);

    fn set_map_type(&mut self, map_type: MapType);
    fn set_shows_user_location(&mut self, shows: bool);

    /// Project a point in view space onto the map.
    fn convert_point(&self, point: ScreenPoint) -> Coordinate;
    fn camera_snapshot(&self) -> CameraSnapshot;
}

pub trait LocationPermissions {
    fn request_when_in_use(&mut self);
}

/// For hosts that manage location authorization themselves.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPermissionPrompt;

impl LocationPermissions for NoPermissionPrompt {
    fn request_when_in_use(&mut self) {
        tracing::debug!("location permission request skipped");
    }
}
