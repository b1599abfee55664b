//! Purpose: A GUI-less `MapEngine` that records what it is told, for the stdio host and tests.
//! Exports: `RecordingEngine`, `RecordedDecoration`, `Viewport`, `CountingPermissions`.
//! Role: Stand-in for a real map widget; keeps enough state to answer projection queries.
//! Invariants: Every camera mutation leaves exactly one pending region-change notification.
//! Invariants: Screen conversion interpolates linearly over the visible region.

use std::collections::BTreeMap;

use crate::api::command::MapType;
use crate::api::engine::{LocationPermissions, MapEngine};
use crate::core::camera::{
    BoundsFit, CameraSnapshot, CameraUpdate, CoordinateSpan, Perspective, Region,
};
use crate::core::geo::{Coordinate, MapPoint, ScreenPoint};
use crate::core::registry::{DecorationHandle, DecorationRef, PointMarker, Shape};

const METERS_PER_DEGREE: f64 = 111_320.0;

#[derive(Clone, Debug, PartialEq)]
pub enum RecordedDecoration {
    Marker(PointMarker),
    Overlay(Shape),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug)]
pub struct RecordingEngine {
    decorations: BTreeMap<DecorationHandle, RecordedDecoration>,
    camera: CameraSnapshot,
    viewport: Viewport,
    map_type: MapType,
    shows_user_location: bool,
    camera_history: Vec<(CameraUpdate, bool)>,
    pending_region_change: Option<bool>,
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new(Viewport {
            width: 800.0,
            height: 600.0,
        })
    }
}

impl RecordingEngine {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            decorations: BTreeMap::new(),
            camera: CameraSnapshot {
                center: Coordinate::new(0.0, 0.0),
                span: CoordinateSpan {
                    latitude_delta: 180.0,
                    longitude_delta: 360.0,
                },
                altitude: 180.0 * METERS_PER_DEGREE,
                pitch: 0.0,
                heading: 0.0,
            },
            viewport,
            map_type: MapType::Standard,
            shows_user_location: false,
            camera_history: Vec::new(),
            pending_region_change: None,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn decoration(&self, handle: DecorationHandle) -> Option<&RecordedDecoration> {
        self.decorations.get(&handle)
    }

    pub fn decoration_count(&self) -> usize {
        self.decorations.len()
    }

    pub fn map_type(&self) -> MapType {
        self.map_type
    }

    pub fn shows_user_location(&self) -> bool {
        self.shows_user_location
    }

    /// Every camera update applied so far, with its `animated` flag.
    pub fn camera_history(&self) -> &[(CameraUpdate, bool)] {
        &self.camera_history
    }

    /// Takes the pending "region did change" notification, if the camera moved.
    pub fn take_region_change(&mut self) -> Option<bool> {
        self.pending_region_change.take()
    }

    fn settle(&mut self, update: CameraUpdate, animated: bool) {
        self.camera_history.push((update, animated));
        self.pending_region_change = Some(animated);
    }
}

impl MapEngine for RecordingEngine {
    fn add_decoration(&mut self, handle: DecorationHandle, decoration: DecorationRef<'_>) {
        let recorded = match decoration {
            DecorationRef::Marker(marker) => RecordedDecoration::Marker(marker.clone()),
            DecorationRef::Overlay(shape) => RecordedDecoration::Overlay(shape.clone()),
        };
        self.decorations.insert(handle, recorded);
    }

    fn remove_decoration(&mut self, handle: DecorationHandle) {
        self.decorations.remove(&handle);
    }

    fn set_region(&mut self, region: Region, animated: bool) {
        self.camera.center = region.center;
        self.camera.span = region.span;
        self.camera.altitude = region.span.latitude_delta * METERS_PER_DEGREE;
        self.settle(CameraUpdate::Region(region), animated);
    }

    fn set_camera(&mut self, camera: Perspective, animated: bool) {
        let latitude_delta = camera.altitude / METERS_PER_DEGREE;
        let cos_lat = camera.center.latitude.to_radians().cos();
        let longitude_delta = if cos_lat.abs() > f64::EPSILON {
            latitude_delta / cos_lat
        } else {
            latitude_delta
        };
        self.camera = CameraSnapshot {
            center: camera.center,
            span: CoordinateSpan {
                latitude_delta,
                longitude_delta,
            },
            altitude: camera.altitude,
            pitch: camera.pitch,
            heading: camera.heading,
        };
        self.settle(CameraUpdate::Perspective(camera), animated);
    }

    fn set_visible_rect(&mut self, fit: BoundsFit, animated: bool) {
        let north_west = fit.rect.origin.to_coordinate();
        let south_east = fit.rect.max_point().to_coordinate();
        let inner_width = self.viewport.width - fit.padding.left - fit.padding.right;
        let inner_height = self.viewport.height - fit.padding.top - fit.padding.bottom;
        let widen = if inner_width > 0.0 {
            self.viewport.width / inner_width
        } else {
            1.0
        };
        let heighten = if inner_height > 0.0 {
            self.viewport.height / inner_height
        } else {
            1.0
        };
        let latitude_delta = (north_west.latitude - south_east.latitude).abs() * heighten;
        self.camera = CameraSnapshot {
            center: MapPoint::to_coordinate(fit.rect.center()),
            span: CoordinateSpan {
                latitude_delta,
                longitude_delta: (south_east.longitude - north_west.longitude).abs() * widen,
            },
            altitude: latitude_delta * METERS_PER_DEGREE,
            pitch: 0.0,
            heading: 0.0,
        };
        self.settle(CameraUpdate::Fit(fit), animated);
    }

    fn set_map_type(&mut self, map_type: MapType) {
        self.map_type = map_type;
    }

    fn set_shows_user_location(&mut self, shows: bool) {
        self.shows_user_location = shows;
    }

    fn convert_point(&self, point: ScreenPoint) -> Coordinate {
        let fx = point.x / self.viewport.width - 0.5;
        let fy = point.y / self.viewport.height - 0.5;
        Coordinate::new(
            self.camera.center.latitude - fy * self.camera.span.latitude_delta,
            self.camera.center.longitude + fx * self.camera.span.longitude_delta,
        )
    }

    fn camera_snapshot(&self) -> CameraSnapshot {
        self.camera
    }
}

/// Counts permission prompts instead of showing them.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CountingPermissions {
    pub requests: usize,
}

impl LocationPermissions for CountingPermissions {
    fn request_when_in_use(&mut self) {
        self.requests += 1;
    }
}
