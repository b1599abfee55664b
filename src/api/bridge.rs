//! Purpose: One bridge per logical map: dispatch host commands, relay map-surface callbacks.
//! Exports: `MapBridge`, `RenderStyle`.
//! Role: Command Dispatcher plus the inbound callback surface the platform glue calls into.
//! Invariants: Commands run to completion one at a time (`&mut self`); no reentrancy.
//! Invariants: Validation precedes mutation; a rejected command changes nothing.
//! Invariants: The engine only learns about decorations after the registry holds them.

use serde_json::Value;
use tracing::{debug, warn};

use crate::api::command::{
    AddAnnotation, AddCircle, AddPolygon, AddPolyline, Command, FitBounds, SetCamera,
};
use crate::api::engine::{LocationPermissions, MapEngine};
use crate::config::BridgeConfig;
use crate::core::camera::{CameraSpec, CameraUpdate, fit_bounds, resolve};
use crate::core::error::Error;
use crate::core::events::{
    Delivery, EventMultiplexer, EventSink, GesturePhase, MapEvent, SubscriptionState,
};
use crate::core::geo::{Coordinate, Rgba, ScreenPoint};
use crate::core::registry::{
    DecorationHandle, DecorationRef, DecorationRegistry, PointMarker, Shape, Style,
};

/// Style in engine-native colors, answered when the engine asks how to draw an overlay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderStyle {
    pub stroke: Rgba,
    pub fill: Option<Rgba>,
    pub line_width: f64,
}

impl RenderStyle {
    fn for_shape(shape: &Shape, style: &Style) -> Self {
        let fill = match shape {
            Shape::Polyline { .. } => None,
            Shape::Polygon { .. } | Shape::Circle { .. } => style.fill.map(|fill| fill.to_rgba()),
        };
        Self {
            stroke: style.stroke.to_rgba(),
            fill,
            line_width: style.line_width,
        }
    }
}

#[derive(Debug)]
pub struct MapBridge<E, P> {
    engine: E,
    permissions: P,
    config: BridgeConfig,
    registry: DecorationRegistry,
    events: EventMultiplexer,
}

impl<E: MapEngine, P: LocationPermissions> MapBridge<E, P> {
    pub fn new(engine: E, permissions: P, config: BridgeConfig) -> Self {
        Self {
            engine,
            permissions,
            config,
            registry: DecorationRegistry::new(),
            events: EventMultiplexer::new(),
        }
    }

    /// Builds a bridge from view-creation arguments; `{"camera": {...}}` is applied unanimated.
    /// A malformed camera is skipped and the bridge is still created.
    pub fn with_creation_args(
        engine: E,
        permissions: P,
        config: BridgeConfig,
        args: Option<&Value>,
    ) -> Self {
        let mut bridge = Self::new(engine, permissions, config);
        if let Some(camera) = args.and_then(|args| args.get("camera")) {
            match CameraSpec::from_value(camera) {
                Ok(spec) => bridge.apply_camera(&spec, false),
                Err(reason) => warn!(reason, "skipping malformed initial camera"),
            }
        }
        bridge
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn permissions(&self) -> &P {
        &self.permissions
    }

    pub fn registry(&self) -> &DecorationRegistry {
        &self.registry
    }

    /// Host entry point: parse, then execute. Returns `Value::Null` for commands without a result.
    pub fn dispatch(&mut self, name: &str, args: Option<&Value>) -> Result<Value, Error> {
        let command = Command::parse(name, args).inspect_err(|err| {
            warn!(command = name, error = %err, "rejected command");
        })?;
        self.execute(command)
    }

    pub fn execute(&mut self, command: Command) -> Result<Value, Error> {
        debug!(command = command.name(), "dispatch");
        match command {
            Command::SetCamera(SetCamera { camera, animated }) => {
                let animated = animated.unwrap_or(self.config.default_animated);
                self.apply_camera(&camera, animated);
                Ok(Value::Null)
            }
            Command::FitBounds(FitBounds {
                north_east,
                south_west,
                padding,
                animated,
            }) => {
                let padding = padding.unwrap_or(self.config.fit_padding);
                let animated = animated.unwrap_or(self.config.default_animated);
                note_out_of_range("fitBounds", &[north_east, south_west]);
                let fit = fit_bounds(north_east, south_west, padding);
                self.engine.set_visible_rect(fit, animated);
                Ok(Value::Null)
            }
            Command::SetMapType(map_type) => {
                self.engine.set_map_type(map_type);
                Ok(Value::Null)
            }
            Command::AddAnnotation(AddAnnotation {
                id,
                position,
                title,
                subtitle,
            }) => {
                note_out_of_range("addAnnotation", &[position]);
                let inserted = self.registry.insert_marker(
                    id,
                    PointMarker {
                        coordinate: position,
                        title,
                        subtitle,
                    },
                )?;
                if let Some(displaced) = inserted.displaced {
                    self.engine.remove_decoration(displaced.handle);
                }
                if let Some(entry) = self.registry.marker(&inserted.id) {
                    self.engine
                        .add_decoration(inserted.handle, DecorationRef::Marker(&entry.marker));
                }
                Ok(Value::String(inserted.id))
            }
            Command::RemoveAnnotation { id } => {
                if let Some(entry) = self.registry.remove_marker(&id) {
                    self.engine.remove_decoration(entry.handle);
                } else {
                    debug!(id = %id, "removeAnnotation on unknown id");
                }
                Ok(Value::Null)
            }
            Command::AddPolyline(AddPolyline {
                id,
                points,
                color,
                width,
            }) => {
                note_out_of_range("addPolyline", &points);
                let defaults = self.config.polyline;
                let style = Style {
                    stroke: color.unwrap_or(defaults.stroke()),
                    fill: None,
                    line_width: width.unwrap_or(defaults.width),
                };
                self.insert_overlay(id, Shape::Polyline { points }, style)
            }
            Command::AddPolygon(AddPolygon {
                id,
                points,
                stroke_color,
                fill_color,
                width,
            }) => {
                note_out_of_range("addPolygon", &points);
                let defaults = self.config.polygon;
                let style = Style {
                    stroke: stroke_color.unwrap_or(defaults.stroke()),
                    fill: fill_color.or(defaults.fill()),
                    line_width: width.unwrap_or(defaults.width),
                };
                self.insert_overlay(id, Shape::Polygon { points }, style)
            }
            Command::AddCircle(AddCircle {
                id,
                center,
                radius,
                stroke_color,
                fill_color,
                width,
            }) => {
                note_out_of_range("addCircle", &[center]);
                let defaults = self.config.circle;
                let style = Style {
                    stroke: stroke_color.unwrap_or(defaults.stroke()),
                    fill: fill_color.or(defaults.fill()),
                    line_width: width.unwrap_or(defaults.width),
                };
                self.insert_overlay(
                    id,
                    Shape::Circle {
                        center,
                        radius_meters: radius,
                    },
                    style,
                )
            }
            Command::RemoveOverlay { id } => {
                if let Some(entry) = self.registry.remove_overlay(&id) {
                    self.engine.remove_decoration(entry.handle);
                } else {
                    debug!(id = %id, "removeOverlay on unknown id");
                }
                Ok(Value::Null)
            }
            Command::ClearOverlays => {
                for entry in self.registry.clear_all_overlays() {
                    self.engine.remove_decoration(entry.handle);
                }
                Ok(Value::Null)
            }
            Command::ShowsUserLocation { value } => {
                if value {
                    self.permissions.request_when_in_use();
                }
                self.engine.set_shows_user_location(value);
                Ok(Value::Null)
            }
        }
    }

    fn apply_camera(&mut self, spec: &CameraSpec, animated: bool) {
        note_out_of_range("setCamera", &[spec.target]);
        match resolve(spec, self.config.default_span_degrees) {
            CameraUpdate::Region(region) => self.engine.set_region(region, animated),
            CameraUpdate::Perspective(camera) => self.engine.set_camera(camera, animated),
            CameraUpdate::Fit(fit) => self.engine.set_visible_rect(fit, animated),
        }
    }

    fn insert_overlay(
        &mut self,
        id: Option<String>,
        shape: Shape,
        style: Style,
    ) -> Result<Value, Error> {
        let kind = shape.kind();
        let inserted = self.registry.insert_overlay(id, shape, style)?;
        debug!(id = %inserted.id, kind, "overlay inserted");
        if let Some(displaced) = inserted.displaced {
            self.engine.remove_decoration(displaced.handle);
        }
        if let Some(entry) = self.registry.overlay(&inserted.id) {
            self.engine
                .add_decoration(inserted.handle, DecorationRef::Overlay(&entry.shape));
        }
        Ok(Value::String(inserted.id))
    }

    pub fn style_for(&self, overlay_id: &str) -> Option<&Style> {
        self.registry.style_for(overlay_id)
    }

    /// The engine's render-style request, answered by handle lookup.
    pub fn render_style(&self, handle: DecorationHandle) -> Option<RenderStyle> {
        self.registry
            .overlay_for_handle(handle)
            .map(|entry| RenderStyle::for_shape(&entry.shape, &entry.style))
    }

    pub fn subscribe(&mut self, sink: impl EventSink + 'static) -> bool {
        let replaced = self.events.subscribe(sink);
        debug!(replaced, "event stream subscribed");
        replaced
    }

    pub fn cancel(&mut self) -> bool {
        self.events.cancel()
    }

    pub fn subscription_state(&self) -> SubscriptionState {
        self.events.state()
    }

    /// Region settled, including after programmatic camera changes.
    pub fn on_region_changed(&mut self, animated: bool) -> Delivery {
        let camera = self.engine.camera_snapshot();
        self.events.emit(MapEvent::RegionChanged { camera, animated })
    }

    /// Returns `None` when the phase is not a completed gesture.
    pub fn on_tap(&mut self, point: ScreenPoint, phase: GesturePhase) -> Option<Delivery> {
        if !phase.is_completed() {
            return None;
        }
        let coordinate = self.engine.convert_point(point);
        Some(self.events.emit(MapEvent::Tap { coordinate }))
    }

    pub fn on_long_press(&mut self, point: ScreenPoint, phase: GesturePhase) -> Option<Delivery> {
        if !phase.is_completed() {
            return None;
        }
        let coordinate = self.engine.convert_point(point);
        Some(self.events.emit(MapEvent::LongPress { coordinate }))
    }

    /// Marker selection. Unknown handles emit nothing.
    pub fn on_select(&mut self, handle: DecorationHandle) -> Option<Delivery> {
        let id = self.registry.marker_id_for_handle(handle)?.to_string();
        Some(self.events.emit(MapEvent::AnnotationTap { id }))
    }

    /// Teardown: detach the host's event stream.
    pub fn dispose(&mut self) {
        if self.events.cancel() {
            debug!("event stream detached on dispose");
        }
    }
}

fn note_out_of_range(command: &str, coordinates: &[Coordinate]) {
    if let Some(coordinate) = coordinates.iter().find(|coordinate| !coordinate.is_in_range()) {
        debug!(
            command,
            latitude = coordinate.latitude,
            longitude = coordinate.longitude,
            "passing out-of-range coordinate to engine"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::command::MapType;
    use crate::api::headless::{CountingPermissions, RecordedDecoration, RecordingEngine};
    use crate::core::camera::{CoordinateSpan, Region};
    use crate::core::geo::Argb;
    use serde_json::json;

    fn bridge() -> MapBridge<RecordingEngine, CountingPermissions> {
        MapBridge::new(
            RecordingEngine::default(),
            CountingPermissions::default(),
            BridgeConfig::default(),
        )
    }

    #[test]
    fn polyline_defaults_apply() {
        let mut bridge = bridge();
        let id = bridge
            .dispatch("addPolyline", Some(&json!({"points": [{"lat": 0, "lon": 0}]})))
            .expect("add");
        let id = id.as_str().expect("id");
        let style = bridge.style_for(id).expect("style");
        assert_eq!(style.stroke, Argb(0xFF1E_88E5));
        assert_eq!(style.fill, None);
        assert_eq!(style.line_width, 3.0);
        assert_eq!(bridge.engine().decoration_count(), 1);
    }

    #[test]
    fn render_style_decodes_colors_and_drops_polyline_fill() {
        let mut bridge = bridge();
        bridge
            .dispatch(
                "addCircle",
                Some(&json!({"id": "c", "center": {"lat": 0, "lon": 0}, "radius": 50})),
            )
            .expect("add");
        let handle = bridge.registry().overlay("c").expect("entry").handle;
        let style = bridge.render_style(handle).expect("style");
        assert_eq!(style.stroke.to_argb(), Argb(0xFF43_A047));
        assert_eq!(style.fill.map(Rgba::to_argb), Some(Argb(0x3343_A047)));
        assert_eq!(style.line_width, 2.0);

        let shape = Shape::Polyline { points: Vec::new() };
        let forced = RenderStyle::for_shape(
            &shape,
            &Style {
                stroke: Argb(0xFF00_0000),
                fill: Some(Argb(0xFFFF_FFFF)),
                line_width: 1.0,
            },
        );
        assert_eq!(forced.fill, None);
    }

    #[test]
    fn replacing_an_id_removes_the_old_engine_decoration() {
        let mut bridge = bridge();
        let args = json!({"id": "pin", "pos": {"lat": 1, "lon": 1}});
        bridge.dispatch("addAnnotation", Some(&args)).expect("first");
        bridge.dispatch("addAnnotation", Some(&args)).expect("second");
        assert_eq!(bridge.registry().marker_count(), 1);
        assert_eq!(bridge.engine().decoration_count(), 1);
    }

    #[test]
    fn shows_user_location_requests_permission_only_when_enabling() {
        let mut bridge = bridge();
        bridge
            .dispatch("showsUserLocation", Some(&json!({"value": true})))
            .expect("on");
        assert_eq!(bridge.permissions().requests, 1);
        assert!(bridge.engine().shows_user_location());

        bridge
            .dispatch("showsUserLocation", Some(&json!({"value": false})))
            .expect("off");
        assert_eq!(bridge.permissions().requests, 1);
        assert!(!bridge.engine().shows_user_location());
    }

    #[test]
    fn set_map_type_reaches_engine() {
        let mut bridge = bridge();
        bridge
            .dispatch("setMapType", Some(&json!({"type": 2})))
            .expect("type");
        assert_eq!(bridge.engine().map_type(), MapType::Hybrid);
    }

    #[test]
    fn set_camera_defaults_to_animated() {
        let mut bridge = bridge();
        bridge
            .dispatch("setCamera", Some(&json!({"camera": {"target": {"lat": 1, "lon": 2}}})))
            .expect("camera");
        let (update, animated) = bridge.engine().camera_history()[0];
        assert!(animated);
        assert_eq!(
            update,
            CameraUpdate::Region(Region {
                center: Coordinate::new(1.0, 2.0),
                span: CoordinateSpan::square(0.05),
            })
        );
    }

    #[test]
    fn creation_args_apply_initial_camera_without_animation() {
        let bridge = MapBridge::with_creation_args(
            RecordingEngine::default(),
            CountingPermissions::default(),
            BridgeConfig::default(),
            Some(&json!({"camera": {"target": {"lat": 5, "lon": 6}, "altitude": 500}})),
        );
        let (update, animated) = bridge.engine().camera_history()[0];
        assert!(!animated);
        assert!(matches!(update, CameraUpdate::Perspective(_)));
    }

    #[test]
    fn malformed_creation_camera_is_skipped() {
        let mut bridge = MapBridge::with_creation_args(
            RecordingEngine::default(),
            CountingPermissions::default(),
            BridgeConfig::default(),
            Some(&json!({"camera": {"zoom": 3}})),
        );
        assert!(bridge.engine().camera_history().is_empty());
        assert_eq!(bridge.engine_mut().take_region_change(), None);
        bridge
            .dispatch("setMapType", Some(&json!({"type": 1})))
            .expect("bridge stays usable");
    }

    #[test]
    fn selecting_unknown_handle_emits_nothing() {
        let mut bridge = bridge();
        let seen = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = std::rc::Rc::clone(&seen);
        bridge.subscribe(move |_envelope: crate::core::events::EventEnvelope| {
            counter.set(counter.get() + 1)
        });
        assert_eq!(bridge.on_select(DecorationHandle(99)), None);
        assert_eq!(seen.get(), 0);
    }

    #[test]
    fn annotation_is_recorded_with_title() {
        let mut bridge = bridge();
        bridge
            .dispatch(
                "addAnnotation",
                Some(&json!({"id": "a", "pos": {"lat": 1, "lon": 2}, "title": "Home"})),
            )
            .expect("add");
        let handle = bridge.registry().marker("a").expect("marker").handle;
        let Some(RecordedDecoration::Marker(marker)) = bridge.engine().decoration(handle) else {
            panic!("expected marker");
        };
        assert_eq!(marker.title.as_deref(), Some("Home"));
    }
}
