//! Purpose: Contract coverage for the bridge through its public API.
//! Exports: Integration tests only.
//! Role: Pin down id uniqueness, style lifecycle, camera resolution, and event stream rules.
//! Invariants: Tests drive the bridge the way platform glue would (dispatch + callbacks).
//! Invariants: Uses the headless engine; no GUI, no global state.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use mapbridge::api::{
    BridgeConfig, CameraUpdate, Coordinate, CoordinateSpan, CountingPermissions, Delivery,
    ErrorKind, EventEnvelope, GesturePhase, MapBridge, RecordingEngine, Region, ScreenPoint,
    SubscriptionState,
};
use serde_json::{Value, json};

type Bridge = MapBridge<RecordingEngine, CountingPermissions>;
type Seen = Rc<RefCell<Vec<EventEnvelope>>>;

fn bridge() -> Bridge {
    MapBridge::new(
        RecordingEngine::default(),
        CountingPermissions::default(),
        BridgeConfig::default(),
    )
}

fn listen(bridge: &mut Bridge) -> Seen {
    let seen: Seen = Rc::new(RefCell::new(Vec::new()));
    let sink_seen = Rc::clone(&seen);
    bridge.subscribe(move |envelope: EventEnvelope| sink_seen.borrow_mut().push(envelope));
    seen
}

fn dispatch(bridge: &mut Bridge, name: &str, args: Value) -> Value {
    bridge.dispatch(name, Some(&args)).expect(name)
}

fn line() -> Value {
    json!([{"lat": 0, "lon": 0}, {"lat": 1, "lon": 1}])
}

#[test]
fn generated_overlay_ids_are_pairwise_distinct() {
    let mut bridge = bridge();
    let mut ids = HashSet::new();
    for round in 0..20 {
        let polyline = dispatch(&mut bridge, "addPolyline", json!({"points": line()}));
        let polygon = dispatch(&mut bridge, "addPolygon", json!({"points": line()}));
        let circle = dispatch(
            &mut bridge,
            "addCircle",
            json!({"center": {"lat": 0, "lon": 0}, "radius": 10 + round}),
        );
        for id in [polyline, polygon, circle] {
            assert!(ids.insert(id.as_str().expect("id").to_string()));
        }
    }
    assert_eq!(bridge.registry().overlay_count(), 60);
    assert_eq!(bridge.engine().decoration_count(), 60);
}

#[test]
fn remove_then_style_for_is_none_even_for_unknown_ids() {
    let mut bridge = bridge();
    dispatch(&mut bridge, "addPolyline", json!({"id": "route", "points": line()}));
    for id in ["route", "never-inserted"] {
        assert_eq!(dispatch(&mut bridge, "removeOverlay", json!({"id": id})), Value::Null);
        assert!(bridge.style_for(id).is_none());
    }
    assert_eq!(bridge.engine().decoration_count(), 0);
}

#[test]
fn clear_overlays_leaves_nothing_live() {
    let mut bridge = bridge();
    dispatch(&mut bridge, "addPolyline", json!({"id": "a", "points": line()}));
    dispatch(&mut bridge, "addPolygon", json!({"id": "b", "points": line()}));
    dispatch(
        &mut bridge,
        "addAnnotation",
        json!({"id": "a", "pos": {"lat": 0, "lon": 0}}),
    );

    dispatch(&mut bridge, "clearOverlays", Value::Null);
    assert_eq!(bridge.registry().overlay_count(), 0);
    assert!(bridge.style_for("a").is_none());
    assert!(bridge.style_for("b").is_none());
    // Markers live in their own namespace and survive.
    assert_eq!(bridge.registry().marker_count(), 1);
    assert_eq!(bridge.engine().decoration_count(), 1);

    dispatch(&mut bridge, "clearOverlays", Value::Null);
    assert_eq!(bridge.registry().overlay_count(), 0);
}

#[test]
fn reinsert_with_same_id_does_not_leak_old_style() {
    let mut bridge = bridge();
    dispatch(
        &mut bridge,
        "addPolygon",
        json!({"id": "zone", "points": line(), "strokeColor": 0xFF00_0000u32, "fillColor": 0x1100_0000u32, "width": 9}),
    );
    dispatch(&mut bridge, "removeOverlay", json!({"id": "zone"}));
    let id = dispatch(&mut bridge, "addPolygon", json!({"id": "zone", "points": line()}));
    assert_eq!(id, json!("zone"));

    let style = bridge.style_for("zone").expect("style");
    assert_eq!(style.stroke.0, 0xFF1E_88E5);
    assert_eq!(style.fill.map(|fill| fill.0), Some(0x331E_88E5));
    assert_eq!(style.line_width, 2.0);
}

#[test]
fn fit_bounds_ignores_corner_order() {
    let mut first = bridge();
    let mut second = bridge();
    dispatch(
        &mut first,
        "fitBounds",
        json!({"ne": {"lat": 10, "lon": 10}, "sw": {"lat": -5, "lon": -5}}),
    );
    dispatch(
        &mut second,
        "fitBounds",
        json!({"ne": {"lat": -5, "lon": -5}, "sw": {"lat": 10, "lon": 10}}),
    );

    let (CameraUpdate::Fit(a), true) = first.engine().camera_history()[0] else {
        panic!("expected animated fit");
    };
    let (CameraUpdate::Fit(b), true) = second.engine().camera_history()[0] else {
        panic!("expected animated fit");
    };
    assert_eq!(a.rect, b.rect);
    assert_eq!(a.padding.top, 24.0);
    assert_eq!(a.padding, b.padding);
}

#[test]
fn bare_target_resolves_to_default_region() {
    let mut bridge = bridge();
    dispatch(&mut bridge, "setCamera", json!({"camera": {"target": {"lat": 1, "lon": 2}}}));
    assert_eq!(
        bridge.engine().camera_history()[0].0,
        CameraUpdate::Region(Region {
            center: Coordinate::new(1.0, 2.0),
            span: CoordinateSpan {
                latitude_delta: 0.05,
                longitude_delta: 0.05,
            },
        })
    );
}

#[test]
fn second_subscriber_replaces_the_first() {
    let mut bridge = bridge();
    let first = listen(&mut bridge);
    bridge.on_tap(ScreenPoint::new(400.0, 300.0), GesturePhase::Ended);
    let second = listen(&mut bridge);
    bridge.on_tap(ScreenPoint::new(400.0, 300.0), GesturePhase::Ended);
    bridge.on_region_changed(false);

    assert_eq!(first.borrow().len(), 1);
    let events: Vec<String> = second.borrow().iter().map(|e| e.event.clone()).collect();
    assert_eq!(events, vec!["tap".to_string(), "regionChanged".to_string()]);
}

#[test]
fn long_press_fires_only_on_terminal_phase() {
    let mut bridge = bridge();
    dispatch(
        &mut bridge,
        "setCamera",
        json!({"camera": {"target": {"lat": 10, "lon": 20}, "latDelta": 2, "lonDelta": 4}}),
    );
    let seen = listen(&mut bridge);

    for phase in [GesturePhase::Began, GesturePhase::Changed] {
        assert_eq!(bridge.on_long_press(ScreenPoint::new(0.0, 0.0), phase), None);
    }
    assert!(seen.borrow().is_empty());

    assert_eq!(
        bridge.on_long_press(ScreenPoint::new(0.0, 0.0), GesturePhase::Ended),
        Some(Delivery::Delivered)
    );
    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].event, "longPress");
    assert_eq!(Value::Object(seen[0].data.clone()), json!({"lat": 11.0, "lon": 18.0}));
}

#[test]
fn tap_fires_only_on_completed_phase() {
    let mut bridge = bridge();
    let seen = listen(&mut bridge);

    for phase in [
        GesturePhase::Possible,
        GesturePhase::Began,
        GesturePhase::Changed,
        GesturePhase::Cancelled,
        GesturePhase::Failed,
    ] {
        assert_eq!(bridge.on_tap(ScreenPoint::new(400.0, 300.0), phase), None);
    }
    assert!(seen.borrow().is_empty());

    assert_eq!(
        bridge.on_tap(ScreenPoint::new(400.0, 300.0), GesturePhase::Ended),
        Some(Delivery::Delivered)
    );
    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].event, "tap");
    assert_eq!(Value::Object(seen[0].data.clone()), json!({"lat": 0.0, "lon": 0.0}));
}

#[test]
fn unsupported_command_leaves_state_unchanged() {
    let mut bridge = bridge();
    dispatch(&mut bridge, "addPolyline", json!({"id": "keep", "points": line()}));
    let history_before = bridge.engine().camera_history().len();

    let err = bridge
        .dispatch("bogusCommand", Some(&json!({"id": "keep"})))
        .expect_err("err");
    assert_eq!(err.kind(), ErrorKind::UnsupportedCommand);
    assert_eq!(err.command(), Some("bogusCommand"));
    assert_eq!(bridge.registry().overlay_count(), 1);
    assert!(bridge.style_for("keep").is_some());
    assert_eq!(bridge.engine().camera_history().len(), history_before);
}

#[test]
fn add_circle_without_radius_is_invalid_and_inserts_nothing() {
    let mut bridge = bridge();
    let err = bridge
        .dispatch("addCircle", Some(&json!({"id": "c", "center": {"lat": 0, "lon": 0}})))
        .expect_err("err");
    assert_eq!(err.kind(), ErrorKind::InvalidArguments);
    assert_eq!(err.command(), Some("addCircle"));
    assert_eq!(bridge.registry().overlay_count(), 0);
    assert_eq!(bridge.engine().decoration_count(), 0);
}

#[test]
fn annotation_tap_reports_owning_id() {
    let mut bridge = bridge();
    let id = dispatch(&mut bridge, "addAnnotation", json!({"pos": {"lat": 1, "lon": 1}}));
    let id = id.as_str().expect("id").to_string();
    let handle = bridge.registry().marker(&id).expect("marker").handle;
    let seen = listen(&mut bridge);

    assert_eq!(bridge.on_select(handle), Some(Delivery::Delivered));
    dispatch(&mut bridge, "removeAnnotation", json!({"id": id.clone()}));
    assert_eq!(bridge.on_select(handle), None);

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].event, "annotationTap");
    assert_eq!(seen[0].data["id"], json!(id));
}

#[test]
fn region_changed_carries_region_and_perspective() {
    let mut bridge = bridge();
    dispatch(
        &mut bridge,
        "setCamera",
        json!({"camera": {"target": {"lat": 0, "lon": 0}, "altitude": 1113.2, "heading": 45, "pitch": 30}, "animated": false}),
    );
    let seen = listen(&mut bridge);
    bridge.on_region_changed(false);

    let seen = seen.borrow();
    let camera = &seen[0].data["camera"];
    assert_eq!(camera["altitude"], json!(1113.2));
    assert_eq!(camera["heading"], json!(45.0));
    assert_eq!(camera["pitch"], json!(30.0));
    assert!(camera["latDelta"].as_f64().expect("latDelta") > 0.0);
    assert_eq!(seen[0].data["animated"], json!(false));
}

#[test]
fn events_without_subscriber_are_not_replayed() {
    let mut bridge = bridge();
    assert_eq!(
        bridge.on_tap(ScreenPoint::new(1.0, 1.0), GesturePhase::Ended),
        Some(Delivery::Dropped)
    );
    let seen = listen(&mut bridge);
    assert!(seen.borrow().is_empty());

    assert!(bridge.cancel());
    assert_eq!(bridge.subscription_state(), SubscriptionState::Unsubscribed);
    bridge.on_tap(ScreenPoint::new(1.0, 1.0), GesturePhase::Ended);
    assert!(seen.borrow().is_empty());
}

#[test]
fn dispose_detaches_subscriber() {
    let mut bridge = bridge();
    let seen = listen(&mut bridge);
    bridge.dispose();
    assert_eq!(bridge.subscription_state(), SubscriptionState::Unsubscribed);
    bridge.on_region_changed(true);
    assert!(seen.borrow().is_empty());
}
