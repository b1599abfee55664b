//! Purpose: Multiplex map-surface notifications into one ordered, single-subscriber stream.
//! Exports: `EventMultiplexer`, `EventSink`, `EventEnvelope`, `MapEvent`, `GesturePhase`,
//! `SubscriptionState`, `Delivery`.
//! Role: Last hop before the host; events leave here already in wire vocabulary.
//! Invariants: At most one sink is active; subscribing replaces, never stacks.
//! Invariants: Without a sink events are dropped, never queued or replayed.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value, json};

use super::camera::CameraSnapshot;
use super::geo::{Coordinate, coordinate_map};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GesturePhase {
    Possible,
    Began,
    Changed,
    Ended,
    Cancelled,
    Failed,
}

impl GesturePhase {
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "possible" => Some(Self::Possible),
            "began" => Some(Self::Began),
            "changed" => Some(Self::Changed),
            "ended" => Some(Self::Ended),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Only a completed gesture produces an event.
    pub fn is_completed(self) -> bool {
        self == Self::Ended
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MapEvent {
    RegionChanged {
        camera: CameraSnapshot,
        animated: bool,
    },
    Tap {
        coordinate: Coordinate,
    },
    LongPress {
        coordinate: Coordinate,
    },
    AnnotationTap {
        id: String,
    },
}

impl MapEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MapEvent::RegionChanged { .. } => "regionChanged",
            MapEvent::Tap { .. } => "tap",
            MapEvent::LongPress { .. } => "longPress",
            MapEvent::AnnotationTap { .. } => "annotationTap",
        }
    }

    pub fn into_envelope(self) -> EventEnvelope {
        let event = self.name().to_string();
        let data = match self {
            MapEvent::RegionChanged { camera, animated } => {
                let mut data = Map::new();
                data.insert("camera".to_string(), camera.to_json());
                data.insert("animated".to_string(), json!(animated));
                data
            }
            MapEvent::Tap { coordinate } | MapEvent::LongPress { coordinate } => {
                coordinate_map(coordinate)
            }
            MapEvent::AnnotationTap { id } => {
                let mut data = Map::new();
                data.insert("id".to_string(), Value::String(id));
                data
            }
        };
        EventEnvelope { event, data }
    }
}

/// Wire form of one event: `{"event": name, "data": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventEnvelope {
    pub event: String,
    pub data: Map<String, Value>,
}

pub trait EventSink {
    fn deliver(&mut self, envelope: EventEnvelope);
}

impl<F> EventSink for F
where
    F: FnMut(EventEnvelope),
{
    fn deliver(&mut self, envelope: EventEnvelope) {
        self(envelope)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubscriptionState {
    Unsubscribed,
    Subscribed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Delivery {
    Delivered,
    Dropped,
}

#[derive(Default)]
pub struct EventMultiplexer {
    sink: Option<Box<dyn EventSink>>,
}

impl EventMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SubscriptionState {
        if self.sink.is_some() {
            SubscriptionState::Subscribed
        } else {
            SubscriptionState::Unsubscribed
        }
    }

    /// Installs `sink`; returns true when it replaced an active one.
    pub fn subscribe(&mut self, sink: impl EventSink + 'static) -> bool {
        self.sink.replace(Box::new(sink)).is_some()
    }

    /// Detaches the active sink; returns false when there was none.
    pub fn cancel(&mut self) -> bool {
        self.sink.take().is_some()
    }

    pub fn emit(&mut self, event: MapEvent) -> Delivery {
        match self.sink.as_mut() {
            Some(sink) => {
                sink.deliver(event.into_envelope());
                Delivery::Delivered
            }
            None => {
                tracing::trace!(event = event.name(), "dropping event without subscriber");
                Delivery::Dropped
            }
        }
    }
}

impl fmt::Debug for EventMultiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventMultiplexer")
            .field("state", &self.state())
            .finish()
    }
}
