//! Purpose: Own the live map decorations keyed by caller-assigned identifiers.
//! Exports: `DecorationRegistry`, `DecorationHandle`, `DecorationRef`, `PointMarker`, `Shape`,
//! `Style`, `MarkerEntry`, `OverlayEntry`, `Inserted`.
//! Role: Authoritative store; the engine only ever sees handles and borrowed geometry.
//! Invariants: Markers and overlays live in independent id namespaces.
//! Invariants: A style exists iff its overlay exists (both live in one `OverlayEntry`).
//! Invariants: Handle to id lookups are explicit maps, never scans over entries.

use std::collections::HashMap;

use getrandom::fill as fill_random;

use super::error::{Error, ErrorKind};
use super::geo::{Argb, Coordinate};

/// Engine-facing identity of a live decoration. Never reused within a registry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct DecorationHandle(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct PointMarker {
    pub coordinate: Coordinate,
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Polyline { points: Vec<Coordinate> },
    /// Implicitly closed; the last point connects back to the first.
    Polygon { points: Vec<Coordinate> },
    Circle { center: Coordinate, radius_meters: f64 },
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Polyline { .. } => "polyline",
            Shape::Polygon { .. } => "polygon",
            Shape::Circle { .. } => "circle",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    pub stroke: Argb,
    pub fill: Option<Argb>,
    pub line_width: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DecorationRef<'a> {
    Marker(&'a PointMarker),
    Overlay(&'a Shape),
}

#[derive(Clone, Debug, PartialEq)]
pub struct MarkerEntry {
    pub id: String,
    pub handle: DecorationHandle,
    pub marker: PointMarker,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayEntry {
    pub id: String,
    pub handle: DecorationHandle,
    pub shape: Shape,
    pub style: Style,
}

/// Result of an insert: the id handed back to the host, the new handle, and
/// whatever entry previously held that id.
#[derive(Clone, Debug, PartialEq)]
pub struct Inserted<E> {
    pub id: String,
    pub handle: DecorationHandle,
    pub displaced: Option<E>,
}

#[derive(Debug, Default)]
pub struct DecorationRegistry {
    next_handle: u64,
    markers: HashMap<String, MarkerEntry>,
    marker_ids: HashMap<DecorationHandle, String>,
    overlays: HashMap<String, OverlayEntry>,
    overlay_ids: HashMap<DecorationHandle, String>,
}

impl DecorationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_marker(
        &mut self,
        id: Option<String>,
        marker: PointMarker,
    ) -> Result<Inserted<MarkerEntry>, Error> {
        let id = match id {
            Some(id) => id,
            None => fresh_id(|candidate| self.markers.contains_key(candidate))?,
        };
        let handle = self.allocate_handle();
        let displaced = self.remove_marker(&id);
        self.marker_ids.insert(handle, id.clone());
        self.markers.insert(
            id.clone(),
            MarkerEntry {
                id: id.clone(),
                handle,
                marker,
            },
        );
        Ok(Inserted {
            id,
            handle,
            displaced,
        })
    }

    /// Removes the marker if present. `None` means the id was unknown, which is not an error.
    pub fn remove_marker(&mut self, id: &str) -> Option<MarkerEntry> {
        let entry = self.markers.remove(id)?;
        self.marker_ids.remove(&entry.handle);
        Some(entry)
    }

    pub fn insert_overlay(
        &mut self,
        id: Option<String>,
        shape: Shape,
        style: Style,
    ) -> Result<Inserted<OverlayEntry>, Error> {
        let id = match id {
            Some(id) => id,
            None => fresh_id(|candidate| self.overlays.contains_key(candidate))?,
        };
        let handle = self.allocate_handle();
        let displaced = self.remove_overlay(&id);
        self.overlay_ids.insert(handle, id.clone());
        self.overlays.insert(
            id.clone(),
            OverlayEntry {
                id: id.clone(),
                handle,
                shape,
                style,
            },
        );
        Ok(Inserted {
            id,
            handle,
            displaced,
        })
    }

    pub fn remove_overlay(&mut self, id: &str) -> Option<OverlayEntry> {
        let entry = self.overlays.remove(id)?;
        self.overlay_ids.remove(&entry.handle);
        Some(entry)
    }

    /// Empties the overlay namespace and hands back the removed entries.
    pub fn clear_all_overlays(&mut self) -> Vec<OverlayEntry> {
        self.overlay_ids.clear();
        let mut drained: Vec<OverlayEntry> =
            self.overlays.drain().map(|(_, entry)| entry).collect();
        drained.sort_by_key(|entry| entry.handle);
        drained
    }

    pub fn style_for(&self, overlay_id: &str) -> Option<&Style> {
        self.overlays.get(overlay_id).map(|entry| &entry.style)
    }

    pub fn overlay(&self, id: &str) -> Option<&OverlayEntry> {
        self.overlays.get(id)
    }

    pub fn overlay_for_handle(&self, handle: DecorationHandle) -> Option<&OverlayEntry> {
        let id = self.overlay_ids.get(&handle)?;
        self.overlays.get(id)
    }

    pub fn marker(&self, id: &str) -> Option<&MarkerEntry> {
        self.markers.get(id)
    }

    pub fn marker_id_for_handle(&self, handle: DecorationHandle) -> Option<&str> {
        self.marker_ids.get(&handle).map(String::as_str)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    fn allocate_handle(&mut self) -> DecorationHandle {
        self.next_handle += 1;
        DecorationHandle(self.next_handle)
    }
}

/// Random 128-bit identifier in UUID v4 text form, retried until it is not live.
fn fresh_id(is_live: impl Fn(&str) -> bool) -> Result<String, Error> {
    loop {
        let candidate = random_uuid()?;
        if !is_live(&candidate) {
            return Ok(candidate);
        }
    }
}

fn random_uuid() -> Result<String, Error> {
    let mut bytes = [0u8; 16];
    fill_random(&mut bytes).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message(format!("failed to generate decoration id: {err}"))
    })?;
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let mut out = String::with_capacity(36);
    for (index, byte) in bytes.iter().enumerate() {
        if matches!(index, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        out.push_str(&format!("{byte:02X}"));
    }
    Ok(out)
}
