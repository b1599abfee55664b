//! Purpose: Library crate for `mapbridge`, the host <-> map-surface command/event bridge.
//! Exports: `api` (public bridge surface), `core` (codec, registry, camera, events, errors),
//! `config` (bridge tunables).
//! Role: Backs the `mapbridge` stdio host and any platform glue embedding a map widget.
//! Invariants: One `MapBridge` per logical map instance; no global state.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod config;
pub mod core;
