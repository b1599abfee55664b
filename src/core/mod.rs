// Engine-agnostic pieces: error model, geometry codec, registry, camera policy, events.
pub mod camera;
pub mod error;
pub mod events;
pub mod geo;
pub mod registry;
