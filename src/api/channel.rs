//! Purpose: Name the per-view method and event channels a host transport binds to.
//! Exports: `ChannelNames`, `VIEW_TYPE_ID`.
//! Role: Keeps host-side and platform-side naming in one place.
//! Invariants: Names are a pure function of the view id.

pub const VIEW_TYPE_ID: &str = "com.yourorg.flutter_macos_maps/map";

const CHANNEL_PREFIX: &str = "flutter_macos_maps";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChannelNames {
    pub methods: String,
    pub events: String,
}

impl ChannelNames {
    pub fn for_view(view_id: i64) -> Self {
        Self {
            methods: format!("{CHANNEL_PREFIX}/map_{view_id}"),
            events: format!("{CHANNEL_PREFIX}/events_{view_id}"),
        }
    }
}
