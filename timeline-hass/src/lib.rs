//! Host-facing derivation layer for the dashboard timeline cards.
//!
//! Normalizes the home-automation host's history payloads and live state
//! map, and implements the two card cores: the cat activity timeline and the
//! server error monitor. Rendering stays in the embedding front end; these
//! types produce the event list and display parameters it consumes.

pub mod cat;
pub mod history;
pub mod server;
pub mod state;

pub use cat::{CameraEntities, CatCardConfig, CatEntities, CatRenderPayload, CatTimeline};
pub use history::{parse_history, HistoryRequest, RawSnapshot, ValueIndex};
pub use server::{LevelStyle, ServerMonitor, ServerMonitorConfig, ServerRenderPayload};
pub use state::{EntityState, StateMap};

/// Configured strings are unset when absent, empty, or whitespace.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
