use crate::models::{Category, Settings};

/// Event names a host emits `CommandCtx` notifications under.
pub const EVENT_STATE_UPDATED: &str = "state_updated";
pub const EVENT_SYNC_STATUS: &str = "sync_status_changed";

#[derive(Debug, Clone, serde::Serialize)]
pub struct StatePayload {
    pub categories: Vec<Category>,
    pub settings: Settings,
}
