//! Checkpointing
//!
//! A plain keyed snapshot store: run id → most recently committed
//! [`CrawlState`]. The loop commits synchronously at every step boundary, so
//! when a run aborts (step budget blown, provider failure, panic upstream)
//! the caller can still produce a report from the last good snapshot instead
//! of losing all progress.

use crate::state::CrawlState;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Keyed store of the latest committed state per run
#[derive(Default)]
pub struct CheckpointStore {
    slots: RwLock<HashMap<String, CrawlState>>,
}

impl CheckpointStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit a snapshot for a run, replacing any previous one.
    ///
    /// Stores an owned copy; the running loop keeps exclusive ownership of
    /// the live state.
    pub fn commit(&self, run_id: &str, state: &CrawlState) {
        self.slots
            .write()
            .insert(run_id.to_string(), state.clone());
    }

    /// The most recently committed state for a run, if any
    pub fn latest_snapshot(&self, run_id: &str) -> Option<CrawlState> {
        self.slots.read().get(run_id).cloned()
    }
}
