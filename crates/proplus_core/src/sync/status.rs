//! Out-of-band sync status.
//!
//! The background remote write reports here; callers read the latest state
//! without blocking on the write itself.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};

/// Last known state of the remote mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing attempted yet.
    Idle,
    /// A remote write is in flight.
    Syncing,
    Synced { at: DateTime<Utc> },
    Failed { message: String },
    /// The last persist had no remote identity, so only the local write ran.
    Skipped,
}

impl SyncState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Syncing => "syncing",
            Self::Synced { .. } => "synced",
            Self::Failed { .. } => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Shared handle to the current `SyncState`. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct SyncIndicator {
    state: Arc<Mutex<SyncState>>,
}

impl Default for SyncIndicator {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(SyncState::Idle)),
        }
    }
}

impl SyncIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> SyncState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, next: SyncState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}
