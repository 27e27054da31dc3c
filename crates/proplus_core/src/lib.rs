//! Core of the ProPlus personal productivity dashboard.
//!
//! Owns the productivity record (settings, weekly schedule, habits,
//! projects, journal), the habit streak engine, reconciliation of remote,
//! local and imported snapshots, and the persistence lifecycle.

pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod repo;
pub mod service;
pub mod sync;

pub use config::{ConfigError, CoreConfig};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::habit::{Habit, HabitEntry};
pub use model::project::{Project, ProjectStatus, Task};
pub use model::record::{default_record, ProductivityRecord, Settings, Theme};
pub use model::schedule::{DaySchedule, Exercise, GymSession, Schedule, ScheduleEvent};
pub use repo::local_repo::{LocalBackup, RepoError, RepoResult, SqliteLocalBackup};
pub use service::state_store::StateStore;
pub use sync::memory::MemoryRemoteStore;
pub use sync::remote::{DocumentPath, RemoteError, RemoteResult, RemoteStore};
pub use sync::status::{SyncIndicator, SyncState};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
