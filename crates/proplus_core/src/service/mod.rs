//! Use-case services over the productivity record.
//!
//! # Responsibility
//! - Validate form-style input and apply it to the record.
//! - Own the record's load/persist lifecycle (`StateStore`).
//!
//! # Invariants
//! - Mutation services validate before mutating; a rejected call leaves the
//!   record untouched.
//! - Mutation services never persist; callers follow a successful mutation
//!   with `StateStore::persist`.

pub mod habit_service;
pub mod mutation_error;
pub mod project_service;
pub mod schedule_service;
pub mod settings_service;
pub mod state_store;

pub use habit_service::{HabitDraft, HabitService, HabitToggle};
pub use mutation_error::{MutationError, MutationResult};
pub use project_service::{ProjectDraft, ProjectService};
pub use schedule_service::{
    CsvImportError, CsvImportSummary, EventKind, ScheduleEventDraft, ScheduleService,
};
pub use settings_service::SettingsService;
pub use state_store::{LoadReport, LocalWriteStatus, PersistOutcome, RemoteSyncHandle, StateStore};
