//! Reconciliation of foreign snapshots with the compiled defaults.
//!
//! # Responsibility
//! - Load-time: choose and repair the authoritative record.
//! - Import-time: validate a candidate and merge or overwrite.

pub mod import;
pub mod load;

pub use import::{
    parse_import, validate_import, ImportCandidate, ImportError, ImportMode, ImportSummary,
};
pub use load::{backfill, reconcile, RecordSource, Reconciled, ShapeError};
