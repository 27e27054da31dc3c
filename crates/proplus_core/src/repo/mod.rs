//! Local durable backup of the productivity record.
//!
//! # Responsibility
//! - Define the local backup contract used by `StateStore`.
//! - Isolate SQLite details from reconciliation and services.
//!
//! # Invariants
//! - The backup holds exactly one serialized record under one key.
//! - Reads return raw JSON; shape repair belongs to reconciliation.

pub mod local_repo;
