//! Remote document store contracts and sync status reporting.
//!
//! # Responsibility
//! - Define the remote store SPI used by `StateStore`.
//! - Report sync progress out of band through `SyncIndicator`.
//! - Ship an in-memory remote store for tests and local tooling.
//!
//! # Invariants
//! - Remote failures are values (`RemoteError`), never panics.
//! - Writes use top-level merge semantics: fields absent from the payload are
//!   left untouched in the stored document.

pub mod memory;
pub mod remote;
pub mod status;
