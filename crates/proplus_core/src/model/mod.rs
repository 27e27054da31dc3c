//! Productivity domain model.
//!
//! # Responsibility
//! - Define the record tree persisted locally, remotely and in export files.
//! - Keep wire naming (camelCase) in one place.
//!
//! # Invariants
//! - Every entity is owned by exactly one parent; there are no shared
//!   references or cycles.
//! - Deletion removes an entity from its parent sequence; there are no
//!   tombstones.

pub mod dates;
pub mod habit;
pub mod project;
pub mod record;
pub mod schedule;

use uuid::Uuid;

/// Generates a fresh entity id such as `task-3f2a...`.
pub fn new_entity_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}
