//! SQLite storage for the local snapshot of the productivity record.
//!
//! The database holds a single table, `local_snapshots`, keyed by snapshot
//! name. Only one row (`proPlusData`) is used: the whole record serialized as
//! JSON plus a millisecond write timestamp. Row access lives in
//! `repo::local_repo`; this module only opens, configures and migrates.
//!
//! # Responsibility
//! - Open file-backed or in-memory connections for `SqliteLocalBackup`.
//! - Bring the schema to `migrations::latest_version()` before first use.
//!
//! # Invariants
//! - Schema version is `PRAGMA user_version`; a file written by a newer
//!   build is refused rather than downgraded, so its snapshot stays intact.
//! - No snapshot is read or written before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure opening or migrating the snapshot database.
#[derive(Debug)]
pub enum DbError {
    /// SQLite rejected a statement or could not open the file.
    Sqlite(rusqlite::Error),
    /// The parent directory of the database file could not be created.
    Io(std::io::Error),
    /// The snapshot file was written by a newer schema.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "snapshot database error: {err}"),
            Self::Io(err) => write!(f, "cannot create snapshot directory: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "snapshot database schema {db_version} is newer than supported {latest_supported}; refusing to open"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<std::io::Error> for DbError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
