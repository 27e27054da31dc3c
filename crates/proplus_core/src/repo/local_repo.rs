//! Local backup contract and SQLite implementation.
//!
//! # Responsibility
//! - Store and load the whole serialized record under a single key.
//!
//! # Invariants
//! - Writes replace the previous snapshot atomically (single UPSERT).
//! - Unparseable stored payloads are reported, not masked; the caller decides
//!   the fallback.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::record::ProductivityRecord;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Storage key of the single local snapshot.
pub const LOCAL_SNAPSHOT_KEY: &str = "proPlusData";

pub type RepoResult<T> = Result<T, RepoError>;

/// Local backup error.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Serialize(serde_json::Error),
    /// The stored payload is not valid JSON.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to serialize record: {err}"),
            Self::InvalidData(message) => write!(f, "invalid local snapshot: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Local durable storage for one record snapshot.
pub trait LocalBackup {
    /// Returns the stored snapshot as raw JSON, or `None` when nothing is
    /// stored yet.
    fn read_snapshot(&self) -> RepoResult<Option<Value>>;
    /// Replaces the stored snapshot.
    fn write_snapshot(&self, record: &ProductivityRecord) -> RepoResult<()>;
}

/// SQLite-backed local backup.
pub struct SqliteLocalBackup {
    conn: Connection,
}

impl SqliteLocalBackup {
    /// Opens (and migrates) the backup database at `path`.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a throwaway in-memory backup.
    pub fn in_memory() -> RepoResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl LocalBackup for SqliteLocalBackup {
    fn read_snapshot(&self) -> RepoResult<Option<Value>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM local_snapshots WHERE snapshot_key = ?1;",
                [LOCAL_SNAPSHOT_KEY],
                |row| row.get(0),
            )
            .optional()?;

        payload
            .map(|text| {
                serde_json::from_str(&text).map_err(|err| RepoError::InvalidData(err.to_string()))
            })
            .transpose()
    }

    fn write_snapshot(&self, record: &ProductivityRecord) -> RepoResult<()> {
        let payload = serde_json::to_string(record)?;
        self.conn.execute(
            "INSERT INTO local_snapshots (snapshot_key, payload, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(snapshot_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![LOCAL_SNAPSHOT_KEY, payload],
        )?;
        debug!(
            "event=local_write module=repo status=ok bytes={}",
            payload.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{LocalBackup, RepoError, SqliteLocalBackup, LOCAL_SNAPSHOT_KEY};
    use crate::model::record::default_record;

    #[test]
    fn empty_backup_reads_none() {
        let backup = SqliteLocalBackup::in_memory().unwrap();
        assert!(backup.read_snapshot().unwrap().is_none());
    }

    #[test]
    fn write_replaces_previous_snapshot() {
        let backup = SqliteLocalBackup::in_memory().unwrap();
        let mut record = default_record();
        backup.write_snapshot(&record).unwrap();
        record.journal = "second".to_string();
        backup.write_snapshot(&record).unwrap();

        let stored = backup.read_snapshot().unwrap().unwrap();
        assert_eq!(stored["journal"], "second");
        let rows: i64 = backup
            .conn
            .query_row("SELECT COUNT(*) FROM local_snapshots;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn corrupt_payload_is_reported() {
        let backup = SqliteLocalBackup::in_memory().unwrap();
        backup
            .conn
            .execute(
                "INSERT INTO local_snapshots (snapshot_key, payload) VALUES (?1, '{oops');",
                [LOCAL_SNAPSHOT_KEY],
            )
            .unwrap();
        assert!(matches!(
            backup.read_snapshot().unwrap_err(),
            RepoError::InvalidData(_)
        ));
    }
}
