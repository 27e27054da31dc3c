//! Remote document store SPI.

use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{Receiver, TryRecvError};

/// Name of the per-user document holding the record.
pub const RECORD_DOCUMENT_NAME: &str = "proPlusData";

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Remote operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Fetch,
    Write,
    Watch,
}

impl SyncStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Write => "write",
            Self::Watch => "watch",
        }
    }
}

/// Structured remote failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub stage: SyncStage,
    /// Stable machine-readable code, e.g. `unavailable`.
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl RemoteError {
    pub fn new(
        stage: SyncStage,
        code: impl Into<String>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            stage,
            code: code.into(),
            message: message.into(),
            retryable,
        }
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "remote {} failed ({}): {}",
            self.stage.as_str(),
            self.code,
            self.message
        )
    }
}

impl Error for RemoteError {}

/// Address of one user's record document:
/// `artifacts/{app_id}/users/{user_id}/proPlusData`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    app_id: String,
    user_id: String,
}

impl DocumentPath {
    pub fn new(app_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Display for DocumentPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "artifacts/{}/users/{}/{}",
            self.app_id, self.user_id, RECORD_DOCUMENT_NAME
        )
    }
}

/// Remote document store holding one JSON document per user.
///
/// Implementations are shared with the background write thread, hence
/// `Send + Sync`.
pub trait RemoteStore: Send + Sync {
    /// Returns the stored document, or `None` when it does not exist.
    fn fetch(&self, path: &DocumentPath) -> RemoteResult<Option<Value>>;
    /// Merges `payload`'s top-level fields into the stored document,
    /// creating it when missing.
    fn write_merge(&self, path: &DocumentPath, payload: &Value) -> RemoteResult<()>;
    /// Starts delivering the full document after every change.
    fn watch(&self, path: &DocumentPath) -> RemoteResult<RemoteSubscription>;
}

/// Live change feed for one document. Dropping it unsubscribes.
#[derive(Debug)]
pub struct RemoteSubscription {
    path: DocumentPath,
    receiver: Receiver<Value>,
}

impl RemoteSubscription {
    pub fn new(path: DocumentPath, receiver: Receiver<Value>) -> Self {
        Self { path, receiver }
    }

    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    /// Returns every snapshot delivered since the last call, oldest first,
    /// without blocking.
    pub fn drain(&self) -> Vec<Value> {
        let mut snapshots = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        snapshots
    }
}
