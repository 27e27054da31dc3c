//! Owner of the canonical record and its persistence.
//!
//! # Responsibility
//! - Load the record from remote, local and default sources.
//! - Persist every mutation locally and mirror it to the remote store.
//! - Apply remote change notifications when the owner polls for them.
//!
//! # Invariants
//! - `load`, `persist` and `poll_remote_changes` never return errors; every
//!   failure is logged and reported in the returned value.
//! - The remote write runs on a cloned snapshot off the owner's thread and
//!   reports through `SyncIndicator`. Writes are not queued or retried.
//! - Without a remote identity no remote call is made.
//! - At most one remote subscription is live at a time.
//! - `load` never writes over an existing remote document it could not use.

use crate::config::CoreConfig;
use crate::model::record::ProductivityRecord;
use crate::reconcile::load::{backfill, reconcile, RecordSource};
use crate::repo::local_repo::{LocalBackup, RepoError};
use crate::sync::remote::{
    DocumentPath, RemoteError, RemoteResult, RemoteStore, RemoteSubscription, SyncStage,
};
use crate::sync::status::{SyncIndicator, SyncState};
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// App namespace used when none is configured.
pub const DEFAULT_APP_ID: &str = "default-app-id";

/// Outcome of the synchronous local half of `persist`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalWriteStatus {
    Written,
    Failed(String),
}

/// Joinable handle to one dispatched remote write.
#[derive(Debug)]
pub struct RemoteSyncHandle {
    handle: JoinHandle<RemoteResult<()>>,
}

impl RemoteSyncHandle {
    /// Blocks until the write finished and returns its result.
    pub fn wait(self) -> RemoteResult<()> {
        self.handle.join().unwrap_or_else(|_| {
            Err(RemoteError::new(
                SyncStage::Write,
                "panicked",
                "remote write thread panicked",
                false,
            ))
        })
    }
}

/// Result of one `persist` call.
#[derive(Debug)]
pub struct PersistOutcome {
    pub local: LocalWriteStatus,
    /// `None` when no remote write was dispatched.
    pub remote: Option<RemoteSyncHandle>,
}

impl PersistOutcome {
    pub fn local_written(&self) -> bool {
        self.local == LocalWriteStatus::Written
    }

    pub fn remote_dispatched(&self) -> bool {
        self.remote.is_some()
    }
}

/// What `load` did.
#[derive(Debug)]
pub struct LoadReport {
    pub source: RecordSource,
    pub remote_error: Option<RemoteError>,
    pub local_error: Option<RepoError>,
    /// Present when the load created the first snapshot.
    pub initial_persist: Option<PersistOutcome>,
}

/// Owns the record plus its local backup and optional remote mirror.
pub struct StateStore {
    record: ProductivityRecord,
    defaults: ProductivityRecord,
    local: Box<dyn LocalBackup>,
    remote: Option<Arc<dyn RemoteStore>>,
    app_id: String,
    user_id: Option<String>,
    indicator: SyncIndicator,
    subscription: Option<RemoteSubscription>,
}

impl StateStore {
    /// Local-only store. The record starts as a copy of `defaults` until
    /// `load` runs.
    pub fn new(defaults: ProductivityRecord, local: Box<dyn LocalBackup>) -> Self {
        Self {
            record: defaults.clone(),
            defaults,
            local,
            remote: None,
            app_id: DEFAULT_APP_ID.to_string(),
            user_id: None,
            indicator: SyncIndicator::new(),
            subscription: None,
        }
    }

    /// Builds a store from runtime configuration: the remote store, when
    /// given, is namespaced by `config.app_id`, and `config.remote_user_id`
    /// becomes the remote identity.
    pub fn from_config(
        defaults: ProductivityRecord,
        local: Box<dyn LocalBackup>,
        config: &CoreConfig,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> Self {
        let mut store = Self::new(defaults, local);
        store.app_id = config.app_id.clone();
        store.remote = remote;
        if let Some(user_id) = &config.remote_user_id {
            store.set_remote_identity(user_id.clone());
        }
        store
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Attaches a remote store namespaced by `app_id`.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteStore>, app_id: impl Into<String>) -> Self {
        self.remote = Some(remote);
        self.app_id = app_id.into();
        self
    }

    /// Establishes the remote identity. Switching users drops the live
    /// subscription.
    pub fn set_remote_identity(&mut self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        if self.user_id.as_deref() != Some(user_id.as_str()) {
            self.subscription = None;
        }
        info!("event=identity_set module=state_store status=ok");
        self.user_id = Some(user_id);
    }

    pub fn clear_remote_identity(&mut self) {
        self.user_id = None;
        self.subscription = None;
        info!("event=identity_cleared module=state_store status=ok");
    }

    pub fn has_remote_identity(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn get(&self) -> &ProductivityRecord {
        &self.record
    }

    /// In-place mutation access. Call `persist` afterwards.
    pub fn get_mut(&mut self) -> &mut ProductivityRecord {
        &mut self.record
    }

    pub fn defaults(&self) -> &ProductivityRecord {
        &self.defaults
    }

    /// Swaps the in-memory record without persisting.
    pub fn replace(&mut self, record: ProductivityRecord) {
        self.record = record;
    }

    pub fn sync_state(&self) -> SyncState {
        self.indicator.current()
    }

    /// Shared handle for observing sync status from another thread.
    pub fn sync_indicator(&self) -> SyncIndicator {
        self.indicator.clone()
    }

    /// Loads the authoritative record. Never fails.
    ///
    /// A remote fetch error falls back to local; an unreadable local backup
    /// falls back to defaults. The result is persisted right away only when
    /// there is nothing to overwrite: with a remote identity, when the remote
    /// document does not exist; without one, when no local snapshot exists.
    /// An existing remote document that could not be repaired is never
    /// written over. A remote-sourced record is mirrored to the local backup.
    pub fn load(&mut self) -> LoadReport {
        let mut remote_error = None;
        let remote_attached = self.remote_target().is_some();
        let remote_snapshot = match self.remote_target() {
            Some((remote, path)) => match remote.fetch(&path) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!(
                        "event=load module=state_store status=remote_error code={} error={}",
                        err.code, err
                    );
                    self.indicator.set(SyncState::Failed {
                        message: err.to_string(),
                    });
                    remote_error = Some(err);
                    None
                }
            },
            None => None,
        };

        let mut local_error = None;
        let local_snapshot = match self.local.read_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("event=load module=state_store status=local_error error={err}");
                local_error = Some(err);
                None
            }
        };

        let reconciled = reconcile(
            remote_snapshot.as_ref(),
            local_snapshot.as_ref(),
            &self.defaults,
        );
        let source = reconciled.source;
        self.record = reconciled.record;

        let needs_initial_persist = if remote_attached {
            remote_error.is_none() && remote_snapshot.is_none()
        } else {
            local_snapshot.is_none()
        };

        let initial_persist = if needs_initial_persist {
            Some(self.persist())
        } else {
            if source == RecordSource::Remote {
                self.mirror_local();
            }
            None
        };

        info!(
            "event=load module=state_store status=ok source={} persisted={}",
            source.as_str(),
            initial_persist.is_some()
        );
        LoadReport {
            source,
            remote_error,
            local_error,
            initial_persist,
        }
    }

    /// Writes the record locally, then dispatches one remote merge-write
    /// when an identity is established.
    pub fn persist(&mut self) -> PersistOutcome {
        let local = self.write_local();

        let Some((remote, path)) = self.remote_target() else {
            self.indicator.set(SyncState::Skipped);
            debug!("event=persist module=state_store status=ok remote=skipped");
            return PersistOutcome {
                local,
                remote: None,
            };
        };

        self.record.last_updated = Utc::now();
        let payload = match serde_json::to_value(&self.record) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("event=persist module=state_store status=error stage=serialize error={err}");
                self.indicator.set(SyncState::Failed {
                    message: err.to_string(),
                });
                return PersistOutcome {
                    local,
                    remote: None,
                };
            }
        };

        self.indicator.set(SyncState::Syncing);
        let indicator = self.indicator.clone();
        let handle = thread::spawn(move || {
            let result = remote.write_merge(&path, &payload);
            match &result {
                Ok(()) => {
                    indicator.set(SyncState::Synced { at: Utc::now() });
                    info!("event=remote_write module=state_store status=ok");
                }
                Err(err) => {
                    indicator.set(SyncState::Failed {
                        message: err.to_string(),
                    });
                    warn!(
                        "event=remote_write module=state_store status=error code={} retryable={}",
                        err.code, err.retryable
                    );
                }
            }
            result
        });

        PersistOutcome {
            local,
            remote: Some(RemoteSyncHandle { handle }),
        }
    }

    /// Replaces the record with a copy of the defaults and persists it.
    pub fn reset_to_defaults(&mut self) -> PersistOutcome {
        self.record = self.defaults.clone();
        info!("event=reset module=state_store status=ok");
        self.persist()
    }

    /// Starts watching the remote document, replacing any live subscription.
    /// Returns `Ok(false)` when there is no remote identity.
    pub fn subscribe_remote(&mut self) -> RemoteResult<bool> {
        self.subscription = None;
        let Some((remote, path)) = self.remote_target() else {
            return Ok(false);
        };
        let subscription = remote.watch(&path)?;
        self.subscription = Some(subscription);
        info!("event=subscribe module=state_store status=ok");
        Ok(true)
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Applies every remote snapshot delivered since the last poll.
    /// Returns how many replaced the record.
    pub fn poll_remote_changes(&mut self) -> usize {
        let Some(subscription) = self.subscription.as_ref() else {
            return 0;
        };

        let mut applied = 0;
        for snapshot in subscription.drain() {
            match backfill(&snapshot, &self.defaults) {
                Ok(record) => {
                    self.record = record;
                    applied += 1;
                }
                Err(err) => {
                    warn!("event=remote_change module=state_store status=skipped error={err}");
                }
            }
        }

        if applied > 0 {
            self.mirror_local();
            debug!("event=remote_change module=state_store status=ok applied={applied}");
        }
        applied
    }

    /// Tears down the remote subscription.
    pub fn shutdown(&mut self) {
        if self.subscription.take().is_some() {
            info!("event=shutdown module=state_store status=ok");
        }
    }

    fn remote_target(&self) -> Option<(Arc<dyn RemoteStore>, DocumentPath)> {
        let remote = self.remote.as_ref()?;
        let user_id = self.user_id.as_ref()?;
        Some((
            Arc::clone(remote),
            DocumentPath::new(self.app_id.clone(), user_id.clone()),
        ))
    }

    fn write_local(&self) -> LocalWriteStatus {
        match self.local.write_snapshot(&self.record) {
            Ok(()) => LocalWriteStatus::Written,
            Err(err) => {
                warn!("event=local_write module=state_store status=error error={err}");
                LocalWriteStatus::Failed(err.to_string())
            }
        }
    }

    fn mirror_local(&self) {
        let _ = self.write_local();
    }
}

#[cfg(test)]
mod tests {
    use super::{StateStore, DEFAULT_APP_ID};
    use crate::model::record::default_record;
    use crate::reconcile::load::RecordSource;
    use crate::repo::local_repo::{LocalBackup, SqliteLocalBackup};
    use crate::sync::memory::MemoryRemoteStore;
    use crate::sync::remote::{DocumentPath, RemoteStore};
    use crate::sync::status::SyncState;
    use std::sync::Arc;

    fn local_store() -> StateStore {
        let backup = SqliteLocalBackup::in_memory().unwrap();
        StateStore::new(default_record(), Box::new(backup))
    }

    #[test]
    fn first_local_load_uses_defaults_and_persists() {
        let mut store = local_store();
        let report = store.load();
        assert_eq!(report.source, RecordSource::Defaults);
        let outcome = report.initial_persist.unwrap();
        assert!(outcome.local_written());
        assert!(!outcome.remote_dispatched());
        assert_eq!(store.sync_state(), SyncState::Skipped);
    }

    #[test]
    fn persist_then_wait_reaches_remote() {
        let remote = Arc::new(MemoryRemoteStore::new());
        let backup = SqliteLocalBackup::in_memory().unwrap();
        let mut store = StateStore::new(default_record(), Box::new(backup))
            .with_remote(remote.clone(), DEFAULT_APP_ID);
        store.set_remote_identity("user-1");
        store.get_mut().journal = "synced".to_string();

        let outcome = store.persist();
        outcome.remote.unwrap().wait().unwrap();

        let path = DocumentPath::new(DEFAULT_APP_ID, "user-1");
        let document = remote.fetch(&path).unwrap().unwrap();
        assert_eq!(document["journal"], "synced");
        assert!(matches!(store.sync_state(), SyncState::Synced { .. }));
    }

    #[test]
    fn replace_does_not_persist() {
        let backup = SqliteLocalBackup::in_memory().unwrap();
        let mut store = StateStore::new(default_record(), Box::new(backup));
        let mut record = default_record();
        record.journal = "swapped".to_string();
        store.replace(record);
        assert_eq!(store.get().journal, "swapped");
        assert!(store.local.read_snapshot().unwrap().is_none());
    }
}
