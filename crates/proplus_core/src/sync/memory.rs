//! In-process remote store.
//!
//! Behaves like the hosted document store: merge-style writes, change
//! notifications to every live watcher. `set_offline` simulates an
//! unreachable backend.

use crate::sync::remote::{
    DocumentPath, RemoteError, RemoteResult, RemoteStore, RemoteSubscription, SyncStage,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
pub struct MemoryRemoteStore {
    documents: Mutex<HashMap<DocumentPath, Value>>,
    watchers: Mutex<HashMap<DocumentPath, Vec<Sender<Value>>>>,
    offline: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with code `unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of registered watchers for `path`. Dropped subscriptions are
    /// pruned on the next change notification.
    pub fn watcher_count(&self, path: &DocumentPath) -> usize {
        lock(&self.watchers).get(path).map_or(0, Vec::len)
    }

    /// Stores `document` as-is, replacing any previous one, and notifies
    /// watchers. Simulates a change made by another device.
    pub fn put_document(&self, path: &DocumentPath, document: Value) {
        lock(&self.documents).insert(path.clone(), document.clone());
        self.notify(path, &document);
    }

    fn ensure_online(&self, stage: SyncStage) -> RemoteResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::new(
                stage,
                "unavailable",
                "remote store is offline",
                true,
            ));
        }
        Ok(())
    }

    fn notify(&self, path: &DocumentPath, document: &Value) {
        if let Some(senders) = lock(&self.watchers).get_mut(path) {
            senders.retain(|sender| sender.send(document.clone()).is_ok());
        }
    }
}

impl RemoteStore for MemoryRemoteStore {
    fn fetch(&self, path: &DocumentPath) -> RemoteResult<Option<Value>> {
        self.ensure_online(SyncStage::Fetch)?;
        Ok(lock(&self.documents).get(path).cloned())
    }

    fn write_merge(&self, path: &DocumentPath, payload: &Value) -> RemoteResult<()> {
        self.ensure_online(SyncStage::Write)?;
        let Some(fields) = payload.as_object() else {
            return Err(RemoteError::new(
                SyncStage::Write,
                "invalid_argument",
                "payload must be a JSON object",
                false,
            ));
        };

        let merged = {
            let mut documents = lock(&self.documents);
            let document = documents
                .entry(path.clone())
                .or_insert_with(|| Value::Object(Default::default()));
            if !document.is_object() {
                *document = Value::Object(Default::default());
            }
            if let Value::Object(stored) = document {
                for (key, value) in fields {
                    stored.insert(key.clone(), value.clone());
                }
            }
            document.clone()
        };

        self.writes.fetch_add(1, Ordering::SeqCst);
        self.notify(path, &merged);
        Ok(())
    }

    fn watch(&self, path: &DocumentPath) -> RemoteResult<RemoteSubscription> {
        self.ensure_online(SyncStage::Watch)?;
        let (sender, receiver) = mpsc::channel();
        lock(&self.watchers)
            .entry(path.clone())
            .or_default()
            .push(sender);
        Ok(RemoteSubscription::new(path.clone(), receiver))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::MemoryRemoteStore;
    use crate::sync::remote::{DocumentPath, RemoteStore, SyncStage};
    use serde_json::json;

    fn path() -> DocumentPath {
        DocumentPath::new("app", "user-1")
    }

    #[test]
    fn write_merge_keeps_fields_absent_from_payload() {
        let store = MemoryRemoteStore::new();
        store
            .write_merge(&path(), &json!({ "journal": "a", "habits": [] }))
            .unwrap();
        store.write_merge(&path(), &json!({ "journal": "b" })).unwrap();

        let document = store.fetch(&path()).unwrap().unwrap();
        assert_eq!(document, json!({ "journal": "b", "habits": [] }));
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn watchers_receive_merged_documents() {
        let store = MemoryRemoteStore::new();
        let subscription = store.watch(&path()).unwrap();
        store.write_merge(&path(), &json!({ "journal": "x" })).unwrap();

        let delivered = subscription.drain();
        assert_eq!(delivered, vec![json!({ "journal": "x" })]);
        assert!(subscription.drain().is_empty());
    }

    #[test]
    fn offline_store_reports_stage() {
        let store = MemoryRemoteStore::new();
        store.set_offline(true);
        let err = store.fetch(&path()).unwrap_err();
        assert_eq!(err.stage, SyncStage::Fetch);
        assert_eq!(err.code, "unavailable");
        assert!(err.retryable);
    }

    #[test]
    fn dropped_subscription_is_pruned() {
        let store = MemoryRemoteStore::new();
        let subscription = store.watch(&path()).unwrap();
        assert_eq!(store.watcher_count(&path()), 1);
        drop(subscription);
        store.write_merge(&path(), &json!({ "journal": "y" })).unwrap();
        assert_eq!(store.watcher_count(&path()), 0);
    }
}
