use proplus_core::reconcile::RecordSource;
use proplus_core::repo::local_repo::{LocalBackup, RepoError, RepoResult};
use proplus_core::service::LocalWriteStatus;
use proplus_core::{
    default_record, CoreConfig, DocumentPath, MemoryRemoteStore, ProductivityRecord, RemoteStore,
    SqliteLocalBackup, StateStore, SyncState,
};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

const APP_ID: &str = "test-app";
const USER_ID: &str = "user-1";

fn path() -> DocumentPath {
    DocumentPath::new(APP_ID, USER_ID)
}

/// Backup whose stored snapshot and write count are visible to the test.
#[derive(Clone, Default)]
struct SharedBackup {
    stored: Rc<RefCell<Option<Value>>>,
    writes: Rc<RefCell<usize>>,
}

impl LocalBackup for SharedBackup {
    fn read_snapshot(&self) -> RepoResult<Option<Value>> {
        Ok(self.stored.borrow().clone())
    }

    fn write_snapshot(&self, record: &ProductivityRecord) -> RepoResult<()> {
        *self.stored.borrow_mut() = Some(serde_json::to_value(record)?);
        *self.writes.borrow_mut() += 1;
        Ok(())
    }
}

struct BrokenBackup;

impl LocalBackup for BrokenBackup {
    fn read_snapshot(&self) -> RepoResult<Option<Value>> {
        Err(RepoError::InvalidData("disk unreadable".to_string()))
    }

    fn write_snapshot(&self, _record: &ProductivityRecord) -> RepoResult<()> {
        Err(RepoError::InvalidData("disk full".to_string()))
    }
}

fn remote_store(backup: SharedBackup, remote: &Arc<MemoryRemoteStore>) -> StateStore {
    StateStore::new(default_record(), Box::new(backup)).with_remote(remote.clone(), APP_ID)
}

#[test]
fn persist_without_identity_writes_locally_only() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let backup = SharedBackup::default();
    let mut store = remote_store(backup.clone(), &remote);
    store.get_mut().journal = "offline entry".to_string();

    let outcome = store.persist();

    assert!(outcome.local_written());
    assert!(!outcome.remote_dispatched());
    assert_eq!(remote.write_count(), 0);
    assert_eq!(store.sync_state(), SyncState::Skipped);
    assert_eq!(
        backup.stored.borrow().as_ref().unwrap()["journal"],
        "offline entry"
    );
}

#[test]
fn first_load_with_identity_creates_remote_snapshot() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let mut store = remote_store(SharedBackup::default(), &remote);
    store.set_remote_identity(USER_ID);

    let report = store.load();
    assert_eq!(report.source, RecordSource::Defaults);
    report.initial_persist.unwrap().remote.unwrap().wait().unwrap();

    let document = remote.fetch(&path()).unwrap().unwrap();
    assert_eq!(document["habits"].as_array().unwrap().len(), 4);
    assert!(matches!(store.sync_state(), SyncState::Synced { .. }));
}

#[test]
fn remote_snapshot_wins_and_is_mirrored_locally() {
    let remote = Arc::new(MemoryRemoteStore::new());
    remote.put_document(&path(), json!({ "journal": "from phone", "habits": [] }));
    let backup = SharedBackup::default();
    *backup.stored.borrow_mut() = Some(json!({ "journal": "from laptop" }));
    let mut store = remote_store(backup.clone(), &remote);
    store.set_remote_identity(USER_ID);

    let report = store.load();

    assert_eq!(report.source, RecordSource::Remote);
    assert!(report.initial_persist.is_none());
    assert_eq!(store.get().journal, "from phone");
    assert!(store.get().habits.is_empty());
    assert_eq!(store.get().projects.len(), 2);
    assert_eq!(remote.write_count(), 0);
    assert_eq!(
        backup.stored.borrow().as_ref().unwrap()["journal"],
        "from phone"
    );
}

#[test]
fn unreachable_remote_falls_back_to_local_without_writing() {
    let remote = Arc::new(MemoryRemoteStore::new());
    remote.set_offline(true);
    let backup = SharedBackup::default();
    *backup.stored.borrow_mut() = Some(json!({ "journal": "local copy" }));
    let mut store = remote_store(backup.clone(), &remote);
    store.set_remote_identity(USER_ID);

    let report = store.load();

    assert_eq!(report.source, RecordSource::Local);
    assert_eq!(report.remote_error.unwrap().code, "unavailable");
    assert!(report.initial_persist.is_none());
    assert_eq!(store.get().journal, "local copy");
    assert_eq!(*backup.writes.borrow(), 0);
    assert!(matches!(store.sync_state(), SyncState::Failed { .. }));
}

#[test]
fn failed_remote_write_is_reported_not_raised() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let mut store = remote_store(SharedBackup::default(), &remote);
    store.set_remote_identity(USER_ID);
    remote.set_offline(true);

    let outcome = store.persist();
    assert!(outcome.local_written());
    let err = outcome.remote.unwrap().wait().unwrap_err();

    assert!(err.retryable);
    match store.sync_state() {
        SyncState::Failed { message } => assert!(message.contains("offline")),
        other => panic!("unexpected state: {other:?}"),
    }
}

#[test]
fn broken_local_backup_never_blocks_the_session() {
    let mut store = StateStore::new(default_record(), Box::new(BrokenBackup));

    let report = store.load();
    assert_eq!(report.source, RecordSource::Defaults);
    assert!(report.local_error.is_some());
    let outcome = report.initial_persist.unwrap();
    assert!(matches!(outcome.local, LocalWriteStatus::Failed(_)));

    store.get_mut().journal = "still editable".to_string();
    assert!(!store.persist().local_written());
    assert_eq!(store.get().journal, "still editable");
}

#[test]
fn remote_changes_replace_the_record_on_poll() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let backup = SharedBackup::default();
    let mut store = remote_store(backup.clone(), &remote);
    store.set_remote_identity(USER_ID);
    assert!(store.subscribe_remote().unwrap());

    remote.put_document(&path(), json!({ "journal": "edited elsewhere" }));
    remote.put_document(&path(), json!("not a record"));

    assert_eq!(store.poll_remote_changes(), 1);
    assert_eq!(store.get().journal, "edited elsewhere");
    assert_eq!(store.get().habits.len(), 4);
    assert_eq!(
        backup.stored.borrow().as_ref().unwrap()["journal"],
        "edited elsewhere"
    );
    assert_eq!(store.poll_remote_changes(), 0);
}

#[test]
fn new_subscription_replaces_previous_one() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let mut store = remote_store(SharedBackup::default(), &remote);
    store.set_remote_identity(USER_ID);

    store.subscribe_remote().unwrap();
    store.subscribe_remote().unwrap();
    remote.put_document(&path(), json!({ "journal": "once" }));

    assert_eq!(store.poll_remote_changes(), 1);
    assert_eq!(remote.watcher_count(&path()), 1);

    store.shutdown();
    assert!(!store.is_subscribed());
    remote.put_document(&path(), json!({ "journal": "after shutdown" }));
    assert_eq!(remote.watcher_count(&path()), 0);
    assert_eq!(store.get().journal, "once");
}

#[test]
fn subscribing_without_identity_is_a_no_op() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let mut store = remote_store(SharedBackup::default(), &remote);
    assert!(!store.subscribe_remote().unwrap());
    assert!(!store.is_subscribed());
}

#[test]
fn sqlite_backup_round_trips_through_load() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("proplus.sqlite3");
    {
        let backup = SqliteLocalBackup::open(&db_path).unwrap();
        let mut store = StateStore::new(default_record(), Box::new(backup));
        store.load();
        store.get_mut().journal = "persisted".to_string();
        assert!(store.persist().local_written());
    }

    let backup = SqliteLocalBackup::open(&db_path).unwrap();
    let mut store = StateStore::new(default_record(), Box::new(backup));
    let report = store.load();
    assert_eq!(report.source, RecordSource::Local);
    assert_eq!(store.get().journal, "persisted");
}

#[test]
fn wrong_typed_remote_field_is_repaired_without_losing_user_data() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let user_document = json!({
        "journal": 42,
        "habits": [{ "id": "habit-mine", "text": "Swim", "priority": 2, "streak": 0, "history": [] }],
        "projects": []
    });
    remote.put_document(&path(), user_document.clone());
    let mut store = remote_store(SharedBackup::default(), &remote);
    store.set_remote_identity(USER_ID);

    let report = store.load();

    assert_eq!(report.source, RecordSource::Remote);
    assert!(report.initial_persist.is_none());
    assert_eq!(store.get().habits[0].id, "habit-mine");
    assert_eq!(store.get().journal, "");
    assert_eq!(remote.write_count(), 0);
    assert_eq!(remote.fetch(&path()).unwrap().unwrap(), user_document);
}

#[test]
fn unrepairable_remote_document_is_left_untouched() {
    let remote = Arc::new(MemoryRemoteStore::new());
    let user_document = json!({ "habits": [{ "text": "entry without id" }] });
    remote.put_document(&path(), user_document.clone());
    let mut store = remote_store(SharedBackup::default(), &remote);
    store.set_remote_identity(USER_ID);

    let report = store.load();

    assert_eq!(report.source, RecordSource::Defaults);
    assert!(report.initial_persist.is_none());
    assert_eq!(remote.write_count(), 0);
    assert_eq!(remote.fetch(&path()).unwrap().unwrap(), user_document);
}

#[test]
fn existing_local_snapshot_is_not_rewritten_on_load() {
    let backup = SharedBackup::default();
    *backup.stored.borrow_mut() = Some(json!({ "journal": "already saved" }));
    let mut store = StateStore::new(default_record(), Box::new(backup.clone()));

    let report = store.load();

    assert_eq!(report.source, RecordSource::Local);
    assert!(report.initial_persist.is_none());
    assert_eq!(*backup.writes.borrow(), 0);
    assert_eq!(store.get().journal, "already saved");
}

#[test]
fn config_supplies_app_namespace_and_identity() {
    let config = CoreConfig::from_lookup(|key| match key {
        "PROPLUS_APP_ID" => Some("campus".to_string()),
        "PROPLUS_USER_ID" => Some("user-7".to_string()),
        "PROPLUS_DATA_DIR" => Some("/tmp/proplus-config-test".to_string()),
        _ => None,
    })
    .unwrap();
    let remote = Arc::new(MemoryRemoteStore::new());
    let mut store = StateStore::from_config(
        default_record(),
        Box::new(SharedBackup::default()),
        &config,
        Some(remote.clone() as Arc<dyn RemoteStore>),
    );

    assert_eq!(store.app_id(), "campus");
    assert!(store.has_remote_identity());
    store.get_mut().journal = "namespaced".to_string();
    store.persist().remote.unwrap().wait().unwrap();

    let document = remote
        .fetch(&DocumentPath::new("campus", "user-7"))
        .unwrap()
        .unwrap();
    assert_eq!(document["journal"], "namespaced");
    assert!(remote.fetch(&path()).unwrap().is_none());
}

#[test]
fn reset_restores_defaults_and_saves_them() {
    let backup = SharedBackup::default();
    let mut store = StateStore::new(default_record(), Box::new(backup.clone()));
    store.load();
    store.get_mut().journal = "private thoughts".to_string();
    store.get_mut().habits.clear();
    store.get_mut().projects.truncate(1);
    assert!(store.persist().local_written());

    let outcome = store.reset_to_defaults();

    assert!(outcome.local_written());
    assert_eq!(store.get().journal, "");
    assert_eq!(store.get().habits, store.defaults().habits);
    assert_eq!(store.get().projects, store.defaults().projects);
    let stored = backup.stored.borrow().clone().unwrap();
    assert_eq!(stored["journal"], "");
    assert_eq!(stored["habits"].as_array().unwrap().len(), 4);
    assert_eq!(stored["projects"][1]["id"], "proj-2");
}
