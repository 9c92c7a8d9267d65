#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use repodash::error::StoreResult;
use repodash::{
    AddForm, MemoryStore, NewRecord, NewRepository, RecordPatch, RecordStore, RepositoryRecord,
    StoreChange, StoreError, SyncSettings,
};

/// Memory store that counts calls and can be told to fail updates.
#[derive(Debug)]
pub struct FlakyStore {
    inner: MemoryStore,
    pub inserts: AtomicUsize,
    pub updates: AtomicUsize,
    fail_updates_from: AtomicUsize,
    fail_inserts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            inserts: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            fail_updates_from: AtomicUsize::new(usize::MAX),
            fail_inserts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// Every update from the `n`th one (zero based) on fails.
    pub fn fail_updates_from(&self, n: usize) {
        self.fail_updates_from.store(n, Ordering::SeqCst);
    }

    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn list(&self) -> StoreResult<Vec<RepositoryRecord>> {
        self.inner.list().await
    }

    async fn insert(&self, record: NewRecord) -> StoreResult<RepositoryRecord> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        self.inner.insert(record).await
    }

    async fn update(&self, url: &str, patch: RecordPatch) -> StoreResult<bool> {
        let n = self.updates.fetch_add(1, Ordering::SeqCst);
        if n >= self.fail_updates_from.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        self.inner.update(url, patch).await
    }

    async fn delete(&self, url: &str) -> StoreResult<bool> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        self.inner.delete(url).await
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.inner.subscribe()
    }
}

pub fn settings(delay_ms: u64) -> SyncSettings {
    SyncSettings {
        delay: Duration::from_millis(delay_ms),
        stale_after: Duration::from_secs(300),
    }
}

pub fn demo() -> NewRepository {
    NewRepository {
        name: "demo".into(),
        url: "https://x/y.git".into(),
        nickname: Some("d".into()),
        is_master: true,
    }
}

pub fn repo(name: &str) -> NewRepository {
    NewRepository {
        name: name.into(),
        url: format!("https://github.com/example/{name}.git"),
        nickname: None,
        is_master: false,
    }
}

pub fn form(name: &str, url: &str) -> AddForm {
    AddForm::new().name(name).url(url)
}
