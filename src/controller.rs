//! Owner of the repository list.
//!
//! The controller holds the only copy of the list. It loads it wholesale from the
//! store, refetches whenever the store reports a change, and turns the three
//! user intents (add, sync, delete) into store writes. Local state is only ever
//! changed after the store acknowledged the corresponding write.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::card::RepositoryCard;
use crate::display::Symbols;
use crate::error::{DashError, DashResult, StoreResult, ValidationError};
use crate::form::AddForm;
use crate::notice::Notice;
use crate::record::{NewRecord, NewRepository, RecordPatch, RepositoryRecord};
use crate::store::RecordStore;

pub const DEFAULT_SYNC_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Time between the pending write and the synced write.
    pub delay: Duration,
    /// Age after which a pending row may be synced again.
    pub stale_after: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            delay: DEFAULT_SYNC_DELAY,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

type Records = Arc<RwLock<Vec<RepositoryRecord>>>;

#[derive(Debug)]
pub enum SyncOutcome {
    /// A sync is already in flight for this repository.
    Skipped,
    Started(SyncTicket),
}

/// Handle on the second half of a sync. Dropping it does not cancel the sync.
#[derive(Debug)]
pub struct SyncTicket {
    url: String,
    handle: JoinHandle<StoreResult<bool>>,
}

impl SyncTicket {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Wait for the synced write.
    pub async fn wait(self) -> DashResult<Notice> {
        match self.handle.await {
            Ok(Ok(true)) => Ok(Notice::success("Repository synced successfully")),
            Ok(Ok(false)) => Err(DashError::UnknownRepository(self.url)),
            Ok(Err(e)) => Err(e.into()),
            Err(e) => Err(DashError::Interrupted {
                url: self.url,
                reason: e.to_string(),
            }),
        }
    }
}

pub struct PageController<S: RecordStore + 'static> {
    store: Arc<S>,
    settings: SyncSettings,
    records: Records,
    revision: Arc<watch::Sender<u64>>,
    subscription: Option<JoinHandle<()>>,
}

impl<S: RecordStore + 'static> PageController<S> {
    pub fn new(store: Arc<S>, settings: SyncSettings) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            store,
            settings,
            records: Arc::new(RwLock::new(Vec::new())),
            revision: Arc::new(revision),
            subscription: None,
        }
    }

    pub fn settings(&self) -> SyncSettings {
        self.settings
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Ticks every time the local list changes.
    pub fn revisions(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Initial load, then refetch on every store change until unmounted.
    pub async fn mount(&mut self) -> StoreResult<()> {
        if self.subscription.is_some() {
            return Ok(());
        }

        // Subscribe first so a change landing during the initial load is not lost.
        let mut changes = self.store.subscribe();
        self.load().await?;

        let store = Arc::clone(&self.store);
        let records = Arc::clone(&self.records);
        let revision = Arc::clone(&self.revision);
        self.subscription = Some(tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => debug!(kind = ?change.kind, url = ?change.url, "store changed"),
                    Err(RecvError::Lagged(missed)) => debug!(missed, "change feed lagged"),
                    Err(RecvError::Closed) => break,
                }
                // One refetch covers everything queued so far.
                loop {
                    match changes.try_recv() {
                        Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                        Err(_) => break,
                    }
                }
                if let Err(e) = refresh(store.as_ref(), &records, &revision).await {
                    warn!(error = %e, "refetch after store change failed");
                }
            }
            debug!("change feed closed");
        }));
        debug!("controller mounted");
        Ok(())
    }

    /// Stop listening for store changes. In-flight syncs still complete.
    pub fn unmount(&mut self) {
        if let Some(task) = self.subscription.take() {
            task.abort();
            debug!("controller unmounted");
        }
    }

    /// Replace the local list with the store's.
    pub async fn load(&self) -> StoreResult<()> {
        let count = refresh(self.store.as_ref(), &self.records, &self.revision).await?;
        debug!(count, "loaded repositories");
        Ok(())
    }

    pub async fn records(&self) -> Vec<RepositoryRecord> {
        self.records.read().await.clone()
    }

    pub async fn find(&self, url: &str) -> Option<RepositoryRecord> {
        self.records.read().await.iter().find(|r| r.url == url).cloned()
    }

    /// Validate the form and add what it holds.
    pub async fn submit(&self, form: &mut AddForm) -> DashResult<Notice> {
        let repo = form.submit()?;
        self.add(repo).await
    }

    pub async fn add(&self, repo: NewRepository) -> DashResult<Notice> {
        if self.records.read().await.iter().any(|r| r.url == repo.url) {
            return Err(ValidationError::DuplicateUrl(repo.url).into());
        }

        let row = self.store.insert(NewRecord::synced(repo, Utc::now())).await?;
        info!(url = %row.url, name = %row.name, "repository added");

        // Mounted controllers pick the row up through the change feed.
        if !self.is_mounted() {
            self.load().await?;
        }
        Ok(Notice::success("Repository added successfully"))
    }

    /// Mark the repository pending now and synced once the delay has passed.
    pub async fn sync(&self, url: &str) -> DashResult<SyncOutcome> {
        let record = self
            .find(url)
            .await
            .ok_or_else(|| DashError::UnknownRepository(url.to_string()))?;

        if !RepositoryCard::new(&record).sync_enabled(Utc::now(), self.settings.stale_after) {
            debug!(url, "sync already in flight");
            return Ok(SyncOutcome::Skipped);
        }

        let pending = RecordPatch::pending();
        if !self.store.update(url, pending.clone()).await? {
            return Err(DashError::UnknownRepository(url.to_string()));
        }
        patch_local(&self.records, &self.revision, url, &pending).await;
        info!(url, "sync started");

        let handle = tokio::spawn(finish_sync(
            Arc::clone(&self.store),
            Arc::clone(&self.records),
            Arc::clone(&self.revision),
            url.to_string(),
            self.settings.delay,
        ));
        Ok(SyncOutcome::Started(SyncTicket {
            url: url.to_string(),
            handle,
        }))
    }

    pub async fn delete(&self, url: &str) -> DashResult<Notice> {
        if !self.store.delete(url).await? {
            debug!(url, "repository was already gone from the store");
        }

        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.url != url);
        if records.len() != before {
            self.revision.send_modify(|r| *r += 1);
        }
        info!(url, "repository removed");
        Ok(Notice::success("Repository removed successfully"))
    }

    /// The whole list as text, newest first.
    pub async fn render(&self, symbols: &Symbols) -> String {
        let records = self.records.read().await;
        let now = Utc::now();

        let mut out = format!("Repositories ({})\n", records.len());
        if records.is_empty() {
            out.push_str("No repositories added yet\n");
        }
        for record in records.iter() {
            out.push('\n');
            out.push_str(&RepositoryCard::new(record).render(symbols, now, self.settings.stale_after));
        }
        out
    }
}

impl<S: RecordStore + 'static> Drop for PageController<S> {
    fn drop(&mut self) {
        self.unmount();
    }
}

async fn refresh<S: RecordStore + ?Sized>(
    store: &S,
    records: &Records,
    revision: &watch::Sender<u64>,
) -> StoreResult<usize> {
    let rows = store.list().await?;
    let count = rows.len();
    *records.write().await = rows;
    revision.send_modify(|r| *r += 1);
    Ok(count)
}

/// Mirror an acknowledged update into the local list.
async fn patch_local(records: &Records, revision: &watch::Sender<u64>, url: &str, patch: &RecordPatch) {
    let mut records = records.write().await;
    if let Some(record) = records.iter_mut().find(|r| r.url == url) {
        record.apply(patch, Utc::now());
        revision.send_modify(|r| *r += 1);
    }
}

async fn finish_sync<S: RecordStore + 'static>(
    store: Arc<S>,
    records: Records,
    revision: Arc<watch::Sender<u64>>,
    url: String,
    delay: Duration,
) -> StoreResult<bool> {
    tokio::time::sleep(delay).await;

    let synced = RecordPatch::synced(Utc::now());
    match store.update(&url, synced.clone()).await {
        Ok(true) => {
            patch_local(&records, &revision, &url, &synced).await;
            info!(url = %url, "repository synced");
            Ok(true)
        }
        Ok(false) => {
            debug!(url = %url, "repository removed before sync finished");
            Ok(false)
        }
        Err(e) => {
            warn!(url = %url, error = %e, "sync write failed, repository left pending");
            Err(e)
        }
    }
}
