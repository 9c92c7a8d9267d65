use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use super::table::Table;
use super::{ChangeKind, ChangeNotifier, RecordStore, StoreChange};
use crate::error::StoreResult;
use crate::record::{NewRecord, RecordPatch, RepositoryRecord};

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<Table>,
    changes: ChangeNotifier,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<RepositoryRecord>> {
        Ok(self.table.lock().await.list())
    }

    async fn insert(&self, record: NewRecord) -> StoreResult<RepositoryRecord> {
        let row = self.table.lock().await.insert(record, Utc::now())?;
        debug!(url = %row.url, "inserted repository");
        self.changes.notify(ChangeKind::Inserted, Some(&row.url));
        Ok(row)
    }

    async fn update(&self, url: &str, patch: RecordPatch) -> StoreResult<bool> {
        let applied = self.table.lock().await.update(url, &patch, Utc::now());
        if applied {
            debug!(url, status = ?patch.status, "updated repository");
            self.changes.notify(ChangeKind::Updated, Some(url));
        } else {
            debug!(url, "update skipped, no such repository");
        }
        Ok(applied)
    }

    async fn delete(&self, url: &str) -> StoreResult<bool> {
        let removed = self.table.lock().await.delete(url);
        if removed {
            debug!(url, "deleted repository");
            self.changes.notify(ChangeKind::Deleted, Some(url));
        }
        Ok(removed)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}
