//! The record store boundary.
//!
//! The controller only ever talks to a [`RecordStore`]: four row operations and a
//! change feed. Every successful write is announced on the feed, including the
//! caller's own writes, and subscribers are expected to refetch rather than
//! patch incrementally.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::StoreResult;
use crate::record::{NewRecord, RecordPatch, RepositoryRecord};

pub mod file;
pub mod memory;
mod table;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Capacity of the change feed. Slow subscribers see `Lagged` and refetch anyway.
const CHANGE_FEED_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
    /// The backing data changed underneath us, e.g. another process rewrote the file.
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub kind: ChangeKind,
    pub url: Option<String>,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All rows, newest creation first.
    async fn list(&self) -> StoreResult<Vec<RepositoryRecord>>;

    /// Insert a row. Fails with `StoreError::Conflict` when the url is taken.
    async fn insert(&self, record: NewRecord) -> StoreResult<RepositoryRecord>;

    /// Apply `patch` to the row keyed by `url`. Returns `false` without writing
    /// anything when no such row exists.
    async fn update(&self, url: &str, patch: RecordPatch) -> StoreResult<bool>;

    /// Remove the row keyed by `url`. Returns `false` when nothing matched.
    async fn delete(&self, url: &str) -> StoreResult<bool>;

    /// Subscribe to change notifications. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// Fan-out side of the change feed, shared by the store implementations.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<StoreChange>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.tx.subscribe()
    }

    pub fn notify(&self, kind: ChangeKind, url: Option<&str>) {
        // No subscribers is fine.
        let _ = self.tx.send(StoreChange {
            kind,
            url: url.map(str::to_owned),
        });
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        ChangeNotifier::new()
    }
}
