use std::ffi::OsString;
use std::fs as std_fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::Utc;
use fslock::LockFile;
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::table::Table;
use super::{ChangeKind, ChangeNotifier, RecordStore, StoreChange};
use crate::error::{StoreError, StoreResult};
use crate::record::{NewRecord, RecordPatch, RepositoryRecord};

/// Store backed by a single JSON file.
///
/// Every operation reads the file, so several processes can share it. Writes
/// hold an advisory lock on `<file>.lock` for the whole read-modify-write and
/// land atomically through a uniquely named temp file. Changes made by other
/// processes are only noticed through [`FileStore::watch_external`].
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // mtime of the file as of our own last write or the watcher's last look
    seen_mtime: Arc<Mutex<Option<SystemTime>>>,
    changes: ChangeNotifier,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seen_mtime: Arc::new(Mutex::new(None)),
            changes: ChangeNotifier::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Poll the file's modification time every `every` and announce
    /// `ChangeKind::External` when someone else rewrote it. Abort the handle to stop.
    pub fn watch_external(&self, every: Duration) -> JoinHandle<()> {
        let path = self.path.clone();
        let seen = Arc::clone(&self.seen_mtime);
        let changes = self.changes.clone();

        tokio::spawn(async move {
            {
                let mut seen = seen.lock().await;
                if seen.is_none() {
                    *seen = modified(&path).await;
                }
            }

            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let current = modified(&path).await;
                let mut seen = seen.lock().await;
                if *seen != current {
                    debug!(path = %path.display(), "store file changed externally");
                    *seen = current;
                    changes.notify(ChangeKind::External, None);
                }
            }
        })
    }

    async fn read_table(&self) -> StoreResult<Table> {
        match fs::read(&self.path).await {
            Ok(bytes) => parse_table(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Table::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Run `op` against the current table under the cross-process lock. The
    /// table is written back only when `op` reports it changed something.
    async fn transact<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Table) -> StoreResult<(T, bool)> + Send + 'static,
    {
        let path = self.path.clone();
        let (value, mtime) = tokio::task::spawn_blocking(move || locked_write(&path, op))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))??;

        if let Some(mtime) = mtime {
            *self.seen_mtime.lock().await = mtime;
        }
        Ok(value)
    }
}

fn parse_table(bytes: &[u8]) -> StoreResult<Table> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Table::default());
    }
    Ok(serde_json::from_slice(bytes)?)
}

fn lock_path(path: &Path) -> PathBuf {
    match path.file_name() {
        Some(name) => {
            let mut name = OsString::from(name);
            name.push(".lock");
            path.with_file_name(name)
        }
        None => path.with_extension("lock"),
    }
}

/// Blocking half of [`FileStore::transact`]. Returns the op's value and, when
/// the file was rewritten, its new mtime.
fn locked_write<T, F>(path: &Path, op: F) -> StoreResult<(T, Option<Option<SystemTime>>)>
where
    F: FnOnce(&mut Table) -> StoreResult<(T, bool)>,
{
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std_fs::create_dir_all(&dir)?;

    let mut lock = LockFile::open(lock_path(path).as_path())?;
    lock.lock()?;

    let mut table = match std_fs::read(path) {
        Ok(bytes) => parse_table(&bytes)?,
        Err(e) if e.kind() == ErrorKind::NotFound => Table::default(),
        Err(e) => return Err(e.into()),
    };

    let (value, dirty) = op(&mut table)?;
    if !dirty {
        return Ok((value, None));
    }

    let body = serde_json::to_vec_pretty(&table)?;
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(&body)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    let mtime = std_fs::metadata(path).ok().and_then(|m| m.modified().ok());
    // Dropping the lock file handle releases the lock.
    drop(lock);
    Ok((value, Some(mtime)))
}

async fn modified(path: &Path) -> Option<SystemTime> {
    match fs::metadata(path).await {
        Ok(meta) => meta.modified().ok(),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unable to stat store file");
            None
        }
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn list(&self) -> StoreResult<Vec<RepositoryRecord>> {
        Ok(self.read_table().await?.list())
    }

    async fn insert(&self, record: NewRecord) -> StoreResult<RepositoryRecord> {
        let row = self
            .transact(move |table| Ok((table.insert(record, Utc::now())?, true)))
            .await?;

        debug!(url = %row.url, path = %self.path.display(), "inserted repository");
        self.changes.notify(ChangeKind::Inserted, Some(&row.url));
        Ok(row)
    }

    async fn update(&self, url: &str, patch: RecordPatch) -> StoreResult<bool> {
        let key = url.to_string();
        let status = patch.status;
        let applied = self
            .transact(move |table| {
                let applied = table.update(&key, &patch, Utc::now());
                Ok((applied, applied))
            })
            .await?;

        if applied {
            debug!(url, status = ?status, "updated repository");
            self.changes.notify(ChangeKind::Updated, Some(url));
        } else {
            debug!(url, "update skipped, no such repository");
        }
        Ok(applied)
    }

    async fn delete(&self, url: &str) -> StoreResult<bool> {
        let key = url.to_string();
        let removed = self
            .transact(move |table| {
                let removed = table.delete(&key);
                Ok((removed, removed))
            })
            .await?;

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
