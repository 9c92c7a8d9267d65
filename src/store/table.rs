use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::record::{NewRecord, RecordPatch, RepositoryRecord};

/// Row storage shared by the memory and file backends. Rows are kept in
/// insertion order; ordering for readers is computed in `list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Table {
    #[serde(default)]
    repositories: Vec<RepositoryRecord>,
}

impl Table {
    /// Newest `created_at` first. Equal timestamps put the later insert first.
    pub fn list(&self) -> Vec<RepositoryRecord> {
        let mut rows: Vec<RepositoryRecord> = self.repositories.iter().rev().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    pub fn insert(&mut self, record: NewRecord, at: DateTime<Utc>) -> StoreResult<RepositoryRecord> {
        if self.position(&record.url).is_some() {
            return Err(StoreError::Conflict(record.url));
        }
        let row = record.into_record(at);
        self.repositories.push(row.clone());
        Ok(row)
    }

    pub fn update(&mut self, url: &str, patch: &RecordPatch, at: DateTime<Utc>) -> bool {
        match self.position(url) {
            Some(idx) => {
                self.repositories[idx].apply(patch, at);
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, url: &str) -> bool {
        match self.position(url) {
            Some(idx) => {
                self.repositories.remove(idx);
                true
            }
            None => false,
        }
    }

    fn position(&self, url: &str) -> Option<usize> {
        self.repositories.iter().position(|r| r.url == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NewRepository;
    use crate::repo_status::SyncStatus;
    use chrono::Duration;

    fn new_record(url: &str) -> NewRecord {
        NewRecord::synced(
            NewRepository {
                name: url.trim_end_matches(".git").to_string(),
                url: url.to_string(),
                nickname: None,
                is_master: false,
            },
            Utc::now(),
        )
    }

    #[test]
    fn lists_newest_first_with_insert_order_tiebreak() {
        let t0 = Utc::now();
        let mut table = Table::default();
        table.insert(new_record("a.git"), t0).unwrap();
        table.insert(new_record("b.git"), t0).unwrap();
        table.insert(new_record("c.git"), t0 + Duration::seconds(1)).unwrap();

        let urls: Vec<String> = table.list().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["c.git", "b.git", "a.git"]);
    }

    #[test]
    fn rejects_duplicate_url() {
        let mut table = Table::default();
        table.insert(new_record("a.git"), Utc::now()).unwrap();
        let err = table.insert(new_record("a.git"), Utc::now()).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(url) if url == "a.git"));
    }

    #[test]
    fn update_and_delete_on_missing_key_are_noops() {
        let mut table = Table::default();
        assert!(!table.update("gone.git", &RecordPatch::pending(), Utc::now()));
        assert!(!table.delete("gone.git"));
        assert!(table.list().is_empty());
    }

    #[test]
    fn update_applies_patch() {
        let t0 = Utc::now();
        let mut table = Table::default();
        table.insert(new_record("a.git"), t0).unwrap();
        assert!(table.update("a.git", &RecordPatch::pending(), t0 + Duration::seconds(2)));

        let row = &table.list()[0];
        assert_eq!(row.status, SyncStatus::Pending);
        assert_eq!(row.created_at, t0);
        assert_eq!(row.updated_at, t0 + Duration::seconds(2));
    }
}
