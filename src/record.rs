use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repo_status::{deserialize_status, SyncStatus};

/// One tracked repository as stored by the backend. `url` is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRecord {
    pub url: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default)]
    pub is_master: bool,
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status: SyncStatus,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RepositoryRecord {
    pub(crate) fn apply(&mut self, patch: &RecordPatch, at: DateTime<Utc>) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(last_sync) = patch.last_sync {
            self.last_sync = Some(last_sync);
        }
        self.updated_at = at;
    }
}

/// Validated creation intent coming out of the add form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRepository {
    pub name: String,
    pub url: String,
    pub nickname: Option<String>,
    pub is_master: bool,
}

/// Insert payload. The store stamps `created_at` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub url: String,
    pub name: String,
    pub nickname: Option<String>,
    pub is_master: bool,
    pub status: SyncStatus,
    pub last_sync: Option<DateTime<Utc>>,
}

impl NewRecord {
    /// A freshly added repository starts out synced as of `now`.
    pub fn synced(repo: NewRepository, now: DateTime<Utc>) -> Self {
        Self {
            url: repo.url,
            name: repo.name,
            nickname: repo.nickname,
            is_master: repo.is_master,
            status: SyncStatus::Synced,
            last_sync: Some(now),
        }
    }

    pub(crate) fn into_record(self, at: DateTime<Utc>) -> RepositoryRecord {
        RepositoryRecord {
            url: self.url,
            name: self.name,
            nickname: self.nickname,
            is_master: self.is_master,
            status: self.status,
            last_sync: self.last_sync,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Partial update keyed by url. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    pub status: Option<SyncStatus>,
    pub last_sync: Option<DateTime<Utc>>,
}

impl RecordPatch {
    pub fn pending() -> Self {
        Self {
            status: Some(SyncStatus::Pending),
            last_sync: None,
        }
    }

    pub fn synced(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(SyncStatus::Synced),
            last_sync: Some(at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_or_missing_status_reads_as_synced() {
        let with_null = r#"{
            "url": "https://example.com/a.git",
            "name": "a",
            "status": null,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }"#;
        let without = r#"{
            "url": "https://example.com/b.git",
            "name": "b",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }"#;

        let a: RepositoryRecord = serde_json::from_str(with_null).unwrap();
        let b: RepositoryRecord = serde_json::from_str(without).unwrap();
        assert_eq!(a.status, SyncStatus::Synced);
        assert_eq!(b.status, SyncStatus::Synced);
        assert!(!b.is_master);
        assert_eq!(b.nickname, None);
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let created = Utc::now();
        let mut record = NewRecord::synced(
            NewRepository {
                name: "demo".into(),
                url: "https://x/y.git".into(),
                nickname: Some("d".into()),
                is_master: true,
            },
            created,
        )
        .into_record(created);

        let later = created + chrono::Duration::seconds(1);
        record.apply(&RecordPatch::pending(), later);
        assert_eq!(record.status, SyncStatus::Pending);
        assert_eq!(record.last_sync, Some(created));
        assert_eq!(record.updated_at, later);
        assert_eq!(record.nickname.as_deref(), Some("d"));
    }
}
