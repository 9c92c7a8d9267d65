// src/repo_status.rs
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Sync state of a tracked repository.
///
/// `Error` is never produced locally. It only shows up when a backend reports a
/// failed write out-of-band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Synced,
    Pending,
    Error,
}

/// How a status is presented: the color of the card indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Success,
    InProgress,
    Error,
}

impl SyncStatus {
    pub fn tone(self) -> StatusTone {
        match self {
            SyncStatus::Synced => StatusTone::Success,
            SyncStatus::Pending => StatusTone::InProgress,
            SyncStatus::Error => StatusTone::Error,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SyncStatus::Synced => "synced",
            SyncStatus::Pending => "pending",
            SyncStatus::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows written by older clients may carry `"status": null`. Those read as synced.
pub(crate) fn deserialize_status<'de, D>(deserializer: D) -> Result<SyncStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<SyncStatus>::deserialize(deserializer)?.unwrap_or_default())
}

/// A pending row whose last write is older than `stale_after` is considered
/// abandoned (the second sync write never landed) and may be synced again.
pub fn is_stale_pending(
    status: SyncStatus,
    updated_at: DateTime<Utc>,
    now: DateTime<Utc>,
    stale_after: Duration,
) -> bool {
    if status != SyncStatus::Pending {
        return false;
    }
    match now.signed_duration_since(updated_at).to_std() {
        Ok(age) => age >= stale_after,
        // updated_at in the future
        Err(_) => false,
    }
}
