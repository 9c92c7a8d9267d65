use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::display::Symbols;
use crate::humanize;
use crate::record::RepositoryRecord;
use crate::repo_status::{is_stale_pending, StatusTone, SyncStatus};

/// What a card asks the controller to do. Both carry the record's url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardIntent {
    Sync(String),
    Delete(String),
}

/// Read-only view of one record.
#[derive(Debug, Clone, Copy)]
pub struct RepositoryCard<'a> {
    record: &'a RepositoryRecord,
}

impl<'a> RepositoryCard<'a> {
    pub fn new(record: &'a RepositoryRecord) -> Self {
        Self { record }
    }

    pub fn record(&self) -> &'a RepositoryRecord {
        self.record
    }

    pub fn tone(&self) -> StatusTone {
        self.record.status.tone()
    }

    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        is_stale_pending(self.record.status, self.record.updated_at, now, stale_after)
    }

    /// Sync is off while a sync is in flight, unless that sync looks abandoned.
    pub fn sync_enabled(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        self.record.status != SyncStatus::Pending || self.is_stale(now, stale_after)
    }

    pub fn sync_intent(&self, now: DateTime<Utc>, stale_after: Duration) -> Option<CardIntent> {
        self.sync_enabled(now, stale_after)
            .then(|| CardIntent::Sync(self.record.url.clone()))
    }

    pub fn delete_intent(&self) -> CardIntent {
        CardIntent::Delete(self.record.url.clone())
    }

    /// Multi-line text block for a terminal.
    pub fn render(&self, symbols: &Symbols, now: DateTime<Utc>, stale_after: Duration) -> String {
        let r = self.record;
        let mut out = String::new();

        let _ = write!(out, "{} {}", symbols.for_tone(self.tone()), r.name);
        if let Some(nickname) = &r.nickname {
            let _ = write!(out, " ({nickname})");
        }
        if r.is_master {
            let _ = write!(out, " {} master", symbols.master);
        }
        let _ = write!(out, "  [{}]", r.status);
        if self.is_stale(now, stale_after) {
            let _ = write!(out, " {} stale", symbols.stale);
        }
        out.push('\n');

        let _ = writeln!(out, "  {} {}", symbols.url, r.url);
        if let Some(last_sync) = r.last_sync {
            let _ = writeln!(
                out,
                "  {} Last synced: {}",
                symbols.time,
                humanize::relative(last_sync, now)
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    const STALE: Duration = Duration::from_secs(300);

    fn record(status: SyncStatus, updated_at: DateTime<Utc>) -> RepositoryRecord {
        RepositoryRecord {
            url: "https://github.com/tkellogg/dura.git".into(),
            name: "dura".into(),
            nickname: Some("backup".into()),
            is_master: true,
            status,
            last_sync: Some(updated_at),
            created_at: updated_at,
            updated_at,
        }
    }

    #[test]
    fn pending_disables_sync_but_not_delete() {
        let now = Utc::now();
        let r = record(SyncStatus::Pending, now);
        let card = RepositoryCard::new(&r);

        assert!(!card.sync_enabled(now, STALE));
        assert_eq!(card.sync_intent(now, STALE), None);
        assert_eq!(card.delete_intent(), CardIntent::Delete(r.url.clone()));
    }

    #[test]
    fn synced_and_error_allow_sync() {
        let now = Utc::now();
        for status in [SyncStatus::Synced, SyncStatus::Error] {
            let r = record(status, now);
            let card = RepositoryCard::new(&r);
            assert_eq!(card.sync_intent(now, STALE), Some(CardIntent::Sync(r.url.clone())));
        }
    }

    #[test]
    fn stale_pending_can_be_resynced() {
        let now = Utc::now();
        let r = record(SyncStatus::Pending, now - ChronoDuration::minutes(10));
        let card = RepositoryCard::new(&r);

        assert!(card.sync_enabled(now, STALE));
        let text = card.render(&Symbols::PLAIN, now, STALE);
        assert!(text.contains("! stale"), "{text}");
    }

    #[test]
    fn renders_badges_url_and_last_sync() {
        let now = Utc::now();
        let r = record(SyncStatus::Synced, now - ChronoDuration::minutes(3));
        let text = RepositoryCard::new(&r).render(&Symbols::PLAIN, now, STALE);

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("[OK] dura (backup) * master  [synced]"));
        assert_eq!(lines.next(), Some("  # https://github.com/tkellogg/dura.git"));
        assert_eq!(lines.next(), Some("  @ Last synced: 3 minutes ago"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn omits_optional_parts() {
        let now = Utc::now();
        let mut r = record(SyncStatus::Error, now);
        r.nickname = None;
        r.is_master = false;
        r.last_sync = None;

        let text = RepositoryCard::new(&r).render(&Symbols::PLAIN, now, STALE);
        assert_eq!(text, "[X] dura  [error]\n  # https://github.com/tkellogg/dura.git\n");
    }
}
