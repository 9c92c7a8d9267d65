pub mod card;
pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod form;
pub mod humanize;
pub mod logging;
pub mod notice;
pub mod record;
pub mod repo_status;
pub mod store;

pub use card::{CardIntent, RepositoryCard};
pub use config::Config;
pub use controller::{PageController, SyncOutcome, SyncSettings, SyncTicket};
pub use error::{DashError, StoreError, ValidationError};
pub use form::AddForm;
pub use notice::{Notice, NoticeLevel};
pub use record::{NewRecord, NewRepository, RecordPatch, RepositoryRecord};
pub use repo_status::{StatusTone, SyncStatus};
pub use store::{ChangeKind, FileStore, MemoryStore, RecordStore, StoreChange};
