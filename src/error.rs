use thiserror::Error;

/// Rejections raised before any store call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("URL must end with .git")]
    InvalidUrl,

    #[error("Repository already exists")]
    DuplicateUrl(String),
}

/// Any failure talking to the record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store data is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("A repository with url {0} is already stored")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum DashError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Unknown repository: {0}")]
    UnknownRepository(String),

    #[error("Sync of {url} was interrupted: {reason}")]
    Interrupted { url: String, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type DashResult<T> = Result<T, DashError>;
