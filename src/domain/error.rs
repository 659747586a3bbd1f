use std::path::PathBuf;
use thiserror::Error;

/// Problems reading the optional configuration file. Never fatal.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration file {0} does not contain a mapping at the top level")]
    NotAMapping(PathBuf),
}

/// A required configuration key is absent or unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingError {
    #[error("missing configuration key `{0}`")]
    Missing(String),

    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: String, reason: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object s3://{bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("object store error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("database error: {0}")]
    Backend(String),

    #[error("no open database connection")]
    NotConnected,
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to resolve queue `{name}`: {reason}")]
    AddressLookup { name: String, reason: String },

    #[error("failed to receive messages: {0}")]
    Receive(String),

    #[error("failed to delete message: {0}")]
    Delete(String),
}

/// Classification of a failed processing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Config,
    FetchFailed,
    Connection,
    InsertFailed,
}

/// Why one processing attempt failed. Fatal for that message only.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("invalid work message: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Config(#[from] SettingError),

    #[error("failed to fetch s3://{bucket}/{key}")]
    FetchFailed {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to open database connection")]
    Connection(#[source] DatabaseError),

    #[error("failed to insert records")]
    InsertFailed(#[source] DatabaseError),
}

impl ProcessingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessingError::InvalidInput(_) => ErrorKind::InvalidInput,
            ProcessingError::Config(_) => ErrorKind::Config,
            ProcessingError::FetchFailed { .. } => ErrorKind::FetchFailed,
            ProcessingError::Connection(_) => ErrorKind::Connection,
            ProcessingError::InsertFailed(_) => ErrorKind::InsertFailed,
        }
    }
}
