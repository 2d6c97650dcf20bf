use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Fact generation failed: {0}")]
    Generation(String),

    #[error("A fact for {day:02}/{month:02}/{year} already exists")]
    DuplicateFact { day: u32, month: u32, year: i32 },

    #[error("Claude API error (status {status}): {message}")]
    ClaudeApi { status: u16, message: String },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cron error: {0}")]
    Cron(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// How a failed attempt should be handled by [`crate::retry::with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorRetryStrategy {
    /// Transient failure, back off and try again
    Retry,
    /// Permanent failure, give up immediately
    Fail,
}

impl AppError {
    pub fn retry_strategy(&self) -> ErrorRetryStrategy {
        match self {
            // Rate limited or the API is having a bad time
            Self::ClaudeApi { status, .. } if *status == 429 || *status >= 500 => {
                ErrorRetryStrategy::Retry
            }
            Self::ClaudeApi { .. } => ErrorRetryStrategy::Fail,

            // No status means the request never got an answer (connect, reset, timeout)
            Self::Http(err) => match err.status() {
                Some(status) if status.is_server_error() => ErrorRetryStrategy::Retry,
                Some(_) => ErrorRetryStrategy::Fail,
                None if err.is_decode() => ErrorRetryStrategy::Fail,
                None => ErrorRetryStrategy::Retry,
            },

            Self::Timeout { .. } => ErrorRetryStrategy::Retry,

            Self::Database(tokio_rusqlite::Error::Rusqlite(err)) | Self::Sqlite(err) => {
                if is_busy(err) {
                    ErrorRetryStrategy::Retry
                } else {
                    ErrorRetryStrategy::Fail
                }
            }

            _ => ErrorRetryStrategy::Fail,
        }
    }

    /// Process exit code for the command-line tools.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidArgument(_) => 2,
            Self::DuplicateFact { .. } => 3,
            _ => 1,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateFact { .. })
    }
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
    )
}

/// True when a storage error is a violation of a UNIQUE index.
pub fn is_unique_violation(err: &tokio_rusqlite::Error) -> bool {
    match err {
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(failure, _)) => {
            failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}
