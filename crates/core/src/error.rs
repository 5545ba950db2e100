//! Unified error types for forkmap.
//!
//! Every variant renders with a stable upper-case code prefix so log lines and
//! ingestion reports can be grepped by failure class.

use tokio_rusqlite::rusqlite;

/// Unified error types for the ingestion pipeline and its stores.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., unknown query column).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Network failure or timeout before a response was received.
    #[error("TRANSPORT_ERROR: {0}")]
    Transport(String),

    /// Upstream answered with a non-2xx status.
    #[error("TRANSPORT_ERROR: HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Missing credentials for an authenticated request.
    #[error("AUTH_ERROR: {0}")]
    Auth(String),

    /// Page-level structure violation in HTML or JSON.
    #[error("PARSE_ERROR: {0}")]
    Parse(String),

    /// The on-disk cache could not be written.
    #[error("CACHE_ERROR: {0}")]
    Cache(String),

    /// Relational store operation failed.
    #[error("SCHEMA_ERROR: {0}")]
    Database(tokio_rusqlite::Error),
}

impl Error {
    /// Whether this error must abort an ingestion run.
    ///
    /// Only store failures stop the run. Everything else is scoped to the
    /// single fetch that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Database(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
