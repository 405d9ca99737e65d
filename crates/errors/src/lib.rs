#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the pkhost backend contract
//!
//! This crate provides fine-grained error types organized by domain.
//! All error types implement Clone so they can travel through a
//! transaction's result sink and be reported more than once.

use std::borrow::Cow;

use thiserror::Error;

pub mod backend;
pub mod config;
pub mod package;

// Re-export all error types at the root
pub use backend::{BackendError, ErrorKind};
pub use config::ConfigError;
pub use package::PackageError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("package error: {0}")]
    Package(#[from] PackageError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an Io error with an associated path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }

    /// Collapse any error into the backend taxonomy.
    ///
    /// Errors that are not already backend errors surface on the result sink
    /// as `TransactionFailed`, except package parse errors which are argument
    /// problems.
    #[must_use]
    pub fn to_backend(&self) -> BackendError {
        match self {
            Error::Backend(err) => err.clone(),
            Error::Package(err) => BackendError::invalid_argument(err.to_string()),
            other => BackendError::failed(other.to_string()),
        }
    }

    /// Wire-level kind of this error once collapsed into the backend taxonomy
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.to_backend().kind()
    }

    /// True when this error reports a cooperative cancellation
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Backend(BackendError::TransactionCancelled { .. }))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, Error>;

/// Minimal interface for rendering user-facing error information without
/// requiring heavyweight envelopes.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether retrying the same operation is likely to succeed.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable error code for analytics / structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Backend(err) => err.user_message(),
            Error::Package(err) => err.user_message(),
            Error::Config(err) => err.user_message(),
            Error::Io { message, .. } => Cow::Owned(message.clone()),
            Error::Internal(_) => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Backend(err) => err.user_hint(),
            Error::Package(err) => err.user_hint(),
            Error::Config(_) => Some("Check your pkhost configuration file."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Backend(err) => err.is_retryable(),
            Error::Io { .. } => true,
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Backend(err) => err.user_code(),
            Error::Package(err) => err.user_code(),
            Error::Config(err) => err.user_code(),
            Error::Internal(_) => Some("error.internal"),
            Error::Io { .. } => Some("error.io"),
        }
    }
}
