//! Backend and transaction error types

use std::borrow::Cow;
use std::fmt;

use crate::UserFacingError;
use thiserror::Error;

/// Kind of failure reported through a transaction's result sink.
///
/// This is the wire-level view of [`BackendError`]: hosts receive the kind and
/// a details string rather than the full error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum ErrorKind {
    InvalidArgument,
    NotSupported,
    TransactionCancelled,
    TransactionFailed,
    ProtocolViolation,
}

impl ErrorKind {
    /// Stable text form used in logs and cache-style output
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid-argument",
            Self::NotSupported => "not-supported",
            Self::TransactionCancelled => "transaction-cancelled",
            Self::TransactionFailed => "transaction-failed",
            Self::ProtocolViolation => "protocol-violation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum BackendError {
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("transaction cancelled: {message}")]
    TransactionCancelled { message: String },

    #[error("transaction failed: {message}")]
    TransactionFailed { message: String },

    #[error("protocol violation: {message}")]
    ProtocolViolation { message: String },
}

impl BackendError {
    /// Create an invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a not-supported error for the named operation
    pub fn not_supported(operation: impl Into<String>) -> Self {
        Self::NotSupported {
            operation: operation.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::TransactionCancelled {
            message: message.into(),
        }
    }

    /// Create a transaction failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self::TransactionFailed {
            message: message.into(),
        }
    }

    /// Create a protocol violation
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            message: message.into(),
        }
    }

    /// Wire-level kind of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::NotSupported { .. } => ErrorKind::NotSupported,
            Self::TransactionCancelled { .. } => ErrorKind::TransactionCancelled,
            Self::TransactionFailed { .. } => ErrorKind::TransactionFailed,
            Self::ProtocolViolation { .. } => ErrorKind::ProtocolViolation,
        }
    }

    /// Details string without the kind prefix
    #[must_use]
    pub fn details(&self) -> &str {
        match self {
            Self::InvalidArgument { message }
            | Self::TransactionCancelled { message }
            | Self::TransactionFailed { message }
            | Self::ProtocolViolation { message } => message,
            Self::NotSupported { operation } => operation,
        }
    }
}

impl UserFacingError for BackendError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotSupported { .. } => {
                Some("The loaded backend does not implement this operation; run `pkhost roles`.")
            }
            Self::InvalidArgument { .. } => {
                Some("Package identifiers use the form name;version;arch;data.")
            }
            Self::ProtocolViolation { .. } => {
                Some("Wait for the running transaction to finish before starting another.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransactionCancelled { .. } | Self::TransactionFailed { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidArgument { .. } => "backend.invalid_argument",
            Self::NotSupported { .. } => "backend.not_supported",
            Self::TransactionCancelled { .. } => "backend.transaction_cancelled",
            Self::TransactionFailed { .. } => "backend.transaction_failed",
            Self::ProtocolViolation { .. } => "backend.protocol_violation",
        };
        Some(code)
    }
}
