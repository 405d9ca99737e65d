use serde::{Deserialize, Serialize};
use std::time::Duration;

use pk_errors::{BackendError, ErrorKind};
use pk_types::{ExitStatus, PackageRecord, Role, StatusKind};

/// Everything a worker reports to its host while a transaction runs.
///
/// Records and errors share this one stream so the host observes them in
/// emission order. `Finished` is always the last event of a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionEvent {
    /// Host dispatched a role and the transaction was created
    Started { role: Role },

    /// Worker moved to a new phase
    StatusChanged { status: StatusKind },

    /// Integer progress, 0..=100
    Percentage { percentage: u8 },

    /// A discovered package, in discovery order
    Package { record: PackageRecord },

    /// An error report; paired with a terminal `Finished`
    ErrorCode { kind: ErrorKind, details: String },

    /// Terminal signal, emitted exactly once
    Finished { exit: ExitStatus, runtime: Duration },
}

impl TransactionEvent {
    /// Build an error report from a backend error
    #[must_use]
    pub fn error(err: &BackendError) -> Self {
        Self::ErrorCode {
            kind: err.kind(),
            details: err.details().to_string(),
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::ErrorCode {
                kind: ErrorKind::TransactionCancelled,
                ..
            }
            | Self::Finished {
                exit: ExitStatus::Cancelled,
                ..
            } => Level::WARN,
            Self::ErrorCode { .. }
            | Self::Finished {
                exit: ExitStatus::Failed,
                ..
            } => Level::ERROR,
            Self::Percentage { .. } | Self::Package { .. } => Level::DEBUG,
            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::Started { .. } | Self::Finished { .. } => "pkhost::events::lifecycle",
            Self::StatusChanged { .. } | Self::Percentage { .. } => "pkhost::events::progress",
            Self::Package { .. } => "pkhost::events::package",
            Self::ErrorCode { .. } => "pkhost::events::error",
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }
}
