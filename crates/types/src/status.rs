//! Transaction status and exit enumerations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use pk_errors::PackageError;

/// Phase a transaction reports while its worker runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusKind {
    Setup,
    Wait,
    Query,
    Info,
    Remove,
    RefreshCache,
    Download,
    Install,
    Update,
    Cleanup,
    Obsolete,
    DepResolve,
    Rollback,
    Commit,
    Request,
    Finished,
    Cancel,
    Unknown,
}

impl StatusKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Wait => "wait",
            Self::Query => "query",
            Self::Info => "info",
            Self::Remove => "remove",
            Self::RefreshCache => "refresh-cache",
            Self::Download => "download",
            Self::Install => "install",
            Self::Update => "update",
            Self::Cleanup => "cleanup",
            Self::Obsolete => "obsolete",
            Self::DepResolve => "dep-resolve",
            Self::Rollback => "rollback",
            Self::Commit => "commit",
            Self::Request => "request",
            Self::Finished => "finished",
            Self::Cancel => "cancel",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusKind {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s {
            "setup" => Self::Setup,
            "wait" => Self::Wait,
            "query" => Self::Query,
            "info" => Self::Info,
            "remove" => Self::Remove,
            "refresh-cache" => Self::RefreshCache,
            "download" => Self::Download,
            "install" => Self::Install,
            "update" => Self::Update,
            "cleanup" => Self::Cleanup,
            "obsolete" => Self::Obsolete,
            "dep-resolve" => Self::DepResolve,
            "rollback" => Self::Rollback,
            "commit" => Self::Commit,
            "request" => Self::Request,
            "finished" => Self::Finished,
            "cancel" => Self::Cancel,
            "unknown" => Self::Unknown,
            other => return Err(crate::unknown_value("status", other)),
        };
        Ok(status)
    }
}

/// How a transaction ended; one per terminal transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitStatus {
    Success,
    Cancelled,
    Failed,
}

impl ExitStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
