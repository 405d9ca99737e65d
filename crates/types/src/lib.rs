#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the pkhost backend contract
//!
//! This crate provides the value types shared by hosts and backends:
//! package identifiers and records, the deduplicating package list with its
//! cache text format, and the small enumerations carried on transactions.

pub mod filter;
pub mod info;
pub mod package;
pub mod package_list;
pub mod role;
pub mod status;
pub mod transaction;

// Re-export commonly used types
pub use filter::{Filter, FilterSet, GroupKind};
pub use info::InfoKind;
pub use package::{PackageId, PackageRecord};
pub use package_list::PackageList;
pub use role::Role;
pub use status::{ExitStatus, StatusKind};
pub use transaction::TransactionId;
pub use uuid::Uuid;

use serde::{Deserialize, Serialize};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Plain,
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Plain
    }
}

// Implement clap::ValueEnum for OutputFormat
impl clap::ValueEnum for OutputFormat {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Plain, Self::Json]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Plain => clap::builder::PossibleValue::new("plain"),
            Self::Json => clap::builder::PossibleValue::new("json"),
        })
    }
}

pub(crate) fn unknown_value(kind: &str, value: &str) -> pk_errors::PackageError {
    pk_errors::PackageError::UnknownEnumValue {
        kind: kind.to_string(),
        value: value.to_string(),
    }
}
