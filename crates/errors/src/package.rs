//! Package-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PackageError {
    #[error("invalid package id '{input}': {reason}")]
    InvalidPackageId { input: String, reason: String },

    #[error("unknown {kind} value: {value}")]
    UnknownEnumValue { kind: String, value: String },

    #[error("malformed cache line {line}: {reason}")]
    MalformedCacheLine { line: usize, reason: String },
}

impl UserFacingError for PackageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidPackageId { .. } => {
                Some("Package identifiers use the form name;version;arch;data.")
            }
            Self::MalformedCacheLine { .. } => {
                Some("Clear the package cache with `pkhost cache clear`.")
            }
            Self::UnknownEnumValue { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidPackageId { .. } => "package.invalid_package_id",
            Self::UnknownEnumValue { .. } => "package.unknown_enum_value",
            Self::MalformedCacheLine { .. } => "package.malformed_cache_line",
        };
        Some(code)
    }
}
