//! Package identifier and record definitions

use crate::InfoKind;
use pk_errors::PackageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Composite package key `name;version;arch;data`
///
/// The first three fields are required. The fourth (the source tag, usually
/// the repository the package came from) may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageId {
    name: String,
    version: String,
    arch: String,
    data: String,
}

impl PackageId {
    /// Build an identifier from its four fields
    ///
    /// # Errors
    ///
    /// Returns `PackageError::InvalidPackageId` if name, version or arch is
    /// empty, or if any field contains the `;` separator.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        arch: impl Into<String>,
        data: impl Into<String>,
    ) -> Result<Self, PackageError> {
        let id = Self {
            name: name.into(),
            version: version.into(),
            arch: arch.into(),
            data: data.into(),
        };
        id.validate()?;
        Ok(id)
    }

    /// Parse an identifier from its `;`-joined text form
    ///
    /// # Errors
    ///
    /// Returns `PackageError::InvalidPackageId` unless the input has exactly
    /// four fields with non-empty name, version and arch.
    pub fn parse(s: &str) -> Result<Self, PackageError> {
        let fields: Vec<&str> = s.split(';').collect();
        let [name, version, arch, data] = fields.as_slice() else {
            return Err(invalid(s, format!("expected 4 fields, found {}", fields.len())));
        };
        Self::new(*name, *version, *arch, *data)
    }

    fn validate(&self) -> Result<(), PackageError> {
        for (label, value) in [
            ("name", &self.name),
            ("version", &self.version),
            ("arch", &self.arch),
        ] {
            if value.is_empty() {
                return Err(invalid(&self.to_string(), format!("{label} is empty")));
            }
        }
        if [&self.name, &self.version, &self.arch, &self.data]
            .iter()
            .any(|field| field.contains(';'))
        {
            return Err(invalid(&self.to_string(), "field contains ';'"));
        }
        Ok(())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Source tag (fourth field)
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Identity used by package list lookups: name, version and arch.
    ///
    /// The data field is ignored, so `gnome;1.23;i386;data` and
    /// `gnome;1.23;i386;fedora` are the same package.
    #[must_use]
    pub fn same_package(&self, other: &PackageId) -> bool {
        self.name == other.name && self.version == other.version && self.arch == other.arch
    }
}

fn invalid(input: &str, reason: impl Into<String>) -> PackageError {
    PackageError::InvalidPackageId {
        input: input.to_string(),
        reason: reason.into(),
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};{};{}", self.name, self.version, self.arch, self.data)
    }
}

impl FromStr for PackageId {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PackageId {
    type Error = PackageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PackageId> for String {
    fn from(id: PackageId) -> Self {
        id.to_string()
    }
}

/// One discovered package. Immutable once constructed.
///
/// Two records are equal when their identifiers name the same package
/// (see [`PackageId::same_package`]); info and summary do not take part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageRecord {
    info: InfoKind,
    package_id: PackageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
}

impl PackageRecord {
    #[must_use]
    pub fn new(info: InfoKind, package_id: PackageId, summary: Option<String>) -> Self {
        Self {
            info,
            package_id,
            summary,
        }
    }

    /// Build a record from a textual package id
    ///
    /// # Errors
    ///
    /// Returns `PackageError::InvalidPackageId` if `package_id` is malformed.
    pub fn from_parts(
        info: InfoKind,
        package_id: &str,
        summary: Option<&str>,
    ) -> Result<Self, PackageError> {
        Ok(Self::new(
            info,
            PackageId::parse(package_id)?,
            summary.map(ToString::to_string),
        ))
    }

    #[must_use]
    pub fn info(&self) -> InfoKind {
        self.info
    }

    #[must_use]
    pub fn package_id(&self) -> &PackageId {
        &self.package_id
    }

    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }
}

impl PartialEq for PackageRecord {
    fn eq(&self, other: &Self) -> bool {
        self.package_id.same_package(&other.package_id)
    }
}

impl Eq for PackageRecord {}
