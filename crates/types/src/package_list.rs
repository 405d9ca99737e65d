//! Ordered package collection backing result streams and the offline cache
//!
//! The cache text format is one record per line, `info\tpackage_id\tsummary`,
//! in insertion order with no trailing newline. Tabs or newlines inside a
//! summary are not escaped.

use crate::{InfoKind, PackageId, PackageRecord};
use pk_errors::PackageError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageList {
    items: Vec<PackageRecord>,
}

impl PackageList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new record unconditionally; duplicates are kept.
    ///
    /// # Errors
    ///
    /// Returns `PackageError::InvalidPackageId` if `package_id` is malformed,
    /// in which case the list is unchanged.
    pub fn add(
        &mut self,
        info: InfoKind,
        package_id: &str,
        summary: Option<&str>,
    ) -> Result<(), PackageError> {
        let item = PackageRecord::from_parts(info, package_id, summary)?;
        self.items.push(item);
        Ok(())
    }

    /// Append a copy of `item` unless an equal record is already stored.
    ///
    /// Returns `false` when the record was already present; that is an
    /// expected outcome, not an error.
    pub fn add_item(&mut self, item: &PackageRecord) -> bool {
        if self.contains_item(item) {
            tracing::debug!(package_id = %item.package_id(), "already added item");
            return false;
        }
        self.items.push(item.clone());
        true
    }

    /// True if a stored record names the same package (name, version, arch)
    #[must_use]
    pub fn contains(&self, package_id: &PackageId) -> bool {
        self.items
            .iter()
            .any(|item| item.package_id().same_package(package_id))
    }

    #[must_use]
    pub fn contains_item(&self, item: &PackageRecord) -> bool {
        self.items.iter().any(|stored| stored == item)
    }

    /// Record at a 0-based position, `None` when out of range
    #[must_use]
    pub fn get_item(&self, index: usize) -> Option<&PackageRecord> {
        let item = self.items.get(index);
        if item.is_none() {
            tracing::debug!(index, size = self.items.len(), "item too large!");
        }
        item
    }

    #[must_use]
    pub fn get_size(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PackageRecord> {
        self.items.iter()
    }

    /// Render the cache text form
    #[must_use]
    pub fn to_cache_string(&self) -> String {
        self.to_string()
    }

    /// Parse the cache text form produced by [`PackageList::to_cache_string`].
    ///
    /// Duplicates are preserved. An empty summary field reads back as `None`.
    ///
    /// # Errors
    ///
    /// Returns `PackageError::MalformedCacheLine` naming the 1-based line on
    /// a missing field, unknown info text, or malformed package id.
    pub fn from_cache_str(text: &str) -> Result<Self, PackageError> {
        let mut list = Self::new();
        if text.is_empty() {
            return Ok(list);
        }

        for (index, line) in text.split('\n').enumerate() {
            let line_no = index + 1;
            let malformed = |reason: String| PackageError::MalformedCacheLine {
                line: line_no,
                reason,
            };

            let mut fields = line.splitn(3, '\t');
            let (Some(info), Some(package_id), Some(summary)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(malformed("expected 3 tab-separated fields".to_string()));
            };

            let info: InfoKind = info.parse().map_err(|e: PackageError| malformed(e.to_string()))?;
            let summary = (!summary.is_empty()).then_some(summary);
            list.add(info, package_id, summary)
                .map_err(|e| malformed(e.to_string()))?;
        }

        Ok(list)
    }
}

impl fmt::Display for PackageList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, item) in self.items.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            write!(
                f,
                "{}\t{}\t{}",
                item.info(),
                item.package_id(),
                item.summary().unwrap_or_default()
            )?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PackageList {
    type Item = &'a PackageRecord;
    type IntoIter = std::slice::Iter<'a, PackageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
