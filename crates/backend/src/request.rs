//! Typed transaction requests
//!
//! One variant per [`Role`]. Parameters are parsed before a request is
//! built, so a backend never sees a malformed package id.

use std::path::PathBuf;

use pk_errors::BackendError;
use pk_types::{FilterSet, GroupKind, PackageId, Role};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    GetDepends {
        filters: FilterSet,
        package_id: PackageId,
        recursive: bool,
    },
    GetDescription {
        package_id: PackageId,
    },
    GetFiles {
        package_id: PackageId,
    },
    GetPackages {
        filters: FilterSet,
    },
    GetRepoList {
        filters: FilterSet,
    },
    GetRequires {
        filters: FilterSet,
        package_id: PackageId,
        recursive: bool,
    },
    GetUpdateDetail {
        package_id: PackageId,
    },
    GetUpdates {
        filters: FilterSet,
    },
    InstallFile {
        path: PathBuf,
    },
    InstallPackage {
        package_id: PackageId,
    },
    InstallSignature {
        key_id: String,
        package_id: PackageId,
    },
    RefreshCache {
        force: bool,
    },
    RemovePackage {
        package_id: PackageId,
        allow_deps: bool,
        autoremove: bool,
    },
    RepoEnable {
        repo_id: String,
        enabled: bool,
    },
    RepoSetData {
        repo_id: String,
        parameter: String,
        value: String,
    },
    Resolve {
        filters: FilterSet,
        package: String,
    },
    Rollback {
        transaction_id: String,
    },
    SearchDetails {
        filters: FilterSet,
        search: String,
    },
    SearchFile {
        filters: FilterSet,
        search: String,
    },
    SearchGroup {
        filters: FilterSet,
        group: GroupKind,
    },
    SearchName {
        filters: FilterSet,
        search: String,
    },
    ServicePack {
        location: PathBuf,
    },
    UpdatePackage {
        package_id: PackageId,
    },
    UpdateSystem,
    WhatProvides {
        filters: FilterSet,
        search: String,
    },
}

impl Request {
    /// The operation this request asks for
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Request::GetDepends { .. } => Role::GetDepends,
            Request::GetDescription { .. } => Role::GetDescription,
            Request::GetFiles { .. } => Role::GetFiles,
            Request::GetPackages { .. } => Role::GetPackages,
            Request::GetRepoList { .. } => Role::GetRepoList,
            Request::GetRequires { .. } => Role::GetRequires,
            Request::GetUpdateDetail { .. } => Role::GetUpdateDetail,
            Request::GetUpdates { .. } => Role::GetUpdates,
            Request::InstallFile { .. } => Role::InstallFile,
            Request::InstallPackage { .. } => Role::InstallPackage,
            Request::InstallSignature { .. } => Role::InstallSignature,
            Request::RefreshCache { .. } => Role::RefreshCache,
            Request::RemovePackage { .. } => Role::RemovePackage,
            Request::RepoEnable { .. } => Role::RepoEnable,
            Request::RepoSetData { .. } => Role::RepoSetData,
            Request::Resolve { .. } => Role::Resolve,
            Request::Rollback { .. } => Role::Rollback,
            Request::SearchDetails { .. } => Role::SearchDetails,
            Request::SearchFile { .. } => Role::SearchFile,
            Request::SearchGroup { .. } => Role::SearchGroup,
            Request::SearchName { .. } => Role::SearchName,
            Request::ServicePack { .. } => Role::ServicePack,
            Request::UpdatePackage { .. } => Role::UpdatePackage,
            Request::UpdateSystem => Role::UpdateSystem,
            Request::WhatProvides { .. } => Role::WhatProvides,
        }
    }

    /// Filters attached to the request, for roles that take them
    #[must_use]
    pub fn filters(&self) -> Option<&FilterSet> {
        match self {
            Request::GetDepends { filters, .. }
            | Request::GetPackages { filters }
            | Request::GetRepoList { filters }
            | Request::GetRequires { filters, .. }
            | Request::GetUpdates { filters }
            | Request::Resolve { filters, .. }
            | Request::SearchDetails { filters, .. }
            | Request::SearchFile { filters, .. }
            | Request::SearchGroup { filters, .. }
            | Request::SearchName { filters, .. }
            | Request::WhatProvides { filters, .. } => Some(filters),
            _ => None,
        }
    }

    /// Reject requests whose free-text parameters are empty.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidArgument` naming the offending parameter.
    pub fn validate(&self) -> Result<(), BackendError> {
        match self {
            Request::SearchName { search, .. }
            | Request::SearchDetails { search, .. }
            | Request::SearchFile { search, .. }
            | Request::WhatProvides { search, .. } => require("search term", search),
            Request::Resolve { package, .. } => require("package name", package),
            Request::InstallSignature { key_id, .. } => require("key id", key_id),
            Request::RepoEnable { repo_id, .. } => require("repository id", repo_id),
            Request::RepoSetData {
                repo_id, parameter, ..
            } => {
                require("repository id", repo_id)?;
                require("parameter", parameter)
            }
            Request::Rollback { transaction_id } => require("transaction id", transaction_id),
            Request::InstallFile { path } | Request::ServicePack { location: path } => {
                if path.as_os_str().is_empty() {
                    Err(BackendError::invalid_argument("path must not be empty"))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }
}

fn require(what: &str, value: &str) -> Result<(), BackendError> {
    if value.trim().is_empty() {
        Err(BackendError::invalid_argument(format!(
            "{what} must not be empty"
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pk_errors::ErrorKind;
    use pk_types::Filter;

    #[test]
    fn test_role_matches_variant() {
        let request = Request::SearchName {
            filters: FilterSet::none(),
            search: "power".to_string(),
        };
        assert_eq!(request.role(), Role::SearchName);
        assert_eq!(Request::UpdateSystem.role(), Role::UpdateSystem);
    }

    #[test]
    fn test_filters_only_for_filtered_roles() {
        let filters = FilterSet::none().with(Filter::Installed);
        let request = Request::SearchGroup {
            filters: filters.clone(),
            group: GroupKind::System,
        };
        assert_eq!(request.filters(), Some(&filters));
        assert_eq!(Request::RefreshCache { force: true }.filters(), None);
    }

    #[test]
    fn test_empty_search_is_invalid() {
        let request = Request::SearchName {
            filters: FilterSet::none(),
            search: "  ".to_string(),
        };
        let err = request.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.details().contains("search term"));
    }

    #[test]
    fn test_repo_set_data_checks_parameter() {
        let request = Request::RepoSetData {
            repo_id: "fedora".to_string(),
            parameter: String::new(),
            value: "1".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_group_search_needs_no_text() {
        let request = Request::SearchGroup {
            filters: FilterSet::none(),
            group: GroupKind::Programming,
        };
        assert!(request.validate().is_ok());
    }
}
