//! Backend operation roles
//!
//! One role per optional operation slot a backend may bind. The host
//! dispatches exactly one role per transaction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use pk_errors::PackageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    GetDepends,
    GetDescription,
    GetFiles,
    GetPackages,
    GetRepoList,
    GetRequires,
    GetUpdateDetail,
    GetUpdates,
    InstallFile,
    InstallPackage,
    InstallSignature,
    RefreshCache,
    RemovePackage,
    RepoEnable,
    RepoSetData,
    Resolve,
    Rollback,
    SearchDetails,
    SearchFile,
    SearchGroup,
    SearchName,
    ServicePack,
    UpdatePackage,
    UpdateSystem,
    WhatProvides,
}

impl Role {
    pub const ALL: [Role; 25] = [
        Self::GetDepends,
        Self::GetDescription,
        Self::GetFiles,
        Self::GetPackages,
        Self::GetRepoList,
        Self::GetRequires,
        Self::GetUpdateDetail,
        Self::GetUpdates,
        Self::InstallFile,
        Self::InstallPackage,
        Self::InstallSignature,
        Self::RefreshCache,
        Self::RemovePackage,
        Self::RepoEnable,
        Self::RepoSetData,
        Self::Resolve,
        Self::Rollback,
        Self::SearchDetails,
        Self::SearchFile,
        Self::SearchGroup,
        Self::SearchName,
        Self::ServicePack,
        Self::UpdatePackage,
        Self::UpdateSystem,
        Self::WhatProvides,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetDepends => "get-depends",
            Self::GetDescription => "get-description",
            Self::GetFiles => "get-files",
            Self::GetPackages => "get-packages",
            Self::GetRepoList => "get-repo-list",
            Self::GetRequires => "get-requires",
            Self::GetUpdateDetail => "get-update-detail",
            Self::GetUpdates => "get-updates",
            Self::InstallFile => "install-file",
            Self::InstallPackage => "install-package",
            Self::InstallSignature => "install-signature",
            Self::RefreshCache => "refresh-cache",
            Self::RemovePackage => "remove-package",
            Self::RepoEnable => "repo-enable",
            Self::RepoSetData => "repo-set-data",
            Self::Resolve => "resolve",
            Self::Rollback => "rollback",
            Self::SearchDetails => "search-details",
            Self::SearchFile => "search-file",
            Self::SearchGroup => "search-group",
            Self::SearchName => "search-name",
            Self::ServicePack => "service-pack",
            Self::UpdatePackage => "update-package",
            Self::UpdateSystem => "update-system",
            Self::WhatProvides => "what-provides",
        }
    }

    /// Roles that only read package metadata
    #[must_use]
    pub fn is_query(self) -> bool {
        matches!(
            self,
            Self::GetDepends
                | Self::GetDescription
                | Self::GetFiles
                | Self::GetPackages
                | Self::GetRepoList
                | Self::GetRequires
                | Self::GetUpdateDetail
                | Self::GetUpdates
                | Self::Resolve
                | Self::SearchDetails
                | Self::SearchFile
                | Self::SearchGroup
                | Self::SearchName
                | Self::WhatProvides
        )
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| crate::unknown_value("role", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_text() {
        assert_eq!("search-name".parse::<Role>().unwrap(), Role::SearchName);
        assert_eq!(Role::GetUpdateDetail.to_string(), "get-update-detail");
        assert!("search_name".parse::<Role>().is_err());
        assert!(Role::SearchName.is_query());
        assert!(!Role::InstallPackage.is_query());
    }
}
