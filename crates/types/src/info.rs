//! Package info (state) enumeration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use pk_errors::PackageError;

/// State of a discovered package as reported by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoKind {
    Installed,
    Available,
    Low,
    Normal,
    Important,
    Security,
    Bugfix,
    Enhancement,
    Blocked,
    Downloading,
    Updating,
    Installing,
    Removing,
    Cleanup,
    Obsoleting,
    Unknown,
}

impl InfoKind {
    /// Text form used by the package cache
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Installed => "installed",
            Self::Available => "available",
            Self::Low => "low",
            Self::Normal => "normal",
            Self::Important => "important",
            Self::Security => "security",
            Self::Bugfix => "bugfix",
            Self::Enhancement => "enhancement",
            Self::Blocked => "blocked",
            Self::Downloading => "downloading",
            Self::Updating => "updating",
            Self::Installing => "installing",
            Self::Removing => "removing",
            Self::Cleanup => "cleanup",
            Self::Obsoleting => "obsoleting",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for InfoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InfoKind {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let info = match s {
            "installed" => Self::Installed,
            "available" => Self::Available,
            "low" => Self::Low,
            "normal" => Self::Normal,
            "important" => Self::Important,
            "security" => Self::Security,
            "bugfix" => Self::Bugfix,
            "enhancement" => Self::Enhancement,
            "blocked" => Self::Blocked,
            "downloading" => Self::Downloading,
            "updating" => Self::Updating,
            "installing" => Self::Installing,
            "removing" => Self::Removing,
            "cleanup" => Self::Cleanup,
            "obsoleting" => Self::Obsoleting,
            "unknown" => Self::Unknown,
            other => return Err(crate::unknown_value("info", other)),
        };
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_text() {
        assert_eq!(InfoKind::Installed.to_string(), "installed");
        assert_eq!("available".parse::<InfoKind>().unwrap(), InfoKind::Available);
        assert!("Installed".parse::<InfoKind>().is_err());
    }
}
