//! Search filters and package groups

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use pk_errors::PackageError;

/// A single search filter; the `Not*` variants are the `~`-prefixed forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Filter {
    #[serde(rename = "installed")]
    Installed,
    #[serde(rename = "~installed")]
    NotInstalled,
    #[serde(rename = "devel")]
    Development,
    #[serde(rename = "~devel")]
    NotDevelopment,
    #[serde(rename = "gui")]
    Gui,
    #[serde(rename = "~gui")]
    NotGui,
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "~free")]
    NotFree,
    #[serde(rename = "visible")]
    Visible,
    #[serde(rename = "~visible")]
    NotVisible,
    #[serde(rename = "supported")]
    Supported,
    #[serde(rename = "~supported")]
    NotSupported,
}

impl Filter {
    pub const ALL: [Filter; 12] = [
        Self::Installed,
        Self::NotInstalled,
        Self::Development,
        Self::NotDevelopment,
        Self::Gui,
        Self::NotGui,
        Self::Free,
        Self::NotFree,
        Self::Visible,
        Self::NotVisible,
        Self::Supported,
        Self::NotSupported,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Installed => "installed",
            Self::NotInstalled => "~installed",
            Self::Development => "devel",
            Self::NotDevelopment => "~devel",
            Self::Gui => "gui",
            Self::NotGui => "~gui",
            Self::Free => "free",
            Self::NotFree => "~free",
            Self::Visible => "visible",
            Self::NotVisible => "~visible",
            Self::Supported => "supported",
            Self::NotSupported => "~supported",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == s)
            .ok_or_else(|| crate::unknown_value("filter", s))
    }
}

/// Set of filters attached to a query, rendered `;`-joined or `none`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet(BTreeSet<Filter>);

impl FilterSet {
    /// The empty set, rendered as `none`
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, filter: Filter) -> Self {
        self.0.insert(filter);
        self
    }

    pub fn insert(&mut self, filter: Filter) -> bool {
        self.0.insert(filter)
    }

    #[must_use]
    pub fn contains(&self, filter: Filter) -> bool {
        self.0.contains(&filter)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Filter> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Filter> for FilterSet {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("none");
        }
        let text: Vec<&str> = self.0.iter().map(|filter| filter.as_str()).collect();
        f.write_str(&text.join(";"))
    }
}

impl FromStr for FilterSet {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "none" {
            return Ok(Self::none());
        }
        s.split(';').map(str::parse).collect()
    }
}

/// Package group used by search-by-group
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKind {
    Accessibility,
    Accessories,
    AdminTools,
    Communication,
    DesktopGnome,
    DesktopKde,
    DesktopOther,
    DesktopXfce,
    Education,
    Fonts,
    Games,
    Graphics,
    Internet,
    Legacy,
    Localization,
    Multimedia,
    Network,
    Office,
    Other,
    PowerManagement,
    Programming,
    Publishing,
    Security,
    Servers,
    System,
    Virtualization,
    Unknown,
}

impl GroupKind {
    pub const ALL: [GroupKind; 27] = [
        Self::Accessibility,
        Self::Accessories,
        Self::AdminTools,
        Self::Communication,
        Self::DesktopGnome,
        Self::DesktopKde,
        Self::DesktopOther,
        Self::DesktopXfce,
        Self::Education,
        Self::Fonts,
        Self::Games,
        Self::Graphics,
        Self::Internet,
        Self::Legacy,
        Self::Localization,
        Self::Multimedia,
        Self::Network,
        Self::Office,
        Self::Other,
        Self::PowerManagement,
        Self::Programming,
        Self::Publishing,
        Self::Security,
        Self::Servers,
        Self::System,
        Self::Virtualization,
        Self::Unknown,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accessibility => "accessibility",
            Self::Accessories => "accessories",
            Self::AdminTools => "admin-tools",
            Self::Communication => "communication",
            Self::DesktopGnome => "desktop-gnome",
            Self::DesktopKde => "desktop-kde",
            Self::DesktopOther => "desktop-other",
            Self::DesktopXfce => "desktop-xfce",
            Self::Education => "education",
            Self::Fonts => "fonts",
            Self::Games => "games",
            Self::Graphics => "graphics",
            Self::Internet => "internet",
            Self::Legacy => "legacy",
            Self::Localization => "localization",
            Self::Multimedia => "multimedia",
            Self::Network => "network",
            Self::Office => "office",
            Self::Other => "other",
            Self::PowerManagement => "power-management",
            Self::Programming => "programming",
            Self::Publishing => "publishing",
            Self::Security => "security",
            Self::Servers => "servers",
            Self::System => "system",
            Self::Virtualization => "virtualization",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupKind {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|group| group.as_str() == s)
            .ok_or_else(|| crate::unknown_value("group", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_set_text() {
        let filters = FilterSet::none()
            .with(Filter::NotDevelopment)
            .with(Filter::Installed);
        assert_eq!(filters.to_string(), "installed;~devel");
        assert_eq!(FilterSet::none().to_string(), "none");

        let parsed: FilterSet = "installed;~devel".parse().unwrap();
        assert_eq!(parsed, filters);
        assert!("none".parse::<FilterSet>().unwrap().is_empty());
    }

    #[test]
    fn test_filter_set_rejects_unknown() {
        assert!("installed;bogus".parse::<FilterSet>().is_err());
    }

    #[test]
    fn test_group_text() {
        assert_eq!("desktop-kde".parse::<GroupKind>().unwrap(), GroupKind::DesktopKde);
        assert_eq!(GroupKind::AdminTools.to_string(), "admin-tools");
        assert!("kde".parse::<GroupKind>().is_err());
    }
}
