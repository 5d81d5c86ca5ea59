//! Core types for xcversion

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Which value in the project is being read or bumped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionField {
    /// Marketing version (`MARKETING_VERSION` / `CFBundleShortVersionString`)
    MarketingVersion,
    /// Build number (`CURRENT_PROJECT_VERSION` / `CFBundleVersion`)
    BuildNumber,
}

impl VersionField {
    /// Build setting key inside `project.pbxproj`
    pub fn build_setting_key(&self) -> &'static str {
        match self {
            Self::MarketingVersion => "MARKETING_VERSION",
            Self::BuildNumber => "CURRENT_PROJECT_VERSION",
        }
    }

    /// Key inside an Info.plist
    pub fn plist_key(&self) -> &'static str {
        match self {
            Self::MarketingVersion => "CFBundleShortVersionString",
            Self::BuildNumber => "CFBundleVersion",
        }
    }

    /// Key under which the resolved value is published for later pipeline steps
    pub fn shared_key(&self) -> &'static str {
        match self {
            Self::MarketingVersion => "VERSION_NUMBER",
            Self::BuildNumber => "BUILD_NUMBER",
        }
    }

    /// Human readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarketingVersion => "version number",
            Self::BuildNumber => "build number",
        }
    }
}

impl std::fmt::Display for VersionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the baseline version comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionSourceKind {
    /// Values recorded in the project itself
    #[default]
    Local,
    /// Latest version published on the App Store
    AppStore,
}

impl VersionSourceKind {
    /// Returns the string representation of the source
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::AppStore => "appstore",
        }
    }
}

impl std::fmt::Display for VersionSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VersionSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "appstore" | "app-store" | "app_store" => Ok(Self::AppStore),
            _ => Err(format!("Unknown version source: {}", s)),
        }
    }
}

/// How to pick one baseline when the selected configurations disagree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselinePolicy {
    /// Disagreement is an error
    #[default]
    Strict,
    /// Use the first value in declaration order
    First,
    /// Use the greatest value
    Highest,
}

impl BaselinePolicy {
    /// Returns the string representation of the policy
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::First => "first",
            Self::Highest => "highest",
        }
    }
}

impl std::fmt::Display for BaselinePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BaselinePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "first" => Ok(Self::First),
            "highest" | "max" => Ok(Self::Highest),
            _ => Err(format!("Unknown baseline policy: {}", s)),
        }
    }
}

/// Values handed to downstream pipeline steps
///
/// Replaces a process-wide lane context: callers publish explicitly after a
/// successful run and decide where the values go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SharedValues {
    values: BTreeMap<String, String>,
}

impl SharedValues {
    /// Create an empty set of shared values
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the resolved value for a field
    pub fn publish(&mut self, field: VersionField, value: impl Into<String>) {
        self.values
            .insert(field.shared_key().to_string(), value.into());
    }

    /// Look up a published value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Whether nothing has been published
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Append `KEY=value` lines to an env-style file
    pub fn append_to(&self, path: &Path) -> std::io::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        for (key, value) in &self.values {
            writeln!(file, "{}={}", key, value)?;
        }
        Ok(())
    }
}
