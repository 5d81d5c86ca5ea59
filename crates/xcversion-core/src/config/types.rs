//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{BaselinePolicy, VersionSourceKind};

/// Main configuration for xcversion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project selection defaults
    pub project: ProjectConfig,

    /// Versioning behaviour
    pub versioning: VersioningConfig,

    /// App Store lookup settings
    pub appstore: AppStoreConfig,
}

/// Which project, and which part of it, commands operate on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Path to the `.xcodeproj` (or its `project.pbxproj`)
    pub path: Option<PathBuf>,

    /// Restrict to one target
    pub target: Option<String>,

    /// Restrict to one build configuration (e.g. "Release")
    pub configuration: Option<String>,

    /// Restrict to the targets built by a scheme
    pub scheme: Option<String>,
}

/// Versioning configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningConfig {
    /// Render `1.2.0` as `1.2`
    pub omit_zero_patch: bool,

    /// What to do when configurations disagree
    pub baseline: BaselinePolicy,

    /// Where the version baseline comes from
    pub source: VersionSourceKind,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            omit_zero_patch: false,
            baseline: BaselinePolicy::Strict,
            source: VersionSourceKind::Local,
        }
    }
}

/// App Store lookup configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppStoreConfig {
    /// Bundle identifier, defaults to the target's PRODUCT_BUNDLE_IDENTIFIER
    pub app_identifier: Option<String>,

    /// Two-letter storefront country code
    pub country: Option<String>,

    /// "ios" or "macos"
    pub platform: String,
}

impl Default for AppStoreConfig {
    fn default() -> Self {
        Self {
            app_identifier: None,
            country: None,
            platform: "ios".to_string(),
        }
    }
}
