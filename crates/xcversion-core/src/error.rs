//! Error types for xcversion

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using XcversionError
pub type Result<T> = std::result::Result<T, XcversionError>;

/// Main error type for xcversion operations
#[derive(Debug, Error)]
pub enum XcversionError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Version-related errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Project-related errors
    #[error(transparent)]
    Project(#[from] ProjectError),

    /// External version lookup failed
    #[error("Version source unavailable: {0}")]
    SourceUnavailable(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Version-related errors
#[derive(Debug, Error)]
pub enum VersionError {
    /// Value is not a valid version or build number
    #[error("Malformed version '{value}': {reason}")]
    Malformed { value: String, reason: String },

    /// Selected entries disagree and no reconciliation was requested
    #[error("Ambiguous {field}: configurations disagree ({})", .values.join(", "))]
    AmbiguousBaseline { field: String, values: Vec<String> },

    /// No selected entry records a value to start from
    #[error("No current {0} found in the selected configurations")]
    MissingBaseline(String),

    /// Invalid bump type
    #[error("Invalid bump type: {0}")]
    InvalidBumpType(String),
}

impl VersionError {
    /// Shorthand for a malformed value error
    pub fn malformed(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Xcode project errors
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Project file not found
    #[error("Xcode project not found at {0}")]
    NotFound(PathBuf),

    /// More than one project candidate
    #[error("Multiple Xcode projects found in {0}, pass --project")]
    Ambiguous(PathBuf),

    /// Failed to parse a project or plist file
    #[error("Failed to parse {path}:{line}:{column}: {message}")]
    ParseFailed {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// Target name did not match
    #[error("Target not found: {0}")]
    TargetNotFound(String),

    /// Build configuration name did not match
    #[error("Build configuration '{configuration}' not found for {scope}")]
    ConfigurationNotFound { configuration: String, scope: String },

    /// Scheme not found in shared or user data
    #[error("Scheme not found: {0}")]
    SchemeNotFound(String),

    /// Field not present in a plist
    #[error("Key {key} not found in {path}")]
    KeyNotFound { path: PathBuf, key: String },

    /// A located field could not be rewritten
    #[error("Failed to patch {path}: {message}")]
    PatchFailed { path: PathBuf, message: String },
}
