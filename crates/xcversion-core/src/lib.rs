//! xcversion Core - shared types for Xcode version bumping
//!
//! This crate provides the error taxonomy, configuration loading and the
//! domain types (fields, sources, baseline policies) used by the other
//! xcversion crates.

pub mod config;
pub mod error;
pub mod types;

pub use error::{ConfigError, ProjectError, Result, VersionError, XcversionError};
pub use types::{BaselinePolicy, SharedValues, VersionField, VersionSourceKind};
