//! xcversion Xcode - reading and bumping versions inside Xcode projects
//!
//! This crate understands just enough of an Xcode project to find every
//! place a marketing version or build number lives and to rewrite it
//! without disturbing anything else in the file.
//!
//! ## Pipeline
//!
//! 1. [`project::XcodeProject`] locates the `.xcodeproj` bundle
//! 2. [`pbxproj::PbxprojDocument`] parses `project.pbxproj` with byte spans
//! 3. [`scheme::Scheme`] optionally narrows the targets to a scheme's build action
//! 4. [`index::ConfigurationIndex`] enumerates (target, configuration) pairs
//! 5. [`resolver::BumpResolver`] computes the new value
//! 6. [`patcher::StructuredPatcher`] stages edits and commits them together
//!
//! [`workflow`] strings these together for the `get` and `bump` operations.
//!
//! ## Usage
//!
//! ```ignore
//! use xcversion_core::VersionField;
//! use xcversion_xcode::workflow::{self, BumpOptions, ProjectSelection};
//! use xcversion_xcode::resolver::BumpRequest;
//!
//! let options = BumpOptions {
//!     selection: ProjectSelection { cwd: std::env::current_dir()?, ..Default::default() },
//!     request: BumpRequest::new(VersionField::BuildNumber),
//!     dry_run: false,
//! };
//! let outcome = workflow::bump(options, None).await?;
//! ```

pub mod index;
pub mod patcher;
pub mod pbxproj;
pub mod plist;
pub mod project;
pub mod resolver;
pub mod scheme;
pub mod workflow;

#[cfg(test)]
mod fixture;

pub use index::{ConfigurationEntry, ConfigurationIndex, IndexFilter, SettingOrigin};
pub use patcher::{StructuredPatcher, TouchedEntry, WriteLocation};
pub use pbxproj::PbxprojDocument;
pub use plist::PlistFieldAccessor;
pub use project::XcodeProject;
pub use resolver::{BumpRequest, BumpResolver, Resolution};
pub use scheme::Scheme;
pub use workflow::{BumpOptions, BumpOutcome, ProjectSelection, Reading};
