//! External version sources for xcversion
//!
//! A version source answers one question: what is the latest version of an
//! app that has been published somewhere other than the local project.
//!
//! ## Supported Sources
//!
//! - **Apple**: the public App Store lookup endpoint
//!
//! ## Usage
//!
//! ```ignore
//! use xcversion_stores::{apple::AppStoreLookup, Platform, VersionSource};
//!
//! let lookup = AppStoreLookup::new(Default::default());
//! let latest = lookup.fetch_latest("com.example.app", Platform::Ios).await?;
//! ```

pub mod apple;
pub mod error;
pub mod traits;
pub mod types;

pub use error::StoreError;
pub use traits::VersionSource;
pub use types::Platform;
