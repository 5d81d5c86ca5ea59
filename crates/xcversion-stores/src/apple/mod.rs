//! Apple App Store version lookup
//!
//! ```ignore
//! use xcversion_stores::apple::{AppStoreLookup, LookupConfig};
//!
//! let lookup = AppStoreLookup::new(LookupConfig::default().with_country("de"));
//! let version = lookup.fetch_latest("com.example.app", Platform::Ios).await?;
//! ```

mod lookup;

pub use lookup::{AppStoreLookup, LookupConfig};
