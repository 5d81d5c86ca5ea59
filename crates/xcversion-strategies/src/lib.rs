//! xcversion Strategies - version values and how they are bumped
//!
//! This crate provides the marketing version and build number value types and
//! a strategy per project field.

mod buildnum;
mod marketing;
mod traits;
pub mod types;
mod version;

pub use buildnum::{BuildNumber, BuildNumberStrategy};
pub use marketing::MarketingVersionStrategy;
pub use traits::VersionStrategy;
pub use types::BumpType;
pub use version::Version;

use xcversion_core::VersionField;

/// Strategy responsible for a project field
pub fn strategy_for(field: VersionField, omit_zero_patch: bool) -> Box<dyn VersionStrategy> {
    match field {
        VersionField::MarketingVersion => Box::new(
            MarketingVersionStrategy::new().with_omit_zero_patch(omit_zero_patch),
        ),
        VersionField::BuildNumber => Box::new(BuildNumberStrategy::new()),
    }
}
