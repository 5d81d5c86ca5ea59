//! Version strategy traits

use std::cmp::Ordering;

use xcversion_core::error::Result;

use crate::types::BumpType;

/// How one kind of project value is validated, bumped and compared
pub trait VersionStrategy: Send + Sync {
    /// Get the name of this strategy
    fn name(&self) -> &'static str;

    /// Validate a value supplied from outside; returns it unchanged when valid
    fn validate(&self, value: &str) -> Result<String>;

    /// Compute the value that follows `current`
    ///
    /// `bump_type` may be ignored by strategies that only ever increment.
    fn next(&self, current: &str, bump_type: Option<BumpType>) -> Result<String>;

    /// Compare two values
    fn compare(&self, a: &str, b: &str) -> Result<Ordering>;

    /// Check if a value is valid for this strategy
    fn is_valid(&self, value: &str) -> bool {
        self.validate(value).is_ok()
    }
}
