//! Marketing version strategy (`MARKETING_VERSION` / `CFBundleShortVersionString`)

use std::cmp::Ordering;

use tracing::instrument;
use xcversion_core::error::Result;

use crate::traits::VersionStrategy;
use crate::types::BumpType;
use crate::version::Version;

/// Marketing version strategy
#[derive(Debug, Clone, Default)]
pub struct MarketingVersionStrategy {
    /// Render `1.2.0` as `1.2` after a bump
    pub omit_zero_patch: bool,
}

impl MarketingVersionStrategy {
    /// Create a new strategy that always renders the patch component
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether a zero patch component is dropped
    pub fn with_omit_zero_patch(mut self, omit: bool) -> Self {
        self.omit_zero_patch = omit;
        self
    }
}

impl VersionStrategy for MarketingVersionStrategy {
    fn name(&self) -> &'static str {
        "marketing"
    }

    fn validate(&self, value: &str) -> Result<String> {
        Version::parse(value)?;
        Ok(value.trim().to_string())
    }

    #[instrument(skip(self), fields(strategy = "marketing"))]
    fn next(&self, current: &str, bump_type: Option<BumpType>) -> Result<String> {
        let version = Version::parse(current)?;
        match bump_type {
            Some(bump_type) => Ok(version.bump(bump_type)?.format(self.omit_zero_patch)),
            None => Ok(current.trim().to_string()),
        }
    }

    fn compare(&self, a: &str, b: &str) -> Result<Ordering> {
        Ok(Version::parse(a)?.cmp(&Version::parse(b)?))
    }
}
