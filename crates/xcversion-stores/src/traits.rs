//! Version source traits

use crate::error::Result;
use crate::types::Platform;

/// Trait for services that know the latest published version of an app
///
/// Implementations make at most one request per call and never retry;
/// callers decide what a failure means.
#[async_trait::async_trait]
pub trait VersionSource: Send + Sync {
    /// Get the source name
    fn name(&self) -> &str;

    /// Latest published version string for the app
    async fn fetch_latest(&self, app_identifier: &str, platform: Platform) -> Result<String>;
}
