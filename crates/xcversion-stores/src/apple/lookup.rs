//! iTunes lookup API client
//!
//! Queries `https://itunes.apple.com/lookup` for the public store listing of
//! an app and reports its current version. No authentication is required.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::error::{Result, StoreError};
use crate::traits::VersionSource;
use crate::types::Platform;

const LOOKUP_URL: &str = "https://itunes.apple.com/lookup";

/// Lookup configuration
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Base URL of the lookup endpoint
    pub base_url: String,
    /// Two-letter storefront country, `None` for the US store
    pub country: Option<String>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: LOOKUP_URL.to_string(),
            country: None,
        }
    }
}

impl LookupConfig {
    /// Set the storefront country
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Point the client at another endpoint
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    result_count: u64,
    #[serde(default)]
    results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    version: Option<String>,
}

/// App Store lookup client
pub struct AppStoreLookup {
    /// Configuration
    config: LookupConfig,

    /// HTTP client
    client: Client,
}

impl AppStoreLookup {
    /// Create a new lookup client
    pub fn new(config: LookupConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Query parameters for a lookup
    fn query(&self, app_identifier: &str, platform: Platform) -> Vec<(&'static str, String)> {
        let mut query = vec![("bundleId", app_identifier.to_string())];
        if let Some(country) = &self.config.country {
            query.push(("country", country.to_lowercase()));
        }
        if platform == Platform::Macos {
            query.push(("entity", "macSoftware".to_string()));
        }
        query
    }

    /// Extract the version from a lookup response body
    fn parse_response(app_identifier: &str, body: &str) -> Result<String> {
        let response: LookupResponse = serde_json::from_str(body)?;
        if response.result_count == 0 {
            return Err(StoreError::AppNotFound(app_identifier.to_string()));
        }

        response
            .results
            .into_iter()
            .next()
            .and_then(|r| r.version)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                StoreError::InvalidResponse(format!(
                    "no version in lookup result for {}",
                    app_identifier
                ))
            })
    }
}

#[async_trait]
impl VersionSource for AppStoreLookup {
    fn name(&self) -> &str {
        "App Store"
    }

    #[instrument(skip(self), fields(source = "appstore"))]
    async fn fetch_latest(&self, app_identifier: &str, platform: Platform) -> Result<String> {
        if app_identifier.trim().is_empty() {
            return Err(StoreError::ConfigurationError(
                "app identifier is required for an App Store lookup".to_string(),
            ));
        }

        debug!(url = %self.config.base_url, "querying App Store lookup");
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&self.query(app_identifier, platform))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let version = Self::parse_response(app_identifier, &body)?;
        info!(app_identifier, version = %version, "fetched App Store version");
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let body = r#"{"resultCount":1,"results":[{"bundleId":"com.example.app","version":"2.3.1"}]}"#;
        assert_eq!(
            AppStoreLookup::parse_response("com.example.app", body).unwrap(),
            "2.3.1"
        );
    }

    #[test]
    fn test_parse_response_not_found() {
        let body = r#"{"resultCount":0,"results":[]}"#;
        assert!(matches!(
            AppStoreLookup::parse_response("com.example.missing", body),
            Err(StoreError::AppNotFound(_))
        ));
    }

    #[test]
    fn test_parse_response_without_version() {
        let body = r#"{"resultCount":1,"results":[{"bundleId":"com.example.app"}]}"#;
        assert!(matches!(
            AppStoreLookup::parse_response("com.example.app", body),
            Err(StoreError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_query_includes_country_and_entity() {
        let lookup = AppStoreLookup::new(LookupConfig::default().with_country("DE"));
        let query = lookup.query("com.example.app", Platform::Macos);
        assert_eq!(
            query,
            vec![
                ("bundleId", "com.example.app".to_string()),
                ("country", "de".to_string()),
                ("entity", "macSoftware".to_string()),
            ]
        );

        let query = AppStoreLookup::new(LookupConfig::default()).query("id", Platform::Ios);
        assert_eq!(query, vec![("bundleId", "id".to_string())]);
    }

    #[tokio::test]
    async fn test_empty_identifier_is_rejected_without_request() {
        let lookup =
            AppStoreLookup::new(LookupConfig::default().with_base_url("http://127.0.0.1:9"));
        let err = lookup.fetch_latest("  ", Platform::Ios).await.unwrap_err();
        assert!(matches!(err, StoreError::ConfigurationError(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let lookup =
            AppStoreLookup::new(LookupConfig::default().with_base_url("http://127.0.0.1:9"));
        let err = lookup.fetch_latest("com.example.app", Platform::Ios).await.unwrap_err();
        assert!(matches!(err, StoreError::Http(_)));
    }
}
