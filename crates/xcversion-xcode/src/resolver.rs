//! Computes the value written by a bump

use std::cmp::Ordering;

use tracing::{debug, info, instrument};
use xcversion_core::error::{ConfigError, Result, VersionError, XcversionError};
use xcversion_core::{BaselinePolicy, VersionField, VersionSourceKind};
use xcversion_strategies::{strategy_for, BumpType, VersionStrategy};
use xcversion_stores::{Platform, VersionSource};

/// Inputs of one resolution
#[derive(Debug, Clone)]
pub struct BumpRequest {
    pub field: VersionField,
    /// Value to write verbatim
    pub explicit: Option<String>,
    pub bump_type: Option<BumpType>,
    pub source: VersionSourceKind,
    pub app_identifier: Option<String>,
    pub platform: Platform,
    pub omit_zero_patch: bool,
    pub baseline: BaselinePolicy,
}

impl BumpRequest {
    /// Bump `field` from the local project with default policies
    pub fn new(field: VersionField) -> Self {
        Self {
            field,
            explicit: None,
            bump_type: None,
            source: VersionSourceKind::Local,
            app_identifier: None,
            platform: Platform::Ios,
            omit_zero_patch: false,
            baseline: BaselinePolicy::Strict,
        }
    }
}

/// Outcome of a resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Value the new one was derived from, if any
    pub previous: Option<String>,
    /// Value to write
    pub value: String,
}

/// Resolves the new value from an explicit value, a version source or the project
pub struct BumpResolver<'a> {
    source: Option<&'a dyn VersionSource>,
}

impl<'a> BumpResolver<'a> {
    /// Resolver that can query `source` when a request asks for it
    pub fn new(source: Option<&'a dyn VersionSource>) -> Self {
        Self { source }
    }

    /// Resolve the value to write
    ///
    /// `current` holds the values recorded by the selected entries in
    /// declaration order.
    #[instrument(skip(self, current), fields(field = %request.field, source = %request.source))]
    pub async fn resolve(&self, request: &BumpRequest, current: &[String]) -> Result<Resolution> {
        let strategy = strategy_for(request.field, request.omit_zero_patch);

        if let Some(explicit) = &request.explicit {
            let value = strategy.validate(explicit)?;
            info!(value = %value, "using explicit {}", request.field);
            return Ok(Resolution {
                previous: current.first().cloned(),
                value,
            });
        }

        let baseline = match request.source {
            VersionSourceKind::Local => Self::baseline(request.field, current, request.baseline)?,
            VersionSourceKind::AppStore => self.fetch(request).await?,
        };

        let value = strategy.next(&baseline, request.bump_type)?;
        info!(previous = %baseline, value = %value, "resolved {}", request.field);
        Ok(Resolution {
            previous: Some(baseline),
            value,
        })
    }

    async fn fetch(&self, request: &BumpRequest) -> Result<String> {
        let source = self.source.ok_or_else(|| ConfigError::InvalidValue {
            field: "versioning.source".to_string(),
            message: format!("no {} client available", request.source),
        })?;
        let app_identifier = request
            .app_identifier
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "appstore.app_identifier".to_string(),
                message: "required when the version source is the App Store".to_string(),
            })?;

        debug!(source = source.name(), app_identifier, "fetching baseline");
        source
            .fetch_latest(app_identifier, request.platform)
            .await
            .map_err(|e| XcversionError::SourceUnavailable(format!("{}: {}", source.name(), e)))
    }

    /// Reduce the recorded values to a single baseline under `policy`
    pub fn baseline(
        field: VersionField,
        values: &[String],
        policy: BaselinePolicy,
    ) -> Result<String> {
        let mut distinct: Vec<&str> = Vec::new();
        for value in values {
            let value = value.trim();
            if !distinct.contains(&value) {
                distinct.push(value);
            }
        }

        let first = distinct
            .first()
            .copied()
            .ok_or_else(|| VersionError::MissingBaseline(field.to_string()))?;
        if distinct.len() == 1 {
            return Ok(first.to_string());
        }

        match policy {
            BaselinePolicy::Strict => Err(VersionError::AmbiguousBaseline {
                field: field.to_string(),
                values: distinct.iter().map(|v| v.to_string()).collect(),
            }
            .into()),
            BaselinePolicy::First => Ok(first.to_string()),
            BaselinePolicy::Highest => {
                let strategy = strategy_for(field, false);
                let mut highest = first;
                for candidate in &distinct[1..] {
                    if strategy.compare(candidate, highest)? == Ordering::Greater {
                        highest = *candidate;
                    }
                }
                Ok(highest.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use xcversion_stores::StoreError;

    struct FixedSource {
        result: std::result::Result<String, String>,
        calls: AtomicUsize,
    }

    impl FixedSource {
        fn returning(version: &str) -> Self {
            Self {
                result: Ok(version.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                result: Err("com.example.app".to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl VersionSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch_latest(
            &self,
            _app_identifier: &str,
            _platform: Platform,
        ) -> xcversion_stores::error::Result<String> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            self.result.clone().map_err(StoreError::AppNotFound)
        }
    }

    fn values(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn version_request(bump_type: Option<BumpType>) -> BumpRequest {
        BumpRequest {
            bump_type,
            ..BumpRequest::new(VersionField::MarketingVersion)
        }
    }

    #[tokio::test]
    async fn test_local_bumps() {
        let resolver = BumpResolver::new(None);
        let current = values(&["0.0.1", "0.0.1"]);

        for (bump, expected) in [
            (BumpType::Patch, "0.0.2"),
            (BumpType::Minor, "0.1.0"),
            (BumpType::Major, "1.0.0"),
        ] {
            let resolution = resolver
                .resolve(&version_request(Some(bump)), &current)
                .await
                .unwrap();
            assert_eq!(resolution.value, expected);
            assert_eq!(resolution.previous.as_deref(), Some("0.0.1"));
        }

        let omit = BumpRequest {
            omit_zero_patch: true,
            ..version_request(Some(BumpType::Minor))
        };
        assert_eq!(resolver.resolve(&omit, &current).await.unwrap().value, "0.1");
    }

    #[tokio::test]
    async fn test_no_bump_type_keeps_baseline() {
        let resolver = BumpResolver::new(None);
        let resolution = resolver.resolve(&version_request(None), &values(&["2.4"])).await.unwrap();
        assert_eq!(resolution.value, "2.4");
    }

    #[tokio::test]
    async fn test_build_number_increments() {
        let resolver = BumpResolver::new(None);
        let request = BumpRequest::new(VersionField::BuildNumber);
        let resolution = resolver.resolve(&request, &values(&["1"])).await.unwrap();
        assert_eq!(resolution.value, "2");
    }

    #[tokio::test]
    async fn test_explicit_value_wins_without_fetching() {
        let source = FixedSource::returning("9.9.9");
        let resolver = BumpResolver::new(Some(&source));
        let request = BumpRequest {
            explicit: Some("1.9.4.1".to_string()),
            bump_type: Some(BumpType::Patch),
            source: VersionSourceKind::AppStore,
            ..BumpRequest::new(VersionField::BuildNumber)
        };
        let resolution = resolver.resolve(&request, &values(&["1"])).await.unwrap();
        assert_eq!(resolution.value, "1.9.4.1");
        assert_eq!(source.calls.load(AtomicOrdering::SeqCst), 0);

        let bad = BumpRequest {
            explicit: Some("1.x".to_string()),
            ..BumpRequest::new(VersionField::MarketingVersion)
        };
        assert!(matches!(
            resolver.resolve(&bad, &[]).await,
            Err(XcversionError::Version(VersionError::Malformed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_app_store_baseline() {
        let source = FixedSource::returning("2.7.3");
        let resolver = BumpResolver::new(Some(&source));
        let request = BumpRequest {
            source: VersionSourceKind::AppStore,
            app_identifier: Some("com.example.app".to_string()),
            ..version_request(Some(BumpType::Major))
        };
        let resolution = resolver.resolve(&request, &values(&["0.0.1"])).await.unwrap();
        assert_eq!(resolution.value, "3.0.0");
        assert_eq!(resolution.previous.as_deref(), Some("2.7.3"));
        assert_eq!(source.calls.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_app_store_failures() {
        let source = FixedSource::failing();
        let resolver = BumpResolver::new(Some(&source));
        let request = BumpRequest {
            source: VersionSourceKind::AppStore,
            app_identifier: Some("com.example.app".to_string()),
            ..version_request(Some(BumpType::Patch))
        };
        assert!(matches!(
            resolver.resolve(&request, &[]).await,
            Err(XcversionError::SourceUnavailable(_))
        ));

        let no_identifier = BumpRequest {
            app_identifier: None,
            ..request
        };
        assert!(matches!(
            resolver.resolve(&no_identifier, &[]).await,
            Err(XcversionError::Config(ConfigError::InvalidValue { .. }))
        ));
        assert_eq!(source.calls.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn test_baseline_policies() {
        let field = VersionField::MarketingVersion;
        let disagreeing = values(&["1.2.0", "1.10.0", "1.2.0"]);

        let err = BumpResolver::baseline(field, &disagreeing, BaselinePolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            XcversionError::Version(VersionError::AmbiguousBaseline { ref values, .. })
                if values.len() == 2
        ));
        assert_eq!(
            BumpResolver::baseline(field, &disagreeing, BaselinePolicy::First).unwrap(),
            "1.2.0"
        );
        assert_eq!(
            BumpResolver::baseline(field, &disagreeing, BaselinePolicy::Highest).unwrap(),
            "1.10.0"
        );
        assert!(matches!(
            BumpResolver::baseline(field, &[], BaselinePolicy::First),
            Err(XcversionError::Version(VersionError::MissingBaseline(_)))
        ));
    }
}
