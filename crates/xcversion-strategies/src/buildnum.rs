//! Build number strategy (`CURRENT_PROJECT_VERSION` / `CFBundleVersion`)
//!
//! Build numbers come in two shapes:
//! - Simple: 1, 2, 3...
//! - Dotted: 1.9.4.1
//!
//! Only the simple form can be incremented. Dotted build numbers are accepted
//! as explicit values but never truncated into something incrementable.

use std::cmp::Ordering;
use std::fmt;

use tracing::instrument;
use xcversion_core::error::{Result, VersionError};

use crate::traits::VersionStrategy;
use crate::types::BumpType;

/// A raw build number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildNumber(String);

impl BuildNumber {
    /// Parse a bare integer or dotted numeric build number
    pub fn parse(s: &str) -> std::result::Result<Self, VersionError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionError::malformed(s, "build number is empty"));
        }
        let valid = trimmed
            .split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));
        if !valid {
            return Err(VersionError::malformed(
                s,
                "expected an integer or dot-separated integers",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The build number as written
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Integer value, if this is the simple form
    pub fn as_integer(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    /// Increment the simple form by one
    pub fn increment(&self) -> std::result::Result<Self, VersionError> {
        let current = self.as_integer().ok_or_else(|| {
            VersionError::malformed(
                &self.0,
                "only integer build numbers can be incremented, pass an explicit build number",
            )
        })?;
        let next = current
            .checked_add(1)
            .ok_or_else(|| VersionError::malformed(&self.0, "build number overflows"))?;
        Ok(Self(next.to_string()))
    }

    fn components(&self) -> Vec<u64> {
        self.0
            .split('.')
            .map(|part| part.parse().unwrap_or(u64::MAX))
            .collect()
    }
}

impl fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build number strategy
#[derive(Debug, Clone, Default)]
pub struct BuildNumberStrategy;

impl BuildNumberStrategy {
    /// Create a new build number strategy
    pub fn new() -> Self {
        Self
    }
}

impl VersionStrategy for BuildNumberStrategy {
    fn name(&self) -> &'static str {
        "buildnum"
    }

    fn validate(&self, value: &str) -> Result<String> {
        Ok(BuildNumber::parse(value)?.as_str().to_string())
    }

    #[instrument(skip(self), fields(strategy = "buildnum"))]
    fn next(&self, current: &str, _bump_type: Option<BumpType>) -> Result<String> {
        // Build numbers always increment
        Ok(BuildNumber::parse(current)?.increment()?.to_string())
    }

    fn compare(&self, a: &str, b: &str) -> Result<Ordering> {
        let a = BuildNumber::parse(a)?.components();
        let b = BuildNumber::parse(b)?.components();
        Ok(a.cmp(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_increment() {
        let strategy = BuildNumberStrategy::new();
        assert_eq!(strategy.next("1", None).unwrap(), "2");
        assert_eq!(strategy.next("123", Some(BumpType::Major)).unwrap(), "124");
    }

    #[test]
    fn test_dotted_is_valid_but_not_incrementable() {
        let strategy = BuildNumberStrategy::new();
        assert_eq!(strategy.validate("1.9.4.1").unwrap(), "1.9.4.1");
        let err = strategy.next("1.9.4.1", None).unwrap_err();
        assert!(err.to_string().contains("1.9.4.1"));
    }

    #[test]
    fn test_rejects_garbage() {
        for input in ["", "abc", "1.", ".1", "1.2b", "-3"] {
            assert!(BuildNumber::parse(input).is_err(), "{input} should be rejected");
        }
    }

    #[test]
    fn test_compare() {
        let strategy = BuildNumberStrategy::new();
        assert_eq!(strategy.compare("10", "9").unwrap(), Ordering::Greater);
        assert_eq!(strategy.compare("1.2.10", "1.2.9").unwrap(), Ordering::Greater);
        assert_eq!(strategy.compare("22", "22").unwrap(), Ordering::Equal);
    }
}
