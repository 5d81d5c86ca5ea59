//! Marketing version value type

use std::fmt;
use std::str::FromStr;

use xcversion_core::VersionError;

use crate::types::BumpType;

/// A dotted `MAJOR.MINOR[.PATCH]` marketing version
///
/// Whether a zero patch is displayed is a formatting choice made by
/// [`Version::format`], so `1.2` and `1.2.0` parse to equal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Create a version from its components
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }

    /// Parse `N.N` or `N.N.N`
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let trimmed = s.trim();
        let parts: Vec<&str> = trimmed.split('.').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(VersionError::malformed(
                s,
                "expected MAJOR.MINOR or MAJOR.MINOR.PATCH",
            ));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionError::malformed(
                    s,
                    format!("'{}' is not a non-negative integer", part),
                ));
            }
            *slot = part
                .parse()
                .map_err(|_| VersionError::malformed(s, format!("'{}' is out of range", part)))?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }

    /// Return the next version for the given bump type
    pub fn bump(&self, bump_type: BumpType) -> Result<Self, VersionError> {
        let overflow = || VersionError::malformed(self.to_string(), "version overflows");
        Ok(match bump_type {
            BumpType::Major => Self::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0),
            BumpType::Minor => {
                Self::new(self.major, self.minor.checked_add(1).ok_or_else(overflow)?, 0)
            }
            BumpType::Patch => Self::new(
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(overflow)?,
            ),
        })
    }

    /// Render as `M.m.p`, or `M.m` when `omit_zero_patch` is set and patch is 0
    pub fn format(&self, omit_zero_patch: bool) -> String {
        if omit_zero_patch && self.patch == 0 {
            format!("{}.{}", self.major, self.minor)
        } else {
            format!("{}.{}.{}", self.major, self.minor, self.patch)
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_and_three_components() {
        assert_eq!(Version::parse("1.2").unwrap(), Version::new(1, 2, 0));
        assert_eq!(Version::parse("1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!(Version::parse(" 0.0.1\n").unwrap(), Version::new(0, 0, 1));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["1", "1.2.3.4", "1..2", "v1.2", "1.2-beta", "", "a.b", "1.-2"] {
            assert!(
                matches!(Version::parse(input), Err(VersionError::Malformed { .. })),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_bump() {
        let v = Version::new(1, 2, 3);
        assert_eq!(v.bump(BumpType::Patch).unwrap(), Version::new(1, 2, 4));
        assert_eq!(v.bump(BumpType::Minor).unwrap(), Version::new(1, 3, 0));
        assert_eq!(v.bump(BumpType::Major).unwrap(), Version::new(2, 0, 0));
    }

    #[test]
    fn test_bump_overflow() {
        let v = Version::parse("18446744073709551615.0.0").unwrap();
        assert!(matches!(v.bump(BumpType::Major), Err(VersionError::Malformed { .. })));
        assert_eq!(v.bump(BumpType::Minor).unwrap(), Version::new(u64::MAX, 1, 0));

        let v = Version::new(1, 2, u64::MAX);
        assert!(matches!(v.bump(BumpType::Patch), Err(VersionError::Malformed { .. })));
        assert_eq!(v.bump(BumpType::Minor).unwrap(), Version::new(1, 3, 0));
    }

    #[test]
    fn test_format_omit_zero_patch() {
        assert_eq!(Version::new(0, 1, 0).format(true), "0.1");
        assert_eq!(Version::new(0, 1, 1).format(true), "0.1.1");
        assert_eq!(Version::new(0, 1, 0).format(false), "0.1.0");
    }

    #[test]
    fn test_round_trip() {
        for v in [
            Version::new(0, 0, 0),
            Version::new(0, 1, 0),
            Version::new(3, 14, 159),
            Version::new(u64::MAX, 0, 7),
        ] {
            assert_eq!(Version::parse(&v.format(false)).unwrap(), v);
        }
    }

    #[test]
    fn test_ordering() {
        assert!(Version::new(1, 10, 0) > Version::new(1, 9, 9));
        assert!(Version::parse("2.0").unwrap() > Version::parse("1.99.99").unwrap());
    }
}
