//! Common types for version sources

use serde::{Deserialize, Serialize};

/// Platform an app is published for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// iOS / iPadOS
    #[default]
    Ios,
    /// macOS
    Macos,
}

impl Platform {
    /// Returns the string representation of the platform
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Macos => "macos",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ios" | "ipados" => Ok(Self::Ios),
            "macos" | "osx" | "mac" => Ok(Self::Macos),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}
