//! Exit codes for the CLI

use xcversion_core::XcversionError;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Project could not be read, selected or patched
pub const PROJECT_ERROR: i32 = 3;

/// Version error
pub const VERSION_ERROR: i32 = 4;

/// Version source could not be reached
pub const SOURCE_ERROR: i32 = 6;

/// Exit code for a failed command
pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<XcversionError>() {
        Some(XcversionError::Config(_)) => CONFIG_ERROR,
        Some(XcversionError::Project(_)) => PROJECT_ERROR,
        Some(XcversionError::Version(_)) => VERSION_ERROR,
        Some(XcversionError::SourceUnavailable(_)) => SOURCE_ERROR,
        _ => ERROR,
    }
}
