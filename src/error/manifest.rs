//! Manifest and version errors

use super::AgentkitError;

/// Creates a corrupt manifest error
pub fn corrupt(path: impl Into<String>, reason: impl Into<String>) -> AgentkitError {
    AgentkitError::ManifestCorrupt {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an invalid version error
pub fn invalid_version(input: impl Into<String>, reason: impl Into<String>) -> AgentkitError {
    AgentkitError::InvalidVersion {
        input: input.into(),
        reason: reason.into(),
    }
}
