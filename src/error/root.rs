//! Installation root errors

use super::AgentkitError;

/// Creates a path error for a root that is missing or cannot be created
pub fn path_error(path: impl Into<String>, reason: impl Into<String>) -> AgentkitError {
    AgentkitError::PathError {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an invalid package id error
pub fn invalid_package_id(id: impl Into<String>) -> AgentkitError {
    AgentkitError::InvalidPackageId { id: id.into() }
}
