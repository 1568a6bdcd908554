//! Dependency errors

use super::AgentkitError;

/// Creates an unresolved dependency error, used to render resolver warnings
pub fn unresolved(
    kind: impl Into<String>,
    name: impl Into<String>,
    requested_by: impl Into<String>,
) -> AgentkitError {
    AgentkitError::DependencyUnresolved {
        kind: kind.into(),
        name: name.into(),
        requested_by: requested_by.into(),
    }
}
