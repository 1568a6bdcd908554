//! Error context macros for consistent error messages

/// Macro for adding context to file read operations
///
/// # Example
/// ```rust,ignore
/// let content = std::fs::read_to_string(path)
///     .map_err(|e| file_error_context!("Failed to read descriptor", path.display(), e))?;
/// ```
#[macro_export]
macro_rules! file_error_context {
    ($operation:expr, $path:expr, $err:expr) => {
        $crate::error::AgentkitError::FileReadFailed {
            path: $path.to_string(),
            reason: format!("{}: {}", $operation, $err),
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::error::AgentkitError;

    #[test]
    fn test_file_error_context_macro() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = file_error_context!("Failed to read descriptor", "agents/dev.md", io);
        match error {
            AgentkitError::FileReadFailed { path, reason } => {
                assert_eq!(path, "agents/dev.md");
                assert!(reason.starts_with("Failed to read descriptor"));
                assert!(reason.contains("gone"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
