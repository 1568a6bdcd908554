//! Rendering source files into their installed form

use std::path::Path;

use crate::error::{Result, file_read_failed};
use crate::root::ROOT_PLACEHOLDER;

use super::detection::is_templated;

/// Replace every `{root}` with the package's marker directory
///
/// ```
/// use agentkit::installer::render::substitute_root;
///
/// assert_eq!(
///     substitute_root("Load {root}/tasks/a.md", ".agentkit-core"),
///     "Load .agentkit-core/tasks/a.md"
/// );
/// ```
pub fn substitute_root(content: &str, token: &str) -> String {
    content.replace(ROOT_PLACEHOLDER, token)
}

/// The exact bytes a source file installs as
///
/// Templated files that are not valid UTF-8 are copied verbatim.
pub fn render(source: &Path, token: &str) -> Result<Vec<u8>> {
    let bytes = std::fs::read(source).map_err(|e| file_read_failed(source, e))?;
    if !is_templated(source) {
        return Ok(bytes);
    }
    match String::from_utf8(bytes) {
        Ok(text) => Ok(substitute_root(&text, token).into_bytes()),
        Err(err) => Ok(err.into_bytes()),
    }
}
