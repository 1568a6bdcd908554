//! Cross-platform path utilities
//!
//! Paths recorded in manifests are always root-relative with forward
//! slashes, whatever platform wrote them.

use std::path::{Path, PathBuf};

/// Convert a path to a forward-slash string
///
/// ```
/// use std::path::Path;
/// use agentkit::path_utils::to_forward_slashes;
///
/// assert_eq!(to_forward_slashes(Path::new("tasks/a.md")), "tasks/a.md");
/// ```
pub fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Join a forward-slash relative path onto `base`, one component at a time
///
/// Returns `None` for anything that could leave `base`: `..` components,
/// backslashes and absolute or drive-prefixed paths.
pub fn join_relative(base: &Path, relative: &str) -> Option<PathBuf> {
    if relative.starts_with('/') || relative.contains(['\\', ':']) {
        return None;
    }
    relative
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .try_fold(base.to_path_buf(), |acc, part| {
            (part != "..").then(|| acc.join(part))
        })
}

/// Whether `name` is a bare file name, usable as one path component
///
/// ```
/// use agentkit::path_utils::is_plain_name;
///
/// assert!(is_plain_name("create-doc.md"));
/// assert!(is_plain_name("notes..md"));
/// assert!(!is_plain_name("../outside"));
/// assert!(!is_plain_name("tasks/a.md"));
/// ```
pub fn is_plain_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', ':'])
}

/// Split `.marker/rest/of/path` into `(".marker", "rest/of/path")`
///
/// ```
/// use agentkit::path_utils::split_first_component;
///
/// assert_eq!(
///     split_first_component(".agentkit-core/tasks/a.md"),
///     Some((".agentkit-core", "tasks/a.md"))
/// );
/// assert_eq!(split_first_component("file.md"), None);
/// ```
pub fn split_first_component(relative: &str) -> Option<(&str, &str)> {
    let (first, rest) = relative.trim_start_matches('/').split_once('/')?;
    (!first.is_empty() && !rest.is_empty()).then_some((first, rest))
}
