//! Base directory for temporary files created by tests
//!
//! `std::env::temp_dir` honours `TMPDIR` verbatim, so `TMPDIR=tmp` would put
//! test directories inside whatever directory the tests run from.

use std::env;
use std::path::PathBuf;

/// An absolute directory to create temporary directories in
pub fn temp_dir_base() -> PathBuf {
    let dir = env::temp_dir();
    if dir.is_absolute() {
        return dir;
    }

    #[cfg(windows)]
    {
        env::var("TEMP")
            .or_else(|_| env::var("TMP"))
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Windows\\Temp"))
    }
    #[cfg(not(windows))]
    {
        PathBuf::from("/tmp")
    }
}
