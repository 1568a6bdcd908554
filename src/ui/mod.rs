//! Progress reporting
//!
//! The engine reports progress through the [`ProgressReporter`] trait and never
//! decides how it is shown. The CLI passes an [`InteractiveProgressReporter`]
//! on a terminal and a [`SilentProgressReporter`] otherwise.

use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter for package installs
pub trait ProgressReporter {
    /// A package is about to be synced
    fn start_package(&mut self, package: &str, current: usize, total: usize, files: u64);

    /// One file was handled
    fn file_done(&mut self, path: &str);

    /// The package's manifest was written
    fn finish_package(&mut self);

    /// Abandon on error
    fn abandon(&mut self);
}

/// Progress bars on the terminal
pub struct InteractiveProgressReporter {
    package_pb: ProgressBar,
    file_pb: Option<ProgressBar>,
}

impl InteractiveProgressReporter {
    pub fn new(total_packages: u64) -> Self {
        let package_pb = ProgressBar::new(total_packages);
        package_pb.set_style(style("[{bar:40.cyan/blue}] {pos}/{len} {msg}", "#>-"));
        Self {
            package_pb,
            file_pb: None,
        }
    }
}

fn style(template: &str, chars: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(chars)
}

/// Keep the tail of long paths so the bar stays on one line
fn truncate_path(path: &str) -> String {
    const MAX: usize = 50;
    let count = path.chars().count();
    if count <= MAX {
        return path.to_string();
    }
    let tail: String = path.chars().skip(count - (MAX - 3)).collect();
    format!("...{tail}")
}

impl ProgressReporter for InteractiveProgressReporter {
    fn start_package(&mut self, package: &str, current: usize, total: usize, files: u64) {
        self.package_pb
            .set_message(format!("({current}/{total}) {package}"));

        let file_pb = ProgressBar::new(files);
        file_pb.set_style(style(
            "  [{bar:40.green/yellow}] {pos}/{len} files {msg}",
            "█▉▊▋▌▍▎▏  ",
        ));
        self.file_pb = Some(file_pb);
    }

    fn file_done(&mut self, path: &str) {
        if let Some(file_pb) = &self.file_pb {
            file_pb.set_message(truncate_path(path));
            file_pb.inc(1);
        }
    }

    fn finish_package(&mut self) {
        if let Some(file_pb) = self.file_pb.take() {
            file_pb.finish_and_clear();
        }
        self.package_pb.inc(1);
        if self.package_pb.length() == Some(self.package_pb.position()) {
            self.package_pb.finish();
        }
    }

    fn abandon(&mut self) {
        if let Some(file_pb) = self.file_pb.take() {
            file_pb.abandon();
        }
        self.package_pb.abandon();
    }
}

/// No-op reporter for non-interactive output
#[derive(Debug, Default)]
pub struct SilentProgressReporter;

impl ProgressReporter for SilentProgressReporter {
    fn start_package(&mut self, _package: &str, _current: usize, _total: usize, _files: u64) {}

    fn file_done(&mut self, _path: &str) {}

    fn finish_package(&mut self) {}

    fn abandon(&mut self) {}
}
