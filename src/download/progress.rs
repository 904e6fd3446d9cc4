//! Terminal progress bars for downloads.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::filename::truncate_filename;

const BATCH_TEMPLATE: &str = "{msg} [{bar:30.cyan/blue}] {pos}/{len}";
const FILE_TEMPLATE: &str =
    "{msg:<32} [{bar:30.green/white}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const FILE_TEMPLATE_NO_BAR: &str = "{msg:<32} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

/// Owns the set of bars drawn for one download run.
///
/// A hidden display hands out bars that draw nothing, so library callers and
/// tests can run downloads without a terminal.
#[derive(Debug, Clone)]
pub struct ProgressDisplay {
    multi: MultiProgress,
    show_bar: bool,
    leave: bool,
    label_len: Option<usize>,
}

impl Default for ProgressDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressDisplay {
    /// Draws to stderr.
    #[must_use]
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            show_bar: true,
            leave: true,
            label_len: None,
        }
    }

    /// Draws nothing.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            show_bar: true,
            leave: true,
            label_len: None,
        }
    }

    /// Shows the graphical bar on per-file lines (counters are always shown).
    #[must_use]
    pub fn with_bar(mut self, show_bar: bool) -> Self {
        self.show_bar = show_bar;
        self
    }

    /// Keeps finished per-file lines on screen.
    #[must_use]
    pub fn with_leave(mut self, leave: bool) -> Self {
        self.leave = leave;
        self
    }

    /// Truncates per-file labels to `label_len` characters.
    #[must_use]
    pub fn with_label_len(mut self, label_len: Option<usize>) -> Self {
        self.label_len = label_len;
        self
    }

    /// Creates the summary bar counting finished jobs.
    #[must_use]
    pub fn batch_bar(&self, total: u64) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new(total));
        bar.set_style(
            ProgressStyle::with_template(BATCH_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        bar.set_message("Downloading files...");
        bar
    }

    /// Creates a byte counter for one file.
    #[must_use]
    pub fn file_bar(&self, total_bytes: u64, label: &str) -> FileProgress {
        let template = if self.show_bar {
            FILE_TEMPLATE
        } else {
            FILE_TEMPLATE_NO_BAR
        };
        let bar = self.multi.add(ProgressBar::new(total_bytes));
        bar.set_style(
            ProgressStyle::with_template(template)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        let label = match self.label_len {
            Some(len) => truncate_filename(label, len),
            None => label.to_string(),
        };
        bar.set_message(label);
        FileProgress {
            bar,
            leave: self.leave,
        }
    }
}

/// Per-file progress handle.
#[derive(Debug)]
pub struct FileProgress {
    bar: ProgressBar,
    leave: bool,
}

impl FileProgress {
    pub fn advance(&self, bytes: u64) {
        self.bar.inc(bytes);
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        if self.leave {
            self.bar.finish();
        } else {
            self.bar.finish_and_clear();
        }
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

/// Formats the batch summary line.
#[must_use]
pub fn summary_message(downloaded: usize, size: &str, warnings: usize, errors: usize) -> String {
    format!("Downloaded {downloaded} files ({size}) - Warnings ({warnings}) - Errors ({errors})")
}
