//! Progress reporting

use crate::types::{ReportStats, SyncAction};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::cell::Cell;
use std::time::Instant;

/// Spinner that follows a deployment run
pub struct ProgressReporter {
    bar: ProgressBar,
    started_at: Cell<Option<Instant>>,
    uploaded_files: Cell<u64>,
    uploaded_bytes: Cell<u64>,
}

impl ProgressReporter {
    /// Drive `bar`; pass `ProgressBar::hidden()` to stay silent
    pub fn new(bar: ProgressBar) -> Self {
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        Self {
            bar,
            started_at: Cell::new(None),
            uploaded_files: Cell::new(0),
            uploaded_bytes: Cell::new(0),
        }
    }

    /// Spinner that draws nothing
    pub fn hidden() -> Self {
        Self::new(ProgressBar::hidden())
    }

    /// Mark the start of a connection attempt.
    pub fn start_connect(&self, address: &str) {
        self.bar.enable_steady_tick(std::time::Duration::from_millis(120));
        self.bar.set_message(format!("Connecting to {}...", address));
    }

    /// Mark the start of the transfer phase.
    pub fn start_transfer(&self) {
        self.started_at.set(Some(Instant::now()));
        self.bar.set_message("Uploading...".to_string());
    }

    /// Show the file being uploaded.
    pub fn set_current_upload(&self, remote: &str) {
        self.bar.set_message(format!(
            "{} files | {} | {}",
            self.uploaded_files.get(),
            HumanBytes(self.uploaded_bytes.get()),
            remote
        ));
    }

    /// Account for a finished step.
    pub fn record(&self, action: &SyncAction) {
        if let SyncAction::Upload { bytes, .. } = action {
            self.uploaded_files.set(self.uploaded_files.get() + 1);
            self.uploaded_bytes
                .set(self.uploaded_bytes.get().saturating_add(*bytes));
        }
    }

    /// Finalize with a one-line summary.
    pub fn finish(&self, stats: &ReportStats) {
        self.bar.finish_with_message(format_summary(stats, self.throughput_bps()));
    }

    /// Remove the spinner after a failure.
    pub fn abandon(&self) {
        self.bar.finish_and_clear();
    }

    fn throughput_bps(&self) -> u64 {
        match self.started_at.get() {
            Some(started) => {
                let secs = started.elapsed().as_secs_f64();
                if secs > 0.0 {
                    (self.uploaded_bytes.get() as f64 / secs) as u64
                } else {
                    0
                }
            }
            None => 0,
        }
    }
}

/// Summary line shown after a successful run
pub fn format_summary(stats: &ReportStats, throughput_bps: u64) -> String {
    format!(
        "Done: {} uploaded, {} skipped, {} dirs created, {} dirs pruned | {} total | {}/s",
        stats.files_uploaded,
        stats.files_skipped,
        stats.dirs_created,
        stats.dirs_pruned,
        HumanBytes(stats.bytes_uploaded),
        HumanBytes(throughput_bps)
    )
}
