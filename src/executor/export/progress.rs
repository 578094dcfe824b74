//! Progress feedback for export runs
//!
//! A spinner on stderr shows which phase the export is in while the query
//! runs, since the server may take a while before returning any rows.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner tracking the phases of one export
pub struct ProgressTracker {
    /// Spinner (optional, can be disabled)
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    /// Create a new progress tracker
    ///
    /// # Arguments
    /// * `enable_bar` - Whether to display a spinner
    ///
    /// # Returns
    /// * `Self` - New progress tracker instance
    pub fn new(enable_bar: bool) -> Self {
        let bar = enable_bar.then(|| {
            let bar = ProgressBar::new_spinner();
            let style = ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            bar.set_style(style);
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });

        Self { bar }
    }

    /// A tracker that never draws anything
    pub fn hidden() -> Self {
        Self::new(false)
    }

    /// Announce the current phase
    pub fn phase(&self, message: &str) {
        if let Some(ref bar) = self.bar {
            bar.set_message(message.to_string());
        }
    }

    /// Finish and clear the spinner
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::hidden()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_tracker() {
        let tracker = ProgressTracker::hidden();
        tracker.phase("Executing query");
        tracker.finish();
        assert!(tracker.bar.is_none());
    }
}
