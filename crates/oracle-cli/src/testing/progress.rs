//! Progress indicator for quiet (non-verbose) passes

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Bar over the corpus; absent when verbose or JSON output is requested
pub struct CaseProgress {
    bar: Option<ProgressBar>,
}

impl CaseProgress {
    pub fn new(total: usize, enabled: bool) -> Self {
        if !enabled {
            return Self { bar: None };
        }

        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar: Some(bar) }
    }

    /// Advance by one case, showing its name
    pub fn tick(&self, name: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(name.to_string());
            bar.inc(1);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
