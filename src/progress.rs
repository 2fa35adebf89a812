//! Progress display for update runs
//!
//! Provides visual feedback on stderr using indicatif. The bar is driven by
//! observer events, one tick per finished reference.

use crate::domain::{AggregatedResult, ExecutionResult, UpdateRequest};
use crate::observer::UpdateObserver;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Progress bar observer
pub struct ProgressObserver {
    /// Whether progress display is enabled (disabled in quiet/JSON mode)
    enabled: bool,
    bar: ProgressBar,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            bar: ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden()),
        }
    }

    /// Create a disabled progress observer
    pub fn disabled() -> Self {
        Self::new(false)
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} {msg} {prefix:.dim} [{bar:30.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }

    /// Number of references finished so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new(true)
    }
}

impl UpdateObserver for ProgressObserver {
    fn update_started(&self, request: &UpdateRequest, units: usize, _stages: usize) {
        self.bar.set_length(units as u64);
        if !self.enabled {
            return;
        }

        self.bar.set_style(Self::style());
        self.bar.set_message(format!(
            "Updating {} to {}",
            request.selected_package_id, request.selected_version
        ));
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn stage_started(&self, index: usize, units: usize) {
        if self.enabled {
            self.bar
                .set_prefix(format!("stage {} ({} references)", index + 1, units));
        }
    }

    fn unit_finished(&self, _result: &ExecutionResult) {
        self.bar.inc(1);
    }

    fn update_finished(&self, _summary: &AggregatedResult) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FileReference, ReferenceKind};
    use semver::Version;

    fn request() -> UpdateRequest {
        UpdateRequest::new("Serilog", Version::new(3, 1, 1), "https://api.nuget.org/v3/index.json")
    }

    fn result() -> ExecutionResult {
        ExecutionResult::succeeded(
            FileReference::new("App.csproj", "2.0.0"),
            ReferenceKind::ModernProjectFile,
            true,
        )
    }

    #[test]
    fn test_progress_disabled_counts_units() {
        let progress = ProgressObserver::disabled();
        progress.update_started(&request(), 3, 1);
        progress.stage_started(0, 3);
        progress.unit_finished(&result());
        progress.unit_finished(&result());
        assert_eq!(progress.position(), 2);
        progress.update_finished(&AggregatedResult::new("Serilog", "3.1.1", false));
    }

    #[test]
    fn test_progress_enabled() {
        let progress = ProgressObserver::new(true);
        progress.update_started(&request(), 1, 1);
        progress.stage_started(0, 1);
        progress.unit_finished(&result());
        progress.update_finished(&AggregatedResult::new("Serilog", "3.1.1", false));
        assert_eq!(progress.position(), 1);
    }
}
