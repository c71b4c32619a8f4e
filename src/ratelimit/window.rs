//! Sliding window definitions.

use std::time::{Duration, Instant};

/// A trailing time window measured back from the instant of evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    /// The trailing 60 seconds
    Minute,
    /// The trailing 3600 seconds
    Hour,
}

impl TimeWindow {
    /// Get the duration of this time window.
    pub fn duration(&self) -> Duration {
        match self {
            TimeWindow::Minute => Duration::from_secs(60),
            TimeWindow::Hour => Duration::from_secs(3600),
        }
    }

    /// Whether an instant recorded at `at` still falls inside this window at `now`.
    ///
    /// An instant exactly one window old has already left it.
    pub fn contains(&self, at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(at) < self.duration()
    }
}
