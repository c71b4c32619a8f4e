//! Per-key request history.

use std::collections::VecDeque;
use std::time::Instant;

use super::window::TimeWindow;

/// Chronologically ordered instants of admitted requests for one key.
///
/// Entries are non-decreasing from front to back, so expiry only ever pops
/// from the front and window counts are a binary search. The evaluator stops
/// appending once the hourly ceiling is reached, which bounds the length.
#[derive(Debug, Default)]
pub struct TimestampLog {
    stamps: VecDeque<Instant>,
    /// Set once the log has been removed from the store.
    detached: bool,
}

impl TimestampLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry that has left `window` at `now`. Returns how many went.
    pub fn prune(&mut self, now: Instant, window: TimeWindow) -> usize {
        let mut removed = 0;
        while let Some(&oldest) = self.stamps.front() {
            if window.contains(oldest, now) {
                break;
            }
            self.stamps.pop_front();
            removed += 1;
        }
        removed
    }

    /// Count entries inside `window` at `now`.
    pub fn count_within(&self, now: Instant, window: TimeWindow) -> usize {
        let first_inside = self
            .stamps
            .partition_point(|&at| !window.contains(at, now));
        self.stamps.len() - first_inside
    }

    /// Append an admitted request.
    pub fn record(&mut self, now: Instant) {
        let at = match self.stamps.back() {
            Some(&last) if last > now => last,
            _ => now,
        };
        self.stamps.push_back(at);
    }

    /// The most recent entry, if any.
    pub fn newest(&self) -> Option<Instant> {
        self.stamps.back().copied()
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub(crate) fn detach(&mut self) {
        self.detached = true;
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.detached
    }
}
