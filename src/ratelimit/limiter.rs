//! Core rate limiter implementation.

use std::time::Instant;
use tracing::{debug, info, trace};

use super::class::ActionClass;
use super::clock::{Clock, SystemClock};
use super::rules::LimitRules;
use super::store::CounterStore;
use super::timestamps::TimestampLog;
use super::window::TimeWindow;

/// Sliding window rate limiter keyed by `(identifier, class)`.
///
/// This struct is thread-safe and can be shared across request handlers and
/// the background sweeper.
pub struct RateLimiter<C: Clock = SystemClock> {
    /// Request history indexed by key
    store: CounterStore,
    /// Ceilings per action class
    rules: LimitRules,
    /// Source of "now"
    clock: C,
}

impl RateLimiter<SystemClock> {
    /// Create a new rate limiter with the default ceilings.
    pub fn new() -> Self {
        Self::with_rules(LimitRules::default())
    }

    /// Create a new rate limiter with the given ceilings.
    pub fn with_rules(rules: LimitRules) -> Self {
        Self::with_clock(rules, SystemClock)
    }
}

impl Default for RateLimiter<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Create a new rate limiter reading time from `clock`.
    pub fn with_clock(rules: LimitRules, clock: C) -> Self {
        Self {
            store: CounterStore::new(),
            rules,
            clock,
        }
    }

    /// Record a request if it fits under both ceilings.
    ///
    /// Returns `true` when the request is limited. A limited request is not
    /// recorded. The hourly ceiling is checked first, then the minute
    /// ceiling, both against the same history.
    pub fn consume(&self, identifier: &str, class: ActionClass) -> bool {
        let ceiling = self.rules.ceiling(class);

        self.with_log(identifier, class, |log, now| {
            log.prune(now, TimeWindow::Hour);

            trace!(
                identifier = %identifier,
                class = %class,
                in_hour = log.len(),
                "Checking rate limit"
            );

            if log.len() >= ceiling.per_hour as usize {
                debug!(
                    identifier = %identifier,
                    class = %class,
                    limit = ceiling.per_hour,
                    "Hourly rate limit exceeded"
                );
                return true;
            }

            let in_minute = log.count_within(now, TimeWindow::Minute);
            if in_minute >= ceiling.per_minute as usize {
                debug!(
                    identifier = %identifier,
                    class = %class,
                    limit = ceiling.per_minute,
                    "Per-minute rate limit exceeded"
                );
                return true;
            }

            log.record(now);
            false
        })
    }

    /// Requests still allowed this hour. Never negative.
    pub fn remaining(&self, identifier: &str, class: ActionClass) -> u32 {
        let per_hour = self.rules.ceiling(class).per_hour;

        self.with_log(identifier, class, |log, now| {
            log.prune(now, TimeWindow::Hour);
            let used = u32::try_from(log.len()).unwrap_or(u32::MAX);
            per_hour.saturating_sub(used)
        })
    }

    /// Forget all history for a key. Resetting an unknown key does nothing.
    pub fn reset(&self, identifier: &str, class: ActionClass) {
        let removed = self.store.remove(identifier, class);
        info!(
            identifier = %identifier,
            class = %class,
            removed,
            "Rate limit state reset"
        );
    }

    /// Get the configured ceilings.
    pub fn rules(&self) -> &LimitRules {
        &self.rules
    }

    /// Get the number of tracked keys.
    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }

    pub(crate) fn store(&self) -> &CounterStore {
        &self.store
    }

    pub(crate) fn clock(&self) -> &C {
        &self.clock
    }

    /// Run `f` on the key's log with its lock held.
    ///
    /// "Now" is read after the lock is taken so appends on one key stay in
    /// order. A log detached by a concurrent reset or sweep is abandoned and
    /// fetched again.
    fn with_log<T, F>(&self, identifier: &str, class: ActionClass, f: F) -> T
    where
        F: FnOnce(&mut TimestampLog, Instant) -> T,
    {
        loop {
            let handle = self.store.get_or_create(identifier, class);
            let mut log = handle.lock();
            if log.is_detached() {
                continue;
            }
            let now = self.clock.now();
            return f(&mut *log, now);
        }
    }
}
