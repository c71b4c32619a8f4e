//! Rate limiter trait for the request-handling layer.

use super::class::ActionClass;
use super::clock::Clock;
use super::limiter::RateLimiter;
use super::rules::Ceiling;
use crate::error::{Result, TurnstileError};

/// Trait for rate limiter implementations.
///
/// Request handlers and admin tooling depend on this rather than on a
/// concrete limiter, so they can be exercised against a stub.
pub trait RateLimiterBackend: Send + Sync {
    /// Record a request. Returns `true` when it is limited.
    fn consume(&self, identifier: &str, class: ActionClass) -> bool;

    /// Requests still allowed within the current hour.
    fn remaining(&self, identifier: &str, class: ActionClass) -> u32;

    /// Clear all state for a key.
    fn reset(&self, identifier: &str, class: ActionClass);

    /// Configured ceilings for a class.
    fn ceiling(&self, class: ActionClass) -> Ceiling;

    /// Gate a request, turning a limited verdict into
    /// [`TurnstileError::RateLimited`] so handlers can bail out with `?`.
    fn admit(&self, identifier: &str, class: ActionClass) -> Result<()> {
        if self.consume(identifier, class) {
            Err(TurnstileError::RateLimited { class })
        } else {
            Ok(())
        }
    }
}

impl<C: Clock> RateLimiterBackend for RateLimiter<C> {
    fn consume(&self, identifier: &str, class: ActionClass) -> bool {
        RateLimiter::consume(self, identifier, class)
    }

    fn remaining(&self, identifier: &str, class: ActionClass) -> u32 {
        RateLimiter::remaining(self, identifier, class)
    }

    fn reset(&self, identifier: &str, class: ActionClass) {
        RateLimiter::reset(self, identifier, class)
    }

    fn ceiling(&self, class: ActionClass) -> Ceiling {
        self.rules().ceiling(class)
    }
}
