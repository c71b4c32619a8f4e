//! Rate limiting logic and state management.

mod backend;
mod class;
mod clock;
mod key;
mod limiter;
mod rules;
mod store;
mod timestamps;
mod window;

pub use backend::RateLimiterBackend;
pub use class::ActionClass;
pub use clock::{Clock, ManualClock, SystemClock};
pub use key::LimiterKey;
pub use limiter::RateLimiter;
pub use rules::{Ceiling, LimitRules};
pub use store::{CounterStore, LogHandle};
pub use timestamps::TimestampLog;
pub use window::TimeWindow;
