//! Background cleanup of idle rate limit state.

mod sweeper;

pub use sweeper::{SweepError, SweepReport, Sweeper, SweeperHandle};
