//! Clock abstraction used for stream idle tracking.
//!
//! The engine stamps every stream with the time of its last delivery and prunes
//! streams that have been idle for too long. Reading "now" through [`Clock`]
//! lets tests drive that logic deterministically with [`mock_clock::MockClock`].

use std::fmt::Debug;
use std::time::Instant;

/// Source of the current `Instant`.
pub trait Clock: Send + Sync + Debug {
    /// Current `Instant`.
    fn now(&self) -> Instant;
}

/// Wall clock backed by `std::time::Instant`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually driven clock for tests.
pub mod mock_clock {
    use super::*;
    use std::sync::{Mutex, MutexGuard};
    use std::time::Duration;

    /// Clock that only moves when told to.
    #[derive(Debug)]
    pub struct MockClock {
        current_time: Mutex<Instant>,
    }

    impl MockClock {
        /// Creates a clock frozen at `start_time`.
        pub fn new(start_time: Instant) -> Self {
            Self {
                current_time: Mutex::new(start_time),
            }
        }

        fn guard(&self) -> MutexGuard<'_, Instant> {
            self.current_time
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
        }

        /// Moves the clock forward by `duration`.
        pub fn advance(&self, duration: Duration) {
            *self.guard() += duration;
        }

        /// Jumps the clock to `new_time`.
        pub fn set_time(&self, new_time: Instant) {
            *self.guard() = new_time;
        }
    }

    impl Default for MockClock {
        fn default() -> Self {
            Self::new(Instant::now())
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> Instant {
            *self.guard()
        }
    }
}
