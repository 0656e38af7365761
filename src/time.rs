//! Time abstraction for testability.
//!
//! This module provides a [`Clock`] trait that allows injecting fixed clocks
//! in tests while using the real system clock in production. The config file
//! header records its generation time through it.

use std::time::SystemTime;

use chrono::{DateTime, Local, SecondsFormat};

/// Abstraction over system time for testability.
///
/// # Example
///
/// ```
/// use dbnode_config::time::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let now = clock.now();
/// assert!(now >= std::time::SystemTime::UNIX_EPOCH);
/// ```
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> SystemTime;
}

/// Production clock using actual system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// ISO 8601 local timestamp of `clock`'s current time, to the second.
#[must_use]
pub fn iso_timestamp(clock: &dyn Clock) -> String {
    DateTime::<Local>::from(clock.now()).to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Test clocks.
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::time::Duration;

    /// Always reports the same instant.
    #[derive(Debug, Clone, Copy)]
    pub struct FixedClock {
        secs: u64,
    }

    impl FixedClock {
        /// Clock stuck `secs` seconds after the Unix epoch.
        pub const fn at(secs: u64) -> Self {
            Self { secs }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> SystemTime {
            SystemTime::UNIX_EPOCH + Duration::from_secs(self.secs)
        }
    }
}
