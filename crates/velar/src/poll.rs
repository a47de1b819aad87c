//! Bounded-time condition polling.
//!
//! The one timing primitive everything else is built on: evaluate a
//! predicate against live state at a fixed cadence until it holds or the
//! bound elapses. A false-but-not-yet-true evaluation is never an error;
//! only the elapsed bound is.

use crate::result::{VelarError, VelarResult};
use std::time::{Duration, Instant};

/// Default timeout for wait operations (15 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Default polling interval (200ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;

/// Options for a single bounded wait
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl PollOptions {
    /// Create new poll options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Outcome of a successful wait
#[derive(Debug, Clone)]
pub struct Polled {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

/// Wait until `predicate` returns true, polling at the configured cadence.
///
/// The predicate observes live state and must be side-effect free beyond
/// observation. Safe to call repeatedly; no timers outlive the call.
///
/// # Errors
///
/// Returns [`VelarError::TimedOut`] carrying `description` and the elapsed
/// bound if the predicate never held within the timeout.
pub fn poll_until<F>(description: &str, options: &PollOptions, mut predicate: F) -> VelarResult<Polled>
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    let timeout = options.timeout();
    let interval = options.poll_interval();

    loop {
        if predicate() {
            return Ok(Polled {
                elapsed: start.elapsed(),
                waited_for: description.to_string(),
            });
        }
        if start.elapsed() >= timeout {
            return Err(VelarError::TimedOut {
                waiting_for: description.to_string(),
                elapsed_ms: options.timeout_ms,
            });
        }
        std::thread::sleep(interval);
    }
}

/// Wait until `resolve` produces a value, under the same contract as
/// [`poll_until`].
///
/// # Errors
///
/// Returns [`VelarError::TimedOut`] if no value was produced within the
/// timeout.
pub fn poll_for<T, F>(description: &str, options: &PollOptions, mut resolve: F) -> VelarResult<T>
where
    F: FnMut() -> Option<T>,
{
    let start = Instant::now();
    let timeout = options.timeout();
    let interval = options.poll_interval();

    loop {
        if let Some(value) = resolve() {
            return Ok(value);
        }
        if start.elapsed() >= timeout {
            return Err(VelarError::TimedOut {
                waiting_for: description.to_string(),
                elapsed_ms: options.timeout_ms,
            });
        }
        std::thread::sleep(interval);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let opts = PollOptions::default();
            assert_eq!(opts.timeout_ms, DEFAULT_TIMEOUT_MS);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_builder_chain() {
            let opts = PollOptions::new().with_timeout(500).with_poll_interval(5);
            assert_eq!(opts.timeout(), Duration::from_millis(500));
            assert_eq!(opts.poll_interval(), Duration::from_millis(5));
        }
    }

    mod poll_until_tests {
        use super::*;

        #[test]
        fn test_immediate_success() {
            let opts = PollOptions::new().with_timeout(100).with_poll_interval(1);
            let result = poll_until("always true", &opts, || true).unwrap();
            assert_eq!(result.waited_for, "always true");
        }

        #[test]
        fn test_becomes_true_after_attempts() {
            let calls = AtomicUsize::new(0);
            let opts = PollOptions::new().with_timeout(500).with_poll_interval(1);
            let result = poll_until("third time", &opts, || {
                calls.fetch_add(1, Ordering::SeqCst) >= 2
            });
            assert!(result.is_ok());
            assert!(calls.load(Ordering::SeqCst) >= 3);
        }

        #[test]
        fn test_timeout_carries_description_and_bound() {
            let opts = PollOptions::new().with_timeout(50).with_poll_interval(5);
            let err = poll_until("never true", &opts, || false).unwrap_err();
            match err {
                VelarError::TimedOut {
                    waiting_for,
                    elapsed_ms,
                } => {
                    assert_eq!(waiting_for, "never true");
                    assert_eq!(elapsed_ms, 50);
                }
                other => panic!("expected TimedOut, got {other:?}"),
            }
        }

        #[test]
        fn test_false_evaluations_are_not_errors() {
            let calls = AtomicUsize::new(0);
            let opts = PollOptions::new().with_timeout(500).with_poll_interval(1);
            poll_until("eventually", &opts, || {
                calls.fetch_add(1, Ordering::SeqCst) >= 5
            })
            .unwrap();
        }
    }

    mod poll_for_tests {
        use super::*;

        #[test]
        fn test_resolves_value() {
            let calls = AtomicUsize::new(0);
            let opts = PollOptions::new().with_timeout(500).with_poll_interval(1);
            let value = poll_for("a value", &opts, || {
                if calls.fetch_add(1, Ordering::SeqCst) >= 2 {
                    Some(42)
                } else {
                    None
                }
            })
            .unwrap();
            assert_eq!(value, 42);
        }

        #[test]
        fn test_none_forever_times_out() {
            let opts = PollOptions::new().with_timeout(50).with_poll_interval(5);
            let result: VelarResult<u32> = poll_for("nothing", &opts, || None);
            assert!(matches!(result, Err(VelarError::TimedOut { .. })));
        }
    }
}
