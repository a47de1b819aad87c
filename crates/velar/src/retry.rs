//! Bounded retry on transient invalidation.
//!
//! Stale references are recovered by re-resolving and re-running the step,
//! with the give-up policy visible as data rather than buried in handlers:
//! a [`RetryPolicy`] says how many retries are allowed, and the outcome
//! reports how many attempts were spent.

use crate::result::{VelarError, VelarResult};

/// How many times a transiently-failing step is retried before escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt
    pub max_retries: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::STALE
    }
}

impl RetryPolicy {
    /// The standard policy for stale-reference recovery: one attempt plus
    /// three retries; the fourth consecutive failure escalates.
    pub const STALE: Self = Self { max_retries: 3 };

    /// Create a policy with the given retry count
    #[must_use]
    pub const fn retries(max_retries: usize) -> Self {
        Self { max_retries }
    }

    /// Total attempts allowed (initial + retries)
    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.max_retries + 1
    }
}

/// Outcome of a successful retried operation
#[derive(Debug, Clone, Copy)]
pub struct Attempted<T> {
    /// The produced value
    pub value: T,
    /// Attempts spent, counting the first (1 = no retry was needed)
    pub attempts: usize,
}

/// Run `op` until it succeeds, retrying only on transient invalidation
/// ([`VelarError::is_transient`]). Any other error propagates immediately.
///
/// `op` receives the 1-based attempt number so it can re-resolve fresh
/// state on each retry.
///
/// # Errors
///
/// Returns the last transient error once the policy is exhausted, or the
/// first non-transient error unchanged.
pub fn retry_stale<T, F>(policy: RetryPolicy, mut op: F) -> VelarResult<Attempted<T>>
where
    F: FnMut(usize) -> VelarResult<T>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt) {
            Ok(value) => return Ok(Attempted { value, attempts: attempt }),
            Err(err) if err.is_transient() && attempt < policy.max_attempts() => {
                tracing::warn!(
                    attempt,
                    max = policy.max_attempts(),
                    "transient invalidation, re-resolving and retrying: {err}"
                );
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn stale() -> VelarError {
        VelarError::stale("test item")
    }

    #[test]
    fn test_success_on_first_attempt() {
        let out = retry_stale(RetryPolicy::STALE, |_| Ok(7)).unwrap();
        assert_eq!(out.value, 7);
        assert_eq!(out.attempts, 1);
    }

    #[test]
    fn test_recovers_from_single_invalidation() {
        let out = retry_stale(RetryPolicy::STALE, |attempt| {
            if attempt == 1 {
                Err(stale())
            } else {
                Ok("resolved")
            }
        })
        .unwrap();
        assert_eq!(out.attempts, 2);
    }

    #[test]
    fn test_fourth_consecutive_failure_escalates() {
        let mut calls = 0;
        let result: VelarResult<Attempted<()>> = retry_stale(RetryPolicy::STALE, |_| {
            calls += 1;
            Err(stale())
        });
        assert!(matches!(
            result,
            Err(VelarError::StaleReference { .. })
        ));
        assert_eq!(calls, 4, "one attempt plus three retries");
    }

    #[test]
    fn test_non_transient_error_is_not_retried() {
        let mut calls = 0;
        let result: VelarResult<Attempted<()>> = retry_stale(RetryPolicy::STALE, |_| {
            calls += 1;
            Err(VelarError::AssertionMismatch {
                subject: "location".into(),
                expected: "Istanbul".into(),
                actual: "Izmir".into(),
            })
        });
        assert!(matches!(
            result,
            Err(VelarError::AssertionMismatch { .. })
        ));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_policy_arithmetic() {
        assert_eq!(RetryPolicy::STALE.max_attempts(), 4);
        assert_eq!(RetryPolicy::retries(0).max_attempts(), 1);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // the attempt budget is a hard bound, and success always lands
            // exactly one call after the last transient failure
            #[test]
            fn retry_spends_exactly_the_budget(retries in 0usize..6, failures in 0usize..10) {
                let mut calls = 0;
                let result = retry_stale(RetryPolicy::retries(retries), |attempt| {
                    calls += 1;
                    if attempt <= failures {
                        Err(stale())
                    } else {
                        Ok(attempt)
                    }
                });
                prop_assert!(calls <= retries + 1);
                if failures < retries + 1 {
                    let attempted = result.unwrap();
                    prop_assert_eq!(attempted.attempts, failures + 1);
                } else {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(calls, retries + 1);
                }
            }
        }
    }
}
