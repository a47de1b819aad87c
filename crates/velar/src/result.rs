//! Result and error types for Velar.

use thiserror::Error;

/// Result type for Velar operations
pub type VelarResult<T> = Result<T, VelarError>;

/// Errors that can occur during a verification run
#[derive(Debug, Error)]
pub enum VelarError {
    /// Unrecognized run parameter; rejected before any session is created
    #[error("Unsupported configuration: {message}")]
    UnsupportedConfiguration {
        /// What was rejected and why
        message: String,
    },

    /// Session launch error
    #[error("Failed to launch session: {message}")]
    SessionLaunch {
        /// Error message
        message: String,
    },

    /// Navigation to an address failed
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// Address that failed
        url: String,
        /// Error message
        message: String,
    },

    /// A bounded wait never observed the expected condition
    #[error("Timed out after {elapsed_ms}ms waiting for {waiting_for}")]
    TimedOut {
        /// Description of the predicate being waited on
        waiting_for: String,
        /// Elapsed bound in milliseconds
        elapsed_ms: u64,
    },

    /// A previously resolved element reference became invalid mid-operation.
    /// Recovered locally by re-resolution and bounded retry.
    #[error("Stale element reference: {what}")]
    StaleReference {
        /// What the reference pointed at
        what: String,
    },

    /// The collection stopped matching the requested criteria mid-iteration
    #[error("Filter drift at position {index}: {observed}")]
    FilterDrift {
        /// Position at which drift was observed
        index: usize,
        /// Observed value that no longer matches
        observed: String,
    },

    /// Observed content does not satisfy expected criteria
    #[error("Assertion mismatch for {subject}: expected {expected}, actual {actual}")]
    AssertionMismatch {
        /// What was being checked
        subject: String,
        /// Expected criteria
        expected: String,
        /// Observed value
        actual: String,
    },

    /// No element matched the locator
    #[error("No element found for {locator}")]
    ElementNotFound {
        /// The locator that matched nothing
        locator: String,
    },

    /// Browsing-context operation failed
    #[error("Browsing context error: {message}")]
    Context {
        /// Error message
        message: String,
    },

    /// Session-level protocol or driver error
    #[error("Session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VelarError {
    /// Whether this error is a transient invalidation, recoverable by
    /// re-resolving the reference and retrying the step.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::StaleReference { .. })
    }

    /// Build a stale-reference error for a described target
    #[must_use]
    pub fn stale(what: impl Into<String>) -> Self {
        Self::StaleReference { what: what.into() }
    }

    /// Build a session error from a message
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_out_display_names_predicate_and_bound() {
        let err = VelarError::TimedOut {
            waiting_for: "listing to repopulate".into(),
            elapsed_ms: 4500,
        };
        let msg = err.to_string();
        assert!(msg.contains("listing to repopulate"));
        assert!(msg.contains("4500ms"));
    }

    #[test]
    fn test_only_stale_reference_is_transient() {
        assert!(VelarError::stale("listing item 2").is_transient());
        assert!(!VelarError::TimedOut {
            waiting_for: "x".into(),
            elapsed_ms: 1,
        }
        .is_transient());
        assert!(!VelarError::FilterDrift {
            index: 0,
            observed: "Izmir".into(),
        }
        .is_transient());
    }

    #[test]
    fn test_assertion_mismatch_names_expected_and_actual() {
        let err = VelarError::AssertionMismatch {
            subject: "location".into(),
            expected: "Istanbul, Turkiye".into(),
            actual: "Ankara, Turkiye".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Istanbul, Turkiye"));
        assert!(msg.contains("Ankara, Turkiye"));
    }
}
