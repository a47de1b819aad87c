//! Per-run context: session, step log, timeout table.
//!
//! One run = one session = one `RunContext`. Every component receives the
//! context explicitly; there is no ambient driver state, so parallel runs
//! cannot couple through hidden globals.

use crate::poll::PollOptions;
use crate::session::Session;
use std::time::{Duration, Instant};

/// Timeout table for one run
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Ordinary bounded wait
    pub wait_ms: u64,
    /// Extended wait for the initial listing load (slow upstream API)
    pub listing_load_ms: u64,
    /// Short sub-timeout for the staleness phase of a refresh
    pub staleness_ms: u64,
    /// Polling cadence
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            wait_ms: 15_000,
            listing_load_ms: 45_000,
            staleness_ms: 5_000,
            poll_interval_ms: 200,
        }
    }
}

impl Timeouts {
    /// Create the default timeout table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Millisecond-scale table for tests against the simulated site
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            wait_ms: 250,
            listing_load_ms: 500,
            staleness_ms: 40,
            poll_interval_ms: 1,
        }
    }

    /// Set the ordinary wait bound
    #[must_use]
    pub const fn with_wait(mut self, ms: u64) -> Self {
        self.wait_ms = ms;
        self
    }

    /// Set the extended listing-load bound
    #[must_use]
    pub const fn with_listing_load(mut self, ms: u64) -> Self {
        self.listing_load_ms = ms;
        self
    }

    /// Set the staleness sub-timeout
    #[must_use]
    pub const fn with_staleness(mut self, ms: u64) -> Self {
        self.staleness_ms = ms;
        self
    }

    /// Set the polling cadence
    #[must_use]
    pub const fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Poll options for an ordinary wait
    #[must_use]
    pub const fn wait(&self) -> PollOptions {
        PollOptions {
            timeout_ms: self.wait_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Poll options for the extended listing-load wait
    #[must_use]
    pub const fn listing_load(&self) -> PollOptions {
        PollOptions {
            timeout_ms: self.listing_load_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Poll options for the staleness sub-wait
    #[must_use]
    pub const fn staleness(&self) -> PollOptions {
        PollOptions {
            timeout_ms: self.staleness_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }
}

/// One timestamped step line
#[derive(Debug, Clone)]
pub struct StepEntry {
    /// Offset from the start of the log
    pub offset: Duration,
    /// Human-readable step description
    pub line: String,
}

/// Captured step lines for one test case, embedded into its report row
#[derive(Debug)]
pub struct StepLog {
    started: Instant,
    entries: Vec<StepEntry>,
}

impl Default for StepLog {
    fn default() -> Self {
        Self::new()
    }
}

impl StepLog {
    /// Create an empty log starting now
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            entries: Vec::new(),
        }
    }

    /// Append a step line
    pub fn append(&mut self, line: impl Into<String>) {
        self.entries.push(StepEntry {
            offset: self.started.elapsed(),
            line: line.into(),
        });
    }

    /// All entries in order
    #[must_use]
    pub fn entries(&self) -> &[StepEntry] {
        &self.entries
    }

    /// Rendered lines, `[+12.3s] message` style
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| format!("[+{:.1}s] {}", e.offset.as_secs_f64(), e.line))
            .collect()
    }
}

/// Everything one run carries: the session, its step log, and the timeout
/// table. Components borrow this instead of holding the session themselves.
#[derive(Debug)]
pub struct RunContext<S> {
    /// The driven session
    pub session: S,
    log: StepLog,
    timeouts: Timeouts,
}

impl<S: Session> RunContext<S> {
    /// Wrap a session with the given timeout table
    #[must_use]
    pub fn new(session: S, timeouts: Timeouts) -> Self {
        Self {
            session,
            log: StepLog::new(),
            timeouts,
        }
    }

    /// The timeout table
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Record a step: appended to the captured log and mirrored to tracing
    pub fn step(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!("{line}");
        self.log.append(line);
    }

    /// The captured step log
    #[must_use]
    pub const fn log(&self) -> &StepLog {
        &self.log
    }

    /// Take the captured step lines, leaving an empty log
    pub fn take_log(&mut self) -> StepLog {
        std::mem::take(&mut self.log)
    }
}
