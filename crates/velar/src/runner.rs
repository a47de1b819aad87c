//! Suite runner: independent cases, fresh session each.
//!
//! A failing case terminates with a descriptive message and is recorded;
//! it never aborts the suite. Every case gets its own session from the
//! factory, torn down best-effort when the case ends.

use crate::context::{RunContext, Timeouts};
use crate::report::{CaseReport, RunReport};
use crate::result::VelarResult;
use crate::session::Session;
use std::time::Instant;

/// One named test case
pub struct TestCase<S> {
    name: String,
    body: CaseBody<S>,
}

enum CaseBody<S> {
    Run(Box<dyn FnMut(&mut RunContext<S>) -> VelarResult<()>>),
    Disabled { reason: String },
}

impl<S> std::fmt::Debug for TestCase<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field(
                "disabled",
                &matches!(self.body, CaseBody::Disabled { .. }),
            )
            .finish()
    }
}

impl<S: Session> TestCase<S> {
    /// Create a runnable case
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        body: impl FnMut(&mut RunContext<S>) -> VelarResult<()> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            body: CaseBody::Run(Box::new(body)),
        }
    }

    /// Create a disabled case, reported as SKIP
    #[must_use]
    pub fn disabled(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: CaseBody::Disabled {
                reason: reason.into(),
            },
        }
    }

    /// Case name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Runs cases against sessions produced by a factory
pub struct Runner<F> {
    suite: String,
    factory: F,
    timeouts: Timeouts,
}

impl<F> std::fmt::Debug for Runner<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("suite", &self.suite)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

impl<F> Runner<F> {
    /// Create a runner over a session factory
    #[must_use]
    pub fn new(suite: impl Into<String>, factory: F) -> Self {
        Self {
            suite: suite.into(),
            factory,
            timeouts: Timeouts::default(),
        }
    }

    /// Override the timeout table handed to every case
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Run all cases, one fresh session each, and collect the report
    pub fn run<S: Session>(&mut self, cases: Vec<TestCase<S>>) -> RunReport
    where
        F: FnMut() -> VelarResult<S>,
    {
        let mut report = RunReport::new(self.suite.clone());
        for case in cases {
            report.record(self.run_case(case));
        }
        tracing::info!("{}", report.summary());
        report
    }

    fn run_case<S: Session>(&mut self, case: TestCase<S>) -> CaseReport
    where
        F: FnMut() -> VelarResult<S>,
    {
        let name = case.name;
        let mut body = match case.body {
            CaseBody::Disabled { reason } => {
                tracing::info!("Test skipped: {name} ({reason})");
                return CaseReport::skipped(name, reason);
            }
            CaseBody::Run(body) => body,
        };

        tracing::info!("Test started: {name}");
        let started = Instant::now();
        let session = match (self.factory)() {
            Ok(session) => session,
            Err(err) => {
                tracing::error!("Session setup failed for {name}: {err}");
                return CaseReport::failed(
                    name,
                    started.elapsed(),
                    Vec::new(),
                    format!("session setup failed: {err}"),
                );
            }
        };

        let mut ctx = RunContext::new(session, self.timeouts);
        let outcome = body(&mut ctx);
        let duration = started.elapsed();
        let steps = ctx.take_log().lines();
        if let Err(err) = ctx.session.quit() {
            tracing::warn!("Session teardown failed for {name}: {err}");
        }

        match outcome {
            Ok(()) => {
                tracing::info!("Test passed: {name}");
                CaseReport::passed(name, duration, steps)
            }
            Err(err) => {
                tracing::error!("Test failed: {name}: {err}");
                CaseReport::failed(name, duration, steps, err.to_string())
            }
        }
    }
}
