//! Velar: browser-driven verification of dynamically rendered, filterable
//! listings.
//!
//! The core is a synchronization and cross-context verification engine for
//! a careers-listing flow: it waits for an asynchronously populated,
//! filterable list to reach a stable and semantically correct state,
//! iterates it by position while the renderer may mutate or reset it
//! underneath, and verifies each item's navigation target in a new
//! browsing context — restoring the original context on every path.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  List Synchronizer ──► stable, filtered collection               │
//! │        │                                                         │
//! │        ▼                                                         │
//! │  Indexed Iteration Controller ──► per-item handle (re-resolved)  │
//! │        │                                                         │
//! │        ▼                                                         │
//! │  Cross-Context Navigation Verifier ──► pass/fail per item        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is generic over the [`session::Session`] capability surface.
//! Tests drive the in-memory [`sim::SimSession`]; the `browser` feature
//! adds a CDP-backed Chromium session.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Run configuration: browser choice, headless mode, report directory
pub mod config;

/// Per-run context: session, step log, timeout table
pub mod context;

/// Position-driven iteration with bounded retry and drift recovery
pub mod iterate;

/// Listing data model: items, snapshots, filter criteria
pub mod listing;

/// Declarative element selection
pub mod locator;

/// Cross-context navigation verification
pub mod navigate;

/// Page objects for the careers flow
pub mod pages;

/// Bounded-time condition polling
pub mod poll;

/// Run reporting (HTML + JSON)
pub mod report;

/// Error taxonomy and result alias
pub mod result;

/// Bounded retry on transient invalidation
pub mod retry;

/// Suite runner with per-case session isolation
pub mod runner;

/// Session capability surface
pub mod session;

/// Simulated careers site for tests
pub mod sim;

/// The standard careers verification suite
pub mod suite;

/// List synchronization: filter application and refresh stability
pub mod sync;

/// CDP-backed Chromium session
#[cfg(feature = "browser")]
pub mod cdp;

pub use config::{BrowserKind, RunConfig};
pub use context::{RunContext, StepLog, Timeouts};
pub use iterate::{for_each_item, IterationOutcome};
pub use listing::{FilterCriteria, JobPosting, LabelMatcher, ListingLocators, ListingSnapshot};
pub use locator::Selector;
pub use navigate::{verify_navigation_target, DestinationCheck};
pub use pages::{CareersPage, HomePage, JobsPage};
pub use poll::{poll_for, poll_until, PollOptions, Polled};
pub use report::{CaseReport, RunReport, TestStatus};
pub use result::{VelarError, VelarResult};
pub use retry::{retry_stale, Attempted, RetryPolicy};
pub use runner::{Runner, TestCase};
pub use session::{ContextId, ElementId, Session};
pub use suite::{careers_cases, SuiteTargets};
pub use sync::{apply_filters, await_list_refresh, FilterControls, RefreshOutcome};

#[cfg(feature = "browser")]
pub use cdp::CdpSession;
