//! Session capability surface.
//!
//! The verification engine is generic over this trait; it is the seam
//! between the correctness protocol and whatever actually renders pages.
//! Two implementations ship with the crate: the simulated site
//! ([`crate::sim::SimSession`]) and, behind the `browser` feature, a
//! CDP-backed Chromium session ([`crate::cdp::CdpSession`]).
//!
//! Element handles are transient: any state-changing action may invalidate
//! every previously returned [`ElementId`]. Operations on an invalidated
//! handle report [`crate::VelarError::StaleReference`], which callers
//! recover from by re-resolving (see [`crate::retry`]).

use crate::locator::Selector;
use crate::result::VelarResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a browsing context within one session.
///
/// Exactly one "original" context persists for the lifetime of a run;
/// auxiliary contexts are ephemeral.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(String);

impl ContextId {
    /// Create a context id from a backend handle
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The backend handle
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to a located element within the active context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(u64);

impl ElementId {
    /// Create an element id from a backend handle
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw backend handle
    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// One driven browsing session: context control plus element capability.
///
/// All waits live above this trait (see [`crate::poll`]); implementations
/// observe and act, they do not block.
pub trait Session {
    /// Navigate the active context to an address
    fn open(&mut self, url: &str) -> VelarResult<()>;

    /// Address currently loaded in the active context
    fn current_url(&self) -> VelarResult<String>;

    /// Document title of the active context
    fn title(&self) -> VelarResult<String>;

    /// Identifiers of all open contexts, original included
    fn contexts(&self) -> VelarResult<Vec<ContextId>>;

    /// Identifier of the active context
    fn active_context(&self) -> VelarResult<ContextId>;

    /// Make another open context the active one
    fn switch_to(&mut self, context: &ContextId) -> VelarResult<()>;

    /// Close the active context. The caller must [`Session::switch_to`] an
    /// open context before issuing further element operations.
    fn close_active(&mut self) -> VelarResult<()>;

    /// Locate a single element in the active context
    fn find(&self, selector: &Selector) -> VelarResult<ElementId>;

    /// Locate all matching elements in the active context, in render order
    fn find_all(&self, selector: &Selector) -> VelarResult<Vec<ElementId>>;

    /// Locate a single descendant of a previously located element
    fn find_child(&self, parent: ElementId, selector: &Selector) -> VelarResult<ElementId>;

    /// Visible text of an element, trimmed; falls back to text content for
    /// elements the renderer reports as empty
    fn text(&self, element: ElementId) -> VelarResult<String>;

    /// Click an element
    fn click(&mut self, element: ElementId) -> VelarResult<()>;

    /// Select an option of a select control by its visible label
    fn select_by_label(&mut self, element: ElementId, label: &str) -> VelarResult<()>;

    /// Visible labels of all options of a select control
    fn option_labels(&self, element: ElementId) -> VelarResult<Vec<String>>;

    /// Scroll an element into the viewport
    fn scroll_into_view(&self, element: ElementId) -> VelarResult<()>;

    /// Whether a previously located element still corresponds to live
    /// rendered content
    fn is_attached(&self, element: ElementId) -> bool;

    /// Tear the session down; further calls are invalid
    fn quit(&mut self) -> VelarResult<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_context_id_roundtrip() {
        let id = ContextId::new("tab-1");
        assert_eq!(id.as_str(), "tab-1");
        assert_eq!(id.to_string(), "tab-1");
        assert_eq!(id, ContextId::new("tab-1"));
        assert_ne!(id, ContextId::new("tab-2"));
    }

    #[test]
    fn test_element_id_is_copyable_and_displays() {
        let id = ElementId::new(9);
        let copied = id;
        assert_eq!(copied.raw(), 9);
        assert_eq!(id.to_string(), "element#9");
    }
}
