//! Listing data model: items, snapshots, filter criteria.
//!
//! A snapshot is a pure read of a single rendering pass. It is never
//! mutated in place and never survives a state-changing action; callers
//! re-snapshot after every mutation and drive per-item work by position,
//! re-resolving live elements each step.

use crate::locator::Selector;
use crate::result::{VelarError, VelarResult};
use crate::retry::{retry_stale, RetryPolicy};
use crate::session::Session;
use serde::{Deserialize, Serialize};

/// One rendered listing entry, captured as plain data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    /// Transient position within the rendering this was captured from
    pub index: usize,
    /// Position title
    pub title: String,
    /// Category (department) text
    pub category: String,
    /// Location text
    pub location: String,
}

/// Immutable ordered capture of all currently rendered items at one instant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingSnapshot {
    /// Captured items, in render order
    pub items: Vec<JobPosting>,
}

impl ListingSnapshot {
    /// Number of captured items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the capture is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether every captured item satisfies the criteria
    #[must_use]
    pub fn all_match(&self, criteria: &FilterCriteria) -> bool {
        !self.is_empty() && self.items.iter().all(|item| criteria.matches(item))
    }

    /// First captured item that fails the criteria, if any
    #[must_use]
    pub fn first_mismatch(&self, criteria: &FilterCriteria) -> Option<&JobPosting> {
        self.items.iter().find(|item| !criteria.matches(item))
    }
}

/// Matches rendered text against a fixed expected label.
///
/// Containment is case-sensitive substring — the source renders decorated
/// strings around the label. An alternate (abbreviated) form of the same
/// label is accepted where one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMatcher {
    /// Canonical label; also the visible option text used when selecting
    canonical: String,
    /// Abbreviated form treated as equivalent
    abbreviated: Option<String>,
}

impl LabelMatcher {
    /// Create a matcher for a canonical label
    #[must_use]
    pub fn new(canonical: impl Into<String>) -> Self {
        Self {
            canonical: canonical.into(),
            abbreviated: None,
        }
    }

    /// Accept an abbreviated form as equivalent
    #[must_use]
    pub fn with_abbreviation(mut self, abbreviated: impl Into<String>) -> Self {
        self.abbreviated = Some(abbreviated.into());
        self
    }

    /// The canonical label (used for option selection)
    #[must_use]
    pub fn label(&self) -> &str {
        &self.canonical
    }

    /// Whether `text` contains the canonical or abbreviated label
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        text.contains(&self.canonical)
            || self
                .abbreviated
                .as_deref()
                .is_some_and(|abbr| text.contains(abbr))
    }

    /// Human-readable description for failure messages
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.abbreviated {
            Some(abbr) => format!("'{}' (or '{abbr}')", self.canonical),
            None => format!("'{}'", self.canonical),
        }
    }
}

/// The (location, category) pair an item must match to be considered
/// correctly filtered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Expected location label
    pub location: LabelMatcher,
    /// Expected category label
    pub category: LabelMatcher,
}

impl FilterCriteria {
    /// Create criteria from plain labels
    #[must_use]
    pub fn new(location: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            location: LabelMatcher::new(location),
            category: LabelMatcher::new(category),
        }
    }

    /// Accept an abbreviated category label as equivalent
    #[must_use]
    pub fn with_category_abbreviation(mut self, abbreviated: impl Into<String>) -> Self {
        self.category = self.category.with_abbreviation(abbreviated);
        self
    }

    /// Whether an item satisfies both criteria.
    ///
    /// Category is accepted on either the category field or the title —
    /// listings commonly repeat the department in the position title.
    #[must_use]
    pub fn matches(&self, item: &JobPosting) -> bool {
        self.location.matches(&item.location)
            && (self.category.matches(&item.category) || self.category.matches(&item.title))
    }
}

/// Locator table for one listing rendering
#[derive(Debug, Clone)]
pub struct ListingLocators {
    /// The list container
    pub container: Selector,
    /// One listing entry
    pub item: Selector,
    /// Title element within an entry
    pub title: Selector,
    /// Category element within an entry
    pub category: Selector,
    /// Location element within an entry
    pub location: Selector,
    /// Navigation trigger within an entry
    pub trigger: Selector,
}

/// Read the fields of the live item at `index`, re-resolving the collection
/// first. Reports stale-reference errors for the caller's retry policy to
/// absorb.
///
/// # Errors
///
/// [`VelarError::StaleReference`] if the item or a field reference went
/// invalid mid-read; [`VelarError::ElementNotFound`] if `index` is out of
/// bounds of the live collection.
pub fn read_item<S: Session>(
    session: &S,
    locators: &ListingLocators,
    index: usize,
) -> VelarResult<JobPosting> {
    let items = session.find_all(&locators.item)?;
    let Some(&item) = items.get(index) else {
        return Err(VelarError::ElementNotFound {
            locator: format!("{} at position {index}", locators.item),
        });
    };
    session.scroll_into_view(item)?;
    let title = session.text(session.find_child(item, &locators.title)?)?;
    let category = session.text(session.find_child(item, &locators.category)?)?;
    let location = session.text(session.find_child(item, &locators.location)?)?;
    Ok(JobPosting {
        index,
        title,
        category,
        location,
    })
}

/// Capture a snapshot of the whole live collection.
///
/// Each item read retries on transient invalidation, so a capture racing a
/// re-render settles instead of failing; a capture observing zero items
/// yields an empty snapshot, not an error.
pub fn capture_snapshot<S: Session>(
    session: &S,
    locators: &ListingLocators,
) -> VelarResult<ListingSnapshot> {
    let count = session.find_all(&locators.item)?.len();
    let mut items = Vec::with_capacity(count);
    for index in 0..count {
        let read = retry_stale(RetryPolicy::STALE, |_| read_item(session, locators, index));
        match read {
            Ok(attempted) => items.push(attempted.value),
            // Collection shrank while capturing: the snapshot is whatever
            // was still live.
            Err(VelarError::ElementNotFound { .. }) => break,
            Err(err) => return Err(err),
        }
    }
    Ok(ListingSnapshot { items })
}
