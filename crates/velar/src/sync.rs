//! List synchronization: filter application and refresh stability.
//!
//! A filter change races the renderer: the old items may be torn down and
//! replaced at any point after the select fires, or not at all if the
//! resulting list is identical. Synchronization therefore happens in
//! phases — observe teardown (best effort), observe repopulation (hard
//! bound), then hold until the *entire* collection satisfies the requested
//! criteria. A single mismatching item keeps the wait pending.

use crate::context::RunContext;
use crate::listing::{capture_snapshot, FilterCriteria, ListingLocators, ListingSnapshot};
use crate::locator::Selector;
use crate::poll::{poll_for, poll_until};
use crate::result::{VelarError, VelarResult};
use crate::session::{ElementId, Session};

/// Locators of the two filter select controls
#[derive(Debug, Clone)]
pub struct FilterControls {
    /// Location select
    pub location: Selector,
    /// Category (department) select
    pub category: Selector,
}

/// What the stability detector observed after a filter change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The old rendering was torn down and a new one appeared
    Refreshed,
    /// The old rendering never went stale within the sub-timeout; the
    /// content may be identical or the update faster than observable.
    /// Logged, not asserted.
    NoChangeDetected,
}

/// Wait for the initial listing load: container present, then at least one
/// item rendered. Uses the extended listing-load bound — the upstream
/// listing API is the slowest dependency in the whole flow.
///
/// # Errors
///
/// [`VelarError::TimedOut`] if the listing never populates; the predicate
/// description names the API as the suspect.
pub fn wait_for_initial_load<S: Session>(
    ctx: &mut RunContext<S>,
    locators: &ListingLocators,
) -> VelarResult<()> {
    ctx.step("Waiting for initial listing load (extended timeout)");
    let options = ctx.timeouts().listing_load();

    let container = poll_for("listing container to be present", &options, || {
        ctx.session.find(&locators.container).ok()
    })?;
    // fire any lazy-loading trigger tied to the container entering the viewport
    ctx.session.scroll_into_view(container)?;

    poll_until(
        "initial listing to populate; the listing API may be slow or unavailable",
        &options,
        || {
            ctx.session
                .find_all(&locators.item)
                .map(|items| !items.is_empty())
                .unwrap_or(false)
        },
    )?;
    ctx.step("Initial listing loaded");
    Ok(())
}

/// Stability detection after a filter-changing action.
///
/// Phase 1 (best effort, short sub-timeout): the previously captured first
/// item goes stale, confirming the old rendering was torn down. Not
/// observing this is a logged [`RefreshOutcome::NoChangeDetected`], never a
/// failure — the render might be instantaneous or produce an identical
/// list.
///
/// Phase 2 (hard bound): a non-empty new collection becomes observable.
///
/// # Errors
///
/// [`VelarError::TimedOut`] only for phase 2.
pub fn await_list_refresh<S: Session>(
    ctx: &mut RunContext<S>,
    locators: &ListingLocators,
    previous_first: Option<ElementId>,
) -> VelarResult<RefreshOutcome> {
    let outcome = match previous_first {
        Some(previous) => {
            ctx.step("Waiting for the old listing to be torn down (staleness check)");
            let staleness = ctx.timeouts().staleness();
            match poll_until("previous first item to go stale", &staleness, || {
                !ctx.session.is_attached(previous)
            }) {
                Ok(_) => {
                    ctx.step("Old listing verified as stale; list is updating");
                    RefreshOutcome::Refreshed
                }
                Err(VelarError::TimedOut { .. }) => {
                    ctx.step(
                        "Old listing never went stale; content may be identical or the \
                         update too fast to observe",
                    );
                    RefreshOutcome::NoChangeDetected
                }
                Err(other) => return Err(other),
            }
        }
        None => RefreshOutcome::NoChangeDetected,
    };

    poll_until(
        "listing to repopulate after filter change",
        &ctx.timeouts().listing_load(),
        || {
            ctx.session
                .find_all(&locators.item)
                .map(|items| !items.is_empty())
                .unwrap_or(false)
        },
    )?;
    Ok(outcome)
}

/// Apply the filter criteria and hold until the listing is stable and
/// semantically correct: non-empty, with *every* item satisfying the
/// criteria. Returns the snapshot that satisfied the predicate.
///
/// Selection order matters: location first — the category option set may
/// depend on it in the underlying source.
///
/// # Errors
///
/// [`VelarError::TimedOut`] naming the expected criteria if the collection
/// never converges; session errors pass through.
pub fn apply_filters<S: Session>(
    ctx: &mut RunContext<S>,
    controls: &FilterControls,
    locators: &ListingLocators,
    criteria: &FilterCriteria,
) -> VelarResult<ListingSnapshot> {
    ctx.step(format!(
        "Filtering listing by location {} and category {}",
        criteria.location.describe(),
        criteria.category.describe(),
    ));

    // the filter controls populate late; the criterion must exist as an
    // option before selection is attempted
    let wait = ctx.timeouts().wait();
    poll_until(
        &format!(
            "location option {} to be present",
            criteria.location.describe()
        ),
        &wait,
        || {
            ctx.session
                .find(&controls.location)
                .and_then(|el| ctx.session.option_labels(el))
                .map(|labels| labels.iter().any(|l| l == criteria.location.label()))
                .unwrap_or(false)
        },
    )?;

    // pre-change capture for the staleness check
    let previous_first = ctx
        .session
        .find_all(&locators.item)
        .ok()
        .and_then(|items| items.first().copied());

    let location_select = ctx.session.find(&controls.location)?;
    ctx.session
        .select_by_label(location_select, criteria.location.label())?;
    let category_select = ctx.session.find(&controls.category)?;
    ctx.session
        .select_by_label(category_select, criteria.category.label())?;

    await_list_refresh(ctx, locators, previous_first)?;

    let description = format!(
        "every listed item to match location {} and category {}",
        criteria.location.describe(),
        criteria.category.describe(),
    );
    let snapshot = poll_for(&description, &wait, || {
        capture_snapshot(&ctx.session, locators)
            .ok()
            .filter(|snapshot| snapshot.all_match(criteria))
    })?;
    ctx.step(format!(
        "Listing stable: {} item(s), all matching the filter criteria",
        snapshot.len()
    ));
    Ok(snapshot)
}
