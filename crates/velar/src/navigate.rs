//! Cross-context navigation verification.
//!
//! One verification walks `Idle → TriggeredNavigation → ContextOpened →
//! ContentVerified → ContextClosed → Restored`. `Restored` is always
//! reached once a context was opened: the target is closed and the original
//! context re-activated on every path, pass or fail, so the next iteration
//! step never starts in a foreign context.

use crate::context::RunContext;
use crate::listing::{FilterCriteria, ListingLocators};
use crate::locator::Selector;
use crate::poll::{poll_for, poll_until};
use crate::result::{VelarError, VelarResult};
use crate::session::{ContextId, Session};

/// Expected shape of the navigation target
#[derive(Debug, Clone)]
pub struct DestinationCheck {
    /// The target address must contain at least one of these markers
    pub url_markers: Vec<String>,
    /// Location field on the target page
    pub location_field: Selector,
    /// Category field on the target page
    pub category_field: Selector,
}

impl DestinationCheck {
    /// Whether an address satisfies the destination predicate
    #[must_use]
    pub fn url_matches(&self, url: &str) -> bool {
        self.url_markers.iter().any(|marker| url.contains(marker))
    }

    fn describe_markers(&self) -> String {
        self.url_markers.join("' or '")
    }
}

/// Trigger the navigation of the item at `index`, verify the opened
/// context, and restore the original context and list state.
///
/// # Errors
///
/// [`VelarError::TimedOut`] if no new context opens or the destination
/// predicate never holds; [`VelarError::AssertionMismatch`] if target-page
/// fields fail the criteria; transient invalidation during trigger
/// resolution passes through for the iteration controller to retry. In
/// every case after the target context opened, cleanup has already run by
/// the time the error is returned.
pub fn verify_navigation_target<S: Session>(
    ctx: &mut RunContext<S>,
    locators: &ListingLocators,
    destination: &DestinationCheck,
    criteria: &FilterCriteria,
    index: usize,
) -> VelarResult<()> {
    let original = ctx.session.active_context()?;

    // resolve the trigger fresh against the live collection and fire it
    let items = ctx.session.find_all(&locators.item)?;
    let Some(&item) = items.get(index) else {
        return Err(VelarError::ElementNotFound {
            locator: format!("{} at position {index}", locators.item),
        });
    };
    ctx.session.scroll_into_view(item)?;
    let trigger = ctx.session.find_child(item, &locators.trigger)?;
    ctx.step(format!("Opening navigation target for item #{}", index + 1));
    ctx.session.click(trigger)?;

    // exactly one new context is expected
    poll_until(
        "a new browsing context to open",
        &ctx.timeouts().wait(),
        || {
            ctx.session
                .contexts()
                .map(|contexts| contexts.len() > 1)
                .unwrap_or(false)
        },
    )?;
    let target = ctx
        .session
        .contexts()?
        .into_iter()
        .find(|context| context != &original)
        .ok_or_else(|| VelarError::Context {
            message: "no context other than the original is open".into(),
        })?;
    ctx.session.switch_to(&target)?;

    // from here on the original context must be restored on every path
    let verified = verify_target_content(ctx, destination, criteria);

    let restored = restore_original(ctx, &original, locators);
    ctx.step(format!(
        "Closed target context {target}, back on original context"
    ));

    // a content failure outranks a cleanup failure
    verified.and(restored)
}

/// Content checks inside the target context. Never performs cleanup; the
/// caller guarantees that.
fn verify_target_content<S: Session>(
    ctx: &mut RunContext<S>,
    destination: &DestinationCheck,
    criteria: &FilterCriteria,
) -> VelarResult<()> {
    poll_until(
        &format!(
            "destination address to contain '{}'",
            destination.describe_markers()
        ),
        &ctx.timeouts().wait(),
        || {
            ctx.session
                .current_url()
                .map(|url| destination.url_matches(&url))
                .unwrap_or(false)
        },
    )?;
    let url = ctx.session.current_url()?;
    ctx.step(format!("Redirect verified: {url}"));

    let location_el = poll_for(
        "destination location field to render",
        &ctx.timeouts().wait(),
        || ctx.session.find(&destination.location_field).ok(),
    )?;
    let location = ctx.session.text(location_el)?;
    let category_el = ctx.session.find(&destination.category_field)?;
    let category = ctx.session.text(category_el)?;
    ctx.step(format!(
        "Destination page shows location '{location}', category '{category}'"
    ));

    if !criteria.location.matches(&location) {
        return Err(VelarError::AssertionMismatch {
            subject: "destination page location".into(),
            expected: criteria.location.describe(),
            actual: location,
        });
    }
    if !criteria.category.matches(&category) {
        return Err(VelarError::AssertionMismatch {
            subject: "destination page category".into(),
            expected: criteria.category.describe(),
            actual: category,
        });
    }
    Ok(())
}

/// Unconditional cleanup: close the target, re-activate the original
/// context, and wait for the listing container to be observable again —
/// the return transition can race a page reload.
fn restore_original<S: Session>(
    ctx: &mut RunContext<S>,
    original: &ContextId,
    locators: &ListingLocators,
) -> VelarResult<()> {
    let closed = ctx.session.close_active();
    let switched = ctx.session.switch_to(original);
    closed?;
    switched?;
    poll_until(
        "listing container to be observable after returning",
        &ctx.timeouts().wait(),
        || ctx.session.find(&locators.container).is_ok(),
    )?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::context::Timeouts;
    use crate::pages::jobs::JobsPage;
    use crate::sim::{SimJob, SimSession, SimSite};
    use crate::sync::wait_for_initial_load;

    fn qa_criteria() -> FilterCriteria {
        FilterCriteria::new("Istanbul, Turkiye", "Quality Assurance")
            .with_category_abbreviation("QA")
    }

    fn ready_context(jobs: Vec<SimJob>) -> RunContext<SimSession> {
        let site = SimSite::new().with_jobs(jobs);
        let listing_url = site.listing_url.clone();
        let mut session = SimSession::new(site);
        session.open(&listing_url).unwrap();
        let mut ctx = RunContext::new(session, Timeouts::fast());
        wait_for_initial_load(&mut ctx, &JobsPage::standard().listing).unwrap();
        ctx
    }

    #[test]
    fn test_matching_target_passes_and_restores() {
        let page = JobsPage::standard();
        let mut ctx = ready_context(vec![SimJob::new(
            "Senior QA Engineer",
            "Quality Assurance",
            "Istanbul, Turkiye",
        )]);
        let before = ctx.session.active_context().unwrap();
        verify_navigation_target(&mut ctx, &page.listing, &page.destination, &qa_criteria(), 0)
            .unwrap();
        assert_eq!(ctx.session.active_context().unwrap(), before);
        assert_eq!(ctx.session.contexts().unwrap().len(), 1);
    }

    #[test]
    fn test_mismatching_location_fails_but_still_restores() {
        let page = JobsPage::standard();
        let mut ctx = ready_context(vec![SimJob::new(
            "Senior QA Engineer",
            "Quality Assurance",
            "Istanbul, Turkiye",
        )
        .with_posting_location("Ankara, Turkiye")]);
        let before = ctx.session.active_context().unwrap();

        let err = verify_navigation_target(
            &mut ctx,
            &page.listing,
            &page.destination,
            &qa_criteria(),
            0,
        )
        .unwrap_err();
        match err {
            VelarError::AssertionMismatch { subject, actual, .. } => {
                assert!(subject.contains("location"));
                assert_eq!(actual, "Ankara, Turkiye");
            }
            other => panic!("expected AssertionMismatch, got {other:?}"),
        }

        // cleanup ran regardless of the failed assertion
        assert_eq!(ctx.session.active_context().unwrap(), before);
        assert_eq!(ctx.session.contexts().unwrap().len(), 1);
        assert!(ctx.session.find(&page.listing.container).is_ok());
    }

    #[test]
    fn test_url_matcher_accepts_any_marker() {
        let check = DestinationCheck {
            url_markers: vec!["lever".into(), "jobs.example".into()],
            location_field: Selector::css(".posting-category.location"),
            category_field: Selector::css(".posting-category.department"),
        };
        assert!(check.url_matches("https://jobs.lever.co/acme/123"));
        assert!(check.url_matches("https://jobs.example.com/456"));
        assert!(!check.url_matches("https://elsewhere.com/"));
    }
}
