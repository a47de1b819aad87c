//! Position-driven iteration over a mutable listing.
//!
//! Direct references into a previous rendering become invalid after any
//! re-render, so iteration is driven by index: the live collection is
//! re-fetched at the start of every step and the item re-resolved fresh.
//! A shrinking collection ends iteration early (logged, not failed); a
//! transiently invalidated step is retried under [`RetryPolicy::STALE`];
//! a filter reset is answered by re-synchronizing and continuing at the
//! same index.

use crate::context::RunContext;
use crate::listing::{read_item, FilterCriteria, JobPosting, ListingLocators};
use crate::poll::poll_until;
use crate::result::VelarResult;
use crate::retry::{retry_stale, RetryPolicy};
use crate::session::Session;
use crate::sync::{apply_filters, FilterControls};

/// How an iteration pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationOutcome {
    /// Length recorded at the start of the pass
    pub planned: usize,
    /// Steps actually visited
    pub visited: usize,
    /// Whether the pass stopped early because the collection shrank
    pub truncated: bool,
}

/// Visit every item of the live collection by position.
///
/// `visit` receives a freshly read [`JobPosting`] on every attempt; it must
/// not cache element handles across calls. Transient invalidation raised by
/// the resolution or by `visit` itself is retried with fresh re-resolution
/// under [`RetryPolicy::STALE`] before escalating.
///
/// # Errors
///
/// Escalated transient failures, re-synchronization timeouts after a
/// detected filter reset, and whatever non-transient errors `visit`
/// raises. A shrink mid-pass is not an error.
pub fn for_each_item<S, F>(
    ctx: &mut RunContext<S>,
    controls: &FilterControls,
    locators: &ListingLocators,
    criteria: &FilterCriteria,
    mut visit: F,
) -> VelarResult<IterationOutcome>
where
    S: Session,
    F: FnMut(&mut RunContext<S>, &JobPosting) -> VelarResult<()>,
{
    poll_until("listing items to be present", &ctx.timeouts().wait(), || {
        ctx.session
            .find_all(&locators.item)
            .map(|items| !items.is_empty())
            .unwrap_or(false)
    })?;

    // length is recorded once; the live list is re-queried every step
    let planned = ctx.session.find_all(&locators.item)?.len();
    ctx.step(format!("Iterating {planned} listed item(s) by position"));

    let mut outcome = IterationOutcome {
        planned,
        visited: 0,
        truncated: false,
    };

    for index in 0..planned {
        let live = ctx.session.find_all(&locators.item)?.len();
        if index >= live {
            ctx.step(format!(
                "Listing shrank from {planned} to {live} during iteration; stopping early"
            ));
            outcome.truncated = true;
            break;
        }

        let posting = retry_stale(RetryPolicy::STALE, |_| {
            read_item(&ctx.session, locators, index)
        })?
        .value;

        // a resolved item outside the requested criteria means the filters
        // were reset underneath us; re-synchronize and continue in place
        if !criteria.location.matches(&posting.location) {
            ctx.step(format!(
                "Filter reset detected at position {index} (location '{}'); re-applying filters",
                posting.location
            ));
            apply_filters(ctx, controls, locators, criteria)?;
            let refreshed = ctx.session.find_all(&locators.item)?.len();
            if index >= refreshed {
                ctx.step(format!(
                    "Listing holds {refreshed} item(s) after re-filtering; stopping early"
                ));
                outcome.truncated = true;
                break;
            }
        }

        retry_stale(RetryPolicy::STALE, |attempt| {
            if attempt > 1 {
                ctx.step(format!(
                    "Re-resolving position {index} after invalidation (attempt {attempt})"
                ));
            }
            let fresh = read_item(&ctx.session, locators, index)?;
            visit(ctx, &fresh)
        })?;
        outcome.visited += 1;
    }

    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::context::Timeouts;
    use crate::pages::jobs::JobsPage;
    use crate::result::VelarError;
    use crate::sim::{SimJob, SimSession, SimSite};
    use crate::sync::wait_for_initial_load;

    fn qa_criteria() -> FilterCriteria {
        FilterCriteria::new("Istanbul, Turkiye", "Quality Assurance")
            .with_category_abbreviation("QA")
    }

    fn five_matching_jobs() -> Vec<SimJob> {
        (1..=5)
            .map(|n| {
                SimJob::new(
                    format!("QA Engineer {n}"),
                    "Quality Assurance",
                    "Istanbul, Turkiye",
                )
            })
            .collect()
    }

    fn ready_context(site: SimSite) -> RunContext<SimSession> {
        let listing_url = site.listing_url.clone();
        let mut session = SimSession::new(site);
        session.open(&listing_url).unwrap();
        let mut ctx = RunContext::new(session, Timeouts::fast());
        let page = JobsPage::standard();
        wait_for_initial_load(&mut ctx, &page.listing).unwrap();
        ctx
    }

    #[test]
    fn test_visits_every_item_in_order() {
        let page = JobsPage::standard();
        let mut ctx = ready_context(SimSite::new().with_jobs(five_matching_jobs()));
        let mut seen = Vec::new();
        let outcome = for_each_item(
            &mut ctx,
            &page.controls,
            &page.listing,
            &qa_criteria(),
            |_, posting| {
                seen.push(posting.title.clone());
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(outcome.planned, 5);
        assert_eq!(outcome.visited, 5);
        assert!(!outcome.truncated);
        assert_eq!(seen[0], "QA Engineer 1");
        assert_eq!(seen[4], "QA Engineer 5");
    }

    #[test]
    fn test_shrink_mid_pass_truncates_gracefully() {
        let page = JobsPage::standard();
        let mut ctx = ready_context(SimSite::new().with_jobs(five_matching_jobs()));
        let outcome = for_each_item(
            &mut ctx,
            &page.controls,
            &page.listing,
            &qa_criteria(),
            |ctx, posting| {
                if posting.index == 1 {
                    // an unrelated re-render drops the tail of the list
                    ctx.session.truncate_now(2);
                }
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(outcome.planned, 5);
        assert_eq!(outcome.visited, 2);
        assert!(outcome.truncated);
    }

    #[test]
    fn test_single_invalidation_is_retried_and_survives() {
        let page = JobsPage::standard();
        let ctx_site = SimSite::new().with_jobs(five_matching_jobs());
        let mut ctx = ready_context(ctx_site);
        // step 3 of 5: the resolved reference goes stale once
        ctx.session.poison_item_once(2);

        let mut visited = 0;
        let outcome = for_each_item(
            &mut ctx,
            &page.controls,
            &page.listing,
            &qa_criteria(),
            |_, _| {
                visited += 1;
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(outcome.visited, 5);
        assert_eq!(visited, 5, "no step was skipped or double-counted");
    }

    #[test]
    fn test_persistent_invalidation_escalates_after_retry_budget() {
        let page = JobsPage::standard();
        let mut ctx = ready_context(SimSite::new().with_jobs(five_matching_jobs()));

        let mut failures = 0;
        let result = for_each_item(
            &mut ctx,
            &page.controls,
            &page.listing,
            &qa_criteria(),
            |_, posting| {
                if posting.index == 1 {
                    failures += 1;
                    Err(VelarError::stale("listing item 1"))
                } else {
                    Ok(())
                }
            },
        );
        assert!(matches!(result, Err(VelarError::StaleReference { .. })));
        assert_eq!(
            failures,
            RetryPolicy::STALE.max_attempts(),
            "the fourth consecutive failure is reported, not swallowed"
        );
    }

    #[test]
    fn test_non_transient_visit_error_propagates_immediately() {
        let page = JobsPage::standard();
        let mut ctx = ready_context(SimSite::new().with_jobs(five_matching_jobs()));
        let mut calls = 0;
        let result = for_each_item(
            &mut ctx,
            &page.controls,
            &page.listing,
            &qa_criteria(),
            |_, _| {
                calls += 1;
                Err(VelarError::AssertionMismatch {
                    subject: "category".into(),
                    expected: "Quality Assurance".into(),
                    actual: "Engineering".into(),
                })
            },
        );
        assert!(matches!(result, Err(VelarError::AssertionMismatch { .. })));
        assert_eq!(calls, 1);
    }
}
