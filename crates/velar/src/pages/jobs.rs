//! Job-listing page: the synchronization and verification engine's home.
//!
//! The page object owns the locator tables and the destination shape;
//! the actual protocol lives in [`crate::sync`], [`crate::iterate`] and
//! [`crate::navigate`].

use crate::context::RunContext;
use crate::iterate::for_each_item;
use crate::listing::{read_item, FilterCriteria, ListingLocators, ListingSnapshot};
use crate::locator::Selector;
use crate::navigate::{verify_navigation_target, DestinationCheck};
use crate::poll::poll_until;
use crate::result::{VelarError, VelarResult};
use crate::retry::{retry_stale, RetryPolicy};
use crate::session::Session;
use crate::sync::{self, FilterControls};

/// The filterable job-listing page
#[derive(Debug, Clone)]
pub struct JobsPage {
    /// Filter select controls
    pub controls: FilterControls,
    /// Listing locator table
    pub listing: ListingLocators,
    /// Expected navigation-target shape
    pub destination: DestinationCheck,
}

impl Default for JobsPage {
    fn default() -> Self {
        Self::standard()
    }
}

impl JobsPage {
    /// The standard listing markup: filter selects by id, items by class,
    /// per-item fields by class, application pages hosted on Lever.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            controls: FilterControls {
                location: Selector::id("filter-by-location"),
                category: Selector::id("filter-by-department"),
            },
            listing: ListingLocators {
                container: Selector::id("jobs-list"),
                item: Selector::class("position-list-item"),
                title: Selector::class("position-title"),
                category: Selector::class("position-department"),
                location: Selector::class("position-location"),
                trigger: Selector::css("a.btn"),
            },
            destination: DestinationCheck {
                url_markers: vec!["lever".into(), "jobs.lever.co".into()],
                location_field: Selector::css(".posting-category.location"),
                category_field: Selector::css(".posting-category.department"),
            },
        }
    }

    /// Wait for the initial listing load (extended timeout; the upstream
    /// API can be slow)
    pub fn wait_for_initial_load<S: Session>(&self, ctx: &mut RunContext<S>) -> VelarResult<()> {
        sync::wait_for_initial_load(ctx, &self.listing)
    }

    /// Apply the filter criteria and return the stable, fully matching
    /// snapshot
    pub fn apply_filters<S: Session>(
        &self,
        ctx: &mut RunContext<S>,
        criteria: &FilterCriteria,
    ) -> VelarResult<ListingSnapshot> {
        sync::apply_filters(ctx, &self.controls, &self.listing, criteria)
    }

    /// Verify that every currently listed item matches the criteria.
    ///
    /// First holds for the whole collection to converge (late renders are
    /// not mismatches), then walks each position with fresh re-resolution
    /// and bounded retry, so the failure names a concrete item.
    pub fn verify_all_items_match<S: Session>(
        &self,
        ctx: &mut RunContext<S>,
        criteria: &FilterCriteria,
    ) -> VelarResult<()> {
        ctx.step("Verifying every listed item against the filter criteria");
        let converged = poll_until(
            "the whole listing to match the filter criteria",
            &ctx.timeouts().wait(),
            || {
                crate::listing::capture_snapshot(&ctx.session, &self.listing)
                    .map(|snapshot| snapshot.all_match(criteria))
                    .unwrap_or(false)
            },
        );
        if converged.is_err() {
            // diagnose: name the first offending item, or the emptiness
            let snapshot = crate::listing::capture_snapshot(&ctx.session, &self.listing)?;
            if snapshot.is_empty() {
                return Err(VelarError::AssertionMismatch {
                    subject: "filtered listing".into(),
                    expected: "at least one matching item".into(),
                    actual: "no items rendered".into(),
                });
            }
            if let Some(bad) = snapshot.first_mismatch(criteria) {
                let (subject, expected, actual) = if criteria.location.matches(&bad.location) {
                    (
                        format!("category of item #{} '{}'", bad.index + 1, bad.title),
                        criteria.category.describe(),
                        bad.category.clone(),
                    )
                } else {
                    (
                        format!("location of item #{} '{}'", bad.index + 1, bad.title),
                        criteria.location.describe(),
                        bad.location.clone(),
                    )
                };
                return Err(VelarError::AssertionMismatch {
                    subject,
                    expected,
                    actual,
                });
            }
        }

        let count = ctx.session.find_all(&self.listing.item)?.len();
        ctx.step(format!("Found {count} filtered item(s); checking each"));
        for index in 0..count {
            let posting = match retry_stale(RetryPolicy::STALE, |_| {
                read_item(&ctx.session, &self.listing, index)
            }) {
                Ok(attempted) => attempted.value,
                // shrank underneath us; the positions that remain were
                // already verified by the converged snapshot
                Err(VelarError::ElementNotFound { .. }) => break,
                Err(err) => return Err(err),
            };
            ctx.step(format!(
                "Item #{}: title='{}', category='{}', location='{}'",
                index + 1,
                posting.title,
                posting.category,
                posting.location
            ));
            if !criteria.category.matches(&posting.title)
                && !criteria.category.matches(&posting.category)
            {
                return Err(VelarError::AssertionMismatch {
                    subject: format!("category of item #{} '{}'", index + 1, posting.title),
                    expected: criteria.category.describe(),
                    actual: posting.category,
                });
            }
            if !criteria.location.matches(&posting.location) {
                return Err(VelarError::AssertionMismatch {
                    subject: format!("location of item #{} '{}'", index + 1, posting.title),
                    expected: criteria.location.describe(),
                    actual: posting.location,
                });
            }
        }
        ctx.step("All listed items match the filter criteria");
        Ok(())
    }

    /// For every listed item, verify its navigation target: a new context
    /// opens on the expected destination showing matching fields, and the
    /// original context is restored before the next step.
    pub fn verify_each_navigation_target<S: Session>(
        &self,
        ctx: &mut RunContext<S>,
        criteria: &FilterCriteria,
    ) -> VelarResult<()> {
        ctx.step("Verifying each item's navigation target");
        let outcome = for_each_item(
            ctx,
            &self.controls,
            &self.listing,
            criteria,
            |ctx, posting| {
                verify_navigation_target(
                    ctx,
                    &self.listing,
                    &self.destination,
                    criteria,
                    posting.index,
                )
            },
        )?;
        ctx.step(format!(
            "Verified navigation targets for {}/{} item(s)",
            outcome.visited, outcome.planned
        ));
        Ok(())
    }
}
