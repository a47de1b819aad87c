//! The standard careers verification suite.
//!
//! Three independent cases, each driving a fresh session through the flow:
//! home page structure, filtered-listing correctness, and per-item
//! navigation-target verification.

use crate::listing::FilterCriteria;
use crate::pages::{CareersPage, HomePage, JobsPage};
use crate::runner::TestCase;
use crate::session::Session;

/// Addresses and criteria the suite runs against
#[derive(Debug, Clone)]
pub struct SuiteTargets {
    /// Home page address
    pub home_url: String,
    /// Substring the home page title must contain
    pub brand: String,
    /// Careers landing page address
    pub careers_url: String,
    /// Filter criteria the listing must converge to
    pub criteria: FilterCriteria,
}

impl Default for SuiteTargets {
    fn default() -> Self {
        Self {
            home_url: "https://useinsider.com/".into(),
            brand: "Insider".into(),
            careers_url: "https://useinsider.com/careers/quality-assurance/".into(),
            criteria: FilterCriteria::new("Istanbul, Turkiye", "Quality Assurance")
                .with_category_abbreviation("QA"),
        }
    }
}

impl SuiteTargets {
    /// Targets for the public site defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Assemble the standard cases for the given targets
#[must_use]
pub fn careers_cases<S: Session>(targets: &SuiteTargets) -> Vec<TestCase<S>> {
    let home = HomePage::new(targets.home_url.clone(), targets.brand.clone());
    let careers_a = CareersPage::new(targets.careers_url.clone());
    let careers_b = careers_a.clone();
    let criteria_a = targets.criteria.clone();
    let criteria_b = targets.criteria.clone();

    vec![
        TestCase::new("home page opens with its main content blocks", move |ctx| {
            home.open(ctx)?;
            home.verify_opened(ctx)?;
            home.verify_main_blocks(ctx)
        }),
        TestCase::new(
            "careers listing filters to the target location and category",
            move |ctx| {
                let jobs = JobsPage::standard();
                careers_a.open(ctx)?;
                careers_a.see_all_qa_jobs(ctx)?;
                jobs.wait_for_initial_load(ctx)?;
                jobs.apply_filters(ctx, &criteria_a)?;
                jobs.verify_all_items_match(ctx, &criteria_a)
            },
        ),
        TestCase::new(
            "every listed position links to a matching application form",
            move |ctx| {
                let jobs = JobsPage::standard();
                careers_b.open(ctx)?;
                careers_b.see_all_qa_jobs(ctx)?;
                jobs.wait_for_initial_load(ctx)?;
                jobs.apply_filters(ctx, &criteria_b)?;
                jobs.verify_each_navigation_target(ctx, &criteria_b)
            },
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::context::Timeouts;
    use crate::report::TestStatus;
    use crate::runner::Runner;
    use crate::sim::{SimJob, SimSession, SimSite};

    fn sim_targets(site: &SimSite) -> SuiteTargets {
        SuiteTargets {
            home_url: site.home_url.clone(),
            brand: "Example".into(),
            careers_url: site.careers_url.clone(),
            criteria: FilterCriteria::new("Istanbul, Turkiye", "Quality Assurance")
                .with_category_abbreviation("QA"),
        }
    }

    fn matching_site() -> SimSite {
        SimSite::new().with_jobs(vec![
            SimJob::new("Senior QA Engineer", "Quality Assurance", "Istanbul, Turkiye"),
            SimJob::new("QA Automation Engineer", "Quality Assurance", "Istanbul, Turkiye"),
            SimJob::new("Backend Engineer", "Engineering", "Izmir, Turkiye"),
        ])
    }

    #[test]
    fn test_full_suite_passes_against_the_simulated_site() {
        let site = matching_site();
        let targets = sim_targets(&site);
        let mut runner = Runner::new("Careers Verification", move || {
            Ok(SimSession::new(site.clone()))
        })
        .with_timeouts(Timeouts::fast());

        let report = runner.run(careers_cases(&targets));
        assert_eq!(report.cases.len(), 3);
        assert!(
            report.all_passed(),
            "expected a clean run, got: {:?}",
            report
                .cases
                .iter()
                .map(|c| (c.name.clone(), c.error.clone()))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_destination_mismatch_fails_only_the_navigation_case() {
        let site = SimSite::new().with_jobs(vec![
            SimJob::new("Senior QA Engineer", "Quality Assurance", "Istanbul, Turkiye"),
            SimJob::new("QA Automation Engineer", "Quality Assurance", "Istanbul, Turkiye")
                .with_posting_location("Ankara, Turkiye"),
        ]);
        let targets = sim_targets(&site);
        let mut runner = Runner::new("Careers Verification", move || {
            Ok(SimSession::new(site.clone()))
        })
        .with_timeouts(Timeouts::fast());

        let report = runner.run(careers_cases(&targets));
        assert_eq!(report.cases[0].status, TestStatus::Pass);
        assert_eq!(report.cases[1].status, TestStatus::Pass);
        assert_eq!(report.cases[2].status, TestStatus::Fail);
        assert!(report.cases[2]
            .error
            .as_deref()
            .unwrap()
            .contains("Ankara, Turkiye"));
    }
}
