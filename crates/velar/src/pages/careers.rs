//! Careers landing page: the click-through into the job listing.

use crate::context::RunContext;
use crate::locator::Selector;
use crate::poll::poll_for;
use crate::result::VelarResult;
use crate::session::Session;

/// The careers landing page for the target department
#[derive(Debug, Clone)]
pub struct CareersPage {
    url: String,
    see_all_jobs: Selector,
}

impl CareersPage {
    /// Create a careers page object for the given address
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            see_all_jobs: Selector::link_text("See all QA jobs"),
        }
    }

    /// Navigate to the careers page
    pub fn open<S: Session>(&self, ctx: &mut RunContext<S>) -> VelarResult<()> {
        ctx.step(format!("Navigating to careers page: {}", self.url));
        ctx.session.open(&self.url)
    }

    /// Click through to the full job listing
    pub fn see_all_qa_jobs<S: Session>(&self, ctx: &mut RunContext<S>) -> VelarResult<()> {
        ctx.step("Clicking 'See all QA jobs'");
        let link = poll_for(
            "'See all QA jobs' link to be clickable",
            &ctx.timeouts().wait(),
            || ctx.session.find(&self.see_all_jobs).ok(),
        )?;
        ctx.session.click(link)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::context::Timeouts;
    use crate::sim::{SimJob, SimSession, SimSite};

    #[test]
    fn test_click_through_lands_on_listing() {
        let site = SimSite::new().with_jobs(vec![SimJob::new(
            "QA Engineer",
            "Quality Assurance",
            "Istanbul, Turkiye",
        )]);
        let careers_url = site.careers_url.clone();
        let listing_url = site.listing_url.clone();
        let page = CareersPage::new(careers_url);
        let mut ctx = RunContext::new(SimSession::new(site), Timeouts::fast());

        page.open(&mut ctx).unwrap();
        page.see_all_qa_jobs(&mut ctx).unwrap();
        assert_eq!(ctx.session.current_url().unwrap(), listing_url);
    }
}
