//! Home page: structural smoke checks before the careers flow starts.

use crate::context::RunContext;
use crate::locator::Selector;
use crate::poll::poll_until;
use crate::result::{VelarError, VelarResult};
use crate::session::Session;

/// Content sections expected under the home page main area, as
/// `(class name, human-readable name)` pairs
pub const SECTION_CLASSES: &[(&str, &str)] = &[
    ("homepage-hero", "Hero"),
    ("homepage-social-proof", "Social Proof"),
    ("homepage-core-differentiators", "Core Differentiators"),
    ("homepage-capabilities", "Capabilities"),
    ("homepage-channels", "Channels"),
    ("homepage-case-study", "Case Study"),
    ("homepage-integrations", "Integrations"),
    ("homepage-resources", "Resources"),
    ("homepage-call-to-action", "Call To Action"),
];

/// The site's home page
#[derive(Debug, Clone)]
pub struct HomePage {
    url: String,
    brand: String,
    header: Selector,
    main: Selector,
    footer: Selector,
}

impl HomePage {
    /// Create a home page object for the given address. `brand` is the
    /// substring the document title must contain.
    #[must_use]
    pub fn new(url: impl Into<String>, brand: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            brand: brand.into(),
            header: Selector::id("navigation"),
            main: Selector::css("main.flexible-layout"),
            footer: Selector::id("footer"),
        }
    }

    /// Navigate to the home page
    pub fn open<S: Session>(&self, ctx: &mut RunContext<S>) -> VelarResult<()> {
        ctx.step(format!("Navigating to home page: {}", self.url));
        ctx.session.open(&self.url)
    }

    /// Verify the page actually opened (title check)
    pub fn verify_opened<S: Session>(&self, ctx: &mut RunContext<S>) -> VelarResult<()> {
        let result = poll_until(
            &format!("home page title to contain '{}'", self.brand),
            &ctx.timeouts().wait(),
            || {
                ctx.session
                    .title()
                    .map(|title| title.contains(&self.brand))
                    .unwrap_or(false)
            },
        );
        if result.is_err() {
            let actual = ctx.session.title().unwrap_or_default();
            return Err(VelarError::AssertionMismatch {
                subject: "home page title".into(),
                expected: format!("contains '{}'", self.brand),
                actual,
            });
        }
        ctx.step("Home page opened");
        Ok(())
    }

    /// Verify the structural blocks and every named content section are
    /// present, scrolling each section into view first
    pub fn verify_main_blocks<S: Session>(&self, ctx: &mut RunContext<S>) -> VelarResult<()> {
        self.require(ctx, &Selector::css("body"), "Body")?;
        self.require(ctx, &self.header, "Header (navigation)")?;
        self.require(ctx, &self.main, "Main content area")?;

        for (class, name) in SECTION_CLASSES {
            self.require(ctx, &Selector::class(*class), name)?;
        }
        self.require(ctx, &self.footer, "Footer")?;
        ctx.step("All home page blocks and sections are visible");
        Ok(())
    }

    fn require<S: Session>(
        &self,
        ctx: &mut RunContext<S>,
        selector: &Selector,
        name: &str,
    ) -> VelarResult<()> {
        let found = poll_until(
            &format!("{name} section to be visible"),
            &ctx.timeouts().wait(),
            || match ctx.session.find(selector) {
                Ok(element) => ctx.session.scroll_into_view(element).is_ok(),
                Err(_) => false,
            },
        );
        found.map_err(|_| VelarError::AssertionMismatch {
            subject: format!("{name} block"),
            expected: "visible".into(),
            actual: format!("not observable via {selector}"),
        })?;
        Ok(())
    }
}
