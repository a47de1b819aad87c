//! Simulated careers site.
//!
//! An in-memory [`Session`] backend modeling the behaviors the engine is
//! built to survive: late-populated filter options, asynchronous re-renders
//! that invalidate old element references, navigation targets opening in
//! new contexts, filter resets and list shrinkage mid-iteration.
//!
//! Time is modeled in *ticks*: every observation or action advances the
//! clock by one, and pending transitions (option population, re-render,
//! posting render) complete when their tick deadline is reached. Polling at
//! any real-time cadence therefore resolves within a handful of predicate
//! evaluations, keeping the test suite fast and deterministic.

use crate::locator::Selector;
use crate::result::{VelarError, VelarResult};
use crate::session::{ContextId, ElementId, Session};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};

/// One job in the simulated listing
#[derive(Debug, Clone)]
pub struct SimJob {
    /// Position title
    pub title: String,
    /// Department text shown in the listing
    pub category: String,
    /// Location text shown in the listing
    pub location: String,
    /// Location shown on the application (posting) page
    pub posting_location: String,
    /// Department shown on the application (posting) page
    pub posting_category: String,
}

impl SimJob {
    /// Create a job whose posting page mirrors its listing fields
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        let category = category.into();
        let location = location.into();
        Self {
            title: title.into(),
            posting_category: category.clone(),
            posting_location: location.clone(),
            category,
            location,
        }
    }

    /// Override the posting-page location (mismatch injection)
    #[must_use]
    pub fn with_posting_location(mut self, location: impl Into<String>) -> Self {
        self.posting_location = location.into();
        self
    }

    /// Override the posting-page department (mismatch injection)
    #[must_use]
    pub fn with_posting_category(mut self, category: impl Into<String>) -> Self {
        self.posting_category = category.into();
        self
    }
}

/// Tick deadlines for the site's asynchronous transitions
#[derive(Debug, Clone, Copy)]
pub struct SimLatency {
    /// Ticks after the listing opens until filter options are populated
    pub options_ready: u64,
    /// Ticks after the listing opens until the initial items render
    pub initial_render: u64,
    /// Ticks after a filter change until the old rendering is torn down
    pub refresh_stale: u64,
    /// Ticks after teardown until the new rendering is observable
    pub refresh_render: u64,
    /// Ticks after a posting context opens until its fields render
    pub posting_render: u64,
}

impl Default for SimLatency {
    fn default() -> Self {
        Self {
            options_ready: 4,
            initial_render: 6,
            refresh_stale: 3,
            refresh_render: 4,
            posting_render: 3,
        }
    }
}

/// Static description of the simulated site
#[derive(Debug, Clone)]
pub struct SimSite {
    /// Home page address
    pub home_url: String,
    /// Careers landing page address
    pub careers_url: String,
    /// Listing page address
    pub listing_url: String,
    /// Prefix of posting-page addresses
    pub posting_url_base: String,
    /// Home page document title
    pub home_title: String,
    /// Class names of the home page content sections
    pub home_sections: Vec<String>,
    /// The full job inventory
    pub jobs: Vec<SimJob>,
    /// Transition deadlines
    pub latency: SimLatency,
    /// Whether selecting filters that yield an identical list still tears
    /// the rendering down. `false` models the no-visible-change case.
    pub rerender_on_identical: bool,
}

impl Default for SimSite {
    fn default() -> Self {
        Self::new()
    }
}

impl SimSite {
    /// Site skeleton with no jobs
    #[must_use]
    pub fn new() -> Self {
        Self {
            home_url: "https://sim.example.com/".into(),
            careers_url: "https://sim.example.com/careers/quality-assurance/".into(),
            listing_url: "https://sim.example.com/careers/open-positions/".into(),
            posting_url_base: "https://jobs.lever.co/sim/".into(),
            home_title: "Example Growth Platform".into(),
            home_sections: crate::pages::home::SECTION_CLASSES
                .iter()
                .map(|(class, _)| (*class).to_string())
                .collect(),
            jobs: Vec::new(),
            latency: SimLatency::default(),
            rerender_on_identical: true,
        }
    }

    /// Set the job inventory
    #[must_use]
    pub fn with_jobs(mut self, jobs: Vec<SimJob>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Set transition deadlines
    #[must_use]
    pub const fn with_latency(mut self, latency: SimLatency) -> Self {
        self.latency = latency;
        self
    }

    /// Model a site that does not re-render when the filtered list is
    /// identical to the current one
    #[must_use]
    pub const fn without_identical_rerender(mut self) -> Self {
        self.rerender_on_identical = false;
        self
    }
}

/// What a context is currently showing
#[derive(Debug, Clone, PartialEq, Eq)]
enum SimPage {
    Blank,
    Home,
    Careers,
    Listing,
    Posting { job: usize },
}

#[derive(Debug)]
struct SimContext {
    id: ContextId,
    page: SimPage,
    url: String,
    opened_at: u64,
    open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RenderPhase {
    /// Items not yet observable; render completes at `ready_at`
    Loading { ready_at: u64, next: Vec<usize> },
    Stable,
    /// Old rendering still live until `stale_at`, then loading begins
    Refreshing {
        stale_at: u64,
        ready_at: u64,
        next: Vec<usize>,
    },
}

#[derive(Debug)]
struct ListingState {
    opened_at: u64,
    generation: u64,
    visible: Vec<usize>,
    phase: RenderPhase,
    selected_location: Option<String>,
    selected_category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Category,
    Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SimNode {
    Body,
    HomeSection(String),
    SeeAllLink,
    ListContainer,
    LocationSelect,
    CategorySelect,
    Item { position: usize },
    ItemField { position: usize, field: Field },
    Trigger { position: usize },
    PostingField(Field),
}

#[derive(Debug)]
struct SimElement {
    context: ContextId,
    generation: u64,
    node: SimNode,
}

#[derive(Debug)]
struct SimInner {
    site: SimSite,
    now: u64,
    contexts: Vec<SimContext>,
    active: usize,
    next_context: u64,
    listing: Option<ListingState>,
    elements: HashMap<u64, SimElement>,
    next_element: u64,
    quit: bool,
    // fault injection
    one_shot_stale: HashSet<usize>,
    reset_filters_after_returns: Option<u64>,
    shrink_after_returns: Option<(u64, usize)>,
    returns_seen: u64,
}

/// In-memory session over a [`SimSite`]
#[derive(Debug)]
pub struct SimSession {
    inner: RefCell<SimInner>,
}

impl SimSession {
    /// Start a session on a blank context
    #[must_use]
    pub fn new(site: SimSite) -> Self {
        let original = SimContext {
            id: ContextId::new("sim-ctx-0"),
            page: SimPage::Blank,
            url: "about:blank".into(),
            opened_at: 0,
            open: true,
        };
        Self {
            inner: RefCell::new(SimInner {
                site,
                now: 0,
                contexts: vec![original],
                active: 0,
                next_context: 1,
                listing: None,
                elements: HashMap::new(),
                next_element: 1,
                quit: false,
                one_shot_stale: HashSet::new(),
                reset_filters_after_returns: None,
                shrink_after_returns: None,
                returns_seen: 0,
            }),
        }
    }

    /// Invalidate the next field read of the item at `position` once.
    /// Models an unrelated re-render racing a step.
    pub fn poison_item_once(&self, position: usize) {
        self.inner.borrow_mut().one_shot_stale.insert(position);
    }

    /// After `returns` posting contexts have been closed, silently clear
    /// the applied filters (the full inventory becomes visible again)
    pub fn reset_filters_after_returns(&self, returns: u64) {
        self.inner.borrow_mut().reset_filters_after_returns = Some(returns);
    }

    /// After `returns` posting contexts have been closed, truncate the
    /// visible list to `len` items
    pub fn shrink_after_returns(&self, returns: u64, len: usize) {
        self.inner.borrow_mut().shrink_after_returns = Some((returns, len));
    }

    /// Immediately truncate the visible list to `len` items, tearing down
    /// the current rendering
    pub fn truncate_now(&self, len: usize) {
        let mut inner = self.inner.borrow_mut();
        if let Some(listing) = inner.listing.as_mut() {
            listing.visible.truncate(len);
            listing.generation += 1;
            listing.phase = RenderPhase::Stable;
        }
    }

    /// Current tick, for latency assertions in tests
    #[must_use]
    pub fn now(&self) -> u64 {
        self.inner.borrow().now
    }
}

impl SimInner {
    fn tick(&mut self) {
        self.now += 1;
        if let Some(listing) = self.listing.as_mut() {
            match listing.phase.clone() {
                RenderPhase::Loading { ready_at, next } => {
                    if self.now >= ready_at {
                        listing.visible = next;
                        listing.generation += 1;
                        listing.phase = RenderPhase::Stable;
                    }
                }
                RenderPhase::Refreshing {
                    stale_at,
                    ready_at,
                    next,
                } => {
                    if self.now >= stale_at {
                        listing.visible.clear();
                        listing.generation += 1;
                        listing.phase = RenderPhase::Loading { ready_at, next };
                        // the Loading deadline may already have passed
                        self.now -= 1;
                        self.tick();
                    }
                }
                RenderPhase::Stable => {}
            }
        }
    }

    fn active(&self) -> VelarResult<&SimContext> {
        if self.quit {
            return Err(VelarError::session("session has been quit"));
        }
        let ctx = &self.contexts[self.active];
        if !ctx.open {
            return Err(VelarError::Context {
                message: format!("active context {} is closed", ctx.id),
            });
        }
        Ok(ctx)
    }

    fn options_ready(&self, listing: &ListingState) -> bool {
        self.now >= listing.opened_at + self.site.latency.options_ready
    }

    fn register(&mut self, context: ContextId, generation: u64, node: SimNode) -> ElementId {
        let id = self.next_element;
        self.next_element += 1;
        self.elements.insert(
            id,
            SimElement {
                context,
                generation,
                node,
            },
        );
        ElementId::new(id)
    }

    fn element(&self, id: ElementId) -> VelarResult<&SimElement> {
        self.elements
            .get(&id.raw())
            .ok_or_else(|| VelarError::stale(format!("{id} was never resolved")))
    }

    /// Validity rules: the element's context must be the open, active one;
    /// listing-derived nodes must additionally belong to the current
    /// rendering generation and still be inside the visible range.
    fn check_live(&self, id: ElementId) -> VelarResult<&SimElement> {
        let element = self.element(id)?;
        let active = self.active()?;
        if element.context != active.id {
            return Err(VelarError::stale(format!(
                "{id} belongs to context {}",
                element.context
            )));
        }
        match &element.node {
            SimNode::Item { position }
            | SimNode::ItemField { position, .. }
            | SimNode::Trigger { position } => {
                let listing = self
                    .listing
                    .as_ref()
                    .ok_or_else(|| VelarError::stale(format!("{id}: listing was torn down")))?;
                if element.generation != listing.generation || *position >= listing.visible.len() {
                    return Err(VelarError::stale(format!("listing item {position}")));
                }
            }
            _ => {}
        }
        Ok(element)
    }

    fn visible_items(&self) -> &[usize] {
        self.listing.as_ref().map_or(&[], |l| match l.phase {
            RenderPhase::Loading { .. } => &[],
            _ => l.visible.as_slice(),
        })
    }

    /// Resolve a selector against the active context's rendering
    fn resolve(&mut self, selector: &Selector) -> VelarResult<Vec<ElementId>> {
        let active = self.active()?;
        let ctx_id = active.id.clone();
        let page = active.page.clone();
        let generation = self.listing.as_ref().map_or(0, |l| l.generation);

        let nodes: Vec<SimNode> = match (&page, selector) {
            (_, Selector::Css(css)) if css == "body" => vec![SimNode::Body],
            (SimPage::Home, Selector::ClassName(class))
                if self.site.home_sections.contains(class) =>
            {
                vec![SimNode::HomeSection(class.clone())]
            }
            (SimPage::Home, Selector::Id(id)) if id == "navigation" || id == "footer" => {
                vec![SimNode::Body]
            }
            (SimPage::Home, Selector::Css(css)) if css.starts_with("main") => {
                vec![SimNode::Body]
            }
            (SimPage::Careers, Selector::LinkText(text)) if text == "See all QA jobs" => {
                vec![SimNode::SeeAllLink]
            }
            (SimPage::Listing, Selector::Id(id)) if id == "filter-by-location" => {
                vec![SimNode::LocationSelect]
            }
            (SimPage::Listing, Selector::Id(id)) if id == "filter-by-department" => {
                vec![SimNode::CategorySelect]
            }
            (SimPage::Listing, Selector::Id(id)) if id == "jobs-list" => {
                vec![SimNode::ListContainer]
            }
            (SimPage::Listing, Selector::ClassName(class)) if class == "position-list-item" => {
                (0..self.visible_items().len())
                    .map(|position| SimNode::Item { position })
                    .collect()
            }
            (SimPage::Posting { .. }, Selector::Css(css)) => {
                let rendered = self.now >= active.opened_at + self.site.latency.posting_render;
                match css.as_str() {
                    ".posting-category.location" if rendered => {
                        vec![SimNode::PostingField(Field::Location)]
                    }
                    ".posting-category.department" if rendered => {
                        vec![SimNode::PostingField(Field::Category)]
                    }
                    _ => vec![],
                }
            }
            _ => vec![],
        };

        Ok(nodes
            .into_iter()
            .map(|node| self.register(ctx_id.clone(), generation, node))
            .collect())
    }

    fn job_field(&self, job: usize, field: Field, posting: bool) -> String {
        let job = &self.site.jobs[job];
        match (field, posting) {
            (Field::Title, _) => job.title.clone(),
            (Field::Category, false) => job.category.clone(),
            (Field::Location, false) => job.location.clone(),
            (Field::Category, true) => job.posting_category.clone(),
            (Field::Location, true) => job.posting_location.clone(),
        }
    }

    fn schedule_refresh(&mut self) {
        let Some(listing) = self.listing.as_ref() else {
            return;
        };
        let location = listing.selected_location.clone();
        let category = listing.selected_category.clone();
        let next: Vec<usize> = self
            .site
            .jobs
            .iter()
            .enumerate()
            .filter(|(_, job)| {
                location.as_deref().map_or(true, |v| job.location == v)
                    && category.as_deref().map_or(true, |v| job.category == v)
            })
            .map(|(i, _)| i)
            .collect();

        let now = self.now;
        let latency = self.site.latency;
        let rerender_on_identical = self.site.rerender_on_identical;
        let Some(listing) = self.listing.as_mut() else {
            return;
        };
        if !rerender_on_identical
            && listing.phase == RenderPhase::Stable
            && listing.visible == next
        {
            return;
        }
        match &mut listing.phase {
            RenderPhase::Refreshing {
                stale_at: _,
                ready_at,
                next: pending,
            } => {
                *pending = next;
                *ready_at = now + latency.refresh_stale + latency.refresh_render;
            }
            _ => {
                let stale_at = now + latency.refresh_stale;
                listing.phase = RenderPhase::Refreshing {
                    stale_at,
                    ready_at: stale_at + latency.refresh_render,
                    next,
                };
            }
        }
    }

    fn on_posting_return(&mut self) {
        self.returns_seen += 1;
        if self.reset_filters_after_returns == Some(self.returns_seen) {
            let all: Vec<usize> = (0..self.site.jobs.len()).collect();
            if let Some(listing) = self.listing.as_mut() {
                listing.selected_location = None;
                listing.selected_category = None;
                listing.visible = all;
                listing.generation += 1;
                listing.phase = RenderPhase::Stable;
            }
        }
        if let Some((returns, len)) = self.shrink_after_returns {
            if returns == self.returns_seen {
                if let Some(listing) = self.listing.as_mut() {
                    listing.visible.truncate(len);
                    listing.generation += 1;
                    listing.phase = RenderPhase::Stable;
                }
            }
        }
    }

    fn open_listing(&mut self) {
        self.listing = Some(ListingState {
            opened_at: self.now,
            generation: 0,
            visible: Vec::new(),
            phase: RenderPhase::Loading {
                ready_at: self.now + self.site.latency.initial_render,
                next: (0..self.site.jobs.len()).collect(),
            },
            selected_location: None,
            selected_category: None,
        });
    }
}

impl Session for SimSession {
    fn open(&mut self, url: &str) -> VelarResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.tick();
        inner.active()?;
        let page = if url == inner.site.home_url {
            SimPage::Home
        } else if url == inner.site.careers_url {
            SimPage::Careers
        } else if url.starts_with(&inner.site.listing_url) {
            SimPage::Listing
        } else {
            return Err(VelarError::Navigation {
                url: url.to_string(),
                message: "address is not part of the simulated site".into(),
            });
        };
        if page == SimPage::Listing {
            inner.open_listing();
        }
        let active = inner.active;
        let now = inner.now;
        let ctx = &mut inner.contexts[active];
        ctx.page = page;
        ctx.url = url.to_string();
        ctx.opened_at = now;
        Ok(())
    }

    fn current_url(&self) -> VelarResult<String> {
        let mut inner = self.inner.borrow_mut();
        inner.tick();
        Ok(inner.active()?.url.clone())
    }

    fn title(&self) -> VelarResult<String> {
        let mut inner = self.inner.borrow_mut();
        inner.tick();
        let title = match inner.active()?.page {
            SimPage::Home => inner.site.home_title.clone(),
            SimPage::Careers => "Careers".into(),
            SimPage::Listing => "Open Positions".into(),
            SimPage::Posting { job } => inner.site.jobs[job].title.clone(),
            SimPage::Blank => String::new(),
        };
        Ok(title)
    }

    fn contexts(&self) -> VelarResult<Vec<ContextId>> {
        let mut inner = self.inner.borrow_mut();
        inner.tick();
        if inner.quit {
            return Err(VelarError::session("session has been quit"));
        }
        Ok(inner
            .contexts
            .iter()
            .filter(|c| c.open)
            .map(|c| c.id.clone())
            .collect())
    }

    fn active_context(&self) -> VelarResult<ContextId> {
        let inner = self.inner.borrow();
        if inner.quit {
            return Err(VelarError::session("session has been quit"));
        }
        Ok(inner.contexts[inner.active].id.clone())
    }

    fn switch_to(&mut self, context: &ContextId) -> VelarResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.tick();
        let position = inner
            .contexts
            .iter()
            .position(|c| c.open && &c.id == context)
            .ok_or_else(|| VelarError::Context {
                message: format!("no open context {context}"),
            })?;
        inner.active = position;
        Ok(())
    }

    fn close_active(&mut self) -> VelarResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.tick();
        let active = inner.active;
        if inner.quit || !inner.contexts[active].open {
            return Err(VelarError::Context {
                message: "no open active context to close".into(),
            });
        }
        let was_posting = matches!(inner.contexts[active].page, SimPage::Posting { .. });
        inner.contexts[active].open = false;
        if was_posting {
            inner.on_posting_return();
        }
        Ok(())
    }

    fn find(&self, selector: &Selector) -> VelarResult<ElementId> {
        let mut inner = self.inner.borrow_mut();
        inner.tick();
        inner
            .resolve(selector)?
            .into_iter()
            .next()
            .ok_or_else(|| VelarError::ElementNotFound {
                locator: selector.to_string(),
            })
    }

    fn find_all(&self, selector: &Selector) -> VelarResult<Vec<ElementId>> {
        let mut inner = self.inner.borrow_mut();
        inner.tick();
        inner.resolve(selector)
    }

    fn find_child(&self, parent: ElementId, selector: &Selector) -> VelarResult<ElementId> {
        let mut inner = self.inner.borrow_mut();
        inner.tick();
        let (context, generation, position) = {
            let element = inner.check_live(parent)?;
            let SimNode::Item { position } = element.node else {
                return Err(VelarError::ElementNotFound {
                    locator: format!("{selector} under non-item {parent}"),
                });
            };
            (element.context.clone(), element.generation, position)
        };
        let node = match selector {
            Selector::ClassName(class) if class == "position-title" => SimNode::ItemField {
                position,
                field: Field::Title,
            },
            Selector::ClassName(class) if class == "position-department" => SimNode::ItemField {
                position,
                field: Field::Category,
            },
            Selector::ClassName(class) if class == "position-location" => SimNode::ItemField {
                position,
                field: Field::Location,
            },
            Selector::Css(css) if css == "a.btn" => SimNode::Trigger { position },
            other => {
                return Err(VelarError::ElementNotFound {
                    locator: other.to_string(),
                })
            }
        };
        Ok(inner.register(context, generation, node))
    }

    fn text(&self, element: ElementId) -> VelarResult<String> {
        let mut inner = self.inner.borrow_mut();
        inner.tick();
        let node = inner.check_live(element)?.node.clone();
        match node {
            SimNode::ItemField { position, field } => {
                if inner.one_shot_stale.remove(&position) {
                    return Err(VelarError::stale(format!("listing item {position}")));
                }
                let job = inner.listing.as_ref().map(|l| l.visible[position]);
                let job = job.ok_or_else(|| VelarError::stale("listing was torn down"))?;
                Ok(inner.job_field(job, field, false))
            }
            SimNode::PostingField(field) => {
                let SimPage::Posting { job } = inner.active()?.page else {
                    return Err(VelarError::stale("posting field outside posting page"));
                };
                Ok(inner.job_field(job, field, true))
            }
            SimNode::SeeAllLink => Ok("See all QA jobs".into()),
            _ => Ok(String::new()),
        }
    }

    fn click(&mut self, element: ElementId) -> VelarResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.tick();
        let node = inner.check_live(element)?.node.clone();
        match node {
            SimNode::SeeAllLink => {
                let listing_url = inner.site.listing_url.clone();
                let active = inner.active;
                let now = inner.now;
                inner.contexts[active].page = SimPage::Listing;
                inner.contexts[active].url = listing_url;
                inner.contexts[active].opened_at = now;
                inner.open_listing();
                Ok(())
            }
            SimNode::Trigger { position } => {
                let job = inner.listing.as_ref().map(|l| l.visible[position]);
                let job = job.ok_or_else(|| VelarError::stale("listing was torn down"))?;
                let id = ContextId::new(format!("sim-ctx-{}", inner.next_context));
                inner.next_context += 1;
                let url = format!("{}{}", inner.site.posting_url_base, job + 1);
                let opened_at = inner.now;
                inner.contexts.push(SimContext {
                    id,
                    page: SimPage::Posting { job },
                    url,
                    opened_at,
                    open: true,
                });
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn select_by_label(&mut self, element: ElementId, label: &str) -> VelarResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.tick();
        let node = inner.check_live(element)?.node.clone();
        let labels = match node {
            SimNode::LocationSelect | SimNode::CategorySelect => {
                let listing = inner
                    .listing
                    .as_ref()
                    .ok_or_else(|| VelarError::session("no listing rendered"))?;
                if !inner.options_ready(listing) {
                    return Err(VelarError::session(format!(
                        "option '{label}' is not present yet"
                    )));
                }
                match node {
                    SimNode::LocationSelect => inner
                        .site
                        .jobs
                        .iter()
                        .map(|j| j.location.clone())
                        .collect::<BTreeSet<_>>(),
                    _ => inner
                        .site
                        .jobs
                        .iter()
                        .map(|j| j.category.clone())
                        .collect::<BTreeSet<_>>(),
                }
            }
            _ => {
                return Err(VelarError::session(format!(
                    "{element} is not a select control"
                )))
            }
        };
        if label != "All" && !labels.contains(label) {
            return Err(VelarError::session(format!(
                "no option with visible label '{label}'"
            )));
        }
        let selection = (label != "All").then(|| label.to_string());
        if let Some(listing) = inner.listing.as_mut() {
            match node {
                SimNode::LocationSelect => listing.selected_location = selection,
                _ => listing.selected_category = selection,
            }
        }
        inner.schedule_refresh();
        Ok(())
    }

    fn option_labels(&self, element: ElementId) -> VelarResult<Vec<String>> {
        let mut inner = self.inner.borrow_mut();
        inner.tick();
        let node = inner.check_live(element)?.node.clone();
        let listing = inner
            .listing
            .as_ref()
            .ok_or_else(|| VelarError::session("no listing rendered"))?;
        if !inner.options_ready(listing) {
            return Ok(vec!["All".into()]);
        }
        let values: BTreeSet<String> = match node {
            SimNode::LocationSelect => inner.site.jobs.iter().map(|j| j.location.clone()).collect(),
            SimNode::CategorySelect => inner.site.jobs.iter().map(|j| j.category.clone()).collect(),
            _ => {
                return Err(VelarError::session(format!(
                    "{element} is not a select control"
                )))
            }
        };
        let mut labels = vec!["All".to_string()];
        labels.extend(values);
        Ok(labels)
    }

    fn scroll_into_view(&self, element: ElementId) -> VelarResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.tick();
        inner.check_live(element)?;
        Ok(())
    }

    fn is_attached(&self, element: ElementId) -> bool {
        let mut inner = self.inner.borrow_mut();
        inner.tick();
        inner.check_live(element).is_ok()
    }

    fn quit(&mut self) -> VelarResult<()> {
        let mut inner = self.inner.borrow_mut();
        for ctx in &mut inner.contexts {
            ctx.open = false;
        }
        inner.quit = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn qa_jobs() -> Vec<SimJob> {
        vec![
            SimJob::new("Senior QA Engineer", "Quality Assurance", "Istanbul, Turkiye"),
            SimJob::new("QA Automation Engineer", "Quality Assurance", "Istanbul, Turkiye"),
            SimJob::new("Backend Engineer", "Engineering", "Izmir, Turkiye"),
        ]
    }

    fn listing_session() -> SimSession {
        let mut session = SimSession::new(SimSite::new().with_jobs(qa_jobs()));
        let url = session.inner.borrow().site.listing_url.clone();
        session.open(&url).unwrap();
        session
    }

    fn settle(session: &SimSession, ticks: u64) {
        for _ in 0..ticks {
            let _ = session.contexts();
        }
    }

    #[test]
    fn test_items_render_after_initial_latency() {
        let session = listing_session();
        let item = Selector::class("position-list-item");
        assert!(session.find_all(&item).unwrap().is_empty());
        settle(&session, 10);
        assert_eq!(session.find_all(&item).unwrap().len(), 3);
    }

    #[test]
    fn test_options_populate_late() {
        let session = listing_session();
        let select = session.find(&Selector::id("filter-by-location")).unwrap();
        assert_eq!(session.option_labels(select).unwrap(), vec!["All"]);
        settle(&session, 10);
        let labels = session.option_labels(select).unwrap();
        assert!(labels.contains(&"Istanbul, Turkiye".to_string()));
        assert!(labels.contains(&"Izmir, Turkiye".to_string()));
    }

    #[test]
    fn test_filter_change_invalidates_old_items_then_renders_new() {
        let mut session = listing_session();
        settle(&session, 10);
        let item = Selector::class("position-list-item");
        let old = session.find_all(&item).unwrap();
        assert_eq!(old.len(), 3);

        let select = session.find(&Selector::id("filter-by-location")).unwrap();
        session.select_by_label(select, "Istanbul, Turkiye").unwrap();

        // old references go stale once the teardown deadline passes
        settle(&session, 5);
        assert!(!session.is_attached(old[0]));

        settle(&session, 10);
        let fresh = session.find_all(&item).unwrap();
        assert_eq!(fresh.len(), 2);
        let title = session.find_child(fresh[0], &Selector::class("position-title")).unwrap();
        assert_eq!(session.text(title).unwrap(), "Senior QA Engineer");
    }

    #[test]
    fn test_identical_filter_without_rerender_keeps_references_live() {
        let site = SimSite::new()
            .with_jobs(vec![SimJob::new("QA Engineer", "Quality Assurance", "Istanbul, Turkiye")])
            .without_identical_rerender();
        let mut session = SimSession::new(site);
        let url = session.inner.borrow().site.listing_url.clone();
        session.open(&url).unwrap();
        settle(&session, 10);
        let item = Selector::class("position-list-item");
        let old = session.find_all(&item).unwrap();

        let select = session.find(&Selector::id("filter-by-location")).unwrap();
        session.select_by_label(select, "Istanbul, Turkiye").unwrap();
        settle(&session, 15);
        assert!(session.is_attached(old[0]), "identical list never re-rendered");
    }

    #[test]
    fn test_trigger_opens_posting_context_without_switching() {
        let mut session = listing_session();
        settle(&session, 10);
        let original = session.active_context().unwrap();
        let items = session.find_all(&Selector::class("position-list-item")).unwrap();
        let trigger = session.find_child(items[0], &Selector::css("a.btn")).unwrap();
        session.click(trigger).unwrap();

        assert_eq!(session.contexts().unwrap().len(), 2);
        assert_eq!(session.active_context().unwrap(), original);

        let target = session
            .contexts()
            .unwrap()
            .into_iter()
            .find(|c| c != &original)
            .unwrap();
        session.switch_to(&target).unwrap();
        assert!(session.current_url().unwrap().contains("lever"));

        settle(&session, 5);
        let loc = session.find(&Selector::css(".posting-category.location")).unwrap();
        assert_eq!(session.text(loc).unwrap(), "Istanbul, Turkiye");

        session.close_active().unwrap();
        assert!(session.find(&Selector::id("jobs-list")).is_err());
        session.switch_to(&original).unwrap();
        assert!(session.find(&Selector::id("jobs-list")).is_ok());
    }

    #[test]
    fn test_poison_item_once_is_one_shot() {
        let session = listing_session();
        settle(&session, 10);
        session.poison_item_once(0);
        let items = session.find_all(&Selector::class("position-list-item")).unwrap();
        let title = session.find_child(items[0], &Selector::class("position-title")).unwrap();
        assert!(session.text(title).unwrap_err().is_transient());
        assert!(session.text(title).is_ok());
    }

    #[test]
    fn test_filter_reset_after_return_restores_full_inventory() {
        let mut session = listing_session();
        settle(&session, 10);
        let select = session.find(&Selector::id("filter-by-location")).unwrap();
        session.select_by_label(select, "Istanbul, Turkiye").unwrap();
        settle(&session, 15);
        assert_eq!(
            session.find_all(&Selector::class("position-list-item")).unwrap().len(),
            2
        );

        session.reset_filters_after_returns(1);
        let original = session.active_context().unwrap();
        let items = session.find_all(&Selector::class("position-list-item")).unwrap();
        let trigger = session.find_child(items[0], &Selector::css("a.btn")).unwrap();
        session.click(trigger).unwrap();
        let target = session
            .contexts()
            .unwrap()
            .into_iter()
            .find(|c| c != &original)
            .unwrap();
        session.switch_to(&target).unwrap();
        session.close_active().unwrap();
        session.switch_to(&original).unwrap();

        assert_eq!(
            session.find_all(&Selector::class("position-list-item")).unwrap().len(),
            3,
            "filters were silently cleared"
        );
    }
}
