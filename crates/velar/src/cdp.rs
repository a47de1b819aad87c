//! CDP-backed Chromium session.
//!
//! Real browser control via the Chrome DevTools Protocol (chromiumoxide).
//! The protocol is async; this wrapper owns a tokio runtime and blocks on
//! each call so the verification engine keeps its single logical thread.
//!
//! Element handles are realized as JS-side references keyed by the handle
//! id (`window.__velar.refs`). A handle whose node is no longer attached
//! to the document reports [`VelarError::StaleReference`], which is
//! exactly the invalidation the engine's retry machinery expects.

use crate::config::{BrowserKind, RunConfig};
use crate::locator::Selector;
use crate::result::{VelarError, VelarResult};
use crate::session::{ContextId, ElementId, Session};
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use std::cell::Cell;
use std::collections::HashMap;
use tokio::runtime::Runtime;

/// Chromium session driven over CDP
pub struct CdpSession {
    rt: Runtime,
    browser: CdpBrowser,
    #[allow(dead_code)]
    handler: tokio::task::JoinHandle<()>,
    pages: HashMap<String, CdpPage>,
    active: String,
    next_element: Cell<u64>,
}

impl std::fmt::Debug for CdpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpSession")
            .field("active", &self.active)
            .field("pages", &self.pages.len())
            .finish_non_exhaustive()
    }
}

impl CdpSession {
    /// Launch a browser per the run configuration.
    ///
    /// # Errors
    ///
    /// [`VelarError::UnsupportedConfiguration`] for browser kinds this
    /// backend cannot drive — rejected before any process is spawned —
    /// and [`VelarError::SessionLaunch`] for launch failures.
    pub fn launch(config: &RunConfig) -> VelarResult<Self> {
        if config.browser != BrowserKind::Chrome {
            return Err(VelarError::UnsupportedConfiguration {
                message: format!(
                    "the CDP backend drives chromium only; '{}' requires a WebDriver-backed session",
                    config.browser
                ),
            });
        }

        let rt = Runtime::new().map_err(|e| VelarError::SessionLaunch {
            message: e.to_string(),
        })?;

        let mut builder = CdpConfig::builder().window_size(1920, 1080).no_sandbox();
        if !config.headless {
            builder = builder.with_head();
        }
        let cdp_config = builder.build().map_err(|e| VelarError::SessionLaunch {
            message: e.to_string(),
        })?;

        let (browser, mut handler) =
            rt.block_on(CdpBrowser::launch(cdp_config))
                .map_err(|e| VelarError::SessionLaunch {
                    message: e.to_string(),
                })?;

        let handle = rt.spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = rt
            .block_on(browser.new_page("about:blank"))
            .map_err(|e| VelarError::SessionLaunch {
                message: e.to_string(),
            })?;
        let target = page.target_id().inner().clone();
        let mut pages = HashMap::new();
        pages.insert(target.clone(), page);

        Ok(Self {
            rt,
            browser,
            handler: handle,
            pages,
            active: target,
            next_element: Cell::new(1),
        })
    }

    fn active_page(&self) -> VelarResult<&CdpPage> {
        self.pages.get(&self.active).ok_or_else(|| VelarError::Context {
            message: format!("active context {} is closed", self.active),
        })
    }

    /// Re-enumerate open targets and refresh the page table
    fn refresh_pages(&mut self) -> VelarResult<Vec<String>> {
        let pages = self
            .rt
            .block_on(self.browser.pages())
            .map_err(|e| VelarError::session(e.to_string()))?;
        let mut ids = Vec::with_capacity(pages.len());
        let mut table = HashMap::with_capacity(pages.len());
        for page in pages {
            let id = page.target_id().inner().clone();
            ids.push(id.clone());
            table.insert(id, page);
        }
        self.pages = table;
        Ok(ids)
    }

    fn eval<T: serde::de::DeserializeOwned>(&self, expr: &str) -> VelarResult<T> {
        let page = self.active_page()?;
        let result = self
            .rt
            .block_on(page.evaluate(expr))
            .map_err(|e| VelarError::session(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| VelarError::session(e.to_string()))
    }

    /// JS expression selecting the nodes a selector denotes
    fn query_all(selector: &Selector) -> String {
        match selector.as_css() {
            Some(css) => format!(
                "Array.from(document.querySelectorAll({}))",
                js_string(&css)
            ),
            // visible-text anchors have no CSS equivalent
            None => {
                let Selector::LinkText(text) = selector else {
                    unreachable!("only LinkText lacks a CSS form");
                };
                format!(
                    "Array.from(document.querySelectorAll('a, button')).filter(el => \
                     el.textContent.trim().replace(/\\s+/g, ' ') === {})",
                    js_string(text)
                )
            }
        }
    }

    /// Register the matched nodes under fresh handle ids. Handle ids are
    /// allocated Rust-side, so they stay unique across contexts; a handle
    /// used in the wrong context simply misses the registry and reads as
    /// stale.
    fn resolve_all(&self, selector: &Selector) -> VelarResult<Vec<ElementId>> {
        let base = self.next_element.get();
        let expr = format!(
            "(() => {{ window.__velar = window.__velar || {{ refs: {{}} }}; \
             const els = {}; \
             return els.map((el, i) => {{ window.__velar.refs[{base} + i] = el; return {base} + i; }}); }})()",
            Self::query_all(selector)
        );
        let ids: Vec<u64> = self.eval(&expr)?;
        self.next_element.set(base + ids.len() as u64);
        Ok(ids.into_iter().map(ElementId::new).collect())
    }
}

/// Reach a registered element; evaluates to `null` when the node is gone
fn ref_expr(element: ElementId) -> String {
    format!(
        "(window.__velar && window.__velar.refs[{id}] && \
         window.__velar.refs[{id}].isConnected ? window.__velar.refs[{id}] : null)",
        id = element.raw()
    )
}

fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

impl Session for CdpSession {
    fn open(&mut self, url: &str) -> VelarResult<()> {
        let page = self.active_page()?;
        self.rt
            .block_on(page.goto(url))
            .map(|_| ())
            .map_err(|e| VelarError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    fn current_url(&self) -> VelarResult<String> {
        self.eval("window.location.href")
    }

    fn title(&self) -> VelarResult<String> {
        self.eval("document.title")
    }

    fn contexts(&self) -> VelarResult<Vec<ContextId>> {
        // read-only enumeration; the page table is refreshed on switch
        let pages = self
            .rt
            .block_on(self.browser.pages())
            .map_err(|e| VelarError::session(e.to_string()))?;
        Ok(pages
            .iter()
            .map(|p| ContextId::new(p.target_id().inner().clone()))
            .collect())
    }

    fn active_context(&self) -> VelarResult<ContextId> {
        Ok(ContextId::new(self.active.clone()))
    }

    fn switch_to(&mut self, context: &ContextId) -> VelarResult<()> {
        let ids = self.refresh_pages()?;
        if !ids.iter().any(|id| id == context.as_str()) {
            return Err(VelarError::Context {
                message: format!("no open context {context}"),
            });
        }
        self.active = context.as_str().to_string();
        Ok(())
    }

    fn close_active(&mut self) -> VelarResult<()> {
        let page = self
            .pages
            .remove(&self.active)
            .ok_or_else(|| VelarError::Context {
                message: "no open active context to close".into(),
            })?;
        self.rt
            .block_on(page.close())
            .map_err(|e| VelarError::session(e.to_string()))
    }

    fn find(&self, selector: &Selector) -> VelarResult<ElementId> {
        self.resolve_all(selector)?
            .into_iter()
            .next()
            .ok_or_else(|| VelarError::ElementNotFound {
                locator: selector.to_string(),
            })
    }

    fn find_all(&self, selector: &Selector) -> VelarResult<Vec<ElementId>> {
        self.resolve_all(selector)
    }

    fn find_child(&self, parent: ElementId, selector: &Selector) -> VelarResult<ElementId> {
        let Some(css) = selector.as_css() else {
            return Err(VelarError::ElementNotFound {
                locator: selector.to_string(),
            });
        };
        let id = self.next_element.get();
        // 0 = parent gone, -1 = no match, otherwise the registered handle
        let expr = format!(
            "(() => {{ const p = {}; if (!p) return 0; \
             const el = p.querySelector({}); if (!el) return -1; \
             window.__velar = window.__velar || {{ refs: {{}} }}; \
             window.__velar.refs[{id}] = el; return {id}; }})()",
            ref_expr(parent),
            js_string(&css)
        );
        let outcome: i64 = self.eval(&expr)?;
        match outcome {
            0 => Err(VelarError::stale(parent.to_string())),
            -1 => Err(VelarError::ElementNotFound {
                locator: selector.to_string(),
            }),
            registered => {
                self.next_element.set(id + 1);
                Ok(ElementId::new(registered as u64))
            }
        }
    }

    fn text(&self, element: ElementId) -> VelarResult<String> {
        let expr = format!(
            "(() => {{ const el = {}; if (!el) return null; \
             let t = (el.innerText || '').trim(); \
             if (!t) t = (el.textContent || '').trim(); \
             return t; }})()",
            ref_expr(element)
        );
        let text: Option<String> = self.eval(&expr)?;
        text.ok_or_else(|| VelarError::stale(element.to_string()))
    }

    fn click(&mut self, element: ElementId) -> VelarResult<()> {
        let expr = format!(
            "(() => {{ const el = {}; if (!el) return false; el.click(); return true; }})()",
            ref_expr(element)
        );
        let clicked: bool = self.eval(&expr)?;
        if clicked {
            Ok(())
        } else {
            Err(VelarError::stale(element.to_string()))
        }
    }

    fn select_by_label(&mut self, element: ElementId, label: &str) -> VelarResult<()> {
        let expr = format!(
            "(() => {{ const el = {}; if (!el) return 'stale'; \
             const opt = Array.from(el.options || []).find(o => o.textContent.trim() === {}); \
             if (!opt) return 'missing'; \
             el.value = opt.value; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return 'ok'; }})()",
            ref_expr(element),
            js_string(label)
        );
        let outcome: String = self.eval(&expr)?;
        match outcome.as_str() {
            "ok" => Ok(()),
            "missing" => Err(VelarError::session(format!(
                "no option with visible label '{label}'"
            ))),
            _ => Err(VelarError::stale(element.to_string())),
        }
    }

    fn option_labels(&self, element: ElementId) -> VelarResult<Vec<String>> {
        let expr = format!(
            "(() => {{ const el = {}; if (!el) return null; \
             return Array.from(el.options || []).map(o => o.textContent.trim()); }})()",
            ref_expr(element)
        );
        let labels: Option<Vec<String>> = self.eval(&expr)?;
        labels.ok_or_else(|| VelarError::stale(element.to_string()))
    }

    fn scroll_into_view(&self, element: ElementId) -> VelarResult<()> {
        let expr = format!(
            "(() => {{ const el = {}; if (!el) return false; \
             el.scrollIntoView({{ block: 'center' }}); return true; }})()",
            ref_expr(element)
        );
        let ok: bool = self.eval(&expr)?;
        if ok {
            Ok(())
        } else {
            Err(VelarError::stale(element.to_string()))
        }
    }

    fn is_attached(&self, element: ElementId) -> bool {
        let expr = format!("(() => {{ return {} !== null; }})()", ref_expr(element));
        self.eval::<bool>(&expr).unwrap_or(false)
    }

    fn quit(&mut self) -> VelarResult<()> {
        self.pages.clear();
        self.rt
            .block_on(self.browser.close())
            .map(|_| ())
            .map_err(|e| VelarError::session(e.to_string()))
    }
}
