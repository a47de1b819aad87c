//! Declarative element selection.
//!
//! Page objects describe *where* things are as data; sessions decide how to
//! resolve that against their backend (a live DOM or the simulated site).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector for locating one element or a collection of elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g. `a.btn`)
    Css(String),
    /// Element id attribute
    Id(String),
    /// Element class name
    ClassName(String),
    /// Anchor/button matched by its visible text, whitespace-normalized
    LinkText(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an id selector
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Create a class-name selector
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self::ClassName(name.into())
    }

    /// Create a visible-text link selector
    #[must_use]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::LinkText(text.into())
    }

    /// Render as a CSS query string, where the form has one.
    ///
    /// [`Selector::LinkText`] has no CSS equivalent and is resolved by the
    /// session backend by scanning candidate anchors.
    #[must_use]
    pub fn as_css(&self) -> Option<String> {
        match self {
            Self::Css(s) => Some(s.clone()),
            Self::Id(id) => Some(format!("#{id}")),
            Self::ClassName(name) => Some(format!(".{name}")),
            Self::LinkText(_) => None,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::Id(id) => write!(f, "id={id}"),
            Self::ClassName(name) => write!(f, "class={name}"),
            Self::LinkText(text) => write!(f, "link-text={text}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_as_css_forms() {
        assert_eq!(
            Selector::id("jobs-list").as_css().unwrap(),
            "#jobs-list"
        );
        assert_eq!(
            Selector::class("position-list-item").as_css().unwrap(),
            ".position-list-item"
        );
        assert_eq!(Selector::css("a.btn").as_css().unwrap(), "a.btn");
        assert!(Selector::link_text("See all QA jobs").as_css().is_none());
    }

    #[test]
    fn test_display_names_the_form() {
        assert_eq!(Selector::id("x").to_string(), "id=x");
        assert_eq!(
            Selector::link_text("See all QA jobs").to_string(),
            "link-text=See all QA jobs"
        );
    }
}
