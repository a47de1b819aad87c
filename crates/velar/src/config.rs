//! Run configuration.

use crate::result::{VelarError, VelarResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Supported browser choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrowserKind {
    /// Chromium/Chrome, driven over CDP
    Chrome,
    /// Firefox (recognized; requires a WebDriver-backed session)
    Firefox,
}

impl BrowserKind {
    /// Canonical lowercase name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = VelarError;

    /// Unknown names fail fast, before any session exists
    fn from_str(value: &str) -> VelarResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Self::Chrome),
            "firefox" => Ok(Self::Firefox),
            other => Err(VelarError::UnsupportedConfiguration {
                message: format!("browser not supported: {other}"),
            }),
        }
    }
}

/// Configuration for one verification run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Browser choice
    pub browser: BrowserKind,
    /// Run without a visible window
    pub headless: bool,
    /// Directory the report files are written into
    pub report_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chrome,
            headless: true,
            report_dir: PathBuf::from("target/velar-report"),
        }
    }
}

impl RunConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the browser choice
    #[must_use]
    pub const fn with_browser(mut self, browser: BrowserKind) -> Self {
        self.browser = browser;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the report directory
    #[must_use]
    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = dir.into();
        self
    }
}
