//! Browser-automation capability
//!
//! The workflow talks to the browser only through these traits, so the Chrome
//! backend ([`chromium`]) and the in-memory one ([`scripted`]) are
//! interchangeable.

pub mod chromium;
pub mod scripted;

use std::fmt;

use async_trait::async_trait;

use crate::error::DriverError;

pub use chromium::ChromiumLauncher;
pub use scripted::{ScriptedLauncher, SessionCounters};

/// How to find an element on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Form control by its `name` attribute.
    Name(String),
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn name(name: impl Into<String>) -> Self {
        Locator::Name(name.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(expr.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Name(name) => write!(f, "[name=\"{name}\"]"),
            Locator::Css(selector) => write!(f, "css `{selector}`"),
            Locator::XPath(expr) => write!(f, "xpath `{expr}`"),
        }
    }
}

/// Which `<option>` of a select to pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionMatch {
    /// Visible option text.
    Text(String),
    /// The option's `value` attribute.
    Value(String),
}

impl fmt::Display for OptionMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionMatch::Text(text) => write!(f, "text {text:?}"),
            OptionMatch::Value(value) => write!(f, "value {value:?}"),
        }
    }
}

/// One exclusively owned browser session.
///
/// `quit` consumes the session, so it can be released at most once.
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url` and wait for navigation to complete.
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// Type `text` into the first element matching `locator`.
    async fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), DriverError>;

    /// Click the first element matching `locator`; fails if none exists.
    async fn click(&mut self, locator: &Locator) -> Result<(), DriverError>;

    /// Click the first element matching `locator` if there is one.
    ///
    /// Returns whether anything was clicked.
    async fn click_first(&mut self, locator: &Locator) -> Result<bool, DriverError>;

    /// Choose an option of the select matching `select`.
    async fn select_option(
        &mut self,
        select: &Locator,
        option: &OptionMatch,
    ) -> Result<(), DriverError>;

    /// Resolve once an element matching `locator` is present.
    ///
    /// Unbounded; callers impose their own deadline.
    async fn wait_for(&mut self, locator: &Locator) -> Result<(), DriverError>;

    /// Rendered text of every element matching `locator`, in document order.
    async fn texts(&mut self, locator: &Locator) -> Result<Vec<String>, DriverError>;

    /// Terminate the session and its browser process.
    async fn quit(self: Box<Self>) -> Result<(), DriverError>;
}

/// Source of fresh browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, DriverError>;
}
