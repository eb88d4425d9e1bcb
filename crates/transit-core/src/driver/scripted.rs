//! In-memory browser backend that replays a fixed script.
//!
//! Used for tests and dry runs: no browser process is started, every
//! interaction is recorded, and the page behaves as configured.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{BrowserLauncher, BrowserSession, Locator, OptionMatch};
use crate::error::DriverError;

/// One interaction a scripted session received.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Navigate(String),
    Type { locator: Locator, text: String },
    Click(Locator),
    ClickFirst(Locator),
    Select { select: Locator, option: OptionMatch },
    WaitFor(Locator),
    Texts(Locator),
}

/// Live count of sessions started and released.
#[derive(Debug, Clone, Default)]
pub struct SessionCounters {
    launched: Arc<AtomicUsize>,
    quit: Arc<AtomicUsize>,
}

impl SessionCounters {
    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn quit(&self) -> usize {
        self.quit.load(Ordering::SeqCst)
    }

    /// Sessions started but not yet released.
    pub fn live(&self) -> usize {
        self.launched() - self.quit()
    }
}

#[derive(Debug, Clone, Default)]
struct Script {
    result_lines: Vec<String>,
    result_appears: bool,
    launch_fails: bool,
    navigation_fails: bool,
    fail_on: Option<Locator>,
    popups: Vec<Locator>,
    broken_popups: Vec<Locator>,
}

/// Launcher handing out [`ScriptedSession`]s that all follow one script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLauncher {
    script: Script,
    counters: SessionCounters,
    actions: Arc<Mutex<Vec<Action>>>,
}

impl ScriptedLauncher {
    /// Sessions whose result container appears holding `lines`.
    pub fn returning<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Script {
                result_lines: lines.into_iter().map(Into::into).collect(),
                result_appears: true,
                ..Script::default()
            },
            ..Self::default()
        }
    }

    /// The result container never shows up.
    pub fn never_showing_results(mut self) -> Self {
        self.script.result_appears = false;
        self
    }

    pub fn failing_launch(mut self) -> Self {
        self.script.launch_fails = true;
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.script.navigation_fails = true;
        self
    }

    /// Any interaction with `locator` reports the element as missing.
    pub fn failing_on(mut self, locator: Locator) -> Self {
        self.script.fail_on = Some(locator);
        self
    }

    /// A popup matching `locator` is present and closes when clicked.
    pub fn with_popup(mut self, locator: Locator) -> Self {
        self.script.popups.push(locator);
        self
    }

    /// A popup matching `locator` is present but clicking it errors.
    pub fn with_broken_popup(mut self, locator: Locator) -> Self {
        self.script.broken_popups.push(locator);
        self
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters.clone()
    }

    /// Every interaction received so far, across all sessions.
    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, DriverError> {
        if self.script.launch_fails {
            return Err(DriverError::Launch("scripted launch failure".to_string()));
        }
        self.counters.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            script: self.script.clone(),
            counters: self.counters.clone(),
            actions: Arc::clone(&self.actions),
        }))
    }
}

/// Session produced by [`ScriptedLauncher`].
pub struct ScriptedSession {
    script: Script,
    counters: SessionCounters,
    actions: Arc<Mutex<Vec<Action>>>,
}

impl ScriptedSession {
    fn record(&self, action: Action) {
        if let Ok(mut actions) = self.actions.lock() {
            actions.push(action);
        }
    }

    fn check(&self, locator: &Locator) -> Result<(), DriverError> {
        if self.script.fail_on.as_ref() == Some(locator) {
            return Err(DriverError::NotFound {
                locator: locator.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.record(Action::Navigate(url.to_string()));
        if self.script.navigation_fails {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                message: "scripted navigation failure".to_string(),
            });
        }
        Ok(())
    }

    async fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), DriverError> {
        self.check(locator)?;
        self.record(Action::Type {
            locator: locator.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), DriverError> {
        self.check(locator)?;
        self.record(Action::Click(locator.clone()));
        Ok(())
    }

    async fn click_first(&mut self, locator: &Locator) -> Result<bool, DriverError> {
        if self.script.broken_popups.contains(locator) {
            return Err(DriverError::Interaction {
                locator: locator.to_string(),
                message: "element is not clickable".to_string(),
            });
        }
        if self.script.popups.contains(locator) {
            self.record(Action::ClickFirst(locator.clone()));
            return Ok(true);
        }
        Ok(false)
    }

    async fn select_option(
        &mut self,
        select: &Locator,
        option: &OptionMatch,
    ) -> Result<(), DriverError> {
        self.check(select)?;
        self.record(Action::Select {
            select: select.clone(),
            option: option.clone(),
        });
        Ok(())
    }

    async fn wait_for(&mut self, locator: &Locator) -> Result<(), DriverError> {
        self.check(locator)?;
        self.record(Action::WaitFor(locator.clone()));
        if !self.script.result_appears {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn texts(&mut self, locator: &Locator) -> Result<Vec<String>, DriverError> {
        self.check(locator)?;
        self.record(Action::Texts(locator.clone()));
        Ok(self.script.result_lines.clone())
    }

    async fn quit(self: Box<Self>) -> Result<(), DriverError> {
        self.counters.quit.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
