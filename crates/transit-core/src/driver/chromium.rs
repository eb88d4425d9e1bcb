//! Chrome backend over the DevTools protocol (chromiumoxide).

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::{BrowserLauncher, BrowserSession, Locator, OptionMatch};
use crate::config::ScraperConfig;
use crate::error::DriverError;

/// Delay between presence checks in `wait_for`.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long `quit` waits for the CDP handler to drain after Chrome exits.
const HANDLER_DRAIN: Duration = Duration::from_secs(2);

/// Launches one Chrome process per session.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    headless: bool,
    executable: Option<String>,
}

impl ChromiumLauncher {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            headless: config.headless,
            executable: config.chrome_executable.clone(),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, DriverError> {
        let mut builder = BrowserConfig::builder();
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(DriverError::Launch)
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, DriverError> {
        let config = self.browser_config()?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!(error = %e, "CDP handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                // The process is already running; do not leak it.
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                return Err(DriverError::Launch(e.to_string()));
            }
        };

        tracing::debug!(headless = self.headless, "Chrome session started");
        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler,
        }))
    }
}

/// A Chrome process with a single page.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    async fn find_one(&self, locator: &Locator) -> Result<Element, DriverError> {
        let found = match locator {
            Locator::XPath(expr) => self.page.find_xpath(expr.as_str()).await,
            other => self.page.find_element(css_selector(other)).await,
        };
        found.map_err(|_| DriverError::NotFound {
            locator: locator.to_string(),
        })
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Element>, DriverError> {
        let found = match locator {
            Locator::XPath(expr) => self.page.find_xpaths(expr.as_str()).await,
            other => self.page.find_elements(css_selector(other)).await,
        };
        found.map_err(|e| DriverError::Protocol(e.to_string()))
    }
}

fn css_selector(locator: &Locator) -> String {
    match locator {
        Locator::Name(name) => format!("[name=\"{name}\"]"),
        Locator::Css(selector) => selector.clone(),
        Locator::XPath(expr) => expr.clone(),
    }
}

fn interaction(locator: &Locator, e: impl std::fmt::Display) -> DriverError {
    DriverError::Interaction {
        locator: locator.to_string(),
        message: e.to_string(),
    }
}

/// JS expression evaluating to the first element matching `locator`, or null.
fn js_lookup(locator: &Locator) -> String {
    match locator {
        Locator::XPath(expr) => format!(
            "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
            js_string(expr)
        ),
        other => format!("document.querySelector({})", js_string(&css_selector(other))),
    }
}

fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn select_script(select: &Locator, option: &OptionMatch) -> String {
    let predicate = match option {
        OptionMatch::Text(text) => format!("o.text.trim() === {}", js_string(text)),
        OptionMatch::Value(value) => format!("o.value === {}", js_string(value)),
    };
    format!(
        r#"(() => {{
  const select = {lookup};
  if (!select) return false;
  const option = Array.from(select.options).find(o => {predicate});
  if (!option) return false;
  select.value = option.value;
  select.dispatchEvent(new Event('change', {{ bubbles: true }}));
  return true;
}})()"#,
        lookup = js_lookup(select),
    )
}

/// Join the CDP handler, which ends once the connection is gone. Returns
/// whether it finished within `bound`; otherwise it is aborted.
async fn join_handler(mut handler: JoinHandle<()>, bound: Duration) -> bool {
    match tokio::time::timeout(bound, &mut handler).await {
        Ok(_) => true,
        Err(_) => {
            tracing::debug!("CDP handler still running after Chrome exit, aborting");
            handler.abort();
            false
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        let navigation = |e: chromiumoxide::error::CdpError| DriverError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        };
        self.page.goto(url).await.map_err(navigation)?;
        self.page.wait_for_navigation().await.map_err(navigation)?;
        Ok(())
    }

    async fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), DriverError> {
        let element = self.find_one(locator).await?;
        element.focus().await.map_err(|e| interaction(locator, e))?;
        element
            .type_str(text)
            .await
            .map_err(|e| interaction(locator, e))?;
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), DriverError> {
        let element = self.find_one(locator).await?;
        element.click().await.map_err(|e| interaction(locator, e))?;
        Ok(())
    }

    async fn click_first(&mut self, locator: &Locator) -> Result<bool, DriverError> {
        let elements = self.find_all(locator).await?;
        match elements.first() {
            Some(element) => {
                element.click().await.map_err(|e| interaction(locator, e))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn select_option(
        &mut self,
        select: &Locator,
        option: &OptionMatch,
    ) -> Result<(), DriverError> {
        let selected: bool = self
            .page
            .evaluate(select_script(select, option))
            .await
            .map_err(|e| interaction(select, e))?
            .into_value()
            .map_err(|e| interaction(select, e))?;

        if selected {
            Ok(())
        } else {
            Err(DriverError::NotFound {
                locator: format!("{select} option with {option}"),
            })
        }
    }

    async fn wait_for(&mut self, locator: &Locator) -> Result<(), DriverError> {
        loop {
            match self.find_all(locator).await {
                Ok(found) if !found.is_empty() => return Ok(()),
                Ok(_) => {}
                Err(e) => tracing::trace!(error = %e, %locator, "Presence check failed, retrying"),
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn texts(&mut self, locator: &Locator) -> Result<Vec<String>, DriverError> {
        let elements = self.find_all(locator).await?;
        let mut texts = Vec::with_capacity(elements.len());
        for element in &elements {
            let text = element
                .inner_text()
                .await
                .map_err(|e| interaction(locator, e))?;
            texts.push(text.unwrap_or_default());
        }
        Ok(texts)
    }

    async fn quit(self: Box<Self>) -> Result<(), DriverError> {
        let ChromiumSession {
            mut browser,
            page,
            handler,
        } = *self;
        drop(page);

        let closed = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| DriverError::Protocol(e.to_string()));
        if closed.is_err() {
            let _ = browser.kill().await;
        }
        let _ = browser.wait().await;
        drop(browser);

        join_handler(handler, HANDLER_DRAIN).await;

        tracing::debug!("Chrome session terminated");
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_locator_becomes_attribute_selector() {
        assert_eq!(css_selector(&Locator::name("longdeg")), "[name=\"longdeg\"]");
    }

    #[test]
    fn test_select_script_escapes_option_text() {
        let script = select_script(
            &Locator::name("sex"),
            &OptionMatch::Text("Ma\"le".to_string()),
        );
        assert!(script.contains(r#"document.querySelector("[name=\"sex\"]")"#));
        assert!(script.contains(r#"o.text.trim() === "Ma\"le""#));
    }

    #[test]
    fn test_select_script_matches_by_value() {
        let script = select_script(&Locator::name("longew"), &OptionMatch::Value("E".into()));
        assert!(script.contains(r#"o.value === "E""#));
    }

    #[test]
    fn test_xpath_lookup_uses_document_evaluate() {
        let js = js_lookup(&Locator::xpath("//select[@id='x']"));
        assert!(js.starts_with("document.evaluate(\"//select[@id='x']\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_handler_waits_for_finished_stream() {
        let handler = tokio::spawn(async {
            tokio::time::sleep(Duration::from_millis(300)).await;
        });
        assert!(join_handler(handler, HANDLER_DRAIN).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_handler_aborts_stuck_stream() {
        let handler = tokio::spawn(std::future::pending::<()>());
        assert!(!join_handler(handler, HANDLER_DRAIN).await);
    }
}
