//! Best-effort removal of transient overlays.

use std::time::Duration;

use crate::driver::{BrowserSession, Locator};

/// Overlay close affordances known to appear on the target page, tried in order.
pub const KNOWN_POPUP_SELECTORS: &[&str] = &[
    "button.close-popup",
    r#"button[aria-label="Close"]"#,
    ".permission-popup .close",
    "#consent-popup .decline",
    r#"div[data-testid="close-button"]"#,
];

/// Closes known popups. Has no failure channel: errors are logged and dropped.
#[derive(Debug, Clone)]
pub struct PopupDismisser {
    selectors: Vec<Locator>,
    settle: Duration,
}

impl PopupDismisser {
    pub fn new(settle: Duration) -> Self {
        Self {
            selectors: KNOWN_POPUP_SELECTORS
                .iter()
                .map(|s| Locator::css(*s))
                .collect(),
            settle,
        }
    }

    pub fn selectors(&self) -> &[Locator] {
        &self.selectors
    }

    /// Click the first match of each known selector, pausing after each close.
    ///
    /// Returns how many popups were closed.
    pub async fn dismiss_known_popups(&self, session: &mut dyn BrowserSession) -> usize {
        let mut closed = 0;
        for selector in &self.selectors {
            match session.click_first(selector).await {
                Ok(true) => {
                    closed += 1;
                    tracing::debug!(%selector, "Closed popup");
                    tokio::time::sleep(self.settle).await;
                }
                Ok(false) => {}
                Err(e) => tracing::trace!(%selector, error = %e, "Popup dismissal failed, ignoring"),
            }
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::scripted::Action;
    use crate::driver::{BrowserLauncher, ScriptedLauncher};

    #[tokio::test(start_paused = true)]
    async fn test_closes_present_popups_in_order() {
        let launcher = ScriptedLauncher::returning(Vec::<String>::new())
            .with_popup(Locator::css("#consent-popup .decline"))
            .with_popup(Locator::css("button.close-popup"));
        let mut session = launcher.launch().await.unwrap();

        let dismisser = PopupDismisser::new(Duration::from_millis(500));
        let closed = dismisser.dismiss_known_popups(session.as_mut()).await;

        assert_eq!(closed, 2);
        assert_eq!(
            launcher.actions(),
            vec![
                Action::ClickFirst(Locator::css("button.close-popup")),
                Action::ClickFirst(Locator::css("#consent-popup .decline")),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_swallowed_and_sweep_continues() {
        let launcher = ScriptedLauncher::returning(Vec::<String>::new())
            .with_broken_popup(Locator::css("button.close-popup"))
            .with_popup(Locator::css(r#"div[data-testid="close-button"]"#));
        let mut session = launcher.launch().await.unwrap();

        let closed = PopupDismisser::new(Duration::from_millis(500))
            .dismiss_known_popups(session.as_mut())
            .await;

        assert_eq!(closed, 1);
    }

    #[tokio::test]
    async fn test_no_popups_is_a_no_op() {
        let launcher = ScriptedLauncher::returning(Vec::<String>::new());
        let mut session = launcher.launch().await.unwrap();

        let closed = PopupDismisser::new(Duration::ZERO)
            .dismiss_known_popups(session.as_mut())
            .await;

        assert_eq!(closed, 0);
        assert!(launcher.actions().is_empty());
    }
}
