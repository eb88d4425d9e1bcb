//! Transit form workflow
//!
//! Drives one browser session through the transit form as an explicit state
//! machine:
//!
//! ```text
//! NAVIGATE → FILL_BASIC → REVEAL_ADVANCED → DISMISS_POPUPS → FILL_GEO
//!          → SUBMIT → AWAIT_RESULT → HARVEST → DONE
//! ```
//!
//! Any step other than DISMISS_POPUPS can end the run in FAILED; AWAIT_RESULT
//! ends in TIMED_OUT when the result container does not show up in time. The
//! session is released exactly once whichever terminal state is reached, and
//! also when the run itself is dropped before reaching one.

use std::fmt;
use std::sync::Arc;

use tokio::sync::OwnedSemaphorePermit;

use crate::config::ScraperConfig;
use crate::coordinate::to_astro_format;
use crate::driver::{BrowserLauncher, BrowserSession, Locator, OptionMatch};
use crate::error::{DriverError, WorkflowError};
use crate::popup::PopupDismisser;
use crate::types::{AstroCoordinate, Axis, BirthDetails, Direction, RawResultLine};

// ─── Page markup ──────────────────────────────────────────────

pub const ADVANCED_SETTINGS_XPATH: &str =
    r#"//a[contains(@class, "btn") and contains(text(), "Advanced Settings")]"#;
pub const SUBMIT_XPATH: &str = r#"//input[@type="submit" and @value="SUBMIT"]"#;
pub const RESULT_CONTAINER_CSS: &str = ".card.padding-all.hdg-content";
pub const RESULT_ENTRY_CSS: &str = ".card.padding-all.hdg-content h2";

// ─── States ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    Navigate,
    FillBasic,
    RevealAdvanced,
    DismissPopups,
    FillGeo,
    Submit,
    AwaitResult,
    Harvest,
    Done,
    Failed,
    TimedOut,
}

impl WorkflowState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkflowState::Done | WorkflowState::Failed | WorkflowState::TimedOut
        )
    }

    /// State entered when this one completes successfully.
    pub fn on_success(self) -> WorkflowState {
        use WorkflowState::*;
        match self {
            Navigate => FillBasic,
            FillBasic => RevealAdvanced,
            RevealAdvanced => DismissPopups,
            DismissPopups => FillGeo,
            FillGeo => Submit,
            Submit => AwaitResult,
            AwaitResult => Harvest,
            Harvest => Done,
            terminal => terminal,
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Navigate => "NAVIGATE",
            WorkflowState::FillBasic => "FILL_BASIC",
            WorkflowState::RevealAdvanced => "REVEAL_ADVANCED",
            WorkflowState::DismissPopups => "DISMISS_POPUPS",
            WorkflowState::FillGeo => "FILL_GEO",
            WorkflowState::Submit => "SUBMIT",
            WorkflowState::AwaitResult => "AWAIT_RESULT",
            WorkflowState::Harvest => "HARVEST",
            WorkflowState::Done => "DONE",
            WorkflowState::Failed => "FAILED",
            WorkflowState::TimedOut => "TIMED_OUT",
        };
        f.write_str(name)
    }
}

// ─── Geo fields ───────────────────────────────────────────────

/// Values entered in the advanced-settings geo fields.
///
/// The page labels its groups the other way round from what they hold: the
/// "long*" group receives the converted latitude and the "lat*" group the
/// converted longitude. Directions are cross-mapped the same way
/// (`longew` is E for a northern latitude, `latns` is N for an eastern
/// longitude). This matches what the live form has been fed so far; do not
/// straighten it out without checking the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoFields {
    pub long_deg: String,
    pub long_min: String,
    pub long_ew: String,
    pub lat_deg: String,
    pub lat_min: String,
    pub lat_ns: String,
}

impl GeoFields {
    pub fn from_coordinates(latitude: AstroCoordinate, longitude: AstroCoordinate) -> Self {
        let long_ew = if latitude.direction == Direction::North { "E" } else { "W" };
        let lat_ns = if longitude.direction == Direction::East { "N" } else { "S" };

        Self {
            long_deg: latitude.degrees.to_string(),
            long_min: latitude.minutes.to_string(),
            long_ew: long_ew.to_string(),
            lat_deg: longitude.degrees.to_string(),
            lat_min: longitude.minutes.to_string(),
            lat_ns: lat_ns.to_string(),
        }
    }

    pub fn for_details(details: &BirthDetails) -> Self {
        Self::from_coordinates(
            to_astro_format(details.latitude, Axis::Latitude),
            to_astro_format(details.longitude, Axis::Longitude),
        )
    }
}

// ─── Session guard ────────────────────────────────────────────

/// Owns a launched session (and the slot it occupies) until it has been quit.
///
/// `release` quits in line. If the guard is dropped first, because the future
/// running the workflow was cancelled, the quit is spawned onto the runtime.
/// The slot permit is only returned once the browser is gone.
struct SessionGuard {
    session: Option<Box<dyn BrowserSession>>,
    permit: Option<OwnedSemaphorePermit>,
}

impl SessionGuard {
    fn new(session: Box<dyn BrowserSession>, permit: Option<OwnedSemaphorePermit>) -> Self {
        Self {
            session: Some(session),
            permit,
        }
    }

    async fn release(mut self) {
        if let Some(session) = self.session.take() {
            quit_session(session, self.permit.take()).await;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let permit = self.permit.take();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                tracing::debug!("Workflow abandoned, releasing browser session");
                runtime.spawn(quit_session(session, permit));
            }
            Err(_) => tracing::warn!("No runtime left to release abandoned browser session"),
        }
    }
}

async fn quit_session(session: Box<dyn BrowserSession>, permit: Option<OwnedSemaphorePermit>) {
    if let Err(e) = session.quit().await {
        tracing::warn!(error = %e, "Failed to release browser session");
    }
    drop(permit);
}

// ─── Workflow ─────────────────────────────────────────────────

/// Fills and submits the transit form, returning the trimmed result headings.
pub struct TransitFormWorkflow {
    launcher: Arc<dyn BrowserLauncher>,
    config: ScraperConfig,
    popups: PopupDismisser,
}

impl TransitFormWorkflow {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, config: ScraperConfig) -> Self {
        let popups = PopupDismisser::new(config.popup_settle());
        Self {
            launcher,
            config,
            popups,
        }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Run the form once for `details`.
    pub async fn run(&self, details: &BirthDetails) -> Result<Vec<RawResultLine>, WorkflowError> {
        self.run_guarded(details, None).await
    }

    /// Like [`run`](Self::run), holding `permit` until the session has quit.
    pub async fn run_with_permit(
        &self,
        details: &BirthDetails,
        permit: OwnedSemaphorePermit,
    ) -> Result<Vec<RawResultLine>, WorkflowError> {
        self.run_guarded(details, Some(permit)).await
    }

    async fn run_guarded(
        &self,
        details: &BirthDetails,
        permit: Option<OwnedSemaphorePermit>,
    ) -> Result<Vec<RawResultLine>, WorkflowError> {
        let session = self.launcher.launch().await.map_err(WorkflowError::Launch)?;
        let mut guard = SessionGuard::new(session, permit);

        let outcome = match guard.session.as_deref_mut() {
            Some(session) => self.drive(session, details).await,
            None => unreachable!("session is only taken on release"),
        };

        guard.release().await;
        outcome
    }

    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        details: &BirthDetails,
    ) -> Result<Vec<RawResultLine>, WorkflowError> {
        let mut state = WorkflowState::Navigate;
        let mut harvested = Vec::new();
        let mut failure = None;

        while !state.is_terminal() {
            tracing::debug!(%state, "Workflow step");
            state = match self.step(state, session, details, &mut harvested).await {
                Ok(()) => state.on_success(),
                Err(e) => {
                    tracing::warn!(%state, error = %e, "Workflow step failed");
                    let terminal = if e.is_timeout() {
                        WorkflowState::TimedOut
                    } else {
                        WorkflowState::Failed
                    };
                    failure = Some(e);
                    terminal
                }
            };
        }

        match failure {
            Some(e) => Err(e),
            None => {
                tracing::info!(entries = harvested.len(), "Transit results harvested");
                Ok(harvested)
            }
        }
    }

    async fn step(
        &self,
        state: WorkflowState,
        session: &mut dyn BrowserSession,
        details: &BirthDetails,
        harvested: &mut Vec<RawResultLine>,
    ) -> Result<(), WorkflowError> {
        let failed = |source: DriverError| WorkflowError::Step { state, source };

        match state {
            WorkflowState::Navigate => session.navigate(&self.config.base_url).await.map_err(failed),
            WorkflowState::FillBasic => self.fill_basic(session, details).await.map_err(failed),
            WorkflowState::RevealAdvanced => self.reveal_advanced(session).await.map_err(failed),
            WorkflowState::DismissPopups => {
                self.popups.dismiss_known_popups(session).await;
                Ok(())
            }
            WorkflowState::FillGeo => self.fill_geo(session, details).await.map_err(failed),
            WorkflowState::Submit => session
                .click(&Locator::xpath(SUBMIT_XPATH))
                .await
                .map_err(failed),
            WorkflowState::AwaitResult => {
                let limit = self.config.result_timeout();
                let container = Locator::css(RESULT_CONTAINER_CSS);
                match tokio::time::timeout(limit, session.wait_for(&container)).await {
                    Ok(present) => present.map_err(failed),
                    Err(_) => Err(WorkflowError::TimedOut(limit)),
                }
            }
            WorkflowState::Harvest => {
                *harvested = self.harvest(session).await.map_err(failed)?;
                Ok(())
            }
            WorkflowState::Done | WorkflowState::Failed | WorkflowState::TimedOut => Ok(()),
        }
    }

    async fn fill_basic(
        &self,
        session: &mut dyn BrowserSession,
        details: &BirthDetails,
    ) -> Result<(), DriverError> {
        let fields = [
            ("name", details.name.clone()),
            ("day", details.day.to_string()),
            ("month", details.month.to_string()),
            ("year", details.year.to_string()),
            ("hrs", details.hours.to_string()),
            ("min", details.minutes.to_string()),
            ("sec", format!("{:02}", details.seconds)),
        ];
        for (field, value) in &fields {
            session.type_text(&Locator::name(*field), value).await?;
        }

        session
            .select_option(
                &Locator::name("sex"),
                &OptionMatch::Text(details.sex.label().to_string()),
            )
            .await?;
        session
            .type_text(&Locator::name("place"), &details.place)
            .await
    }

    async fn reveal_advanced(&self, session: &mut dyn BrowserSession) -> Result<(), DriverError> {
        session.click(&Locator::xpath(ADVANCED_SETTINGS_XPATH)).await?;
        tokio::time::sleep(self.config.advanced_settle()).await;
        Ok(())
    }

    async fn fill_geo(
        &self,
        session: &mut dyn BrowserSession,
        details: &BirthDetails,
    ) -> Result<(), DriverError> {
        let geo = GeoFields::for_details(details);
        tracing::debug!(
            longdeg = %geo.long_deg,
            longmin = %geo.long_min,
            longew = %geo.long_ew,
            latdeg = %geo.lat_deg,
            latmin = %geo.lat_min,
            latns = %geo.lat_ns,
            "Filling advanced settings"
        );

        session.type_text(&Locator::name("longdeg"), &geo.long_deg).await?;
        session.type_text(&Locator::name("longmin"), &geo.long_min).await?;
        session
            .select_option(&Locator::name("longew"), &OptionMatch::Value(geo.long_ew))
            .await?;

        session.type_text(&Locator::name("latdeg"), &geo.lat_deg).await?;
        session.type_text(&Locator::name("latmin"), &geo.lat_min).await?;
        session
            .select_option(&Locator::name("latns"), &OptionMatch::Text(geo.lat_ns))
            .await?;

        session
            .type_text(&Locator::name("timezone"), &self.config.timezone)
            .await
    }

    async fn harvest(&self, session: &mut dyn BrowserSession) -> Result<Vec<RawResultLine>, DriverError> {
        let texts = session.texts(&Locator::css(RESULT_ENTRY_CSS)).await?;
        let lines: Vec<RawResultLine> = texts.iter().map(|t| t.trim().to_string()).collect();
        tracing::debug!(?lines, "Planet and house headings");
        Ok(lines)
    }
}
