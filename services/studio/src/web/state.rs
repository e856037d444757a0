//! services/studio/src/web/state.rs
//!
//! Defines the application's shared state: the service ports plus the single
//! writing session, outline draft and license gate of the running studio.

use crate::config::Config;
use freeplotter_core::{
    order::UNIQUE_CODE_RANGE,
    ports::{
        DocumentRenderer, LicenseService, OrderService, OutlineService, PortError, PortResult,
        PreferenceStore, PromptService, ShowingService, StoryStore,
    },
    LicenseGate, LicenseVerdict, OutlineDraft, Ticket, WritingSession,
};
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

//=========================================================================================
// Ports
//=========================================================================================

/// Every external collaborator the studio talks to.
#[derive(Clone)]
pub struct Ports {
    pub stories: Arc<dyn StoryStore>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub prompts: Arc<dyn PromptService>,
    pub showing: Arc<dyn ShowingService>,
    pub outlines: Arc<dyn OutlineService>,
    pub licenses: Arc<dyn LicenseService>,
    pub orders: Arc<dyn OrderService>,
    pub renderer: Arc<dyn DocumentRenderer>,
}

//=========================================================================================
// AppState
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub stories: Arc<dyn StoryStore>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub prompts: Arc<dyn PromptService>,
    pub showing: Arc<dyn ShowingService>,
    pub outlines: Arc<dyn OutlineService>,
    pub licenses: Arc<dyn LicenseService>,
    pub orders: Arc<dyn OrderService>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub config: Arc<Config>,

    pub session: Mutex<WritingSession>,
    pub outline: Mutex<OutlineDraft>,
    pub license: Mutex<LicenseGate>,
    /// Unique transfer code added to the next order's price.
    pub order_code: Mutex<u32>,
    /// Cancelled on shutdown; in-flight remote calls are abandoned.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// A fresh state with an empty session and a locked license gate.
    pub fn new(ports: Ports, config: Arc<Config>) -> Self {
        Self {
            stories: ports.stories,
            preferences: ports.preferences,
            prompts: ports.prompts,
            showing: ports.showing,
            outlines: ports.outlines,
            licenses: ports.licenses,
            orders: ports.orders,
            renderer: ports.renderer,
            config,
            session: Mutex::new(WritingSession::new()),
            outline: Mutex::new(OutlineDraft::new()),
            license: Mutex::new(LicenseGate::new()),
            order_code: Mutex::new(new_order_code()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Builds the state and restores what the previous run left behind: the
    /// most recent story becomes the active session and a stored license key
    /// is validated again before anything is unlocked.
    pub async fn restore(ports: Ports, config: Arc<Config>) -> PortResult<Self> {
        let state = Self::new(ports, config);

        if let Some(latest) = state.stories.list_stories().await?.into_iter().next() {
            info!("Resuming story {}", latest.id);
            *state.session.lock().await = WritingSession::from_story(&latest);
        } else {
            info!("No stored stories, starting a new one.");
        }

        if let Some(key) = state.preferences.license_key().await? {
            if let Err(e) = state.check_license(key.as_str()).await {
                warn!("Stored license key could not be checked: {}", e);
            }
        }

        Ok(state)
    }

    /// Runs one license check and applies its verdict to the stored key.
    ///
    /// Returns `Ok(None)` when a newer check superseded this one before its
    /// answer arrived; the stored key is left alone in that case.
    pub async fn check_license(&self, raw_key: &str) -> PortResult<Option<LicenseVerdict>> {
        let check = self.license.lock().await.begin_check(raw_key)?;
        let mut guard = AbandonOnDrop {
            gate: &self.license,
            ticket: Some(check.ticket()),
        };

        let outcome = tokio::select! {
            _ = self.shutdown.cancelled() => Err(PortError::Cancelled),
            result = self.licenses.validate_license(&check.key) => result,
        };

        let verdict = {
            let mut gate = self.license.lock().await;
            guard.ticket = None;
            gate.finish_check(check, outcome)?
        };
        match &verdict {
            Some(verdict) => self.apply_verdict(verdict).await?,
            None => warn!("Discarding a superseded license check."),
        }
        Ok(verdict)
    }

    pub async fn apply_verdict(&self, verdict: &LicenseVerdict) -> PortResult<()> {
        match verdict {
            LicenseVerdict::Confirm(key) => {
                info!("License key confirmed.");
                self.preferences.set_license_key(Some(key)).await
            }
            LicenseVerdict::Reject => {
                warn!("License key rejected, clearing the stored key.");
                self.preferences.set_license_key(None).await
            }
        }
    }

    /// Draws a new unique transfer code for the next order.
    pub async fn refresh_order_code(&self) -> u32 {
        let code = new_order_code();
        *self.order_code.lock().await = code;
        code
    }
}

fn new_order_code() -> u32 {
    rand::thread_rng().gen_range(UNIQUE_CODE_RANGE)
}

/// Clears the gate's in-flight marker when a check is dropped before it
/// finishes, e.g. when the client disconnects.
struct AbandonOnDrop<'a> {
    gate: &'a Mutex<LicenseGate>,
    ticket: Option<Ticket>,
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            match self.gate.try_lock() {
                Ok(mut gate) => gate.abandon_check(ticket),
                Err(_) => warn!("License gate busy, leaving an abandoned check marked."),
            }
        }
    }
}
