//! Network side of every wizard step.
//!
//! Each time the wizard enters a step the app spawns that step's entry task
//! with a fresh [`StepContext`]. Leaving the step cancels the context; tasks
//! check the flag after every request or sleep and stop without touching the
//! store or the view once it is set.

pub mod bootstrap;
pub mod config_restore;
pub mod connection;
pub mod keyboard;
pub mod login;
pub mod network;
pub mod restoring;
pub mod review;
pub mod server_search;
pub mod spill;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::state::{BackupImage, LocalDisk, WizardState, WizardStateProps};
use super::store::WizardStore;
use crate::api::{RestoreApi, SpillDisks, TestedDisk};
use crate::config::PollingConfig;

pub use restoring::RestoreEvent;

/// Set once when the step that owns it is left.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// View changes reported by step tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum StepMessage {
    Busy(bool),
    /// Inline error banner
    Error(String),
    ClearError,
    /// Informational line (transient connection states and the like)
    Info(String),
    Layouts(Vec<String>),
    NoLocalServer,
    /// Blocking dialog; dismissing it returns to connection settings
    ConnectionFailed(String),
    ShowLoginForm,
    Clients(Vec<String>),
    Images(Vec<BackupImage>),
    Disks(Vec<LocalDisk>),
    SpillCandidates(SpillDisks),
    SpillTested(Vec<TestedDisk>),
    Restore(RestoreEvent),
}

/// A [`StepMessage`] tagged with the activation that produced it.
#[derive(Debug, Clone)]
pub struct StepEnvelope {
    pub generation: u64,
    pub message: StepMessage,
}

/// Everything a step task may touch during one activation.
#[derive(Clone)]
pub struct StepContext {
    api: Arc<dyn RestoreApi>,
    store: WizardStore,
    cancel: CancelFlag,
    tx: mpsc::UnboundedSender<StepEnvelope>,
    generation: u64,
    polling: PollingConfig,
}

impl StepContext {
    pub fn new(
        api: Arc<dyn RestoreApi>,
        store: WizardStore,
        tx: mpsc::UnboundedSender<StepEnvelope>,
        generation: u64,
        polling: PollingConfig,
    ) -> Self {
        Self {
            api,
            store,
            cancel: CancelFlag::new(),
            tx,
            generation,
            polling,
        }
    }

    pub fn api(&self) -> &dyn RestoreApi {
        self.api.as_ref()
    }

    pub fn props(&self) -> Arc<WizardStateProps> {
        self.store.snapshot()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Poll ceiling for the connection steps
    pub fn attempts(&self) -> u32 {
        self.polling.connection_attempts
    }

    /// Report a view change. Returns `false` once the step was left.
    pub fn emit(&self, message: StepMessage) -> bool {
        if self.is_cancelled() {
            debug!("Dropping {:?} from cancelled step", message);
            return false;
        }

        // The receiver is gone only while the app shuts down
        let _ = self.tx.send(StepEnvelope {
            generation: self.generation,
            message,
        });
        true
    }

    /// Publish a new snapshot unless the step was left in the meantime.
    pub fn transition<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut WizardStateProps),
    {
        if self.is_cancelled() {
            return false;
        }

        match self.store.produce(f) {
            Ok(_) => true,
            Err(e) => {
                warn!("Rejected wizard update: {}", e);
                false
            }
        }
    }

    /// Wait one poll interval. Returns `false` if the step was left.
    pub async fn pause(&self) -> bool {
        tokio::time::sleep(self.polling.interval()).await;
        !self.is_cancelled()
    }
}

/// Start the entry task of the step `ctx` was created for. Steps that only
/// wait for user input have none.
pub fn enter(state: WizardState, ctx: StepContext) -> Option<JoinHandle<()>> {
    info!("Entering step {:?} (activation {})", state, ctx.generation());

    let handle = match state {
        WizardState::Init => tokio::spawn(bootstrap::run(ctx)),
        WizardState::SelectKeyboard => tokio::spawn(keyboard::load(ctx)),
        WizardState::WaitForNetwork => tokio::spawn(network::wait(ctx)),
        WizardState::ServerSearch => tokio::spawn(server_search::run(ctx)),
        WizardState::WaitForConnection => tokio::spawn(connection::wait(ctx)),
        WizardState::LoginToServer => tokio::spawn(login::try_anonymous(ctx)),
        WizardState::ConfigRestore => tokio::spawn(config_restore::load(ctx)),
        WizardState::ConfigSpillSpace => tokio::spawn(spill::load(ctx)),
        WizardState::Restoring => tokio::spawn(restoring::run(ctx, false)),
        WizardState::ConfigureServerConnectionDetails | WizardState::ReviewRestore => {
            return None;
        }
    };

    Some(handle)
}

#[cfg(test)]
mod tests {
    use super::testing::harness;
    use super::*;

    #[tokio::test]
    async fn cancelled_context_stays_silent() {
        let (ctx, mut rx, _api) = harness(WizardStateProps::default());

        assert!(ctx.emit(StepMessage::Busy(true)));
        ctx.cancel();
        assert!(!ctx.emit(StepMessage::Busy(false)));
        assert!(!ctx.transition(|d| d.advance_to(WizardState::SelectKeyboard)));

        assert_eq!(rx.recv().await.unwrap().message, StepMessage::Busy(true));
        assert!(rx.try_recv().is_err());
        assert_eq!(ctx.props().state, WizardState::Init);
    }

    #[tokio::test]
    async fn rejected_transition_reports_false() {
        let (ctx, _rx, _api) = harness(WizardStateProps::default());
        assert!(!ctx.transition(|d| d.state = WizardState::Restoring));
        assert_eq!(ctx.props().state, WizardState::Init);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_reports_cancellation() {
        let (ctx, _rx, _api) = harness(WizardStateProps::default());
        assert!(ctx.pause().await);
        ctx.cancel();
        assert!(!ctx.pause().await);
    }
}
