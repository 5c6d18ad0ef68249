use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info};

use super::state::WizardStateProps;
use crate::error::{RestoreError, Result};

/// Single source of truth for the wizard.
///
/// Snapshots are immutable `Arc`s. Every change copies the current snapshot,
/// applies the mutation to the copy and publishes it in one step while the
/// channel's write lock is held, so readers only ever see whole transitions.
#[derive(Clone)]
pub struct WizardStore {
    tx: Arc<watch::Sender<Arc<WizardStateProps>>>,
    revision: Arc<AtomicU64>,
}

impl Default for WizardStore {
    fn default() -> Self {
        Self::new(WizardStateProps::default())
    }
}

impl WizardStore {
    pub fn new(initial: WizardStateProps) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self {
            tx: Arc::new(tx),
            revision: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<WizardStateProps> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<WizardStateProps>> {
        self.tx.subscribe()
    }

    /// Number of snapshots published since creation
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Replace the snapshot with `next`.
    ///
    /// Returns `Ok(false)` without notifying anyone when `next` equals the
    /// current snapshot.
    pub fn update(&self, next: WizardStateProps) -> Result<bool> {
        self.produce(move |draft| *draft = next)
    }

    /// Copy the current snapshot, let `f` mutate the copy, then publish it.
    pub fn produce<F>(&self, f: F) -> Result<bool>
    where
        F: FnOnce(&mut WizardStateProps),
    {
        let mut outcome = Ok(false);

        self.tx.send_if_modified(|current| {
            let mut draft = WizardStateProps::clone(&**current);
            f(&mut draft);

            if draft == **current {
                return false;
            }

            if draft.state > draft.max_state {
                outcome = Err(RestoreError::InvalidTransition {
                    state: draft.state,
                    max_state: draft.max_state,
                });
                return false;
            }

            if draft.state != current.state {
                info!("Wizard state {:?} -> {:?}", current.state, draft.state);
            } else {
                debug!("Wizard props updated in {:?}", draft.state);
            }

            *current = Arc::new(draft);
            self.revision.fetch_add(1, Ordering::SeqCst);
            outcome = Ok(true);
            true
        });

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::WizardState;

    #[test]
    fn starts_at_init() {
        let store = WizardStore::default();
        let snap = store.snapshot();
        assert_eq!(snap.state, WizardState::Init);
        assert_eq!(snap.max_state, WizardState::Init);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn identical_update_is_a_noop() {
        let store = WizardStore::default();
        let rx = store.subscribe();

        let same = WizardStateProps::clone(&store.snapshot());
        assert!(!store.update(same).unwrap());
        assert_eq!(store.revision(), 0);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn produce_publishes_a_new_snapshot() {
        let store = WizardStore::default();
        let before = store.snapshot();

        let changed = store
            .produce(|draft| draft.advance_to(WizardState::SelectKeyboard))
            .unwrap();

        assert!(changed);
        assert_eq!(before.state, WizardState::Init);
        assert_eq!(store.snapshot().state, WizardState::SelectKeyboard);
        assert_eq!(store.snapshot().max_state, WizardState::SelectKeyboard);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn state_beyond_max_state_is_rejected() {
        let store = WizardStore::default();
        let err = store
            .produce(|draft| draft.state = WizardState::ConfigRestore)
            .unwrap_err();

        assert!(matches!(err, RestoreError::InvalidTransition { .. }));
        assert_eq!(store.snapshot().state, WizardState::Init);
        assert_eq!(store.revision(), 0);
    }

    #[tokio::test]
    async fn subscribers_see_whole_snapshots() {
        let store = WizardStore::default();
        let mut rx = store.subscribe();

        store
            .produce(|draft| {
                draft.keyboard_layout = "de".to_string();
                draft.advance_to(WizardState::WaitForNetwork);
            })
            .unwrap();

        rx.changed().await.unwrap();
        let seen = rx.borrow().clone();
        assert_eq!(seen.keyboard_layout, "de");
        assert_eq!(seen.state, WizardState::WaitForNetwork);
    }
}
