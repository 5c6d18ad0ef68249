use tracing::info;

use super::state::{WizardState, WizardStateProps};
use super::store::WizardStore;
use crate::error::{RestoreError, Result};

/// Steps listed in the sidebar, in wizard order.
pub const MENU: [WizardState; 10] = [
    WizardState::SelectKeyboard,
    WizardState::WaitForNetwork,
    WizardState::ServerSearch,
    WizardState::ConfigureServerConnectionDetails,
    WizardState::WaitForConnection,
    WizardState::LoginToServer,
    WizardState::ConfigRestore,
    WizardState::ConfigSpillSpace,
    WizardState::ReviewRestore,
    WizardState::Restoring,
];

/// A sidebar entry can be picked only if the wizard already got that far
/// and no restore is running.
pub fn is_enabled(step: WizardState, props: &WizardStateProps) -> bool {
    !props.disable_menu && step <= props.max_state
}

/// Jump to `step` from the sidebar. Progress tracking (`max_state`) is left
/// untouched so going back never loses how far the user got.
pub fn navigate(store: &WizardStore, step: WizardState) -> Result<bool> {
    let current = store.snapshot();
    if current.state == step {
        return Ok(false);
    }

    if !is_enabled(step, &current) {
        return Err(RestoreError::NavigationLocked(step));
    }

    info!("Menu navigation to {:?}", step);

    let mut locked = None;
    let changed = store.produce(|draft| {
        // Re-check against the snapshot we are actually mutating
        if !is_enabled(step, draft) {
            locked = Some(step);
            return;
        }
        draft.state = step;
    })?;

    match locked {
        Some(step) => Err(RestoreError::NavigationLocked(step)),
        None => Ok(changed),
    }
}

/// Index of `step` in [`MENU`], if it has an entry.
pub fn menu_index(step: WizardState) -> Option<usize> {
    MENU.iter().position(|s| *s == step)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_at(state: WizardState, max_state: WizardState) -> WizardStore {
        WizardStore::new(WizardStateProps {
            state,
            max_state,
            ..Default::default()
        })
    }

    #[test]
    fn cannot_jump_ahead_of_progress() {
        let store = store_at(WizardState::ServerSearch, WizardState::ServerSearch);

        for step in MENU {
            let result = navigate(&store, step);
            if step > WizardState::ServerSearch {
                assert!(matches!(result, Err(RestoreError::NavigationLocked(s)) if s == step));
                assert_eq!(store.snapshot().state, WizardState::ServerSearch);
            }
        }
    }

    #[test]
    fn going_back_keeps_max_state() {
        let store = store_at(WizardState::ConfigRestore, WizardState::ConfigRestore);

        assert!(navigate(&store, WizardState::SelectKeyboard).unwrap());
        let snap = store.snapshot();
        assert_eq!(snap.state, WizardState::SelectKeyboard);
        assert_eq!(snap.max_state, WizardState::ConfigRestore);

        // And forward again up to the recorded progress
        assert!(navigate(&store, WizardState::ConfigRestore).unwrap());
        assert_eq!(store.snapshot().state, WizardState::ConfigRestore);
    }

    #[test]
    fn menu_is_locked_while_restoring() {
        let store = WizardStore::new(WizardStateProps {
            state: WizardState::Restoring,
            max_state: WizardState::Restoring,
            disable_menu: true,
            ..Default::default()
        });

        for step in MENU {
            assert!(!is_enabled(step, &store.snapshot()));
        }
        assert!(navigate(&store, WizardState::ConfigRestore).is_err());
        assert_eq!(store.snapshot().state, WizardState::Restoring);
    }

    #[test]
    fn navigating_to_current_step_changes_nothing() {
        let store = store_at(WizardState::LoginToServer, WizardState::LoginToServer);
        assert!(!navigate(&store, WizardState::LoginToServer).unwrap());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn init_has_no_menu_entry() {
        assert_eq!(menu_index(WizardState::Init), None);
        assert_eq!(menu_index(WizardState::SelectKeyboard), Some(0));
        assert_eq!(menu_index(WizardState::Restoring), Some(MENU.len() - 1));
    }
}
