//! What the active step shows and how the operator interacts with it.
//!
//! A [`StepView`] is rebuilt every time the wizard enters a step and fed the
//! [`StepMessage`]s of that activation. Key handling in the app is reduced to
//! a handful of semantic operations (move, cycle, activate, edit) that each
//! view interprets; anything that needs the service comes back as an
//! [`Action`] for the app to run.

mod forms;
mod keyboard;
mod progress;
mod restore;
mod spill;

pub use forms::{ConnectionView, LoginView};
pub use keyboard::KeyboardView;
pub use progress::{RestoreButton, RestoringView, SPEED_HISTORY};
pub use restore::{ConfigRestoreView, RestoreSection, ReviewView};
pub use spill::{SpillRow, SpillView};

use std::fmt;
use zeroize::Zeroizing;

use super::steps::StepMessage;
use super::steps::config_restore::RestoreMode;
use super::{BackupImage, LocalDisk, SpillSpace, WizardState, WizardStateProps};
use crate::api::ServerConnection;
use crate::vim::InputBuffer;

/// Operator requests the app turns into step calls.
pub enum Action {
    SelectLayout(String),
    SkipKeyboard,
    ConfigureServer,
    SubmitConnection(ServerConnection),
    ChangeConnection,
    Login {
        username: String,
        password: Zeroizing<String>,
    },
    SelectClient(String),
    SetMode(RestoreMode),
    Review {
        image: Option<BackupImage>,
        disk: Option<LocalDisk>,
    },
    TestSpill(Vec<String>),
    UseSpill(SpillSpace),
    Confirm,
    Back,
    Retry,
    RetryWithSpill,
    RestoreAnother,
    ConfigureSpill,
    Restart,
    /// Refused locally, shown as an inline error
    Reject(String),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SelectLayout(_) => "SelectLayout",
            Action::SkipKeyboard => "SkipKeyboard",
            Action::ConfigureServer => "ConfigureServer",
            Action::SubmitConnection(_) => "SubmitConnection",
            Action::ChangeConnection => "ChangeConnection",
            Action::Login { .. } => "Login",
            Action::SelectClient(_) => "SelectClient",
            Action::SetMode(_) => "SetMode",
            Action::Review { .. } => "Review",
            Action::TestSpill(_) => "TestSpill",
            Action::UseSpill(_) => "UseSpill",
            Action::Confirm => "Confirm",
            Action::Back => "Back",
            Action::Retry => "Retry",
            Action::RetryWithSpill => "RetryWithSpill",
            Action::RestoreAnother => "RestoreAnother",
            Action::ConfigureSpill => "ConfigureSpill",
            Action::Restart => "Restart",
            Action::Reject(_) => "Reject",
        }
    }
}

// Credentials stay out of debug output
impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::SelectLayout(layout) => f.debug_tuple("SelectLayout").field(layout).finish(),
            Action::SubmitConnection(conn) => f.debug_tuple("SubmitConnection").field(conn).finish(),
            Action::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .finish_non_exhaustive(),
            Action::SelectClient(client) => f.debug_tuple("SelectClient").field(client).finish(),
            Action::SetMode(mode) => f.debug_tuple("SetMode").field(mode).finish(),
            Action::TestSpill(paths) => f.debug_tuple("TestSpill").field(paths).finish(),
            Action::Reject(msg) => f.debug_tuple("Reject").field(msg).finish(),
            other => f.write_str(other.name()),
        }
    }
}

pub enum StepView {
    /// Nothing to interact with, the step works on its own
    Waiting(&'static str),
    Keyboard(KeyboardView),
    ServerSearch { no_local_server: bool },
    Connection(ConnectionView),
    WaitForConnection { service_error: bool },
    Login(LoginView),
    ConfigRestore(ConfigRestoreView),
    Spill(SpillView),
    Review(ReviewView),
    Restoring(RestoringView),
}

impl StepView {
    pub fn for_state(state: WizardState, props: &WizardStateProps) -> Self {
        match state {
            WizardState::Init => StepView::Waiting("Loading saved settings..."),
            WizardState::SelectKeyboard => StepView::Keyboard(KeyboardView::default()),
            WizardState::WaitForNetwork => StepView::Waiting("Waiting for network device..."),
            WizardState::ServerSearch => StepView::ServerSearch {
                no_local_server: false,
            },
            WizardState::ConfigureServerConnectionDetails => {
                StepView::Connection(ConnectionView::new(props))
            }
            WizardState::WaitForConnection => StepView::WaitForConnection {
                service_error: false,
            },
            WizardState::LoginToServer => StepView::Login(LoginView::new(props)),
            WizardState::ConfigRestore => StepView::ConfigRestore(ConfigRestoreView::new(props)),
            WizardState::ConfigSpillSpace => StepView::Spill(SpillView::default()),
            WizardState::ReviewRestore => StepView::Review(ReviewView::default()),
            WizardState::Restoring => StepView::Restoring(RestoringView::default()),
        }
    }

    /// Fold in a message of the current activation.
    pub fn apply(&mut self, message: StepMessage, props: &WizardStateProps) {
        match (self, message) {
            (StepView::Keyboard(view), StepMessage::Layouts(layouts)) => {
                view.set_layouts(layouts, &props.keyboard_layout);
            }
            (StepView::ServerSearch { no_local_server }, StepMessage::NoLocalServer) => {
                *no_local_server = true;
            }
            (StepView::WaitForConnection { service_error }, StepMessage::Error(_)) => {
                *service_error = true;
            }
            (StepView::WaitForConnection { service_error }, StepMessage::ClearError) => {
                *service_error = false;
            }
            (StepView::Login(view), StepMessage::ShowLoginForm) => view.show_form(),
            (StepView::ConfigRestore(view), StepMessage::Clients(clients)) => {
                view.set_clients(clients);
            }
            (StepView::ConfigRestore(view), StepMessage::Images(images)) => {
                view.set_images(images);
            }
            (StepView::ConfigRestore(view), StepMessage::Disks(disks)) => view.set_disks(disks),
            (StepView::Spill(view), StepMessage::SpillCandidates(candidates)) => {
                view.set_candidates(candidates);
            }
            (StepView::Spill(view), StepMessage::SpillTested(tested)) => view.apply_test(&tested),
            (StepView::Restoring(view), StepMessage::Restore(event)) => view.apply(event),
            _ => {}
        }
    }

    /// j/k
    pub fn move_cursor(&mut self, down: bool, props: &WizardStateProps) {
        match self {
            StepView::Keyboard(view) => view.move_cursor(down),
            StepView::Connection(view) => view.move_cursor(down),
            StepView::Login(view) => view.move_cursor(down),
            StepView::ConfigRestore(view) => view.move_cursor(down),
            StepView::Spill(view) => view.move_cursor(down),
            StepView::Review(view) => view.move_cursor(down),
            StepView::Restoring(view) => view.move_cursor(down, props.can_restore_spill),
            _ => {}
        }
    }

    /// Tab / Shift+Tab
    pub fn cycle_focus(&mut self, forward: bool, props: &WizardStateProps) {
        match self {
            StepView::ConfigRestore(view) => view.cycle_section(forward),
            _ => self.move_cursor(forward, props),
        }
    }

    /// The text field under the cursor, if any.
    pub fn input(&mut self) -> Option<&mut InputBuffer> {
        match self {
            StepView::Keyboard(view) => Some(&mut view.filter),
            StepView::Connection(view) => view.input(),
            StepView::Login(view) => view.input(),
            _ => None,
        }
    }

    pub fn has_input(&self) -> bool {
        match self {
            StepView::Keyboard(_) => true,
            StepView::Connection(view) => view.field < ConnectionView::SUBMIT,
            StepView::Login(view) => view.form_visible && view.field < LoginView::SUBMIT,
            _ => false,
        }
    }

    /// Typing directly into the list narrows it down.
    pub fn is_filterable(&self) -> bool {
        matches!(self, StepView::Keyboard(_))
    }

    pub fn input_changed(&mut self) {
        if let StepView::Keyboard(view) = self {
            view.filter_changed();
        }
    }

    /// Enter on a row or button.
    pub fn activate(&mut self, props: &WizardStateProps) -> Option<Action> {
        match self {
            StepView::Waiting(_) => None,
            StepView::Keyboard(view) => Some(view.choose()),
            StepView::ServerSearch { .. } => Some(Action::ConfigureServer),
            StepView::Connection(view) => Some(view.submit()),
            StepView::WaitForConnection { service_error } => {
                service_error.then_some(Action::ChangeConnection)
            }
            StepView::Login(view) => view.form_visible.then(|| view.submit()),
            StepView::ConfigRestore(view) => view.activate(),
            StepView::Spill(view) => view.activate(),
            StepView::Review(view) => Some(view.activate()),
            StepView::Restoring(view) => view.activate(props.can_restore_spill),
        }
    }

    /// Enter while typing: move to the next field, submitting after the last.
    pub fn submit_input(&mut self) -> Option<Action> {
        match self {
            StepView::Keyboard(view) => Some(view.choose()),
            StepView::Connection(view) => view.next_field(),
            StepView::Login(view) => view.next_field(),
            _ => None,
        }
    }

    /// Button offered by the restore view, if it is on screen.
    pub fn restore_button(&self, button: RestoreButton, props: &WizardStateProps) -> bool {
        match self {
            StepView::Restoring(view) => view.buttons(props.can_restore_spill).contains(&button),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::steps::RestoreEvent;

    #[test]
    fn every_state_has_a_view() {
        let props = WizardStateProps::default();
        assert!(matches!(
            StepView::for_state(WizardState::Init, &props),
            StepView::Waiting(_)
        ));
        assert!(matches!(
            StepView::for_state(WizardState::Restoring, &props),
            StepView::Restoring(_)
        ));
        assert!(StepView::for_state(WizardState::SelectKeyboard, &props).has_input());
        assert!(!StepView::for_state(WizardState::ReviewRestore, &props).has_input());
    }

    #[test]
    fn messages_for_other_steps_are_ignored() {
        let props = WizardStateProps::default();
        let mut view = StepView::for_state(WizardState::ServerSearch, &props);

        view.apply(StepMessage::Layouts(vec!["de".to_string()]), &props);
        view.apply(StepMessage::Restore(RestoreEvent::ImageDone), &props);
        assert!(matches!(
            view,
            StepView::ServerSearch {
                no_local_server: false
            }
        ));

        view.apply(StepMessage::NoLocalServer, &props);
        assert!(matches!(
            view,
            StepView::ServerSearch {
                no_local_server: true
            }
        ));
    }

    #[test]
    fn connection_errors_offer_reconfiguration() {
        let props = WizardStateProps::default();
        let mut view = StepView::for_state(WizardState::WaitForConnection, &props);
        assert!(view.activate(&props).is_none());

        view.apply(StepMessage::Error("Service not running".to_string()), &props);
        assert!(matches!(view.activate(&props), Some(Action::ChangeConnection)));
    }
}
