use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::router::{self, MENU};
use super::status_bar::StatusBarState;
use super::steps::{
    self, StepContext, StepEnvelope, StepMessage, config_restore, connection, keyboard, login,
    restoring, review, server_search, spill,
};
use super::view::{Action, RestoreButton, StepView};
use super::{WizardState, WizardStateProps, WizardStore};
use crate::api::RestoreApi;
use crate::config::WizardConfig;
use crate::error::RestoreError;
use crate::ui::Theme;
use crate::vim::{parse_command, Command, InputBuffer, ModeAction, VimMode};

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Which panel is focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    Sidebar,
    Content,
}

/// Inline message below the content panel
pub struct Message {
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    Quit,
    Restart,
}

/// Terminal front end of the wizard.
///
/// Owns the view of the active step and the [`StepContext`] its task runs
/// with. Whenever the store reports a different `state`, the old context is
/// cancelled and a new activation with a fresh generation starts; step
/// messages tagged with an older generation are dropped.
pub struct App {
    pub config: WizardConfig,
    pub theme: Theme,

    pub vim_mode: VimMode,
    pub command_buffer: InputBuffer,

    pub panel_focus: PanelFocus,
    pub sidebar_selected: usize,

    pub props: Arc<WizardStateProps>,
    pub view: StepView,

    pub busy: bool,
    pub message: Option<Message>,
    /// Transient status line of the step (connection state and the like)
    pub info: Option<String>,
    /// Blocking error; dismissing it returns to the connection settings
    pub modal: Option<String>,
    pub confirm_action: Option<ConfirmAction>,
    pub show_help: bool,
    pub should_exit: bool,
    pub status_bar: StatusBarState,

    spinner_frame: usize,

    api: Arc<dyn RestoreApi>,
    store: WizardStore,
    tx: mpsc::UnboundedSender<StepEnvelope>,
    generation: u64,
    active: Option<StepContext>,
    active_state: Option<WizardState>,
}

impl App {
    /// The returned receiver carries the messages of all step tasks; feed
    /// them back through [`App::handle_step`].
    pub fn new(
        config: WizardConfig,
        api: Arc<dyn RestoreApi>,
        store: WizardStore,
    ) -> (Self, mpsc::UnboundedReceiver<StepEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let props = store.snapshot();
        let view = StepView::for_state(props.state, &props);

        let app = Self {
            config,
            theme: Theme::default(),
            vim_mode: VimMode::Normal,
            command_buffer: InputBuffer::new(),
            panel_focus: PanelFocus::Content,
            sidebar_selected: 0,
            props,
            view,
            busy: false,
            message: None,
            info: None,
            modal: None,
            confirm_action: None,
            show_help: false,
            should_exit: false,
            status_bar: StatusBarState::waiting(),
            spinner_frame: 0,
            api,
            store,
            tx,
            generation: 0,
            active: None,
            active_state: None,
        };
        (app, rx)
    }

    pub fn store(&self) -> &WizardStore {
        &self.store
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn spinner(&self) -> char {
        SPINNER[self.spinner_frame % SPINNER.len()]
    }

    pub fn tick(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            is_error: true,
        });
    }

    pub fn set_info(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            is_error: false,
        });
    }

    /// Pick up the latest snapshot, starting the step task if the wizard
    /// moved to another step.
    pub fn sync(&mut self) {
        let props = self.store.snapshot();
        let state = props.state;
        self.props = props;

        if self.active_state != Some(state) {
            self.activate(state);
        }
        self.update_status_bar();
    }

    fn activate(&mut self, state: WizardState) {
        if let Some(previous) = self.active.take() {
            previous.cancel();
        }
        self.generation += 1;
        info!("Activating {:?} (generation {})", state, self.generation);

        self.view = StepView::for_state(state, &self.props);
        self.active_state = Some(state);
        self.busy = false;
        self.message = None;
        self.info = None;
        self.modal = None;
        self.vim_mode = VimMode::Normal;
        self.panel_focus = PanelFocus::Content;
        if let Some(idx) = router::menu_index(state) {
            self.sidebar_selected = idx;
        }

        let ctx = StepContext::new(
            self.api.clone(),
            self.store.clone(),
            self.tx.clone(),
            self.generation,
            self.config.polling.clone(),
        );
        steps::enter(state, ctx.clone());
        self.active = Some(ctx);
    }

    /// Apply a step message. Returns `false` if it belongs to an activation
    /// that already ended.
    pub fn handle_step(&mut self, envelope: StepEnvelope) -> bool {
        if envelope.generation != self.generation {
            debug!(
                "Dropping {:?} of stale activation {}",
                envelope.message, envelope.generation
            );
            return false;
        }

        match envelope.message {
            StepMessage::Busy(busy) => self.busy = busy,
            StepMessage::Error(text) => {
                self.set_error(text.clone());
                self.view.apply(StepMessage::Error(text), &self.props);
            }
            StepMessage::ClearError => {
                if self.message.as_ref().is_some_and(|m| m.is_error) {
                    self.message = None;
                }
                self.view.apply(StepMessage::ClearError, &self.props);
            }
            StepMessage::Info(text) => {
                self.info = (!text.is_empty()).then_some(text);
            }
            StepMessage::ConnectionFailed(text) => {
                warn!("Connection failed: {}", text);
                self.modal = Some(text);
                self.vim_mode = VimMode::Normal;
            }
            other => self.view.apply(other, &self.props),
        }

        self.update_status_bar();
        true
    }

    /// Run an operator action on the active step.
    pub fn perform(&mut self, action: Action) {
        let Some(ctx) = self.active.clone() else {
            warn!("{} requested without an active step", action.name());
            return;
        };
        debug!("Performing {:?} in {:?}", action, self.props.state);

        let _task = match action {
            Action::Reject(text) => {
                self.set_error(text);
                return;
            }
            Action::SelectLayout(layout) => tokio::spawn(keyboard::select(ctx, layout)),
            Action::SkipKeyboard => tokio::spawn(keyboard::skip(ctx)),
            Action::ConfigureServer => tokio::spawn(server_search::configure_manually(ctx)),
            Action::SubmitConnection(conn) => tokio::spawn(connection::submit(ctx, conn)),
            Action::ChangeConnection => tokio::spawn(connection::change_configuration(ctx)),
            Action::Login { username, password } => {
                tokio::spawn(login::submit(ctx, username, password))
            }
            Action::SelectClient(client) => tokio::spawn(config_restore::select_client(ctx, client)),
            Action::SetMode(mode) => tokio::spawn(config_restore::set_mode(ctx, mode)),
            Action::Review { image, disk } => tokio::spawn(config_restore::review(ctx, image, disk)),
            Action::TestSpill(paths) => tokio::spawn(spill::test(ctx, paths)),
            Action::UseSpill(space) => tokio::spawn(spill::use_space(ctx, space)),
            Action::Confirm => tokio::spawn(review::confirm(ctx)),
            Action::Back => tokio::spawn(review::back(ctx)),
            Action::Retry => tokio::spawn(restoring::retry(ctx)),
            Action::RetryWithSpill => tokio::spawn(restoring::run(ctx, true)),
            Action::RestoreAnother => tokio::spawn(restoring::restore_another(ctx)),
            Action::ConfigureSpill => tokio::spawn(restoring::configure_spill_space(ctx)),
            Action::Restart => tokio::spawn(restoring::restart_machine(ctx)),
        };
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.confirm_action = Some(ConfirmAction::Quit);
            return None;
        }

        if self.modal.is_some() {
            let result = self.handle_modal_key(key);
            self.update_status_bar();
            return result;
        }

        if let Some(action) = self.confirm_action {
            let result = self.handle_confirm_key(key, action);
            self.update_status_bar();
            return result;
        }

        if self.show_help {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?')
            ) {
                self.show_help = false;
            }
            return None;
        }

        // Any key dismisses the inline message
        self.message = None;

        let result = match self.vim_mode {
            VimMode::Normal => self.handle_normal_mode(key),
            VimMode::Insert => self.handle_insert_mode(key),
            VimMode::Command => self.handle_command_mode(key),
        };

        self.update_status_bar();
        result
    }

    fn handle_modal_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') | KeyCode::Char('q') => {
                self.modal = None;
                Some(Action::ChangeConnection)
            }
            _ => None,
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent, action: ConfirmAction) -> Option<Action> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.confirm_action = None;
                match action {
                    ConfirmAction::Quit => {
                        info!("Quit confirmed");
                        self.should_exit = true;
                        None
                    }
                    ConfirmAction::Restart => Some(Action::Restart),
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm_action = None;
                None
            }
            _ => None,
        }
    }

    fn handle_normal_mode(&mut self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('h') => self.focus_sidebar(),
                KeyCode::Char('l') => self.focus_content(),
                _ => {}
            }
            return None;
        }

        match key.code {
            KeyCode::Char(':') => {
                self.command_buffer.clear();
                self.vim_mode = self.vim_mode.transition(ModeAction::EnterCommand);
                None
            }
            KeyCode::Char('?') | KeyCode::F(1) => {
                self.show_help = true;
                None
            }
            _ => match self.panel_focus {
                PanelFocus::Sidebar => {
                    self.handle_sidebar_key(key);
                    None
                }
                PanelFocus::Content => self.handle_content_key(key),
            },
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.sidebar_selected + 1 < MENU.len() {
                    self.sidebar_selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.sidebar_selected = self.sidebar_selected.saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
                self.open_step(MENU[self.sidebar_selected]);
            }
            KeyCode::Tab => self.focus_content(),
            // Quick select: 1-9, 0 for the tenth entry
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let idx = match c.to_digit(10) {
                    Some(0) => 9,
                    Some(d) => d as usize - 1,
                    None => return,
                };
                if let Some(step) = MENU.get(idx) {
                    self.sidebar_selected = idx;
                    self.open_step(*step);
                }
            }
            _ => {}
        }
    }

    fn handle_content_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.view.move_cursor(true, &self.props),
            KeyCode::Char('k') | KeyCode::Up => self.view.move_cursor(false, &self.props),
            KeyCode::Tab => self.view.cycle_focus(true, &self.props),
            KeyCode::BackTab => self.view.cycle_focus(false, &self.props),
            KeyCode::Char('h') | KeyCode::Left | KeyCode::Esc => self.focus_sidebar(),
            KeyCode::Char('i') | KeyCode::Char('a') | KeyCode::Char('/')
                if self.view.has_input() =>
            {
                self.vim_mode = self.vim_mode.transition(ModeAction::EnterInsert);
            }
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right | KeyCode::Char(' ') => {
                return self.activate_content();
            }
            KeyCode::Char(c) if self.view.is_filterable() && c.is_alphanumeric() => {
                self.vim_mode = self.vim_mode.transition(ModeAction::EnterInsert);
                self.edit_input(|buffer| buffer.insert(c));
            }
            _ => {}
        }
        None
    }

    fn activate_content(&mut self) -> Option<Action> {
        if self.busy {
            return None;
        }

        if self.view.has_input() && !self.view.is_filterable() {
            self.vim_mode = self.vim_mode.transition(ModeAction::EnterInsert);
            return None;
        }

        match self.view.activate(&self.props) {
            Some(Action::Restart) => {
                self.confirm_action = Some(ConfirmAction::Restart);
                None
            }
            other => other,
        }
    }

    fn handle_insert_mode(&mut self, key: KeyEvent) -> Option<Action> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => {
                self.vim_mode = self.vim_mode.transition(ModeAction::Escape);
            }
            KeyCode::Enter => {
                if self.busy {
                    return None;
                }
                let action = self.view.submit_input();
                if !self.view.has_input() {
                    self.vim_mode = self.vim_mode.transition(ModeAction::Escape);
                }
                return action;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.view
                    .cycle_focus(key.code == KeyCode::Tab, &self.props);
                if !self.view.has_input() {
                    self.vim_mode = self.vim_mode.transition(ModeAction::Escape);
                }
            }
            KeyCode::Down => self.view.move_cursor(true, &self.props),
            KeyCode::Up => self.view.move_cursor(false, &self.props),
            KeyCode::Backspace => self.edit_input(|b| {
                b.delete_back();
            }),
            KeyCode::Delete => self.edit_input(|b| {
                b.delete_forward();
            }),
            KeyCode::Left => self.move_input(InputBuffer::move_left),
            KeyCode::Right => self.move_input(InputBuffer::move_right),
            KeyCode::Home => self.move_input(InputBuffer::move_start),
            KeyCode::End => self.move_input(InputBuffer::move_end),
            KeyCode::Char('u') if ctrl => self.edit_input(InputBuffer::clear),
            KeyCode::Char('a') if ctrl => self.move_input(InputBuffer::move_start),
            KeyCode::Char('e') if ctrl => self.move_input(InputBuffer::move_end),
            KeyCode::Char('h') if ctrl => self.edit_input(|b| {
                b.delete_back();
            }),
            KeyCode::Char(c) if !ctrl => self.edit_input(|b| b.insert(c)),
            _ => {}
        }
        None
    }

    fn handle_command_mode(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.command_buffer.clear();
                self.vim_mode = self.vim_mode.transition(ModeAction::Escape);
            }
            KeyCode::Enter => {
                let input = self.command_buffer.content().to_string();
                self.command_buffer.clear();
                self.vim_mode = self.vim_mode.transition(ModeAction::Execute);
                return self.execute_command(&input);
            }
            KeyCode::Backspace => {
                if !self.command_buffer.delete_back() {
                    self.vim_mode = self.vim_mode.transition(ModeAction::Escape);
                }
            }
            KeyCode::Left => self.command_buffer.move_left(),
            KeyCode::Right => self.command_buffer.move_right(),
            KeyCode::Char(c) => self.command_buffer.insert(c),
            _ => {}
        }
        None
    }

    fn execute_command(&mut self, input: &str) -> Option<Action> {
        let command = match parse_command(input) {
            Ok(command) => command,
            Err(e) => {
                self.set_error(e.to_string());
                return None;
            }
        };

        let state = self.props.state;
        match command {
            Command::Skip if state == WizardState::SelectKeyboard => Some(Action::SkipKeyboard),
            Command::Skip => {
                self.set_error("Nothing to skip in this step");
                None
            }
            Command::Back if state == WizardState::ReviewRestore => Some(Action::Back),
            Command::Back => {
                match router::menu_index(state).and_then(|i| i.checked_sub(1)) {
                    Some(idx) => self.open_step(MENU[idx]),
                    None => self.set_error("This is the first step"),
                }
                None
            }
            Command::Retry => self.restore_command(&[RestoreButton::Retry]),
            Command::Another => self.restore_command(&[RestoreButton::RestoreAnother]),
            Command::Spill => self.restore_command(&[
                RestoreButton::ConfigureSpill,
                RestoreButton::RetryWithSpill,
            ]),
            Command::Restart => {
                if self.view.restore_button(RestoreButton::Restart, &self.props) {
                    self.confirm_action = Some(ConfirmAction::Restart);
                } else {
                    self.set_error("Restart is offered once the restore finished");
                }
                None
            }
            Command::Help => {
                self.show_help = true;
                None
            }
            Command::Quit => {
                self.confirm_action = Some(ConfirmAction::Quit);
                None
            }
        }
    }

    /// Press the first of `buttons` the restore view currently offers.
    fn restore_command(&mut self, buttons: &[RestoreButton]) -> Option<Action> {
        let offered = buttons
            .iter()
            .copied()
            .find(|b| self.view.restore_button(*b, &self.props));

        if let (Some(button), StepView::Restoring(view)) = (offered, &mut self.view) {
            return Some(view.press(button));
        }

        self.set_error(format!(
            "{} is not available right now",
            buttons.first().map(|b| b.label()).unwrap_or("Command")
        ));
        None
    }

    fn open_step(&mut self, step: WizardState) {
        match router::navigate(&self.store, step) {
            Ok(_) => {
                self.sync();
                self.focus_content();
            }
            Err(RestoreError::NavigationLocked(_)) if self.props.disable_menu => {
                self.set_error("The menu is locked while the restore is running");
            }
            Err(RestoreError::NavigationLocked(_)) => {
                self.set_error("This step is locked. Complete previous steps first.");
            }
            Err(e) => {
                warn!("Navigation to {:?} failed: {}", step, e);
                self.set_error(e.to_string());
            }
        }
    }

    fn focus_sidebar(&mut self) {
        self.panel_focus = PanelFocus::Sidebar;
        self.vim_mode = VimMode::Normal;
    }

    fn focus_content(&mut self) {
        self.panel_focus = PanelFocus::Content;
    }

    fn edit_input<F: FnOnce(&mut InputBuffer)>(&mut self, f: F) {
        if let Some(buffer) = self.view.input() {
            f(buffer);
            self.view.input_changed();
        }
    }

    fn move_input<F: FnOnce(&mut InputBuffer)>(&mut self, f: F) {
        if let Some(buffer) = self.view.input() {
            f(buffer);
        }
    }

    fn update_status_bar(&mut self) {
        self.status_bar = if self.modal.is_some() {
            StatusBarState::modal()
        } else if self.vim_mode == VimMode::Command {
            StatusBarState::command_mode()
        } else if self.panel_focus == PanelFocus::Sidebar {
            StatusBarState::sidebar()
        } else {
            match &self.view {
                StepView::Keyboard(_) if self.vim_mode == VimMode::Insert => {
                    StatusBarState::picker_insert()
                }
                StepView::Keyboard(_) => StatusBarState::picker_normal(),
                StepView::Connection(_) | StepView::Login(_)
                    if self.vim_mode == VimMode::Insert =>
                {
                    StatusBarState::form_insert()
                }
                StepView::Connection(_) => StatusBarState::form_normal(),
                StepView::Login(view) if view.form_visible => StatusBarState::form_normal(),
                StepView::ConfigRestore(_) => StatusBarState::lists(),
                StepView::Restoring(view)
                    if view.buttons(self.props.can_restore_spill).is_empty() =>
                {
                    StatusBarState::restoring()
                }
                StepView::Spill(_)
                | StepView::Review(_)
                | StepView::Restoring(_)
                | StepView::ServerSearch { .. } => StatusBarState::buttons(),
                StepView::WaitForConnection {
                    service_error: true,
                } => StatusBarState::buttons(),
                _ => StatusBarState::waiting(),
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::steps::testing::ScriptedApi;
    use crate::wizard::steps::RestoreEvent;
    use crate::wizard::{BackupImage, LocalDisk};

    fn app_at(state: WizardState, max_state: WizardState) -> App {
        let store = WizardStore::new(WizardStateProps {
            state,
            max_state,
            ..Default::default()
        });
        let api: Arc<dyn RestoreApi> = Arc::new(ScriptedApi::default());
        let (mut app, _rx) = App::new(WizardConfig::default(), api, store);
        app.sync();
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) -> Option<Action> {
        let mut last = None;
        for c in text.chars() {
            last = app.handle_key(key(KeyCode::Char(c)));
        }
        last
    }

    fn envelope(generation: u64, message: StepMessage) -> StepEnvelope {
        StepEnvelope {
            generation,
            message,
        }
    }

    #[tokio::test]
    async fn stale_messages_are_dropped() {
        let mut app = app_at(WizardState::SelectKeyboard, WizardState::SelectKeyboard);
        let first = app.generation();

        app.store()
            .produce(|d| d.advance_to(WizardState::WaitForNetwork))
            .unwrap();
        app.sync();
        assert_eq!(app.generation(), first + 1);

        assert!(!app.handle_step(envelope(first, StepMessage::Busy(true))));
        assert!(!app.busy);

        assert!(app.handle_step(envelope(first + 1, StepMessage::Busy(true))));
        assert!(app.busy);
    }

    #[tokio::test]
    async fn syncing_the_same_state_keeps_the_activation() {
        let mut app = app_at(WizardState::SelectKeyboard, WizardState::SelectKeyboard);
        let generation = app.generation();
        app.store()
            .produce(|d| d.keyboard_layout = "de".to_string())
            .unwrap();
        app.sync();
        assert_eq!(app.generation(), generation);
        assert_eq!(app.props.keyboard_layout, "de");
    }

    #[tokio::test]
    async fn sidebar_respects_progress() {
        let mut app = app_at(WizardState::ConfigRestore, WizardState::ConfigRestore);
        app.handle_key(ctrl('h'));
        assert_eq!(app.panel_focus, PanelFocus::Sidebar);

        // Review is beyond the furthest step reached
        app.handle_key(key(KeyCode::Char('9')));
        assert!(app.message.as_ref().is_some_and(|m| m.is_error));
        assert_eq!(app.store().snapshot().state, WizardState::ConfigRestore);

        app.handle_key(ctrl('h'));
        app.handle_key(key(KeyCode::Char('1')));
        let props = app.store().snapshot();
        assert_eq!(props.state, WizardState::SelectKeyboard);
        assert_eq!(props.max_state, WizardState::ConfigRestore);
        assert!(matches!(app.view, StepView::Keyboard(_)));
        assert_eq!(app.panel_focus, PanelFocus::Content);
    }

    #[tokio::test]
    async fn menu_is_locked_while_restoring() {
        let store = WizardStore::new(WizardStateProps {
            state: WizardState::Restoring,
            max_state: WizardState::Restoring,
            disable_menu: true,
            restore_image: Some(BackupImage {
                id: 1,
                ..Default::default()
            }),
            restore_to_disk: Some(LocalDisk {
                path: "/dev/sdb".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        });
        let api: Arc<dyn RestoreApi> = Arc::new(ScriptedApi::default());
        let (mut app, _rx) = App::new(WizardConfig::default(), api, store);
        app.sync();

        app.handle_key(ctrl('h'));
        app.handle_key(key(KeyCode::Char('7')));
        assert_eq!(
            app.message.as_ref().map(|m| m.text.as_str()),
            Some("The menu is locked while the restore is running")
        );
        assert_eq!(app.store().snapshot().state, WizardState::Restoring);
    }

    #[tokio::test]
    async fn connection_modal_leads_back_to_settings() {
        let mut app = app_at(WizardState::WaitForConnection, WizardState::WaitForConnection);
        let generation = app.generation();
        app.handle_step(envelope(
            generation,
            StepMessage::ConnectionFailed("Connecting to server failed: timeout".to_string()),
        ));
        assert!(app.modal.is_some());

        assert!(app.handle_key(key(KeyCode::Char('x'))).is_none());
        assert!(app.modal.is_some());

        assert!(matches!(
            app.handle_key(key(KeyCode::Enter)),
            Some(Action::ChangeConnection)
        ));
        assert!(app.modal.is_none());
    }

    #[tokio::test]
    async fn typing_filters_keyboard_layouts() {
        let mut app = app_at(WizardState::SelectKeyboard, WizardState::SelectKeyboard);
        let generation = app.generation();
        app.handle_step(envelope(
            generation,
            StepMessage::Layouts(vec!["us".to_string(), "de".to_string()]),
        ));

        type_text(&mut app, "d");
        assert_eq!(app.vim_mode, VimMode::Insert);
        match &app.view {
            StepView::Keyboard(view) => assert_eq!(view.filtered(), vec!["de"]),
            _ => panic!("keyboard view expected"),
        }

        assert!(matches!(
            app.handle_key(key(KeyCode::Enter)),
            Some(Action::SelectLayout(l)) if l == "de"
        ));
    }

    #[tokio::test]
    async fn commands() {
        let mut app = app_at(WizardState::SelectKeyboard, WizardState::SelectKeyboard);

        type_text(&mut app, ":skip");
        assert_eq!(app.vim_mode, VimMode::Command);
        assert!(matches!(
            app.handle_key(key(KeyCode::Enter)),
            Some(Action::SkipKeyboard)
        ));
        assert_eq!(app.vim_mode, VimMode::Normal);

        type_text(&mut app, ":retry");
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());
        assert!(app.message.as_ref().is_some_and(|m| m.is_error));

        type_text(&mut app, ":q");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.confirm_action, Some(ConfirmAction::Quit));
        app.handle_key(key(KeyCode::Char('y')));
        assert!(app.should_exit);
    }

    #[tokio::test]
    async fn restart_asks_first() {
        let mut app = app_at(WizardState::Restoring, WizardState::Restoring);
        let generation = app.generation();
        app.handle_step(envelope(
            generation,
            StepMessage::Restore(RestoreEvent::ImageDone),
        ));

        app.handle_key(key(KeyCode::Char('j')));
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());
        assert_eq!(app.confirm_action, Some(ConfirmAction::Restart));

        assert!(matches!(
            app.handle_key(key(KeyCode::Char('y'))),
            Some(Action::Restart)
        ));
    }

    #[tokio::test]
    async fn connection_form_by_keyboard() {
        let mut app = app_at(
            WizardState::ConfigureServerConnectionDetails,
            WizardState::ConfigureServerConnectionDetails,
        );

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.vim_mode, VimMode::Insert);
        type_text(&mut app, "urbackup://srv");
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());
        type_text(&mut app, "key");
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());

        match app.handle_key(key(KeyCode::Enter)) {
            Some(Action::SubmitConnection(conn)) => {
                assert_eq!(conn.url, "urbackup://srv");
                assert_eq!(conn.authkey, "key");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(app.vim_mode, VimMode::Normal);
    }

    #[tokio::test]
    async fn rejected_actions_become_errors() {
        let mut app = app_at(WizardState::ConfigRestore, WizardState::ConfigRestore);
        app.perform(Action::Reject("Please select an image to restore".to_string()));
        assert_eq!(
            app.message.as_ref().map(|m| m.text.as_str()),
            Some("Please select an image to restore")
        );
    }
}
