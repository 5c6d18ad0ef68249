use super::Action;
use crate::api::ServerConnection;
use crate::vim::InputBuffer;
use crate::wizard::WizardStateProps;

/// Internet server settings: URL, auth key and optional proxy, followed by
/// the submit button.
pub struct ConnectionView {
    pub url: InputBuffer,
    pub authkey: InputBuffer,
    pub proxy: InputBuffer,
    pub field: usize,
}

impl ConnectionView {
    pub const SUBMIT: usize = 3;

    pub fn new(props: &WizardStateProps) -> Self {
        let mut authkey = InputBuffer::masked();
        authkey.set(&props.server_authkey);

        Self {
            url: InputBuffer::with_value(&props.server_url),
            authkey,
            proxy: InputBuffer::with_value(&props.server_proxy),
            field: 0,
        }
    }

    pub fn input(&mut self) -> Option<&mut InputBuffer> {
        match self.field {
            0 => Some(&mut self.url),
            1 => Some(&mut self.authkey),
            2 => Some(&mut self.proxy),
            _ => None,
        }
    }

    pub fn move_cursor(&mut self, down: bool) {
        self.field = step_field(self.field, down, Self::SUBMIT);
    }

    pub fn next_field(&mut self) -> Option<Action> {
        self.field += 1;
        (self.field >= Self::SUBMIT).then(|| self.submit())
    }

    pub fn submit(&mut self) -> Action {
        self.field = Self::SUBMIT;
        Action::SubmitConnection(ServerConnection {
            active: true,
            url: self.url.content().trim().to_string(),
            authkey: self.authkey.content().to_string(),
            proxy: self.proxy.content().trim().to_string(),
        })
    }
}

/// Credentials form, hidden until the anonymous login was refused.
pub struct LoginView {
    pub form_visible: bool,
    pub username: InputBuffer,
    pub password: InputBuffer,
    pub field: usize,
}

impl LoginView {
    pub const SUBMIT: usize = 2;

    pub fn new(props: &WizardStateProps) -> Self {
        Self {
            form_visible: false,
            username: InputBuffer::with_value(&props.username),
            password: InputBuffer::masked(),
            field: 0,
        }
    }

    pub fn show_form(&mut self) {
        self.form_visible = true;
        self.field = if self.username.is_empty() { 0 } else { 1 };
    }

    pub fn input(&mut self) -> Option<&mut InputBuffer> {
        if !self.form_visible {
            return None;
        }
        match self.field {
            0 => Some(&mut self.username),
            1 => Some(&mut self.password),
            _ => None,
        }
    }

    pub fn move_cursor(&mut self, down: bool) {
        if self.form_visible {
            self.field = step_field(self.field, down, Self::SUBMIT);
        }
    }

    pub fn next_field(&mut self) -> Option<Action> {
        self.field += 1;
        (self.field >= Self::SUBMIT).then(|| self.submit())
    }

    pub fn submit(&mut self) -> Action {
        let username = self.username.content().trim().to_string();
        if username.is_empty() {
            self.field = 0;
            return Action::Reject("Please enter a username".to_string());
        }

        self.field = Self::SUBMIT;
        let password = self.password.secret();
        self.password.clear();
        Action::Login { username, password }
    }
}

fn step_field(field: usize, down: bool, last: usize) -> usize {
    if down {
        (field + 1).min(last)
    } else {
        field.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_form_submits_after_last_field() {
        let mut view = ConnectionView::new(&WizardStateProps::default());
        view.input().unwrap().set("urbackup://backup.example.com ");
        assert!(view.next_field().is_none());
        view.input().unwrap().set("s3cret");
        assert!(view.next_field().is_none());

        match view.next_field() {
            Some(Action::SubmitConnection(conn)) => {
                assert!(conn.active);
                assert_eq!(conn.url, "urbackup://backup.example.com");
                assert_eq!(conn.authkey, "s3cret");
                assert_eq!(conn.proxy, "");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(view.input().is_none());
    }

    #[test]
    fn connection_form_starts_from_saved_settings() {
        let props = WizardStateProps {
            server_url: "urbackup://saved".to_string(),
            server_authkey: "key".to_string(),
            ..Default::default()
        };
        let view = ConnectionView::new(&props);
        assert_eq!(view.url.content(), "urbackup://saved");
        assert_eq!(view.authkey.display(), "***");
    }

    #[test]
    fn login_form_hidden_until_requested() {
        let mut view = LoginView::new(&WizardStateProps::default());
        assert!(view.input().is_none());

        view.show_form();
        view.input().unwrap().set("admin");
        view.move_cursor(true);
        view.input().unwrap().set("pw");

        match view.next_field() {
            Some(Action::Login { username, password }) => {
                assert_eq!(username, "admin");
                assert_eq!(password.as_str(), "pw");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(view.password.is_empty());
    }

    #[test]
    fn login_needs_a_username() {
        let mut view = LoginView::new(&WizardStateProps::default());
        view.show_form();
        view.field = LoginView::SUBMIT;
        assert!(matches!(view.submit(), Action::Reject(_)));
        assert_eq!(view.field, 0);
    }
}
