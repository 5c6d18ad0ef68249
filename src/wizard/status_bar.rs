/// Key hints shown next to the mode indicator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBarState {
    pub left_hint: String,
    pub right_hint: String,
}

impl StatusBarState {
    fn new(left: &str, right: &str) -> Self {
        Self {
            left_hint: left.to_string(),
            right_hint: right.to_string(),
        }
    }

    pub fn sidebar() -> Self {
        Self::new("j/k: navigate", "l/Enter: open step  :help")
    }

    pub fn picker_normal() -> Self {
        Self::new("j/k: navigate  Enter: select", "i: filter  :skip")
    }

    pub fn picker_insert() -> Self {
        Self::new("Type to filter", "Esc: normal  Enter: select")
    }

    pub fn form_normal() -> Self {
        Self::new("j/k: fields  Enter: edit", "Tab: next  Ctrl+h: sidebar")
    }

    pub fn form_insert() -> Self {
        Self::new("Type to enter text", "Esc: normal  Tab: next field")
    }

    pub fn lists() -> Self {
        Self::new("j/k: move  Tab: next list", "Enter: select  Ctrl+h: sidebar")
    }

    pub fn buttons() -> Self {
        Self::new("j/k: choose", "Enter: press  Ctrl+h: sidebar")
    }

    pub fn waiting() -> Self {
        Self::new("Please wait...", ":help")
    }

    pub fn command_mode() -> Self {
        Self::new("", "Enter: run  Esc: cancel")
    }

    pub fn modal() -> Self {
        Self::new("", "Enter: change connection settings")
    }

    /// While a restore is running the menu is locked
    pub fn restoring() -> Self {
        Self::new("Restore running", ":help")
    }
}
