use thiserror::Error;

use crate::wizard::WizardState;

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The restore service answered with `{"err": "..."}`
    #[error("{0}")]
    Remote(String),

    #[error("Invalid transition to {state:?} (highest reached step is {max_state:?})")]
    InvalidTransition {
        state: WizardState,
        max_state: WizardState,
    },

    #[error("Step {0:?} is locked")]
    NavigationLocked(WizardState),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Terminal error: {0}")]
    Terminal(String),
}

impl RestoreError {
    /// Message shown to the operator: remote errors verbatim, anything else
    /// replaced by `context`.
    pub fn user_message(&self, context: &str) -> String {
        match self {
            RestoreError::Remote(msg) => msg.clone(),
            _ => context.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RestoreError>;
