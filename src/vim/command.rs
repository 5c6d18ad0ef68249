use thiserror::Error;

/// `:` commands of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Leave the keyboard step without changing the layout
    Skip,
    Back,
    Retry,
    /// Restore another image after a finished restore
    Another,
    Restart,
    /// Configure spill space after a disk-too-small failure
    Spill,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),
}

pub fn parse_command(input: &str) -> Result<Command, CommandError> {
    let cmd = input.split_whitespace().next().unwrap_or("");

    match cmd {
        "skip" | "s" => Ok(Command::Skip),
        "back" | "b" => Ok(Command::Back),
        "retry" | "r" => Ok(Command::Retry),
        "another" | "a" => Ok(Command::Another),
        "restart" | "reboot" => Ok(Command::Restart),
        "spill" => Ok(Command::Spill),
        "help" | "h" | "?" => Ok(Command::Help),
        "q" | "quit" | "exit" => Ok(Command::Quit),
        "" => Err(CommandError::Unknown("empty command".to_string())),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}
