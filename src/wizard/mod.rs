//! The restore wizard: a store of immutable snapshots, the sidebar router,
//! one network task per step and the terminal front end driving them.

pub mod app;
pub mod router;
pub mod state;
pub mod steps;
pub mod store;
pub mod ui;
pub mod view;

mod status_bar;

pub use app::{App, ConfirmAction, Message, PanelFocus};
pub use state::{
    BackupImage, LocalDisk, SpillDiskChoice, SpillSpace, WizardState, WizardStateProps,
};
pub use status_bar::StatusBarState;
pub use store::WizardStore;
