pub mod api;
pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod ui;
pub mod vim;
pub mod wizard;
