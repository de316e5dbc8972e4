pub mod commands;
pub mod config;
pub mod controller;
pub mod state;
pub mod summary;

pub use commands::{handle_command, Command, CommandResponse};
pub use config::TrackerSettings;
pub use controller::{TrackerController, TrackerEvent};
pub use state::{FocusedPage, TrackerState};
pub use summary::{format_duration, SessionSummary, SiteSummary};
