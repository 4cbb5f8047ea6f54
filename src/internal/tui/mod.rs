//! Terminal user interface for interactive agent sessions.
//!
//! The agent runs on a worker task and talks to the UI only through [`app_event::AppEvent`]s
//! and [`approval::DecisionSink`]s. All UI state lives in [`session::Session`], which the
//! [`App`] event loop drives.

mod app;
pub mod app_event;
pub mod approval;
pub mod bridge;
pub mod command_popup;
pub mod format;
pub mod input;
pub mod message_log;
pub mod response_filter;
pub mod session;
pub mod slash_command;
pub mod spinner;
mod terminal;
pub mod view;

pub use app::{App, AppConfig, AppExitInfo};
pub use session::ExitReason;
pub use terminal::{Tui, TuiEvent, init as tui_init, restore as tui_restore};
