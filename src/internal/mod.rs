//! Internal layers: the agent runtime, startup configuration and the terminal UI.

pub mod ai;
pub mod config;
pub mod tui;
