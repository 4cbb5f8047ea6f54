//! Bono: a terminal coding agent whose tool calls are gated by interactive approval.

pub mod cli;
pub mod internal;
