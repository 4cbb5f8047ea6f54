//! Agent infrastructure for bono.
//!
//! - **Agent**: [`Agent`] runs the tool-calling loop and the nested shell sub-agent
//! - **Providers**: [`CompletionModel`] implementations (OpenRouter-compatible endpoints)
//! - **Tools**: file and shell tools behind a [`tools::ToolRegistry`]
//! - **Hooks**: [`AgentHooks`], the notification and approval surface used by the TUI
//! - **Sandbox**: the policy deciding which shell commands run without a fallback prompt

pub mod agent;
pub mod client;
pub mod completion;
pub mod hooks;
pub mod prompt;
pub mod providers;
pub mod sandbox;
pub mod tools;

pub use agent::{Agent, AgentBuilder, AgentCore, AgentError, ContextInfo};
pub use completion::{CompletionModel, Message};
pub use hooks::{AgentHooks, IsolationMeta, SubWorkerResult, ToolArgs, ToolCallOutcome};
pub use sandbox::{NoSandbox, PolicySandbox, Sandbox, SandboxVerdict};
