//! Tool calling infrastructure for the agent.
//!
//! - **Registry**: tool registration and dispatch
//! - **Handlers**: file and shell tools (read_file, write_file, edit_file, run_shell)
//! - **Context**: invocation arguments and outputs
//! - **Spec**: OpenAI-compatible tool definitions and the manifest loader

pub mod context;
pub mod error;
pub mod registry;
pub mod spec;
pub mod utils;

pub mod handlers;

pub use context::{
    EditFileArgs, ReadFileArgs, ShellArgs, ToolInvocation, ToolOutput, WriteFileArgs,
};
pub use error::{ToolError, ToolResult};
pub use registry::{ToolHandler, ToolRegistry};
pub use spec::{FunctionDefinition, FunctionParameters, ToolSpec};

pub const READ_FILE: &str = "read_file";
pub const WRITE_FILE: &str = "write_file";
pub const EDIT_FILE: &str = "edit_file";
pub const RUN_SHELL: &str = "run_shell";
/// Delegates a task to the nested shell sub-agent. Handled by the agent, not the registry.
pub const SHELL_AGENT: &str = "shell_agent";
