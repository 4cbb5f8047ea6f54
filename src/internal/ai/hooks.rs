//! The notification and approval surface between the agent and its front-end.
//!
//! The agent reports every observable step through [`AgentHooks`]. The three
//! boolean methods are approval gates: the agent awaits them and proceeds
//! only on `true`. Implementations must answer each call exactly once, and
//! must answer `false` once the session is shutting down.

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Arguments of a tool call, as decoded from the model's JSON.
pub type ToolArgs = Map<String, Value>;

/// How an executed tool call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallOutcome {
    pub status: String,
    /// The call ran inside the sandbox.
    pub sandboxed: bool,
}

impl ToolCallOutcome {
    pub fn new(status: impl Into<String>, sandboxed: bool) -> Self {
        Self {
            status: status.into(),
            sandboxed,
        }
    }
}

/// Sandbox status attached to a `run_shell` call before it is approved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IsolationMeta {
    /// The call will run inside the sandbox.
    pub sandboxed: bool,
    /// Why the sandbox refused the call; approving it runs the call outside the sandbox.
    pub rejection: Option<String>,
}

impl IsolationMeta {
    pub fn sandboxed() -> Self {
        Self {
            sandboxed: true,
            rejection: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            sandboxed: false,
            rejection: Some(reason.into()),
        }
    }

    /// Already vetted by the sandbox, so no human decision is needed.
    pub fn is_vetted(&self) -> bool {
        self.sandboxed && self.rejection.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubWorkerResult {
    pub status: String,
}

#[async_trait]
pub trait AgentHooks: Send + Sync {
    /// Primary-tier approval gate for a tool call. Never called for a command the sandbox
    /// refused; that goes to [`AgentHooks::on_sandbox_fallback`] instead.
    async fn on_tool_call(&self, name: &str, args: &ToolArgs, meta: &IsolationMeta) -> bool;

    fn on_tool_done(&self, name: &str, args: &ToolArgs, outcome: &ToolCallOutcome);

    /// Assistant text produced alongside tool calls.
    fn on_message(&self, text: &str);

    fn on_pre_task_start(&self, name: &str);

    fn on_pre_task_end(&self, name: &str);

    fn on_sub_worker_start(&self, prompt: &str);

    fn on_sub_worker_end(&self, result: &SubWorkerResult);

    /// Nested-tier approval gate for a sub-agent's tool call.
    async fn on_sub_worker_tool_call(&self, name: &str, args: &ToolArgs, meta: &IsolationMeta)
    -> bool;

    fn on_sub_worker_tool_done(&self, name: &str, args: &ToolArgs, outcome: &ToolCallOutcome);

    /// Asks whether a command the sandbox refused may run outside it.
    async fn on_sandbox_fallback(&self, command: &str, reason: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_meta_vetting() {
        assert!(IsolationMeta::sandboxed().is_vetted());
        assert!(!IsolationMeta::default().is_vetted());
        assert!(!IsolationMeta::rejected("network access").is_vetted());
    }
}
