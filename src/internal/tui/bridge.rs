//! [`AgentHooks`] implementation that forwards agent activity to the TUI.

use async_trait::async_trait;

use super::{
    app_event::{AppEvent, AppEventSender, Tier, ToolCallResult},
    approval::ApprovalGateway,
};
use crate::internal::ai::{AgentHooks, IsolationMeta, SubWorkerResult, ToolArgs, ToolCallOutcome};

/// Hooks for one worker task: a primary gateway, an independent nested gateway for the shell
/// sub-agent, and a sender for plain notifications.
#[derive(Debug, Clone)]
pub struct TuiHooks {
    primary: ApprovalGateway,
    nested: ApprovalGateway,
    events: AppEventSender,
}

impl TuiHooks {
    pub fn new(events: AppEventSender) -> Self {
        Self {
            primary: ApprovalGateway::new(Tier::Primary, events.clone()),
            nested: ApprovalGateway::new(Tier::Nested, events.clone()),
            events,
        }
    }

    fn completed(&self, tier: Tier, name: &str, args: &ToolArgs, outcome: &ToolCallOutcome) {
        self.events.send(AppEvent::ToolCallCompleted(ToolCallResult {
            tier,
            name: name.to_string(),
            args: args.clone(),
            status: outcome.status.clone(),
            sandboxed: outcome.sandboxed,
        }));
    }
}

#[async_trait]
impl AgentHooks for TuiHooks {
    async fn on_tool_call(&self, name: &str, args: &ToolArgs, meta: &IsolationMeta) -> bool {
        self.primary.request_tool(name, args, meta).await
    }

    fn on_tool_done(&self, name: &str, args: &ToolArgs, outcome: &ToolCallOutcome) {
        self.completed(Tier::Primary, name, args, outcome);
    }

    fn on_message(&self, text: &str) {
        self.events.send(AppEvent::AgentMessage(text.to_string()));
    }

    fn on_pre_task_start(&self, name: &str) {
        self.events.send(AppEvent::PreTaskStarted(name.to_string()));
    }

    fn on_pre_task_end(&self, name: &str) {
        self.events.send(AppEvent::PreTaskEnded(name.to_string()));
    }

    fn on_sub_worker_start(&self, prompt: &str) {
        self.events.send(AppEvent::SubWorkerStarted {
            prompt: prompt.to_string(),
        });
    }

    fn on_sub_worker_end(&self, result: &SubWorkerResult) {
        self.events.send(AppEvent::SubWorkerEnded {
            status: result.status.clone(),
        });
    }

    async fn on_sub_worker_tool_call(
        &self,
        name: &str,
        args: &ToolArgs,
        meta: &IsolationMeta,
    ) -> bool {
        self.nested.request_tool(name, args, meta).await
    }

    fn on_sub_worker_tool_done(&self, name: &str, args: &ToolArgs, outcome: &ToolCallOutcome) {
        self.completed(Tier::Nested, name, args, outcome);
    }

    async fn on_sandbox_fallback(&self, command: &str, reason: &str) -> bool {
        self.primary.request_fallback(command, reason).await
    }
}
