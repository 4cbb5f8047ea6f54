//! Approval gateway between a blocked worker and the UI task.
//!
//! A worker awaits [`ApprovalGateway::request_tool`] (or `request_fallback`); the gateway posts
//! the request to the UI and waits on a single-use [`DecisionSink`] until the user presses Enter
//! or Esc. Cancellation of the session token ends every wait with a denial.

use tokio::sync::oneshot;

use super::app_event::{AppEvent, AppEventSender, FallbackRequest, Tier, ToolCallRequest};
use crate::internal::ai::{IsolationMeta, ToolArgs, tools::READ_FILE};

/// Single-use handoff of a yes/no decision from the UI task to a waiting worker.
#[derive(Debug)]
pub struct DecisionSink(oneshot::Sender<bool>);

impl DecisionSink {
    pub fn channel() -> (Self, oneshot::Receiver<bool>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    /// Delivers the decision. Returns `false` if the worker already stopped waiting, in which
    /// case nothing happens.
    pub fn resolve(self, approved: bool) -> bool {
        self.0.send(approved).is_ok()
    }
}

/// Calls that need no human decision: pure reads, and shell commands the sandbox accepted.
pub fn is_auto_approved(name: &str, meta: &IsolationMeta) -> bool {
    name == READ_FILE || meta.is_vetted()
}

/// Turns a worker's "may I?" into a UI prompt for one tier.
#[derive(Debug, Clone)]
pub struct ApprovalGateway {
    tier: Tier,
    events: AppEventSender,
}

impl ApprovalGateway {
    pub fn new(tier: Tier, events: AppEventSender) -> Self {
        Self { tier, events }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub async fn request_tool(&self, name: &str, args: &ToolArgs, meta: &IsolationMeta) -> bool {
        if self.events.cancel_token().is_cancelled() {
            return false;
        }

        let auto = is_auto_approved(name, meta);
        tracing::info!(tier = ?self.tier, tool = name, auto, "approval requested");

        let mut request = ToolCallRequest {
            tier: self.tier,
            name: name.to_string(),
            args: args.clone(),
            decision: None,
            sandboxed: meta.sandboxed,
            rejection: meta.rejection.clone(),
        };

        if auto {
            self.events.send(AppEvent::ToolCallRequested(request));
            return true;
        }

        let (sink, rx) = DecisionSink::channel();
        request.decision = Some(sink);
        if !self.events.send(AppEvent::ToolCallRequested(request)) {
            return false;
        }
        self.wait(rx).await
    }

    pub async fn request_fallback(&self, command: &str, reason: &str) -> bool {
        if self.events.cancel_token().is_cancelled() {
            return false;
        }
        tracing::info!(tier = ?self.tier, command, reason, "sandbox fallback requested");

        let (decision, rx) = DecisionSink::channel();
        let request = FallbackRequest {
            command: command.to_string(),
            reason: reason.to_string(),
            decision,
        };
        if !self.events.send(AppEvent::SandboxFallbackRequested(request)) {
            return false;
        }
        self.wait(rx).await
    }

    async fn wait(&self, rx: oneshot::Receiver<bool>) -> bool {
        tokio::select! {
            biased;
            _ = self.events.cancel_token().cancelled() => {
                tracing::info!(tier = ?self.tier, "approval abandoned by cancellation");
                false
            }
            decision = rx => decision.unwrap_or(false),
        }
    }
}
