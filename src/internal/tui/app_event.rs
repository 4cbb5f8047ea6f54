//! Worker-to-UI events.
//!
//! `AppEvent` is the message bus between agent workers and the top-level `App` loop. Workers
//! never touch UI state; they post events through an [`AppEventSender`] and the UI task applies
//! them to the [`Session`](super::session::Session) in arrival order.

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use super::approval::DecisionSink;
use crate::internal::ai::{ContextInfo, ToolArgs};

/// Which worker a tool call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Primary,
    /// The shell sub-agent running inside a primary tool call.
    Nested,
}

impl Tier {
    /// Prefix of the log lines belonging to this tier.
    pub fn line_prefix(self) -> &'static str {
        match self {
            Tier::Primary => "● ",
            Tier::Nested => "  ↳ ",
        }
    }
}

/// A tool call about to run. `decision` is absent when the call was auto-approved.
#[derive(Debug)]
pub struct ToolCallRequest {
    pub tier: Tier,
    pub name: String,
    pub args: ToolArgs,
    pub decision: Option<DecisionSink>,
    pub sandboxed: bool,
    /// Set when the sandbox refused the call; approving runs it outside the sandbox.
    pub rejection: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallResult {
    pub tier: Tier,
    pub name: String,
    pub args: ToolArgs,
    pub status: String,
    pub sandboxed: bool,
}

/// Asks whether a command the sandbox refused may run outside it.
#[derive(Debug)]
pub struct FallbackRequest {
    pub command: String,
    pub reason: String,
    pub decision: DecisionSink,
}

/// Final message of a worker task.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerOutcome {
    /// Final assistant text on success, the error message on failure.
    pub result: Result<Option<String>, String>,
    pub context: Option<ContextInfo>,
}

#[derive(Debug)]
pub enum AppEvent {
    /// Assistant text produced alongside tool calls.
    AgentMessage(String),
    ToolCallRequested(ToolCallRequest),
    ToolCallCompleted(ToolCallResult),
    SubWorkerStarted { prompt: String },
    SubWorkerEnded { status: String },
    SandboxFallbackRequested(FallbackRequest),
    PreTaskStarted(String),
    PreTaskEnded(String),
    /// Exactly one per spawned worker, always last.
    TurnCompleted(WorkerOutcome),
}

/// Posts events from a worker to the UI task.
///
/// Once the session is cancelled every post is suppressed, so a shutting-down worker cannot
/// queue prompts nobody will answer.
#[derive(Debug, Clone)]
pub struct AppEventSender {
    tx: UnboundedSender<AppEvent>,
    cancel: CancellationToken,
}

impl AppEventSender {
    pub fn new(tx: UnboundedSender<AppEvent>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    /// Returns `false` when the event was not delivered. Any decision sink inside a dropped
    /// event is dropped with it, which the waiting side reads as a denial.
    pub fn send(&self, event: AppEvent) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        if self.tx.send(event).is_err() {
            tracing::debug!("UI event channel closed; dropping event");
            return false;
        }
        true
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}
