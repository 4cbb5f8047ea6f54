use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::internal::ai::{
    completion::{CompletionError, CompletionModel, Message},
    hooks::AgentHooks,
    prompt,
    sandbox::Sandbox,
    tools::{ToolRegistry, ToolSpec},
};

pub mod builder;
mod tool_loop;

pub use builder::{AgentBuilder, DEFAULT_MAX_STEPS};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("cancelled")]
    Cancelled,

    #[error("stopped after {0} steps without a final answer")]
    MaxSteps(usize),

    #[error("unknown pre-task: {0}")]
    UnknownPreTask(String),
}

/// Size of the stored conversation, shown by `/context`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextInfo {
    pub messages: usize,
    /// Rough estimate at four characters per token.
    pub approx_tokens: usize,
}

impl ContextInfo {
    pub fn from_history(history: &[Message]) -> Self {
        let chars: usize = history.iter().map(Message::char_len).sum();
        Self {
            messages: history.len(),
            approx_tokens: chars.div_ceil(4),
        }
    }
}

/// The reasoning engine behind the terminal UI.
///
/// Calls run on a background task. Everything observable is reported through
/// `hooks`, and every wait (model round-trip or approval) ends early with
/// [`AgentError::Cancelled`] once `cancel` fires.
#[async_trait]
pub trait AgentCore: Send + Sync {
    /// Runs one user turn and returns the final assistant text.
    async fn chat(
        &self,
        input: &str,
        hooks: &dyn AgentHooks,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError>;

    /// Runs a named pre-task; its summary is kept as context for later turns.
    async fn run_pre_task(
        &self,
        name: &str,
        hooks: &dyn AgentHooks,
        cancel: &CancellationToken,
    ) -> Result<(), AgentError>;

    fn model_name(&self) -> &str;

    fn context_info(&self) -> ContextInfo;
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub preamble: String,
    pub sub_agent_preamble: String,
    pub temperature: Option<f64>,
    pub max_steps: usize,
}

/// A stateful tool-calling agent over a [`CompletionModel`].
pub struct Agent<M: CompletionModel> {
    model: M,
    model_name: String,
    registry: ToolRegistry,
    tool_specs: Vec<ToolSpec>,
    sandbox: Arc<dyn Sandbox>,
    config: AgentConfig,
    history: Mutex<Vec<Message>>,
}

impl<M: CompletionModel> Agent<M> {
    fn history(&self) -> MutexGuard<'_, Vec<Message>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

#[async_trait]
impl<M: CompletionModel> AgentCore for Agent<M> {
    async fn chat(
        &self,
        input: &str,
        hooks: &dyn AgentHooks,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let mut history = self.history().clone();
        history.push(Message::user(input));

        tracing::info!(model = %self.model_name, "turn started");
        let text = self
            .run_primary_loop(&self.config.preamble, &mut history, hooks, cancel)
            .await?;

        *self.history() = history;
        Ok(text)
    }

    async fn run_pre_task(
        &self,
        name: &str,
        hooks: &dyn AgentHooks,
        cancel: &CancellationToken,
    ) -> Result<(), AgentError> {
        let task = prompt::find_pre_task(name)
            .ok_or_else(|| AgentError::UnknownPreTask(name.to_string()))?;

        hooks.on_pre_task_start(task.name);
        let mut history = vec![Message::user(task.instruction)];
        let result = self
            .run_primary_loop(&self.config.preamble, &mut history, hooks, cancel)
            .await;
        hooks.on_pre_task_end(task.name);

        let summary = result?;
        self.history().push(Message::system(format!(
            "Project context gathered by the {} agent:\n{summary}",
            task.name
        )));
        Ok(())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn context_info(&self) -> ContextInfo {
        ContextInfo::from_history(&self.history())
    }
}
