use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::{Agent, AgentConfig};
use crate::internal::ai::{
    completion::CompletionModel,
    prompt,
    sandbox::{PolicySandbox, Sandbox},
    tools::{ToolRegistry, ToolSpec},
};

pub const DEFAULT_MAX_STEPS: usize = 25;

/// A builder for configuring and creating [`Agent`] instances.
pub struct AgentBuilder<M: CompletionModel> {
    model: M,
    model_name: String,
    working_dir: PathBuf,
    tool_specs: Option<Vec<ToolSpec>>,
    sandbox: Arc<dyn Sandbox>,
    temperature: Option<f64>,
    max_steps: usize,
}

impl<M: CompletionModel> AgentBuilder<M> {
    pub fn new(model: M, model_name: impl Into<String>, working_dir: PathBuf) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            working_dir,
            tool_specs: None,
            sandbox: Arc::new(PolicySandbox::default()),
            temperature: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Replaces the built-in tool specs sent to the model.
    pub fn tool_specs(mut self, specs: Vec<ToolSpec>) -> Self {
        self.tool_specs = Some(specs);
        self
    }

    pub fn sandbox(mut self, sandbox: Arc<dyn Sandbox>) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Zero is treated as one.
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn build(self) -> Agent<M> {
        let registry = ToolRegistry::builtin(self.working_dir.clone());

        Agent {
            model: self.model,
            model_name: self.model_name,
            registry,
            tool_specs: self.tool_specs.unwrap_or_else(ToolSpec::builtin),
            sandbox: self.sandbox,
            config: AgentConfig {
                preamble: prompt::system_prompt(&self.working_dir),
                sub_agent_preamble: prompt::shell_agent_prompt(&self.working_dir),
                temperature: self.temperature,
                max_steps: self.max_steps,
            },
            history: Mutex::new(Vec::new()),
        }
    }
}
