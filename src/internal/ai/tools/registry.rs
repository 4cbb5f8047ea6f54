//! Name-to-handler table used by the agent to execute approved tool calls.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::{
    context::{ToolInvocation, ToolOutput},
    error::{ToolError, ToolResult},
    handlers::{EditFileHandler, ReadFileHandler, ShellHandler, WriteFileHandler},
    spec::ToolSpec,
};

/// A tool the agent can execute once the call has been approved.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Name the model calls the tool by.
    fn name(&self) -> &'static str;

    /// `Err` is reserved for invocations that could not run at all.
    async fn handle(&self, invocation: ToolInvocation) -> ToolResult<ToolOutput>;

    /// Built-in definition advertised to the model.
    fn schema(&self) -> ToolSpec;
}

/// Handlers keyed by name, all pinned to one working directory.
#[derive(Clone)]
pub struct ToolRegistry {
    handlers: HashMap<&'static str, Arc<dyn ToolHandler>>,
    working_dir: PathBuf,
}

impl ToolRegistry {
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            handlers: HashMap::new(),
            working_dir,
        }
    }

    /// read_file, write_file, edit_file and run_shell.
    pub fn builtin(working_dir: PathBuf) -> Self {
        let mut registry = Self::new(working_dir);
        registry.register(Arc::new(ReadFileHandler));
        registry.register(Arc::new(WriteFileHandler));
        registry.register(Arc::new(EditFileHandler));
        registry.register(Arc::new(ShellHandler));
        registry
    }

    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        let name = handler.name();
        if self.handlers.insert(name, handler).is_some() {
            tracing::warn!(tool = name, "replaced tool handler");
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Definitions of every registered tool, sorted by name.
    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.handlers.values().map(|h| h.schema()).collect();
        specs.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        specs
    }

    /// Runs `name` with raw JSON `arguments` inside the working directory.
    pub async fn dispatch(&self, name: &str, arguments: &str) -> ToolResult<ToolOutput> {
        let handler = self
            .handlers
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let invocation = ToolInvocation::new(name, arguments, self.working_dir.clone());
        handler.handle(invocation).await
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    struct EchoDirHandler;

    #[async_trait]
    impl ToolHandler for EchoDirHandler {
        fn name(&self) -> &'static str {
            "echo_dir"
        }

        async fn handle(&self, invocation: ToolInvocation) -> ToolResult<ToolOutput> {
            Ok(ToolOutput::success(invocation.working_dir.display().to_string()))
        }

        fn schema(&self) -> ToolSpec {
            ToolSpec::new("echo_dir", "Prints the working directory")
        }
    }

    #[tokio::test]
    async fn test_dispatch_runs_in_registry_working_dir() {
        let mut registry = ToolRegistry::new(PathBuf::from("/srv/project"));
        registry.register(Arc::new(EchoDirHandler));

        let output = registry.dispatch("echo_dir", "{}").await.unwrap();
        assert_eq!(output.as_text(), "/srv/project");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new(PathBuf::from("/tmp"));
        let result = registry.dispatch("shell_agent", "{}").await;
        assert!(matches!(result, Err(ToolError::UnknownTool(name)) if name == "shell_agent"));
    }

    #[test]
    fn test_builtin_tools() {
        let temp = TempDir::new().unwrap();
        let registry = ToolRegistry::builtin(temp.path().to_path_buf());

        let names: Vec<String> = registry
            .tool_specs()
            .into_iter()
            .map(|spec| spec.function.name)
            .collect();
        assert_eq!(names, ["edit_file", "read_file", "run_shell", "write_file"]);
        assert_eq!(registry.working_dir(), temp.path());
    }
}
