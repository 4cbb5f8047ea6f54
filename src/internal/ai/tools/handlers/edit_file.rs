//! Handler for the edit_file tool.

use async_trait::async_trait;

use crate::internal::ai::tools::{
    EDIT_FILE,
    context::{EditFileArgs, ToolInvocation, ToolOutput},
    error::{ToolError, ToolResult},
    registry::ToolHandler,
    spec::ToolSpec,
    utils::{display_path, resolve_path},
};

/// Handler for single-occurrence string replacement.
pub struct EditFileHandler;

#[async_trait]
impl ToolHandler for EditFileHandler {
    fn name(&self) -> &'static str {
        EDIT_FILE
    }

    async fn handle(&self, invocation: ToolInvocation) -> ToolResult<ToolOutput> {
        let args: EditFileArgs = invocation.args()?;
        if args.old_string.is_empty() {
            return Err(ToolError::InvalidArguments(
                "old_string must not be empty".into(),
            ));
        }
        let path = resolve_path(&args.path, &invocation.working_dir)?;
        let shown = display_path(&path, &invocation.working_dir);

        let original = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) => return Ok(ToolOutput::failure(format!("Failed to read {shown}: {err}"))),
        };

        match original.matches(args.old_string.as_str()).count() {
            0 => Ok(ToolOutput::failure(format!(
                "old_string was not found in {shown}"
            ))),
            1 => {
                let updated = original.replacen(&args.old_string, &args.new_string, 1);
                tokio::fs::write(&path, updated).await?;
                Ok(ToolOutput::success(format!("Edited {shown}")))
            }
            n => Ok(ToolOutput::failure(format!(
                "old_string matches {n} times in {shown}; include more context to make it unique"
            ))),
        }
    }

    fn schema(&self) -> ToolSpec {
        ToolSpec::edit_file()
    }
}
