//! Handler for the read_file tool.

use async_trait::async_trait;

use crate::internal::ai::tools::{
    READ_FILE,
    context::{ReadFileArgs, ToolInvocation, ToolOutput},
    error::ToolResult,
    registry::ToolHandler,
    spec::ToolSpec,
    utils::resolve_path,
};

/// Files larger than this are cut off with a marker.
const MAX_READ_BYTES: usize = 256 * 1024;

/// Handler for reading file contents.
pub struct ReadFileHandler;

#[async_trait]
impl ToolHandler for ReadFileHandler {
    fn name(&self) -> &'static str {
        READ_FILE
    }

    async fn handle(&self, invocation: ToolInvocation) -> ToolResult<ToolOutput> {
        let args: ReadFileArgs = invocation.args()?;
        let path = resolve_path(&args.path, &invocation.working_dir)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                return Ok(ToolOutput::failure(format!(
                    "Failed to read {}: {err}",
                    args.path
                )));
            }
        };

        let truncated = bytes.len() > MAX_READ_BYTES;
        let mut content =
            String::from_utf8_lossy(&bytes[..bytes.len().min(MAX_READ_BYTES)]).into_owned();
        if truncated {
            content.push_str("\n[file truncated]");
        }
        Ok(ToolOutput::success(content))
    }

    fn schema(&self) -> ToolSpec {
        ToolSpec::read_file()
    }
}
