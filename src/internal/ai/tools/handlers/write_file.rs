//! Handler for the write_file tool.

use async_trait::async_trait;

use crate::internal::ai::tools::{
    WRITE_FILE,
    context::{ToolInvocation, ToolOutput, WriteFileArgs},
    error::ToolResult,
    registry::ToolHandler,
    spec::ToolSpec,
    utils::{display_path, resolve_path},
};

/// Handler that creates or overwrites a file.
pub struct WriteFileHandler;

#[async_trait]
impl ToolHandler for WriteFileHandler {
    fn name(&self) -> &'static str {
        WRITE_FILE
    }

    async fn handle(&self, invocation: ToolInvocation) -> ToolResult<ToolOutput> {
        let args: WriteFileArgs = invocation.args()?;
        let path = resolve_path(&args.path, &invocation.working_dir)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, args.content.as_bytes()).await?;

        let lines = args.content.split('\n').count();
        Ok(ToolOutput::success(format!(
            "Wrote {} bytes ({lines} lines) to {}",
            args.content.len(),
            display_path(&path, &invocation.working_dir)
        )))
    }

    fn schema(&self) -> ToolSpec {
        ToolSpec::write_file()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let inv = ToolInvocation::new(
            "write_file",
            serde_json::json!({"path": "nested/dir/a.txt", "content": "x\ny"}).to_string(),
            temp.path().to_path_buf(),
        );

        let output = WriteFileHandler.handle(inv).await.unwrap();
        assert!(output.is_success());
        assert!(output.as_text().contains("nested/dir/a.txt"));
        assert_eq!(
            std::fs::read_to_string(temp.path().join("nested/dir/a.txt")).unwrap(),
            "x\ny"
        );
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.txt"), "old").unwrap();
        let inv = ToolInvocation::new(
            "write_file",
            serde_json::json!({"path": "a.txt", "content": "new"}).to_string(),
            temp.path().to_path_buf(),
        );

        WriteFileHandler.handle(inv).await.unwrap();
        assert_eq!(std::fs::read_to_string(temp.path().join("a.txt")).unwrap(), "new");
    }
}
