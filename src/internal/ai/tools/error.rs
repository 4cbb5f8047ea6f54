use std::path::PathBuf;

use thiserror::Error;

/// Why a tool invocation could not run at all.
///
/// Ordinary failures such as a missing file or a non-zero exit are reported to the model as a
/// failed [`ToolOutput`](super::ToolOutput) instead.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{} is outside the working directory", .0.display())]
    OutsideWorkingDir(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

pub type ToolResult<T> = Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_sent_to_model() {
        let err = ToolError::OutsideWorkingDir(PathBuf::from("/etc/passwd"));
        assert_eq!(err.to_string(), "/etc/passwd is outside the working directory");

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ToolError = io_err.into();
        assert!(matches!(err, ToolError::Io(_)));
        assert_eq!(err.to_string(), "file not found");
    }
}
