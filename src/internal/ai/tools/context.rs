//! What a handler receives and what it hands back to the model.

use std::path::PathBuf;

use serde::{Deserialize, de::DeserializeOwned};

use super::error::{ToolError, ToolResult};

/// An approved call, ready for its handler.
#[derive(Clone, Debug)]
pub struct ToolInvocation {
    pub tool_name: String,
    /// Raw JSON object produced by the model.
    pub arguments: String,
    /// Root every relative path resolves against.
    pub working_dir: PathBuf,
}

impl ToolInvocation {
    pub fn new(
        tool_name: impl Into<String>,
        arguments: impl Into<String>,
        working_dir: PathBuf,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: arguments.into(),
            working_dir,
        }
    }

    /// Decodes the arguments into the handler's typed form.
    pub fn args<T: DeserializeOwned>(&self) -> ToolResult<T> {
        serde_json::from_str(&self.arguments).map_err(|e| {
            ToolError::InvalidArguments(format!("{} arguments: {e}", self.tool_name))
        })
    }
}

/// Result text sent back to the model as the tool message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolOutput {
    content: String,
    success: bool,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: true,
        }
    }

    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn as_text(&self) -> &str {
        &self.content
    }

    pub fn into_text(self) -> String {
        self.content
    }

    /// Short status shown next to the completed tool line.
    pub fn status(&self) -> &'static str {
        if self.success { "ok" } else { "failed" }
    }
}

/// Arguments for the read_file tool.
#[derive(Clone, Deserialize, Debug)]
pub struct ReadFileArgs {
    /// Path relative to the working directory (or absolute inside it).
    pub path: String,
}

/// Arguments for the write_file tool.
#[derive(Clone, Deserialize, Debug)]
pub struct WriteFileArgs {
    pub path: String,
    pub content: String,
}

/// Arguments for the edit_file tool.
#[derive(Clone, Deserialize, Debug)]
pub struct EditFileArgs {
    pub path: String,
    pub old_string: String,
    pub new_string: String,
}

/// Arguments for the run_shell tool.
#[derive(Clone, Deserialize, Debug)]
pub struct ShellArgs {
    pub command: String,
    /// What the command does, shown in the approval prompt.
    #[serde(default)]
    pub description: Option<String>,
    /// Declared safety class: read-only, modify, destructive, network or privileged.
    #[serde(default)]
    pub safety: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}
