//! Handler for the run_shell tool.
//!
//! Runs a command through `$SHELL -c` in the registry's working directory.
//! Approval and sandbox policy are decided by the agent before dispatch;
//! this handler only executes.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::Duration;

use crate::internal::ai::tools::{
    RUN_SHELL,
    context::{ShellArgs, ToolInvocation, ToolOutput},
    error::{ToolError, ToolResult},
    registry::ToolHandler,
    spec::ToolSpec,
};

pub struct ShellHandler;

const DEFAULT_TIMEOUT_MS: u64 = 10_000;
/// Per-stream capture limit.
const MAX_OUTPUT_BYTES: usize = 100 * 1024;
/// Reported when the command is killed on timeout, as GNU timeout does.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

#[async_trait]
impl ToolHandler for ShellHandler {
    fn name(&self) -> &'static str {
        RUN_SHELL
    }

    async fn handle(&self, invocation: ToolInvocation) -> ToolResult<ToolOutput> {
        let args: ShellArgs = invocation.args()?;
        if args.command.trim().is_empty() {
            return Err(ToolError::InvalidArguments("command must not be empty".into()));
        }

        let timeout = Duration::from_millis(args.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS));
        let output = run_shell(&args.command, &invocation.working_dir, timeout).await?;

        let text = output.render();
        if output.exit_code == 0 {
            Ok(ToolOutput::success(text))
        } else {
            Ok(ToolOutput::failure(text))
        }
    }

    fn schema(&self) -> ToolSpec {
        ToolSpec::run_shell()
    }
}

struct ExecOutput {
    exit_code: i32,
    stdout: String,
    stderr: String,
    timed_out: bool,
}

impl ExecOutput {
    fn render(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if self.timed_out {
            parts.push("[Command timed out]");
        }
        let exit = format!("Exit code: {}", self.exit_code);
        parts.push(&exit);

        if !self.stdout.is_empty() {
            parts.push("");
            parts.push(&self.stdout);
        }
        if !self.stderr.is_empty() {
            parts.push("[stderr]");
            parts.push(&self.stderr);
        }
        parts.join("\n")
    }
}

async fn run_shell(command: &str, cwd: &Path, timeout: Duration) -> ToolResult<ExecOutput> {
    let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());

    let mut child = Command::new(&shell)
        .arg("-c")
        .arg(command)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ToolError::ExecutionFailed(format!("failed to spawn {shell}: {e}")))?;

    let stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| ToolError::ExecutionFailed("stdout was not captured".into()))?;
    let stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| ToolError::ExecutionFailed("stderr was not captured".into()))?;

    // Drain concurrently so a full pipe never blocks the child.
    let stdout_task = tokio::spawn(capture(stdout_pipe));
    let stderr_task = tokio::spawn(capture(stderr_pipe));

    let (exit_code, timed_out) = tokio::select! {
        status = child.wait() => {
            let status = status
                .map_err(|e| ToolError::ExecutionFailed(format!("wait failed: {e}")))?;
            (status.code().unwrap_or(-1), false)
        }
        _ = tokio::time::sleep(timeout) => {
            let _ = child.kill().await;
            let _ = child.wait().await;
            (TIMEOUT_EXIT_CODE, true)
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    Ok(ExecOutput {
        exit_code,
        stdout: stdout.into_text("stdout"),
        stderr: stderr.into_text("stderr"),
        timed_out,
    })
}

#[derive(Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

impl Captured {
    fn into_text(self, stream: &str) -> String {
        let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
        if self.truncated {
            text.push_str(&format!("\n[{stream} truncated]"));
        }
        text
    }
}

/// Keeps the first `MAX_OUTPUT_BYTES` and discards the rest while still reading to EOF.
async fn capture(mut reader: impl AsyncRead + Unpin) -> Captured {
    let mut captured = Captured::default();
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = MAX_OUTPUT_BYTES.saturating_sub(captured.bytes.len());
                if n > room {
                    captured.truncated = true;
                }
                captured.bytes.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }
    captured
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn make_invocation(args: serde_json::Value, temp: &TempDir) -> ToolInvocation {
        ToolInvocation::new("run_shell", args.to_string(), temp.path().to_path_buf())
    }

    #[tokio::test]
    async fn test_shell_echo() {
        let temp = TempDir::new().unwrap();
        let inv = make_invocation(
            serde_json::json!({ "command": "echo hello", "description": "greet", "safety": "read-only" }),
            &temp,
        );
        let result = ShellHandler.handle(inv).await.unwrap();
        assert!(result.is_success());
        assert!(result.as_text().contains("Exit code: 0"));
        assert!(result.as_text().contains("hello"));
    }

    #[tokio::test]
    async fn test_shell_exit_code_nonzero() {
        let temp = TempDir::new().unwrap();
        let inv = make_invocation(serde_json::json!({ "command": "exit 42" }), &temp);
        let result = ShellHandler.handle(inv).await.unwrap();
        assert!(!result.is_success());
        assert_eq!(result.status(), "failed");
        assert!(result.as_text().contains("Exit code: 42"));
    }

    #[tokio::test]
    async fn test_shell_stderr_section_label() {
        let temp = TempDir::new().unwrap();
        let inv = make_invocation(serde_json::json!({ "command": "echo out; echo err >&2" }), &temp);
        let result = ShellHandler.handle(inv).await.unwrap();
        let text = result.as_text();
        assert!(text.contains("[stderr]"), "expected [stderr] label:\n{text}");
        assert!(text.contains("out"), "{text}");
        assert!(text.contains("err"), "{text}");
    }

    #[tokio::test]
    async fn test_shell_runs_in_working_dir() {
        let temp = TempDir::new().unwrap();
        let inv = make_invocation(serde_json::json!({ "command": "pwd" }), &temp);
        let result = ShellHandler.handle(inv).await.unwrap();
        let dir_name = temp.path().file_name().unwrap().to_str().unwrap();
        assert!(result.as_text().contains(dir_name), "{}", result.as_text());
    }

    #[tokio::test]
    async fn test_shell_timeout() {
        let temp = TempDir::new().unwrap();
        let inv = make_invocation(
            serde_json::json!({ "command": "sleep 60", "timeout_ms": 200 }),
            &temp,
        );
        let result = ShellHandler.handle(inv).await.unwrap();
        let text = result.as_text();
        assert!(text.contains("[Command timed out]"), "{text}");
        assert!(text.contains(&format!("Exit code: {TIMEOUT_EXIT_CODE}")), "{text}");
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn test_shell_large_output_truncated() {
        let temp = TempDir::new().unwrap();
        let inv = make_invocation(serde_json::json!({ "command": "seq 1 200000" }), &temp);
        let result = ShellHandler.handle(inv).await.unwrap();
        let text = result.as_text();
        assert!(text.contains("[stdout truncated]"));
        assert!(text.len() < MAX_OUTPUT_BYTES + 1024);
    }

    #[tokio::test]
    async fn test_empty_command_rejected() {
        let temp = TempDir::new().unwrap();
        let inv = make_invocation(serde_json::json!({ "command": "  " }), &temp);
        let result = ShellHandler.handle(inv).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
