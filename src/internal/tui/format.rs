//! Display labels for tool calls.

use serde_json::Value;

use crate::internal::ai::{
    ToolArgs,
    tools::{EDIT_FILE, READ_FILE, RUN_SHELL, WRITE_FILE},
};

const SUBAGENT_PROMPT_MAX: usize = 60;

fn str_arg<'a>(args: &'a ToolArgs, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// Short label such as `Read('src/main.rs')` or `Bash('ls') # list files, read-only`.
pub fn format_tool(name: &str, args: &ToolArgs) -> String {
    let path = || str_arg(args, "path").unwrap_or("(unknown)");
    match name {
        READ_FILE => format!("Read('{}')", path()),
        WRITE_FILE => {
            let lines = str_arg(args, "content").unwrap_or_default().split('\n').count();
            format!("Write('{}', {lines} lines)", path())
        }
        EDIT_FILE => format!("Edit('{}')", path()),
        RUN_SHELL => format!(
            "Bash('{}') # {}, {}",
            str_arg(args, "command").unwrap_or_default(),
            str_arg(args, "description").unwrap_or("(no description)"),
            str_arg(args, "safety").unwrap_or("modify"),
        ),
        other => other.to_string(),
    }
}

/// `Subagent('…')` label, with the prompt cut to 60 characters.
pub fn format_subagent(prompt: &str) -> String {
    let prompt = prompt.trim();
    let shown = if prompt.chars().count() > SUBAGENT_PROMPT_MAX {
        let head: String = prompt.chars().take(SUBAGENT_PROMPT_MAX - 3).collect();
        format!("{head}...")
    } else {
        prompt.to_string()
    };
    format!("Subagent('{shown}')")
}
