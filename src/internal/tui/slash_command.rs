//! Built-in `/` commands.

use super::{
    session::{Action, ExitReason, Session},
    spinner::SpinnerStyle,
};

/// Runs on the UI task; may ask the runtime to start work or quit.
pub type CommandHandler = fn(&mut Session, &str) -> Option<Action>;

#[derive(Debug, Clone, Copy)]
pub struct SlashCommand {
    pub name: &'static str,
    pub description: &'static str,
    pub handler: CommandHandler,
}

pub const HELP_TEXT: &str = "Available commands:
  /init           - Run exploring agent
  /help           - Show this help
  /clear          - Clear chat history
  /model          - Show current model
  /context        - Show context info
  /spinner        - Cycle to next spinner style
  /spinner <type> - Set spinner (dot, line, minidot, jump, pulse, points, globe, moon, monkey, meter, hamburger, ellipsis)
  /exit           - Exit Bono";

pub static COMMANDS: &[SlashCommand] = &[
    SlashCommand {
        name: "init",
        description: "Run exploring agent",
        handler: handle_init,
    },
    SlashCommand {
        name: "help",
        description: "Show available commands",
        handler: handle_help,
    },
    SlashCommand {
        name: "clear",
        description: "Clear the chat history",
        handler: handle_clear,
    },
    SlashCommand {
        name: "model",
        description: "Show the current model",
        handler: handle_model,
    },
    SlashCommand {
        name: "context",
        description: "Show context window info",
        handler: handle_context,
    },
    SlashCommand {
        name: "spinner",
        description: "Change spinner style",
        handler: handle_spinner,
    },
    SlashCommand {
        name: "exit",
        description: "Exit Bono",
        handler: handle_exit,
    },
];

pub fn find(name: &str) -> Option<&'static SlashCommand> {
    COMMANDS.iter().find(|cmd| cmd.name.eq_ignore_ascii_case(name))
}

/// Splits `/name args` into its name and trimmed argument text.
pub fn parse(input: &str) -> Option<(&str, &str)> {
    let rest = input.trim().strip_prefix('/')?;
    let (name, args) = rest.split_once(' ').unwrap_or((rest, ""));
    Some((name.trim(), args.trim()))
}

/// Commands whose name starts with the text after `/`, case-insensitively.
pub fn matching(input: &str) -> Vec<&'static SlashCommand> {
    let Some(query) = input.strip_prefix('/') else {
        return Vec::new();
    };
    let query = query.to_lowercase();
    COMMANDS
        .iter()
        .filter(|cmd| cmd.name.starts_with(&query))
        .collect()
}

fn handle_init(session: &mut Session, _args: &str) -> Option<Action> {
    session.start_processing("Running exploring agent...");
    Some(Action::RunPreTask("exploring".to_string()))
}

fn handle_help(session: &mut Session, _args: &str) -> Option<Action> {
    session.push_line(HELP_TEXT);
    None
}

fn handle_clear(session: &mut Session, _args: &str) -> Option<Action> {
    session.clear_log();
    None
}

fn handle_model(session: &mut Session, _args: &str) -> Option<Action> {
    let line = format!("Model: {}", session.model_name());
    session.push_line(line);
    None
}

fn handle_context(session: &mut Session, _args: &str) -> Option<Action> {
    let context = session.context();
    session.push_line(format!(
        "Context: {} messages, ~{} tokens",
        context.messages, context.approx_tokens
    ));
    None
}

fn handle_spinner(session: &mut Session, args: &str) -> Option<Action> {
    let line = if args.is_empty() {
        let style = session.spinner_mut().cycle_style();
        format!("Spinner changed to: {}", style.name())
    } else {
        let style = SpinnerStyle::parse(args);
        session.spinner_mut().set_style(style);
        format!("Spinner set to: {}", style.name())
    };
    session.push_line(line);
    None
}

fn handle_exit(_session: &mut Session, _args: &str) -> Option<Action> {
    Some(Action::Quit(ExitReason::UserRequested))
}
