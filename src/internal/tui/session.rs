//! UI state and the single-threaded update function.
//!
//! [`Session::handle`] receives every event (keys, paste, resize, spinner ticks and worker
//! notifications) in arrival order and returns at most one [`Action`] for the runtime. It never
//! awaits; approval decisions are delivered by resolving the pending [`DecisionSink`].

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{
    app_event::{AppEvent, FallbackRequest, Tier, ToolCallRequest, ToolCallResult, WorkerOutcome},
    approval::DecisionSink,
    command_popup::CommandPopup,
    format::{format_subagent, format_tool},
    input::InputField,
    message_log::{MessageLog, wrap, wrap_width},
    slash_command,
    spinner::{Spinner, SpinnerStyle},
};
use crate::internal::ai::ContextInfo;

const APPROVAL_SUFFIX: &str = " [Enter/Esc]";
/// Rows taken by the spinner line, the input box and the status bar.
const CHROME_HEIGHT: u16 = 1 + 3 + 1;

const THINKING: &str = "Thinking...";
const RUNNING_SUBAGENT: &str = "Running subagent...";

#[derive(Debug)]
pub enum UiEvent {
    Key(KeyEvent),
    Paste(String),
    Resize(u16, u16),
    Tick,
    App(AppEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    UserRequested,
    /// Ctrl-C.
    Interrupted,
}

/// Work the runtime must perform on behalf of the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    StartTurn(String),
    RunPreTask(String),
    Quit(ExitReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    Tool,
    Fallback,
}

#[derive(Debug)]
struct PendingApproval {
    kind: PendingKind,
    sink: DecisionSink,
    /// Log entry showing the prompt.
    line: usize,
    /// Prompt text without the `[Enter/Esc]` suffix.
    prompt: String,
}

pub struct Session {
    log: MessageLog,
    input: InputField,
    spinner: Spinner,
    palette: CommandPopup,
    pending_primary: Option<PendingApproval>,
    pending_nested: Option<PendingApproval>,
    /// Most recent tool line of each tier, rewritten when the call completes.
    primary_tool_line: Option<usize>,
    nested_tool_line: Option<usize>,
    processing: bool,
    width: u16,
    height: u16,
    model_name: String,
    context: ContextInfo,
    /// Lines scrolled up from the bottom; `0` pins the view to the newest entry.
    scroll_from_bottom: usize,
}

impl Session {
    pub fn new(
        model_name: impl Into<String>,
        spinner_style: SpinnerStyle,
        idle_text: impl Into<String>,
    ) -> Self {
        Self {
            log: MessageLog::new(),
            input: InputField::new(),
            spinner: Spinner::new(spinner_style, idle_text),
            palette: CommandPopup::new(),
            pending_primary: None,
            pending_nested: None,
            primary_tool_line: None,
            nested_tool_line: None,
            processing: false,
            width: 80,
            height: 24,
            model_name: model_name.into(),
            context: ContextInfo::default(),
            scroll_from_bottom: 0,
        }
    }

    pub fn handle(&mut self, event: UiEvent) -> Option<Action> {
        match event {
            UiEvent::Key(key) => self.handle_key(key),
            UiEvent::Paste(text) => {
                self.input.insert_str(&text);
                self.palette.update(self.input.value());
                None
            }
            UiEvent::Resize(width, height) => {
                self.width = width;
                self.height = height;
                None
            }
            UiEvent::Tick => {
                self.spinner.tick();
                None
            }
            UiEvent::App(event) => {
                self.handle_app_event(event);
                None
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.deny_all();
            return Some(Action::Quit(ExitReason::Interrupted));
        }

        if self.palette.is_active() {
            match key.code {
                KeyCode::Up => {
                    self.palette.move_up();
                    return None;
                }
                KeyCode::Down => {
                    self.palette.move_down();
                    return None;
                }
                KeyCode::Tab => {
                    if let Some(text) = self.palette.complete() {
                        self.input.set_value(text);
                    }
                    return None;
                }
                KeyCode::Esc => {
                    self.palette.dismiss();
                    return None;
                }
                _ => {}
            }
        }

        match key.code {
            KeyCode::Enter => {
                if self.resolve_pending(true) {
                    return None;
                }
                if self.palette.is_active()
                    && let Some(selected) = self.palette.selected_text()
                    && self.input.value().trim() != selected
                {
                    self.palette.complete();
                    self.input.set_value(selected);
                    return None;
                }
                self.submit()
            }
            KeyCode::Esc => {
                if self.resolve_pending(false) {
                    return None;
                }
                Some(Action::Quit(ExitReason::UserRequested))
            }
            KeyCode::PageUp => {
                let page = usize::from(self.viewport_height());
                let max = self.log.line_count().saturating_sub(page);
                self.scroll_from_bottom = (self.scroll_from_bottom + page).min(max);
                None
            }
            KeyCode::PageDown => {
                let page = usize::from(self.viewport_height());
                self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(page);
                None
            }
            _ => {
                if self.input.handle_key(key) {
                    self.palette.update(self.input.value());
                }
                None
            }
        }
    }

    /// Delivers a decision to the pending request, primary tier first.
    fn resolve_pending(&mut self, approved: bool) -> bool {
        let (tier, pending) = if let Some(pending) = self.pending_primary.take() {
            (Tier::Primary, pending)
        } else if let Some(pending) = self.pending_nested.take() {
            (Tier::Nested, pending)
        } else {
            return false;
        };

        let delivered = pending.sink.resolve(approved);
        tracing::info!(?tier, approved, delivered, "approval decided");

        let text = if approved {
            pending.prompt
        } else {
            let outcome = match pending.kind {
                PendingKind::Tool => "cancelled",
                PendingKind::Fallback => "skipped",
            };
            format!("{} => {outcome}", pending.prompt)
        };
        self.replace_line(pending.line, &text);

        self.spinner.set_text(match tier {
            Tier::Primary => THINKING,
            Tier::Nested => RUNNING_SUBAGENT,
        });
        true
    }

    /// Denies every outstanding request; used on shutdown.
    pub fn deny_all(&mut self) {
        for pending in [self.pending_primary.take(), self.pending_nested.take()]
            .into_iter()
            .flatten()
        {
            pending.sink.resolve(false);
        }
    }

    fn submit(&mut self) -> Option<Action> {
        let value = self.input.value().trim().to_string();
        if value.is_empty() || self.processing {
            return None;
        }

        self.input.clear();
        self.palette.update("");

        if value.starts_with('/') {
            return self.run_command(&value);
        }

        self.push_line(format!("> {value}"));
        self.start_processing(THINKING);
        tracing::info!("turn submitted");
        Some(Action::StartTurn(value))
    }

    fn run_command(&mut self, value: &str) -> Option<Action> {
        let (name, args) = slash_command::parse(value)?;
        if name.is_empty() {
            return None;
        }
        match slash_command::find(name) {
            Some(command) => (command.handler)(self, args),
            None => {
                let rest = value.trim_start_matches('/');
                self.push_line(format!("Unknown command: /{rest}"));
                None
            }
        }
    }

    fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::AgentMessage(text) => {
                self.push_line(text);
            }
            AppEvent::ToolCallRequested(request) => self.on_tool_requested(request),
            AppEvent::ToolCallCompleted(result) => self.on_tool_completed(result),
            AppEvent::SandboxFallbackRequested(request) => self.on_fallback_requested(request),
            AppEvent::SubWorkerStarted { prompt } => {
                self.push_line(format!("● {}", format_subagent(&prompt)));
                self.nested_tool_line = None;
                self.spinner.set_text(RUNNING_SUBAGENT);
            }
            AppEvent::SubWorkerEnded { status } => {
                self.push_line(format!("  ↳ Subagent completed ({status})"));
                self.spinner.set_text(THINKING);
            }
            AppEvent::PreTaskStarted(name) => {
                self.push_line(format!("● Running {name} agent..."));
            }
            AppEvent::PreTaskEnded(name) => {
                self.push_line(format!("● Completed {name} agent"));
            }
            AppEvent::TurnCompleted(outcome) => self.on_turn_completed(outcome),
        }
    }

    fn on_tool_requested(&mut self, request: ToolCallRequest) {
        let tier = request.tier;
        let mut prompt = format!(
            "{}{}",
            tier.line_prefix(),
            format_tool(&request.name, &request.args)
        );
        if let Some(reason) = &request.rejection {
            prompt.push_str(&format!(" (sandbox refused: {reason})"));
        }

        let Some(sink) = request.decision else {
            let line = self.push_line(prompt);
            self.set_tool_line(tier, line);
            return;
        };

        let line = self.push_line(format!("{prompt}{APPROVAL_SUFFIX}"));
        self.set_tool_line(tier, line);
        self.arm(
            tier,
            PendingApproval {
                kind: PendingKind::Tool,
                sink,
                line,
                prompt,
            },
        );
        self.spinner.set_text(match tier {
            Tier::Primary => "Waiting for approval...",
            Tier::Nested => "Waiting for subagent approval...",
        });
    }

    fn on_fallback_requested(&mut self, request: FallbackRequest) {
        let prompt = format!(
            "● Sandbox refused `{}` ({}). Run outside the sandbox?",
            request.command, request.reason
        );
        let line = self.push_line(format!("{prompt}{APPROVAL_SUFFIX}"));
        // the command's result gets a line of its own below the prompt
        self.primary_tool_line = None;
        self.arm(
            Tier::Primary,
            PendingApproval {
                kind: PendingKind::Fallback,
                sink: request.decision,
                line,
                prompt,
            },
        );
        self.spinner.set_text("Waiting for approval...");
    }

    fn arm(&mut self, tier: Tier, pending: PendingApproval) {
        let slot = match tier {
            Tier::Primary => &mut self.pending_primary,
            Tier::Nested => &mut self.pending_nested,
        };
        if let Some(stale) = slot.replace(pending) {
            tracing::warn!(?tier, "approval requested while another was pending; denying the older one");
            stale.sink.resolve(false);
        }
    }

    fn on_tool_completed(&mut self, result: ToolCallResult) {
        let mut text = format!(
            "{}{} => {}",
            result.tier.line_prefix(),
            format_tool(&result.name, &result.args),
            result.status
        );
        if result.sandboxed {
            text.push_str(" [sandboxed]");
        }

        let line = match result.tier {
            Tier::Primary => self.primary_tool_line,
            Tier::Nested => self.nested_tool_line,
        };
        match line {
            Some(line) => self.replace_line(line, &text),
            None => {
                let line = self.push_line(text);
                self.set_tool_line(result.tier, line);
            }
        }
    }

    fn on_turn_completed(&mut self, outcome: WorkerOutcome) {
        self.processing = false;
        self.spinner.stop();
        self.primary_tool_line = None;
        self.nested_tool_line = None;
        // The worker is gone; dropping a leftover sink is a no-op.
        self.pending_primary = None;
        self.pending_nested = None;

        match outcome.result {
            Ok(Some(text)) if !text.trim().is_empty() => {
                self.push_line(text);
            }
            Ok(_) => {}
            Err(message) => {
                self.push_line(format!("Error: {message}"));
            }
        }
        if let Some(context) = outcome.context {
            self.context = context;
        }
        tracing::info!("worker finished");
    }

    fn set_tool_line(&mut self, tier: Tier, line: usize) {
        match tier {
            Tier::Primary => self.primary_tool_line = Some(line),
            Tier::Nested => self.nested_tool_line = Some(line),
        }
    }

    /// Appends a wrapped entry and pins the view to the bottom.
    pub fn push_line(&mut self, text: impl AsRef<str>) -> usize {
        self.scroll_from_bottom = 0;
        self.log.push(wrap(text.as_ref(), wrap_width(self.width)))
    }

    fn replace_line(&mut self, index: usize, text: &str) {
        self.log.replace(index, wrap(text, wrap_width(self.width)));
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
        self.primary_tool_line = None;
        self.nested_tool_line = None;
        self.scroll_from_bottom = 0;
    }

    pub fn start_processing(&mut self, text: &str) {
        self.processing = true;
        self.spinner.start(text);
    }

    /// Rows available to the message log.
    pub fn viewport_height(&self) -> u16 {
        self.height
            .saturating_sub(CHROME_HEIGHT + self.palette.height())
            .max(1)
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn input(&self) -> &InputField {
        &self.input
    }

    pub fn spinner(&self) -> &Spinner {
        &self.spinner
    }

    pub fn spinner_mut(&mut self) -> &mut Spinner {
        &mut self.spinner
    }

    pub fn palette(&self) -> &CommandPopup {
        &self.palette
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn has_pending(&self, tier: Tier) -> bool {
        match tier {
            Tier::Primary => self.pending_primary.is_some(),
            Tier::Nested => self.pending_nested.is_some(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn context(&self) -> ContextInfo {
        self.context
    }

    pub fn set_context(&mut self, context: ContextInfo) {
        self.context = context;
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn scroll_from_bottom(&self) -> usize {
        self.scroll_from_bottom
    }
}
