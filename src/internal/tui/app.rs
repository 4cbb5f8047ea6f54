//! Main application structure and event loop.
//!
//! The `App` owns the terminal and the [`Session`], multiplexes terminal events, worker events
//! and spinner ticks into [`Session::handle`], and executes the resulting [`Action`]s by spawning
//! agent workers.

use std::{sync::Arc, time::Instant};

use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
    time::{Interval, MissedTickBehavior, interval, sleep},
};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use super::{
    app_event::{AppEvent, AppEventSender, WorkerOutcome},
    bridge::TuiHooks,
    session::{Action, ExitReason, Session, UiEvent},
    spinner::SpinnerStyle,
    terminal::{TARGET_FRAME_INTERVAL, Tui, TuiEvent},
    view,
};
use crate::internal::ai::AgentCore;

/// Information about the app exit state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppExitInfo {
    pub reason: ExitReason,
}

pub struct AppConfig {
    pub spinner: SpinnerStyle,
    /// Shown in the spinner line while idle.
    pub idle_text: String,
}

/// Work a spawned worker performs.
#[derive(Debug, Clone)]
enum Work {
    Turn(String),
    PreTask(String),
}

/// A terminal that stops delivering input can never answer a prompt again.
fn input_closed() -> Action {
    tracing::warn!("terminal input ended");
    Action::Quit(ExitReason::Interrupted)
}

pub struct App {
    tui: Tui,
    session: Session,
    agent: Arc<dyn AgentCore>,
    app_event_tx: UnboundedSender<AppEvent>,
    app_event_rx: UnboundedReceiver<AppEvent>,
    /// Cancelled on quit; releases every approval wait and silences workers.
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
    last_draw_time: Instant,
    /// Delayed draw task for frame coalescing inside frame interval.
    scheduled_draw_task: Option<JoinHandle<()>>,
    exit_info: Option<AppExitInfo>,
}

impl App {
    pub fn new(tui: Tui, agent: Arc<dyn AgentCore>, config: AppConfig) -> Self {
        let (app_event_tx, app_event_rx) = mpsc::unbounded_channel();
        let mut session = Session::new(agent.model_name(), config.spinner, config.idle_text);
        session.set_context(agent.context_info());
        Self {
            tui,
            session,
            agent,
            app_event_tx,
            app_event_rx,
            cancel: CancellationToken::new(),
            worker: None,
            last_draw_time: Instant::now(),
            scheduled_draw_task: None,
            exit_info: None,
        }
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> anyhow::Result<AppExitInfo> {
        self.tui.enter_alt_screen()?;
        let run_result = self.run_in_alt_screen().await;
        self.shutdown();
        let leave_result = self.tui.leave_alt_screen();

        match (run_result, leave_result) {
            (Ok(exit_info), Ok(())) => Ok(exit_info),
            (Err(run_err), _) => Err(run_err),
            (Ok(_), Err(leave_err)) => Err(leave_err.into()),
        }
    }

    async fn run_in_alt_screen(&mut self) -> anyhow::Result<AppExitInfo> {
        self.tui.clear()?;
        let size = self.tui.size()?;
        self.session.handle(UiEvent::Resize(size.width, size.height));
        self.draw()?;

        let mut event_stream = self.tui.event_stream();
        let mut ticker = spinner_ticker(self.session.spinner().style());

        loop {
            let spinning = self.session.spinner().is_active();
            let action = tokio::select! {
                event = event_stream.next() => match event {
                    Some(event) => self.handle_tui_event(event)?,
                    None => Some(input_closed()),
                },

                Some(event) = self.app_event_rx.recv() => {
                    self.schedule_draw();
                    self.session.handle(UiEvent::App(event))
                }

                _ = ticker.tick(), if spinning => {
                    self.schedule_draw();
                    self.session.handle(UiEvent::Tick)
                }
            };

            if ticker.period() != self.session.spinner().interval() {
                ticker = spinner_ticker(self.session.spinner().style());
            }

            if let Some(action) = action
                && self.execute(action)
            {
                break;
            }
        }

        Ok(self.exit_info.clone().unwrap_or(AppExitInfo {
            reason: ExitReason::UserRequested,
        }))
    }

    fn handle_tui_event(&mut self, event: TuiEvent) -> anyhow::Result<Option<Action>> {
        let action = match event {
            TuiEvent::Key(key) => self.session.handle(UiEvent::Key(key)),
            TuiEvent::Paste(text) => self.session.handle(UiEvent::Paste(text)),
            TuiEvent::Resize(width, height) => self.session.handle(UiEvent::Resize(width, height)),
            TuiEvent::Draw => {
                self.scheduled_draw_task = None;
                self.last_draw_time = Instant::now();
                self.draw()?;
                return Ok(None);
            }
        };
        self.schedule_draw();
        Ok(action)
    }

    /// Returns `true` when the loop should exit.
    fn execute(&mut self, action: Action) -> bool {
        match action {
            Action::StartTurn(input) => self.spawn_worker(Work::Turn(input)),
            Action::RunPreTask(name) => self.spawn_worker(Work::PreTask(name)),
            Action::Quit(reason) => {
                tracing::info!(?reason, "quit requested");
                self.exit_info = Some(AppExitInfo { reason });
                return true;
            }
        }
        false
    }

    fn spawn_worker(&mut self, work: Work) {
        if let Some(previous) = self.worker.take()
            && !previous.is_finished()
        {
            tracing::warn!("worker still running while a new one starts");
        }

        let agent = Arc::clone(&self.agent);
        let events = AppEventSender::new(self.app_event_tx.clone(), self.cancel.clone());
        let cancel = self.cancel.clone();

        self.worker = Some(tokio::spawn(async move {
            let hooks = TuiHooks::new(events.clone());
            let result = match work {
                Work::Turn(input) => agent.chat(&input, &hooks, &cancel).await.map(Some),
                Work::PreTask(name) => agent
                    .run_pre_task(&name, &hooks, &cancel)
                    .await
                    .map(|()| None),
            };
            let result = result.map_err(|err| {
                tracing::warn!(error = %err, "worker failed");
                err.to_string()
            });
            events.send(AppEvent::TurnCompleted(WorkerOutcome {
                result,
                context: Some(agent.context_info()),
            }));
        }));
    }

    /// Denies anything pending, cancels waits and stops the worker.
    fn shutdown(&mut self) {
        self.session.deny_all();
        self.cancel.cancel();
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
        if let Some(task) = self.scheduled_draw_task.take() {
            task.abort();
        }
        tracing::info!("session cancelled");
    }

    /// Schedule a frame draw with frame rate limiting.
    fn schedule_draw(&mut self) {
        if self
            .scheduled_draw_task
            .as_ref()
            .is_some_and(JoinHandle::is_finished)
        {
            self.scheduled_draw_task = None;
        }

        let elapsed = Instant::now().duration_since(self.last_draw_time);
        if elapsed >= TARGET_FRAME_INTERVAL {
            if let Some(task) = self.scheduled_draw_task.take() {
                task.abort();
            }
            let _ = self.tui.frame_requester().send(());
            return;
        }

        if self.scheduled_draw_task.is_some() {
            return;
        }

        let delay = TARGET_FRAME_INTERVAL - elapsed;
        let draw_tx = self.tui.frame_requester();
        self.scheduled_draw_task = Some(tokio::spawn(async move {
            sleep(delay).await;
            let _ = draw_tx.send(());
        }));
    }

    fn draw(&mut self) -> anyhow::Result<()> {
        self.tui.draw(|frame| view::render(&self.session, frame))?;
        Ok(())
    }
}

fn spinner_ticker(style: SpinnerStyle) -> Interval {
    let mut ticker = interval(style.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_input_quits_as_interrupted() {
        assert_eq!(input_closed(), Action::Quit(ExitReason::Interrupted));
    }
}
