//! Raw-mode terminal setup and the merged stream of input events and redraw requests.

use std::{
    io::{self, IsTerminal, Stdout, stdin, stdout},
    panic,
    pin::Pin,
    time::Duration,
};

use crossterm::{
    event::{
        DisableBracketedPaste, EnableBracketedPaste, Event, EventStream, KeyEvent,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, terminal,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Size};
use tokio::sync::broadcast;
use tokio_stream::{Stream, StreamExt};

use super::response_filter::{BURST_WINDOW, ResponseFilter};

/// Redraws are coalesced to at most one per interval.
pub const TARGET_FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub type TerminalType = Terminal<CrosstermBackend<Stdout>>;

pub type TuiEventStream = Pin<Box<dyn Stream<Item = TuiEvent> + Send + 'static>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    Key(KeyEvent),
    Paste(String),
    /// A scheduled frame is due.
    Draw,
    Resize(u16, u16),
}

/// Puts the terminal in raw mode with bracketed paste; fails when not attached to a TTY.
pub fn init() -> io::Result<TerminalType> {
    if !stdin().is_terminal() || !stdout().is_terminal() {
        return Err(io::Error::other("bono needs an interactive terminal"));
    }

    execute!(stdout(), EnableBracketedPaste)?;
    terminal::enable_raw_mode()?;
    // a bare Esc must not wait for the rest of an escape sequence
    let _ = execute!(
        stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
    );

    let hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = restore();
        hook(info);
    }));

    Terminal::new(CrosstermBackend::new(stdout()))
}

/// Undoes [`init`]. Safe to call more than once.
pub fn restore() -> io::Result<()> {
    let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
    execute!(stdout(), DisableBracketedPaste)?;
    terminal::disable_raw_mode()?;
    let _ = execute!(stdout(), crossterm::cursor::Show);
    Ok(())
}

/// Maps one terminal event to UI events, holding back keys that may belong to a terminal reply.
fn translate(event: Event, filter: &mut ResponseFilter) -> Vec<TuiEvent> {
    match event {
        Event::Key(key) => filter.push(key).into_iter().map(TuiEvent::Key).collect(),
        Event::Paste(text) => {
            let mut out: Vec<TuiEvent> = filter.flush().into_iter().map(TuiEvent::Key).collect();
            out.push(TuiEvent::Paste(text));
            out
        }
        Event::Resize(width, height) => vec![TuiEvent::Resize(width, height)],
        _ => Vec::new(),
    }
}

/// Interleaves terminal input with frame requests.
fn merge_events<S>(mut input: Option<S>, mut draw_rx: broadcast::Receiver<()>) -> TuiEventStream
where
    S: Stream<Item = io::Result<Event>> + Send + Unpin + 'static,
{
    Box::pin(async_stream::stream! {
        let mut filter = ResponseFilter::new();

        loop {
            let holding = filter.is_pending();
            tokio::select! {
                next = async {
                    match &mut input {
                        Some(input) => input.next().await,
                        None => None,
                    }
                }, if input.is_some() => match next {
                    Some(Ok(event)) => {
                        for event in translate(event, &mut filter) {
                            yield event;
                        }
                    }
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "terminal input failed");
                        break;
                    }
                    None => {
                        tracing::info!("terminal input closed");
                        break;
                    }
                },

                _ = tokio::time::sleep(BURST_WINDOW), if holding => {
                    for key in filter.flush() {
                        yield TuiEvent::Key(key);
                    }
                }

                Ok(()) = draw_rx.recv() => {
                    yield TuiEvent::Draw;
                }

                else => break,
            }
        }

        for key in filter.flush() {
            yield TuiEvent::Key(key);
        }
    })
}

pub struct Tui {
    terminal: TerminalType,
    draw_tx: broadcast::Sender<()>,
    input: Option<EventStream>,
}

impl Tui {
    pub fn new(terminal: TerminalType) -> Self {
        let (draw_tx, _) = broadcast::channel(1);
        Self {
            terminal,
            draw_tx,
            input: Some(EventStream::new()),
        }
    }

    /// Sending `()` here yields a [`TuiEvent::Draw`] from the event stream.
    pub fn frame_requester(&self) -> broadcast::Sender<()> {
        self.draw_tx.clone()
    }

    /// Takes the terminal input; a second call yields draw requests only. The stream ends when
    /// the terminal input does.
    pub fn event_stream(&mut self) -> TuiEventStream {
        merge_events(self.input.take(), self.draw_tx.subscribe())
    }

    pub fn draw<F>(&mut self, render: F) -> io::Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(render)?;
        Ok(())
    }

    pub fn clear(&mut self) -> io::Result<()> {
        self.terminal.clear()
    }

    pub fn enter_alt_screen(&mut self) -> io::Result<()> {
        execute!(self.terminal.backend_mut(), EnterAlternateScreen)
    }

    pub fn leave_alt_screen(&mut self) -> io::Result<()> {
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)
    }

    pub fn size(&self) -> io::Result<Size> {
        self.terminal.size()
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;

    fn char_key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn test_paste_releases_held_keys_first() {
        let mut filter = ResponseFilter::new();
        assert!(translate(char_key('a'), &mut filter).is_empty());

        let events = translate(Event::Paste("text".into()), &mut filter);
        assert_eq!(
            events,
            vec![
                TuiEvent::Key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE)),
                TuiEvent::Paste("text".into()),
            ]
        );
    }

    #[test]
    fn test_resize_and_ignored_events() {
        let mut filter = ResponseFilter::new();
        assert_eq!(
            translate(Event::Resize(100, 40), &mut filter),
            vec![TuiEvent::Resize(100, 40)]
        );
        assert!(translate(Event::FocusGained, &mut filter).is_empty());
    }

    #[test]
    fn test_enter_passes_through() {
        let mut filter = ResponseFilter::new();
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(
            translate(Event::Key(enter), &mut filter),
            vec![TuiEvent::Key(enter)]
        );
    }

    #[tokio::test]
    async fn test_stream_ends_with_terminal_input() {
        let (draw_tx, _) = broadcast::channel(1);
        let input = tokio_stream::iter(vec![Ok(Event::Key(KeyEvent::new(
            KeyCode::Enter,
            KeyModifiers::NONE,
        )))]);

        let events: Vec<TuiEvent> = merge_events(Some(input), draw_tx.subscribe())
            .collect()
            .await;
        assert_eq!(
            events,
            vec![TuiEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))]
        );
    }
}
