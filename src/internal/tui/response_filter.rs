//! Drops terminal replies that arrive disguised as typed keys.
//!
//! Some terminals answer colour or cursor queries on stdin. When the reply is not recognised
//! it reaches us as a burst of key presses (`]11;rgb:…`, `[12;1R`). Such bursts arrive within
//! a few milliseconds of each other, far faster than anyone types, so candidate keys are held
//! until the input goes quiet and the whole burst is then either released or dropped.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Quiet period that ends a burst.
pub const BURST_WINDOW: Duration = Duration::from_millis(3);

/// Whether `s` looks like a terminal response rather than user input.
pub fn is_terminal_response(s: &str) -> bool {
    // OSC replies, e.g. `]11;rgb:1e1e/1e1e/1e1e`
    if s.starts_with(']') || s.contains("rgb:") {
        return true;
    }
    // cursor position reports, e.g. `[12;1R`
    if s.starts_with('[') && s.ends_with('R') {
        return true;
    }
    if s.contains('\x1b') {
        return true;
    }
    // tail of a split reply
    s.starts_with(';')
}

#[derive(Debug, Default)]
pub struct ResponseFilter {
    burst: Vec<KeyEvent>,
}

impl ResponseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys still held back waiting for the quiet period.
    pub fn is_pending(&self) -> bool {
        !self.burst.is_empty()
    }

    /// Offers a key. Returns the keys to deliver now, in order.
    pub fn push(&mut self, key: KeyEvent) -> Vec<KeyEvent> {
        if is_candidate(&key) {
            self.burst.push(key);
            return Vec::new();
        }
        let mut out = self.flush();
        out.push(key);
        out
    }

    /// Ends the current burst, returning its keys unless they spell a terminal response.
    pub fn flush(&mut self) -> Vec<KeyEvent> {
        let burst = std::mem::take(&mut self.burst);
        if burst.len() < 2 {
            return burst;
        }

        let text: String = burst
            .iter()
            .filter_map(|key| match key.code {
                KeyCode::Char(c) => Some(c),
                KeyCode::Esc => Some('\x1b'),
                _ => None,
            })
            .collect();
        if is_terminal_response(&text) {
            tracing::debug!(len = burst.len(), "dropped terminal response burst");
            return Vec::new();
        }
        burst
    }
}

fn is_candidate(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    let plain = !key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    matches!(key.code, KeyCode::Esc) || (plain && matches!(key.code, KeyCode::Char(_)))
}
