//! Single-line input field.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const PLACEHOLDER: &str = "Type a message or ask a question...";

#[derive(Debug, Default, Clone)]
pub struct InputField {
    value: String,
    /// Byte offset of the cursor in `value`.
    cursor_pos: usize,
}

impl InputField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replaces the text and moves the cursor to the end.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor_pos = self.value.len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor_pos = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn insert_char(&mut self, c: char) {
        self.value.insert(self.cursor_pos, c);
        self.cursor_pos += c.len_utf8();
    }

    /// Inserts pasted text; line breaks become spaces.
    pub fn insert_str(&mut self, text: &str) {
        let text: String = text
            .chars()
            .filter(|c| *c != '\r')
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();
        self.value.insert_str(self.cursor_pos, &text);
        self.cursor_pos += text.len();
    }

    pub fn backspace(&mut self) {
        if self.cursor_pos > 0 {
            let prev_pos = self.prev_char_pos();
            self.value.remove(prev_pos);
            self.cursor_pos = prev_pos;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor_pos < self.value.len() {
            self.value.remove(self.cursor_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos = self.prev_char_pos();
        }
    }

    pub fn cursor_right(&mut self) {
        if self.cursor_pos < self.value.len() {
            self.cursor_pos = self.next_char_pos();
        }
    }

    /// Applies an editing key. Returns `false` for keys the field ignores.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('a') if ctrl => self.cursor_pos = 0,
            KeyCode::Char('e') if ctrl => self.cursor_pos = self.value.len(),
            KeyCode::Char('u') if ctrl => self.clear(),
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.insert_char(c)
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.cursor_left(),
            KeyCode::Right => self.cursor_right(),
            KeyCode::Home => self.cursor_pos = 0,
            KeyCode::End => self.cursor_pos = self.value.len(),
            _ => return false,
        }
        true
    }

    /// Renders the bordered box and returns where the cursor belongs.
    pub fn render(&self, area: Rect, buf: &mut Buffer) -> Option<Position> {
        let block = Block::default()
            .borders(Borders::TOP | Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);

        let prompt = "> ";
        let content_width = usize::from(inner.width).saturating_sub(prompt.width());
        let (line, cursor_x) = if self.value.is_empty() {
            (
                Line::from(vec![
                    Span::raw(prompt),
                    Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)),
                ]),
                0u16,
            )
        } else {
            let (visible, cursor_x) = self.visible_input_and_cursor_x(content_width);
            (Line::from(vec![Span::raw(prompt), Span::raw(visible)]), cursor_x)
        };

        Paragraph::new(line).block(block).render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return None;
        }
        Some(Position {
            x: inner.x.saturating_add(prompt.width() as u16).saturating_add(cursor_x),
            y: inner.y,
        })
    }

    fn prev_char_pos(&self) -> usize {
        let s = &self.value[..self.cursor_pos];
        s.char_indices().next_back().map(|(i, _)| i).unwrap_or(0)
    }

    fn next_char_pos(&self) -> usize {
        let s = &self.value[self.cursor_pos..];
        s.char_indices()
            .nth(1)
            .map(|(i, _)| self.cursor_pos + i)
            .unwrap_or(self.value.len())
    }

    /// Horizontal scroll so the cursor stays visible.
    fn visible_input_and_cursor_x(&self, content_width: usize) -> (String, u16) {
        if content_width == 0 {
            return (String::new(), 0);
        }

        let prefix = &self.value[..self.cursor_pos.min(self.value.len())];
        let cursor_col = prefix.width();
        let scroll_cols = cursor_col.saturating_sub(content_width.saturating_sub(1));

        let start_byte = byte_index_at_display_col(&self.value, scroll_cols);
        let visible = take_by_display_width(&self.value[start_byte..], content_width);
        let cursor_x = cursor_col.saturating_sub(scroll_cols).min(u16::MAX as usize) as u16;

        (visible.to_string(), cursor_x)
    }
}

fn byte_index_at_display_col(s: &str, col: usize) -> usize {
    if col == 0 {
        return 0;
    }
    let mut acc = 0usize;
    for (byte_idx, ch) in s.char_indices() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if acc + w > col {
            return byte_idx;
        }
        acc += w;
    }
    s.len()
}

fn take_by_display_width(s: &str, max_cols: usize) -> &str {
    let mut acc = 0usize;
    let mut end = 0usize;
    for (byte_idx, ch) in s.char_indices() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if acc + w > max_cols {
            break;
        }
        acc += w;
        end = byte_idx + ch.len_utf8();
    }
    &s[..end]
}
