//! Append-only conversation log shown in the viewport.
//!
//! Entries are wrapped once, when they are appended or replaced. A resize changes how many
//! lines are visible but never re-wraps history.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Narrowest wrap width, however small the terminal.
const MIN_WRAP_WIDTH: usize = 40;

/// Wrap width for a terminal `width` columns wide.
pub fn wrap_width(width: u16) -> usize {
    usize::from(width).saturating_sub(2).max(MIN_WRAP_WIDTH)
}

/// Word-wraps `text` to `width` display columns. Words longer than a line are broken.
pub fn wrap(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut out: Vec<String> = Vec::new();

    for line in text.split('\n') {
        if line.width() <= width {
            out.push(line.to_string());
            continue;
        }

        let mut current = String::new();
        let mut current_width = 0usize;
        let mut at_line_start = true;

        for word in line.split(' ') {
            let word_width = word.width();
            let sep = usize::from(!at_line_start);

            if current_width + sep + word_width <= width {
                if sep == 1 {
                    current.push(' ');
                }
                current.push_str(word);
                current_width += sep + word_width;
                at_line_start = false;
                continue;
            }

            if !at_line_start {
                out.push(std::mem::take(&mut current));
                current_width = 0;
            }
            for ch in word.chars() {
                let ch_width = ch.width().unwrap_or(0);
                if current_width + ch_width > width && current_width > 0 {
                    out.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                current.push(ch);
                current_width += ch_width;
            }
            at_line_start = false;
        }
        out.push(current);
    }

    out.join("\n")
}

#[derive(Debug, Default, Clone)]
pub struct MessageLog {
    entries: Vec<String>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry and returns its index.
    pub fn push(&mut self, entry: impl Into<String>) -> usize {
        self.entries.push(entry.into());
        self.entries.len() - 1
    }

    /// Rewrites the entry at `index`. Returns `false` if there is no such entry.
    pub fn replace(&mut self, index: usize, entry: impl Into<String>) -> bool {
        match self.entries.get_mut(index) {
            Some(slot) => {
                *slot = entry.into();
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    /// Every display line, in order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().flat_map(|entry| entry.split('\n'))
    }

    pub fn line_count(&self) -> usize {
        self.lines().count()
    }
}
