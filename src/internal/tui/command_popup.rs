use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Widget},
};

use super::slash_command::{self, SlashCommand};

/// Tallest the popup gets, borders included.
const COMMAND_POPUP_MAX_HEIGHT: usize = 8;
const COMMAND_POPUP_MAX_ITEMS: usize = COMMAND_POPUP_MAX_HEIGHT - 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CommandPopupItem {
    name: &'static str,
    description: &'static str,
    selected: bool,
}

/// Command palette filtered by the current input. Its view is recomputed from the input text;
/// Esc or Tab hides it until the input changes.
#[derive(Debug, Clone, Default)]
pub struct CommandPopup {
    commands: Vec<&'static SlashCommand>,
    selected_index: usize,
    dismissed: bool,
    input: String,
}

impl CommandPopup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the filtered list when the input text changed.
    pub fn update(&mut self, input: &str) {
        if self.input == input {
            return;
        }
        self.input = input.to_string();
        self.dismissed = false;
        self.commands = slash_command::matching(input);
        if self.selected_index >= self.commands.len() {
            self.selected_index = 0;
        }
    }

    pub fn is_active(&self) -> bool {
        !self.dismissed && !self.commands.is_empty()
    }

    pub fn dismiss(&mut self) {
        self.dismissed = true;
        self.selected_index = 0;
    }

    /// Rows used on screen, borders included.
    pub fn height(&self) -> u16 {
        if self.is_active() {
            (self.commands.len() + 2).min(COMMAND_POPUP_MAX_HEIGHT) as u16
        } else {
            0
        }
    }

    pub fn move_up(&mut self) {
        if !self.commands.is_empty() {
            self.selected_index = if self.selected_index == 0 {
                self.commands.len() - 1
            } else {
                self.selected_index - 1
            };
        }
    }

    pub fn move_down(&mut self) {
        if !self.commands.is_empty() {
            self.selected_index = (self.selected_index + 1) % self.commands.len();
        }
    }

    /// `/name` of the highlighted command.
    pub fn selected_text(&self) -> Option<String> {
        self.commands
            .get(self.selected_index)
            .map(|cmd| format!("/{}", cmd.name))
    }

    /// Returns the completion for the highlighted command and hides the popup. The caller
    /// writes it into the input; the popup stays hidden while the input holds that text.
    pub fn complete(&mut self) -> Option<String> {
        let text = self.selected_text()?;
        self.input = text.clone();
        self.dismiss();
        Some(text)
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        if !self.is_active() {
            return;
        }

        let lines: Vec<Line> = self
            .get_popup_items(COMMAND_POPUP_MAX_ITEMS)
            .into_iter()
            .map(|item| {
                let (name_style, desc_style) = if item.selected {
                    let style = Style::default().fg(Color::LightMagenta);
                    (style, style)
                } else {
                    (
                        Style::default().fg(Color::White),
                        Style::default().fg(Color::DarkGray),
                    )
                };
                Line::from(vec![
                    Span::styled(format!("  /{}", item.name), name_style),
                    Span::styled(format!(" - {}", item.description), desc_style),
                ])
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        Paragraph::new(Text::from(lines)).block(block).render(area, buf);
    }

    fn get_popup_items(&self, max_items: usize) -> Vec<CommandPopupItem> {
        if max_items == 0 || self.commands.is_empty() {
            return Vec::new();
        }

        let selected = self.selected_index.min(self.commands.len() - 1);
        let start = if selected >= max_items {
            selected + 1 - max_items
        } else {
            0
        };
        let end = (start + max_items).min(self.commands.len());

        self.commands[start..end]
            .iter()
            .enumerate()
            .map(|(idx, cmd)| CommandPopupItem {
                name: cmd.name,
                description: cmd.description,
                selected: start + idx == selected,
            })
            .collect()
    }
}
