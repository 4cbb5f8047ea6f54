//! Renders a [`Session`] into a ratatui frame.

use ratatui::{
    prelude::*,
    widgets::{Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use super::session::Session;

pub const STATUS_TEXT: &str = "Bono • /help for commands • Ctrl+C to exit";

/// Lays out log, palette, spinner, input and status bar, top to bottom.
pub fn render(session: &Session, frame: &mut Frame) {
    let area = frame.area();
    let chunks = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(session.palette().height()),
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .split(area);

    render_log(session, chunks[0], frame.buffer_mut());
    session.palette().render(chunks[1], frame.buffer_mut());
    render_spinner(session, chunks[2], frame.buffer_mut());
    if let Some(pos) = session.input().render(chunks[3], frame.buffer_mut()) {
        frame.set_cursor_position(pos);
    }
    Paragraph::new(Line::styled(STATUS_TEXT, Style::default().fg(Color::DarkGray)))
        .render(chunks[4], frame.buffer_mut());
}

fn render_log(session: &Session, area: Rect, buf: &mut Buffer) {
    let log = session.log();
    let visible_lines = area.height as usize;
    let total_lines = log.line_count();
    let scroll_from_bottom = session
        .scroll_from_bottom()
        .min(total_lines.saturating_sub(visible_lines));
    let start_line = total_lines
        .saturating_sub(visible_lines)
        .saturating_sub(scroll_from_bottom);

    let lines: Vec<Line> = log
        .lines()
        .skip(start_line)
        .take(visible_lines)
        .map(style_line)
        .collect();
    Paragraph::new(Text::from(lines)).render(area, buf);

    if total_lines > visible_lines {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        let mut scrollbar_state = ScrollbarState::new(total_lines)
            .position(start_line)
            .viewport_content_length(visible_lines);
        StatefulWidget::render(scrollbar, area, buf, &mut scrollbar_state);
    }
}

fn style_line(line: &str) -> Line<'_> {
    let style = if line.starts_with("> ") {
        Style::default().fg(Color::Cyan)
    } else if line.starts_with("Error: ") {
        Style::default().fg(Color::Red)
    } else if line.ends_with("[Enter/Esc]") {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Line::styled(line, style)
}

fn render_spinner(session: &Session, area: Rect, buf: &mut Buffer) {
    let spinner = session.spinner();
    let style = if spinner.is_active() {
        Style::default().fg(Color::LightMagenta)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Paragraph::new(Line::styled(spinner.display(), style)).render(area, buf);
}

#[cfg(test)]
mod tests {
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::internal::tui::spinner::SpinnerStyle;

    fn screen(session: &Session, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(session, frame)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_renders_log_spinner_and_status() {
        let mut session = Session::new("m", SpinnerStyle::Dot, "/work/project");
        session.push_line("> hello");
        session.push_line("hi");

        let out = screen(&session, 60, 12);
        assert!(out.contains("> hello"));
        assert!(out.contains("hi"));
        assert!(out.contains("/work/project"));
        assert!(out.contains("Bono • /help for commands • Ctrl+C to exit"));
        assert!(out.contains("Type a message or ask a question..."));
    }

    #[test]
    fn test_newest_lines_visible_when_log_overflows() {
        let mut session = Session::new("m", SpinnerStyle::Dot, "");
        for i in 0..30 {
            session.push_line(format!("entry {i}"));
        }
        let out = screen(&session, 40, 10);
        assert!(out.contains("entry 29"));
        assert!(!out.contains("entry 0 "));
    }

    #[test]
    fn test_follows_bottom_past_u16_lines() {
        let mut session = Session::new("m", SpinnerStyle::Dot, "");
        for i in 0..70_000 {
            session.push_line(format!("entry {i}"));
        }
        let out = screen(&session, 40, 10);
        assert!(out.contains("entry 69999"));
        assert!(!out.contains("entry 65535 "));
    }
}
