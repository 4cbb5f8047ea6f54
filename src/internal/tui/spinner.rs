//! Animated liveness indicator shown above the input box.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpinnerStyle {
    Line,
    #[default]
    Dot,
    MiniDot,
    Jump,
    Pulse,
    Points,
    Globe,
    Moon,
    Monkey,
    Meter,
    Hamburger,
    Ellipsis,
}

impl SpinnerStyle {
    pub const ALL: [SpinnerStyle; 12] = [
        SpinnerStyle::Line,
        SpinnerStyle::Dot,
        SpinnerStyle::MiniDot,
        SpinnerStyle::Jump,
        SpinnerStyle::Pulse,
        SpinnerStyle::Points,
        SpinnerStyle::Globe,
        SpinnerStyle::Moon,
        SpinnerStyle::Monkey,
        SpinnerStyle::Meter,
        SpinnerStyle::Hamburger,
        SpinnerStyle::Ellipsis,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpinnerStyle::Line => "line",
            SpinnerStyle::Dot => "dot",
            SpinnerStyle::MiniDot => "minidot",
            SpinnerStyle::Jump => "jump",
            SpinnerStyle::Pulse => "pulse",
            SpinnerStyle::Points => "points",
            SpinnerStyle::Globe => "globe",
            SpinnerStyle::Moon => "moon",
            SpinnerStyle::Monkey => "monkey",
            SpinnerStyle::Meter => "meter",
            SpinnerStyle::Hamburger => "hamburger",
            SpinnerStyle::Ellipsis => "ellipsis",
        }
    }

    /// Unknown names fall back to the default style.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn frames(self) -> &'static [&'static str] {
        match self {
            SpinnerStyle::Line => &["|", "/", "-", "\\"],
            SpinnerStyle::Dot => &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"],
            SpinnerStyle::MiniDot => &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"],
            SpinnerStyle::Jump => &["⢄", "⢂", "⢁", "⡁", "⡈", "⡐", "⡠"],
            SpinnerStyle::Pulse => &["█", "▓", "▒", "░"],
            SpinnerStyle::Points => &["∙∙∙", "●∙∙", "∙●∙", "∙∙●"],
            SpinnerStyle::Globe => &["🌍", "🌎", "🌏"],
            SpinnerStyle::Moon => &["🌑", "🌒", "🌓", "🌔", "🌕", "🌖", "🌗", "🌘"],
            SpinnerStyle::Monkey => &["🙈", "🙉", "🙊"],
            SpinnerStyle::Meter => &["▱▱▱", "▰▱▱", "▰▰▱", "▰▰▰", "▰▰▱", "▰▱▱", "▱▱▱"],
            SpinnerStyle::Hamburger => &["☱", "☲", "☴", "☲"],
            SpinnerStyle::Ellipsis => &["", ".", "..", "..."],
        }
    }

    fn fps(self) -> u64 {
        match self {
            SpinnerStyle::Line | SpinnerStyle::Dot | SpinnerStyle::Jump => 10,
            SpinnerStyle::MiniDot => 12,
            SpinnerStyle::Pulse | SpinnerStyle::Moon => 8,
            SpinnerStyle::Points | SpinnerStyle::Meter => 7,
            SpinnerStyle::Globe => 4,
            SpinnerStyle::Monkey | SpinnerStyle::Hamburger | SpinnerStyle::Ellipsis => 3,
        }
    }

    pub fn interval(self) -> Duration {
        Duration::from_millis(1000 / self.fps())
    }
}

/// Spinner frame plus status text while active; the idle text (working directory) otherwise.
#[derive(Debug, Clone)]
pub struct Spinner {
    style: SpinnerStyle,
    frame: usize,
    text: String,
    idle_text: String,
    active: bool,
}

impl Spinner {
    pub fn new(style: SpinnerStyle, idle_text: impl Into<String>) -> Self {
        Self {
            style,
            frame: 0,
            text: String::new(),
            idle_text: idle_text.into(),
            active: false,
        }
    }

    pub fn start(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.frame = 0;
        self.active = true;
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> SpinnerStyle {
        self.style
    }

    pub fn set_style(&mut self, style: SpinnerStyle) {
        self.style = style;
        self.frame = 0;
    }

    pub fn cycle_style(&mut self) -> SpinnerStyle {
        self.set_style(self.style.next());
        self.style
    }

    /// Advances one frame. Idle spinners do not animate.
    pub fn tick(&mut self) {
        if self.active {
            self.frame = (self.frame + 1) % self.style.frames().len();
        }
    }

    pub fn interval(&self) -> Duration {
        self.style.interval()
    }

    pub fn frame(&self) -> &'static str {
        let frames = self.style.frames();
        frames[self.frame % frames.len()]
    }

    /// The line to render.
    pub fn display(&self) -> String {
        if self.active {
            format!("{} {}", self.frame(), self.text)
        } else {
            self.idle_text.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!(SpinnerStyle::parse("moon"), SpinnerStyle::Moon);
        assert_eq!(SpinnerStyle::parse(" MiniDot "), SpinnerStyle::MiniDot);
        assert_eq!(SpinnerStyle::parse("sparkles"), SpinnerStyle::Dot);
        for style in SpinnerStyle::ALL {
            assert_eq!(SpinnerStyle::parse(style.name()), style);
        }
    }

    #[test]
    fn test_next_cycles_through_all() {
        let mut style = SpinnerStyle::Line;
        for _ in 0..SpinnerStyle::ALL.len() {
            style = style.next();
        }
        assert_eq!(style, SpinnerStyle::Line);
        assert_eq!(SpinnerStyle::Ellipsis.next(), SpinnerStyle::Line);
    }

    #[test]
    fn test_display_idle_and_active() {
        let mut spinner = Spinner::new(SpinnerStyle::Line, "/work");
        assert_eq!(spinner.display(), "/work");

        spinner.start("Thinking...");
        assert_eq!(spinner.display(), "| Thinking...");
        spinner.tick();
        assert_eq!(spinner.display(), "/ Thinking...");

        spinner.stop();
        spinner.tick();
        assert_eq!(spinner.display(), "/work");
    }

    #[test]
    fn test_intervals() {
        assert_eq!(SpinnerStyle::Dot.interval(), Duration::from_millis(100));
        assert_eq!(SpinnerStyle::Monkey.interval(), Duration::from_millis(333));
    }
}
