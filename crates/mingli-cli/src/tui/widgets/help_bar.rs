use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::tui::app::Mode;

/// Bottom help bar showing context-sensitive key bindings.
pub struct HelpBar {
    pub mode: Mode,
}

impl Widget for HelpBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::DarkGray);
        let key_style = Style::default().fg(Color::Cyan);

        let bindings: &[(&str, &str)] = match self.mode {
            Mode::Welcome => &[("l", " log in  "), ("q", " quit")],
            Mode::List => &[
                ("j/k", " navigate  "),
                ("Enter", " analyse  "),
                ("1/2/3", " chart  "),
                ("h/p", " home/profile  "),
                ("n", " new  "),
                ("e", " edit  "),
                ("d", " delete  "),
                ("r", " refresh  "),
                ("L", " logout  "),
                ("q", " quit"),
            ],
            Mode::Form => &[
                ("Tab", " next field  "),
                ("Shift+Tab", " prev field  "),
                ("Space", " toggle gender  "),
                ("Ctrl+S", " save  "),
                ("Esc", " cancel"),
            ],
            Mode::Confirm => &[("y", " delete  "), ("n/Esc", " keep")],
            Mode::Analysis => &[
                ("1/2/3", " chart  "),
                ("←/→", " switch  "),
                ("j/k", " scroll  "),
                ("r", " retry  "),
                ("Esc", " back  "),
                ("q", " quit"),
            ],
        };

        let spans: Vec<Span> = bindings
            .iter()
            .flat_map(|(key, desc)| {
                [
                    Span::styled(*key, key_style),
                    Span::styled(*desc, style),
                ]
            })
            .collect();

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
