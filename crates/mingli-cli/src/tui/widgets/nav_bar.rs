use mingli_core::model::User;
use mingli_core::view::NavTab;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Top navigation bar: home plus one entry per chart, and who is logged in.
pub struct NavBar<'a> {
    pub active: NavTab,
    pub user: Option<&'a User>,
    pub busy: bool,
}

impl Widget for NavBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans: Vec<Span> = Vec::new();

        for (i, tab) in NavTab::ALL.iter().enumerate() {
            let style = if *tab == self.active {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            spans.push(Span::styled(format!(" {} ", tab.label()), style));

            if i < NavTab::ALL.len() - 1 {
                spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
            }
        }

        if self.busy {
            spans.push(Span::styled(
                "  ⟳",
                Style::default().fg(Color::Yellow),
            ));
        }

        if let Some(user) = self.user {
            spans.push(Span::styled("   ", Style::default()));
            spans.push(Span::styled(
                user.nickname.as_str(),
                Style::default().fg(Color::Magenta),
            ));
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
