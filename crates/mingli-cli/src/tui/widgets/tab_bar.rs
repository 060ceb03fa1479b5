use mingli_core::view::KindTab;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Chart tabs of the analysis screen. A dot marks charts already fetched,
/// an ellipsis marks charts still loading.
pub struct TabBar<'a> {
    pub tabs: &'a [KindTab],
}

impl Widget for TabBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans: Vec<Span> = Vec::new();

        for (i, tab) in self.tabs.iter().enumerate() {
            let marker = if tab.loading {
                "…"
            } else if tab.cached {
                "•"
            } else {
                " "
            };

            let style = if tab.active {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            spans.push(Span::styled(
                format!(" {} {}{marker}", i + 1, tab.kind.label()),
                style,
            ));
            spans.push(Span::raw(" "));
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
