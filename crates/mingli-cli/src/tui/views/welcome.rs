use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const LOGO: &[&str] = &[
    r"           _             _ _ ",
    r" _ __ ___ (_)_ __   __ _| (_)",
    r"| '_ ` _ \| | '_ \ / _` | | |",
    r"| | | | | | | | | | (_| | | |",
    r"|_| |_| |_|_|_| |_|\__, |_|_|",
    r"                   |___/     ",
];

pub fn render(frame: &mut Frame, area: Rect, busy: bool) {
    let block_height = LOGO.len() as u16 + 8;
    let block_width = 44;

    let [center_y] = Layout::vertical([Constraint::Length(block_height)])
        .flex(Flex::Center)
        .areas(area);
    let [center] = Layout::horizontal([Constraint::Length(block_width)])
        .flex(Flex::Center)
        .areas(center_y);

    let mut lines: Vec<Line> = Vec::new();

    // Logo
    for row in LOGO {
        lines.push(Line::from(Span::styled(
            *row,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )));
    }

    lines.push(Line::from(""));

    // Tagline
    lines.push(Line::from(Span::styled(
        "     命理 · 八字  紫微斗数  西洋星盘",
        Style::default().fg(Color::DarkGray),
    )));

    lines.push(Line::from(""));

    if busy {
        lines.push(Line::from(Span::styled(
            "          Logging in...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
    } else {
        lines.push(Line::from(vec![
            Span::styled("        press ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                "l",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" to log in, ", Style::default().fg(Color::DarkGray)),
            Span::styled("q", Style::default().fg(Color::Cyan)),
            Span::styled(" to quit", Style::default().fg(Color::DarkGray)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), center);
}
