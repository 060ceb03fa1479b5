use mingli_core::model::{AnalysisResult, AstrologyChart, BaziChart, Entries, ZiweiChart};
use mingli_core::view::{AnalysisBody, AnalysisView, ViewModel};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::{
    app::App,
    widgets::{help_bar::HelpBar, nav_bar::NavBar, tab_bar::TabBar},
};

pub fn render(frame: &mut Frame, app: &App, vm: &ViewModel, area: Rect) {
    let Some(ref analysis) = vm.analysis else {
        let msg = Paragraph::new("No record selected.").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(msg, area);
        return;
    };

    let layout = Layout::vertical([
        Constraint::Length(1), // nav bar
        Constraint::Length(2), // title
        Constraint::Length(1), // chart tabs
        Constraint::Min(5),    // body (scrollable)
        Constraint::Length(1), // help bar
    ])
    .split(area);

    frame.render_widget(
        NavBar {
            active: vm.nav,
            user: vm.user,
            busy: vm.busy,
        },
        layout[0],
    );

    let title = Line::from(vec![
        Span::styled(
            format!(" #{} ", analysis.record.id),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            analysis.record.nickname.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]);
    let title_widget = Paragraph::new(title).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(title_widget, layout[1]);

    frame.render_widget(
        TabBar {
            tabs: &analysis.tabs,
        },
        layout[2],
    );

    render_body(frame, app, analysis, layout[3]);

    frame.render_widget(HelpBar { mode: app.mode() }, layout[4]);
}

fn render_body(frame: &mut Frame, app: &App, analysis: &AnalysisView, area: Rect) {
    let lines = match analysis.body {
        AnalysisBody::Ready(result) => result_lines(result),
        AnalysisBody::Loading => vec![Line::from(Span::styled(
            "  Calculating...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))],
        AnalysisBody::Empty => vec![Line::from(Span::styled(
            "  Nothing to show. Press r to try again.",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" {} (j/k to scroll) ", analysis.active_kind.label())),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.analysis_scroll, 0));

    frame.render_widget(paragraph, area);
}

fn result_lines(result: &AnalysisResult) -> Vec<Line<'_>> {
    let mut lines = match result {
        AnalysisResult::Bazi(chart) => bazi_lines(chart),
        AnalysisResult::Ziwei(chart) => ziwei_lines(chart),
        AnalysisResult::Astrology(chart) => astrology_lines(chart),
    };
    section_lines(&mut lines, result.sections());
    lines
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("─── {text} ───"),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}

fn field<'a>(label: &'a str, value: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {label}  "), Style::default().fg(Color::DarkGray)),
        Span::styled(
            value,
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
    ])
}

fn bazi_lines(chart: &BaziChart) -> Vec<Line<'_>> {
    let mut lines = vec![heading("四柱 Four Pillars"), Line::from("")];
    lines.push(field("年柱", &chart.bazi.year));
    lines.push(field("月柱", &chart.bazi.month));
    lines.push(field("日柱", &chart.bazi.day));
    lines.push(field("时柱", &chart.bazi.hour));

    if !chart.wuxing.is_empty() {
        lines.push(Line::from(""));
        lines.push(heading("五行 Five Elements"));
        lines.push(Line::from(""));
        for (element, count) in chart.wuxing.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {element}  "), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    "█".repeat(*count as usize),
                    Style::default().fg(element_color(element)),
                ),
                Span::styled(format!(" {count}"), Style::default().fg(Color::DarkGray)),
            ]));
        }
    }
    lines
}

fn element_color(element: &str) -> Color {
    match element {
        "金" => Color::Yellow,
        "木" => Color::Green,
        "水" => Color::Blue,
        "火" => Color::Red,
        "土" => Color::Indexed(130), // brown
        _ => Color::White,
    }
}

fn ziwei_lines(chart: &ZiweiChart) -> Vec<Line<'_>> {
    let mut lines = vec![heading("命盘 Palaces"), Line::from("")];
    for (name, palace) in chart.mingpan.iter() {
        let mut spans = vec![
            Span::styled(
                format!("  {name}"),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" ({})  ", palace.position),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                palace.main_star.as_str(),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ),
        ];
        if !palace.minor_stars.is_empty() {
            spans.push(Span::styled(
                format!("  {}", palace.minor_stars.join(" ")),
                Style::default().fg(Color::Blue),
            ));
        }
        lines.push(Line::from(spans));
    }
    lines
}

fn astrology_lines(chart: &AstrologyChart) -> Vec<Line<'_>> {
    let mut lines = vec![heading("星座 Signs"), Line::from("")];
    lines.push(field("太阳 Sun", &chart.sun_sign));
    lines.push(field("月亮 Moon", &chart.moon_sign));
    lines.push(field("上升 Rising", &chart.rising_sign));

    if !chart.planets.is_empty() {
        lines.push(Line::from(""));
        lines.push(heading("行星 Planets"));
        lines.push(Line::from(""));
        for (planet, placement) in chart.planets.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {planet}  "), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    placement.sign.as_str(),
                    Style::default().fg(Color::Magenta),
                ),
                Span::styled(
                    format!("  {}  {}", placement.house, placement.degree),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }
    }

    if !chart.houses.is_empty() {
        lines.push(Line::from(""));
        lines.push(heading("宫位 Houses"));
        lines.push(Line::from(""));
        for (house, meaning) in chart.houses.iter() {
            lines.push(field(house, meaning));
        }
    }
    lines
}

fn section_lines<'a>(lines: &mut Vec<Line<'a>>, sections: &'a Entries<String>) {
    for (title, text) in sections.iter() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("◆ {title}"),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        for paragraph in text.lines() {
            lines.push(Line::from(format!("  {paragraph}")));
        }
    }
}
