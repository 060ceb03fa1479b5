use mingli_core::model::BirthRecord;
use mingli_core::view::ViewModel;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::tui::{
    app::App,
    widgets::{help_bar::HelpBar, nav_bar::NavBar},
};

pub fn render(frame: &mut Frame, app: &App, vm: &ViewModel, area: Rect) {
    let layout = Layout::vertical([
        Constraint::Length(1), // nav bar
        Constraint::Min(5),    // table
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

    render_table(frame, app, vm, layout[1]);

    frame.render_widget(HelpBar { mode: app.mode() }, layout[2]);
}

fn render_table(frame: &mut Frame, app: &App, vm: &ViewModel, area: Rect) {
    if vm.busy && vm.records.is_empty() {
        let loading = Line::from(vec![Span::styled(
            "  Loading...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )]);
        frame.render_widget(loading, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("ID"),
        Cell::from("昵称 Name"),
        Cell::from("性别"),
        Cell::from("出生日期 Date"),
        Cell::from("时间 Time"),
        Cell::from("地点 Place"),
    ])
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .bottom_margin(1);

    let rows: Vec<Row> = if vm.records.is_empty() {
        // Empty state
        vec![Row::new(vec![Cell::from(Span::styled(
            "  No birth records yet. Press n to add one.",
            Style::default().fg(Color::DarkGray),
        ))])]
    } else {
        vm.records.iter().map(make_record_row).collect()
    };

    let widths = [
        Constraint::Length(6),
        Constraint::Min(16),
        Constraint::Length(6),
        Constraint::Length(14),
        Constraint::Length(10),
        Constraint::Min(12),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" 命盘档案 Birth records ({}) ", vm.records.len())),
        )
        .row_highlight_style(
            Style::default()
                .bg(Color::Indexed(236)) // subtle dark bg (#303030)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    let mut state = TableState::default();
    if !vm.records.is_empty() {
        state.select(Some(app.selected));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn make_record_row(record: &BirthRecord) -> Row<'static> {
    let id_cell = Cell::from(Span::styled(
        record.id.to_string(),
        Style::default().fg(Color::Cyan),
    ));

    // Truncate long names by characters, not bytes
    let max_name = 24;
    let name = if record.nickname.chars().count() > max_name {
        let cut: String = record.nickname.chars().take(max_name - 1).collect();
        format!("{cut}…")
    } else {
        record.nickname.clone()
    };
    let name_cell = Cell::from(name);

    let gender_cell = Cell::from(Span::styled(
        record.gender.label(),
        Style::default().fg(Color::Magenta),
    ));

    let date_cell = Cell::from(record.birth_date.format("%Y-%m-%d").to_string());
    let time_cell = Cell::from(record.birth_time.format("%H:%M").to_string());

    let place_cell = Cell::from(Span::styled(
        record.birth_place.clone().unwrap_or_else(|| "—".to_string()),
        Style::default().fg(Color::DarkGray),
    ));

    Row::new(vec![
        id_cell,
        name_cell,
        gender_cell,
        date_cell,
        time_cell,
        place_cell,
    ])
}
