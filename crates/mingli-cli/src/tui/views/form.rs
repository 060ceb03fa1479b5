use mingli_core::view::{FormView, ViewModel};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::tui::{
    app::{App, FormField},
    widgets::{help_bar::HelpBar, nav_bar::NavBar, text_field::TextField},
};

pub fn render(frame: &mut Frame, app: &App, vm: &ViewModel, area: Rect) {
    let layout = Layout::vertical([
        Constraint::Length(1), // nav bar
        Constraint::Length(2), // title
        Constraint::Length(3), // nickname
        Constraint::Length(3), // gender
        Constraint::Length(3), // birth date
        Constraint::Length(3), // birth time
        Constraint::Length(3), // birth place
        Constraint::Min(0),
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

    let title = match vm.form {
        Some(FormView::Edit(record)) => format!(" 编辑 Edit: {}", record.nickname),
        _ => " 新建 New birth record".to_string(),
    };
    let title_widget = Paragraph::new(Line::from(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(title_widget, layout[1]);

    for (i, field) in FormField::ALL.iter().enumerate() {
        let slot = layout[i + 2];
        let focused = app.form.focus == *field;
        if *field == FormField::Gender {
            render_gender(frame, app, focused, slot);
        } else {
            frame.render_widget(
                TextField {
                    label: field.label(),
                    text: app.form.text(*field),
                    focused,
                },
                slot,
            );
        }
    }

    frame.render_widget(HelpBar { mode: app.mode() }, layout[8]);
}

fn render_gender(frame: &mut Frame, app: &App, focused: bool, area: Rect) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(FormField::Gender.label());
    let arrow = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let line = Line::from(vec![
        Span::styled(" < ", arrow),
        Span::styled(
            format!("{} {}", app.form.gender.label(), app.form.gender),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" > ", arrow),
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);
}
