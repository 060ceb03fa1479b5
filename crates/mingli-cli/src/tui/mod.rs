pub mod app;
mod views;
mod widgets;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self as ct_event, Event};
use mingli_core::api::HttpClient;
use mingli_core::config::MingliConfig;
use mingli_core::effect::{self, Completion, Effect};
use mingli_core::model::BirthRecord;
use mingli_core::state::{AppState, Notice, NoticeLevel};
use mingli_core::storage::FileUserStorage;
use mingli_core::view::{self, Section};
use ratatui::{DefaultTerminal, Frame};
use tokio::sync::mpsc;

use self::app::App;

/// Entry point for the interactive TUI mode.
pub async fn run_tui(config: &MingliConfig) -> Result<()> {
    let api = HttpClient::new(&config.api).context("failed to create API client")?;
    let storage = FileUserStorage::from_config(config).context("failed to open session storage")?;
    tracing::info!(base_url = %config.api.base_url, session = %storage.path().display(), "starting TUI");
    let state = AppState::new(Box::new(storage), config.login.clone());

    // Channels for async communication
    let (effect_tx, effect_rx) = mpsc::unbounded_channel::<Effect>();
    let (completion_tx, mut completion_rx) = mpsc::unbounded_channel::<Completion>();

    // Spawn async worker
    tokio::spawn(worker_loop(Arc::new(api), effect_rx, completion_tx));

    let mut app = App::new(state, config.ui.notice_ticks);
    for effect in app.start() {
        effect_tx.send(effect)?;
    }

    // Initialize terminal
    let mut terminal = ratatui::init();

    let result = run_loop(
        &mut terminal,
        &mut app,
        &effect_tx,
        &mut completion_rx,
        Duration::from_millis(config.ui.tick_ms),
    );

    // Restore terminal
    ratatui::restore();

    result
}

fn run_loop(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    effect_tx: &mpsc::UnboundedSender<Effect>,
    completion_rx: &mut mpsc::UnboundedReceiver<Completion>,
    tick: Duration,
) -> Result<()> {
    loop {
        // Draw
        terminal.draw(|frame| render(frame, app))?;

        // Drain finished effects (non-blocking)
        while let Ok(completion) = completion_rx.try_recv() {
            for effect in app.handle_completion(completion) {
                let _ = effect_tx.send(effect);
            }
        }

        // Poll for keyboard events
        if ct_event::poll(tick)? {
            if let Event::Key(key) = ct_event::read()? {
                for effect in app.handle_key(key) {
                    let _ = effect_tx.send(effect);
                }
            }
        }

        app.tick_notice();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let vm = view::project(&app.state);

    match vm.section {
        Section::Welcome => views::welcome::render(frame, area, vm.busy),
        Section::RecordList if vm.form.is_some() => views::form::render(frame, app, &vm, area),
        Section::RecordList => views::list::render(frame, app, &vm, area),
        Section::Analysis => views::analysis::render(frame, app, &vm, area),
    }

    if let Some(record) = vm.confirm_delete {
        render_confirm(frame, record);
    }

    // Render notice toast overlay if present
    if let Some(ref notice) = app.notice {
        render_notice_toast(frame, notice);
    }
}

fn render_confirm(frame: &mut Frame, record: &BirthRecord) {
    use ratatui::{
        layout::{Constraint, Flex, Layout},
        style::{Color, Modifier, Style},
        text::{Line, Span},
        widgets::{Block, Borders, Clear, Paragraph},
    };

    let area = frame.area();
    let [dialog] = Layout::horizontal([Constraint::Length(48)])
        .flex(Flex::Center)
        .areas(area);
    let [dialog] = Layout::vertical([Constraint::Length(5)])
        .flex(Flex::Center)
        .areas(dialog);

    frame.render_widget(Clear, dialog);
    let text = vec![
        Line::from(format!(" Delete the record of {}?", record.nickname)),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                " y",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" delete   ", Style::default().fg(Color::DarkGray)),
            Span::styled("n/Esc", Style::default().fg(Color::Cyan)),
            Span::styled(" keep", Style::default().fg(Color::DarkGray)),
        ]),
    ];
    let prompt = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" 删除 Delete "),
    );
    frame.render_widget(prompt, dialog);
}

fn render_notice_toast(frame: &mut Frame, notice: &Notice) {
    use ratatui::{
        layout::{Constraint, Flex, Layout},
        style::{Color, Style},
        widgets::{Block, Borders, Clear, Paragraph},
    };

    let (symbol, title, color) = match notice.level {
        NoticeLevel::Info => ("✓", " Info ", Color::Green),
        NoticeLevel::Error => ("✗", " Error ", Color::Red),
    };

    let area = frame.area();
    let [toast_area] = Layout::horizontal([Constraint::Percentage(60)])
        .flex(Flex::Center)
        .areas(area);
    let [toast_area] = Layout::vertical([Constraint::Length(3)])
        .flex(Flex::End)
        .areas(toast_area);

    frame.render_widget(Clear, toast_area);
    let toast = Paragraph::new(format!(" {symbol} {}", notice.text))
        .style(Style::default().fg(Color::White).bg(color))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(title),
        );
    frame.render_widget(toast, toast_area);
}

/// Async worker: runs each effect on its own task so that responses can
/// arrive in any order. Ordering is sorted out by the tickets.
async fn worker_loop(
    api: Arc<HttpClient>,
    mut effect_rx: mpsc::UnboundedReceiver<Effect>,
    completion_tx: mpsc::UnboundedSender<Completion>,
) {
    while let Some(effect) = effect_rx.recv().await {
        let api = Arc::clone(&api);
        let completion_tx = completion_tx.clone();
        tracing::debug!(effect = effect.label(), "spawning");
        tokio::spawn(async move {
            let completion = effect::execute(api.as_ref(), effect).await;
            // UI closed
            let _ = completion_tx.send(completion);
        });
    }
}
