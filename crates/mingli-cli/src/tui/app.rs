use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use mingli_core::effect::{Completion, Effect};
use mingli_core::model::*;
use mingli_core::state::{AppState, Command, Notice, Update};
use mingli_core::view::{self, NavTab, Section};

/// Which key map is active. Derived from the state on every key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Welcome,
    List,
    Form,
    Confirm,
    Analysis,
}

/// Fields of the record form, in Tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Nickname,
    Gender,
    BirthDate,
    BirthTime,
    BirthPlace,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        Self::Nickname,
        Self::Gender,
        Self::BirthDate,
        Self::BirthTime,
        Self::BirthPlace,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Nickname => " 昵称 Nickname ",
            Self::Gender => " 性别 Gender ",
            Self::BirthDate => " 出生日期 Date (YYYY-MM-DD) ",
            Self::BirthTime => " 出生时间 Time (HH:MM) ",
            Self::BirthPlace => " 出生地点 Place ",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|f| f == self).unwrap_or(0)
    }

    fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// What the user has typed into the record form. Dates and times stay text
/// until save so that half-typed values are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub focus: FormField,
    pub nickname: String,
    pub gender: Gender,
    pub birth_date: String,
    pub birth_time: String,
    pub birth_place: String,
    coordinates: (Option<f64>, Option<f64>),
}

impl FormState {
    pub fn blank() -> Self {
        Self {
            focus: FormField::Nickname,
            nickname: String::new(),
            gender: Gender::Male,
            birth_date: String::new(),
            birth_time: String::new(),
            birth_place: String::new(),
            coordinates: (None, None),
        }
    }

    pub fn from_record(record: &BirthRecord) -> Self {
        Self {
            focus: FormField::Nickname,
            nickname: record.nickname.clone(),
            gender: record.gender,
            birth_date: record.birth_date.format("%Y-%m-%d").to_string(),
            birth_time: record.birth_time.format("%H:%M").to_string(),
            birth_place: record.birth_place.clone().unwrap_or_default(),
            coordinates: (record.longitude, record.latitude),
        }
    }

    pub fn text(&self, field: FormField) -> &str {
        match field {
            FormField::Nickname => &self.nickname,
            FormField::Gender => self.gender.label(),
            FormField::BirthDate => &self.birth_date,
            FormField::BirthTime => &self.birth_time,
            FormField::BirthPlace => &self.birth_place,
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Nickname => Some(&mut self.nickname),
            FormField::Gender => None,
            FormField::BirthDate => Some(&mut self.birth_date),
            FormField::BirthTime => Some(&mut self.birth_time),
            FormField::BirthPlace => Some(&mut self.birth_place),
        }
    }

    /// Parse the typed values. Errors are user-facing messages.
    pub fn to_draft(&self) -> Result<BirthDraft, String> {
        let birth_date = parse_birth_date(&self.birth_date).map_err(|e| e.user_message())?;
        let birth_time = parse_birth_time(&self.birth_time).map_err(|e| e.user_message())?;
        let place = self.birth_place.trim();
        Ok(BirthDraft {
            nickname: self.nickname.clone(),
            gender: self.gender,
            birth_date,
            birth_time,
            birth_place: (!place.is_empty()).then(|| place.to_string()),
            longitude: self.coordinates.0,
            latitude: self.coordinates.1,
        })
    }
}

/// Front-end state wrapped around the shared `AppState`.
pub struct App {
    pub state: AppState,
    pub should_quit: bool,

    // -- List state --
    pub selected: usize,

    // -- Form state --
    pub form: FormState,

    // -- Analysis state --
    pub analysis_scroll: u16,

    // -- Notice toast --
    pub notice: Option<Notice>,
    pub notice_timer: u16, // ticks remaining
    notice_ticks: u16,
}

impl App {
    pub fn new(state: AppState, notice_ticks: u16) -> Self {
        Self {
            state,
            should_quit: false,
            selected: 0,
            form: FormState::blank(),
            analysis_scroll: 0,
            notice: None,
            notice_timer: 0,
            notice_ticks,
        }
    }

    /// Restore a persisted session. Returns the effects to start with.
    pub fn start(&mut self) -> Vec<Effect> {
        self.run(Command::Restore)
    }

    pub fn mode(&self) -> Mode {
        let vm = view::project(&self.state);
        if vm.section == Section::Welcome {
            Mode::Welcome
        } else if vm.confirm_delete.is_some() {
            Mode::Confirm
        } else if vm.form.is_some() {
            Mode::Form
        } else if vm.section == Section::Analysis {
            Mode::Analysis
        } else {
            Mode::List
        }
    }

    /// Process a finished effect from the worker.
    pub fn handle_completion(&mut self, completion: Completion) -> Vec<Effect> {
        let update = self.state.apply(completion);
        self.clamp_selection();
        self.absorb(update)
    }

    /// Handle a key event. Returns the effects to hand to the worker.
    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        // Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Vec::new();
        }

        match self.mode() {
            Mode::Welcome => self.handle_welcome(key),
            Mode::List => self.handle_list(key),
            Mode::Form => self.handle_form(key),
            Mode::Confirm => self.handle_confirm(key),
            Mode::Analysis => self.handle_analysis(key),
        }
    }

    fn handle_welcome(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                Vec::new()
            }
            KeyCode::Char('l') | KeyCode::Enter => self.run(Command::Login),
            _ => Vec::new(),
        }
    }

    fn handle_list(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                Vec::new()
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                Vec::new()
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                Vec::new()
            }
            KeyCode::Char('g') => {
                self.selected = 0;
                Vec::new()
            }
            KeyCode::Char('G') => {
                self.selected = self.record_count().saturating_sub(1);
                Vec::new()
            }
            KeyCode::Char('n') => {
                self.form = FormState::blank();
                self.run(Command::BeginCreate)
            }
            KeyCode::Char('e') => {
                let Some(record) = self.selected_record().cloned() else {
                    return Vec::new();
                };
                self.form = FormState::from_record(&record);
                self.run(Command::BeginEdit(record.id))
            }
            KeyCode::Char('d') => match self.selected_id() {
                Some(id) => self.run(Command::RequestDelete(id)),
                None => Vec::new(),
            },
            KeyCode::Enter => match self.selected_id() {
                Some(id) => {
                    self.analysis_scroll = 0;
                    self.run(Command::OpenAnalysis(id))
                }
                None => Vec::new(),
            },
            KeyCode::Char(c @ '1'..='3') => {
                self.analysis_scroll = 0;
                self.run(Command::ShowNav(NavTab::Analysis(kind_for_digit(c))))
            }
            KeyCode::Char('p') => self.run(Command::ShowNav(NavTab::Profile)),
            KeyCode::Char('h') => self.run(Command::ShowNav(NavTab::Home)),
            KeyCode::Char('r') => self.run(Command::ReloadRecords),
            KeyCode::Char('L') => {
                self.selected = 0;
                self.run(Command::Logout)
            }
            _ => Vec::new(),
        }
    }

    fn handle_confirm(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => self.run(Command::ConfirmDelete),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.run(Command::CancelDelete)
            }
            _ => Vec::new(),
        }
    }

    fn handle_form(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Esc => self.run(Command::CancelEdit),
            KeyCode::Tab | KeyCode::Enter => {
                self.form.focus = self.form.focus.next();
                Vec::new()
            }
            KeyCode::BackTab => {
                self.form.focus = self.form.focus.prev();
                Vec::new()
            }
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                match self.form.to_draft() {
                    Ok(draft) => self.run(Command::SaveDraft(draft)),
                    Err(msg) => {
                        self.show(Notice::error(msg));
                        Vec::new()
                    }
                }
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
                if self.form.focus == FormField::Gender =>
            {
                self.form.gender = self.form.gender.toggled();
                Vec::new()
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(text) = self.form.text_mut() {
                    text.push(c);
                }
                Vec::new()
            }
            KeyCode::Backspace => {
                if let Some(text) = self.form.text_mut() {
                    text.pop();
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_analysis(&mut self, key: KeyEvent) -> Vec<Effect> {
        let current = self.state.analysis.active_kind();
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                Vec::new()
            }
            KeyCode::Esc | KeyCode::Backspace => self.run(Command::CloseAnalysis),
            KeyCode::Char(c @ '1'..='3') => self.select_kind(kind_for_digit(c)),
            KeyCode::Right | KeyCode::Tab | KeyCode::Char('l') => self.select_kind(current.next()),
            KeyCode::Left | KeyCode::BackTab | KeyCode::Char('h') => {
                self.select_kind(current.prev())
            }
            // Re-selecting the current kind fetches it again after a failure
            KeyCode::Char('r') => self.run(Command::SelectKind(current)),
            KeyCode::Char('j') | KeyCode::Down => {
                self.analysis_scroll = self.analysis_scroll.saturating_add(1);
                Vec::new()
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.analysis_scroll = self.analysis_scroll.saturating_sub(1);
                Vec::new()
            }
            KeyCode::PageDown => {
                self.analysis_scroll = self.analysis_scroll.saturating_add(20);
                Vec::new()
            }
            KeyCode::PageUp => {
                self.analysis_scroll = self.analysis_scroll.saturating_sub(20);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn select_kind(&mut self, kind: AnalysisKind) -> Vec<Effect> {
        if kind != self.state.analysis.active_kind() {
            self.analysis_scroll = 0;
        }
        self.run(Command::SelectKind(kind))
    }

    fn run(&mut self, command: Command) -> Vec<Effect> {
        let update = self.state.dispatch(command);
        self.absorb(update)
    }

    fn absorb(&mut self, update: Update) -> Vec<Effect> {
        if let Some(notice) = update.notice {
            self.show(notice);
        }
        update.effects
    }

    fn show(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.notice_timer = self.notice_ticks;
    }

    pub fn record_count(&self) -> usize {
        self.state.records.records().len()
    }

    pub fn selected_record(&self) -> Option<&BirthRecord> {
        self.state.records.records().get(self.selected)
    }

    fn selected_id(&self) -> Option<i64> {
        self.selected_record().map(|r| r.id)
    }

    fn move_selection(&mut self, delta: i32) {
        let len = self.record_count();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let current = self.selected as i32;
        let new = (current + delta).clamp(0, len as i32 - 1);
        self.selected = new as usize;
    }

    fn clamp_selection(&mut self) {
        let len = self.record_count();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Tick the notice timer down.
    pub fn tick_notice(&mut self) {
        if self.notice_timer > 0 {
            self.notice_timer -= 1;
            if self.notice_timer == 0 {
                self.notice = None;
            }
        }
    }
}

fn kind_for_digit(c: char) -> AnalysisKind {
    match c {
        '2' => AnalysisKind::Ziwei,
        '3' => AnalysisKind::Astrology,
        _ => AnalysisKind::Bazi,
    }
}
