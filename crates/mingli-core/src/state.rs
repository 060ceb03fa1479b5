//! Application state and the command dispatch table.
//!
//! `AppState` is owned by one loop. Commands and completions are applied to
//! it one at a time; each returns the effects to run next and at most one
//! notice for the user. Running effects is the caller's business.

use std::collections::VecDeque;

use crate::analysis::{ActiveRecord, AnalysisSession, Resolution, Selection};
use crate::api::ClientApi;
use crate::config::LoginConfig;
use crate::effect::{self, Completion, Effect};
use crate::model::{AnalysisKind, BirthDraft, User};
use crate::records::{Outcome, RecordStore};
use crate::session::{SessionEvent, UserSession};
use crate::storage::UserStorage;
use crate::view::NavTab;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login,
    Restore,
    Logout,
    ReloadRecords,
    BeginCreate,
    BeginEdit(i64),
    CancelEdit,
    SaveDraft(BirthDraft),
    RequestDelete(i64),
    ConfirmDelete,
    CancelDelete,
    OpenAnalysis(i64),
    SelectKind(AnalysisKind),
    CloseAnalysis,
    ShowNav(NavTab),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Update {
    pub effects: Vec<Effect>,
    pub notice: Option<Notice>,
}

impl Update {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn effect(effect: Effect) -> Self {
        Self {
            effects: vec![effect],
            notice: None,
        }
    }

    pub fn notice(notice: Notice) -> Self {
        Self {
            effects: Vec::new(),
            notice: Some(notice),
        }
    }

    fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    fn and(mut self, other: Update) -> Self {
        self.effects.extend(other.effects);
        if other.notice.is_some() {
            self.notice = other.notice;
        }
        self
    }
}

pub struct AppState {
    pub session: UserSession,
    pub records: RecordStore,
    pub analysis: AnalysisSession,
    in_flight: usize,
    login_pending: bool,
    list_tab: NavTab,
}

impl AppState {
    pub fn new(storage: Box<dyn UserStorage>, login: LoginConfig) -> Self {
        Self {
            session: UserSession::new(storage, login),
            records: RecordStore::new(),
            analysis: AnalysisSession::new(),
            in_flight: 0,
            login_pending: false,
            list_tab: NavTab::Home,
        }
    }

    /// Effects issued and not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Which nav tab the record list was reached through.
    pub fn list_tab(&self) -> NavTab {
        self.list_tab
    }

    pub fn dispatch(&mut self, command: Command) -> Update {
        tracing::debug!(?command, "dispatch");
        let update = self.handle(command);
        self.in_flight += update.effects.len();
        update
    }

    pub fn apply(&mut self, completion: Completion) -> Update {
        self.in_flight = self.in_flight.saturating_sub(1);
        let update = self.settle(completion);
        self.in_flight += update.effects.len();
        update
    }

    fn handle(&mut self, command: Command) -> Update {
        match command {
            Command::Login => {
                if self.session.is_logged_in() || self.login_pending {
                    return Update::none();
                }
                self.login_pending = true;
                Update::effect(Effect::CreateUser(self.session.pseudo_identity()))
            }
            Command::Restore => match self.session.restore() {
                Some(SessionEvent::UserAvailable(user)) => self.user_available(&user),
                None => Update::none(),
            },
            Command::Logout => {
                let result = self.session.logout();
                self.records.reset_for(None);
                self.analysis.close();
                self.list_tab = NavTab::Home;
                match result {
                    Ok(()) => Update::notice(Notice::info("logged out")),
                    Err(e) => {
                        tracing::warn!("logout: {e}");
                        Update::notice(Notice::error(e.user_message()))
                    }
                }
            }
            Command::ReloadRecords => match self.session.user_id() {
                Some(user_id) => Update::effect(Effect::LoadRecords(self.records.begin_load(user_id))),
                None => Update::none(),
            },
            Command::BeginCreate => {
                if self.session.is_logged_in() {
                    self.records.begin_create();
                }
                Update::none()
            }
            Command::BeginEdit(id) => {
                self.records.begin_edit(id);
                Update::none()
            }
            Command::CancelEdit => {
                self.records.end_edit();
                Update::none()
            }
            Command::SaveDraft(draft) => {
                let Some(user_id) = self.session.user_id() else {
                    return Update::none();
                };
                if self.records.is_saving() {
                    return Update::none();
                }
                match self.records.prepare_save(user_id, draft) {
                    Ok(ticket) => Update::effect(Effect::Mutate(ticket)),
                    Err(e) => Update::notice(Notice::error(e.user_message())),
                }
            }
            Command::RequestDelete(id) => {
                self.records.request_delete(id);
                Update::none()
            }
            Command::ConfirmDelete => {
                let Some(user_id) = self.session.user_id() else {
                    return Update::none();
                };
                match self.records.confirm_delete(user_id) {
                    Some(ticket) => Update::effect(Effect::Mutate(ticket)),
                    None => Update::none(),
                }
            }
            Command::CancelDelete => {
                self.records.cancel_delete();
                Update::none()
            }
            Command::OpenAnalysis(id) => match self.records.get(id) {
                Some(record) => {
                    let selection = self.analysis.open(ActiveRecord::from(record));
                    selected(selection)
                }
                None => Update::none(),
            },
            Command::SelectKind(kind) => selected(self.analysis.select(kind)),
            Command::CloseAnalysis => {
                self.analysis.close();
                Update::none()
            }
            Command::ShowNav(tab @ (NavTab::Home | NavTab::Profile)) => {
                self.list_tab = tab;
                self.handle(Command::CloseAnalysis)
            }
            Command::ShowNav(NavTab::Analysis(kind)) => {
                if self.analysis.active_record().is_some() {
                    return selected(self.analysis.select(kind));
                }
                let Some(first) = self.records.records().first() else {
                    return Update::notice(Notice::info("add a birth record first"));
                };
                let opened = selected(self.analysis.open(ActiveRecord::from(first)));
                opened.and(selected(self.analysis.select(kind)))
            }
        }
    }

    fn settle(&mut self, completion: Completion) -> Update {
        match completion {
            Completion::UserCreated { new_user, result } => {
                self.login_pending = false;
                match self.session.complete_login(new_user, result) {
                    Ok(SessionEvent::UserAvailable(user)) => self
                        .user_available(&user)
                        .with_notice(Notice::info(format!("logged in as {}", user.nickname))),
                    Err(e) => {
                        tracing::warn!("{e}");
                        Update::notice(Notice::error(e.user_message()))
                    }
                }
            }
            Completion::RecordsLoaded { ticket, result } => {
                match self.records.finish_load(ticket, result) {
                    Outcome::Applied => {
                        self.drop_missing_analysis();
                        Update::none()
                    }
                    Outcome::Stale => Update::none(),
                    Outcome::Failed(e) => {
                        tracing::warn!("loading records: {e}");
                        let text = match ticket.follows {
                            Some(verb) => format!(
                                "record {verb}, but the list could not be refreshed: {}",
                                e.user_message()
                            ),
                            None => format!("failed to load records: {}", e.user_message()),
                        };
                        Update::notice(Notice::error(text))
                    }
                }
            }
            Completion::Mutated { ticket, result } => {
                let verb = ticket.mutation.describe();
                match self.records.finish_mutation(&ticket, result) {
                    Outcome::Applied => {
                        let refetch = self.records.begin_refetch(&ticket);
                        Update::effect(Effect::LoadRecords(refetch))
                            .with_notice(Notice::info(format!("record {verb}")))
                    }
                    Outcome::Stale => Update::none(),
                    Outcome::Failed(e) => {
                        tracing::warn!("record mutation: {e}");
                        Update::notice(Notice::error(format!(
                            "record not {verb}: {}",
                            e.user_message()
                        )))
                    }
                }
            }
            Completion::Analysis { ticket, result } => {
                match self.analysis.complete(ticket, result) {
                    Resolution::Applied | Resolution::Stale => Update::none(),
                    Resolution::Failed(msg) => Update::notice(Notice::error(format!(
                        "{} analysis failed: {msg}",
                        ticket.kind.label()
                    ))),
                }
            }
        }
    }

    fn user_available(&mut self, user: &User) -> Update {
        self.records.reset_for(Some(user.id));
        self.analysis.close();
        Update::effect(Effect::LoadRecords(self.records.begin_load(user.id)))
    }

    /// The record under analysis may have vanished from a fresh list.
    fn drop_missing_analysis(&mut self) {
        if let Some(active) = self.analysis.active_record() {
            if self.records.get(active.id).is_none() {
                self.analysis.close();
            }
        }
    }
}

fn selected(selection: Selection) -> Update {
    match selection {
        Selection::Fetch(ticket) => Update::effect(Effect::RunAnalysis(ticket)),
        Selection::Cached | Selection::InFlight | Selection::NoRecord => Update::none(),
    }
}

/// Run an update to quiescence, executing effects one after another.
/// Returns every notice produced along the way.
pub async fn drive(state: &mut AppState, api: &impl ClientApi, update: Update) -> Vec<Notice> {
    let mut notices: Vec<Notice> = update.notice.into_iter().collect();
    let mut queue: VecDeque<Effect> = update.effects.into();
    while let Some(next) = queue.pop_front() {
        let completion = effect::execute(api, next).await;
        let update = state.apply(completion);
        notices.extend(update.notice);
        queue.extend(update.effects);
    }
    notices
}
