//! Pure projection of `AppState` into what a front-end should show.

use crate::analysis::ActiveRecord;
use crate::model::{AnalysisKind, AnalysisResult, BirthRecord, User};
use crate::records::EditTarget;
use crate::state::AppState;

/// The one main area on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Welcome,
    RecordList,
    Analysis,
}

/// Entries of the navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTab {
    Home,
    Analysis(AnalysisKind),
    /// The user's own page. Shows the record list, like `Home`.
    Profile,
}

impl NavTab {
    pub const ALL: [NavTab; 5] = [
        NavTab::Home,
        NavTab::Analysis(AnalysisKind::Bazi),
        NavTab::Analysis(AnalysisKind::Ziwei),
        NavTab::Analysis(AnalysisKind::Astrology),
        NavTab::Profile,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Home => "首页 Home",
            Self::Analysis(kind) => kind.label(),
            Self::Profile => "我的 Profile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormView<'a> {
    New,
    Edit(&'a BirthRecord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindTab {
    pub kind: AnalysisKind,
    pub active: bool,
    pub cached: bool,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnalysisBody<'a> {
    Loading,
    Ready(&'a AnalysisResult),
    /// Neither cached nor requested, e.g. after a failed fetch.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisView<'a> {
    pub record: &'a ActiveRecord,
    pub active_kind: AnalysisKind,
    pub tabs: Vec<KindTab>,
    pub body: AnalysisBody<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel<'a> {
    pub section: Section,
    pub nav: NavTab,
    pub user: Option<&'a User>,
    pub busy: bool,
    pub records: &'a [BirthRecord],
    pub form: Option<FormView<'a>>,
    pub confirm_delete: Option<&'a BirthRecord>,
    pub analysis: Option<AnalysisView<'a>>,
}

/// Derive the view from state alone. Same state, same view.
pub fn project(state: &AppState) -> ViewModel<'_> {
    let user = state.session.current_user();
    let records = state.records.records();
    let busy = state.is_busy();

    let Some(user) = user else {
        return ViewModel {
            section: Section::Welcome,
            nav: NavTab::Home,
            user: None,
            busy,
            records: &[],
            form: None,
            confirm_delete: None,
            analysis: None,
        };
    };

    let analysis = state
        .analysis
        .active_record()
        .map(|record| analysis_view(state, record));
    let (section, nav) = match &analysis {
        Some(view) => (Section::Analysis, NavTab::Analysis(view.active_kind)),
        None => (Section::RecordList, state.list_tab()),
    };

    let form = state.records.editing().and_then(|target| match target {
        EditTarget::New => Some(FormView::New),
        EditTarget::Record(id) => state.records.get(id).map(FormView::Edit),
    });
    let confirm_delete = state
        .records
        .pending_delete()
        .and_then(|id| state.records.get(id));

    ViewModel {
        section,
        nav,
        user: Some(user),
        busy,
        records,
        form,
        confirm_delete,
        analysis,
    }
}

fn analysis_view<'a>(state: &'a AppState, record: &'a ActiveRecord) -> AnalysisView<'a> {
    let session = &state.analysis;
    let active_kind = session.active_kind();
    let tabs = AnalysisKind::ALL
        .iter()
        .map(|&kind| KindTab {
            kind,
            active: kind == active_kind,
            cached: session.is_cached(kind),
            loading: session.is_loading(kind),
        })
        .collect();
    let body = match session.current_result() {
        Some(result) => AnalysisBody::Ready(result),
        None if session.is_loading(active_kind) => AnalysisBody::Loading,
        None => AnalysisBody::Empty,
    };
    AnalysisView {
        record,
        active_kind,
        tabs,
        body,
    }
}
