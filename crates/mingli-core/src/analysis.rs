//! Per-record analysis results, memoized by kind.
//!
//! Every open or close bumps the epoch. Fetch tickets capture the epoch they
//! were issued under, and a completion whose epoch no longer matches is
//! dropped without touching the cache.

use std::collections::{HashMap, HashSet};

use crate::api::ClientApi;
use crate::error::Result;
use crate::model::{AnalysisKind, AnalysisResult, BirthRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRecord {
    pub id: i64,
    pub nickname: String,
}

impl From<&BirthRecord> for ActiveRecord {
    fn from(record: &BirthRecord) -> Self {
        Self {
            id: record.id,
            nickname: record.nickname.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTicket {
    pub epoch: u64,
    pub record_id: i64,
    pub kind: AnalysisKind,
}

/// What selecting a kind requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Cached,
    Fetch(AnalysisTicket),
    /// Already requested under the current epoch.
    InFlight,
    NoRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Applied,
    Stale,
    Failed(String),
}

#[derive(Debug)]
pub struct AnalysisSession {
    active: Option<ActiveRecord>,
    kind: AnalysisKind,
    cache: HashMap<AnalysisKind, AnalysisResult>,
    pending: HashSet<AnalysisKind>,
    epoch: u64,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self {
            active: None,
            kind: AnalysisKind::Bazi,
            cache: HashMap::new(),
            pending: HashSet::new(),
            epoch: 0,
        }
    }
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_record(&self) -> Option<&ActiveRecord> {
        self.active.as_ref()
    }

    pub fn active_kind(&self) -> AnalysisKind {
        self.kind
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn result(&self, kind: AnalysisKind) -> Option<&AnalysisResult> {
        self.cache.get(&kind)
    }

    pub fn current_result(&self) -> Option<&AnalysisResult> {
        self.cache.get(&self.kind)
    }

    pub fn is_cached(&self, kind: AnalysisKind) -> bool {
        self.cache.contains_key(&kind)
    }

    pub fn is_loading(&self, kind: AnalysisKind) -> bool {
        self.pending.contains(&kind)
    }

    /// Switch to a record. Everything cached for the previous one is gone
    /// and its in-flight fetches become stale. Starts on BaZi.
    pub fn open(&mut self, record: ActiveRecord) -> Selection {
        self.epoch += 1;
        tracing::debug!(record_id = record.id, epoch = self.epoch, "opening analysis");
        self.active = Some(record);
        self.cache.clear();
        self.pending.clear();
        self.kind = AnalysisKind::Bazi;
        self.select(AnalysisKind::Bazi)
    }

    pub fn select(&mut self, kind: AnalysisKind) -> Selection {
        let Some(record) = &self.active else {
            return Selection::NoRecord;
        };
        self.kind = kind;
        if self.cache.contains_key(&kind) {
            return Selection::Cached;
        }
        if !self.pending.insert(kind) {
            return Selection::InFlight;
        }
        Selection::Fetch(AnalysisTicket {
            epoch: self.epoch,
            record_id: record.id,
            kind,
        })
    }

    /// Apply a finished fetch. Results are stored under the kind they were
    /// requested for, which need not be the kind on screen now.
    pub fn complete(&mut self, ticket: AnalysisTicket, result: Result<AnalysisResult>) -> Resolution {
        if ticket.epoch != self.epoch || self.active.is_none() {
            tracing::debug!(
                epoch = ticket.epoch,
                current = self.epoch,
                kind = %ticket.kind,
                "discarding stale analysis"
            );
            return Resolution::Stale;
        }
        self.pending.remove(&ticket.kind);
        match result {
            Ok(result) => {
                self.cache.insert(ticket.kind, result);
                Resolution::Applied
            }
            Err(e) => Resolution::Failed(e.user_message()),
        }
    }

    pub fn close(&mut self) {
        self.epoch += 1;
        self.active = None;
        self.cache.clear();
        self.pending.clear();
    }
}

/// Run the network call a ticket stands for.
pub async fn fetch(api: &impl ClientApi, ticket: AnalysisTicket) -> Result<AnalysisResult> {
    api.run_analysis(ticket.record_id, ticket.kind).await
}
