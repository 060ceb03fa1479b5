//! The current user's birth records, kept in sync with the server.
//!
//! The list is only ever replaced wholesale by a server response. Mutations
//! go to the server first; once one has landed a fresh list fetch is issued.
//! Nothing is patched locally, so a failure anywhere leaves the list as it
//! was.

use crate::api::ClientApi;
use crate::error::{MingliError, Result};
use crate::model::{BirthDraft, BirthRecord};

/// Identifies one list fetch. Completions carry it back so that late or
/// foreign responses can be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub user_id: i64,
    pub seq: u64,
    /// Set when the fetch refreshes the list after a mutation; holds the
    /// mutation's verb.
    pub follows: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create { draft: BirthDraft },
    Update { id: i64, draft: BirthDraft },
    Delete { id: i64 },
}

impl Mutation {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Create { .. } => "created",
            Self::Update { .. } => "saved",
            Self::Delete { .. } => "deleted",
        }
    }

    /// The form this mutation was submitted from, if any.
    fn target(&self) -> Option<EditTarget> {
        match self {
            Self::Create { .. } => Some(EditTarget::New),
            Self::Update { id, .. } => Some(EditTarget::Record(*id)),
            Self::Delete { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationTicket {
    pub user_id: i64,
    pub seq: u64,
    pub mutation: Mutation,
}

/// What the record form is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    New,
    Record(i64),
}

#[derive(Debug)]
pub enum Outcome {
    Applied,
    /// Superseded by a newer fetch or addressed to another user.
    Stale,
    Failed(MingliError),
}

#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<BirthRecord>,
    owner: Option<i64>,
    editing: Option<EditTarget>,
    pending_delete: Option<i64>,
    /// Sequence number of the form save in flight.
    saving: Option<u64>,
    issued_seq: u64,
    applied_seq: u64,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in server order.
    pub fn records(&self) -> &[BirthRecord] {
        &self.records
    }

    pub fn get(&self, id: i64) -> Option<&BirthRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn owner(&self) -> Option<i64> {
        self.owner
    }

    pub fn editing(&self) -> Option<EditTarget> {
        self.editing
    }

    pub fn editing_id(&self) -> Option<i64> {
        match self.editing {
            Some(EditTarget::Record(id)) => Some(id),
            _ => None,
        }
    }

    pub fn pending_delete(&self) -> Option<i64> {
        self.pending_delete
    }

    /// A create or update from the form has not completed yet.
    pub fn is_saving(&self) -> bool {
        self.saving.is_some()
    }

    /// Drop everything and start over for another user (or none).
    /// Sequence numbers keep counting so that in-flight fetches for the
    /// previous owner stay recognisable.
    pub fn reset_for(&mut self, owner: Option<i64>) {
        self.records.clear();
        self.editing = None;
        self.pending_delete = None;
        self.saving = None;
        self.owner = owner;
        self.applied_seq = self.issued_seq;
    }

    fn issue(&mut self) -> u64 {
        self.issued_seq += 1;
        self.issued_seq
    }

    pub fn begin_load(&mut self, user_id: i64) -> LoadTicket {
        LoadTicket {
            user_id,
            seq: self.issue(),
            follows: None,
        }
    }

    /// The list fetch owed after `ticket`'s mutation landed. Issued only
    /// then, so it outranks every fetch queued while the mutation was in
    /// flight.
    pub fn begin_refetch(&mut self, ticket: &MutationTicket) -> LoadTicket {
        LoadTicket {
            user_id: ticket.user_id,
            seq: self.issue(),
            follows: Some(ticket.mutation.describe()),
        }
    }

    /// Apply a list fetch. Only the newest-issued fetch for the current
    /// owner may replace the list.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<BirthRecord>>,
    ) -> Outcome {
        if self.owner != Some(ticket.user_id) {
            tracing::debug!(user_id = ticket.user_id, "discarding records for another user");
            return Outcome::Stale;
        }
        let records = match result {
            Ok(records) => records,
            Err(e) => return Outcome::Failed(e),
        };
        if ticket.seq <= self.applied_seq {
            tracing::debug!(seq = ticket.seq, applied = self.applied_seq, "discarding stale records");
            return Outcome::Stale;
        }
        self.applied_seq = ticket.seq;
        self.records = records;
        if let Some(id) = self.pending_delete {
            if self.get(id).is_none() {
                self.pending_delete = None;
            }
        }
        if let Some(id) = self.editing_id() {
            if self.get(id).is_none() {
                tracing::debug!(id, "record being edited is gone");
                self.editing = None;
            }
        }
        Outcome::Applied
    }

    pub fn begin_create(&mut self) {
        self.editing = Some(EditTarget::New);
    }

    /// Open the form on an existing record. Unknown ids are ignored.
    pub fn begin_edit(&mut self, id: i64) -> Option<&BirthRecord> {
        let record = self.records.iter().find(|r| r.id == id)?;
        self.editing = Some(EditTarget::Record(id));
        Some(record)
    }

    pub fn end_edit(&mut self) {
        self.editing = None;
    }

    /// Validate the form and turn it into a create or update, depending on
    /// what is being edited. Invalid drafts never reach the network.
    pub fn prepare_save(&mut self, user_id: i64, draft: BirthDraft) -> Result<MutationTicket> {
        let target = self
            .editing
            .ok_or_else(|| MingliError::Validation("no record form is open".into()))?;
        if self.saving.is_some() {
            return Err(MingliError::Validation("the record is still being saved".into()));
        }
        draft.validate()?;
        let draft = draft.normalized();
        let mutation = match target {
            EditTarget::New => Mutation::Create { draft },
            EditTarget::Record(id) => Mutation::Update { id, draft },
        };
        let seq = self.issue();
        self.saving = Some(seq);
        Ok(MutationTicket {
            user_id,
            seq,
            mutation,
        })
    }

    /// Arm the delete prompt. Returns false for unknown ids.
    pub fn request_delete(&mut self, id: i64) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.pending_delete = Some(id);
        true
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Disarm the prompt and issue the delete it was guarding.
    pub fn confirm_delete(&mut self, user_id: i64) -> Option<MutationTicket> {
        let id = self.pending_delete.take()?;
        Some(MutationTicket {
            user_id,
            seq: self.issue(),
            mutation: Mutation::Delete { id },
        })
    }

    /// Record the server's answer to a mutation. The list is untouched
    /// either way; on `Applied` the caller owes a [`Self::begin_refetch`].
    /// A successful save closes the form it came from, a failed one leaves
    /// it open for another try.
    pub fn finish_mutation(&mut self, ticket: &MutationTicket, result: Result<()>) -> Outcome {
        if self.saving == Some(ticket.seq) {
            self.saving = None;
        }
        if self.owner != Some(ticket.user_id) {
            tracing::debug!(user_id = ticket.user_id, "discarding mutation for another user");
            return Outcome::Stale;
        }
        if let Err(e) = result {
            return Outcome::Failed(e);
        }
        if self.editing.is_some() && self.editing == ticket.mutation.target() {
            self.editing = None;
        }
        Outcome::Applied
    }

    // -- Direct use (one-shot commands) --

    pub async fn load(&mut self, api: &impl ClientApi, user_id: i64) -> Result<()> {
        if self.owner != Some(user_id) {
            self.reset_for(Some(user_id));
        }
        let ticket = self.begin_load(user_id);
        let result = api.list_birth_records(user_id).await;
        into_result(self.finish_load(ticket, result))
    }

    pub async fn create(
        &mut self,
        api: &impl ClientApi,
        user_id: i64,
        draft: BirthDraft,
    ) -> Result<()> {
        self.begin_create();
        let ticket = self.prepare_save(user_id, draft)?;
        self.run(api, ticket).await
    }

    pub async fn update(
        &mut self,
        api: &impl ClientApi,
        user_id: i64,
        id: i64,
        draft: BirthDraft,
    ) -> Result<()> {
        if self.begin_edit(id).is_none() {
            return Err(MingliError::Validation(format!("no birth record with id {id}")));
        }
        let ticket = self.prepare_save(user_id, draft)?;
        self.run(api, ticket).await
    }

    pub async fn delete(&mut self, api: &impl ClientApi, user_id: i64, id: i64) -> Result<()> {
        if !self.request_delete(id) {
            return Err(MingliError::Validation(format!("no birth record with id {id}")));
        }
        match self.confirm_delete(user_id) {
            Some(ticket) => self.run(api, ticket).await,
            None => Ok(()),
        }
    }

    /// Errors only when the mutation itself failed. A refetch failure after
    /// a landed mutation is logged and leaves the list as it was.
    async fn run(&mut self, api: &impl ClientApi, ticket: MutationTicket) -> Result<()> {
        let result = send_mutation(api, &ticket).await;
        match self.finish_mutation(&ticket, result) {
            Outcome::Applied => {}
            Outcome::Stale => return Ok(()),
            Outcome::Failed(e) => return Err(e),
        }
        let refetch = self.begin_refetch(&ticket);
        let result = api.list_birth_records(ticket.user_id).await;
        if let Outcome::Failed(e) = self.finish_load(refetch, result) {
            tracing::warn!("record {} but the list was not refreshed: {e}", ticket.mutation.describe());
        }
        Ok(())
    }
}

fn into_result(outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Applied | Outcome::Stale => Ok(()),
        Outcome::Failed(e) => Err(e),
    }
}

/// Send one mutation to the server. The list refetch that must follow a
/// success is issued separately, after the mutation has landed.
pub async fn send_mutation(api: &impl ClientApi, ticket: &MutationTicket) -> Result<()> {
    match &ticket.mutation {
        Mutation::Create { draft } => api.create_birth_record(ticket.user_id, draft).await,
        Mutation::Update { id, draft } => api.update_birth_record(*id, draft).await,
        Mutation::Delete { id } => api.delete_birth_record(*id).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, FakeApi};

    fn seeded(api: &FakeApi) -> RecordStore {
        let mut store = RecordStore::new();
        store.reset_for(Some(1));
        let ticket = store.begin_load(1);
        let records = api.server_records(1);
        assert!(matches!(store.finish_load(ticket, Ok(records)), Outcome::Applied));
        store
    }

    fn three_records() -> Vec<BirthRecord> {
        vec![
            testing::record(3, 1, "小明"),
            testing::record(2, 1, "小红"),
            testing::record(1, 1, "小刚"),
        ]
    }

    fn ids(store: &RecordStore) -> Vec<i64> {
        store.records().iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn test_load_replaces_list() {
        let api = FakeApi::with_records(three_records());
        let mut store = RecordStore::new();
        store.load(&api, 1).await.unwrap();
        assert_eq!(ids(&store), vec![3, 2, 1]);
        assert_eq!(store.owner(), Some(1));
    }

    #[test]
    fn test_older_load_cannot_overwrite_newer() {
        let mut store = RecordStore::new();
        store.reset_for(Some(1));
        let first = store.begin_load(1);
        let second = store.begin_load(1);

        let newer = vec![testing::record(2, 1, "new")];
        assert!(matches!(store.finish_load(second, Ok(newer)), Outcome::Applied));
        let older = vec![testing::record(1, 1, "old")];
        assert!(matches!(store.finish_load(first, Ok(older)), Outcome::Stale));
        assert_eq!(ids(&store), vec![2]);
    }

    #[test]
    fn test_load_for_previous_user_is_discarded() {
        let mut store = RecordStore::new();
        store.reset_for(Some(1));
        let ticket = store.begin_load(1);
        store.reset_for(Some(2));
        let outcome = store.finish_load(ticket, Ok(vec![testing::record(1, 1, "x")]));
        assert!(matches!(outcome, Outcome::Stale));
        assert!(store.records().is_empty());
    }

    #[test]
    fn test_failed_load_keeps_list() {
        let api = FakeApi::with_records(three_records());
        let mut store = seeded(&api);
        let ticket = store.begin_load(1);
        let outcome = store.finish_load(ticket, Err(MingliError::Network("down".into())));
        assert!(matches!(outcome, Outcome::Failed(_)));
        assert_eq!(ids(&store), vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_create_refetches_server_truth() {
        let api = FakeApi::with_records(three_records());
        let mut store = seeded(&api);
        store.create(&api, 1, testing::draft("小美")).await.unwrap();

        assert_eq!(store.records(), api.server_records(1).as_slice());
        assert_eq!(store.records()[0].nickname, "小美");
        assert_eq!(api.calls(), vec!["create:1", "list:1"]);
        assert!(store.editing().is_none());
    }

    #[tokio::test]
    async fn test_update_refetches_server_truth() {
        let api = FakeApi::with_records(three_records());
        let mut store = seeded(&api);
        store.update(&api, 1, 2, testing::draft("改名")).await.unwrap();
        assert_eq!(store.get(2).unwrap().nickname, "改名");
        assert_eq!(api.calls(), vec!["update:2", "list:1"]);
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_list_untouched() {
        let api = FakeApi::with_records(three_records());
        let mut store = seeded(&api);
        api.set_fail_mutations(true);

        let before = store.records().to_vec();
        let err = store.delete(&api, 1, 3).await.unwrap_err();
        assert!(matches!(err, MingliError::Network(_)));
        assert_eq!(store.records(), before.as_slice());
        // No refetch and no retry after the failed delete
        assert_eq!(api.calls(), vec!["delete:3"]);
    }

    #[tokio::test]
    async fn test_failed_refetch_leaves_list_untouched() {
        let api = FakeApi::with_records(three_records());
        let mut store = seeded(&api);
        api.set_fail_list(true);

        // The delete landed, so it is not reported as failed
        store.delete(&api, 1, 3).await.unwrap();
        assert_eq!(ids(&store), vec![3, 2, 1]);
        assert_eq!(api.calls(), vec!["delete:3", "list:1"]);
        assert!(api.server_records(1).iter().all(|r| r.id != 3));
    }

    #[test]
    fn test_refetch_outranks_loads_queued_during_mutation() {
        let api = FakeApi::with_records(three_records());
        let mut store = seeded(&api);
        store.begin_create();
        let save = store.prepare_save(1, testing::draft("小美")).unwrap();
        let reload = store.begin_load(1);

        assert!(matches!(store.finish_mutation(&save, Ok(())), Outcome::Applied));
        let refetch = store.begin_refetch(&save);
        assert!(refetch.seq > reload.seq);
        assert_eq!(refetch.follows, Some("created"));

        let mut fresh = three_records();
        fresh.insert(0, testing::record(4, 1, "小美"));
        assert!(matches!(store.finish_load(refetch, Ok(fresh)), Outcome::Applied));
        // The reload was sent before the create landed
        let outcome = store.finish_load(reload, Ok(three_records()));
        assert!(matches!(outcome, Outcome::Stale));
        assert_eq!(ids(&store), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_second_save_waits_for_first() {
        let api = FakeApi::with_records(three_records());
        let mut store = seeded(&api);
        store.begin_create();
        let first = store.prepare_save(1, testing::draft("小美")).unwrap();
        assert!(store.is_saving());
        let err = store.prepare_save(1, testing::draft("小美")).unwrap_err();
        assert!(matches!(err, MingliError::Validation(_)));

        store.finish_mutation(&first, Err(MingliError::Network("down".into())));
        assert!(!store.is_saving());
        assert!(store.prepare_save(1, testing::draft("小美")).is_ok());
    }

    #[test]
    fn test_successful_save_closes_only_its_own_form() {
        let api = FakeApi::with_records(three_records());
        let mut store = seeded(&api);
        store.begin_edit(2).unwrap();
        let ticket = store.prepare_save(1, testing::draft("改名")).unwrap();
        store.begin_create();

        assert!(matches!(store.finish_mutation(&ticket, Ok(())), Outcome::Applied));
        assert_eq!(store.editing(), Some(EditTarget::New));
    }

    #[test]
    fn test_reload_drops_form_of_vanished_record() {
        let api = FakeApi::with_records(three_records());
        let mut store = seeded(&api);
        store.begin_edit(2).unwrap();

        let ticket = store.begin_load(1);
        let remaining = vec![testing::record(3, 1, "小明"), testing::record(1, 1, "小刚")];
        assert!(matches!(store.finish_load(ticket, Ok(remaining)), Outcome::Applied));
        assert!(store.editing().is_none());
    }

    #[tokio::test]
    async fn test_invalid_draft_never_hits_network() {
        let api = FakeApi::new();
        let mut store = seeded(&api);
        let err = store.create(&api, 1, testing::draft("  ")).await.unwrap_err();
        assert!(matches!(err, MingliError::Validation(_)));
        assert!(api.calls().is_empty());
        // The form stays open for correction
        assert_eq!(store.editing(), Some(EditTarget::New));
    }

    #[test]
    fn test_failed_save_keeps_form_open() {
        let api = FakeApi::with_records(three_records());
        let mut store = seeded(&api);
        store.begin_edit(2).unwrap();
        let ticket = store.prepare_save(1, testing::draft("x")).unwrap();
        let outcome = store.finish_mutation(&ticket, Err(MingliError::Network("down".into())));
        assert!(matches!(outcome, Outcome::Failed(_)));
        assert_eq!(store.editing_id(), Some(2));
    }

    #[test]
    fn test_prepare_save_follows_edit_target() {
        let api = FakeApi::with_records(three_records());
        let mut store = seeded(&api);

        assert!(store.prepare_save(1, testing::draft("x")).is_err());

        store.begin_create();
        let ticket = store.prepare_save(1, testing::draft(" 小美 ")).unwrap();
        assert_eq!(
            ticket.mutation,
            Mutation::Create {
                draft: testing::draft("小美")
            }
        );
        store.finish_mutation(&ticket, Err(MingliError::Network("down".into())));

        store.begin_edit(2).unwrap();
        let ticket = store.prepare_save(1, testing::draft("y")).unwrap();
        assert!(matches!(ticket.mutation, Mutation::Update { id: 2, .. }));
    }

    #[test]
    fn test_begin_edit_unknown_id_is_noop() {
        let api = FakeApi::with_records(three_records());
        let mut store = seeded(&api);
        assert!(store.begin_edit(42).is_none());
        assert!(store.editing().is_none());
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let api = FakeApi::with_records(three_records());
        let mut store = seeded(&api);

        assert!(store.confirm_delete(1).is_none());
        assert!(!store.request_delete(42));

        assert!(store.request_delete(3));
        store.cancel_delete();
        assert!(store.pending_delete().is_none());
        assert!(store.confirm_delete(1).is_none());

        store.request_delete(3);
        let ticket = store.confirm_delete(1).unwrap();
        assert_eq!(ticket.mutation, Mutation::Delete { id: 3 });
        assert!(store.pending_delete().is_none());
    }

    #[test]
    fn test_reset_clears_forms_and_list() {
        let api = FakeApi::with_records(three_records());
        let mut store = seeded(&api);
        store.begin_edit(1);
        store.request_delete(2);
        store.reset_for(None);
        assert!(store.records().is_empty());
        assert!(store.editing().is_none());
        assert!(store.pending_delete().is_none());
    }
}
