//! Network work requested by the state machine, and its results.

use crate::analysis::{self, AnalysisTicket};
use crate::api::ClientApi;
use crate::error::Result;
use crate::model::{AnalysisResult, BirthRecord, CreateUserResponse, NewUser};
use crate::records::{self, LoadTicket, MutationTicket};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    CreateUser(NewUser),
    LoadRecords(LoadTicket),
    /// A record mutation. Its list refetch is a separate effect, issued
    /// once the mutation has landed.
    Mutate(MutationTicket),
    RunAnalysis(AnalysisTicket),
}

impl Effect {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CreateUser(_) => "create_user",
            Self::LoadRecords(_) => "load_records",
            Self::Mutate(_) => "mutate",
            Self::RunAnalysis(_) => "run_analysis",
        }
    }
}

/// The outcome of one effect, carrying the ticket it was issued with.
#[derive(Debug)]
pub enum Completion {
    UserCreated {
        new_user: NewUser,
        result: Result<CreateUserResponse>,
    },
    RecordsLoaded {
        ticket: LoadTicket,
        result: Result<Vec<BirthRecord>>,
    },
    Mutated {
        ticket: MutationTicket,
        result: Result<()>,
    },
    Analysis {
        ticket: AnalysisTicket,
        result: Result<AnalysisResult>,
    },
}

pub async fn execute(api: &impl ClientApi, effect: Effect) -> Completion {
    tracing::debug!(effect = effect.label(), "executing");
    match effect {
        Effect::CreateUser(new_user) => {
            let result = api.create_user(&new_user).await;
            Completion::UserCreated { new_user, result }
        }
        Effect::LoadRecords(ticket) => {
            let result = api.list_birth_records(ticket.user_id).await;
            Completion::RecordsLoaded { ticket, result }
        }
        Effect::Mutate(ticket) => {
            let result = records::send_mutation(api, &ticket).await;
            Completion::Mutated { ticket, result }
        }
        Effect::RunAnalysis(ticket) => {
            let result = analysis::fetch(api, ticket).await;
            Completion::Analysis { ticket, result }
        }
    }
}
