mod http;

pub use http::HttpClient;

use crate::error::Result;
use crate::model::*;

/// The backend service contract. `HttpClient` is the production
/// implementation; tests substitute in-process fakes.
///
/// Every failure is a [`crate::error::MingliError::Network`], whatever the
/// cause. Nothing is retried.
pub trait ClientApi: Send + Sync {
    // -- Users --

    fn create_user(
        &self,
        user: &NewUser,
    ) -> impl std::future::Future<Output = Result<CreateUserResponse>> + Send;

    fn get_user(&self, openid: &str) -> impl std::future::Future<Output = Result<User>> + Send;

    // -- Birth records --

    /// All records of a user, in server order.
    fn list_birth_records(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<BirthRecord>>> + Send;

    fn create_birth_record(
        &self,
        user_id: i64,
        draft: &BirthDraft,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn update_birth_record(
        &self,
        id: i64,
        draft: &BirthDraft,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn delete_birth_record(&self, id: i64) -> impl std::future::Future<Output = Result<()>> + Send;

    // -- Analysis --

    fn run_analysis(
        &self,
        record_id: i64,
        kind: AnalysisKind,
    ) -> impl std::future::Future<Output = Result<AnalysisResult>> + Send;

    /// Previously computed analyses for a record, newest first.
    fn analysis_history(
        &self,
        record_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<AnalysisHistoryEntry>>> + Send;
}
