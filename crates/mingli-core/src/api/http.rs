use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::ClientApi;
use crate::config::ApiConfig;
use crate::error::{MingliError, Result};
use crate::model::*;

/// `ClientApi` over HTTP/JSON.
pub struct HttpClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| MingliError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let req = self.http.get(self.url(path));
        self.execute(Method::GET, path, req).await
    }

    async fn send<B: Serialize + ?Sized + Sync, R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let req = self.http.request(method.clone(), self.url(path)).json(body);
        self.execute(method, path, req).await
    }

    async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let req = self.http.delete(self.url(path));
        self.execute(Method::DELETE, path, req).await
    }

    /// Send one request and decode its JSON body. Transport errors, non-2xx
    /// statuses and undecodable bodies all become `MingliError::Network`.
    async fn execute<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        req: RequestBuilder,
    ) -> Result<R> {
        tracing::debug!(%method, path, "api request");
        let resp = req
            .send()
            .await
            .map_err(|e| MingliError::Network(format!("{method} {path}: {e}")))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| MingliError::Network(format!("{method} {path}: {e}")))?;

        if !status.is_success() {
            return Err(MingliError::Network(format!(
                "{method} {path} returned {status}: {}",
                preview(&body)
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            MingliError::Network(format!(
                "failed to decode {method} {path} response: {e}\nBody: {}",
                preview(&body)
            ))
        })
    }
}

/// Mutation endpoints acknowledge with `{success}`; `false` is a failure.
fn check_ack(resp: MutationResponse, what: &str) -> Result<()> {
    if resp.success {
        Ok(())
    } else {
        Err(MingliError::Network(format!("server rejected {what}")))
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(300) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

impl ClientApi for HttpClient {
    async fn create_user(&self, user: &NewUser) -> Result<CreateUserResponse> {
        self.send(Method::POST, "/api/users", user).await
    }

    async fn get_user(&self, openid: &str) -> Result<User> {
        self.get(&format!("/api/users/{openid}")).await
    }

    async fn list_birth_records(&self, user_id: i64) -> Result<Vec<BirthRecord>> {
        self.get(&format!("/api/birth-info/user/{user_id}")).await
    }

    async fn create_birth_record(&self, user_id: i64, draft: &BirthDraft) -> Result<()> {
        let body = NewBirthRecord { user_id, draft };
        let resp = self.send(Method::POST, "/api/birth-info", &body).await?;
        check_ack(resp, "birth record creation")
    }

    async fn update_birth_record(&self, id: i64, draft: &BirthDraft) -> Result<()> {
        let resp = self
            .send(Method::PUT, &format!("/api/birth-info/{id}"), draft)
            .await?;
        check_ack(resp, "birth record update")
    }

    async fn delete_birth_record(&self, id: i64) -> Result<()> {
        let resp = self.delete(&format!("/api/birth-info/{id}")).await?;
        check_ack(resp, "birth record deletion")
    }

    async fn run_analysis(&self, record_id: i64, kind: AnalysisKind) -> Result<AnalysisResult> {
        let body = AnalysisRequest {
            birth_info_id: record_id,
            analysis_type: kind,
        };
        let value: serde_json::Value = self
            .send(Method::POST, &format!("/api/analysis/{kind}"), &body)
            .await?;
        AnalysisResult::from_value(kind, value)
            .map_err(|e| MingliError::Network(format!("malformed {kind} analysis: {e}")))
    }

    async fn analysis_history(&self, record_id: i64) -> Result<Vec<AnalysisHistoryEntry>> {
        self.get(&format!("/api/analysis/history/{record_id}")).await
    }
}
