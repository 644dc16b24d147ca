//! HTTP client for the TrustPoll admin API

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::AdminApi;
use crate::decode;
use crate::error::{ApiError, Result};
use crate::types::*;

/// Environment variable holding the API origin.
pub const API_URL_ENV: &str = "TRUSTPOLL_API_URL";

/// Origin used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API origin, e.g. `http://localhost:5000`
    pub base_url: String,
    /// Per-request timeout; an elapsed timeout is a transport failure
    pub timeout_secs: u64,
    /// Field that identifies flagged actors
    pub subject_field: SubjectField,
    /// Route serving candidates with their tallies
    pub candidates_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            subject_field: SubjectField::default(),
            candidates_path: Endpoint::Candidates.path().to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults, with the origin taken from `TRUSTPOLL_API_URL` when set.
    pub fn from_env() -> Self {
        let base_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            base_url,
            ..Default::default()
        }
    }
}

/// reqwest-backed [`AdminApi`].
///
/// # Example
///
/// ```rust,no_run
/// use trustpoll_client::{AdminApi, ClientConfig, TrustPollClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TrustPollClient::new(ClientConfig {
///     base_url: "http://localhost:5000".into(),
///     ..Default::default()
/// })?;
///
/// let stats = client.stats().await?;
/// println!("{} registered users", stats.users);
/// # Ok(())
/// # }
/// ```
pub struct TrustPollClient {
    config: ClientConfig,
    client: Client,
}

impl TrustPollClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// `GET /health`; a transport failure is reported as an error, any
    /// response as up/down.
    pub async fn health(&self) -> Result<bool> {
        let response = self.client.get(self.url(Endpoint::Health.path())).send().await?;
        Ok(response.status().is_success())
    }

    // ==================== Helper Methods ====================

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get(&self, endpoint: Endpoint, path_and_query: &str) -> Result<Vec<u8>> {
        let request = self.client.get(self.url(path_and_query));
        self.send(endpoint, request).await
    }

    async fn post_json<B: Serialize + Sync + ?Sized>(&self, endpoint: Endpoint, body: &B) -> Result<Vec<u8>> {
        let request = self
            .client
            .post(self.url(endpoint.path()))
            .header(header::CONTENT_TYPE, "application/json")
            .json(body);
        self.send(endpoint, request).await
    }

    async fn post_empty(&self, endpoint: Endpoint) -> Result<Vec<u8>> {
        let request = self.client.post(self.url(endpoint.path()));
        self.send(endpoint, request).await
    }

    async fn send(&self, endpoint: Endpoint, request: RequestBuilder) -> Result<Vec<u8>> {
        debug!(endpoint = %endpoint, "Sending request");

        let response = request.send().await.map_err(|e| {
            warn!(endpoint = %endpoint, error = %e, "Request did not complete");
            ApiError::from(e)
        })?;

        let status = response.status();
        let body = response.bytes().await?.to_vec();

        if !status.is_success() {
            let message = decode::error_message(&body);
            debug!(endpoint = %endpoint, status = status.as_u16(), ?message, "Server rejected request");
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl AdminApi for TrustPollClient {
    async fn stats(&self) -> Result<Stats> {
        let body = self.get(Endpoint::Stats, Endpoint::Stats.path()).await?;
        Ok(decode::stats(&body)?)
    }

    async fn ai_flags(&self) -> Result<Vec<AiFlag>> {
        let body = self.get(Endpoint::AiFlags, Endpoint::AiFlags.path()).await?;
        Ok(decode::ai_flags(&body, self.config.subject_field)?)
    }

    async fn candidates(&self) -> Result<Vec<Candidate>> {
        let body = self
            .get(Endpoint::Candidates, &self.config.candidates_path)
            .await?;
        Ok(decode::candidates(&body)?)
    }

    async fn audit_events(&self, limit: u32) -> Result<Vec<AuditEvent>> {
        let path = format!("{}?limit={}", Endpoint::AuditEvents.path(), limit);
        let body = self.get(Endpoint::AuditEvents, &path).await?;
        Ok(decode::audit_events(&body)?)
    }

    async fn fairness_index(&self) -> Result<FairnessReport> {
        let body = self
            .get(Endpoint::FairnessIndex, Endpoint::FairnessIndex.path())
            .await?;
        Ok(decode::fairness_report(&body)?)
    }

    async fn governance_audit(&self, election_id: &str) -> Result<Option<GovernanceAudit>> {
        let path = format!(
            "{}?election_id={}",
            Endpoint::GovernanceAudit.path(),
            urlencoding::encode(election_id)
        );
        let body = self.get(Endpoint::GovernanceAudit, &path).await?;
        Ok(decode::governance_audit(&body)?)
    }

    async fn acknowledge_flag(&self, subject: &Subject) -> Result<()> {
        self.post_json(Endpoint::AcknowledgeFlag, &subject.to_body())
            .await?;
        Ok(())
    }

    async fn block_subject(&self, subject: &Subject, minutes: u32) -> Result<BlockReceipt> {
        let mut body = subject.to_body();
        body.insert("minutes".to_string(), serde_json::Value::from(minutes));

        let response = self.post_json(Endpoint::BlockSubject, &body).await?;
        Ok(decode::block_receipt(&response)?)
    }

    async fn add_candidate(&self, request: &AddCandidateRequest) -> Result<Candidate> {
        let response = self.post_json(Endpoint::AddCandidate, request).await?;
        Ok(decode::added_candidate(&response)?)
    }

    async fn delete_candidate(&self, request: &DeleteCandidateRequest) -> Result<()> {
        self.post_json(Endpoint::DeleteCandidate, request).await?;
        Ok(())
    }

    async fn publish_results(&self, request: &PublishResultsRequest) -> Result<()> {
        self.post_json(Endpoint::PublishResults, request).await?;
        Ok(())
    }

    async fn generate_fairness_report(&self) -> Result<FairnessReport> {
        let response = self.post_empty(Endpoint::GenerateFairnessReport).await?;
        Ok(decode::fairness_report(&response)?)
    }
}
