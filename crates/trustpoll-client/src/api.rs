//! The `AdminApi` capability trait.
//!
//! The dashboard controller talks to the voting backend only through this
//! trait, so the reqwest client and the in-memory [`MockApi`](crate::MockApi)
//! are interchangeable.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::*;

/// Remote operations available to the admin dashboard.
#[async_trait]
pub trait AdminApi: Send + Sync {
    // ----- reads -----

    async fn stats(&self) -> Result<Stats>;

    async fn ai_flags(&self) -> Result<Vec<AiFlag>>;

    async fn candidates(&self) -> Result<Vec<Candidate>>;

    /// Newest events, at most `limit`.
    async fn audit_events(&self, limit: u32) -> Result<Vec<AuditEvent>>;

    async fn fairness_index(&self) -> Result<FairnessReport>;

    /// `None` until the server has recorded a monitored admin event.
    async fn governance_audit(&self, election_id: &str) -> Result<Option<GovernanceAudit>>;

    // ----- mutations -----

    async fn acknowledge_flag(&self, subject: &Subject) -> Result<()>;

    async fn block_subject(&self, subject: &Subject, minutes: u32) -> Result<BlockReceipt>;

    async fn add_candidate(&self, request: &AddCandidateRequest) -> Result<Candidate>;

    async fn delete_candidate(&self, request: &DeleteCandidateRequest) -> Result<()>;

    async fn publish_results(&self, request: &PublishResultsRequest) -> Result<()>;

    /// Compute, anchor and return a fresh fairness report.
    async fn generate_fairness_report(&self) -> Result<FairnessReport>;
}
