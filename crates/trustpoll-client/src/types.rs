//! Wire records for the TrustPoll admin API

use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==================== Routes ====================

/// Every route the admin surface talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Health,
    Stats,
    AiFlags,
    Candidates,
    AuditEvents,
    FairnessIndex,
    GovernanceAudit,
    AcknowledgeFlag,
    BlockSubject,
    AddCandidate,
    DeleteCandidate,
    PublishResults,
    GenerateFairnessReport,
}

impl Endpoint {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::Health
            | Endpoint::Stats
            | Endpoint::AiFlags
            | Endpoint::Candidates
            | Endpoint::AuditEvents
            | Endpoint::FairnessIndex
            | Endpoint::GovernanceAudit => Method::GET,
            Endpoint::AcknowledgeFlag
            | Endpoint::BlockSubject
            | Endpoint::AddCandidate
            | Endpoint::DeleteCandidate
            | Endpoint::PublishResults
            | Endpoint::GenerateFairnessReport => Method::POST,
        }
    }

    /// Default path, relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Health => "/health",
            Endpoint::Stats => "/admin/stats",
            Endpoint::AiFlags => "/admin/ai-flags",
            Endpoint::Candidates => "/admin/candidates",
            Endpoint::AuditEvents => "/admin/audit-events",
            Endpoint::FairnessIndex | Endpoint::GenerateFairnessReport => "/fairness-index",
            Endpoint::GovernanceAudit => "/admin/governance-audit",
            Endpoint::AcknowledgeFlag => "/admin/acknowledge-flag",
            Endpoint::BlockSubject => "/admin/block-email",
            Endpoint::AddCandidate => "/admin/add-candidate",
            Endpoint::DeleteCandidate => "/admin/delete-candidate",
            Endpoint::PublishResults => "/admin/publish-results",
        }
    }

    /// `VERB /path`, used in logs and decode errors.
    pub fn label(&self) -> &'static str {
        match self {
            Endpoint::Health => "GET /health",
            Endpoint::Stats => "GET /admin/stats",
            Endpoint::AiFlags => "GET /admin/ai-flags",
            Endpoint::Candidates => "GET /admin/candidates",
            Endpoint::AuditEvents => "GET /admin/audit-events",
            Endpoint::FairnessIndex => "GET /fairness-index",
            Endpoint::GovernanceAudit => "GET /admin/governance-audit",
            Endpoint::AcknowledgeFlag => "POST /admin/acknowledge-flag",
            Endpoint::BlockSubject => "POST /admin/block-email",
            Endpoint::AddCandidate => "POST /admin/add-candidate",
            Endpoint::DeleteCandidate => "POST /admin/delete-candidate",
            Endpoint::PublishResults => "POST /admin/publish-results",
            Endpoint::GenerateFairnessReport => "POST /fairness-index",
        }
    }

    pub fn is_mutation(&self) -> bool {
        self.method() == Method::POST
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ==================== Subjects ====================

/// Which JSON field identifies a flagged actor.
///
/// Deployments key anomaly flags either by email or by wallet; the rest of
/// the record is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectField {
    #[default]
    Email,
    Wallet,
}

impl SubjectField {
    /// JSON key
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectField::Email => "email",
            SubjectField::Wallet => "wallet",
        }
    }

    /// Capitalized label for operator messages
    pub fn label(&self) -> &'static str {
        match self {
            SubjectField::Email => "Email",
            SubjectField::Wallet => "Wallet",
        }
    }
}

/// A flagged actor, identified by the configured field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subject {
    pub field: SubjectField,
    pub value: String,
}

impl Subject {
    pub fn new(field: SubjectField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    pub fn email(value: impl Into<String>) -> Self {
        Self::new(SubjectField::Email, value)
    }

    pub fn wallet(value: impl Into<String>) -> Self {
        Self::new(SubjectField::Wallet, value)
    }

    /// `{"email": value}` or `{"wallet": value}`
    pub fn to_body(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut body = serde_json::Map::new();
        body.insert(
            self.field.as_str().to_string(),
            serde_json::Value::String(self.value.clone()),
        );
        body
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

// ==================== Read models ====================

/// `GET /admin/stats`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub users: u64,
    pub vote_attempts: u64,
    pub ai_flags: u64,
    #[serde(default)]
    pub governance_status: Option<String>,
}

/// One entry of `GET /admin/ai-flags`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiFlag {
    pub subject: Subject,
    pub reason: String,
    /// 0..=10
    pub severity: u8,
    pub created_at: String,
}

/// A candidate with its current tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i64,
    pub name: String,
    /// Absent on the add-candidate response
    #[serde(default)]
    pub votes: u64,
}

/// One entry of the hash-chained governance ledger.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuditEvent {
    pub event_type: String,
    /// Servers send either a label ("HIGH") or a number
    #[serde(deserialize_with = "severity_text")]
    pub severity: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub entry_hash: String,
    #[serde(default)]
    pub anchored_tx_id: Option<String>,
    #[serde(default)]
    pub anchored_round: Option<u64>,
    pub created_at: String,
}

fn severity_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessFormula {
    pub equation: String,
}

/// Counters feeding the fairness score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FairnessMetrics {
    #[serde(default)]
    pub tampering_attempts_detected: u64,
    #[serde(default)]
    pub duplicate_attempts_blocked: u64,
    #[serde(default)]
    pub abnormal_timing_clusters: u64,
    #[serde(default)]
    pub suspicious_ip_clusters: u64,
    #[serde(default)]
    pub admin_high_risk_events: u64,
    #[serde(default)]
    pub admin_critical_events: u64,
    /// Metrics this client does not know by name
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// `GET /fairness-index`; also the body returned when a report is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessReport {
    pub fairness_score: f64,
    #[serde(default)]
    pub formula: Option<FairnessFormula>,
    #[serde(default)]
    pub metrics: FairnessMetrics,
    pub fairness_hash: String,
    #[serde(default)]
    pub algorand_tx_id: Option<String>,
    #[serde(default)]
    pub computed_at: Option<String>,
    #[serde(default)]
    pub governance_risk_flag: bool,
}

/// Overall governance verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntegrityStatus {
    Normal,
    Compromised,
    Other(String),
}

impl IntegrityStatus {
    pub fn as_str(&self) -> &str {
        match self {
            IntegrityStatus::Normal => "NORMAL",
            IntegrityStatus::Compromised => "COMPROMISED",
            IntegrityStatus::Other(other) => other,
        }
    }

    pub fn is_compromised(&self) -> bool {
        matches!(self, IntegrityStatus::Compromised)
    }
}

impl From<String> for IntegrityStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "NORMAL" => IntegrityStatus::Normal,
            "COMPROMISED" => IntegrityStatus::Compromised,
            _ => IntegrityStatus::Other(value),
        }
    }
}

impl From<IntegrityStatus> for String {
    fn from(status: IntegrityStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for IntegrityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `audit` object of `GET /admin/governance-audit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceAudit {
    pub total_admin_high_risk_events: u64,
    pub total_admin_critical_events: u64,
    pub blockchain_verification_status: String,
    pub tampering_detection_result: String,
    pub governance_integrity_status: IntegrityStatus,
}

// ==================== Commands ====================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddCandidateRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteCandidateRequest {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResultsRequest {
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,
}

/// `POST /admin/block-email` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReceipt {
    pub blocked_until: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_body_uses_configured_field() {
        let body = Subject::wallet("WALLET_AB12").to_body();
        assert_eq!(body.get("wallet").unwrap(), "WALLET_AB12");
        assert!(body.get("email").is_none());
    }

    #[test]
    fn test_admin_id_omitted_when_absent() {
        let body = serde_json::to_value(PublishResultsRequest {
            published: true,
            admin_id: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"published": true}));

        let body = serde_json::to_value(DeleteCandidateRequest {
            id: 3,
            admin_id: Some("admin@vit.edu".into()),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"id": 3, "admin_id": "admin@vit.edu"}));
    }

    #[test]
    fn test_integrity_status_round_trip_keeps_unknown_values() {
        let status: IntegrityStatus = serde_json::from_str("\"UNDER_REVIEW\"").unwrap();
        assert_eq!(status, IntegrityStatus::Other("UNDER_REVIEW".into()));
        assert!(!status.is_compromised());

        let status: IntegrityStatus = serde_json::from_str("\"COMPROMISED\"").unwrap();
        assert!(status.is_compromised());
    }

    #[test]
    fn test_audit_severity_accepts_numbers() {
        let event: AuditEvent = serde_json::from_value(serde_json::json!({
            "event_type": "ADMIN_DELETE_CANDIDATE",
            "severity": 8,
            "entry_hash": "ab",
            "created_at": "2024-01-01T10:00:00"
        }))
        .unwrap();
        assert_eq!(event.severity, "8");
        assert_eq!(event.anchored_tx_id, None);
        assert_eq!(event.payload, serde_json::Value::Null);
    }

    #[test]
    fn test_endpoint_labels() {
        assert_eq!(Endpoint::BlockSubject.label(), "POST /admin/block-email");
        assert!(Endpoint::GenerateFairnessReport.is_mutation());
        assert!(!Endpoint::FairnessIndex.is_mutation());
        assert_eq!(
            Endpoint::FairnessIndex.path(),
            Endpoint::GenerateFairnessReport.path()
        );
    }
}
