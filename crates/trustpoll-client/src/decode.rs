//! Response normalization, one decoder per endpoint
//!
//! Endpoints in the wild disagree on envelope shapes (bare array vs
//! `{results: [...]}`, nullable `audit`, email vs wallet keys). Each decoder
//! here accepts every shape the server is known to send and returns either a
//! fully-typed record or a [`DecodeError`]; partial objects never escape.

use crate::error::DecodeError;
use crate::types::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;

fn parse<T: DeserializeOwned>(endpoint: Endpoint, body: &[u8]) -> Result<T, DecodeError> {
    serde_json::from_slice(body).map_err(|source| DecodeError::Json {
        endpoint: endpoint.label(),
        source,
    })
}

/// `GET /admin/stats`
pub fn stats(body: &[u8]) -> Result<Stats, DecodeError> {
    parse(Endpoint::Stats, body)
}

#[derive(Deserialize)]
struct RawFlag {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    wallet: Option<String>,
    reason: String,
    severity: i64,
    created_at: String,
}

/// `GET /admin/ai-flags`, keyed by `field`.
pub fn ai_flags(body: &[u8], field: SubjectField) -> Result<Vec<AiFlag>, DecodeError> {
    let endpoint = Endpoint::AiFlags.label();
    let raw: Vec<RawFlag> = parse(Endpoint::AiFlags, body)?;

    raw.into_iter()
        .map(|flag| -> Result<AiFlag, DecodeError> {
            let value = match field {
                SubjectField::Email => flag.email,
                SubjectField::Wallet => flag.wallet,
            }
            .ok_or(DecodeError::MissingField {
                endpoint,
                field: field.as_str(),
            })?;

            let severity = u8::try_from(flag.severity)
                .ok()
                .filter(|s| *s <= 10)
                .ok_or_else(|| DecodeError::Invalid {
                    endpoint,
                    detail: format!("severity {} outside 0..=10", flag.severity),
                })?;

            Ok(AiFlag {
                subject: Subject::new(field, value),
                reason: flag.reason,
                severity,
                created_at: flag.created_at,
            })
        })
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CandidateList {
    Bare(Vec<Candidate>),
    Wrapped { results: Vec<Candidate> },
}

/// `GET /admin/candidates` or `GET /results`: bare array or `{results}`.
pub fn candidates(body: &[u8]) -> Result<Vec<Candidate>, DecodeError> {
    let value: serde_json::Value = parse(Endpoint::Candidates, body)?;
    match serde_json::from_value::<CandidateList>(value) {
        Ok(CandidateList::Bare(list)) | Ok(CandidateList::Wrapped { results: list }) => Ok(list),
        Err(_) => Err(DecodeError::Invalid {
            endpoint: Endpoint::Candidates.label(),
            detail: "expected an array of candidates or {\"results\": [...]}".to_string(),
        }),
    }
}

/// `POST /admin/add-candidate` response (`{message, id, name}`)
pub fn added_candidate(body: &[u8]) -> Result<Candidate, DecodeError> {
    parse(Endpoint::AddCandidate, body)
}

/// `GET /admin/audit-events`
pub fn audit_events(body: &[u8]) -> Result<Vec<AuditEvent>, DecodeError> {
    parse(Endpoint::AuditEvents, body)
}

/// `GET /fairness-index` and `POST /fairness-index`
pub fn fairness_report(body: &[u8]) -> Result<FairnessReport, DecodeError> {
    parse(Endpoint::FairnessIndex, body)
}

#[derive(Deserialize)]
struct GovernanceEnvelope {
    #[serde(default)]
    audit: Option<GovernanceAudit>,
}

/// `GET /admin/governance-audit`; `None` until the first monitored event.
pub fn governance_audit(body: &[u8]) -> Result<Option<GovernanceAudit>, DecodeError> {
    let envelope: GovernanceEnvelope = parse(Endpoint::GovernanceAudit, body)?;
    Ok(envelope.audit)
}

/// `POST /admin/block-email` response
pub fn block_receipt(body: &[u8]) -> Result<BlockReceipt, DecodeError> {
    parse(Endpoint::BlockSubject, body)
}

/// The `error` string of a non-2xx body, if there is one.
pub fn error_message(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
        .filter(|e| !e.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_accepts_both_shapes() {
        let bare = br#"[{"id": 1, "name": "Aria Shah", "votes": 4}]"#;
        let wrapped = br#"{"results": [{"id": 1, "name": "Aria Shah", "votes": 4}]}"#;

        assert_eq!(candidates(bare).unwrap(), candidates(wrapped).unwrap());
        assert_eq!(candidates(bare).unwrap()[0].votes, 4);
    }

    #[test]
    fn test_candidates_rejects_other_shapes() {
        let err = candidates(br#"{"candidates": []}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Invalid { .. }));

        let err = candidates(b"not json").unwrap_err();
        assert!(matches!(err, DecodeError::Json { .. }));
    }

    #[test]
    fn test_added_candidate_defaults_votes() {
        let c = added_candidate(br#"{"message": "Candidate added", "id": 7, "name": "Aria Shah"}"#)
            .unwrap();
        assert_eq!(c.id, 7);
        assert_eq!(c.votes, 0);
    }

    #[test]
    fn test_ai_flags_by_configured_field() {
        let body = br#"[
            {"wallet": "WALLET_AB12", "reason": "Rapid voting attempts detected", "severity": 7, "created_at": "2024-01-01T10:00:00"}
        ]"#;

        let flags = ai_flags(body, SubjectField::Wallet).unwrap();
        assert_eq!(flags[0].subject, Subject::wallet("WALLET_AB12"));
        assert_eq!(flags[0].severity, 7);

        let err = ai_flags(body, SubjectField::Email).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { field: "email", .. }));
    }

    #[test]
    fn test_ai_flags_rejects_out_of_range_severity() {
        let body = br#"[{"email": "a@vit.edu", "reason": "x", "severity": 11, "created_at": "t"}]"#;
        assert!(matches!(
            ai_flags(body, SubjectField::Email).unwrap_err(),
            DecodeError::Invalid { .. }
        ));

        let body = br#"[{"email": "a@vit.edu", "reason": "x", "severity": -1, "created_at": "t"}]"#;
        assert!(ai_flags(body, SubjectField::Email).is_err());
    }

    #[test]
    fn test_governance_audit_envelope() {
        let present = br#"{"audit": {
            "total_admin_high_risk_events": 2,
            "total_admin_critical_events": 1,
            "blockchain_verification_status": "VERIFIED",
            "tampering_detection_result": "NONE",
            "governance_integrity_status": "COMPROMISED"
        }}"#;
        let audit = governance_audit(present).unwrap().unwrap();
        assert!(audit.governance_integrity_status.is_compromised());

        assert_eq!(governance_audit(br#"{"audit": null}"#).unwrap(), None);
        assert_eq!(governance_audit(br#"{}"#).unwrap(), None);
    }

    #[test]
    fn test_fairness_report_keeps_unknown_metrics() {
        let body = br#"{
            "fairness_score": 92.5,
            "formula": {"equation": "100 - penalties"},
            "metrics": {"tampering_attempts_detected": 1, "late_votes": 3},
            "fairness_hash": "f00d",
            "algorand_tx_id": null,
            "computed_at": "2024-01-01T10:00:00Z",
            "governance_risk_flag": true
        }"#;
        let report = fairness_report(body).unwrap();
        assert_eq!(report.metrics.tampering_attempts_detected, 1);
        assert_eq!(report.metrics.suspicious_ip_clusters, 0);
        assert_eq!(report.metrics.extra["late_votes"], 3);
        assert!(report.governance_risk_flag);
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(br#"{"error": "Wallet is required"}"#).as_deref(),
            Some("Wallet is required")
        );
        assert_eq!(error_message(b"<html>Bad Gateway</html>"), None);
        assert_eq!(error_message(br#"{"error": ""}"#), None);
    }
}
