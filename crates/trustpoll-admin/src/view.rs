//! Presentation-ready projection of the dashboard state.
//!
//! Everything here is a pure function of its inputs.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::BTreeSet;

use crate::config::ViewConfig;
use crate::locks::keys;
use crate::state::{DashboardState, PanelMessages};
use trustpoll_client::{AuditEvent, FairnessReport, GovernanceAudit};

/// Audit row without an anchor transaction.
pub const NOT_ANCHORED: &str = "Not anchored";

/// Fairness report without an anchor transaction.
pub const NOT_ANCHORED_YET: &str = "Not anchored yet";

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityBand {
    High,
    Medium,
    Low,
}

impl SeverityBand {
    /// >= 7 high, >= 4 medium, otherwise low.
    pub fn from_severity(severity: u8) -> Self {
        match severity {
            7.. => SeverityBand::High,
            4..=6 => SeverityBand::Medium,
            _ => SeverityBand::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityBand::High => "high",
            SeverityBand::Medium => "medium",
            SeverityBand::Low => "low",
        }
    }
}

/// Render a server timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
///
/// Offsets are converted to UTC and timestamps without an offset are taken
/// as UTC. Anything unparseable is returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc).format("%Y-%m-%d %H:%M:%S UTC").to_string();
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc().format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// First `len` characters followed by `...`, or the whole text if it fits.
pub fn truncate(text: &str, len: usize) -> String {
    match text.char_indices().nth(len) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Explorer page for an anchor transaction.
pub fn explorer_url(base: &str, tx_id: &str) -> String {
    format!("{base}{tx_id}/")
}

/// Compact anchor reference with its explorer link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorLink {
    pub tx_preview: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsView {
    pub users: u64,
    pub vote_attempts: u64,
    pub ai_flags: u64,
    pub governance_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagRow {
    pub subject: String,
    pub reason: String,
    /// `n/10`
    pub severity: String,
    pub band: SeverityBand,
    pub created_at: String,
    pub busy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    pub id: i64,
    pub name: String,
    pub votes: u64,
    pub busy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRow {
    pub event_type: String,
    pub severity: String,
    /// Compact JSON
    pub payload: String,
    pub hash_preview: String,
    /// `None` renders as [`NOT_ANCHORED`]
    pub anchor: Option<AnchorLink>,
    /// Round number, or `-`
    pub round: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FairnessView {
    /// One decimal place and `%`
    pub score: String,
    pub formula: Option<String>,
    /// Known counters first, then any extra metrics by name
    pub metrics: Vec<(String, String)>,
    pub hash_preview: String,
    /// `None` renders as [`NOT_ANCHORED_YET`]
    pub anchor: Option<AnchorLink>,
    /// Formatted timestamp, or `Unknown`
    pub computed_at: String,
    pub risk_flag: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernanceView {
    pub high_risk_events: u64,
    pub critical_events: u64,
    pub blockchain_verification_status: String,
    pub tampering_detection_result: String,
    pub integrity_status: String,
    /// Show the compromised banner
    pub compromised: bool,
}

/// Everything a dashboard renderer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub loading: bool,
    pub stats: StatsView,
    pub flags: Vec<FlagRow>,
    pub candidates: Vec<CandidateRow>,
    pub audit_events: Vec<AuditRow>,
    pub fairness: Option<FairnessView>,
    pub governance: Option<GovernanceView>,
    pub results_published: bool,
    pub candidate_draft: String,
    pub adding_candidate: bool,
    pub publishing: bool,
    pub generating_fairness: bool,
    pub messages: PanelMessages,
}

/// Project `state` for display. `busy` is the set of locked action keys.
pub fn project(state: &DashboardState, config: &ViewConfig, busy: &BTreeSet<String>) -> DashboardView {
    let stats = match &state.stats {
        Some(stats) => StatsView {
            users: stats.users,
            vote_attempts: stats.vote_attempts,
            ai_flags: stats.ai_flags,
            governance_status: stats
                .governance_status
                .clone()
                .unwrap_or_else(|| "UNKNOWN".to_string()),
        },
        None => StatsView {
            users: 0,
            vote_attempts: 0,
            ai_flags: 0,
            governance_status: "UNKNOWN".to_string(),
        },
    };

    let flags = state
        .flags
        .iter()
        .map(|flag| FlagRow {
            subject: flag.subject.value.clone(),
            reason: flag.reason.clone(),
            severity: format!("{}/10", flag.severity),
            band: SeverityBand::from_severity(flag.severity),
            created_at: format_timestamp(&flag.created_at),
            busy: busy.contains(&keys::subject(&flag.subject)),
        })
        .collect();

    let candidates = state
        .candidates
        .iter()
        .map(|candidate| CandidateRow {
            id: candidate.id,
            name: candidate.name.clone(),
            votes: candidate.votes,
            busy: busy.contains(&keys::candidate(candidate.id)),
        })
        .collect();

    DashboardView {
        loading: state.loading,
        stats,
        flags,
        candidates,
        audit_events: state
            .audit_events
            .iter()
            .map(|event| audit_row(event, config))
            .collect(),
        fairness: state.fairness_report.as_ref().map(|r| fairness_view(r, config)),
        governance: state.governance_audit.as_ref().map(governance_view),
        results_published: state.results_published,
        candidate_draft: state.candidate_draft.clone(),
        adding_candidate: busy.contains(keys::ADD_CANDIDATE),
        publishing: busy.contains(keys::PUBLISH_RESULTS),
        generating_fairness: busy.contains(keys::FAIRNESS_REPORT),
        messages: state.messages.clone(),
    }
}

fn anchor(tx_id: Option<&str>, config: &ViewConfig) -> Option<AnchorLink> {
    tx_id.filter(|tx| !tx.is_empty()).map(|tx| AnchorLink {
        tx_preview: truncate(tx, config.hash_preview_len),
        url: explorer_url(&config.explorer_tx_base, tx),
    })
}

fn audit_row(event: &AuditEvent, config: &ViewConfig) -> AuditRow {
    AuditRow {
        event_type: event.event_type.clone(),
        severity: event.severity.clone(),
        payload: event.payload.to_string(),
        hash_preview: truncate(&event.entry_hash, config.hash_preview_len),
        anchor: anchor(event.anchored_tx_id.as_deref(), config),
        round: event
            .anchored_round
            .map(|round| round.to_string())
            .unwrap_or_else(|| "-".to_string()),
        created_at: format_timestamp(&event.created_at),
    }
}

fn fairness_view(report: &FairnessReport, config: &ViewConfig) -> FairnessView {
    let m = &report.metrics;
    let mut metrics: Vec<(String, String)> = [
        ("Tampering attempts detected", m.tampering_attempts_detected),
        ("Duplicate attempts blocked", m.duplicate_attempts_blocked),
        ("Abnormal timing clusters", m.abnormal_timing_clusters),
        ("Suspicious IP clusters", m.suspicious_ip_clusters),
        ("Admin high-risk events", m.admin_high_risk_events),
        ("Admin critical events", m.admin_critical_events),
    ]
    .into_iter()
    .map(|(label, value)| (label.to_string(), value.to_string()))
    .collect();
    metrics.extend(m.extra.iter().map(|(name, value)| (name.clone(), value.to_string())));

    FairnessView {
        score: format!("{:.1}%", report.fairness_score),
        formula: report.formula.as_ref().map(|f| f.equation.clone()),
        metrics,
        hash_preview: truncate(&report.fairness_hash, config.hash_preview_len),
        anchor: anchor(report.algorand_tx_id.as_deref(), config),
        computed_at: report
            .computed_at
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_else(|| "Unknown".to_string()),
        risk_flag: report.governance_risk_flag,
    }
}

fn governance_view(audit: &GovernanceAudit) -> GovernanceView {
    GovernanceView {
        high_risk_events: audit.total_admin_high_risk_events,
        critical_events: audit.total_admin_critical_events,
        blockchain_verification_status: audit.blockchain_verification_status.clone(),
        tampering_detection_result: audit.tampering_detection_result.clone(),
        integrity_status: audit.governance_integrity_status.to_string(),
        compromised: audit.governance_integrity_status.is_compromised(),
    }
}
