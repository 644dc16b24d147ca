//! Plain-text rendering of the dashboard view

use std::fmt;
use trustpoll_admin::view::{AnchorLink, DashboardView, NOT_ANCHORED, NOT_ANCHORED_YET};
use trustpoll_admin::{CommandOutcome, CommandStatus};

/// Displays a [`DashboardView`] as terminal text.
pub struct DashboardText<'a>(pub &'a DashboardView);

impl fmt::Display for DashboardText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.0;

        writeln!(f, "TrustPoll admin dashboard")?;
        if view.loading {
            writeln!(f, "(loading...)")?;
        }
        if view.governance.as_ref().is_some_and(|g| g.compromised) {
            writeln!(f, "!! Governance integrity COMPROMISED !!")?;
        }
        writeln!(
            f,
            "Users: {}  Vote attempts: {}  AI flags: {}  Governance: {}",
            view.stats.users, view.stats.vote_attempts, view.stats.ai_flags, view.stats.governance_status
        )?;

        writeln!(f, "\nAI flags")?;
        if view.flags.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for row in &view.flags {
            writeln!(
                f,
                "  {} [{} {}] {} ({}){}",
                row.subject,
                row.severity,
                row.band.as_str(),
                row.reason,
                row.created_at,
                busy(row.busy)
            )?;
        }

        writeln!(f, "\nCandidates")?;
        if view.candidates.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for row in &view.candidates {
            writeln!(f, "  #{} {}: {} votes{}", row.id, row.name, row.votes, busy(row.busy))?;
        }
        writeln!(
            f,
            "Results: {}{}",
            if view.results_published { "public" } else { "hidden" },
            busy(view.publishing)
        )?;

        writeln!(f, "\nAudit events")?;
        if view.audit_events.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for row in &view.audit_events {
            writeln!(
                f,
                "  {} [{}] {} hash {} round {} {}",
                row.created_at,
                row.severity,
                row.event_type,
                row.hash_preview,
                row.round,
                anchor(row.anchor.as_ref(), NOT_ANCHORED)
            )?;
            writeln!(f, "    {}", row.payload)?;
        }

        writeln!(f, "\nFairness{}", busy(view.generating_fairness))?;
        match &view.fairness {
            None => writeln!(f, "  No report available")?,
            Some(fairness) => {
                writeln!(
                    f,
                    "  Score: {}{}",
                    fairness.score,
                    if fairness.risk_flag { "  (governance risk)" } else { "" }
                )?;
                if let Some(formula) = &fairness.formula {
                    writeln!(f, "  Formula: {formula}")?;
                }
                for (name, value) in &fairness.metrics {
                    writeln!(f, "  {name}: {value}")?;
                }
                writeln!(f, "  Hash: {}", fairness.hash_preview)?;
                writeln!(f, "  Anchor: {}", anchor(fairness.anchor.as_ref(), NOT_ANCHORED_YET))?;
                writeln!(f, "  Computed: {}", fairness.computed_at)?;
            }
        }

        writeln!(f, "\nGovernance audit")?;
        match &view.governance {
            None => writeln!(f, "  No governance audit yet")?,
            Some(g) => {
                writeln!(f, "  High-risk admin events: {}", g.high_risk_events)?;
                writeln!(f, "  Critical admin events: {}", g.critical_events)?;
                writeln!(f, "  Blockchain verification: {}", g.blockchain_verification_status)?;
                writeln!(f, "  Tampering detection: {}", g.tampering_detection_result)?;
                writeln!(f, "  Integrity: {}", g.integrity_status)?;
            }
        }

        let messages = &view.messages;
        let panels = [
            ("auth", &messages.auth),
            ("flags", &messages.flags),
            ("block", &messages.block),
            ("candidates", &messages.candidates),
            ("results", &messages.results),
            ("fairness", &messages.fairness),
        ];
        for (panel, message) in panels {
            if let Some(message) = message {
                writeln!(f, "[{panel}] {message}")?;
            }
        }
        Ok(())
    }
}

fn busy(flag: bool) -> &'static str {
    if flag {
        " (working...)"
    } else {
        ""
    }
}

fn anchor(link: Option<&AnchorLink>, missing: &str) -> String {
    match link {
        Some(link) => format!("{} <{}>", link.tx_preview, link.url),
        None => missing.to_string(),
    }
}

/// One line for a command result.
pub fn outcome(outcome: &CommandOutcome) -> String {
    let tag = match outcome.status {
        CommandStatus::Applied => "ok",
        CommandStatus::Failed(_) => "failed",
        CommandStatus::Declined => "cancelled",
        CommandStatus::Busy => "busy",
    };
    format!("[{}] {}: {}", tag, outcome.command, outcome.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use trustpoll_admin::config::ViewConfig;
    use trustpoll_admin::locks::keys;
    use trustpoll_admin::view::project;
    use trustpoll_admin::{CommandKind, DashboardState, Panel};
    use trustpoll_client::{Candidate, FailureKind, GovernanceAudit, IntegrityStatus};

    #[test]
    fn test_empty_dashboard() {
        let view = project(&DashboardState::default(), &ViewConfig::default(), &BTreeSet::new());
        let text = DashboardText(&view).to_string();

        assert!(text.contains("Users: 0  Vote attempts: 0  AI flags: 0  Governance: UNKNOWN"));
        assert!(text.contains("Results: hidden"));
        assert!(text.contains("No report available"));
        assert!(!text.contains("COMPROMISED"));
    }

    #[test]
    fn test_rows_banner_and_messages() {
        let mut state = DashboardState {
            candidates: vec![Candidate {
                id: 7,
                name: "Aria Shah".into(),
                votes: 0,
            }],
            governance_audit: Some(GovernanceAudit {
                total_admin_high_risk_events: 3,
                total_admin_critical_events: 1,
                blockchain_verification_status: "MISMATCH".into(),
                tampering_detection_result: "TAMPERING_DETECTED".into(),
                governance_integrity_status: IntegrityStatus::Compromised,
            }),
            ..Default::default()
        };
        state.messages.set(Panel::Candidates, "Candidate added. Voters can refresh to see the update.");

        let busy: BTreeSet<String> = [keys::candidate(7)].into();
        let view = project(&state, &ViewConfig::default(), &busy);
        let text = DashboardText(&view).to_string();

        assert!(text.contains("!! Governance integrity COMPROMISED !!"));
        assert!(text.contains("#7 Aria Shah: 0 votes (working...)"));
        assert!(text.contains("[candidates] Candidate added. Voters can refresh to see the update."));
    }

    #[test]
    fn test_outcome_line() {
        let line = outcome(&CommandOutcome {
            command: CommandKind::DeleteCandidate,
            status: CommandStatus::Failed(FailureKind::Server),
            message: "Candidate not found".into(),
        });
        assert_eq!(line, "[failed] delete-candidate: Candidate not found");
    }
}
