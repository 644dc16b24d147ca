//! Dashboard state container and its transitions.

use std::fmt;
use trustpoll_client::{
    AiFlag, AuditEvent, Candidate, Endpoint, FairnessReport, GovernanceAudit, Stats,
};

/// One independently loaded collection of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    Stats,
    Flags,
    Candidates,
    AuditEvents,
    Fairness,
    Governance,
}

impl Source {
    /// Every source, in display order.
    pub const ALL: [Source; 6] = [
        Source::Stats,
        Source::Flags,
        Source::Candidates,
        Source::AuditEvents,
        Source::Fairness,
        Source::Governance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Stats => "stats",
            Source::Flags => "flags",
            Source::Candidates => "candidates",
            Source::AuditEvents => "audit_events",
            Source::Fairness => "fairness",
            Source::Governance => "governance",
        }
    }

    /// Route the source is read from.
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Source::Stats => Endpoint::Stats,
            Source::Flags => Endpoint::AiFlags,
            Source::Candidates => Endpoint::Candidates,
            Source::AuditEvents => Endpoint::AuditEvents,
            Source::Fairness => Endpoint::FairnessIndex,
            Source::Governance => Endpoint::GovernanceAudit,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Area of the dashboard an operator message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Auth,
    Flags,
    Block,
    Candidates,
    Results,
    Fairness,
}

/// Latest operator-facing message per panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelMessages {
    pub auth: Option<String>,
    pub flags: Option<String>,
    pub block: Option<String>,
    pub candidates: Option<String>,
    pub results: Option<String>,
    pub fairness: Option<String>,
}

impl PanelMessages {
    pub fn get(&self, panel: Panel) -> Option<&str> {
        self.slot(panel).as_deref()
    }

    pub fn set(&mut self, panel: Panel, message: impl Into<String>) {
        *self.slot_mut(panel) = Some(message.into());
    }

    pub fn clear(&mut self, panel: Panel) {
        *self.slot_mut(panel) = None;
    }

    fn slot(&self, panel: Panel) -> &Option<String> {
        match panel {
            Panel::Auth => &self.auth,
            Panel::Flags => &self.flags,
            Panel::Block => &self.block,
            Panel::Candidates => &self.candidates,
            Panel::Results => &self.results,
            Panel::Fairness => &self.fairness,
        }
    }

    fn slot_mut(&mut self, panel: Panel) -> &mut Option<String> {
        match panel {
            Panel::Auth => &mut self.auth,
            Panel::Flags => &mut self.flags,
            Panel::Block => &mut self.block,
            Panel::Candidates => &mut self.candidates,
            Panel::Results => &mut self.results,
            Panel::Fairness => &mut self.fairness,
        }
    }
}

/// Everything the dashboard shows.
///
/// Each collection is written only by a successful load of its own source,
/// so a failed source keeps whatever it held before.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub stats: Option<Stats>,
    pub flags: Vec<AiFlag>,
    pub candidates: Vec<Candidate>,
    pub audit_events: Vec<AuditEvent>,
    pub fairness_report: Option<FairnessReport>,
    pub governance_audit: Option<GovernanceAudit>,
    /// Last publish state this operator set
    pub results_published: bool,
    /// True while the initial load is in flight
    pub loading: bool,
    /// Pending input of the add-candidate form
    pub candidate_draft: String,
    pub messages: PanelMessages,
}

/// A successfully decoded response for one source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceData {
    Stats(Stats),
    Flags(Vec<AiFlag>),
    Candidates(Vec<Candidate>),
    AuditEvents(Vec<AuditEvent>),
    Fairness(FairnessReport),
    Governance(Option<GovernanceAudit>),
}

impl SourceData {
    pub fn source(&self) -> Source {
        match self {
            SourceData::Stats(_) => Source::Stats,
            SourceData::Flags(_) => Source::Flags,
            SourceData::Candidates(_) => Source::Candidates,
            SourceData::AuditEvents(_) => Source::AuditEvents,
            SourceData::Fairness(_) => Source::Fairness,
            SourceData::Governance(_) => Source::Governance,
        }
    }
}

impl DashboardState {
    /// Replace the field owned by `data`'s source; other fields are untouched.
    pub fn merge(&mut self, data: SourceData) {
        match data {
            SourceData::Stats(stats) => self.stats = Some(stats),
            SourceData::Flags(flags) => self.flags = flags,
            SourceData::Candidates(candidates) => self.candidates = candidates,
            SourceData::AuditEvents(events) => self.audit_events = events,
            SourceData::Fairness(report) => self.fairness_report = Some(report),
            SourceData::Governance(audit) => self.governance_audit = audit,
        }
    }

    pub fn candidate(&self, id: i64) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }
}
