//! Administrative commands.
//!
//! Every command runs the same sequence: session check, input validation,
//! busy check, operator confirmation where required, lock acquisition,
//! dispatch, then a targeted refresh on success. The lock is held by an
//! [`ActionGuard`] so it is released on every exit path.

use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::confirm::ConfirmAction;
use crate::controller::{AdminController, Ticket};
use crate::locks::{keys, ActionGuard};
use crate::session::UNAUTHORIZED_MESSAGE;
use crate::state::{Panel, Source, SourceData};
use crate::view::format_timestamp;
use trustpoll_client::{
    AddCandidateRequest, ApiError, DeleteCandidateRequest, FailureKind, PublishResultsRequest,
    Subject, SubjectField,
};

/// Fixed block duration.
pub const BLOCK_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    AcknowledgeFlag,
    BlockSubject(SubjectField),
    AddCandidate,
    DeleteCandidate,
    PublishResults { publish: bool },
    GenerateFairnessReport,
}

impl CommandKind {
    /// Panel the command reports into.
    pub fn panel(&self) -> Panel {
        match self {
            CommandKind::AcknowledgeFlag => Panel::Flags,
            CommandKind::BlockSubject(_) => Panel::Block,
            CommandKind::AddCandidate | CommandKind::DeleteCandidate => Panel::Candidates,
            CommandKind::PublishResults { .. } => Panel::Results,
            CommandKind::GenerateFairnessReport => Panel::Fairness,
        }
    }

    /// Shown when the server rejects the command without an error text.
    pub fn failure_text(&self) -> String {
        match self {
            CommandKind::AcknowledgeFlag => "Failed to acknowledge flag.".into(),
            CommandKind::BlockSubject(field) => format!("Failed to block {}.", field.as_str()),
            CommandKind::AddCandidate => "Failed to add candidate.".into(),
            CommandKind::DeleteCandidate => "Failed to delete candidate.".into(),
            CommandKind::PublishResults { .. } => "Failed to update results status.".into(),
            CommandKind::GenerateFairnessReport => "Failed to generate fairness report.".into(),
        }
    }

    /// Shown when the request never completed.
    pub fn network_text(&self) -> String {
        match self {
            CommandKind::AcknowledgeFlag => "Network error while acknowledging flag.".into(),
            CommandKind::BlockSubject(field) => {
                format!("Network error while blocking {}.", field.as_str())
            }
            CommandKind::AddCandidate => "Network error while adding candidate.".into(),
            CommandKind::DeleteCandidate => "Network error while deleting candidate.".into(),
            CommandKind::PublishResults { .. } => "Network error while updating results.".into(),
            CommandKind::GenerateFairnessReport => {
                "Network error while generating fairness report.".into()
            }
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::AcknowledgeFlag => f.write_str("acknowledge-flag"),
            CommandKind::BlockSubject(_) => f.write_str("block-subject"),
            CommandKind::AddCandidate => f.write_str("add-candidate"),
            CommandKind::DeleteCandidate => f.write_str("delete-candidate"),
            CommandKind::PublishResults { publish: true } => f.write_str("publish-results"),
            CommandKind::PublishResults { publish: false } => f.write_str("unpublish-results"),
            CommandKind::GenerateFairnessReport => f.write_str("generate-fairness-report"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// Server accepted the command
    Applied,
    Failed(FailureKind),
    /// Operator declined the confirmation; nothing was sent
    Declined,
    /// Another command on the same key is in flight; nothing was sent
    Busy,
}

/// What a command did, with the message for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub command: CommandKind,
    pub status: CommandStatus,
    pub message: String,
}

impl CommandOutcome {
    pub fn ok(&self) -> bool {
        self.status == CommandStatus::Applied
    }

    fn new(command: CommandKind, status: CommandStatus, message: impl Into<String>) -> Self {
        Self {
            command,
            status,
            message: message.into(),
        }
    }
}

/// A command that passed its checks and holds its lock.
struct Dispatch {
    ticket: Ticket,
    action_id: Uuid,
    _guard: ActionGuard,
}

impl AdminController {
    /// Acknowledge the anomaly flag raised for `subject`, then reload flags.
    pub async fn acknowledge_flag(&self, subject: &Subject) -> CommandOutcome {
        let command = CommandKind::AcknowledgeFlag;
        let ticket = match self.session_for(command).await {
            Ok(ticket) => ticket,
            Err(outcome) => return outcome,
        };
        if let Err(outcome) = self.require_subject(command, &ticket, subject).await {
            return outcome;
        }
        let dispatch = match self.begin(command, ticket, &keys::subject(subject), None) {
            Ok(dispatch) => dispatch,
            Err(outcome) => return outcome,
        };

        match self.api.acknowledge_flag(subject).await {
            Ok(()) => {
                self.applied(&dispatch, command);
                self.set_message(&dispatch, command.panel(), None).await;
                self.refresh_after(&dispatch, Source::Flags).await;
                CommandOutcome::new(command, CommandStatus::Applied, "Flag acknowledged.")
            }
            Err(error) => self.fail(&dispatch, command, error).await,
        }
    }

    /// Block `subject` for [`BLOCK_MINUTES`]. Requires confirmation.
    pub async fn block_subject(&self, subject: &Subject) -> CommandOutcome {
        let command = CommandKind::BlockSubject(subject.field);
        let ticket = match self.session_for(command).await {
            Ok(ticket) => ticket,
            Err(outcome) => return outcome,
        };
        if let Err(outcome) = self.require_subject(command, &ticket, subject).await {
            return outcome;
        }
        let confirm = ConfirmAction::BlockSubject {
            subject,
            minutes: BLOCK_MINUTES,
        };
        let dispatch = match self.begin(command, ticket, &keys::subject(subject), Some(confirm)) {
            Ok(dispatch) => dispatch,
            Err(outcome) => return outcome,
        };

        match self.api.block_subject(subject, BLOCK_MINUTES).await {
            Ok(receipt) => {
                self.applied(&dispatch, command);
                let message = format!(
                    "{} blocked until {}.",
                    subject.field.label(),
                    format_timestamp(&receipt.blocked_until)
                );
                self.set_message(&dispatch, command.panel(), Some(&message)).await;
                CommandOutcome::new(command, CommandStatus::Applied, message)
            }
            Err(error) => self.fail(&dispatch, command, error).await,
        }
    }

    /// Add a candidate named `name` (trimmed), then reload candidates.
    pub async fn add_candidate(&self, name: &str) -> CommandOutcome {
        let command = CommandKind::AddCandidate;
        let ticket = match self.session_for(command).await {
            Ok(ticket) => ticket,
            Err(outcome) => return outcome,
        };

        let name = name.trim();
        if name.is_empty() {
            return self
                .reject(&ticket, command, "Candidate name is required.")
                .await;
        }

        let dispatch = match self.begin(command, ticket, keys::ADD_CANDIDATE, None) {
            Ok(dispatch) => dispatch,
            Err(outcome) => return outcome,
        };

        let request = AddCandidateRequest {
            name: name.to_string(),
            admin_id: dispatch.ticket.admin_id.clone(),
        };
        match self.api.add_candidate(&request).await {
            Ok(candidate) => {
                self.applied(&dispatch, command);
                info!(action_id = %dispatch.action_id, id = candidate.id, "Candidate created");
                let message = "Candidate added. Voters can refresh to see the update.";
                self.update_if_current(dispatch.ticket.epoch, |state| {
                    state.candidate_draft.clear();
                    state.messages.set(Panel::Candidates, message);
                })
                .await;
                self.refresh_after(&dispatch, Source::Candidates).await;
                CommandOutcome::new(command, CommandStatus::Applied, message)
            }
            Err(error) => self.fail(&dispatch, command, error).await,
        }
    }

    /// [`add_candidate`](Self::add_candidate) with the pending draft input.
    pub async fn add_candidate_from_draft(&self) -> CommandOutcome {
        let draft = self.inner.read().await.dashboard.candidate_draft.clone();
        self.add_candidate(&draft).await
    }

    /// Delete candidate `id`. Requires confirmation naming the candidate.
    pub async fn delete_candidate(&self, id: i64) -> CommandOutcome {
        let command = CommandKind::DeleteCandidate;
        let ticket = match self.session_for(command).await {
            Ok(ticket) => ticket,
            Err(outcome) => return outcome,
        };

        let name = self
            .inner
            .read()
            .await
            .dashboard
            .candidate(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("#{id}"));
        let confirm = ConfirmAction::DeleteCandidate { name: &name };
        let dispatch = match self.begin(command, ticket, &keys::candidate(id), Some(confirm)) {
            Ok(dispatch) => dispatch,
            Err(outcome) => return outcome,
        };

        let request = DeleteCandidateRequest {
            id,
            admin_id: dispatch.ticket.admin_id.clone(),
        };
        match self.api.delete_candidate(&request).await {
            Ok(()) => {
                self.applied(&dispatch, command);
                self.set_message(&dispatch, command.panel(), None).await;
                self.refresh_after(&dispatch, Source::Candidates).await;
                CommandOutcome::new(command, CommandStatus::Applied, format!("Candidate \"{name}\" deleted."))
            }
            Err(error) => self.fail(&dispatch, command, error).await,
        }
    }

    /// Publish (`true`) or hide (`false`) the results. Requires confirmation.
    pub async fn publish_results(&self, publish: bool) -> CommandOutcome {
        let command = CommandKind::PublishResults { publish };
        let ticket = match self.session_for(command).await {
            Ok(ticket) => ticket,
            Err(outcome) => return outcome,
        };
        let confirm = ConfirmAction::PublishResults { publish };
        let dispatch = match self.begin(command, ticket, keys::PUBLISH_RESULTS, Some(confirm)) {
            Ok(dispatch) => dispatch,
            Err(outcome) => return outcome,
        };

        let request = PublishResultsRequest {
            published: publish,
            admin_id: dispatch.ticket.admin_id.clone(),
        };
        match self.api.publish_results(&request).await {
            Ok(()) => {
                self.applied(&dispatch, command);
                let message = if publish {
                    "Results are now public."
                } else {
                    "Results are now hidden."
                };
                self.update_if_current(dispatch.ticket.epoch, |state| {
                    state.results_published = publish;
                    state.messages.set(Panel::Results, message);
                })
                .await;
                self.refresh_after(&dispatch, Source::Governance).await;
                CommandOutcome::new(command, CommandStatus::Applied, message)
            }
            Err(error) => self.fail(&dispatch, command, error).await,
        }
    }

    /// Ask the server for a new fairness report; it replaces the current one.
    pub async fn generate_fairness_report(&self) -> CommandOutcome {
        let command = CommandKind::GenerateFairnessReport;
        let ticket = match self.session_for(command).await {
            Ok(ticket) => ticket,
            Err(outcome) => return outcome,
        };
        let dispatch = match self.begin(command, ticket, keys::FAIRNESS_REPORT, None) {
            Ok(dispatch) => dispatch,
            Err(outcome) => return outcome,
        };

        let seq = self.next_fetch();
        match self.api.generate_fairness_report().await {
            Ok(report) => {
                self.applied(&dispatch, command);
                let message = "Fairness report generated.";
                self.merge_if_current(dispatch.ticket.epoch, seq, SourceData::Fairness(report))
                    .await;
                self.set_message(&dispatch, command.panel(), Some(message)).await;
                CommandOutcome::new(command, CommandStatus::Applied, message)
            }
            Err(error) => self.fail(&dispatch, command, error).await,
        }
    }

    // ==================== Pipeline ====================

    async fn session_for(&self, command: CommandKind) -> Result<Ticket, CommandOutcome> {
        self.ticket().await.ok_or_else(|| {
            warn!(%command, "Command attempted without a session");
            CommandOutcome::new(
                command,
                CommandStatus::Failed(FailureKind::Unauthorized),
                UNAUTHORIZED_MESSAGE,
            )
        })
    }

    async fn require_subject(
        &self,
        command: CommandKind,
        ticket: &Ticket,
        subject: &Subject,
    ) -> Result<(), CommandOutcome> {
        if subject.value.trim().is_empty() {
            let message = format!("{} is required.", subject.field.label());
            return Err(self.reject(ticket, command, &message).await);
        }
        Ok(())
    }

    /// Local validation failure; nothing is sent.
    async fn reject(&self, ticket: &Ticket, command: CommandKind, message: &str) -> CommandOutcome {
        self.update_if_current(ticket.epoch, |state| {
            state.messages.set(command.panel(), message)
        })
        .await;
        CommandOutcome::new(command, CommandStatus::Failed(FailureKind::Validation), message)
    }

    /// Busy check, confirmation, then lock. A declined or busy command sends
    /// nothing and holds no lock.
    fn begin(
        &self,
        command: CommandKind,
        ticket: Ticket,
        key: &str,
        confirm: Option<ConfirmAction<'_>>,
    ) -> Result<Dispatch, CommandOutcome> {
        let busy = || {
            info!(%command, key, "Action already in progress");
            CommandOutcome::new(
                command,
                CommandStatus::Busy,
                format!("An action on {key} is already in progress."),
            )
        };

        if self.locks.is_busy(key) {
            return Err(busy());
        }

        if let Some(action) = confirm {
            if !self.confirmer.confirm(&action.prompt()) {
                info!(%command, key, "Declined at confirmation");
                return Err(CommandOutcome::new(command, CommandStatus::Declined, "Cancelled."));
            }
        }

        // The key may have been taken while the operator was answering.
        let guard = self.locks.guard(key).ok_or_else(busy)?;
        let action_id = Uuid::new_v4();
        info!(%command, key, %action_id, "Dispatching");

        Ok(Dispatch {
            ticket,
            action_id,
            _guard: guard,
        })
    }

    fn applied(&self, dispatch: &Dispatch, command: CommandKind) {
        info!(%command, action_id = %dispatch.action_id, "Command applied");
    }

    async fn fail(&self, dispatch: &Dispatch, command: CommandKind, error: ApiError) -> CommandOutcome {
        let kind = error.kind();
        let message = match kind {
            FailureKind::Transport => command.network_text(),
            _ => error
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| command.failure_text()),
        };
        warn!(%command, action_id = %dispatch.action_id, ?kind, error = %error, "Command failed");

        self.set_message(dispatch, command.panel(), Some(&message)).await;
        CommandOutcome::new(command, CommandStatus::Failed(kind), message)
    }

    async fn set_message(&self, dispatch: &Dispatch, panel: Panel, message: Option<&str>) {
        self.update_if_current(dispatch.ticket.epoch, |state| match message {
            Some(message) => state.messages.set(panel, message),
            None => state.messages.clear(panel),
        })
        .await;
    }

    /// A failed refresh leaves the command applied; the field keeps its value.
    async fn refresh_after(&self, dispatch: &Dispatch, source: Source) {
        if let Err(e) = self.refresh(source).await {
            warn!(action_id = %dispatch.action_id, %source, error = %e, "Refresh after command failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminConfig;
    use crate::confirm::{AlwaysConfirm, AlwaysDecline};
    use std::sync::Arc;
    use trustpoll_client::{Endpoint, MockApi, MockFailure};

    async fn logged_in(api: Arc<MockApi>) -> AdminController {
        let controller = AdminController::new(AdminConfig::default(), api, Arc::new(AlwaysConfirm));
        assert!(controller.authenticate("admin@vit.edu").await.granted);
        controller
    }

    #[tokio::test]
    async fn test_commands_require_session() {
        let api = Arc::new(MockApi::new());
        let controller = AdminController::new(AdminConfig::default(), api.clone(), Arc::new(AlwaysConfirm));

        let outcomes = vec![
            controller.acknowledge_flag(&Subject::email("a@vit.edu")).await,
            controller.block_subject(&Subject::email("a@vit.edu")).await,
            controller.add_candidate("Aria Shah").await,
            controller.delete_candidate(1).await,
            controller.publish_results(true).await,
            controller.generate_fairness_report().await,
        ];

        for outcome in outcomes {
            assert_eq!(outcome.status, CommandStatus::Failed(FailureKind::Unauthorized));
            assert_eq!(outcome.message, "Unauthorized access");
        }
        assert!(api.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_candidate_name_is_local_validation() {
        let api = Arc::new(MockApi::new());
        let controller = logged_in(api.clone()).await;

        let outcome = controller.add_candidate("   ").await;

        assert_eq!(outcome.status, CommandStatus::Failed(FailureKind::Validation));
        assert_eq!(api.mutation_count().await, 0);
        assert!(controller.locks().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_verbatim_and_lock_released() {
        let api = Arc::new(MockApi::new());
        let controller = logged_in(api.clone()).await;

        let outcome = controller.delete_candidate(99).await;

        assert_eq!(outcome.status, CommandStatus::Failed(FailureKind::Server));
        assert_eq!(outcome.message, "Candidate not found");
        assert_eq!(
            controller.snapshot().await.messages.candidates.as_deref(),
            Some("Candidate not found")
        );
        assert!(!controller.locks().is_busy(&keys::candidate(99)));
    }

    #[tokio::test]
    async fn test_generic_and_network_failure_texts_differ() {
        let api = Arc::new(MockApi::new().with_failure(
            Endpoint::PublishResults,
            MockFailure::Server {
                status: 500,
                message: None,
            },
        ));
        let controller = logged_in(api.clone()).await;

        let generic = controller.publish_results(true).await;
        assert_eq!(generic.message, "Failed to update results status.");

        api.set_failure(Endpoint::PublishResults, MockFailure::Transport).await;
        let network = controller.publish_results(true).await;
        assert_eq!(network.status, CommandStatus::Failed(FailureKind::Transport));
        assert_eq!(network.message, "Network error while updating results.");

        assert!(!controller.snapshot().await.results_published);
    }

    #[tokio::test]
    async fn test_block_wallet_texts() {
        let api = Arc::new(MockApi::new().with_failure(Endpoint::BlockSubject, MockFailure::Transport));
        let controller = logged_in(api).await;

        let outcome = controller.block_subject(&Subject::wallet("WALLET_AB12")).await;
        assert_eq!(outcome.message, "Network error while blocking wallet.");
    }

    #[tokio::test]
    async fn test_declined_block_sends_nothing() {
        let api = Arc::new(MockApi::new());
        let controller = AdminController::new(AdminConfig::default(), api.clone(), Arc::new(AlwaysDecline));
        controller.authenticate("admin@vit.edu").await;

        let outcome = controller.block_subject(&Subject::email("student@vit.edu")).await;

        assert_eq!(outcome.status, CommandStatus::Declined);
        assert!(!outcome.ok());
        assert!(api.blocked().await.is_empty());
        assert_eq!(api.mutation_count().await, 0);
    }

    #[tokio::test]
    async fn test_acknowledge_refetches_flags() {
        let api = Arc::new(MockApi::new());
        let controller = logged_in(api.clone()).await;

        let outcome = controller.acknowledge_flag(&Subject::email("student@vit.edu")).await;

        assert!(outcome.ok());
        assert_eq!(api.call_count(Endpoint::AiFlags).await, 2);
        assert_eq!(api.call_count(Endpoint::Candidates).await, 1);
    }

    #[test]
    fn test_command_texts() {
        assert_eq!(
            CommandKind::BlockSubject(SubjectField::Email).failure_text(),
            "Failed to block email."
        );
        assert_eq!(
            CommandKind::GenerateFairnessReport.network_text(),
            "Network error while generating fairness report."
        );
        assert_eq!(CommandKind::PublishResults { publish: false }.to_string(), "unpublish-results");
        assert_eq!(CommandKind::DeleteCandidate.panel(), Panel::Candidates);
    }
}
