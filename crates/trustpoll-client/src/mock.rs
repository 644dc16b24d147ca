//! In-memory API fake for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, Semaphore};

use crate::api::AdminApi;
use crate::error::{ApiError, Result};
use crate::types::*;

/// A failure the mock returns instead of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// Non-2xx with an optional `{error}` body
    Server { status: u16, message: Option<String> },
    /// Request never completes
    Transport,
}

impl MockFailure {
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        MockFailure::Server {
            status,
            message: Some(message.into()),
        }
    }

    fn to_error(&self) -> ApiError {
        match self {
            MockFailure::Server { status, message } => ApiError::Server {
                status: *status,
                message: message.clone(),
            },
            MockFailure::Transport => ApiError::Transport("connection refused".to_string()),
        }
    }
}

#[derive(Debug, Default)]
struct MockData {
    stats: Option<Stats>,
    flags: Vec<AiFlag>,
    candidates: Vec<Candidate>,
    next_candidate_id: i64,
    audit_events: Vec<AuditEvent>,
    fairness: Option<FairnessReport>,
    generated_fairness: Option<FairnessReport>,
    governance: Option<GovernanceAudit>,
    published: bool,
    blocked: Vec<(Subject, u32)>,
    blocked_until: String,
    held_read: Option<Endpoint>,
    failures: HashMap<Endpoint, MockFailure>,
    calls: Vec<Endpoint>,
}

/// Requests parked until the test lets them through.
struct Hold {
    remaining: AtomicUsize,
    entered: Semaphore,
    release: Semaphore,
}

impl Hold {
    fn new() -> Self {
        Self {
            remaining: AtomicUsize::new(0),
            entered: Semaphore::new(0),
            release: Semaphore::new(0),
        }
    }

    fn arm(&self, count: usize) {
        self.remaining.store(count, Ordering::SeqCst);
    }

    /// Park the caller if the hold still has room.
    async fn park(&self) {
        let held = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if held {
            self.entered.add_permits(1);
            if let Ok(permit) = self.release.acquire().await {
                permit.forget();
            }
        }
    }

    async fn wait_until_held(&self) {
        if let Ok(permit) = self.entered.acquire().await {
            permit.forget();
        }
    }

    fn release(&self) {
        self.release.add_permits(1);
    }
}

/// Mock admin API.
///
/// Behaves like a small voting backend: candidates can be added and removed,
/// acknowledging a flag deletes it, publishing flips a flag. Any endpoint can
/// be made to fail, every request is recorded, and mutation requests can be
/// held in flight to observe locking. Reads of one endpoint can be held too;
/// a held read has already taken its snapshot, so it answers with the data
/// as it was when the request arrived.
///
/// ```rust,ignore
/// let api = MockApi::new().with_candidates(vec![]);
/// api.hold_mutations(1);
/// // ... start a mutation on another task ...
/// api.wait_until_held().await;
/// // the request is now in flight
/// api.release_held();
/// ```
pub struct MockApi {
    data: Mutex<MockData>,
    hold: Hold,
    read_hold: Hold,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(MockData {
                next_candidate_id: 1,
                blocked_until: "2024-01-01T10:30:00Z".to_string(),
                ..Default::default()
            }),
            hold: Hold::new(),
            read_hold: Hold::new(),
        }
    }

    // ----- seeding -----

    pub fn with_stats(mut self, stats: Stats) -> Self {
        self.data.get_mut().stats = Some(stats);
        self
    }

    pub fn with_flags(mut self, flags: Vec<AiFlag>) -> Self {
        self.data.get_mut().flags = flags;
        self
    }

    /// Seed candidates; new ids continue after the highest seeded id.
    pub fn with_candidates(mut self, candidates: Vec<Candidate>) -> Self {
        let data = self.data.get_mut();
        data.next_candidate_id = candidates.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        data.candidates = candidates;
        self
    }

    /// Id the next added candidate receives.
    pub fn with_next_candidate_id(mut self, id: i64) -> Self {
        self.data.get_mut().next_candidate_id = id;
        self
    }

    pub fn with_audit_events(mut self, events: Vec<AuditEvent>) -> Self {
        self.data.get_mut().audit_events = events;
        self
    }

    pub fn with_fairness(mut self, report: FairnessReport) -> Self {
        self.data.get_mut().fairness = Some(report);
        self
    }

    /// Report returned by the next generate call.
    pub fn with_generated_fairness(mut self, report: FairnessReport) -> Self {
        self.data.get_mut().generated_fairness = Some(report);
        self
    }

    pub fn with_governance(mut self, audit: GovernanceAudit) -> Self {
        self.data.get_mut().governance = Some(audit);
        self
    }

    pub fn with_blocked_until(mut self, blocked_until: impl Into<String>) -> Self {
        self.data.get_mut().blocked_until = blocked_until.into();
        self
    }

    pub fn with_failure(mut self, endpoint: Endpoint, failure: MockFailure) -> Self {
        self.data.get_mut().failures.insert(endpoint, failure);
        self
    }

    // ----- runtime control -----

    pub async fn set_failure(&self, endpoint: Endpoint, failure: MockFailure) {
        self.data.lock().await.failures.insert(endpoint, failure);
    }

    pub async fn clear_failure(&self, endpoint: Endpoint) {
        self.data.lock().await.failures.remove(&endpoint);
    }

    /// Replace the server-side candidate list.
    pub async fn set_candidates(&self, candidates: Vec<Candidate>) {
        self.data.lock().await.candidates = candidates;
    }

    /// Park the next `count` mutation requests until [`release_held`](Self::release_held).
    pub fn hold_mutations(&self, count: usize) {
        self.hold.arm(count);
    }

    /// Wait until one more held mutation is in flight.
    pub async fn wait_until_held(&self) {
        self.hold.wait_until_held().await;
    }

    /// Let one held mutation complete.
    pub fn release_held(&self) {
        self.hold.release();
    }

    /// Park the next `count` reads of `endpoint` after they have read their
    /// data, until [`release_held_read`](Self::release_held_read).
    pub async fn hold_reads(&self, endpoint: Endpoint, count: usize) {
        self.data.lock().await.held_read = Some(endpoint);
        self.read_hold.arm(count);
    }

    /// Wait until one more held read is in flight.
    pub async fn wait_until_read_held(&self) {
        self.read_hold.wait_until_held().await;
    }

    /// Let one held read answer.
    pub fn release_held_read(&self) {
        self.read_hold.release();
    }

    // ----- inspection -----

    /// Every request received, in order.
    pub async fn calls(&self) -> Vec<Endpoint> {
        self.data.lock().await.calls.clone()
    }

    pub async fn call_count(&self, endpoint: Endpoint) -> usize {
        self.data
            .lock()
            .await
            .calls
            .iter()
            .filter(|e| **e == endpoint)
            .count()
    }

    pub async fn mutation_count(&self) -> usize {
        self.data
            .lock()
            .await
            .calls
            .iter()
            .filter(|e| e.is_mutation())
            .count()
    }

    pub async fn published(&self) -> bool {
        self.data.lock().await.published
    }

    pub async fn blocked(&self) -> Vec<(Subject, u32)> {
        self.data.lock().await.blocked.clone()
    }

    // ----- internals -----

    async fn receive(&self, endpoint: Endpoint) {
        self.data.lock().await.calls.push(endpoint);

        if endpoint.is_mutation() {
            self.hold.park().await;
        }
    }

    /// Answer a read with `value`, parking first if reads of `endpoint` are held.
    async fn answer<T>(&self, endpoint: Endpoint, value: T) -> Result<T> {
        let held = self.data.lock().await.held_read == Some(endpoint);
        if held {
            self.read_hold.park().await;
        }
        Ok(value)
    }

    async fn respond(&self, endpoint: Endpoint) -> Result<tokio::sync::MutexGuard<'_, MockData>> {
        self.receive(endpoint).await;
        let data = self.data.lock().await;
        match data.failures.get(&endpoint) {
            Some(failure) => Err(failure.to_error()),
            None => Ok(data),
        }
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdminApi for MockApi {
    async fn stats(&self) -> Result<Stats> {
        let stats = {
            let data = self.respond(Endpoint::Stats).await?;
            data.stats.clone().unwrap_or(Stats {
                users: 0,
                vote_attempts: 0,
                ai_flags: data.flags.len() as u64,
                governance_status: None,
            })
        };
        self.answer(Endpoint::Stats, stats).await
    }

    async fn ai_flags(&self) -> Result<Vec<AiFlag>> {
        let flags = self.respond(Endpoint::AiFlags).await?.flags.clone();
        self.answer(Endpoint::AiFlags, flags).await
    }

    async fn candidates(&self) -> Result<Vec<Candidate>> {
        let candidates = self.respond(Endpoint::Candidates).await?.candidates.clone();
        self.answer(Endpoint::Candidates, candidates).await
    }

    async fn audit_events(&self, limit: u32) -> Result<Vec<AuditEvent>> {
        let events: Vec<AuditEvent> = self
            .respond(Endpoint::AuditEvents)
            .await?
            .audit_events
            .iter()
            .take(limit as usize)
            .cloned()
            .collect();
        self.answer(Endpoint::AuditEvents, events).await
    }

    async fn fairness_index(&self) -> Result<FairnessReport> {
        let report = self
            .respond(Endpoint::FairnessIndex)
            .await?
            .fairness
            .clone()
            .ok_or_else(|| MockFailure::server(404, "No fairness report computed yet").to_error())?;
        self.answer(Endpoint::FairnessIndex, report).await
    }

    async fn governance_audit(&self, _election_id: &str) -> Result<Option<GovernanceAudit>> {
        let audit = self.respond(Endpoint::GovernanceAudit).await?.governance.clone();
        self.answer(Endpoint::GovernanceAudit, audit).await
    }

    async fn acknowledge_flag(&self, subject: &Subject) -> Result<()> {
        let mut data = self.respond(Endpoint::AcknowledgeFlag).await?;
        data.flags.retain(|flag| flag.subject != *subject);
        Ok(())
    }

    async fn block_subject(&self, subject: &Subject, minutes: u32) -> Result<BlockReceipt> {
        let mut data = self.respond(Endpoint::BlockSubject).await?;
        data.blocked.push((subject.clone(), minutes));
        Ok(BlockReceipt {
            blocked_until: data.blocked_until.clone(),
        })
    }

    async fn add_candidate(&self, request: &AddCandidateRequest) -> Result<Candidate> {
        let mut data = self.respond(Endpoint::AddCandidate).await?;
        let name = request.name.trim();
        if name.is_empty() {
            return Err(MockFailure::server(400, "Candidate name is required").to_error());
        }

        let candidate = Candidate {
            id: data.next_candidate_id,
            name: name.to_string(),
            votes: 0,
        };
        data.next_candidate_id += 1;
        data.candidates.push(candidate.clone());
        Ok(candidate)
    }

    async fn delete_candidate(&self, request: &DeleteCandidateRequest) -> Result<()> {
        let mut data = self.respond(Endpoint::DeleteCandidate).await?;
        let before = data.candidates.len();
        data.candidates.retain(|c| c.id != request.id);
        if data.candidates.len() == before {
            return Err(MockFailure::server(404, "Candidate not found").to_error());
        }
        Ok(())
    }

    async fn publish_results(&self, request: &PublishResultsRequest) -> Result<()> {
        let mut data = self.respond(Endpoint::PublishResults).await?;
        data.published = request.published;
        Ok(())
    }

    async fn generate_fairness_report(&self) -> Result<FairnessReport> {
        let mut data = self.respond(Endpoint::GenerateFairnessReport).await?;
        let report = data
            .generated_fairness
            .clone()
            .or_else(|| data.fairness.clone())
            .ok_or_else(|| MockFailure::server(500, "Fairness computation unavailable").to_error())?;
        data.fairness = Some(report.clone());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_mock_candidate_lifecycle() {
        let api = MockApi::new().with_next_candidate_id(7);

        let added = api
            .add_candidate(&AddCandidateRequest {
                name: "Aria Shah".into(),
                admin_id: None,
            })
            .await
            .unwrap();
        assert_eq!(added.id, 7);

        api.delete_candidate(&DeleteCandidateRequest { id: 7, admin_id: None })
            .await
            .unwrap();
        assert!(api.candidates().await.unwrap().is_empty());

        let err = api
            .delete_candidate(&DeleteCandidateRequest { id: 7, admin_id: None })
            .await
            .unwrap_err();
        assert_eq!(err.server_message(), Some("Candidate not found"));
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let api = MockApi::new().with_failure(Endpoint::Stats, MockFailure::Transport);

        assert!(matches!(api.stats().await, Err(ApiError::Transport(_))));
        assert_eq!(api.call_count(Endpoint::Stats).await, 1);

        api.clear_failure(Endpoint::Stats).await;
        assert!(api.stats().await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_hold_parks_mutation() {
        let api = Arc::new(MockApi::new());
        api.hold_mutations(1);

        let task = {
            let api = api.clone();
            tokio::spawn(async move {
                api.publish_results(&PublishResultsRequest {
                    published: true,
                    admin_id: None,
                })
                .await
            })
        };

        api.wait_until_held().await;
        assert!(!api.published().await);

        api.release_held();
        task.await.unwrap().unwrap();
        assert!(api.published().await);
    }

    #[tokio::test]
    async fn test_held_read_answers_with_its_snapshot() {
        let api = Arc::new(MockApi::new().with_candidates(vec![Candidate {
            id: 1,
            name: "Aria Shah".into(),
            votes: 0,
        }]));
        api.hold_reads(Endpoint::Candidates, 1).await;

        let read = {
            let api = api.clone();
            tokio::spawn(async move { api.candidates().await })
        };
        api.wait_until_read_held().await;

        api.set_candidates(vec![]).await;
        assert!(api.candidates().await.unwrap().is_empty());

        api.release_held_read();
        assert_eq!(read.await.unwrap().unwrap().len(), 1);
    }
}
