//! AdminController - owns the session and the dashboard state.
//!
//! Loading lives in [`crate::aggregator`], administrative commands in
//! [`crate::commands`]; both are `impl` blocks on this type.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::AdminConfig;
use crate::confirm::Confirmer;
use crate::locks::ActionLocks;
use crate::session::{AccessDecision, SessionGate, UNAUTHORIZED_MESSAGE};
use crate::state::{DashboardState, Panel, Source, SourceData};
use crate::view::{self, DashboardView};
use trustpoll_client::AdminApi;

#[derive(Debug, Default)]
pub(crate) struct Session {
    pub authenticated: bool,
    pub identity: Option<String>,
    /// Bumped on every login and logout; work started under an older epoch
    /// must not write into the current state.
    pub epoch: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Inner {
    pub session: Session,
    pub dashboard: DashboardState,
    /// Sequence of the newest fetch merged per source
    pub merged: HashMap<Source, u64>,
}

impl Inner {
    /// Merge `data` unless a fetch of the same source that started later
    /// has already landed. Returns whether it was merged.
    pub fn merge_fetched(&mut self, seq: u64, data: SourceData) -> bool {
        let newest = self.merged.entry(data.source()).or_default();
        if seq < *newest {
            return false;
        }
        *newest = seq;
        self.dashboard.merge(data);
        true
    }
}

/// Session snapshot handed to a command when it starts.
#[derive(Debug, Clone)]
pub(crate) struct Ticket {
    pub epoch: u64,
    /// Attached to mutation bodies when configured
    pub admin_id: Option<String>,
}

/// Admin dashboard controller.
pub struct AdminController {
    pub(crate) config: AdminConfig,
    pub(crate) api: Arc<dyn AdminApi>,
    pub(crate) confirmer: Arc<dyn Confirmer>,
    gate: SessionGate,
    pub(crate) locks: ActionLocks,
    pub(crate) inner: RwLock<Inner>,
    fetch_seq: AtomicU64,
}

impl AdminController {
    pub fn new(config: AdminConfig, api: Arc<dyn AdminApi>, confirmer: Arc<dyn Confirmer>) -> Self {
        let gate = SessionGate::new(config.admin.identity.clone());
        Self {
            config,
            api,
            confirmer,
            gate,
            locks: ActionLocks::new(),
            inner: RwLock::new(Inner::default()),
            fetch_seq: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    pub fn locks(&self) -> &ActionLocks {
        &self.locks
    }

    /// Check `identity` and, when granted, start a fresh session and load
    /// every source. A rejected identity makes no network call.
    pub async fn authenticate(&self, identity: &str) -> AccessDecision {
        let decision = self.gate.check(identity);

        if !decision.granted {
            warn!("Rejected admin login");
            let mut inner = self.inner.write().await;
            if inner.session.authenticated {
                inner.session.epoch += 1;
            }
            inner.session.authenticated = false;
            inner.session.identity = None;
            inner.dashboard = DashboardState::default();
            inner.merged.clear();
            inner.dashboard.messages.set(Panel::Auth, UNAUTHORIZED_MESSAGE);
            return decision;
        }

        {
            let mut inner = self.inner.write().await;
            inner.session.epoch += 1;
            inner.session.authenticated = true;
            inner.session.identity = Some(identity.trim().to_string());
            inner.dashboard = DashboardState::default();
            inner.merged.clear();
            info!(epoch = inner.session.epoch, "Admin session started");
        }

        if let Err(e) = self.load_all().await {
            warn!(error = %e, "Initial dashboard load did not complete");
        }

        decision
    }

    /// End the session and drop all dashboard data.
    pub async fn logout(&self) {
        let mut inner = self.inner.write().await;
        inner.session.epoch += 1;
        inner.session.authenticated = false;
        inner.session.identity = None;
        inner.dashboard = DashboardState::default();
        inner.merged.clear();
        info!(epoch = inner.session.epoch, "Admin session ended");
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.session.authenticated
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> DashboardState {
        self.inner.read().await.dashboard.clone()
    }

    /// Update the pending add-candidate input.
    pub async fn set_candidate_draft(&self, draft: impl Into<String>) {
        self.inner.write().await.dashboard.candidate_draft = draft.into();
    }

    /// Presentation-ready projection of the current state.
    pub async fn view(&self) -> DashboardView {
        let state = self.snapshot().await;
        view::project(&state, &self.config.view, &self.locks.busy_keys())
    }

    // ==================== Internal ====================

    /// Current session, or `None` when logged out.
    pub(crate) async fn ticket(&self) -> Option<Ticket> {
        let inner = self.inner.read().await;
        if !inner.session.authenticated {
            return None;
        }
        let admin_id = if self.config.admin.send_admin_id {
            inner.session.identity.clone()
        } else {
            None
        };
        Some(Ticket {
            epoch: inner.session.epoch,
            admin_id,
        })
    }

    /// Sequence for a fetch about to start. Later fetches get higher numbers.
    pub(crate) fn next_fetch(&self) -> u64 {
        self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Merge fetched `data` if the session at `epoch` is still current.
    /// Returns false only when the session changed; data older than what
    /// its source already shows is dropped silently.
    pub(crate) async fn merge_if_current(&self, epoch: u64, seq: u64, data: SourceData) -> bool {
        let mut inner = self.inner.write().await;
        if inner.session.epoch != epoch {
            return false;
        }
        let source = data.source();
        if !inner.merge_fetched(seq, data) {
            debug!(%source, seq, "Dropping fetch overtaken by a newer one");
        }
        true
    }

    /// Apply `update` only if the session is still the one at `epoch`.
    pub(crate) async fn update_if_current<F>(&self, epoch: u64, update: F) -> bool
    where
        F: FnOnce(&mut DashboardState),
    {
        let mut inner = self.inner.write().await;
        if inner.session.epoch != epoch {
            return false;
        }
        update(&mut inner.dashboard);
        true
    }
}
