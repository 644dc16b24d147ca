//! Concurrent, partially-failing dashboard loads.

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::controller::AdminController;
use crate::state::{DashboardState, Source, SourceData};
use trustpoll_client::ApiError;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unauthorized access")]
    Unauthorized,

    /// The session ended or restarted while the load was in flight
    #[error("session changed during load; results discarded")]
    Superseded,

    #[error("failed to load {data_source}: {error}")]
    Fetch {
        data_source: Source,
        #[source]
        error: ApiError,
    },
}

/// A source that did not load.
#[derive(Debug)]
pub struct SourceFailure {
    pub source: Source,
    pub error: ApiError,
}

/// Outcome of a full load.
#[derive(Debug)]
pub struct LoadReport {
    /// State after merging every source that succeeded
    pub state: DashboardState,
    pub failures: Vec<SourceFailure>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl AdminController {
    /// Fetch every source concurrently and merge whatever succeeds.
    ///
    /// A failing source keeps its previous value and never affects the
    /// others, and a source refreshed while this load was in flight keeps
    /// the newer data. Sets `loading` for the duration.
    pub async fn load_all(&self) -> Result<LoadReport, LoadError> {
        let epoch = {
            let mut inner = self.inner.write().await;
            if !inner.session.authenticated {
                return Err(LoadError::Unauthorized);
            }
            inner.dashboard.loading = true;
            inner.session.epoch
        };

        let results = join_all(Source::ALL.iter().map(|&source| {
            let seq = self.next_fetch();
            async move { (source, seq, self.fetch(source).await) }
        }))
        .await;

        let mut inner = self.inner.write().await;
        if inner.session.epoch != epoch {
            debug!(epoch, "Discarding load from an ended session");
            return Err(LoadError::Superseded);
        }

        let mut failures = Vec::new();
        for (source, seq, result) in results {
            match result {
                Ok(data) => {
                    if !inner.merge_fetched(seq, data) {
                        debug!(%source, seq, "Keeping newer data loaded during this load");
                    }
                }
                Err(error) => {
                    warn!(%source, kind = ?error.kind(), error = %error, "Source failed to load");
                    failures.push(SourceFailure { source, error });
                }
            }
        }
        inner.dashboard.loading = false;

        info!(
            loaded = Source::ALL.len() - failures.len(),
            failed = failures.len(),
            "Dashboard loaded"
        );

        Ok(LoadReport {
            state: inner.dashboard.clone(),
            failures,
        })
    }

    /// Re-fetch one source. On failure the field keeps its value.
    pub async fn refresh(&self, source: Source) -> Result<(), LoadError> {
        let ticket = self.ticket().await.ok_or(LoadError::Unauthorized)?;
        let seq = self.next_fetch();

        let data = self.fetch(source).await.map_err(|error| {
            warn!(%source, error = %error, "Refresh failed");
            LoadError::Fetch {
                data_source: source,
                error,
            }
        })?;

        if self
            .merge_if_current(ticket.epoch, seq, data)
            .await
        {
            debug!(%source, "Refreshed");
            Ok(())
        } else {
            Err(LoadError::Superseded)
        }
    }

    async fn fetch(&self, source: Source) -> Result<SourceData, ApiError> {
        let dashboard = &self.config.dashboard;
        match source {
            Source::Stats => self.api.stats().await.map(SourceData::Stats),
            Source::Flags => self.api.ai_flags().await.map(SourceData::Flags),
            Source::Candidates => self.api.candidates().await.map(SourceData::Candidates),
            Source::AuditEvents => self
                .api
                .audit_events(dashboard.audit_event_limit)
                .await
                .map(SourceData::AuditEvents),
            Source::Fairness => self.api.fairness_index().await.map(SourceData::Fairness),
            Source::Governance => self
                .api
                .governance_audit(&dashboard.election_id)
                .await
                .map(SourceData::Governance),
        }
    }
}
