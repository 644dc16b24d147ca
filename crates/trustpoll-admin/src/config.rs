//! Dashboard configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use trustpoll_client::{ClientConfig, Endpoint, SubjectField, DEFAULT_API_URL};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub admin: AdminIdentityConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API origin
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Route serving candidates with vote counts
    #[serde(default = "default_candidates_path")]
    pub candidates_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminIdentityConfig {
    /// The one identity allowed into the dashboard (exact match)
    #[serde(default = "default_identity")]
    pub identity: String,

    /// Attach `admin_id` to mutation bodies
    #[serde(default = "default_true")]
    pub send_admin_id: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_election_id")]
    pub election_id: String,

    /// Audit events fetched per load
    #[serde(default = "default_audit_event_limit")]
    pub audit_event_limit: u32,

    /// Field that identifies flagged actors
    #[serde(default)]
    pub subject_field: SubjectField,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Explorer URL prefix; the transaction id and a trailing `/` are appended
    #[serde(default = "default_explorer_tx_base")]
    pub explorer_tx_base: String,

    /// Characters of a hash or tx id shown before eliding
    #[serde(default = "default_hash_preview_len")]
    pub hash_preview_len: usize,
}

// Defaults
fn default_base_url() -> String { DEFAULT_API_URL.to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_candidates_path() -> String { Endpoint::Candidates.path().to_string() }
fn default_identity() -> String { "admin@vit.edu".to_string() }
fn default_true() -> bool { true }
fn default_election_id() -> String { "demo-1".to_string() }
fn default_audit_event_limit() -> u32 { 100 }
fn default_explorer_tx_base() -> String { "https://testnet.explorer.perawallet.app/tx/".to_string() }
fn default_hash_preview_len() -> usize { 16 }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            candidates_path: default_candidates_path(),
        }
    }
}

impl Default for AdminIdentityConfig {
    fn default() -> Self {
        Self {
            identity: default_identity(),
            send_admin_id: default_true(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            election_id: default_election_id(),
            audit_event_limit: default_audit_event_limit(),
            subject_field: SubjectField::default(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            explorer_tx_base: default_explorer_tx_base(),
            hash_preview_len: default_hash_preview_len(),
        }
    }
}

impl AdminConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AdminConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin.identity.trim().is_empty() {
            return Err(ConfigError::Invalid("admin.identity must not be empty".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs must be at least 1".into()));
        }
        if self.dashboard.audit_event_limit == 0 {
            return Err(ConfigError::Invalid(
                "dashboard.audit_event_limit must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Settings for the HTTP client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api.base_url.clone(),
            timeout_secs: self.api.timeout_secs,
            subject_field: self.dashboard.subject_field,
            candidates_path: self.api.candidates_path.clone(),
        }
    }
}
