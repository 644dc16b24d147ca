//! Rust client for the TrustPoll admin API
//!
//! Typed access to the voting backend's admin routes: statistics, anomaly
//! flags, candidates, the governance audit ledger, fairness reports and the
//! administrative mutations. Every response passes through one decoder per
//! endpoint (see [`decode`]) so that callers only ever see complete records.
//!
//! # Example
//!
//! ```rust,no_run
//! use trustpoll_client::{AdminApi, ClientConfig, Subject, TrustPollClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TrustPollClient::new(ClientConfig::from_env())?;
//!
//! for flag in client.ai_flags().await? {
//!     println!("{} ({}/10): {}", flag.subject, flag.severity, flag.reason);
//! }
//!
//! let receipt = client.block_subject(&Subject::email("student@vit.edu"), 30).await?;
//! println!("blocked until {}", receipt.blocked_until);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod decode;
pub mod error;
pub mod mock;
pub mod types;

// Re-export main types
pub use api::AdminApi;
pub use client::{ClientConfig, TrustPollClient, API_URL_ENV, DEFAULT_API_URL};
pub use error::{ApiError, DecodeError, FailureKind, Result};
pub use mock::{MockApi, MockFailure};
pub use types::*;
