//! TrustPoll admin dashboard controller
//!
//! Owns the admin session and the dashboard state, loads the dashboard's
//! collections concurrently, and runs administrative commands against an
//! [`AdminApi`](trustpoll_client::AdminApi) with per-key locking and operator
//! confirmation.
//!
//! ## Flow
//!
//! ```text
//! authenticate ──► load_all ──► view
//!                     ▲
//! command ──► confirm ──► lock ──► dispatch ──► refresh
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trustpoll_admin::{AdminConfig, AdminController, AlwaysConfirm};
//! use trustpoll_client::TrustPollClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AdminConfig::load("trustpoll-admin.toml")?;
//! let api = Arc::new(TrustPollClient::new(config.client_config())?);
//! let controller = AdminController::new(config, api, Arc::new(AlwaysConfirm));
//!
//! if controller.authenticate("admin@vit.edu").await.granted {
//!     let outcome = controller.add_candidate("Aria Shah").await;
//!     println!("{}", outcome.message);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod commands;
pub mod config;
pub mod confirm;
pub mod controller;
pub mod locks;
pub mod session;
pub mod state;
pub mod view;

pub use aggregator::{LoadError, LoadReport, SourceFailure};
pub use commands::{CommandKind, CommandOutcome, CommandStatus, BLOCK_MINUTES};
pub use config::{AdminConfig, ConfigError};
pub use confirm::{AlwaysConfirm, AlwaysDecline, ConfirmAction, Confirmer, RecordingConfirmer};
pub use controller::AdminController;
pub use locks::{ActionGuard, ActionLocks};
pub use session::{AccessDecision, SessionGate, UNAUTHORIZED_MESSAGE};
pub use state::{DashboardState, Panel, PanelMessages, Source, SourceData};
pub use view::DashboardView;
