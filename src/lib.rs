//! GovernAI - contract governance copilot client library
//!
//! This library provides the copilot session controller for the GovernAI
//! contract-governance service, together with the HTTP client, local usage
//! persistence, and terminal rendering used by the `governai` binary.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Copilot session controller, usage gate, progressive reveal
//! - `api`: Governance API abstraction, HTTP client, and wire types
//! - `storage`: Durable key-value store for usage state
//! - `render`: Markup and table rendering for the terminal
//! - `commands`: CLI command handlers
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use governai::api::ApiClient;
//! use governai::session::CopilotSession;
//! use governai::storage::SqliteUsageStore;
//! use governai::Config;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let session = CopilotSession::new(
//!         Arc::new(ApiClient::new(&config.api)?),
//!         Arc::new(SqliteUsageStore::new()?),
//!         &config.copilot,
//!     )?;
//!     session.submit_query("Which contracts expire this quarter?").await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use api::{ApiClient, ApiFailure, CopilotApi};
pub use config::Config;
pub use error::{GovernaiError, Result};
pub use session::{CopilotSession, Message, SubmitOutcome};
