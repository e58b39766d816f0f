//! momo-keygen - MTN MoMo sandbox credential provisioning
//!
//! Registers an API user and API key with the MoMo sandbox gateway on
//! behalf of a caller holding a subscription key. When the gateway path
//! fails at any step, a locally generated pair of the same shape is
//! returned instead, clearly marked as unregistered.
//!
//! ## Modules
//!
//! - **provisioning**: registrar, fallback generator, orchestrator, assembler
//! - **server**: hyper HTTP server and shared state
//! - **routes**: `/api/generate`, `/health`, `/version`

pub mod config;
pub mod provisioning;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, serve, AppState};
pub use types::{KeygenError, Result};
