//! # veil-client
//!
//! HTTP client, session store, and evaluation gateway for the VEIL
//! governance backend.
//!
//! ## Overview
//!
//! [`ApiClient`] wraps every backend call in the same contract: bearer token
//! from the shared [`Session`], a client-side timeout, and a distinct error
//! for expired sessions. [`HttpEvaluationGateway`] builds on it to implement
//! [`EvaluationGateway`](veil_core::traits::EvaluationGateway) with a
//! fail-open policy: callers always get an evaluation they can render.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use veil_client::{ApiClient, ClientConfig, Session};
//!
//! let config = ClientConfig::from_file(Path::new("veil.toml"))?;
//! let client = ApiClient::new(&config, Session::in_memory())?;
//! client.login("ops", "secret").await?;
//! let agents = client.list_agents().await?;
//! ```

pub mod api;
pub mod config;
pub mod gateway;
pub mod http;
pub mod insights;
pub mod session;
pub mod wire;

pub use config::ClientConfig;
pub use gateway::{evaluate_action_with_policies, HttpEvaluationGateway};
pub use http::ApiClient;
pub use insights::{spawn_insights_poller, InsightsPoller};
pub use session::{Session, DEMO_TOKEN};

// ── Tests ─────────────────────────────────────────────────────────────────────
