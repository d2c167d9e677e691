//! Error types shared by every VEIL crate.
//!
//! All fallible operations return `VeilResult<T>`. Network-level variants are
//! kept distinct so callers can tell latency from an auth failure.

use thiserror::Error;

/// The unified error type for the VEIL governance client.
#[derive(Debug, Error)]
pub enum VeilError {
    /// The request could not be sent or its body could not be read.
    #[error("http error: {reason}")]
    Http { reason: String },

    /// The exchange exceeded the configured client-side timeout and was cancelled.
    #[error("request to '{endpoint}' timed out after {timeout_ms} ms")]
    TimedOut { endpoint: String, timeout_ms: u64 },

    /// The backend rejected the bearer token (401/403). The stored token has
    /// already been cleared when this is returned.
    #[error("unauthorized")]
    Unauthorized,

    /// Any other non-2xx response.
    #[error("api error: {status} {status_text}")]
    Api { status: u16, status_text: String },

    /// A 2xx response body did not match the expected shape.
    #[error("decode error: {reason}")]
    Decode { reason: String },

    /// The session holds the demo sentinel token; no backend call was made.
    #[error("demo mode active: backend calls are disabled")]
    DemoMode,

    /// A value was rejected before any round trip (empty notes, bad budget, ...).
    #[error("validation error: {reason}")]
    Validation { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// No canned scenario is registered under this id.
    #[error("scenario '{scenario_id}' not found")]
    ScenarioNotFound { scenario_id: String },

    /// A simulation run is already in progress.
    #[error("a simulation is already running")]
    SimulationActive,

    /// Local file access failed (token file, config file, image payload).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl VeilError {
    /// True for failures that say nothing about the request itself: the
    /// backend was unreachable, slow, or bypassed.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            VeilError::Http { .. } | VeilError::TimedOut { .. } | VeilError::DemoMode
        )
    }
}

/// Convenience alias used throughout the VEIL crates.
pub type VeilResult<T> = Result<T, VeilError>;
