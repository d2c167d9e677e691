//! Authentication responses and backend insight/stat payloads.

use serde::{Deserialize, Serialize};

/// The user record the backend returns alongside a token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Body returned by `/auth/login` and `/auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Backend-generated narrative over recent activity (`GET /insights`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInsights {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub risk_trend: String,
    /// Alert objects are passed through untouched; their shape is backend-defined.
    #[serde(default)]
    pub critical_alerts: Vec<serde_json::Value>,
}

/// Aggregate counters from `GET /api/v1/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    #[serde(default)]
    pub allowed: u64,
    #[serde(default)]
    pub blocked: u64,
    /// Milliseconds.
    #[serde(default)]
    pub avg_latency: f64,
    /// Percent.
    #[serde(default)]
    pub uptime: f64,
}
