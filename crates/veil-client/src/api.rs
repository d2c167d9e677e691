//! The backend API surface, as methods on `ApiClient`.

use serde_json::{json, Value};
use tracing::{debug, info};

use veil_contracts::{
    account::{AuthResponse, SystemInsights, SystemStats},
    agent::{Agent, AgentUpdate},
    audit::{AuditLogEntry, Resolution},
    error::{VeilError, VeilResult},
    policy::{NewPolicy, Policy, StructuredRules},
};

use crate::{
    http::{ApiClient, LOGIN_ENDPOINT},
    wire::{decode_log_records, ResolveRequest},
};

/// Path of the stats endpoint, read directly rather than through `fetch_json`.
pub const STATS_PATH: &str = "/api/v1/stats";

impl ApiClient {
    // ========== Auth API ==========

    /// Exchange credentials for a token and store it in the session.
    pub async fn login(&self, username: &str, password: &str) -> VeilResult<AuthResponse> {
        let auth: AuthResponse = self
            .post(
                LOGIN_ENDPOINT,
                &json!({ "username": username, "password": password }),
            )
            .await?;
        self.session.set_token(&auth.token)?;
        info!(username = %username, role = ?auth.role, "logged in");
        Ok(auth)
    }

    /// Create an account and store the returned token.
    pub async fn register_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> VeilResult<AuthResponse> {
        let auth: AuthResponse = self
            .post(
                "/auth/register",
                &json!({ "name": name, "email": email, "password": password }),
            )
            .await?;
        self.session.set_token(&auth.token)?;
        info!(email = %email, "account registered");
        Ok(auth)
    }

    /// Forget the stored token. No backend call is made.
    pub fn logout(&self) {
        self.session.clear();
    }

    // ========== Agent API ==========

    pub async fn list_agents(&self) -> VeilResult<Vec<Agent>> {
        self.get("/agents").await
    }

    /// Register an agent built with `veil_core::builders::register_agent`.
    pub async fn create_agent(&self, agent: &Agent) -> VeilResult<Agent> {
        self.post("/agents", agent).await
    }

    /// Full-replace update of name, purpose and policy bindings.
    pub async fn update_agent(&self, agent_id: &str, update: &AgentUpdate) -> VeilResult<Agent> {
        self.put(&format!("/agents/{}", agent_id), update).await
    }

    pub async fn delete_agent(&self, agent_id: &str) -> VeilResult<()> {
        self.delete(&format!("/agents/{}", agent_id)).await
    }

    // ========== Policy API ==========

    pub async fn list_policies(&self) -> VeilResult<Vec<Policy>> {
        self.get("/policies").await
    }

    /// Submit a natural-language policy. The backend compiles its rules.
    pub async fn create_policy(&self, policy: &NewPolicy) -> VeilResult<Policy> {
        self.post("/policies", policy).await
    }

    pub async fn delete_policy(&self, policy_id: &str) -> VeilResult<()> {
        self.delete(&format!("/policies/{}", policy_id)).await
    }

    /// Preview the structured rules the backend would compile.
    pub async fn convert_policy(&self, natural_language: &str) -> VeilResult<StructuredRules> {
        self.post(
            "/policies/convert",
            &json!({ "naturalLanguage": natural_language }),
        )
        .await
    }

    /// Delete every policy the backend lists. Stops at the first failure.
    pub async fn clear_policies(&self) -> VeilResult<usize> {
        let policies = self.list_policies().await?;
        for policy in &policies {
            self.delete_policy(&policy.id).await?;
        }
        info!(count = policies.len(), "policies cleared");
        Ok(policies.len())
    }

    // ========== Audit API ==========

    /// Backend audit log, most recent first, leniently mapped.
    pub async fn list_logs(&self) -> VeilResult<Vec<AuditLogEntry>> {
        let body: Value = self.get("/logs").await?;
        let entries = decode_log_records(&body);
        debug!(count = entries.len(), "logs fetched");
        Ok(entries)
    }

    pub async fn resolve_log(&self, entry_id: &str, resolution: &Resolution) -> VeilResult<()> {
        let _: Value = self
            .patch(
                &format!("/logs/{}/resolve", entry_id),
                &ResolveRequest::new(resolution),
            )
            .await?;
        Ok(())
    }

    // ========== Insights & stats ==========

    pub async fn insights(&self) -> VeilResult<SystemInsights> {
        self.get("/insights").await
    }

    /// Read `/api/v1/stats` directly: no bearer token, no session handling,
    /// not short-circuited by demo mode.
    pub async fn stats(&self) -> VeilResult<SystemStats> {
        let url = format!("{}{}", self.origin, STATS_PATH);
        let exchange = async {
            let response = self.http.get(&url).send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes))
        };

        let (status, bytes) = match tokio::time::timeout(self.timeout, exchange).await {
            Err(_) => {
                return Err(VeilError::TimedOut {
                    endpoint: STATS_PATH.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
            Ok(Err(e)) => {
                return Err(VeilError::Http {
                    reason: e.to_string(),
                })
            }
            Ok(Ok(pair)) => pair,
        };

        if !status.is_success() {
            return Err(VeilError::Api {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| VeilError::Decode {
            reason: format!("unexpected stats response: {}", e),
        })
    }
}
