//! Initial data load with demo fallback.
//!
//! The shell loads agents, policies and logs once at start-up. Any failure,
//! including an expired token or the demo sentinel, switches to canned demo
//! data instead of logging the user out.

use tracing::{info, warn};

use veil_audit::AuditLog;
use veil_contracts::{agent::Agent, audit::AuditLogEntry, error::VeilResult, policy::Policy};
use veil_client::ApiClient;
use veil_core::workspace::Workspace;

use crate::mock_data::{demo_agents, demo_logs, demo_policies};

/// Where loaded data came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Backend,
    /// Canned data, with the failure that caused the fallback.
    Demo { reason: String },
}

#[derive(Debug, Clone)]
pub struct LoadedData {
    pub agents: Vec<Agent>,
    pub policies: Vec<Policy>,
    /// Most recent first.
    pub logs: Vec<AuditLogEntry>,
    pub source: DataSource,
}

impl LoadedData {
    pub fn demo(reason: impl Into<String>) -> Self {
        Self {
            agents: demo_agents(),
            policies: demo_policies(),
            logs: demo_logs(),
            source: DataSource::Demo {
                reason: reason.into(),
            },
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self.source, DataSource::Demo { .. })
    }

    /// Replace the workspace's agents and policies and the audit log's
    /// entries with this data.
    pub fn apply(self, workspace: &mut Workspace, audit: &AuditLog) -> VeilResult<()> {
        workspace.demo_mode = self.is_demo();
        workspace.agents = self.agents;
        workspace.policies = self.policies;
        if let Some(active) = workspace.active_agent_id.as_deref() {
            if workspace.agent(active).is_none() {
                workspace.active_agent_id = None;
            }
        }
        audit.replace_all(self.logs)
    }
}

async fn load_from_backend(client: &ApiClient) -> VeilResult<LoadedData> {
    let agents = client.list_agents().await?;
    let policies = client.list_policies().await?;
    let logs = client.list_logs().await?;
    Ok(LoadedData {
        agents,
        policies,
        logs,
        source: DataSource::Backend,
    })
}

/// Load from the backend, or fall back to demo data on any error.
pub async fn load_or_fallback(client: &ApiClient) -> LoadedData {
    match load_from_backend(client).await {
        Ok(data) => {
            info!(
                agents = data.agents.len(),
                policies = data.policies.len(),
                logs = data.logs.len(),
                "loaded backend data"
            );
            data
        }
        Err(e) => {
            warn!(error = %e, "backend unavailable, using demo data");
            LoadedData::demo(e.to_string())
        }
    }
}
