//! Registered agent types.
//!
//! An agent is the subject of every evaluation. Its `risk_level` is fixed at
//! registration from the number of granted capabilities and never recomputed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{VeilError, VeilResult};

/// Coarse risk tier assigned to an agent at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(label)
    }
}

/// Extended-reasoning budget for agents evaluated in thinking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub budget_tokens: u32,
}

impl ThinkingConfig {
    pub const MIN_BUDGET_TOKENS: u32 = 1024;
    pub const MAX_BUDGET_TOKENS: u32 = 32_000;

    /// Build a config, rejecting budgets outside 1024..=32000.
    pub fn new(budget_tokens: u32) -> VeilResult<Self> {
        if !(Self::MIN_BUDGET_TOKENS..=Self::MAX_BUDGET_TOKENS).contains(&budget_tokens) {
            return Err(VeilError::Validation {
                reason: format!(
                    "thinking budget {} outside {}..={}",
                    budget_tokens,
                    Self::MIN_BUDGET_TOKENS,
                    Self::MAX_BUDGET_TOKENS
                ),
            });
        }
        Ok(Self { budget_tokens })
    }
}

/// A registered autonomous agent whose actions are subject to evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// UUID v4 assigned at registration.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub description: String,
    /// Capability tags the agent was granted, in registration order.
    #[serde(default)]
    pub allowed_capabilities: Vec<String>,
    pub risk_level: RiskLevel,
    pub created_at: DateTime<Utc>,
    /// Policies bound to this agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

/// Full-replace update of the mutable agent fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentUpdate {
    pub name: String,
    pub purpose: String,
    pub policy_ids: Option<Vec<String>>,
}

impl Agent {
    /// Replace name, purpose and policy bindings. Capabilities and
    /// `risk_level` are untouched.
    pub fn apply_update(&mut self, update: AgentUpdate) {
        self.name = update.name;
        self.purpose = update.purpose;
        self.policy_ids = update.policy_ids;
    }
}
