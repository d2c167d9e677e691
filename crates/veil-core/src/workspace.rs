//! The explicit client-side store: registered agents, policies, navigation
//! and demo flags.
//!
//! One `Workspace` is owned by the shell and passed by reference to whatever
//! needs it. There is no global instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use veil_contracts::{
    action::ActionKind,
    agent::{Agent, AgentUpdate},
    error::{VeilError, VeilResult},
    policy::Policy,
};

/// Top-level screen the shell is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Overview,
    /// The action submission screen.
    Evaluate,
    Agents,
    Policies,
    AuditLog,
}

impl View {
    /// The screen scenario replay navigates to.
    pub const MAIN: View = View::Evaluate;
}

/// A staged scenario action waiting to be auto-submitted.
///
/// `triggered_at` distinguishes two stagings of the same scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioTrigger {
    pub scenario_id: String,
    pub agent_id: String,
    pub kind: ActionKind,
    pub content: String,
    pub mime_type: Option<String>,
    pub triggered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub demo_mode: bool,
    pub agents: Vec<Agent>,
    pub policies: Vec<Policy>,
    pub active_agent_id: Option<String>,
    pub view: View,
    pub trigger: Option<ScenarioTrigger>,
    /// Index of the scenario a simulation run is currently on.
    pub simulation_step: Option<usize>,
    pub simulation_complete: bool,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent(&self, agent_id: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == agent_id)
    }

    pub fn active_agent(&self) -> Option<&Agent> {
        self.active_agent_id
            .as_deref()
            .and_then(|id| self.agent(id))
    }

    /// Select the agent subsequent actions are submitted for.
    pub fn set_active_agent(&mut self, agent_id: &str) -> VeilResult<()> {
        if self.agent(agent_id).is_none() {
            return Err(VeilError::Validation {
                reason: format!("agent '{}' is not registered", agent_id),
            });
        }
        self.active_agent_id = Some(agent_id.to_string());
        Ok(())
    }

    pub fn navigate(&mut self, view: View) {
        debug!(?view, "navigate");
        self.view = view;
    }

    /// Add agents whose id is not already present. Returns how many were added.
    pub fn merge_agents(&mut self, agents: impl IntoIterator<Item = Agent>) -> usize {
        let mut added = 0;
        for agent in agents {
            if self.agent(&agent.id).is_none() {
                self.agents.push(agent);
                added += 1;
            }
        }
        added
    }

    /// Add policies whose id is not already present. Returns how many were added.
    pub fn merge_policies(&mut self, policies: impl IntoIterator<Item = Policy>) -> usize {
        let mut added = 0;
        for policy in policies {
            if !self.policies.iter().any(|p| p.id == policy.id) {
                self.policies.push(policy);
                added += 1;
            }
        }
        added
    }

    /// Apply a full-replace update to a registered agent.
    pub fn update_agent(&mut self, agent_id: &str, update: AgentUpdate) -> VeilResult<&Agent> {
        let agent = self
            .agents
            .iter_mut()
            .find(|a| a.id == agent_id)
            .ok_or_else(|| VeilError::Validation {
                reason: format!("agent '{}' is not registered", agent_id),
            })?;
        agent.apply_update(update);
        Ok(agent)
    }

    /// Remove an agent. Clears the active selection if it pointed at it.
    pub fn remove_agent(&mut self, agent_id: &str) -> bool {
        let before = self.agents.len();
        self.agents.retain(|a| a.id != agent_id);
        if self.active_agent_id.as_deref() == Some(agent_id) {
            self.active_agent_id = None;
        }
        self.agents.len() != before
    }

    pub fn remove_policy(&mut self, policy_id: &str) -> bool {
        let before = self.policies.len();
        self.policies.retain(|p| p.id != policy_id);
        self.policies.len() != before
    }

    pub fn clear_policies(&mut self) {
        self.policies.clear();
    }

    /// Stage a trigger, replacing any unconsumed one.
    pub fn stage_trigger(&mut self, trigger: ScenarioTrigger) {
        self.trigger = Some(trigger);
    }

    /// Consume the staged trigger.
    pub fn take_trigger(&mut self) -> Option<ScenarioTrigger> {
        self.trigger.take()
    }
}
