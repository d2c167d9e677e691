//! Pure constructors for domain values.
//!
//! Nothing here performs I/O. The only side effects are id generation and
//! reading the clock.

use chrono::Utc;
use rand::Rng;
use tracing::{debug, warn};

use veil_contracts::{
    action::{Action, ActionKind},
    agent::{Agent, RiskLevel, ThinkingConfig},
    audit::AuditLogEntry,
    evaluation::ActionEvaluation,
};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

/// A random 9-character base36 id. Collisions are improbable, not impossible.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Risk tier from capability count: 0 -> low, 1..=2 -> medium, >2 -> high.
pub fn derive_risk_level(capability_count: usize) -> RiskLevel {
    match capability_count {
        0 => RiskLevel::Low,
        1 | 2 => RiskLevel::Medium,
        _ => RiskLevel::High,
    }
}

/// Everything a caller supplies when registering an agent.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistration {
    pub name: String,
    pub purpose: String,
    pub description: String,
    pub allowed_capabilities: Vec<String>,
    pub policy_ids: Option<Vec<String>>,
    pub thinking_config: Option<ThinkingConfig>,
}

/// Build a new agent with a UUID v4 id and a derived risk level.
pub fn register_agent(registration: AgentRegistration) -> Agent {
    let risk_level = derive_risk_level(registration.allowed_capabilities.len());
    let agent = Agent {
        id: uuid::Uuid::new_v4().to_string(),
        name: registration.name,
        purpose: registration.purpose,
        description: registration.description,
        allowed_capabilities: registration.allowed_capabilities,
        risk_level,
        created_at: Utc::now(),
        policy_ids: registration.policy_ids,
        thinking_config: registration.thinking_config,
    };
    debug!(agent_id = %agent.id, risk_level = %agent.risk_level, "agent registered");
    agent
}

/// Build a text action for `agent_id`.
pub fn submit_text_action(agent_id: &str, text: impl Into<String>) -> Action {
    Action {
        id: generate_id(),
        agent_id: agent_id.to_string(),
        kind: ActionKind::Text,
        raw_input: text.into(),
        mime_type: None,
        timestamp: Utc::now(),
    }
}

/// Build an image action from an already base64-encoded payload.
pub fn submit_image_action(
    agent_id: &str,
    base64_payload: impl Into<String>,
    mime_type: impl Into<String>,
) -> Action {
    Action {
        id: generate_id(),
        agent_id: agent_id.to_string(),
        kind: ActionKind::Image,
        raw_input: base64_payload.into(),
        mime_type: Some(mime_type.into()),
        timestamp: Utc::now(),
    }
}

/// Pair an action with its evaluation.
///
/// The evaluation is re-bound to `action.id` so the entry always satisfies
/// `evaluation.action_id == action.id`.
pub fn create_audit_log_entry(
    agent: &Agent,
    action: Action,
    mut evaluation: ActionEvaluation,
) -> AuditLogEntry {
    if evaluation.action_id != action.id {
        warn!(
            expected = %action.id,
            got = %evaluation.action_id,
            "evaluation referenced a different action; re-binding"
        );
        evaluation.action_id = action.id.clone();
    }
    AuditLogEntry {
        id: generate_id(),
        agent_id: agent.id.clone(),
        action,
        evaluation,
        created_at: Utc::now(),
        resolution: None,
    }
}
