//! Canned agents, policies and log entries used when no backend is reachable.
//!
//! All data here is fictional. Ids are fixed so repeated merges are idempotent.

use chrono::Utc;

use veil_contracts::{
    agent::{Agent, ThinkingConfig},
    audit::AuditLogEntry,
    evaluation::{ActionEvaluation, Decision},
    policy::{Policy, Severity, StructuredRule, StructuredRules},
};
use veil_core::builders::{create_audit_log_entry, derive_risk_level, submit_text_action};

/// Signature stamped on canned evaluations.
pub const DEMO_SIGNATURE: &str = "demo";

fn demo_agent(id: &str, name: &str, purpose: &str, capabilities: &[&str]) -> Agent {
    Agent {
        id: id.to_string(),
        name: name.to_string(),
        purpose: purpose.to_string(),
        description: format!("Demo agent: {}", purpose),
        allowed_capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        risk_level: derive_risk_level(capabilities.len()),
        created_at: Utc::now(),
        policy_ids: None,
        thinking_config: None,
    }
}

/// The three demo agents scenarios run against.
pub fn demo_agents() -> Vec<Agent> {
    let mut finance = demo_agent(
        "agent-demo-finance",
        "Treasury Assistant",
        "Prepares and executes vendor payments",
        &["payments:execute", "ledger:read", "reports:export"],
    );
    finance.policy_ids = Some(vec![
        "policy-demo-financial".to_string(),
        "policy-demo-pii".to_string(),
    ]);
    finance.thinking_config = ThinkingConfig::new(8192).ok();

    vec![
        finance,
        demo_agent(
            "agent-demo-support",
            "Support Copilot",
            "Drafts replies to customer tickets",
            &["tickets:read", "email:draft"],
        ),
        demo_agent(
            "agent-demo-research",
            "Market Researcher",
            "Collects public competitor information",
            &["web:browse"],
        ),
    ]
}

fn rule(rule_id: &str, description: &str, severity: Severity, forbidden: &[&str]) -> StructuredRule {
    StructuredRule {
        rule_id: rule_id.to_string(),
        description: description.to_string(),
        severity,
        forbidden_actions: forbidden.iter().map(|f| f.to_string()).collect(),
        required_conditions: Vec::new(),
    }
}

/// Demo policies with pre-compiled rules.
pub fn demo_policies() -> Vec<Policy> {
    vec![
        Policy {
            id: "policy-demo-financial".to_string(),
            name: "Financial controls".to_string(),
            natural_language: "Agents must never move more than $10,000 or pay a new \
                               beneficiary without human approval."
                .to_string(),
            structured_rules: Some(StructuredRules {
                rules: vec![StructuredRule {
                    required_conditions: vec!["human_approval".to_string()],
                    ..rule(
                        "FIN-001",
                        "Transfers above $10,000 need approval",
                        Severity::High,
                        &["unapproved_transfer"],
                    )
                }],
            }),
            created_at: Utc::now(),
        },
        Policy {
            id: "policy-demo-pii".to_string(),
            name: "Personal data".to_string(),
            natural_language: "Never disclose or collect personal identifiers such as \
                               emails, phone numbers or national ids."
                .to_string(),
            structured_rules: Some(StructuredRules {
                rules: vec![rule(
                    "PII-001",
                    "No disclosure or harvesting of personal identifiers",
                    Severity::High,
                    &["share_pii", "harvest_contacts"],
                )],
            }),
            created_at: Utc::now(),
        },
        Policy {
            id: "policy-demo-content".to_string(),
            name: "Content safety".to_string(),
            natural_language: "Outgoing messages and images must be professional and \
                               free of harassment or explicit material."
                .to_string(),
            structured_rules: Some(StructuredRules {
                rules: vec![rule(
                    "CNT-001",
                    "Professional tone only",
                    Severity::Medium,
                    &["harassment", "explicit_content"],
                )],
            }),
            created_at: Utc::now(),
        },
    ]
}

fn canned_entry(agent: &Agent, text: &str, decision: Decision, risk: f64, reason: &str) -> AuditLogEntry {
    let action = submit_text_action(&agent.id, text);
    let evaluation = ActionEvaluation {
        action_id: action.id.clone(),
        decision,
        risk_score: risk,
        misbehavior_score: risk / 2.0,
        applied_policies: Vec::new(),
        reasons: vec![reason.to_string()],
        signature: DEMO_SIGNATURE.to_string(),
        incomplete: false,
        used_thinking: false,
    };
    create_audit_log_entry(agent, action, evaluation)
}

/// A short canned history, most recent first.
pub fn demo_logs() -> Vec<AuditLogEntry> {
    let agents = demo_agents();
    let (finance, support, research) = (&agents[0], &agents[1], &agents[2]);
    vec![
        canned_entry(
            research,
            "Compile the public pricing tiers of our top three competitors.",
            Decision::Allow,
            12.0,
            "Public information only",
        ),
        canned_entry(
            finance,
            "Pay invoice #4471 to an existing vendor for $2,300.",
            Decision::Allow,
            28.0,
            "Within approved limits",
        ),
        canned_entry(
            support,
            "Include the customer's phone number in the public forum reply.",
            Decision::Flagged,
            64.0,
            "Possible personal data disclosure",
        ),
    ]
}
