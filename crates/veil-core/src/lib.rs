//! # veil-core
//!
//! Client-side logic for the VEIL governance client that involves no I/O.
//!
//! This crate provides:
//! - Domain value builders (`builders`)
//! - Dashboard metrics and agent trust classification (`metrics`)
//! - The explicit client store (`workspace`)
//! - The seam traits `EvaluationGateway`, `AuditSink`, `Scheduler` (`traits`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use veil_core::{builders::submit_text_action, metrics::calculate_dashboard_metrics};
//! ```

pub mod builders;
pub mod metrics;
pub mod scheduler;
pub mod traits;
pub mod workspace;

pub use metrics::{agent_trust_status, calculate_dashboard_metrics, DashboardMetrics, TrustStatus};
pub use workspace::{ScenarioTrigger, View, Workspace};

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;

    use veil_contracts::{
        action::ActionKind,
        agent::{Agent, AgentUpdate, RiskLevel},
        audit::AuditLogEntry,
        evaluation::{ActionEvaluation, Decision},
        policy::Policy,
    };

    use crate::{
        builders::{
            create_audit_log_entry, derive_risk_level, generate_id, register_agent,
            submit_image_action, submit_text_action, AgentRegistration,
        },
        metrics::{agent_trust_status, calculate_dashboard_metrics, DashboardMetrics, TrustStatus},
        workspace::{View, Workspace},
    };

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn agent(id: &str) -> Agent {
        Agent {
            id: id.to_string(),
            name: format!("{id}-name"),
            purpose: String::new(),
            description: String::new(),
            allowed_capabilities: Vec::new(),
            risk_level: RiskLevel::Low,
            created_at: Utc::now(),
            policy_ids: None,
            thinking_config: None,
        }
    }

    fn policy(id: &str) -> Policy {
        Policy {
            id: id.to_string(),
            name: id.to_string(),
            natural_language: "No wire transfers over $10k".to_string(),
            structured_rules: None,
            created_at: Utc::now(),
        }
    }

    /// Build an entry for `agent_id` with the given verdict and risk score.
    fn entry(agent_id: &str, decision: Decision, risk: f64) -> AuditLogEntry {
        let action = submit_text_action(agent_id, "do something");
        let mut evaluation = ActionEvaluation::offline(&action.id, "test");
        evaluation.decision = decision;
        evaluation.risk_score = risk;
        evaluation.incomplete = false;
        create_audit_log_entry(&agent(agent_id), action, evaluation)
    }

    // ── Builders ──────────────────────────────────────────────────────────────

    #[test]
    fn generated_ids_are_base36_and_distinct() {
        let ids: HashSet<String> = (0..200).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 200);
        for id in &ids {
            assert_eq!(id.len(), 9);
            assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn risk_level_follows_capability_count() {
        assert_eq!(derive_risk_level(0), RiskLevel::Low);
        assert_eq!(derive_risk_level(1), RiskLevel::Medium);
        assert_eq!(derive_risk_level(2), RiskLevel::Medium);
        assert_eq!(derive_risk_level(3), RiskLevel::High);
        assert_eq!(derive_risk_level(12), RiskLevel::High);
    }

    #[test]
    fn register_agent_assigns_uuid_and_risk() {
        let a = register_agent(AgentRegistration {
            name: "Treasurer".to_string(),
            allowed_capabilities: vec!["pay".into(), "read".into(), "export".into()],
            ..Default::default()
        });
        assert!(uuid::Uuid::parse_str(&a.id).is_ok());
        assert_eq!(a.risk_level, RiskLevel::High);
    }

    #[test]
    fn text_and_image_actions() {
        let text = submit_text_action("a-1", "hello");
        assert_eq!(text.kind, ActionKind::Text);
        assert_eq!(text.raw_input, "hello");
        assert!(text.mime_type.is_none());

        let image = submit_image_action("a-1", "iVBORw0KGgo=", "image/png");
        assert_eq!(image.kind, ActionKind::Image);
        assert_eq!(image.mime_type.as_deref(), Some("image/png"));
        assert_ne!(text.id, image.id);
    }

    #[test]
    fn audit_entry_binds_action_and_agent() {
        let owner = agent("agent-7");
        let action = submit_text_action(&owner.id, "export payroll");
        let evaluation = ActionEvaluation::offline("someone-else", "x");
        let entry = create_audit_log_entry(&owner, action.clone(), evaluation);

        assert_eq!(entry.evaluation.action_id, entry.action.id);
        assert_eq!(entry.action, action);
        assert_eq!(entry.agent_id, owner.id);
        assert!(entry.resolution.is_none());
    }

    // ── Dashboard metrics ─────────────────────────────────────────────────────

    #[test]
    fn empty_logs_give_zero_metrics() {
        assert_eq!(calculate_dashboard_metrics(&[]), DashboardMetrics::default());
    }

    #[test]
    fn metrics_percentages_and_averages() {
        let logs = vec![
            entry("a", Decision::Allow, 10.0),
            entry("a", Decision::Deny, 90.0),
            entry("a", Decision::Flagged, 80.0),
            entry("a", Decision::Unknown, 0.0),
        ];
        let m = calculate_dashboard_metrics(&logs);
        assert_eq!(m.total, 4);
        assert_eq!(m.allowed_pct, 25);
        assert_eq!(m.blocked_pct, 25);
        assert_eq!(m.warning_pct, 50);
        assert_eq!(m.avg_risk_score, 45);
        assert_eq!(m.high_risk_count, 2);
    }

    #[test]
    fn percentages_sum_to_about_one_hundred() {
        // Thirds round independently to 33 + 33 + 33.
        let logs = vec![
            entry("a", Decision::Allow, 1.0),
            entry("a", Decision::Deny, 2.0),
            entry("a", Decision::Flagged, 3.0),
        ];
        let m = calculate_dashboard_metrics(&logs);
        let sum = m.allowed_pct + m.blocked_pct + m.warning_pct;
        assert!((99..=101).contains(&sum), "sum was {sum}");

        for n in 1..=13 {
            let logs: Vec<_> = (0..n)
                .map(|i| match i % 3 {
                    0 => entry("a", Decision::Allow, 0.0),
                    1 => entry("a", Decision::Deny, 0.0),
                    _ => entry("a", Decision::Unknown, 0.0),
                })
                .collect();
            let m = calculate_dashboard_metrics(&logs);
            let sum = m.allowed_pct + m.blocked_pct + m.warning_pct;
            assert!((99..=101).contains(&sum), "n={n} sum={sum}");
        }
    }

    #[test]
    fn average_risk_rounds_half_up() {
        let logs = vec![entry("a", Decision::Allow, 10.0), entry("a", Decision::Allow, 11.0)];
        assert_eq!(calculate_dashboard_metrics(&logs).avg_risk_score, 11);
    }

    // ── Trust status ──────────────────────────────────────────────────────────

    #[test]
    fn agent_without_logs_is_trusted() {
        let logs = vec![entry("other", Decision::Deny, 99.0)];
        assert_eq!(agent_trust_status("a", &logs), TrustStatus::Trusted);
    }

    #[test]
    fn one_denial_is_under_watch() {
        let logs = vec![entry("a", Decision::Deny, 10.0), entry("a", Decision::Allow, 5.0)];
        assert_eq!(agent_trust_status("a", &logs), TrustStatus::UnderWatch);
    }

    #[test]
    fn single_high_risk_is_under_watch() {
        let logs = vec![entry("a", Decision::Allow, 76.0)];
        assert_eq!(agent_trust_status("a", &logs), TrustStatus::UnderWatch);
        // 75 is not above the threshold.
        let logs = vec![entry("a", Decision::Allow, 75.0)];
        assert_eq!(agent_trust_status("a", &logs), TrustStatus::Trusted);
    }

    #[test]
    fn two_denials_compromise() {
        let logs = vec![entry("a", Decision::Deny, 0.0), entry("a", Decision::Deny, 0.0)];
        assert_eq!(agent_trust_status("a", &logs), TrustStatus::Compromised);
    }

    #[test]
    fn three_high_risk_compromise() {
        let logs = vec![
            entry("a", Decision::Flagged, 80.0),
            entry("a", Decision::Allow, 90.0),
            entry("a", Decision::Flagged, 76.0),
        ];
        assert_eq!(agent_trust_status("a", &logs), TrustStatus::Compromised);
    }

    #[test]
    fn trust_ignores_entries_beyond_window() {
        let mut logs: Vec<_> = (0..5).map(|_| entry("a", Decision::Allow, 5.0)).collect();
        assert_eq!(agent_trust_status("a", &logs), TrustStatus::Trusted);

        // Older entries appended after the window must not matter.
        for _ in 0..8 {
            logs.push(entry("a", Decision::Deny, 99.0));
        }
        assert_eq!(agent_trust_status("a", &logs), TrustStatus::Trusted);
    }

    #[test]
    fn trust_window_counts_only_the_agents_entries() {
        let logs = vec![
            entry("b", Decision::Allow, 0.0),
            entry("b", Decision::Allow, 0.0),
            entry("a", Decision::Allow, 0.0),
            entry("b", Decision::Allow, 0.0),
            entry("b", Decision::Allow, 0.0),
            entry("b", Decision::Allow, 0.0),
            entry("a", Decision::Deny, 0.0),
        ];
        assert_eq!(agent_trust_status("a", &logs), TrustStatus::UnderWatch);
    }

    #[test]
    fn trust_status_labels() {
        assert_eq!(TrustStatus::UnderWatch.to_string(), "Under Watch");
        assert_eq!(TrustStatus::Compromised.to_string(), "Compromised");
    }

    // ── Workspace ─────────────────────────────────────────────────────────────

    #[test]
    fn merge_never_duplicates_by_id() {
        let mut ws = Workspace::new();
        assert_eq!(ws.merge_agents(vec![agent("x"), agent("y")]), 2);
        assert_eq!(ws.merge_agents(vec![agent("y"), agent("z")]), 1);
        assert_eq!(ws.agents.len(), 3);

        assert_eq!(ws.merge_policies(vec![policy("p1")]), 1);
        assert_eq!(ws.merge_policies(vec![policy("p1")]), 0);
        assert_eq!(ws.policies.len(), 1);
    }

    #[test]
    fn active_agent_must_exist() {
        let mut ws = Workspace::new();
        assert!(ws.set_active_agent("ghost").is_err());
        ws.merge_agents(vec![agent("x")]);
        ws.set_active_agent("x").unwrap();
        assert_eq!(ws.active_agent().map(|a| a.id.as_str()), Some("x"));

        assert!(ws.remove_agent("x"));
        assert!(ws.active_agent_id.is_none());
    }

    #[test]
    fn update_agent_replaces_mutable_fields() {
        let mut ws = Workspace::new();
        ws.merge_agents(vec![agent("x")]);
        let updated = ws
            .update_agent(
                "x",
                AgentUpdate {
                    name: "New".to_string(),
                    purpose: "p".to_string(),
                    policy_ids: None,
                },
            )
            .unwrap();
        assert_eq!(updated.name, "New");
        assert!(ws.update_agent("missing", AgentUpdate {
            name: String::new(),
            purpose: String::new(),
            policy_ids: None,
        })
        .is_err());
    }

    #[test]
    fn navigation_defaults_to_overview() {
        let mut ws = Workspace::new();
        assert_eq!(ws.view, View::Overview);
        ws.navigate(View::MAIN);
        assert_eq!(ws.view, View::Evaluate);
    }
}
