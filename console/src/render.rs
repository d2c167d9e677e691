//! Plain-text rendering for console output.

use veil_contracts::{
    account::{SystemInsights, SystemStats},
    agent::Agent,
    audit::AuditLogEntry,
    evaluation::ActionEvaluation,
    policy::{Policy, StructuredRules},
};
use veil_core::{DashboardMetrics, TrustStatus};

/// Longest raw input shown in log listings.
const PREVIEW_CHARS: usize = 60;

fn preview(raw: &str) -> String {
    let mut chars = raw.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

pub fn agent_line(agent: &Agent, trust: TrustStatus) {
    println!(
        "  {:<38} {:<24} risk={:<6} trust={}",
        agent.id, agent.name, agent.risk_level, trust
    );
    if !agent.purpose.is_empty() {
        println!("      purpose: {}", agent.purpose);
    }
    if !agent.allowed_capabilities.is_empty() {
        println!("      capabilities: {}", agent.allowed_capabilities.join(", "));
    }
    if let Some(policy_ids) = agent.policy_ids.as_ref().filter(|p| !p.is_empty()) {
        println!("      policies: {}", policy_ids.join(", "));
    }
}

pub fn policy_line(policy: &Policy) {
    println!("  {:<28} {}", policy.id, policy.name);
    println!("      {}", policy.natural_language);
    if let Some(rules) = &policy.structured_rules {
        structured_rules(rules);
    }
}

pub fn structured_rules(rules: &StructuredRules) {
    for rule in &rules.rules {
        println!(
            "      [{:?}] {}: {}",
            rule.severity, rule.rule_id, rule.description
        );
        if !rule.forbidden_actions.is_empty() {
            println!("          forbids: {}", rule.forbidden_actions.join(", "));
        }
        if !rule.required_conditions.is_empty() {
            println!("          requires: {}", rule.required_conditions.join(", "));
        }
    }
}

pub fn evaluation(eval: &ActionEvaluation) {
    let marker = if eval.incomplete { " (offline, not authoritative)" } else { "" };
    println!("  decision:    {}{}", eval.decision, marker);
    println!("  risk:        {:.0}", eval.risk_score);
    println!("  misbehavior: {:.0}", eval.misbehavior_score);
    if !eval.applied_policies.is_empty() {
        println!("  policies:    {}", eval.applied_policies.join(", "));
    }
    for reason in &eval.reasons {
        println!("  - {}", reason);
    }
    if eval.used_thinking {
        println!("  extended reasoning was used");
    }
    println!("  signature:   {}", eval.signature);
}

pub fn log_line(entry: &AuditLogEntry) {
    let resolution = entry
        .resolution
        .as_ref()
        .map(|r| format!(" [{} by {}]", r.status, r.resolver))
        .unwrap_or_default();
    println!(
        "  {} {:<12} {:<8} risk={:>3.0} {}{}",
        entry.created_at.format("%Y-%m-%d %H:%M:%S"),
        entry.id,
        entry.evaluation.decision,
        entry.evaluation.risk_score,
        entry.agent_id,
        resolution
    );
    println!("      {}", preview(&entry.action.raw_input));
}

pub fn metrics(m: &DashboardMetrics) {
    println!("  evaluations:  {}", m.total);
    println!("  allowed:      {}%", m.allowed_pct);
    println!("  blocked:      {}%", m.blocked_pct);
    println!("  warnings:     {}%", m.warning_pct);
    println!("  avg risk:     {}", m.avg_risk_score);
    println!("  high risk:    {}", m.high_risk_count);
}

pub fn stats(s: &SystemStats) {
    println!(
        "  backend: allowed={} blocked={} avg_latency={:.1}ms uptime={:.1}",
        s.allowed, s.blocked, s.avg_latency, s.uptime
    );
}

pub fn insights(i: &SystemInsights) {
    println!("  summary:    {}", i.summary);
    println!("  risk trend: {}", i.risk_trend);
    for alert in &i.critical_alerts {
        println!("  ! {}", alert);
    }
}
