//! Aggregate dashboard metrics and per-agent trust classification.
//!
//! Both calculators are pure functions over a log slice ordered
//! most-recent-first.

use std::fmt;

use serde::Serialize;

use veil_contracts::{audit::AuditLogEntry, evaluation::Decision};

/// Entries at or above this risk score count as high risk on the dashboard.
pub const HIGH_RISK_SCORE: f64 = 80.0;

/// Number of most recent entries the trust classification looks at.
pub const TRUST_WINDOW: usize = 5;

/// Entries strictly above this risk score count against an agent's trust.
pub const TRUST_HIGH_RISK_SCORE: f64 = 75.0;

/// Summary figures shown on the dashboard.
///
/// The three percentages are rounded independently and may sum to 99 or 101.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total: usize,
    pub allowed_pct: u32,
    pub blocked_pct: u32,
    /// Flagged plus unknown.
    pub warning_pct: u32,
    pub avg_risk_score: u32,
    pub high_risk_count: usize,
}

fn percent(count: usize, total: usize) -> u32 {
    ((count as f64 / total as f64) * 100.0).round() as u32
}

/// Compute dashboard metrics. An empty slice yields all zeros.
pub fn calculate_dashboard_metrics(logs: &[AuditLogEntry]) -> DashboardMetrics {
    if logs.is_empty() {
        return DashboardMetrics::default();
    }

    let total = logs.len();
    let mut allowed = 0;
    let mut blocked = 0;
    let mut warning = 0;
    let mut risk_sum = 0.0;
    let mut high_risk_count = 0;

    for entry in logs {
        match entry.evaluation.decision {
            Decision::Allow => allowed += 1,
            Decision::Deny => blocked += 1,
            Decision::Flagged | Decision::Unknown => warning += 1,
        }
        risk_sum += entry.evaluation.risk_score;
        if entry.evaluation.risk_score >= HIGH_RISK_SCORE {
            high_risk_count += 1;
        }
    }

    DashboardMetrics {
        total,
        allowed_pct: percent(allowed, total),
        blocked_pct: percent(blocked, total),
        warning_pct: percent(warning, total),
        avg_risk_score: (risk_sum / total as f64).round() as u32,
        high_risk_count,
    }
}

/// Recent-window trust classification of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TrustStatus {
    Trusted,
    #[serde(rename = "Under Watch")]
    UnderWatch,
    Compromised,
}

impl fmt::Display for TrustStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrustStatus::Trusted => "Trusted",
            TrustStatus::UnderWatch => "Under Watch",
            TrustStatus::Compromised => "Compromised",
        };
        f.write_str(label)
    }
}

/// Classify `agent_id` from its 5 most recent log entries.
///
/// - `Compromised`: at least 2 denials, or at least 3 entries above 75 risk.
/// - `UnderWatch`: exactly 1 denial, or at least 1 entry above 75 risk.
/// - `Trusted`: otherwise, including an agent with no entries.
pub fn agent_trust_status(agent_id: &str, logs: &[AuditLogEntry]) -> TrustStatus {
    let recent = logs
        .iter()
        .filter(|entry| entry.agent_id == agent_id)
        .take(TRUST_WINDOW);

    let mut denials = 0;
    let mut high_risk = 0;
    for entry in recent {
        if entry.evaluation.decision == Decision::Deny {
            denials += 1;
        }
        if entry.evaluation.risk_score > TRUST_HIGH_RISK_SCORE {
            high_risk += 1;
        }
    }

    if denials >= 2 || high_risk >= 3 {
        TrustStatus::Compromised
    } else if denials == 1 || high_risk >= 1 {
        TrustStatus::UnderWatch
    } else {
        TrustStatus::Trusted
    }
}
