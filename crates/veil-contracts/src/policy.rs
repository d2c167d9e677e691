//! Natural-language policies and their server-compiled rule form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity attached to a compiled rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A single rule compiled by the backend from a policy's natural language.
///
/// Field names are snake_case on the wire, unlike the surrounding policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRule {
    pub rule_id: String,
    pub description: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forbidden_actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_conditions: Vec<String>,
}

/// The compiled rule set returned by `POST /policies/convert`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRules {
    #[serde(default)]
    pub rules: Vec<StructuredRule>,
}

/// A governance rule expressed in natural language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    pub name: String,
    pub natural_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_rules: Option<StructuredRules>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /policies`. The backend compiles and assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPolicy {
    pub name: String,
    pub natural_language: String,
}
