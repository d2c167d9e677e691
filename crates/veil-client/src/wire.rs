//! Wire shapes and lenient decoding of backend payloads.
//!
//! Evaluation and log records are decoded field by field from
//! `serde_json::Value`: every field is optional, camelCase names are tried
//! first and snake_case second, and anything missing or mistyped falls back
//! to a default. Decoding these payloads never fails.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use veil_contracts::{
    action::{Action, ActionKind},
    agent::Agent,
    audit::{AuditLogEntry, Resolution, ResolutionStatus},
    evaluation::{clamp_score, ActionEvaluation, Decision},
    policy::Policy,
};

// ── Requests ──────────────────────────────────────────────────────────────────

/// Body of `POST /validate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest<'a> {
    pub agent_id: &'a str,
    pub action_id: &'a str,
    pub action_type: ActionKind,
    /// Text content or base64 image payload.
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<&'a str>,
    pub policies: &'a [Policy],
    pub use_thinking: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_budget: Option<u32>,
}

impl<'a> ValidateRequest<'a> {
    pub fn new(agent: &'a Agent, action: &'a Action, policies: &'a [Policy], use_thinking: bool) -> Self {
        Self {
            agent_id: &agent.id,
            action_id: &action.id,
            action_type: action.kind,
            content: &action.raw_input,
            mime_type: action.mime_type.as_deref(),
            policies,
            use_thinking,
            thinking_budget: if use_thinking {
                agent.thinking_config.map(|c| c.budget_tokens)
            } else {
                None
            },
        }
    }
}

/// Body of `PATCH /logs/:id/resolve`.
#[derive(Debug, Serialize)]
pub struct ResolveRequest<'a> {
    pub resolution: &'static str,
    pub notes: &'a str,
    pub resolver: &'a str,
}

impl<'a> ResolveRequest<'a> {
    pub fn new(resolution: &'a Resolution) -> Self {
        Self {
            resolution: resolution_code(Some(resolution.status)),
            notes: &resolution.notes,
            resolver: &resolution.resolver,
        }
    }
}

// ── Resolution codes ──────────────────────────────────────────────────────────

/// Backend enum for a resolution status. `None` is `NONE`.
pub fn resolution_code(status: Option<ResolutionStatus>) -> &'static str {
    match status {
        None => "NONE",
        Some(ResolutionStatus::Overridden) => "OVERRIDE",
        Some(ResolutionStatus::ConfirmedBlock) => "CONFIRM_BLOCK",
        Some(ResolutionStatus::Reviewed) => "REVIEWED",
    }
}

/// Inverse of `resolution_code`. `NONE` and unknown codes map to `None`.
pub fn parse_resolution_code(code: &str) -> Option<ResolutionStatus> {
    match code.trim().to_ascii_uppercase().as_str() {
        "OVERRIDE" => Some(ResolutionStatus::Overridden),
        "CONFIRM_BLOCK" => Some(ResolutionStatus::ConfirmedBlock),
        "REVIEWED" => Some(ResolutionStatus::Reviewed),
        _ => None,
    }
}

// ── Field access ──────────────────────────────────────────────────────────────

/// First present, non-null field among `names`.
fn field<'v>(value: &'v Value, names: &[&str]) -> Option<&'v Value> {
    names
        .iter()
        .filter_map(|name| value.get(*name))
        .find(|v| !v.is_null())
}

fn string_field(value: &Value, names: &[&str]) -> Option<String> {
    field(value, names).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn number_field(value: &Value, names: &[&str]) -> f64 {
    field(value, names)
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .unwrap_or(0.0)
}

fn bool_field(value: &Value, names: &[&str]) -> bool {
    field(value, names).and_then(Value::as_bool).unwrap_or(false)
}

/// Strings from an array. Object items contribute their `id` (or `name`).
fn string_list_field(value: &Value, names: &[&str]) -> Vec<String> {
    let Some(Value::Array(items)) = field(value, names) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(_) => string_field(item, &["id", "name"]),
            _ => None,
        })
        .collect()
}

fn time_field(value: &Value, names: &[&str]) -> Option<DateTime<Utc>> {
    string_field(value, names)
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc))
}

// ── Evaluations ───────────────────────────────────────────────────────────────

/// Decode a `/validate` response for `action_id`.
///
/// Missing decision -> `unknown`, missing scores -> 0 (clamped to [0, 100]),
/// missing lists -> empty, missing signature -> empty. A non-object body
/// yields all defaults.
pub fn decode_evaluation(action_id: &str, value: &Value) -> ActionEvaluation {
    let decision = string_field(value, &["decision", "verdict"])
        .map(|d| Decision::parse_lenient(&d))
        .unwrap_or_default();

    ActionEvaluation {
        action_id: string_field(value, &["actionId", "action_id"])
            .unwrap_or_else(|| action_id.to_string()),
        decision,
        risk_score: clamp_score(number_field(value, &["riskScore", "risk_score"])),
        misbehavior_score: clamp_score(number_field(
            value,
            &["misbehaviorScore", "misbehavior_score"],
        )),
        applied_policies: string_list_field(value, &["appliedPolicies", "applied_policies"]),
        reasons: string_list_field(value, &["reasons"]),
        signature: string_field(value, &["signature"]).unwrap_or_default(),
        incomplete: bool_field(value, &["incomplete"]),
        used_thinking: bool_field(value, &["usedThinking", "used_thinking"]),
    }
}

// ── Log records ───────────────────────────────────────────────────────────────

fn decode_action(record: &Value, entry_id: &str, agent_id: &str) -> Action {
    let nested = field(record, &["action"]).filter(|v| v.is_object());
    let source = nested.unwrap_or(record);

    let kind = match string_field(source, &["type", "actionType", "action_type"]).as_deref() {
        Some("image") => ActionKind::Image,
        _ => ActionKind::Text,
    };

    Action {
        id: nested
            .and_then(|action| string_field(action, &["id", "actionId", "action_id"]))
            .or_else(|| string_field(record, &["actionId", "action_id"]))
            .unwrap_or_else(|| format!("{entry_id}-action")),
        agent_id: string_field(source, &["agentId", "agent_id"])
            .unwrap_or_else(|| agent_id.to_string()),
        kind,
        raw_input: string_field(source, &["rawInput", "raw_input", "content"]).unwrap_or_default(),
        mime_type: string_field(source, &["mimeType", "mime_type"]),
        timestamp: time_field(source, &["timestamp", "createdAt", "created_at"])
            .unwrap_or_else(Utc::now),
    }
}

fn decode_resolution(record: &Value) -> Option<Resolution> {
    let raw = field(record, &["resolution"])?;
    // Either the backend enum string with sibling fields, or a nested object.
    let (code, source) = match raw {
        Value::String(code) => (code.clone(), record),
        Value::Object(_) => (string_field(raw, &["status", "resolution"])?, raw),
        _ => return None,
    };
    let status = parse_resolution_code(&code)?;
    Some(Resolution {
        status,
        notes: string_field(source, &["resolutionNotes", "resolution_notes", "notes"])
            .unwrap_or_default(),
        timestamp: time_field(source, &["resolvedAt", "resolved_at", "timestamp"])
            .unwrap_or_else(Utc::now),
        resolver: string_field(source, &["resolver", "resolvedBy", "resolved_by"])
            .unwrap_or_default(),
    })
}

/// Map one backend log record. Records without an id are skipped.
pub fn decode_log_record(record: &Value) -> Option<AuditLogEntry> {
    let Some(id) = string_field(record, &["id", "_id", "logId", "log_id"]) else {
        warn!("skipping backend log record without an id");
        return None;
    };
    let agent_id = string_field(record, &["agentId", "agent_id"]).unwrap_or_default();
    let action = decode_action(record, &id, &agent_id);

    let evaluation_source = field(record, &["evaluation"])
        .filter(|v| v.is_object())
        .unwrap_or(record);
    let mut evaluation = decode_evaluation(&action.id, evaluation_source);
    evaluation.action_id = action.id.clone();

    Some(AuditLogEntry {
        created_at: time_field(record, &["createdAt", "created_at", "timestamp"])
            .unwrap_or(action.timestamp),
        resolution: decode_resolution(record),
        id,
        agent_id,
        action,
        evaluation,
    })
}

/// Map a `GET /logs` body: a bare array or an object with a `logs` array.
pub fn decode_log_records(body: &Value) -> Vec<AuditLogEntry> {
    let records = match body {
        Value::Array(items) => items.as_slice(),
        other => match field(other, &["logs", "data"]) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
    };
    records.iter().filter_map(decode_log_record).collect()
}
