//! Actions submitted on behalf of an agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload kind of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Text,
    Image,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Text => "text",
            ActionKind::Image => "image",
        }
    }
}

/// A text or image payload awaiting evaluation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: String,
    /// The agent this action was submitted for. A reference, not ownership.
    pub agent_id: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Text content, or a base64 image payload.
    pub raw_input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub timestamp: DateTime<Utc>,
}
