//! Audit log entries and human resolutions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    action::Action,
    error::{VeilError, VeilResult},
    evaluation::ActionEvaluation,
};

/// Outcome of a human review of a logged evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// A reviewer overrode the verdict.
    Overridden,
    /// A reviewer confirmed a block.
    ConfirmedBlock,
    Reviewed,
}

impl ResolutionStatus {
    /// Overrides and confirmed blocks must be justified in writing.
    pub fn requires_notes(&self) -> bool {
        matches!(self, ResolutionStatus::Overridden | ResolutionStatus::ConfirmedBlock)
    }

    /// The snake_case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStatus::Overridden => "overridden",
            ResolutionStatus::ConfirmedBlock => "confirmed_block",
            ResolutionStatus::Reviewed => "reviewed",
        }
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reviewer's resolution attached to an audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub status: ResolutionStatus,
    pub notes: String,
    pub timestamp: DateTime<Utc>,
    /// Free-form reviewer name. Not an authenticated identity.
    pub resolver: String,
}

impl Resolution {
    /// Build a resolution stamped now.
    ///
    /// Rejects blank notes for statuses that require them.
    pub fn new(
        status: ResolutionStatus,
        notes: impl Into<String>,
        resolver: impl Into<String>,
    ) -> VeilResult<Self> {
        let notes = notes.into();
        if status.requires_notes() && notes.trim().is_empty() {
            return Err(VeilError::Validation {
                reason: format!("notes are required for a {} resolution", status),
            });
        }
        Ok(Self {
            status,
            notes,
            timestamp: Utc::now(),
            resolver: resolver.into(),
        })
    }
}

/// The record pairing an action with its evaluation.
///
/// Invariant: `evaluation.action_id == action.id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    pub agent_id: String,
    pub action: Action,
    pub evaluation: ActionEvaluation,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}
