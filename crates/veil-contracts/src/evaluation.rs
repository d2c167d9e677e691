//! Evaluation verdicts and the fail-open outcome type.
//!
//! The gateway never surfaces a failure as an error the caller must handle
//! before rendering. A failed round trip yields `Err(Degraded)`, which still
//! carries a complete `ActionEvaluation` flagged `incomplete`.

use serde::{Deserialize, Serialize};

/// Signature stamped on evaluations synthesized without a backend.
pub const OFFLINE_SIGNATURE: &str = "offline";

/// Verdict for a single action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
    Flagged,
    /// Placeholder for degraded results and unrecognised backend values.
    #[default]
    Unknown,
}

impl Decision {
    /// Parse a backend decision string, case-insensitively. Anything outside
    /// the four known values becomes `Unknown`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "allow" => Decision::Allow,
            "deny" => Decision::Deny,
            "flagged" => Decision::Flagged,
            _ => Decision::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
            Decision::Flagged => "flagged",
            Decision::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp a score into [0, 100]. NaN becomes 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// The verdict and supporting metadata for one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEvaluation {
    pub action_id: String,
    pub decision: Decision,
    /// In [0, 100].
    pub risk_score: f64,
    /// In [0, 100].
    pub misbehavior_score: f64,
    /// Ids of the policies the backend applied, in its order.
    #[serde(default)]
    pub applied_policies: Vec<String>,
    #[serde(default)]
    pub reasons: Vec<String>,
    /// Provenance marker. Opaque to the client.
    #[serde(default)]
    pub signature: String,
    /// Set when the result was synthesized because the backend was unreachable.
    #[serde(default, skip_serializing_if = "is_false")]
    pub incomplete: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub used_thinking: bool,
}

impl ActionEvaluation {
    /// The placeholder returned when no authoritative verdict is available.
    pub fn offline(action_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            decision: Decision::Unknown,
            risk_score: 0.0,
            misbehavior_score: 0.0,
            applied_policies: Vec::new(),
            reasons: vec![reason.into()],
            signature: OFFLINE_SIGNATURE.to_string(),
            incomplete: true,
            used_thinking: false,
        }
    }
}

/// The fail-open arm of an evaluation: why the backend verdict is missing,
/// plus a renderable stand-in.
#[derive(Debug, Clone, PartialEq)]
pub struct Degraded {
    pub cause: String,
    pub evaluation: ActionEvaluation,
}

/// Result of submitting an action for evaluation.
pub type EvaluationOutcome = Result<ActionEvaluation, Degraded>;

/// Collapse an outcome into something that can always be displayed.
pub trait Renderable {
    /// The evaluation to show, authoritative or not.
    fn renderable(self) -> ActionEvaluation;
}

impl Renderable for EvaluationOutcome {
    fn renderable(self) -> ActionEvaluation {
        match self {
            Ok(evaluation) => evaluation,
            Err(degraded) => degraded.evaluation,
        }
    }
}
