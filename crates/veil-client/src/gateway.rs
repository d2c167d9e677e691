//! The evaluation gateway.
//!
//! Sends an action and the full policy set to `POST /validate` and turns
//! whatever comes back into an `ActionEvaluation`. Failures are never
//! propagated: the caller gets `Err(Degraded)` holding a renderable,
//! `incomplete` evaluation instead.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use veil_contracts::{
    action::Action,
    agent::Agent,
    evaluation::{ActionEvaluation, Degraded, EvaluationOutcome},
    policy::Policy,
};
use veil_core::traits::EvaluationGateway;

use crate::{
    http::ApiClient,
    wire::{decode_evaluation, ValidateRequest},
};

pub const VALIDATE_ENDPOINT: &str = "/validate";

/// Reason shown on evaluations synthesized after a failed round trip.
pub const OFFLINE_REASON: &str =
    "Evaluation service unavailable; this result is not authoritative.";

/// Submit `action` for evaluation against `policies`.
pub async fn evaluate_action_with_policies(
    client: &ApiClient,
    agent: &Agent,
    action: &Action,
    policies: &[Policy],
    use_thinking: bool,
) -> EvaluationOutcome {
    let request = ValidateRequest::new(agent, action, policies, use_thinking);

    match client.post::<_, Value>(VALIDATE_ENDPOINT, &request).await {
        Ok(body) => {
            let evaluation = decode_evaluation(&action.id, &body);
            debug!(
                action_id = %action.id,
                decision = %evaluation.decision,
                risk_score = evaluation.risk_score,
                "action evaluated"
            );
            Ok(evaluation)
        }
        Err(e) => {
            warn!(action_id = %action.id, agent_id = %agent.id, error = %e, "evaluation degraded");
            Err(Degraded {
                cause: e.to_string(),
                evaluation: ActionEvaluation::offline(&action.id, OFFLINE_REASON),
            })
        }
    }
}

/// `EvaluationGateway` backed by the HTTP API.
#[derive(Debug, Clone)]
pub struct HttpEvaluationGateway {
    client: ApiClient,
}

impl HttpEvaluationGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EvaluationGateway for HttpEvaluationGateway {
    async fn evaluate(
        &self,
        agent: &Agent,
        action: &Action,
        policies: &[Policy],
        use_thinking: bool,
    ) -> EvaluationOutcome {
        evaluate_action_with_policies(&self.client, agent, action, policies, use_thinking).await
    }
}
