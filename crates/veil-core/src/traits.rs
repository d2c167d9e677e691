//! Seam traits between the pure core and its I/O-bound collaborators.
//!
//! - `EvaluationGateway`: submits an action to whatever produces verdicts
//! - `AuditSink`:         append-only store of evaluated actions
//! - `Scheduler`:         the only source of delay in the demo driver
//!
//! Production implementations live in veil-client, veil-audit and
//! `scheduler::TokioScheduler`. Tests substitute in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;

use veil_contracts::{
    action::Action,
    agent::Agent,
    audit::AuditLogEntry,
    error::VeilResult,
    evaluation::EvaluationOutcome,
    policy::Policy,
};

/// Sends an action and the policy set to an evaluator.
///
/// Implementations must not fail: any transport or backend problem is
/// reported as `Err(Degraded)`, which still carries a renderable evaluation.
#[async_trait]
pub trait EvaluationGateway: Send + Sync {
    async fn evaluate(
        &self,
        agent: &Agent,
        action: &Action,
        policies: &[Policy],
        use_thinking: bool,
    ) -> EvaluationOutcome;
}

/// Append-only store of audit entries, most recent first.
pub trait AuditSink: Send + Sync {
    /// Record one entry. Entries are never modified except to attach a
    /// resolution.
    fn append(&self, entry: AuditLogEntry) -> VeilResult<()>;

    /// Drop every entry. Used when a simulation run starts.
    fn clear(&self);

    /// Snapshot of all entries, most recent first.
    fn entries(&self) -> Vec<AuditLogEntry>;
}

/// Source of delay for timed sequences.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Suspend the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}
