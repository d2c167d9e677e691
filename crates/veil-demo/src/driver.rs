//! Scenario replay and timed simulation.
//!
//! The driver stages canned actions through the same `EvaluationGateway`
//! real submissions use:
//!
//!   lookup -> merge demo data -> select agent -> stage trigger -> submit -> audit
//!
//! Simulation timing is a precomputed timeline played on a `Scheduler`.
//! Scenario slots are separated by wall-clock delay only: a submission is
//! spawned and the next slot does not wait for it, so two evaluations can be
//! in flight at once when the backend is slow.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};

use chrono::Utc;
use tracing::{debug, info, warn};

use veil_contracts::{
    action::ActionKind,
    audit::AuditLogEntry,
    error::{VeilError, VeilResult},
    evaluation::Renderable,
};
use veil_core::{
    builders::{create_audit_log_entry, submit_image_action, submit_text_action},
    traits::{AuditSink, EvaluationGateway, Scheduler},
    workspace::{ScenarioTrigger, View, Workspace},
};

use crate::{
    mock_data::{demo_agents, demo_policies},
    scenarios::{find_scenario, SIMULATION_ORDER},
};

/// Delay before the first scenario of a simulation.
pub const WARM_UP: Duration = Duration::from_millis(500);

/// Gap between consecutive scenarios.
pub const SCENARIO_GAP: Duration = Duration::from_secs(12);

/// How long the "simulation complete" flag stays raised.
pub const COMPLETE_FLAG_TTL: Duration = Duration::from_secs(8);

// ── Timeline ──────────────────────────────────────────────────────────────────

/// One step of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationEvent {
    /// Stage and submit scenario number `step`.
    RunScenario { step: usize, scenario_id: String },
    /// Clear the step counter and raise the completion flag.
    Finish,
    /// Lower the completion flag.
    ClearCompleteFlag,
}

/// An event and its offset from the start of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub at: Duration,
    pub event: SimulationEvent,
}

/// Build the timeline for `scenario_ids`: scenario `i` at
/// `WARM_UP + i * SCENARIO_GAP`, `Finish` one gap after the last scenario,
/// and `ClearCompleteFlag` `COMPLETE_FLAG_TTL` after that.
pub fn simulation_timeline(scenario_ids: &[&str]) -> Vec<ScheduledEvent> {
    let mut timeline: Vec<ScheduledEvent> = scenario_ids
        .iter()
        .enumerate()
        .map(|(step, id)| ScheduledEvent {
            at: WARM_UP + SCENARIO_GAP * step as u32,
            event: SimulationEvent::RunScenario {
                step,
                scenario_id: id.to_string(),
            },
        })
        .collect();

    let finish_at = WARM_UP + SCENARIO_GAP * scenario_ids.len() as u32;
    timeline.push(ScheduledEvent {
        at: finish_at,
        event: SimulationEvent::Finish,
    });
    timeline.push(ScheduledEvent {
        at: finish_at + COMPLETE_FLAG_TTL,
        event: SimulationEvent::ClearCompleteFlag,
    });
    timeline
}

/// What a simulation run did.
#[derive(Debug, Clone, Default)]
pub struct SimulationReport {
    pub scenarios_started: usize,
    /// Entries recorded by submissions that finished, in completion order.
    pub entries: Vec<AuditLogEntry>,
    pub cancelled: bool,
}

// ── Driver ────────────────────────────────────────────────────────────────────

/// Replays canned scenarios against a shared workspace and audit sink.
///
/// Cloning is cheap; clones drive the same workspace.
#[derive(Clone)]
pub struct DemoDriver {
    workspace: Arc<Mutex<Workspace>>,
    audit: Arc<dyn AuditSink>,
    gateway: Arc<dyn EvaluationGateway>,
    scheduler: Arc<dyn Scheduler>,
    use_thinking: bool,
    running: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
}

impl DemoDriver {
    pub fn new(
        workspace: Arc<Mutex<Workspace>>,
        audit: Arc<dyn AuditSink>,
        gateway: Arc<dyn EvaluationGateway>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            workspace,
            audit,
            gateway,
            scheduler,
            use_thinking: false,
            running: Arc::new(AtomicBool::new(false)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Submit scenario actions in extended-reasoning mode.
    pub fn with_thinking(mut self, use_thinking: bool) -> Self {
        self.use_thinking = use_thinking;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Workspace> {
        match self.workspace.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// A copy of the current workspace state.
    pub fn snapshot(&self) -> Workspace {
        self.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask a running simulation to stop before its next timeline event.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Stage scenario `scenario_id`: merge demo data, select its agent,
    /// navigate to the main view and stage a trigger.
    pub fn run_scenario(&self, scenario_id: &str) -> VeilResult<ScenarioTrigger> {
        let scenario = find_scenario(scenario_id).ok_or_else(|| VeilError::ScenarioNotFound {
            scenario_id: scenario_id.to_string(),
        })?;

        let mut ws = self.lock();
        let agents_added = ws.merge_agents(demo_agents());
        let policies_added = ws.merge_policies(demo_policies());
        ws.set_active_agent(scenario.agent_id)?;
        ws.navigate(View::MAIN);

        let trigger = ScenarioTrigger {
            scenario_id: scenario.id.to_string(),
            agent_id: scenario.agent_id.to_string(),
            kind: scenario.kind,
            content: scenario.content.to_string(),
            mime_type: scenario.mime_type.map(str::to_string),
            triggered_at: Utc::now(),
        };
        ws.stage_trigger(trigger.clone());

        info!(
            scenario_id = %scenario.id,
            agent_id = %scenario.agent_id,
            agents_added,
            policies_added,
            "scenario staged"
        );
        Ok(trigger)
    }

    /// Submit whatever trigger is currently staged, if any.
    pub async fn submit_staged(&self) -> VeilResult<Option<AuditLogEntry>> {
        let staged = self.lock().trigger.clone();
        match staged {
            Some(trigger) => self.submit_trigger(trigger).await.map(Some),
            None => Ok(None),
        }
    }

    /// Build the trigger's action, evaluate it, and record the result.
    ///
    /// The staged trigger is cleared if it is still this one.
    pub async fn submit_trigger(&self, trigger: ScenarioTrigger) -> VeilResult<AuditLogEntry> {
        let (agent, policies) = {
            let mut ws = self.lock();
            if ws.trigger.as_ref() == Some(&trigger) {
                ws.take_trigger();
            }
            let agent = ws
                .agent(&trigger.agent_id)
                .cloned()
                .ok_or_else(|| VeilError::Validation {
                    reason: format!("agent '{}' is not registered", trigger.agent_id),
                })?;
            (agent, ws.policies.clone())
        };

        let action = match trigger.kind {
            ActionKind::Text => submit_text_action(&agent.id, trigger.content.as_str()),
            ActionKind::Image => submit_image_action(
                &agent.id,
                trigger.content.as_str(),
                trigger.mime_type.as_deref().unwrap_or("image/png"),
            ),
        };

        let outcome = self
            .gateway
            .evaluate(&agent, &action, &policies, self.use_thinking)
            .await;
        if let Err(degraded) = &outcome {
            debug!(scenario_id = %trigger.scenario_id, cause = %degraded.cause, "scenario evaluated offline");
        }

        let entry = create_audit_log_entry(&agent, action, outcome.renderable());
        self.audit.append(entry.clone())?;
        info!(
            scenario_id = %trigger.scenario_id,
            decision = %entry.evaluation.decision,
            incomplete = entry.evaluation.incomplete,
            "scenario submitted"
        );
        Ok(entry)
    }

    /// Stage and submit one scenario, waiting for the result.
    pub async fn replay(&self, scenario_id: &str) -> VeilResult<AuditLogEntry> {
        let trigger = self.run_scenario(scenario_id)?;
        self.submit_trigger(trigger).await
    }

    /// Play every scenario in `SIMULATION_ORDER` on the simulation timeline.
    pub async fn run_simulation(&self) -> VeilResult<SimulationReport> {
        self.run_simulation_of(SIMULATION_ORDER).await
    }

    /// Play `scenario_ids` on the simulation timeline.
    ///
    /// Fails with `SimulationActive` if a run is already in progress, and with
    /// `ScenarioNotFound` before touching any state if an id is unknown.
    /// Waits for every spawned submission before returning, including when
    /// the run fails part-way.
    pub async fn run_simulation_of(&self, scenario_ids: &[&str]) -> VeilResult<SimulationReport> {
        if let Some(unknown) = scenario_ids.iter().find(|id| find_scenario(id).is_none()) {
            return Err(VeilError::ScenarioNotFound {
                scenario_id: unknown.to_string(),
            });
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(VeilError::SimulationActive);
        }
        self.cancelled.store(false, Ordering::SeqCst);

        let result = self.play(scenario_ids).await;

        if result.is_err() {
            let mut ws = self.lock();
            ws.simulation_step = None;
            ws.simulation_complete = false;
        }
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn play(&self, scenario_ids: &[&str]) -> VeilResult<SimulationReport> {
        {
            let mut ws = self.lock();
            if !ws.demo_mode {
                info!("enabling demo mode for simulation");
                ws.demo_mode = true;
            }
            ws.simulation_complete = false;
        }
        self.audit.clear();

        let mut report = SimulationReport::default();
        let mut pending = Vec::new();
        let mut elapsed = Duration::ZERO;
        let mut failure = None;

        for scheduled in simulation_timeline(scenario_ids) {
            self.scheduler.sleep(scheduled.at.saturating_sub(elapsed)).await;
            elapsed = scheduled.at;

            if self.cancelled.load(Ordering::SeqCst) {
                warn!(at_ms = elapsed.as_millis() as u64, "simulation cancelled");
                let mut ws = self.lock();
                ws.simulation_step = None;
                ws.simulation_complete = false;
                report.cancelled = true;
                break;
            }

            match scheduled.event {
                SimulationEvent::RunScenario { step, scenario_id } => {
                    self.lock().simulation_step = Some(step);
                    let trigger = match self.run_scenario(&scenario_id) {
                        Ok(trigger) => trigger,
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    };
                    report.scenarios_started += 1;
                    let driver = self.clone();
                    pending.push(tokio::spawn(async move { driver.submit_trigger(trigger).await }));
                }
                SimulationEvent::Finish => {
                    let mut ws = self.lock();
                    ws.simulation_step = None;
                    ws.simulation_complete = true;
                    info!(scenarios = report.scenarios_started, "simulation complete");
                }
                SimulationEvent::ClearCompleteFlag => {
                    self.lock().simulation_complete = false;
                }
            }
        }

        // Submissions already in flight finish before the run returns, even on failure.
        for handle in pending {
            match handle.await {
                Ok(Ok(entry)) => report.entries.push(entry),
                Ok(Err(e)) => warn!(error = %e, "scenario submission failed"),
                Err(e) => warn!(error = %e, "scenario submission task aborted"),
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }
}
