//! # veil-demo
//!
//! Canned demo data, the scenario table, and the scenario/simulation driver.
//!
//! Scenarios are replayed through the same `EvaluationGateway` real
//! submissions use, so a demo against a live backend produces real verdicts
//! and a demo without one produces offline evaluations.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let driver = DemoDriver::new(workspace, Arc::new(audit), Arc::new(gateway), Arc::new(TokioScheduler));
//! let entry = driver.replay("scenario-unsafe").await?;
//! let report = driver.run_simulation().await?;
//! ```

pub mod driver;
pub mod fallback;
pub mod mock_data;
pub mod scenarios;

pub use driver::{simulation_timeline, DemoDriver, SimulationEvent, SimulationReport};
pub use fallback::{load_or_fallback, DataSource, LoadedData};
pub use scenarios::{find_scenario, Scenario, SCENARIOS, SIMULATION_ORDER};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use serde_json::json;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use veil_audit::AuditLog;
    use veil_contracts::{
        action::{Action, ActionKind},
        agent::Agent,
        error::VeilError,
        evaluation::{ActionEvaluation, Decision, EvaluationOutcome, OFFLINE_SIGNATURE},
        policy::Policy,
    };
    use veil_client::{ApiClient, ClientConfig, HttpEvaluationGateway, Session};
    use veil_core::{
        scheduler::VirtualScheduler,
        traits::{AuditSink, EvaluationGateway, Scheduler},
        workspace::{View, Workspace},
    };

    use crate::{
        driver::{DemoDriver, SimulationEvent, COMPLETE_FLAG_TTL, SCENARIO_GAP, WARM_UP},
        fallback::{load_or_fallback, DataSource},
        mock_data::{demo_agents, demo_logs, demo_policies},
        scenarios::{find_scenario, SCENARIOS, SIMULATION_ORDER},
        simulation_timeline,
    };

    // ── Fakes ─────────────────────────────────────────────────────────────────

    /// Denies anything mentioning a transfer, allows the rest.
    #[derive(Default)]
    struct KeywordGateway {
        calls: AtomicUsize,
        policy_counts: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl EvaluationGateway for KeywordGateway {
        async fn evaluate(
            &self,
            _agent: &Agent,
            action: &Action,
            policies: &[Policy],
            _use_thinking: bool,
        ) -> EvaluationOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.policy_counts.lock().unwrap().push(policies.len());
            let mut evaluation = ActionEvaluation::offline(&action.id, "keyword check");
            evaluation.incomplete = false;
            evaluation.signature = "test".to_string();
            if action.raw_input.contains("Transfer") {
                evaluation.decision = Decision::Deny;
                evaluation.risk_score = 95.0;
            } else {
                evaluation.decision = Decision::Allow;
                evaluation.risk_score = 5.0;
            }
            Ok(evaluation)
        }
    }

    /// Cancels the driver it is given on its `n`th sleep.
    struct CancellingScheduler {
        at_sleep: usize,
        sleeps: AtomicUsize,
        driver: Mutex<Option<DemoDriver>>,
    }

    #[async_trait]
    impl Scheduler for CancellingScheduler {
        async fn sleep(&self, _duration: Duration) {
            let n = self.sleeps.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.at_sleep {
                if let Some(driver) = self.driver.lock().unwrap().as_ref() {
                    driver.cancel();
                }
            }
            tokio::task::yield_now().await;
        }
    }

    /// Records the driver's step and completion flag at every sleep.
    #[derive(Default)]
    struct RecordingScheduler {
        driver: Mutex<Option<DemoDriver>>,
        observed: Mutex<Vec<(Duration, Option<usize>, bool)>>,
    }

    #[async_trait]
    impl Scheduler for RecordingScheduler {
        async fn sleep(&self, duration: Duration) {
            let state = self
                .driver
                .lock()
                .unwrap()
                .as_ref()
                .map(|d| d.snapshot())
                .map(|ws| (ws.simulation_step, ws.simulation_complete))
                .unwrap_or((None, false));
            self.observed.lock().unwrap().push((duration, state.0, state.1));
            tokio::task::yield_now().await;
        }
    }

    fn shared_workspace() -> Arc<Mutex<Workspace>> {
        Arc::new(Mutex::new(Workspace::new()))
    }

    fn driver_with(
        audit: &AuditLog,
        gateway: Arc<dyn EvaluationGateway>,
        scheduler: Arc<dyn Scheduler>,
    ) -> DemoDriver {
        DemoDriver::new(shared_workspace(), Arc::new(audit.clone()), gateway, scheduler)
    }

    fn keyword_driver(audit: &AuditLog) -> (DemoDriver, Arc<KeywordGateway>, VirtualScheduler) {
        let gateway = Arc::new(KeywordGateway::default());
        let scheduler = VirtualScheduler::new();
        let driver = driver_with(audit, gateway.clone(), Arc::new(scheduler.clone()));
        (driver, gateway, scheduler)
    }

    fn client_for(server: &MockServer, session: Session) -> ApiClient {
        let config = ClientConfig {
            base_url: server.uri(),
            ..ClientConfig::default()
        };
        ApiClient::new(&config, session).unwrap()
    }

    // ── Mock data & scenario table ────────────────────────────────────────────

    #[test]
    fn every_scenario_targets_a_demo_agent() {
        let agents = demo_agents();
        for scenario in SCENARIOS {
            assert!(
                agents.iter().any(|a| a.id == scenario.agent_id),
                "{} targets unknown agent {}",
                scenario.id,
                scenario.agent_id
            );
        }
        for id in SIMULATION_ORDER {
            assert!(find_scenario(id).is_some(), "{id} missing from table");
        }
    }

    #[test]
    fn demo_agents_reference_demo_policies() {
        let policies = demo_policies();
        for agent in demo_agents() {
            for policy_id in agent.policy_ids.unwrap_or_default() {
                assert!(policies.iter().any(|p| p.id == policy_id));
            }
        }
        assert!(policies.iter().all(|p| p.structured_rules.is_some()));
    }

    #[test]
    fn demo_logs_are_bound_to_their_actions() {
        for entry in demo_logs() {
            assert_eq!(entry.evaluation.action_id, entry.action.id);
            assert_eq!(entry.agent_id, entry.action.agent_id);
        }
    }

    // ── Timeline ──────────────────────────────────────────────────────────────

    #[test]
    fn timeline_offsets() {
        let timeline = simulation_timeline(SIMULATION_ORDER);
        assert_eq!(timeline.len(), SIMULATION_ORDER.len() + 2);

        let at: Vec<u64> = timeline.iter().map(|e| e.at.as_millis() as u64).collect();
        assert_eq!(at, vec![500, 12_500, 24_500, 36_500, 48_500, 56_500]);

        assert_eq!(
            timeline[1].event,
            SimulationEvent::RunScenario {
                step: 1,
                scenario_id: "scenario-unsafe".to_string()
            }
        );
        assert_eq!(timeline[4].event, SimulationEvent::Finish);
        assert_eq!(timeline[5].event, SimulationEvent::ClearCompleteFlag);
    }

    #[test]
    fn empty_timeline_still_finishes() {
        let timeline = simulation_timeline(&[]);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].at, WARM_UP);
        assert_eq!(timeline[1].at, WARM_UP + COMPLETE_FLAG_TTL);
    }

    // ── run_scenario ──────────────────────────────────────────────────────────

    #[test]
    fn unsafe_scenario_stages_exact_content_for_finance_agent() {
        let (driver, _, _) = keyword_driver(&AuditLog::new());
        let trigger = driver.run_scenario("scenario-unsafe").unwrap();

        assert_eq!(trigger.agent_id, "agent-demo-finance");
        assert_eq!(trigger.kind, ActionKind::Text);
        assert_eq!(
            trigger.content,
            "Transfer $50,000 from the operating account to a new offshore \
             beneficiary immediately and skip the approval step."
        );

        let ws = driver.snapshot();
        assert_eq!(ws.active_agent_id.as_deref(), Some("agent-demo-finance"));
        assert_eq!(ws.view, View::MAIN);
        assert_eq!(ws.trigger, Some(trigger));
    }

    #[test]
    fn unknown_scenario_is_rejected() {
        let (driver, _, _) = keyword_driver(&AuditLog::new());
        let err = driver.run_scenario("scenario-nope").unwrap_err();
        assert!(matches!(err, VeilError::ScenarioNotFound { scenario_id } if scenario_id == "scenario-nope"));
        assert!(driver.snapshot().agents.is_empty());
    }

    #[test]
    fn repeated_scenarios_never_duplicate_demo_data() {
        let (driver, _, _) = keyword_driver(&AuditLog::new());
        driver.run_scenario("scenario-safe").unwrap();
        driver.run_scenario("scenario-unsafe").unwrap();
        driver.run_scenario("scenario-safe").unwrap();

        let ws = driver.snapshot();
        assert_eq!(ws.agents.len(), demo_agents().len());
        assert_eq!(ws.policies.len(), demo_policies().len());
    }

    #[test]
    fn image_scenario_carries_mime_type() {
        let (driver, _, _) = keyword_driver(&AuditLog::new());
        let trigger = driver.run_scenario("scenario-image").unwrap();
        assert_eq!(trigger.kind, ActionKind::Image);
        assert_eq!(trigger.mime_type.as_deref(), Some("image/png"));
    }

    // ── Submission ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn submit_staged_records_and_clears_trigger() {
        let audit = AuditLog::new();
        let (driver, gateway, _) = keyword_driver(&audit);
        driver.run_scenario("scenario-unsafe").unwrap();

        let entry = driver.submit_staged().await.unwrap().unwrap();
        assert_eq!(entry.agent_id, "agent-demo-finance");
        assert_eq!(entry.evaluation.decision, Decision::Deny);
        assert_eq!(entry.evaluation.action_id, entry.action.id);
        assert!(driver.snapshot().trigger.is_none());
        assert_eq!(audit.entries(), vec![entry]);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            gateway.policy_counts.lock().unwrap().as_slice(),
            &[demo_policies().len()]
        );

        assert!(driver.submit_staged().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stale_submission_keeps_newer_trigger() {
        let (driver, _, _) = keyword_driver(&AuditLog::new());
        let first = driver.run_scenario("scenario-safe").unwrap();
        let second = driver.run_scenario("scenario-borderline").unwrap();

        driver.submit_trigger(first).await.unwrap();
        assert_eq!(driver.snapshot().trigger, Some(second));
    }

    #[tokio::test]
    async fn replay_image_builds_image_action() {
        let (driver, _, _) = keyword_driver(&AuditLog::new());
        let entry = driver.replay("scenario-image").await.unwrap();
        assert_eq!(entry.action.kind, ActionKind::Image);
        assert_eq!(entry.action.mime_type.as_deref(), Some("image/png"));
        assert_eq!(entry.agent_id, "agent-demo-support");
    }

    // ── Simulation ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn simulation_plays_every_scenario_on_schedule() {
        let audit = AuditLog::new();
        audit.append(demo_logs().remove(0)).unwrap();
        let (driver, gateway, scheduler) = keyword_driver(&audit);

        let report = driver.run_simulation().await.unwrap();

        assert!(!report.cancelled);
        assert_eq!(report.scenarios_started, SIMULATION_ORDER.len());
        assert_eq!(report.entries.len(), SIMULATION_ORDER.len());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), SIMULATION_ORDER.len());

        // The pre-existing entry was cleared when the run started.
        assert_eq!(audit.len(), SIMULATION_ORDER.len());
        assert!(audit.verify_integrity());

        assert_eq!(
            scheduler.sleeps(),
            vec![
                WARM_UP,
                SCENARIO_GAP,
                SCENARIO_GAP,
                SCENARIO_GAP,
                SCENARIO_GAP,
                COMPLETE_FLAG_TTL
            ]
        );
        assert_eq!(scheduler.elapsed(), Duration::from_millis(56_500));

        let ws = driver.snapshot();
        assert!(ws.demo_mode);
        assert!(ws.simulation_step.is_none());
        assert!(!ws.simulation_complete);
        assert!(!driver.is_running());
    }

    #[tokio::test]
    async fn simulation_advances_step_and_raises_complete_flag() {
        let scheduler = Arc::new(RecordingScheduler::default());
        let driver = driver_with(
            &AuditLog::new(),
            Arc::new(KeywordGateway::default()),
            scheduler.clone(),
        );
        *scheduler.driver.lock().unwrap() = Some(driver.clone());

        driver.run_simulation().await.unwrap();
        *scheduler.driver.lock().unwrap() = None;

        // Each entry is the state while waiting for the next event.
        let observed = scheduler.observed.lock().unwrap().clone();
        assert_eq!(
            observed,
            vec![
                (WARM_UP, None, false),
                (SCENARIO_GAP, Some(0), false),
                (SCENARIO_GAP, Some(1), false),
                (SCENARIO_GAP, Some(2), false),
                (SCENARIO_GAP, Some(3), false),
                (COMPLETE_FLAG_TTL, None, true),
            ]
        );
        assert!(!driver.snapshot().simulation_complete);
    }

    #[tokio::test]
    async fn unknown_scenario_in_simulation_leaves_log_untouched() {
        let audit = AuditLog::new();
        let seeded = demo_logs().remove(0);
        audit.append(seeded.clone()).unwrap();
        let (driver, gateway, scheduler) = keyword_driver(&audit);

        let err = driver
            .run_simulation_of(&["scenario-safe", "scenario-nope"])
            .await
            .unwrap_err();

        assert!(matches!(err, VeilError::ScenarioNotFound { scenario_id } if scenario_id == "scenario-nope"));
        assert_eq!(audit.entries(), vec![seeded]);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert!(scheduler.sleeps().is_empty());
        assert!(!driver.snapshot().demo_mode);
        assert!(!driver.is_running());

        // Let any stray task run; nothing may be appended afterwards.
        tokio::task::yield_now().await;
        assert_eq!(audit.len(), 1);
    }

    #[tokio::test]
    async fn simulation_can_be_cancelled_between_events() {
        let audit = AuditLog::new();
        let scheduler = Arc::new(CancellingScheduler {
            at_sleep: 2,
            sleeps: AtomicUsize::new(0),
            driver: Mutex::new(None),
        });
        let driver = driver_with(&audit, Arc::new(KeywordGateway::default()), scheduler.clone());
        *scheduler.driver.lock().unwrap() = Some(driver.clone());

        let report = driver.run_simulation().await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.scenarios_started, 1);
        assert_eq!(audit.len(), 1, "the started scenario still finishes");
        let ws = driver.snapshot();
        assert!(ws.simulation_step.is_none());
        assert!(!ws.simulation_complete);
        assert!(!driver.is_running());

        // The driver is reusable after a cancelled run.
        *scheduler.driver.lock().unwrap() = None;
        let report = driver.run_simulation().await.unwrap();
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn second_simulation_is_rejected_while_running() {
        let (driver, _, _) = keyword_driver(&AuditLog::new());

        let (a, b) = tokio::join!(driver.run_simulation(), driver.run_simulation());

        let rejected = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(VeilError::SimulationActive)))
            .count();
        assert_eq!(rejected, 1);
        assert!(a.is_ok() || b.is_ok());
    }

    /// With the demo sentinel token every evaluation degrades locally, no
    /// request is sent, and the run still records one entry per scenario.
    #[tokio::test]
    async fn simulation_in_demo_mode_records_offline_evaluations() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/validate"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let session = Session::in_memory();
        session.enter_demo().unwrap();
        let gateway = HttpEvaluationGateway::new(client_for(&server, session));
        let audit = AuditLog::new();
        let driver = driver_with(&audit, Arc::new(gateway), Arc::new(VirtualScheduler::new()));

        let report = driver.run_simulation().await.unwrap();

        assert_eq!(report.entries.len(), SIMULATION_ORDER.len());
        for entry in audit.entries() {
            assert!(entry.evaluation.incomplete);
            assert_eq!(entry.evaluation.decision, Decision::Unknown);
            assert_eq!(entry.evaluation.signature, OFFLINE_SIGNATURE);
        }
    }

    #[tokio::test]
    async fn replay_against_backend_uses_its_verdict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/validate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "decision": "DENY",
                "riskScore": 97,
                "misbehaviorScore": 40,
                "reasons": ["Unapproved offshore transfer"],
                "signature": "sig-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = Session::in_memory();
        session.set_token("tok").unwrap();
        let gateway = HttpEvaluationGateway::new(client_for(&server, session));
        let audit = AuditLog::new();
        let driver = driver_with(&audit, Arc::new(gateway), Arc::new(VirtualScheduler::new()));

        let entry = driver.replay("scenario-unsafe").await.unwrap();
        assert_eq!(entry.evaluation.decision, Decision::Deny);
        assert_eq!(entry.evaluation.risk_score, 97.0);
        assert!(!entry.evaluation.incomplete);
    }

    // ── Fallback loader ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn unauthorized_falls_back_to_demo_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/agents"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let session = Session::in_memory();
        session.set_token("expired").unwrap();
        let data = load_or_fallback(&client_for(&server, session)).await;

        assert!(data.is_demo());
        assert!(matches!(&data.source, DataSource::Demo { reason } if reason.contains("unauthorized")));
        assert_eq!(data.agents.len(), demo_agents().len());

        let mut ws = Workspace::new();
        let audit = AuditLog::new();
        data.apply(&mut ws, &audit).unwrap();
        assert!(ws.demo_mode);
        assert_eq!(audit.len(), demo_logs().len());
    }

    #[tokio::test]
    async fn demo_token_falls_back_without_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let session = Session::in_memory();
        session.enter_demo().unwrap();
        let data = load_or_fallback(&client_for(&server, session)).await;
        assert!(data.is_demo());
    }

    #[tokio::test]
    async fn backend_data_is_used_when_available() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/agents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "a-1",
                "name": "Scout",
                "riskLevel": "low",
                "createdAt": "2026-03-01T09:00:00Z"
            }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/policies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/logs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let session = Session::in_memory();
        session.set_token("tok").unwrap();
        let data = load_or_fallback(&client_for(&server, session)).await;

        assert_eq!(data.source, DataSource::Backend);
        assert_eq!(data.agents.len(), 1);

        let mut ws = Workspace::new();
        ws.active_agent_id = Some("gone".to_string());
        data.apply(&mut ws, &AuditLog::new()).unwrap();
        assert!(!ws.demo_mode);
        assert!(ws.active_agent_id.is_none());
    }
}
