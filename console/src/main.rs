//! VEIL governance console.
//!
//! Manages agents and policies on a governance backend, submits actions for
//! evaluation, reviews the audit log, and replays the canned demo scenarios.
//! When the backend is unreachable or the session has expired, read commands
//! fall back to demo data.
//!
//! Usage:
//!   veil login ops --password secret
//!   veil agents list
//!   veil evaluate agent-demo-finance "Wire $20k to vendor 88"
//!   veil scenario scenario-unsafe
//!   veil simulate

mod render;

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use veil_audit::AuditLog;
use veil_contracts::{
    agent::{AgentUpdate, ThinkingConfig},
    audit::{Resolution, ResolutionStatus},
    error::{VeilError, VeilResult},
    evaluation::Renderable,
    policy::NewPolicy,
};
use veil_client::{
    evaluate_action_with_policies, spawn_insights_poller, ApiClient, ClientConfig,
    HttpEvaluationGateway, Session,
};
use veil_core::{
    agent_trust_status,
    builders::{
        create_audit_log_entry, register_agent, submit_image_action, submit_text_action,
        AgentRegistration,
    },
    calculate_dashboard_metrics,
    scheduler::TokioScheduler,
    traits::AuditSink,
    Workspace,
};
use veil_demo::{load_or_fallback, DataSource, DemoDriver, LoadedData, SCENARIOS};

// ── CLI definition ────────────────────────────────────────────────────────────

/// VEIL: governance console for autonomous agents.
#[derive(Parser)]
#[command(
    name = "veil",
    about = "VEIL agent governance console",
    long_about = "Register agents and policies, evaluate agent actions against policy,\n\
                  review the audit trail, and replay demo scenarios."
)]
struct Cli {
    /// TOML client configuration file.
    #[arg(long, global = true, env = "VEIL_CONFIG")]
    config: Option<PathBuf>,

    /// Backend origin, overriding the configuration file.
    #[arg(long, global = true, env = "VEIL_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session token.
    Login {
        username: String,
        #[arg(long, env = "VEIL_PASSWORD")]
        password: String,
    },
    /// Create an account and store the session token.
    Register {
        name: String,
        email: String,
        #[arg(long, env = "VEIL_PASSWORD")]
        password: String,
    },
    /// Forget the stored session token.
    Logout,
    /// Switch to demo data without contacting the backend.
    DemoLogin,
    /// Manage registered agents.
    #[command(subcommand)]
    Agents(AgentsCommand),
    /// Manage governance policies.
    #[command(subcommand)]
    Policies(PoliciesCommand),
    /// Submit an action for evaluation.
    Evaluate(EvaluateArgs),
    /// Show the audit log, most recent first.
    Logs {
        /// Only entries for this agent.
        #[arg(long)]
        agent: Option<String>,
    },
    /// Record a human resolution on an audit entry.
    Resolve {
        entry_id: String,
        #[arg(long, value_enum)]
        status: ResolutionArg,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long, env = "USER", default_value = "console")]
        resolver: String,
    },
    /// Dashboard metrics and per-agent trust status.
    Metrics,
    /// Show backend system insights.
    Insights {
        /// Keep polling and print every update.
        #[arg(long)]
        watch: bool,
    },
    /// Replay one demo scenario through the evaluation path.
    Scenario {
        /// Scenario id; omit to list scenarios.
        id: Option<String>,
        #[arg(long)]
        thinking: bool,
    },
    /// Play every demo scenario on the simulation timeline.
    Simulate {
        #[arg(long)]
        thinking: bool,
    },
}

#[derive(Subcommand)]
enum AgentsCommand {
    List,
    Register {
        name: String,
        #[arg(long, default_value = "")]
        purpose: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Capability granted to the agent (repeatable).
        #[arg(long = "capability")]
        capabilities: Vec<String>,
        /// Policy bound to the agent (repeatable).
        #[arg(long = "policy")]
        policies: Vec<String>,
        /// Extended-reasoning token budget.
        #[arg(long)]
        thinking_budget: Option<u32>,
    },
    /// Replace an agent's name, purpose and policy bindings.
    Update {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        purpose: String,
        #[arg(long = "policy")]
        policies: Vec<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum PoliciesCommand {
    List,
    Create {
        name: String,
        /// The rule in plain language.
        text: String,
    },
    /// Preview the structured rules a natural-language policy compiles to.
    Convert {
        text: String,
    },
    Delete {
        id: String,
    },
    /// Delete every policy.
    Clear,
}

#[derive(Args)]
struct EvaluateArgs {
    agent_id: String,
    /// Text action content.
    #[arg(required_unless_present = "image")]
    text: Option<String>,
    /// Image file to submit instead of text.
    #[arg(long, conflicts_with = "text")]
    image: Option<PathBuf>,
    /// MIME type of the image; guessed from the extension when omitted.
    #[arg(long, requires = "image")]
    mime: Option<String>,
    /// Request extended reasoning.
    #[arg(long)]
    thinking: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ResolutionArg {
    Overridden,
    ConfirmedBlock,
    Reviewed,
}

impl From<ResolutionArg> for ResolutionStatus {
    fn from(arg: ResolutionArg) -> Self {
        match arg {
            ResolutionArg::Overridden => ResolutionStatus::Overridden,
            ResolutionArg::ConfirmedBlock => ResolutionStatus::ConfirmedBlock,
            ResolutionArg::Reviewed => ResolutionStatus::Reviewed,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        match e {
            VeilError::Unauthorized => {
                eprintln!("Session expired or not logged in. Run `veil login` first.")
            }
            VeilError::DemoMode => {
                eprintln!("Demo mode is active. Run `veil logout` to use the backend.")
            }
            e => eprintln!("Error: {}", e),
        }
        std::process::exit(1);
    }
}

// ── Setup ─────────────────────────────────────────────────────────────────────

fn load_config(cli: &Cli) -> VeilResult<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &cli.api_url {
        config.base_url = url.clone();
    }
    if config.token_path.is_none() {
        config.token_path =
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".veil_token"));
    }
    config.validate()?;
    Ok(config)
}

fn open_session(config: &ClientConfig) -> VeilResult<Session> {
    match &config.token_path {
        Some(path) => Session::persistent(path),
        None => Ok(Session::in_memory()),
    }
}

fn report_source(data: &LoadedData) {
    if let DataSource::Demo { reason } = &data.source {
        println!("(demo data: {})", reason);
        println!();
    }
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

async fn run(cli: Cli) -> VeilResult<()> {
    let config = load_config(&cli)?;
    let session = open_session(&config)?;
    let client = ApiClient::new(&config, session)?;
    debug!(api = %config.api_base(), "client ready");

    match cli.command {
        Command::Login { username, password } => {
            let auth = client.login(&username, &password).await?;
            println!(
                "Logged in as {} ({})",
                username,
                auth.role.as_deref().unwrap_or("user")
            );
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            client.register_account(&name, &email, &password).await?;
            println!("Account created for {}", email);
        }
        Command::Logout => {
            client.logout();
            println!("Logged out.");
        }
        Command::DemoLogin => {
            client.session().enter_demo()?;
            println!("Demo mode enabled. Backend calls are disabled until `veil logout`.");
        }
        Command::Agents(cmd) => agents(&client, cmd).await?,
        Command::Policies(cmd) => policies(&client, cmd).await?,
        Command::Evaluate(args) => evaluate(&client, args).await?,
        Command::Logs { agent } => logs(&client, agent.as_deref()).await,
        Command::Resolve {
            entry_id,
            status,
            notes,
            resolver,
        } => {
            let resolution = Resolution::new(status.into(), notes, resolver)?;
            client.resolve_log(&entry_id, &resolution).await?;
            println!("{}", resolution_confirmation(&entry_id, &resolution));
        }
        Command::Metrics => metrics(&client).await,
        Command::Insights { watch } => insights(&client, &config, watch).await?,
        Command::Scenario { id, thinking } => match id {
            Some(id) => scenario(&client, &id, thinking).await?,
            None => list_scenarios(),
        },
        Command::Simulate { thinking } => simulate(&client, thinking).await?,
    }
    Ok(())
}

fn resolution_confirmation(entry_id: &str, resolution: &Resolution) -> String {
    format!("Entry {} marked {}", entry_id, resolution.status)
}

// ── Agents & policies ─────────────────────────────────────────────────────────

async fn agents(client: &ApiClient, cmd: AgentsCommand) -> VeilResult<()> {
    match cmd {
        AgentsCommand::List => {
            let data = load_or_fallback(client).await;
            report_source(&data);
            println!("Agents ({}):", data.agents.len());
            for agent in &data.agents {
                render::agent_line(agent, agent_trust_status(&agent.id, &data.logs));
            }
        }
        AgentsCommand::Register {
            name,
            purpose,
            description,
            capabilities,
            policies,
            thinking_budget,
        } => {
            let thinking_config = thinking_budget.map(ThinkingConfig::new).transpose()?;
            let agent = register_agent(AgentRegistration {
                name,
                purpose,
                description,
                allowed_capabilities: capabilities,
                policy_ids: (!policies.is_empty()).then_some(policies),
                thinking_config,
            });
            let created = client.create_agent(&agent).await?;
            println!("Registered agent {} ({} risk)", created.id, created.risk_level);
        }
        AgentsCommand::Update {
            id,
            name,
            purpose,
            policies,
        } => {
            let update = AgentUpdate {
                name,
                purpose,
                policy_ids: (!policies.is_empty()).then_some(policies),
            };
            let updated = client.update_agent(&id, &update).await?;
            println!("Updated agent {}", updated.id);
        }
        AgentsCommand::Delete { id } => {
            client.delete_agent(&id).await?;
            println!("Deleted agent {}", id);
        }
    }
    Ok(())
}

async fn policies(client: &ApiClient, cmd: PoliciesCommand) -> VeilResult<()> {
    match cmd {
        PoliciesCommand::List => {
            let data = load_or_fallback(client).await;
            report_source(&data);
            println!("Policies ({}):", data.policies.len());
            for policy in &data.policies {
                render::policy_line(policy);
            }
        }
        PoliciesCommand::Create { name, text } => {
            let policy = client
                .create_policy(&NewPolicy {
                    name,
                    natural_language: text,
                })
                .await?;
            println!("Created policy {}", policy.id);
            if let Some(rules) = &policy.structured_rules {
                render::structured_rules(rules);
            }
        }
        PoliciesCommand::Convert { text } => {
            let rules = client.convert_policy(&text).await?;
            println!("Structured rules ({}):", rules.rules.len());
            render::structured_rules(&rules);
        }
        PoliciesCommand::Delete { id } => {
            client.delete_policy(&id).await?;
            println!("Deleted policy {}", id);
        }
        PoliciesCommand::Clear => {
            let count = client.clear_policies().await?;
            println!("Deleted {} policies", count);
        }
    }
    Ok(())
}

// ── Evaluation & audit ────────────────────────────────────────────────────────

fn guess_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

async fn evaluate(client: &ApiClient, args: EvaluateArgs) -> VeilResult<()> {
    let data = load_or_fallback(client).await;
    report_source(&data);
    let agent = data
        .agents
        .iter()
        .find(|a| a.id == args.agent_id)
        .ok_or_else(|| VeilError::Validation {
            reason: format!("agent '{}' is not registered", args.agent_id),
        })?;

    let action = match (&args.image, &args.text) {
        (Some(path), _) => {
            let bytes = std::fs::read(path)?;
            let mime = args.mime.as_deref().unwrap_or_else(|| guess_mime(path));
            submit_image_action(&agent.id, STANDARD.encode(bytes), mime)
        }
        (None, Some(text)) => submit_text_action(&agent.id, text.as_str()),
        (None, None) => {
            return Err(VeilError::Validation {
                reason: "nothing to evaluate: pass text or --image".to_string(),
            })
        }
    };

    let outcome =
        evaluate_action_with_policies(client, agent, &action, &data.policies, args.thinking)
            .await;
    let entry = create_audit_log_entry(agent, action, outcome.renderable());

    println!("Evaluation of {} for {}:", entry.action.id, agent.name);
    render::evaluation(&entry.evaluation);
    Ok(())
}

async fn logs(client: &ApiClient, agent: Option<&str>) {
    let data = load_or_fallback(client).await;
    report_source(&data);
    let entries: Vec<_> = data
        .logs
        .iter()
        .filter(|e| agent.map_or(true, |id| e.agent_id == id))
        .collect();
    println!("Audit log ({} entries):", entries.len());
    for entry in entries {
        render::log_line(entry);
    }
}

async fn metrics(client: &ApiClient) {
    let data = load_or_fallback(client).await;
    report_source(&data);

    println!("Dashboard:");
    render::metrics(&calculate_dashboard_metrics(&data.logs));
    match client.stats().await {
        Ok(stats) => render::stats(&stats),
        Err(e) => warn!(error = %e, "backend stats unavailable"),
    }

    println!();
    println!("Trust:");
    for agent in &data.agents {
        println!(
            "  {:<24} {}",
            agent.name,
            agent_trust_status(&agent.id, &data.logs)
        );
    }
}

async fn insights(client: &ApiClient, config: &ClientConfig, watch: bool) -> VeilResult<()> {
    if !watch {
        render::insights(&client.insights().await?);
        return Ok(());
    }

    let poller = spawn_insights_poller(client.clone(), config.insights_interval());
    let mut updates = poller.subscribe();
    println!(
        "Polling insights every {}s. Press Ctrl-C to stop.",
        config.insights_interval_secs
    );
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = updates.borrow_and_update().clone();
                if let Some(latest) = latest {
                    println!();
                    render::insights(&latest);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    poller.stop();
    Ok(())
}

// ── Demo ──────────────────────────────────────────────────────────────────────

fn list_scenarios() {
    println!("Scenarios:");
    for s in SCENARIOS {
        println!("  {:<22} {:<28} agent={}", s.id, s.title, s.agent_id);
    }
}

/// Build a driver over freshly loaded data.
async fn demo_driver(client: &ApiClient, thinking: bool) -> VeilResult<(DemoDriver, AuditLog)> {
    let data = load_or_fallback(client).await;
    report_source(&data);

    let mut workspace = Workspace::new();
    let audit = AuditLog::new();
    data.apply(&mut workspace, &audit)?;

    let driver = DemoDriver::new(
        Arc::new(Mutex::new(workspace)),
        Arc::new(audit.clone()),
        Arc::new(HttpEvaluationGateway::new(client.clone())),
        Arc::new(TokioScheduler),
    )
    .with_thinking(thinking);
    Ok((driver, audit))
}

async fn scenario(client: &ApiClient, scenario_id: &str, thinking: bool) -> VeilResult<()> {
    let (driver, _) = demo_driver(client, thinking).await?;
    let entry = driver.replay(scenario_id).await?;
    println!("Scenario {} ({}):", scenario_id, entry.agent_id);
    println!("  action: {}", entry.action.raw_input);
    render::evaluation(&entry.evaluation);
    Ok(())
}

async fn simulate(client: &ApiClient, thinking: bool) -> VeilResult<()> {
    let (driver, audit) = demo_driver(client, thinking).await?;

    let canceller = driver.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    println!("Running simulation. Press Ctrl-C to stop.");
    let report = driver.run_simulation().await;
    watcher.abort();
    let report = report?;

    if report.cancelled {
        println!("Simulation cancelled after {} scenarios.", report.scenarios_started);
    } else {
        println!("Simulation complete: {} scenarios.", report.scenarios_started);
    }
    for entry in audit.entries() {
        render::log_line(&entry);
    }
    println!();
    render::metrics(&calculate_dashboard_metrics(&audit.entries()));
    println!(
        "  audit chain: {}",
        if audit.verify_integrity() { "intact" } else { "BROKEN" }
    );
    Ok(())
}
