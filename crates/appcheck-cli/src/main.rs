//! appcheck CLI
//!
//! Commands:
//! - `appcheck verify health <app>` - Check pod status and restart counts
//! - `appcheck verify ports <app>` - Check that expected host ports are bound
//! - `appcheck eval golden <app> --dataset <path>` - Score answers against a golden dataset
//! - `appcheck check <app> --dataset <path>` - Run every check in order

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use appcheck_core::context::DEFAULT_TEMPLATE;
use appcheck_core::{
    init_tracing, load_golden, write_eval_results_json, write_health_report_json, AnswerEvaluator,
    CheckArtifact, CheckOutcome, CommandExecutor, EvalConfig, EvalResultsArtifact,
    EvaluationAggregator, ExpectedTopology, HealthReport, HealthReportArtifact, HealthVerifier,
    LlmJudgeClient, LogFormat, PortReport, PortVerifier, RagClient, RunContext, RunSpan,
    HEALTH_CHECK, PORT_CHECK,
};
use appcheck_exec::SystemExecutor;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, Level};

/// Host ports the `rag` template publishes (backend API and chat UI).
const DEFAULT_EXPECTED_PORTS: [u16; 2] = [5000, 3000];

#[derive(Parser)]
#[command(name = "appcheck")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Post-deployment checks and golden-dataset evaluation for RAG applications", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deployment checks against the running application
    Verify {
        #[command(subcommand)]
        action: VerifyAction,
    },

    /// Answer-quality evaluation
    Eval {
        #[command(subcommand)]
        action: EvalAction,
    },

    /// Run health, ports and golden evaluation in order
    Check {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        ports: PortArgs,

        #[command(flatten)]
        eval: EvalArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Subcommand)]
enum VerifyAction {
    /// Every expected pod exists, is healthy and never restarted
    Health {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Every expected host port is bound by a container of the application
    Ports {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        ports: PortArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Subcommand)]
enum EvalAction {
    /// Ask every golden question and have the judge score the answers
    Golden {
        /// Application name (used for run identity)
        application: String,

        #[command(flatten)]
        eval: EvalArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct TargetArgs {
    /// Application name
    application: String,

    /// Template the application was created from
    #[arg(long, default_value = DEFAULT_TEMPLATE)]
    template: String,

    /// Application CLI executable (default: $APPCHECK_APP_CLI or ai-services)
    #[arg(long)]
    app_cli: Option<String>,

    /// Container tool executable (default: $APPCHECK_PODMAN or podman)
    #[arg(long)]
    podman: Option<String>,

    /// Per-command timeout in seconds
    #[arg(long)]
    command_timeout: Option<u64>,

    /// Whole-check timeout in seconds
    #[arg(long)]
    check_timeout: Option<u64>,
}

#[derive(Args, Debug, Clone)]
struct PortArgs {
    /// Expected host port (repeatable or comma separated)
    #[arg(long = "port", value_delimiter = ',', default_values_t = DEFAULT_EXPECTED_PORTS)]
    ports: Vec<u16>,
}

#[derive(Args, Debug, Clone)]
struct EvalArgs {
    /// Golden dataset (CSV or JSON with question and golden_answer columns)
    #[arg(long, env = "APPCHECK_GOLDEN_DATASET")]
    dataset: PathBuf,

    /// Minimum accuracy to pass (default: $RAG_ACCURACY_THRESHOLD or 0.70)
    #[arg(long)]
    threshold: Option<f64>,

    /// Retrieval attempts per question (default: $RAG_MAX_RETRIES or 2)
    #[arg(long)]
    max_retries: Option<u32>,

    /// Judge attempts per answer (default: $RAG_JUDGE_MAX_RETRIES or 2)
    #[arg(long)]
    judge_max_retries: Option<u32>,

    /// Deadline per question in seconds (default: $RAG_CASE_TIMEOUT_SECS or 240)
    #[arg(long)]
    case_timeout: Option<u64>,

    /// Retrieval service base URL (default: $RAG_BASE_URL)
    #[arg(long)]
    rag_url: Option<String>,

    /// Model name sent to the retrieval service
    #[arg(long)]
    rag_model: Option<String>,

    /// Judge service base URL (default: $LLM_JUDGE_BASE_URL)
    #[arg(long)]
    judge_url: Option<String>,

    /// Model name sent to the judge service
    #[arg(long)]
    judge_model: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
struct OutputArgs {
    /// Write JSON artifacts under <dir>/<run_id>/
    #[arg(long, env = "APPCHECK_ARTIFACTS_DIR")]
    artifacts_dir: Option<PathBuf>,

    /// Use this run id instead of a generated one
    #[arg(long)]
    run_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(LogFormat::from_json_flag(cli.json), level);

    let executor = SystemExecutor::new();

    match cli.command {
        Commands::Verify { action } => match action {
            VerifyAction::Health { target, output } => {
                let ctx = target_context(&target, &output);
                let _span = RunSpan::enter(&ctx.run_id);
                log_settings(&ctx, None)?;
                let mut artifact = HealthReportArtifact::new(&ctx.run_id, &ctx.application);
                let outcome = cmd_verify_health(&executor, &ctx).await?;
                artifact.health = Some(CheckArtifact::from_outcome(HEALTH_CHECK, &outcome));
                persist_health_report(output.artifacts_dir.as_deref(), &artifact)?;
                finish_check(HEALTH_CHECK, outcome)
            }
            VerifyAction::Ports {
                target,
                ports,
                output,
            } => {
                let ctx = target_context(&target, &output);
                let _span = RunSpan::enter(&ctx.run_id);
                log_settings(&ctx, None)?;
                let mut artifact = HealthReportArtifact::new(&ctx.run_id, &ctx.application);
                let outcome = cmd_verify_ports(&executor, &ctx, &ports.ports).await?;
                artifact.ports = Some(CheckArtifact::from_outcome(PORT_CHECK, &outcome));
                persist_health_report(output.artifacts_dir.as_deref(), &artifact)?;
                finish_check(PORT_CHECK, outcome)
            }
        },
        Commands::Eval { action } => match action {
            EvalAction::Golden {
                application,
                eval,
                output,
            } => {
                let ctx = eval_context(RunContext::new(application), &eval, &output);
                let _span = RunSpan::enter(&ctx.run_id);
                let config = eval_config(EvalConfig::from_env(), &eval)?;
                log_settings(&ctx, Some(&config))?;
                cmd_eval_golden(&ctx, &config, &eval.dataset, output.artifacts_dir.as_deref())
                    .await
            }
        },
        Commands::Check {
            target,
            ports,
            eval,
            output,
        } => {
            let ctx = eval_context(target_context(&target, &output), &eval, &output);
            let _span = RunSpan::enter(&ctx.run_id);
            let config = eval_config(EvalConfig::from_env(), &eval)?;
            log_settings(&ctx, Some(&config))?;
            cmd_check(
                &executor,
                &ctx,
                &ports.ports,
                &config,
                &eval.dataset,
                output.artifacts_dir.as_deref(),
            )
            .await
        }
    }
}

// ---------------------------------------------------------------------------
// Context and configuration
// ---------------------------------------------------------------------------

fn target_context(target: &TargetArgs, output: &OutputArgs) -> RunContext {
    let mut ctx = RunContext::new(&target.application).with_template(&target.template);
    if let Some(app_cli) = &target.app_cli {
        ctx.tools.app_cli = app_cli.clone();
    }
    if let Some(podman) = &target.podman {
        ctx.tools.podman = podman.clone();
    }
    if let Some(secs) = target.command_timeout {
        ctx.timeouts.command_secs = secs;
    }
    if let Some(secs) = target.check_timeout {
        ctx.timeouts.health_check_secs = secs;
        ctx.timeouts.port_check_secs = secs;
    }
    match &output.run_id {
        Some(run_id) => ctx.with_run_id(run_id),
        None => ctx,
    }
}

fn eval_context(mut ctx: RunContext, eval: &EvalArgs, output: &OutputArgs) -> RunContext {
    if let Some(url) = &eval.rag_url {
        ctx.endpoints.rag_base_url = url.clone();
    }
    if eval.rag_model.is_some() {
        ctx.endpoints.rag_model = eval.rag_model.clone();
    }
    if let Some(url) = &eval.judge_url {
        ctx.endpoints.judge_base_url = url.clone();
    }
    if eval.judge_model.is_some() {
        ctx.endpoints.judge_model = eval.judge_model.clone();
    }
    match &output.run_id {
        Some(run_id) => ctx.with_run_id(run_id),
        None => ctx,
    }
}

fn eval_config(base: EvalConfig, eval: &EvalArgs) -> Result<EvalConfig> {
    let mut config = base;
    if let Some(threshold) = eval.threshold {
        config = config.with_threshold(threshold);
    }
    if let Some(retries) = eval.max_retries {
        config = config.with_max_retries(retries);
    }
    if let Some(retries) = eval.judge_max_retries {
        config = config.with_judge_max_retries(retries);
    }
    if let Some(secs) = eval.case_timeout {
        config = config.with_case_timeout_secs(secs);
    }
    config.validate().context("Invalid evaluation settings")?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_verify_health(
    executor: &dyn CommandExecutor,
    ctx: &RunContext,
) -> Result<CheckOutcome<HealthReport>> {
    let topology = ExpectedTopology::for_template(&ctx.template)
        .with_context(|| format!("Unknown application template '{}'", ctx.template))?;

    info!(application = %ctx.application, template = %ctx.template, "Verifying pod health");
    let outcome = HealthVerifier::new(executor)
        .verify(ctx, &topology)
        .await
        .with_context(|| format!("Health check for '{}' did not complete", ctx.application))?;

    print_outcome("Health", &outcome);
    if let Some(report) = outcome.report() {
        for pod in &report.restarts {
            println!(
                "  {} (policy={}, containers={}, restarts={})",
                pod.pod, pod.restart_policy, pod.containers, pod.restarts
            );
        }
    }
    Ok(outcome)
}

async fn cmd_verify_ports(
    executor: &dyn CommandExecutor,
    ctx: &RunContext,
    expected: &[u16],
) -> Result<CheckOutcome<PortReport>> {
    info!(application = %ctx.application, ?expected, "Verifying exposed ports");
    let outcome = PortVerifier::new(executor)
        .verify(ctx, expected)
        .await
        .with_context(|| format!("Port check for '{}' did not complete", ctx.application))?;

    print_outcome("Ports", &outcome);
    if let Some(report) = outcome.report() {
        let found: Vec<String> = report.found.iter().map(u16::to_string).collect();
        println!(
            "  found [{}] across {} containers",
            found.join(", "),
            report.containers_scanned
        );
        for id in &report.skipped_containers {
            println!("  skipped container {}", id);
        }
    }
    Ok(outcome)
}

async fn cmd_eval_golden(
    ctx: &RunContext,
    config: &EvalConfig,
    dataset_path: &Path,
    artifacts_dir: Option<&Path>,
) -> Result<()> {
    let dataset = load_golden(dataset_path)
        .with_context(|| format!("Failed to load golden dataset {}", dataset_path.display()))?;
    info!(
        cases = dataset.len(),
        digest = %dataset.digest,
        "Loaded golden dataset"
    );

    let retrieval = RagClient::from_endpoints(&ctx.endpoints).context("Failed to create RAG client")?;
    let judge =
        LlmJudgeClient::from_endpoints(&ctx.endpoints).context("Failed to create judge client")?;
    let evaluator = AnswerEvaluator::new(Arc::new(retrieval), Arc::new(judge), config);
    let aggregator = EvaluationAggregator::new(evaluator, config.case_timeout());

    let report = aggregator
        .run(&dataset.cases, config.accuracy_threshold)
        .await
        .context("Golden evaluation did not complete")?;

    println!("{}", report.render_summary());

    if let Some(dir) = artifacts_dir {
        let artifact = EvalResultsArtifact::new(&ctx.run_id, &dataset, &report);
        let path = write_eval_results_json(dir, &artifact)?;
        println!("Results written to {}", path.display());
    }

    report.ensure_threshold()?;
    println!("✓ Golden evaluation passed");
    Ok(())
}

async fn cmd_check(
    executor: &dyn CommandExecutor,
    ctx: &RunContext,
    expected_ports: &[u16],
    config: &EvalConfig,
    dataset_path: &Path,
    artifacts_dir: Option<&Path>,
) -> Result<()> {
    let mut artifact = HealthReportArtifact::new(&ctx.run_id, &ctx.application);

    let health = cmd_verify_health(executor, ctx).await?;
    artifact.health = Some(CheckArtifact::from_outcome(HEALTH_CHECK, &health));

    let ports = cmd_verify_ports(executor, ctx, expected_ports).await?;
    artifact.ports = Some(CheckArtifact::from_outcome(PORT_CHECK, &ports));

    persist_health_report(artifacts_dir, &artifact)?;

    if health.is_not_applicable() {
        bail!(
            "Application '{}' has no pods; nothing to evaluate",
            ctx.application
        );
    }
    finish_check(HEALTH_CHECK, health)?;
    finish_check(PORT_CHECK, ports)?;

    cmd_eval_golden(ctx, config, dataset_path, artifacts_dir).await?;

    println!("\n✓ All checks passed!");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_outcome<R>(name: &str, outcome: &CheckOutcome<R>) {
    match outcome {
        CheckOutcome::Pass(_) => println!("{}: ✓ PASSED", name),
        CheckOutcome::Fail(failure) => println!("{}: ✗ FAILED ({})", name, failure),
        CheckOutcome::NotApplicable { reason } => println!("{}: - SKIPPED ({})", name, reason),
    }
}

/// Turn a failed outcome into the process error. Skips are not failures.
fn finish_check<R>(check: &str, outcome: CheckOutcome<R>) -> Result<()> {
    outcome
        .into_result()
        .with_context(|| format!("{} check failed", check))?;
    Ok(())
}

fn log_settings(ctx: &RunContext, eval: Option<&EvalConfig>) -> Result<()> {
    debug!(settings = %describe_settings(ctx, eval)?, "Effective settings");
    Ok(())
}

fn persist_health_report(dir: Option<&Path>, artifact: &HealthReportArtifact) -> Result<()> {
    if let Some(dir) = dir {
        let path = write_health_report_json(dir, artifact)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

/// Effective settings, logged at debug level by `--verbose` runs.
#[derive(Serialize)]
struct EffectiveSettings<'a> {
    context: &'a RunContext,
    eval: Option<&'a EvalConfig>,
}

fn describe_settings(ctx: &RunContext, eval: Option<&EvalConfig>) -> Result<String> {
    serde_json::to_string_pretty(&EffectiveSettings { context: ctx, eval })
        .context("Failed to serialize settings")
}

#[cfg(test)]
mod tests {
    use super::*;
    use appcheck_core::ToolPaths;
    use appcheck_exec::ScriptedExecutor;

    const PS: &str = "ai-services application ps demo";

    fn ctx() -> RunContext {
        RunContext::new("demo")
            .with_run_id("run-cli")
            .with_tools(ToolPaths {
                app_cli: "ai-services".to_string(),
                podman: "podman".to_string(),
            })
    }

    fn healthy_table() -> String {
        [
            "APPLICATION NAME   POD NAME               STATUS",
            "demo               demo--vllm-server      Running (healthy)",
            "                   demo--milvus           Running (healthy)",
            "                   demo--chat-bot         Running (healthy)",
        ]
        .join("\n")
    }

    fn healthy_executor() -> ScriptedExecutor {
        let never = r#"[{"RestartPolicy":"no","Containers":[]}]"#;
        ScriptedExecutor::new()
            .on(PS, healthy_table())
            .on("podman pod inspect demo--vllm-server", never)
            .on("podman pod inspect demo--milvus", never)
            .on("podman pod inspect demo--chat-bot", never)
    }

    #[test]
    fn test_parse_verify_health() {
        let cli = Cli::try_parse_from([
            "appcheck", "verify", "health", "demo", "--template", "rag", "--podman", "docker",
        ])
        .unwrap();
        match cli.command {
            Commands::Verify {
                action: VerifyAction::Health { target, .. },
            } => {
                assert_eq!(target.application, "demo");
                assert_eq!(target.podman.as_deref(), Some("docker"));
            }
            _ => panic!("expected verify health"),
        }
    }

    #[test]
    fn test_parse_port_list() {
        let cli = Cli::try_parse_from([
            "appcheck", "verify", "ports", "demo", "--port", "8080,9090", "--port", "22",
        ])
        .unwrap();
        match cli.command {
            Commands::Verify {
                action: VerifyAction::Ports { ports, .. },
            } => assert_eq!(ports.ports, vec![8080, 9090, 22]),
            _ => panic!("expected verify ports"),
        }
    }

    #[test]
    fn test_default_ports() {
        let cli = Cli::try_parse_from(["appcheck", "verify", "ports", "demo"]).unwrap();
        match cli.command {
            Commands::Verify {
                action: VerifyAction::Ports { ports, .. },
            } => assert_eq!(ports.ports, vec![5000, 3000]),
            _ => panic!("expected verify ports"),
        }
    }

    #[test]
    fn test_parse_eval_golden_with_global_flags() {
        let cli = Cli::try_parse_from([
            "appcheck",
            "eval",
            "golden",
            "demo",
            "--dataset",
            "golden.csv",
            "--threshold",
            "0.8",
            "--json",
            "-v",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(cli.verbose);
        match cli.command {
            Commands::Eval {
                action: EvalAction::Golden { eval, .. },
            } => {
                assert_eq!(eval.dataset, PathBuf::from("golden.csv"));
                assert_eq!(eval.threshold, Some(0.8));
            }
            _ => panic!("expected eval golden"),
        }
    }

    #[test]
    fn test_target_context_applies_overrides() {
        let target = TargetArgs {
            application: "demo".to_string(),
            template: "rag".to_string(),
            app_cli: Some("/opt/bin/ai-services".to_string()),
            podman: None,
            command_timeout: Some(5),
            check_timeout: Some(30),
        };
        let output = OutputArgs {
            artifacts_dir: None,
            run_id: Some("run-fixed".to_string()),
        };

        let ctx = target_context(&target, &output);
        assert_eq!(ctx.run_id, "run-fixed");
        assert_eq!(ctx.tools.app_cli, "/opt/bin/ai-services");
        assert_eq!(ctx.timeouts.command_secs, 5);
        assert_eq!(ctx.timeouts.health_check_secs, 30);
        assert_eq!(ctx.timeouts.port_check_secs, 30);
    }

    #[test]
    fn test_eval_config_flags_override_base() {
        let eval = EvalArgs {
            dataset: PathBuf::from("golden.csv"),
            threshold: Some(0.9),
            max_retries: None,
            judge_max_retries: Some(5),
            case_timeout: None,
            rag_url: None,
            rag_model: None,
            judge_url: None,
            judge_model: None,
        };
        let config = eval_config(EvalConfig::default().with_max_retries(3), &eval).unwrap();
        assert_eq!(config.accuracy_threshold, 0.9);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.judge_max_retries, 5);
    }

    #[test]
    fn test_eval_config_rejects_bad_threshold() {
        let eval = EvalArgs {
            dataset: PathBuf::from("golden.csv"),
            threshold: Some(1.5),
            max_retries: None,
            judge_max_retries: None,
            case_timeout: None,
            rag_url: None,
            rag_model: None,
            judge_url: None,
            judge_model: None,
        };
        assert!(eval_config(EvalConfig::default(), &eval).is_err());
    }

    #[tokio::test]
    async fn test_cmd_verify_health_passes_and_writes_report() {
        let executor = healthy_executor();
        let ctx = ctx();

        let outcome = cmd_verify_health(&executor, &ctx).await.unwrap();
        assert!(outcome.is_pass());

        let dir = tempfile::tempdir().unwrap();
        let mut artifact = HealthReportArtifact::new(&ctx.run_id, &ctx.application);
        artifact.health = Some(CheckArtifact::from_outcome(HEALTH_CHECK, &outcome));
        persist_health_report(Some(dir.path()), &artifact).unwrap();
        assert!(dir.path().join("run-cli").join("health_report.json").exists());

        assert!(finish_check(HEALTH_CHECK, outcome).is_ok());
    }

    #[tokio::test]
    async fn test_cmd_verify_health_unknown_template() {
        let executor = healthy_executor();
        let ctx = ctx().with_template("batch");
        let err = cmd_verify_health(&executor, &ctx).await.unwrap_err();
        assert!(err.to_string().contains("Unknown application template 'batch'"));
    }

    #[tokio::test]
    async fn test_missing_port_fails_check() {
        let executor = ScriptedExecutor::new()
            .on(PS, healthy_table())
            .on(
                "podman pod inspect demo--vllm-server",
                r#"[{"RestartPolicy":"always","Containers":[{"Id":"c1","Name":"vllm"}]}]"#,
            )
            .on(
                "podman pod inspect demo--milvus",
                r#"[{"RestartPolicy":"always","Containers":[]}]"#,
            )
            .on(
                "podman pod inspect demo--chat-bot",
                r#"[{"RestartPolicy":"always","Containers":[]}]"#,
            )
            .on("podman port c1", "8000/tcp -> 0.0.0.0:5000");

        let outcome = cmd_verify_ports(&executor, &ctx(), &[5000, 3000])
            .await
            .unwrap();
        assert!(outcome.is_fail());

        let err = finish_check(PORT_CHECK, outcome).unwrap_err();
        assert!(format!("{:#}", err).contains("3000"));
    }

    #[tokio::test]
    async fn test_check_stops_when_nothing_is_deployed() {
        let executor = ScriptedExecutor::new().on(PS, "   \n");
        let config = EvalConfig::default();

        let err = cmd_check(
            &executor,
            &ctx(),
            &[5000],
            &config,
            Path::new("does-not-matter.csv"),
            None,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("has no pods"));
    }

    #[test]
    fn test_describe_settings_is_json() {
        let text = describe_settings(&ctx(), Some(&EvalConfig::default())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["context"]["application"], "demo");
        assert_eq!(value["eval"]["max_retries"], 2);
    }
}
