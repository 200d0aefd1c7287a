// crates/story-spoiler-cli/src/main.rs
// ============================================================================
// Module: Story Spoiler CLI Entry Point
// Description: Command dispatcher for running and listing the story suite.
// Purpose: Run the ordered Story Spoiler suite and report per-scenario results.
// Dependencies: clap, story-spoiler-harness, thiserror, tokio
// ============================================================================

//! ## Overview
//! `story-spoiler run` layers CLI flags over the config file and environment,
//! runs the suite on a current-thread runtime, prints one line per scenario
//! plus totals, and exits non-zero unless every selected scenario passed.
//! `story-spoiler list` prints the declared plan without touching the network.


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use story_spoiler_harness::HarnessConfig;
use story_spoiler_harness::HarnessError;
use story_spoiler_harness::Secret;
use story_spoiler_harness::SuiteReport;
use story_spoiler_harness::TokenPolicy;
use story_spoiler_harness::config::ConfigError;
use story_spoiler_harness::config::ConfigLayer;
use story_spoiler_harness::report::ScenarioOutcome;
use story_spoiler_harness::report::ScenarioReport;
use story_spoiler_harness::run_suite;
use story_spoiler_harness::runner::PlanError;
use story_spoiler_harness::scenario::Scenario;
use story_spoiler_harness::story::story_plan;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "story-spoiler", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the story suite against the configured API.
    Run(RunCommand),
    /// Print the scenario plan.
    List,
}

/// Arguments for the `run` command.
#[derive(Args, Debug, Default)]
struct RunCommand {
    /// Optional TOML config file (falls back to `STORY_SPOILER_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Base URL of the API under test.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
    /// Login username.
    #[arg(long, value_name = "USER")]
    username: Option<String>,
    /// Login password.
    #[arg(long, value_name = "PASSWORD")]
    password: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECONDS")]
    timeout_sec: Option<u64>,
    /// Abort setup when login returns no access token.
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "lenient_auth")]
    strict_auth: bool,
    /// Continue with an empty token, overriding a strict file or env setting.
    #[arg(long, action = ArgAction::SetTrue)]
    lenient_auth: bool,
    /// Run only these scenario orders (repeatable).
    #[arg(long = "scenario", value_name = "N")]
    scenarios: Vec<u32>,
    /// Directory receiving summary.json and summary.md.
    #[arg(long, value_name = "DIR")]
    run_root: Option<PathBuf>,
    /// Event log destination (`-` for stderr).
    #[arg(long, value_name = "PATH")]
    event_log: Option<PathBuf>,
}

impl RunCommand {
    /// Converts the flags into the highest-precedence config layer.
    fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            base_url: self.base_url.clone(),
            username: self.username.clone(),
            password: self.password.clone().map(Secret::new),
            timeout_sec: self.timeout_sec,
            token_policy: self.token_policy(),
            run_root: self.run_root.clone(),
            event_log: self.event_log.clone(),
        }
    }

    /// Token policy chosen on the command line, if any.
    const fn token_policy(&self) -> Option<TokenPolicy> {
        if self.strict_auth {
            Some(TokenPolicy::Strict)
        } else if self.lenient_auth {
            Some(TokenPolicy::Lenient)
        } else {
            None
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failures; each aborts before or after the suite, never during it.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration failed to load.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Suite setup or report writing failed.
    #[error("suite aborted: {0}")]
    Harness(#[from] HarnessError),
    /// The built-in plan is invalid.
    #[error("invalid scenario plan: {0}")]
    Plan(#[from] PlanError),
    /// Writing to a standard stream failed.
    #[error("failed to write to {stream}: {error}")]
    Output {
        /// Stream name.
        stream: &'static str,
        /// Underlying error.
        error: String,
    },
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the selected command.
async fn dispatch(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Run(command) => command_run(&command).await,
        Commands::List => command_list(),
    }
}

/// Runs the suite and prints its results.
async fn command_run(command: &RunCommand) -> CliResult<ExitCode> {
    let config = HarnessConfig::load(command.config.as_deref(), command.overrides())?;
    let run = run_suite(&config, &command.scenarios).await?;
    for scenario in &run.report.scenarios {
        write_stdout_line(&scenario_line(scenario))?;
    }
    write_stdout_line(&totals_line(&run.report))?;
    for artifact in &run.artifacts {
        write_stdout_line(&format!("report: {}", artifact.display()))?;
    }
    Ok(exit_code_for(&run.report))
}

/// Prints the declared plan.
fn command_list() -> CliResult<ExitCode> {
    let plan = story_plan()?;
    for scenario in plan.scenarios() {
        write_stdout_line(&plan_line(scenario))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders one scenario result.
fn scenario_line(scenario: &ScenarioReport) -> String {
    let status = scenario.http_status.map_or_else(|| "-".to_string(), |code| code.to_string());
    let head = format!(
        "{:>2}. {} {} {} [{status}]",
        scenario.order, scenario.method, scenario.path, scenario.name
    );
    match &scenario.outcome {
        ScenarioOutcome::Passed => format!("PASS {head}"),
        ScenarioOutcome::Failed {
            reason,
        } => format!("FAIL {head}: {reason}"),
        ScenarioOutcome::Skipped {
            reason,
        } => format!("SKIP {head}: {reason}"),
    }
}

/// Renders the totals line.
fn totals_line(report: &SuiteReport) -> String {
    format!(
        "{} scenarios: {} passed, {} failed, {} skipped",
        report.scenarios.len(),
        report.passed_count(),
        report.failed_count(),
        report.skipped_count()
    )
}

/// Renders one declared scenario.
fn plan_line(scenario: &Scenario) -> String {
    let mut line =
        format!("{:>2}. {} {} {}", scenario.order, scenario.method, scenario.path, scenario.name);
    if !scenario.depends_on.is_empty() {
        let deps: Vec<String> = scenario.depends_on.iter().map(u32::to_string).collect();
        line.push_str(&format!(" (after {})", deps.join(", ")));
    }
    line
}

/// Success only when every selected scenario passed.
fn exit_code_for(report: &SuiteReport) -> ExitCode {
    if report.passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::Output {
        stream: "stdout",
        error: err.to_string(),
    })
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
