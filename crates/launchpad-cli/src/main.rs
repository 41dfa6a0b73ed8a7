// crates/launchpad-cli/src/main.rs
// ============================================================================
// Module: Launchpad CLI Entry Point
// Description: Command dispatcher for bootstrap, diagnostics, and maintenance.
// Purpose: Run the self-updating bootstrap and hand off to the installed runtime.
// Dependencies: clap, launchpad-cli, launchpad-config, launchpad-core, serde, thiserror, tokio
// ============================================================================

//! ## Overview
//! `launchpad launch` runs the bootstrap on a blocking worker while the
//! foreground task streams progress as JSON lines. The remaining commands
//! inspect or maintain the install store. Exit status is non-zero only when
//! no runtime could be launched or a command failed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use launchpad_cli::ChannelProgress;
use launchpad_cli::Launcher;
use launchpad_cli::LauncherError;
use launchpad_cli::render_event;
use launchpad_cli::spawn_runtime;
use launchpad_config::LaunchpadConfig;
use launchpad_core::BootstrapOutcome;
use launchpad_core::CancelToken;
use launchpad_core::NoopProgress;
use launchpad_core::ProgressEvent;
use launchpad_core::ProgressSink;
use launchpad_store::read_log;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "launchpad", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to `LAUNCHPAD_CONFIG` or the per-user config dir).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Check for updates, install when needed, and report the runtime to launch.
    Launch(LaunchCommand),
    /// Report what a launch would do without installing anything.
    Check,
    /// Show the active install, last decision, and lock holder.
    Status,
    /// Print recent update log entries as JSON lines.
    Log(LogCommand),
    /// Remove superseded installs.
    Cleanup,
    /// Reactivate the previous install.
    Rollback,
}

/// Configuration for the `launch` command.
#[derive(Args, Debug)]
struct LaunchCommand {
    /// Start the runtime once it is ready.
    #[arg(long)]
    spawn: bool,
    /// Abort the bootstrap after this many seconds.
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,
    /// Arguments passed through to the runtime.
    #[arg(last = true, value_name = "ARGS")]
    args: Vec<String>,
}

/// Configuration for the `log` command.
#[derive(Args, Debug)]
struct LogCommand {
    /// Print only the last N entries.
    #[arg(long, value_name = "N")]
    tail: Option<usize>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

impl From<LauncherError> for CliError {
    fn from(err: LauncherError) -> Self {
        Self::new(format!("launchpad: {err}"))
    }
}

/// Result alias for CLI operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = LaunchpadConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(format!("launchpad: {err}")))?;
    let launcher = Launcher::new(config)?;

    match cli.command {
        Commands::Launch(command) => command_launch(launcher, command).await,
        Commands::Check => command_check(launcher).await,
        Commands::Status => command_status(&launcher),
        Commands::Log(command) => command_log(&launcher, &command),
        Commands::Cleanup => {
            let summary = blocking(move || launcher.cleanup()).await?;
            print_json(&summary)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Rollback => {
            let state = blocking(move || launcher.rollback()).await?;
            print_json(&state)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs the bootstrap and streams its progress.
async fn command_launch(launcher: Launcher, command: LaunchCommand) -> CliResult<ExitCode> {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let progress: Arc<dyn ProgressSink> = Arc::new(ChannelProgress::new(sender));
    let cancel = command
        .timeout_secs
        .map_or_else(CancelToken::new, |secs| CancelToken::with_timeout(Duration::from_secs(secs)));
    let diagnostic_log = launcher.layout().diagnostic_log_path();
    let worker = tokio::task::spawn_blocking(move || launcher.bootstrap(progress, &cancel));

    let mut runtime = None;
    while let Some(event) = receiver.recv().await {
        let line = render_event(&event)
            .map_err(|err| CliError::new(format!("launchpad: failed to encode progress: {err}")))?;
        write_stdout_line(&line).map_err(|err| output_error("stdout", &err))?;
        if let ProgressEvent::LogUnavailable(err) = &event {
            write_stderr_line(&format!("launchpad: warning: {err}"))
                .map_err(|err| output_error("stderr", &err))?;
        }
        if command.spawn
            && runtime.is_none()
            && let ProgressEvent::Finished(BootstrapOutcome::Ready(target)) = &event
        {
            let child = spawn_runtime(target, &command.args)?;
            print_json_line(&SpawnedLine {
                event: "spawned",
                pid: child.id(),
            })?;
            runtime = Some(child);
        }
    }

    let run = worker
        .await
        .map_err(|err| CliError::new(format!("launchpad: bootstrap worker failed: {err}")))??;
    if let Some(err) = run.decision_error {
        write_stderr_line(&format!("launchpad: warning: {err}"))
            .map_err(|err| output_error("stderr", &err))?;
    }
    match run.outcome {
        BootstrapOutcome::Ready(_) => Ok(ExitCode::SUCCESS),
        BootstrapOutcome::Fatal(report) => {
            let message = format!(
                "launchpad: bootstrap failed ({}): {}; see {}",
                report.error.as_str(),
                report.detail,
                diagnostic_log.display()
            );
            Ok(emit_error(&message))
        }
    }
}

/// Prints the dry-run bootstrap decision.
async fn command_check(launcher: Launcher) -> CliResult<ExitCode> {
    let check = blocking(move || {
        let orchestrator = launcher.orchestrator(Arc::new(NoopProgress))?;
        Ok(orchestrator.check(&CancelToken::new()))
    })
    .await?;
    print_json(&check)?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the install store status.
fn command_status(launcher: &Launcher) -> CliResult<ExitCode> {
    print_json(&launcher.status()?)?;
    Ok(ExitCode::SUCCESS)
}

/// Prints update log entries.
fn command_log(launcher: &Launcher, command: &LogCommand) -> CliResult<ExitCode> {
    let entries = read_log(&launcher.layout().update_log_path()).map_err(LauncherError::from)?;
    let skip = command.tail.map_or(0, |tail| entries.len().saturating_sub(tail));
    for entry in entries.iter().skip(skip) {
        print_json_line(entry)?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Progress line announcing a started runtime.
#[derive(Debug, Serialize)]
struct SpawnedLine {
    /// Event tag.
    event: &'static str,
    /// Runtime process id.
    pid: u32,
}

/// Runs blocking launcher work off the async executor.
async fn blocking<T, F>(work: F) -> CliResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, LauncherError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| CliError::new(format!("launchpad: worker failed: {err}")))?;
    Ok(result?)
}

/// Writes a value as pretty JSON to stdout.
fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("launchpad: failed to encode output: {err}")))?;
    write_stdout_line(&text).map_err(|err| output_error("stdout", &err))
}

/// Writes a value as a single JSON line to stdout.
fn print_json_line<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string(value)
        .map_err(|err| CliError::new(format!("launchpad: failed to encode output: {err}")))?;
    write_stdout_line(&text).map_err(|err| output_error("stdout", &err))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Builds an error for a failed output stream write.
fn output_error(stream: &str, err: &std::io::Error) -> CliError {
    CliError::new(format!("launchpad: failed to write {stream}: {err}"))
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
