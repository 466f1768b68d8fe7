//! SARA application binary - composition root.
//!
//! Ties the pipeline to a front end:
//! 1. Parse the CLI and load configuration from TOML
//! 2. Initialize tracing
//! 3. Pick the automation backend (simulated or real desktop)
//! 4. Run the requested subcommand: the console loop, a single command,
//!    an audit dump, or a config dump

mod cli;
mod console;
mod desktop;

use std::sync::Arc;

use clap::Parser;
use sara_action::automation::{Automation, SimulatedAutomation};
use sara_action::security::{open_store, SecurityGate, SecurityPolicy};
use sara_action::{Assistant, SpeechSink};
use sara_core::config::{AutomationMode, SaraConfig};

use cli::{CliArgs, Command};
use console::{is_exit_command, ConsoleIo};
use desktop::DesktopAutomation;

const GREETING: &str = "SARA initialized. I'm ready to help.";
const FAREWELL: &str = "Goodbye!";

/// Install the tracing subscriber.
///
/// Priority: RUST_LOG env var > --log-level flag > config file value.
fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_automation(config: &SaraConfig) -> Arc<dyn Automation> {
    match config.automation.mode {
        AutomationMode::Simulated => {
            tracing::info!("Using simulated automation; no system changes will be made");
            Arc::new(
                SimulatedAutomation::new().with_search_url(config.automation.search_url.clone()),
            )
        }
        AutomationMode::Desktop => {
            let desktop = DesktopAutomation::from_config(&config.automation);
            tracing::info!(
                workspace = %desktop.workspace().display(),
                "Using desktop automation"
            );
            Arc::new(desktop)
        }
    }
}

/// Interactive console loop until stdin closes or the user says goodbye.
async fn run_console(assistant: &Assistant, io: &ConsoleIo) {
    io.speak(GREETING);
    while let Some(line) = io.read_command().await {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if is_exit_command(text) {
            break;
        }
        let response = assistant.process_command(text, io, io).await;
        tracing::debug!(
            intent = %response.intent.kind,
            succeeded = response.succeeded(),
            cancelled = response.was_cancelled(),
            "Command handled"
        );
    }
    io.speak(FAREWELL);
}

fn print_audit(config: &SaraConfig, tail: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let gate = SecurityGate::new(
        SecurityPolicy::from_config(&config.pipeline),
        open_store(config.audit.format, config.audit_path()),
    );
    let entries = match tail {
        Some(count) => gate.recent_entries(count),
        None => gate.all_entries(),
    };
    for entry in &entries {
        println!("{}", serde_json::to_string(entry)?);
    }
    tracing::info!(
        path = %config.audit_path().display(),
        printed = entries.len(),
        total = gate.len(),
        "Audit trail printed"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = SaraConfig::load_or_default(&config_file);
    if let Some(data_dir) = args.resolve_data_dir() {
        config.general.data_dir = data_dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    // Tracing.
    init_tracing(&config.general.log_level);
    tracing::info!("Starting SARA v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let command = args.command();
    match command {
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            return Ok(());
        }
        Command::Audit { tail } => return print_audit(&config, tail),
        Command::Run | Command::Say { .. } => {}
    }

    // Directory holding the audit log.
    let audit_path = config.audit_path();
    if let Some(data_dir) = audit_path.parent() {
        if let Err(e) = std::fs::create_dir_all(data_dir) {
            tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
            return Err(e.into());
        }
    }

    let assistant = Assistant::from_config(&config, build_automation(&config));
    let io = ConsoleIo::new();

    match command {
        Command::Say { text } => {
            let response = assistant.process_command(&text.join(" "), &io, &io).await;
            if !response.succeeded() {
                std::process::exit(1);
            }
        }
        _ => run_console(&assistant, &io).await,
    }

    Ok(())
}
