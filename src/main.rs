#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use fabric_validator::app_config::LogLevel;
use fabric_validator::client::{ClientOptions, DEFAULT_SERVER_URL, ValidatorClient, render_response};
use fabric_validator::logging::ConsoleLogger;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for validator
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Validate Hedgehog Open Network Fabric configuration files
#[derive(Parser, Debug)]
#[command(name = "validator")]
#[command(version)]
#[command(about = "Validate Hedgehog Open Network Fabric configuration files")]
#[command(long_about = "The Validator CLI tool validates ONF (Open Network Fabric) configuration files
using the hhfab utility through a web service.

USE CASES:
    1. Validate wiring diagram only (generates default fab.yaml)
    2. Validate both wiring diagram and custom fab.yaml

EXAMPLES:
    validator -w wiring.yaml                              # Validate wiring diagram only
    validator -w wiring.yaml -f fab.yaml                  # Validate wiring and fabricator config
    validator -w wiring.yaml -s http://remote-server:8080 # Use custom server URL
    validator completions bash > validator.bash           # Generate bash completions")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to wiring diagram file (required)
    #[arg(short, long, value_name = "PATH")]
    wiring: Option<PathBuf>,

    /// Path to fabricator config file (optional)
    #[arg(short, long, value_name = "PATH")]
    fab: Option<PathBuf>,

    /// Validator server URL
    #[arg(short, long, env = "VALIDATOR_SERVER", default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Request timeout in seconds
    #[arg(short, long, default_value_t = 30)]
    timeout: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    ConsoleLogger::init(LevelFilter::Warn)?;

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "validator", &mut std::io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(level) = cli.log_level.clone() {
        log::set_max_level(LogLevel::from(level).to_level_filter());
    }

    let wiring = cli
        .wiring
        .clone()
        .ok_or_else(|| anyhow!("--wiring is required when no subcommand is specified"))?;

    let options = ClientOptions {
        wiring,
        fab: cli.fab.clone(),
        server_url: cli.server.clone(),
        timeout: Duration::from_secs(cli.timeout),
        verbose: cli.verbose,
    };

    run_validate(options).await
}

async fn run_validate(options: ClientOptions) -> Result<ExitCode> {
    options.check_input_files()?;

    if options.verbose {
        println!("{}", options.describe());
        println!("Making request to: {}", options.validate_url()?);
    }

    let client = ValidatorClient::new(options.clone()).context("failed to create request")?;

    let spinner = waiting_spinner(options.verbose);
    let outcome = client.validate().await;
    spinner.finish_and_clear();

    let response = outcome.context("failed to make request")?;
    print!("{}", render_response(&response, options.verbose));

    if response.success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

// @returns: Spinner on stderr while the server validates, hidden in verbose mode
fn waiting_spinner(verbose: bool) -> ProgressBar {
    if verbose {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner} {msg} [{elapsed}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message("Validating...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
