//! Community chat backend probe
//!
//! Logs in, finds a support room, fetches its messages and reports the
//! runtime shape of the last message's `sender` field. The trace is written
//! to a log file and mirrored to stdout.

use anyhow::Context;
use clap::Parser;
use community_api_client::{ClientConfig, CommunityClient};
use community_telemetry::TelemetryConfig;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

mod analysis;
mod config;
mod diagnostic;
mod probe;

use config::{ProbeConfig, DEFAULT_TARGET_MARKER};
use diagnostic::{FileLog, DEFAULT_LOG_FILE};
use probe::{Probe, ProbeOutcome};

/// Exit status when the run stops early at a logged failure
const EXIT_HALTED: u8 = 2;

/// Diagnose message payload shapes on the community chat backend
#[derive(Parser)]
#[command(name = "community-probe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Account username
    username: String,

    /// Account password
    password: String,

    /// Backend base URL [default: production host]
    #[arg(long, env = "COMMUNITY_API_URL")]
    base_url: Option<String>,

    /// Request timeout in seconds [default: 30]
    #[arg(long, env = "COMMUNITY_TIMEOUT_SECS")]
    timeout: Option<u64>,

    /// Diagnostic log file, truncated at start
    #[arg(long, env = "PROBE_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Room name fragment that selects the target room
    #[arg(long, env = "PROBE_TARGET_MARKER", default_value = DEFAULT_TARGET_MARKER)]
    target_marker: String,

    /// Also inspect the active chat queue
    #[arg(long)]
    survey_active: bool,

    /// Write the trace to the log file only
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Flags win over their environment variables, which win over defaults.
    /// Validation happens once, when the client is built.
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }

    fn probe_config(&self) -> ProbeConfig {
        ProbeConfig::default()
            .with_target_marker(&self.target_marker)
            .with_survey_active(self.survey_active)
    }
}

async fn run(cli: &Cli) -> anyhow::Result<ProbeOutcome> {
    let client = CommunityClient::with_config(cli.client_config())
        .context("Failed to create HTTP client")?;

    let header = format!("Starting debug for {}...", cli.username);
    let mut log = FileLog::create(&cli.log_file, &header)
        .with_context(|| format!("Failed to create log file {}", cli.log_file.display()))?
        .with_mirror(!cli.quiet);

    tracing::debug!(
        base_url = %client.base_url(),
        log_file = %log.path().display(),
        "Starting diagnostic run"
    );

    let probe = Probe::new(client, cli.probe_config());
    Ok(probe.run(&mut log, &cli.username, &cli.password).await)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors exit 1 so that 2 keeps meaning "halted"
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let telemetry = if cli.verbose {
        TelemetryConfig::verbose_for(&["community_probe", "community_api_client"])
    } else {
        TelemetryConfig::default()
    };
    if let Err(e) = community_telemetry::init_with_config(telemetry) {
        eprintln!("{} {}", "Warning:".yellow().bold(), e);
    }

    match run(&cli).await {
        Ok(ProbeOutcome::Completed) => ExitCode::SUCCESS,
        Ok(ProbeOutcome::Halted(_)) => ExitCode::from(EXIT_HALTED),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
