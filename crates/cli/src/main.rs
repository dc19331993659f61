//! tokensync: collect catalog entitlements and submit them.

mod submit;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use submit::SubmitClient;
use tokensync_core::config::{AppConfig, SessionConfig};
use tokensync_pipeline::{Pipeline, SyncOutcome};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status for a completed run that lost data to failed requests.
const EXIT_PARTIAL_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "tokensync")]
#[command(about = "Collect license, application and content-unit keys for an account")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "TOKENSYNC_CONFIG",
        default_value = "config/tokensync.toml"
    )]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync and report the result
    Run(RunArgs),
    /// Load and validate configuration, then print it
    CheckConfig,
}

#[derive(Args)]
struct RunArgs {
    /// Write the result document to this file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Do not submit the result even if a URL is configured
    #[arg(long)]
    no_submit: bool,

    /// Exit with status 2 when any request failed for good
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(Path::new(&cli.config))?;

    match cli.command {
        Commands::Run(args) => run(config, args).await,
        Commands::CheckConfig => {
            check_config(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: &Path) -> Result<AppConfig> {
    let mut figment = Figment::new();
    let has_config_file = path.exists();

    if has_config_file {
        tracing::debug!(config_path = %path.display(), "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!("No config file found at {}", path.display());
    }

    let has_env_config = std::env::vars()
        .any(|(key, _)| key.starts_with("TOKENSYNC_") && key != "TOKENSYNC_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: tokensync --config /path/to/tokensync.toml run\n  \
             2. Environment variables: TOKENSYNC_SESSION__TYPE=fixture \
             TOKENSYNC_SESSION__PATH=catalog.json tokensync run\n\n\
             See config/tokensync.example.toml for example configuration.\n\
             Set TOKENSYNC_CONFIG env var to specify a default config file path."
        );
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("TOKENSYNC_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;

    Ok(config)
}

fn check_config(config: &AppConfig) -> Result<()> {
    let mut shown = config.clone();
    if let SessionConfig::Http { token, .. } = &mut shown.session {
        if token.is_some() {
            *token = Some("<redacted>".to_string());
        }
    }
    let rendered = toml::to_string_pretty(&shown).context("failed to render configuration")?;
    println!("✓ Configuration is valid\n");
    println!("{rendered}");
    Ok(())
}

async fn run(config: AppConfig, args: RunArgs) -> Result<ExitCode> {
    tracing::info!("tokensync v{}", env!("CARGO_PKG_VERSION"));

    let session = tokensync_session::from_config(&config.session)
        .await
        .context("failed to open session")?;
    let pipeline = Pipeline::new(session, config.sync.clone())?;
    let outcome = pipeline.run().await;

    if let Some(path) = &args.output {
        let json = outcome
            .result
            .to_json_pretty()
            .context("failed to serialize result")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote result document");
    }

    write_report(&mut io::stdout().lock(), &outcome).context("failed to print report")?;

    if args.no_submit {
        tracing::info!("Submission disabled on the command line");
    } else {
        match &config.submit.url {
            Some(url) => {
                let client = SubmitClient::new(url, config.submit.timeout())?;
                let ack = client
                    .submit(&outcome.result)
                    .await
                    .with_context(|| format!("failed to submit result to {}", client.url()))?;
                match ack.message {
                    Some(message) => println!("✓ Submitted: {message}"),
                    None => println!("✓ Submitted to {}", client.url()),
                }
            }
            None => tracing::info!("No submission URL configured, skipping submission"),
        }
    }

    if outcome.partial_failure && args.strict {
        return Ok(ExitCode::from(EXIT_PARTIAL_FAILURE));
    }
    Ok(ExitCode::SUCCESS)
}

fn write_report(out: &mut impl Write, outcome: &SyncOutcome) -> io::Result<()> {
    let result = &outcome.result;
    let stats = &outcome.stats;

    writeln!(out, "Sync finished for {}", display_identity(&result.identity))?;
    writeln!(out, "  Subs:         {}", result.subs.len())?;
    writeln!(out, "  Apps:         {}", result.apps.len())?;
    writeln!(out, "  ContentKeys:  {}", result.content_keys.len())?;
    writeln!(
        out,
        "  Tokens:       {} granted, {} denied, {} non-zero",
        stats.tokens_granted, stats.tokens_denied, stats.tokens_nonzero
    )?;
    writeln!(
        out,
        "  Keys:         {} requested, {} ok, {} denied, {} failed",
        stats.keys_requested, stats.keys_ok, stats.keys_denied, stats.keys_failed
    )?;
    if !outcome.skipped_packages.is_empty() || !outcome.skipped_apps.is_empty() {
        writeln!(
            out,
            "  Skipped:      {} packages, {} apps",
            outcome.skipped_packages.len(),
            outcome.skipped_apps.len()
        )?;
    }

    if outcome.partial_failure {
        writeln!(out)?;
        writeln!(out, "WARNING: some requests failed and were not retried further.")?;
        writeln!(out, "  {} batch chunks were dropped.", stats.chunks_failed)?;
        writeln!(out, "  The result is incomplete; run again to fill the gaps.")?;
    }
    Ok(())
}

fn display_identity(identity: &str) -> &str {
    if identity.is_empty() {
        "<unknown account>"
    } else {
        identity
    }
}
