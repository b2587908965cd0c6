//! AlarmRelay CLI
//!
//! Command-line interface for the alarm relay.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use alarmrelay::api::HttpServer;
use alarmrelay::dispatch::build_channel;
use alarmrelay::enrich::CloudWatchLogLookup;
use alarmrelay::formatter::AlarmFormatter;
use alarmrelay::relay::AlarmRelay;
use alarmrelay::Config;

/// AlarmRelay - CloudWatch alarm notifications as readable email
#[derive(Parser)]
#[command(name = "alarmrelay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "ALARMRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the relay over HTTP
    Serve {
        /// Host to bind to
        #[arg(long, env = "ALARMRELAY_HOST")]
        host: Option<String>,

        /// HTTP port
        #[arg(long, env = "ALARMRELAY_PORT")]
        port: Option<u16>,
    },

    /// Print the formatted message for one event without publishing it
    Format {
        /// Event JSON file (stdin if omitted or "-")
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Also print the subject line
        #[arg(long)]
        subject: bool,
    },

    /// Relay one event (or SNS delivery) through the configured channel
    Relay {
        /// Event JSON file (stdin if omitted or "-")
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before anything reads the environment
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config, cli.verbose);

    let result = match cli.command {
        Commands::Serve { host, port } => run_serve(config, host, port).await,
        Commands::Format { input, subject } => run_format(config, input, subject),
        Commands::Relay { input } => run_relay(config, input).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &Config, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn build_relay(config: &Config) -> anyhow::Result<AlarmRelay> {
    let channel = build_channel(&config.dispatch).await?;
    let formatter = AlarmFormatter::new(config.formatter.clone());
    let relay = AlarmRelay::new(formatter, channel);

    if !config.log_lookup.enabled {
        return Ok(relay);
    }
    info!(
        lookback = ?config.log_lookup.lookback,
        "Causing-log lookup enabled"
    );
    let lookup = CloudWatchLogLookup::from_env(&config.log_lookup).await;
    Ok(relay.with_log_lookup(Arc::new(lookup)))
}

fn read_event(input: Option<PathBuf>) -> anyhow::Result<serde_json::Value> {
    let text = match input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    serde_json::from_str(&text).context("event is not valid JSON")
}

async fn run_serve(config: Config, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info!(
        application = %config.application.name,
        environment = %config.application.environment,
        "Starting AlarmRelay on {}:{}",
        host,
        port
    );

    let relay = Arc::new(build_relay(&config).await?);
    HttpServer::new(relay).serve(&format!("{host}:{port}")).await?;

    Ok(())
}

fn run_format(config: Config, input: Option<PathBuf>, subject: bool) -> anyhow::Result<()> {
    let event = read_event(input)?;
    let alarm = alarmrelay::ingest::ingest(&event)?;
    let message = AlarmFormatter::new(config.formatter).render(&alarm)?;

    if subject {
        println!("Subject: {}", message.subject);
        println!();
    }
    println!("{}", message.body);
    Ok(())
}

async fn run_relay(config: Config, input: Option<PathBuf>) -> anyhow::Result<()> {
    let event = read_event(input)?;
    let relay = build_relay(&config).await?;
    let outcome = relay.handle_value(&event).await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if outcome.status_code >= 400 {
        anyhow::bail!("relay finished with status {}", outcome.status_code);
    }
    Ok(())
}
