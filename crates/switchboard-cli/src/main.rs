//! Switchboard CLI: entry point.
//!
//! # Commands
//!
//! - `switchboard ask -m MESSAGE`: single routed completion
//! - `switchboard chat`: interactive REPL over the router
//! - `switchboard init`: write a default config file
//! - `switchboard status`: show configuration and credential status
//! - `switchboard health [--json]`: probe providers and print the report
//! - `switchboard watch [--interval S]`: periodic health probes until Ctrl-C

mod health_cmd;
mod helpers;
mod init;
mod repl;
mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use switchboard_core::config::{load_config, Config};
use switchboard_core::{ChatMessage, Provider, RequestEnvelope};
use switchboard_providers::EnvSecrets;
use switchboard_router::{HealthMonitor, Router};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Switchboard: resilient routing across LLM providers
#[derive(Parser)]
#[command(name = "switchboard", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.switchboard/config.json)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the answer
    Ask {
        /// The user message
        #[arg(short, long)]
        message: String,

        /// Optional system instructions
        #[arg(short, long)]
        system: Option<String>,

        /// Provider to try first (openrouter, groq, gemini, openai)
        #[arg(short, long)]
        provider: Option<Provider>,

        /// Attempts per provider before failing over
        #[arg(long)]
        retries: Option<u32>,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f64>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Interactive chat (REPL)
    Chat {
        /// Provider to try first
        #[arg(short, long)]
        provider: Option<Provider>,

        /// Optional system instructions for the whole conversation
        #[arg(short, long)]
        system: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Write a default config file
    Init,

    /// Show configuration and credential status (no network)
    Status,

    /// Probe every provider and print a health report
    Health {
        /// Print the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Probe periodically and print health after each cycle
    Watch {
        /// Seconds between probe cycles (defaults to router.probeIntervalSecs)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref().map(helpers::expand_tilde);

    match cli.command {
        Commands::Ask {
            message,
            system,
            provider,
            retries,
            temperature,
            logs,
        } => {
            init_logging(logs);
            let config = load(config_path);
            let mut messages = Vec::new();
            if let Some(system) = system {
                messages.push(ChatMessage::system(system));
            }
            messages.push(ChatMessage::user(message));
            let envelope = RequestEnvelope::new(messages)
                .with_preferred_provider(provider)
                .with_max_retries(retries.unwrap_or(config.router.max_retries))
                .with_temperature(temperature.unwrap_or(config.router.temperature));
            run_ask(&config, envelope).await
        }
        Commands::Chat {
            provider,
            system,
            logs,
        } => {
            init_logging(logs);
            let config = load(config_path);
            let router = connect(&config).await?;
            let result = repl::run(&router, provider, system).await;
            router.shutdown();
            result
        }
        Commands::Init => init::run(config_path.as_deref()),
        Commands::Status => status::run(config_path.as_deref()),
        Commands::Health { json, logs } => {
            init_logging(logs);
            let config = load(config_path);
            let router = Router::from_config(&config, &EnvSecrets).context("failed to build router")?;
            let report = router.health_report().await;
            router.shutdown();
            health_cmd::print_report(&report, json)
        }
        Commands::Watch { interval, logs } => {
            init_logging(logs);
            let config = load(config_path);
            let interval = interval.unwrap_or(config.router.probe_interval_secs);
            run_watch(&config, interval).await
        }
    }
}

fn load(path: Option<PathBuf>) -> Config {
    load_config(path.as_deref())
}

async fn connect(config: &Config) -> Result<Router> {
    Router::connect(config, &EnvSecrets)
        .await
        .context("failed to build router")
}

// ─────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────

async fn run_ask(config: &Config, envelope: RequestEnvelope) -> Result<()> {
    let router = connect(config).await?;

    info!(
        preferred = ?envelope.preferred_provider,
        retries = envelope.max_retries,
        "routing single message"
    );
    helpers::print_thinking();
    let result = router.route(&envelope).await;
    helpers::clear_thinking();
    router.shutdown();

    let response = result.context("routing failed")?;
    helpers::print_response(&response);
    Ok(())
}

async fn run_watch(config: &Config, interval_secs: u64) -> Result<()> {
    let router = Router::from_config(config, &EnvSecrets).context("failed to build router")?;
    let monitor = Arc::new(
        HealthMonitor::from_secs(router.clone(), interval_secs)
            .with_on_cycle(Arc::new(health_cmd::print_snapshot)),
    );

    println!("Probing every {}s, Ctrl-C to stop.", interval_secs.max(1));
    monitor.trigger_now().await;

    let m = monitor.clone();
    let handle = tokio::spawn(async move { m.start().await });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    monitor.stop();
    handle.await.context("health monitor task panicked")??;
    router.shutdown();
    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("switchboard=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_ask_with_provider() {
        let cli = Cli::try_parse_from([
            "switchboard", "ask", "-m", "hi", "--provider", "Gemini", "--retries", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Ask {
                message,
                provider,
                retries,
                ..
            } => {
                assert_eq!(message, "hi");
                assert_eq!(provider, Some(Provider::Gemini));
                assert_eq!(retries, Some(2));
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn rejects_unknown_provider() {
        let result = Cli::try_parse_from(["switchboard", "chat", "--provider", "mistral"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_config_flag() {
        let cli = Cli::try_parse_from(["switchboard", "status", "--config", "/tmp/x.json"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("/tmp/x.json"));
        assert!(matches!(cli.command, Commands::Status));
    }
}
