
use crate::bus::MessageBus;
use crate::channels::base::BaseChannel;
use crate::channels::telegram::TelegramChannel;
use crate::config::{Config, load_config};
use crate::providers::base::CompletionProvider;
use crate::providers::openai::OpenAIProvider;
use crate::relay::{Dispatcher, RelayHandler, RelaySettings};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(version, about = "Relay Telegram messages to an OpenAI-compatible completion API")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Run the relay until interrupted
    Start {
        /// Path to a JSON config file (default: ~/.chatrelay/config.json)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { config } => start(config.as_deref()).await?,
    }

    Ok(())
}

fn setup_provider(config: &Config) -> Arc<dyn CompletionProvider> {
    let timeout = Duration::from_secs(config.provider.request_timeout_secs);
    debug!(
        "creating OpenAI provider (base={}, timeout={}s)",
        config
            .provider
            .api_base
            .as_deref()
            .unwrap_or(crate::providers::openai::API_URL),
        timeout.as_secs()
    );
    Arc::new(OpenAIProvider::new(
        config.provider.api_key.clone(),
        config.provider.api_base.clone(),
        timeout,
    ))
}

async fn start(config_path: Option<&Path>) -> Result<()> {
    info!("Loading configuration...");
    let config = load_config(config_path)?;

    let settings = RelaySettings::from_config(&config);
    let provider = setup_provider(&config);
    info!(
        "Relaying to {} model {} (max_tokens={}, timeout={}s, retries={})",
        provider.name(),
        settings.model,
        settings.params.max_tokens,
        settings.request_timeout.as_secs(),
        settings.retry.max_retries
    );
    let handler = Arc::new(RelayHandler::new(provider, settings));

    let mut bus = MessageBus::default();
    let inbound_rx = bus
        .take_inbound_rx()
        .ok_or_else(|| anyhow::anyhow!("Inbound receiver already taken"))?;

    let allow_from = &config.telegram.allow_from;
    if allow_from.is_empty() {
        warn!("telegram.allowFrom is empty: every incoming message will be dropped");
    } else if allow_from.iter().any(|a| a.trim() == "*") {
        warn!("telegram.allowFrom contains \"*\": every Telegram user can reach the bot");
    }
    let mut telegram = TelegramChannel::new(config.telegram.clone(), bus.sender());
    telegram
        .start()
        .await
        .context("Failed to start Telegram channel")?;
    let channel: Arc<dyn BaseChannel> = Arc::new(telegram);

    println!("chatrelay {} running. Press Ctrl-C to stop.", crate::VERSION);
    info!("All services started, relay is running");

    let dispatcher = Dispatcher::new(handler, Arc::clone(&channel));
    let shutdown_channel = Arc::clone(&channel);
    dispatcher
        .run_until(inbound_rx, async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            println!("\nShutting down...");
            if let Err(e) = shutdown_channel.stop().await {
                warn!("error stopping {} channel: {:#}", shutdown_channel.name(), e);
            }
        })
        .await;

    info!("relay stopped");
    Ok(())
}
