#[cfg(test)]
mod tests;

use crate::channels::manager::ChannelManager;
use crate::config::credentials::{CREDENTIAL_ENV_VARS, get_credential_value};
use crate::config::{Config, get_config_path, load_config};
use crate::gateway::{self, GatewayState};
use crate::relay::RelayPipeline;
use crate::session::SessionManager;
use anyhow::{Context, Result};
use axum::Router;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "chatrelay", version)]
#[command(about = "Relay SMS/WhatsApp webhooks and Discord messages to a generative-text provider")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP listener and all enabled channels
    Serve {
        /// Config file (default: ~/.chatrelay/config.json)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override gateway.port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Load and validate configuration, then print a redacted summary
    Check {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, port } => serve(config.as_deref(), port).await,
        Commands::Check { config } => check(config.as_deref()),
    }
}

/// Wire the provider, session state and optional player lookup into a pipeline.
fn build_pipeline(config: &Config) -> Arc<RelayPipeline> {
    let sessions = Arc::new(SessionManager::new(config.relay.active_by_default));
    let mut pipeline = RelayPipeline::new(config.create_provider(), sessions, config.relay_config());
    if let Some(lookup) = config.create_player_lookup() {
        info!("Player lookup enabled via {}", config.game.proxy_url);
        pipeline = pipeline.with_player_lookup(lookup);
    }
    Arc::new(pipeline)
}

#[cfg(feature = "channel-twilio")]
fn twilio_routes(config: &Config, pipeline: &Arc<RelayPipeline>) -> Option<Router> {
    let twilio = &config.channels.twilio;
    if !twilio.enabled {
        return None;
    }
    info!("Twilio webhook enabled at POST {}", twilio.webhook_path);
    Some(crate::channels::twilio::router(
        &twilio.webhook_path,
        pipeline.clone(),
    ))
}

#[cfg(not(feature = "channel-twilio"))]
fn twilio_routes(config: &Config, _pipeline: &Arc<RelayPipeline>) -> Option<Router> {
    if config.channels.twilio.enabled {
        warn!("Twilio is enabled in config but this build lacks channel-twilio");
    }
    None
}

/// Assemble the full HTTP app plus the channel manager for `config`.
fn build_app(config: &Config) -> (Router, ChannelManager) {
    let pipeline = build_pipeline(config);
    let channels = ChannelManager::new(config, &pipeline);
    let state = GatewayState::new(pipeline.clone(), channels.status("discord"));
    let app = gateway::build_router(state, twilio_routes(config, &pipeline));
    (app, channels)
}

async fn serve(config_path: Option<&Path>, port: Option<u16>) -> Result<()> {
    info!("Loading configuration...");
    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.gateway.port = port;
    }
    config
        .validate()
        .context("Configuration validation failed")?;
    info!(
        "Configuration loaded. Using provider: {} ({})",
        config.provider.kind,
        config.provider.model.as_deref().unwrap_or("default model")
    );

    let (app, mut channels) = build_app(&config);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let (addr, mut http_task) = gateway::start(
        &config.gateway.host,
        config.gateway.port,
        app,
        async move {
            shutdown_rx.await.ok();
        },
    )
    .await?;

    channels.start_all().await?;

    println!("Starting chatrelay...");
    println!("Enabled channels: {:?}", channels.enabled_channels());
    println!("HTTP listening on {}", addr);
    info!("All services started, relay is running");

    let server_exited = tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!("Failed to listen for ctrl-c: {}", e);
            }
            println!("\nShutting down...");
            false
        }
        _ = &mut http_task => {
            error!("HTTP server stopped unexpectedly");
            true
        }
    };

    let _ = shutdown_tx.send(());
    if let Err(e) = channels.stop_all().await {
        warn!("Error while stopping channels: {}", e);
    }
    if !server_exited {
        let _ = http_task.await;
    }

    Ok(())
}

/// Human-readable, secret-free description of `config`.
fn summary(config: &Config) -> Vec<String> {
    let set_or_unset = |v: Option<&str>| match v {
        Some(v) if !v.is_empty() => "set",
        _ => "not set",
    };

    let mut lines = vec![
        format!("gateway: {}:{}", config.gateway.host, config.gateway.port),
        format!(
            "provider: {} model={} timeout={}s retries={}",
            config.provider.kind,
            config.provider.model.as_deref().unwrap_or("default"),
            config.provider.timeout_secs,
            config.provider.max_retries
        ),
        format!(
            "relay: prefix={:?} requireActivation={} history={}",
            config.relay.command_prefix,
            config.relay.require_activation,
            if config.relay.history.enabled {
                format!("last {} turns", config.relay.history.window)
            } else {
                "off".to_string()
            }
        ),
        format!(
            "twilio: {}",
            if config.channels.twilio.enabled {
                format!("POST {}", config.channels.twilio.webhook_path)
            } else {
                "disabled".to_string()
            }
        ),
        format!(
            "discord: {}",
            if config.channels.discord.enabled { "enabled" } else { "disabled" }
        ),
        format!(
            "player lookup: {}",
            if config.game.enabled { "enabled" } else { "disabled" }
        ),
    ];
    for (name, env) in CREDENTIAL_ENV_VARS {
        lines.push(format!(
            "credential {}: {} (env {})",
            name,
            set_or_unset(get_credential_value(config, name)),
            env
        ));
    }
    lines
}

fn check(config_path: Option<&Path>) -> Result<()> {
    let path = config_path.map_or_else(get_config_path, Path::to_path_buf);
    let config = load_config(Some(&path))?;
    println!("Config: {}", path.display());
    for line in summary(&config) {
        println!("  {}", line);
    }
    config
        .validate()
        .context("Configuration validation failed")?;
    println!("Configuration OK");
    Ok(())
}
