//! Factorio Bridge - Discord-Factorio chat bridge
//!
//! Tails the Factorio server log and relays chat, joins, research, deaths
//! and rocket launches to a Discord channel. Messages posted in that
//! channel are sent back into the game over RCON.

mod bridge;
mod common;
mod config;
mod discord;
mod game;
mod protocol;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use serenity::model::id::ChannelId;
use tokio::signal;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use bridge::state::PRESENCE_IDLE;
use bridge::{
    refresh_player_count, schedule, spawn_router, ConsoleClient, PlayerCountTracker,
    RelayChannels,
};
use common::PresenceUpdate;
use config::env::{load_dotenv, log_level_from_env, parse_log_level};
use config::load_and_validate;
use discord::{DiscordBotBuilder, DiscordSink, InboundHandler, InboundSenders};
use game::tailer::poll_interval;
use game::{run_log_pipeline, LogTailer, PipelineSenders};
use protocol::rcon::RconClient;

/// Interval between player count polls.
const PLAYER_COUNT_REFRESH: Duration = Duration::from_secs(60);

/// How long startup waits for the Discord gateway.
const DISCORD_READY_TIMEOUT: Duration = Duration::from_secs(15);

/// How long shutdown waits for in-flight messages to drain.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be read before logging so LOG_LEVEL can come from it
    let dotenv_result = load_dotenv();

    // Initialize logging
    let level = parse_log_level(log_level_from_env().as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Factorio Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    dotenv_result.map_err(|e| {
        error!("{}", e);
        e
    })?;

    // Load configuration
    let config = load_and_validate().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Set the required environment variables or provide a .env file.");
        e
    })?;
    let config = Arc::new(config);

    info!("Configuration loaded successfully");
    info!("  Discord channel: {}", config.discord.channel_id);
    info!("  RCON: {}", config.rcon.address());
    for path in config.logs.paths() {
        info!("  Log file: {}", path.display());
    }
    info!("  Features: {:?}", config.features);
    debug!("  Log level: {}", config.log_level.as_deref().unwrap_or("info"));

    // ============================================================
    // Open log files (fatal if missing)
    // ============================================================
    let interval = poll_interval(config.features.poll_log);
    let mut tailers = Vec::new();
    for path in config.logs.paths() {
        let tailer = LogTailer::open(&path, interval)
            .await
            .with_context(|| format!("Failed to open log file {}", path.display()))
            .map_err(|e| {
                error!("{:#}", e);
                e
            })?;
        tailers.push(tailer);
    }

    // ============================================================
    // Create channels and relay consumers
    // ============================================================
    let RelayChannels { senders, receivers } = RelayChannels::new();
    let players = Arc::new(PlayerCountTracker::new());
    let console: Arc<dyn ConsoleClient> = Arc::new(RconClient::new(&config.rcon));
    let sink = Arc::new(DiscordSink::new(ChannelId::new(config.discord.channel_id)));

    let router = spawn_router(
        receivers,
        sink.clone(),
        console.clone(),
        players.clone(),
        senders.to_chat.clone(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ============================================================
    // Start Discord bot
    // ============================================================
    let inbound = InboundHandler::new(
        ChannelId::new(config.discord.channel_id),
        config.features.achievement_mode,
        InboundSenders {
            to_game: senders.to_game.clone(),
            commands: senders.commands.clone(),
            to_chat: senders.to_chat.clone(),
        },
    );

    let (ready_tx, ready_rx) = oneshot::channel::<()>();
    let discord_bot = DiscordBotBuilder::new(
        config.discord.token.clone(),
        inbound,
        sink.clone(),
        shutdown_rx.clone(),
    )
    .build(ready_tx)
    .await?;

    info!("Starting Discord bot...");
    let mut discord_task = tokio::spawn(discord_bot.run());

    info!("Waiting for Discord to connect...");
    let discord_ready = match tokio::time::timeout(DISCORD_READY_TIMEOUT, ready_rx).await {
        Ok(Ok(())) => true,
        Ok(Err(_)) => {
            error!("Discord ready signal sender was dropped before firing - initialization failed");
            false
        }
        Err(_) => {
            error!("Timed out waiting for Discord ({}s) - initialization failed", DISCORD_READY_TIMEOUT.as_secs());
            false
        }
    };

    if !discord_ready {
        error!("Failed to initialize Discord client - shutting down");
        // Give a moment for error logs to flush
        tokio::time::sleep(Duration::from_secs(1)).await;
        std::process::exit(1);
    }

    // ============================================================
    // Initial presence and player count
    // ============================================================
    if senders.presence.send(PresenceUpdate::watching(PRESENCE_IDLE)).await.is_err() {
        debug!("Presence channel closed before startup finished");
    }
    refresh_player_count(console.as_ref(), &players, &senders.presence).await;

    // ============================================================
    // Log workers and periodic refresh
    // ============================================================
    let mut pipelines = JoinSet::new();
    for tailer in tailers {
        pipelines.spawn(run_log_pipeline(
            tailer,
            config.features,
            players.clone(),
            PipelineSenders {
                to_chat: senders.to_chat.clone(),
                presence: senders.presence.clone(),
            },
            shutdown_rx.clone(),
        ));
    }

    let scheduler = {
        let console = console.clone();
        let players = players.clone();
        let presence_tx = senders.presence.clone();
        schedule(PLAYER_COUNT_REFRESH, move || {
            let console = console.clone();
            let players = players.clone();
            let presence_tx = presence_tx.clone();
            async move {
                refresh_player_count(console.as_ref(), &players, &presence_tx).await;
            }
        })
    };

    // Producers now hold their own clones; channels close when they stop.
    drop(senders);

    info!("Bridge running");

    // ============================================================
    // Run until a signal or a core task ends
    // ============================================================
    tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - stopping bridge...");
        }
        _ = &mut discord_task => {
            warn!("Discord task ended unexpectedly");
        }
        Some(_) = pipelines.join_next() => {
            warn!("Log worker ended unexpectedly");
        }
    }

    scheduler.stop().await;

    // Tailers and the Discord task stop and drop their senders
    if let Err(e) = shutdown_tx.send(true) {
        debug!("Shutdown channel closed (tasks already exited): {}", e);
    }

    let drain = async {
        if !discord_task.is_finished() {
            if let Err(e) = discord_task.await {
                warn!("Discord task panicked: {}", e);
            }
        }
        while let Some(result) = pipelines.join_next().await {
            if let Err(e) = result {
                warn!("Log worker panicked: {}", e);
            }
        }
        router.join().await;
    };

    match tokio::time::timeout(DRAIN_TIMEOUT, drain).await {
        Ok(()) => info!("All messages drained"),
        Err(_) => warn!("Timed out draining messages"),
    }

    info!("Exiting...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
