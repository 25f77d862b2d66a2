use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tagger_bot::config::BotConfig;
use tagger_bot::engine::directory::InMemoryDirectory;
use tagger_bot::engine::rename_controller::RenameController;
use tagger_bot::gateway::replay::replay_events;
use tagger_bot::steam::client::SteamApi;
use tagger_bot::steam::common::games_in_common;
use tagger_bot::transport::ChannelRenamer;
use tagger_bot::transport::discord::DiscordRenamer;
use tagger_bot::transport::dry_run::DryRunRenamer;

#[derive(Parser)]
#[command(version, about = "Tags voice channels with the game their occupants are playing")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "tagger.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Consume newline-delimited JSON gateway events and keep channel names tagged.
    Run {
        /// Event file; reads stdin when omitted or "-".
        #[arg(long)]
        events: Option<PathBuf>,
    },
    /// List the Steam games every given player owns.
    CommonGames {
        /// Steam Web API key (overrides config and STEAM_API_KEY).
        #[arg(long)]
        key: Option<String>,
        /// Vanity names or 64-bit Steam ids.
        #[arg(required = true)]
        players: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = BotConfig::load(&cli.config).map_err(|e| anyhow!(e))?;

    match cli.command {
        Command::Run { events } => run(config, events).await,
        Command::CommonGames { key, players } => common_games(config, key, players).await,
    }
}

async fn run(config: BotConfig, events: Option<PathBuf>) -> Result<()> {
    let directory = Arc::new(InMemoryDirectory::new());

    let renamer: Arc<dyn ChannelRenamer> = if config.is_dry_run() {
        info!("dry run: channel names are only changed in memory");
        Arc::new(DryRunRenamer::new(
            directory.clone(),
            config.dry_run_latency(),
        ))
    } else {
        Arc::new(
            DiscordRenamer::new(
                &config.discord.token,
                &config.discord.api_base,
                config.discord_timeout(),
            )
            .map_err(|e| anyhow!(e))?,
        )
    };

    let controller = RenameController::new(
        directory.clone(),
        renamer,
        config.to_renamer_settings(),
    );

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            ctrl_c_cancel.cancel();
        }
    });

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match events {
        Some(path) if path.as_os_str() != "-" => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("failed to open event file {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        _ => Box::new(BufReader::new(tokio::io::stdin())),
    };

    info!(settings = ?controller.settings(), "tagger bot starting");

    let stats = replay_events(reader, &directory, &controller, cancel)
        .await
        .map_err(|e| anyhow!(e))?;

    // Let in-flight renames land before exiting.
    controller.drain().await;

    if stats.malformed > 0 {
        warn!(malformed = stats.malformed, "some events could not be parsed");
    }
    info!(
        dispatched = stats.dispatched,
        channels = controller.tracked_channels(),
        "tagger bot stopped"
    );
    Ok(())
}

async fn common_games(config: BotConfig, key: Option<String>, players: Vec<String>) -> Result<()> {
    let key = key.unwrap_or_else(|| config.steam.api_key.clone());
    if key.trim().is_empty() {
        return Err(anyhow!(
            "a Steam Web API key is required (--key, STEAM_API_KEY or [steam].api_key)"
        ));
    }

    let api = SteamApi::new(
        &key,
        std::time::Duration::from_secs(config.steam.request_timeout_secs),
    )?;
    let result = games_in_common(&api, &players, config.steam.concurrency).await?;

    for (player, id) in &result.players {
        println!("{player}: {}", id.as_deref().unwrap_or("(not found)"));
    }
    for id in &result.hidden_libraries {
        println!("{id}: library is private, skipped");
    }
    println!();
    println!("{} games common to all", result.games.len());
    for (appid, name) in &result.games {
        match name {
            Some(name) => println!("{name}"),
            None => println!("{appid}"),
        }
    }
    Ok(())
}
