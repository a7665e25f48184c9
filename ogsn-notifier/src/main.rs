//! OGS Game Notifier
//!
//! Watches the live game list of an online-go.com style server and raises a
//! desktop notification whenever a strong game starts.

mod api;
mod config;
mod notifier;
mod server;
mod shutdown;
mod state;

use clap::{Parser, Subcommand};
use config::{ConfigLoader, LoadedConfig, Overrides};
use notifier::DesktopNotifier;
use ogsn_core::config::ConfigStore;
use ogsn_core::connection::{ConnectionManager, WsDialer};
use ogsn_core::correlator::RequestCorrelator;
use ogsn_core::events::game_notification_channel;
use ogsn_core::keepalive::Keepalive;
use ogsn_core::processors::{GamePoller, NotificationSender};
use ogsn_core::store::SnapshotStore;
use ogsn_sdk::client::PlayersClient;
use ogsn_sdk::objects::{GameList, PlayersPage};
use ogsn_sdk::rank::rank_label;
use server::{build_router, run_server};
use shutdown::{shutdown_requested, shutdown_signal, spawn_config_reload_handler};
use state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// OGS Game Notifier - desktop alerts for strong live games
#[derive(Parser, Debug)]
#[command(name = "ogsn-notifier")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "OGSN_CONFIG", default_value = "./ogsn-config.toml")]
    config: PathBuf,

    /// Log ogsn crates at debug level (ignored when RUST_LOG is set)
    #[arg(long, default_value = "false")]
    debug: bool,

    /// Override the game list to watch (live or correspondence)
    #[arg(long, value_parser = parse_game_list)]
    list: Option<GameList>,

    /// Override the server base URL (e.g., https://online-go.com)
    #[arg(long)]
    endpoint: Option<Url>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the game list and notify (default)
    Run,
    /// Print one page of the rating-service player listing
    Players {
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Print the raw page as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_game_list(s: &str) -> Result<GameList, String> {
    match s {
        "live" => Ok(GameList::Live),
        "correspondence" => Ok(GameList::Correspondence),
        other => Err(format!("unknown game list {other:?}")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    tracing::info!("Starting ogsn-notifier v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = Arc::new(ConfigLoader::new(
        &args.config,
        Overrides {
            list: args.list,
            endpoint: args.endpoint,
        },
    ));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(loaded_config, config_loader).await,
        Command::Players { page, json } => list_players(&loaded_config, page, json).await,
    }
}

async fn run(config: LoadedConfig, config_loader: Arc<ConfigLoader>) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let store = Arc::new(SnapshotStore::new(config.poll.max_entries));
    let settings = ConfigStore::new(config.filter);

    let (manager, supervisor) = ConnectionManager::new(WsDialer, config.connection.clone());
    tracing::info!("Connecting to {}", config.connection.endpoint);
    manager.open().await.map_err(|e| {
        tracing::error!("Failed to connect: {}", e);
        e
    })?;

    // -- Processors ------------------------------------------------------
    let supervisor_handle = {
        let shutdown_tx = shutdown_tx.clone();
        let shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            let result = supervisor.run(shutdown_rx).await;
            if result.is_err() {
                shutdown_tx.send_replace(true);
            }
            result
        })
    };

    let keepalive_handle = tokio::spawn(
        Keepalive::new(manager.clone(), config.keepalive).run(shutdown_rx.clone()),
    );

    let (notify_tx, notify_rx) = game_notification_channel();
    let poller = GamePoller::new(
        RequestCorrelator::new(manager.clone()),
        store.clone(),
        settings.clone(),
        config.poll.clone(),
        notify_tx,
    );
    let poller_handle = {
        let shutdown_tx = shutdown_tx.clone();
        let shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            let result = poller.run(shutdown_rx).await;
            if result.is_err() {
                shutdown_tx.send_replace(true);
            }
            result
        })
    };

    let sender = NotificationSender::new(
        DesktopNotifier::from(config.notifier.backend),
        config.notifier.icon.clone(),
        config.connection.endpoint.clone(),
    );
    let sender_handle = tokio::spawn(sender.run(notify_rx, shutdown_rx.clone()));

    let reload_handle =
        spawn_config_reload_handler(config_loader, settings.clone(), shutdown_rx.clone())?;

    let server_handle = config.status.listen.map(|addr| {
        let router = build_router(AppState::new(store.clone(), settings.clone(), &manager));
        tokio::spawn(run_server(router, addr, shutdown_rx.clone()))
    });

    // -- Wait for a signal or a processor giving up -----------------------
    tokio::select! {
        signal = shutdown_signal() => {
            if let Err(e) = signal {
                tracing::error!("Failed to install signal handlers: {}", e);
            }
        }
        _ = shutdown_requested(shutdown_rx.clone()) => {
            tracing::warn!("A processor stopped, shutting down");
        }
    }
    shutdown_tx.send_replace(true);

    tracing::info!("Closing connection...");
    manager.close().await;

    let supervisor_result = supervisor_handle.await?;
    let poller_result = poller_handle.await?;
    keepalive_handle.await?;
    sender_handle.await?;
    reload_handle.await?;
    if let Some(handle) = server_handle {
        if let Err(e) = handle.await? {
            tracing::error!("Status server failed: {}", e);
        }
    }
    store.close();
    tracing::info!("Shutdown complete");

    supervisor_result?;
    poller_result?;
    Ok(())
}

async fn list_players(config: &LoadedConfig, page: u32, json: bool) -> anyhow::Result<()> {
    let client = PlayersClient::new(config.connection.endpoint.clone());
    let players = client.list_players(page).await?;
    println!("{}", render_players(&players, page, json)?);
    if let Some(next) = &players.next {
        tracing::debug!(%next, "More pages available");
    }
    Ok(())
}

fn render_players(players: &PlayersPage, page: u32, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(players)?);
    }
    let mut out = format!("{} players, page {}", players.count, page);
    for player in &players.results {
        out.push_str(&format!(
            "\n{:>10}  {:<24} {:>4}  {:>7.1}",
            player.id,
            player.username,
            rank_label(player.overall_rating()),
            player.overall_rating()
        ));
    }
    Ok(out)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "info,ogsn_core=debug,ogsn_notifier=debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
