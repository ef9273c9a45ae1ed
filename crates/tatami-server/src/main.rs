//! tatami gateway binary.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tatami_channels::telegram::TelegramClient;
use tatami_channels::whatsapp::WhatsAppClient;
use tatami_core::{Dispatcher, HttpAgent, SessionStore};
use tatami_server::{ApiState, build_router};
use tatami_store::{TurnRecorder, TurnStore};
use tatami_types::config::GatewayConfig;

#[derive(Parser, Debug)]
#[command(name = "tatami", version, about = "Conversational gateway")]
struct Args {
    /// Bind address (overrides TATAMI_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides TATAMI_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// SQLite URL for the turn log (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let mut config = GatewayConfig::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(url) = args.database_url {
        config.database_url = url;
    }
    let config = Arc::new(config);

    let store = TurnStore::connect(&config.database_url)
        .await
        .context("opening turn store")?;

    let shutdown = CancellationToken::new();
    let (recorder, recorder_task) = TurnRecorder::spawn(store.clone(), shutdown.clone());

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(HttpAgent::new(config.agent.clone())),
        Arc::new(SessionStore::new(config.context_window)),
        Arc::new(recorder),
        Duration::from_secs(config.agent.timeout_secs),
        Duration::from_millis(config.agent.retry_backoff_ms),
    ));

    let telegram = (!config.telegram.bot_token.is_empty())
        .then(|| Arc::new(TelegramClient::new(&config.telegram.bot_token)));
    if let Some(ref client) = telegram {
        match client.get_me().await {
            Ok(me) => info!(
                bot = me.username.as_deref().unwrap_or(&me.first_name),
                "telegram bot token verified"
            ),
            Err(e) => warn!(error = %e, "telegram bot token could not be verified"),
        }
    }

    let whatsapp = (!config.whatsapp.access_token.is_empty())
        .then(|| Arc::new(WhatsAppClient::new(&config.whatsapp)));

    info!(
        telegram = telegram.is_some(),
        whatsapp = whatsapp.is_some(),
        context_window = config.context_window,
        "channels configured"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_router(ApiState {
        dispatcher,
        store,
        telegram,
        whatsapp,
        config,
    });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "tatami gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .context("serving")?;

    // Let the recorder flush everything the dispatcher already handed off.
    shutdown.cancel();
    recorder_task.await.context("stopping turn recorder")?;
    info!("shutdown complete");

    Ok(())
}
