//! Chainbell Server
//!
//! Ingests program logs over HTTP, turns them into marketplace events and
//! notifies the wallets involved through signed webhooks.

mod api;
mod config;
mod render;
mod server;
mod shutdown;
mod state;

use chainbell_core::events::log_batch_channel;
use chainbell_core::framework::DatabaseProcessor;
use chainbell_core::notify::{NotificationManager, PgSubscriptionStore, WebhookChannel};
use chainbell_core::parser::EventParser;
use chainbell_core::processors::NotificationPipeline;
use clap::Parser;
use config::file::LogFormat;
use config::{ConfigLoader, get_database_url};
use render::WebhookPayloadRenderer;
use server::{build_router, run_server};
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Chainbell - on-chain marketplace event notifications
#[derive(Parser, Debug)]
#[command(name = "chainbell-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./chainbell.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Configuration decides the log format, so it is loaded before tracing.
    let config = ConfigLoader::new(&args.config, args.listen).load()?;
    init_tracing(config.server.log_format);

    tracing::info!("Starting chainbell-server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Configuration loaded from {:?}", args.config);

    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    let parser = EventParser::new(config.program.token_decimals);
    let manager = NotificationManager::new(
        PgSubscriptionStore::new(DatabaseProcessor::new(db_pool.clone())),
        WebhookChannel::new(
            config.webhook.signing_secret.clone(),
            config.request_timeout(),
        ),
        config.notification_config(),
    );
    let pipeline = NotificationPipeline::new(parser, manager, WebhookPayloadRenderer);

    let (batch_tx, batch_rx) = log_batch_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pipeline_handle = tokio::spawn(pipeline.run(batch_rx, shutdown_rx));

    let state = AppState::new(batch_tx, parser, config.program.program_id.clone());
    let router = build_router(state);

    let listen_addr = config.server.listen;
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Batches already queued are abandoned; in-flight deliveries finish first.
    let _ = shutdown_tx.send(true);
    if let Err(e) = pipeline_handle.await {
        tracing::error!(error = %e, "Notification pipeline task failed");
    }

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}
