//! Bazaar kernel
//!
//! HTTP server and maintenance commands for the directory layer.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use axum::Router;
use axum::http::{HeaderValue, Method};
use clap::{Parser, Subcommand};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use bazaar_kernel::directory::DirectoryService;
use bazaar_kernel::store::PgDirectoryStore;
use bazaar_kernel::{AppState, Config, db, routes};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Create any missing directory tables.
    Setup,
    /// Probe every directory table and report its status.
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    info!(port = config.port, "Configuration loaded");

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Setup => setup(&config).await,
        Command::Check => check(config).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting Bazaar directory kernel");

    let state = AppState::new(&config)
        .await
        .context("failed to initialize application state")?;

    let cors = build_cors_layer(&config);

    let app = Router::new()
        .merge(routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

async fn setup(config: &Config) -> Result<()> {
    let pool = db::create_pool(config).await?;
    db::apply_schema(&pool).await?;
    println!("directory schema is up to date");
    Ok(())
}

async fn check(config: Config) -> Result<()> {
    let pool = db::create_pool(&config).await?;
    let store = Arc::new(PgDirectoryStore::new(pool, config.statement_timeout_secs));
    let service = DirectoryService::new(store, Arc::new(config));

    let statuses = service.probe_tables().await;
    let mut failing = 0;
    for status in &statuses {
        match &status.error {
            None => println!("{:<22} ok", status.table),
            Some(e) => {
                failing += 1;
                println!("{:<22} {}: {e}", status.table, e.kind().as_str());
            }
        }
    }

    if failing > 0 {
        bail!("{failing} of {} directory tables are not readable", statuses.len());
    }
    Ok(())
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    if config.cors_allowed_origins.len() == 1 && config.cors_allowed_origins[0] == "*" {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
