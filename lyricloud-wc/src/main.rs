//! lyricloud-wc - Lyrics word-cloud service
//!
//! Start-up order: `.env` → CLI/env → TOML config → logging → credential
//! (fail fast) → provider client → renderer → HTTP server.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lyricloud_common::config::{self, LoggingConfig};
use lyricloud_common::events::EventBus;
use lyricloud_wc::credentials::load_credential;
use lyricloud_wc::services::{GeniusClient, RenderOptions, WordCloudRenderer};
use lyricloud_wc::shell::Shell;
use lyricloud_wc::AppState;

/// Command-line arguments for lyricloud-wc
#[derive(Parser, Debug)]
#[command(name = "lyricloud-wc")]
#[command(about = "Generate word clouds from song lyrics")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides server.port)
    #[arg(short, long, env = "LYRICLOUD_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides server.host)
    #[arg(long)]
    host: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be applied before clap reads env-backed arguments
    let dotenv_path = dotenvy::dotenv().ok();

    let args = Args::parse();

    let config_path = config::resolve_config_path(args.config.as_deref());
    let toml_config = config::load_toml_config(config_path.as_deref())
        .context("Failed to load configuration")?;

    init_tracing(&toml_config.logging)?;

    info!(
        "Starting lyricloud-wc v{} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );
    if let Some(path) = &dotenv_path {
        info!("Loaded environment from {}", path.display());
    }
    match &config_path {
        Some(path) if path.exists() => info!("Config: {}", path.display()),
        Some(path) => warn!("Config file {} does not exist, using defaults", path.display()),
        None => info!("Config: built-in defaults"),
    }

    let credential = load_credential(&toml_config).context("Genius access token is required")?;
    let provider = GeniusClient::new(credential, &toml_config.genius)
        .context("Failed to build Genius client")?;
    info!("Genius client ready ({})", toml_config.genius.api_base);

    let renderer = WordCloudRenderer::from_config(&toml_config.render)
        .context("Failed to initialize word-cloud renderer")?;
    let options = RenderOptions::from_config(&toml_config.render)
        .context("Invalid render configuration")?;
    info!(
        "Renderer ready: canvas {}x{}, up to {} words",
        options.width, options.height, options.max_words
    );

    let event_bus = EventBus::new(100);
    let shell = Arc::new(Shell::new(
        Arc::new(provider),
        Arc::new(renderer),
        options,
        event_bus.clone(),
    ));
    let state = AppState::new(shell, event_bus, toml_config.render.frame.pixel_size());
    let app = lyricloud_wc::build_router(state);

    let host = args.host.unwrap_or(toml_config.server.host);
    let port = args.port.unwrap_or(toml_config.server.port);
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// RUST_LOG wins over `logging.level`; `logging.file` adds a plain-text copy
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "lyricloud_wc={0},lyricloud_common={0},tower_http={0}",
            logging.level
        ))
    });

    let file_layer = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
