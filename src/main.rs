//! Pagemark Server
//!
//! A self-hosted annotation server for PDF libraries: highlights, comments,
//! notes and votes, persisted as JSON side files.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pagemark::config::Config;
use pagemark::documents::{DocumentSource, PdfLibrary};
use pagemark::routes;
use pagemark::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "pagemark=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting Pagemark Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Documents directory: {}", config.storage.documents_dir.display());
    tracing::info!("Annotations directory: {}", config.storage.annotations_dir.display());
    if config.access.secret.is_some() {
        tracing::info!("Access secret required on API requests");
    }

    let library = PdfLibrary::new(config.storage.documents_dir.clone());
    match library.list().await {
        Ok(documents) => tracing::info!("Library initialized with {} documents", documents.len()),
        Err(e) => tracing::warn!("Initial library scan failed: {}", e),
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, config.server.port))?;

    // Create application state
    let app_state = AppState::new(config, Arc::new(library));

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    tracing::info!("Pagemark Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
