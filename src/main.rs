//! ledger_gateway - JSON/HTTP gateway over an accounting engine session
//!
//! Exposes the engine's ledgers, postings, stock and orders as a flat JSON
//! API. All engine access goes through one shared, serialized session.

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledger_gateway::api;
use ledger_gateway::config::{EngineBackend, LogFormat};
use ledger_gateway::engine::{EngineHandle, InMemoryEngine};
use ledger_gateway::Config;

/// Initialize tracing/logging
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ledger_gateway=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Open the engine session selected by configuration
fn open_engine(config: &Config) -> EngineHandle {
    match config.engine_backend {
        EngineBackend::Memory => {
            tracing::warn!(
                company = %config.company_name,
                "Using the in-memory sandbox engine; nothing is persisted"
            );
            EngineHandle::new(InMemoryEngine::new(config.company_name.clone()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(config.log_format);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(
        environment = %config.environment,
        production = config.is_production(),
        "Starting ledger_gateway"
    );

    let engine = open_engine(&config);
    let status = engine.call(|engine| engine.status())?;
    tracing::info!(
        engine_version = %status.engine_version,
        company = %status.company_name,
        "Engine session opened"
    );

    let dispatcher = api::create_dispatcher(engine);
    tracing::info!(routes = dispatcher.routes().len(), "Route table built");

    let app = api::create_router(dispatcher, config.request_timeout());

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down. Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
