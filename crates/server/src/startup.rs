use std::sync::Arc;

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::errors::StartupError;
use crate::routes::{self, ServerState};
use service::{
    credential::{CredentialService, CredentialStore},
    runtime,
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load the store and assemble the router for an already validated config.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    runtime::ensure_env(&cfg.storage.frontend_dir).await;

    // creates the data directory if needed; a malformed data file aborts startup here
    let store = CredentialStore::load(&cfg.storage.data_file).await?;
    let credentials = Arc::new(CredentialService::new(store, cfg.worker.id.clone()));

    let state = ServerState { credentials };
    Ok(routes::build_router(state, build_cors(), &cfg.storage.frontend_dir))
}

/// Load `.env`, initialize logging and read the validated config.
pub fn load_config() -> Result<AppConfig, StartupError> {
    dotenv().ok();
    init_logging_from_env();
    AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))
}

/// Build the app and run the HTTP server until Ctrl+C or SIGTERM.
pub async fn serve(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;

    let addr = cfg.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, worker = %cfg.worker.id, data_file = %cfg.storage.data_file, "starting credential issuer");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal"),
        () = terminate => info!("Received SIGTERM signal"),
    }
    info!("Shutdown signal received, terminating gracefully...");
}
