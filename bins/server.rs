use tracing::{error, info};
use uuid::Uuid;

fn main() -> std::process::ExitCode {
    // loads .env and initializes logging before anything else is logged
    let cfg = match server::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "server", event = "config_invalid", error = %e, "failed to load configuration");
            return std::process::ExitCode::FAILURE;
        }
    };

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");
    let worker = cfg.worker.id.clone();

    std::panic::set_hook(Box::new({
        let worker = worker.clone();
        move |info| {
            error!(
                service = "server",
                event = "panic",
                %service_id,
                %worker,
                pid,
                message = %info,
                "unhandled panic occurred"
            );
        }
    }));

    let worker_threads = cfg.server.worker_threads;
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads { builder.worker_threads(w); }

    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "server", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(
        service = "server",
        event = "start",
        %service_id,
        %worker,
        pid,
        version,
        threads = worker_threads.unwrap_or_default(),
        "credential issuer starting"
    );

    // serve() returns after graceful shutdown on Ctrl+C / SIGTERM
    match rt.block_on(server::serve(cfg)) {
        Ok(()) => {
            info!(service = "server", event = "stop", %service_id, pid, "server stopped normally");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = "server", event = "run_failed", error = %e, "server::serve returned error");
            std::process::ExitCode::FAILURE
        }
    }
}
