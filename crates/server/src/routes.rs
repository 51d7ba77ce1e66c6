use std::{path::Path, sync::Arc};

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};
use utoipa::OpenApi;

use common::types::Health;
use service::credential::CredentialService;

use crate::openapi::ApiDoc;

pub mod credentials;

pub const WORKER_HEADER: HeaderName = HeaderName::from_static("x-worker-id");

#[derive(Clone)]
pub struct ServerState {
    pub credentials: Arc<CredentialService>,
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health(State(state): State<ServerState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        worker: state.credentials.worker_id().to_string(),
        credentials: state.credentials.count().await,
    })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: credential endpoints, health, the
/// OpenAPI document and the static frontend as fallback.
pub fn build_router(state: ServerState, cors: CorsLayer, frontend_dir: impl AsRef<Path>) -> Router {
    let frontend_dir = frontend_dir.as_ref();
    let static_dir = ServeDir::new(frontend_dir).fallback(ServeFile::new(frontend_dir.join("index.html")));

    let worker = state.credentials.worker_id().to_string();

    let router = Router::new()
        .route("/health", get(health))
        .route("/issue", post(credentials::issue))
        .route("/verify", post(credentials::verify))
        .route("/api-docs/openapi.json", get(openapi_json))
        .fallback_service(static_dir)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx is logged at ERROR
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        );

    match HeaderValue::from_str(&worker) {
        Ok(value) => router.layer(SetResponseHeaderLayer::overriding(WORKER_HEADER, value)),
        Err(_) => {
            warn!(%worker, "worker id is not a valid header value; X-Worker-Id disabled");
            router
        }
    }
}
