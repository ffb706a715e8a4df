use crate::config::ServerConfig;
use crate::resolver::{self, ErrorBody, Upstream, METHOD_NOT_ALLOWED_MESSAGE};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    upstream: Arc<dyn Upstream>,
}

impl AppState {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }
}

pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let api = post(resolve)
        .options(preflight)
        .fallback(method_not_allowed);

    let router = Router::new()
        .route("/api", api)
        .route("/health", get(health_check))
        .with_state(state);

    let router = match &config.static_dir {
        Some(dir) => {
            info!("Serving front-end from {}", dir.display());
            router.fallback_service(ServeDir::new(dir))
        }
        None => router,
    };

    router.layer(cors_layer())
}

pub async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    info!("Resolver proxy listening on http://{}", config.bind);

    axum::serve(listener, create_router(state, config))
        .await
        .context("HTTP server failed")
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::OPTIONS,
            Method::PATCH,
            Method::DELETE,
            Method::POST,
            Method::PUT,
        ])
        .allow_headers([
            HeaderName::from_static("x-csrf-token"),
            HeaderName::from_static("x-requested-with"),
            header::ACCEPT,
            HeaderName::from_static("accept-version"),
            header::CONTENT_LENGTH,
            HeaderName::from_static("content-md5"),
            header::CONTENT_TYPE,
            header::DATE,
            HeaderName::from_static("x-api-version"),
        ])
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed(method: Method) -> Response {
    warn!("Rejected {} request to /api", method);
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody {
            error: METHOD_NOT_ALLOWED_MESSAGE.to_string(),
        }),
    )
        .into_response()
}

/// Anything that is not a JSON object with a usable `url` is answered as a
/// missing URL instead of a framework rejection. Every error reaches the
/// caller as `{error}`.
async fn resolve(State(state): State<AppState>, body: Bytes) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let result = match resolver::requested_url(&body) {
        Ok(url) => resolver::resolve_media(state.upstream.as_ref(), &url).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            if e.is_validation() {
                warn!("Rejected request: {}", e);
            }
            e.into_response()
        }
    }
}
