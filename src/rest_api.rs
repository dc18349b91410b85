//! HTTP façade over the sensor service.
//!
//! Handlers are thin: every device interaction runs on Tokio's blocking pool
//! because a single poll may sleep through connect retries. Nothing here
//! turns a device problem into an error status; the worst a caller sees is a
//! stale reading or `"success": false`.

use axum::{
    extract::State as AxumState,
    http::{header::InvalidHeaderValue, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::error;

use crate::{
    reading::Reading,
    service::{ConnectResult, SensorService, StatusResult},
};

#[derive(Clone)]
pub struct RestContext {
    pub service: SensorService,
}

// ---------- Router Builder ----------
pub fn build_router(ctx: RestContext, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/data", get(get_data))
        .route("/connect", get(connect))
        .route("/status", get(status))
        .layer(cors)
        .with_state(ctx)
}

/// CORS policy admitting a single browser origin to `GET` endpoints.
///
/// Other origins get no `Access-Control-Allow-Origin` header at all.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, InvalidHeaderValue> {
    let origin = HeaderValue::from_str(origin)?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods([Method::GET]))
}

// ---------- Handlers ----------
async fn health() -> &'static str {
    "ok"
}

async fn get_data(AxumState(ctx): AxumState<RestContext>) -> Json<Reading> {
    let service = ctx.service.clone();
    match tokio::task::spawn_blocking(move || service.poll()).await {
        Ok(reading) => Json(reading),
        Err(e) => {
            error!(error = %e, "Poll cycle failed unexpectedly; serving cached reading");
            Json(ctx.service.latest())
        }
    }
}

async fn connect(AxumState(ctx): AxumState<RestContext>) -> Json<ConnectResult> {
    let service = ctx.service.clone();
    match tokio::task::spawn_blocking(move || service.connect()).await {
        Ok(result) => Json(result),
        Err(e) => {
            error!(error = %e, "Reconnect failed unexpectedly");
            Json(ConnectResult {
                success: false,
                port: ctx.service.port_name().to_string(),
            })
        }
    }
}

async fn status(AxumState(ctx): AxumState<RestContext>) -> Json<StatusResult> {
    Json(ctx.service.status())
}
