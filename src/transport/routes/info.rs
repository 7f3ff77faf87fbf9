use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub cached_streams: usize,
    pub strategies: Vec<String>,
}

/// GET /health
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cached_streams: state.resolver.cache().len(),
        strategies: state.resolver.strategy_names(),
    })
}

/// GET /version
pub async fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
