use std::sync::Arc;

use axum::{Router, middleware, routing::get};

use crate::{
    server::AppState,
    transport::{
        middleware::add_response_headers,
        routes::{info, preflight, stream, stream_proxy},
    },
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/stream", get(stream::get_stream).options(preflight))
        .route("/api/stream", get(stream::get_stream).options(preflight))
        .route(
            "/stream-proxy",
            get(stream_proxy::stream_proxy)
                .head(stream_proxy::stream_proxy)
                .options(preflight),
        )
        .route("/health", get(info::get_health))
        .route("/version", get(info::get_version))
        .layer(middleware::from_fn(add_response_headers))
        .with_state(state)
}
