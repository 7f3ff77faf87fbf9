use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};

use super::StreamQuery;
use crate::{common::ErrorResponse, resolver::StreamResponse, server::AppState};

/// GET /stream?id=...&quality=...
pub async fn get_stream(
    uri: Uri,
    Query(params): Query<StreamQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let path = uri.path();

    let content_id = match params.content_id() {
        Ok(id) => id,
        Err(e) => return ErrorResponse::from_error(&e, path).into_response(),
    };
    let quality = params.quality(state.config.resolver.default_quality);
    tracing::info!("GET {} id={} quality={}", path, content_id, quality);

    match state.resolver.resolve(&content_id, quality).await {
        Ok(descriptor) => (StatusCode::OK, Json(StreamResponse::from(&descriptor))).into_response(),
        Err(e) => {
            tracing::warn!("GET {} id={}: {}", path, content_id, e);
            ErrorResponse::from_error(&e, path)
                .with_content_id(content_id.as_str())
                .into_response()
        }
    }
}
