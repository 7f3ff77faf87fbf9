use std::{convert::Infallible, future::Future, sync::Arc};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use super::StreamQuery;
use crate::{
    common::{ContentId, ErrorResponse, QualityTier, StreamError},
    proxy::{ByteRange, Downstream, ResponseHead},
    resolver::StreamDescriptor,
    server::AppState,
};

/// Feeds a relay into an HTTP response: the head over a oneshot, the body
/// over a single-slot channel so a slow client throttles the upstream read.
struct ChannelDownstream {
    head: Option<oneshot::Sender<ResponseHead>>,
    body: mpsc::Sender<Bytes>,
}

#[async_trait]
impl Downstream for ChannelDownstream {
    async fn send_head(&mut self, head: ResponseHead) -> Result<(), StreamError> {
        self.head
            .take()
            .ok_or(StreamError::DownstreamDisconnected)?
            .send(head)
            .map_err(|_| StreamError::DownstreamDisconnected)
    }

    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), StreamError> {
        self.body
            .send(chunk)
            .await
            .map_err(|_| StreamError::DownstreamDisconnected)
    }

    async fn flush(&mut self) -> Result<(), StreamError> {
        // The send above only completes once the body stream has room.
        Ok(())
    }
}

/// GET|HEAD /stream-proxy?id=...&quality=...
pub async fn stream_proxy(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<StreamQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let path = uri.path();

    let content_id = match params.content_id() {
        Ok(id) => id,
        Err(e) => return ErrorResponse::from_error(&e, path).into_response(),
    };
    let quality = params.quality(state.config.resolver.default_quality);

    let raw_range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let range = raw_range.and_then(ByteRange::parse);
    if let (Some(raw), None) = (raw_range, range) {
        tracing::debug!("Ignoring malformed Range '{}' for {}", raw, content_id);
    }

    tracing::info!(
        "{} {} id={} quality={} range={:?}",
        method,
        path,
        content_id,
        quality,
        range
    );

    let descriptor = match state.resolver.resolve(&content_id, quality).await {
        Ok(d) => d,
        Err(e) => return proxy_error(&e, path, &content_id),
    };

    if method == Method::HEAD {
        let proxy = state.proxy.clone();
        let opened = with_refresh(&state, &content_id, quality, descriptor, |d| {
            let proxy = proxy.clone();
            async move { proxy.open(&d, range).await }
        })
        .await;

        return match opened {
            Ok(upstream) => head_response(&upstream.head, Body::empty()),
            Err(e) => proxy_error(&e, path, &content_id),
        };
    }

    let relay = with_refresh(&state, &content_id, quality, descriptor, |d| {
        start_relay(state.clone(), d, range)
    })
    .await;

    match relay {
        Ok((head, rx)) => {
            let body = futures::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
            });
            head_response(&head, Body::from_stream(body))
        }
        Err(e) => proxy_error(&e, path, &content_id),
    }
}

/// Runs `attempt`; if the upstream refuses every identity, re-resolves the
/// stream once (dropping the cached URL) and tries again.
async fn with_refresh<T, F, Fut>(
    state: &AppState,
    content_id: &ContentId,
    quality: QualityTier,
    descriptor: StreamDescriptor,
    attempt: F,
) -> Result<T, StreamError>
where
    F: Fn(StreamDescriptor) -> Fut,
    Fut: Future<Output = Result<T, StreamError>>,
{
    match attempt(descriptor).await {
        Err(StreamError::UpstreamAccessDenied { status, attempts }) => {
            tracing::warn!(
                "Upstream denied {} after {} identities (last {}), re-resolving",
                content_id,
                attempts,
                status
            );
            let fresh = state.resolver.refresh(content_id, quality).await?;
            attempt(fresh).await
        }
        other => other,
    }
}

/// Spawns the relay and waits for its head. If the relay fails before
/// producing one, its error is returned instead.
async fn start_relay(
    state: Arc<AppState>,
    descriptor: StreamDescriptor,
    range: Option<ByteRange>,
) -> Result<(ResponseHead, mpsc::Receiver<Bytes>), StreamError> {
    let (head_tx, head_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(1);

    let task = tokio::spawn(async move {
        let mut downstream = ChannelDownstream {
            head: Some(head_tx),
            body: body_tx,
        };
        state.proxy.relay(&descriptor, &mut downstream, range).await
    });

    match head_rx.await {
        Ok(head) => Ok((head, body_rx)),
        Err(_) => match task.await {
            Ok(Err(e)) => Err(e),
            Ok(Ok(_)) => Err(StreamError::DownstreamDisconnected),
            Err(e) => {
                tracing::error!("Relay task failed: {}", e);
                Err(StreamError::UpstreamStatus(
                    StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                ))
            }
        },
    }
}

fn head_response(head: &ResponseHead, body: Body) -> Response {
    let mut builder = Response::builder()
        .status(head.status)
        .header(header::CONTENT_TYPE, head.content_type.as_str())
        .header(header::ACCEPT_RANGES, head.accept_ranges.as_str());
    if let Some(len) = head.content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }
    if let Some(range) = &head.content_range {
        builder = builder.header(header::CONTENT_RANGE, range.as_str());
    }

    builder.body(body).unwrap_or_else(|e| {
        tracing::error!("Failed to build proxy response: {}", e);
        StatusCode::BAD_GATEWAY.into_response()
    })
}

fn proxy_error(err: &StreamError, path: &str, content_id: &ContentId) -> Response {
    tracing::warn!("{} id={}: {}", path, content_id, err);
    let body = match err {
        StreamError::ExtractionFailed(_) => ErrorResponse::new(
            StatusCode::NOT_FOUND,
            "no_stream_found",
            err.to_string(),
            path,
        ),
        _ => ErrorResponse::from_error(err, path),
    };
    body.with_content_id(content_id.as_str()).into_response()
}
