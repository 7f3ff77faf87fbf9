//! Local stub upstreams for tests that talk HTTP.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use futures::StreamExt;
use tokio::net::TcpListener;

use crate::proxy::ByteRange;

pub const MEDIA_LEN: usize = 256;

/// Serves `router` on an ephemeral loopback port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// The stub media body: bytes `0x00..=0xFF`.
pub fn media() -> Vec<u8> {
    (0..MEDIA_LEN).map(|b| b as u8).collect()
}

#[derive(Clone)]
struct MediaHost {
    hits: Arc<AtomicUsize>,
    accepted_ua: Option<&'static str>,
}

/// Media host with range support.
///
/// `/videoplayback` serves [`media`] (only to `accepted_ua` when set),
/// `/denied` always answers 403, `/gone` answers 410 and `/broken` drops
/// the connection after ten bytes.
pub async fn media_upstream(accepted_ua: Option<&'static str>) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/videoplayback", get(media_handler))
        .route("/denied", get(|| async { StatusCode::FORBIDDEN }))
        .route("/gone", get(|| async { StatusCode::GONE }))
        .route("/broken", get(broken_handler))
        .with_state(MediaHost {
            hits: hits.clone(),
            accepted_ua,
        });
    (serve(app).await, hits)
}

async fn media_handler(State(host): State<MediaHost>, headers: HeaderMap) -> Response {
    host.hits.fetch_add(1, Ordering::SeqCst);

    let ua = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if host.accepted_ua.is_some_and(|accepted| accepted != ua) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let body = media();
    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(ByteRange::parse);

    let (start, end) = match range {
        None => {
            return (
                [
                    (header::CONTENT_TYPE, "audio/mp4"),
                    (header::ACCEPT_RANGES, "bytes"),
                ],
                body,
            )
                .into_response();
        }
        Some(ByteRange::Bounded { start, end }) => (start as usize, end as usize),
        Some(ByteRange::From { start }) => (start as usize, MEDIA_LEN - 1),
        Some(ByteRange::Suffix { len }) => (MEDIA_LEN.saturating_sub(len as usize), MEDIA_LEN - 1),
    };
    if start >= MEDIA_LEN {
        return StatusCode::RANGE_NOT_SATISFIABLE.into_response();
    }
    let end = end.min(MEDIA_LEN - 1);

    let mut res = body[start..=end].to_vec().into_response();
    *res.status_mut() = StatusCode::PARTIAL_CONTENT;
    let h = res.headers_mut();
    h.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mp4"));
    if let Ok(v) = HeaderValue::from_str(&format!("bytes {}-{}/{}", start, end, MEDIA_LEN)) {
        h.insert(header::CONTENT_RANGE, v);
    }
    res
}

async fn broken_handler() -> Response {
    let parts = futures::stream::iter(vec![
        Ok(Bytes::from_static(b"0123456789")),
        Err(std::io::Error::other("connection reset")),
    ])
    .then(|part| async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        part
    });
    Body::from_stream(parts).into_response()
}

/// Raised when the body of an `/endless` response is dropped.
struct ClosedFlag(Arc<AtomicBool>);

impl Drop for ClosedFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Media host whose `/endless` route streams [`media`] forever. The flag
/// flips once the server drops the body, i.e. after the client hung up.
pub async fn endless_upstream() -> (String, Arc<AtomicBool>) {
    let closed = Arc::new(AtomicBool::new(false));
    let flag = closed.clone();
    let app = Router::new().route(
        "/endless",
        get(move || {
            let guard = ClosedFlag(flag.clone());
            async move {
                let parts = futures::stream::unfold(guard, |guard| async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Some((Ok::<_, std::io::Error>(Bytes::from(media())), guard))
                });
                ([(header::CONTENT_TYPE, "audio/webm")], Body::from_stream(parts))
            }
        }),
    );
    (serve(app).await, closed)
}
