pub mod range;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::{
    StatusCode,
    header::{
        ACCEPT_ENCODING, ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, HeaderName,
        RANGE, USER_AGENT,
    },
};
use tracing::{debug, info, warn};

pub use range::ByteRange;

use crate::{
    common::{AnyResult, HttpClient, Identity, IdentityRotation, StreamError},
    configs::{ProxyConfig, UpstreamConfig},
    resolver::models::StreamDescriptor,
    sources::youtube::ua,
};

/// Status and the headers the relay forwards downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub content_type: String,
    pub content_length: Option<u64>,
    pub content_range: Option<String>,
    pub accept_ranges: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Completed { bytes: u64 },
    DownstreamClosed { bytes: u64 },
    UpstreamInterrupted { bytes: u64 },
}

impl RelayOutcome {
    /// Body bytes the downstream accepted.
    pub fn bytes(&self) -> u64 {
        match self {
            Self::Completed { bytes }
            | Self::DownstreamClosed { bytes }
            | Self::UpstreamInterrupted { bytes } => *bytes,
        }
    }
}

/// The receiving end of a relay.
///
/// Any error means the consumer is gone; the relay stops without retrying.
#[async_trait]
pub trait Downstream: Send {
    async fn send_head(&mut self, head: ResponseHead) -> Result<(), StreamError>;
    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), StreamError>;
    async fn flush(&mut self) -> Result<(), StreamError>;
}

/// A client identity presented to the media host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
    pub label: String,
    pub user_agent: &'static str,
}

impl IdentityProfile {
    pub fn by_label(label: &str) -> Option<Self> {
        ua::user_agent_for(label).map(|user_agent| Self {
            label: label.trim().to_uppercase(),
            user_agent,
        })
    }
}

impl Identity for IdentityProfile {
    fn label(&self) -> &str {
        &self.label
    }
}

/// An accepted upstream response whose body has not been read yet.
pub struct UpstreamResponse {
    pub head: ResponseHead,
    /// Label of the identity the upstream accepted.
    pub identity: String,
    body: reqwest::Response,
}

pub struct StreamProxy {
    http: reqwest::Client,
    identities: IdentityRotation<IdentityProfile>,
    chunk_size: usize,
}

impl StreamProxy {
    pub fn new(http: reqwest::Client, identities: Vec<IdentityProfile>, chunk_size: usize) -> Self {
        Self {
            http,
            identities: IdentityRotation::new(identities),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn from_config(proxy: &ProxyConfig, upstream: &UpstreamConfig) -> AnyResult<Self> {
        let mut identities: Vec<IdentityProfile> = Vec::new();
        for label in &proxy.identities {
            match IdentityProfile::by_label(label) {
                Some(p) if !identities.contains(&p) => identities.push(p),
                Some(_) => {}
                None => warn!("Unknown relay identity: {}", label),
            }
        }
        if identities.is_empty() {
            warn!("No valid relay identities configured! Falling back to defaults.");
            identities = ProxyConfig::default()
                .identities
                .iter()
                .filter_map(|l| IdentityProfile::by_label(l))
                .collect();
        }

        let http = HttpClient::streaming(upstream.timeout())?;
        Ok(Self::new(http, identities, proxy.chunk_size))
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn identity_labels(&self) -> Vec<&str> {
        self.identities.profiles().iter().map(|p| p.label()).collect()
    }

    /// Identities in the order they are tried for `url`: the one named by its
    /// `c=` parameter first, then the rest as configured.
    pub fn attempt_order(&self, url: &str) -> Vec<&IdentityProfile> {
        self.identities.sequence(ua::client_param(url))
    }

    /// Requests the descriptor URL until an identity is accepted.
    ///
    /// 401, 403 and 429 move on to the next identity. 416 is accepted and
    /// passed through. Other failures end the attempt immediately.
    pub async fn open(
        &self,
        descriptor: &StreamDescriptor,
        range: Option<ByteRange>,
    ) -> Result<UpstreamResponse, StreamError> {
        let order = self.attempt_order(&descriptor.url);
        let mut denied_status = StatusCode::FORBIDDEN;

        for identity in &order {
            let mut req = self
                .http
                .get(&descriptor.url)
                .header(USER_AGENT, identity.user_agent)
                .header(ACCEPT_ENCODING, "identity");
            if let Some(range) = range {
                req = req.header(RANGE, range.to_string());
            }

            let res = req.send().await?;
            let status = res.status();

            if is_access_denied(status) {
                warn!(
                    "Upstream refused {} as {} ({}), rotating identity",
                    descriptor.content_id, identity.label, status
                );
                denied_status = status;
                continue;
            }

            if !status.is_success() && status != StatusCode::RANGE_NOT_SATISFIABLE {
                return Err(StreamError::UpstreamStatus(status.as_u16()));
            }

            debug!(
                "Upstream accepted {} as {} ({})",
                descriptor.content_id, identity.label, status
            );
            return Ok(UpstreamResponse {
                head: response_head(&res, descriptor),
                identity: identity.label.clone(),
                body: res,
            });
        }

        Err(StreamError::UpstreamAccessDenied {
            status: denied_status.as_u16(),
            attempts: order.len(),
        })
    }

    /// Opens the upstream, sends the head downstream, then streams the body.
    pub async fn relay<D: Downstream + ?Sized>(
        &self,
        descriptor: &StreamDescriptor,
        downstream: &mut D,
        range: Option<ByteRange>,
    ) -> Result<RelayOutcome, StreamError> {
        let upstream = self.open(descriptor, range).await?;

        if downstream.send_head(upstream.head.clone()).await.is_err() {
            debug!("Downstream for {} left before the head", descriptor.content_id);
            return Ok(RelayOutcome::DownstreamClosed { bytes: 0 });
        }

        let outcome = self.pump(upstream, downstream).await;
        info!(
            "Relay of {} finished: {:?}",
            descriptor.content_id, outcome
        );
        Ok(outcome)
    }

    /// Copies the upstream body in `chunk_size` pieces, flushing after each.
    pub async fn pump<D: Downstream + ?Sized>(
        &self,
        upstream: UpstreamResponse,
        downstream: &mut D,
    ) -> RelayOutcome {
        let mut body = upstream.body.bytes_stream();
        let mut pending = BytesMut::with_capacity(self.chunk_size);
        let mut sent = 0u64;

        loop {
            match body.next().await {
                Some(Ok(bytes)) => {
                    pending.extend_from_slice(&bytes);
                    while pending.len() >= self.chunk_size {
                        let chunk = pending.split_to(self.chunk_size).freeze();
                        if !deliver(downstream, chunk, &mut sent).await {
                            return RelayOutcome::DownstreamClosed { bytes: sent };
                        }
                    }
                }
                Some(Err(e)) => {
                    debug!("Upstream body read failed after {} bytes: {}", sent, e);
                    if !pending.is_empty() && !deliver(downstream, pending.freeze(), &mut sent).await
                    {
                        return RelayOutcome::DownstreamClosed { bytes: sent };
                    }
                    return RelayOutcome::UpstreamInterrupted { bytes: sent };
                }
                None => {
                    if !pending.is_empty() && !deliver(downstream, pending.freeze(), &mut sent).await
                    {
                        return RelayOutcome::DownstreamClosed { bytes: sent };
                    }
                    return RelayOutcome::Completed { bytes: sent };
                }
            }
        }
    }
}

async fn deliver<D: Downstream + ?Sized>(downstream: &mut D, chunk: Bytes, sent: &mut u64) -> bool {
    let len = chunk.len() as u64;
    if let Err(e) = downstream.write_chunk(chunk).await {
        debug!("Downstream write failed after {} bytes: {}", sent, e);
        return false;
    }
    *sent += len;
    if let Err(e) = downstream.flush().await {
        debug!("Downstream flush failed after {} bytes: {}", sent, e);
        return false;
    }
    true
}

fn is_access_denied(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    )
}

fn response_head(res: &reqwest::Response, descriptor: &StreamDescriptor) -> ResponseHead {
    let header = |name: HeaderName| {
        res.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    ResponseHead {
        status: res.status(),
        content_type: header(CONTENT_TYPE).unwrap_or_else(|| descriptor.mime_type.clone()),
        content_length: header(CONTENT_LENGTH).and_then(|v| v.parse().ok()),
        content_range: header(CONTENT_RANGE),
        accept_ranges: header(ACCEPT_RANGES).unwrap_or_else(|| "bytes".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, atomic::Ordering},
        time::Duration,
    };

    use super::*;
    use crate::{
        common::{
            ContentId, QualityTier,
            testing::{media, media_upstream},
        },
        resolver::{
            RateGovernor, ResultCache, StrategyChain, StreamResolver,
            testing::{StubStrategy, audio},
        },
        sources::youtube::ua::yt_ua,
    };

    fn proxy(chunk_size: usize) -> StreamProxy {
        let identities = ["IOS", "ANDROID", "MWEB", "WEB"]
            .iter()
            .filter_map(|l| IdentityProfile::by_label(l))
            .collect();
        StreamProxy::new(reqwest::Client::new(), identities, chunk_size)
    }

    fn descriptor(url: String) -> StreamDescriptor {
        StreamDescriptor {
            url,
            mime_type: "audio/webm".to_string(),
            bitrate: 140,
            format_tag: "140".to_string(),
            content_id: ContentId::parse("abc123").unwrap(),
            source: "strategy2".to_string(),
        }
    }

    /// Collects everything; optionally refuses writes past `limit` bytes.
    #[derive(Default)]
    struct Sink {
        head: Option<ResponseHead>,
        received: Vec<u8>,
        limit: Option<usize>,
        flushes: usize,
    }

    #[async_trait]
    impl Downstream for Sink {
        async fn send_head(&mut self, head: ResponseHead) -> Result<(), StreamError> {
            self.head = Some(head);
            Ok(())
        }

        async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), StreamError> {
            if let Some(limit) = self.limit {
                if self.received.len() + chunk.len() > limit {
                    return Err(StreamError::DownstreamDisconnected);
                }
            }
            self.received.extend_from_slice(&chunk);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), StreamError> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_resolve_then_relay_range_to_closing_downstream() {
        let (base, _) = media_upstream(None).await;
        let url = format!("{}/videoplayback?id=U", base);

        let chain = StrategyChain::new(
            vec![
                StubStrategy::returning("strategy1", vec![]).boxed(),
                StubStrategy::returning("strategy2", vec![audio("audio/mp4", 140, &url)]).boxed(),
            ],
            Arc::new(RateGovernor::new(10, Duration::from_secs(60))),
            Duration::from_millis(50),
            Duration::from_secs(5),
        );
        let resolver =
            StreamResolver::new(chain, Arc::new(ResultCache::new(Duration::from_secs(300))));
        let descriptor = resolver
            .resolve(&ContentId::parse("abc123").unwrap(), QualityTier::Medium)
            .await
            .unwrap();
        assert_eq!(descriptor.url, url);
        assert_eq!(descriptor.source, "strategy2");

        let mut sink = Sink {
            limit: Some(5),
            ..Default::default()
        };
        let outcome = proxy(5)
            .relay(&descriptor, &mut sink, ByteRange::parse("bytes=10-20"))
            .await
            .unwrap();

        assert_eq!(outcome, RelayOutcome::DownstreamClosed { bytes: 5 });
        assert_eq!(sink.received, (10u8..15).collect::<Vec<_>>());

        let head = sink.head.unwrap();
        assert_eq!(head.status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(head.content_range.as_deref(), Some("bytes 10-20/256"));
        assert_eq!(head.content_length, Some(11));
        assert_eq!(head.accept_ranges, "bytes");
    }

    #[tokio::test]
    async fn test_full_relay_in_chunks() {
        let (base, _) = media_upstream(None).await;
        let mut sink = Sink::default();

        let outcome = proxy(100)
            .relay(&descriptor(format!("{}/videoplayback", base)), &mut sink, None)
            .await
            .unwrap();

        assert_eq!(outcome, RelayOutcome::Completed { bytes: 256 });
        assert_eq!(sink.received, media());
        assert_eq!(sink.flushes, 3);
        let head = sink.head.unwrap();
        assert_eq!(head.status, StatusCode::OK);
        assert_eq!(head.content_type, "audio/mp4");
        assert_eq!(head.content_length, Some(256));
    }

    #[tokio::test]
    async fn test_suffix_range_is_forwarded() {
        let (base, _) = media_upstream(None).await;
        let mut sink = Sink::default();

        proxy(64)
            .relay(
                &descriptor(format!("{}/videoplayback", base)),
                &mut sink,
                ByteRange::parse("bytes=-6"),
            )
            .await
            .unwrap();

        assert_eq!(sink.received, vec![250, 251, 252, 253, 254, 255]);
    }

    #[tokio::test]
    async fn test_denied_identity_rotates() {
        let (base, hits) = media_upstream(Some(yt_ua::MWEB)).await;
        let proxy = proxy(64);

        let upstream = proxy
            .open(&descriptor(format!("{}/videoplayback", base)), None)
            .await
            .unwrap();

        assert_eq!(upstream.identity, "MWEB");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_all_identities_denied() {
        let (base, hits) = media_upstream(Some("nobody")).await;

        let err = proxy(64)
            .open(&descriptor(format!("{}/videoplayback", base)), None)
            .await
            .err()
            .unwrap();

        assert!(matches!(
            err,
            StreamError::UpstreamAccessDenied {
                status: 403,
                attempts: 4
            }
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_other_status_fails_without_rotation() {
        let (base, _) = media_upstream(None).await;
        let err = proxy(64)
            .open(&descriptor(format!("{}/gone", base)), None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StreamError::UpstreamStatus(410)));
    }

    #[tokio::test]
    async fn test_unsatisfiable_range_passes_through() {
        let (base, _) = media_upstream(None).await;
        let upstream = proxy(64)
            .open(
                &descriptor(format!("{}/videoplayback", base)),
                ByteRange::parse("bytes=1000-"),
            )
            .await
            .unwrap();
        assert_eq!(upstream.head.status, StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(upstream.head.content_type, "audio/webm");
    }

    #[tokio::test]
    async fn test_upstream_interruption_keeps_delivered_bytes() {
        let (base, _) = media_upstream(None).await;
        let mut sink = Sink::default();

        let outcome = proxy(64)
            .relay(&descriptor(format!("{}/broken", base)), &mut sink, None)
            .await
            .unwrap();

        assert_eq!(outcome, RelayOutcome::UpstreamInterrupted { bytes: 10 });
        assert_eq!(sink.received, b"0123456789");
    }

    #[test]
    fn test_attempt_order_prefers_url_client() {
        let proxy = proxy(64);
        let url = "https://rr3---sn-a5m.googlevideo.com/videoplayback?itag=140&c=WEB";
        let labels: Vec<&str> = proxy.attempt_order(url).iter().map(|p| p.label()).collect();
        assert_eq!(labels, vec!["WEB", "IOS", "ANDROID", "MWEB"]);
    }

    #[test]
    fn test_from_config_skips_unknown_identities() {
        let config = ProxyConfig {
            chunk_size: 0,
            identities: vec!["mweb".to_string(), "toaster".to_string()],
        };
        let proxy = StreamProxy::from_config(&config, &UpstreamConfig::default()).unwrap();
        assert_eq!(proxy.identity_labels(), vec!["MWEB"]);
        assert_eq!(proxy.chunk_size(), 1);
    }
}
