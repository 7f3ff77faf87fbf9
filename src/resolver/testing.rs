//! Stub strategies shared by resolver and proxy tests.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use super::models::CandidateFormat;
use crate::{
    common::{AnyResult, ContentId},
    sources::{BoxedStrategy, ExtractionStrategy},
};

pub fn audio(mime: &str, bitrate: u32, url: &str) -> CandidateFormat {
    CandidateFormat {
        mime_type: mime.to_string(),
        bitrate,
        format_tag: "140".to_string(),
        url: url.to_string(),
    }
}

enum Behaviour {
    Return(Vec<CandidateFormat>),
    Fail,
    Delay(Duration, Vec<CandidateFormat>),
    /// The n-th call gets the n-th set; the last set repeats.
    Sequence(Vec<Vec<CandidateFormat>>),
}

pub struct StubStrategy {
    name: String,
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl StubStrategy {
    fn build(name: &str, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn returning(name: &str, formats: Vec<CandidateFormat>) -> Arc<Self> {
        Self::build(name, Behaviour::Return(formats))
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Self::build(name, Behaviour::Fail)
    }

    pub fn delayed(name: &str, delay: Duration, formats: Vec<CandidateFormat>) -> Arc<Self> {
        Self::build(name, Behaviour::Delay(delay, formats))
    }

    pub fn sequence(name: &str, sets: Vec<Vec<CandidateFormat>>) -> Arc<Self> {
        Self::build(name, Behaviour::Sequence(sets))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn boxed(self: &Arc<Self>) -> BoxedStrategy {
        self.clone()
    }
}

#[async_trait]
impl ExtractionStrategy for StubStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn try_extract(&self, _content_id: &ContentId) -> AnyResult<Vec<CandidateFormat>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Return(formats) => Ok(formats.clone()),
            Behaviour::Fail => Err("upstream returned 500".into()),
            Behaviour::Delay(delay, formats) => {
                tokio::time::sleep(*delay).await;
                Ok(formats.clone())
            }
            Behaviour::Sequence(sets) => Ok(sets
                .get(call)
                .or_else(|| sets.last())
                .cloned()
                .unwrap_or_default()),
        }
    }
}
