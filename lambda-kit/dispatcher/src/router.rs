//! Composition root: decode -> classify -> dispatch -> normalize.

use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::Instrument;

use crate::classify::classify;
use crate::normalize::{normalize, NormalizedResponse};
use crate::payload::decode;
use crate::registry::HandlerRegistry;

#[async_trait]
/// Anything that turns one raw invocation payload into an optional runtime response.
pub trait Route: Send + Sync {
    async fn route(&self, raw: Bytes) -> Option<NormalizedResponse>;
}

#[derive(Clone, Default)]
pub struct Router {
    registry: HandlerRegistry,
}

impl Router {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }
}

#[async_trait]
impl Route for Router {
    async fn route(&self, raw: Bytes) -> Option<NormalizedResponse> {
        let event = decode(raw);
        let kind = classify(&event);
        tracing::Span::current().record("kind", kind.as_str());
        tracing::debug!(kind = %kind, structured = event.is_structured(), "classified event");

        let outcome = self.registry.dispatch(kind, &event).await;
        normalize(outcome)
    }
}

/// Observability wrapper. Runs the inner route inside an `invocation` span and logs timing;
/// the payload and the response pass through untouched. The span's `kind` is filled in by the
/// inner [`Router`] once it has classified the payload.
pub struct Traced<R> {
    inner: R,
}

impl<R> Traced<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[async_trait]
impl<R: Route> Route for Traced<R> {
    async fn route(&self, raw: Bytes) -> Option<NormalizedResponse> {
        let span = tracing::info_span!(
            "invocation",
            kind = tracing::field::Empty,
            len = raw.len()
        );
        let started = Instant::now();

        let response = self.inner.route(raw).instrument(span.clone()).await;

        span.in_scope(|| {
            tracing::info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                status_code = response.as_ref().map(|r| r.status_code),
                replied = response.is_some(),
                "invocation finished"
            );
        });
        response
    }
}
