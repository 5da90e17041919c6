use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::classify::EventKind;
use crate::handlers::{EchoHandler, GreetingHandler, LoggingProcessor, QueueHandler};
use crate::outcome::HandlerOutcome;
use crate::payload::DecodedEvent;

/// The payload looked like a kind by shape but does not decode into that kind's typed event.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("payload is not structured")]
    Unstructured,
    #[error("payload does not decode as {kind}: {source}")]
    Shape {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
}

impl ProjectionError {
    pub fn shape(kind: EventKind, source: serde_json::Error) -> Self {
        Self::Shape { kind, source }
    }
}

#[async_trait]
/// A leaf handler: decoded payload in, outcome out.
///
/// Handlers re-project the payload into whatever typed event they need. Returning
/// `Err(ProjectionError)` hands the invocation to the fallback handler.
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DecodedEvent) -> Result<HandlerOutcome, ProjectionError>;
}

/// Fixed mapping from [`EventKind`] to handler.
#[derive(Clone)]
pub struct HandlerRegistry {
    http: Arc<dyn EventHandler>,
    queue: Arc<dyn EventHandler>,
    fallback: Arc<dyn EventHandler>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    /// Greeting for HTTP, logging consumer for queues, echo for everything else.
    pub fn new() -> Self {
        Self {
            http: Arc::new(GreetingHandler),
            queue: Arc::new(QueueHandler::new(LoggingProcessor)),
            fallback: Arc::new(EchoHandler),
        }
    }

    pub fn with_http(mut self, handler: impl EventHandler + 'static) -> Self {
        self.http = Arc::new(handler);
        self
    }

    pub fn with_queue(mut self, handler: impl EventHandler + 'static) -> Self {
        self.queue = Arc::new(handler);
        self
    }

    pub fn with_fallback(mut self, handler: impl EventHandler + 'static) -> Self {
        self.fallback = Arc::new(handler);
        self
    }

    pub fn handler_for(&self, kind: EventKind) -> &dyn EventHandler {
        match kind {
            EventKind::HttpRequest => self.http.as_ref(),
            EventKind::QueueBatch => self.queue.as_ref(),
            EventKind::Unstructured => self.fallback.as_ref(),
        }
    }

    /// Invoke the handler for `kind`.
    ///
    /// A classified event that fails to re-project onto its typed shape is handed to the fallback
    /// handler, the same as an event that never classified.
    pub async fn dispatch(&self, kind: EventKind, event: &DecodedEvent) -> HandlerOutcome {
        let err = match self.handler_for(kind).handle(event).await {
            Ok(outcome) => return outcome,
            Err(err) => err,
        };

        if kind == EventKind::Unstructured {
            return HandlerOutcome::Failure(err.into());
        }

        tracing::warn!(kind = %kind, error = %err, "typed decode failed; using fallback handler");
        match self.fallback.handle(event).await {
            Ok(outcome) => outcome,
            Err(err) => HandlerOutcome::Failure(err.into()),
        }
    }
}
