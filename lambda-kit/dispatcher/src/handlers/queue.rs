//! Queue batch consumer.
//!
//! Records are independent: one whose body is not a JSON object, or that fails to process, is
//! logged and skipped without affecting the others. There is no reply channel, so the outcome is
//! always void.

use async_trait::async_trait;
use aws_lambda_events::event::sqs::{SqsEvent, SqsMessage};
use futures::{future, stream, StreamExt};
use serde_json::{Map, Value};

use crate::classify::EventKind;
use crate::outcome::HandlerOutcome;
use crate::payload::DecodedEvent;
use crate::registry::{EventHandler, ProjectionError};

#[async_trait]
/// Business logic for one queue message.
pub trait MessageProcessor: Send + Sync {
    async fn process(&self, message_id: &str, body: Value) -> anyhow::Result<()>;
}

/// Default processor: log the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingProcessor;

#[async_trait]
impl MessageProcessor for LoggingProcessor {
    async fn process(&self, message_id: &str, body: Value) -> anyhow::Result<()> {
        tracing::info!(message_id = %message_id, body = %body, "processing message");
        Ok(())
    }
}

fn normalize_concurrency(value: usize) -> usize {
    value.max(1)
}

pub struct QueueHandler<P> {
    processor: P,
    concurrency: usize,
}

impl<P> QueueHandler<P> {
    /// Sequential consumer.
    pub fn new(processor: P) -> Self {
        Self {
            processor,
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = normalize_concurrency(concurrency);
        self
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }
}

#[async_trait]
impl<P: MessageProcessor> EventHandler for QueueHandler<P> {
    async fn handle(&self, event: &DecodedEvent) -> Result<HandlerOutcome, ProjectionError> {
        if !event.is_structured() {
            return Err(ProjectionError::Unstructured);
        }
        let batch: SqsEvent = serde_json::from_slice(event.raw())
            .map_err(|err| ProjectionError::shape(EventKind::QueueBatch, err))?;

        let records = batch.records.len();
        tracing::info!(records, "received queue batch");

        let processor = &self.processor;
        let processed = stream::iter(batch.records)
            .map(|record| process_record(processor, record))
            .buffer_unordered(normalize_concurrency(self.concurrency))
            .filter(|ok| future::ready(*ok))
            .count()
            .await;

        tracing::info!(
            records,
            processed,
            skipped = records - processed,
            "queue batch finished"
        );
        Ok(HandlerOutcome::Void)
    }
}

async fn process_record<P: MessageProcessor>(processor: &P, record: SqsMessage) -> bool {
    let message_id = record.message_id.unwrap_or_default();

    let Some(raw) = record.body else {
        tracing::warn!(message_id = %message_id, "message has no body; skipping");
        return false;
    };

    // Bodies are JSON objects; `null` stands for an empty one.
    let body = match serde_json::from_str::<Option<Map<String, Value>>>(&raw) {
        Ok(Some(fields)) => Value::Object(fields),
        Ok(None) => Value::Null,
        Err(err) => {
            tracing::warn!(
                message_id = %message_id,
                error = %err,
                "message body is not a json object; skipping"
            );
            return false;
        }
    };

    match processor.process(&message_id, body).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(
                message_id = %message_id,
                error = %err,
                "message processing failed; skipping"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::payload::decode;

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessageProcessor for Recording {
        async fn process(&self, message_id: &str, body: Value) -> anyhow::Result<()> {
            if body.get("explode").is_some() {
                anyhow::bail!("boom");
            }
            self.seen.lock().unwrap().push(message_id.to_string());
            Ok(())
        }
    }

    fn record(id: &str, body: &str) -> Value {
        json!({"messageId": id, "eventSource": "aws:sqs", "body": body})
    }

    fn batch(records: Vec<Value>) -> DecodedEvent {
        decode(Bytes::from(json!({ "Records": records }).to_string()))
    }

    fn seen(handler: &QueueHandler<Recording>) -> Vec<String> {
        let mut seen = handler.processor().seen.lock().unwrap().clone();
        seen.sort();
        seen
    }

    #[tokio::test]
    async fn invalid_record_is_skipped_and_others_processed() {
        let handler = QueueHandler::new(Recording::default());
        let event = batch(vec![
            record("m1", r#"{"n":1}"#),
            record("m2", "{not json"),
            record("m3", r#"{"n":3}"#),
        ]);

        let outcome = handler.handle(&event).await.unwrap();
        assert!(matches!(outcome, HandlerOutcome::Void));
        assert_eq!(seen(&handler), vec!["m1", "m3"]);
    }

    #[tokio::test]
    async fn processor_errors_and_missing_bodies_are_isolated() {
        let handler = QueueHandler::new(Recording::default()).with_concurrency(4);
        let event = batch(vec![
            record("m1", r#"{"explode":true}"#),
            json!({"messageId": "m2", "eventSource": "aws:sqs"}),
            record("m3", "{}"),
            record("m4", "null"),
        ]);

        let outcome = handler.handle(&event).await.unwrap();
        assert!(matches!(outcome, HandlerOutcome::Void));
        assert_eq!(seen(&handler), vec!["m3", "m4"]);
    }

    #[tokio::test]
    async fn non_object_bodies_are_skipped() {
        let handler = QueueHandler::new(Recording::default());
        let event = batch(vec![
            record("obj", "{}"),
            record("num", "7"),
            record("str", r#""hi""#),
            record("arr", "[1]"),
        ]);

        let outcome = handler.handle(&event).await.unwrap();
        assert!(matches!(outcome, HandlerOutcome::Void));
        assert_eq!(seen(&handler), vec!["obj"]);
    }

    #[tokio::test]
    async fn concurrent_consumer_processes_every_record() {
        let handler = QueueHandler::new(Recording::default()).with_concurrency(3);
        let records = (0..10).map(|i| record(&format!("m{i}"), "{}")).collect();

        handler.handle(&batch(records)).await.unwrap();
        assert_eq!(seen(&handler).len(), 10);
    }

    #[tokio::test]
    async fn wrongly_typed_records_fail_projection() {
        let handler = QueueHandler::new(Recording::default());
        let event = batch(vec![json!({"eventSource": "aws:sqs", "body": 12})]);

        let err = handler.handle(&event).await.unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::Shape {
                kind: EventKind::QueueBatch,
                ..
            }
        ));
    }

    #[test]
    fn concurrency_is_floored_at_one() {
        let handler = QueueHandler::new(LoggingProcessor).with_concurrency(0);
        assert_eq!(handler.concurrency, 1);
    }
}
