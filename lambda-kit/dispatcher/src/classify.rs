//! Shape classification.
//!
//! Payloads carry no type tag, so the kind is inferred from which well-known fields are present.
//! The rules are an ordered table and the first match wins: an event that looks like both an
//! HTTP request and a queue batch is an HTTP request.

use std::fmt;

use serde_json::{Map, Value};

use crate::payload::DecodedEvent;

/// API Gateway proxy events always carry this field.
pub const REQUEST_CONTEXT_KEY: &str = "requestContext";
/// Batch envelope used by SQS (and other record-based sources).
pub const RECORDS_KEY: &str = "Records";
/// Per-record source marker, checked on the first record only.
pub const EVENT_SOURCE_KEY: &str = "eventSource";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    HttpRequest,
    QueueBatch,
    Unstructured,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::HttpRequest => "http_request",
            EventKind::QueueBatch => "queue_batch",
            EventKind::Unstructured => "unstructured",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type ShapePredicate = fn(&Map<String, Value>) -> bool;

/// Classification rules in priority order.
pub const RULES: &[(EventKind, ShapePredicate)] = &[
    (EventKind::HttpRequest, has_request_context),
    (EventKind::QueueBatch, is_record_batch),
];

/// Classify a decoded event. Total: anything no rule claims is [`EventKind::Unstructured`].
pub fn classify(event: &DecodedEvent) -> EventKind {
    let Some(obj) = event.object() else {
        return EventKind::Unstructured;
    };

    RULES
        .iter()
        .find(|(_, matches)| matches(obj))
        .map(|(kind, _)| *kind)
        .unwrap_or(EventKind::Unstructured)
}

pub fn has_request_context(obj: &Map<String, Value>) -> bool {
    obj.contains_key(REQUEST_CONTEXT_KEY)
}

pub fn is_record_batch(obj: &Map<String, Value>) -> bool {
    obj.get(RECORDS_KEY)
        .and_then(Value::as_array)
        .and_then(|records| records.first())
        .and_then(Value::as_object)
        .is_some_and(|first| first.contains_key(EVENT_SOURCE_KEY))
}
