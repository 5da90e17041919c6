//! Payload decoding.
//!
//! Decoding is a strict structural parse into [`serde_json::Value`]. Malformed input is not an
//! error: the event simply carries no tree and classifies as unstructured. serde_json refuses
//! nesting deeper than its recursion limit, so hostile depth fails the parse instead of the stack.

use std::borrow::Cow;

use bytes::Bytes;
use serde_json::{Map, Value};

/// One invocation's payload: the raw bytes plus the generic tree, when they parsed.
#[derive(Debug, Clone)]
pub struct DecodedEvent {
    raw: Bytes,
    tree: Option<Value>,
}

/// Decode raw invocation bytes. Never fails.
pub fn decode(raw: Bytes) -> DecodedEvent {
    let tree = match serde_json::from_slice::<Value>(&raw) {
        Ok(tree) => Some(tree),
        Err(err) => {
            tracing::debug!(error = %err, len = raw.len(), "payload is not structured");
            None
        }
    };

    DecodedEvent { raw, tree }
}

impl DecodedEvent {
    /// Whether the payload parsed as JSON.
    pub fn is_structured(&self) -> bool {
        self.tree.is_some()
    }

    pub fn tree(&self) -> Option<&Value> {
        self.tree.as_ref()
    }

    /// Top-level mapping, if the payload parsed and is an object.
    pub fn object(&self) -> Option<&Map<String, Value>> {
        self.tree.as_ref().and_then(Value::as_object)
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Raw payload as text, replacing invalid UTF-8.
    pub fn raw_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }
}
