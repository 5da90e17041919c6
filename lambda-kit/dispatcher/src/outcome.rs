use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const APPLICATION_JSON: &str = "application/json";

pub const INVALID_BODY_ERROR: &str = r#"{"error": "Invalid request body"}"#;
pub const INTERNAL_ERROR: &str = r#"{"error": "Internal server error"}"#;

/// What a handler produced for one invocation.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// A caller is waiting for this response.
    Reply(Reply),
    /// Nobody is waiting (queue batches).
    Void,
    /// The handler could not produce a reply. The detail is logged, never returned.
    Failure(anyhow::Error),
}

impl From<Reply> for HandlerOutcome {
    fn from(value: Reply) -> Self {
        Self::Reply(value)
    }
}

/// Body of a [`Reply`] before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    /// Serialized to JSON text by the normalizer.
    Json(Value),
    /// Already-encoded JSON text.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: ReplyBody,
}

impl Reply {
    /// JSON reply with `Content-Type: application/json`.
    ///
    /// A payload that cannot be represented as JSON turns into a 500 with the fixed error body.
    pub fn json<T: Serialize>(status_code: u16, payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(value) => Self::with_body(status_code, ReplyBody::Json(value)),
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize reply payload");
                Self::internal_error()
            }
        }
    }

    /// Reply with a fixed, pre-encoded JSON body.
    pub fn raw(status_code: u16, body: impl Into<String>) -> Self {
        Self::with_body(status_code, ReplyBody::Raw(body.into()))
    }

    pub fn bad_request() -> Self {
        Self::raw(400, INVALID_BODY_ERROR)
    }

    pub fn internal_error() -> Self {
        Self::raw(500, INTERNAL_ERROR)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Allow any origin (browser callers of the HTTP API).
    pub fn with_cors(self) -> Self {
        self.with_header(ALLOW_ORIGIN, "*")
    }

    fn with_body(status_code: u16, body: ReplyBody) -> Self {
        Self {
            status_code,
            headers: HashMap::from([(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())]),
            body,
        }
    }
}
