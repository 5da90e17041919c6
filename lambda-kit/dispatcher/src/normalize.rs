//! Handler outcome -> runtime response.

use std::collections::HashMap;

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::outcome::{
    HandlerOutcome, Reply, ReplyBody, APPLICATION_JSON, CONTENT_TYPE, INTERNAL_ERROR,
};

/// The `{statusCode, headers, body}` object returned to the Lambda runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
}

/// Normalize a handler outcome. `None` means there is no response channel (void outcome).
///
/// The returned body is always valid JSON text.
pub fn normalize(outcome: HandlerOutcome) -> Option<NormalizedResponse> {
    match outcome {
        HandlerOutcome::Reply(reply) => Some(normalize_reply(reply)),
        HandlerOutcome::Void => None,
        HandlerOutcome::Failure(err) => {
            tracing::error!(error = %err, "handler failed");
            Some(internal_error_response())
        }
    }
}

fn normalize_reply(reply: Reply) -> NormalizedResponse {
    let Reply {
        status_code,
        headers,
        body,
    } = reply;

    let body = match body {
        ReplyBody::Json(value) => serde_json::to_string(&value).unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to encode reply body");
            INTERNAL_ERROR.to_string()
        }),
        ReplyBody::Raw(text) => {
            if serde_json::from_str::<IgnoredAny>(&text).is_ok() {
                text
            } else {
                tracing::error!(status_code, len = text.len(), "reply body is not valid json");
                INTERNAL_ERROR.to_string()
            }
        }
    };

    NormalizedResponse {
        status_code: normalize_status(status_code),
        headers: normalize_headers(headers),
        body,
    }
}

fn normalize_status(status_code: u16) -> u16 {
    if (100..=599).contains(&status_code) {
        status_code
    } else {
        tracing::warn!(status_code, "out-of-range status code");
        500
    }
}

fn normalize_headers(headers: HashMap<String, String>) -> HashMap<String, String> {
    headers
        .into_iter()
        .filter(|(k, _)| !k.trim().is_empty())
        .collect()
}

fn internal_error_response() -> NormalizedResponse {
    NormalizedResponse {
        status_code: 500,
        headers: HashMap::from([(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())]),
        body: INTERNAL_ERROR.to_string(),
    }
}
