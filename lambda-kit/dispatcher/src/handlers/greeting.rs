use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::handlers::proxy::ProxyRequest;
use crate::outcome::{HandlerOutcome, Reply};
use crate::payload::DecodedEvent;
use crate::registry::{EventHandler, ProjectionError};

pub const GREETING_MESSAGE: &str = "Hello from AWS Lambda with Rust!";

/// Optional JSON body of a greeting request.
///
/// Field names match case-insensitively, a repeated key keeps its last value and a `null` value
/// leaves the field unset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct GreetingRequest {
    pub name: Option<String>,
    pub message: Option<String>,
}

impl TryFrom<Map<String, Value>> for GreetingRequest {
    type Error = serde_json::Error;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut request = Self::default();
        for (key, value) in fields {
            let slot = if key.eq_ignore_ascii_case("name") {
                &mut request.name
            } else if key.eq_ignore_ascii_case("message") {
                &mut request.message
            } else {
                continue;
            };
            if !value.is_null() {
                *slot = Some(serde_json::from_value(value)?);
            }
        }
        Ok(request)
    }
}

#[derive(Debug, Serialize)]
struct Greeting<'a> {
    message: &'static str,
    method: &'a str,
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    greeting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    echo: Option<&'a str>,
}

/// Default HTTP handler: echoes method and path, greets `name` and echoes `message`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreetingHandler;

#[async_trait]
impl EventHandler for GreetingHandler {
    async fn handle(&self, event: &DecodedEvent) -> Result<HandlerOutcome, ProjectionError> {
        let request = ProxyRequest::project(event)?;
        tracing::info!(method = %request.method(), path = %request.path(), "received http request");

        let body: GreetingRequest = match request.json_body() {
            Ok(body) => body.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %err, "invalid request body");
                return Ok(Reply::bad_request().into());
            }
        };

        let greeting = Greeting {
            message: GREETING_MESSAGE,
            method: request.method(),
            path: request.path(),
            greeting: body
                .name
                .as_deref()
                .filter(|n| !n.is_empty())
                .map(|n| format!("Hello, {n}!")),
            echo: body.message.as_deref().filter(|m| !m.is_empty()),
        };

        Ok(Reply::json(200, &greeting).with_cors().into())
    }
}
