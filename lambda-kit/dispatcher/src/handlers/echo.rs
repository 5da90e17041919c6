use std::borrow::Cow;

use async_trait::async_trait;
use serde::Serialize;

use crate::handlers::greeting::GREETING_MESSAGE;
use crate::outcome::{HandlerOutcome, Reply};
use crate::payload::DecodedEvent;
use crate::registry::{EventHandler, ProjectionError};

#[derive(Debug, Serialize)]
struct Echo<'a> {
    message: &'static str,
    event: Cow<'a, str>,
}

/// Fallback handler: replies 200 with the raw payload echoed back. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

#[async_trait]
impl EventHandler for EchoHandler {
    async fn handle(&self, event: &DecodedEvent) -> Result<HandlerOutcome, ProjectionError> {
        let text = event.raw_text();
        tracing::info!(
            len = text.len(),
            structured = event.is_structured(),
            "received generic event"
        );

        Ok(Reply::json(
            200,
            &Echo {
                message: GREETING_MESSAGE,
                event: text,
            },
        )
        .into())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::outcome::ReplyBody;
    use crate::payload::decode;

    #[tokio::test]
    async fn echoes_any_payload() {
        for raw in [&b"not json"[..], b"", b"{\"a\":1}", b"\xff"] {
            let event = decode(Bytes::copy_from_slice(raw));
            let outcome = EchoHandler.handle(&event).await.unwrap();
            let HandlerOutcome::Reply(reply) = outcome else {
                panic!("expected reply");
            };
            assert_eq!(reply.status_code, 200);
            let ReplyBody::Json(body) = reply.body else {
                panic!("expected json body");
            };
            assert_eq!(body["event"], &*String::from_utf8_lossy(raw));
            assert_eq!(body["message"], GREETING_MESSAGE);
        }
    }
}
