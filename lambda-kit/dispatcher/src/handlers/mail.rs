//! HTTP handler that relays a send request to a mail service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::handlers::proxy::ProxyRequest;
use crate::outcome::{HandlerOutcome, Reply};
use crate::payload::DecodedEvent;
use crate::registry::{EventHandler, ProjectionError};

/// JSON body accepted by [`MailRelayHandler`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// A message handed to a [`MailSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl From<MailRequest> for OutgoingMail {
    fn from(value: MailRequest) -> Self {
        Self {
            to: value.to,
            subject: value.subject,
            body: value.body,
        }
    }
}

/// Reply body of [`MailRelayHandler`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MailReceipt {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[async_trait]
/// Mail-sending capability. Returns the provider's message id.
pub trait MailSender: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<String>;
}

pub struct MailRelayHandler<M> {
    sender: M,
}

impl<M> MailRelayHandler<M> {
    pub fn new(sender: M) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl<M: MailSender> EventHandler for MailRelayHandler<M> {
    async fn handle(&self, event: &DecodedEvent) -> Result<HandlerOutcome, ProjectionError> {
        let request = ProxyRequest::project(event)?;

        let mail: OutgoingMail = match request.json_body::<MailRequest>() {
            Ok(Some(body)) if !body.to.trim().is_empty() => body.into(),
            Ok(_) => {
                tracing::warn!("mail request without a recipient");
                return Ok(Reply::bad_request().into());
            }
            Err(err) => {
                tracing::warn!(error = %err, "invalid mail request body");
                return Ok(Reply::bad_request().into());
            }
        };

        let receipt = match self.sender.send(&mail).await {
            Ok(message_id) => {
                tracing::info!(message_id = %message_id, "mail sent");
                MailReceipt {
                    status_code: 200,
                    message_id: Some(message_id),
                    error: None,
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "mail send failed");
                MailReceipt {
                    status_code: 500,
                    message_id: None,
                    error: Some("Failed to send email".to_string()),
                }
            }
        };

        Ok(Reply::json(receipt.status_code, &receipt).into())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::outcome::ReplyBody;
    use crate::payload::decode;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<OutgoingMail>>,
        fail: bool,
    }

    #[async_trait]
    impl MailSender for Recording {
        async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<String> {
            if self.fail {
                anyhow::bail!("MessageRejected: address blacklisted");
            }
            self.sent.lock().unwrap().push(mail.clone());
            Ok("msg-1".to_string())
        }
    }

    fn http_event(body: &str) -> DecodedEvent {
        let event = json!({
            "requestContext": {},
            "httpMethod": "POST",
            "path": "/mail",
            "body": body,
        });
        decode(Bytes::from(event.to_string()))
    }

    async fn reply(handler: &MailRelayHandler<Recording>, body: &str) -> Reply {
        match handler.handle(&http_event(body)).await.unwrap() {
            HandlerOutcome::Reply(reply) => reply,
            other => panic!("expected reply, got {other:?}"),
        }
    }

    fn receipt(reply: &Reply) -> MailReceipt {
        match &reply.body {
            ReplyBody::Json(v) => serde_json::from_value(v.clone()).unwrap(),
            other => panic!("expected json body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn relays_to_the_sender() {
        let handler = MailRelayHandler::new(Recording::default());
        let reply = reply(&handler, r#"{"to":"a@example.com","subject":"s","body":"b"}"#).await;

        assert_eq!(reply.status_code, 200);
        assert_eq!(
            receipt(&reply),
            MailReceipt {
                status_code: 200,
                message_id: Some("msg-1".to_string()),
                error: None,
            }
        );
        assert_eq!(
            handler.sender.sent.lock().unwrap().as_slice(),
            &[OutgoingMail {
                to: "a@example.com".to_string(),
                subject: "s".to_string(),
                body: "b".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn sender_failure_is_generic_500() {
        let handler = MailRelayHandler::new(Recording {
            fail: true,
            ..Default::default()
        });
        let reply = reply(&handler, r#"{"to":"a@example.com","subject":"s","body":"b"}"#).await;

        assert_eq!(reply.status_code, 500);
        let receipt = receipt(&reply);
        assert_eq!(receipt.error.as_deref(), Some("Failed to send email"));
        assert!(receipt.message_id.is_none());
        assert!(!format!("{:?}", reply.body).contains("blacklisted"));
    }

    #[tokio::test]
    async fn invalid_or_empty_body_is_400() {
        let handler = MailRelayHandler::new(Recording::default());
        for body in ["", "{oops", r#"{"subject":"no recipient"}"#] {
            let reply = reply(&handler, body).await;
            assert_eq!(reply.status_code, 400, "{body:?}");
        }
        assert!(handler.sender.sent.lock().unwrap().is_empty());
    }
}
