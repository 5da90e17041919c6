//! Amazon SES implementation of [`MailSender`].

use anyhow::Context;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ses::types::{Body, Content, Destination, Message};
use shape_dispatch::handlers::{MailSender, OutgoingMail};

pub struct SesMailSender {
    client: aws_sdk_ses::Client,
    source: String,
}

impl SesMailSender {
    /// Create a sender using standard AWS credential resolution. `source` must be verified in SES.
    pub async fn new(source: String) -> Self {
        let cfg = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::from_client(aws_sdk_ses::Client::new(&cfg), source)
    }

    pub fn from_client(client: aws_sdk_ses::Client, source: String) -> Self {
        Self { client, source }
    }
}

#[async_trait]
impl MailSender for SesMailSender {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<String> {
        let subject = Content::builder().data(&mail.subject).build()?;
        let text = Content::builder().data(&mail.body).build()?;
        let message = Message::builder()
            .subject(subject)
            .body(Body::builder().text(text).build())
            .build();

        let out = self
            .client
            .send_email()
            .source(&self.source)
            .destination(Destination::builder().to_addresses(&mail.to).build())
            .message(message)
            .send()
            .await
            .with_context(|| format!("ses send_email to {}", mail.to))?;

        Ok(out.message_id().to_string())
    }
}
