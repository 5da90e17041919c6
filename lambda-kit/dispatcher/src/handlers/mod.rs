//! Leaf handlers. Each one is replaceable in [`crate::HandlerRegistry`] without touching the
//! router or the classifier.

mod echo;
mod greeting;
mod mail;
mod proxy;
mod queue;

pub use echo::EchoHandler;
pub use greeting::{GreetingHandler, GreetingRequest, GREETING_MESSAGE};
pub use mail::{MailReceipt, MailRelayHandler, MailRequest, MailSender, OutgoingMail};
pub use proxy::{BodyError, ProxyRequest};
pub use queue::{LoggingProcessor, MessageProcessor, QueueHandler};
