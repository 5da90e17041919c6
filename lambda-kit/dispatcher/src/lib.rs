//! `shape-dispatch` routes untyped Lambda payloads to handlers by structural shape.
//!
//! An invocation carries no type tag, so the router decodes the payload into a generic JSON tree,
//! sniffs a handful of well-known fields to pick an [`EventKind`], invokes the handler registered
//! for that kind and normalizes the outcome into the `{statusCode, headers, body}` shape the
//! Lambda runtime expects (or nothing at all for queue batches).
//!
//! Core modules:
//! - [`payload`]: raw bytes -> [`DecodedEvent`] (never fails)
//! - [`classify`]: ordered shape predicates -> [`EventKind`]
//! - [`registry`]: [`EventHandler`] capability + fixed kind -> handler mapping
//! - [`handlers`]: greeting, mail relay, queue consumer and echo leaf handlers
//! - [`normalize`]: [`HandlerOutcome`] -> [`NormalizedResponse`]
//! - [`router`]: the composition root and the transparent [`Traced`] wrapper

pub mod classify;
pub mod handlers;
pub mod normalize;
pub mod outcome;
pub mod payload;
pub mod registry;
pub mod router;

pub use classify::{classify, EventKind};
pub use normalize::{normalize, NormalizedResponse};
pub use outcome::{HandlerOutcome, Reply, ReplyBody};
pub use payload::{decode, DecodedEvent};
pub use registry::{EventHandler, HandlerRegistry, ProjectionError};
pub use router::{Route, Router, Traced};
