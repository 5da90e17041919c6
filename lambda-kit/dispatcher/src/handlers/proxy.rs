//! Typed view of an API Gateway (REST, payload v1) proxy event.

use std::borrow::Cow;

use aws_lambda_events::event::apigw::ApiGatewayProxyRequest;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::classify::{EventKind, REQUEST_CONTEXT_KEY};
use crate::payload::DecodedEvent;
use crate::registry::ProjectionError;

const HTTP_METHOD_KEY: &str = "httpMethod";

/// A gateway proxy event decoded into the full typed request. Any field of the wrong type fails
/// the projection.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    event: ApiGatewayProxyRequest,
    method_given: bool,
}

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("body is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("body is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProxyRequest {
    /// Decode the payload a second time, now strongly typed.
    ///
    /// An absent or `null` method (top level or in the request context) reads as empty, and a
    /// `null` request context as an empty one. Every other field is checked against its type.
    pub fn project(event: &DecodedEvent) -> Result<Self, ProjectionError> {
        let Some(tree) = event.tree() else {
            return Err(ProjectionError::Unstructured);
        };

        let mut tree = tree.clone();
        let method_given = fill_absent_methods(&mut tree);
        let event = serde_json::from_value::<ApiGatewayProxyRequest>(tree)
            .map_err(|err| ProjectionError::shape(EventKind::HttpRequest, err))?;

        Ok(Self {
            event,
            method_given,
        })
    }

    pub fn event(&self) -> &ApiGatewayProxyRequest {
        &self.event
    }

    pub fn method(&self) -> &str {
        if self.method_given {
            self.event.http_method.as_str()
        } else {
            ""
        }
    }

    pub fn path(&self) -> &str {
        self.event.path.as_deref().unwrap_or_default()
    }

    /// Body bytes, base64-decoded when the gateway flagged them.
    ///
    /// `None` for an absent or empty body.
    pub fn body_bytes(&self) -> Result<Option<Cow<'_, [u8]>>, BodyError> {
        let Some(body) = self.event.body.as_deref().filter(|b| !b.is_empty()) else {
            return Ok(None);
        };

        if self.event.is_base64_encoded {
            Ok(Some(Cow::Owned(STANDARD.decode(body)?)))
        } else {
            Ok(Some(Cow::Borrowed(body.as_bytes())))
        }
    }

    /// Decode the body as JSON. An absent body, an empty body and a literal `null` are all `None`.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<Option<T>, BodyError> {
        match self.body_bytes()? {
            Some(bytes) => Ok(serde_json::from_slice::<Option<T>>(&bytes)?),
            None => Ok(None),
        }
    }
}

/// Give absent method fields an empty value so the typed decode accepts them. Returns whether
/// the top-level method was set.
fn fill_absent_methods(tree: &mut Value) -> bool {
    let Some(obj) = tree.as_object_mut() else {
        return false;
    };

    let given = obj
        .get(HTTP_METHOD_KEY)
        .and_then(Value::as_str)
        .is_some_and(|m| !m.is_empty());
    default_method(obj);

    if let Some(context) = obj.get_mut(REQUEST_CONTEXT_KEY) {
        if context.is_null() {
            *context = Value::Object(Map::new());
        }
        if let Some(context) = context.as_object_mut() {
            default_method(context);
        }
    }
    given
}

fn default_method(obj: &mut Map<String, Value>) {
    let slot = obj.entry(HTTP_METHOD_KEY).or_insert(Value::Null);
    if slot.is_null() {
        *slot = Value::String(String::new());
    }
}
