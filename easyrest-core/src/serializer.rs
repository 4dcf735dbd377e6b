//! Handler results to HTTP responses.
//!
//! The serializer for a route is picked from its [`OutputShape`] when the
//! route is registered. At request time it only looks at the values the
//! handler produced.

use crate::shape::{OutputShape, ReturnKind};
use crate::sniff::detect_content_type;
use crate::{HttpResponse, HttpStatus};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer as JsonSerializer};
use std::fmt;
use std::sync::Arc;

pub const APPLICATION_JSON: &str = "application/json";

/// A value that can be written as a JSON document.
///
/// Implemented for everything [`Serialize`]; used to carry a handler's
/// record result without knowing its type.
pub trait JsonBody: Send {
    /// Encode compactly when `indent` is empty, otherwise one field per line
    /// indented by `indent` per level. Field order follows declaration order.
    fn to_json(&self, indent: &str) -> serde_json::Result<Vec<u8>>;
}

impl<T: Serialize + Send> JsonBody for T {
    fn to_json(&self, indent: &str) -> serde_json::Result<Vec<u8>> {
        if indent.is_empty() {
            return serde_json::to_vec(self);
        }

        let mut out = Vec::with_capacity(128);
        let formatter = PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = JsonSerializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        Ok(out)
    }
}

/// The first value a handler returned.
pub enum ReturnValue {
    Text(String),
    Record(Box<dyn JsonBody>),
}

impl ReturnValue {
    pub fn kind(&self) -> ReturnKind {
        match self {
            ReturnValue::Text(_) => ReturnKind::Text,
            ReturnValue::Record(_) => ReturnKind::Record,
        }
    }
}

impl fmt::Debug for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ReturnValue::Record(_) => f.debug_tuple("Record").finish_non_exhaustive(),
        }
    }
}

/// Everything a handler produced.
#[derive(Debug, Default)]
pub struct ReturnValues {
    pub value: Option<ReturnValue>,
    /// The rendered error, present only when the handler reported one.
    pub error: Option<String>,
}

impl ReturnValues {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn value(value: ReturnValue) -> Self {
        Self {
            value: Some(value),
            error: None,
        }
    }

    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }
}

/// Turns a handler's results into a response.
pub type Serializer = Arc<dyn Fn(ReturnValues) -> HttpResponse + Send + Sync>;

/// Build the serializer for `output`.
///
/// * `Empty`: an empty 200.
/// * `Value`: the value, as text or JSON.
/// * `Fallible`: a 500 carrying the error message when an error is
///   present, otherwise the same as `Value`.
pub fn serializer_for(output: OutputShape, json_indent: &str) -> Serializer {
    match output {
        OutputShape::Empty => Arc::new(|_| HttpResponse::ok()),
        OutputShape::Value(kind) => {
            let json_indent = json_indent.to_string();
            Arc::new(move |returned: ReturnValues| write_value(kind, returned.value, &json_indent))
        }
        OutputShape::Fallible(kind) => {
            let json_indent = json_indent.to_string();
            Arc::new(move |returned: ReturnValues| match returned.error {
                Some(message) => {
                    HttpResponse::error(HttpStatus::InternalServerError.code(), message)
                }
                None => write_value(kind, returned.value, &json_indent),
            })
        }
    }
}

fn write_value(kind: ReturnKind, value: Option<ReturnValue>, json_indent: &str) -> HttpResponse {
    match (kind, value) {
        (ReturnKind::Text, Some(ReturnValue::Text(text))) => {
            let body = text.into_bytes();
            HttpResponse::ok()
                .with_header("Content-Type", detect_content_type(&body))
                .with_body(body)
        }
        (ReturnKind::Record, Some(ReturnValue::Record(record))) => match record.to_json(json_indent) {
            Ok(body) => HttpResponse::ok()
                .with_header("Content-Type", APPLICATION_JSON)
                .with_body(body),
            Err(err) => HttpResponse::error(HttpStatus::InternalServerError.code(), err.to_string()),
        },
        (kind, value) => HttpResponse::error(
            HttpStatus::InternalServerError.code(),
            format!(
                "handler returned {:?} where a {:?} value was expected",
                value.map(|v| v.kind()),
                kind
            ),
        ),
    }
}
