//! Request to handler-argument binding.
//!
//! A [`Binder`] is chosen once per route from its [`SignatureShape`]. It
//! reads whatever the handler's parameter needs out of the request and hands
//! back an [`Argument`]; typed decoding into the handler's own parameter
//! type happens when the handler is invoked.

use crate::shape::{ParamKind, SignatureShape};
use crate::{Error, HttpMethod, HttpRequest, Values};
use bytes::Bytes;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tracing::trace;

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_XML: &str = "application/xml";
pub const TEXT_PLAIN: &str = "text/plain";

/// Form key, and multipart part name, that carries a JSON document.
pub const JSON_FIELD: &str = "JSON";

/// A handler argument extracted from a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// Decoded query or form values for a `Values` parameter.
    Values(Values),
    /// The request body for a `String` parameter.
    Text(String),
    /// A JSON document to decode into a record.
    Json(Bytes),
    /// An XML document to decode into a record.
    Xml(Bytes),
    /// Form values to assign onto a fresh record.
    Form(Values),
}

impl Argument {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Argument::Values(_) => "Values",
            Argument::Text(_) => "String",
            Argument::Json(_) => "JSON",
            Argument::Xml(_) => "XML",
            Argument::Form(_) => "form",
        }
    }
}

pub type BindFuture = BoxFuture<'static, Result<Option<Argument>, Error>>;

/// Extracts a route's argument from a request.
pub type Binder = Arc<dyn Fn(HttpRequest) -> BindFuture + Send + Sync>;

/// Build the binder for `shape`.
pub fn binder_for(shape: &SignatureShape) -> Binder {
    match (shape.method, shape.param) {
        (_, ParamKind::None) => Arc::new(|_: HttpRequest| -> BindFuture {
            Box::pin(async { Ok(None) })
        }),
        (HttpMethod::GET, _) => Arc::new(|request: HttpRequest| -> BindFuture {
            Box::pin(async move { bind_query(&request).map(Some) })
        }),
        (HttpMethod::POST, ParamKind::Values) => Arc::new(|request: HttpRequest| -> BindFuture {
            Box::pin(async move { bind_form(&request).map(Some) })
        }),
        (HttpMethod::POST, ParamKind::Text) => Arc::new(|request: HttpRequest| -> BindFuture {
            Box::pin(async move { bind_text(&request).map(Some) })
        }),
        (HttpMethod::POST, ParamKind::Record) => Arc::new(|request: HttpRequest| -> BindFuture {
            Box::pin(async move { bind_record(request).await.map(Some) })
        }),
    }
}

/// The media type of a `Content-Type` header, without parameters.
///
/// An empty header counts as absent.
pub fn media_type(content_type: Option<&str>) -> Option<&str> {
    content_type
        .map(|value| value.split(';').next().unwrap_or_default().trim())
        .filter(|value| !value.is_empty())
}

fn unsupported(request: &HttpRequest) -> Error {
    Error::UnsupportedContentType(request.content_type().unwrap_or_default().to_string())
}

fn bind_query(request: &HttpRequest) -> Result<Argument, Error> {
    Values::parse(request.query_string()).map(Argument::Values)
}

/// Body form fields followed by any query-string values.
fn form_values(request: &HttpRequest) -> Result<Values, Error> {
    let mut values = Values::parse_form(&request.body)?;
    values.extend(Values::parse(request.query_string())?);
    Ok(values)
}

fn bind_form(request: &HttpRequest) -> Result<Argument, Error> {
    match media_type(request.content_type()) {
        None | Some(FORM_URLENCODED) => form_values(request).map(Argument::Values),
        Some(_) => Err(unsupported(request)),
    }
}

fn bind_text(request: &HttpRequest) -> Result<Argument, Error> {
    match media_type(request.content_type()) {
        None | Some(TEXT_PLAIN) => String::from_utf8(request.body.to_vec())
            .map(Argument::Text)
            .map_err(|e| Error::Utf8(e.to_string())),
        Some(_) => Err(unsupported(request)),
    }
}

async fn bind_record(request: HttpRequest) -> Result<Argument, Error> {
    match media_type(request.content_type()) {
        None | Some(FORM_URLENCODED) => {
            let form = form_values(&request)?;
            Ok(record_form(form))
        }
        Some(APPLICATION_JSON) => Ok(Argument::Json(request.body.clone())),
        Some(APPLICATION_XML) => Ok(Argument::Xml(request.body.clone())),
        Some(MULTIPART_FORM_DATA) => {
            let content_type = request.content_type().unwrap_or_default();
            multipart_json(content_type, request.body.clone())
                .await
                .map(Argument::Json)
        }
        Some(_) => Err(unsupported(&request)),
    }
}

/// A form holding nothing but a non-empty `JSON` field is a JSON document.
fn record_form(form: Values) -> Argument {
    if form.len() == 1 {
        if let Some(document) = form.get(JSON_FIELD).filter(|doc| !doc.is_empty()) {
            trace!("binding record from JSON form field");
            return Argument::Json(Bytes::from(document.to_string()));
        }
    }
    Argument::Form(form)
}

/// Contents of the file part named `JSON`. Plain form fields of that name
/// are not uploads and are skipped.
async fn multipart_json(content_type: &str, body: Bytes) -> Result<Bytes, Error> {
    let boundary = multer::parse_boundary(content_type)?;
    let stream = futures_util::stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(JSON_FIELD) && field.file_name().is_some() {
            return Ok(field.bytes().await?);
        }
    }

    Err(Error::MissingUpload(JSON_FIELD.to_string()))
}
