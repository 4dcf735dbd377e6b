// Error types for easyrest

use crate::HttpStatus;
use thiserror::Error;

/// Errors raised while serving a single request.
///
/// Every variant is converted into an HTTP response at the point it is
/// detected; nothing escapes the request being served.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Method not allowed: expected {expected}, got {actual}")]
    MethodNotAllowed { expected: String, actual: String },

    #[error("Unsupported POST Content-Type: {0}")]
    UnsupportedContentType(String),

    #[error("Invalid form data: {0}")]
    Form(String),

    #[error("Invalid JSON document: {0}")]
    Json(String),

    #[error("Invalid XML document: {0}")]
    Xml(String),

    #[error("Invalid multipart upload: {0}")]
    Multipart(String),

    #[error("Multipart upload has no part named {0}")]
    MissingUpload(String),

    #[error("Request body is not valid UTF-8: {0}")]
    Utf8(String),

    #[error("Handler received no argument")]
    MissingArgument,

    #[error("Handler received a {actual} argument where {expected} was expected")]
    ArgumentMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Serializing the handler's result failed. Displayed verbatim.
    #[error("{0}")]
    Serialization(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        self.http_status().code()
    }

    /// Get the HttpStatus enum for this error
    pub fn http_status(&self) -> HttpStatus {
        match self {
            Error::RouteNotFound(_) => HttpStatus::NotFound,
            Error::MethodNotAllowed { .. } => HttpStatus::MethodNotAllowed,
            // Everything else, including malformed bodies, is answered with 500.
            _ => HttpStatus::InternalServerError,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

impl From<quick_xml::DeError> for Error {
    fn from(err: quick_xml::DeError) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<multer::Error> for Error {
    fn from(err: multer::Error) -> Self {
        Error::Multipart(err.to_string())
    }
}

impl From<hyper::Error> for Error {
    fn from(err: hyper::Error) -> Self {
        Error::Http(err.to_string())
    }
}

/// A handler registration that can never serve traffic.
///
/// These are programmer mistakes discovered at startup; the hosting
/// application decides whether to abort.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("{method} handler for {path}: parameter must be {allowed}, got {actual}")]
    UnsupportedParameter {
        method: &'static str,
        path: String,
        allowed: &'static str,
        actual: &'static str,
    },

    #[error("invalid route path {0:?}: paths must start with '/'")]
    InvalidPath(String),
}
