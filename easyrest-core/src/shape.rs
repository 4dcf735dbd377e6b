//! Signature classification.
//!
//! Every registered handler is reduced to a [`SignatureShape`] once, when it
//! is registered. The binder and the serializer for the route are chosen from
//! the shape alone; nothing about the handler's types is examined per request.

use crate::{HttpMethod, RegistrationError};
use std::fmt;

/// What a handler takes, after any bound receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// No parameter.
    None,
    /// The decoded query (GET) or form (POST) as a [`crate::Values`] map.
    Values,
    /// The raw request body as text.
    Text,
    /// A record decoded from form fields, JSON, XML or a multipart upload.
    Record,
}

impl ParamKind {
    pub fn name(&self) -> &'static str {
        match self {
            ParamKind::None => "none",
            ParamKind::Values => "Values",
            ParamKind::Text => "String",
            ParamKind::Record => "record",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The kind of the value a handler returns first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnKind {
    /// Written as the body, with a sniffed content type.
    Text,
    /// Written as a JSON document.
    Record,
}

/// What a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputShape {
    /// Nothing; the response is an empty 200.
    Empty,
    /// A single value.
    Value(ReturnKind),
    /// A value plus an error that replaces it when present.
    Fallible(ReturnKind),
}

impl OutputShape {
    /// How many values the handler produces.
    pub fn arity(&self) -> usize {
        match self {
            OutputShape::Empty => 0,
            OutputShape::Value(_) => 1,
            OutputShape::Fallible(_) => 2,
        }
    }

    pub fn return_kind(&self) -> Option<ReturnKind> {
        match self {
            OutputShape::Empty => None,
            OutputShape::Value(kind) | OutputShape::Fallible(kind) => Some(*kind),
        }
    }
}

/// The classified signature of a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureShape {
    pub method: HttpMethod,
    pub param: ParamKind,
    pub output: OutputShape,
}

impl SignatureShape {
    /// Check that `param` is acceptable for `method` and build the shape.
    ///
    /// GET handlers take nothing or a [`crate::Values`] query map. POST
    /// handlers take nothing, a `Values` form, a record, or the body as a
    /// `String`. Parameter counts and return types are enforced by the
    /// [`crate::Handler`] trait bounds before this point.
    pub fn classify(
        method: HttpMethod,
        path: &str,
        param: ParamKind,
        output: OutputShape,
    ) -> Result<Self, RegistrationError> {
        let allowed = match method {
            HttpMethod::GET => matches!(param, ParamKind::None | ParamKind::Values),
            HttpMethod::POST => true,
        };

        if !allowed {
            return Err(RegistrationError::UnsupportedParameter {
                method: method.as_str(),
                path: path.to_string(),
                allowed: "Values",
                actual: param.name(),
            });
        }

        Ok(Self {
            method,
            param,
            output,
        })
    }

    /// How many parameters the handler takes, not counting a receiver.
    pub fn param_arity(&self) -> usize {
        match self.param {
            ParamKind::None => 0,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_accepts_values_or_nothing() {
        let output = OutputShape::Value(ReturnKind::Record);
        for param in [ParamKind::None, ParamKind::Values] {
            let shape = SignatureShape::classify(HttpMethod::GET, "/x", param, output).unwrap();
            assert_eq!(shape.param, param);
        }
    }

    #[test]
    fn test_get_rejects_body_parameters() {
        let output = OutputShape::Empty;
        let err = SignatureShape::classify(HttpMethod::GET, "/x", ParamKind::Record, output)
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::UnsupportedParameter {
                method: "GET",
                path: "/x".to_string(),
                allowed: "Values",
                actual: "record",
            }
        );

        assert!(
            SignatureShape::classify(HttpMethod::GET, "/x", ParamKind::Text, output).is_err()
        );
    }

    #[test]
    fn test_post_accepts_every_param_kind() {
        for param in [
            ParamKind::None,
            ParamKind::Values,
            ParamKind::Text,
            ParamKind::Record,
        ] {
            let shape = SignatureShape::classify(
                HttpMethod::POST,
                "/p",
                param,
                OutputShape::Fallible(ReturnKind::Text),
            )
            .unwrap();
            assert_eq!(shape.param_arity(), usize::from(param != ParamKind::None));
        }
    }

    #[test]
    fn test_output_arity() {
        assert_eq!(OutputShape::Empty.arity(), 0);
        assert_eq!(OutputShape::Value(ReturnKind::Text).arity(), 1);
        assert_eq!(OutputShape::Fallible(ReturnKind::Record).arity(), 2);
        assert_eq!(
            OutputShape::Fallible(ReturnKind::Record).return_kind(),
            Some(ReturnKind::Record)
        );
    }
}
