// Settings validation

use crate::{ConfigError, Result};
use std::net::SocketAddr;

/// Trait for validating loaded settings
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Reusable validation rules
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
        Ok(())
    }

    /// Case-insensitive membership in `allowed`.
    pub fn one_of(value: &str, allowed: &[&str], field: &str) -> Result<()> {
        if !allowed.iter().any(|a| a.eq_ignore_ascii_case(value)) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be one of {}, got {:?}",
                field,
                allowed.join(", "),
                value
            )));
        }
        Ok(())
    }

    /// A literal `host:port` socket address.
    pub fn is_socket_addr(value: &str, field: &str) -> Result<SocketAddr> {
        value.parse().map_err(|_| {
            ConfigError::ValidationError(format!(
                "{} must be an IP address and port, got {:?}",
                field, value
            ))
        })
    }

    /// Only spaces and tabs.
    pub fn is_indent(value: &str, field: &str) -> Result<()> {
        if !value.chars().all(|c| c == ' ' || c == '\t') {
            return Err(ConfigError::ValidationError(format!(
                "{} may only contain spaces and tabs",
                field
            )));
        }
        Ok(())
    }
}
