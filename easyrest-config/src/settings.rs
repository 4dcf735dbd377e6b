// Server settings

use crate::validation::{ConfigValidator, Validate};
use crate::{ConfigError, ConfigLoader, DEFAULT_PREFIX, EnvLoader, Result};
use easyrest_core::logging::{LogConfig, LogFormat, LogLevel};
use easyrest_core::{DispatchConfig, LogSink};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use tracing::debug;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "warning", "error"];
const LOG_FORMATS: &[&str] = &["json", "plain", "text", "pretty", "compact"];

/// Settings for one server process.
///
/// Layered as defaults, then an optional file, then `EASYREST_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// `host:port` to listen on.
    pub address: String,
    /// Indentation for JSON responses; empty for compact output.
    pub json_indent: String,
    /// Answer 405 when the request method differs from the route's.
    pub check_method: bool,
    /// Send a line per request to the log.
    pub access_log: bool,
    pub log_level: String,
    pub log_format: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".to_string(),
            json_indent: String::new(),
            check_method: true,
            access_log: false,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl ServerSettings {
    /// Defaults, overlaid with `file` if given, then with the process
    /// environment (including a `.env` in the working directory, if any).
    /// The result is validated.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_over(Self::default(), file)
    }

    /// Like [`load`](Self::load), layered over `base` instead of the
    /// built-in defaults.
    pub fn load_over(base: Self, file: Option<&Path>) -> Result<Self> {
        let mut settings = match file {
            Some(path) => base.overlay_file(path)?,
            None => base,
        };
        let env = EnvLoader::with_dotenv(Some(DEFAULT_PREFIX.to_string()), None)?;
        settings.apply_env(&env.load()?)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read a JSON, TOML or `.env` file; missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::default().overlay_file(path)
    }

    /// Replace the fields named in a JSON, TOML or `.env` file.
    pub fn overlay_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let loader = ConfigLoader::auto(path)?;
        let value = loader.load_file(path)?;
        debug!(path = %path.display(), "loaded settings file");

        match value {
            // `.env` files carry strings only; route them through the
            // same coercion as environment variables.
            serde_json::Value::Object(map) if loader.format() == crate::FileFormat::Env => {
                let vars: HashMap<String, String> = map
                    .into_iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
                    .collect();
                let mut settings = self;
                settings.apply_env(&vars)?;
                Ok(settings)
            }
            serde_json::Value::Object(overrides) => {
                let mut merged = serde_json::to_value(&self)
                    .map_err(|e| ConfigError::ParseError(e.to_string()))?;
                if let serde_json::Value::Object(fields) = &mut merged {
                    fields.extend(overrides);
                }
                serde_json::from_value(merged).map_err(|e| ConfigError::ParseError(e.to_string()))
            }
            value => {
                serde_json::from_value(value).map_err(|e| ConfigError::ParseError(e.to_string()))
            }
        }
    }

    /// Override fields from lowercased, prefix-stripped variables.
    /// Unknown keys are ignored.
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        for (key, value) in vars {
            match key.as_str() {
                "address" => self.address = value.clone(),
                "json_indent" => self.json_indent = value.clone(),
                "check_method" => self.check_method = parse_flag(key, value)?,
                "access_log" => self.access_log = parse_flag(key, value)?,
                "log_level" => self.log_level = value.clone(),
                "log_format" => self.log_format = value.clone(),
                _ => continue,
            }
            debug!(key = %key, "setting overridden from environment");
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        ConfigValidator::is_socket_addr(&self.address, "address")
    }

    pub fn log_level(&self) -> Result<LogLevel> {
        self.log_level
            .parse()
            .map_err(|reason: String| ConfigError::invalid("log_level", &self.log_level, reason))
    }

    pub fn log_format(&self) -> Result<LogFormat> {
        self.log_format
            .parse()
            .map_err(|reason: String| ConfigError::invalid("log_format", &self.log_format, reason))
    }

    /// Dispatch settings for a registry. With `access_log` on, requests are
    /// logged through `tracing`.
    pub fn dispatch_config(&self) -> DispatchConfig {
        let config = DispatchConfig::new()
            .with_json_indent(self.json_indent.clone())
            .with_method_check(self.check_method);

        if self.access_log {
            config.with_log_sink(LogSink::tracing())
        } else {
            config
        }
    }

    pub fn log_config(&self) -> Result<LogConfig> {
        Ok(LogConfig::new()
            .level(self.log_level()?)
            .format(self.log_format()?))
    }
}

impl Validate for ServerSettings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::not_empty(&self.address, "address")?;
        ConfigValidator::is_socket_addr(&self.address, "address")?;
        ConfigValidator::is_indent(&self.json_indent, "json_indent")?;
        ConfigValidator::one_of(&self.log_level, LOG_LEVELS, "log_level")?;
        ConfigValidator::one_of(&self.log_format, LOG_FORMATS, "log_format")?;
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    easyrest_core::record::parse_bool(value)
        .ok_or_else(|| ConfigError::invalid(key, value, "expected a boolean"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = ServerSettings::default();
        assert!(settings.validate().is_ok());
        assert!(settings.check_method);
        assert_eq!(settings.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_apply_env() {
        let mut settings = ServerSettings::default();
        settings
            .apply_env(&vars(&[
                ("address", "0.0.0.0:9000"),
                ("json_indent", "  "),
                ("check_method", "false"),
                ("log_level", "debug"),
                ("unrelated", "x"),
            ]))
            .unwrap();

        assert_eq!(settings.address, "0.0.0.0:9000");
        assert_eq!(settings.json_indent, "  ");
        assert!(!settings.check_method);
        assert_eq!(settings.log_level().unwrap(), LogLevel::Debug);
    }

    #[test]
    fn test_apply_env_rejects_bad_flag() {
        let mut settings = ServerSettings::default();
        let err = settings
            .apply_env(&vars(&[("check_method", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_validation_failures() {
        let settings = ServerSettings {
            address: "nowhere".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = ServerSettings {
            log_format: "yaml".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_dispatch_config() {
        let settings = ServerSettings {
            json_indent: "\t".to_string(),
            check_method: false,
            access_log: true,
            ..Default::default()
        };
        let config = settings.dispatch_config();
        assert_eq!(config.json_indent, "\t");
        assert!(!config.check_method);
        assert!(config.log_sink.is_some());
    }

    #[test]
    fn test_log_config() {
        let settings = ServerSettings {
            log_level: "warn".to_string(),
            log_format: "pretty".to_string(),
            ..Default::default()
        };
        let config = settings.log_config().unwrap();
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Pretty);
    }
}
