// Environment variable loading

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;
use std::path::Path;

/// Default prefix for server settings, as in `EASYREST_ADDRESS`.
pub const DEFAULT_PREFIX: &str = "EASYREST";

/// Reads prefixed variables from the process environment or a given set.
pub struct EnvLoader {
    prefix: Option<String>,
    source: Option<HashMap<String, String>>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self {
            prefix,
            source: None,
        }
    }

    /// Read from `vars` instead of the process environment.
    pub fn from_vars<I, K, V>(prefix: Option<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix,
            source: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Load a `.env` file into the process environment, then read from it.
    ///
    /// Without a path, `.env` in the working directory is used if present.
    /// Variables already set are not overridden.
    pub fn with_dotenv(prefix: Option<String>, path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                // A missing .env is fine.
                dotenvy::dotenv().ok();
            }
        }
        Ok(Self::new(prefix))
    }

    fn vars(&self) -> Vec<(String, String)> {
        match &self.source {
            Some(source) => source.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            None => env::vars().collect(),
        }
    }

    /// All matching variables, prefix stripped and keys lowercased.
    pub fn load(&self) -> Result<HashMap<String, String>> {
        let mut config = HashMap::new();

        for (key, value) in self.vars() {
            match &self.prefix {
                Some(prefix) => {
                    if let Some(rest) = key
                        .strip_prefix(prefix.as_str())
                        .and_then(|rest| rest.strip_prefix('_'))
                    {
                        config.insert(rest.to_lowercase(), value);
                    }
                }
                None => {
                    config.insert(key.to_lowercase(), value);
                }
            }
        }

        Ok(config)
    }

    /// Load `PREFIX_KEY` for `key`.
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        };

        match &self.source {
            Some(source) => source
                .get(&full_key)
                .cloned()
                .ok_or(ConfigError::KeyNotFound(full_key)),
            None => env::var(&full_key).map_err(ConfigError::EnvError),
        }
    }

    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }
}

impl Default for EnvLoader {
    /// Reads `EASYREST_*` from the process environment.
    fn default() -> Self {
        Self::new(Some(DEFAULT_PREFIX.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_strips_prefix() {
        let loader = EnvLoader::from_vars(
            Some("EASYREST".to_string()),
            [
                ("EASYREST_ADDRESS", "0.0.0.0:80"),
                ("EASYREST_JSON_INDENT", "\t"),
                ("EASYRESTLESS", "no separator"),
                ("PATH", "/bin"),
            ],
        );

        let vars = loader.load().unwrap();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars["address"], "0.0.0.0:80");
        assert_eq!(vars["json_indent"], "\t");
    }

    #[test]
    fn test_load_var_with_prefix() {
        let loader = EnvLoader::from_vars(Some("APP".to_string()), [("APP_LOG_LEVEL", "warn")]);
        assert_eq!(loader.load_var("log_level").unwrap(), "warn");
        assert!(matches!(
            loader.load_var("missing"),
            Err(ConfigError::KeyNotFound(key)) if key == "APP_MISSING"
        ));
        assert_eq!(loader.load_var_or("missing", "fallback"), "fallback");
    }

    #[test]
    fn test_process_environment_missing_var() {
        let loader = EnvLoader::new(Some("EASYREST_TEST".to_string()));
        assert!(loader.load_var("NONEXISTENT_67890").is_err());
    }

    #[test]
    fn test_without_prefix_keeps_everything() {
        let loader = EnvLoader::from_vars(None, [("Home", "/root")]);
        assert_eq!(loader.load().unwrap()["home"], "/root");
    }
}
