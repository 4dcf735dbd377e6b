// Dispatch configuration

use std::fmt;
use std::sync::Arc;

/// Receives one line per request and one per handler error.
///
/// Called as `(method, path)` when a request arrives and as
/// `("ERROR", message)` when serving it fails.
#[derive(Clone)]
pub struct LogSink(Arc<dyn Fn(&str, &str) + Send + Sync>);

impl LogSink {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// A sink that emits `tracing` events on the `easyrest::access` target.
    pub fn tracing() -> Self {
        Self::new(|first, second| {
            if first == ERROR_TAG {
                tracing::error!(target: "easyrest::access", "{}", second);
            } else {
                tracing::info!(target: "easyrest::access", "{} {}", first, second);
            }
        })
    }

    pub fn log(&self, first: &str, second: &str) {
        (self.0)(first, second)
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogSink")
    }
}

/// Tag passed as the first argument for error lines.
pub const ERROR_TAG: &str = "ERROR";

/// Settings shared by every route of a registry.
///
/// Read when a route is registered (the JSON indent is baked into the
/// route's serializer) and on every dispatch.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Indentation for JSON bodies; empty means compact output.
    pub json_indent: String,
    /// Reject requests whose method differs from the route's with 405.
    pub check_method: bool,
    pub log_sink: Option<LogSink>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            json_indent: String::new(),
            check_method: true,
            log_sink: None,
        }
    }
}

impl DispatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json_indent(mut self, indent: impl Into<String>) -> Self {
        self.json_indent = indent.into();
        self
    }

    pub fn with_method_check(mut self, enabled: bool) -> Self {
        self.check_method = enabled;
        self
    }

    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.log_sink = Some(sink);
        self
    }

    pub(crate) fn log_request(&self, method: &str, path: &str) {
        if let Some(sink) = &self.log_sink {
            sink.log(method, path);
        }
    }

    pub(crate) fn log_error(&self, message: &str) {
        if let Some(sink) = &self.log_sink {
            sink.log(ERROR_TAG, message);
        }
    }
}
