// easyrest - serve plain functions over HTTP
//
// A handler's parameter and return types decide how its request is decoded
// and how its result is encoded; there is no per-route glue to write.

// Re-export core functionality
pub use easyrest_core::*;

// Re-export the derive alongside the trait of the same name
pub use easyrest_macro::Record;

// Re-export optional crates
#[cfg(feature = "config")]
pub use easyrest_config;

#[cfg(feature = "testing")]
pub use easyrest_testing;

// Prelude for common imports
pub mod prelude {
    pub use crate::logging::{LogConfig, LogFormat, LogLevel};
    pub use crate::{
        DispatchConfig, Error, HttpMethod, HttpRequest, HttpResponse, LogSink, Method, Record,
        RegistrationError, Registry, Server, StopHandle, StopSignal, Values, stop_channel,
    };
}
