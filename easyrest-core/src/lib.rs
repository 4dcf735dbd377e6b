// Core library for easyrest
// Registers plain functions as HTTP handlers, deriving request binding and
// response encoding from each function's signature.

pub mod binder;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logging;
pub mod record;
pub mod registry;
pub mod serializer;
pub mod server;
pub mod shape;
pub mod sniff;
pub mod status;
pub mod values;

// Re-export commonly used types
pub use binder::Argument;
pub use config::{DispatchConfig, LogSink};
pub use error::*;
pub use handler::{Handler, Invocable, Method, Param, ReturnItem, Returns};
pub use http::*;
pub use record::{FormValue, Record};
pub use registry::{Registry, Route};
pub use server::{Listening, Server, StopHandle, StopSignal, stop_channel};
pub use shape::{OutputShape, ParamKind, ReturnKind, SignatureShape};
pub use status::*;
pub use values::*;
