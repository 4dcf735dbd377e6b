//! Testing utilities for easyrest.
//!
//! - [`TestClient`] drives a [`Registry`](easyrest_core::Registry) in
//!   process, without opening a socket
//! - assertion helpers for the responses it returns
//! - [`fetch`] helpers for GETting JSON from a running server
//!
//! ```
//! use easyrest_core::{Registry, Values};
//! use easyrest_testing::*;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let registry = Arc::new(Registry::default());
//! registry
//!     .register_get("/hello", |query: Values| {
//!         format!("Hello, {}!", query.get("name").unwrap_or("world"))
//!     })
//!     .unwrap();
//!
//! let client = TestClient::new(registry);
//! let response = client.get("/hello?name=Ada").await;
//! assert_status(&response, 200);
//! assert_body(&response, "Hello, Ada!");
//! # });
//! ```

mod assertions;
pub mod fetch;
mod test_client;

pub use assertions::{
    assert_body, assert_body_contains, assert_header, assert_http_status, assert_json,
    assert_status,
};
pub use fetch::{FetchError, get_json, get_json_strict};
pub use test_client::{MULTIPART_BOUNDARY, TestClient, TestRequestBuilder, TestResponse};
