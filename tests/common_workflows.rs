//! Integration tests for common easyrest workflows.
//!
//! Each test starts a real listener on an ephemeral port and talks to it
//! over HTTP.

use easyrest::prelude::*;
use easyrest_testing::fetch::{FetchError, get_json, get_json_strict};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Inner {
    a: i32,
    b: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
struct Struct {
    pub flag: bool,
    pub int: i64,
    pub uint: u64,
    pub float64: f64,
    pub string: String,
    pub inner: Inner,
}

fn sample() -> Struct {
    Struct {
        flag: true,
        int: 1,
        uint: 2,
        float64: 5.0,
        string: "7".to_string(),
        inner: Inner { a: 8, b: 9 },
    }
}

struct Running {
    addr: SocketAddr,
    stop: StopHandle,
    task: JoinHandle<Result<(), Error>>,
}

impl Running {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn shutdown(self) {
        self.stop.stop();
        self.task.await.unwrap().unwrap();
    }
}

async fn start(registry: Arc<Registry>) -> Running {
    let listening = Server::shared(registry)
        .bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listening.local_addr();
    let (stop, signal) = stop_channel();
    let task = tokio::spawn(listening.serve(signal));
    Running { addr, stop, task }
}

fn demo_registry() -> Arc<Registry> {
    let registry = Registry::new(DispatchConfig::new().with_json_indent("  "));
    registry.register_get("/struct.json", sample).unwrap();
    registry
        .register_get("/error", || -> Result<Struct, String> {
            Err("This is an error!".to_string())
        })
        .unwrap();
    registry
        .register_post("/post/struct.json", |input: Struct| input)
        .unwrap();
    registry
        .register_post("/post/values", |input: Values| input.to_string())
        .unwrap();
    Arc::new(registry)
}

#[tokio::test]
async fn test_get_struct_over_http() {
    let server = start(demo_registry()).await;

    let fetched: Struct = get_json_strict(&server.url("/struct.json")).await.unwrap();
    assert_eq!(fetched, sample());

    server.shutdown().await;
}

#[tokio::test]
async fn test_error_endpoint_is_not_json() {
    let server = start(demo_registry()).await;

    let err = get_json_strict::<Struct>(&server.url("/error"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::ContentType(ref ct) if ct.starts_with("text/plain")));

    let response = reqwest::get(server.url("/error")).await.unwrap();
    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(response.text().await.unwrap(), "This is an error!");

    server.shutdown().await;
}

#[tokio::test]
async fn test_post_form_and_json() {
    let server = start(demo_registry()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/post/struct.json"))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("int=66&flag=true")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let echoed: Struct = response.json().await.unwrap();
    assert_eq!(echoed.int, 66);
    assert!(echoed.flag);

    let response = client
        .post(server.url("/post/struct.json"))
        .json(&sample())
        .send()
        .await
        .unwrap();
    let echoed: Struct = response.json().await.unwrap();
    assert_eq!(echoed, sample());

    server.shutdown().await;
}

#[tokio::test]
async fn test_post_values_merges_query() {
    let server = start(demo_registry()).await;

    let response = reqwest::Client::new()
        .post(server.url("/post/values?Int=66"))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("Bool=true")
        .send()
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "map[Bool:[true] Int:[66]]");

    server.shutdown().await;
}

#[tokio::test]
async fn test_unknown_path_and_wrong_method() {
    let server = start(demo_registry()).await;

    let missing = reqwest::get(server.url("/missing")).await.unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    let wrong = reqwest::get(server.url("/post/values")).await.unwrap();
    assert_eq!(wrong.status().as_u16(), 405);

    // Error bodies are plain text.
    let lenient: Result<Struct, _> = get_json(&server.url("/missing")).await;
    assert!(lenient.is_err());

    server.shutdown().await;
}

#[tokio::test]
async fn test_handler_can_stop_server() {
    let registry = Arc::new(Registry::default());
    let (stop, signal) = stop_channel();
    let closer = stop.clone();
    registry
        .register_get("/close", move || {
            closer.stop();
            "stopping server..."
        })
        .unwrap();

    let listening = Server::shared(registry).bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/close", listening.local_addr());
    let task = tokio::spawn(listening.serve(signal));

    let body = reqwest::get(&url).await.unwrap().text().await.unwrap();
    assert_eq!(body, "stopping server...");

    task.await.unwrap().unwrap();
    drop(stop);
}

#[tokio::test]
async fn test_routes_added_while_serving() {
    let registry = demo_registry();
    let server = start(registry.clone()).await;

    let before = reqwest::get(server.url("/late")).await.unwrap();
    assert_eq!(before.status().as_u16(), 404);

    registry.register_get("/late", || "here now").unwrap();
    let after = reqwest::get(server.url("/late")).await.unwrap();
    assert_eq!(after.text().await.unwrap(), "here now");

    server.shutdown().await;
}
