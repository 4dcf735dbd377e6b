//! Demo server
//!
//! Run with:
//! ```bash
//! cargo run --example demo_server [settings.toml]
//! ```
//!
//! Then try:
//! ```bash
//! curl http://127.0.0.1:8080/struct.json
//! curl http://127.0.0.1:8080/error
//! curl -d 'int=66&flag=true' http://127.0.0.1:8080/post/struct.json
//! curl -d 'int=66&flag=true' http://127.0.0.1:8080/post/values
//! curl http://127.0.0.1:8080/hits
//! curl http://127.0.0.1:8080/close
//! ```
//!
//! Settings may also come from `EASYREST_*` environment variables, e.g.
//! `EASYREST_ADDRESS=0.0.0.0:3000`.

use easyrest::prelude::*;
use easyrest::logging::info;
use easyrest_config::ServerSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Inner {
    a: i32,
    b: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
struct Struct {
    pub flag: bool,
    pub int: i64,
    pub uint: u64,
    pub float32: f32,
    pub float64: f64,
    pub string: String,
    pub inner: Inner,
}

impl Struct {
    fn sample() -> Self {
        Self {
            flag: true,
            int: 1,
            uint: 2,
            float32: 4.0,
            float64: 5.0,
            string: "7".to_string(),
            inner: Inner { a: 8, b: 9 },
        }
    }
}

#[derive(Default)]
struct HitCounter {
    hits: AtomicU64,
}

impl HitCounter {
    fn hit(&self) -> String {
        let n = self.hits.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{} hits", n)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings_file = std::env::args().nth(1).map(PathBuf::from);
    // Friendlier for poking at with a browser; the file and environment
    // still win.
    let defaults = ServerSettings {
        json_indent: "  ".to_string(),
        check_method: false,
        access_log: true,
        ..Default::default()
    };
    let settings = ServerSettings::load_over(defaults, settings_file.as_deref())?;
    let _guard = settings.log_config()?.init()?;

    let registry = Registry::new(settings.dispatch_config());
    let (stop, signal) = stop_channel();

    registry.register_get("/struct.json", Struct::sample)?;

    registry.register_get("/error", || -> Result<Struct, String> {
        Err("This is an error!".to_string())
    })?;

    let closer = stop.clone();
    registry.register_get("/close", move || {
        closer.stop();
        "stopping server..."
    })?;

    registry.register_post("/post/struct.json", |input: Struct| input)?;

    registry.register_post("/post/values", |input: Values| input.to_string())?;

    registry.register_get_with("/hits", HitCounter::default(), HitCounter::hit)?;

    let listening = Server::new(registry)
        .bind(settings.socket_addr()?)
        .await?;
    info!(addr = %listening.local_addr(), "demo server ready");

    listening.serve(signal).await?;
    drop(stop);

    info!("demo server stopped");
    Ok(())
}
