// HTTP listener lifecycle

use crate::{Error, HttpRequest, HttpResponse, Registry};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, body::Incoming as IncomingBody};
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Create a stop channel for [`Listening::serve`].
///
/// Sending `true` through the handle, or dropping every handle, stops the
/// accept loop. Sending `false` does nothing.
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle(Arc::new(tx)), StopSignal(Some(rx)))
}

/// Sending half of a stop channel.
#[derive(Clone, Debug)]
pub struct StopHandle(Arc<watch::Sender<bool>>);

impl StopHandle {
    /// Ask the server to stop accepting connections.
    pub fn stop(&self) {
        self.send(true);
    }

    pub fn send(&self, value: bool) {
        // No receivers left means the server is already gone.
        let _ = self.0.send(value);
    }
}

/// Receiving half of a stop channel.
#[derive(Debug)]
pub struct StopSignal(Option<watch::Receiver<bool>>);

impl StopSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self(None)
    }

    /// Resolve once `true` has been sent or every handle is dropped.
    pub async fn wait(mut self) {
        let Some(rx) = self.0.as_mut() else {
            return std::future::pending().await;
        };

        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Serves a [`Registry`] over HTTP/1.1.
pub struct Server {
    registry: Arc<Registry>,
}

impl Server {
    pub fn new(registry: Registry) -> Self {
        Self::shared(Arc::new(registry))
    }

    /// Serve a registry that is also used elsewhere, for example to keep
    /// registering routes while running.
    pub fn shared(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Bind the listening socket without accepting yet.
    pub async fn bind(self, addr: impl ToSocketAddrs) -> Result<Listening, Error> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "bound listener");

        Ok(Listening {
            listener,
            local_addr,
            registry: self.registry,
        })
    }

    /// Bind `addr` and serve until `stop` fires.
    pub async fn serve(self, addr: impl ToSocketAddrs, stop: StopSignal) -> Result<(), Error> {
        self.bind(addr).await?.serve(stop).await
    }
}

/// A bound listener, ready to accept connections.
pub struct Listening {
    listener: TcpListener,
    local_addr: SocketAddr,
    registry: Arc<Registry>,
}

impl Listening {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until `stop` fires.
    pub async fn serve(self, stop: StopSignal) -> Result<(), Error> {
        self.serve_with_shutdown(stop.wait()).await
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Returns `Ok` once the listener has been closed in response to
    /// `shutdown`; any other accept failure is returned as an error.
    /// Connections already accepted keep being served to completion.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let Listening {
            listener,
            local_addr,
            registry,
        } = self;
        info!(addr = %local_addr, "listening");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(addr = %local_addr, "stop requested, closing listener");
                    drop(listener);
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, peer) = accepted.inspect_err(|err| {
                        error!(addr = %local_addr, error = %err, "accept failed");
                    })?;
                    debug!(peer = %peer, "accepted connection");
                    spawn_connection(stream, registry.clone());
                }
            }
        }
    }
}

fn spawn_connection(stream: tokio::net::TcpStream, registry: Arc<Registry>) {
    let io = TokioIo::new(stream);

    tokio::spawn(async move {
        let service = service_fn(move |req: Request<IncomingBody>| {
            let registry = registry.clone();
            async move { Ok::<_, hyper::Error>(handle_request(req, &registry).await) }
        });

        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
            debug!(error = %err, "error serving connection");
        }
    });
}

/// Run one hyper request through the registry.
async fn handle_request(req: Request<IncomingBody>, registry: &Registry) -> Response<Full<Bytes>> {
    let response = match into_http_request(req).await {
        Ok(request) => registry.dispatch(request).await,
        Err(err) => HttpResponse::from(err),
    };
    into_hyper_response(response)
}

async fn into_http_request(req: Request<IncomingBody>) -> Result<HttpRequest, Error> {
    let (parts, body) = req.into_parts();

    let mut request = HttpRequest::new(parts.method.as_str(), parts.uri.path());
    request.query = parts.uri.query().map(str::to_string);

    // Repeated headers keep their first value. Non-ASCII bytes are kept
    // lossily so a mangled Content-Type is still seen and rejected.
    for (name, value) in parts.headers.iter() {
        request
            .headers
            .entry(name.as_str().to_string())
            .or_insert_with(|| String::from_utf8_lossy(value.as_bytes()).into_owned());
    }

    request.body = body.collect().await?.to_bytes();
    Ok(request)
}

fn into_hyper_response(response: HttpResponse) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(response.status);
    for (key, value) in &response.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }

    builder
        .body(Full::new(Bytes::from(response.body)))
        .unwrap_or_else(|err| {
            error!(error = %err, "invalid response, sending 500");
            let mut fallback = Response::new(Full::new(Bytes::from(err.to_string())));
            *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Values;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_stop_signal_fires_on_true() {
        let (handle, signal) = stop_channel();
        let waiter = tokio::spawn(signal.wait());

        handle.send(false);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        handle.stop();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_stop_signal_fires_when_handles_dropped() {
        let (handle, signal) = stop_channel();
        drop(handle);
        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_never_signal_pends() {
        let result =
            tokio::time::timeout(Duration::from_millis(20), StopSignal::never().wait()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_serve_returns_ok_after_stop() {
        let listening = Server::new(Registry::default())
            .bind("127.0.0.1:0")
            .await
            .unwrap();
        assert_ne!(listening.local_addr().port(), 0);

        let (handle, signal) = stop_channel();
        let server = tokio::spawn(listening.serve(signal));
        handle.stop();

        let result = tokio::time::timeout(Duration::from_secs(1), server)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_non_ascii_content_type_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Registry::default();
        let counter = calls.clone();
        registry
            .register_post("/values", move |values: Values| {
                counter.fetch_add(1, Ordering::SeqCst);
                values.to_string()
            })
            .unwrap();

        let listening = Server::new(registry).bind("127.0.0.1:0").await.unwrap();
        let addr = listening.local_addr();
        let (handle, signal) = stop_channel();
        let server = tokio::spawn(listening.serve(signal));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let mut raw = b"POST /values HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/j".to_vec();
        raw.extend_from_slice(b"\xe9son\r\nContent-Length: 3\r\nConnection: close\r\n\r\na=1");
        stream.write_all(&raw).await.unwrap();

        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).await.unwrap();
        let reply = String::from_utf8_lossy(&reply);
        assert!(reply.starts_with("HTTP/1.1 500"), "{}", reply);
        assert!(reply.contains("Unsupported POST Content-Type"), "{}", reply);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        handle.stop();
        tokio::time::timeout(Duration::from_secs(1), server)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_into_hyper_response_copies_headers() {
        let response = into_hyper_response(
            HttpResponse::ok()
                .with_header("Content-Type", "application/json")
                .with_body(b"{}".to_vec()),
        );
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }
}
