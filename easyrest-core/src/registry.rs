// Route registry and request dispatch

use crate::binder::{Binder, binder_for};
use crate::config::DispatchConfig;
use crate::handler::{Handler, Invocable, Method};
use crate::serializer::{Serializer, serializer_for};
use crate::shape::SignatureShape;
use crate::{Error, HttpMethod, HttpRequest, HttpResponse, RegistrationError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// A handler registered for one exact path.
///
/// The binder and serializer are fixed when the route is built.
pub struct Route {
    pub path: String,
    pub shape: SignatureShape,
    bind: Binder,
    invocable: Invocable,
    serialize: Serializer,
}

impl Route {
    pub fn new<H, Args>(
        method: HttpMethod,
        path: &str,
        handler: H,
        config: &DispatchConfig,
    ) -> Result<Self, RegistrationError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        if !path.starts_with('/') {
            return Err(RegistrationError::InvalidPath(path.to_string()));
        }

        let shape = SignatureShape::classify(method, path, H::PARAM, H::OUTPUT)?;

        Ok(Self {
            path: path.to_string(),
            shape,
            bind: binder_for(&shape),
            invocable: Invocable::new(handler),
            serialize: serializer_for(shape.output, &config.json_indent),
        })
    }

    pub fn method(&self) -> HttpMethod {
        self.shape.method
    }

    /// Bind, invoke and serialize.
    ///
    /// Errors are only those raised before the handler produced a result;
    /// an error the handler itself returns is already part of the response.
    async fn handle(&self, request: HttpRequest, config: &DispatchConfig) -> Result<HttpResponse, Error> {
        let argument = (self.bind)(request).await?;
        let returned = self.invocable.invoke(argument)?;

        if let Some(message) = returned.error.as_deref() {
            error!(path = %self.path, error = %message, "handler returned an error");
            config.log_error(message);
        }

        Ok((self.serialize)(returned))
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("shape", &self.shape)
            .field("invocable", &self.invocable)
            .finish_non_exhaustive()
    }
}

/// Maps paths to handlers and serves requests against them.
///
/// Paths match exactly; registering a path again replaces its handler.
/// Registration takes `&self`, so routes can be added while serving.
pub struct Registry {
    routes: RwLock<HashMap<String, Arc<Route>>>,
    config: DispatchConfig,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}

impl Registry {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Register a GET handler.
    ///
    /// GET handlers take nothing or the decoded query as [`crate::Values`].
    pub fn register_get<H, Args>(&self, path: &str, handler: H) -> Result<(), RegistrationError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.register(HttpMethod::GET, path, handler)
    }

    /// Register a POST handler.
    ///
    /// POST handlers take nothing, the decoded form as [`crate::Values`], a
    /// record, or the body as a `String`.
    pub fn register_post<H, Args>(&self, path: &str, handler: H) -> Result<(), RegistrationError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.register(HttpMethod::POST, path, handler)
    }

    /// Register a GET handler bound to `receiver`.
    pub fn register_get_with<R, F, Args>(
        &self,
        path: &str,
        receiver: R,
        func: F,
    ) -> Result<(), RegistrationError>
    where
        Method<R, F>: Handler<Args>,
        Args: 'static,
    {
        self.register(HttpMethod::GET, path, Method::new(receiver, func))
    }

    /// Register a POST handler bound to `receiver`.
    pub fn register_post_with<R, F, Args>(
        &self,
        path: &str,
        receiver: R,
        func: F,
    ) -> Result<(), RegistrationError>
    where
        Method<R, F>: Handler<Args>,
        Args: 'static,
    {
        self.register(HttpMethod::POST, path, Method::new(receiver, func))
    }

    /// Register `handler` for `method` at `path`.
    pub fn register<H, Args>(
        &self,
        method: HttpMethod,
        path: &str,
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        H: Handler<Args>,
        Args: 'static,
    {
        let route = Route::new(method, path, handler, &self.config).inspect_err(|err| {
            error!(method = %method, path = %path, error = %err, "rejected handler registration");
        })?;

        info!(
            method = %method,
            path = %path,
            param = %route.shape.param,
            outputs = route.shape.output.arity(),
            "registered route"
        );

        if self
            .routes
            .write()
            .insert(path.to_string(), Arc::new(route))
            .is_some()
        {
            debug!(path = %path, "replaced existing route");
        }
        Ok(())
    }

    pub fn route(&self, path: &str) -> Option<Arc<Route>> {
        self.routes.read().get(path).cloned()
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.routes.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }

    /// Serve one request.
    ///
    /// Never fails: every error becomes a response. Unknown paths get 404;
    /// a method other than the route's gets 405 when method checking is on;
    /// everything else that goes wrong is a 500 with the error as its body.
    pub async fn dispatch(&self, request: HttpRequest) -> HttpResponse {
        self.config.log_request(&request.method, &request.path);
        debug!(method = %request.method, path = %request.path, "dispatching request");

        let Some(route) = self.route(&request.path) else {
            debug!(path = %request.path, "no route registered");
            return HttpResponse::from(Error::RouteNotFound(request.path));
        };

        if self.config.check_method && request.method != route.method().as_str() {
            debug!(
                path = %request.path,
                expected = %route.method(),
                actual = %request.method,
                "method not allowed"
            );
            return HttpResponse::from(Error::MethodNotAllowed {
                expected: route.method().to_string(),
                actual: request.method,
            });
        }

        match route.handle(request, &self.config).await {
            Ok(response) => response,
            Err(err) => {
                error!(path = %route.path, error = %err, "request failed");
                self.config.log_error(&err.to_string());
                HttpResponse::from(err)
            }
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("paths", &self.paths())
            .field("config", &self.config)
            .finish()
    }
}
