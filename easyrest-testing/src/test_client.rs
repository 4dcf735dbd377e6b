// In-process test client

use easyrest_core::{
    Error, HttpMethod, HttpRequest, HttpResponse, Registry, Values, binder,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Boundary used for multipart bodies built by the client.
pub const MULTIPART_BOUNDARY: &str = "easyrest-test-boundary";

/// Sends requests straight to [`Registry::dispatch`], without a socket.
#[derive(Clone)]
pub struct TestClient {
    registry: Arc<Registry>,
}

impl TestClient {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// GET `target`, which may include a query string.
    pub async fn get(&self, target: &str) -> TestResponse {
        self.send(TestRequestBuilder::new(HttpMethod::GET.as_str(), target).build())
            .await
    }

    /// GET `path` with `query` encoded as its query string.
    pub async fn get_query(&self, path: &str, query: &Values) -> TestResponse {
        self.send(
            TestRequestBuilder::new(HttpMethod::GET.as_str(), path)
                .query(query)
                .build(),
        )
        .await
    }

    /// POST a url-encoded form.
    pub async fn post_form(&self, path: &str, form: &Values) -> TestResponse {
        self.send(TestRequestBuilder::post(path).form(form).build())
            .await
    }

    /// POST `data` as a JSON document.
    pub async fn post_json<T: serde::Serialize>(
        &self,
        path: &str,
        data: &T,
    ) -> Result<TestResponse, Error> {
        let request = TestRequestBuilder::post(path).json(data)?.build();
        Ok(self.send(request).await)
    }

    /// POST an XML document.
    pub async fn post_xml(&self, path: &str, document: &str) -> TestResponse {
        self.send(
            TestRequestBuilder::post(path)
                .content_type(binder::APPLICATION_XML)
                .body(document.as_bytes().to_vec())
                .build(),
        )
        .await
    }

    /// POST a plain-text body.
    pub async fn post_text(&self, path: &str, text: &str) -> TestResponse {
        self.send(
            TestRequestBuilder::post(path)
                .content_type(binder::TEXT_PLAIN)
                .body(text.as_bytes().to_vec())
                .build(),
        )
        .await
    }

    /// POST `document` as a multipart upload in a part named `JSON`.
    pub async fn post_multipart_json(&self, path: &str, document: &str) -> TestResponse {
        self.send(TestRequestBuilder::post(path).multipart_json(document).build())
            .await
    }

    /// Dispatch an arbitrary request.
    pub async fn send(&self, request: HttpRequest) -> TestResponse {
        TestResponse::new(self.registry.dispatch(request).await)
    }
}

/// Builder for test requests
pub struct TestRequestBuilder {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    query: Values,
}

impl TestRequestBuilder {
    /// Any method string is accepted, including ones no route uses.
    pub fn new(method: &str, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Values::parse(query).unwrap_or_default()),
            None => (target, Values::new()),
        };

        Self {
            method: method.to_string(),
            path: path.to_string(),
            headers: HashMap::new(),
            body: Vec::new(),
            query,
        }
    }

    pub fn post(path: &str) -> Self {
        Self::new(HttpMethod::POST.as_str(), path)
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn content_type(self, value: &str) -> Self {
        self.header("Content-Type", value)
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Append query parameters.
    pub fn query(mut self, values: &Values) -> Self {
        self.query.extend(values.clone());
        self
    }

    /// Url-encoded form body.
    pub fn form(self, values: &Values) -> Self {
        self.content_type(binder::FORM_URLENCODED)
            .body(values.encode().into_bytes())
    }

    /// JSON body.
    pub fn json<T: serde::Serialize>(self, data: &T) -> Result<Self, Error> {
        let body = serde_json::to_vec(data).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(self.content_type(binder::APPLICATION_JSON).body(body))
    }

    /// Multipart body with a single file part named `JSON`.
    pub fn multipart_json(self, document: &str) -> Self {
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"data.json\"\r\n\
             Content-Type: application/json\r\n\
             \r\n\
             {document}\r\n\
             --{boundary}--\r\n",
            boundary = MULTIPART_BOUNDARY,
            field = binder::JSON_FIELD,
            document = document,
        );
        self.content_type(&format!(
            "{}; boundary={}",
            binder::MULTIPART_FORM_DATA,
            MULTIPART_BOUNDARY
        ))
        .body(body.into_bytes())
    }

    pub fn build(self) -> HttpRequest {
        let mut request = HttpRequest::new(self.method, &self.path).with_body(self.body);
        if !self.query.is_empty() {
            request.query = Some(self.query.encode());
        }
        request.headers = self.headers;
        request
    }
}

/// Response from a test request
#[derive(Debug, Clone)]
pub struct TestResponse {
    inner: HttpResponse,
}

impl TestResponse {
    pub fn new(inner: HttpResponse) -> Self {
        Self { inner }
    }

    pub fn status(&self) -> u16 {
        self.inner.status
    }

    pub fn body(&self) -> &[u8] {
        &self.inner.body
    }

    /// The body as UTF-8, if it is valid.
    pub fn body_string(&self) -> Option<String> {
        String::from_utf8(self.inner.body.clone()).ok()
    }

    pub fn body_json<T: serde::de::DeserializeOwned>(&self) -> Result<T, String> {
        serde_json::from_slice(&self.inner.body).map_err(|e| format!("Invalid JSON body: {}", e))
    }

    /// Header value by case-insensitive name
    pub fn header(&self, key: &str) -> Option<&str> {
        self.inner.header(key)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.inner.content_type()
    }

    pub fn into_inner(self) -> HttpResponse {
        self.inner
    }
}

impl From<HttpResponse> for TestResponse {
    fn from(inner: HttpResponse) -> Self {
        Self::new(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let query: Values = [("b", "2")].into_iter().collect();
        let req = TestRequestBuilder::new("GET", "/test?a=1")
            .header("Authorization", "Bearer token")
            .query(&query)
            .build();

        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/test");
        assert_eq!(req.query_string(), "a=1&b=2");
        assert_eq!(req.header("authorization"), Some("Bearer token"));
    }

    #[test]
    fn test_multipart_body() {
        let req = TestRequestBuilder::post("/upload")
            .multipart_json(r#"{"a":1}"#)
            .build();

        assert_eq!(
            req.content_type(),
            Some("multipart/form-data; boundary=easyrest-test-boundary")
        );
        let body = String::from_utf8(req.body.to_vec()).unwrap();
        assert!(body.contains("name=\"JSON\""));
        assert!(body.contains("{\"a\":1}\r\n--easyrest-test-boundary--"));
    }

    #[tokio::test]
    async fn test_client_dispatches() {
        let registry = Arc::new(Registry::default());
        registry.register_post("/text", |body: String| body.to_uppercase()).unwrap();

        let client = TestClient::new(registry);
        let response = client.post_text("/text", "shout").await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.body_string().as_deref(), Some("SHOUT"));
    }
}
