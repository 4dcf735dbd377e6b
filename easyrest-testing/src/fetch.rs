//! JSON GET helpers against a running server.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("expected Content-Type 'application/json', but got '{0}'")]
    ContentType(String),

    #[error("Invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),
}

/// GET `url` and decode the body as JSON, whatever its status or
/// content type.
pub async fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, FetchError> {
    let response = reqwest::get(url).await?;
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Like [`get_json`], but fails unless `Content-Type` is exactly
/// `application/json`.
pub async fn get_json_strict<T: DeserializeOwned>(url: &str) -> Result<T, FetchError> {
    let response = reqwest::get(url).await?;

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if content_type != "application/json" {
        return Err(FetchError::ContentType(content_type));
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
