//! Shared HTTP plumbing for the readers
//!
//! Every variant goes through [`HttpClient`] so status mapping is uniform:
//! 401/403 become [`ReadError::Auth`], any other non-success status becomes
//! [`ReadError::HttpStatus`]. Timeouts are enforced here via the underlying
//! client; the gatherer adds its own outer deadline.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::error::ReadError;

/// User agent sent when polling scraped pages; some self-hosted stations
/// reject unknown clients.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Thin wrapper over a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Build a client with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, ReadError> {
        let inner = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReadError::ConnectionFailed(e.to_string()))?;
        Ok(Self { inner })
    }

    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<reqwest::Response, ReadError> {
        debug!(url = %url, "GET");

        let mut request = self.inner.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ReadError::Auth(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(ReadError::HttpStatus(status.as_u16()));
        }
        Ok(response)
    }

    /// GET a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or a body
    /// that is not valid JSON.
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<Value, ReadError> {
        let response = self.get(url, query, headers).await?;
        response
            .json()
            .await
            .map_err(|e| ReadError::Parse(e.to_string()))
    }

    /// GET a plain-text body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn get_text(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<String, ReadError> {
        let response = self.get(url, query, headers).await?;
        response
            .text()
            .await
            .map_err(|e| ReadError::Parse(e.to_string()))
    }
}
