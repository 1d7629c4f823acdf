//! HTTP client wrapper for Drive API requests.

use crate::error::{DriveError, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde_json::Value;

/// Raw response of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Value of the `Content-Type` header, if present
    pub content_type: Option<String>,
    /// Response body
    pub body: String,
}

impl HttpResponse {
    /// Check for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outgoing request body.
#[derive(Debug, Clone)]
pub enum Body {
    /// No body.
    Empty,
    /// JSON document.
    Json(Value),
    /// Pre-encoded body with its content type.
    Raw { content_type: String, data: String },
}

/// HTTP client for making authenticated requests to Drive servers.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    access_token: String,
}

impl HttpClient {
    /// Create a new HTTP client sending the given OAuth2 bearer token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
        }
    }

    /// Create a new HTTP client with a proxy.
    pub fn with_proxy(access_token: impl Into<String>, proxy: &str) -> Result<Self> {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| DriveError::InvalidArgument(format!("Invalid proxy: {}", e)))?;

        let client = Client::builder()
            .proxy(proxy)
            .build()
            .map_err(|e| DriveError::Custom(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            client,
            access_token: access_token.into(),
        })
    }

    /// Send one request.
    ///
    /// Non-2xx statuses are returned as a normal [`HttpResponse`]; only
    /// transport failures become errors, so callers can read Drive's error body.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Body,
    ) -> Result<HttpResponse> {
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .query(query);

        request = match body {
            Body::Empty => request,
            Body::Json(value) => request.json(&value),
            Body::Raw { content_type, data } => {
                request.header(CONTENT_TYPE, content_type).body(data)
            }
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}
