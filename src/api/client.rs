//! Drive v3 REST client with retry handling.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::api::batch;
use crate::api::error::{error_from_response, is_retryable};
use crate::error::{DriveError, Result};
use crate::fs::{FOLDER_MIME_TYPE, Mutation, Node, Page, RemoteStore};
use crate::http::{Body, HttpClient, HttpResponse};

/// Base URL for Drive v3 resources
const API_URL: &str = "https://www.googleapis.com/drive/v3";

/// Batch endpoint for Drive v3
const BATCH_URL: &str = "https://www.googleapis.com/batch/drive/v3";

/// Fields requested for every listed item.
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, owners(emailAddress, displayName, me))";

/// Connection settings for [`DriveClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the files resource
    pub api_base: String,
    /// Batch endpoint URL
    pub batch_url: String,
    /// Limit for a single HTTP attempt
    pub timeout: Duration,
    /// Attempts per request before giving up on transient errors
    pub max_attempts: u32,
    /// First retry delay; doubles after each attempt
    pub initial_backoff: Duration,
    /// Upper bound for the retry delay
    pub max_backoff: Duration,
    /// Optional proxy URL (e.g. "http://proxy:8080" or "socks5://proxy:1080")
    pub proxy: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: API_URL.to_string(),
            batch_url: BATCH_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_attempts: 6,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(256),
            proxy: None,
        }
    }
}

fn next_backoff(delay: Duration, max: Duration) -> Duration {
    delay.saturating_mul(2).min(max)
}

/// Escape a value for use inside a single-quoted Drive query string.
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Query selecting the non-trashed children of `folder_id`.
pub fn children_query(folder_id: &str) -> String {
    format!("'{}' in parents and not trashed", escape_query_value(folder_id))
}

/// Query selecting a non-trashed folder named `name` under `parent_id`.
pub fn child_folder_query(parent_id: &str, name: &str) -> String {
    format!(
        "'{}' in parents and name = '{}' and mimeType = '{}' and not trashed",
        escape_query_value(parent_id),
        escape_query_value(name),
        FOLDER_MIME_TYPE
    )
}

#[derive(Deserialize)]
struct NameOnly {
    name: String,
}

/// Google Drive API client.
#[derive(Debug)]
pub struct DriveClient {
    http: HttpClient,
    config: ClientConfig,
}

impl DriveClient {
    /// Create a client authenticating with an OAuth2 access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(access_token),
            config: ClientConfig::default(),
        }
    }

    /// Create a client with explicit settings.
    pub fn with_config(access_token: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let http = match &config.proxy {
            Some(proxy) => HttpClient::with_proxy(access_token, proxy)?,
            None => HttpClient::new(access_token),
        };
        Ok(Self { http, config })
    }

    /// Active settings.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn files_url(&self, suffix: &str) -> String {
        format!("{}/files{}", self.config.api_base.trim_end_matches('/'), suffix)
    }

    /// Send a request, retrying transient failures with exponential backoff.
    ///
    /// Returns the successful response; non-retryable failures are converted
    /// into [`DriveError`] from the Drive error body.
    async fn send(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Body,
    ) -> Result<HttpResponse> {
        let mut delay = self.config.initial_backoff.min(self.config.max_backoff);
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(%method, url, attempt = attempts, "api request");

            let outcome = timeout(
                self.config.timeout,
                self.http.send(method.clone(), url, query, body.clone()),
            )
            .await;

            let retry_reason = match outcome {
                Err(_) => {
                    if attempts >= self.config.max_attempts {
                        return Err(DriveError::Timeout);
                    }
                    "timeout".to_string()
                }
                Ok(Err(DriveError::RequestError(e)))
                    if (e.is_timeout() || e.is_connect()) && attempts < self.config.max_attempts =>
                {
                    e.to_string()
                }
                Ok(Err(e)) => return Err(e),
                Ok(Ok(response)) if response.is_success() => {
                    debug!(status = response.status, bytes = response.body.len(), "api response");
                    return Ok(response);
                }
                Ok(Ok(response)) => {
                    if !is_retryable(response.status, &response.body) {
                        return Err(error_from_response(response.status, &response.body));
                    }
                    if attempts >= self.config.max_attempts {
                        return Err(DriveError::ServerBusy);
                    }
                    format!("status {}", response.status)
                }
            };

            warn!(url, attempt = attempts, delay_ms = delay.as_millis() as u64, reason = %retry_reason, "retrying request");
            sleep(delay).await;
            delay = next_backoff(delay, self.config.max_backoff);
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.send(Method::GET, url, query, Body::Empty).await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// List one page of items matching a Drive query.
    pub async fn list(&self, q: &str, fields: &str, page_token: Option<&str>) -> Result<Page> {
        let mut query = vec![
            ("q", q.to_string()),
            ("fields", fields.to_string()),
            ("supportsAllDrives", "true".to_string()),
            ("includeItemsFromAllDrives", "true".to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }
        self.get_json(&self.files_url(""), &query).await
    }
}

#[async_trait]
impl RemoteStore for DriveClient {
    async fn list_children(&self, folder_id: &str, page_token: Option<&str>) -> Result<Page> {
        self.list(&children_query(folder_id), LIST_FIELDS, page_token)
            .await
    }

    async fn folder_name(&self, id: &str) -> Result<String> {
        let url = self.files_url(&format!("/{}", id));
        let query = [
            ("fields", "id, name".to_string()),
            ("supportsAllDrives", "true".to_string()),
        ];
        let item: NameOnly = self.get_json(&url, &query).await?;
        Ok(item.name)
    }

    async fn find_child_folder(&self, parent_id: &str, name: &str) -> Result<Option<Node>> {
        let page = self
            .list(
                &child_folder_query(parent_id, name),
                "files(id, name, mimeType)",
                None,
            )
            .await?;
        Ok(page.nodes.into_iter().next())
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<Node> {
        let body = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent_id],
        });
        let query = [
            ("fields", "id, name, mimeType".to_string()),
            ("supportsAllDrives", "true".to_string()),
        ];
        let response = self
            .send(Method::POST, &self.files_url(""), &query, Body::Json(body))
            .await?;
        let node: Node = serde_json::from_str(&response.body)?;
        info!(name, folder = %node.id, parent = parent_id, "created folder");
        Ok(node)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.files_url(&format!("/{}", id));
        let query = [("supportsAllDrives", "true".to_string())];
        self.send(Method::DELETE, &url, &query, Body::Empty).await?;
        Ok(())
    }

    async fn submit_batch(&self, mutations: &[Mutation]) -> Result<Vec<Result<Value>>> {
        if mutations.is_empty() {
            return Ok(Vec::new());
        }

        let encoded = batch::encode(mutations)?;
        let body = Body::Raw {
            content_type: encoded.content_type(),
            data: encoded.body.clone(),
        };
        let response = self
            .send(Method::POST, &self.config.batch_url, &[], body)
            .await?;

        let boundary = response
            .content_type
            .as_deref()
            .and_then(batch::boundary_from_content_type)
            .ok_or(DriveError::InvalidResponse)?;
        Ok(batch::decode(&boundary, &response.body, mutations.len()))
    }
}
