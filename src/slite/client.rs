//! Slite API client
//!
//! `execute_once` issues a single HTTP call and classifies the response;
//! `request` runs it under the client's rate limiter and retry policy. The
//! typed note operations below are built on `request`.

use super::models::{parse_hits, NoteDraft, NotePatch, RemoteKind, RemoteNote, SearchHit};
use crate::error::ApiError;
use crate::resilience::{RateLimiter, RetryPolicy};
use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Production API root
pub const DEFAULT_BASE_URL: &str = "https://api.slite.com";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Slite notes API
#[derive(Clone)]
pub struct SliteClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
    limiter: Arc<RateLimiter>,
}

impl SliteClient {
    /// Create a client with the default retry policy and rate limiter
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry: RetryPolicy::default(),
            limiter: Arc::new(RateLimiter::default()),
        })
    }

    /// Replace the retry policy (builder pattern)
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Share a rate limiter with other clients (builder pattern)
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Send one request and classify the outcome. No retry, no rate limiting.
    ///
    /// Returns the parsed JSON body on 2xx, `Value::Null` for 204 or an empty
    /// body.
    pub async fn execute_once(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(method = %method, path, error = %e, "Request did not reach the server");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = ApiError::from_status(status.as_u16(), path, text);
            warn!(method = %method, path, status = status.as_u16(), error = %err, "Request failed");
            return Err(err);
        }

        let bytes = response.bytes().await?;
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `execute_once` under the rate limiter and retry policy
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let operation = format!("{} {}", method, path);
        self.retry
            .run(Some(self.limiter.as_ref()), &operation, move || {
                self.execute_once(method.clone(), path, query, body)
            })
            .await
    }

    // ========================================================================
    // Notes
    // ========================================================================

    /// Create a note or folder
    pub async fn create_note(&self, draft: &NoteDraft) -> Result<RemoteNote, ApiError> {
        let body = serde_json::to_value(draft).map_err(|e| ApiError::Decode(e.to_string()))?;
        info!(title = %draft.title, kind = ?draft.kind, "Creating remote note");
        let value = self
            .request(Method::POST, "/v1/notes", &[], Some(&body))
            .await?;
        let note = decode_note(value, "create")?;
        debug!(note_id = %note.id, "Remote note created");
        Ok(note)
    }

    /// Fetch a note by id
    pub async fn get_note(&self, id: &str) -> Result<RemoteNote, ApiError> {
        let path = note_path(id)?;
        let value = self.request(Method::GET, &path, &[], None).await?;
        decode_note(value, "get")
    }

    /// Update a note
    pub async fn update_note(&self, id: &str, patch: &NotePatch) -> Result<RemoteNote, ApiError> {
        let path = note_path(id)?;
        let body = serde_json::to_value(patch).map_err(|e| ApiError::Decode(e.to_string()))?;
        let value = self.request(Method::PUT, &path, &[], Some(&body)).await?;
        decode_note(value, "update")
    }

    /// Delete a note or folder
    pub async fn delete_note(&self, id: &str) -> Result<(), ApiError> {
        let path = note_path(id)?;
        info!(note_id = %id, "Deleting remote note");
        self.request(Method::DELETE, &path, &[], None).await?;
        Ok(())
    }

    /// Search notes or folders
    pub async fn search_notes(
        &self,
        query: &str,
        kind: RemoteKind,
        limit: usize,
    ) -> Result<Vec<SearchHit>, ApiError> {
        let params = [
            ("query", query.to_string()),
            ("type", kind.to_string()),
            ("hitsPerPage", limit.to_string()),
        ];
        let value = self
            .request(Method::GET, "/v1/search-notes", &params, None)
            .await?;
        let hits = parse_hits(value).map_err(|e| ApiError::Decode(e.to_string()))?;
        debug!(query, kind = %kind, hits = hits.len(), "Remote search finished");
        Ok(hits)
    }
}

/// Build `/v1/notes/{id}`, refusing ids that would change the path
fn note_path(id: &str) -> Result<String, ApiError> {
    if id.is_empty() || id.contains(['/', '?', '#', ' ']) {
        return Err(ApiError::Validation {
            message: format!("invalid note id: {:?}", id),
        });
    }
    Ok(format!("/v1/notes/{}", id))
}

fn decode_note(value: Value, operation: &str) -> Result<RemoteNote, ApiError> {
    if value.is_null() {
        return Err(ApiError::Decode(format!(
            "empty response to {} request",
            operation
        )));
    }
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}
