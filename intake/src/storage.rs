use crate::config::StorageConfig;
use crate::errors::{IntakeError, Result};
use crate::payload::ForwardingPayload;
use async_trait::async_trait;
use http::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

pub const DEFAULT_REJECTION: &str = "Failed to save feedback to the storage endpoint";

/// Status and raw text body of a storage endpoint reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Service of record for forwarded feedback.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the store has a destination at all.
    fn is_configured(&self) -> bool;

    /// Delivers one payload. Transport failures are errors, any HTTP reply is
    /// returned as-is and judged by [`interpret_response`].
    async fn send(&self, payload: &ForwardingPayload) -> Result<StorageResponse>;
}

/// Decoded storage reply. Plain-text replies are kept in `raw`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageAck {
    pub success: bool,
    pub error: Option<String>,
    pub raw: Option<String>,
}

impl StorageAck {
    fn from_response(response: &StorageResponse) -> Self {
        let http_ok = response.status.is_success();

        match serde_json::from_str::<Value>(&response.body) {
            Ok(value) => StorageAck {
                // Only an explicit `false` overrides the HTTP status.
                success: value.get("success").and_then(Value::as_bool).unwrap_or(http_ok),
                error: value
                    .get("error")
                    .and_then(Value::as_str)
                    .filter(|e| !e.trim().is_empty())
                    .map(str::to_string),
                raw: None,
            },
            Err(_) => StorageAck {
                success: http_ok,
                error: None,
                raw: Some(response.body.clone()),
            },
        }
    }
}

/// Turns a storage reply into an acknowledgement or a forwarding error.
pub fn interpret_response(response: StorageResponse) -> Result<StorageAck> {
    let ack = StorageAck::from_response(&response);

    if response.status.is_success() && ack.success {
        return Ok(ack);
    }

    let message = match ack.error {
        Some(error) => error,
        None if !response.status.is_success() => {
            format!("{DEFAULT_REJECTION} ({})", response.status)
        }
        None => DEFAULT_REJECTION.to_string(),
    };

    Err(IntakeError::StorageRejected(message))
}

/// Posts payloads as JSON to a webhook (e.g. a spreadsheet script).
pub struct WebhookStore {
    client: reqwest::Client,
    url: Option<Url>,
    timeout_duration: Duration,
}

impl WebhookStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.clone(),
            timeout_duration: Duration::from_secs(config.timeout_secs),
        }
    }

    async fn post(&self, url: &Url, payload: &ForwardingPayload) -> Result<StorageResponse> {
        let upstream_identifier = url.host_str().unwrap_or(url.as_str()).to_string();

        let response = self
            .client
            .post(url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                IntakeError::StorageRequestFailed(upstream_identifier.clone(), e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IntakeError::StorageRequestFailed(upstream_identifier, e.to_string()))?;

        Ok(StorageResponse { status, body })
    }
}

#[async_trait]
impl FeedbackStore for WebhookStore {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    async fn send(&self, payload: &ForwardingPayload) -> Result<StorageResponse> {
        let url = self.url.as_ref().ok_or(IntakeError::StorageNotConfigured)?;

        timeout(self.timeout_duration, self.post(url, payload))
            .await
            .map_err(|_| {
                IntakeError::StorageTimeout(url.host_str().unwrap_or(url.as_str()).to_string())
            })?
    }
}
