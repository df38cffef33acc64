use crate::analyzer::{AnalyzerError, SentimentAnalyzer};
use crate::errors::{IntakeError, Result};
use crate::payload::ForwardingPayload;
use crate::storage::{FeedbackStore, StorageResponse};
use async_trait::async_trait;
use http::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Analyzer with a scripted outcome.
pub enum MockAnalyzer {
    Reply(String),
    /// Fails with a real connection error.
    NetworkError,
    Timeout,
    MissingApiKey,
    Counted(Box<MockAnalyzer>, Arc<AtomicUsize>),
}

impl MockAnalyzer {
    /// Returns a counter of `generate` calls; the analyzer keeps its outcome.
    pub fn call_counter(&mut self) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = std::mem::replace(self, MockAnalyzer::MissingApiKey);
        *self = MockAnalyzer::Counted(Box::new(inner), calls.clone());
        calls
    }
}

#[async_trait]
impl SentimentAnalyzer for MockAnalyzer {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, prompt: &str) -> Result<String, AnalyzerError> {
        match self {
            MockAnalyzer::Reply(text) => Ok(text.clone()),
            MockAnalyzer::NetworkError => {
                let err = reqwest::Client::new()
                    .get("http://127.0.0.1:1/")
                    .send()
                    .await
                    .expect_err("nothing listens on port 1");
                Err(AnalyzerError::RequestFailed(err))
            }
            MockAnalyzer::Timeout => Err(AnalyzerError::Timeout(Duration::from_secs(30))),
            MockAnalyzer::MissingApiKey => Err(AnalyzerError::MissingApiKey),
            MockAnalyzer::Counted(inner, calls) => {
                calls.fetch_add(1, Ordering::SeqCst);
                inner.generate(prompt).await
            }
        }
    }
}

enum StoreBehavior {
    Reply(StorageResponse),
    Unreachable,
    Unconfigured,
}

/// Store that records every payload it is asked to send.
pub struct MockStore {
    behavior: StoreBehavior,
    attempts: AtomicUsize,
    payloads: Mutex<Vec<serde_json::Value>>,
}

impl MockStore {
    fn with_behavior(behavior: StoreBehavior) -> Self {
        Self {
            behavior,
            attempts: AtomicUsize::new(0),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(status: u16, body: &str) -> Self {
        Self::with_behavior(StoreBehavior::Reply(StorageResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
        }))
    }

    pub fn unreachable() -> Self {
        Self::with_behavior(StoreBehavior::Unreachable)
    }

    pub fn unconfigured() -> Self {
        Self::with_behavior(StoreBehavior::Unconfigured)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<serde_json::Value> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedbackStore for MockStore {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_configured(&self) -> bool {
        !matches!(self.behavior, StoreBehavior::Unconfigured)
    }

    async fn send(&self, payload: &ForwardingPayload) -> Result<StorageResponse> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            StoreBehavior::Reply(response) => {
                self.payloads
                    .lock()
                    .unwrap()
                    .push(serde_json::to_value(payload).unwrap());
                Ok(response.clone())
            }
            StoreBehavior::Unreachable => Err(IntakeError::StorageRequestFailed(
                "script.google.com".into(),
                "connection refused".into(),
            )),
            StoreBehavior::Unconfigured => Err(IntakeError::StorageNotConfigured),
        }
    }
}
