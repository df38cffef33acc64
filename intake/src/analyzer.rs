use crate::config::AiConfig;
use async_trait::async_trait;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// Failures of the AI enrichment step. These never leave the handler.
#[derive(thiserror::Error, Debug)]
pub enum AnalyzerError {
    #[error("AI service credential is not configured")]
    MissingApiKey,

    #[error("AI request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("AI request timed out after {0:?}")]
    Timeout(Duration),

    #[error("AI service returned {0}: {1}")]
    UnexpectedStatus(StatusCode, String),

    #[error("AI service returned no text")]
    EmptyResponse,

    #[error("AI reply is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("AI reply is not a usable assessment: {0}")]
    InvalidAssessment(String),
}

impl AnalyzerError {
    /// Short tag used for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AnalyzerError::MissingApiKey => "missing_api_key",
            AnalyzerError::RequestFailed(_) => "request_failed",
            AnalyzerError::Timeout(_) => "timeout",
            AnalyzerError::UnexpectedStatus(StatusCode::TOO_MANY_REQUESTS, _) => "quota",
            AnalyzerError::UnexpectedStatus(..) => "status",
            AnalyzerError::EmptyResponse => "empty_response",
            AnalyzerError::InvalidJson(_) => "invalid_json",
            AnalyzerError::InvalidAssessment(_) => "invalid_assessment",
        }
    }
}

/// Generative text capability used for AI enrichment.
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Sends one prompt and returns the raw text of the reply.
    async fn generate(&self, prompt: &str) -> Result<String, AnalyzerError>;
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: Url,
    timeout_duration: Duration,
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> Self {
        let mut endpoint = config.base_url.clone();
        endpoint.set_path(&format!("/v1beta/models/{}:generateContent", config.model));

        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            endpoint,
            timeout_duration: Duration::from_secs(config.timeout_secs),
        }
    }

    async fn request(&self, api_key: &str, prompt: &str) -> Result<String, AnalyzerError> {
        let request = GenerateContentRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AnalyzerError::UnexpectedStatus(status, body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        parsed.into_text().ok_or(AnalyzerError::EmptyResponse)
    }
}

#[async_trait]
impl SentimentAnalyzer for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, AnalyzerError> {
        let api_key = self.api_key.as_deref().ok_or(AnalyzerError::MissingApiKey)?;

        timeout(self.timeout_duration, self.request(api_key, prompt))
            .await
            .map_err(|_| AnalyzerError::Timeout(self.timeout_duration))?
    }
}
