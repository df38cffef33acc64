use crate::analyzer::SentimentAnalyzer;
use crate::config::Environment;
use crate::errors::{IntakeError, Result};
use crate::metrics_defs::{AI_FALLBACK, FEEDBACK_SUBMISSIONS, FORWARD_DURATION};
use crate::payload::ForwardingPayload;
use crate::sentiment::{self, SentimentAssessment};
use crate::storage::{FeedbackStore, interpret_response};
use crate::submission::FeedbackSubmission;
use serde::Serialize;
use shared::{counter, histogram};
use std::error::Error as _;
use std::sync::Arc;
use std::time::Instant;

/// Runs one submission through enrichment and forwarding.
///
/// The analyzer is best-effort: whatever goes wrong there is logged and
/// replaced by [`SentimentAssessment::fallback`]. The store is not: its
/// failures are returned to the caller. Calls are strictly sequential and
/// never retried.
pub struct FeedbackHandler {
    analyzer: Arc<dyn SentimentAnalyzer>,
    store: Arc<dyn FeedbackStore>,
}

impl FeedbackHandler {
    pub fn new(analyzer: Arc<dyn SentimentAnalyzer>, store: Arc<dyn FeedbackStore>) -> Self {
        Self { analyzer, store }
    }

    pub fn is_ready(&self) -> bool {
        self.store.is_configured()
    }

    /// Decodes `body` and submits it. Nothing is sent anywhere if decoding
    /// fails.
    pub async fn submit_body(&self, body: &[u8]) -> Result<SentimentAssessment> {
        let submission = match FeedbackSubmission::from_slice(body) {
            Ok(submission) => submission,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected feedback submission");
                counter!(FEEDBACK_SUBMISSIONS, "outcome" => e.kind()).increment(1);
                return Err(e);
            }
        };

        self.submit(submission).await
    }

    /// Enriches and forwards a decoded submission. Returns the assessment that
    /// was forwarded, AI-derived or fallback.
    pub async fn submit(&self, submission: FeedbackSubmission) -> Result<SentimentAssessment> {
        tracing::info!(kind = submission.kind.as_str(), "Feedback received");

        let assessment = self.assess(&submission).await;
        let payload = ForwardingPayload::new(&submission, &assessment);

        match self.forward(&payload).await {
            Ok(()) => {
                tracing::info!(sentiment = %payload.sentiment, "Feedback stored");
                counter!(FEEDBACK_SUBMISSIONS, "outcome" => "stored").increment(1);
                Ok(assessment)
            }
            Err(e) => {
                tracing::error!(
                    store = self.store.name(),
                    error = %e,
                    "Failed to forward feedback"
                );
                counter!(FEEDBACK_SUBMISSIONS, "outcome" => e.kind()).increment(1);
                Err(e)
            }
        }
    }

    async fn assess(&self, submission: &FeedbackSubmission) -> SentimentAssessment {
        let prompt = sentiment::build_prompt(submission);

        let result = match self.analyzer.generate(&prompt).await {
            Ok(reply) => {
                tracing::debug!(reply = %reply, "AI reply received");
                sentiment::parse_model_response(&reply)
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(assessment) => assessment,
            Err(e) => {
                tracing::warn!(
                    analyzer = self.analyzer.name(),
                    reason = e.reason(),
                    error = %e,
                    "AI analysis failed, using fallback assessment"
                );
                counter!(AI_FALLBACK, "reason" => e.reason()).increment(1);
                SentimentAssessment::fallback()
            }
        }
    }

    async fn forward(&self, payload: &ForwardingPayload) -> Result<()> {
        tracing::debug!(payload = ?payload, "Forwarding feedback");

        let start = Instant::now();
        let response = self.store.send(payload).await;
        histogram!(FORWARD_DURATION).record(start.elapsed().as_secs_f64());

        let response = response?;
        tracing::debug!(status = %response.status, body = %response.body, "Storage replied");
        interpret_response(response).map(|_| ())
    }
}

/// JSON body returned to the form.
#[derive(Debug, PartialEq, Serialize)]
pub struct HandlerResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai: Option<SentimentAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error chain, only in development.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl HandlerResult {
    pub fn from_outcome(outcome: Result<SentimentAssessment>, environment: Environment) -> Self {
        match outcome {
            Ok(assessment) => HandlerResult {
                success: true,
                ai: Some(assessment),
                error: None,
                stack: None,
            },
            Err(e) => HandlerResult {
                success: false,
                ai: None,
                error: Some(e.to_string()),
                stack: environment.is_development().then(|| error_stack(&e)),
            },
        }
    }
}

fn error_stack(error: &IntakeError) -> String {
    let mut stack = format!("{error:?}");
    let mut source = error.source();
    while let Some(cause) = source {
        stack.push_str(&format!("\ncaused by: {cause}"));
        source = cause.source();
    }
    stack
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::FALLBACK_ANALYSIS;
    use crate::testutils::{MockAnalyzer, MockStore};
    use serde_json::json;

    const AI_REPLY: &str = r#"{"sentimentPercent": 20, "sentimentLabel": "Insatisfecho", "analysis": "La sala estaba sucia.", "recommendations": ["Reforzar limpieza"]}"#;
    const SUBMISSION: &[u8] =
        br#"{"type":"Queja","category":"Limpieza","description":"Sala sucia"}"#;

    fn handler(analyzer: MockAnalyzer, store: &Arc<MockStore>) -> FeedbackHandler {
        FeedbackHandler::new(Arc::new(analyzer), store.clone())
    }

    #[tokio::test]
    async fn test_ai_result_is_forwarded_and_returned() {
        let store = Arc::new(MockStore::replying(200, r#"{"success":true}"#));
        let handler = handler(MockAnalyzer::Reply(AI_REPLY.into()), &store);

        let assessment = handler.submit_body(SUBMISSION).await.unwrap();
        assert_eq!(assessment.sentiment_percent, 20);
        assert_eq!(assessment.sentiment_label, "Insatisfecho");

        let payloads = store.payloads();
        assert_eq!(payloads.len(), 1);
        assert_eq!(
            payloads[0],
            json!({
                "type": "Queja",
                "category": "Limpieza",
                "description": "Sala sucia",
                "contact": {"name": "Anónimo", "phone": "N/A"},
                "sentiment": "20% - Insatisfecho",
                "recommendations": "Reforzar limpieza"
            })
        );
    }

    #[tokio::test]
    async fn test_ai_failures_fall_back_and_still_forward() {
        let failures = [
            MockAnalyzer::NetworkError,
            MockAnalyzer::Timeout,
            MockAnalyzer::MissingApiKey,
            MockAnalyzer::Reply("no es JSON".into()),
            MockAnalyzer::Reply(r#"{"sentimentPercent": 20}"#.into()),
            MockAnalyzer::Reply(format!("Claro, aquí está: {AI_REPLY}")),
        ];

        for analyzer in failures {
            let store = Arc::new(MockStore::replying(200, r#"{"success":true}"#));
            let handler = handler(analyzer, &store);

            let assessment = handler.submit_body(SUBMISSION).await.unwrap();
            assert_eq!(assessment, SentimentAssessment::fallback());
            assert_eq!(assessment.analysis, FALLBACK_ANALYSIS);

            let payloads = store.payloads();
            assert_eq!(payloads.len(), 1);
            assert_eq!(payloads[0]["sentiment"], "50% - Neutral");
            assert_eq!(payloads[0]["recommendations"], "");
        }
    }

    #[tokio::test]
    async fn test_fenced_ai_reply_is_accepted() {
        let store = Arc::new(MockStore::replying(200, "ok"));
        let handler = handler(
            MockAnalyzer::Reply(format!("```json\n{AI_REPLY}\n```")),
            &store,
        );

        let assessment = handler.submit_body(SUBMISSION).await.unwrap();
        assert_eq!(assessment.sentiment_percent, 20);
    }

    #[tokio::test]
    async fn test_invalid_input_short_circuits() {
        let store = Arc::new(MockStore::replying(200, r#"{"success":true}"#));
        let mut analyzer = MockAnalyzer::Reply(AI_REPLY.into());
        let calls = analyzer.call_counter();
        let handler = handler(analyzer, &store);

        let result = handler.submit_body(b"{not json").await;
        assert!(matches!(result, Err(IntakeError::InvalidInput(_))));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert!(store.payloads().is_empty());
    }

    #[tokio::test]
    async fn test_forwarding_failures() {
        let stores = [
            MockStore::replying(500, "Internal error"),
            MockStore::replying(200, r#"{"success": false, "error": "Sheet locked"}"#),
            MockStore::unreachable(),
            MockStore::unconfigured(),
        ];

        for store in stores {
            let store = Arc::new(store);
            let handler = handler(MockAnalyzer::Reply(AI_REPLY.into()), &store);

            let err = handler.submit_body(SUBMISSION).await.unwrap_err();
            assert!(err.is_forwarding_error());
            assert!(!err.to_string().is_empty());
            assert_eq!(store.attempts(), 1);
        }
    }

    #[tokio::test]
    async fn test_multiple_categories_and_contact() {
        let store = Arc::new(MockStore::replying(200, r#"{"success":true}"#));
        let handler = handler(MockAnalyzer::NetworkError, &store);

        let body = br#"{
            "type": "Sugerencia",
            "category": ["Confort", "Atencion"],
            "description": "Mas bancas",
            "contact": {"name": "Ana", "phone": "", "email": "ana@example.com"}
        }"#;
        handler.submit_body(body).await.unwrap();

        let payload = &store.payloads()[0];
        assert_eq!(payload["category"], "Confort, Atencion");
        assert_eq!(payload["contact"], json!({"name": "Ana", "phone": "N/A"}));
        assert!(payload["contact"].get("email").is_none());
    }

    #[test]
    fn test_result_shapes() {
        let ok = HandlerResult::from_outcome(
            Ok(SentimentAssessment::fallback()),
            Environment::Development,
        );
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["ai"]["sentimentPercent"], 50);
        assert!(json.get("error").is_none());

        let err = HandlerResult::from_outcome(
            Err(IntakeError::StorageRejected("Sheet locked".into())),
            Environment::Production,
        );
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, json!({"success": false, "error": "Sheet locked"}));

        let err = HandlerResult::from_outcome(
            Err(IntakeError::StorageTimeout("script.google.com".into())),
            Environment::Development,
        );
        assert!(err.ai.is_none());
        assert!(err.stack.unwrap().contains("StorageTimeout"));
    }
}
