//! Sentiment assessment produced by AI enrichment.
//!
//! The model is asked for a bare JSON object. Its reply is treated as an
//! untrusted parsing boundary: code fences are stripped, the remainder must
//! decode strictly into [`SentimentAssessment`] and pass range checks. Anything
//! else is an [`AnalyzerError`] and the caller falls back to
//! [`SentimentAssessment::fallback`].

use crate::analyzer::AnalyzerError;
use crate::submission::FeedbackSubmission;
use serde::{Deserialize, Serialize};

pub const FALLBACK_PERCENT: u8 = 50;
pub const FALLBACK_LABEL: &str = "Neutral";
pub const FALLBACK_ANALYSIS: &str = "AI error or quota exceeded";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentAssessment {
    pub sentiment_percent: u8,
    pub sentiment_label: String,
    pub analysis: String,
    pub recommendations: Vec<String>,
}

impl SentimentAssessment {
    /// Neutral value used whenever enrichment fails.
    pub fn fallback() -> Self {
        Self {
            sentiment_percent: FALLBACK_PERCENT,
            sentiment_label: FALLBACK_LABEL.to_string(),
            analysis: FALLBACK_ANALYSIS.to_string(),
            recommendations: Vec::new(),
        }
    }

    /// `"<percent>% - <label>"`
    pub fn sentiment_summary(&self) -> String {
        format!("{}% - {}", self.sentiment_percent, self.sentiment_label)
    }

    pub fn joined_recommendations(&self) -> String {
        self.recommendations.join(". ")
    }
}

/// Shape of the model reply before validation. The percent is read as a float
/// because models occasionally answer `20.0`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelAssessment {
    sentiment_percent: f64,
    sentiment_label: String,
    analysis: String,
    recommendations: Vec<String>,
}

impl TryFrom<ModelAssessment> for SentimentAssessment {
    type Error = AnalyzerError;

    fn try_from(raw: ModelAssessment) -> Result<Self, Self::Error> {
        if !(0.0..=100.0).contains(&raw.sentiment_percent) {
            return Err(AnalyzerError::InvalidAssessment(format!(
                "sentimentPercent out of range: {}",
                raw.sentiment_percent
            )));
        }

        let sentiment_label = raw.sentiment_label.trim().to_string();
        if sentiment_label.is_empty() {
            return Err(AnalyzerError::InvalidAssessment(
                "empty sentimentLabel".to_string(),
            ));
        }

        Ok(SentimentAssessment {
            sentiment_percent: raw.sentiment_percent.round() as u8,
            sentiment_label,
            analysis: raw.analysis.trim().to_string(),
            recommendations: raw
                .recommendations
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
        })
    }
}

/// Removes markdown code fences the model may wrap its JSON in.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.trim_end();
    text.strip_suffix("```").unwrap_or(text).trim()
}

/// Parses a raw model reply into a validated assessment.
pub fn parse_model_response(text: &str) -> Result<SentimentAssessment, AnalyzerError> {
    let json = strip_code_fences(text);
    let raw: ModelAssessment = serde_json::from_str(json)?;
    raw.try_into()
}

/// Builds the analysis prompt. The output only depends on the submission.
pub fn build_prompt(submission: &FeedbackSubmission) -> String {
    format!(
        r#"Eres analista de experiencia del paciente en un hospital. Analiza el comentario y devuelve:

1. sentimentPercent: número entero de 0 a 100.
   - 0-30: muy negativo (queja grave, insatisfacción alta)
   - 31-50: negativo (problemas identificables)
   - 51-70: neutral o mixto
   - 71-85: positivo (satisfacción general)
   - 86-100: muy positivo (felicitación, experiencia excelente)
2. sentimentLabel: etiqueta breve del sentimiento (por ejemplo "Muy Insatisfecho", "Insatisfecho", "Neutral", "Satisfecho", "Muy Satisfecho").
3. analysis: resumen del comentario en 1 o 2 oraciones.
4. recommendations: entre 2 y 4 recomendaciones concretas y accionables para el personal del hospital, basadas en lo que menciona el comentario.

Comentario:
- Tipo: {kind}
- Categoría: {category}
- Descripción: {description}

Responde SOLO con un objeto JSON, sin texto adicional:
{{"sentimentPercent": <0-100>, "sentimentLabel": "<etiqueta>", "analysis": "<resumen>", "recommendations": ["<recomendación>", "..."]}}"#,
        kind = submission.kind.as_str(),
        category = submission.category.joined(),
        description = submission.description,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::{Category, FeedbackKind};

    const REPLY: &str = r#"{"sentimentPercent": 20, "sentimentLabel": "Insatisfecho", "analysis": "La sala estaba sucia.", "recommendations": ["Reforzar limpieza", "Revisar turnos"]}"#;

    #[test]
    fn test_parse_plain_reply() {
        let assessment = parse_model_response(REPLY).unwrap();
        assert_eq!(assessment.sentiment_percent, 20);
        assert_eq!(assessment.sentiment_label, "Insatisfecho");
        assert_eq!(assessment.recommendations.len(), 2);
        assert_eq!(
            assessment.joined_recommendations(),
            "Reforzar limpieza. Revisar turnos"
        );
    }

    #[test]
    fn test_parse_fenced_reply() {
        let fenced = format!("```json\n{REPLY}\n```\n");
        assert_eq!(
            parse_model_response(&fenced).unwrap(),
            parse_model_response(REPLY).unwrap()
        );

        let bare_fence = format!("```\n{REPLY}\n```");
        assert!(parse_model_response(&bare_fence).is_ok());
    }

    #[test]
    fn test_fractional_percent_is_rounded() {
        let reply = r#"{"sentimentPercent": 72.6, "sentimentLabel": "Satisfecho", "analysis": "", "recommendations": []}"#;
        assert_eq!(parse_model_response(reply).unwrap().sentiment_percent, 73);
    }

    #[test]
    fn test_rejected_replies() {
        let cases = [
            "Lo siento, no puedo ayudar con eso.",
            r#"{"sentimentPercent": 20, "sentimentLabel": "Insatisfecho"}"#,
            r#"{"sentimentPercent": 140, "sentimentLabel": "Feliz", "analysis": "", "recommendations": []}"#,
            r#"{"sentimentPercent": -3, "sentimentLabel": "Triste", "analysis": "", "recommendations": []}"#,
            r#"{"sentimentPercent": 40, "sentimentLabel": " ", "analysis": "", "recommendations": []}"#,
            r#"{"sentimentPercent": "40", "sentimentLabel": "Neutral", "analysis": "", "recommendations": []}"#,
            "",
        ];

        for reply in cases {
            assert!(parse_model_response(reply).is_err(), "accepted: {reply}");
        }
    }

    #[test]
    fn test_fallback_values() {
        let fallback = SentimentAssessment::fallback();
        assert_eq!(fallback.sentiment_percent, 50);
        assert_eq!(fallback.sentiment_label, "Neutral");
        assert!(fallback.recommendations.is_empty());
        assert_eq!(fallback.sentiment_summary(), "50% - Neutral");
        assert_eq!(fallback.joined_recommendations(), "");
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(SentimentAssessment::fallback()).unwrap();
        assert_eq!(json["sentimentPercent"], 50);
        assert_eq!(json["sentimentLabel"], "Neutral");
        assert_eq!(json["analysis"], FALLBACK_ANALYSIS);
        assert_eq!(json["recommendations"], serde_json::json!([]));
    }

    #[test]
    fn test_prompt_embeds_submission() {
        let submission = FeedbackSubmission {
            kind: FeedbackKind::Complaint,
            category: Category::Multiple(vec!["Confort".into(), "Médicos".into()]),
            description: "Sala sucia".into(),
            contact: None,
        };

        let prompt = build_prompt(&submission);
        assert!(prompt.contains("- Tipo: Queja"));
        assert!(prompt.contains("- Categoría: Confort, Médicos"));
        assert!(prompt.contains("- Descripción: Sala sucia"));
        assert!(prompt.contains("86-100"));
        assert_eq!(prompt, build_prompt(&submission.clone()));
    }
}
