use crate::sentiment::SentimentAssessment;
use crate::submission::FeedbackSubmission;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ForwardedContact {
    pub name: String,
    pub phone: String,
}

/// Flattened record sent to the storage endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ForwardingPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub description: String,
    pub contact: ForwardedContact,
    pub sentiment: String,
    pub recommendations: String,
}

impl ForwardingPayload {
    pub fn new(submission: &FeedbackSubmission, assessment: &SentimentAssessment) -> Self {
        Self {
            kind: submission.kind.as_str().to_string(),
            category: submission.category.joined(),
            description: submission.description.clone(),
            contact: ForwardedContact {
                name: submission.contact_name().to_string(),
                phone: submission.contact_phone().to_string(),
            },
            sentiment: assessment.sentiment_summary(),
            recommendations: assessment.joined_recommendations(),
        }
    }
}
