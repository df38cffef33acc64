//! Inbound feedback submission as posted by the form.

use crate::errors::{IntakeError, Result};
use serde::{Deserialize, Serialize};

pub const ANONYMOUS_NAME: &str = "Anónimo";
pub const NO_PHONE: &str = "N/A";

/// Kind of feedback. Free-form on the wire, unknown values are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeedbackKind {
    Complaint,
    Suggestion,
    Commendation,
    Other(String),
}

/// Wire values of the kinds the form offers.
pub const KNOWN_KINDS: [&str; 3] = ["Queja", "Sugerencia", "Felicitación"];

impl FeedbackKind {
    pub fn as_str(&self) -> &str {
        match self {
            FeedbackKind::Complaint => "Queja",
            FeedbackKind::Suggestion => "Sugerencia",
            FeedbackKind::Commendation => "Felicitación",
            FeedbackKind::Other(value) => value,
        }
    }
}

impl Default for FeedbackKind {
    fn default() -> Self {
        FeedbackKind::Other(String::new())
    }
}

impl From<String> for FeedbackKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Queja" => FeedbackKind::Complaint,
            "Sugerencia" => FeedbackKind::Suggestion,
            "Felicitación" => FeedbackKind::Commendation,
            _ => FeedbackKind::Other(value),
        }
    }
}

impl From<FeedbackKind> for String {
    fn from(kind: FeedbackKind) -> Self {
        match kind {
            FeedbackKind::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

/// Topical area(s) the feedback refers to.
///
/// The form sends a single string when one area was picked and an array when
/// several were.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Category {
    Single(String),
    Multiple(Vec<String>),
}

impl Category {
    pub const SEPARATOR: &'static str = ", ";

    /// Flattened form used in prompts and forwarded records.
    pub fn joined(&self) -> String {
        match self {
            Category::Single(value) => value.clone(),
            Category::Multiple(values) => values.join(Self::SEPARATOR),
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Single(String::new())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Collected by the form, never forwarded.
    #[serde(default)]
    pub email: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl Contact {
    pub fn name_or_default(&self) -> &str {
        non_blank(self.name.as_deref()).unwrap_or(ANONYMOUS_NAME)
    }

    pub fn phone_or_default(&self) -> &str {
        non_blank(self.phone.as_deref()).unwrap_or(NO_PHONE)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct FeedbackSubmission {
    #[serde(rename = "type", default)]
    pub kind: FeedbackKind,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub contact: Option<Contact>,
}

impl FeedbackSubmission {
    /// Decodes a request body. Only the structure is checked: the body must be
    /// a JSON object whose known fields have the expected shapes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| IntakeError::InvalidInput(e.to_string()))?;

        if !value.is_object() {
            return Err(IntakeError::InvalidInput(
                "expected a JSON object".to_string(),
            ));
        }

        serde_json::from_value(value).map_err(|e| IntakeError::InvalidInput(e.to_string()))
    }

    pub fn contact_name(&self) -> &str {
        self.contact
            .as_ref()
            .map_or(ANONYMOUS_NAME, Contact::name_or_default)
    }

    pub fn contact_phone(&self) -> &str {
        self.contact
            .as_ref()
            .map_or(NO_PHONE, Contact::phone_or_default)
    }
}
