use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Structural kind of a submitted document; selects which extractor applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Json,
    Email,
    Unknown,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Json => "json",
            Self::Email => "email",
            Self::Unknown => "unknown",
        }
    }

    /// Normalize a format label, accepting MIME-type aliases.
    /// Case-insensitive. Anything unrecognized maps to `Unknown`; the
    /// router treats `Unknown` as plain text and falls back to the
    /// email extractor rather than rejecting the document.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "pdf" | "application/pdf" => Self::Pdf,
            "json" | "application/json" => Self::Json,
            "email" | "text/plain" | "message/rfc822" => Self::Email,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw submitted content, before classification decides what it is.
#[derive(Debug, Clone)]
pub enum RawContent {
    /// Plain text: email bodies, or base64 when paired with a pdf hint.
    Text(String),
    /// Already-parsed structured data.
    Json(serde_json::Value),
    /// Binary upload (PDF bytes).
    Binary(Vec<u8>),
}

/// A unit of submitted content with tracked format and business intent.
/// Created once at classification time; append-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub format: DocumentFormat,
    /// Lowercase business intent (invoice, rfq, complaint, ...).
    pub intent: String,
    /// Serialized content as stored: raw text, compact JSON, base64 for
    /// binary, or the oversized-binary sentinel.
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A single extracted field value, keyed by (document_id, field_name).
/// Writing an existing key overwrites the value; no history is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedField {
    pub document_id: Uuid,
    pub field_name: String,
    pub field_value: String,
    pub updated_at: DateTime<Utc>,
}

/// Compact document listing row for processing history.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub format: DocumentFormat,
    pub intent: String,
    pub created_at: DateTime<Utc>,
    /// Extracted sender, when the email extractor has run.
    pub sender: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_label_aliases() {
        assert_eq!(DocumentFormat::from_label("application/json"), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_label("text/plain"), DocumentFormat::Email);
        assert_eq!(DocumentFormat::from_label("application/pdf"), DocumentFormat::Pdf);
    }

    #[test]
    fn format_label_case_insensitive() {
        assert_eq!(DocumentFormat::from_label("PDF"), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_label("Application/JSON"), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_label("  Email "), DocumentFormat::Email);
    }

    #[test]
    fn unrecognized_label_is_unknown() {
        assert_eq!(DocumentFormat::from_label("spreadsheet"), DocumentFormat::Unknown);
        assert_eq!(DocumentFormat::from_label(""), DocumentFormat::Unknown);
    }

    #[test]
    fn format_serializes_lowercase() {
        let json = serde_json::to_string(&DocumentFormat::Pdf).unwrap();
        assert_eq!(json, "\"pdf\"");
    }
}
