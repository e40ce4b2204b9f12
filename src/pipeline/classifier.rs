//! Format + intent classification for newly submitted content.
//!
//! Hybrid strategy: ask the generative collaborator for a structured
//! `{format, intent}` answer, and fall back to case-insensitive keyword
//! scanning of the raw response when it is not parseable. The keyword
//! fallbacks are pure functions so they can be tested without a model.

use std::sync::Arc;

use base64::Engine;
use serde::Deserialize;
use uuid::Uuid;

use super::prompts::{build_classification_prompt, clip, CLASSIFY_SNIPPET_CHARS, CLASSIFY_SYSTEM_PROMPT};
use super::PipelineError;
use crate::db::MemoryStore;
use crate::llm::{ChatMessage, LlmClient};
use crate::models::{DocumentFormat, RawContent};
use crate::pdf::PdfExtractor;

/// Result of classifying one submission.
#[derive(Debug, Clone)]
pub struct Classification {
    pub document_id: Uuid,
    pub format: DocumentFormat,
    pub intent: String,
}

pub struct Classifier {
    llm: Arc<dyn LlmClient>,
    pdf: Arc<dyn PdfExtractor>,
    store: Arc<MemoryStore>,
}

#[derive(Deserialize)]
struct RawClassification {
    format: Option<String>,
    intent: Option<String>,
}

impl Classifier {
    pub fn new(llm: Arc<dyn LlmClient>, pdf: Arc<dyn PdfExtractor>, store: Arc<MemoryStore>) -> Self {
        Self { llm, pdf, store }
    }

    /// Classify content, persist the resulting Document, and return the
    /// (id, format, intent) triple. Decode and validation failures abort
    /// before any record is created.
    pub async fn classify(
        &self,
        content: RawContent,
        format_hint: Option<&str>,
    ) -> Result<Classification, PipelineError> {
        let hint = format_hint.map(DocumentFormat::from_label);
        let (snippet, stored) = self.prepare_content(content, hint).await?;

        let messages = [
            ChatMessage::system(CLASSIFY_SYSTEM_PROMPT),
            ChatMessage::user(build_classification_prompt(&snippet)),
        ];
        let response = self.llm.chat(&messages, 0.7).await?;

        let (inferred_format, intent) = match serde_json::from_str::<RawClassification>(&response) {
            Ok(raw) => (
                DocumentFormat::from_label(raw.format.as_deref().unwrap_or("unknown")),
                raw.intent
                    .map(|i| i.trim().to_lowercase())
                    .filter(|i| !i.is_empty())
                    .unwrap_or_else(|| "unknown".to_string()),
            ),
            Err(_) => (
                format_from_keywords(&response),
                intent_from_keywords(&response).to_string(),
            ),
        };

        // Hint precedence: a recognized hint beats whatever the model said.
        let format = resolve_format(hint, inferred_format);

        let document_id = Uuid::new_v4();
        self.store.create_document(&document_id, format, &intent, &stored)?;

        tracing::info!(
            document_id = %document_id,
            format = %format,
            intent = %intent,
            "Document classified"
        );

        Ok(Classification {
            document_id,
            format,
            intent,
        })
    }

    /// Decode content per the hint and produce the bounded classification
    /// snippet plus the form in which the content is persisted.
    async fn prepare_content(
        &self,
        content: RawContent,
        hint: Option<DocumentFormat>,
    ) -> Result<(String, RawContent), PipelineError> {
        match (content, hint) {
            // Base64-encoded PDF upload
            (RawContent::Text(text), Some(DocumentFormat::Pdf)) => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(text.trim().as_bytes())
                    .map_err(|e| PipelineError::Decode(format!("Invalid base64 PDF content: {e}")))?;
                let snippet = self.pdf_snippet(&bytes).await?;
                Ok((snippet, RawContent::Binary(bytes)))
            }
            (RawContent::Binary(bytes), Some(DocumentFormat::Pdf)) => {
                let snippet = self.pdf_snippet(&bytes).await?;
                Ok((snippet, RawContent::Binary(bytes)))
            }
            (RawContent::Json(value), _) => {
                let pretty = serde_json::to_string_pretty(&value)
                    .map_err(|e| PipelineError::Decode(e.to_string()))?;
                Ok((clip(&pretty, CLASSIFY_SNIPPET_CHARS).to_string(), RawContent::Json(value)))
            }
            (RawContent::Text(text), Some(DocumentFormat::Json)) => {
                let value: serde_json::Value = serde_json::from_str(&text)
                    .map_err(|e| PipelineError::Decode(format!("Invalid JSON content: {e}")))?;
                let pretty = serde_json::to_string_pretty(&value)
                    .map_err(|e| PipelineError::Decode(e.to_string()))?;
                Ok((clip(&pretty, CLASSIFY_SNIPPET_CHARS).to_string(), RawContent::Json(value)))
            }
            // Email or arbitrary plain text
            (RawContent::Text(text), _) => {
                Ok((clip(&text, CLASSIFY_SNIPPET_CHARS).to_string(), RawContent::Text(text)))
            }
            (RawContent::Binary(_), _) => Err(PipelineError::Validation(
                "Binary content requires a pdf format hint".into(),
            )),
        }
    }

    async fn pdf_snippet(&self, bytes: &[u8]) -> Result<String, PipelineError> {
        let text = self
            .pdf
            .extract_text(bytes)
            .await
            .map_err(|e| PipelineError::Decode(format!("Failed to process PDF: {e}")))?;
        Ok(clip(&text, CLASSIFY_SNIPPET_CHARS).to_string())
    }
}

/// Keyword fallback for format when the model response is not valid JSON.
/// Checked in the original's order: json before email before pdf.
pub fn format_from_keywords(response: &str) -> DocumentFormat {
    let lower = response.to_lowercase();
    if lower.contains("json") {
        DocumentFormat::Json
    } else if lower.contains("email") {
        DocumentFormat::Email
    } else if lower.contains("pdf") {
        DocumentFormat::Pdf
    } else {
        DocumentFormat::Unknown
    }
}

/// Keyword fallback for intent against the fixed candidate list.
pub fn intent_from_keywords(response: &str) -> &'static str {
    let lower = response.to_lowercase();
    if lower.contains("invoice") {
        "invoice"
    } else if lower.contains("rfq") || lower.contains("request for quote") {
        "rfq"
    } else if lower.contains("complaint") {
        "complaint"
    } else if lower.contains("regulation") {
        "regulation"
    } else {
        "unknown"
    }
}

/// A recognized format hint always overrides the model-inferred format;
/// an absent or unrecognized hint defers to inference.
pub fn resolve_format(hint: Option<DocumentFormat>, inferred: DocumentFormat) -> DocumentFormat {
    match hint {
        Some(DocumentFormat::Unknown) | None => inferred,
        Some(hinted) => hinted,
    }
}
