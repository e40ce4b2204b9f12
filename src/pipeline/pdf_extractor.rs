//! Extraction for PDF documents.
//!
//! Content arrives as base64 text (or the storage sentinel when the
//! original binary exceeded the storage cap). After text extraction the
//! model response goes through a bounded recovery ladder; every stage
//! runs at most once and the final stage always yields a usable object,
//! so a working PDF never produces an empty extraction.

use std::sync::Arc;

use base64::Engine;
use serde_json::Value;
use uuid::Uuid;

use super::prompts::{
    build_pdf_extraction_prompt, build_pdf_strict_prompt, clip, pdf_intent_field_list,
    PDF_RETRY_CHARS, PDF_STRICT_SYSTEM_PROMPT, PDF_SYSTEM_PROMPT, PDF_TEXT_CHARS,
};
use super::{ExtractionResult, PipelineError};
use crate::db::{MemoryStore, BINARY_CONTENT_SENTINEL};
use crate::llm::{ChatMessage, LlmClient};
use crate::pdf::PdfExtractor;

pub struct PdfFieldExtractor {
    llm: Arc<dyn LlmClient>,
    pdf: Arc<dyn PdfExtractor>,
    store: Arc<MemoryStore>,
}

impl PdfFieldExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, pdf: Arc<dyn PdfExtractor>, store: Arc<MemoryStore>) -> Self {
        Self { llm, pdf, store }
    }

    pub async fn process(
        &self,
        content: &str,
        intent: &str,
        document_id: &Uuid,
    ) -> Result<ExtractionResult, PipelineError> {
        // Storage replaced oversized binaries with a sentinel; nothing to decode.
        if content == BINARY_CONTENT_SENTINEL {
            return Ok(ExtractionResult::error(
                "PDF binary content was not stored in the database. Size limit exceeded.",
            ));
        }

        let pdf_bytes = match base64::engine::general_purpose::STANDARD.decode(content.trim().as_bytes()) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(document_id = %document_id, error = %e, "Base64 decode failed");
                return Ok(ExtractionResult::error(format!(
                    "Failed to decode PDF content: {e}"
                )));
            }
        };

        let text = match self.pdf.extract_text(&pdf_bytes).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(document_id = %document_id, error = %e, "PDF text extraction failed");
                return Ok(ExtractionResult::error(format!(
                    "Failed to extract content from PDF: {e}"
                )));
            }
        };
        let metadata = match self.pdf.extract_metadata(&pdf_bytes).await {
            Ok(metadata) => metadata,
            Err(e) => {
                return Ok(ExtractionResult::error(format!(
                    "Failed to extract content from PDF: {e}"
                )))
            }
        };

        tracing::debug!(
            document_id = %document_id,
            text_chars = text.chars().count(),
            "PDF content extracted"
        );

        let extracted_data = match self.extract_fields(&text, intent).await {
            Ok(fields) => fields,
            Err(e) => {
                return Ok(ExtractionResult::error(format!(
                    "Failed to process document with LLM: {e}"
                )))
            }
        };

        for (field, value) in &extracted_data {
            self.store.upsert_field(document_id, field, value)?;
        }

        tracing::info!(
            document_id = %document_id,
            intent = %intent,
            fields = extracted_data.len(),
            "PDF processed"
        );

        Ok(ExtractionResult::success(extracted_data).with_metadata(metadata))
    }

    /// Recovery ladder for the model response. Stages, each at most once:
    /// direct parse, strict re-prompt, brace-substring parse of the
    /// re-prompt response, raw-text fallback object.
    async fn extract_fields(
        &self,
        text: &str,
        intent: &str,
    ) -> Result<serde_json::Map<String, Value>, PipelineError> {
        let field_list = pdf_intent_field_list(intent);
        let messages = [
            ChatMessage::system(PDF_SYSTEM_PROMPT),
            ChatMessage::user(build_pdf_extraction_prompt(
                intent,
                field_list,
                clip(text, PDF_TEXT_CHARS),
            )),
        ];
        let first = self.llm.chat(&messages, 0.7).await?;

        if let Some(fields) = parse_json_object(&first) {
            return Ok(fields);
        }

        tracing::warn!(intent = %intent, "PDF extraction response not parseable, issuing strict re-prompt");
        let retry_messages = [
            ChatMessage::system(PDF_STRICT_SYSTEM_PROMPT),
            ChatMessage::user(build_pdf_strict_prompt(intent, clip(text, PDF_RETRY_CHARS))),
        ];
        let second = self.llm.chat(&retry_messages, 0.7).await?;

        if let Some(fields) = parse_json_object(&second) {
            return Ok(fields);
        }
        if let Some(fields) = brace_substring(&second).and_then(parse_json_object) {
            return Ok(fields);
        }

        tracing::warn!(intent = %intent, "Strict re-prompt also unparseable, keeping raw extraction");
        let mut fallback = serde_json::Map::new();
        fallback.insert("raw_extraction".into(), Value::String(second));
        fallback.insert("intent".into(), Value::String(intent.to_string()));
        Ok(fallback)
    }
}

fn parse_json_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Slice from the first `{` to the last `}`, if both exist in order.
fn brace_substring(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
