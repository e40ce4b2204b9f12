//! Extraction for email content.
//!
//! Two-tier parse: a cheap structural header parse when the content looks
//! like an email, with an unconditional fallback to treating the whole
//! input as the body. Structural failure never aborts processing.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use super::prompts::{build_email_extraction_prompt, clip, email_intent_template, EMAIL_BODY_CHARS};
use super::urgency::UrgencyScorer;
use super::{ExtractionResult, PipelineError};
use crate::db::MemoryStore;
use crate::llm::{ChatMessage, LlmClient};

/// Structured view of an email after header parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEmail {
    pub sender: String,
    pub subject: String,
    pub body: String,
}

/// Parse headers out of raw email text. Only attempted when a "From:" or
/// "Subject:" marker is present; returns `None` otherwise so the caller
/// falls back to the raw content.
pub fn parse_email(content: &str) -> Option<ParsedEmail> {
    if !content.contains("From:") && !content.contains("Subject:") {
        return None;
    }

    let mut sender = None;
    let mut subject = None;
    let mut body_start = content.len();

    for (offset, line) in line_offsets(content) {
        if line.trim().is_empty() {
            // Blank line ends the header section
            body_start = offset + line.len();
            break;
        }
        if !is_header_line(line) {
            // First non-header line starts the body
            body_start = offset;
            break;
        }
        if let Some(value) = line.strip_prefix("From:") {
            sender = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Subject:") {
            subject = Some(value.trim().to_string());
        }
    }

    let body = content[body_start..].trim_start_matches(['\r', '\n']).to_string();

    Some(ParsedEmail {
        sender: sender.filter(|s| !s.is_empty()).unwrap_or_else(|| "Unknown".to_string()),
        subject: subject.unwrap_or_default(),
        body,
    })
}

/// A header line is `Name: value` where the name is a plain token.
fn is_header_line(line: &str) -> bool {
    match line.split_once(':') {
        Some((name, _)) => {
            !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        None => false,
    }
}

fn line_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |line| {
        let start = offset;
        offset += line.len();
        (start, line)
    })
}

pub struct EmailExtractor {
    llm: Arc<dyn LlmClient>,
    store: Arc<MemoryStore>,
    urgency: UrgencyScorer,
}

impl EmailExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, store: Arc<MemoryStore>) -> Self {
        let urgency = UrgencyScorer::new(Arc::clone(&llm));
        Self { llm, store, urgency }
    }

    pub async fn process(
        &self,
        content: &str,
        intent: &str,
        document_id: &Uuid,
    ) -> Result<ExtractionResult, PipelineError> {
        let parsed = parse_email(content);
        let is_parsed = parsed.is_some();
        let (sender, subject, body) = match parsed {
            Some(email) => (email.sender, email.subject, email.body),
            None => ("Unknown".to_string(), String::new(), content.to_string()),
        };

        // Sender and subject are persisted before any model call so the
        // record survives a collaborator failure.
        self.store
            .upsert_field(document_id, "sender", &Value::String(sender.clone()))?;
        self.store
            .upsert_field(document_id, "subject", &Value::String(subject.clone()))?;

        let extracted_fields = self.extract_fields(&body, intent).await?;
        for (field, value) in &extracted_fields {
            self.store.upsert_field(document_id, field, value)?;
        }

        let urgency = self.urgency.score(&body, intent).await?;
        self.store
            .upsert_field(document_id, "urgency", &Value::String(urgency.to_string()))?;

        tracing::info!(
            document_id = %document_id,
            intent = %intent,
            urgency = %urgency,
            parsed = is_parsed,
            fields = extracted_fields.len(),
            "Email processed"
        );

        // CRM-shaped payload; model fields may override the basics
        let mut crm_data = serde_json::Map::new();
        crm_data.insert("sender".into(), Value::String(sender));
        crm_data.insert("subject".into(), Value::String(subject));
        crm_data.insert("intent".into(), Value::String(intent.to_string()));
        crm_data.insert("urgency".into(), Value::String(urgency.to_string()));
        for (field, value) in extracted_fields {
            crm_data.insert(field, value);
        }

        let mut result = ExtractionResult::success(crm_data);
        result.is_parsed_email = Some(is_parsed);
        Ok(result)
    }

    /// Intent-driven field extraction. A response that is not a JSON
    /// object yields an empty field set, not an error.
    async fn extract_fields(
        &self,
        body: &str,
        intent: &str,
    ) -> Result<serde_json::Map<String, Value>, PipelineError> {
        let window = clip(body, EMAIL_BODY_CHARS);
        let (system_prompt, field_list) = email_intent_template(intent);
        let messages = [
            ChatMessage::system(system_prompt),
            ChatMessage::user(build_email_extraction_prompt(&field_list, window)),
        ];
        let response = self.llm.chat(&messages, 0.7).await?;

        match serde_json::from_str::<Value>(&response) {
            Ok(Value::Object(fields)) => Ok(fields),
            _ => {
                tracing::warn!(intent = %intent, "Email field extraction returned non-JSON, continuing without fields");
                Ok(serde_json::Map::new())
            }
        }
    }
}
