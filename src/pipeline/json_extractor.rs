//! Extraction for structured JSON documents.
//!
//! Intents with a registered schema get deterministic structural
//! validation plus field persistence; everything else goes through a
//! single freeform model call. Partial data is persisted even when
//! validation fails.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use super::prompts::{build_json_freeform_prompt, clip, json_freeform_system_prompt, JSON_FREEFORM_CHARS};
use super::schema::schema_for_intent;
use super::{ExtractionResult, PipelineError};
use crate::db::MemoryStore;
use crate::llm::{ChatMessage, LlmClient};

pub struct JsonExtractor {
    llm: Arc<dyn LlmClient>,
    store: Arc<MemoryStore>,
}

impl JsonExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, store: Arc<MemoryStore>) -> Self {
        Self { llm, store }
    }

    pub async fn process(
        &self,
        content: &str,
        intent: &str,
        document_id: &Uuid,
    ) -> Result<ExtractionResult, PipelineError> {
        let parsed: Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(_) => return Ok(ExtractionResult::error("Invalid JSON content")),
        };

        match schema_for_intent(intent) {
            Some(schema) => self.extract_with_schema(schema, &parsed, document_id),
            None => self.extract_freeform(&parsed, intent, document_id).await,
        }
    }

    fn extract_with_schema(
        &self,
        schema: &super::schema::IntentSchema,
        content: &Value,
        document_id: &Uuid,
    ) -> Result<ExtractionResult, PipelineError> {
        let validation_errors = schema.validate(content);

        let mut extracted_data = serde_json::Map::new();
        let mut missing_fields = Vec::new();

        let obj = content.as_object();

        for field in schema.required {
            match obj.and_then(|o| o.get(*field)) {
                Some(value) => {
                    extracted_data.insert(field.to_string(), value.clone());
                    self.store.upsert_field(document_id, field, value)?;
                }
                None => missing_fields.push(field.to_string()),
            }
        }

        // Remaining declared properties that happen to be present
        for (field, _) in schema.properties {
            if extracted_data.contains_key(*field) {
                continue;
            }
            if let Some(value) = obj.and_then(|o| o.get(*field)) {
                extracted_data.insert(field.to_string(), value.clone());
                self.store.upsert_field(document_id, field, value)?;
            }
        }

        tracing::debug!(
            document_id = %document_id,
            intent = schema.intent,
            fields = extracted_data.len(),
            missing = missing_fields.len(),
            "Schema extraction complete"
        );

        if validation_errors.is_empty() {
            Ok(ExtractionResult::success(extracted_data))
        } else {
            Ok(ExtractionResult::validation_failed(
                extracted_data,
                missing_fields,
                validation_errors,
            ))
        }
    }

    /// Freeform model extraction for intents without a schema. One call,
    /// no retry: an unparseable response becomes an error-status result
    /// that carries the raw text.
    async fn extract_freeform(
        &self,
        content: &Value,
        intent: &str,
        document_id: &Uuid,
    ) -> Result<ExtractionResult, PipelineError> {
        let pretty = serde_json::to_string_pretty(content)
            .map_err(|e| PipelineError::Decode(e.to_string()))?;
        let window = clip(&pretty, JSON_FREEFORM_CHARS);

        let messages = [
            ChatMessage::system(json_freeform_system_prompt(intent)),
            ChatMessage::user(build_json_freeform_prompt(intent, window)),
        ];
        let response = self.llm.chat(&messages, 0.7).await?;

        match serde_json::from_str::<Value>(&response) {
            Ok(Value::Object(extracted)) => {
                for (field, value) in &extracted {
                    self.store.upsert_field(document_id, field, value)?;
                }
                Ok(ExtractionResult::success(extracted))
            }
            _ => Ok(ExtractionResult::error("Failed to parse LLM response")
                .with_raw_response(response)),
        }
    }
}
