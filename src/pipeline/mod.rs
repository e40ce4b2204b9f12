pub mod classifier;
pub mod email_extractor;
pub mod json_extractor;
pub mod pdf_extractor;
pub mod prompts;
pub mod router;
pub mod schema;
pub mod urgency;

pub use classifier::*;
pub use email_extractor::*;
pub use json_extractor::*;
pub use pdf_extractor::*;
pub use router::*;
pub use schema::*;
pub use urgency::*;

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::llm::LlmError;
use crate::models::DocumentFormat;

/// Pipeline error taxonomy. Classification-stage errors abort before any
/// record is created; extraction-stage failures are captured in an
/// `ExtractionResult` with an error status wherever a partial answer is
/// possible.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Malformed base64 or structured input.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Unsupported or missing content.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Structural mismatch against a registered schema. Non-fatal at the
    /// extractor level (partial data is still returned); only raised as
    /// an error by callers that require a fully valid document.
    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    /// Generative or PDF collaborator failure.
    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Document not found: {0}")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<LlmError> for PipelineError {
    fn from(e: LlmError) -> Self {
        Self::ExternalService(e.to_string())
    }
}

/// Outcome status of one extraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Success,
    ValidationFailed,
    Error,
}

/// Structured result of a format-specific extractor. Partial data is
/// carried even when the status is not `Success`.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub status: ExtractionStatus,
    pub extracted_data: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,
    /// PDF document information, when the PDF collaborator ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Raw model response, kept when it could not be parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    /// Whether structural email parsing succeeded (email extractor only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_parsed_email: Option<bool>,
}

impl ExtractionResult {
    pub fn success(extracted_data: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            status: ExtractionStatus::Success,
            extracted_data,
            missing_fields: Vec::new(),
            validation_errors: Vec::new(),
            metadata: None,
            message: None,
            raw_response: None,
            is_parsed_email: None,
        }
    }

    pub fn validation_failed(
        extracted_data: serde_json::Map<String, serde_json::Value>,
        missing_fields: Vec<String>,
        validation_errors: Vec<String>,
    ) -> Self {
        Self {
            status: ExtractionStatus::ValidationFailed,
            extracted_data,
            missing_fields,
            validation_errors,
            metadata: None,
            message: None,
            raw_response: None,
            is_parsed_email: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ExtractionStatus::Error,
            extracted_data: serde_json::Map::new(),
            missing_fields: Vec::new(),
            validation_errors: Vec::new(),
            metadata: None,
            message: Some(message.into()),
            raw_response: None,
            is_parsed_email: None,
        }
    }

    pub fn with_raw_response(mut self, raw: impl Into<String>) -> Self {
        self.raw_response = Some(raw.into());
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Aggregated result returned to the caller after routing a document
/// through its extractor.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub document_id: Uuid,
    pub format: DocumentFormat,
    pub intent: String,
    pub result: ExtractionResult,
}
