//! Dispatch of stored documents to their format-specific extractor.

use std::sync::Arc;

use uuid::Uuid;

use super::email_extractor::EmailExtractor;
use super::json_extractor::JsonExtractor;
use super::pdf_extractor::PdfFieldExtractor;
use super::{PipelineError, ProcessOutcome};
use crate::db::MemoryStore;
use crate::llm::LlmClient;
use crate::models::DocumentFormat;
use crate::pdf::PdfExtractor;

pub struct DocumentRouter {
    store: Arc<MemoryStore>,
    json: JsonExtractor,
    email: EmailExtractor,
    pdf: PdfFieldExtractor,
}

impl DocumentRouter {
    pub fn new(llm: Arc<dyn LlmClient>, pdf: Arc<dyn PdfExtractor>, store: Arc<MemoryStore>) -> Self {
        Self {
            json: JsonExtractor::new(Arc::clone(&llm), Arc::clone(&store)),
            email: EmailExtractor::new(Arc::clone(&llm), Arc::clone(&store)),
            pdf: PdfFieldExtractor::new(llm, pdf, Arc::clone(&store)),
            store,
        }
    }

    /// Look up a classified document and run the extractor for its format.
    /// Unrecognized formats degrade to the email extractor rather than
    /// rejecting the document.
    pub async fn process(&self, document_id: Uuid) -> Result<ProcessOutcome, PipelineError> {
        let document = self
            .store
            .get_document(&document_id)?
            .ok_or(PipelineError::NotFound(document_id))?;

        tracing::info!(
            document_id = %document_id,
            format = %document.format,
            intent = %document.intent,
            "Routing document"
        );

        let result = match document.format {
            DocumentFormat::Json => {
                self.json
                    .process(&document.content, &document.intent, &document_id)
                    .await?
            }
            DocumentFormat::Pdf => {
                self.pdf
                    .process(&document.content, &document.intent, &document_id)
                    .await?
            }
            DocumentFormat::Email => {
                self.email
                    .process(&document.content, &document.intent, &document_id)
                    .await?
            }
            DocumentFormat::Unknown => {
                tracing::warn!(
                    document_id = %document_id,
                    "Unrecognized format, falling back to email processing"
                );
                self.email
                    .process(&document.content, &document.intent, &document_id)
                    .await?
            }
        };

        Ok(ProcessOutcome {
            document_id,
            format: document.format,
            intent: document.intent,
            result,
        })
    }
}
