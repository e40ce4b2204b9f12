//! PDF text/metadata collaborator.
//!
//! Binary decoding and page parsing happen behind the `PdfExtractor`
//! trait; corrupt input raises a `PdfError` which extractors surface as a
//! structured error result rather than a pipeline abort.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
}

/// PDF collaborator abstraction (allows mocking).
#[async_trait]
pub trait PdfExtractor: Send + Sync {
    /// Extract the text layer of a PDF.
    async fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String, PdfError>;

    /// Extract the document information dictionary (Title, Author, ...).
    async fn extract_metadata(&self, pdf_bytes: &[u8]) -> Result<BTreeMap<String, String>, PdfError>;
}

/// PDF extractor for digital PDFs with embedded text layers, backed by
/// the pdf-extract crate; metadata comes from the trailer Info dictionary.
pub struct PdfTextExtractor;

#[async_trait]
impl PdfExtractor for PdfTextExtractor {
    async fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String, PdfError> {
        pdf_extract::extract_text_from_mem(pdf_bytes).map_err(|e| PdfError::Parse(e.to_string()))
    }

    async fn extract_metadata(&self, pdf_bytes: &[u8]) -> Result<BTreeMap<String, String>, PdfError> {
        let doc = lopdf::Document::load_mem(pdf_bytes).map_err(|e| PdfError::Parse(e.to_string()))?;

        let mut metadata = BTreeMap::new();
        let Ok(info_obj) = doc.trailer.get(b"Info") else {
            return Ok(metadata);
        };

        let dict = match info_obj {
            lopdf::Object::Reference(id) => doc
                .get_object(*id)
                .ok()
                .and_then(|obj| obj.as_dict().ok()),
            lopdf::Object::Dictionary(dict) => Some(dict),
            _ => None,
        };

        if let Some(dict) = dict {
            for (key, value) in dict.iter() {
                if let lopdf::Object::String(bytes, _) = value {
                    metadata.insert(
                        String::from_utf8_lossy(key).into_owned(),
                        String::from_utf8_lossy(bytes).into_owned(),
                    );
                }
            }
        }

        Ok(metadata)
    }
}

/// Mock PDF collaborator for testing — returns configured text/metadata,
/// or fails on demand to exercise error surfacing.
pub struct MockPdfExtractor {
    text: String,
    metadata: BTreeMap<String, String>,
    fail: bool,
}

impl MockPdfExtractor {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            metadata: BTreeMap::new(),
            fail: false,
        }
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn failing() -> Self {
        Self {
            text: String::new(),
            metadata: BTreeMap::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl PdfExtractor for MockPdfExtractor {
    async fn extract_text(&self, _pdf_bytes: &[u8]) -> Result<String, PdfError> {
        if self.fail {
            return Err(PdfError::Parse("mock failure".into()));
        }
        Ok(self.text.clone())
    }

    async fn extract_metadata(&self, _pdf_bytes: &[u8]) -> Result<BTreeMap<String, String>, PdfError> {
        if self.fail {
            return Err(PdfError::Parse("mock failure".into()));
        }
        Ok(self.metadata.clone())
    }
}
