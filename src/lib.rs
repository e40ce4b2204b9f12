//! Document triage pipeline: hybrid heuristic/model classification of
//! incoming documents (PDF, JSON, email) followed by per-format field
//! extraction with graceful degradation, persisted to SQLite.
//!
//! The two entry points are [`pipeline::Classifier::classify`], which
//! decides format and intent and creates the document record, and
//! [`pipeline::DocumentRouter::process`], which runs the format-specific
//! extractor over a stored document.

pub mod config;
pub mod db;
pub mod llm;
pub mod models;
pub mod pdf;
pub mod pipeline;

pub use db::MemoryStore;
pub use llm::{LlmClient, OpenRouterClient};
pub use models::{Document, DocumentFormat, RawContent};
pub use pdf::{PdfExtractor, PdfTextExtractor};
pub use pipeline::{Classifier, DocumentRouter, ExtractionResult, PipelineError, ProcessOutcome};

use tracing_subscriber::EnvFilter;

/// Initialize structured logging. `RUST_LOG` overrides the default
/// crate-level filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
