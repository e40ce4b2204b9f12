//! End-to-end flow over an in-memory database with mock collaborators:
//! classify a submission, route it, and check what was persisted.

use std::sync::Arc;

use base64::Engine;
use serde_json::json;
use uuid::Uuid;

use doctriage::db::MemoryStore;
use doctriage::llm::{LlmClient, MockLlmClient};
use doctriage::models::{DocumentFormat, RawContent};
use doctriage::pdf::{MockPdfExtractor, PdfExtractor};
use doctriage::pipeline::{Classifier, DocumentRouter, ExtractionStatus, PipelineError};

struct Harness {
    store: Arc<MemoryStore>,
    classifier: Classifier,
    router: DocumentRouter,
}

fn harness(llm: MockLlmClient, pdf_text: &str) -> Harness {
    let store = Arc::new(MemoryStore::open_in_memory().unwrap());
    let llm: Arc<dyn LlmClient> = Arc::new(llm);
    let pdf: Arc<dyn PdfExtractor> = Arc::new(MockPdfExtractor::new(pdf_text));
    Harness {
        classifier: Classifier::new(Arc::clone(&llm), Arc::clone(&pdf), Arc::clone(&store)),
        router: DocumentRouter::new(llm, pdf, Arc::clone(&store)),
        store,
    }
}

#[tokio::test]
async fn json_invoice_flows_to_schema_extraction() {
    let h = harness(
        MockLlmClient::new(r#"{"format": "json", "intent": "invoice"}"#),
        "",
    );
    let invoice = json!({
        "invoice_number": "INV-2026-001",
        "issue_date": "2026-08-01",
        "due_date": "2026-09-01",
        "total_amount": 980.0,
        "vendor": "Acme Corp"
    });

    let classification = h
        .classifier
        .classify(RawContent::Json(invoice), None)
        .await
        .unwrap();
    assert_eq!(classification.format, DocumentFormat::Json);
    assert_eq!(classification.intent, "invoice");

    let outcome = h.router.process(classification.document_id).await.unwrap();
    assert_eq!(outcome.result.status, ExtractionStatus::Success);
    assert!(outcome.result.missing_fields.is_empty());

    let field = h
        .store
        .get_field(&classification.document_id, "invoice_number")
        .unwrap();
    assert_eq!(field.as_deref(), Some("INV-2026-001"));
}

#[tokio::test]
async fn invalid_invoice_keeps_partial_fields() {
    let h = harness(
        MockLlmClient::new(r#"{"format": "json", "intent": "invoice"}"#),
        "",
    );
    let partial = json!({"invoice_number": "INV-7", "vendor": "Acme"});

    let classification = h.classifier.classify(RawContent::Json(partial), None).await.unwrap();
    let outcome = h.router.process(classification.document_id).await.unwrap();

    assert_eq!(outcome.result.status, ExtractionStatus::ValidationFailed);
    assert!(outcome.result.missing_fields.contains(&"total_amount".to_string()));
    assert!(h
        .store
        .get_field(&classification.document_id, "vendor")
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn complaint_email_persists_crm_fields_and_urgency() {
    let h = harness(
        MockLlmClient::with_responses([
            r#"{"format": "email", "intent": "complaint"}"#.to_string(),
            r#"{"issue": "late delivery", "sentiment": "negative"}"#.to_string(),
            "HIGH priority".to_string(),
        ]),
        "",
    );
    let email = "From: customer@example.com\nSubject: Where is my order?\n\nMy order is two weeks late. This is unacceptable.";

    let classification = h
        .classifier
        .classify(RawContent::Text(email.to_string()), None)
        .await
        .unwrap();
    let outcome = h.router.process(classification.document_id).await.unwrap();

    assert_eq!(outcome.result.status, ExtractionStatus::Success);
    assert_eq!(outcome.result.is_parsed_email, Some(true));
    assert_eq!(outcome.result.extracted_data["urgency"], json!("high"));

    let id = classification.document_id;
    assert_eq!(
        h.store.get_field(&id, "sender").unwrap().unwrap().as_str(),
        "customer@example.com"
    );
    assert_eq!(h.store.get_field(&id, "urgency").unwrap().unwrap().as_str(), "high");

    // History surfaces the sender
    let recent = h.store.list_recent(10).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].sender.as_deref(), Some("customer@example.com"));
}

#[tokio::test]
async fn base64_pdf_upload_with_hint_flows_to_pdf_extractor() {
    let h = harness(
        MockLlmClient::with_responses([
            // Model contradicts the hint; the hint must win
            r#"{"format": "email", "intent": "invoice"}"#.to_string(),
            r#"{"invoice_number": "INV-PDF-1", "total_amount": 12.0}"#.to_string(),
        ]),
        "INVOICE INV-PDF-1 Total: 12.00",
    );
    let encoded = base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.4 pretend");

    let classification = h
        .classifier
        .classify(RawContent::Text(encoded), Some("application/pdf"))
        .await
        .unwrap();
    assert_eq!(classification.format, DocumentFormat::Pdf);

    let outcome = h.router.process(classification.document_id).await.unwrap();
    assert_eq!(outcome.result.status, ExtractionStatus::Success);
    assert!(outcome.result.metadata.is_some());
    assert!(h
        .store
        .get_field(&classification.document_id, "invoice_number")
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn unknown_format_degrades_to_email_processing() {
    let h = harness(
        MockLlmClient::with_responses([
            "I really cannot tell what this is.".to_string(),
            r#"{"topic": "unclear"}"#.to_string(),
            "low".to_string(),
        ]),
        "",
    );

    let classification = h
        .classifier
        .classify(RawContent::Text("*#@! binary-ish noise".to_string()), None)
        .await
        .unwrap();
    assert_eq!(classification.format, DocumentFormat::Unknown);

    // Degrade rather than reject: still produces a result
    let outcome = h.router.process(classification.document_id).await.unwrap();
    assert_eq!(outcome.result.status, ExtractionStatus::Success);
    assert_eq!(outcome.result.is_parsed_email, Some(false));
}

#[tokio::test]
async fn reprocessing_overwrites_fields_without_duplicates() {
    let h = harness(
        MockLlmClient::with_responses([
            r#"{"format": "email", "intent": "complaint"}"#.to_string(),
            r#"{"issue": "first pass"}"#.to_string(),
            "low".to_string(),
            r#"{"issue": "second pass"}"#.to_string(),
            "high".to_string(),
        ]),
        "",
    );
    let email = "From: a@b.c\nSubject: s\n\nbody";

    let classification = h
        .classifier
        .classify(RawContent::Text(email.to_string()), None)
        .await
        .unwrap();
    let id = classification.document_id;

    h.router.process(id).await.unwrap();
    let first_count = h.store.get_fields(&id).unwrap().len();

    h.router.process(id).await.unwrap();
    let fields = h.store.get_fields(&id).unwrap();
    assert_eq!(fields.len(), first_count);
    assert_eq!(h.store.get_field(&id, "issue").unwrap().unwrap().as_str(), "second pass");
    assert_eq!(h.store.get_field(&id, "urgency").unwrap().unwrap().as_str(), "high");
}

#[tokio::test]
async fn routing_unknown_id_is_not_found() {
    let h = harness(MockLlmClient::new("unused"), "");
    let missing = Uuid::new_v4();
    match h.router.process(missing).await {
        Err(PipelineError::NotFound(id)) => assert_eq!(id, missing),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn history_is_most_recent_first() {
    let h = harness(MockLlmClient::new(r#"{"format": "email", "intent": "general"}"#), "");

    let first = h
        .classifier
        .classify(RawContent::Text("first".into()), None)
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = h
        .classifier
        .classify(RawContent::Text("second".into()), None)
        .await
        .unwrap();

    let recent = h.store.list_recent(10).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id, second.document_id);
    assert_eq!(recent[1].id, first.document_id);
}
