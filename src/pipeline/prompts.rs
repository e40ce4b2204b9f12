//! Prompt templates and bounded content windows for every generative call.
//!
//! Window sizes differ per call site: classification sees a short snippet,
//! email bodies a medium window, PDF text the largest. The strict re-prompt
//! used by the PDF recovery ladder deliberately shrinks its window.

/// Classification snippet cap.
pub const CLASSIFY_SNIPPET_CHARS: usize = 1500;
/// Email body cap for field extraction.
pub const EMAIL_BODY_CHARS: usize = 2000;
/// Email body cap for the urgency call.
pub const URGENCY_BODY_CHARS: usize = 1000;
/// Serialized-JSON cap for freeform extraction.
pub const JSON_FREEFORM_CHARS: usize = 2000;
/// PDF text cap for the first extraction attempt.
pub const PDF_TEXT_CHARS: usize = 4000;
/// Shorter PDF window for the strict re-prompt.
pub const PDF_RETRY_CHARS: usize = 2000;

/// Clip text to a character cap, never splitting a codepoint.
pub fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ── Classification ──────────────────────────────────────────

pub const CLASSIFY_SYSTEM_PROMPT: &str = "You are a document classification AI. \
Your task is to analyze the document and determine its format (PDF, JSON, Email) \
and its intent (Invoice, RFQ, Complaint, Regulation, etc.).";

pub fn build_classification_prompt(snippet: &str) -> String {
    format!(
        "Classify the document format and intent from the following content snippet:\n\n\
         {snippet}\n\n\
         Respond in JSON format with 'format' and 'intent' fields only."
    )
}

// ── Email field extraction ──────────────────────────────────

/// Per-intent extraction template for email bodies: a specialist system
/// prompt and the field list the model is asked to fill.
pub fn email_intent_template(intent: &str) -> (String, String) {
    match intent {
        "complaint" => (
            "You are an AI specialized in extracting information from customer complaint \
             emails. Extract the issue, product/service, customer ID if available, and sentiment."
                .into(),
            "issue, product_or_service, customer_id (if available), sentiment (positive, neutral, negative)"
                .into(),
        ),
        "rfq" => (
            "You are an AI specialized in extracting information from Request for Quote (RFQ) \
             emails. Extract the items requested, quantities, desired delivery date, and any \
             specific requirements."
                .into(),
            "items_requested, quantities, delivery_date, specific_requirements".into(),
        ),
        "invoice" => (
            "You are an AI specialized in extracting information from invoice-related emails. \
             Extract the invoice number, amount, due date, and payment status if mentioned."
                .into(),
            "invoice_number, amount, due_date, payment_status".into(),
        ),
        other => (
            format!("You are an AI specialized in extracting key information from emails with {other} intent."),
            "all relevant fields for this type of communication".into(),
        ),
    }
}

pub fn build_email_extraction_prompt(field_list: &str, body: &str) -> String {
    format!(
        "Extract the following fields from this email: {field_list}. \
         Respond with only a JSON object.\n\nEMAIL CONTENT:\n{body}"
    )
}

// ── Urgency ─────────────────────────────────────────────────

pub const URGENCY_SYSTEM_PROMPT: &str =
    "You are an AI that determines the urgency of emails. Classify as 'high', 'medium', or 'low'.";

pub fn build_urgency_prompt(body: &str, intent: &str) -> String {
    format!(
        "This email has been classified with intent: {intent}. Determine the urgency based on \
         content and intent. Respond with only a single word: 'high', 'medium', or 'low'.\n\n\
         EMAIL CONTENT:\n{body}"
    )
}

// ── Freeform JSON extraction ────────────────────────────────

pub fn json_freeform_system_prompt(intent: &str) -> String {
    format!(
        "You are a specialized AI for extracting information from {intent} documents in JSON \
         format. Extract all relevant fields and return them in a clean JSON format."
    )
}

pub fn build_json_freeform_prompt(intent: &str, content: &str) -> String {
    format!(
        "Extract key information from this {intent} JSON document:\n\n{content}\n\n\
         Return only a JSON object with the extracted fields."
    )
}

// ── PDF field extraction ────────────────────────────────────

pub const PDF_SYSTEM_PROMPT: &str =
    "You are an AI assistant specialized in extracting information from documents.";

/// Field guidance for a PDF document, chosen by keyword match over the
/// intent string (not exact equality): "legal agreement", "service
/// contract" and the like all land on the legal template.
pub fn pdf_intent_field_list(intent: &str) -> &'static str {
    if intent.contains("invoice") {
        "invoice_number, issue_date, due_date, vendor, customer, line items, total_amount, currency"
    } else if intent.contains("rfq") || intent.contains("quote") {
        "rfq_number, request_date, requester, items with quantities and specifications, deadline"
    } else if intent.contains("agreement") || intent.contains("contract") || intent.contains("license") {
        "parties, effective_date, termination_date, governing_law, key obligations, renewal terms"
    } else if intent.contains("report") || intent.contains("research") {
        "title, authors, date, summary, key findings, conclusions"
    } else {
        "all key fields relevant to this document type"
    }
}

pub fn build_pdf_extraction_prompt(intent: &str, field_list: &str, text: &str) -> String {
    format!(
        "Extract key information from this {intent} document: {field_list}.\n\
         Return a JSON object with the extracted fields.\n\n\
         Document text:\n{text}"
    )
}

/// Stricter re-prompt used once when the first PDF extraction response
/// is not parseable JSON.
pub const PDF_STRICT_SYSTEM_PROMPT: &str = "You are a JSON generator. You output exactly one \
JSON object and nothing else. No explanation, no markdown fences, no surrounding text.";

pub fn build_pdf_strict_prompt(intent: &str, text: &str) -> String {
    format!(
        "Extract the key fields of this {intent} document as a single JSON object. \
         Output JSON only.\n\nDocument text:\n{text}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_respects_char_boundaries() {
        assert_eq!(clip("héllo", 2), "hé");
        assert_eq!(clip("short", 100), "short");
    }

    #[test]
    fn classification_prompt_contains_snippet() {
        let prompt = build_classification_prompt("Dear team, please quote...");
        assert!(prompt.contains("Dear team"));
        assert!(prompt.contains("'format' and 'intent'"));
    }

    #[test]
    fn email_templates_per_intent() {
        let (system, fields) = email_intent_template("complaint");
        assert!(system.contains("complaint"));
        assert!(fields.contains("sentiment"));

        let (system, fields) = email_intent_template("rfq");
        assert!(system.contains("Request for Quote"));
        assert!(fields.contains("items_requested"));

        let (system, fields) = email_intent_template("invoice");
        assert!(system.contains("invoice"));
        assert!(fields.contains("invoice_number"));
    }

    #[test]
    fn email_template_generic_mentions_intent() {
        let (system, fields) = email_intent_template("regulation");
        assert!(system.contains("regulation"));
        assert!(fields.contains("all relevant fields"));
    }

    #[test]
    fn pdf_field_list_matches_by_keyword_not_equality() {
        assert!(pdf_intent_field_list("invoice").contains("invoice_number"));
        assert!(pdf_intent_field_list("legal agreement").contains("parties"));
        assert!(pdf_intent_field_list("service contract").contains("governing_law"));
        assert!(pdf_intent_field_list("software license").contains("parties"));
        assert!(pdf_intent_field_list("research paper").contains("key findings"));
        assert!(pdf_intent_field_list("annual report").contains("summary"));
        assert!(pdf_intent_field_list("request for quote").contains("rfq_number"));
    }

    #[test]
    fn pdf_field_list_generic_fallback() {
        assert!(pdf_intent_field_list("memo").contains("all key fields"));
    }

    #[test]
    fn strict_prompt_forbids_prose() {
        assert!(PDF_STRICT_SYSTEM_PROMPT.contains("nothing else"));
        let prompt = build_pdf_strict_prompt("invoice", "text");
        assert!(prompt.contains("Output JSON only"));
    }

    #[test]
    fn retry_window_is_smaller() {
        assert!(PDF_RETRY_CHARS < PDF_TEXT_CHARS);
    }
}
