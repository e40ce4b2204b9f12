//! Fixed per-intent schemas for structured JSON documents.
//!
//! Only `invoice` and `rfq` carry a schema; every other intent falls
//! through to freeform model extraction. Lookup is exact lowercase
//! equality on the intent string.

use serde_json::Value;

/// Expected top-level shape of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    String,
    Number,
    Array,
}

impl FieldShape {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldShape::String => value.is_string(),
            FieldShape::Number => value.is_number(),
            FieldShape::Array => value.is_array(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldShape::String => "string",
            FieldShape::Number => "number",
            FieldShape::Array => "array",
        }
    }
}

/// Structural schema for one intent: which fields must be present and
/// what shape each declared field has when it is present.
#[derive(Debug, Clone)]
pub struct IntentSchema {
    pub intent: &'static str,
    pub required: &'static [&'static str],
    pub properties: &'static [(&'static str, FieldShape)],
}

const INVOICE_SCHEMA: IntentSchema = IntentSchema {
    intent: "invoice",
    required: &["invoice_number", "issue_date", "due_date", "total_amount"],
    properties: &[
        ("invoice_number", FieldShape::String),
        ("issue_date", FieldShape::String),
        ("due_date", FieldShape::String),
        ("vendor", FieldShape::String),
        ("customer", FieldShape::String),
        ("items", FieldShape::Array),
        ("total_amount", FieldShape::Number),
        ("currency", FieldShape::String),
    ],
};

const RFQ_SCHEMA: IntentSchema = IntentSchema {
    intent: "rfq",
    required: &["rfq_number", "request_date", "items"],
    properties: &[
        ("rfq_number", FieldShape::String),
        ("request_date", FieldShape::String),
        ("requester", FieldShape::String),
        ("supplier", FieldShape::String),
        ("items", FieldShape::Array),
    ],
};

/// Exact-match schema lookup. Returns `None` for any intent without a
/// registered schema, which routes the document to freeform extraction.
pub fn schema_for_intent(intent: &str) -> Option<&'static IntentSchema> {
    match intent {
        "invoice" => Some(&INVOICE_SCHEMA),
        "rfq" => Some(&RFQ_SCHEMA),
        _ => None,
    }
}

impl IntentSchema {
    /// Structural validation: every required field present, every declared
    /// field that is present has the declared shape. Returns the list of
    /// human-readable violations (empty means valid).
    pub fn validate(&self, content: &Value) -> Vec<String> {
        let mut errors = Vec::new();

        let obj = match content.as_object() {
            Some(obj) => obj,
            None => {
                errors.push("content is not a JSON object".to_string());
                return errors;
            }
        };

        for field in self.required {
            if !obj.contains_key(*field) {
                errors.push(format!("'{field}' is a required property"));
            }
        }

        for (field, shape) in self.properties {
            if let Some(value) = obj.get(*field) {
                if !shape.matches(value) {
                    errors.push(format!("'{field}' is not of type '{}'", shape.as_str()));
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_is_exact_lowercase() {
        assert!(schema_for_intent("invoice").is_some());
        assert!(schema_for_intent("rfq").is_some());
        assert!(schema_for_intent("Invoice").is_none());
        assert!(schema_for_intent("purchase invoice").is_none());
        assert!(schema_for_intent("complaint").is_none());
    }

    #[test]
    fn valid_invoice_passes() {
        let schema = schema_for_intent("invoice").unwrap();
        let doc = json!({
            "invoice_number": "INV-001",
            "issue_date": "2026-01-10",
            "due_date": "2026-02-10",
            "total_amount": 1250.0,
            "vendor": "Acme Corp",
            "items": [{"description": "Widget", "quantity": 10, "unit_price": 125.0}]
        });
        assert!(schema.validate(&doc).is_empty());
    }

    #[test]
    fn missing_required_fields_reported() {
        let schema = schema_for_intent("invoice").unwrap();
        let doc = json!({"invoice_number": "INV-001"});
        let errors = schema.validate(&doc);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("issue_date")));
        assert!(errors.iter().any(|e| e.contains("due_date")));
        assert!(errors.iter().any(|e| e.contains("total_amount")));
    }

    #[test]
    fn wrong_shape_reported() {
        let schema = schema_for_intent("invoice").unwrap();
        let doc = json!({
            "invoice_number": "INV-001",
            "issue_date": "2026-01-10",
            "due_date": "2026-02-10",
            "total_amount": "1250",
            "items": "not an array"
        });
        let errors = schema.validate(&doc);
        assert!(errors.iter().any(|e| e.contains("total_amount") && e.contains("number")));
        assert!(errors.iter().any(|e| e.contains("items") && e.contains("array")));
    }

    #[test]
    fn non_object_content_rejected() {
        let schema = schema_for_intent("rfq").unwrap();
        let errors = schema.validate(&json!(["a", "b"]));
        assert_eq!(errors, vec!["content is not a JSON object".to_string()]);
    }

    #[test]
    fn rfq_required_fields() {
        let schema = schema_for_intent("rfq").unwrap();
        let doc = json!({
            "rfq_number": "RFQ-7",
            "request_date": "2026-03-01",
            "items": [{"item_name": "Bearing", "quantity": 40}]
        });
        assert!(schema.validate(&doc).is_empty());
    }
}
