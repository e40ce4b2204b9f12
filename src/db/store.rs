use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use base64::Engine;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{open_database, open_memory_database, DatabaseError};
use crate::models::{Document, DocumentFormat, DocumentSummary, ExtractedField, RawContent};

/// Placeholder stored instead of binary content whose base64 form exceeds
/// the storage cap. The PDF extractor must check for this before decoding.
pub const BINARY_CONTENT_SENTINEL: &str = "BINARY_CONTENT";

/// Cap on stored base64-encoded binary (1 MiB of text).
const MAX_STORED_BASE64_LEN: usize = 1_000_000;

/// Cap on stored plain-text content.
const MAX_STORED_TEXT_CHARS: usize = 100_000;

/// Shared persistence store for documents and their extracted fields.
///
/// Individual record writes are atomic (single SQLite statements); there
/// are no cross-document transactions.
pub struct MemoryStore {
    conn: Mutex<Connection>,
}

impl MemoryStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open (or create) the store at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::new(open_database(path)?))
    }

    /// In-memory store for testing.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(open_memory_database()?))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    /// Persist a new document record. Format and intent are stored
    /// lowercase; an empty intent is normalized to "general".
    pub fn create_document(
        &self,
        id: &Uuid,
        format: DocumentFormat,
        intent: &str,
        content: &RawContent,
    ) -> Result<(), DatabaseError> {
        let intent = intent.trim().to_lowercase();
        let intent = if intent.is_empty() { "general".to_string() } else { intent };
        let serialized = serialize_content(content);

        tracing::debug!(
            document_id = %id,
            format = %format,
            intent = %intent,
            content_len = serialized.len(),
            "Storing document"
        );

        self.conn()?.execute(
            "INSERT INTO documents (id, format, intent, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id.to_string(),
                format.as_str(),
                intent,
                serialized,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Store an extracted field value. Last write wins: writing an
    /// existing (document_id, field_name) key overwrites the value.
    pub fn upsert_field(
        &self,
        document_id: &Uuid,
        field_name: &str,
        field_value: &serde_json::Value,
    ) -> Result<(), DatabaseError> {
        let serialized = serialize_field_value(field_value);
        self.conn()?.execute(
            "INSERT INTO extracted_fields (document_id, field_name, field_value, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (document_id, field_name)
             DO UPDATE SET field_value = excluded.field_value,
                           updated_at = excluded.updated_at",
            params![
                document_id.to_string(),
                field_name,
                serialized,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Retrieve a document by id, or `None` if it does not exist.
    pub fn get_document(&self, id: &Uuid) -> Result<Option<Document>, DatabaseError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, format, intent, content, created_at FROM documents WHERE id = ?1",
        )?;

        let result = stmt.query_row(params![id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        });

        match result {
            Ok((id, format, intent, content, created_at)) => Ok(Some(Document {
                id: Uuid::parse_str(&id)
                    .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
                format: DocumentFormat::from_label(&format),
                intent,
                content,
                created_at: parse_timestamp(&created_at),
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Retrieve a single extracted field value.
    pub fn get_field(
        &self,
        document_id: &Uuid,
        field_name: &str,
    ) -> Result<Option<String>, DatabaseError> {
        let conn = self.conn()?;
        let result = conn.query_row(
            "SELECT field_value FROM extracted_fields
             WHERE document_id = ?1 AND field_name = ?2",
            params![document_id.to_string(), field_name],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All extracted fields for a document.
    pub fn get_fields(&self, document_id: &Uuid) -> Result<Vec<ExtractedField>, DatabaseError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT document_id, field_name, field_value, updated_at
             FROM extracted_fields WHERE document_id = ?1 ORDER BY field_name",
        )?;
        let rows = stmt.query_map(params![document_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut fields = Vec::new();
        for row in rows {
            let (doc_id, name, value, updated_at) = row?;
            fields.push(ExtractedField {
                document_id: Uuid::parse_str(&doc_id)
                    .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
                field_name: name,
                field_value: value,
                updated_at: parse_timestamp(&updated_at),
            });
        }
        Ok(fields)
    }

    /// Recent processing history, most recent first, joined with the
    /// extracted sender field when present.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<DocumentSummary>, DatabaseError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT d.id, d.format, d.intent, d.created_at, e.field_value
             FROM documents d
             LEFT JOIN extracted_fields e
               ON d.id = e.document_id AND e.field_name = 'sender'
             ORDER BY d.created_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, format, intent, created_at, sender) = row?;
            summaries.push(DocumentSummary {
                id: Uuid::parse_str(&id)
                    .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
                format: DocumentFormat::from_label(&format),
                intent,
                created_at: parse_timestamp(&created_at),
                sender,
            });
        }
        Ok(summaries)
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_default()
}

/// Serialize raw content for storage: compact JSON for structured data,
/// base64 for binary (sentinel if oversized), bounded text otherwise.
fn serialize_content(content: &RawContent) -> String {
    match content {
        RawContent::Json(value) => value.to_string(),
        RawContent::Binary(bytes) => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
            if encoded.len() > MAX_STORED_BASE64_LEN {
                tracing::warn!(
                    encoded_len = encoded.len(),
                    "Binary content exceeds storage cap, storing sentinel"
                );
                BINARY_CONTENT_SENTINEL.to_string()
            } else {
                encoded
            }
        }
        RawContent::Text(text) => truncate_chars(text, MAX_STORED_TEXT_CHARS).to_string(),
    }
}

/// Serialize a field value: strings stored as-is, other scalars and
/// structures as JSON text.
fn serialize_field_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Truncate at a char boundary, never mid-codepoint.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
