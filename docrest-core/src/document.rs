//! Document identifiers and conversion between the wire format (JSON) and the storage
//! format (BSON).
//!
//! Stored documents are plain BSON [`Document`]s keyed by their `_id` field. Outgoing
//! documents are rendered the way a JSON API client expects them: object ids as their
//! hex string and datetimes as RFC 3339 strings.

use std::fmt;

use bson::{Bson, Document, oid::ObjectId, ser::serialize_to_document};
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Name of the identifier field of every stored document.
pub const ID_FIELD: &str = "_id";

/// The identifier of a stored document, as parsed from a URL path segment.
///
/// A 24 digit hex string is an [`ObjectId`]; anything else is matched as a plain string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentId {
    ObjectId(ObjectId),
    String(String),
}

impl DocumentId {
    pub fn parse(raw: &str) -> Self {
        match ObjectId::parse_str(raw) {
            Ok(oid) if raw.len() == 24 => DocumentId::ObjectId(oid),
            _ => DocumentId::String(raw.to_string()),
        }
    }

    pub fn generate() -> Self {
        DocumentId::ObjectId(ObjectId::new())
    }

    pub fn to_bson(&self) -> Bson {
        match self {
            DocumentId::ObjectId(oid) => Bson::ObjectId(*oid),
            DocumentId::String(s) => Bson::String(s.clone()),
        }
    }

    /// Whether a stored `_id` value is this identifier.
    pub fn matches(&self, value: &Bson) -> bool {
        match (self, value) {
            (DocumentId::ObjectId(oid), Bson::ObjectId(other)) => oid == other,
            (DocumentId::String(s), Bson::String(other)) => s == other,
            _ => false,
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::ObjectId(oid) => write!(f, "{}", oid.to_hex()),
            DocumentId::String(s) => write!(f, "{s}"),
        }
    }
}

/// The store's acknowledgement of a set-merge update.
///
/// Serializes as `{"ok": 1, "n": <matched>, "nModified": <modified>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateAck {
    ok: u8,
    #[serde(rename = "n")]
    pub matched: u64,
    #[serde(rename = "nModified")]
    pub modified: u64,
}

impl UpdateAck {
    pub fn new(matched: u64, modified: u64) -> Self {
        Self { ok: 1, matched, modified }
    }
}

/// Gives a document without an `_id` a freshly generated one, placed first.
pub fn ensure_id(document: Document) -> Document {
    if document.contains_key(ID_FIELD) {
        return document;
    }

    let mut with_id = Document::new();
    with_id.insert(ID_FIELD, DocumentId::generate().to_bson());
    for (field, value) in document {
        with_id.insert(field, value);
    }
    with_id
}

/// Converts a JSON object into a BSON document for storage.
///
/// A 24 digit hex `_id` is stored as an [`ObjectId`], the same form a path identifier
/// parses to.
pub fn document_from_json(object: &Map<String, Value>) -> DocumentStoreResult<Document> {
    let mut document = serialize_to_document(object)?;

    if let Some(Bson::String(raw)) = document.get(ID_FIELD) {
        let id = DocumentId::parse(raw).to_bson();
        document.insert(ID_FIELD, id);
    }

    Ok(document)
}

/// Converts a JSON value that must be an object into a BSON document.
pub fn document_from_json_value(value: &Value) -> DocumentStoreResult<Document> {
    match value {
        Value::Object(object) => document_from_json(object),
        other => Err(DocumentStoreError::InvalidDocument(format!(
            "expected a JSON object, got {}",
            json_type_name(other)
        ))),
    }
}

/// Renders an identifier value for messages: hex for object ids, bare text for strings.
pub fn display_id(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders a stored document as JSON.
pub fn document_to_json(document: &Document) -> Value {
    Value::Object(
        document
            .iter()
            .map(|(k, v)| (k.clone(), bson_to_json(v)))
            .collect()
    )
}

/// Renders a single BSON value as JSON.
pub fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(n) => Value::from(*n),
        Bson::Int64(n) => Value::from(*n),
        Bson::Double(n) => Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::String(s) => Value::String(s.clone()),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map(Value::String)
            .unwrap_or_else(|_| Value::from(dt.timestamp_millis())),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(doc) => document_to_json(doc),
        other => Value::String(other.to_string()),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde_json::json;

    #[test]
    fn hex_ids_parse_as_object_ids() {
        let oid = ObjectId::new();

        assert_eq!(DocumentId::parse(&oid.to_hex()), DocumentId::ObjectId(oid));
        assert_eq!(DocumentId::parse("1"), DocumentId::String("1".into()));
        assert_eq!(
            DocumentId::parse("not-an-object-id-at-all!"),
            DocumentId::String("not-an-object-id-at-all!".into())
        );
    }

    #[test]
    fn ids_only_match_their_own_kind() {
        let oid = ObjectId::new();

        assert!(DocumentId::ObjectId(oid).matches(&Bson::ObjectId(oid)));
        assert!(!DocumentId::String(oid.to_hex()).matches(&Bson::ObjectId(oid)));
        assert!(DocumentId::String("1".into()).matches(&Bson::String("1".into())));
    }

    #[test]
    fn documents_render_as_plain_json() {
        let oid = ObjectId::new();
        let rendered = document_to_json(&doc! {
            "_id": oid,
            "v": 7,
            "ratio": 0.5,
            "tags": ["a", "b"],
            "nested": { "ok": true, "none": Bson::Null },
        });

        assert_eq!(
            rendered,
            json!({
                "_id": oid.to_hex(),
                "v": 7,
                "ratio": 0.5,
                "tags": ["a", "b"],
                "nested": { "ok": true, "none": null },
            })
        );
    }

    #[test]
    fn missing_ids_are_generated_in_front() {
        let with_id = ensure_id(doc! { "v": 7 });
        let kept = ensure_id(doc! { "v": 7, "_id": "1" });

        assert_eq!(with_id.keys().next().map(String::as_str), Some(ID_FIELD));
        assert!(matches!(with_id.get(ID_FIELD), Some(Bson::ObjectId(_))));
        assert_eq!(kept, doc! { "v": 7, "_id": "1" });
    }

    #[test]
    fn hex_body_ids_become_object_ids() {
        let oid = ObjectId::new();

        let stored = document_from_json_value(&json!({ "_id": oid.to_hex(), "v": 7 })).unwrap();
        let plain = document_from_json_value(&json!({ "_id": "1" })).unwrap();

        assert_eq!(stored, doc! { "_id": oid, "v": 7 });
        assert!(DocumentId::parse(&oid.to_hex()).matches(stored.get(ID_FIELD).unwrap()));
        assert_eq!(plain, doc! { "_id": "1" });
    }

    #[test]
    fn ids_display_without_quotes() {
        let oid = ObjectId::new();

        assert_eq!(display_id(&Bson::String("1".into())), "1");
        assert_eq!(display_id(&Bson::ObjectId(oid)), oid.to_hex());
        assert_eq!(display_id(&Bson::Int32(3)), "3");
    }

    #[test]
    fn non_objects_are_rejected_as_documents() {
        let err = document_from_json_value(&json!([1, 2])).unwrap_err();

        assert_eq!(err.kind(), "invalid_document");
    }

    #[test]
    fn acknowledgements_use_store_field_names() {
        let ack = serde_json::to_value(UpdateAck::new(1, 0)).unwrap();

        assert_eq!(ack, json!({ "ok": 1, "n": 1, "nModified": 0 }));
    }
}
