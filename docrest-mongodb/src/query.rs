//! Query translation from docrest filters to MongoDB query syntax.
//!
//! This module translates coerced query values into the BSON filter document MongoDB
//! executes. Keys are passed through untouched, so `$` operators written in the query
//! string (`amount[$gt]=10`) reach the server as operators.

use bson::{Bson, Document, Regex, doc, raw::CString, ser::serialize_to_bson};

use docrest_core::{
    coerce::QueryValue,
    document::{DocumentId, ID_FIELD},
    query::{QueryFilter, QueryVisitor},
    error::DocumentStoreError,
};


/// Translates docrest query filters into MongoDB query documents.
///
/// This struct implements the [`QueryVisitor`] trait; each field predicate becomes one
/// entry of the filter document.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    /// Builds the complete filter document for a set of predicates.
    pub(crate) fn translate(
        &mut self,
        filter: &QueryFilter,
    ) -> Result<Document, DocumentStoreError> {
        let mut translated = Document::new();

        for entry in self.visit_filter(filter)? {
            for (field, value) in entry {
                translated.insert(field, value);
            }
        }

        Ok(translated)
    }

    /// Converts a coerced value into the BSON MongoDB compares against.
    ///
    /// `undefined` is sent as `null`, the way JavaScript drivers serialize it. Under
    /// `_id`, 24 digit hex strings are sent as object ids, including inside operators
    /// and arrays.
    fn value_to_bson(&self, value: &QueryValue, as_id: bool) -> Result<Bson, DocumentStoreError> {
        Ok(match value {
            QueryValue::Null | QueryValue::Undefined => Bson::Null,
            QueryValue::Bool(b) => Bson::Boolean(*b),
            QueryValue::Number(n) => Bson::Double(*n),
            QueryValue::String(s) if as_id => DocumentId::parse(s).to_bson(),
            QueryValue::String(s) => Bson::String(s.clone()),
            QueryValue::Regex(pattern) => Bson::RegularExpression(Regex {
                pattern: CString::try_from(pattern.as_str())?,
                options: CString::try_from("")?,
            }),
            QueryValue::Json(json) => serialize_to_bson(json)?,
            QueryValue::Array(items) => Bson::Array(
                items
                    .iter()
                    .map(|item| self.value_to_bson(item, as_id))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            QueryValue::Map(entries) => {
                let mut nested = Document::new();
                for (key, item) in entries {
                    nested.insert(key.clone(), self.value_to_bson(item, as_id && key.starts_with('$'))?);
                }
                Bson::Document(nested)
            }
        })
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_field(&mut self, field: &str, value: &QueryValue) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: self.value_to_bson(value, field == ID_FIELD)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn translate(params: serde_json::Value) -> Document {
        MongoQueryTranslator
            .translate(&QueryFilter::from_params(params.as_object().unwrap()))
            .unwrap()
    }

    #[test]
    fn coerced_scalars_become_typed_bson() {
        assert_eq!(
            translate(json!({ "status": "open", "amount": "1,200", "paid": "true", "gone": "undefined" })),
            doc! { "status": "open", "amount": 1200.0, "paid": true, "gone": Bson::Null }
        );
    }

    fn regex(pattern: &str) -> Bson {
        Bson::RegularExpression(Regex {
            pattern: CString::try_from(pattern).unwrap(),
            options: CString::try_from("").unwrap(),
        })
    }

    #[test]
    fn regexes_become_native_regular_expressions() {
        assert_eq!(
            translate(json!({ "amount": "/^[1-9][0-9]*$/" })),
            doc! { "amount": regex("^[1-9][0-9]*$") }
        );
    }

    #[test]
    fn regexes_inside_operator_arrays_stay_regular_expressions() {
        assert_eq!(
            translate(json!({ "tags": { "$in": ["/^a/", "b"] } })),
            doc! { "tags": { "$in": [regex("^a"), "b"] } }
        );
    }

    #[test]
    fn hex_ids_are_sent_as_object_ids() {
        let oid = bson::oid::ObjectId::new();

        assert_eq!(
            translate(json!({ "_id": oid.to_hex() })),
            doc! { "_id": oid }
        );
        assert_eq!(
            translate(json!({ "_id": { "$in": [oid.to_hex(), "1"] }, "ref": oid.to_hex() })),
            doc! { "_id": { "$in": [oid, "1"] }, "ref": oid.to_hex() }
        );
    }

    #[test]
    fn nested_operators_pass_through() {
        assert_eq!(
            translate(json!({ "amount": { "$gte": "10" }, "tags": r#"{"$in":["a","b"]}"# })),
            doc! { "amount": { "$gte": 10.0 }, "tags": { "$in": ["a", "b"] } }
        );
    }
}
