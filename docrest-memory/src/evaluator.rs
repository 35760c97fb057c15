//! Query filter evaluation for in-memory document filtering.
//!
//! This module matches stored BSON documents against a [`QueryFilter`] with the same
//! semantics the MongoDB backend gets from the server for the filters the REST layer
//! produces:
//!
//! - a plain value matches by equality, or by membership when the stored field is an array
//! - `null` and `undefined` match a null or missing field
//! - a regular expression matches string fields
//! - a mapping whose keys all start with `$` is a set of operators (`$eq`, `$ne`, `$gt`,
//!   `$gte`, `$lt`, `$lte`, `$in`, `$nin`, `$exists`, `$regex`, `$not`), any other
//!   mapping matches an equal embedded document
//!
//! Field names are looked up verbatim.

use std::{collections::HashMap, cmp::Ordering};
use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};
use serde_json::Value;

use docrest_core::{
    coerce::{Pattern, QueryValue},
    document::ID_FIELD,
    query::{QueryVisitor, QueryFilter},
    error::{DocumentStoreError, DocumentStoreResult},
};


/// Type-erased, comparable representation of stored and queried values.
///
/// It normalizes numeric types to f64 for easy comparison.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// DateTime value
    DateTime(DateTime),
    /// Object id value
    ObjectId(ObjectId),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null | Bson::Undefined => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Bool(*value),
            Value::Number(value) => Comparable::Number(value.as_f64().unwrap_or(f64::NAN)),
            Value::String(value) => Comparable::String(value),
            Value::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Value::Object(map) => Comparable::Map(
                map
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
        }
    }
}

impl<'a> Comparable<'a> {
    /// Converts a query value; regular expressions have no comparable form.
    fn from_query(value: &'a QueryValue) -> Option<Self> {
        Some(match value {
            QueryValue::Null | QueryValue::Undefined => Comparable::Null,
            QueryValue::Bool(value) => Comparable::Bool(*value),
            QueryValue::Number(value) => Comparable::Number(*value),
            QueryValue::String(value) => Comparable::String(value),
            QueryValue::Json(value) => Comparable::from(value),
            QueryValue::Regex(_) => return None,
            QueryValue::Array(items) => Comparable::Array(
                items
                    .iter()
                    .map(Comparable::from_query)
                    .collect::<Option<Vec<_>>>()?
            ),
            QueryValue::Map(entries) => Comparable::Map(
                entries
                    .iter()
                    .map(|(k, v)| Comparable::from_query(v).map(|v| (k.as_str(), v)))
                    .collect::<Option<HashMap<_, _>>>()?
            ),
        })
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Reads a JSON literal as a query value without applying any string coercion.
fn literal(value: &Value) -> QueryValue {
    match value {
        Value::Null => QueryValue::Null,
        Value::Bool(b) => QueryValue::Bool(*b),
        Value::Number(n) => QueryValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => QueryValue::String(s.clone()),
        Value::Array(items) => QueryValue::Array(items.iter().map(literal).collect()),
        Value::Object(map) => QueryValue::Map(
            map
                .iter()
                .map(|(k, v)| (k.clone(), literal(v)))
                .collect()
        ),
    }
}

fn is_operator_map(entries: &[(String, QueryValue)]) -> bool {
    !entries.is_empty() && entries.iter().all(|(k, _)| k.starts_with('$'))
}


pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, filter: &QueryFilter) -> DocumentStoreResult<bool> {
        Ok(self.visit_filter(filter)?
            .into_iter()
            .all(|matched| matched))
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        filter: &QueryFilter,
    ) -> DocumentStoreResult<Vec<Document>> {
        let mut matched = Vec::new();

        for document in documents {
            if DocumentEvaluator::new(document).evaluate(filter)? {
                matched.push(document.clone());
            }
        }

        Ok(matched)
    }

    fn matches(&self, field_value: Option<&Bson>, value: &QueryValue) -> DocumentStoreResult<bool> {
        match value {
            QueryValue::Null | QueryValue::Undefined => Ok(match field_value {
                None | Some(Bson::Null) | Some(Bson::Undefined) => true,
                Some(Bson::Array(items)) => items.iter().any(|item| matches!(item, Bson::Null)),
                Some(_) => false,
            }),
            QueryValue::Regex(pattern) => Ok(Self::matches_pattern(field_value, pattern)),
            QueryValue::Json(json) => self.matches(field_value, &literal(json)),
            QueryValue::Map(entries) if is_operator_map(entries) => {
                for (op, operand) in entries {
                    if !self.apply_operator(field_value, op, operand, value)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(Self::equals(field_value, value)),
        }
    }

    fn equals(field_value: Option<&Bson>, value: &QueryValue) -> bool {
        let (Some(field_value), Some(expected)) = (field_value, Comparable::from_query(value)) else {
            return false;
        };

        let stored = Comparable::from(field_value);
        if stored == expected {
            return true;
        }

        match stored {
            Comparable::Array(items) => items.iter().any(|item| item == &expected),
            _ => false,
        }
    }

    fn matches_pattern(field_value: Option<&Bson>, pattern: &Pattern) -> bool {
        match field_value {
            Some(Bson::String(s)) => pattern.is_match(s),
            Some(Bson::Array(items)) => items
                .iter()
                .any(|item| matches!(item, Bson::String(s) if pattern.is_match(s))),
            _ => false,
        }
    }

    fn compare(field_value: Option<&Bson>, operand: &QueryValue, accept: fn(Ordering) -> bool) -> bool {
        let (Some(field_value), Some(operand)) = (field_value, Comparable::from_query(operand)) else {
            return false;
        };

        match Comparable::from(field_value) {
            Comparable::Array(items) => items
                .iter()
                .any(|item| item.partial_cmp(&operand).is_some_and(accept)),
            stored => stored.partial_cmp(&operand).is_some_and(accept),
        }
    }

    fn apply_operator(
        &self,
        field_value: Option<&Bson>,
        op: &str,
        operand: &QueryValue,
        operators: &QueryValue,
    ) -> DocumentStoreResult<bool> {
        let parsed;
        let operand = match operand {
            QueryValue::Json(json) => {
                parsed = literal(json);
                &parsed
            }
            other => other,
        };

        match op {
            "$eq" => self.matches(field_value, operand),
            "$ne" => Ok(!self.matches(field_value, operand)?),
            "$gt" => Ok(Self::compare(field_value, operand, |o| o == Ordering::Greater)),
            "$gte" => Ok(Self::compare(field_value, operand, |o| o != Ordering::Less)),
            "$lt" => Ok(Self::compare(field_value, operand, |o| o == Ordering::Less)),
            "$lte" => Ok(Self::compare(field_value, operand, |o| o != Ordering::Greater)),
            "$in" | "$nin" => {
                let QueryValue::Array(candidates) = operand else {
                    return Err(DocumentStoreError::Backend(format!("{op} needs an array")));
                };

                let mut found = false;
                for candidate in candidates {
                    if self.matches(field_value, candidate)? {
                        found = true;
                        break;
                    }
                }

                Ok(if op == "$in" { found } else { !found })
            }
            "$exists" => {
                let should_exist = match operand {
                    QueryValue::Bool(b) => *b,
                    QueryValue::Number(n) => *n != 0.0,
                    QueryValue::Null | QueryValue::Undefined => false,
                    _ => true,
                };

                Ok(field_value.is_some() == should_exist)
            }
            "$regex" => {
                let source = match operand {
                    QueryValue::Regex(pattern) => pattern.as_str().to_string(),
                    QueryValue::String(source) => source.clone(),
                    _ => return Err(DocumentStoreError::Backend("$regex has to be a string".to_string())),
                };
                let source = match operators.get("$options") {
                    Some(QueryValue::String(options)) if !options.is_empty() => {
                        format!("(?{options}){source}")
                    }
                    _ => source,
                };

                match Pattern::compile(&source) {
                    Some(pattern) => Ok(Self::matches_pattern(field_value, &pattern)),
                    None => Err(DocumentStoreError::Backend(format!("invalid regular expression: {source}"))),
                }
            }
            "$options" => Ok(true),
            "$not" => Ok(!self.matches(field_value, operand)?),
            unknown => Err(DocumentStoreError::Backend(format!("unknown operator: {unknown}"))),
        }
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DocumentStoreError;

    /// An object id `_id` is matched through its hex form, the form query strings carry.
    fn visit_field(&mut self, field: &str, value: &QueryValue) -> Result<Self::Output, Self::Error> {
        match self.document.get(field) {
            Some(Bson::ObjectId(oid)) if field == ID_FIELD => {
                self.matches(Some(&Bson::String(oid.to_hex())), value)
            }
            stored => self.matches(stored, value),
        }
    }
}
