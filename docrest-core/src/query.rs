//! Query filters built from coerced request parameters.
//!
//! A [`QueryFilter`] is an ordered list of `field -> value` predicates. Every predicate
//! must hold for a document to match. Backends consume filters through the
//! [`QueryVisitor`] trait, the same way for every backend:
//!
//! - the MongoDB backend translates each predicate into a BSON query document
//! - the in-memory backend evaluates each predicate against a stored document
//!
//! # Example
//!
//! ```ignore
//! use docrest_core::query::QueryFilter;
//! use serde_json::json;
//!
//! let params = json!({ "status": "open", "amount": "/^[1-9][0-9]*$/" });
//! let filter = QueryFilter::from_params(params.as_object().unwrap());
//! assert_eq!(filter.len(), 2);
//! ```

use serde_json::{Map, Value};

use crate::{
    coerce::{QueryValue, coerce},
    error::DocumentStoreError,
};

/// A conjunction of field predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    fields: Vec<(String, QueryValue)>,
}

impl QueryFilter {
    /// Creates an empty filter that matches every document.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Builds a filter by coercing every value of a raw parameter mapping.
    ///
    /// Keys are used verbatim as field names.
    pub fn from_params(params: &Map<String, Value>) -> Self {
        Self {
            fields: params
                .iter()
                .map(|(field, raw)| (field.clone(), coerce(raw)))
                .collect(),
        }
    }

    /// Adds a predicate, replacing any earlier predicate on the same field.
    pub fn with(mut self, field: impl Into<String>, value: QueryValue) -> Self {
        let field = field.into();
        self.fields.retain(|(existing, _)| existing != &field);
        self.fields.push((field, value));
        self
    }

    pub fn get(&self, field: &str) -> Option<&QueryValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == field)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.fields
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_field(
        &mut self,
        field: &str,
        value: &QueryValue,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_filter(&mut self, filter: &QueryFilter) -> Result<Vec<Self::Output>, Self::Error> {
        filter
            .iter()
            .map(|(field, value)| self.visit_field(field, value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_params_coerces_top_level_values() {
        let params = json!({ "status": "open", "amount": "/^[1-9][0-9]*$/", "paid": "false" });
        let filter = QueryFilter::from_params(params.as_object().unwrap());

        assert_eq!(filter.len(), 3);
        assert_eq!(filter.get("status"), Some(&QueryValue::String("open".into())));
        assert_eq!(filter.get("paid"), Some(&QueryValue::Bool(false)));
        match filter.get("amount") {
            Some(QueryValue::Regex(pattern)) => assert_eq!(pattern.as_str(), "^[1-9][0-9]*$"),
            other => panic!("expected a regex, got {other:?}"),
        }
    }

    #[test]
    fn from_params_keeps_key_order() {
        let params = json!({ "z": "1", "a": "2", "m": "3" });
        let filter = QueryFilter::from_params(params.as_object().unwrap());

        let fields: Vec<_> = filter.iter().map(|(field, _)| field).collect();
        assert_eq!(fields, vec!["z", "a", "m"]);
    }

    #[test]
    fn undefined_survives_filter_building() {
        let params = json!({ "deletedAt": "undefined" });
        let filter = QueryFilter::from_params(params.as_object().unwrap());

        assert_eq!(filter.get("deletedAt"), Some(&QueryValue::Undefined));
    }

    #[test]
    fn with_replaces_existing_field() {
        let filter = QueryFilter::new()
            .with("a", QueryValue::Number(1.0))
            .with("a", QueryValue::Number(2.0));

        assert_eq!(filter.len(), 1);
        assert_eq!(filter.get("a"), Some(&QueryValue::Number(2.0)));
    }
}
