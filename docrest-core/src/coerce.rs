//! Heuristic coercion of untyped query values.
//!
//! Query strings carry nothing but text. [`coerce`] turns each value into a best-guess
//! typed [`QueryValue`] by trying a fixed list of rules in order:
//!
//! 1. `"null"` becomes [`QueryValue::Null`]
//! 2. `"undefined"` becomes [`QueryValue::Undefined`]
//! 3. `"true"` / `"false"` become [`QueryValue::Bool`]
//! 4. numbers such as `-123,456.78` become [`QueryValue::Number`]
//! 5. `/pattern/` becomes [`QueryValue::Regex`] when the pattern compiles
//! 6. `{...}` and `[...]` become [`QueryValue::Json`] when they parse
//! 7. anything else stays a [`QueryValue::String`]
//!
//! Objects are coerced value by value with their keys left untouched, arrays element by
//! element. Coercion never fails: a value that looks like a regex or JSON but does not
//! compile or parse is kept as the original string.
//!
//! ```ignore
//! use docrest_core::coerce::{coerce, QueryValue};
//! use serde_json::json;
//!
//! assert_eq!(coerce(&json!("-1,024.5")), QueryValue::Number(-1024.5));
//! assert_eq!(coerce(&json!("/[/")), QueryValue::String("/[/".into()));
//! ```

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde_json::Value;

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?\d+(,\d+)*(\.\d+)?$").expect("numeric pattern is valid")
});

/// A compiled regular expression that remembers its source text.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    compiled: Regex,
}

impl Pattern {
    /// Compiles `source`, returning `None` when it is not a valid pattern.
    pub fn compile(source: &str) -> Option<Self> {
        Regex::new(source)
            .ok()
            .map(|compiled| Self { source: source.to_string(), compiled })
    }

    /// The pattern text, without the surrounding slashes.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.compiled.is_match(haystack)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.source)
    }
}

/// A typed value produced by [`coerce`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Null,
    /// The literal `undefined`. Kept distinct from [`QueryValue::Null`]; backends decide
    /// how to match it.
    Undefined,
    Bool(bool),
    Number(f64),
    Regex(Pattern),
    /// A parsed JSON object or array.
    Json(Value),
    String(String),
    /// A nested mapping, in the order the keys arrived.
    Map(Vec<(String, QueryValue)>),
    Array(Vec<QueryValue>),
}

impl QueryValue {
    /// Looks up a key of a [`QueryValue::Map`].
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        match self {
            QueryValue::Map(entries) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Coerces an untyped value into a [`QueryValue`].
pub fn coerce(value: &Value) -> QueryValue {
    match value {
        Value::Object(map) => QueryValue::Map(
            map
                .iter()
                .map(|(k, v)| (k.clone(), coerce(v)))
                .collect()
        ),
        Value::Array(items) => QueryValue::Array(
            items
                .iter()
                .map(coerce)
                .collect()
        ),
        Value::String(s) => coerce_str(s),
        Value::Null => QueryValue::Null,
        Value::Bool(b) => QueryValue::Bool(*b),
        Value::Number(n) => match n.as_f64() {
            Some(number) => QueryValue::Number(number),
            None => QueryValue::Json(value.clone()),
        },
    }
}

/// Applies the string rules of [`coerce`] to a single scalar.
pub fn coerce_str(raw: &str) -> QueryValue {
    match raw {
        "null" => return QueryValue::Null,
        "undefined" => return QueryValue::Undefined,
        "true" => return QueryValue::Bool(true),
        "false" => return QueryValue::Bool(false),
        _ => {}
    }

    if NUMERIC.is_match(raw) {
        let digits: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '-' || *c == '.')
            .collect();

        if let Ok(number) = digits.parse::<f64>() {
            return QueryValue::Number(number);
        }
    }

    if raw.len() >= 2 && raw.starts_with('/') && raw.ends_with('/') {
        return match Pattern::compile(&raw[1..raw.len() - 1]) {
            Some(pattern) => QueryValue::Regex(pattern),
            None => QueryValue::String(raw.to_string()),
        };
    }

    let looks_like_json = (raw.starts_with('{') && raw.ends_with('}'))
        || (raw.starts_with('[') && raw.ends_with(']'));

    if looks_like_json {
        if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
            return QueryValue::Json(parsed);
        }
    }

    QueryValue::String(raw.to_string())
}
