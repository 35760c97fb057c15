//! Query-string parameter nesting.
//!
//! Decoded `key=value` pairs are folded into a JSON object the way browser-side query
//! builders encode them:
//!
//! - `a[b][c]=x` nests objects, at most [`MAX_DEPTH`] levels below the top key. Deeper
//!   brackets stay part of the innermost key.
//! - `a[]=x` and repeated keys (`a=x&a=y`) build arrays.
//! - `a[0]=x` addresses an array element for indices up to [`ARRAY_LIMIT`]; larger
//!   indices are object keys.
//! - Dots are never split: `a.b=x` is the key `a.b`.
//!
//! When a key is used with two incompatible shapes (`a=x&a[b]=y`) the later one wins.
//! Values stay strings; typing them is the coercer's job.

use serde_json::{Map, Value};

pub const MAX_DEPTH: usize = 5;
pub const ARRAY_LIMIT: usize = 20;

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Key(&'a str),
    Index(usize),
    Append,
}

impl<'a> Segment<'a> {
    fn from_brackets(inner: &'a str) -> Self {
        if inner.is_empty() {
            return Segment::Append;
        }
        match inner.parse::<usize>() {
            Ok(index) if index <= ARRAY_LIMIT => Segment::Index(index),
            _ => Segment::Key(inner),
        }
    }
}

/// Folds decoded query pairs into a nested parameter object, keeping first-seen order.
pub fn parse_pairs<'a, I>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut params = Map::new();

    for (key, value) in pairs {
        let (base, segments) = split_key(key);
        let slot = params
            .entry(base.to_string())
            .or_insert(Value::Null);

        assign(slot, &segments, Value::String(value.to_string()));
    }

    params
}

fn split_key(key: &str) -> (&str, Vec<Segment<'_>>) {
    let Some(open) = key.find('[') else {
        return (key, vec![]);
    };
    if open == 0 || !key[open..].contains(']') {
        return (key, vec![]);
    }

    let base = &key[..open];
    let mut rest = &key[open..];
    let mut segments = Vec::new();

    while segments.len() < MAX_DEPTH && rest.starts_with('[') {
        let Some(close) = rest.find(']') else {
            break;
        };
        segments.push(Segment::from_brackets(&rest[1..close]));
        rest = &rest[close + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Key(rest));
    }

    (base, segments)
}

fn assign(slot: &mut Value, segments: &[Segment<'_>], value: Value) {
    let Some((segment, rest)) = segments.split_first() else {
        merge_leaf(slot, value);
        return;
    };

    let child = match segment {
        Segment::Key(key) => object_slot(slot, key),
        Segment::Index(index) if slot.is_object() => object_slot(slot, &index.to_string()),
        Segment::Index(index) => {
            let items = array_of(slot);
            if *index >= items.len() {
                items.push(Value::Null);
            }
            let position = (*index).min(items.len() - 1);
            &mut items[position]
        }
        Segment::Append => {
            let items = array_of(slot);
            items.push(Value::Null);
            let last = items.len() - 1;
            &mut items[last]
        }
    };

    assign(child, rest, value);
}

fn merge_leaf(slot: &mut Value, value: Value) {
    match slot {
        Value::Null => *slot = value,
        Value::Array(items) => items.push(value),
        Value::String(_) => {
            let previous = slot.take();
            *slot = Value::Array(vec![previous, value]);
        }
        other => *other = value,
    }
}

fn object_slot<'s>(slot: &'s mut Value, key: &str) -> &'s mut Value {
    if !slot.is_object() {
        *slot = match slot.take() {
            Value::Array(items) => Value::Object(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| (index.to_string(), item))
                    .collect(),
            ),
            _ => Value::Object(Map::new()),
        };
    }

    match slot {
        Value::Object(entries) => entries
            .entry(key.to_string())
            .or_insert(Value::Null),
        _ => unreachable!("slot was just made an object"),
    }
}

fn array_of(slot: &mut Value) -> &mut Vec<Value> {
    if !slot.is_array() {
        *slot = match slot.take() {
            Value::Null => Value::Array(vec![]),
            scalar @ Value::String(_) => Value::Array(vec![scalar]),
            _ => Value::Array(vec![]),
        };
    }

    match slot {
        Value::Array(items) => items,
        _ => unreachable!("slot was just made an array"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(pairs: &[(&str, &str)]) -> Value {
        Value::Object(parse_pairs(pairs.iter().copied()))
    }

    #[test]
    fn flat_pairs_stay_flat() {
        assert_eq!(
            parse(&[("status", "open"), ("a.b", "1")]),
            json!({ "status": "open", "a.b": "1" })
        );
    }

    #[test]
    fn brackets_nest_objects() {
        assert_eq!(
            parse(&[("amount[$gte]", "10"), ("amount[$lt]", "20"), ("meta[tags][kind]", "x")]),
            json!({
                "amount": { "$gte": "10", "$lt": "20" },
                "meta": { "tags": { "kind": "x" } },
            })
        );
    }

    #[test]
    fn repeated_and_appended_keys_build_arrays() {
        assert_eq!(
            parse(&[("tag", "a"), ("tag", "b"), ("tag", "c"), ("id[]", "1"), ("id[]", "2")]),
            json!({ "tag": ["a", "b", "c"], "id": ["1", "2"] })
        );
    }

    #[test]
    fn indices_address_array_elements() {
        assert_eq!(
            parse(&[("a[0][name]", "x"), ("a[0][age]", "3"), ("a[1][name]", "y"), ("b[99]", "z")]),
            json!({
                "a": [{ "name": "x", "age": "3" }, { "name": "y" }],
                "b": { "99": "z" },
            })
        );
    }

    #[test]
    fn nesting_stops_at_the_depth_limit() {
        assert_eq!(
            parse(&[("a[b][c][d][e][f][g]", "x")]),
            json!({ "a": { "b": { "c": { "d": { "e": { "f": { "[g]": "x" } } } } } } })
        );
    }

    #[test]
    fn malformed_brackets_are_literal_keys() {
        assert_eq!(
            parse(&[("a[b", "1"), ("[c]", "2")]),
            json!({ "a[b": "1", "[c]": "2" })
        );
    }

    #[test]
    fn later_shapes_replace_earlier_ones() {
        assert_eq!(parse(&[("a", "x"), ("a[b]", "y")]), json!({ "a": { "b": "y" } }));
    }
}
