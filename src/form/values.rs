//! Value store and serializer - converts between the flat string-keyed
//! field map and nested JSON
//!
//! The store only ever holds raw strings; typed values are derived on
//! demand against the matching descriptor. Coercion never fails: an
//! unparsable value falls back to the raw string, so a second round-trip
//! is stable.

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use crate::schema::{BaseType, FieldDescriptor};

/// Flat `full_key -> raw string` map for one structured value instance
pub type FieldValues = HashMap<String, String>;

/// Coerce one raw string into its typed value.
///
/// `None` means absent (omit from output). The literal `"null"` is a JSON
/// null regardless of type.
pub fn coerce(raw: &str, desc: &FieldDescriptor) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }
    if raw == "null" {
        return Some(Value::Null);
    }

    if desc.is_array || matches!(desc.base, BaseType::Object | BaseType::Any) {
        return Some(
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
        );
    }

    let value = match desc.base {
        BaseType::Integer => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        BaseType::Number => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        BaseType::Boolean => Value::Bool(raw == "true"),
        _ => Value::String(raw.to_string()),
    };
    Some(value)
}

/// True when `key` or any ancestor group of it is collapsed
pub fn is_collapsed(key: &str, collapsed: &HashSet<String>) -> bool {
    collapsed
        .iter()
        .any(|c| key == c || key.starts_with(&format!("{}.", c)))
}

/// Serialize the flat value map into a nested JSON object.
///
/// Fields under a collapsed group are excluded. Returns `{}` when no
/// field produced a value.
pub fn serialize(
    descriptors: &[FieldDescriptor],
    values: &FieldValues,
    collapsed: &HashSet<String>,
) -> Value {
    let mut root = Map::new();

    for desc in descriptors.iter().filter(|d| !d.is_group) {
        if is_collapsed(&desc.full_key, collapsed) {
            continue;
        }
        let Some(raw) = values.get(&desc.full_key) else {
            continue;
        };
        if let Some(value) = coerce(raw, desc) {
            insert_at_path(&mut root, &desc.full_key, value);
        }
    }

    Value::Object(root)
}

/// Set `value` at a dot path, creating intermediate objects as needed
fn insert_at_path(root: &mut Map<String, Value>, path: &str, value: Value) {
    let mut parts = path.split('.').peekable();
    let mut current = root;

    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            current.insert(part.to_string(), value);
            return;
        }
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        // A colliding scalar at an intermediate key is replaced by a container
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        match entry.as_object_mut() {
            Some(map) => current = map,
            None => return,
        }
    }
}

/// Inverse of [`serialize`]: extract each descriptor's dot-path from a
/// nested value into its raw string form.
///
/// Used when importing an external request body or replaying history.
pub fn deserialize(descriptors: &[FieldDescriptor], nested: &Value) -> FieldValues {
    let mut values = FieldValues::new();

    for desc in descriptors.iter().filter(|d| !d.is_group) {
        let Some(found) = lookup_path(nested, &desc.full_key) else {
            continue;
        };
        if found.is_null() {
            continue;
        }
        let raw = match found {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        values.insert(desc.full_key.clone(), raw);
    }

    values
}

fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

/// Seed initial values: default > example > first enum value > unset
pub fn initial_values(descriptors: &[FieldDescriptor]) -> FieldValues {
    let mut values = FieldValues::new();

    for desc in descriptors.iter().filter(|d| !d.is_group) {
        let seed = desc
            .default
            .clone()
            .or_else(|| desc.example.clone())
            .or_else(|| desc.enum_values.first().cloned());
        if let Some(seed) = seed {
            values.insert(desc.full_key.clone(), seed);
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{build_fields, Resolver};
    use serde_json::json;

    fn descriptors(raw: serde_json::Value) -> Vec<FieldDescriptor> {
        build_fields(&Resolver::empty().resolve(&raw))
    }

    fn nested_schema() -> Vec<FieldDescriptor> {
        descriptors(json!({
            "type": "object",
            "properties": {
                "a": {
                    "type": "object",
                    "properties": {
                        "b": { "type": "string" },
                        "c": { "type": "integer" }
                    }
                }
            }
        }))
    }

    #[test]
    fn test_serialize_nested_scenario() {
        let descs = nested_schema();
        let mut values = FieldValues::new();
        values.insert("a.b".to_string(), "x".to_string());
        values.insert("a.c".to_string(), "5".to_string());

        let out = serialize(&descs, &values, &HashSet::new());
        assert_eq!(out, json!({ "a": { "b": "x", "c": 5 } }));
    }

    #[test]
    fn test_collapsed_group_excluded_from_output() {
        let descs = nested_schema();
        let mut values = FieldValues::new();
        values.insert("a.b".to_string(), "x".to_string());
        values.insert("a.c".to_string(), "5".to_string());

        let collapsed: HashSet<String> = ["a".to_string()].into();
        let out = serialize(&descs, &values, &collapsed);
        assert_eq!(out, json!({}));

        // Re-expanding restores the output
        let out = serialize(&descs, &values, &HashSet::new());
        assert_eq!(out, json!({ "a": { "b": "x", "c": 5 } }));
    }

    #[test]
    fn test_coerce_rules() {
        let descs = descriptors(json!({
            "type": "object",
            "properties": {
                "n": { "type": "integer" },
                "f": { "type": "number" },
                "b": { "type": "boolean" },
                "tags": { "type": "array", "items": { "type": "string" } }
            }
        }));
        let by_key = |k: &str| descs.iter().find(|d| d.full_key == k).unwrap();

        assert_eq!(coerce("", by_key("n")), None);
        assert_eq!(coerce("null", by_key("n")), Some(Value::Null));
        assert_eq!(coerce("42", by_key("n")), Some(json!(42)));
        // Unparsable numerics fall back to the raw string, never error
        assert_eq!(coerce("4x", by_key("n")), Some(json!("4x")));
        assert_eq!(coerce("2.5", by_key("f")), Some(json!(2.5)));
        assert_eq!(coerce("true", by_key("b")), Some(json!(true)));
        assert_eq!(coerce("TRUE", by_key("b")), Some(json!(false)));
        assert_eq!(coerce("[\"a\",\"b\"]", by_key("tags")), Some(json!(["a", "b"])));
        assert_eq!(coerce("not json", by_key("tags")), Some(json!("not json")));
    }

    #[test]
    fn test_round_trip_restores_values() {
        let descs = nested_schema();
        let mut values = FieldValues::new();
        values.insert("a.b".to_string(), "x".to_string());
        values.insert("a.c".to_string(), "5".to_string());

        let nested = serialize(&descs, &values, &HashSet::new());
        let back = deserialize(&descs, &nested);
        assert_eq!(back, values);
    }

    #[test]
    fn test_coerce_failed_values_stable_under_second_round_trip() {
        let descs = descriptors(json!({
            "type": "object",
            "properties": { "n": { "type": "integer" } }
        }));
        let mut values = FieldValues::new();
        values.insert("n".to_string(), "oops".to_string());

        let once = deserialize(&descs, &serialize(&descs, &values, &HashSet::new()));
        let twice = deserialize(&descs, &serialize(&descs, &once, &HashSet::new()));
        assert_eq!(once, twice);
        assert_eq!(once.get("n").unwrap(), "oops");
    }

    #[test]
    fn test_deserialize_skips_null_and_missing() {
        let descs = nested_schema();
        let values = deserialize(&descs, &json!({ "a": { "b": null } }));
        assert!(values.is_empty());
    }

    #[test]
    fn test_initial_values_priority() {
        let descs = descriptors(json!({
            "type": "object",
            "properties": {
                "p": { "type": "integer", "default": 1, "example": 2 },
                "q": { "type": "string", "example": "ex" },
                "r": { "type": "string", "enum": ["first", "second"] },
                "s": { "type": "string" }
            }
        }));

        let values = initial_values(&descs);
        assert_eq!(values.get("p").unwrap(), "1");
        assert_eq!(values.get("q").unwrap(), "ex");
        assert_eq!(values.get("r").unwrap(), "first");
        assert!(!values.contains_key("s"));
    }
}
