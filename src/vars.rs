//! Variable and lookup resolution
//!
//! `{{name}}` tokens are resolved for display by literal substring
//! replacement against the live variable dictionary; unresolved tokens
//! stay intact. The lookup path language extracts parallel value/label
//! lists out of an arbitrary response body.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([A-Za-z0-9_.-]+)\}\}").expect("static pattern"))
}

/// Substitute `{{name}}` tokens with their bound values, display only.
/// Unbound tokens are left as-is.
pub fn resolve_tokens(text: &str, vars: &HashMap<String, String>) -> String {
    let mut result = text.to_string();
    for (key, value) in vars {
        let pattern = format!("{{{{{}}}}}", key);
        result = result.replace(&pattern, value);
    }
    result
}

/// Names of all tokens referenced in a value, bound or not
pub fn token_names(text: &str) -> Vec<String> {
    token_re()
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

pub fn has_token(text: &str) -> bool {
    token_re().is_match(text)
}

/// Append a `{{name}}` reference to a field value
pub fn insert_token(value: &str, name: &str) -> String {
    format!("{}{{{{{}}}}}", value, name)
}

// ========================
// Lookup paths
// ========================

/// Resolve a lookup path against a JSON body.
///
/// Syntax (stable, shared with saved lookup definitions): segments are
/// joined by `.`; a segment ending in `[]` names a property holding an
/// array and expands it, continuing per element; an empty segment name
/// means "the current element" (supports root-level arrays). Always
/// yields a list; missing intermediate keys drop that branch.
pub fn resolve_path(body: &Value, path: &str) -> Vec<Value> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut results = Vec::new();
    walk_path(body, &segments, &mut results);
    results
}

fn walk_path(current: &Value, segments: &[&str], out: &mut Vec<Value>) {
    let Some((segment, rest)) = segments.split_first() else {
        out.push(current.clone());
        return;
    };

    if let Some(name) = segment.strip_suffix("[]") {
        let target = if name.is_empty() {
            Some(current)
        } else {
            current.get(name)
        };
        if let Some(Value::Array(items)) = target {
            for item in items {
                walk_path(item, rest, out);
            }
        }
        return;
    }

    if segment.is_empty() {
        walk_path(current, rest, out);
        return;
    }

    if let Some(next) = current.get(*segment) {
        walk_path(next, rest, out);
    }
}

/// String form used for captured/picked values: strings unquoted, other
/// primitives as-is, containers as compact JSON
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Extract parallel (value, label) picker choices from a lookup response.
/// Labels fall back to the value when the label path is absent or its
/// list does not line up.
pub fn lookup_choices(
    body: &Value,
    value_path: &str,
    label_path: Option<&str>,
) -> Vec<(String, String)> {
    let values: Vec<String> = resolve_path(body, value_path).iter().map(stringify).collect();
    let labels: Vec<String> = label_path
        .map(|p| resolve_path(body, p).iter().map(stringify).collect())
        .unwrap_or_default();

    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            let label = labels.get(i).cloned().unwrap_or_else(|| v.clone());
            (v, label)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_tokens_literal_replacement() {
        let mut vars = HashMap::new();
        vars.insert("host".to_string(), "api.local".to_string());
        assert_eq!(
            resolve_tokens("https://{{host}}/v1/{{id}}", &vars),
            "https://api.local/v1/{{id}}"
        );
    }

    #[test]
    fn test_token_scanning() {
        assert_eq!(token_names("{{a}} and {{b_2}}"), vec!["a", "b_2"]);
        assert!(has_token("x{{tok}}y"));
        assert!(!has_token("{ not a token }"));
    }

    #[test]
    fn test_insert_token_appends() {
        assert_eq!(insert_token("prefix-", "id"), "prefix-{{id}}");
    }

    #[test]
    fn test_lookup_path_array_expansion() {
        let body = json!({ "fields": [ { "id": "7" }, { "id": "9" } ] });
        let values = resolve_path(&body, "fields[].id");
        assert_eq!(values, vec![json!("7"), json!("9")]);
    }

    #[test]
    fn test_lookup_path_non_array_target_is_single_element_list() {
        let body = json!({ "meta": { "total": 3 } });
        assert_eq!(resolve_path(&body, "meta.total"), vec![json!(3)]);
    }

    #[test]
    fn test_lookup_path_root_level_array() {
        let body = json!([ { "name": "a" }, { "name": "b" } ]);
        let values = resolve_path(&body, "[].name");
        assert_eq!(values, vec![json!("a"), json!("b")]);
    }

    #[test]
    fn test_lookup_path_missing_keys_drop_branch() {
        let body = json!({ "items": [ { "id": 1 }, { "other": 2 }, { "id": 3 } ] });
        let values = resolve_path(&body, "items[].id");
        assert_eq!(values, vec![json!(1), json!(3)]);
        assert!(resolve_path(&body, "nope[].id").is_empty());
    }

    #[test]
    fn test_lookup_choices_with_labels() {
        let body = json!({
            "users": [
                { "id": "u1", "name": "Ada" },
                { "id": "u2", "name": "Grace" }
            ]
        });
        let choices = lookup_choices(&body, "users[].id", Some("users[].name"));
        assert_eq!(
            choices,
            vec![
                ("u1".to_string(), "Ada".to_string()),
                ("u2".to_string(), "Grace".to_string())
            ]
        );
    }

    #[test]
    fn test_lookup_choices_label_fallback() {
        let body = json!({ "ids": [1, 2] });
        let choices = lookup_choices(&body, "ids[]", None);
        assert_eq!(
            choices,
            vec![
                ("1".to_string(), "1".to_string()),
                ("2".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_stringify_forms() {
        assert_eq!(stringify(&json!("plain")), "plain");
        assert_eq!(stringify(&json!(4.5)), "4.5");
        assert_eq!(stringify(&json!({ "a": 1 })), r#"{"a":1}"#);
    }
}
