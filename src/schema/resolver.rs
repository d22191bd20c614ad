//! Schema resolution - normalizes raw schema JSON into canonical nodes
//!
//! Handles `allOf` merging, nullable unions (`anyOf`/`oneOf` with a null
//! branch) and `$ref` indirection against a definitions table. Pure: the
//! resolver holds only the immutable definitions map.

use serde_json::Value;
use std::collections::HashMap;

use crate::constants::MAX_RESOLVE_DEPTH;

/// Shape of a canonical schema node
#[derive(Clone, Debug, PartialEq)]
pub enum SchemaKind {
    Object {
        /// Declared order preserved
        properties: Vec<(String, SchemaNode)>,
        required: Vec<String>,
    },
    Array {
        items: Box<SchemaNode>,
    },
    String,
    Integer,
    Number,
    Boolean,
    /// Unknown or unresolvable shape; edited as free JSON text
    Any,
}

/// A schema node with composition, unions and refs resolved away
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub nullable: bool,
    pub enum_values: Vec<String>,
    pub format: Option<String>,
    pub description: Option<String>,
    pub example: Option<Value>,
    pub default: Option<Value>,
    /// Terminal `$ref` name, used as a display type for object leaves
    pub title: Option<String>,
}

impl Default for SchemaNode {
    fn default() -> Self {
        SchemaNode {
            kind: SchemaKind::Any,
            nullable: false,
            enum_values: Vec::new(),
            format: None,
            description: None,
            example: None,
            default: None,
            title: None,
        }
    }
}

impl SchemaNode {
    pub fn is_object(&self) -> bool {
        matches!(self.kind, SchemaKind::Object { .. })
    }

    /// Object properties, if any
    pub fn properties(&self) -> Option<&[(String, SchemaNode)]> {
        match &self.kind {
            SchemaKind::Object { properties, .. } => Some(properties),
            _ => None,
        }
    }

    pub fn is_required(&self, name: &str) -> bool {
        match &self.kind {
            SchemaKind::Object { required, .. } => required.iter().any(|r| r == name),
            _ => false,
        }
    }
}

/// Resolves raw schema values against a definitions table
pub struct Resolver {
    definitions: HashMap<String, Value>,
}

impl Resolver {
    pub fn new(definitions: HashMap<String, Value>) -> Self {
        Resolver { definitions }
    }

    /// Resolver with no definitions; `$ref`s fall soft to `any`
    pub fn empty() -> Self {
        Resolver {
            definitions: HashMap::new(),
        }
    }

    /// Resolve a raw schema value into a canonical node.
    ///
    /// Never fails: anything unrecognized degrades to `SchemaKind::Any`.
    /// Resolving a node without composition markers is structurally 1:1,
    /// so re-resolving canonical output is a no-op.
    pub fn resolve(&self, raw: &Value) -> SchemaNode {
        self.resolve_at(raw, 0)
    }

    fn resolve_at(&self, raw: &Value, depth: usize) -> SchemaNode {
        if depth > MAX_RESOLVE_DEPTH {
            return SchemaNode::default();
        }

        // $ref indirection first: the referenced schema carries the shape,
        // the terminal name becomes the display title
        if let Some(ref_path) = raw.get("$ref").and_then(|r| r.as_str()) {
            let name = ref_path.rsplit('/').next().unwrap_or(ref_path);
            let mut node = match self.definitions.get(name) {
                Some(def) => self.resolve_at(&def.clone(), depth + 1),
                None => SchemaNode::default(),
            };
            node.title = Some(name.to_string());
            return node;
        }

        // allOf: merge every branch, later declarations win
        if let Some(branches) = raw.get("allOf").and_then(|v| v.as_array()) {
            return self.resolve_all_of(raw, branches, depth);
        }

        // anyOf/oneOf: only the nullable-union form is supported; exactly
        // one null marker unwraps to the other branch with nullable set
        if let Some(branches) = raw
            .get("anyOf")
            .or_else(|| raw.get("oneOf"))
            .and_then(|v| v.as_array())
        {
            return self.resolve_union(branches, depth);
        }

        self.resolve_plain(raw, depth)
    }

    fn resolve_all_of(&self, raw: &Value, branches: &[Value], depth: usize) -> SchemaNode {
        let mut properties: Vec<(String, SchemaNode)> = Vec::new();
        let mut required: Vec<String> = Vec::new();
        let mut merged = SchemaNode {
            kind: SchemaKind::Any,
            ..Default::default()
        };
        let mut saw_object = false;

        for branch in branches {
            let node = self.resolve_at(branch, depth + 1);
            merged.nullable |= node.nullable;
            if node.description.is_some() {
                merged.description = node.description.clone();
            }
            if node.title.is_some() {
                merged.title = node.title.clone();
            }
            match node.kind {
                SchemaKind::Object {
                    properties: props,
                    required: reqs,
                } => {
                    saw_object = true;
                    for (name, prop) in props {
                        if let Some(slot) = properties.iter_mut().find(|(n, _)| *n == name) {
                            slot.1 = prop;
                        } else {
                            properties.push((name, prop));
                        }
                    }
                    for r in reqs {
                        if !required.contains(&r) {
                            required.push(r);
                        }
                    }
                }
                // Non-object branch in a composition: last one wins wholesale
                other => {
                    if !saw_object {
                        merged.kind = other;
                        merged.enum_values = node.enum_values;
                        merged.format = node.format;
                    }
                }
            }
        }

        if saw_object {
            merged.kind = SchemaKind::Object {
                properties,
                required,
            };
        }
        // Annotations on the composite node itself override branch ones
        apply_annotations(&mut merged, raw);
        merged
    }

    fn resolve_union(&self, branches: &[Value], depth: usize) -> SchemaNode {
        let non_null: Vec<&Value> = branches.iter().filter(|b| !is_null_marker(b)).collect();
        let has_null = non_null.len() < branches.len();

        match non_null.as_slice() {
            [single] => {
                let mut node = self.resolve_at(single, depth + 1);
                node.nullable |= has_null;
                node
            }
            // No non-null alternative, or a genuine multi-variant union:
            // fail soft rather than guess a shape
            _ => SchemaNode {
                kind: SchemaKind::Any,
                nullable: true,
                ..Default::default()
            },
        }
    }

    fn resolve_plain(&self, raw: &Value, depth: usize) -> SchemaNode {
        let mut node = SchemaNode::default();
        apply_annotations(&mut node, raw);

        // `type: ["string", "null"]` is the inline form of a nullable union
        let type_str = match raw.get("type") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Array(types)) => {
                let named: Vec<&str> = types
                    .iter()
                    .filter_map(|t| t.as_str())
                    .filter(|t| *t != "null")
                    .collect();
                node.nullable |= named.len() < types.len();
                named.first().map(|s| s.to_string())
            }
            _ => None,
        };
        if raw.get("nullable").and_then(|v| v.as_bool()) == Some(true) {
            node.nullable = true;
        }

        node.kind = match type_str.as_deref() {
            Some("string") => SchemaKind::String,
            Some("integer") => SchemaKind::Integer,
            Some("number") => SchemaKind::Number,
            Some("boolean") => SchemaKind::Boolean,
            Some("array") => {
                let items = raw
                    .get("items")
                    .map(|i| self.resolve_at(i, depth + 1))
                    .unwrap_or_default();
                SchemaKind::Array {
                    items: Box::new(items),
                }
            }
            Some("object") => self.resolve_object(raw, depth),
            // An untyped node that still declares properties is an object
            None if raw.get("properties").is_some() => self.resolve_object(raw, depth),
            None if !node.enum_values.is_empty() => SchemaKind::String,
            _ => SchemaKind::Any,
        };
        node
    }

    fn resolve_object(&self, raw: &Value, depth: usize) -> SchemaKind {
        let required: Vec<String> = raw
            .get("required")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|r| r.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        let mut properties = Vec::new();
        if let Some(props) = raw.get("properties").and_then(|v| v.as_object()) {
            for (name, prop) in props {
                properties.push((name.clone(), self.resolve_at(prop, depth + 1)));
            }
        }

        SchemaKind::Object {
            properties,
            required,
        }
    }
}

/// Copy constraint/hint annotations off a raw schema node
fn apply_annotations(node: &mut SchemaNode, raw: &Value) {
    if let Some(values) = raw.get("enum").and_then(|v| v.as_array()) {
        node.enum_values = values
            .iter()
            .filter(|v| !v.is_null())
            .map(enum_label)
            .collect();
        if values.iter().any(|v| v.is_null()) {
            node.nullable = true;
        }
    }
    if let Some(fmt) = raw.get("format").and_then(|v| v.as_str()) {
        node.format = Some(fmt.to_string());
    }
    if let Some(desc) = raw.get("description").and_then(|v| v.as_str()) {
        node.description = Some(desc.to_string());
    }
    if let Some(title) = raw.get("title").and_then(|v| v.as_str()) {
        node.title = Some(title.to_string());
    }
    if let Some(example) = raw
        .get("example")
        .or_else(|| raw.get("examples").and_then(|e| e.as_array()?.first()))
    {
        node.example = Some(example.clone());
    }
    if let Some(default) = raw.get("default") {
        node.default = Some(default.clone());
    }
}

fn enum_label(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// True for the union branches that only mark nullability
fn is_null_marker(raw: &Value) -> bool {
    if raw.get("type").and_then(|t| t.as_str()) == Some("null") {
        return true;
    }
    if let Some(values) = raw.get("enum").and_then(|v| v.as_array()) {
        return !values.is_empty() && values.iter().all(|v| v.is_null());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_plain_object() {
        let raw = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "age": { "type": "integer" }
            },
            "required": ["name"]
        });

        let node = Resolver::empty().resolve(&raw);
        let props = node.properties().unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].0, "name");
        assert!(node.is_required("name"));
        assert!(!node.is_required("age"));
    }

    #[test]
    fn test_resolve_is_idempotent_on_plain_nodes() {
        let raw = json!({ "type": "string", "format": "date" });
        let resolver = Resolver::empty();
        let once = resolver.resolve(&raw);
        let twice = resolver.resolve(&raw);
        assert_eq!(once, twice);
        assert_eq!(once.kind, SchemaKind::String);
        assert_eq!(once.format.as_deref(), Some("date"));
    }

    #[test]
    fn test_all_of_merges_properties_last_wins() {
        let raw = json!({
            "allOf": [
                {
                    "type": "object",
                    "properties": { "id": { "type": "integer" }, "tag": { "type": "string" } },
                    "required": ["id"]
                },
                {
                    "type": "object",
                    "properties": { "tag": { "type": "boolean" } },
                    "required": ["tag"]
                }
            ]
        });

        let node = Resolver::empty().resolve(&raw);
        let props = node.properties().unwrap();
        assert_eq!(props.len(), 2);
        let tag = &props.iter().find(|(n, _)| n == "tag").unwrap().1;
        assert_eq!(tag.kind, SchemaKind::Boolean);
        assert!(node.is_required("id"));
        assert!(node.is_required("tag"));
    }

    #[test]
    fn test_nullable_union_unwraps() {
        let raw = json!({
            "anyOf": [
                { "type": "string", "format": "date-time" },
                { "type": "null" }
            ]
        });

        let node = Resolver::empty().resolve(&raw);
        assert_eq!(node.kind, SchemaKind::String);
        assert!(node.nullable);
        assert_eq!(node.format.as_deref(), Some("date-time"));
    }

    #[test]
    fn test_union_without_non_null_branch_fails_soft() {
        let raw = json!({ "anyOf": [ { "type": "null" } ] });
        let node = Resolver::empty().resolve(&raw);
        assert_eq!(node.kind, SchemaKind::Any);
        assert!(node.nullable);
    }

    #[test]
    fn test_ref_resolves_with_terminal_title() {
        let mut defs = HashMap::new();
        defs.insert(
            "User".to_string(),
            json!({
                "type": "object",
                "properties": { "email": { "type": "string" } }
            }),
        );
        let raw = json!({ "$ref": "#/components/schemas/User" });

        let node = Resolver::new(defs).resolve(&raw);
        assert!(node.is_object());
        assert_eq!(node.title.as_deref(), Some("User"));
    }

    #[test]
    fn test_unknown_ref_falls_back_to_any() {
        let raw = json!({ "$ref": "#/components/schemas/Missing" });
        let node = Resolver::empty().resolve(&raw);
        assert_eq!(node.kind, SchemaKind::Any);
        assert_eq!(node.title.as_deref(), Some("Missing"));
    }

    #[test]
    fn test_self_referential_schema_bottoms_out() {
        let mut defs = HashMap::new();
        defs.insert(
            "Node".to_string(),
            json!({
                "type": "object",
                "properties": { "next": { "$ref": "#/$defs/Node" } }
            }),
        );
        // Must terminate; the innermost level degrades to any
        let node = Resolver::new(defs).resolve(&json!({ "$ref": "#/$defs/Node" }));
        assert!(node.is_object());
    }

    #[test]
    fn test_type_array_with_null_marks_nullable() {
        let raw = json!({ "type": ["integer", "null"] });
        let node = Resolver::empty().resolve(&raw);
        assert_eq!(node.kind, SchemaKind::Integer);
        assert!(node.nullable);
    }

    #[test]
    fn test_enum_values_extracted() {
        let raw = json!({ "type": "string", "enum": ["red", "green", null] });
        let node = Resolver::empty().resolve(&raw);
        assert_eq!(node.enum_values, vec!["red", "green"]);
        assert!(node.nullable);
    }
}
