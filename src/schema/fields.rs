//! Field model builder - flattens a canonical schema into an ordered,
//! dot-keyed list of editable field descriptors
//!
//! Nesting is expanded up to `MAX_FIELD_DEPTH`; anything deeper becomes an
//! opaque object/array leaf edited as JSON text. A group header always
//! immediately precedes its children, and children are contiguous, so the
//! navigable sequence and the serializer can both walk the list linearly.

use serde_json::Value;

use crate::constants::MAX_FIELD_DEPTH;
use crate::schema::resolver::{SchemaKind, SchemaNode};

/// Coercion type of a field value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaseType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Any,
}

impl BaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseType::String => "string",
            BaseType::Integer => "integer",
            BaseType::Number => "number",
            BaseType::Boolean => "boolean",
            BaseType::Object => "object",
            BaseType::Any => "any",
        }
    }
}

/// Input-handling capability of a field, selected once per descriptor and
/// shared by the render and input paths
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorKind {
    Boolean,
    Enum,
    Date,
    DateTime,
    Integer,
    Number,
    /// Structured leaf (object/array/any) edited as JSON text
    Json,
    Text,
}

/// One editable leaf or group node of a flattened schema
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    /// Display name (schema property name)
    pub label: String,
    /// Dot-notation path from the value root, unique and stable
    pub full_key: String,
    pub base: BaseType,
    pub is_array: bool,
    pub nullable: bool,
    pub required: bool,
    /// Nesting depth, 0 = top level
    pub indent: usize,
    /// Group headers carry no value, only a collapse toggle
    pub is_group: bool,
    pub enum_values: Vec<String>,
    pub format: Option<String>,
    pub description: Option<String>,
    pub example: Option<String>,
    pub default: Option<String>,
    /// Ref title shown instead of `object` for typed object leaves
    pub type_name: Option<String>,
}

impl FieldDescriptor {
    /// Render the type column, e.g. `string?`, `integer[]`, `User`
    pub fn type_label(&self) -> String {
        let base = match (&self.base, &self.type_name) {
            (BaseType::Object, Some(name)) => name.clone(),
            (base, _) => base.as_str().to_string(),
        };
        let mut label = base;
        if self.is_array {
            label.push_str("[]");
        }
        if self.nullable {
            label.push('?');
        }
        label
    }

    /// Select the editor capability for this field
    pub fn editor(&self) -> EditorKind {
        if self.is_array || matches!(self.base, BaseType::Object | BaseType::Any) {
            return EditorKind::Json;
        }
        if self.base == BaseType::Boolean {
            return EditorKind::Boolean;
        }
        if !self.enum_values.is_empty() {
            return EditorKind::Enum;
        }
        match (self.base, self.format.as_deref()) {
            (BaseType::String, Some("date")) => EditorKind::Date,
            (BaseType::String, Some("date-time")) => EditorKind::DateTime,
            (BaseType::Integer, _) => EditorKind::Integer,
            (BaseType::Number, _) => EditorKind::Number,
            _ => EditorKind::Text,
        }
    }
}

/// Flatten a resolved schema into an ordered descriptor list.
///
/// Non-object roots produce an empty model: there is nothing to lay out
/// as a form, and the caller falls back to a raw body editor.
pub fn build_fields(schema: &SchemaNode) -> Vec<FieldDescriptor> {
    let mut out = Vec::new();
    push_object_fields(schema, "", 0, &mut out);
    out
}

fn push_object_fields(node: &SchemaNode, prefix: &str, depth: usize, out: &mut Vec<FieldDescriptor>) {
    let Some(properties) = node.properties() else {
        return;
    };

    for (name, prop) in properties {
        let full_key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        let required = node.is_required(name);

        let has_children = prop
            .properties()
            .map(|props| !props.is_empty())
            .unwrap_or(false);

        if has_children && depth < MAX_FIELD_DEPTH {
            out.push(FieldDescriptor {
                label: name.clone(),
                full_key: full_key.clone(),
                base: BaseType::Object,
                is_array: false,
                nullable: prop.nullable,
                required,
                indent: depth,
                is_group: true,
                enum_values: Vec::new(),
                format: None,
                description: prop.description.clone(),
                example: None,
                default: None,
                type_name: prop.title.clone(),
            });
            push_object_fields(prop, &full_key, depth + 1, out);
        } else {
            out.push(leaf_descriptor(name, &full_key, prop, required, depth));
        }
    }
}

fn leaf_descriptor(
    name: &str,
    full_key: &str,
    prop: &SchemaNode,
    required: bool,
    depth: usize,
) -> FieldDescriptor {
    // Arrays take their element type; everything else maps directly.
    // Object-with-properties reaching here means the depth cap was hit,
    // so the subtree collapses into an opaque leaf.
    let (effective, is_array) = match &prop.kind {
        SchemaKind::Array { items } => (items.as_ref(), true),
        _ => (prop, false),
    };

    let base = match &effective.kind {
        SchemaKind::String => BaseType::String,
        SchemaKind::Integer => BaseType::Integer,
        SchemaKind::Number => BaseType::Number,
        SchemaKind::Boolean => BaseType::Boolean,
        SchemaKind::Object { .. } => BaseType::Object,
        SchemaKind::Any => BaseType::Any,
        // Array of arrays: opaque
        SchemaKind::Array { .. } => BaseType::Any,
    };

    FieldDescriptor {
        label: name.to_string(),
        full_key: full_key.to_string(),
        base,
        is_array,
        nullable: prop.nullable || effective.nullable,
        required,
        indent: depth,
        is_group: false,
        enum_values: effective.enum_values.clone(),
        format: effective.format.clone(),
        description: prop.description.clone().or_else(|| effective.description.clone()),
        example: prop
            .example
            .as_ref()
            .or(effective.example.as_ref())
            .map(value_to_raw),
        default: prop
            .default
            .as_ref()
            .or(effective.default.as_ref())
            .map(value_to_raw),
        type_name: effective.title.clone(),
    }
}

/// String form a value takes inside the flat value store
fn value_to_raw(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Resolver;
    use serde_json::json;

    fn fields_for(raw: serde_json::Value) -> Vec<FieldDescriptor> {
        build_fields(&Resolver::empty().resolve(&raw))
    }

    #[test]
    fn test_flat_object_declared_order() {
        let fields = fields_for(json!({
            "type": "object",
            "properties": {
                "zeta": { "type": "string" },
                "alpha": { "type": "integer" }
            },
            "required": ["zeta"]
        }));

        let keys: Vec<&str> = fields.iter().map(|f| f.full_key.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert!(fields[0].required);
        assert!(!fields[1].required);
    }

    #[test]
    fn test_group_header_precedes_contiguous_children() {
        let fields = fields_for(json!({
            "type": "object",
            "properties": {
                "a": {
                    "type": "object",
                    "properties": {
                        "b": { "type": "string" },
                        "c": { "type": "integer" }
                    }
                },
                "d": { "type": "boolean" }
            }
        }));

        let keys: Vec<&str> = fields.iter().map(|f| f.full_key.as_str()).collect();
        assert_eq!(keys, vec!["a", "a.b", "a.c", "d"]);
        assert!(fields[0].is_group);
        assert_eq!(fields[1].indent, 1);
        assert_eq!(fields[3].indent, 0);
    }

    #[test]
    fn test_depth_cap_collapses_to_opaque_leaf() {
        let fields = fields_for(json!({
            "type": "object",
            "properties": {
                "l1": {
                    "type": "object",
                    "properties": {
                        "l2": {
                            "type": "object",
                            "properties": {
                                "l3": {
                                    "type": "object",
                                    "properties": { "deep": { "type": "string" } }
                                }
                            }
                        }
                    }
                }
            }
        }));

        let l3 = fields.iter().find(|f| f.full_key == "l1.l2.l3").unwrap();
        assert!(!l3.is_group);
        assert_eq!(l3.base, BaseType::Object);
        assert!(!fields.iter().any(|f| f.full_key.contains("deep")));
    }

    #[test]
    fn test_array_type_recurses_into_items() {
        let fields = fields_for(json!({
            "type": "object",
            "properties": {
                "tags": { "type": "array", "items": { "type": "string" } }
            }
        }));

        assert_eq!(fields[0].base, BaseType::String);
        assert!(fields[0].is_array);
        assert_eq!(fields[0].type_label(), "string[]");
        assert_eq!(fields[0].editor(), EditorKind::Json);
    }

    #[test]
    fn test_editor_selection() {
        let fields = fields_for(json!({
            "type": "object",
            "properties": {
                "active": { "type": "boolean" },
                "color": { "type": "string", "enum": ["red", "green"] },
                "born": { "type": "string", "format": "date" },
                "seen": { "type": "string", "format": "date-time" },
                "count": { "type": "integer" },
                "ratio": { "type": "number" },
                "note": { "type": "string" }
            }
        }));

        let editors: Vec<EditorKind> = fields.iter().map(|f| f.editor()).collect();
        assert_eq!(
            editors,
            vec![
                EditorKind::Boolean,
                EditorKind::Enum,
                EditorKind::Date,
                EditorKind::DateTime,
                EditorKind::Integer,
                EditorKind::Number,
                EditorKind::Text,
            ]
        );
    }

    #[test]
    fn test_nullable_suffix_in_type_label() {
        let fields = fields_for(json!({
            "type": "object",
            "properties": {
                "nick": { "anyOf": [ { "type": "string" }, { "type": "null" } ] }
            }
        }));
        assert_eq!(fields[0].type_label(), "string?");
        assert!(fields[0].nullable);
    }

    #[test]
    fn test_defaults_and_examples_seeded_as_strings() {
        let fields = fields_for(json!({
            "type": "object",
            "properties": {
                "port": { "type": "integer", "default": 8080 },
                "host": { "type": "string", "example": "api.local" }
            }
        }));
        assert_eq!(fields[0].default.as_deref(), Some("8080"));
        assert_eq!(fields[1].example.as_deref(), Some("api.local"));
    }
}
