//! Form session - navigation and edit state machine over one field model
//!
//! Owns the flat value store, the collapse set and the focus cursor for a
//! single endpoint form. All transitions happen synchronously per input
//! event; the session never performs I/O.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::form::editors;
use crate::form::values::{self, FieldValues};
use crate::schema::{EditorKind, FieldDescriptor};

/// Non-schema field placed ahead of the schema sequence: the request URL
/// plus the endpoint's declared parameters
#[derive(Clone, Debug)]
pub struct BaseField {
    /// Key into the base value map
    pub key: String,
    pub label: String,
    pub required: bool,
    pub description: Option<String>,
}

/// Top-level editing state of the form
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMode {
    Navigate,
    Edit,
}

/// One position in the navigable sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavTarget {
    /// Index into `base_fields`
    Base(usize),
    /// Index into `descriptors`
    Field(usize),
    /// Synthetic submit target terminating the sequence
    Submit,
}

/// Result of activating the focused target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivateOutcome {
    /// Nothing to do, or a group was toggled
    Handled,
    /// Entered edit mode on the focused field
    Editing,
    /// The submit target was activated
    Submit,
}

#[derive(Clone, Debug)]
pub struct FormSession {
    /// Stable identity of the endpoint this form was built for
    pub endpoint_key: String,
    pub descriptors: Vec<FieldDescriptor>,
    pub values: FieldValues,
    pub base_fields: Vec<BaseField>,
    pub base_values: FieldValues,
    pub collapsed: HashSet<String>,
    pub focus: usize,
    pub mode: FormMode,
    /// Date editor: selected segment
    pub segment: usize,
    /// Date editor: typed-digit buffer
    pub digits: String,
}

impl FormSession {
    pub fn new(
        endpoint_key: impl Into<String>,
        base_fields: Vec<BaseField>,
        descriptors: Vec<FieldDescriptor>,
    ) -> Self {
        let values = values::initial_values(&descriptors);
        FormSession {
            endpoint_key: endpoint_key.into(),
            descriptors,
            values,
            base_fields,
            base_values: FieldValues::new(),
            collapsed: HashSet::new(),
            focus: 0,
            mode: FormMode::Navigate,
            segment: 0,
            digits: String::new(),
        }
    }

    // ========================
    // Navigable sequence
    // ========================

    fn under_collapsed(&self, key: &str) -> bool {
        self.collapsed
            .iter()
            .any(|c| key.starts_with(&format!("{}.", c)))
    }

    /// Base fields, collapse-filtered schema fields, then the submit target
    pub fn nav_targets(&self) -> Vec<NavTarget> {
        let mut targets: Vec<NavTarget> = (0..self.base_fields.len()).map(NavTarget::Base).collect();
        for (i, desc) in self.descriptors.iter().enumerate() {
            if !self.under_collapsed(&desc.full_key) {
                targets.push(NavTarget::Field(i));
            }
        }
        targets.push(NavTarget::Submit);
        targets
    }

    pub fn current_target(&self) -> NavTarget {
        let targets = self.nav_targets();
        targets[self.focus.min(targets.len() - 1)]
    }

    pub fn focused_descriptor(&self) -> Option<&FieldDescriptor> {
        match self.current_target() {
            NavTarget::Field(i) => self.descriptors.get(i),
            _ => None,
        }
    }

    /// Raw value of the focused field, if it holds one
    pub fn focused_value(&self) -> Option<&str> {
        match self.current_target() {
            NavTarget::Base(i) => self
                .base_fields
                .get(i)
                .map(|f| self.base_values.get(&f.key).map(String::as_str).unwrap_or("")),
            NavTarget::Field(i) => {
                let desc = self.descriptors.get(i)?;
                if desc.is_group {
                    return None;
                }
                Some(self.values.get(&desc.full_key).map(String::as_str).unwrap_or(""))
            }
            NavTarget::Submit => None,
        }
    }

    pub fn set_focused_value(&mut self, value: impl Into<String>) {
        match self.current_target() {
            NavTarget::Base(i) => {
                let key = self.base_fields[i].key.clone();
                self.base_values.insert(key, value.into());
            }
            NavTarget::Field(i) => {
                let desc = &self.descriptors[i];
                if !desc.is_group {
                    self.values.insert(desc.full_key.clone(), value.into());
                }
            }
            NavTarget::Submit => {}
        }
    }

    /// Circular forward movement; runs the smart-fill pass on the field
    /// being left when it is empty
    pub fn focus_next(&mut self, vars: &HashMap<String, String>, patterns: &HashMap<String, String>) {
        self.smart_fill(vars, patterns);
        let len = self.nav_targets().len();
        self.focus = (self.focus + 1) % len;
    }

    /// Circular backward movement
    pub fn focus_prev(&mut self) {
        let len = self.nav_targets().len();
        self.focus = (self.focus + len - 1) % len;
    }

    // ========================
    // Mode transitions
    // ========================

    /// Activate the focused target: leaves enter edit, group headers
    /// toggle their collapse membership and stay in navigate mode.
    pub fn activate(&mut self) -> ActivateOutcome {
        match self.current_target() {
            NavTarget::Submit => ActivateOutcome::Submit,
            NavTarget::Base(_) => {
                self.mode = FormMode::Edit;
                ActivateOutcome::Editing
            }
            NavTarget::Field(i) => {
                let desc = self.descriptors[i].clone();
                if desc.is_group {
                    if !self.collapsed.remove(&desc.full_key) {
                        self.collapsed.insert(desc.full_key.clone());
                    }
                    // The list may have shrunk behind the cursor
                    self.focus = self.focus.min(self.nav_targets().len() - 1);
                    return ActivateOutcome::Handled;
                }
                self.mode = FormMode::Edit;
                self.segment = 0;
                self.digits.clear();
                // Unset booleans start from a concrete value
                if desc.editor() == EditorKind::Boolean
                    && self.focused_value().unwrap_or("").is_empty()
                {
                    self.set_focused_value("true");
                }
                ActivateOutcome::Editing
            }
        }
    }

    /// Confirm exits edit mode and advances focus
    pub fn confirm_edit(
        &mut self,
        vars: &HashMap<String, String>,
        patterns: &HashMap<String, String>,
    ) {
        self.mode = FormMode::Navigate;
        self.focus_next(vars, patterns);
    }

    /// Cancel exits in place; edits already applied stay applied
    pub fn cancel_edit(&mut self) {
        self.mode = FormMode::Navigate;
    }

    // ========================
    // Edit-mode input
    // ========================

    fn focused_editor(&self) -> EditorKind {
        match self.current_target() {
            NavTarget::Base(_) => EditorKind::Text,
            NavTarget::Field(_) => self
                .focused_descriptor()
                .map(|d| d.editor())
                .unwrap_or(EditorKind::Text),
            NavTarget::Submit => EditorKind::Text,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        let current = self.focused_value().unwrap_or("").to_string();
        match self.focused_editor() {
            EditorKind::Text | EditorKind::Json => {
                self.set_focused_value(format!("{}{}", current, c));
            }
            EditorKind::Integer => {
                if editors::accepts_integer(&current, c) {
                    self.set_focused_value(format!("{}{}", current, c));
                }
            }
            EditorKind::Number => {
                if editors::accepts_number(&current, c) {
                    self.set_focused_value(format!("{}{}", current, c));
                }
            }
            EditorKind::Date | EditorKind::DateTime => {
                let has_time = self.focused_editor() == EditorKind::DateTime;
                let mut digits = std::mem::take(&mut self.digits);
                let (next, advanced) =
                    editors::type_digit(&current, self.segment, &mut digits, c, has_time);
                self.digits = digits;
                self.set_focused_value(next);
                if advanced {
                    let last = editors::segment_count(has_time) - 1;
                    self.segment = (self.segment + 1).min(last);
                }
            }
            // No free-text entry for toggled editors
            EditorKind::Boolean | EditorKind::Enum => {}
        }
    }

    pub fn handle_backspace(&mut self) {
        let current = self.focused_value().unwrap_or("").to_string();
        match self.focused_editor() {
            // Deletion clears a date entirely
            EditorKind::Date | EditorKind::DateTime => {
                self.set_focused_value("");
                self.segment = 0;
                self.digits.clear();
            }
            EditorKind::Boolean | EditorKind::Enum => self.set_focused_value(""),
            _ => {
                let mut s = current;
                s.pop();
                self.set_focused_value(s);
            }
        }
    }

    /// Vertical directional input: cycles toggles, steps date segments
    pub fn handle_step(&mut self, dir: i32) {
        let current = self.focused_value().unwrap_or("").to_string();
        let Some(desc) = self.focused_descriptor().cloned() else {
            return;
        };
        match desc.editor() {
            EditorKind::Boolean => {
                self.set_focused_value(editors::toggle_bool(&current, desc.nullable, dir));
            }
            EditorKind::Enum => {
                self.set_focused_value(editors::cycle_enum(
                    &current,
                    &desc.enum_values,
                    desc.nullable,
                    dir,
                ));
            }
            EditorKind::Date | EditorKind::DateTime => {
                let has_time = desc.editor() == EditorKind::DateTime;
                self.digits.clear();
                self.set_focused_value(editors::bump(
                    &current,
                    self.segment,
                    dir as i64,
                    has_time,
                ));
            }
            _ => {}
        }
    }

    /// Horizontal directional input: moves the date segment cursor
    pub fn handle_segment_move(&mut self, dir: i32) {
        let editor = self.focused_editor();
        let has_time = match editor {
            EditorKind::Date => false,
            EditorKind::DateTime => true,
            _ => return,
        };
        let last = editors::segment_count(has_time) as i32 - 1;
        self.segment = (self.segment as i32 + dir).clamp(0, last) as usize;
        self.digits.clear();
    }

    /// Set a date/date-time field to the current clock
    pub fn set_now(&mut self) {
        let has_time = match self.focused_editor() {
            EditorKind::Date => false,
            EditorKind::DateTime => true,
            _ => return,
        };
        self.set_focused_value(editors::now_string(has_time));
    }

    // ========================
    // Smart fill
    // ========================

    /// Fill the field being left when empty: schema example, then a
    /// case-insensitive variable-name match (inserted as a reference),
    /// then a trained field-name pattern, else leave blank.
    fn smart_fill(&mut self, vars: &HashMap<String, String>, patterns: &HashMap<String, String>) {
        if self.focused_value().map(str::is_empty) != Some(true) {
            return;
        }
        let (label, example) = match self.current_target() {
            NavTarget::Base(i) => (self.base_fields[i].label.clone(), None),
            NavTarget::Field(i) => {
                let desc = &self.descriptors[i];
                if desc.is_group {
                    return;
                }
                (desc.label.clone(), desc.example.clone())
            }
            NavTarget::Submit => return,
        };

        if let Some(example) = example {
            self.set_focused_value(example);
            return;
        }
        let lower = label.to_lowercase();
        if let Some(name) = vars.keys().find(|k| k.to_lowercase() == lower) {
            let token = format!("{{{{{}}}}}", name);
            self.set_focused_value(token);
            return;
        }
        if let Some(value) = patterns.get(&lower) {
            self.set_focused_value(value.clone());
        }
    }

    // ========================
    // Serialization boundary
    // ========================

    /// Nested body for submission; collapsed groups are excluded
    pub fn serialize_body(&self) -> Value {
        values::serialize(&self.descriptors, &self.values, &self.collapsed)
    }

    /// Replace the schema values from an external nested body
    pub fn import_body(&mut self, nested: &Value) {
        self.values = values::deserialize(&self.descriptors, nested);
    }

    /// Restore the flat snapshot of a history entry
    pub fn restore_snapshot(&mut self, snapshot: &FieldValues) {
        self.values = snapshot.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{build_fields, Resolver};
    use serde_json::json;

    fn session() -> FormSession {
        let schema = Resolver::empty().resolve(&json!({
            "type": "object",
            "properties": {
                "a": {
                    "type": "object",
                    "properties": {
                        "b": { "type": "string" },
                        "c": { "type": "integer" }
                    }
                },
                "flag": { "type": "boolean" }
            }
        }));
        FormSession::new(
            "GET /demo",
            vec![BaseField {
                key: "url".to_string(),
                label: "URL".to_string(),
                required: true,
                description: None,
            }],
            build_fields(&schema),
        )
    }

    fn no_vars() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_nav_sequence_shape() {
        let s = session();
        let targets = s.nav_targets();
        // url, group a, a.b, a.c, flag, submit
        assert_eq!(targets.len(), 6);
        assert_eq!(targets[0], NavTarget::Base(0));
        assert_eq!(*targets.last().unwrap(), NavTarget::Submit);
    }

    #[test]
    fn test_collapse_removes_exactly_descendants() {
        let mut s = session();
        s.focus = 1; // group "a"
        assert_eq!(s.activate(), ActivateOutcome::Handled);
        let targets = s.nav_targets();
        // url, collapsed group a, flag, submit
        assert_eq!(targets.len(), 4);
        assert!(s.collapsed.contains("a"));

        // Re-expanding restores the sequence
        assert_eq!(s.activate(), ActivateOutcome::Handled);
        assert_eq!(s.nav_targets().len(), 6);
    }

    #[test]
    fn test_focus_is_circular() {
        let mut s = session();
        let len = s.nav_targets().len();
        for _ in 0..len {
            s.focus_next(&no_vars(), &no_vars());
        }
        assert_eq!(s.focus, 0);
        s.focus_prev();
        assert_eq!(s.focus, len - 1);
    }

    #[test]
    fn test_group_never_enters_edit() {
        let mut s = session();
        s.focus = 1;
        s.activate();
        assert_eq!(s.mode, FormMode::Navigate);
    }

    #[test]
    fn test_boolean_pre_initializes_on_edit() {
        let mut s = session();
        s.focus = 4; // "flag"
        assert!(matches!(s.current_target(), NavTarget::Field(_)));
        s.activate();
        assert_eq!(s.mode, FormMode::Edit);
        assert_eq!(s.values.get("flag").unwrap(), "true");
    }

    #[test]
    fn test_integer_rejects_bad_chars() {
        let mut s = session();
        s.focus = 3; // a.c
        s.activate();
        s.handle_char('1');
        s.handle_char('x');
        s.handle_char('2');
        assert_eq!(s.values.get("a.c").unwrap(), "12");
    }

    #[test]
    fn test_confirm_advances_cancel_stays() {
        let mut s = session();
        s.focus = 2; // a.b
        s.activate();
        s.handle_char('h');
        s.confirm_edit(&no_vars(), &no_vars());
        assert_eq!(s.mode, FormMode::Navigate);
        assert_eq!(s.focus, 3);
        // The applied edit is not rolled back by cancel
        s.activate();
        s.cancel_edit();
        assert_eq!(s.focus, 3);
        assert_eq!(s.values.get("a.b").unwrap(), "h");
    }

    #[test]
    fn test_smart_fill_variable_reference() {
        let mut s = session();
        let mut vars = HashMap::new();
        vars.insert("FLAG".to_string(), "true".to_string());
        s.focus = 4; // "flag", empty
        s.focus_next(&vars, &no_vars());
        assert_eq!(s.values.get("flag").unwrap(), "{{FLAG}}");
    }

    #[test]
    fn test_smart_fill_pattern_fallback() {
        let mut s = session();
        let mut patterns = HashMap::new();
        patterns.insert("b".to_string(), "from-pattern".to_string());
        s.focus = 2; // a.b, empty, no example, no variable
        s.focus_next(&no_vars(), &patterns);
        assert_eq!(s.values.get("a.b").unwrap(), "from-pattern");
    }

    #[test]
    fn test_serialize_body_excludes_collapsed() {
        let mut s = session();
        s.values.insert("a.b".to_string(), "x".to_string());
        s.collapsed.insert("a".to_string());
        assert_eq!(s.serialize_body(), json!({}));
    }
}
