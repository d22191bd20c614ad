//! Rendering helpers shared by the draw functions

use ratatui::{prelude::*, widgets::*};
use serde_json::Value;
use std::collections::HashMap;

use crate::form::{FormSession, NavTarget};
use crate::schema::EditorKind;
use crate::tree::TreeNode;
use crate::vars;

/// Status code color
pub fn status_color(code: u16) -> Color {
    match code {
        200..=299 => Color::Green,
        300..=399 => Color::Cyan,
        400..=499 => Color::Red,
        500..=599 => Color::Magenta,
        _ => Color::Yellow,
    }
}

/// Method color
pub fn method_color(method: &str) -> Color {
    match method {
        "GET" => Color::Green,
        "POST" => Color::Yellow,
        "PUT" => Color::Blue,
        "PATCH" => Color::Cyan,
        "DELETE" => Color::Red,
        _ => Color::White,
    }
}

/// Simple JSON syntax highlighting for the response panel
pub fn highlight_json(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for line in text.lines() {
        let mut spans = Vec::new();
        let mut current = String::new();
        let mut in_string = false;

        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            match c {
                '"' => {
                    current.push(c);
                    if in_string {
                        // Closing quote: key if a colon follows
                        let is_key = chars[i + 1..]
                            .iter()
                            .find(|c| !c.is_whitespace())
                            .map(|c| *c == ':')
                            .unwrap_or(false);
                        let color = if is_key { Color::Cyan } else { Color::Green };
                        spans.push(Span::styled(
                            std::mem::take(&mut current),
                            Style::default().fg(color),
                        ));
                        in_string = false;
                    } else {
                        let lead = current[..current.len() - 1].to_string();
                        if !lead.is_empty() {
                            spans.push(plain_span(lead));
                        }
                        current = String::from('"');
                        in_string = true;
                    }
                }
                ':' if !in_string => {
                    if !current.is_empty() {
                        spans.push(plain_span(std::mem::take(&mut current)));
                    }
                    spans.push(Span::raw(":"));
                }
                '{' | '}' | '[' | ']' if !in_string => {
                    if !current.is_empty() {
                        spans.push(plain_span(std::mem::take(&mut current)));
                    }
                    spans.push(Span::styled(
                        c.to_string(),
                        Style::default().fg(Color::Yellow),
                    ));
                }
                _ => current.push(c),
            }
            i += 1;
        }
        if !current.is_empty() {
            spans.push(plain_span(current));
        }

        lines.push(Line::from(spans));
    }

    lines
}

fn plain_span(text: String) -> Span<'static> {
    let trimmed = text.trim();
    let style = if trimmed == "true" || trimmed == "false" || trimmed == "null" {
        Style::default().fg(Color::Magenta)
    } else if trimmed
        .trim_end_matches(',')
        .chars()
        .all(|c| c.is_ascii_digit() || c == '-' || c == '.')
        && trimmed.chars().any(|c| c.is_ascii_digit())
    {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Span::styled(text, style)
}

/// Display form of a field value: tokens resolved, unset marked
pub fn field_display_value(raw: &str, variables: &HashMap<String, String>) -> String {
    if raw.is_empty() {
        return String::from("—");
    }
    vars::resolve_tokens(raw, variables)
}

/// Build the rows of the form panel, one per navigable target
pub fn form_rows<'a>(
    form: &FormSession,
    variables: &HashMap<String, String>,
) -> Vec<ListItem<'a>> {
    form.nav_targets()
        .iter()
        .map(|target| match *target {
            NavTarget::Base(i) => {
                let field = &form.base_fields[i];
                let raw = form
                    .base_values
                    .get(&field.key)
                    .map(String::as_str)
                    .unwrap_or("");
                let marker = if field.required { "*" } else { " " };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{}{:<14}", marker, field.label),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::raw(field_display_value(raw, variables)),
                ]))
            }
            NavTarget::Field(i) => {
                let desc = &form.descriptors[i];
                let pad = "  ".repeat(desc.indent);
                if desc.is_group {
                    let glyph = if form.collapsed.contains(&desc.full_key) {
                        "▸"
                    } else {
                        "▾"
                    };
                    ListItem::new(Line::from(vec![Span::styled(
                        format!(" {}{} {}", pad, glyph, desc.label),
                        Style::default().fg(Color::Blue).bold(),
                    )]))
                } else {
                    let raw = form
                        .values
                        .get(&desc.full_key)
                        .map(String::as_str)
                        .unwrap_or("");
                    let marker = if desc.required { "*" } else { " " };
                    ListItem::new(Line::from(vec![
                        Span::raw(format!("{}{}", marker, pad)),
                        Span::raw(format!("{:<14}", desc.label)),
                        Span::styled(
                            format!("{:<12}", desc.type_label()),
                            Style::default().fg(Color::DarkGray),
                        ),
                        Span::raw(field_display_value(raw, variables)),
                    ]))
                }
            }
            NavTarget::Submit => ListItem::new(Line::from(Span::styled(
                " [ Submit request ]",
                Style::default().fg(Color::Green).bold(),
            ))),
        })
        .collect()
}

/// Hint line for the editor currently active on the focused field
pub fn editor_hint(form: &FormSession) -> &'static str {
    let Some(desc) = form.focused_descriptor() else {
        return "type to edit | Enter:confirm | Esc:cancel";
    };
    match desc.editor() {
        EditorKind::Boolean | EditorKind::Enum => "↑/↓:cycle | Enter:confirm | Esc:cancel",
        EditorKind::Date | EditorKind::DateTime => {
            "←/→:segment | ↑/↓:step | digits:overwrite | Ctrl+N:now | Backspace:clear"
        }
        EditorKind::Integer | EditorKind::Number => "digits only | Enter:confirm | Esc:cancel",
        _ => "type to edit | Enter:confirm | Esc:cancel",
    }
}

/// One row of the tree view
pub fn tree_row<'a>(node: &TreeNode, is_match: bool) -> Line<'a> {
    let pad = "  ".repeat(node.depth);
    let glyph = if node.expandable { "▸" } else { "·" };
    let preview = match &node.value {
        Value::Object(_) => format!("{{{}}}", node.child_count),
        Value::Array(_) => format!("[{}]", node.child_count),
        Value::String(s) => format!("\"{}\"", s),
        other => other.to_string(),
    };
    let key_style = if is_match {
        Style::default().fg(Color::Yellow).bold()
    } else {
        Style::default().fg(Color::Cyan)
    };
    Line::from(vec![
        Span::raw(format!("{}{} ", pad, glyph)),
        Span::styled(node.key.clone(), key_style),
        Span::raw(": "),
        Span::styled(preview, Style::default().fg(Color::Gray)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_display_resolves_tokens() {
        let mut variables = HashMap::new();
        variables.insert("id".to_string(), "42".to_string());
        assert_eq!(field_display_value("{{id}}", &variables), "42");
        assert_eq!(field_display_value("", &variables), "—");
        let empty = HashMap::new();
        assert_eq!(field_display_value("{{id}}", &empty), "{{id}}");
    }

    #[test]
    fn test_highlight_json_shapes() {
        let lines = highlight_json("{\n  \"a\": 1\n}");
        assert_eq!(lines.len(), 3);
    }
}
