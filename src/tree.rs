//! Tree navigator - collapse-aware, searchable view over an arbitrary
//! JSON value
//!
//! The visible node list is derived fresh on every render from the raw
//! value and the collapse set; nothing but the collapse set, cursor and
//! search state persists between inputs. A navigated position can be
//! translated into the index-independent lookup path syntax.

use serde_json::Value;
use std::collections::HashSet;

/// One visible row of the flattened tree
#[derive(Clone, Debug)]
pub struct TreeNode {
    /// Reconstructable address, e.g. `root.fields[2].id`
    pub path: String,
    /// Display key: property name, `[i]` for array elements, `root`
    pub key: String,
    pub value: Value,
    pub depth: usize,
    pub expandable: bool,
    pub child_count: usize,
}

/// Expandable iff a non-empty array or a non-empty object
fn expandable(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => false,
    }
}

fn child_count(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => 0,
    }
}

/// Pre-order flattening of `value`, descending only into nodes whose
/// path is absent from `collapsed`
pub fn build_visible(value: &Value, collapsed: &HashSet<String>) -> Vec<TreeNode> {
    let mut nodes = Vec::new();
    push_node(value, "root", "root", 0, collapsed, &mut nodes);
    nodes
}

fn push_node(
    value: &Value,
    path: &str,
    key: &str,
    depth: usize,
    collapsed: &HashSet<String>,
    out: &mut Vec<TreeNode>,
) {
    out.push(TreeNode {
        path: path.to_string(),
        key: key.to_string(),
        value: value.clone(),
        depth,
        expandable: expandable(value),
        child_count: child_count(value),
    });

    if !expandable(value) || collapsed.contains(path) {
        return;
    }

    match value {
        Value::Object(map) => {
            for (name, child) in map {
                let child_path = format!("{}.{}", path, name);
                push_node(child, &child_path, name, depth + 1, collapsed, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                let child_path = format!("{}[{}]", path, i);
                let child_key = format!("[{}]", i);
                push_node(child, &child_path, &child_key, depth + 1, collapsed, out);
            }
        }
        _ => {}
    }
}

/// Translate a navigator path into lookup-path syntax: the leading
/// `root` segment is dropped and every bracketed index becomes a bare
/// `[]`, so `root.a[0].b` yields `a[].b`.
pub fn to_lookup_path(path: &str) -> String {
    let trimmed = path
        .strip_prefix("root")
        .map(|rest| rest.strip_prefix('.').unwrap_or(rest))
        .unwrap_or(path);

    let mut out = String::with_capacity(trimmed.len());
    let mut chars = trimmed.chars();
    while let Some(c) = chars.next() {
        if c == '[' {
            for c in chars.by_ref() {
                if c == ']' {
                    break;
                }
            }
            out.push_str("[]");
        } else {
            out.push(c);
        }
    }
    out
}

/// Does a node match an incremental search query?
///
/// Keys match on a case-insensitive contains; leaf string/number/boolean
/// nodes also match on their stringified value.
fn node_matches(node: &TreeNode, query: &str) -> bool {
    let query = query.to_lowercase();
    if node.key.to_lowercase().contains(&query) {
        return true;
    }
    if node.expandable {
        return false;
    }
    match &node.value {
        Value::String(s) => s.to_lowercase().contains(&query),
        Value::Number(n) => n.to_string().contains(&query),
        Value::Bool(b) => b.to_string().contains(&query),
        _ => false,
    }
}

/// Cursor, collapse, scroll and search state for one tree view session
#[derive(Clone, Debug, Default)]
pub struct TreeState {
    pub collapsed: HashSet<String>,
    pub cursor: usize,
    pub scroll: usize,
    /// Live query while the search prompt is open
    pub query: String,
    pub searching: bool,
    /// Ordered visible-list indices of the current matches
    pub matches: Vec<usize>,
    pub match_pos: usize,
}

impl TreeState {
    pub fn selected<'a>(&self, nodes: &'a [TreeNode]) -> Option<&'a TreeNode> {
        nodes.get(self.cursor)
    }

    // ========================
    // Cursor movement
    // ========================

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self, len: usize) {
        if len > 0 && self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    /// Keep the cursor inside a viewport of `height` rows
    pub fn follow_cursor(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + height {
            self.scroll = self.cursor + 1 - height;
        }
    }

    /// Clamp after the visible list shrank (collapse, new value)
    pub fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    // ========================
    // Collapse
    // ========================

    /// Toggle the selected node; leaves do nothing
    pub fn toggle(&mut self, nodes: &[TreeNode]) {
        let Some(node) = self.selected(nodes) else {
            return;
        };
        if !node.expandable {
            return;
        }
        let path = node.path.clone();
        if !self.collapsed.remove(&path) {
            self.collapsed.insert(path);
        }
    }

    /// Collapse the selected node when expanded; otherwise step out to
    /// the nearest ancestor (first prior node at a strictly lower depth)
    pub fn collapse_or_step_out(&mut self, nodes: &[TreeNode]) {
        let Some(node) = self.selected(nodes) else {
            return;
        };
        if node.expandable && !self.collapsed.contains(&node.path) {
            self.collapsed.insert(node.path.clone());
            return;
        }
        let depth = node.depth;
        let mut i = self.cursor;
        while i > 0 {
            i -= 1;
            if nodes[i].depth < depth {
                self.cursor = i;
                return;
            }
        }
    }

    // ========================
    // Search
    // ========================

    pub fn start_search(&mut self) {
        self.searching = true;
        self.query.clear();
        self.matches.clear();
        self.match_pos = 0;
    }

    pub fn cancel_search(&mut self) {
        self.searching = false;
        self.query.clear();
        self.matches.clear();
    }

    /// Recompute the ordered match list for the live query
    pub fn update_matches(&mut self, nodes: &[TreeNode]) {
        self.matches = if self.query.is_empty() {
            Vec::new()
        } else {
            nodes
                .iter()
                .enumerate()
                .filter(|(_, n)| node_matches(n, &self.query))
                .map(|(i, _)| i)
                .collect()
        };
        self.match_pos = 0;
    }

    pub fn search_char(&mut self, c: char, nodes: &[TreeNode]) {
        self.query.push(c);
        self.update_matches(nodes);
    }

    pub fn search_backspace(&mut self, nodes: &[TreeNode]) {
        self.query.pop();
        self.update_matches(nodes);
    }

    /// Close the prompt and jump to the first match
    pub fn confirm_search(&mut self) {
        self.searching = false;
        if let Some(&first) = self.matches.first() {
            self.cursor = first;
            self.match_pos = 0;
        }
    }

    pub fn next_match(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        self.match_pos = (self.match_pos + 1) % self.matches.len();
        self.cursor = self.matches[self.match_pos];
    }

    pub fn prev_match(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        self.match_pos = (self.match_pos + self.matches.len() - 1) % self.matches.len();
        self.cursor = self.matches[self.match_pos];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "fields": [
                { "id": "7" },
                { "id": "9" }
            ],
            "total": 2
        })
    }

    #[test]
    fn test_build_visible_preorder() {
        let nodes = build_visible(&sample(), &HashSet::new());
        let paths: Vec<&str> = nodes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "root",
                "root.fields",
                "root.fields[0]",
                "root.fields[0].id",
                "root.fields[1]",
                "root.fields[1].id",
                "root.total",
            ]
        );
        assert_eq!(nodes[1].child_count, 2);
        assert!(nodes[1].expandable);
        assert!(!nodes[6].expandable);
        assert_eq!(nodes[3].depth, 3);
    }

    #[test]
    fn test_collapsed_path_hides_descendants() {
        let collapsed: HashSet<String> = ["root.fields".to_string()].into();
        let nodes = build_visible(&sample(), &collapsed);
        let paths: Vec<&str> = nodes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["root", "root.fields", "root.total"]);
    }

    #[test]
    fn test_empty_containers_are_leaves() {
        let nodes = build_visible(&json!({ "a": {}, "b": [] }), &HashSet::new());
        assert!(!nodes[1].expandable);
        assert!(!nodes[2].expandable);
    }

    #[test]
    fn test_cursor_clamped_round_trip() {
        let nodes = build_visible(&sample(), &HashSet::new());
        let mut state = TreeState::default();
        let n = nodes.len() - 1;
        for _ in 0..n {
            state.move_down(nodes.len());
        }
        assert_eq!(state.cursor, n);
        // Moving past the end stays clamped
        state.move_down(nodes.len());
        assert_eq!(state.cursor, n);
        for _ in 0..n {
            state.move_up();
        }
        assert_eq!(state.cursor, 0);
        state.move_up();
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn test_scroll_follows_cursor() {
        let mut state = TreeState::default();
        state.cursor = 10;
        state.follow_cursor(5);
        assert_eq!(state.scroll, 6);
        state.cursor = 2;
        state.follow_cursor(5);
        assert_eq!(state.scroll, 2);
    }

    #[test]
    fn test_toggle_leaf_is_noop() {
        let nodes = build_visible(&sample(), &HashSet::new());
        let mut state = TreeState::default();
        state.cursor = 6; // root.total
        state.toggle(&nodes);
        assert!(state.collapsed.is_empty());
    }

    #[test]
    fn test_step_out_finds_nearest_ancestor() {
        let nodes = build_visible(&sample(), &HashSet::new());
        let mut state = TreeState::default();
        state.cursor = 3; // root.fields[0].id - a leaf
        state.collapse_or_step_out(&nodes);
        assert_eq!(nodes[state.cursor].path, "root.fields[0]");
        // Expanded ancestor collapses first, then steps out
        state.collapse_or_step_out(&nodes);
        assert!(state.collapsed.contains("root.fields[0]"));
        state.collapse_or_step_out(&nodes);
        assert_eq!(nodes[state.cursor].path, "root.fields");
    }

    #[test]
    fn test_search_matches_keys_and_leaf_values() {
        let nodes = build_visible(&sample(), &HashSet::new());
        let mut state = TreeState::default();
        state.start_search();
        for c in "id".chars() {
            state.search_char(c, &nodes);
        }
        // Both id leaves match on key
        assert_eq!(state.matches.len(), 2);
        state.confirm_search();
        assert_eq!(nodes[state.cursor].path, "root.fields[0].id");

        state.start_search();
        state.search_char('9', &nodes);
        assert_eq!(state.matches.len(), 1);
        state.confirm_search();
        assert_eq!(nodes[state.cursor].path, "root.fields[1].id");
    }

    #[test]
    fn test_match_cycling_is_circular() {
        let nodes = build_visible(&sample(), &HashSet::new());
        let mut state = TreeState::default();
        state.start_search();
        for c in "id".chars() {
            state.search_char(c, &nodes);
        }
        state.confirm_search();
        let first = state.cursor;
        state.next_match();
        let second = state.cursor;
        assert_ne!(first, second);
        state.next_match();
        assert_eq!(state.cursor, first);
        state.prev_match();
        assert_eq!(state.cursor, second);
    }

    #[test]
    fn test_lookup_path_translation() {
        assert_eq!(to_lookup_path("root.fields[1].id"), "fields[].id");
        assert_eq!(to_lookup_path("root"), "");
        assert_eq!(to_lookup_path("root[3].x"), "[].x");
    }
}
