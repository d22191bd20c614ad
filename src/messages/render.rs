//! Render state - data structure sent from App layer to UI for rendering

use serde_json::Value;
use std::collections::HashMap;

use crate::form::FormSession;
use crate::messages::ui_events::{Mode, Panel};
use crate::models::{HttpMethod, Response};
use crate::tree::TreeState;

/// One endpoint row of the sidebar
#[derive(Debug, Clone)]
pub struct EndpointRow {
    pub method: HttpMethod,
    pub path: String,
    pub summary: Option<String>,
    pub deprecated: bool,
}

/// Generic selection-list overlay (variables, lookups, lookup results)
#[derive(Debug, Clone)]
pub struct PickerState {
    pub title: String,
    /// (value, display label) pairs
    pub items: Vec<(String, String)>,
    pub selected: usize,
}

impl PickerState {
    pub fn new(title: impl Into<String>, items: Vec<(String, String)>) -> Self {
        PickerState {
            title: title.into(),
            items,
            selected: 0,
        }
    }
}

/// Single-line (or pasted-text) input overlay
#[derive(Debug, Clone)]
pub struct PromptState {
    pub title: String,
    pub buffer: String,
}

impl PromptState {
    pub fn new(title: impl Into<String>) -> Self {
        PromptState {
            title: title.into(),
            buffer: String::new(),
        }
    }
}

/// Complete state needed by the UI to render
#[derive(Debug, Clone)]
pub struct RenderState {
    pub mode: Mode,
    pub active_panel: Panel,

    // Catalog
    pub catalog_title: Option<String>,
    pub endpoints: Vec<EndpointRow>,
    pub selected_endpoint: usize,

    // Form
    pub form: Option<FormSession>,
    pub variables: HashMap<String, String>,

    // Response
    pub response: Response,
    pub response_scroll: u16,
    pub is_loading: bool,

    // Overlays
    pub picker: Option<PickerState>,
    pub prompt: Option<PromptState>,
    pub tree_value: Option<Value>,
    pub tree: TreeState,

    // Status line
    pub status: String,
    pub history_index: Option<usize>,
}

impl Default for RenderState {
    fn default() -> Self {
        RenderState {
            mode: Mode::Main,
            active_panel: Panel::Endpoints,
            catalog_title: None,
            endpoints: Vec::new(),
            selected_endpoint: 0,
            form: None,
            variables: HashMap::new(),
            response: Response::default(),
            response_scroll: 0,
            is_loading: false,
            picker: None,
            prompt: None,
            tree_value: None,
            tree: TreeState::default(),
            status: String::new(),
            history_index: None,
        }
    }
}
