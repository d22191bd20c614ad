//! App state - pure data structure with no I/O logic

use serde_json::Value;
use std::collections::HashMap;

use crate::catalog::{ApiCatalog, AuthRequirement};
use crate::form::FormSession;
use crate::messages::render::{EndpointRow, PickerState, PromptState};
use crate::messages::ui_events::{Mode, Panel};
use crate::messages::RenderState;
use crate::models::{Lookup, Request, Response};
use crate::schema::FieldDescriptor;
use crate::storage::Storage;
use crate::tree::TreeState;

/// Main application state - pure data, no I/O
pub struct AppState {
    // Top-level mode and panel focus
    pub mode: Mode,
    pub active_panel: Panel,

    // Catalog
    pub catalog: Option<ApiCatalog>,
    pub selected_endpoint: usize,

    // Form session for the selected endpoint
    pub form: Option<FormSession>,
    /// Auth requirement of the selected endpoint
    pub endpoint_auth: AuthRequirement,
    /// Session-scoped field-model cache keyed by endpoint key
    pub field_models: HashMap<String, Vec<FieldDescriptor>>,

    // Response
    pub response: Response,
    pub response_json: Option<Value>,
    pub response_scroll: u16,

    // Request lifecycle
    pub is_loading: bool,
    pub next_request_id: u64,
    pub pending_request_id: Option<u64>,
    pub pending_lookup_id: Option<u64>,
    /// Lookup whose response is being awaited, for path extraction
    pub pending_lookup: Option<Lookup>,
    /// Last request sent, seeds lookup definitions saved from the tree
    pub last_request: Option<Request>,

    // Overlays
    pub picker: Option<PickerState>,
    pub prompt: Option<PromptState>,
    /// Lookup path pending a name in SaveLookup mode
    pub pending_lookup_path: Option<String>,
    /// Stringified node value pending a name in CaptureName mode
    pub capture_value: Option<String>,

    // Tree navigator over the last JSON response
    pub tree: TreeState,

    // History
    pub history_index: Option<usize>,

    // Storage (persisted data)
    pub storage: Storage,

    // Transient status line
    pub status: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            mode: Mode::Main,
            active_panel: Panel::Endpoints,
            catalog: None,
            selected_endpoint: 0,
            form: None,
            endpoint_auth: AuthRequirement::None,
            field_models: HashMap::new(),
            response: Response::default(),
            response_json: None,
            response_scroll: 0,
            is_loading: false,
            next_request_id: 1,
            pending_request_id: None,
            pending_lookup_id: None,
            pending_lookup: None,
            last_request: None,
            picker: None,
            prompt: None,
            pending_lookup_path: None,
            capture_value: None,
            tree: TreeState::default(),
            history_index: None,
            storage: Storage::new(),
            status: String::new(),
        }
    }

    /// Generate a unique request ID
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        let endpoints = self
            .catalog
            .as_ref()
            .map(|c| {
                c.endpoints
                    .iter()
                    .map(|ep| EndpointRow {
                        method: ep.method,
                        path: ep.path.clone(),
                        summary: ep.summary.clone(),
                        deprecated: ep.deprecated,
                    })
                    .collect()
            })
            .unwrap_or_default();

        RenderState {
            mode: self.mode,
            active_panel: self.active_panel,
            catalog_title: self.catalog.as_ref().and_then(|c| c.title.clone()),
            endpoints,
            selected_endpoint: self.selected_endpoint,
            form: self.form.clone(),
            variables: self.storage.variables.variables.clone(),
            response: self.response.clone(),
            response_scroll: self.response_scroll,
            is_loading: self.is_loading,
            picker: self.picker.clone(),
            prompt: self.prompt.clone(),
            tree_value: self.response_json.clone(),
            tree: self.tree.clone(),
            status: self.status.clone(),
            history_index: self.history_index,
        }
    }
}
