//! Command handlers - business logic for processing UI events

use chrono::Utc;

use crate::app::AppState;
use crate::catalog::{AuthRequirement, Endpoint, ParameterLocation};
use crate::constants::DEFAULT_BASE_URL;
use crate::curl;
use crate::form::{ActivateOutcome, BaseField, FormSession, NavTarget};
use crate::messages::render::{PickerState, PromptState};
use crate::messages::ui_events::{LookupStep, Mode, Panel};
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::models::{AuthType, HistoryEntry, Lookup, Request};
use crate::schema::{build_fields, Resolver};
use crate::tree::{self, TreeState};
use crate::vars;

impl AppState {
    // ========================
    // Navigation
    // ========================

    pub fn next_panel(&mut self) {
        self.active_panel = self.active_panel.next();
    }

    pub fn prev_panel(&mut self) {
        self.active_panel = self.active_panel.prev();
    }

    pub fn endpoint_up(&mut self) {
        let count = self.catalog.as_ref().map(|c| c.endpoints.len()).unwrap_or(0);
        if count > 0 {
            self.selected_endpoint = self
                .selected_endpoint
                .checked_sub(1)
                .unwrap_or(count - 1);
        }
    }

    pub fn endpoint_down(&mut self) {
        let count = self.catalog.as_ref().map(|c| c.endpoints.len()).unwrap_or(0);
        if count > 0 {
            self.selected_endpoint = (self.selected_endpoint + 1) % count;
        }
    }

    /// Build (or reuse from the session cache) the field model for the
    /// selected endpoint and start a fresh form session on it
    pub fn select_endpoint(&mut self) {
        let (endpoint, base_url, definitions) = {
            let Some(catalog) = &self.catalog else {
                return;
            };
            let Some(ep) = catalog.endpoints.get(self.selected_endpoint) else {
                return;
            };
            (ep.clone(), catalog.base_url.clone(), catalog.definitions.clone())
        };

        let key = endpoint.key();
        let descriptors = match self.field_models.get(&key) {
            Some(cached) => cached.clone(),
            None => {
                let resolver = Resolver::new(definitions);
                let built = endpoint
                    .body_schema
                    .as_ref()
                    .map(|raw| build_fields(&resolver.resolve(raw)))
                    .unwrap_or_default();
                self.field_models.insert(key.clone(), built.clone());
                built
            }
        };

        let mut base_fields = vec![BaseField {
            key: "url".to_string(),
            label: "URL".to_string(),
            required: true,
            description: None,
        }];
        for param in &endpoint.parameters {
            if param.location == ParameterLocation::Header {
                continue;
            }
            base_fields.push(BaseField {
                key: param.name.clone(),
                label: param.name.clone(),
                required: param.required,
                description: param.description.clone(),
            });
        }

        let mut form = FormSession::new(key, base_fields, descriptors);
        let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        form.base_values.insert(
            "url".to_string(),
            format!("{}{}", base.trim_end_matches('/'), endpoint.path),
        );
        for param in &endpoint.parameters {
            if let Some(default) = &param.default {
                form.base_values.insert(param.name.clone(), default.clone());
            }
        }

        self.endpoint_auth = endpoint.auth.clone();
        self.form = Some(form);
        self.active_panel = Panel::Form;
        self.history_index = None;
        self.response.body = endpoint_summary(&endpoint);
        self.response.status_code = None;
        self.status.clear();
    }

    // ========================
    // Form commands
    // ========================

    pub fn form_focus_next(&mut self) {
        let vars = self.storage.variables.variables.clone();
        let patterns = self.storage.patterns.clone();
        if let Some(form) = &mut self.form {
            form.focus_next(&vars, &patterns);
        }
    }

    pub fn form_focus_prev(&mut self) {
        if let Some(form) = &mut self.form {
            form.focus_prev();
        }
    }

    /// Activate the focused target; the synthetic submit target turns
    /// into a network command
    pub fn form_activate(&mut self) -> Option<NetworkCommand> {
        let outcome = self.form.as_mut()?.activate();
        if outcome == ActivateOutcome::Submit {
            return self.prepare_request();
        }
        None
    }

    pub fn form_confirm_edit(&mut self) {
        let vars = self.storage.variables.variables.clone();
        let patterns = self.storage.patterns.clone();
        if let Some(form) = &mut self.form {
            form.confirm_edit(&vars, &patterns);
        }
    }

    pub fn form_cancel_edit(&mut self) {
        if let Some(form) = &mut self.form {
            form.cancel_edit();
        }
    }

    pub fn form_char(&mut self, c: char) {
        if let Some(form) = &mut self.form {
            form.handle_char(c);
        }
    }

    pub fn form_backspace(&mut self) {
        if let Some(form) = &mut self.form {
            form.handle_backspace();
        }
    }

    pub fn form_step(&mut self, dir: i32) {
        if let Some(form) = &mut self.form {
            form.handle_step(dir);
        }
    }

    pub fn form_segment_move(&mut self, dir: i32) {
        if let Some(form) = &mut self.form {
            form.handle_segment_move(dir);
        }
    }

    pub fn form_set_now(&mut self) {
        if let Some(form) = &mut self.form {
            form.set_now();
        }
    }

    pub fn clear_field(&mut self) {
        if let Some(form) = &mut self.form {
            let Some(value) = form.focused_value() else {
                return;
            };
            if vars::has_token(value) {
                self.status = format!(
                    "Cleared reference to {}",
                    vars::token_names(value).join(", ")
                );
            }
            form.set_focused_value("");
        }
    }

    /// Remember the focused field's value as the fill for its name
    pub fn train_pattern(&mut self) {
        let Some(form) = &self.form else {
            return;
        };
        let label = match form.current_target() {
            NavTarget::Base(i) => form.base_fields[i].label.clone(),
            NavTarget::Field(i) => {
                let desc = &form.descriptors[i];
                if desc.is_group {
                    return;
                }
                desc.label.clone()
            }
            NavTarget::Submit => return,
        };
        let value = form.focused_value().unwrap_or("").to_string();
        if value.is_empty() {
            self.status = "Nothing to remember for this field".to_string();
            return;
        }
        self.storage.train_pattern(&label, value.clone());
        self.status = format!("Remembered '{}' for fields named '{}'", value, label);
    }

    // ========================
    // Request assembly & submission
    // ========================

    /// Assemble the request from the form. Rejected while a call is
    /// already outstanding.
    pub fn prepare_request(&mut self) -> Option<NetworkCommand> {
        if self.is_loading {
            self.status = "A request is already in flight".to_string();
            return None;
        }
        let request = self.assemble_request()?;
        self.last_request = Some(request.clone());

        self.is_loading = true;
        self.response.body = String::from("Loading...");
        self.response.status_code = None;

        let id = self.next_id();
        self.pending_request_id = Some(id);

        Some(NetworkCommand::ExecuteRequest {
            id,
            request,
            variables: self.storage.variables.variables.clone(),
        })
    }

    fn assemble_request(&mut self) -> Option<Request> {
        let form = self.form.as_ref()?;
        let endpoint = self.catalog.as_ref().and_then(|c| {
            c.endpoints
                .iter()
                .find(|e| e.key() == form.endpoint_key)
                .cloned()
        })?;

        let url = assemble_url(form);

        let body = if endpoint.method.has_body() {
            let nested = form.serialize_body();
            let empty = nested.as_object().map(|m| m.is_empty()).unwrap_or(true);
            if empty {
                String::new()
            } else {
                serde_json::to_string_pretty(&nested).unwrap_or_else(|_| "{}".to_string())
            }
        } else {
            String::new()
        };

        // Endpoint auth is satisfied through the variable dictionary
        let auth = match &self.endpoint_auth {
            AuthRequirement::Bearer => AuthType::Bearer("{{token}}".to_string()),
            AuthRequirement::Basic => AuthType::Basic {
                username: "{{username}}".to_string(),
                password: "{{password}}".to_string(),
            },
            _ => AuthType::None,
        };

        Some(Request {
            method: endpoint.method,
            url,
            headers: Request::default().headers,
            body,
            auth,
        })
    }

    /// Render the assembled request as a copyable cURL command
    pub fn export_curl(&mut self) {
        if let Some(request) = self.assemble_request() {
            self.response.body = curl::to_curl(&request);
            self.response.status_code = None;
            self.status = "Rendered as cURL".to_string();
        }
    }

    // ========================
    // Response handling
    // ========================

    pub fn handle_response(&mut self, response: NetworkResponse) {
        match response {
            NetworkResponse::Completed {
                id,
                status,
                body,
                time_ms,
            } => {
                if self.pending_request_id == Some(id) {
                    self.response.status_code = Some(status);
                    self.response_json = serde_json::from_str(&body).ok();
                    self.response.body = body;
                    self.response.time_ms = time_ms;
                    // New document, fresh tree session
                    self.tree = TreeState::default();
                    self.finalize_request(Some(status), time_ms);
                }
            }
            NetworkResponse::LookupCompleted { id, body, .. } => {
                if self.pending_lookup_id == Some(id) {
                    self.is_loading = false;
                    self.pending_lookup_id = None;
                    if let Some(lookup) = self.pending_lookup.take() {
                        let choices = vars::lookup_choices(
                            &body,
                            &lookup.value_path,
                            lookup.label_path.as_deref(),
                        );
                        if choices.is_empty() {
                            self.status = format!("Lookup '{}' yielded no matches", lookup.name);
                            self.mode = Mode::Main;
                            self.picker = None;
                        } else {
                            self.picker =
                                Some(PickerState::new(format!(" Pick: {} ", lookup.name), choices));
                            self.mode = Mode::LookupWizard(LookupStep::Pick);
                        }
                    }
                }
            }
            NetworkResponse::Error { id, message, time_ms } => {
                if self.pending_request_id == Some(id) {
                    self.response.status_code = None;
                    self.response.body = message;
                    self.response.time_ms = time_ms;
                    self.response_json = None;
                    self.finalize_request(None, time_ms);
                } else if self.pending_lookup_id == Some(id) {
                    // Recoverable: prior field values stay untouched
                    self.is_loading = false;
                    self.pending_lookup_id = None;
                    self.pending_lookup = None;
                    self.status = message;
                    self.mode = Mode::Main;
                    self.picker = None;
                }
            }
        }
    }

    /// Finalize a completed request (add to history, reset state)
    fn finalize_request(&mut self, status: Option<u16>, time_ms: u64) {
        self.is_loading = false;
        self.pending_request_id = None;
        self.response_scroll = 0;

        if let (Some(form), Some(request)) = (&self.form, &self.last_request) {
            let entry = HistoryEntry {
                method: request.method,
                url: request.url.clone(),
                endpoint_key: form.endpoint_key.clone(),
                status_code: status,
                time_ms,
                fields: form.values.clone(),
                timestamp: Utc::now(),
            };
            self.storage.add_to_history(entry);
        }
        self.history_index = None;
    }

    // ========================
    // Response scrolling
    // ========================

    pub fn scroll_up(&mut self) {
        self.response_scroll = self.response_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.response_scroll = self.response_scroll.saturating_add(1);
    }

    // ========================
    // Variable picker
    // ========================

    pub fn open_variable_picker(&mut self) {
        if self.form.is_none() {
            return;
        }
        let variables = &self.storage.variables.variables;
        if variables.is_empty() {
            self.status = "No variables defined yet (capture one from the tree)".to_string();
            return;
        }
        let mut names: Vec<&String> = variables.keys().collect();
        names.sort();
        let items = names
            .into_iter()
            .map(|name| {
                let value = variables.get(name).map(String::as_str).unwrap_or("");
                (name.clone(), format!("{} = {}", name, value))
            })
            .collect();
        self.picker = Some(PickerState::new(" Insert variable ", items));
        self.mode = Mode::VariablePicker;
    }

    // ========================
    // Lookup wizard
    // ========================

    pub fn open_lookup_wizard(&mut self) {
        if self.form.is_none() {
            return;
        }
        if self.storage.lookups.is_empty() {
            self.status = "No saved lookups (create one from the tree with L)".to_string();
            return;
        }
        let items = self
            .storage
            .lookups
            .iter()
            .map(|l| (l.name.clone(), format!("{}  ({})", l.name, l.value_path)))
            .collect();
        self.picker = Some(PickerState::new(" Run lookup ", items));
        self.mode = Mode::LookupWizard(LookupStep::Choose);
    }

    pub fn picker_up(&mut self) {
        if let Some(picker) = &mut self.picker {
            picker.selected = picker.selected.saturating_sub(1);
        }
    }

    pub fn picker_down(&mut self) {
        if let Some(picker) = &mut self.picker {
            if picker.selected + 1 < picker.items.len() {
                picker.selected += 1;
            }
        }
    }

    pub fn picker_confirm(&mut self) -> Option<NetworkCommand> {
        let picker = self.picker.as_ref()?;
        let value = picker.items.get(picker.selected)?.0.clone();

        match self.mode {
            Mode::VariablePicker => {
                if let Some(form) = &mut self.form {
                    let current = form.focused_value().unwrap_or("").to_string();
                    form.set_focused_value(vars::insert_token(&current, &value));
                }
                self.close_picker();
                None
            }
            Mode::LookupWizard(LookupStep::Choose) => {
                if self.is_loading {
                    self.status = "A request is already in flight".to_string();
                    self.close_picker();
                    return None;
                }
                let lookup = self
                    .storage
                    .lookups
                    .iter()
                    .find(|l| l.name == value)?
                    .clone();
                self.picker = None;
                self.mode = Mode::LookupWizard(LookupStep::Fetching);
                self.is_loading = true;
                let id = self.next_id();
                self.pending_lookup_id = Some(id);
                self.pending_lookup = Some(lookup.clone());
                Some(NetworkCommand::ExecuteLookup {
                    id,
                    lookup,
                    variables: self.storage.variables.variables.clone(),
                })
            }
            Mode::LookupWizard(LookupStep::Pick) => {
                if let Some(form) = &mut self.form {
                    form.set_focused_value(value);
                }
                self.close_picker();
                None
            }
            _ => None,
        }
    }

    pub fn picker_cancel(&mut self) {
        // A fetch that is still outstanding will be ignored on arrival
        if matches!(self.mode, Mode::LookupWizard(LookupStep::Fetching)) {
            self.pending_lookup_id = None;
            self.pending_lookup = None;
            self.is_loading = false;
        }
        self.close_picker();
    }

    fn close_picker(&mut self) {
        self.picker = None;
        self.mode = Mode::Main;
    }

    // ========================
    // Prompt overlays
    // ========================

    pub fn open_import(&mut self) {
        if self.form.is_none() {
            return;
        }
        self.prompt = Some(PromptState::new(" Paste JSON body (Enter to import) "));
        self.mode = Mode::Import;
    }

    pub fn prompt_char(&mut self, c: char) {
        if let Some(prompt) = &mut self.prompt {
            prompt.buffer.push(c);
        }
    }

    pub fn prompt_backspace(&mut self) {
        if let Some(prompt) = &mut self.prompt {
            prompt.buffer.pop();
        }
    }

    pub fn prompt_confirm(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        match self.mode {
            Mode::Import => {
                match serde_json::from_str::<serde_json::Value>(&prompt.buffer) {
                    Ok(nested) => {
                        if let Some(form) = &mut self.form {
                            form.import_body(&nested);
                        }
                        self.status = "Imported body into the form".to_string();
                    }
                    // No-op on malformed input: nothing was mutated
                    Err(e) => {
                        self.status = format!("Import failed: {}", e);
                    }
                }
                self.mode = Mode::Main;
            }
            Mode::SaveLookup => {
                let name = prompt.buffer.trim().to_string();
                if name.is_empty() {
                    self.status = "Lookup name cannot be empty".to_string();
                    self.pending_lookup_path = None;
                } else if let (Some(path), Some(request)) =
                    (self.pending_lookup_path.take(), &self.last_request)
                {
                    self.storage.add_lookup(Lookup {
                        name: name.clone(),
                        method: request.method,
                        url: request.url.clone(),
                        body: request.body.clone(),
                        value_path: path,
                        label_path: None,
                    });
                    self.status = format!("Saved lookup '{}'", name);
                }
                self.mode = Mode::TreeView;
            }
            Mode::CaptureName => {
                let name = prompt.buffer.trim().to_string();
                if name.is_empty() {
                    self.status = "Variable name cannot be empty".to_string();
                    self.capture_value = None;
                } else if let Some(value) = self.capture_value.take() {
                    self.storage.set_variable(name.clone(), value);
                    self.status = format!("Captured as {{{{{}}}}}", name);
                }
                self.mode = Mode::TreeView;
            }
            _ => {}
        }
    }

    pub fn prompt_cancel(&mut self) {
        self.prompt = None;
        self.pending_lookup_path = None;
        self.capture_value = None;
        self.mode = match self.mode {
            Mode::SaveLookup | Mode::CaptureName => Mode::TreeView,
            _ => Mode::Main,
        };
    }

    // ========================
    // Tree navigator
    // ========================

    pub fn open_tree(&mut self) {
        if self.response_json.is_none() {
            self.status = "No JSON response to explore".to_string();
            return;
        }
        self.mode = Mode::TreeView;
    }

    pub fn close_tree(&mut self) {
        self.mode = Mode::Main;
    }

    fn tree_nodes(&self) -> Vec<tree::TreeNode> {
        self.response_json
            .as_ref()
            .map(|v| tree::build_visible(v, &self.tree.collapsed))
            .unwrap_or_default()
    }

    pub fn tree_up(&mut self) {
        self.tree.move_up();
    }

    pub fn tree_down(&mut self) {
        let len = self.tree_nodes().len();
        self.tree.move_down(len);
    }

    pub fn tree_toggle(&mut self) {
        let nodes = self.tree_nodes();
        self.tree.toggle(&nodes);
        let len = self.tree_nodes().len();
        self.tree.clamp(len);
    }

    pub fn tree_collapse(&mut self) {
        let nodes = self.tree_nodes();
        self.tree.collapse_or_step_out(&nodes);
        let len = self.tree_nodes().len();
        self.tree.clamp(len);
    }

    pub fn tree_search_start(&mut self) {
        self.tree.start_search();
    }

    pub fn tree_search_char(&mut self, c: char) {
        let nodes = self.tree_nodes();
        self.tree.search_char(c, &nodes);
    }

    pub fn tree_search_backspace(&mut self) {
        let nodes = self.tree_nodes();
        self.tree.search_backspace(&nodes);
    }

    pub fn tree_search_confirm(&mut self) {
        self.tree.confirm_search();
    }

    pub fn tree_search_cancel(&mut self) {
        self.tree.cancel_search();
    }

    pub fn tree_next_match(&mut self) {
        self.tree.next_match();
    }

    pub fn tree_prev_match(&mut self) {
        self.tree.prev_match();
    }

    /// Capture the selected node's value into a named variable
    pub fn tree_capture(&mut self) {
        let nodes = self.tree_nodes();
        let Some(node) = self.tree.selected(&nodes) else {
            return;
        };
        self.capture_value = Some(vars::stringify(&node.value));
        let mut prompt = PromptState::new(" Capture as variable ");
        // Property names make a sensible default; indices do not
        if node.key != "root" && node.key.chars().all(|c| c.is_alphanumeric() || c == '_') {
            prompt.buffer = node.key.clone();
        }
        self.prompt = Some(prompt);
        self.mode = Mode::CaptureName;
    }

    /// Turn the selected node's position into a reusable lookup over the
    /// last executed request
    pub fn tree_make_lookup(&mut self) {
        let nodes = self.tree_nodes();
        let Some(node) = self.tree.selected(&nodes) else {
            return;
        };
        let path = tree::to_lookup_path(&node.path);
        if path.is_empty() {
            self.status = "Select a node below the root".to_string();
            return;
        }
        if self.last_request.is_none() {
            self.status = "Submit a request before saving a lookup".to_string();
            return;
        }
        self.pending_lookup_path = Some(path);
        self.prompt = Some(PromptState::new(" Save lookup as "));
        self.mode = Mode::SaveLookup;
    }

    // ========================
    // History
    // ========================

    pub fn history_prev(&mut self) {
        if self.storage.history_len() == 0 {
            return;
        }
        let new_index = match self.history_index {
            None => 0,
            Some(i) if i + 1 < self.storage.history_len() => i + 1,
            Some(i) => i,
        };
        if let Some(entry) = self.storage.get_history(new_index).cloned() {
            self.apply_history(&entry);
            self.history_index = Some(new_index);
        }
    }

    pub fn history_next(&mut self) {
        match self.history_index {
            Some(i) if i > 0 => {
                if let Some(entry) = self.storage.get_history(i - 1).cloned() {
                    self.apply_history(&entry);
                    self.history_index = Some(i - 1);
                }
            }
            Some(_) => {
                // Back to a fresh form for the current endpoint
                self.select_endpoint();
                self.history_index = None;
            }
            None => {}
        }
    }

    fn apply_history(&mut self, entry: &HistoryEntry) {
        let position = self.catalog.as_ref().and_then(|c| {
            c.endpoints
                .iter()
                .position(|e| e.key() == entry.endpoint_key)
        });
        let Some(position) = position else {
            self.status = "History entry's endpoint is not in the catalog".to_string();
            return;
        };
        self.selected_endpoint = position;
        self.select_endpoint();
        if let Some(form) = &mut self.form {
            form.restore_snapshot(&entry.fields);
        }
        self.status = format!(
            "History: {} {} ({})",
            entry.method.as_str(),
            entry.url,
            entry
                .status_code
                .map(|s| s.to_string())
                .unwrap_or_else(|| "error".to_string())
        );
    }

    // ========================
    // Help popup
    // ========================

    pub fn toggle_help(&mut self) {
        self.mode = match self.mode {
            Mode::Help => Mode::Main,
            _ => Mode::Help,
        };
    }

    pub fn close_help(&mut self) {
        self.mode = Mode::Main;
    }
}

/// Fill the URL template with path parameters and append the remaining
/// non-empty parameters as a query string
fn assemble_url(form: &FormSession) -> String {
    let mut url = form
        .base_values
        .get("url")
        .cloned()
        .unwrap_or_default();
    let mut query: Vec<(String, String)> = Vec::new();

    for field in form.base_fields.iter().skip(1) {
        let Some(value) = form.base_values.get(&field.key) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let placeholder = format!("{{{}}}", field.key);
        if url.contains(&placeholder) {
            url = url.replace(&placeholder, value);
        } else {
            query.push((field.key.clone(), value.clone()));
        }
    }

    if !query.is_empty() {
        let qs: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        url = format!("{}?{}", url, qs.join("&"));
    }
    url
}

fn endpoint_summary(endpoint: &Endpoint) -> String {
    let mut out = format!(
        "Loaded: {} {}\n\nAuth: {}",
        endpoint.method.as_str(),
        endpoint.path,
        endpoint.auth.as_str()
    );
    if let Some(desc) = &endpoint.description {
        out.push_str("\n\n");
        out.push_str(desc);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::BaseField;

    fn form_with_params() -> FormSession {
        let base_fields = vec![
            BaseField {
                key: "url".to_string(),
                label: "URL".to_string(),
                required: true,
                description: None,
            },
            BaseField {
                key: "id".to_string(),
                label: "id".to_string(),
                required: true,
                description: None,
            },
            BaseField {
                key: "limit".to_string(),
                label: "limit".to_string(),
                required: false,
                description: None,
            },
        ];
        let mut form = FormSession::new("GET /users/{id}", base_fields, Vec::new());
        form.base_values.insert(
            "url".to_string(),
            "https://api.local/users/{id}".to_string(),
        );
        form
    }

    #[test]
    fn test_assemble_url_path_and_query() {
        let mut form = form_with_params();
        form.base_values.insert("id".to_string(), "42".to_string());
        form.base_values.insert("limit".to_string(), "10".to_string());
        assert_eq!(assemble_url(&form), "https://api.local/users/42?limit=10");
    }

    #[test]
    fn test_assemble_url_skips_empty_params() {
        let mut form = form_with_params();
        form.base_values.insert("id".to_string(), "42".to_string());
        assert_eq!(assemble_url(&form), "https://api.local/users/42");
    }
}
