//! App actor - message loop processing UI events and network responses

use tokio::sync::mpsc;

use crate::app::state::AppState;
use crate::catalog::ApiCatalog;
use crate::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};

/// App actor that processes UI events and network responses
pub struct AppActor {
    state: AppState,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(
        catalog: Option<ApiCatalog>,
        network_tx: mpsc::UnboundedSender<NetworkCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        let mut state = AppState::new();
        if let Some(catalog) = catalog {
            state.status = format!("Loaded {} endpoints", catalog.endpoints.len());
            state.catalog = Some(catalog);
        }
        AppActor {
            state,
            network_tx,
            render_tx,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        // Send initial render state
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event) {
                        // Quit signal received
                        let _ = self.network_tx.send(NetworkCommand::Shutdown);
                        break;
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(response) = net_rx.recv() => {
                    tracing::debug!(id = response.id(), "Applying network response");
                    self.state.handle_response(response);
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                else => break,
            }
        }
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        match event {
            // Panel navigation
            UiEvent::NextPanel => self.state.next_panel(),
            UiEvent::PrevPanel => self.state.prev_panel(),

            // Endpoint list
            UiEvent::EndpointUp => self.state.endpoint_up(),
            UiEvent::EndpointDown => self.state.endpoint_down(),
            UiEvent::SelectEndpoint => self.state.select_endpoint(),

            // History
            UiEvent::HistoryPrev => self.state.history_prev(),
            UiEvent::HistoryNext => self.state.history_next(),

            // Form navigation
            UiEvent::FocusNext => self.state.form_focus_next(),
            UiEvent::FocusPrev => self.state.form_focus_prev(),
            UiEvent::Activate => {
                if let Some(cmd) = self.state.form_activate() {
                    let _ = self.network_tx.send(cmd);
                }
            }
            UiEvent::ClearField => self.state.clear_field(),
            UiEvent::TrainPattern => self.state.train_pattern(),
            UiEvent::OpenVariablePicker => self.state.open_variable_picker(),
            UiEvent::OpenLookupWizard => self.state.open_lookup_wizard(),
            UiEvent::OpenImport => self.state.open_import(),
            UiEvent::OpenTree => self.state.open_tree(),
            UiEvent::Submit => {
                if let Some(cmd) = self.state.prepare_request() {
                    let _ = self.network_tx.send(cmd);
                }
            }
            UiEvent::ExportCurl => self.state.export_curl(),

            // Form editing
            UiEvent::EditChar(c) => self.state.form_char(c),
            UiEvent::EditBackspace => self.state.form_backspace(),
            UiEvent::EditConfirm => self.state.form_confirm_edit(),
            UiEvent::EditCancel => self.state.form_cancel_edit(),
            UiEvent::EditUp => self.state.form_step(-1),
            UiEvent::EditDown => self.state.form_step(1),
            UiEvent::EditLeft => self.state.form_segment_move(-1),
            UiEvent::EditRight => self.state.form_segment_move(1),
            UiEvent::EditNow => self.state.form_set_now(),

            // Response panel
            UiEvent::ScrollUp => self.state.scroll_up(),
            UiEvent::ScrollDown => self.state.scroll_down(),

            // Tree view
            UiEvent::TreeUp => self.state.tree_up(),
            UiEvent::TreeDown => self.state.tree_down(),
            UiEvent::TreeToggle => self.state.tree_toggle(),
            UiEvent::TreeCollapse => self.state.tree_collapse(),
            UiEvent::TreeSearchStart => self.state.tree_search_start(),
            UiEvent::TreeSearchChar(c) => self.state.tree_search_char(c),
            UiEvent::TreeSearchBackspace => self.state.tree_search_backspace(),
            UiEvent::TreeSearchConfirm => self.state.tree_search_confirm(),
            UiEvent::TreeSearchCancel => self.state.tree_search_cancel(),
            UiEvent::TreeNextMatch => self.state.tree_next_match(),
            UiEvent::TreePrevMatch => self.state.tree_prev_match(),
            UiEvent::TreeCapture => self.state.tree_capture(),
            UiEvent::TreeMakeLookup => self.state.tree_make_lookup(),
            UiEvent::TreeClose => self.state.close_tree(),

            // Picker overlays
            UiEvent::PickerUp => self.state.picker_up(),
            UiEvent::PickerDown => self.state.picker_down(),
            UiEvent::PickerConfirm => {
                if let Some(cmd) = self.state.picker_confirm() {
                    let _ = self.network_tx.send(cmd);
                }
            }
            UiEvent::PickerCancel => self.state.picker_cancel(),

            // Prompt overlays
            UiEvent::PromptChar(c) => self.state.prompt_char(c),
            UiEvent::PromptBackspace => self.state.prompt_backspace(),
            UiEvent::PromptConfirm => self.state.prompt_confirm(),
            UiEvent::PromptCancel => self.state.prompt_cancel(),

            // Popups
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }
}
