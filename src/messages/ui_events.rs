//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::form::FormMode;

/// Top-level overlay mode. At most one overlay is ever active, so every
/// transition is centrally auditable.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Mode {
    /// Panels active: endpoint list, form, response
    #[default]
    Main,
    /// Full-screen response tree navigator
    TreeView,
    /// Variable picker for the focused field
    VariablePicker,
    LookupWizard(LookupStep),
    /// Paste a JSON body into the value store
    Import,
    /// Name a lookup derived from the tree selection
    SaveLookup,
    /// Name a variable captured from the tree selection
    CaptureName,
    Help,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LookupStep {
    /// Pick one of the saved lookups
    Choose,
    /// Waiting on the lookup request
    Fetching,
    /// Pick one of the extracted values
    Pick,
}

/// Active panel in the main view
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Panel {
    Endpoints,
    #[default]
    Form,
    Response,
}

impl Panel {
    pub fn next(&self) -> Panel {
        match self {
            Panel::Endpoints => Panel::Form,
            Panel::Form => Panel::Response,
            Panel::Response => Panel::Endpoints,
        }
    }

    pub fn prev(&self) -> Panel {
        match self {
            Panel::Endpoints => Panel::Response,
            Panel::Form => Panel::Endpoints,
            Panel::Response => Panel::Form,
        }
    }
}

/// Events generated from user input in the UI layer
#[derive(Debug, Clone)]
pub enum UiEvent {
    // Panel navigation
    NextPanel,
    PrevPanel,

    // Endpoint list
    EndpointUp,
    EndpointDown,
    SelectEndpoint,

    // History
    HistoryPrev,
    HistoryNext,

    // Form, navigate mode
    FocusNext,
    FocusPrev,
    Activate,
    ClearField,
    TrainPattern,
    OpenVariablePicker,
    OpenLookupWizard,
    OpenImport,
    OpenTree,
    Submit,
    ExportCurl,

    // Form, edit mode
    EditChar(char),
    EditBackspace,
    EditConfirm,
    EditCancel,
    EditUp,
    EditDown,
    EditLeft,
    EditRight,
    EditNow,

    // Response panel
    ScrollUp,
    ScrollDown,

    // Tree view
    TreeUp,
    TreeDown,
    TreeToggle,
    TreeCollapse,
    TreeSearchStart,
    TreeSearchChar(char),
    TreeSearchBackspace,
    TreeSearchConfirm,
    TreeSearchCancel,
    TreeNextMatch,
    TreePrevMatch,
    TreeCapture,
    TreeMakeLookup,
    TreeClose,

    // Picker overlay (variables, lookup wizard steps)
    PickerUp,
    PickerDown,
    PickerConfirm,
    PickerCancel,

    // Prompt overlay (import, save lookup, capture name)
    PromptChar(char),
    PromptBackspace,
    PromptConfirm,
    PromptCancel,

    // Popups
    ToggleHelp,
    CloseHelp,

    // System
    Quit,
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(
    key: KeyEvent,
    mode: Mode,
    active_panel: Panel,
    form_mode: Option<FormMode>,
    tree_searching: bool,
) -> Option<UiEvent> {
    use crossterm::event::KeyEventKind;

    if key.kind != KeyEventKind::Press {
        return None;
    }

    // Global Ctrl shortcuts
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(UiEvent::Quit);
    }

    match mode {
        Mode::Help => Some(UiEvent::CloseHelp),
        Mode::VariablePicker
        | Mode::LookupWizard(LookupStep::Choose)
        | Mode::LookupWizard(LookupStep::Pick) => match key.code {
            KeyCode::Esc => Some(UiEvent::PickerCancel),
            KeyCode::Enter => Some(UiEvent::PickerConfirm),
            KeyCode::Up | KeyCode::Char('k') => Some(UiEvent::PickerUp),
            KeyCode::Down | KeyCode::Char('j') => Some(UiEvent::PickerDown),
            _ => None,
        },
        Mode::LookupWizard(LookupStep::Fetching) => match key.code {
            KeyCode::Esc => Some(UiEvent::PickerCancel),
            _ => None,
        },
        Mode::Import | Mode::SaveLookup | Mode::CaptureName => match key.code {
            KeyCode::Esc => Some(UiEvent::PromptCancel),
            KeyCode::Enter => Some(UiEvent::PromptConfirm),
            KeyCode::Backspace => Some(UiEvent::PromptBackspace),
            KeyCode::Char(c) => Some(UiEvent::PromptChar(c)),
            _ => None,
        },
        Mode::TreeView => handle_tree_keys(key, tree_searching),
        Mode::Main => handle_main_keys(key, active_panel, form_mode),
    }
}

fn handle_tree_keys(key: KeyEvent, searching: bool) -> Option<UiEvent> {
    if searching {
        return match key.code {
            KeyCode::Esc => Some(UiEvent::TreeSearchCancel),
            KeyCode::Enter => Some(UiEvent::TreeSearchConfirm),
            KeyCode::Backspace => Some(UiEvent::TreeSearchBackspace),
            KeyCode::Char(c) => Some(UiEvent::TreeSearchChar(c)),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('t') => Some(UiEvent::TreeClose),
        KeyCode::Up | KeyCode::Char('k') => Some(UiEvent::TreeUp),
        KeyCode::Down | KeyCode::Char('j') => Some(UiEvent::TreeDown),
        KeyCode::Enter | KeyCode::Char(' ') => Some(UiEvent::TreeToggle),
        KeyCode::Left | KeyCode::Char('h') => Some(UiEvent::TreeCollapse),
        KeyCode::Char('/') => Some(UiEvent::TreeSearchStart),
        KeyCode::Char('n') => Some(UiEvent::TreeNextMatch),
        KeyCode::Char('N') | KeyCode::Char('p') => Some(UiEvent::TreePrevMatch),
        KeyCode::Char('c') => Some(UiEvent::TreeCapture),
        KeyCode::Char('L') => Some(UiEvent::TreeMakeLookup),
        KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
        _ => None,
    }
}

fn handle_main_keys(
    key: KeyEvent,
    active_panel: Panel,
    form_mode: Option<FormMode>,
) -> Option<UiEvent> {
    // Edit mode captures almost everything
    if active_panel == Panel::Form && form_mode == Some(FormMode::Edit) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('n') {
            return Some(UiEvent::EditNow);
        }
        return match key.code {
            KeyCode::Esc => Some(UiEvent::EditCancel),
            KeyCode::Enter => Some(UiEvent::EditConfirm),
            KeyCode::Backspace => Some(UiEvent::EditBackspace),
            KeyCode::Up => Some(UiEvent::EditUp),
            KeyCode::Down => Some(UiEvent::EditDown),
            KeyCode::Left => Some(UiEvent::EditLeft),
            KeyCode::Right => Some(UiEvent::EditRight),
            KeyCode::Char(c) => Some(UiEvent::EditChar(c)),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Some(UiEvent::Quit),
        KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
        KeyCode::Tab => Some(UiEvent::NextPanel),
        KeyCode::BackTab => Some(UiEvent::PrevPanel),
        KeyCode::Char('s') => Some(UiEvent::Submit),
        KeyCode::Char('c') => Some(UiEvent::ExportCurl),
        KeyCode::Char('[') => Some(UiEvent::HistoryPrev),
        KeyCode::Char(']') => Some(UiEvent::HistoryNext),
        _ => match active_panel {
            Panel::Endpoints => match key.code {
                KeyCode::Up | KeyCode::Char('k') => Some(UiEvent::EndpointUp),
                KeyCode::Down | KeyCode::Char('j') => Some(UiEvent::EndpointDown),
                KeyCode::Enter => Some(UiEvent::SelectEndpoint),
                _ => None,
            },
            Panel::Form => match key.code {
                KeyCode::Up | KeyCode::Char('k') => Some(UiEvent::FocusPrev),
                KeyCode::Down | KeyCode::Char('j') => Some(UiEvent::FocusNext),
                KeyCode::Enter | KeyCode::Char('e') => Some(UiEvent::Activate),
                KeyCode::Char('x') => Some(UiEvent::ClearField),
                KeyCode::Char('p') => Some(UiEvent::TrainPattern),
                KeyCode::Char('v') => Some(UiEvent::OpenVariablePicker),
                KeyCode::Char('l') => Some(UiEvent::OpenLookupWizard),
                KeyCode::Char('i') => Some(UiEvent::OpenImport),
                KeyCode::Char('t') => Some(UiEvent::OpenTree),
                _ => None,
            },
            Panel::Response => match key.code {
                KeyCode::Up | KeyCode::Char('k') => Some(UiEvent::ScrollUp),
                KeyCode::Down | KeyCode::Char('j') => Some(UiEvent::ScrollDown),
                KeyCode::Enter | KeyCode::Char('t') => Some(UiEvent::OpenTree),
                _ => None,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_edit_mode_captures_chars() {
        let event = key_to_ui_event(
            press(KeyCode::Char('q')),
            Mode::Main,
            Panel::Form,
            Some(FormMode::Edit),
            false,
        );
        assert!(matches!(event, Some(UiEvent::EditChar('q'))));
    }

    #[test]
    fn test_navigate_mode_quit() {
        let event = key_to_ui_event(
            press(KeyCode::Char('q')),
            Mode::Main,
            Panel::Form,
            Some(FormMode::Navigate),
            false,
        );
        assert!(matches!(event, Some(UiEvent::Quit)));
    }

    #[test]
    fn test_tree_search_captures_chars() {
        let event = key_to_ui_event(press(KeyCode::Char('q')), Mode::TreeView, Panel::Form, None, true);
        assert!(matches!(event, Some(UiEvent::TreeSearchChar('q'))));
        let event = key_to_ui_event(press(KeyCode::Char('q')), Mode::TreeView, Panel::Form, None, false);
        assert!(matches!(event, Some(UiEvent::TreeClose)));
    }

    #[test]
    fn test_release_events_ignored() {
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        assert!(key_to_ui_event(key, Mode::Main, Panel::Form, None, false).is_none());
    }
}
