//! Message types for the application (TEA pattern)

use serde::{Deserialize, Serialize};

use eve_core::{ElementId, SceneNotification};

use crate::fit_panel::{ContourRequest, FitInputs, ScanRequest};
use crate::widget::ControlEvent;

/// Render-self checkbox state of one summary item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSelection {
    pub path: String,
    pub selected: bool,
}

/// All possible messages/actions in the application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    // ─────────────────────────────────────────────────────────
    // Backend notifications
    // ─────────────────────────────────────────────────────────
    /// Element manager notification
    Scene(SceneNotification),

    /// Fit backend frame (`MODEL:...`, `PARS:...`, `ADVANCED:...`)
    Panel { text: String },

    /// An element was added to a selection
    SelectElement {
        selection_id: ElementId,
        element_id: ElementId,
    },

    /// An element was removed from a selection
    UnselectElement {
        selection_id: ElementId,
        element_id: ElementId,
    },

    // ─────────────────────────────────────────────────────────
    // Summary tree input
    // ─────────────────────────────────────────────────────────
    /// Checkboxes toggled in the tree
    SelectionChanged { items: Vec<TreeSelection> },

    /// Edit button of a tree item pressed
    DetailPressed { path: String },

    /// Pointer entered a tree item
    MouseEnter { element_id: ElementId },

    /// Pointer left a tree item
    MouseLeave,

    // ─────────────────────────────────────────────────────────
    // Editor input
    // ─────────────────────────────────────────────────────────
    /// A control of the open editor was edited
    ControlEdited { index: usize, event: ControlEvent },

    CloseEditor,

    // ─────────────────────────────────────────────────────────
    // Fit panel input
    // ─────────────────────────────────────────────────────────
    Fit(FitCommand),

    /// Stop the engine loop
    Quit,
}

/// User actions on the fit panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum FitCommand {
    DoFit(FitInputs),
    Reset,
    Back,
    SelectFunction { name: String },
    OperationText { text: String },
    SelectLibrary { library: String },
    SelectTypeFunc { type_func: String },
    SetNoStore { no_store: bool },
    UpdateRange { low: f64, high: f64 },
    DrawContour(ContourRequest),
    DrawScan(ScanRequest),
    ApplyPars,
    SetContourColor { color: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_json_shapes() {
        let msg: Message = serde_json::from_value(json!({
            "type": "control_edited",
            "index": 2,
            "event": { "kind": "number", "value": "3" }
        }))
        .unwrap();
        assert_eq!(
            msg,
            Message::ControlEdited {
                index: 2,
                event: ControlEvent::Number { value: "3".into() }
            }
        );

        let msg: Message =
            serde_json::from_value(json!({ "type": "scene", "kind": "end_changes" })).unwrap();
        assert_eq!(msg, Message::Scene(SceneNotification::EndChanges));
    }

    #[test]
    fn test_fit_command_json() {
        let msg: Message = serde_json::from_value(json!({
            "type": "fit",
            "command": "do_fit",
            "min_library": "Minuit2",
            "max_iterations": 50
        }))
        .unwrap();
        assert!(matches!(
            msg,
            Message::Fit(FitCommand::DoFit(FitInputs { max_iterations: Some(50), .. }))
        ));

        let msg: Message =
            serde_json::from_value(json!({ "type": "fit", "command": "back" })).unwrap();
        assert_eq!(msg, Message::Fit(FitCommand::Back));
    }
}
