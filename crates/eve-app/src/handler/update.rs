//! Main update function - handles state transitions (TEA pattern)

use eve_core::prelude::*;
use eve_core::{ElementId, ElementSource};

use super::{fit, scene, UpdateAction, UpdateResult};
use crate::dispatch::{Invocation, InvocationArg, InvocationTarget};
use crate::highlight::HighlightRequest;
use crate::message::{Message, TreeSelection};
use crate::state::AppState;
use crate::summary::ItemType;

/// Process a message and update state
/// Returns the actions the engine should perform
pub fn update(state: &mut AppState, message: Message) -> UpdateResult {
    match message {
        // ─────────────────────────────────────────────────────────
        // Backend notifications
        // ─────────────────────────────────────────────────────────
        Message::Scene(notification) => scene::handle_scene_notification(state, notification),

        Message::Panel { text } => {
            if !state.fit.on_message(&text) {
                debug!("Fit panel frame ignored");
            }
            UpdateResult::none()
        }

        Message::SelectElement {
            selection_id,
            element_id,
        } => {
            if let Some(selection) = state.scene.element(selection_id) {
                state.summary.select_element(selection, element_id);
            } else {
                debug!("Unknown selection {}", selection_id);
            }
            UpdateResult::none()
        }

        Message::UnselectElement {
            selection_id,
            element_id,
        } => {
            if let Some(selection) = state.scene.element(selection_id) {
                state.summary.unselect_element(selection, element_id);
            } else {
                debug!("Unknown selection {}", selection_id);
            }
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Summary tree input
        // ─────────────────────────────────────────────────────────
        Message::SelectionChanged { items } => handle_selection_changed(state, &items),

        Message::DetailPressed { path } => {
            let Some(node) = state.summary.node_by_path(&path) else {
                warn!("No summary node at {}", path);
                return UpdateResult::none();
            };
            if node.item_type != ItemType::DetailAndActive {
                debug!("{} ({}) has no editor", path, node.element_id);
                return UpdateResult::none();
            }
            let id = node.element_id;
            let Some(element) = state.scene.element(id) else {
                warn!("Summary node {} has no live element {}", path, id);
                return UpdateResult::none();
            };
            let transition = state.ged.show(&path, element, &state.toolkit);
            debug!("Editor {:?} for {}", transition, path);
            UpdateResult::none()
        }

        Message::MouseEnter { element_id } => {
            let target = state.summary.node(element_id).map(|n| n.element_id);
            if target.is_none() {
                debug!("Hover over element {} outside the summary", element_id);
            }
            highlight(state, target)
        }

        Message::MouseLeave => highlight(state, None),

        // ─────────────────────────────────────────────────────────
        // Editor input
        // ─────────────────────────────────────────────────────────
        Message::ControlEdited { index, event } => match state.ged.edit(index, &event) {
            Some((invocation, target)) => {
                UpdateResult::action(UpdateAction::Invoke { invocation, target })
            }
            None => UpdateResult::none(),
        },

        Message::CloseEditor => {
            state.ged.close();
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Fit panel input
        // ─────────────────────────────────────────────────────────
        Message::Fit(command) => fit::handle_fit_command(state, command),

        Message::Quit => {
            info!("Quit requested");
            state.request_quit();
            UpdateResult::none()
        }
    }
}

/// Toggle render-self on every changed tree item.
fn handle_selection_changed(state: &AppState, items: &[TreeSelection]) -> UpdateResult {
    let actions = items
        .iter()
        .filter_map(|item| {
            let id = state.summary.node_by_path(&item.path)?.element_id;
            let element = state.scene.element(id)?;
            Some(UpdateAction::Invoke {
                invocation: Invocation::new("SetRnrSelf", vec![InvocationArg::Bool(item.selected)]),
                target: InvocationTarget::new(element.id, element.type_name.clone()),
            })
        })
        .collect();
    UpdateResult::actions(actions)
}

fn highlight(state: &AppState, element_id: Option<ElementId>) -> UpdateResult {
    let Some(selection) = state.highlight_selection() else {
        debug!(
            "No {:?} selection in the scene; highlight dropped",
            state.settings.summary.highlight_selection
        );
        return UpdateResult::none();
    };
    UpdateResult::action(UpdateAction::Highlight(HighlightRequest {
        element_id,
        selection_id: selection.id,
    }))
}
