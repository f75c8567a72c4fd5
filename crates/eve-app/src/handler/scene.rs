//! Element manager notification handlers

use eve_core::prelude::*;
use eve_core::{Element, ElementChange, ElementId, ElementSource, SceneNotification};

use super::{UpdateAction, UpdateResult};
use crate::state::AppState;
use crate::summary::{FlushOutcome, SummaryContext};

/// Handle one scene notification.
pub fn handle_scene_notification(state: &mut AppState, notification: SceneNotification) -> UpdateResult {
    match notification {
        SceneNotification::ManagerInit { roots } => handle_manager_init(state, roots),
        SceneNotification::BeginChanges => {
            if state.in_batch {
                warn!("Nested BeginChanges; previous batch never ended");
            }
            state.in_batch = true;
            UpdateResult::none()
        }
        SceneNotification::ElementChanged(change) => handle_element_changed(state, change),
        SceneNotification::ElementsRemoved { ids } => handle_elements_removed(state, &ids),
        SceneNotification::EndChanges => handle_end_changes(state),
    }
}

fn handle_manager_init(state: &mut AppState, roots: Vec<Element>) -> UpdateResult {
    state.scene.replace(roots);
    state.in_batch = false;
    state.rebuild_summary();

    state.registered_scenes = state.scene.scene_ids();
    info!(
        "Element manager initialised: {} elements, {} scenes registered",
        state.scene.len(),
        state.registered_scenes.len()
    );

    // pending picks refer to the previous tree
    UpdateResult::action(UpdateAction::CancelHighlight)
}

fn handle_element_changed(state: &mut AppState, change: ElementChange) -> UpdateResult {
    let id = change.element_id();
    if !state.receives(id) {
        debug!("Change for element {} outside the registered scenes", id);
        return UpdateResult::none();
    }
    if !state.scene.apply_change(&change.element) {
        debug!("Change for unknown element {}", id);
    }

    if state.ged.editing() == Some(id) {
        if let Some(element) = state.scene.element(id) {
            state.ged.refresh(element, &state.toolkit);
        }
    }

    let ctx = SummaryContext {
        source: &state.scene,
        registry: &state.toolkit.registry,
        colors: &state.toolkit.colors,
    };
    state.summary.apply_change(&change, &ctx);

    if !state.in_batch {
        flush(state);
    }
    UpdateResult::none()
}

fn handle_elements_removed(state: &mut AppState, ids: &[ElementId]) -> UpdateResult {
    let ids: Vec<ElementId> = ids.iter().copied().filter(|&id| state.receives(id)).collect();
    if state.scene.remove(&ids) > 0 {
        state.summary.apply_removal(&ids);
    } else {
        debug!("Removal of {} unknown elements ignored", ids.len());
    }

    if !state.in_batch {
        flush(state);
    }
    UpdateResult::none()
}

fn handle_end_changes(state: &mut AppState) -> UpdateResult {
    if !state.in_batch {
        debug!("EndChanges without BeginChanges");
    }
    state.in_batch = false;
    flush(state);
    UpdateResult::none()
}

fn flush(state: &mut AppState) -> FlushOutcome {
    let ctx = SummaryContext {
        source: &state.scene,
        registry: &state.toolkit.registry,
        colors: &state.toolkit.colors,
    };
    let outcome = state.summary.flush(&ctx);
    if outcome == FlushOutcome::Rebuilt {
        // node paths changed; the open editor points at a stale path
        state.ged.close();
    }
    trace!("Summary flush: {:?}", outcome);
    outcome
}
