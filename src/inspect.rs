//! One-shot inspection of a scene dump
//!
//! Loads a JSON element tree (the `ManagerInit` payload), runs it through the
//! same update path as the live inspector and prints either the summary tree
//! or the editor an element would get.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use eve_app::editor_model::EditorModel;
use eve_app::summary::{ItemType, SummaryNode};
use eve_app::widget::Control;
use eve_app::{handler, AppState, Message, Settings};
use eve_core::prelude::*;
use eve_core::{Element, ElementId, SceneNotification};

/// Read a scene dump: a JSON array of root elements.
pub fn load_roots(scene_path: &Path) -> Result<Vec<Element>> {
    let json = std::fs::read_to_string(scene_path)
        .with_context(|| format!("Failed to read scene {}", scene_path.display()))?;
    let roots = serde_json::from_str(&json)
        .with_context(|| format!("Invalid scene JSON in {}", scene_path.display()))?;
    Ok(roots)
}

/// Build inspector state for a scene dump.
pub fn load_state(settings: Settings, roots: Vec<Element>) -> Result<AppState> {
    let mut state = AppState::with_settings(settings)?;
    handler::update(
        &mut state,
        Message::Scene(SceneNotification::ManagerInit { roots }),
    );
    Ok(state)
}

/// Render the summary tree as indented text.
///
/// Editable items carry a `*`, hidden (anonymous) ones are bracketed. Levels
/// below the configured expand level are folded into a `+N` count.
pub fn render_summary(state: &AppState) -> String {
    let mut out = String::new();
    let expand_level = state.summary.expand_level();
    for node in state.summary.roots() {
        render_node(&mut out, node, 0, expand_level);
    }
    out
}

fn render_node(out: &mut String, node: &SummaryNode, depth: usize, expand_level: usize) {
    let marker = match node.item_type {
        ItemType::DetailAndActive => "*",
        ItemType::Active => " ",
    };
    let title = if node.visible {
        node.title.clone()
    } else {
        format!("[{}]", node.element_id)
    };
    let _ = write!(out, "{:indent$}{} {} ({})", "", marker, title, node.path, indent = depth * 2);
    if !node.main_color.is_empty() {
        let _ = write!(out, " {}", node.main_color);
    }

    let children = node.children.as_deref().unwrap_or_default();
    let folded = node.has_children() && depth >= expand_level;
    if folded {
        let _ = write!(out, " +{}", children.len());
    }
    out.push('\n');

    if !folded {
        for child in children {
            render_node(out, child, depth + 1, expand_level);
        }
    }
}

/// Editor contents for one element.
#[derive(Debug, Serialize)]
pub struct EditorDump<'a> {
    pub path: &'a str,
    pub model: &'a EditorModel,
    pub controls: &'a [Control],
}

/// Open the editor for `id` and serialise what it shows.
pub fn render_editor(state: &mut AppState, id: ElementId) -> Result<String> {
    let path = state
        .summary
        .node(id)
        .map(|node| node.path.clone())
        .ok_or_else(|| Error::element_not_found(id))?;

    handler::update(state, Message::DetailPressed { path });

    let (Some(path), Some(model)) = (state.ged.path(), state.ged.model()) else {
        return Err(Error::scene(format!("element {id} has no editor")));
    };
    let dump = EditorDump {
        path,
        model,
        controls: state.ged.controls(),
    };
    Ok(serde_json::to_string_pretty(&dump)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots() -> Vec<Element> {
        let track = Element::new(5, "Track 1", "ROOT::Experimental::REveTrack")
            .with_field("fMainColor", 2)
            .with_field("fLineWidth", 2);
        let tracks = Element::new(3, "Tracks", "ROOT::Experimental::REveElementList")
            .with_child(Element::new(4, "", "ROOT::Experimental::REveViewer"))
            .with_child(track);
        vec![Element::new(2, "Event", "ROOT::Experimental::REveScene").with_child(tracks)]
    }

    #[test]
    fn test_render_summary() {
        let state = load_state(Settings::default(), roots()).unwrap();
        let text = render_summary(&state);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Event (/0)"));
        assert!(lines[1].starts_with("  * Tracks"));
        assert!(lines[2].contains("Track 1 (/0/childs/0/childs/0)"));
        assert!(!text.contains("[4]"));
    }

    #[test]
    fn test_render_editor() {
        let mut state = load_state(Settings::default(), roots()).unwrap();
        let json = render_editor(&mut state, ElementId(5)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["path"], "/0/childs/0/childs/0");
        assert_eq!(value["model"]["title"], "Track 1 (REveTrack)");
        assert_eq!(value["controls"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_render_editor_unknown_element() {
        let mut state = load_state(Settings::default(), roots()).unwrap();
        assert!(matches!(
            render_editor(&mut state, ElementId(404)),
            Err(Error::ElementNotFound { .. })
        ));
    }

    #[test]
    fn test_render_summary_folds_below_expand_level() {
        let mut settings = Settings::default();
        settings.summary.expand_level = 1;
        let state = load_state(settings, roots()).unwrap();
        let text = render_summary(&state);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with(" +1"));
        assert!(!text.contains("Track 1"));
    }

    #[test]
    fn test_render_editor_for_selectable_only_node() {
        let mut state = load_state(Settings::default(), roots()).unwrap();
        assert!(matches!(
            render_editor(&mut state, ElementId(2)),
            Err(Error::Scene { .. })
        ));
        assert!(!state.ged.is_visible());
    }

    #[test]
    fn test_load_roots_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_roots(&dir.path().join("nope.json")).is_err());
    }
}
