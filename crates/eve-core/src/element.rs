//! # Scene Element Types
//!
//! Snapshots of backend-owned scene elements and the local [`Scene`] mirror
//! that answers id lookups for the summary tree and the generic editor.
//!
//! Elements are owned by the backend element manager; this crate only ever
//! holds the JSON snapshots it pushes. Field names follow the backend's
//! streamer convention (`fElementId`, `fName`, `_typename`, `childs`), which
//! serde maps onto Rust's snake_case fields. Fields the inspector does not know
//! about are kept in [`Element::fields`] so the schema-driven editor can read
//! any backing member by name.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Namespace prefix carried by every backend type name.
pub const TYPE_NAMESPACE: &str = "ROOT::Experimental::";

// ============================================================================
// ElementId
// ============================================================================

/// Backend identifier of a scene element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u32);

impl From<u32> for ElementId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Element
// ============================================================================

/// Snapshot of one backend element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "fElementId")]
    pub id: ElementId,

    #[serde(rename = "fName", default)]
    pub name: String,

    #[serde(rename = "fTitle", default)]
    pub title: String,

    /// Fully qualified type name, e.g. `ROOT::Experimental::REveTrack`
    #[serde(rename = "_typename", default)]
    pub type_name: String,

    /// Master element id; `0` or absent means the element is its own master
    #[serde(rename = "fMasterId", default, skip_serializing_if = "Option::is_none")]
    pub master_id: Option<ElementId>,

    /// Index into the ROOT colour table
    #[serde(rename = "fMainColor", default, skip_serializing_if = "Option::is_none")]
    pub main_color: Option<u32>,

    #[serde(rename = "fRnrSelf", default, skip_serializing_if = "Option::is_none")]
    pub rnr_self: Option<bool>,

    #[serde(rename = "childs", default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,

    /// Every other streamed member, keyed by its backend name
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Element {
    /// Create a bare element; mostly useful for tests and synthetic scenes.
    pub fn new(id: u32, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: ElementId(id),
            name: name.into(),
            title: String::new(),
            type_name: type_name.into(),
            master_id: None,
            main_color: None,
            rnr_self: None,
            children: Vec::new(),
            fields: Map::new(),
        }
    }

    /// Builder-style helper for setting an arbitrary backend member.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match name.as_str() {
            "fMainColor" => self.main_color = value.as_u64().and_then(|v| u32::try_from(v).ok()),
            "fRnrSelf" => self.rnr_self = value.as_bool(),
            _ => {
                self.fields.insert(name, value);
            }
        }
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Type name without the `ROOT::Experimental::` namespace.
    pub fn short_type_name(&self) -> &str {
        short_type_name(&self.type_name)
    }

    /// Title for tooltips, falling back to the element name.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.name
        } else {
            &self.title
        }
    }

    /// The master element id, defaulting to the element itself.
    pub fn effective_master_id(&self) -> ElementId {
        match self.master_id {
            Some(id) if id.0 != 0 => id,
            _ => self.id,
        }
    }

    /// Read a backing member by its backend name.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "fElementId" => Some(Value::from(self.id.0)),
            "fName" => Some(Value::from(self.name.clone())),
            "fTitle" => Some(Value::from(self.title.clone())),
            "fMasterId" => self.master_id.map(|id| Value::from(id.0)),
            "fMainColor" => self.main_color.map(Value::from),
            "fRnrSelf" => self.rnr_self.map(Value::from),
            _ => self.fields.get(name).cloned(),
        }
    }

    /// Overwrite this element's own attributes from a fresh snapshot,
    /// keeping the current children when the snapshot carries none.
    pub fn update_from(&mut self, snapshot: &Element) {
        let children = if snapshot.children.is_empty() {
            std::mem::take(&mut self.children)
        } else {
            snapshot.children.clone()
        };
        *self = Element {
            children,
            ..snapshot.clone()
        };
    }
}

/// Strip the `ROOT::Experimental::` namespace from a type name.
pub fn short_type_name(type_name: &str) -> &str {
    type_name.strip_prefix(TYPE_NAMESPACE).unwrap_or(type_name)
}

// ============================================================================
// ElementChange
// ============================================================================

/// Per-element change notification pushed by the backend.
///
/// The payload is the changed element's snapshot plus change flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementChange {
    #[serde(flatten)]
    pub element: Element,

    /// Set when the element's render-self flag toggled
    #[serde(default)]
    pub rnr_self_changed: bool,
}

impl ElementChange {
    pub fn element_id(&self) -> ElementId {
        self.element.id
    }
}

// ============================================================================
// ElementSource / Scene
// ============================================================================

/// Read access to the live element tree owned by the backend manager.
pub trait ElementSource {
    /// Look up an element by id.
    fn element(&self, id: ElementId) -> Option<&Element>;

    /// Top-level elements, in backend order.
    fn roots(&self) -> &[Element];
}

/// Local mirror of the backend element tree.
///
/// Keeps an id → child-index path map so lookups stay O(depth).
#[derive(Debug, Clone, Default)]
pub struct Scene {
    roots: Vec<Element>,
    index: HashMap<ElementId, Vec<usize>>,
}

impl Scene {
    pub fn new(roots: Vec<Element>) -> Self {
        let mut scene = Self {
            roots,
            index: HashMap::new(),
        };
        scene.reindex();
        scene
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Replace the whole tree.
    pub fn replace(&mut self, roots: Vec<Element>) {
        self.roots = roots;
        self.reindex();
    }

    /// Apply a change snapshot. Returns `false` for an unknown element.
    pub fn apply_change(&mut self, snapshot: &Element) -> bool {
        let Some(path) = self.index.get(&snapshot.id).cloned() else {
            return false;
        };
        if let Some(element) = self.element_at_mut(&path) {
            element.update_from(snapshot);
        }
        // a snapshot that brings its own children changes the id layout
        if !snapshot.children.is_empty() {
            self.reindex();
        }
        true
    }

    /// Remove elements (and their subtrees). Returns how many ids were found.
    pub fn remove(&mut self, ids: &[ElementId]) -> usize {
        let before = self.index.len();
        let mut found = 0;
        for id in ids {
            if self.index.contains_key(id) {
                found += 1;
            }
        }
        remove_recursive(&mut self.roots, ids);
        self.reindex();
        tracing::debug!(
            "Removed {} of {} requested elements ({} -> {} indexed)",
            found,
            ids.len(),
            before,
            self.index.len()
        );
        found
    }

    /// Ids of the scenes that publish change notifications.
    ///
    /// The backend lays the tree out as `world / [.., .., scenes]`; the
    /// third child of the first root holds the scene list.
    pub fn scene_ids(&self) -> Vec<ElementId> {
        self.roots
            .first()
            .and_then(|world| world.children.get(2))
            .map(|scenes| scenes.children.iter().map(|s| s.id).collect())
            .unwrap_or_default()
    }

    /// The scene (as listed by [`Self::scene_ids`]) that contains `id`.
    pub fn scene_of(&self, id: ElementId) -> Option<ElementId> {
        match self.index.get(&id)?.as_slice() {
            [0, 2, scene, ..] => self.element_at(&[0, 2, *scene]).map(|s| s.id),
            _ => None,
        }
    }

    fn element_at(&self, path: &[usize]) -> Option<&Element> {
        let (first, rest) = path.split_first()?;
        let mut current = self.roots.get(*first)?;
        for idx in rest {
            current = current.children.get(*idx)?;
        }
        Some(current)
    }

    fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let (first, rest) = path.split_first()?;
        let mut current = self.roots.get_mut(*first)?;
        for idx in rest {
            current = current.children.get_mut(*idx)?;
        }
        Some(current)
    }

    fn reindex(&mut self) {
        self.index.clear();
        let mut path = Vec::new();
        for (i, root) in self.roots.iter().enumerate() {
            path.push(i);
            index_recursive(root, &mut path, &mut self.index);
            path.pop();
        }
    }
}

impl ElementSource for Scene {
    fn element(&self, id: ElementId) -> Option<&Element> {
        let path = self.index.get(&id)?;
        self.element_at(path)
    }

    fn roots(&self) -> &[Element] {
        &self.roots
    }
}

fn index_recursive(element: &Element, path: &mut Vec<usize>, index: &mut HashMap<ElementId, Vec<usize>>) {
    if index.insert(element.id, path.clone()).is_some() {
        tracing::warn!("Duplicate element id {} in scene", element.id);
    }
    for (i, child) in element.children.iter().enumerate() {
        path.push(i);
        index_recursive(child, path, index);
        path.pop();
    }
}

fn remove_recursive(elements: &mut Vec<Element>, ids: &[ElementId]) {
    elements.retain(|e| !ids.contains(&e.id));
    for element in elements.iter_mut() {
        remove_recursive(&mut element.children, ids);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_scene() -> Scene {
        let track = Element::new(4, "Track 1", "ROOT::Experimental::REveTrack")
            .with_field("fLineWidth", 2)
            .with_field("fMainColor", 2);
        let tracks = Element::new(3, "Tracks", "ROOT::Experimental::REveElementList").with_child(track);
        let event = Element::new(2, "Event", "ROOT::Experimental::REveScene").with_child(tracks);
        Scene::new(vec![Element::new(1, "World", "ROOT::Experimental::REveElement").with_child(event)])
    }

    #[test]
    fn test_element_deserializes_backend_names() {
        let value = json!({
            "fElementId": 7,
            "fName": "Jets",
            "_typename": "ROOT::Experimental::REveJetCone",
            "fMainColor": 3,
            "fRnrSelf": true,
            "fNDiv": 72,
            "childs": [{ "fElementId": 8, "fName": "" }]
        });
        let element: Element = serde_json::from_value(value).unwrap();
        assert_eq!(element.id, ElementId(7));
        assert_eq!(element.short_type_name(), "REveJetCone");
        assert_eq!(element.main_color, Some(3));
        assert_eq!(element.field("fNDiv"), Some(json!(72)));
        assert_eq!(element.field("fElementId"), Some(json!(7)));
        assert_eq!(element.children.len(), 1);
    }

    #[test]
    fn test_effective_master_id() {
        let mut element = Element::new(5, "x", "");
        assert_eq!(element.effective_master_id(), ElementId(5));
        element.master_id = Some(ElementId(0));
        assert_eq!(element.effective_master_id(), ElementId(5));
        element.master_id = Some(ElementId(9));
        assert_eq!(element.effective_master_id(), ElementId(9));
    }

    #[test]
    fn test_out_of_range_colour_index_is_dropped() {
        let element = Element::new(5, "x", "").with_field("fMainColor", u64::from(u32::MAX) + 1);
        assert_eq!(element.main_color, None);
        let element = Element::new(5, "x", "").with_field("fMainColor", 920);
        assert_eq!(element.main_color, Some(920));
    }

    #[test]
    fn test_short_type_name_without_namespace() {
        assert_eq!(short_type_name("REveTrack"), "REveTrack");
        assert_eq!(short_type_name("ROOT::Experimental::REveTrack"), "REveTrack");
    }

    #[test]
    fn test_scene_lookup_by_id() {
        let scene = sample_scene();
        assert_eq!(scene.len(), 4);
        assert_eq!(scene.element(ElementId(4)).map(|e| e.name.as_str()), Some("Track 1"));
        assert!(scene.element(ElementId(99)).is_none());
    }

    #[test]
    fn test_scene_apply_change_keeps_children() {
        let mut scene = sample_scene();
        let snapshot = Element::new(3, "Tracks (renamed)", "ROOT::Experimental::REveElementList");
        assert!(scene.apply_change(&snapshot));

        let tracks = scene.element(ElementId(3)).unwrap();
        assert_eq!(tracks.name, "Tracks (renamed)");
        assert_eq!(tracks.children.len(), 1);
        assert!(scene.element(ElementId(4)).is_some());
    }

    #[test]
    fn test_scene_apply_change_unknown_element() {
        let mut scene = sample_scene();
        assert!(!scene.apply_change(&Element::new(50, "ghost", "")));
    }

    #[test]
    fn test_scene_remove_subtree() {
        let mut scene = sample_scene();
        assert_eq!(scene.remove(&[ElementId(3), ElementId(77)]), 1);
        assert!(scene.element(ElementId(3)).is_none());
        assert!(scene.element(ElementId(4)).is_none());
        assert_eq!(scene.len(), 2);
    }

    fn world() -> Scene {
        let event_scene = Element::new(12, "Event scene", "")
            .with_child(Element::new(13, "Tracks", "").with_child(Element::new(14, "Track 1", "")));
        let scenes = Element::new(10, "scenes", "")
            .with_child(Element::new(11, "Geometry scene", ""))
            .with_child(event_scene);
        let world = Element::new(1, "World", "")
            .with_child(Element::new(20, "global", ""))
            .with_child(Element::new(21, "viewers", ""))
            .with_child(scenes);
        Scene::new(vec![world])
    }

    #[test]
    fn test_scene_ids_from_third_world_child() {
        assert_eq!(world().scene_ids(), vec![ElementId(11), ElementId(12)]);
        assert!(sample_scene().scene_ids().is_empty());
    }

    #[test]
    fn test_scene_of_element() {
        let scene = world();
        assert_eq!(scene.scene_of(ElementId(14)), Some(ElementId(12)));
        assert_eq!(scene.scene_of(ElementId(12)), Some(ElementId(12)));
        assert_eq!(scene.scene_of(ElementId(11)), Some(ElementId(11)));
        assert_eq!(scene.scene_of(ElementId(10)), None);
        assert_eq!(scene.scene_of(ElementId(21)), None);
        assert_eq!(scene.scene_of(ElementId(99)), None);
    }

    #[test]
    fn test_element_change_flattens_snapshot() {
        let change: ElementChange = serde_json::from_value(json!({
            "fElementId": 4,
            "fName": "Track 1",
            "fRnrSelf": false,
            "rnr_self_changed": true
        }))
        .unwrap();
        assert_eq!(change.element_id(), ElementId(4));
        assert!(change.rnr_self_changed);
        assert_eq!(change.element.rnr_self, Some(false));
        assert!(!change.element.fields.contains_key("rnr_self_changed"));
    }
}
