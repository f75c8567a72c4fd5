//! Summary tree: a display projection of the scene element tree.
//!
//! The projection keeps one [`SummaryNode`] per element worth showing and
//! tracks per-node flags (visibility, selection, highlight background).
//! Change notifications patch nodes in place; removals only mark the
//! projection stale so a batch of structural changes costs one rebuild at
//! [`SummaryTree::flush`].

use std::collections::HashMap;

use serde::Serialize;

use eve_core::prelude::*;
use eve_core::{ColorIndex, Element, ElementChange, ElementId, ElementSource};

use crate::schema::SchemaRegistry;

/// Name of the selection whose background marks hover highlight.
pub const GLOBAL_HIGHLIGHT_NAME: &str = "Global Highlight";

/// Background painted for the global highlight selection.
pub const HIGHLIGHT_BACKGROUND: &str = "rgb(230, 230, 230)";

/// Background painted for any other selection.
pub const SELECTION_BACKGROUND: &str = "rgb(66, 124, 172)";

/// Tree depth expanded after a rebuild.
pub const DEFAULT_EXPAND_LEVEL: usize = 2;

/// How a node is rendered in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemType {
    /// Selectable only
    Active,
    /// Selectable with an editor
    DetailAndActive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum HighlightState {
    #[default]
    None,
    Highlighted,
    Selected,
}

/// One projected element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryNode {
    pub name: String,
    pub title: String,
    pub element_id: ElementId,
    pub master_id: ElementId,
    /// Position in the projection, e.g. `/0/childs/1`
    pub path: String,
    pub item_type: ItemType,
    pub visible: bool,
    pub highlight: HighlightState,
    /// CSS background; empty when not part of any selection
    pub background: String,
    /// CSS colour of the element's main colour; empty when unset
    pub main_color: String,
    pub selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SummaryNode>>,
}

impl SummaryNode {
    fn project(element: &Element, path: String, ctx: &SummaryContext<'_>) -> Self {
        let mut node = Self {
            name: String::new(),
            title: String::new(),
            element_id: element.id,
            master_id: element.effective_master_id(),
            path,
            item_type: ItemType::Active,
            visible: false,
            highlight: HighlightState::None,
            background: String::new(),
            main_color: String::new(),
            selected: false,
            children: None,
        };
        node.refresh_from(element, ctx);
        node
    }

    /// Re-read the derived attributes from the live element.
    fn refresh_from(&mut self, element: &Element, ctx: &SummaryContext<'_>) {
        self.name.clone_from(&element.name);
        self.title = element.display_title().to_string();
        self.master_id = element.effective_master_id();
        self.visible = !element.name.is_empty();

        if ctx.registry.is_editable(&element.type_name) {
            self.item_type = ItemType::DetailAndActive;
            // colour index 0 means "no colour"
            if let Some(index) = element.main_color.filter(|&i| i != 0) {
                self.main_color = ctx.colors.lookup(index).unwrap_or_default().to_string();
                self.selected = element.rnr_self.unwrap_or(false);
            } else {
                self.main_color.clear();
            }
        } else {
            self.item_type = ItemType::Active;
        }
    }

    pub fn has_children(&self) -> bool {
        self.children.is_some()
    }
}

/// Collaborators needed to project elements.
#[derive(Clone, Copy)]
pub struct SummaryContext<'a> {
    pub source: &'a dyn ElementSource,
    pub registry: &'a SchemaRegistry,
    pub colors: &'a ColorIndex,
}

/// Result of [`SummaryTree::flush`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Projection rebuilt from the element tree; node identity is new
    Rebuilt,
    /// Attributes changed in place; re-render without rebuilding
    Refreshed,
    Unchanged,
}

/// The projection plus its pending-change flags.
#[derive(Debug, Clone, Default)]
pub struct SummaryTree {
    roots: Vec<SummaryNode>,
    /// Element id -> child-index path into `roots`
    index: HashMap<ElementId, Vec<usize>>,
    stale: bool,
    any_changed: bool,
    generation: u64,
    expand_level: usize,
    /// Most nodes kept by a rebuild; 0 = unlimited
    size_limit: usize,
}

impl SummaryTree {
    pub fn new(expand_level: usize) -> Self {
        Self {
            expand_level,
            ..Self::default()
        }
    }

    /// Cap every rebuild at `size_limit` nodes (0 = unlimited).
    pub fn with_size_limit(mut self, size_limit: usize) -> Self {
        self.size_limit = size_limit;
        self
    }

    pub fn roots(&self) -> &[SummaryNode] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn expand_level(&self) -> usize {
        self.expand_level
    }

    /// Incremented on every rebuild.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Replace the projection with a fresh one built from `roots`.
    ///
    /// An element is projected when it has a visible name, is editable, or
    /// has a projected descendant. With a size limit, only the first
    /// `size_limit` nodes in tree order are kept.
    pub fn rebuild(&mut self, roots: &[Element], ctx: &SummaryContext<'_>) -> &[SummaryNode] {
        self.roots = project_level(roots, "/", ctx);
        if self.size_limit > 0 {
            let projected = count_nodes(&self.roots);
            if projected > self.size_limit {
                warn!(
                    "Summary has {} nodes, showing the first {}",
                    projected, self.size_limit
                );
                let mut budget = self.size_limit;
                cap_nodes(&mut self.roots, &mut budget);
            }
        }
        self.index.clear();
        let mut positions = Vec::new();
        for (i, node) in self.roots.iter().enumerate() {
            positions.push(i);
            index_node(node, &mut positions, &mut self.index);
            positions.pop();
        }
        self.stale = false;
        self.any_changed = false;
        self.generation += 1;
        debug!(
            "Summary rebuilt (generation {}, {} nodes)",
            self.generation,
            self.index.len()
        );
        &self.roots
    }

    /// Patch the node of a changed element.
    ///
    /// Unknown ids are ignored. The node is refreshed from the live element
    /// in `ctx.source`, which already carries the change.
    pub fn apply_change(&mut self, change: &ElementChange, ctx: &SummaryContext<'_>) {
        let id = change.element_id();
        let live = ctx.source.element(id);

        if let Some(node) = self.node_mut(id) {
            if let Some(element) = live {
                node.refresh_from(element, ctx);
            }
            if change.rnr_self_changed {
                node.selected = change.element.rnr_self.unwrap_or(false);
            }
        } else {
            trace!("Change for element {} outside the summary", id);
        }
        self.any_changed = true;
    }

    /// Record a structural removal; the rebuild waits for [`Self::flush`].
    pub fn apply_removal(&mut self, ids: &[ElementId]) {
        debug!("{} elements removed, summary marked stale", ids.len());
        self.stale = true;
    }

    /// Settle pending changes at the end of a batch.
    pub fn flush(&mut self, ctx: &SummaryContext<'_>) -> FlushOutcome {
        if self.stale {
            self.rebuild(ctx.source.roots(), ctx);
            FlushOutcome::Rebuilt
        } else if self.any_changed {
            self.any_changed = false;
            FlushOutcome::Refreshed
        } else {
            FlushOutcome::Unchanged
        }
    }

    pub fn node(&self, id: ElementId) -> Option<&SummaryNode> {
        let positions = self.index.get(&id)?;
        node_at(&self.roots, positions)
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut SummaryNode> {
        let positions = self.index.get(&id)?;
        let (first, rest) = positions.split_first()?;
        let mut node = self.roots.get_mut(*first)?;
        for i in rest {
            node = node.children.as_mut()?.get_mut(*i)?;
        }
        Some(node)
    }

    /// Look a node up by its projection path (`/0/childs/1`).
    pub fn node_by_path(&self, path: &str) -> Option<&SummaryNode> {
        let positions = parse_path(path)?;
        node_at(&self.roots, &positions)
    }

    /// Paint the selection background on the element's node.
    pub fn select_element(&mut self, selection: &Element, id: ElementId) -> bool {
        let (background, highlight) = selection_style(selection);
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        node.background = background.to_string();
        node.highlight = highlight;
        true
    }

    /// Clear the selection background, but only if `selection` painted it.
    pub fn unselect_element(&mut self, selection: &Element, id: ElementId) -> bool {
        let (background, _) = selection_style(selection);
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        if node.background != background {
            return false;
        }
        node.background.clear();
        node.highlight = HighlightState::None;
        true
    }
}

fn selection_style(selection: &Element) -> (&'static str, HighlightState) {
    if selection.name == GLOBAL_HIGHLIGHT_NAME {
        (HIGHLIGHT_BACKGROUND, HighlightState::Highlighted)
    } else {
        (SELECTION_BACKGROUND, HighlightState::Selected)
    }
}

fn project_level(elements: &[Element], prefix: &str, ctx: &SummaryContext<'_>) -> Vec<SummaryNode> {
    let mut nodes = Vec::new();
    for element in elements {
        let path = format!("{prefix}{}", nodes.len());
        let children = project_level(&element.children, &format!("{path}/childs/"), ctx);

        let keep = !element.name.is_empty()
            || ctx.registry.is_editable(&element.type_name)
            || !children.is_empty();
        if !keep {
            continue;
        }

        let mut node = SummaryNode::project(element, path, ctx);
        if !children.is_empty() {
            node.children = Some(children);
        }
        nodes.push(node);
    }
    nodes
}

fn count_nodes(nodes: &[SummaryNode]) -> usize {
    nodes
        .iter()
        .map(|node| 1 + node.children.as_deref().map_or(0, count_nodes))
        .sum()
}

/// Keep the first `budget` nodes in tree order. Paths of kept nodes stay valid.
fn cap_nodes(nodes: &mut Vec<SummaryNode>, budget: &mut usize) {
    let mut kept = 0;
    for node in nodes.iter_mut() {
        if *budget == 0 {
            break;
        }
        *budget -= 1;
        kept += 1;
        if let Some(children) = node.children.as_mut() {
            cap_nodes(children, budget);
            if children.is_empty() {
                node.children = None;
            }
        }
    }
    nodes.truncate(kept);
}

fn index_node(node: &SummaryNode, positions: &mut Vec<usize>, index: &mut HashMap<ElementId, Vec<usize>>) {
    if index.contains_key(&node.element_id) {
        warn!("Element {} projected twice; keeping first", node.element_id);
    } else {
        index.insert(node.element_id, positions.clone());
    }
    for (i, child) in node.children.iter().flatten().enumerate() {
        positions.push(i);
        index_node(child, positions, index);
        positions.pop();
    }
}

fn node_at<'a>(roots: &'a [SummaryNode], positions: &[usize]) -> Option<&'a SummaryNode> {
    let (first, rest) = positions.split_first()?;
    let mut node = roots.get(*first)?;
    for i in rest {
        node = node.children.as_ref()?.get(*i)?;
    }
    Some(node)
}

/// `/0/childs/1` -> `[0, 1]`
fn parse_path(path: &str) -> Option<Vec<usize>> {
    let mut parts = path.strip_prefix('/')?.split('/');
    let mut positions = vec![parts.next()?.parse().ok()?];
    while let Some(segment) = parts.next() {
        if segment != "childs" {
            return None;
        }
        positions.push(parts.next()?.parse().ok()?);
    }
    Some(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eve_core::Scene;

    fn scene() -> Scene {
        let track = Element::new(5, "Track 1", "ROOT::Experimental::REveTrack")
            .with_field("fMainColor", 4)
            .with_field("fRnrSelf", true);
        let anonymous = Element::new(6, "", "ROOT::Experimental::REveViewer");
        let hidden_parent = Element::new(7, "", "ROOT::Experimental::REveViewer")
            .with_child(Element::new(8, "Deep", "ROOT::Experimental::REveViewer"));
        let tracks = Element::new(3, "Tracks", "ROOT::Experimental::REveElementList")
            .with_child(anonymous)
            .with_child(track);
        let event = Element::new(2, "Event", "ROOT::Experimental::REveScene")
            .with_child(tracks)
            .with_child(hidden_parent);
        Scene::new(vec![event])
    }

    fn with_ctx<R>(scene: &Scene, f: impl FnOnce(&SummaryContext<'_>) -> R) -> R {
        let registry = SchemaRegistry::eve_defaults();
        let colors = ColorIndex::new();
        let ctx = SummaryContext {
            source: scene,
            registry: &registry,
            colors: &colors,
        };
        f(&ctx)
    }

    fn built(scene: &Scene) -> SummaryTree {
        let mut tree = SummaryTree::new(DEFAULT_EXPAND_LEVEL);
        with_ctx(scene, |ctx| {
            tree.rebuild(scene.roots(), ctx);
        });
        tree
    }

    #[test]
    fn test_rebuild_prunes_anonymous_leaves() {
        let scene = scene();
        let tree = built(&scene);

        // the anonymous viewer is dropped, its named sibling shifts to index 0
        assert!(tree.node(ElementId(6)).is_none());
        let track = tree.node(ElementId(5)).unwrap();
        assert_eq!(track.path, "/0/childs/0/childs/0");
        assert_eq!(tree.node_by_path("/0/childs/0/childs/0"), Some(track));
    }

    #[test]
    fn test_rebuild_keeps_ancestors_of_visible_nodes() {
        let scene = scene();
        let tree = built(&scene);

        let parent = tree.node(ElementId(7)).unwrap();
        assert!(!parent.visible);
        assert_eq!(parent.children.as_ref().map(Vec::len), Some(1));
        assert!(tree.node(ElementId(8)).unwrap().children.is_none());
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_node_attributes() {
        let scene = scene();
        let tree = built(&scene);

        let track = tree.node(ElementId(5)).unwrap();
        assert_eq!(track.item_type, ItemType::DetailAndActive);
        assert_eq!(track.main_color, "blue");
        assert!(track.selected);
        assert_eq!(track.title, "Track 1");

        let event = tree.node(ElementId(2)).unwrap();
        assert_eq!(event.item_type, ItemType::Active);
        assert_eq!(event.main_color, "");
        assert_eq!(event.master_id, ElementId(2));
    }

    #[test]
    fn test_change_refreshes_in_place() {
        let mut scene = scene();
        let mut tree = built(&scene);
        let generation = tree.generation();

        let snapshot = Element::new(5, "Track 1", "ROOT::Experimental::REveTrack")
            .with_field("fMainColor", 2)
            .with_field("fRnrSelf", false);
        scene.apply_change(&snapshot);
        let change = ElementChange {
            element: snapshot,
            rnr_self_changed: true,
        };

        let outcome = with_ctx(&scene, |ctx| {
            tree.apply_change(&change, ctx);
            tree.flush(ctx)
        });

        assert_eq!(outcome, FlushOutcome::Refreshed);
        assert_eq!(tree.generation(), generation);
        let track = tree.node(ElementId(5)).unwrap();
        assert_eq!(track.main_color, "red");
        assert!(!track.selected);
    }

    #[test]
    fn test_removal_then_change_rebuilds_once() {
        let mut scene = scene();
        let mut tree = built(&scene);
        let generation = tree.generation();

        scene.remove(&[ElementId(7)]);
        tree.apply_removal(&[ElementId(7)]);

        let snapshot = Element::new(3, "Tracks", "ROOT::Experimental::REveElementList");
        scene.apply_change(&snapshot);
        let change = ElementChange {
            element: snapshot,
            rnr_self_changed: false,
        };

        let (first, second) = with_ctx(&scene, |ctx| {
            tree.apply_change(&change, ctx);
            (tree.flush(ctx), tree.flush(ctx))
        });

        assert_eq!(first, FlushOutcome::Rebuilt);
        assert_eq!(second, FlushOutcome::Unchanged);
        assert_eq!(tree.generation(), generation + 1);
        assert!(tree.node(ElementId(7)).is_none());
        assert!(!tree.is_stale());
    }

    #[test]
    fn test_flush_without_changes() {
        let scene = scene();
        let mut tree = built(&scene);
        assert_eq!(with_ctx(&scene, |ctx| tree.flush(ctx)), FlushOutcome::Unchanged);
    }

    #[test]
    fn test_select_and_unselect() {
        let scene = scene();
        let mut tree = built(&scene);
        let highlight = Element::new(90, GLOBAL_HIGHLIGHT_NAME, "ROOT::Experimental::REveSelection");
        let selection = Element::new(91, "Global Selection", "ROOT::Experimental::REveSelection");

        assert!(tree.select_element(&highlight, ElementId(5)));
        assert_eq!(tree.node(ElementId(5)).unwrap().background, HIGHLIGHT_BACKGROUND);

        // a different selection does not clear the highlight colour
        assert!(!tree.unselect_element(&selection, ElementId(5)));
        assert_eq!(tree.node(ElementId(5)).unwrap().highlight, HighlightState::Highlighted);

        assert!(tree.select_element(&selection, ElementId(5)));
        assert_eq!(tree.node(ElementId(5)).unwrap().background, SELECTION_BACKGROUND);
        assert!(tree.unselect_element(&selection, ElementId(5)));
        assert_eq!(tree.node(ElementId(5)).unwrap().background, "");

        assert!(!tree.select_element(&selection, ElementId(404)));
    }

    #[test]
    fn test_size_limit_caps_in_tree_order() {
        let mut scene = scene();
        let mut tree = SummaryTree::new(DEFAULT_EXPAND_LEVEL).with_size_limit(3);
        with_ctx(&scene, |ctx| {
            tree.rebuild(scene.roots(), ctx);
        });

        assert_eq!(tree.len(), 3);
        assert!(tree.node(ElementId(5)).is_some());
        assert!(tree.node(ElementId(7)).is_none());
        let tracks = tree.node(ElementId(3)).unwrap();
        assert_eq!(tracks.children.as_ref().map(Vec::len), Some(1));

        // a later rebuild keeps honouring the cap
        scene.remove(&[ElementId(8)]);
        tree.apply_removal(&[ElementId(8)]);
        let outcome = with_ctx(&scene, |ctx| tree.flush(ctx));
        assert_eq!(outcome, FlushOutcome::Rebuilt);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_wheel_colour_index_is_shown() {
        let scene = Scene::new(vec![Element::new(5, "Track 1", "ROOT::Experimental::REveTrack")
            .with_field("fMainColor", 800)]);
        let tree = built(&scene);
        assert_eq!(tree.node(ElementId(5)).unwrap().main_color, "rgb(255,205,0)");
    }

    #[test]
    fn test_parse_path() {
        assert_eq!(parse_path("/0"), Some(vec![0]));
        assert_eq!(parse_path("/2/childs/0/childs/11"), Some(vec![2, 0, 11]));
        assert_eq!(parse_path("/0/kids/1"), None);
        assert_eq!(parse_path("0"), None);
        assert_eq!(parse_path("/0/childs"), None);
    }
}
