//! Application state (Model in TEA pattern)

use std::sync::Arc;

use eve_core::prelude::*;
use eve_core::{short_type_name, Element, ElementId, ElementSource, Scene};

use crate::config::Settings;
use crate::fit_panel::FitPanel;
use crate::ged::{GedPanel, GedToolkit};
use crate::summary::{SummaryContext, SummaryTree};

/// Short type name of selection objects.
const SELECTION_CLASS: &str = "REveSelection";

/// Complete application state (the Model in TEA)
#[derive(Debug)]
pub struct AppState {
    /// Loaded settings
    pub settings: Settings,

    /// Local mirror of the backend element tree
    pub scene: Scene,

    /// Summary tree projection
    pub summary: SummaryTree,

    /// Generic editor panel
    pub ged: GedPanel,

    /// Schema registry, colour table and widget factory
    pub toolkit: GedToolkit,

    /// Fit panel model
    pub fit: FitPanel,

    /// Inside a `BeginChanges` / `EndChanges` bracket
    pub in_batch: bool,

    /// Scenes whose change notifications this inspector receives
    pub registered_scenes: Vec<ElementId>,

    quit_requested: bool,
}

impl AppState {
    /// Create state with default settings
    pub fn new() -> Self {
        let settings = Settings::default();
        Self::from_parts(settings, GedToolkit::default())
    }

    /// Create state from loaded settings.
    ///
    /// Fails if the configured editor schemas are invalid.
    pub fn with_settings(settings: Settings) -> Result<Self> {
        let toolkit = GedToolkit::new(
            Arc::new(settings.schema_registry()?),
            Arc::new(settings.color_index()),
            settings.widget_factory(),
        );
        Ok(Self::from_parts(settings, toolkit))
    }

    fn from_parts(settings: Settings, toolkit: GedToolkit) -> Self {
        Self {
            summary: SummaryTree::new(settings.summary.expand_level)
                .with_size_limit(settings.summary.size_limit),
            settings,
            scene: Scene::default(),
            ged: GedPanel::new(),
            toolkit,
            fit: FitPanel::new(),
            in_batch: false,
            registered_scenes: Vec::new(),
            quit_requested: false,
        }
    }

    /// Rebuild the summary from the current scene and close the editor.
    pub fn rebuild_summary(&mut self) {
        let ctx = SummaryContext {
            source: &self.scene,
            registry: &self.toolkit.registry,
            colors: &self.toolkit.colors,
        };
        self.summary.rebuild(self.scene.roots(), &ctx);
        self.ged.close();
    }

    /// Whether change notifications for `id` reach this inspector.
    ///
    /// Without registered scenes (a flat dump) every element is accepted.
    pub fn receives(&self, id: ElementId) -> bool {
        self.registered_scenes.is_empty()
            || self
                .scene
                .scene_of(id)
                .is_some_and(|scene| self.registered_scenes.contains(&scene))
    }

    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    pub fn should_quit(&self) -> bool {
        self.quit_requested
    }

    /// The selection receiving hover highlights, found by name.
    pub fn highlight_selection(&self) -> Option<&Element> {
        find_selection(self.scene.roots(), &self.settings.summary.highlight_selection)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

fn find_selection<'a>(elements: &'a [Element], name: &str) -> Option<&'a Element> {
    elements.iter().find_map(|element| {
        if element.name == name && short_type_name(&element.type_name) == SELECTION_CLASS {
            Some(element)
        } else {
            find_selection(&element.children, name)
        }
    })
}
