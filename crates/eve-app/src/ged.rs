//! Generic editor (GED) panel.
//!
//! The panel edits one element at a time. Opening it resolves the element's
//! schema, builds the [`EditorModel`] and creates the controls; edits are
//! encoded by the controls and returned to the caller for dispatch.

use std::sync::Arc;

use eve_core::prelude::*;
use eve_core::{ColorIndex, Element, ElementId};

use crate::dispatch::{Invocation, InvocationTarget};
use crate::editor_model::{EditorModel, EditorModelBuilder};
use crate::schema::SchemaRegistry;
use crate::widget::{Control, ControlEvent, WidgetFactory};

/// Shared, read-only pieces needed to synthesise an editor.
#[derive(Debug, Clone)]
pub struct GedToolkit {
    pub registry: Arc<SchemaRegistry>,
    pub colors: Arc<ColorIndex>,
    pub factory: WidgetFactory,
}

impl GedToolkit {
    pub fn new(registry: Arc<SchemaRegistry>, colors: Arc<ColorIndex>, factory: WidgetFactory) -> Self {
        Self {
            registry,
            colors,
            factory,
        }
    }

    /// Build the editor model and controls for `element`.
    pub fn synthesize(&self, element: &Element) -> (EditorModel, Vec<Control>) {
        let schema = self.registry.resolve(&element.type_name);
        if schema.is_empty() {
            debug!("No editable properties for {}", element.type_name);
        }
        let model = EditorModelBuilder::new(&self.colors).build(element, &schema);
        let controls = self.factory.create_controls(&model);
        (model, controls)
    }
}

impl Default for GedToolkit {
    fn default() -> Self {
        Self::new(
            Arc::new(SchemaRegistry::eve_defaults()),
            Arc::new(ColorIndex::new()),
            WidgetFactory::default(),
        )
    }
}

/// Effect of [`GedPanel::show`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GedTransition {
    Opened,
    /// Already open on another node; now edits this one
    Switched,
    /// Same node pressed again
    Closed,
}

#[derive(Debug, Clone)]
struct GedSession {
    path: String,
    model: EditorModel,
    controls: Vec<Control>,
}

/// The editor panel state.
#[derive(Debug, Clone, Default)]
pub struct GedPanel {
    session: Option<GedSession>,
}

impl GedPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.session.is_some()
    }

    /// Open the editor for the node at `path`, or toggle it closed.
    pub fn show(&mut self, path: &str, element: &Element, toolkit: &GedToolkit) -> GedTransition {
        let transition = match self.path().map(|open| open == path) {
            Some(true) => {
                self.close();
                return GedTransition::Closed;
            }
            Some(false) => GedTransition::Switched,
            None => GedTransition::Opened,
        };

        let (model, controls) = toolkit.synthesize(element);
        info!("Editing {} ({} controls)", model.title, controls.len());
        self.session = Some(GedSession {
            path: path.to_string(),
            model,
            controls,
        });
        transition
    }

    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("Closed editor for element {}", session.model.element_id);
        }
    }

    /// Rebuild the editor if it is editing `element`.
    pub fn refresh(&mut self, element: &Element, toolkit: &GedToolkit) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.model.element_id != element.id {
            return false;
        }
        let (model, controls) = toolkit.synthesize(element);
        session.model = model;
        session.controls = controls;
        true
    }

    /// Id of the element being edited.
    pub fn editing(&self) -> Option<ElementId> {
        self.session.as_ref().map(|s| s.model.element_id)
    }

    pub fn path(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.path.as_str())
    }

    pub fn model(&self) -> Option<&EditorModel> {
        self.session.as_ref().map(|s| &s.model)
    }

    pub fn controls(&self) -> &[Control] {
        self.session.as_ref().map(|s| s.controls.as_slice()).unwrap_or_default()
    }

    /// Control built from record `index`.
    pub fn control_mut(&mut self, index: usize) -> Option<&mut Control> {
        self.session
            .as_mut()?
            .controls
            .iter_mut()
            .find(|c| c.index == index)
    }

    /// Invocation target of the edited element.
    pub fn target(&self) -> Option<InvocationTarget> {
        let model = &self.session.as_ref()?.model;
        Some(InvocationTarget::new(model.element_id, model.element_type.clone()))
    }

    /// Apply a control edit, returning the call to send.
    pub fn edit(&mut self, index: usize, event: &ControlEvent) -> Option<(Invocation, InvocationTarget)> {
        let target = self.target()?;
        let Some(control) = self.control_mut(index) else {
            warn!("No control {} in the open editor", index);
            return None;
        };
        let invocation = control.on_event(event)?;
        Some((invocation, target))
    }
}
