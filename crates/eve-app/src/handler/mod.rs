//! Handler module - TEA update function and event handlers
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `scene`: Element manager notifications
//! - `fit`: Fit panel commands

pub(crate) mod fit;
pub(crate) mod scene;
pub(crate) mod update;


use crate::dispatch::{Invocation, InvocationTarget};
use crate::highlight::HighlightRequest;

// Re-export main entry point
pub use update::update;

/// Actions that the engine should perform after update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// Send a method call to a scene element
    Invoke {
        invocation: Invocation,
        target: InvocationTarget,
    },

    /// Send a prefixed fit-panel message
    SendPanel(String),

    /// Schedule a debounced highlight pick
    Highlight(HighlightRequest),

    /// Drop any pending highlight pick
    CancelHighlight,
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Actions for the engine to perform, in order
    pub actions: Vec<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            actions: vec![action],
        }
    }

    pub fn actions(actions: Vec<UpdateAction>) -> Self {
        Self { actions }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
