//! Domain events emitted by the Engine for external consumers
//!
//! Events are broadcast after each message processing cycle via
//! `Engine::subscribe()`. The headless runner forwards them to stdout.

use serde::Serialize;

use eve_core::ElementId;

/// State changes observed across one update cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    // ─────────────────────────────────────────────────────────
    // Summary tree
    // ─────────────────────────────────────────────────────────
    /// The summary was rebuilt from the element tree
    SummaryRebuilt { generation: u64, nodes: usize },

    // ─────────────────────────────────────────────────────────
    // Generic editor
    // ─────────────────────────────────────────────────────────
    /// The editor now shows a different element
    EditorOpened {
        element_id: ElementId,
        path: String,
        title: String,
        controls: usize,
    },

    EditorClosed { element_id: ElementId },

    // ─────────────────────────────────────────────────────────
    // Fit panel
    // ─────────────────────────────────────────────────────────
    /// Fit history grew or the cursor moved
    FitHistoryChanged { len: usize, cursor: usize },
}
