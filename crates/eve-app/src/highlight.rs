//! Debounced hover highlight.
//!
//! Pointer enter/leave events over the summary tree arrive in bursts. Each
//! event aborts the pending send and schedules a new one, so only the final
//! target reaches the backend once the pointer has rested for the delay.

use std::time::Duration;

use tokio::task::JoinHandle;

use eve_core::prelude::*;
use eve_core::ElementId;

use crate::dispatch::{Dispatcher, Invocation, InvocationArg, InvocationTarget};

/// Delay before a highlight is sent.
pub const DEFAULT_HIGHLIGHT_DEBOUNCE_MS: u64 = 200;

/// Type of the selection object receiving highlight picks.
pub const SELECTION_TYPE: &str = "ROOT::Experimental::REveSelection";

/// Runs the most recently scheduled action after a quiet period.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replace any pending action with `action`, restarting the timer.
    pub fn schedule<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        }));
    }

    /// Drop the pending action, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Wait for the pending action to run.
    pub async fn finish(&mut self) {
        if let Some(handle) = self.pending.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("Debounced task failed: {}", e);
                }
            }
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A highlight pick for the global highlight selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightRequest {
    /// Hovered element; `None` clears the highlight
    pub element_id: Option<ElementId>,
    /// The global highlight selection object
    pub selection_id: ElementId,
}

impl HighlightRequest {
    pub fn invocation(&self) -> Invocation {
        let picked = self.element_id.unwrap_or_default();
        Invocation::new(
            "NewElementPicked",
            vec![
                InvocationArg::Id(picked),
                InvocationArg::Bool(false),
                InvocationArg::Bool(false),
            ],
        )
    }

    pub fn target(&self) -> InvocationTarget {
        InvocationTarget::new(self.selection_id, SELECTION_TYPE)
    }
}

/// Debounces highlight picks and dispatches the survivor.
#[derive(Debug)]
pub struct HighlightDebouncer {
    debouncer: Debouncer,
    dispatcher: Dispatcher,
}

impl HighlightDebouncer {
    pub fn new(dispatcher: Dispatcher, delay: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(delay),
            dispatcher,
        }
    }

    /// Schedule `request`, superseding any pending pick.
    pub fn pick(&mut self, request: HighlightRequest) {
        trace!("Highlight scheduled for {:?}", request.element_id);
        let dispatcher = self.dispatcher.clone();
        self.debouncer.schedule(move || {
            dispatcher.dispatch(&request.invocation(), &request.target());
        });
    }

    pub fn cancel(&mut self) {
        self.debouncer.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Let the pending pick fire (used on shutdown).
    pub async fn finish(&mut self) {
        self.debouncer.finish().await;
    }
}
