//! Engine - owns the state, the outgoing dispatcher and the highlight timer
//!
//! Messages enter through [`Engine::process_message`] (or the channel returned
//! by [`Engine::msg_sender`]); the update function decides what to do and the
//! engine performs the resulting [`UpdateAction`]s.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use eve_core::prelude::*;
use eve_core::ElementId;

use crate::config::{self, Settings};
use crate::dispatch::{Dispatcher, Transport};
use crate::engine_event::EngineEvent;
use crate::handler::{self, UpdateAction};
use crate::highlight::HighlightDebouncer;
use crate::message::Message;
use crate::state::AppState;

/// How long shutdown waits for a pending highlight to go out.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Lightweight snapshot of state for change detection.
#[derive(Debug, Clone, PartialEq)]
struct StateSnapshot {
    summary_generation: u64,
    editing: Option<ElementId>,
    editor_path: Option<String>,
    fit_history: (usize, usize),
}

impl StateSnapshot {
    fn capture(state: &AppState) -> Self {
        Self {
            summary_generation: state.summary.generation(),
            editing: state.ged.editing(),
            editor_path: state.ged.path().map(str::to_string),
            fit_history: (state.fit.history_len(), state.fit.history_cursor()),
        }
    }
}

/// Orchestration engine for the inspector.
///
/// Must be created inside a tokio runtime; highlight picks are sent from a
/// spawned timer task.
pub struct Engine {
    /// TEA application state (the Model)
    pub state: AppState,

    /// Sender half of the message channel; clone via [`Engine::msg_sender`]
    msg_tx: mpsc::Sender<Message>,

    /// Receiver half of the message channel.
    /// Frontend loops drain messages from here.
    pub msg_rx: mpsc::Receiver<Message>,

    dispatcher: Dispatcher,

    highlight: HighlightDebouncer,

    event_tx: broadcast::Sender<EngineEvent>,
}

impl Engine {
    /// Create an engine from already loaded settings.
    pub fn new(settings: Settings, transport: Arc<dyn Transport>) -> Result<Self> {
        let delay = Duration::from_millis(settings.summary.highlight_debounce_ms);
        let state = AppState::with_settings(settings)?;

        let dispatcher = Dispatcher::new(transport);
        let highlight = HighlightDebouncer::new(dispatcher.clone(), delay);
        let (msg_tx, msg_rx) = mpsc::channel::<Message>(256);
        let (event_tx, _) = broadcast::channel(256);

        Ok(Self {
            state,
            msg_tx,
            msg_rx,
            dispatcher,
            highlight,
            event_tx,
        })
    }

    /// Create an engine from the `.eve/config.toml` under `base_dir`.
    ///
    /// A missing or unreadable file falls back to defaults; only invalid
    /// editor schemas are an error.
    pub fn load(base_dir: &Path, transport: Arc<dyn Transport>) -> Result<Self> {
        if let Err(e) = config::init_config_dir(base_dir) {
            warn!("Failed to initialize .eve directory: {}", e);
        }
        let settings = config::load_settings(base_dir);
        Self::new(settings, transport)
    }

    /// Subscribe to engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    /// Quit was requested, or the transport can no longer deliver frames.
    pub fn should_quit(&self) -> bool {
        self.state.should_quit() || self.dispatcher.transport_lost()
    }

    pub fn highlight_pending(&self) -> bool {
        self.highlight.is_pending()
    }

    /// Run one message through update and perform the resulting actions.
    pub fn process_message(&mut self, msg: Message) {
        let pre = StateSnapshot::capture(&self.state);

        let result = handler::update(&mut self.state, msg);
        for action in result.actions {
            self.handle_action(action);
        }

        let post = StateSnapshot::capture(&self.state);
        if pre != post {
            self.emit_events(&pre, &post);
        }
    }

    /// Process every message already queued. Returns how many ran.
    pub fn drain_pending_messages(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.process_message(msg);
            count += 1;
        }
        count
    }

    /// Process queued messages until [`Message::Quit`].
    pub async fn run(&mut self) {
        while !self.should_quit() {
            match self.msg_rx.recv().await {
                Some(msg) => self.process_message(msg),
                None => break,
            }
        }
    }

    /// Let a pending highlight go out, bounded by a timeout.
    pub async fn shutdown(&mut self) {
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, self.highlight.finish())
            .await
            .is_err()
        {
            warn!("Pending highlight did not finish before shutdown");
        }
        info!("Engine stopped");
    }

    fn handle_action(&mut self, action: UpdateAction) {
        match action {
            UpdateAction::Invoke { invocation, target } => {
                self.dispatcher.dispatch(&invocation, &target);
            }
            UpdateAction::SendPanel(text) => self.dispatcher.send_panel(text),
            UpdateAction::Highlight(request) => self.highlight.pick(request),
            UpdateAction::CancelHighlight => self.highlight.cancel(),
        }
    }

    fn emit_events(&self, pre: &StateSnapshot, post: &StateSnapshot) {
        if post.summary_generation != pre.summary_generation {
            self.emit(EngineEvent::SummaryRebuilt {
                generation: post.summary_generation,
                nodes: self.state.summary.len(),
            });
        }

        if post.editing != pre.editing || post.editor_path != pre.editor_path {
            if let Some(element_id) = pre.editing {
                self.emit(EngineEvent::EditorClosed { element_id });
            }
            if let (Some(element_id), Some(path), Some(model)) =
                (post.editing, &post.editor_path, self.state.ged.model())
            {
                self.emit(EngineEvent::EditorOpened {
                    element_id,
                    path: path.clone(),
                    title: model.title.clone(),
                    controls: self.state.ged.controls().len(),
                });
            }
        }

        if post.fit_history != pre.fit_history {
            let (len, cursor) = post.fit_history;
            self.emit(EngineEvent::FitHistoryChanged { len, cursor });
        }
    }

    /// send() only fails without subscribers, which is fine.
    fn emit(&self, event: EngineEvent) {
        let _ = self.event_tx.send(event);
    }
}
