//! eve-app - Inspector state and orchestration for EVE event displays
//!
//! This crate implements the TEA (The Elm Architecture) pattern for the
//! inspector panels: the summary tree projection, the schema-driven generic
//! editor (GED), and the fit panel. The [`Engine`] runs messages through
//! [`handler::update`] and sends the resulting remote invocations through a
//! [`dispatch::Transport`].

pub mod config;
pub mod dispatch;
pub mod editor_model;
pub mod engine;
pub mod engine_event;
pub mod fit_panel;
pub mod ged;
pub mod handler;
pub mod highlight;
pub mod message;
pub mod schema;
pub mod state;
pub mod summary;
pub mod widget;

// Re-export primary types
pub use config::Settings;
pub use dispatch::{ChannelTransport, Dispatcher, Invocation, InvocationTarget, Outgoing, Transport};
pub use engine::Engine;
pub use engine_event::EngineEvent;
pub use handler::{UpdateAction, UpdateResult};
pub use message::{FitCommand, Message, TreeSelection};
pub use schema::{SchemaEntry, SchemaRegistry, ValueKind};
pub use state::AppState;
pub use summary::{SummaryNode, SummaryTree};
