//! Remote invocation dispatch.
//!
//! Edits are sent to the backend as textual method calls, `Verb( a, b )`,
//! addressed to one element by id and type. The dispatcher formats the call
//! and hands it to an injected [`Transport`]; delivery is fire-and-forget.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use eve_core::prelude::*;
use eve_core::ElementId;

// ─────────────────────────────────────────────────────────────────────────────
// Invocation
// ─────────────────────────────────────────────────────────────────────────────

/// One positional argument of a remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationArg {
    Bool(bool),
    Number(f64),
    /// Rendered inside double quotes
    Str(String),
    /// Rendered verbatim
    Raw(String),
    /// Colour component, rendered `(UChar_t)N`
    Byte(u8),
    Id(ElementId),
}

impl fmt::Display for InvocationArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationArg::Bool(b) => write!(f, "{b}"),
            InvocationArg::Number(n) => write!(f, "{n}"),
            InvocationArg::Str(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            InvocationArg::Raw(s) => f.write_str(s),
            InvocationArg::Byte(b) => write!(f, "(UChar_t){b}"),
            InvocationArg::Id(id) => write!(f, "{id}"),
        }
    }
}

/// A remote method call without its target.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub verb: String,
    pub args: Vec<InvocationArg>,
}

impl Invocation {
    pub fn new(verb: impl Into<String>, args: Vec<InvocationArg>) -> Self {
        Self {
            verb: verb.into(),
            args,
        }
    }

    /// Render the command string: `Verb( a1, a2 )`, or `Verb()` with no args.
    pub fn command(&self) -> String {
        if self.args.is_empty() {
            return format!("{}()", self.verb);
        }
        let args: Vec<String> = self.args.iter().map(ToString::to_string).collect();
        format!("{}( {} )", self.verb, args.join(", "))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command())
    }
}

/// Element a call is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationTarget {
    #[serde(rename = "fElementId")]
    pub element_id: ElementId,
    #[serde(rename = "class")]
    pub element_type: String,
}

impl InvocationTarget {
    pub fn new(element_id: ElementId, element_type: impl Into<String>) -> Self {
        Self {
            element_id,
            element_type: element_type.into(),
        }
    }
}

/// Wire form of an invocation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    #[serde(rename = "mir")]
    pub command: String,
    #[serde(flatten)]
    pub target: InvocationTarget,
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────────────────────────

/// A frame leaving the inspector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum Outgoing {
    /// Method call on a scene element
    Invocation(InvocationRequest),
    /// Prefixed fit-panel message, e.g. `DOFIT:{...}`
    Panel { text: String },
}

/// Sink for outgoing frames.
pub trait Transport: Send + Sync {
    fn send(&self, frame: Outgoing) -> Result<()>;
}

/// Transport backed by an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Outgoing>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::UnboundedSender<Outgoing>) -> Self {
        Self { tx }
    }

    /// Create a transport together with the receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outgoing>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, frame: Outgoing) -> Result<()> {
        self.tx.send(frame).map_err(|_| Error::TransportClosed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Formats invocations and forwards them through the transport.
///
/// Errors are logged and swallowed; the backend confirms edits through
/// change notifications, so a lost call shows up as an unchanged element.
/// A fatal error marks the transport lost for every clone of the dispatcher.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    lost: Arc<AtomicBool>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            lost: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a send has failed in a way no later send can recover from.
    pub fn transport_lost(&self) -> bool {
        self.lost.load(Ordering::Relaxed)
    }

    /// Send `verb(args)` to the element.
    pub fn invoke(
        &self,
        verb: &str,
        element_id: ElementId,
        element_type: &str,
        args: Vec<InvocationArg>,
    ) {
        let invocation = Invocation::new(verb, args);
        self.dispatch(&invocation, &InvocationTarget::new(element_id, element_type));
    }

    pub fn dispatch(&self, invocation: &Invocation, target: &InvocationTarget) {
        let request = InvocationRequest {
            command: invocation.command(),
            target: target.clone(),
        };
        debug!(
            "Invoking {} on {} ({})",
            request.command, target.element_id, target.element_type
        );
        self.send(Outgoing::Invocation(request));
    }

    /// Send a raw fit-panel message.
    pub fn send_panel(&self, text: impl Into<String>) {
        self.send(Outgoing::Panel { text: text.into() });
    }

    fn send(&self, frame: Outgoing) {
        match self.transport.send(frame) {
            Ok(()) => {}
            Err(e) if e.is_recoverable() => warn!("Dropped outgoing frame: {}", e),
            Err(e) => {
                error!("Outgoing frame lost: {}", e);
                if e.is_fatal() {
                    self.lost.store(true, Ordering::Relaxed);
                }
            }
        }
    }
}
