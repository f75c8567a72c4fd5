//! Headless mode - NDJSON in, NDJSON out
//!
//! Messages are read from stdin, one JSON [`Message`](eve_app::Message) per
//! line. Everything the inspector would send to the backend, plus the state
//! changes the engine reports, is written to stdout as one JSON event per
//! line.
//!
//! # Example Output
//!
//! ```json
//! {"event":"ready","config_dir":".","timestamp":1704700001000}
//! {"event":"summary_rebuilt","generation":1,"nodes":4,"timestamp":1704700001005}
//! {"event":"invoke","command":"SetLineWidth( 3 )","element_id":5,"element_type":"ROOT::Experimental::REveTrack","timestamp":1704700002000}
//! {"event":"panel","text":"GETPARS:gaus","timestamp":1704700003000}
//! ```

pub mod runner;

use std::io::{self, Write};

use chrono::Utc;
use serde::Serialize;
use tracing::error;

use eve_app::{EngineEvent, Outgoing, Transport};
use eve_core::{ElementId, Result};

/// Events emitted in headless mode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// Engine created and listening on stdin
    Ready { config_dir: String, timestamp: i64 },

    /// Remote method call on a scene element
    Invoke {
        command: String,
        element_id: ElementId,
        element_type: String,
        timestamp: i64,
    },

    /// Prefixed fit-panel frame
    Panel { text: String, timestamp: i64 },

    SummaryRebuilt {
        generation: u64,
        nodes: usize,
        timestamp: i64,
    },

    EditorOpened {
        element_id: ElementId,
        path: String,
        title: String,
        controls: usize,
        timestamp: i64,
    },

    EditorClosed { element_id: ElementId, timestamp: i64 },

    FitHistoryChanged {
        len: usize,
        cursor: usize,
        timestamp: i64,
    },

    /// Error occurred
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let mut stdout = io::stdout().lock();
        if let Err(e) = self.write_to(&mut stdout) {
            error!("Failed to write headless event to stdout: {}", e);
        }
    }

    /// Write this event as one NDJSON line and flush.
    pub fn write_to(&self, out: &mut impl Write) -> Result<()> {
        let json = serde_json::to_string(self)?;
        writeln!(out, "{}", json)?;
        out.flush()?;
        Ok(())
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ─────────────────────────────────────────────────────────
    // Convenience constructors
    // ─────────────────────────────────────────────────────────

    pub fn ready(config_dir: &str) -> Self {
        Self::Ready {
            config_dir: config_dir.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: Self::now(),
        }
    }

    pub fn from_outgoing(frame: Outgoing) -> Self {
        let timestamp = Self::now();
        match frame {
            Outgoing::Invocation(request) => Self::Invoke {
                command: request.command,
                element_id: request.target.element_id,
                element_type: request.target.element_type,
                timestamp,
            },
            Outgoing::Panel { text } => Self::Panel { text, timestamp },
        }
    }

    pub fn from_engine_event(event: EngineEvent) -> Self {
        let timestamp = Self::now();
        match event {
            EngineEvent::SummaryRebuilt { generation, nodes } => Self::SummaryRebuilt {
                generation,
                nodes,
                timestamp,
            },
            EngineEvent::EditorOpened {
                element_id,
                path,
                title,
                controls,
            } => Self::EditorOpened {
                element_id,
                path,
                title,
                controls,
                timestamp,
            },
            EngineEvent::EditorClosed { element_id } => Self::EditorClosed {
                element_id,
                timestamp,
            },
            EngineEvent::FitHistoryChanged { len, cursor } => Self::FitHistoryChanged {
                len,
                cursor,
                timestamp,
            },
        }
    }
}

/// Transport that prints every outgoing frame as a headless event.
#[derive(Debug, Default)]
pub struct StdoutTransport;

impl Transport for StdoutTransport {
    fn send(&self, frame: Outgoing) -> Result<()> {
        let mut stdout = io::stdout().lock();
        HeadlessEvent::from_outgoing(frame).write_to(&mut stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eve_app::dispatch::{InvocationRequest, InvocationTarget};

    fn line(event: &HeadlessEvent) -> serde_json::Value {
        let mut buf = Vec::new();
        tokio_test::assert_ok!(event.write_to(&mut buf));
        let text = String::from_utf8(buf).expect("not utf-8");
        assert!(text.ends_with('\n'));
        serde_json::from_str(text.trim_end()).expect("invalid JSON")
    }

    #[test]
    fn test_invocation_event_shape() {
        let event = HeadlessEvent::from_outgoing(Outgoing::Invocation(InvocationRequest {
            command: "SetRnrSelf( true )".into(),
            target: InvocationTarget::new(ElementId(5), "ROOT::Experimental::REveTrack"),
        }));
        let value = line(&event);

        assert_eq!(value["event"], "invoke");
        assert_eq!(value["command"], "SetRnrSelf( true )");
        assert_eq!(value["element_id"], 5);
        assert!(value["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_panel_event_shape() {
        let event = HeadlessEvent::from_outgoing(Outgoing::Panel {
            text: "GETPARS:gaus".into(),
        });
        let value = line(&event);
        assert_eq!(value["event"], "panel");
        assert_eq!(value["text"], "GETPARS:gaus");
    }

    #[test]
    fn test_engine_event_conversion() {
        let event = HeadlessEvent::from_engine_event(EngineEvent::EditorClosed {
            element_id: ElementId(9),
        });
        let value = line(&event);
        assert_eq!(value["event"], "editor_closed");
        assert_eq!(value["element_id"], 9);
    }

    #[test]
    fn test_error_event() {
        let value = line(&HeadlessEvent::error("bad line".into(), false));
        assert_eq!(value["event"], "error");
        assert_eq!(value["fatal"], false);
    }
}
