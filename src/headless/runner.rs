//! Headless mode runner - main event loop without a UI
//!
//! Reads NDJSON messages from stdin, feeds them through the engine and emits
//! JSON events to stdout.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

use eve_app::{Engine, EngineEvent, Message};
use eve_core::prelude::*;

use super::{HeadlessEvent, StdoutTransport};

/// Run in headless mode with settings from `config_dir`
pub async fn run_headless(config_dir: &Path) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("EVE inspector starting in HEADLESS mode");
    info!("Config dir: {}", config_dir.display());
    info!("═══════════════════════════════════════════════════════");

    let mut engine = Engine::load(config_dir, Arc::new(StdoutTransport))?;
    let mut events = engine.subscribe();
    HeadlessEvent::ready(&config_dir.display().to_string()).emit();

    let stdin_tx = engine.msg_sender();
    std::thread::spawn(move || {
        spawn_stdin_reader_blocking(stdin_tx);
    });

    let result = headless_event_loop(&mut engine, &mut events).await;

    engine.shutdown().await;
    info!("EVE inspector headless mode exiting");
    result
}

/// Main headless event loop
async fn headless_event_loop(
    engine: &mut Engine,
    events: &mut broadcast::Receiver<EngineEvent>,
) -> Result<()> {
    loop {
        if engine.should_quit() {
            info!("Quit requested");
            break;
        }

        match engine.msg_rx.recv().await {
            Some(msg) => {
                engine.process_message(msg);
                emit_engine_events(events);
            }
            None => {
                info!("Message channel closed");
                break;
            }
        }
    }

    Ok(())
}

/// Forward every engine event queued during the last cycle.
fn emit_engine_events(events: &mut broadcast::Receiver<EngineEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => HeadlessEvent::from_engine_event(event).emit(),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!("Dropped {} engine events", skipped);
            }
            Err(_) => break,
        }
    }
}

/// Parse one stdin line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<std::result::Result<Message, serde_json::Error>> {
    match line.trim() {
        "" => None,
        "q" | "quit" => Some(Ok(Message::Quit)),
        json => Some(serde_json::from_str(json)),
    }
}

/// Read messages from stdin until EOF or quit (blocking; run on its own thread)
fn spawn_stdin_reader_blocking(msg_tx: mpsc::Sender<Message>) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    let reader = stdin.lock();

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };

        match parse_line(&line) {
            None => {}
            Some(Ok(msg)) => {
                let quit = msg == Message::Quit;
                if msg_tx.blocking_send(msg).is_err() || quit {
                    break;
                }
            }
            Some(Err(e)) => {
                warn!("Invalid stdin message: {}", e);
                HeadlessEvent::error(format!("Invalid message: {}", e), false).emit();
            }
        }
    }

    // EOF ends the session; a closed channel just means the loop is gone
    let _ = msg_tx.blocking_send(Message::Quit);
    info!("Stdin reader exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use eve_core::ElementId;

    #[test]
    fn test_parse_line_skips_blank() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
    }

    #[test]
    fn test_parse_line_quit_shortcut() {
        assert_eq!(parse_line("q").unwrap().unwrap(), Message::Quit);
        assert_eq!(parse_line(" quit ").unwrap().unwrap(), Message::Quit);
    }

    #[test]
    fn test_parse_line_json_message() {
        let msg = parse_line(r#"{"type":"mouse_enter","element_id":5}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            msg,
            Message::MouseEnter {
                element_id: ElementId(5)
            }
        );
    }

    #[test]
    fn test_parse_line_invalid_json() {
        assert!(parse_line("{not json").unwrap().is_err());
        assert!(parse_line(r#"{"type":"teleport"}"#).unwrap().is_err());
    }
}
