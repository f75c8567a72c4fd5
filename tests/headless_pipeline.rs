//! End-to-end tests: scene dump + NDJSON script through the engine

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use eve_app::config::{load_settings, Settings};
use eve_app::{ChannelTransport, Engine, EngineEvent, Message, Outgoing};
use eve_core::{Element, ElementId, SceneNotification};
use eve_inspector::headless::runner::parse_line;
use eve_inspector::headless::HeadlessEvent;
use eve_inspector::inspect;

const SCENE: &str = include_str!("fixtures/scene.json");

fn fixture_roots() -> Vec<Element> {
    serde_json::from_str(SCENE).expect("fixture scene must parse")
}

fn init_line() -> String {
    let msg = Message::Scene(SceneNotification::ManagerInit {
        roots: fixture_roots(),
    });
    serde_json::to_string(&msg).unwrap()
}

fn engine(settings: Settings) -> (Engine, UnboundedReceiver<Outgoing>) {
    let (transport, rx) = ChannelTransport::channel();
    let engine = Engine::new(settings, Arc::new(transport)).unwrap();
    (engine, rx)
}

/// Feed NDJSON lines to the engine, skipping blanks.
fn feed(engine: &mut Engine, script: &[&str]) {
    for line in script {
        if let Some(parsed) = parse_line(line) {
            engine.process_message(parsed.expect("script line must parse"));
        }
    }
}

fn commands(rx: &mut UnboundedReceiver<Outgoing>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        match HeadlessEvent::from_outgoing(frame) {
            HeadlessEvent::Invoke { command, .. } => out.push(command),
            HeadlessEvent::Panel { text, .. } => out.push(text),
            other => panic!("unexpected event {other:?}"),
        }
    }
    out
}

#[test]
fn test_fixture_summary() {
    let state = inspect::load_state(Settings::default(), fixture_roots()).unwrap();
    let text = inspect::render_summary(&state);

    assert_eq!(text.lines().count(), 6);
    assert!(text.contains("pT 4.2 GeV (/0/childs/0/childs/0)"));
    assert!(text.contains("Global Highlight (/1)"));
    // the anonymous line set has no schema and no children
    assert!(!text.contains("[12]"));
}

#[test]
fn test_fixture_editor_dump() {
    let mut state = inspect::load_state(Settings::default(), fixture_roots()).unwrap();
    let json = inspect::render_editor(&mut state, ElementId(20)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["model"]["title"], "Jets (REveDataCollection)");
    let labels: Vec<&str> = value["model"]["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, ["FilterExpr", "CollectionVisible", "CollectionColor"]);
}

#[test]
fn test_config_schema_makes_element_editable() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".eve")).unwrap();
    std::fs::write(
        dir.path().join(".eve/config.toml"),
        r#"
[[schema]]
class = "REveStraightLineSet"
sub = ["REveElement"]
entries = [{ name = "LineWidth", type = "Number" }]
"#,
    )
    .unwrap();

    let settings = load_settings(dir.path());
    let mut state = inspect::load_state(settings, fixture_roots()).unwrap();
    assert_eq!(state.summary.len(), 7);

    let json = inspect::render_editor(&mut state, ElementId(12)).unwrap();
    assert!(json.contains("SetLineWidth"));
}

#[test]
fn test_load_roots_from_file() {
    let roots = inspect::load_roots(Path::new("tests/fixtures/scene.json")).unwrap();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[0].children.len(), 2);
}

#[tokio::test]
async fn test_editor_session_script() {
    let (mut engine, mut rx) = engine(Settings::default());
    let mut events = engine.subscribe();
    let init = init_line();

    feed(
        &mut engine,
        &[
            init.as_str(),
            "",
            r#"{"type":"detail_pressed","path":"/0/childs/1"}"#,
            r#"{"type":"control_edited","index":0,"event":{"kind":"text","value":"i.Pt() > 10"}}"#,
            r#"{"type":"control_edited","index":1,"event":{"kind":"toggle","checked":false}}"#,
            r#"{"type":"control_edited","index":2,"event":{"kind":"color","value":"red"}}"#,
            r#"{"type":"control_edited","index":2,"event":{"kind":"color","value":"no-such-colour"}}"#,
            r#"{"type":"selection_changed","items":[{"path":"/0/childs/0/childs/0","selected":false}]}"#,
        ],
    );

    assert_eq!(
        commands(&mut rx),
        [
            r#"SetFilterExpr( "i.Pt() > 10" )"#,
            "SetCollectionVisible( false )",
            "SetCollectionColorRGB( (UChar_t)255, (UChar_t)0, (UChar_t)0 )",
            "SetRnrSelf( false )",
        ]
    );

    assert!(matches!(
        events.try_recv().unwrap(),
        EngineEvent::SummaryRebuilt { nodes: 6, .. }
    ));
    assert!(matches!(
        events.try_recv().unwrap(),
        EngineEvent::EditorOpened {
            element_id: ElementId(20),
            controls: 3,
            ..
        }
    ));
}

#[tokio::test]
async fn test_batched_update_rebuilds_once_and_closes_editor() {
    let (mut engine, _rx) = engine(Settings::default());
    let mut events = engine.subscribe();
    let init = init_line();

    feed(
        &mut engine,
        &[
            init.as_str(),
            r#"{"type":"detail_pressed","path":"/0/childs/0/childs/0"}"#,
            r#"{"type":"scene","kind":"begin_changes"}"#,
            r#"{"type":"scene","kind":"elements_removed","ids":[21]}"#,
            r#"{"type":"scene","kind":"element_changed","fElementId":11,"fName":"Track 1","_typename":"ROOT::Experimental::REveTrack","fLineWidth":5}"#,
            r#"{"type":"scene","kind":"end_changes"}"#,
        ],
    );

    let collected: Vec<EngineEvent> = std::iter::from_fn(|| events.try_recv().ok()).collect();
    let rebuilds = collected
        .iter()
        .filter(|e| matches!(e, EngineEvent::SummaryRebuilt { .. }))
        .count();
    assert_eq!(rebuilds, 2, "one for init, one for the batch");
    assert!(collected.contains(&EngineEvent::EditorClosed {
        element_id: ElementId(11)
    }));
    assert_eq!(engine.state.summary.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_hover_burst_is_debounced() {
    let (mut engine, mut rx) = engine(Settings::default());
    let init = init_line();

    feed(
        &mut engine,
        &[
            init.as_str(),
            r#"{"type":"mouse_enter","element_id":10}"#,
            r#"{"type":"mouse_enter","element_id":11}"#,
            r#"{"type":"mouse_leave"}"#,
            r#"{"type":"mouse_enter","element_id":20}"#,
        ],
    );
    assert!(commands(&mut rx).is_empty());

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(commands(&mut rx), ["NewElementPicked( 20, false, false )"]);
}

#[tokio::test]
async fn test_fit_panel_script() {
    let (mut engine, mut rx) = engine(Settings::default());
    let mut events = engine.subscribe();

    feed(
        &mut engine,
        &[
            r#"{"type":"panel","text":"MODEL:{\"fFuncChange\":\"gaus\",\"fMinLibrary\":\"Minuit\"}"}"#,
            r#"{"type":"fit","command":"select_function","name":"expo"}"#,
            r#"{"type":"panel","text":"PARS:[{\"name\":\"Slope\",\"value\":-1.0}]"}"#,
            r#"{"type":"fit","command":"apply_pars"}"#,
            r#"{"type":"fit","command":"do_fit","min_library":"Minuit2"}"#,
        ],
    );

    let frames = commands(&mut rx);
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0], "GETPARS:expo");
    assert!(frames[1].starts_with("SETPARS:["));
    assert!(frames[1].contains("Slope"));
    assert!(frames[2].starts_with("DOFIT:"));
    assert!(frames[2].contains("\"fMinLibrary\":\"Minuit2\""));

    let history: Vec<EngineEvent> = std::iter::from_fn(|| events.try_recv().ok()).collect();
    assert_eq!(
        history.last(),
        Some(&EngineEvent::FitHistoryChanged { len: 2, cursor: 1 })
    );
}
