// Tests for strategy ordering and container prioritization

use serde_json::json;
use std::sync::{Arc, Mutex};
use trajfind_core::config::Strategy;
use trajfind_core::error::LocateError;
use trajfind_core::locate::TrajectoryLocator;
use trajfind_scanner::HostValue;
use trajfind_scanner::graph::HostObject;

const PREFERRED: &str = ".props.taskResponse.questions";

fn fr_entry(text: &str) -> serde_json::Value {
    json!({"item_type": "fr", "text": text})
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (result, logs)
}

// ============================================================================
// Strategy Ordering Tests
// ============================================================================

#[test]
fn test_second_strategy_used_when_first_root_missing() {
    let doc = json!({
        "app": {"page": {"questions": {"q": fr_entry(r#"{"uuid":"t1","steps":[]}"#)}}}
    });
    let locator = TrajectoryLocator::new(vec![
        Strategy::new("hybrid.forms.validations", PREFERRED),
        Strategy::new("", PREFERRED),
    ]);

    assert!(matches!(
        locator.locate_with(&&doc, &locator.strategies()[0]),
        Err(LocateError::PathNotFound(_))
    ));

    let (record, logs) = capture_warnings(|| locator.locate(&&doc));
    let record = record.expect("second strategy should find the record");
    assert_eq!(record.uuid(), &json!("t1"));
    assert_eq!(record.location(), "app.page.questions.q");

    assert!(logs.contains("WARN"));
    assert!(logs.contains("Strategy 1: Base object not found at path 'hybrid.forms.validations'"));
    assert!(!logs.contains("Strategy 2"));
}

#[test]
fn test_first_strategy_wins_when_both_match() {
    let doc = json!({
        "hybrid": {"forms": {"validations": {
            "questions": {"q": fr_entry(r#"{"uuid":"scoped","steps":[]}"#)}
        }}},
        "elsewhere": {"questions": {"q": fr_entry(r#"{"uuid":"global","steps":[]}"#)}}
    });
    let locator = TrajectoryLocator::new(Strategy::default_strategies());

    let record = locator.locate(&&doc).unwrap();
    assert_eq!(record.uuid(), &json!("scoped"));
    // Paths are relative to the strategy root
    assert_eq!(record.location(), "questions.q");
}

#[test]
fn test_no_strategy_matches() {
    let doc = json!({"nothing": {"here": 1}});
    let locator = TrajectoryLocator::new(Strategy::default_strategies());
    assert!(locator.locate(&&doc).is_none());
}

#[test]
fn test_falsy_root_segment_skips_strategy() {
    let doc = json!({
        "hybrid": {"forms": 0},
        "x": {"questions": {"q": fr_entry(r#"{"uuid":"ok","steps":[]}"#)}}
    });
    let locator = TrajectoryLocator::new(Strategy::default_strategies());

    assert!(matches!(
        locator.locate_with(&&doc, &locator.strategies()[0]),
        Err(LocateError::PathNotFound(_))
    ));
    assert_eq!(locator.locate(&&doc).unwrap().uuid(), &json!("ok"));
}

// ============================================================================
// Preferred Path Tests
// ============================================================================

#[test]
fn test_fallback_group_tried_after_preferred_exhausted() {
    let doc = json!({
        "a": {"props": {"taskResponse": {"questions": {
            "q": fr_entry(r#"{"not":"a trajectory"}"#)
        }}}},
        "b": {"questions": {"q": fr_entry(r#"{"uuid":"from-b","steps":[]}"#)}}
    });
    let locator = TrajectoryLocator::new(vec![Strategy::new("", PREFERRED)]);

    let record = locator.locate(&&doc).unwrap();
    assert_eq!(record.uuid(), &json!("from-b"));
    assert_eq!(record.location(), "b.questions.q");
}

#[test]
fn test_preferred_group_beats_discovery_order() {
    let doc = json!({
        "early": {"questions": {"q": fr_entry(r#"{"uuid":"early","steps":[]}"#)}},
        "late": {"props": {"taskResponse": {"questions": {
            "q": fr_entry(r#"{"uuid":"late","steps":[]}"#)
        }}}}
    });
    let locator = TrajectoryLocator::new(vec![Strategy::new("", PREFERRED)]);
    assert_eq!(locator.locate(&&doc).unwrap().uuid(), &json!("late"));
}

#[test]
fn test_malformed_entry_then_valid_entry() {
    let doc = json!({
        "questions": {
            "broken": fr_entry("{not json"),
            "good": fr_entry(r#"{"uuid":"x","steps":[]}"#)
        }
    });
    let locator = TrajectoryLocator::new(vec![Strategy::new("", PREFERRED)]);

    let (record, logs) = capture_warnings(|| locator.locate(&&doc));
    assert_eq!(record.unwrap().as_value(), &json!({"uuid": "x", "steps": []}));
    assert!(logs.contains("Failed to parse entry at questions.broken"));
}

// ============================================================================
// Live Graph Tests
// ============================================================================

#[test]
fn test_cyclic_live_graph_is_searched() {
    let window = HostObject::new();
    window.set("window", window.clone());

    let questions = HostObject::new();
    questions.set(
        "q",
        HostValue::object([
            ("item_type", HostValue::from("fr")),
            ("text", HostValue::from(r#"{"uuid":"cyclic","steps":[1,2]}"#)),
        ]),
    );
    let props = HostObject::new();
    props.set("parent", window.clone());
    props.set("questions", questions);
    window.set("page", HostValue::object([("props", HostValue::from(props))]));

    let locator = TrajectoryLocator::new(vec![Strategy::new("", PREFERRED)]);
    let record = locator.locate(&HostValue::from(window)).unwrap();

    assert_eq!(record.uuid(), &json!("cyclic"));
    assert_eq!(record.step_count(), Some(2));
    assert_eq!(record.location(), "page.props.questions.q");
}

#[test]
fn test_record_is_detached_from_live_graph() {
    let entry = HostObject::new();
    entry.set("item_type", "fr");
    entry.set("text", r#"{"uuid":"before","steps":[]}"#);
    let root = HostValue::object([(
        "questions",
        HostValue::object([("q", HostValue::from(entry.clone()))]),
    )]);

    let locator = TrajectoryLocator::new(vec![Strategy::new("", PREFERRED)]);
    let record = locator.locate(&root).unwrap();

    entry.set("text", r#"{"uuid":"after","steps":[]}"#);
    assert_eq!(record.uuid(), &json!("before"));
}
