//! Tests for the debugger hooks

use std::cell::RefCell;
use std::rc::Rc;

use super::create_test_runtime;
use jsrt::{DebugAction, Debugger, Interpreter, JsError, JsValue, StatementEvent};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Parsed { source_id: u32, failed: bool },
    Statement(u32),
    Enter(Option<String>, usize),
    Exit(Option<String>, usize),
    Exception(String),
}

/// Records every callback; aborts at a chosen statement line if asked
#[derive(Default)]
struct Recorder {
    events: Rc<RefCell<Vec<Event>>>,
    abort_at_line: Option<u32>,
    abort_on_enter: Option<&'static str>,
}

impl Debugger for Recorder {
    fn source_parsed(
        &mut self,
        source_id: u32,
        _source: &str,
        error: Option<&JsError>,
    ) -> DebugAction {
        self.events.borrow_mut().push(Event::Parsed {
            source_id,
            failed: error.is_some(),
        });
        DebugAction::Continue
    }

    fn at_statement(&mut self, event: StatementEvent) -> DebugAction {
        self.events.borrow_mut().push(Event::Statement(event.first_line));
        if self.abort_at_line == Some(event.first_line) {
            DebugAction::Abort
        } else {
            DebugAction::Continue
        }
    }

    fn enter_function(&mut self, name: Option<&str>, depth: usize) -> DebugAction {
        self.events
            .borrow_mut()
            .push(Event::Enter(name.map(String::from), depth));
        if name.is_some() && name == self.abort_on_enter {
            DebugAction::Abort
        } else {
            DebugAction::Continue
        }
    }

    fn exit_function(&mut self, name: Option<&str>, depth: usize) -> DebugAction {
        self.events
            .borrow_mut()
            .push(Event::Exit(name.map(String::from), depth));
        DebugAction::Continue
    }

    fn exception(&mut self, value: &JsValue) -> DebugAction {
        let rendered = match value {
            JsValue::Object(_) => "[object]".to_string(),
            other => format!("{:?}", other),
        };
        self.events.borrow_mut().push(Event::Exception(rendered));
        DebugAction::Continue
    }
}

fn attach(interp: &mut Interpreter, recorder: Recorder) -> Rc<RefCell<Vec<Event>>> {
    let events = recorder.events.clone();
    interp.set_debugger(Some(Box::new(recorder)));
    events
}

fn statement_lines(events: &[Event]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Statement(line) => Some(*line),
            _ => None,
        })
        .collect()
}

#[test]
fn test_source_parsed_is_reported() {
    let mut interp = create_test_runtime();
    let events = attach(&mut interp, Recorder::default());

    assert!(interp.eval("1;").is_ok());
    assert!(interp.eval("var = ;").is_err());

    let parsed: Vec<Event> = events
        .borrow()
        .iter()
        .filter(|event| matches!(event, Event::Parsed { .. }))
        .cloned()
        .collect();
    assert_eq!(
        parsed,
        vec![
            Event::Parsed { source_id: 1, failed: false },
            Event::Parsed { source_id: 2, failed: true },
        ]
    );
}

#[test]
fn test_eval_and_function_constructor_sources_are_reported() {
    let mut interp = create_test_runtime();
    let events = attach(&mut interp, Recorder::default());
    assert!(interp.eval("eval('1'); Function('return 2');").is_ok());

    let count = events
        .borrow()
        .iter()
        .filter(|event| matches!(event, Event::Parsed { failed: false, .. }))
        .count();
    assert_eq!(count, 3);
}

#[test]
fn test_statement_callbacks_follow_lines() {
    let mut interp = create_test_runtime();
    let events = attach(&mut interp, Recorder::default());

    let source = "var a = 1;\nvar b = 2;\nif (a) {\n  b = 3;\n}";
    assert!(interp.eval(source).is_ok());
    assert_eq!(statement_lines(&events.borrow()), vec![1, 2, 3, 4]);
}

#[test]
fn test_function_enter_and_exit() {
    let mut interp = create_test_runtime();
    let events = attach(&mut interp, Recorder::default());

    let source = "function f() { return g(); }\nfunction g() { return 1; }\nf();";
    assert!(interp.eval(source).is_ok());

    let calls: Vec<Event> = events
        .borrow()
        .iter()
        .filter(|event| matches!(event, Event::Enter(..) | Event::Exit(..)))
        .cloned()
        .collect();
    assert_eq!(
        calls,
        vec![
            Event::Enter(Some("f".into()), 1),
            Event::Enter(Some("g".into()), 2),
            Event::Exit(Some("g".into()), 2),
            Event::Exit(Some("f".into()), 1),
        ]
    );
}

#[test]
fn test_anonymous_function_has_no_name() {
    let mut interp = create_test_runtime();
    let events = attach(&mut interp, Recorder::default());
    assert!(interp.eval("(function () {})();").is_ok());
    assert!(events.borrow().contains(&Event::Enter(None, 1)));
}

#[test]
fn test_exception_callback_fires_once_per_throw() {
    let mut interp = create_test_runtime();
    let events = attach(&mut interp, Recorder::default());

    let source = "function f() { throw 'inner'; }\ntry { f(); } catch (e) {}\ntry { null.x; } catch (e) {}";
    assert!(interp.eval(source).is_ok());

    let exceptions: Vec<Event> = events
        .borrow()
        .iter()
        .filter(|event| matches!(event, Event::Exception(_)))
        .cloned()
        .collect();
    assert_eq!(
        exceptions,
        vec![
            Event::Exception("\"inner\"".into()),
            Event::Exception("[object]".into()),
        ]
    );
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_abort_at_statement() {
    let mut interp = create_test_runtime();
    let recorder = Recorder {
        abort_at_line: Some(2),
        ..Recorder::default()
    };
    attach(&mut interp, recorder);

    let result = interp.eval("var a = 1;\nvar b = 2;\nvar c = 3;");
    let Err(JsError::Thrown(JsValue::Object(error))) = result else {
        panic!("expected the abort to surface as a thrown error");
    };
    assert_eq!(
        interp.get(&error, "message").unwrap(),
        JsValue::from("Execution aborted by debugger")
    );

    interp.set_debugger(None);
    assert_eq!(interp.get_global("a").unwrap(), JsValue::Number(1.0));
    assert_eq!(interp.get_global("b").unwrap(), JsValue::Undefined);
    assert_eq!(interp.get_global("c").unwrap(), JsValue::Undefined);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_abort_cannot_be_caught() {
    let mut interp = create_test_runtime();
    let recorder = Recorder {
        abort_at_line: Some(3),
        ..Recorder::default()
    };
    attach(&mut interp, recorder);

    let source = "var caught = false, cleaned = false;\ntry {\n  var x = 1;\n} catch (e) {\n  caught = true;\n} finally {\n  cleaned = true;\n}";
    assert!(interp.eval(source).is_err());

    interp.set_debugger(None);
    assert_eq!(interp.get_global("caught").unwrap(), JsValue::Boolean(false));
    assert_eq!(interp.get_global("cleaned").unwrap(), JsValue::Boolean(true));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_abort_on_function_entry_skips_body() {
    let mut interp = create_test_runtime();
    let recorder = Recorder {
        abort_on_enter: Some("guarded"),
        ..Recorder::default()
    };
    attach(&mut interp, recorder);

    let result = interp.eval("var ran = false;\nfunction guarded() { ran = true; }\nguarded();");
    assert!(result.is_err());

    interp.set_debugger(None);
    assert_eq!(interp.get_global("ran").unwrap(), JsValue::Boolean(false));
    assert_eq!(interp.context_depth(), 1);
}

#[test]
fn test_removed_debugger_sees_nothing() {
    let mut interp = create_test_runtime();
    let events = attach(&mut interp, Recorder::default());
    interp.set_debugger(None);
    assert!(interp.eval("var quiet = 1;").is_ok());
    assert!(events.borrow().is_empty());
}
