//! Debugger hooks and external termination

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::ast::SourceId;
use crate::error::JsError;
use crate::value::JsValue;

/// Answer of a debugger callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugAction {
    #[default]
    Continue,
    /// Stop the running evaluation. Scripts cannot catch the abort.
    Abort,
}

/// Position of a statement about to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementEvent {
    pub source_id: SourceId,
    pub first_line: u32,
    pub last_line: u32,
}

/// Host hook offered a callback at every observable step of execution.
///
/// All methods default to [`DebugAction::Continue`], so an implementation
/// only overrides what it watches.
pub trait Debugger {
    /// A source unit (script, eval string or `Function` body) was compiled.
    fn source_parsed(
        &mut self,
        _source_id: SourceId,
        _source: &str,
        _error: Option<&JsError>,
    ) -> DebugAction {
        DebugAction::Continue
    }

    fn at_statement(&mut self, _event: StatementEvent) -> DebugAction {
        DebugAction::Continue
    }

    fn enter_function(&mut self, _name: Option<&str>, _depth: usize) -> DebugAction {
        DebugAction::Continue
    }

    fn exit_function(&mut self, _name: Option<&str>, _depth: usize) -> DebugAction {
        DebugAction::Continue
    }

    /// A value is being thrown, before any `catch` sees it.
    fn exception(&mut self, _value: &JsValue) -> DebugAction {
        DebugAction::Continue
    }
}

/// Thread-safe switch that asks a running evaluation to stop.
///
/// The interpreter polls it at function entry and exit and on every loop
/// iteration. A watchdog thread may hold a clone.
#[derive(Debug, Clone, Default)]
pub struct TerminationHandle(Arc<AtomicBool>);

impl TerminationHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
