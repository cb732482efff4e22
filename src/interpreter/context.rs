//! Execution contexts and the per-runtime root set
//!
//! Contexts live in a stack owned by [`RuntimeRoots`], which the heap traces
//! on every collection. Scope chains are stored innermost-last, so entering a
//! `with` or `catch` block is a `push` and leaving it a `pop`.

use std::cell::{Cell, RefCell};

use crate::ast::SourceId;
use crate::error::ErrorKind;
use crate::gc::{ObjectId, RootSource};
use crate::value::HeapValue;

/// Kind of code a context runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeType {
    Global,
    Eval,
    Function,
}

impl CodeType {
    /// Declarations made by eval code can be deleted; all others cannot.
    pub fn declarations_deletable(self) -> bool {
        matches!(self, CodeType::Eval)
    }
}

/// One frame of the context stack
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub code_type: CodeType,
    /// Objects searched for identifiers, innermost last. The global object is
    /// always the first entry.
    pub scope: Vec<ObjectId>,
    /// Where `var` and function declarations are installed
    pub variable_object: ObjectId,
    pub this: HeapValue,
    /// Function object being called, for function code
    pub function: Option<ObjectId>,
    pub source_id: SourceId,
}

impl ExecutionContext {
    fn trace(&self, visit: &mut dyn FnMut(ObjectId)) {
        for id in &self.scope {
            visit(*id);
        }
        visit(self.variable_object);
        if let Some(id) = self.this.object_id() {
            visit(id);
        }
        if let Some(id) = self.function {
            visit(id);
        }
    }
}

/// Objects every runtime keeps regardless of what scripts do
#[derive(Debug, Clone, Copy)]
pub struct Realm {
    pub global: ObjectId,
    pub object_prototype: ObjectId,
    pub function_prototype: ObjectId,
    pub array_prototype: ObjectId,
    pub string_prototype: ObjectId,
    pub number_prototype: ObjectId,
    pub boolean_prototype: ObjectId,
    pub error_prototype: ObjectId,
    pub eval_error_prototype: ObjectId,
    pub range_error_prototype: ObjectId,
    pub reference_error_prototype: ObjectId,
    pub syntax_error_prototype: ObjectId,
    pub type_error_prototype: ObjectId,
    pub uri_error_prototype: ObjectId,
    /// Preallocated RangeError thrown when the heap is full
    pub out_of_memory: ObjectId,
}

impl Realm {
    pub fn error_prototype(&self, kind: ErrorKind) -> ObjectId {
        match kind {
            ErrorKind::Error => self.error_prototype,
            ErrorKind::EvalError => self.eval_error_prototype,
            ErrorKind::RangeError => self.range_error_prototype,
            ErrorKind::ReferenceError => self.reference_error_prototype,
            ErrorKind::SyntaxError => self.syntax_error_prototype,
            ErrorKind::TypeError => self.type_error_prototype,
            ErrorKind::UriError => self.uri_error_prototype,
        }
    }

    pub fn set_error_prototype(&mut self, kind: ErrorKind, id: ObjectId) {
        let slot = match kind {
            ErrorKind::Error => &mut self.error_prototype,
            ErrorKind::EvalError => &mut self.eval_error_prototype,
            ErrorKind::RangeError => &mut self.range_error_prototype,
            ErrorKind::ReferenceError => &mut self.reference_error_prototype,
            ErrorKind::SyntaxError => &mut self.syntax_error_prototype,
            ErrorKind::TypeError => &mut self.type_error_prototype,
            ErrorKind::UriError => &mut self.uri_error_prototype,
        };
        *slot = id;
    }

    fn ids(&self) -> [ObjectId; 15] {
        [
            self.global,
            self.object_prototype,
            self.function_prototype,
            self.array_prototype,
            self.string_prototype,
            self.number_prototype,
            self.boolean_prototype,
            self.error_prototype,
            self.eval_error_prototype,
            self.range_error_prototype,
            self.reference_error_prototype,
            self.syntax_error_prototype,
            self.type_error_prototype,
            self.uri_error_prototype,
            self.out_of_memory,
        ]
    }
}

/// Root set of one runtime, registered with the heap for its lifetime.
pub struct RuntimeRoots {
    pub realm: Cell<Realm>,
    pub contexts: RefCell<Vec<ExecutionContext>>,
}

impl RuntimeRoots {
    pub fn new(realm: Realm) -> Self {
        Self {
            realm: Cell::new(realm),
            contexts: RefCell::new(Vec::new()),
        }
    }
}

impl RootSource for RuntimeRoots {
    fn trace_roots(&self, visit: &mut dyn FnMut(ObjectId)) {
        for id in self.realm.get().ids() {
            visit(id);
        }
        for context in self.contexts.borrow().iter() {
            context.trace(visit);
        }
    }
}
