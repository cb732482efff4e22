//! Tree-walking interpreter for ECMAScript 3
//!
//! The [`Interpreter`] owns one runtime: a global object, the built-in
//! prototypes, a stack of [`ExecutionContext`]s and a registration with a
//! (possibly shared) garbage-collected [`Heap`]. Statements execute to a
//! [`Completion`]; expressions evaluate to `Result<JsValue, JsError>`.

pub mod builtins;
mod call;
pub mod context;
pub mod debugger;
mod eval;
mod exec;
mod properties;
mod reference;

use std::rc::Rc;
use std::time::{Duration, Instant};

pub use context::{CodeType, ExecutionContext, Realm};
pub use debugger::{DebugAction, Debugger, StatementEvent, TerminationHandle};
pub use exec::Completion;
pub use reference::Reference;

use crate::ast::{Program, SourceId};
use crate::config::RuntimeConfig;
use crate::error::{ErrorKind, JsError};
use crate::gc::{GcStats, Heap, ObjectId, Registration, RootSource};
use crate::parser::parse_program;
use crate::string_dict::StringDict;
use crate::value::{
    CheapClone, FunctionKind, HeapValue, JsObject, JsObjectRef, JsString, JsValue, NativeFn,
    NativeFunction, ObjectClass, ObjectKind, PropertyAttributes,
};
use context::RuntimeRoots;

/// Built-in prototype objects a host may query or replace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinPrototype {
    Object,
    Function,
    Array,
    String,
    Number,
    Boolean,
    Error(ErrorKind),
}

/// Statement currently executing, for error objects
#[derive(Debug, Clone, Copy, Default)]
struct Position {
    source_id: SourceId,
    line: u32,
}

/// The interpreter state
pub struct Interpreter {
    heap: Heap<JsObject>,
    roots: Rc<RuntimeRoots>,
    /// Unregisters the root set from the heap when the runtime is dropped
    _registration: Registration<JsObject>,
    pub(crate) strings: StringDict,
    config: RuntimeConfig,
    call_depth: usize,
    next_source_id: SourceId,
    position: Position,
    termination: TerminationHandle,
    confirm_termination: Option<Box<dyn FnMut() -> bool>>,
    debugger: Option<Box<dyn Debugger>>,
    deadline: Option<Instant>,
    /// Nesting of `evaluate` calls; per-run state resets at the outermost one
    evaluation_depth: usize,
}

impl Interpreter {
    /// Create a runtime with its own heap and default configuration.
    pub fn new() -> Result<Self, JsError> {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Result<Self, JsError> {
        Self::with_heap(Heap::new(), config)
    }

    /// Create a runtime on an existing heap. Runtimes sharing a heap can pass
    /// objects to each other; the heap settings of `config` apply to the whole
    /// heap.
    pub fn with_heap(heap: Heap<JsObject>, config: RuntimeConfig) -> Result<Self, JsError> {
        Self::build(heap, None, config)
    }

    /// Create a runtime around a host-supplied global object. The built-in
    /// constructors and functions are installed onto it.
    pub fn with_global(global: JsObjectRef, config: RuntimeConfig) -> Result<Self, JsError> {
        Self::build(global.heap(), Some(global), config)
    }

    fn build(
        heap: Heap<JsObject>,
        global: Option<JsObjectRef>,
        config: RuntimeConfig,
    ) -> Result<Self, JsError> {
        heap.set_gc_threshold(config.gc_threshold);
        heap.set_max_live(config.max_heap_objects);

        // Handles pin the core objects until the root set is registered
        let core = builtins::allocate_core_objects(&heap, global)?;
        let roots = Rc::new(RuntimeRoots::new(core.realm()));
        let source: Rc<dyn RootSource> = roots.clone();
        let registration = heap.register_roots(&source);

        let mut interp = Interpreter {
            heap,
            roots,
            _registration: registration,
            strings: StringDict::with_common_strings(),
            config,
            call_depth: 0,
            next_source_id: 1,
            position: Position::default(),
            termination: TerminationHandle::default(),
            confirm_termination: None,
            debugger: None,
            deadline: None,
            evaluation_depth: 0,
        };

        let realm = interp.realm();
        interp.push_context(ExecutionContext {
            code_type: CodeType::Global,
            scope: vec![realm.global],
            variable_object: realm.global,
            this: HeapValue::Object(realm.global),
            function: None,
            source_id: 0,
        });
        builtins::init(&mut interp)?;
        drop(core);

        tracing::debug!(
            runtimes = interp.heap.registered_runtimes(),
            "runtime created"
        );
        Ok(interp)
    }

    // ═══════════════════════════════════════════════════════════════
    // Evaluation
    // ═══════════════════════════════════════════════════════════════

    /// Parse and run `source` as global code.
    ///
    /// `this` defaults to the global object. Syntax errors, uncaught
    /// exceptions, termination and debugger aborts all come back as
    /// [`Completion::Throw`] carrying an error value.
    pub fn evaluate(&mut self, source: &str, this: Option<JsValue>) -> Completion {
        let outermost = self.evaluation_depth == 0;
        if outermost {
            self.deadline = self
                .config
                .timeout_ms
                .map(|ms| Instant::now() + Duration::from_millis(ms));
        }

        self.evaluation_depth += 1;
        let result = self.run_global_code(source, this);
        self.evaluation_depth -= 1;

        let completion = match result {
            Ok(Completion::Return(value)) => Completion::Normal(Some(value)),
            Ok(Completion::Break { value, .. } | Completion::Continue { value, .. }) => {
                Completion::Normal(value)
            }
            Ok(completion) => completion,
            Err(err) => Completion::Throw(self.error_to_value(err)),
        };

        if outermost {
            self.termination.clear();
            self.deadline = None;
        }
        if let Completion::Throw(value) = &completion {
            tracing::debug!(exception = ?value, "uncaught exception");
        }
        completion
    }

    /// Evaluate `source` and return its value, or the thrown value as
    /// [`JsError::Thrown`].
    pub fn eval(&mut self, source: &str) -> Result<JsValue, JsError> {
        match self.evaluate(source, None) {
            Completion::Throw(value) => Err(JsError::Thrown(value)),
            Completion::Normal(value) => Ok(value.unwrap_or_default()),
            Completion::Return(value) => Ok(value),
            Completion::Break { value, .. } | Completion::Continue { value, .. } => {
                Ok(value.unwrap_or_default())
            }
        }
    }

    fn run_global_code(
        &mut self,
        source: &str,
        this: Option<JsValue>,
    ) -> Result<Completion, JsError> {
        let program = self.compile(source)?;
        let realm = self.realm();
        let this = match &this {
            Some(value) if !value.is_null_or_undefined() => HeapValue::from(value),
            _ => HeapValue::Object(realm.global),
        };

        tracing::debug!(
            source_id = program.source_id,
            bytes = source.len(),
            "evaluate"
        );
        self.push_context(ExecutionContext {
            code_type: CodeType::Global,
            scope: vec![realm.global],
            variable_object: realm.global,
            this,
            function: None,
            source_id: program.source_id,
        });
        let result = self
            .instantiate_declarations(&program.declarations)
            .and_then(|()| self.execute_statements(&program.body));
        self.pop_context();
        result
    }

    /// Parse one source unit and announce it to the debugger.
    pub(crate) fn compile(&mut self, source: &str) -> Result<Program, JsError> {
        let source_id = self.next_source_id;
        self.next_source_id += 1;

        let result = parse_program(source, &mut self.strings, source_id);
        let error = result.as_ref().err();
        self.notify_debugger(|debugger| debugger.source_parsed(source_id, source, error))?;
        result
    }

    /// Call a function value from the host.
    pub fn call(
        &mut self,
        function: &JsValue,
        this: JsValue,
        args: &[JsValue],
    ) -> Result<JsValue, JsError> {
        match function {
            JsValue::Object(func) if func.borrow().is_callable() => {
                self.call_function(func, this, args)
            }
            _ => Err(JsError::type_error("value is not a function")),
        }
    }

    /// Invoke a function value as a constructor from the host.
    pub fn construct(&mut self, function: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
        match function {
            JsValue::Object(func) => self.construct_object(func, args),
            _ => Err(JsError::type_error("value is not a constructor")),
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Globals and prototypes
    // ═══════════════════════════════════════════════════════════════

    pub fn global_object(&self) -> JsObjectRef {
        self.pin(self.realm().global)
    }

    /// Snapshot of the bottom (global) execution context.
    pub fn global_context(&self) -> Option<ExecutionContext> {
        self.roots.contexts.borrow().first().cloned()
    }

    /// Number of execution contexts currently on the stack
    pub fn context_depth(&self) -> usize {
        self.roots.contexts.borrow().len()
    }

    pub fn get_global(&mut self, name: &str) -> Result<JsValue, JsError> {
        let global = self.global_object();
        self.get(&global, name)
    }

    pub fn set_global(&mut self, name: &str, value: JsValue) -> Result<(), JsError> {
        let global = self.global_object();
        self.put(&global, name, value)
    }

    /// Install a host function as a global.
    pub fn register_function(
        &mut self,
        name: &str,
        func: NativeFn,
        arity: usize,
    ) -> Result<JsObjectRef, JsError> {
        let function = self.create_native_function(name, func, arity)?;
        let global = self.global_object();
        self.define_value(
            &global,
            name,
            JsValue::Object(function.cheap_clone()),
            PropertyAttributes::DONT_ENUM,
        );
        Ok(function)
    }

    pub fn builtin_prototype(&self, which: BuiltinPrototype) -> JsObjectRef {
        let realm = self.realm();
        let id = match which {
            BuiltinPrototype::Object => realm.object_prototype,
            BuiltinPrototype::Function => realm.function_prototype,
            BuiltinPrototype::Array => realm.array_prototype,
            BuiltinPrototype::String => realm.string_prototype,
            BuiltinPrototype::Number => realm.number_prototype,
            BuiltinPrototype::Boolean => realm.boolean_prototype,
            BuiltinPrototype::Error(kind) => realm.error_prototype(kind),
        };
        self.pin(id)
    }

    /// Replace a built-in prototype. Objects created afterwards inherit from
    /// `prototype`; existing objects keep their links.
    pub fn set_builtin_prototype(&mut self, which: BuiltinPrototype, prototype: &JsObjectRef) {
        let mut realm = self.realm();
        let id = prototype.id();
        match which {
            BuiltinPrototype::Object => realm.object_prototype = id,
            BuiltinPrototype::Function => realm.function_prototype = id,
            BuiltinPrototype::Array => realm.array_prototype = id,
            BuiltinPrototype::String => realm.string_prototype = id,
            BuiltinPrototype::Number => realm.number_prototype = id,
            BuiltinPrototype::Boolean => realm.boolean_prototype = id,
            BuiltinPrototype::Error(kind) => realm.set_error_prototype(kind, id),
        }
        self.roots.realm.set(realm);
    }

    // ═══════════════════════════════════════════════════════════════
    // Heap
    // ═══════════════════════════════════════════════════════════════

    pub fn heap(&self) -> Heap<JsObject> {
        self.heap.clone()
    }

    /// Run a full collection now. Returns the number of objects freed.
    pub fn collect_garbage(&mut self) -> usize {
        self.heap.collect()
    }

    pub fn gc_stats(&self) -> GcStats {
        self.heap.stats()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    // ═══════════════════════════════════════════════════════════════
    // Debugger and termination
    // ═══════════════════════════════════════════════════════════════

    pub fn set_debugger(&mut self, debugger: Option<Box<dyn Debugger>>) {
        self.debugger = debugger;
    }

    /// Handle that requests termination of the running evaluation.
    pub fn termination_handle(&self) -> TerminationHandle {
        self.termination.clone()
    }

    /// Callback consulted when termination is requested; returning `false`
    /// vetoes the request and clears it.
    pub fn set_termination_confirm(&mut self, confirm: Option<Box<dyn FnMut() -> bool>>) {
        self.confirm_termination = confirm;
    }

    /// Fail with [`JsError::Terminated`] if termination was requested (or the
    /// deadline passed) and not vetoed.
    pub(crate) fn check_termination(&mut self) -> Result<(), JsError> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                tracing::debug!("evaluation deadline passed");
                self.termination.request();
            }
        }
        if !self.termination.is_requested() {
            return Ok(());
        }

        if let Some(confirm) = self.confirm_termination.as_mut() {
            if !confirm() {
                tracing::debug!("termination vetoed");
                self.termination.clear();
                self.deadline = None;
                return Ok(());
            }
        }
        tracing::debug!("termination confirmed");
        Err(JsError::Terminated)
    }

    pub(crate) fn notify_debugger(
        &mut self,
        callback: impl FnOnce(&mut dyn Debugger) -> DebugAction,
    ) -> Result<(), JsError> {
        let Some(debugger) = self.debugger.as_mut() else {
            return Ok(());
        };
        match callback(debugger.as_mut()) {
            DebugAction::Continue => Ok(()),
            DebugAction::Abort => {
                tracing::debug!("debugger aborted execution");
                Err(JsError::Aborted)
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Object construction helpers
    // ═══════════════════════════════════════════════════════════════

    pub fn intern(&mut self, s: &str) -> JsString {
        self.strings.get_or_insert(s)
    }

    pub(crate) fn realm(&self) -> Realm {
        self.roots.realm.get()
    }

    pub(crate) fn pin(&self, id: ObjectId) -> JsObjectRef {
        self.heap.pin(id)
    }

    pub(crate) fn alloc(&self, object: JsObject) -> Result<JsObjectRef, JsError> {
        Ok(self.heap.alloc(object)?)
    }

    /// Plain object inheriting from `Object.prototype`
    pub fn create_object(&mut self) -> Result<JsObjectRef, JsError> {
        let proto = self.realm().object_prototype;
        self.alloc(JsObject::new(ObjectClass::Object, Some(proto)))
    }

    pub fn create_array(&mut self, elements: &[JsValue]) -> Result<JsObjectRef, JsError> {
        let proto = self.realm().array_prototype;
        let mut array = JsObject::new(ObjectClass::Array, Some(proto));
        for (i, element) in elements.iter().enumerate() {
            let key = self.intern(&i.to_string());
            array.define(key, HeapValue::from(element), PropertyAttributes::empty());
        }
        let length = self.intern("length");
        array.define(
            length,
            HeapValue::Number(elements.len() as f64),
            PropertyAttributes::DONT_ENUM | PropertyAttributes::DONT_DELETE,
        );
        self.alloc(array)
    }

    /// Error object of the given constructor, tagged with the current
    /// statement's position.
    pub fn create_error(&mut self, kind: ErrorKind, message: &str) -> Result<JsObjectRef, JsError> {
        let position = self.position;
        self.create_error_at(kind, message, position.source_id, position.line)
    }

    fn create_error_at(
        &mut self,
        kind: ErrorKind,
        message: &str,
        source_id: SourceId,
        line: u32,
    ) -> Result<JsObjectRef, JsError> {
        let proto = self.realm().error_prototype(kind);
        let mut error = JsObject::new(ObjectClass::Error, Some(proto));
        if !message.is_empty() {
            error.define(
                self.intern("message"),
                HeapValue::String(JsString::from(message)),
                PropertyAttributes::empty(),
            );
        }
        if line > 0 {
            error.define(
                self.intern("line"),
                HeapValue::Number(f64::from(line)),
                PropertyAttributes::DONT_ENUM,
            );
            error.define(
                self.intern("sourceId"),
                HeapValue::Number(f64::from(source_id)),
                PropertyAttributes::DONT_ENUM,
            );
        }
        self.alloc(error)
    }

    /// Turn an error into the value a script `catch` receives.
    pub(crate) fn error_to_value(&mut self, err: JsError) -> JsValue {
        let created = match &err {
            JsError::Thrown(value) => return value.clone(),
            JsError::OutOfMemory => return JsValue::Object(self.pin(self.realm().out_of_memory)),
            JsError::SyntaxError { message, location } => {
                let source_id = location.source.unwrap_or(self.position.source_id);
                self.create_error_at(ErrorKind::SyntaxError, message, source_id, location.line)
            }
            other => {
                let kind = other.kind().unwrap_or(ErrorKind::Error);
                self.create_error(kind, &other.message())
            }
        };
        match created {
            Ok(error) => JsValue::Object(error),
            Err(_) => JsValue::Object(self.pin(self.realm().out_of_memory)),
        }
    }

    pub fn create_native_function(
        &mut self,
        name: &str,
        func: NativeFn,
        arity: usize,
    ) -> Result<JsObjectRef, JsError> {
        self.create_native(name, func, None, arity)
    }

    pub(crate) fn create_native(
        &mut self,
        name: &str,
        call: NativeFn,
        construct: Option<NativeFn>,
        arity: usize,
    ) -> Result<JsObjectRef, JsError> {
        let proto = self.realm().function_prototype;
        let name = self.intern(name);
        let mut function = JsObject::new(ObjectClass::Function, Some(proto));
        function.kind = ObjectKind::Function(FunctionKind::Native(NativeFunction {
            name,
            arity,
            call,
            construct,
        }));
        function.define(
            self.intern("length"),
            HeapValue::Number(arity as f64),
            PropertyAttributes::FIXED,
        );
        self.alloc(function)
    }

    /// Add a native method to `obj` as a non-enumerable property.
    pub fn register_method(
        &mut self,
        obj: &JsObjectRef,
        name: &str,
        func: NativeFn,
        arity: usize,
    ) -> Result<(), JsError> {
        let function = self.create_native_function(name, func, arity)?;
        self.define_value(obj, name, JsValue::Object(function), PropertyAttributes::BUILTIN);
        Ok(())
    }

    /// Install a property with explicit attributes, bypassing `ReadOnly`.
    pub fn define_value(
        &mut self,
        obj: &JsObjectRef,
        name: &str,
        value: JsValue,
        attributes: PropertyAttributes,
    ) {
        let key = self.intern(name);
        obj.borrow_mut()
            .define(key, HeapValue::from(&value), attributes);
    }

    /// Store a host-only value on `obj`. Scripts cannot see or change it.
    pub fn set_internal(&mut self, obj: &JsObjectRef, name: &str, value: &JsValue) {
        let key = self.intern(name);
        obj.borrow_mut().define(
            key,
            HeapValue::from(value),
            PropertyAttributes::INTERNAL | PropertyAttributes::DONT_DELETE,
        );
    }

    pub fn get_internal(&self, obj: &JsObjectRef, name: &str) -> Option<JsValue> {
        let value = obj
            .borrow()
            .properties
            .get(name)
            .filter(|prop| prop.is_internal())
            .map(|prop| prop.value.clone())?;
        Some(value.to_value(&self.heap))
    }

    // ═══════════════════════════════════════════════════════════════
    // Context stack
    // ═══════════════════════════════════════════════════════════════

    pub(crate) fn push_context(&mut self, context: ExecutionContext) {
        self.roots.contexts.borrow_mut().push(context);
    }

    pub(crate) fn pop_context(&mut self) {
        self.roots.contexts.borrow_mut().pop();
    }

    /// Copy of the innermost context. The bottom global context is never
    /// popped, so one always exists.
    pub(crate) fn current_context(&self) -> ExecutionContext {
        let realm = self.realm();
        self.roots
            .contexts
            .borrow()
            .last()
            .cloned()
            .unwrap_or(ExecutionContext {
                code_type: CodeType::Global,
                scope: vec![realm.global],
                variable_object: realm.global,
                this: HeapValue::Object(realm.global),
                function: None,
                source_id: 0,
            })
    }

    /// Push an object on the front of the current scope chain.
    pub(crate) fn push_scope(&mut self, id: ObjectId) {
        if let Some(context) = self.roots.contexts.borrow_mut().last_mut() {
            context.scope.push(id);
        }
    }

    pub(crate) fn pop_scope(&mut self) {
        if let Some(context) = self.roots.contexts.borrow_mut().last_mut() {
            context.scope.pop();
        }
    }

    pub(crate) fn current_this(&self) -> JsValue {
        let this = self
            .roots
            .contexts
            .borrow()
            .last()
            .map(|context| context.this.clone())
            .unwrap_or(HeapValue::Object(self.realm().global));
        this.to_value(&self.heap)
    }

    pub(crate) fn current_source_id(&self) -> SourceId {
        self.roots
            .contexts
            .borrow()
            .last()
            .map(|context| context.source_id)
            .unwrap_or_default()
    }

    pub(crate) fn set_position(&mut self, source_id: SourceId, line: u32) {
        self.position = Position { source_id, line };
    }
}
