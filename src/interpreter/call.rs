//! Function call protocol
//!
//! A script call allocates an activation object, binds parameters and the
//! `arguments` object onto it, and runs the body in a new execution context
//! whose scope chain is the function's captured chain plus the activation.

use std::rc::Rc;

use super::{CodeType, Completion, ExecutionContext, Interpreter};
use crate::ast::{Declarations, FunctionData};
use crate::error::JsError;
use crate::gc::ObjectId;
use crate::stack::ensure_sufficient_stack;
use crate::value::{
    ArgumentsData, CheapClone, FunctionKind, HeapValue, JsObject, JsObjectRef, JsString, JsValue,
    NativeFunction, ObjectClass, ObjectKind, PropertyAttributes, ScriptFunction,
};

impl Interpreter {
    /// [[Call]] on a function object.
    pub(crate) fn call_function(
        &mut self,
        func: &JsObjectRef,
        this: JsValue,
        args: &[JsValue],
    ) -> Result<JsValue, JsError> {
        let Some(kind) = func.borrow().function().cloned() else {
            return Err(JsError::type_error("value is not a function"));
        };

        if self.call_depth >= self.config.max_call_depth {
            tracing::warn!(depth = self.call_depth, "call depth limit reached");
            return Err(JsError::range_error("Maximum call stack size exceeded"));
        }
        self.check_termination()?;

        // A missing `this` is the global object for every kind of function
        let this = if this.is_null_or_undefined() {
            JsValue::Object(self.global_object())
        } else {
            this
        };
        let name = kind.name().map(CheapClone::cheap_clone);
        let label = name.as_ref().map(JsString::as_str);
        self.call_depth += 1;
        let depth = self.call_depth;
        let saved_position = self.position;
        tracing::trace!(function = label.unwrap_or("anonymous"), depth, "enter function");

        let result = match self.notify_debugger(|debugger| debugger.enter_function(label, depth)) {
            Ok(()) => match &kind {
                FunctionKind::Native(native) => (native.call)(self, this, args),
                FunctionKind::Script(script) => {
                    ensure_sufficient_stack(|| self.call_script(func, script, this, args))
                }
            },
            Err(err) => Err(err),
        };

        self.position = saved_position;
        let exited = self.notify_debugger(|debugger| debugger.exit_function(label, depth));
        self.call_depth -= 1;
        tracing::trace!(function = label.unwrap_or("anonymous"), depth, "exit function");

        let value = result?;
        exited?;
        self.check_termination()?;
        Ok(value)
    }

    fn call_script(
        &mut self,
        func: &JsObjectRef,
        script: &ScriptFunction,
        this: JsValue,
        args: &[JsValue],
    ) -> Result<JsValue, JsError> {
        let code = &script.code;
        let this = match this {
            JsValue::Object(obj) => JsValue::Object(obj),
            primitive => JsValue::Object(self.to_object(&primitive)?),
        };

        let activation = self.alloc(JsObject::new(ObjectClass::Activation, None))?;
        let arguments = self.create_arguments_object(func, &activation, &code.params, args)?;
        {
            let arguments_key = self.intern("arguments");
            let mut record = activation.borrow_mut();
            record.define(
                arguments_key,
                HeapValue::Object(arguments.id()),
                PropertyAttributes::DONT_DELETE,
            );
            // Sequential binding: with duplicate names the last one wins
            for (i, param) in code.params.iter().enumerate() {
                let value = args.get(i).map(HeapValue::from).unwrap_or_default();
                record.define(param.cheap_clone(), value, PropertyAttributes::DONT_DELETE);
            }
        }

        let mut scope = script.scope.clone();
        scope.push(activation.id());
        self.push_context(ExecutionContext {
            code_type: CodeType::Function,
            scope,
            variable_object: activation.id(),
            this: HeapValue::from(&this),
            function: Some(func.id()),
            source_id: code.source_id,
        });
        let result = self
            .instantiate_declarations(&code.declarations)
            .and_then(|()| self.execute_statements(&code.body));
        self.pop_context();

        match result? {
            Completion::Return(value) => Ok(value),
            Completion::Throw(value) => Err(JsError::Thrown(value)),
            Completion::Normal(_) | Completion::Break { .. } | Completion::Continue { .. } => {
                Ok(JsValue::Undefined)
            }
        }
    }

    /// The `arguments` object of one call. Index `i` aliases parameter `i`
    /// unless a later parameter reuses the same name.
    fn create_arguments_object(
        &mut self,
        func: &JsObjectRef,
        activation: &JsObjectRef,
        params: &[JsString],
        args: &[JsValue],
    ) -> Result<JsObjectRef, JsError> {
        let proto = self.realm().object_prototype;
        let mut arguments = JsObject::new(ObjectClass::Arguments, Some(proto));
        arguments.define(
            self.intern("callee"),
            HeapValue::Object(func.id()),
            PropertyAttributes::DONT_ENUM,
        );
        arguments.define(
            self.intern("length"),
            HeapValue::Number(args.len() as f64),
            PropertyAttributes::DONT_ENUM,
        );
        for (i, arg) in args.iter().enumerate() {
            let key = self.intern(&i.to_string());
            arguments.define(key, HeapValue::from(arg), PropertyAttributes::DONT_ENUM);
        }

        let mapped = params
            .iter()
            .take(args.len())
            .enumerate()
            .map(|(i, name)| {
                let shadowed = params
                    .get(i + 1..)
                    .is_some_and(|later| later.contains(name));
                (!shadowed).then(|| name.cheap_clone())
            })
            .collect();
        arguments.kind = ObjectKind::Arguments(ArgumentsData {
            activation: activation.id(),
            mapped,
        });
        self.alloc(arguments)
    }

    /// Variable instantiation for the current context: hoisted functions
    /// first (replacing existing bindings), then `var` names not yet bound.
    pub(crate) fn instantiate_declarations(
        &mut self,
        declarations: &Declarations,
    ) -> Result<(), JsError> {
        let context = self.current_context();
        let variable_object = self.pin(context.variable_object);
        let attributes = if context.code_type.declarations_deletable() {
            PropertyAttributes::empty()
        } else {
            PropertyAttributes::DONT_DELETE
        };

        for function in &declarations.functions {
            let Some(name) = &function.name else {
                continue;
            };
            let func = self.create_script_function(function, context.scope.clone())?;
            variable_object.borrow_mut().define(
                name.cheap_clone(),
                HeapValue::Object(func.id()),
                attributes,
            );
        }

        for name in &declarations.vars {
            let mut object = variable_object.borrow_mut();
            if !object.has_own(name.as_str()) {
                object.define(name.cheap_clone(), HeapValue::Undefined, attributes);
            }
        }
        Ok(())
    }

    /// Function object closing over `scope`. Every id in `scope` must be
    /// reachable from a root while this allocates.
    pub(crate) fn create_script_function(
        &mut self,
        code: &Rc<FunctionData>,
        scope: Vec<ObjectId>,
    ) -> Result<JsObjectRef, JsError> {
        let realm = self.realm();
        let mut object = JsObject::new(ObjectClass::Function, Some(realm.function_prototype));
        object.define(
            self.intern("length"),
            HeapValue::Number(code.params.len() as f64),
            PropertyAttributes::FIXED,
        );
        object.kind = ObjectKind::Function(FunctionKind::Script(ScriptFunction {
            code: code.clone(),
            scope,
        }));
        let func = self.alloc(object)?;

        let prototype = self.create_object()?;
        let constructor = self.intern("constructor");
        prototype.borrow_mut().define(
            constructor,
            HeapValue::Object(func.id()),
            PropertyAttributes::DONT_ENUM,
        );
        let key = self.intern("prototype");
        func.borrow_mut().define(
            key,
            HeapValue::Object(prototype.id()),
            PropertyAttributes::DONT_DELETE,
        );
        Ok(func)
    }

    /// [[Construct]] on a function object.
    pub(crate) fn construct_object(
        &mut self,
        func: &JsObjectRef,
        args: &[JsValue],
    ) -> Result<JsValue, JsError> {
        let kind = func.borrow().function().cloned();
        match kind {
            Some(FunctionKind::Script(_)) => {
                let proto = match self.get_property(func, "prototype") {
                    JsValue::Object(proto) => proto,
                    _ => self.pin(self.realm().object_prototype),
                };
                let obj = self.alloc(JsObject::new(ObjectClass::Object, Some(proto.id())))?;
                let result = self.call_function(func, JsValue::Object(obj.cheap_clone()), args)?;
                Ok(if result.is_object() {
                    result
                } else {
                    JsValue::Object(obj)
                })
            }
            Some(FunctionKind::Native(NativeFunction {
                construct: Some(construct),
                ..
            })) => {
                self.check_termination()?;
                construct(self, JsValue::Object(func.cheap_clone()), args)
            }
            Some(FunctionKind::Native(native)) => Err(JsError::type_error(format!(
                "{} is not a constructor",
                native.name
            ))),
            None => Err(JsError::type_error("value is not a constructor")),
        }
    }
}
