//! Statement execution
//!
//! Every statement runs to a [`Completion`]. Script-visible errors raised
//! while evaluating a statement's expressions become [`Completion::Throw`];
//! only termination and debugger aborts travel as `Err` so that no `catch`
//! can intercept them.

use super::debugger::StatementEvent;
use super::Interpreter;
use crate::ast::{
    CatchClause, Expression, ForInTarget, ForInit, Statement, StatementKind, SwitchCase, VariableDeclarator,
};
use crate::error::JsError;
use crate::stack::ensure_sufficient_stack;
use crate::value::{CheapClone, HeapValue, JsObject, JsString, JsValue, ObjectClass, PropertyAttributes};

/// Outcome of executing a statement
#[derive(Debug, Clone)]
pub enum Completion {
    /// Fell through, with the value of the last expression statement
    Normal(Option<JsValue>),
    Return(JsValue),
    /// `break`, with its target label and the value of the statements
    /// completed before it
    Break {
        label: Option<JsString>,
        value: Option<JsValue>,
    },
    Continue {
        label: Option<JsString>,
        value: Option<JsValue>,
    },
    Throw(JsValue),
}

impl Completion {
    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }

    pub fn value(&self) -> Option<&JsValue> {
        match self {
            Completion::Normal(value)
            | Completion::Break { value, .. }
            | Completion::Continue { value, .. } => value.as_ref(),
            Completion::Return(value) | Completion::Throw(value) => Some(value),
        }
    }

    /// Give an empty `break`/`continue` the value accumulated so far.
    fn or_value(self, last: Option<JsValue>) -> Self {
        match self {
            Completion::Break { label, value } => Completion::Break {
                label,
                value: value.or(last),
            },
            Completion::Continue { label, value } => Completion::Continue {
                label,
                value: value.or(last),
            },
            other => other,
        }
    }
}

/// What a loop does after one run of its body
enum LoopStep {
    Next(Option<JsValue>),
    Exit(Completion),
}

impl LoopStep {
    /// Absorb unlabeled `continue`/`break` and `continue` to one of the
    /// loop's own labels.
    fn after_body(completion: Completion, labels: &[JsString]) -> Self {
        match completion {
            Completion::Normal(value) => LoopStep::Next(value),
            Completion::Continue { label: None, value } => LoopStep::Next(value),
            Completion::Continue {
                label: Some(label),
                value,
            } if labels.contains(&label) => LoopStep::Next(value),
            Completion::Break { label: None, value } => LoopStep::Exit(Completion::Normal(value)),
            other => LoopStep::Exit(other),
        }
    }
}

impl Interpreter {
    /// Run a statement list, keeping the value of the last statement that
    /// produced one.
    pub(crate) fn execute_statements(
        &mut self,
        statements: &[Statement],
    ) -> Result<Completion, JsError> {
        let mut last = None;
        for statement in statements {
            match self.execute_statement(statement, &[])? {
                Completion::Normal(value) => {
                    if value.is_some() {
                        last = value;
                    }
                }
                abrupt => return Ok(abrupt.or_value(last)),
            }
        }
        Ok(Completion::Normal(last))
    }

    /// Execute one statement. `labels` are the labels directly attached to it.
    pub(crate) fn execute_statement(
        &mut self,
        statement: &Statement,
        labels: &[JsString],
    ) -> Result<Completion, JsError> {
        ensure_sufficient_stack(|| {
            let source_id = self.current_source_id();
            self.set_position(source_id, statement.span.line);
            if !matches!(
                statement.kind,
                StatementKind::Block(_) | StatementKind::FunctionDeclaration(_)
            ) {
                let event = StatementEvent {
                    source_id,
                    first_line: statement.span.line,
                    last_line: statement.span.end_line,
                };
                self.notify_debugger(|debugger| debugger.at_statement(event))?;
            }

            match self.execute_statement_kind(statement, labels) {
                Err(err) if !err.is_uncatchable() => self.throw_completion(err),
                result => result,
            }
        })
    }

    /// Convert an error raised by native code into a thrown script value.
    fn throw_completion(&mut self, err: JsError) -> Result<Completion, JsError> {
        let announce = !matches!(err, JsError::Thrown(_));
        let value = self.error_to_value(err);
        if announce {
            self.notify_debugger(|debugger| debugger.exception(&value))?;
        }
        Ok(Completion::Throw(value))
    }

    fn execute_statement_kind(
        &mut self,
        statement: &Statement,
        labels: &[JsString],
    ) -> Result<Completion, JsError> {
        match &statement.kind {
            StatementKind::Empty | StatementKind::FunctionDeclaration(_) => {
                Ok(Completion::Normal(None))
            }
            StatementKind::Block(body) => self.execute_statements(body),
            StatementKind::Var(declarations) => {
                self.execute_var_declarations(declarations)?;
                Ok(Completion::Normal(None))
            }
            StatementKind::Expression(expr) => {
                Ok(Completion::Normal(Some(self.evaluate_expression(expr)?)))
            }
            StatementKind::If {
                test,
                consequent,
                alternate,
            } => {
                if self.evaluate_expression(test)?.to_boolean() {
                    self.execute_statement(consequent, &[])
                } else if let Some(alternate) = alternate {
                    self.execute_statement(alternate, &[])
                } else {
                    Ok(Completion::Normal(None))
                }
            }
            StatementKind::DoWhile { body, test } => {
                let mut value = None;
                loop {
                    self.check_termination()?;
                    match LoopStep::after_body(self.execute_statement(body, &[])?, labels) {
                        LoopStep::Next(v) => value = v.or(value),
                        LoopStep::Exit(completion) => return Ok(loop_exit(completion, value)),
                    }
                    if !self.evaluate_expression(test)?.to_boolean() {
                        return Ok(Completion::Normal(value));
                    }
                }
            }
            StatementKind::While { test, body } => {
                let mut value = None;
                loop {
                    self.check_termination()?;
                    if !self.evaluate_expression(test)?.to_boolean() {
                        return Ok(Completion::Normal(value));
                    }
                    match LoopStep::after_body(self.execute_statement(body, &[])?, labels) {
                        LoopStep::Next(v) => value = v.or(value),
                        LoopStep::Exit(completion) => return Ok(loop_exit(completion, value)),
                    }
                }
            }
            StatementKind::For {
                init,
                test,
                update,
                body,
            } => {
                match init {
                    Some(ForInit::Var(declarations)) => self.execute_var_declarations(declarations)?,
                    Some(ForInit::Expression(expr)) => {
                        self.evaluate_expression(expr)?;
                    }
                    None => {}
                }
                let mut value = None;
                loop {
                    self.check_termination()?;
                    if let Some(test) = test {
                        if !self.evaluate_expression(test)?.to_boolean() {
                            return Ok(Completion::Normal(value));
                        }
                    }
                    match LoopStep::after_body(self.execute_statement(body, &[])?, labels) {
                        LoopStep::Next(v) => value = v.or(value),
                        LoopStep::Exit(completion) => return Ok(loop_exit(completion, value)),
                    }
                    if let Some(update) = update {
                        self.evaluate_expression(update)?;
                    }
                }
            }
            StatementKind::ForIn {
                target,
                object,
                body,
            } => self.execute_for_in(target, object, body, labels),
            StatementKind::Continue(label) => Ok(Completion::Continue {
                label: label.clone(),
                value: None,
            }),
            StatementKind::Break(label) => Ok(Completion::Break {
                label: label.clone(),
                value: None,
            }),
            StatementKind::Return(argument) => {
                let value = match argument {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => JsValue::Undefined,
                };
                Ok(Completion::Return(value))
            }
            StatementKind::With { object, body } => {
                let value = self.evaluate_expression(object)?;
                let scope = self.to_object(&value)?;
                self.push_scope(scope.id());
                let result = self.execute_statement(body, &[]);
                self.pop_scope();
                result
            }
            StatementKind::Switch {
                discriminant,
                cases,
            } => self.execute_switch(discriminant, cases),
            StatementKind::Labeled { label, body } => {
                let mut label_set = labels.to_vec();
                label_set.push(label.cheap_clone());
                match self.execute_statement(body, &label_set)? {
                    Completion::Break {
                        label: Some(target),
                        value,
                    } if target == *label => Ok(Completion::Normal(value)),
                    other => Ok(other),
                }
            }
            StatementKind::Throw(expr) => {
                let value = self.evaluate_expression(expr)?;
                self.notify_debugger(|debugger| debugger.exception(&value))?;
                Ok(Completion::Throw(value))
            }
            StatementKind::Try {
                block,
                handler,
                finalizer,
            } => self.execute_try(block, handler.as_ref(), finalizer.as_deref()),
        }
    }

    fn execute_var_declarations(
        &mut self,
        declarations: &[VariableDeclarator],
    ) -> Result<(), JsError> {
        for declaration in declarations {
            if let Some(init) = &declaration.init {
                let reference = self.resolve_identifier(&declaration.name);
                let value = self.evaluate_expression(init)?;
                self.put_reference(&reference, value)?;
            }
        }
        Ok(())
    }

    fn execute_for_in(
        &mut self,
        target: &ForInTarget,
        object: &Expression,
        body: &Statement,
        labels: &[JsString],
    ) -> Result<Completion, JsError> {
        if let ForInTarget::Var(declaration) = target {
            self.execute_var_declarations(std::slice::from_ref(declaration))?;
        }
        let value = self.evaluate_expression(object)?;
        if value.is_null_or_undefined() {
            return Ok(Completion::Normal(None));
        }
        let obj = self.to_object(&value)?;

        let mut last = None;
        for name in self.prop_list(&obj, true) {
            self.check_termination()?;
            // Deleted during iteration
            if !self.has_property(obj.id(), name.as_str()) {
                continue;
            }
            let reference = match target {
                ForInTarget::Var(declaration) => self.resolve_identifier(&declaration.name),
                ForInTarget::Expression(expr) => self.evaluate_reference(expr)?,
            };
            self.put_reference(&reference, JsValue::String(name))?;
            match LoopStep::after_body(self.execute_statement(body, &[])?, labels) {
                LoopStep::Next(v) => last = v.or(last),
                LoopStep::Exit(completion) => return Ok(loop_exit(completion, last)),
            }
        }
        Ok(Completion::Normal(last))
    }

    /// Case tests run in source order, skipping `default`; execution then
    /// falls through from the matching clause (or `default`).
    fn execute_switch(
        &mut self,
        discriminant: &Expression,
        cases: &[SwitchCase],
    ) -> Result<Completion, JsError> {
        let value = self.evaluate_expression(discriminant)?;

        let mut start = None;
        for (index, case) in cases.iter().enumerate() {
            if let Some(test) = &case.test {
                let candidate = self.evaluate_expression(test)?;
                if value.strict_equals(&candidate) {
                    start = Some(index);
                    break;
                }
            }
        }
        let Some(start) = start.or_else(|| cases.iter().position(|case| case.test.is_none()))
        else {
            return Ok(Completion::Normal(None));
        };

        let mut last = None;
        for case in cases.iter().skip(start) {
            match self.execute_statements(&case.body)? {
                Completion::Normal(value) => last = value.or(last),
                Completion::Break { label: None, value } => {
                    return Ok(Completion::Normal(value.or(last)));
                }
                abrupt => return Ok(abrupt.or_value(last)),
            }
        }
        Ok(Completion::Normal(last))
    }

    fn execute_try(
        &mut self,
        block: &[Statement],
        handler: Option<&CatchClause>,
        finalizer: Option<&[Statement]>,
    ) -> Result<Completion, JsError> {
        let mut result = self.execute_statements(block);

        if let (Some(handler), Ok(Completion::Throw(exception))) = (handler, &result) {
            let exception = exception.clone();
            result = self.execute_catch(handler, exception);
        }

        if let Some(finalizer) = finalizer {
            let finally = self.execute_statements(finalizer)?;
            // An abrupt finally wins, except over termination
            if result.is_ok() && finally.is_abrupt() {
                return Ok(finally);
            }
        }
        result
    }

    /// Run a catch block with the exception bound in a fresh scope object.
    fn execute_catch(
        &mut self,
        handler: &CatchClause,
        exception: JsValue,
    ) -> Result<Completion, JsError> {
        let scope = self.alloc(JsObject::new(ObjectClass::Activation, None))?;
        scope.borrow_mut().define(
            handler.param.cheap_clone(),
            HeapValue::from(&exception),
            PropertyAttributes::DONT_DELETE,
        );
        self.push_scope(scope.id());
        let result = self.execute_statements(&handler.body);
        self.pop_scope();
        result
    }
}

/// Completion of a loop left through `exit`, carrying the loop's last value
/// when it ends normally.
fn loop_exit(exit: Completion, value: Option<JsValue>) -> Completion {
    match exit {
        Completion::Normal(exit_value) => Completion::Normal(exit_value.or(value)),
        abrupt => abrupt.or_value(value),
    }
}
