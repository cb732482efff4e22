//! Expression evaluation
//!
//! Operands are evaluated strictly left to right, and each operand's value is
//! fully obtained before any conversion of either operand runs.

use std::rc::Rc;

use super::properties::Hint;
use super::{Interpreter, Reference};
use crate::ast::{
    AssignOp, BinaryOp, Expression, ExpressionKind, FunctionData, LogicalOp, MemberProperty,
    UnaryOp, UpdateOp,
};
use crate::error::JsError;
use crate::stack::ensure_sufficient_stack;
use crate::value::{
    CheapClone, HeapValue, JsObject, JsString, JsValue, ObjectClass, PropertyAttributes,
    string_to_number, to_int32, to_uint32,
};

impl Interpreter {
    pub(crate) fn evaluate_expression(&mut self, expr: &Expression) -> Result<JsValue, JsError> {
        ensure_sufficient_stack(|| self.evaluate_expression_kind(expr))
    }

    fn evaluate_expression_kind(&mut self, expr: &Expression) -> Result<JsValue, JsError> {
        match &expr.kind {
            ExpressionKind::This => Ok(self.current_this()),
            ExpressionKind::Identifier(name) => {
                let reference = self.resolve_identifier(name);
                self.get_reference(&reference)
            }
            ExpressionKind::Null => Ok(JsValue::Null),
            ExpressionKind::Boolean(b) => Ok(JsValue::Boolean(*b)),
            ExpressionKind::Number(n) => Ok(JsValue::Number(*n)),
            ExpressionKind::String(s) => Ok(JsValue::String(s.cheap_clone())),
            ExpressionKind::Array(elements) => self.evaluate_array_literal(elements),
            ExpressionKind::Object(properties) => self.evaluate_object_literal(properties),
            ExpressionKind::Function(code) => self.evaluate_function_expression(code),
            ExpressionKind::Member { .. } => {
                let reference = self.evaluate_reference(expr)?;
                self.get_reference(&reference)
            }
            ExpressionKind::Call { callee, arguments } => self.evaluate_call(callee, arguments),
            ExpressionKind::New { callee, arguments } => {
                let constructor = self.evaluate_expression(callee)?;
                let args = self.evaluate_arguments(arguments)?;
                match &constructor {
                    JsValue::Object(func) => self.construct_object(func, &args),
                    _ => Err(JsError::type_error(format!(
                        "{} is not a constructor",
                        describe(callee)
                    ))),
                }
            }
            ExpressionKind::Update {
                op,
                prefix,
                argument,
            } => {
                let reference = self.evaluate_reference(argument)?;
                let old = self.get_reference(&reference)?;
                let old = self.to_number(&old)?;
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.put_reference(&reference, JsValue::Number(new))?;
                Ok(JsValue::Number(if *prefix { new } else { old }))
            }
            ExpressionKind::Unary { op, argument } => self.evaluate_unary(*op, argument),
            ExpressionKind::Binary { op, left, right } => {
                let left = self.evaluate_expression(left)?;
                let right = self.evaluate_expression(right)?;
                self.binary_operation(*op, &left, &right)
            }
            ExpressionKind::Logical { op, left, right } => {
                let left = self.evaluate_expression(left)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.to_boolean(),
                    LogicalOp::Or => left.to_boolean(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate_expression(right)
                }
            }
            ExpressionKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.evaluate_expression(test)?.to_boolean() {
                    self.evaluate_expression(consequent)
                } else {
                    self.evaluate_expression(alternate)
                }
            }
            ExpressionKind::Assign { op, target, value } => {
                let reference = self.evaluate_reference(target)?;
                let value = match op {
                    AssignOp::Assign => self.evaluate_expression(value)?,
                    AssignOp::Compound(op) => {
                        let current = self.get_reference(&reference)?;
                        let operand = self.evaluate_expression(value)?;
                        self.binary_operation(*op, &current, &operand)?
                    }
                };
                self.put_reference(&reference, value.clone())?;
                Ok(value)
            }
            ExpressionKind::Sequence(expressions) => {
                let mut last = JsValue::Undefined;
                for expression in expressions {
                    last = self.evaluate_expression(expression)?;
                }
                Ok(last)
            }
        }
    }

    /// Evaluate an identifier or member expression to the location it names.
    pub(crate) fn evaluate_reference(&mut self, expr: &Expression) -> Result<Reference, JsError> {
        match &expr.kind {
            ExpressionKind::Identifier(name) => Ok(self.resolve_identifier(name)),
            ExpressionKind::Member { object, property } => {
                let base = self.evaluate_expression(object)?;
                let key = match property {
                    MemberProperty::Dot(name) => JsValue::String(name.cheap_clone()),
                    MemberProperty::Computed(expr) => self.evaluate_expression(expr)?,
                };
                if base.is_null_or_undefined() {
                    return Err(JsError::type_error(format!(
                        "{} is {}",
                        describe(object),
                        base.primitive_to_string()
                    )));
                }
                let name = self.to_js_string(&key)?;
                Ok(Reference::Property { base, name })
            }
            _ => Err(JsError::reference_error("invalid assignment target")),
        }
    }

    fn evaluate_arguments(&mut self, arguments: &[Expression]) -> Result<Vec<JsValue>, JsError> {
        arguments
            .iter()
            .map(|argument| self.evaluate_expression(argument))
            .collect()
    }

    fn evaluate_call(
        &mut self,
        callee: &Expression,
        arguments: &[Expression],
    ) -> Result<JsValue, JsError> {
        let (func, this, args) = if callee.kind.is_reference() {
            let reference = self.evaluate_reference(callee)?;
            let args = self.evaluate_arguments(arguments)?;
            let func = self.get_reference(&reference)?;
            (func, self.reference_this(&reference), args)
        } else {
            let func = self.evaluate_expression(callee)?;
            let args = self.evaluate_arguments(arguments)?;
            (func, JsValue::Null, args)
        };

        match &func {
            JsValue::Object(obj) if obj.borrow().is_callable() => {
                self.call_function(obj, this, &args)
            }
            _ => Err(JsError::type_error(format!(
                "{} is not a function",
                describe(callee)
            ))),
        }
    }

    fn evaluate_array_literal(
        &mut self,
        elements: &[Option<Expression>],
    ) -> Result<JsValue, JsError> {
        let mut values = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            if let Some(element) = element {
                values.push((index, self.evaluate_expression(element)?));
            }
        }

        let mut array = JsObject::new(ObjectClass::Array, Some(self.realm().array_prototype));
        for (index, value) in &values {
            let key = self.intern(&index.to_string());
            array.define(key, HeapValue::from(value), PropertyAttributes::empty());
        }
        array.define(
            self.intern("length"),
            HeapValue::Number(elements.len() as f64),
            PropertyAttributes::DONT_ENUM | PropertyAttributes::DONT_DELETE,
        );
        Ok(JsValue::Object(self.alloc(array)?))
    }

    fn evaluate_object_literal(
        &mut self,
        properties: &[(JsString, Expression)],
    ) -> Result<JsValue, JsError> {
        let obj = self.create_object()?;
        for (name, expr) in properties {
            let value = self.evaluate_expression(expr)?;
            self.put_property(&obj, name.as_str(), value)?;
        }
        Ok(JsValue::Object(obj))
    }

    /// A named function expression sees its own name through an extra scope
    /// object between the closure and the enclosing chain.
    fn evaluate_function_expression(&mut self, code: &Rc<FunctionData>) -> Result<JsValue, JsError> {
        let mut scope = self.current_context().scope;
        let Some(name) = &code.name else {
            return Ok(JsValue::Object(self.create_script_function(code, scope)?));
        };

        let record = self.alloc(JsObject::new(ObjectClass::Activation, None))?;
        scope.push(record.id());
        let func = self.create_script_function(code, scope)?;
        record.borrow_mut().define(
            name.cheap_clone(),
            HeapValue::Object(func.id()),
            PropertyAttributes::READ_ONLY | PropertyAttributes::DONT_DELETE,
        );
        Ok(JsValue::Object(func))
    }

    fn evaluate_unary(&mut self, op: UnaryOp, argument: &Expression) -> Result<JsValue, JsError> {
        match op {
            UnaryOp::Delete => {
                if !argument.kind.is_reference() {
                    self.evaluate_expression(argument)?;
                    return Ok(JsValue::Boolean(true));
                }
                let reference = self.evaluate_reference(argument)?;
                Ok(JsValue::Boolean(self.delete_reference(&reference)?))
            }
            UnaryOp::Void => {
                self.evaluate_expression(argument)?;
                Ok(JsValue::Undefined)
            }
            UnaryOp::Typeof => {
                let value = match &argument.kind {
                    ExpressionKind::Identifier(name) => match self.resolve_identifier(name) {
                        Reference::Unresolved(_) => JsValue::Undefined,
                        reference => self.get_reference(&reference)?,
                    },
                    _ => self.evaluate_expression(argument)?,
                };
                Ok(JsValue::String(self.intern(value.type_of())))
            }
            UnaryOp::Plus => {
                let value = self.evaluate_expression(argument)?;
                Ok(JsValue::Number(self.to_number(&value)?))
            }
            UnaryOp::Minus => {
                let value = self.evaluate_expression(argument)?;
                Ok(JsValue::Number(-self.to_number(&value)?))
            }
            UnaryOp::BitNot => {
                let value = self.evaluate_expression(argument)?;
                let n = to_int32(self.to_number(&value)?);
                Ok(JsValue::Number(f64::from(!n)))
            }
            UnaryOp::Not => {
                let value = self.evaluate_expression(argument)?;
                Ok(JsValue::Boolean(!value.to_boolean()))
            }
        }
    }

    /// Apply a binary operator to two already-evaluated operands.
    pub(crate) fn binary_operation(
        &mut self,
        op: BinaryOp,
        left: &JsValue,
        right: &JsValue,
    ) -> Result<JsValue, JsError> {
        let value = match op {
            BinaryOp::Add => {
                let left = self.to_primitive(left, Hint::Number)?;
                let right = self.to_primitive(right, Hint::Number)?;
                match (&left, &right) {
                    (JsValue::String(_), _) | (_, JsValue::String(_)) => {
                        let joined = left.primitive_to_string() + &right.primitive_to_string();
                        JsValue::String(joined)
                    }
                    _ => JsValue::Number(left.primitive_to_number() + right.primitive_to_number()),
                }
            }
            BinaryOp::Sub => JsValue::Number(self.to_number(left)? - self.to_number(right)?),
            BinaryOp::Mul => JsValue::Number(self.to_number(left)? * self.to_number(right)?),
            BinaryOp::Div => JsValue::Number(self.to_number(left)? / self.to_number(right)?),
            BinaryOp::Mod => JsValue::Number(self.to_number(left)? % self.to_number(right)?),
            BinaryOp::Shl => {
                let l = to_int32(self.to_number(left)?);
                let r = to_uint32(self.to_number(right)?);
                JsValue::Number(f64::from(l.wrapping_shl(r & 0x1f)))
            }
            BinaryOp::Shr => {
                let l = to_int32(self.to_number(left)?);
                let r = to_uint32(self.to_number(right)?);
                JsValue::Number(f64::from(l.wrapping_shr(r & 0x1f)))
            }
            BinaryOp::UShr => {
                let l = to_uint32(self.to_number(left)?);
                let r = to_uint32(self.to_number(right)?);
                JsValue::Number(f64::from(l.wrapping_shr(r & 0x1f)))
            }
            BinaryOp::BitAnd => {
                let l = to_int32(self.to_number(left)?);
                let r = to_int32(self.to_number(right)?);
                JsValue::Number(f64::from(l & r))
            }
            BinaryOp::BitXor => {
                let l = to_int32(self.to_number(left)?);
                let r = to_int32(self.to_number(right)?);
                JsValue::Number(f64::from(l ^ r))
            }
            BinaryOp::BitOr => {
                let l = to_int32(self.to_number(left)?);
                let r = to_int32(self.to_number(right)?);
                JsValue::Number(f64::from(l | r))
            }
            BinaryOp::Lt => JsValue::Boolean(self.less_than(left, right)? == Some(true)),
            BinaryOp::Gt => JsValue::Boolean(self.less_than(right, left)? == Some(true)),
            BinaryOp::LtEq => JsValue::Boolean(self.less_than(right, left)? == Some(false)),
            BinaryOp::GtEq => JsValue::Boolean(self.less_than(left, right)? == Some(false)),
            BinaryOp::Eq => JsValue::Boolean(self.loose_equals(left, right)?),
            BinaryOp::NotEq => JsValue::Boolean(!self.loose_equals(left, right)?),
            BinaryOp::StrictEq => JsValue::Boolean(left.strict_equals(right)),
            BinaryOp::StrictNotEq => JsValue::Boolean(!left.strict_equals(right)),
            BinaryOp::Instanceof => JsValue::Boolean(self.instance_of(left, right)?),
            BinaryOp::In => {
                let JsValue::Object(obj) = right else {
                    return Err(JsError::type_error(
                        "'in' requires an object as its right operand",
                    ));
                };
                let name = self.to_js_string(left)?;
                JsValue::Boolean(self.has_property(obj.id(), name.as_str()))
            }
        };
        Ok(value)
    }

    /// Abstract relational comparison `x < y`; `None` when either side is NaN.
    fn less_than(&mut self, x: &JsValue, y: &JsValue) -> Result<Option<bool>, JsError> {
        let x = self.to_primitive(x, Hint::Number)?;
        let y = self.to_primitive(y, Hint::Number)?;
        if let (JsValue::String(a), JsValue::String(b)) = (&x, &y) {
            return Ok(Some(a.to_utf16() < b.to_utf16()));
        }
        let x = x.primitive_to_number();
        let y = y.primitive_to_number();
        if x.is_nan() || y.is_nan() {
            return Ok(None);
        }
        Ok(Some(x < y))
    }

    /// Abstract equality `x == y`
    pub(crate) fn loose_equals(&mut self, x: &JsValue, y: &JsValue) -> Result<bool, JsError> {
        match (x, y) {
            (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => Ok(true),
            (JsValue::Undefined | JsValue::Null, _) | (_, JsValue::Undefined | JsValue::Null) => {
                Ok(false)
            }
            (JsValue::Number(n), JsValue::String(s)) | (JsValue::String(s), JsValue::Number(n)) => {
                Ok(*n == string_to_number(s.as_str()))
            }
            (JsValue::Boolean(a), JsValue::Boolean(b)) => Ok(a == b),
            (JsValue::Boolean(b), _) => self.loose_equals(&boolean_to_number(*b), y),
            (_, JsValue::Boolean(b)) => self.loose_equals(x, &boolean_to_number(*b)),
            (JsValue::Object(_), JsValue::Object(_)) => Ok(x.strict_equals(y)),
            (JsValue::Object(_), primitive) => {
                let converted = self.to_primitive(x, Hint::Number)?;
                self.loose_equals(&converted, primitive)
            }
            (primitive, JsValue::Object(_)) => {
                let converted = self.to_primitive(y, Hint::Number)?;
                self.loose_equals(primitive, &converted)
            }
            _ => Ok(x.strict_equals(y)),
        }
    }

    fn instance_of(&mut self, value: &JsValue, constructor: &JsValue) -> Result<bool, JsError> {
        let JsValue::Object(constructor) = constructor else {
            return Err(JsError::type_error(
                "right-hand side of 'instanceof' is not an object",
            ));
        };
        if !constructor.borrow().is_callable() {
            return Err(JsError::type_error(
                "right-hand side of 'instanceof' is not callable",
            ));
        }
        let JsValue::Object(obj) = value else {
            return Ok(false);
        };
        match self.get_property(constructor, "prototype") {
            JsValue::Object(proto) => Ok(self.inherits_from(obj, proto.id())),
            _ => Err(JsError::type_error(
                "'prototype' property of the function is not an object",
            )),
        }
    }
}

fn boolean_to_number(b: bool) -> JsValue {
    JsValue::Number(if b { 1.0 } else { 0.0 })
}

/// Short rendering of an expression for error messages
fn describe(expr: &Expression) -> String {
    match &expr.kind {
        ExpressionKind::Identifier(name) => name.to_string(),
        ExpressionKind::This => "this".to_string(),
        ExpressionKind::Member {
            object,
            property: MemberProperty::Dot(name),
        } => format!("{}.{}", describe(object), name),
        ExpressionKind::Member { object, .. } => format!("{}[...]", describe(object)),
        ExpressionKind::Call { callee, .. } => format!("{}(...)", describe(callee)),
        ExpressionKind::Null => "null".to_string(),
        _ => "expression".to_string(),
    }
}
