//! Boolean constructor and Boolean.prototype

use super::{argument, link_constructor};
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{HeapValue, JsObjectRef, JsValue, ObjectClass};

pub fn init_boolean_prototype(interp: &mut Interpreter) -> Result<(), JsError> {
    let proto = interp.pin(interp.realm().boolean_prototype);

    interp.register_method(&proto, "toString", boolean_to_string, 0)?;
    interp.register_method(&proto, "valueOf", boolean_value_of, 0)?;
    Ok(())
}

pub fn create_boolean_constructor(interp: &mut Interpreter) -> Result<JsObjectRef, JsError> {
    let constructor =
        interp.create_native("Boolean", boolean_constructor, Some(boolean_construct), 1)?;
    let proto = interp.pin(interp.realm().boolean_prototype);
    link_constructor(interp, &constructor, &proto);
    Ok(constructor)
}

pub fn boolean_constructor(
    _interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(argument(args, 0).to_boolean()))
}

pub fn boolean_construct(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let b = argument(args, 0).to_boolean();
    let proto = interp.realm().boolean_prototype;
    let wrapper = interp.create_wrapper(ObjectClass::Boolean, proto, HeapValue::Boolean(b))?;
    Ok(JsValue::Object(wrapper))
}

fn this_boolean_value(interp: &Interpreter, this: &JsValue) -> Result<bool, JsError> {
    if let JsValue::Boolean(b) = this {
        return Ok(*b);
    }
    match interp.wrapped_primitive(this, ObjectClass::Boolean) {
        Some(JsValue::Boolean(b)) => Ok(b),
        _ => Err(JsError::type_error("Boolean method called on incompatible receiver")),
    }
}

pub fn boolean_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let b = this_boolean_value(interp, &this)?;
    Ok(JsValue::from(if b { "true" } else { "false" }))
}

pub fn boolean_value_of(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(this_boolean_value(interp, &this)?))
}
