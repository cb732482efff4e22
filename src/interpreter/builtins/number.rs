//! Number constructor and Number.prototype

use super::link_constructor;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{
    HeapValue, JsObjectRef, JsValue, ObjectClass, PropertyAttributes, number_to_radix_string,
    to_integer,
};

pub fn init_number_prototype(interp: &mut Interpreter) -> Result<(), JsError> {
    let proto = interp.pin(interp.realm().number_prototype);

    interp.register_method(&proto, "toString", number_to_string, 1)?;
    interp.register_method(&proto, "toLocaleString", number_to_string, 0)?;
    interp.register_method(&proto, "valueOf", number_value_of, 0)?;
    Ok(())
}

pub fn create_number_constructor(interp: &mut Interpreter) -> Result<JsObjectRef, JsError> {
    let constructor =
        interp.create_native("Number", number_constructor, Some(number_construct), 1)?;
    let proto = interp.pin(interp.realm().number_prototype);
    link_constructor(interp, &constructor, &proto);

    let constants = [
        ("MAX_VALUE", f64::MAX),
        ("MIN_VALUE", 5e-324),
        ("NaN", f64::NAN),
        ("POSITIVE_INFINITY", f64::INFINITY),
        ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
    ];
    for (name, value) in constants {
        interp.define_value(
            &constructor,
            name,
            JsValue::Number(value),
            PropertyAttributes::FIXED,
        );
    }
    Ok(constructor)
}

/// `Number(value)` converts; `Number()` is +0
pub fn number_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    match args.first() {
        Some(value) => Ok(JsValue::Number(interp.to_number(value)?)),
        None => Ok(JsValue::Number(0.0)),
    }
}

pub fn number_construct(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let n = match args.first() {
        Some(value) => interp.to_number(value)?,
        None => 0.0,
    };
    let proto = interp.realm().number_prototype;
    let wrapper = interp.create_wrapper(ObjectClass::Number, proto, HeapValue::Number(n))?;
    Ok(JsValue::Object(wrapper))
}

fn this_number_value(interp: &Interpreter, this: &JsValue, method: &str) -> Result<f64, JsError> {
    if let JsValue::Number(n) = this {
        return Ok(*n);
    }
    match interp.wrapped_primitive(this, ObjectClass::Number) {
        Some(JsValue::Number(n)) => Ok(n),
        _ => Err(JsError::type_error(format!(
            "Number.prototype.{method} requires that 'this' be a Number"
        ))),
    }
}

/// `toString(radix)`, radix 10 when omitted
pub fn number_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let n = this_number_value(interp, &this, "toString")?;
    let radix = match args.first() {
        None | Some(JsValue::Undefined) => 10.0,
        Some(value) => to_integer(interp.to_number(value)?),
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(JsError::range_error(
            "toString() radix must be between 2 and 36",
        ));
    }
    Ok(JsValue::from(number_to_radix_string(n, radix as u32)))
}

pub fn number_value_of(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(this_number_value(interp, &this, "valueOf")?))
}
