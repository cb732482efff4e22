//! Object constructor and Object.prototype

use super::{argument, link_constructor};
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{JsObjectRef, JsValue, ObjectClass};

pub fn init_object_prototype(interp: &mut Interpreter) -> Result<(), JsError> {
    let proto = interp.pin(interp.realm().object_prototype);

    interp.register_method(&proto, "toString", object_to_string, 0)?;
    interp.register_method(&proto, "toLocaleString", object_to_locale_string, 0)?;
    interp.register_method(&proto, "valueOf", object_value_of, 0)?;
    interp.register_method(&proto, "hasOwnProperty", object_has_own_property, 1)?;
    interp.register_method(&proto, "isPrototypeOf", object_is_prototype_of, 1)?;
    interp.register_method(
        &proto,
        "propertyIsEnumerable",
        object_property_is_enumerable,
        1,
    )?;
    Ok(())
}

pub fn create_object_constructor(interp: &mut Interpreter) -> Result<JsObjectRef, JsError> {
    let constructor =
        interp.create_native("Object", object_constructor, Some(object_construct), 1)?;
    let proto = interp.pin(interp.realm().object_prototype);
    link_constructor(interp, &constructor, &proto);
    Ok(constructor)
}

/// `Object(value)`: a new object for null/undefined, ToObject otherwise
pub fn object_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let value = argument(args, 0);
    if value.is_null_or_undefined() {
        return Ok(JsValue::Object(interp.create_object()?));
    }
    Ok(JsValue::Object(interp.to_object(&value)?))
}

pub fn object_construct(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    object_constructor(interp, this, args)
}

/// Class name `Object.prototype.toString` reports for a value
fn class_of(value: &JsValue) -> &'static str {
    match value {
        JsValue::Object(obj) => match obj.borrow().class {
            ObjectClass::Arguments | ObjectClass::Activation => "Object",
            class => class.name(),
        },
        JsValue::String(_) => "String",
        JsValue::Number(_) => "Number",
        JsValue::Boolean(_) => "Boolean",
        JsValue::Undefined | JsValue::Null => "Object",
    }
}

pub fn object_to_string(
    _interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::from(format!("[object {}]", class_of(&this))))
}

pub fn object_to_locale_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let to_string = interp.get_value_property(&this, "toString")?;
    match &to_string {
        JsValue::Object(func) if func.borrow().is_callable() => {
            interp.call_function(func, this, &[])
        }
        _ => Err(JsError::type_error("toString is not a function")),
    }
}

pub fn object_value_of(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Object(interp.to_object(&this)?))
}

pub fn object_has_own_property(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let name = interp.to_js_string(&argument(args, 0))?;
    let obj = interp.to_object(&this)?;
    let has_own = obj.borrow().has_own(name.as_str());
    Ok(JsValue::Boolean(has_own))
}

pub fn object_is_prototype_of(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let JsValue::Object(value) = argument(args, 0) else {
        return Ok(JsValue::Boolean(false));
    };
    let proto = interp.to_object(&this)?;
    Ok(JsValue::Boolean(interp.inherits_from(&value, proto.id())))
}

pub fn object_property_is_enumerable(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let name = interp.to_js_string(&argument(args, 0))?;
    let obj = interp.to_object(&this)?;
    let enumerable = obj
        .borrow()
        .get_own(name.as_str())
        .is_some_and(|prop| prop.is_enumerable());
    Ok(JsValue::Boolean(enumerable))
}
