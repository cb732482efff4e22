//! Error constructors and their prototypes
//!
//! `Error` and the six native error types share one construction routine.
//! Calling a constructor as a function behaves like `new`.

use super::{argument, link_constructor};
use crate::error::{ErrorKind, JsError};
use crate::interpreter::Interpreter;
use crate::value::{JsObjectRef, JsValue, NativeFn, PropertyAttributes};

pub fn init_error_prototypes(interp: &mut Interpreter) -> Result<(), JsError> {
    for kind in ErrorKind::ALL {
        let proto = interp.pin(interp.realm().error_prototype(kind));
        interp.define_value(
            &proto,
            "name",
            JsValue::from(kind.name()),
            PropertyAttributes::DONT_ENUM,
        );
        interp.define_value(
            &proto,
            "message",
            JsValue::from(""),
            PropertyAttributes::DONT_ENUM,
        );
        // Native error prototypes inherit toString from Error.prototype
        if kind == ErrorKind::Error {
            interp.register_method(&proto, "toString", error_to_string, 0)?;
        }
    }
    Ok(())
}

pub fn create_error_constructor(
    interp: &mut Interpreter,
    kind: ErrorKind,
) -> Result<JsObjectRef, JsError> {
    let construct: NativeFn = match kind {
        ErrorKind::Error => error_constructor,
        ErrorKind::EvalError => eval_error_constructor,
        ErrorKind::RangeError => range_error_constructor,
        ErrorKind::ReferenceError => reference_error_constructor,
        ErrorKind::SyntaxError => syntax_error_constructor,
        ErrorKind::TypeError => type_error_constructor,
        ErrorKind::UriError => uri_error_constructor,
    };
    let constructor = interp.create_native(kind.name(), construct, Some(construct), 1)?;
    let proto = interp.pin(interp.realm().error_prototype(kind));
    link_constructor(interp, &constructor, &proto);
    Ok(constructor)
}

fn construct_error(
    interp: &mut Interpreter,
    kind: ErrorKind,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let error = interp.create_error(kind, "")?;
    let message = argument(args, 0);
    if !message.is_undefined() {
        let message = interp.to_js_string(&message)?;
        interp.define_value(
            &error,
            "message",
            JsValue::String(message),
            PropertyAttributes::empty(),
        );
    }
    Ok(JsValue::Object(error))
}

pub fn error_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    construct_error(interp, ErrorKind::Error, args)
}

pub fn eval_error_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    construct_error(interp, ErrorKind::EvalError, args)
}

pub fn range_error_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    construct_error(interp, ErrorKind::RangeError, args)
}

pub fn reference_error_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    construct_error(interp, ErrorKind::ReferenceError, args)
}

pub fn syntax_error_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    construct_error(interp, ErrorKind::SyntaxError, args)
}

pub fn type_error_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    construct_error(interp, ErrorKind::TypeError, args)
}

pub fn uri_error_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    construct_error(interp, ErrorKind::UriError, args)
}

/// `name: message`, or just `name` when the message is empty
pub fn error_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let name = interp.get_value_property(&this, "name")?;
    let name = if name.is_undefined() {
        "Error".into()
    } else {
        interp.to_js_string(&name)?
    };
    let message = interp.get_value_property(&this, "message")?;
    let message = if message.is_undefined() {
        "".into()
    } else {
        interp.to_js_string(&message)?
    };

    if message.is_empty() {
        return Ok(JsValue::String(name));
    }
    Ok(JsValue::from(format!("{name}: {message}")))
}
