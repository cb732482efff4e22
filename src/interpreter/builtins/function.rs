//! Function constructor and Function.prototype

use super::{argument, link_constructor};
use crate::ast::{ExpressionKind, StatementKind};
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{FunctionKind, JsObjectRef, JsValue, ObjectClass, to_uint32};

pub fn init_function_prototype(interp: &mut Interpreter) -> Result<(), JsError> {
    let proto = interp.pin(interp.realm().function_prototype);

    interp.register_method(&proto, "toString", function_to_string, 0)?;
    interp.register_method(&proto, "call", function_call, 1)?;
    interp.register_method(&proto, "apply", function_apply, 2)?;
    Ok(())
}

pub fn create_function_constructor(interp: &mut Interpreter) -> Result<JsObjectRef, JsError> {
    let constructor = interp.create_native(
        "Function",
        function_constructor,
        Some(function_constructor),
        1,
    )?;
    let proto = interp.pin(interp.realm().function_prototype);
    link_constructor(interp, &constructor, &proto);
    Ok(constructor)
}

/// Behavior of `Function.prototype` itself when called
pub fn function_prototype_call(
    _interp: &mut Interpreter,
    _this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Undefined)
}

/// `Function(p1, ..., pn, body)` compiles a new function in the global scope.
pub fn function_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let (body, params) = match args.split_last() {
        Some((body, params)) => (interp.to_js_string(body)?.to_string(), params),
        None => (String::new(), args),
    };
    let mut names = Vec::with_capacity(params.len());
    for param in params {
        names.push(interp.to_js_string(param)?.to_string());
    }

    let source = format!(
        "(function anonymous({}) {{\n{}\n}})",
        names.join(","),
        body
    );
    let program = interp.compile(&source)?;

    let code = match program.body.as_slice() {
        [statement] => match &statement.kind {
            StatementKind::Expression(expr) => match &expr.kind {
                ExpressionKind::Function(code) => Some(code.clone()),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    };
    let Some(code) = code else {
        return Err(JsError::syntax_error(
            "invalid function body",
            1,
            1,
        ));
    };

    let global = interp.realm().global;
    Ok(JsValue::Object(
        interp.create_script_function(&code, vec![global])?,
    ))
}

pub fn function_to_string(
    _interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let JsValue::Object(func) = &this else {
        return Err(JsError::type_error(
            "Function.prototype.toString called on incompatible receiver",
        ));
    };
    let text = match func.borrow().function() {
        Some(FunctionKind::Script(script)) => script.code.source_text.to_string(),
        Some(FunctionKind::Native(native)) => {
            format!("function {}() {{\n    [native code]\n}}", native.name)
        }
        None => {
            return Err(JsError::type_error(
                "Function.prototype.toString called on incompatible receiver",
            ));
        }
    };
    Ok(JsValue::from(text))
}

pub fn function_call(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let JsValue::Object(func) = &this else {
        return Err(JsError::type_error("Function.prototype.call called on non-function"));
    };
    let this_arg = argument(args, 0);
    let rest = args.get(1..).unwrap_or_default();
    interp.call_function(func, this_arg, rest)
}

pub fn function_apply(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let JsValue::Object(func) = &this else {
        return Err(JsError::type_error("Function.prototype.apply called on non-function"));
    };
    let this_arg = argument(args, 0);
    let call_args = match argument(args, 1) {
        JsValue::Undefined | JsValue::Null => Vec::new(),
        JsValue::Object(list)
            if matches!(
                list.borrow().class,
                ObjectClass::Array | ObjectClass::Arguments
            ) =>
        {
            let length = interp.get_property(&list, "length");
            let length = to_uint32(interp.to_number(&length)?);
            (0..length)
                .map(|i| interp.get_property(&list, &i.to_string()))
                .collect()
        }
        _ => {
            return Err(JsError::type_error(
                "second argument to Function.prototype.apply must be an array",
            ));
        }
    };
    interp.call_function(func, this_arg, &call_args)
}
