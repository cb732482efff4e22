//! Global object properties and functions (eval, parseInt, parseFloat, ...)

use super::{argument, number_argument};
use crate::error::JsError;
use crate::interpreter::{CodeType, Completion, ExecutionContext, Interpreter};
use crate::lexer::{is_line_terminator, is_whitespace};
use crate::value::{JsObjectRef, JsValue, PropertyAttributes, to_int32};

pub fn init_global_object(interp: &mut Interpreter, global: &JsObjectRef) -> Result<(), JsError> {
    let constant = PropertyAttributes::DONT_ENUM | PropertyAttributes::DONT_DELETE;
    interp.define_value(global, "NaN", JsValue::Number(f64::NAN), constant);
    interp.define_value(global, "Infinity", JsValue::Number(f64::INFINITY), constant);
    interp.define_value(global, "undefined", JsValue::Undefined, constant);

    interp.register_method(global, "eval", global_eval, 1)?;
    interp.register_method(global, "parseInt", global_parse_int, 2)?;
    interp.register_method(global, "parseFloat", global_parse_float, 1)?;
    interp.register_method(global, "isNaN", global_is_nan, 1)?;
    interp.register_method(global, "isFinite", global_is_finite, 1)?;
    Ok(())
}

/// `eval(source)` runs in the caller's scope chain, variable object and
/// `this`. Declarations it makes can be deleted.
pub fn global_eval(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let source = match args.first() {
        Some(JsValue::String(source)) => source.clone(),
        Some(other) => return Ok(other.clone()),
        None => return Ok(JsValue::Undefined),
    };
    let program = interp.compile(source.as_str())?;

    let caller = interp.current_context();
    interp.push_context(ExecutionContext {
        code_type: CodeType::Eval,
        source_id: program.source_id,
        ..caller
    });
    let result = interp
        .instantiate_declarations(&program.declarations)
        .and_then(|()| interp.execute_statements(&program.body));
    interp.pop_context();

    match result? {
        Completion::Normal(value) => Ok(value.unwrap_or_default()),
        Completion::Return(value) => Ok(value),
        Completion::Throw(value) => Err(JsError::Thrown(value)),
        Completion::Break { value, .. } | Completion::Continue { value, .. } => {
            Ok(value.unwrap_or_default())
        }
    }
}

fn trim_start(s: &str) -> &str {
    s.trim_start_matches(|c| is_whitespace(c) || is_line_terminator(c))
}

pub fn global_parse_int(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let string = interp.to_js_string(&argument(args, 0))?;
    let mut radix = to_int32(number_argument(interp, args, 1)?);
    let s = trim_start(string.as_str());

    let (negative, s) = if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    };

    let has_hex_prefix = s.starts_with("0x") || s.starts_with("0X");
    if radix == 0 {
        radix = if has_hex_prefix { 16 } else { 10 };
    }
    if !(2..=36).contains(&radix) {
        return Ok(JsValue::Number(f64::NAN));
    }
    let s = if radix == 16 && has_hex_prefix {
        s.get(2..).unwrap_or("")
    } else {
        s
    };

    // Accumulate in f64 so long digit strings lose precision instead of
    // overflowing
    let mut result = 0.0;
    let mut found_digit = false;
    for c in s.chars() {
        let Some(digit) = c.to_digit(radix as u32) else {
            break;
        };
        found_digit = true;
        result = result * f64::from(radix) + f64::from(digit);
    }

    if !found_digit {
        return Ok(JsValue::Number(f64::NAN));
    }
    Ok(JsValue::Number(if negative { -result } else { result }))
}

pub fn global_parse_float(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let string = interp.to_js_string(&argument(args, 0))?;
    let s = trim_start(string.as_str());

    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    if unsigned.starts_with("Infinity") {
        let sign = if s.starts_with('-') { -1.0 } else { 1.0 };
        return Ok(JsValue::Number(sign * f64::INFINITY));
    }

    // Longest prefix that is a decimal literal
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut valid_end = 0;
    if matches!(bytes.first(), Some(b'-' | b'+')) {
        end = 1;
    }
    let mut seen_digit = false;
    while let Some(b) = bytes.get(end) {
        if !b.is_ascii_digit() {
            break;
        }
        end += 1;
        seen_digit = true;
        valid_end = end;
    }
    if bytes.get(end) == Some(&b'.') {
        end += 1;
        while let Some(b) = bytes.get(end) {
            if !b.is_ascii_digit() {
                break;
            }
            end += 1;
            seen_digit = true;
        }
        if seen_digit {
            valid_end = end;
        }
    }
    if seen_digit && matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'-' | b'+')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > digits_start {
            valid_end = exp_end;
        }
    }

    if !seen_digit {
        return Ok(JsValue::Number(f64::NAN));
    }
    let literal = s.get(..valid_end).unwrap_or("");
    Ok(JsValue::Number(literal.parse::<f64>().unwrap_or(f64::NAN)))
}

pub fn global_is_nan(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let n = number_argument(interp, args, 0)?;
    Ok(JsValue::Boolean(n.is_nan()))
}

pub fn global_is_finite(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let n = number_argument(interp, args, 0)?;
    Ok(JsValue::Boolean(n.is_finite()))
}
