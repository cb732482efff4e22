//! String built-in methods
//!
//! Positions and lengths count UTF-16 code units.

use super::{argument, link_constructor, number_argument};
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{
    HeapValue, JsObjectRef, JsString, JsValue, ObjectClass, to_integer, to_uint16, to_uint32,
};

/// Initialize String.prototype. The prototype itself is a String wrapper
/// around the empty string.
pub fn init_string_prototype(interp: &mut Interpreter) -> Result<(), JsError> {
    let proto = interp.pin(interp.realm().string_prototype);

    interp.register_method(&proto, "toString", string_to_string, 0)?;
    interp.register_method(&proto, "valueOf", string_value_of, 0)?;

    // Character access
    interp.register_method(&proto, "charAt", string_char_at, 1)?;
    interp.register_method(&proto, "charCodeAt", string_char_code_at, 1)?;

    // Search
    interp.register_method(&proto, "indexOf", string_index_of, 1)?;
    interp.register_method(&proto, "lastIndexOf", string_last_index_of, 1)?;

    // Extraction
    interp.register_method(&proto, "slice", string_slice, 2)?;
    interp.register_method(&proto, "substring", string_substring, 2)?;
    interp.register_method(&proto, "substr", string_substr, 2)?;
    interp.register_method(&proto, "split", string_split, 2)?;
    interp.register_method(&proto, "concat", string_concat, 1)?;

    // Case conversion
    interp.register_method(&proto, "toLowerCase", string_to_lower_case, 0)?;
    interp.register_method(&proto, "toUpperCase", string_to_upper_case, 0)?;
    interp.register_method(&proto, "toLocaleLowerCase", string_to_lower_case, 0)?;
    interp.register_method(&proto, "toLocaleUpperCase", string_to_upper_case, 0)?;
    Ok(())
}

pub fn create_string_constructor(interp: &mut Interpreter) -> Result<JsObjectRef, JsError> {
    let constructor =
        interp.create_native("String", string_constructor, Some(string_construct), 1)?;
    let proto = interp.pin(interp.realm().string_prototype);
    link_constructor(interp, &constructor, &proto);
    interp.register_method(&constructor, "fromCharCode", string_from_char_code, 1)?;
    Ok(constructor)
}

/// `String(value)` converts; `String()` is the empty string
pub fn string_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    match args.first() {
        Some(value) => Ok(JsValue::String(interp.to_js_string(value)?)),
        None => Ok(JsValue::from("")),
    }
}

/// `new String(value)` wraps the converted string
pub fn string_construct(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = match args.first() {
        Some(value) => interp.to_js_string(value)?,
        None => JsString::from(""),
    };
    let proto = interp.realm().string_prototype;
    let wrapper = interp.create_wrapper(ObjectClass::String, proto, HeapValue::String(s))?;
    Ok(JsValue::Object(wrapper))
}

pub fn string_from_char_code(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let mut units = Vec::with_capacity(args.len());
    for arg in args {
        units.push(to_uint16(interp.to_number(arg)?));
    }
    Ok(JsValue::String(JsString::from_utf16(&units)))
}

/// Primitive string behind `this` for toString/valueOf, which are not generic
fn this_string_value(interp: &Interpreter, this: &JsValue, method: &str) -> Result<JsValue, JsError> {
    if let JsValue::String(_) = this {
        return Ok(this.clone());
    }
    interp
        .wrapped_primitive(this, ObjectClass::String)
        .ok_or_else(|| {
            JsError::type_error(format!(
                "String.prototype.{method} called on incompatible receiver"
            ))
        })
}

pub fn string_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    this_string_value(interp, &this, "toString")
}

pub fn string_value_of(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    this_string_value(interp, &this, "valueOf")
}

/// ToString(this) as UTF-16 units, for the generic methods
fn this_units(interp: &mut Interpreter, this: &JsValue) -> Result<Vec<u16>, JsError> {
    if this.is_null_or_undefined() {
        return Err(JsError::type_error(
            "String.prototype method called on null or undefined",
        ));
    }
    Ok(interp.to_js_string(this)?.to_utf16())
}

/// ToInteger of argument `index`, 0 when absent
fn integer_argument(interp: &mut Interpreter, args: &[JsValue], index: usize) -> Result<f64, JsError> {
    match args.get(index) {
        Some(value) => Ok(to_integer(interp.to_number(value)?)),
        None => Ok(0.0),
    }
}

fn clamp(n: f64, len: usize) -> usize {
    n.max(0.0).min(len as f64) as usize
}

fn units_to_value(units: &[u16]) -> JsValue {
    JsValue::String(JsString::from_utf16(units))
}

pub fn string_char_at(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this)?;
    let pos = integer_argument(interp, args, 0)?;
    if pos < 0.0 {
        return Ok(JsValue::from(""));
    }
    match units.get(pos as usize) {
        Some(unit) => Ok(units_to_value(std::slice::from_ref(unit))),
        None => Ok(JsValue::from("")),
    }
}

pub fn string_char_code_at(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this)?;
    let pos = integer_argument(interp, args, 0)?;
    if pos < 0.0 {
        return Ok(JsValue::Number(f64::NAN));
    }
    match units.get(pos as usize) {
        Some(unit) => Ok(JsValue::Number(f64::from(*unit))),
        None => Ok(JsValue::Number(f64::NAN)),
    }
}

fn find_from(haystack: &[u16], needle: &[u16], start: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(start.min(haystack.len()));
    }
    haystack
        .get(start..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| offset + start)
}

pub fn string_index_of(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this)?;
    let search = interp.to_js_string(&argument(args, 0))?.to_utf16();
    let start = clamp(integer_argument(interp, args, 1)?, units.len());

    let index = find_from(&units, &search, start).map_or(-1.0, |i| i as f64);
    Ok(JsValue::Number(index))
}

pub fn string_last_index_of(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this)?;
    let search = interp.to_js_string(&argument(args, 0))?.to_utf16();
    let position = number_argument(interp, args, 1)?;
    let start = if position.is_nan() {
        units.len()
    } else {
        clamp(to_integer(position), units.len())
    };

    let last_start = units.len().saturating_sub(search.len()).min(start);
    if search.len() > units.len() {
        return Ok(JsValue::Number(-1.0));
    }
    let index = (0..=last_start)
        .rev()
        .find(|&i| units.get(i..i + search.len()) == Some(search.as_slice()))
        .map_or(-1.0, |i| i as f64);
    Ok(JsValue::Number(index))
}

/// `slice(start, end)`: negative positions count from the end
pub fn string_slice(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this)?;
    let len = units.len() as f64;
    let relative = |n: f64| if n < 0.0 { (len + n).max(0.0) } else { n.min(len) };

    let start = relative(integer_argument(interp, args, 0)?);
    let end = match args.get(1) {
        None | Some(JsValue::Undefined) => len,
        Some(value) => relative(to_integer(interp.to_number(value)?)),
    };
    let (start, end) = (start as usize, end as usize);
    Ok(units_to_value(units.get(start..end.max(start)).unwrap_or_default()))
}

/// `substring(start, end)`: clamps both and swaps them when reversed
pub fn string_substring(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this)?;
    let start = clamp(integer_argument(interp, args, 0)?, units.len());
    let end = match args.get(1) {
        None | Some(JsValue::Undefined) => units.len(),
        Some(value) => clamp(to_integer(interp.to_number(value)?), units.len()),
    };
    let (from, to) = if start <= end { (start, end) } else { (end, start) };
    Ok(units_to_value(units.get(from..to).unwrap_or_default()))
}

/// `substr(start, length)`
pub fn string_substr(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this)?;
    let len = units.len() as f64;
    let start = integer_argument(interp, args, 0)?;
    let start = if start < 0.0 { (len + start).max(0.0) } else { start.min(len) };
    let count = match args.get(1) {
        None | Some(JsValue::Undefined) => len - start,
        Some(value) => to_integer(interp.to_number(value)?)
            .max(0.0)
            .min(len - start),
    };
    let (from, to) = (start as usize, (start + count) as usize);
    Ok(units_to_value(units.get(from..to).unwrap_or_default()))
}

/// `split(separator, limit)` with a string separator
pub fn string_split(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this)?;
    let limit = match args.get(1) {
        None | Some(JsValue::Undefined) => u32::MAX,
        Some(value) => to_uint32(interp.to_number(value)?),
    } as usize;

    let mut parts = Vec::new();
    match args.first() {
        None | Some(JsValue::Undefined) => parts.push(units_to_value(&units)),
        Some(separator) => {
            let separator = interp.to_js_string(separator)?.to_utf16();
            if separator.is_empty() {
                parts.extend(units.iter().map(|unit| units_to_value(std::slice::from_ref(unit))));
            } else {
                let mut start = 0;
                while let Some(found) = find_from(&units, &separator, start) {
                    parts.push(units_to_value(units.get(start..found).unwrap_or_default()));
                    start = found + separator.len();
                }
                parts.push(units_to_value(units.get(start..).unwrap_or_default()));
            }
        }
    }
    parts.truncate(limit);

    Ok(JsValue::Object(interp.create_array(&parts)?))
}

pub fn string_concat(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let mut units = this_units(interp, &this)?;
    for arg in args {
        units.extend(interp.to_js_string(arg)?.to_utf16());
    }
    Ok(units_to_value(&units))
}

pub fn string_to_lower_case(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    if this.is_null_or_undefined() {
        return Err(JsError::type_error(
            "String.prototype.toLowerCase called on null or undefined",
        ));
    }
    let s = interp.to_js_string(&this)?;
    Ok(JsValue::from(s.as_str().to_lowercase()))
}

pub fn string_to_upper_case(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    if this.is_null_or_undefined() {
        return Err(JsError::type_error(
            "String.prototype.toUpperCase called on null or undefined",
        ));
    }
    let s = interp.to_js_string(&this)?;
    Ok(JsValue::from(s.as_str().to_uppercase()))
}
