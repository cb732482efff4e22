//! Array constructor and Array.prototype
//!
//! The methods are generic: they work through `length` and index properties
//! of `this`, so they also apply to arguments objects and array-likes.

use super::{argument, link_constructor};
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{
    CheapClone, JsObjectRef, JsString, JsValue, ObjectClass, PropertyAttributes, to_integer,
    to_uint32,
};

pub fn init_array_prototype(interp: &mut Interpreter) -> Result<(), JsError> {
    let proto = interp.pin(interp.realm().array_prototype);
    interp.define_value(
        &proto,
        "length",
        JsValue::Number(0.0),
        PropertyAttributes::DONT_ENUM | PropertyAttributes::DONT_DELETE,
    );

    interp.register_method(&proto, "toString", array_to_string, 0)?;
    interp.register_method(&proto, "toLocaleString", array_to_string, 0)?;
    interp.register_method(&proto, "join", array_join, 1)?;
    interp.register_method(&proto, "push", array_push, 1)?;
    interp.register_method(&proto, "pop", array_pop, 0)?;
    interp.register_method(&proto, "shift", array_shift, 0)?;
    interp.register_method(&proto, "unshift", array_unshift, 1)?;
    interp.register_method(&proto, "reverse", array_reverse, 0)?;
    interp.register_method(&proto, "slice", array_slice, 2)?;
    interp.register_method(&proto, "concat", array_concat, 1)?;
    interp.register_method(&proto, "sort", array_sort, 1)?;
    Ok(())
}

pub fn create_array_constructor(interp: &mut Interpreter) -> Result<JsObjectRef, JsError> {
    let constructor =
        interp.create_native("Array", array_constructor, Some(array_constructor), 1)?;
    let proto = interp.pin(interp.realm().array_prototype);
    link_constructor(interp, &constructor, &proto);
    Ok(constructor)
}

/// `Array(len)` or `Array(e0, e1, ...)`; calling and constructing agree.
pub fn array_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    if let [JsValue::Number(len)] = args {
        let length = to_uint32(*len);
        if f64::from(length) != *len {
            return Err(JsError::range_error("Invalid array length"));
        }
        let array = interp.create_array(&[])?;
        interp.put(&array, "length", JsValue::Number(*len))?;
        return Ok(JsValue::Object(array));
    }
    Ok(JsValue::Object(interp.create_array(args)?))
}

fn this_object(interp: &mut Interpreter, this: &JsValue) -> Result<JsObjectRef, JsError> {
    interp.to_object(this)
}

fn length_of(interp: &mut Interpreter, obj: &JsObjectRef) -> Result<u32, JsError> {
    let length = interp.get_property(obj, "length");
    Ok(to_uint32(interp.to_number(&length)?))
}

fn get_index(interp: &Interpreter, obj: &JsObjectRef, index: u32) -> JsValue {
    interp.get_property(obj, &index.to_string())
}

fn has_index(interp: &Interpreter, obj: &JsObjectRef, index: u32) -> bool {
    interp.has_property(obj.id(), &index.to_string())
}

fn put_index(
    interp: &mut Interpreter,
    obj: &JsObjectRef,
    index: u32,
    value: JsValue,
) -> Result<(), JsError> {
    interp.put_property(obj, &index.to_string(), value)
}

fn delete_index(interp: &mut Interpreter, obj: &JsObjectRef, index: u32) {
    interp.delete_property(obj, &index.to_string());
}

fn set_length(interp: &mut Interpreter, obj: &JsObjectRef, length: u32) -> Result<(), JsError> {
    interp.put_property(obj, "length", JsValue::Number(f64::from(length)))
}

/// Resolve a relative start/end argument against `length`
fn relative_index(interp: &mut Interpreter, value: &JsValue, length: u32) -> Result<u32, JsError> {
    let n = to_integer(interp.to_number(value)?);
    let length = f64::from(length);
    let resolved = if n < 0.0 {
        (length + n).max(0.0)
    } else {
        n.min(length)
    };
    Ok(resolved as u32)
}

pub fn array_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    array_join(interp, this, &[])
}

pub fn array_join(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let obj = this_object(interp, &this)?;
    let length = length_of(interp, &obj)?;
    let separator = match args.first() {
        None | Some(JsValue::Undefined) => JsString::from(","),
        Some(value) => interp.to_js_string(value)?,
    };

    let mut out = String::new();
    for i in 0..length {
        if i > 0 {
            out.push_str(separator.as_str());
        }
        let element = get_index(interp, &obj, i);
        if !element.is_null_or_undefined() {
            out.push_str(interp.to_js_string(&element)?.as_str());
        }
    }
    Ok(JsValue::from(out))
}

pub fn array_push(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let obj = this_object(interp, &this)?;
    let mut length = length_of(interp, &obj)?;
    for arg in args {
        put_index(interp, &obj, length, arg.clone())?;
        length += 1;
    }
    set_length(interp, &obj, length)?;
    Ok(JsValue::Number(f64::from(length)))
}

pub fn array_pop(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let obj = this_object(interp, &this)?;
    let length = length_of(interp, &obj)?;
    if length == 0 {
        set_length(interp, &obj, 0)?;
        return Ok(JsValue::Undefined);
    }
    let last = length - 1;
    let element = get_index(interp, &obj, last);
    delete_index(interp, &obj, last);
    set_length(interp, &obj, last)?;
    Ok(element)
}

pub fn array_shift(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let obj = this_object(interp, &this)?;
    let length = length_of(interp, &obj)?;
    if length == 0 {
        set_length(interp, &obj, 0)?;
        return Ok(JsValue::Undefined);
    }

    let first = get_index(interp, &obj, 0);
    for i in 1..length {
        if has_index(interp, &obj, i) {
            let element = get_index(interp, &obj, i);
            put_index(interp, &obj, i - 1, element)?;
        } else {
            delete_index(interp, &obj, i - 1);
        }
    }
    delete_index(interp, &obj, length - 1);
    set_length(interp, &obj, length - 1)?;
    Ok(first)
}

pub fn array_unshift(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let obj = this_object(interp, &this)?;
    let length = length_of(interp, &obj)?;
    let count = args.len() as u32;

    for i in (0..length).rev() {
        if has_index(interp, &obj, i) {
            let element = get_index(interp, &obj, i);
            put_index(interp, &obj, i + count, element)?;
        } else {
            delete_index(interp, &obj, i + count);
        }
    }
    for (i, arg) in args.iter().enumerate() {
        put_index(interp, &obj, i as u32, arg.clone())?;
    }
    set_length(interp, &obj, length + count)?;
    Ok(JsValue::Number(f64::from(length + count)))
}

pub fn array_reverse(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let obj = this_object(interp, &this)?;
    let length = length_of(interp, &obj)?;
    let middle = length / 2;

    for lower in 0..middle {
        let upper = length - lower - 1;
        let lower_exists = has_index(interp, &obj, lower);
        let upper_exists = has_index(interp, &obj, upper);
        let lower_value = get_index(interp, &obj, lower);
        let upper_value = get_index(interp, &obj, upper);

        if upper_exists {
            put_index(interp, &obj, lower, upper_value)?;
        } else {
            delete_index(interp, &obj, lower);
        }
        if lower_exists {
            put_index(interp, &obj, upper, lower_value)?;
        } else {
            delete_index(interp, &obj, upper);
        }
    }
    Ok(JsValue::Object(obj))
}

pub fn array_slice(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let obj = this_object(interp, &this)?;
    let length = length_of(interp, &obj)?;
    let start = relative_index(interp, &argument(args, 0), length)?;
    let end = match args.get(1) {
        None | Some(JsValue::Undefined) => length,
        Some(value) => relative_index(interp, value, length)?,
    };

    let result = interp.create_array(&[])?;
    let mut n = 0;
    for k in start..end.max(start) {
        if has_index(interp, &obj, k) {
            let element = get_index(interp, &obj, k);
            put_index(interp, &result, n, element)?;
        }
        n += 1;
    }
    set_length(interp, &result, n)?;
    Ok(JsValue::Object(result))
}

pub fn array_concat(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let result = interp.create_array(&[])?;
    let mut n = 0;

    let first = JsValue::Object(this_object(interp, &this)?);
    for item in std::iter::once(&first).chain(args) {
        match item {
            JsValue::Object(source) if source.borrow().class == ObjectClass::Array => {
                let length = length_of(interp, source)?;
                for k in 0..length {
                    if has_index(interp, source, k) {
                        let element = get_index(interp, source, k);
                        put_index(interp, &result, n, element)?;
                    }
                    n += 1;
                }
            }
            other => {
                put_index(interp, &result, n, other.clone())?;
                n += 1;
            }
        }
    }
    set_length(interp, &result, n)?;
    Ok(JsValue::Object(result))
}

/// `sort(comparefn)`: a stable merge sort; undefined elements go last and
/// holes after them.
pub fn array_sort(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let obj = this_object(interp, &this)?;
    let length = length_of(interp, &obj)?;
    let compare = match args.first() {
        None | Some(JsValue::Undefined) => None,
        Some(JsValue::Object(func)) if func.borrow().is_callable() => Some(func.cheap_clone()),
        Some(_) => {
            return Err(JsError::type_error(
                "comparison function must be a function",
            ));
        }
    };

    let mut defined = Vec::new();
    let mut undefined_count = 0;
    for i in 0..length {
        if !has_index(interp, &obj, i) {
            continue;
        }
        match get_index(interp, &obj, i) {
            JsValue::Undefined => undefined_count += 1,
            element => defined.push(element),
        }
    }

    let sorted = merge_sort(interp, defined, compare.as_ref())?;
    let present = sorted.len() as u32 + undefined_count;
    for (i, element) in sorted.into_iter().enumerate() {
        put_index(interp, &obj, i as u32, element)?;
    }
    for i in (present - undefined_count)..present {
        put_index(interp, &obj, i, JsValue::Undefined)?;
    }
    for i in present..length {
        delete_index(interp, &obj, i);
    }
    Ok(JsValue::Object(obj))
}

fn merge_sort(
    interp: &mut Interpreter,
    mut values: Vec<JsValue>,
    compare: Option<&JsObjectRef>,
) -> Result<Vec<JsValue>, JsError> {
    if values.len() <= 1 {
        return Ok(values);
    }
    let right = values.split_off(values.len() / 2);
    let left = merge_sort(interp, values, compare)?;
    let right = merge_sort(interp, right, compare)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
        // Take from the right only when strictly smaller, keeping the sort stable
        if sort_compare(interp, b, a, compare)? < 0.0 {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

fn sort_compare(
    interp: &mut Interpreter,
    a: &JsValue,
    b: &JsValue,
    compare: Option<&JsObjectRef>,
) -> Result<f64, JsError> {
    if let Some(func) = compare {
        let result = interp.call_function(func, JsValue::Undefined, &[a.clone(), b.clone()])?;
        return interp.to_number(&result);
    }
    let a = interp.to_js_string(a)?.to_utf16();
    let b = interp.to_js_string(b)?.to_utf16();
    Ok(match a.cmp(&b) {
        std::cmp::Ordering::Less => -1.0,
        std::cmp::Ordering::Equal => 0.0,
        std::cmp::Ordering::Greater => 1.0,
    })
}
