//! Math built-in methods

use std::cell::Cell;

use super::number_argument;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{JsObject, JsObjectRef, JsValue, ObjectClass, PropertyAttributes};

/// Create the Math object with its constants and methods
pub fn create_math_object(interp: &mut Interpreter) -> Result<JsObjectRef, JsError> {
    let proto = interp.realm().object_prototype;
    let math = interp.alloc(JsObject::new(ObjectClass::Math, Some(proto)))?;

    let constants = [
        ("E", std::f64::consts::E),
        ("LN10", std::f64::consts::LN_10),
        ("LN2", std::f64::consts::LN_2),
        ("LOG2E", std::f64::consts::LOG2_E),
        ("LOG10E", std::f64::consts::LOG10_E),
        ("PI", std::f64::consts::PI),
        ("SQRT1_2", std::f64::consts::FRAC_1_SQRT_2),
        ("SQRT2", std::f64::consts::SQRT_2),
    ];
    for (name, value) in constants {
        interp.define_value(&math, name, JsValue::Number(value), PropertyAttributes::FIXED);
    }

    // Rounding
    interp.register_method(&math, "abs", math_abs, 1)?;
    interp.register_method(&math, "floor", math_floor, 1)?;
    interp.register_method(&math, "ceil", math_ceil, 1)?;
    interp.register_method(&math, "round", math_round, 1)?;

    // Min/max
    interp.register_method(&math, "max", math_max, 2)?;
    interp.register_method(&math, "min", math_min, 2)?;

    // Powers and logarithms
    interp.register_method(&math, "pow", math_pow, 2)?;
    interp.register_method(&math, "sqrt", math_sqrt, 1)?;
    interp.register_method(&math, "exp", math_exp, 1)?;
    interp.register_method(&math, "log", math_log, 1)?;

    // Trigonometry
    interp.register_method(&math, "sin", math_sin, 1)?;
    interp.register_method(&math, "cos", math_cos, 1)?;
    interp.register_method(&math, "tan", math_tan, 1)?;
    interp.register_method(&math, "asin", math_asin, 1)?;
    interp.register_method(&math, "acos", math_acos, 1)?;
    interp.register_method(&math, "atan", math_atan, 1)?;
    interp.register_method(&math, "atan2", math_atan2, 2)?;

    interp.register_method(&math, "random", math_random, 0)?;
    Ok(math)
}

/// Apply a one-argument numeric function to the first argument
fn unary(
    interp: &mut Interpreter,
    args: &[JsValue],
    f: impl FnOnce(f64) -> f64,
) -> Result<JsValue, JsError> {
    let n = number_argument(interp, args, 0)?;
    Ok(JsValue::Number(f(n)))
}

pub fn math_abs(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    unary(interp, args, libm::fabs)
}

pub fn math_floor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    unary(interp, args, libm::floor)
}

pub fn math_ceil(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    unary(interp, args, libm::ceil)
}

/// Rounds half up; values in [-0.5, -0] round to -0
pub fn math_round(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    unary(interp, args, |n| {
        if !n.is_finite() || n == 0.0 {
            n
        } else if (-0.5..0.0).contains(&n) {
            -0.0
        } else {
            libm::floor(n + 0.5)
        }
    })
}

pub fn math_max(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let mut max = f64::NEG_INFINITY;
    for arg in args {
        let n = interp.to_number(arg)?;
        if n.is_nan() {
            return Ok(JsValue::Number(f64::NAN));
        }
        // +0 is larger than -0
        if n > max || (n == 0.0 && max == 0.0 && max.is_sign_negative()) {
            max = n;
        }
    }
    Ok(JsValue::Number(max))
}

pub fn math_min(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let mut min = f64::INFINITY;
    for arg in args {
        let n = interp.to_number(arg)?;
        if n.is_nan() {
            return Ok(JsValue::Number(f64::NAN));
        }
        if n < min || (n == 0.0 && min == 0.0 && n.is_sign_negative()) {
            min = n;
        }
    }
    Ok(JsValue::Number(min))
}

pub fn math_pow(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let base = number_argument(interp, args, 0)?;
    let exponent = number_argument(interp, args, 1)?;
    // 1 ** NaN and (+-1) ** (+-Infinity) are NaN here, unlike C pow
    if exponent.is_nan() || (libm::fabs(base) == 1.0 && exponent.is_infinite()) {
        return Ok(JsValue::Number(f64::NAN));
    }
    Ok(JsValue::Number(libm::pow(base, exponent)))
}

pub fn math_sqrt(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    unary(interp, args, libm::sqrt)
}

pub fn math_exp(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    unary(interp, args, libm::exp)
}

pub fn math_log(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    unary(interp, args, libm::log)
}

pub fn math_sin(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    unary(interp, args, libm::sin)
}

pub fn math_cos(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    unary(interp, args, libm::cos)
}

pub fn math_tan(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    unary(interp, args, libm::tan)
}

pub fn math_asin(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    unary(interp, args, libm::asin)
}

pub fn math_acos(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    unary(interp, args, libm::acos)
}

pub fn math_atan(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    unary(interp, args, libm::atan)
}

pub fn math_atan2(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let y = number_argument(interp, args, 0)?;
    let x = number_argument(interp, args, 1)?;
    Ok(JsValue::Number(libm::atan2(y, x)))
}

thread_local! {
    static RANDOM_STATE: Cell<u64> = Cell::new(random_seed());
}

fn random_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    // xorshift gets stuck on zero
    nanos | 1
}

/// Uniform in [0, 1), from a per-thread xorshift64* generator. Not suitable
/// for cryptography.
pub fn math_random(
    _interp: &mut Interpreter,
    _this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let bits = RANDOM_STATE.with(|state| {
        let mut x = state.get();
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        state.set(x);
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    });
    // Top 53 bits give an evenly spaced double in [0, 1)
    Ok(JsValue::Number((bits >> 11) as f64 / (1u64 << 53) as f64))
}
