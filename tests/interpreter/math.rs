//! Math object tests

use super::{eval, eval_string};
use jsrt::JsValue;

#[test]
fn test_math_constants() {
    assert_eq!(eval("Math.PI"), JsValue::Number(std::f64::consts::PI));
    assert_eq!(eval("Math.E"), JsValue::Number(std::f64::consts::E));
    assert_eq!(eval("Math.SQRT2"), JsValue::Number(std::f64::consts::SQRT_2));
    assert_eq!(eval("Math.LN2"), JsValue::Number(std::f64::consts::LN_2));
}

#[test]
fn test_math_class() {
    assert_eq!(eval_string("Object.prototype.toString.call(Math)"), "[object Math]");
    assert_eq!(eval_string("typeof Math"), "object");
}

#[test]
fn test_abs_floor_ceil() {
    assert_eq!(eval("Math.abs(-3.5)"), JsValue::Number(3.5));
    assert_eq!(eval("Math.floor(-1.5)"), JsValue::Number(-2.0));
    assert_eq!(eval("Math.ceil(1.2)"), JsValue::Number(2.0));
    assert_eq!(eval("isNaN(Math.abs('x'))"), JsValue::Boolean(true));
}

#[test]
fn test_round() {
    assert_eq!(eval("Math.round(2.5)"), JsValue::Number(3.0));
    assert_eq!(eval("Math.round(-2.5)"), JsValue::Number(-2.0));
    assert_eq!(eval("Math.round(2.4)"), JsValue::Number(2.0));
    assert_eq!(eval("1 / Math.round(-0.4)"), JsValue::Number(f64::NEG_INFINITY));
}

#[test]
fn test_max_and_min() {
    assert_eq!(eval("Math.max(1, 5, 3)"), JsValue::Number(5.0));
    assert_eq!(eval("Math.min(1, 5, 3)"), JsValue::Number(1.0));
    assert_eq!(eval("Math.max()"), JsValue::Number(f64::NEG_INFINITY));
    assert_eq!(eval("Math.min()"), JsValue::Number(f64::INFINITY));
    assert_eq!(eval("isNaN(Math.max(1, NaN, 3))"), JsValue::Boolean(true));
    assert_eq!(eval("1 / Math.max(-0, 0)"), JsValue::Number(f64::INFINITY));
    assert_eq!(eval("1 / Math.min(0, -0)"), JsValue::Number(f64::NEG_INFINITY));
}

#[test]
fn test_pow_and_roots() {
    assert_eq!(eval("Math.pow(2, 10)"), JsValue::Number(1024.0));
    assert_eq!(eval("Math.abs(Math.pow(4, 0.5) - 2) < 1e-15"), JsValue::Boolean(true));
    assert_eq!(eval("Math.pow(NaN, 0)"), JsValue::Number(1.0));
    assert_eq!(eval("isNaN(Math.pow(1, Infinity))"), JsValue::Boolean(true));
    assert_eq!(eval("Math.sqrt(81)"), JsValue::Number(9.0));
    assert_eq!(eval("isNaN(Math.sqrt(-1))"), JsValue::Boolean(true));
}

#[test]
fn test_exp_and_log() {
    assert_eq!(eval("Math.exp(0)"), JsValue::Number(1.0));
    assert_eq!(eval("Math.log(1)"), JsValue::Number(0.0));
    assert_eq!(eval("Math.log(0)"), JsValue::Number(f64::NEG_INFINITY));
}

#[test]
fn test_trigonometry() {
    assert_eq!(eval("Math.sin(0)"), JsValue::Number(0.0));
    assert_eq!(eval("Math.cos(0)"), JsValue::Number(1.0));
    assert_eq!(eval("Math.abs(Math.atan2(1, 1) - Math.PI / 4) < 1e-15"), JsValue::Boolean(true));
    assert_eq!(eval("Math.abs(Math.tan(Math.PI / 4) - 1) < 1e-12"), JsValue::Boolean(true));
    assert_eq!(eval("Math.abs(Math.asin(1) * 2 - Math.PI) < 1e-15"), JsValue::Boolean(true));
}

#[test]
fn test_random_range() {
    assert_eq!(
        eval(
            r#"
            var ok = true;
            for (var i = 0; i < 200; i++) {
                var r = Math.random();
                if (!(r >= 0 && r < 1)) ok = false;
            }
            ok
            "#
        ),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_random_varies() {
    assert_eq!(
        eval("var a = Math.random(), b = Math.random(), c = Math.random(); a != b || b != c"),
        JsValue::Boolean(true)
    );
}
