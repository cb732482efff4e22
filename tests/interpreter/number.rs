//! Number and Boolean tests: constructors, constants, conversions, global numeric functions

use super::{eval, eval_string, throws_error};
use jsrt::JsValue;

#[test]
fn test_number_constants() {
    assert_eq!(eval("Number.MAX_VALUE"), JsValue::Number(f64::MAX));
    assert_eq!(eval("Number.MIN_VALUE"), JsValue::Number(5e-324));
    assert_eq!(eval("Number.POSITIVE_INFINITY"), JsValue::Number(f64::INFINITY));
    assert_eq!(eval("Number.NEGATIVE_INFINITY"), JsValue::Number(f64::NEG_INFINITY));
    assert_eq!(eval("isNaN(Number.NaN)"), JsValue::Boolean(true));
    assert_eq!(eval("Number.MAX_VALUE = 1; Number.MAX_VALUE > 1"), JsValue::Boolean(true));
}

#[test]
fn test_number_constructor() {
    assert_eq!(eval("Number('42')"), JsValue::Number(42.0));
    assert_eq!(eval("Number()"), JsValue::Number(0.0));
    assert_eq!(eval("isNaN(Number('abc'))"), JsValue::Boolean(true));
    assert_eq!(eval_string("typeof new Number(1)"), "object");
    assert_eq!(eval("new Number(7).valueOf()"), JsValue::Number(7.0));
}

#[test]
fn test_number_to_string_radix() {
    assert_eq!(eval_string("(255).toString(16)"), "ff");
    assert_eq!(eval_string("(255).toString(2)"), "11111111");
    assert_eq!(eval_string("(-255).toString(36)"), "-73");
    assert_eq!(eval_string("(0.5).toString(2)"), "0.1");
    assert_eq!(eval_string("(12.5).toString()"), "12.5");
    assert!(throws_error("(1).toString(1)", "RangeError"));
    assert!(throws_error("(1).toString(37)", "radix"));
}

#[test]
fn test_number_methods_reject_other_receivers() {
    assert!(throws_error("Number.prototype.valueOf.call('1')", "TypeError"));
    assert!(throws_error("Number.prototype.toString.call({})", "TypeError"));
}

#[test]
fn test_boolean() {
    assert_eq!(eval("Boolean('')"), JsValue::Boolean(false));
    assert_eq!(eval("Boolean('0')"), JsValue::Boolean(true));
    assert_eq!(eval("Boolean({})"), JsValue::Boolean(true));
    assert_eq!(eval("Boolean(NaN)"), JsValue::Boolean(false));
    assert_eq!(eval_string("typeof new Boolean(false)"), "object");
    assert_eq!(eval("new Boolean(false).valueOf()"), JsValue::Boolean(false));
    assert_eq!(eval_string("new Boolean(true).toString()"), "true");
    assert!(throws_error("Boolean.prototype.toString.call(1)", "TypeError"));
}

#[test]
fn test_parse_int() {
    assert_eq!(eval("parseInt('42px')"), JsValue::Number(42.0));
    assert_eq!(eval("parseInt('  -17')"), JsValue::Number(-17.0));
    assert_eq!(eval("parseInt('0x1A')"), JsValue::Number(26.0));
    assert_eq!(eval("parseInt('ff', 16)"), JsValue::Number(255.0));
    assert_eq!(eval("parseInt('101', 2)"), JsValue::Number(5.0));
    assert_eq!(eval("parseInt('3.9')"), JsValue::Number(3.0));
    assert_eq!(eval("isNaN(parseInt('abc'))"), JsValue::Boolean(true));
    assert_eq!(eval("isNaN(parseInt('1', 99))"), JsValue::Boolean(true));
}

#[test]
fn test_parse_float() {
    assert_eq!(eval("parseFloat('3.25abc')"), JsValue::Number(3.25));
    assert_eq!(eval("parseFloat('  .5')"), JsValue::Number(0.5));
    assert_eq!(eval("parseFloat('-1e3x')"), JsValue::Number(-1000.0));
    assert_eq!(eval("parseFloat('1e')"), JsValue::Number(1.0));
    assert_eq!(eval("parseFloat('-Infinity')"), JsValue::Number(f64::NEG_INFINITY));
    assert_eq!(eval("isNaN(parseFloat('x1'))"), JsValue::Boolean(true));
}

#[test]
fn test_is_nan_and_is_finite() {
    assert_eq!(eval("isNaN('abc')"), JsValue::Boolean(true));
    assert_eq!(eval("isNaN('12')"), JsValue::Boolean(false));
    assert_eq!(eval("isFinite(1 / 0)"), JsValue::Boolean(false));
    assert_eq!(eval("isFinite('5')"), JsValue::Boolean(true));
}

#[test]
fn test_numeric_literals() {
    assert_eq!(eval("0xff"), JsValue::Number(255.0));
    assert_eq!(eval("1e3"), JsValue::Number(1000.0));
    assert_eq!(eval(".5 + 1."), JsValue::Number(1.5));
    assert_eq!(eval("010"), JsValue::Number(8.0));
}

#[test]
fn test_string_with_two_signs_is_nan() {
    assert_eq!(eval("isNaN(+'+-1')"), JsValue::Boolean(true));
    assert_eq!(eval("isNaN(Number('--1'))"), JsValue::Boolean(true));
    assert_eq!(eval("'--1' == 1"), JsValue::Boolean(false));
    assert_eq!(eval("+' -7 '"), JsValue::Number(-7.0));
}
