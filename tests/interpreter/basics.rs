//! Basic language feature tests: arithmetic, precedence, comparison, conversions, typeof

use super::{eval, eval_string, throws_error};
use jsrt::JsValue;

#[test]
fn test_arithmetic() {
    assert_eq!(eval("1 + 2"), JsValue::Number(3.0));
    assert_eq!(eval("10 - 4"), JsValue::Number(6.0));
    assert_eq!(eval("3 * 4"), JsValue::Number(12.0));
    assert_eq!(eval("15 / 3"), JsValue::Number(5.0));
    assert_eq!(eval("17 % 5"), JsValue::Number(2.0));
    assert_eq!(eval("-7 % 3"), JsValue::Number(-1.0));
}

#[test]
fn test_precedence() {
    assert_eq!(eval("1 + 2 * 3"), JsValue::Number(7.0));
    assert_eq!(eval("(1 + 2) * 3"), JsValue::Number(9.0));
    assert_eq!(eval("2 * 3 % 4"), JsValue::Number(2.0));
    assert_eq!(eval("1 + 2 == 3 && 4 > 3"), JsValue::Boolean(true));
}

#[test]
fn test_division_edge_cases() {
    assert_eq!(eval("1 / 0"), JsValue::Number(f64::INFINITY));
    assert_eq!(eval("-1 / 0"), JsValue::Number(f64::NEG_INFINITY));
    assert_eq!(eval("isNaN(0 / 0)"), JsValue::Boolean(true));
    assert_eq!(eval("1 / -0 < 0"), JsValue::Boolean(true));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval_string("'a' + 'b'"), "ab");
    assert_eq!(eval_string("1 + '2'"), "12");
    assert_eq!(eval_string("'1' + 2 + 3"), "123");
    assert_eq!(eval("1 + 2 + '3'"), JsValue::from("33"));
    assert_eq!(eval_string("'x' + null + undefined + true"), "xnullundefinedtrue");
}

#[test]
fn test_comparison() {
    assert_eq!(eval("1 < 2"), JsValue::Boolean(true));
    assert_eq!(eval("2 > 1"), JsValue::Boolean(true));
    assert_eq!(eval("2 <= 2"), JsValue::Boolean(true));
    assert_eq!(eval("'a' < 'b'"), JsValue::Boolean(true));
    assert_eq!(eval("'10' < '9'"), JsValue::Boolean(true));
    assert_eq!(eval("'10' < 9"), JsValue::Boolean(false));
    assert_eq!(eval("NaN < 1 || NaN >= 1"), JsValue::Boolean(false));
}

#[test]
fn test_loose_equality() {
    assert_eq!(eval("null == undefined"), JsValue::Boolean(true));
    assert_eq!(eval("null == 0"), JsValue::Boolean(false));
    assert_eq!(eval("'1' == 1"), JsValue::Boolean(true));
    assert_eq!(eval("true == 1"), JsValue::Boolean(true));
    assert_eq!(eval("'' == 0"), JsValue::Boolean(true));
    assert_eq!(eval("NaN == NaN"), JsValue::Boolean(false));
    assert_eq!(eval("var o = {}; o == o"), JsValue::Boolean(true));
    assert_eq!(eval("({}) == ({})"), JsValue::Boolean(false));
    assert_eq!(
        eval("({ valueOf: function () { return 7; } }) == 7"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_strict_equality() {
    assert_eq!(eval("1 === 1"), JsValue::Boolean(true));
    assert_eq!(eval("'1' === 1"), JsValue::Boolean(false));
    assert_eq!(eval("null === undefined"), JsValue::Boolean(false));
    assert_eq!(eval("0 === -0"), JsValue::Boolean(true));
    assert_eq!(eval("'ab' === 'a' + 'b'"), JsValue::Boolean(true));
    assert_eq!(eval("1 !== 2"), JsValue::Boolean(true));
}

#[test]
fn test_typeof() {
    assert_eq!(eval_string("typeof undefined"), "undefined");
    assert_eq!(eval_string("typeof null"), "object");
    assert_eq!(eval_string("typeof true"), "boolean");
    assert_eq!(eval_string("typeof 1"), "number");
    assert_eq!(eval_string("typeof 'x'"), "string");
    assert_eq!(eval_string("typeof {}"), "object");
    assert_eq!(eval_string("typeof []"), "object");
    assert_eq!(eval_string("typeof function () {}"), "function");
    assert_eq!(eval_string("typeof Math.max"), "function");
    assert_eq!(eval_string("typeof new String('x')"), "object");
}

#[test]
fn test_typeof_unresolvable_name() {
    assert_eq!(eval_string("typeof neverDeclared"), "undefined");
}

#[test]
fn test_unresolved_read_is_undefined() {
    assert_eq!(eval("neverDeclared"), JsValue::Undefined);
    assert_eq!(eval("neverDeclared === undefined"), JsValue::Boolean(true));
}

#[test]
fn test_unresolved_write_creates_global() {
    assert_eq!(
        eval("function f() { leaked = 5; } f(); this.leaked"),
        JsValue::Number(5.0)
    );
}

#[test]
fn test_variables() {
    assert_eq!(eval("var x = 5; x"), JsValue::Number(5.0));
    assert_eq!(eval("var x = 5; x = 10; x"), JsValue::Number(10.0));
    assert_eq!(eval("var a = 1, b = a + 1; b"), JsValue::Number(2.0));
    assert_eq!(eval("var u; u"), JsValue::Undefined);
}

#[test]
fn test_var_hoisting() {
    assert_eq!(eval("var before = typeof later; var later = 1; before"), JsValue::from("undefined"));
    assert_eq!(eval("hoisted(); function hoisted() { return 3; }"), JsValue::Number(3.0));
}

#[test]
fn test_compound_assignment() {
    assert_eq!(eval("var x = 10; x += 5; x -= 3; x *= 2; x /= 4; x"), JsValue::Number(6.0));
    assert_eq!(eval("var s = 'a'; s += 'b'; s"), JsValue::from("ab"));
    assert_eq!(eval("var x = 7; x %= 4; x <<= 2; x"), JsValue::Number(12.0));
}

#[test]
fn test_update_expressions() {
    assert_eq!(eval("var i = 1; i++"), JsValue::Number(1.0));
    assert_eq!(eval("var i = 1; ++i"), JsValue::Number(2.0));
    assert_eq!(eval("var i = 1; i--; i"), JsValue::Number(0.0));
    assert_eq!(eval("var s = '5'; s++; s"), JsValue::Number(6.0));
    assert_eq!(eval("var o = { n: 1 }; o.n++; ++o['n']"), JsValue::Number(3.0));
}

#[test]
fn test_bitwise_operators() {
    assert_eq!(eval("5 & 3"), JsValue::Number(1.0));
    assert_eq!(eval("5 | 3"), JsValue::Number(7.0));
    assert_eq!(eval("5 ^ 3"), JsValue::Number(6.0));
    assert_eq!(eval("~5"), JsValue::Number(-6.0));
    assert_eq!(eval("1 << 31"), JsValue::Number(-2147483648.0));
    assert_eq!(eval("-16 >> 2"), JsValue::Number(-4.0));
    assert_eq!(eval("-1 >>> 0"), JsValue::Number(4294967295.0));
    assert_eq!(eval("1 << 33"), JsValue::Number(2.0));
}

#[test]
fn test_logical_operators_return_operands() {
    assert_eq!(eval("0 || 'fallback'"), JsValue::from("fallback"));
    assert_eq!(eval("'first' || 'second'"), JsValue::from("first"));
    assert_eq!(eval("null && 1"), JsValue::Null);
    assert_eq!(eval("1 && 2"), JsValue::Number(2.0));
    assert_eq!(eval("var n = 0; false && n++; n"), JsValue::Number(0.0));
    assert_eq!(eval("!''"), JsValue::Boolean(true));
}

#[test]
fn test_conditional() {
    assert_eq!(eval("true ? 1 : 2"), JsValue::Number(1.0));
    assert_eq!(eval("'' ? 1 : 2"), JsValue::Number(2.0));
}

#[test]
fn test_comma_and_void() {
    assert_eq!(eval("(1, 2, 3)"), JsValue::Number(3.0));
    assert_eq!(eval("void 0"), JsValue::Undefined);
}

#[test]
fn test_to_number_conversions() {
    assert_eq!(eval("+'  42  '"), JsValue::Number(42.0));
    assert_eq!(eval("+''"), JsValue::Number(0.0));
    assert_eq!(eval("+'0x1F'"), JsValue::Number(31.0));
    assert_eq!(eval("+true"), JsValue::Number(1.0));
    assert_eq!(eval("+null"), JsValue::Number(0.0));
    assert_eq!(eval("isNaN(+undefined)"), JsValue::Boolean(true));
    assert_eq!(eval("isNaN(+'12px')"), JsValue::Boolean(true));
    assert_eq!(eval("+[]"), JsValue::Number(0.0));
    assert_eq!(eval("+[5]"), JsValue::Number(5.0));
}

#[test]
fn test_to_string_conversions() {
    assert_eq!(eval_string("'' + 1.5"), "1.5");
    assert_eq!(eval_string("'' + 1e21"), "1e+21");
    assert_eq!(eval_string("'' + 0.000001"), "0.000001");
    assert_eq!(eval_string("'' + 1e-7"), "1e-7");
    assert_eq!(eval_string("'' + -0"), "0");
    assert_eq!(eval_string("'' + [1, 2]"), "1,2");
    assert_eq!(eval_string("'' + {}"), "[object Object]");
    assert_eq!(eval_string("'' + (1 / 0)"), "Infinity");
}

#[test]
fn test_to_primitive_uses_value_of_then_to_string() {
    assert_eq!(
        eval("var o = { valueOf: function () { return 2; }, toString: function () { return 'x'; } }; o * 3"),
        JsValue::Number(6.0)
    );
    assert_eq!(
        eval_string("var o = { toString: function () { return 'x'; } }; o + 'y'"),
        "xy"
    );
}

#[test]
fn test_to_primitive_failure_is_type_error() {
    assert!(throws_error(
        "var o = { valueOf: function () { return {}; }, toString: function () { return {}; } }; o + 1",
        "TypeError"
    ));
}

#[test]
fn test_in_operator() {
    assert_eq!(eval("'a' in { a: 1 }"), JsValue::Boolean(true));
    assert_eq!(eval("'toString' in {}"), JsValue::Boolean(true));
    assert_eq!(eval("0 in [5]"), JsValue::Boolean(true));
    assert!(throws_error("'a' in 'abc'", "TypeError"));
}

#[test]
fn test_calling_non_function_is_type_error() {
    assert!(throws_error("var x = 1; x()", "x is not a function"));
    assert!(throws_error("var o = {}; o.missing()", "o.missing is not a function"));
    assert!(throws_error("null.foo", "TypeError"));
    assert!(throws_error("var u; u.foo", "TypeError"));
}

#[test]
fn test_completion_value_of_program() {
    assert_eq!(eval("1; 2;"), JsValue::Number(2.0));
    assert_eq!(eval("3; var x = 4;"), JsValue::Number(3.0));
    assert_eq!(eval("if (true) { 5 }"), JsValue::Number(5.0));
    assert_eq!(eval(""), JsValue::Undefined);
}
