//! String tests: String constructor and String.prototype methods

use super::{eval, eval_string, throws_error};
use jsrt::JsValue;

#[test]
fn test_string_length() {
    assert_eq!(eval("'hello'.length"), JsValue::Number(5.0));
    assert_eq!(eval("''.length"), JsValue::Number(0.0));
    // Length counts UTF-16 code units
    assert_eq!(eval("'\u{1F600}'.length"), JsValue::Number(2.0));
}

#[test]
fn test_char_at_and_char_code_at() {
    assert_eq!(eval_string("'abc'.charAt(1)"), "b");
    assert_eq!(eval_string("'abc'.charAt(5)"), "");
    assert_eq!(eval("'abc'.charCodeAt(0)"), JsValue::Number(97.0));
    assert_eq!(eval("isNaN('abc'.charCodeAt(9))"), JsValue::Boolean(true));
}

#[test]
fn test_index_of() {
    assert_eq!(eval("'hello world'.indexOf('o')"), JsValue::Number(4.0));
    assert_eq!(eval("'hello world'.indexOf('o', 5)"), JsValue::Number(7.0));
    assert_eq!(eval("'hello'.indexOf('z')"), JsValue::Number(-1.0));
    assert_eq!(eval("'hello'.indexOf('')"), JsValue::Number(0.0));
    assert_eq!(eval("'hello world'.lastIndexOf('o')"), JsValue::Number(7.0));
    assert_eq!(eval("'hello world'.lastIndexOf('o', 5)"), JsValue::Number(4.0));
}

#[test]
fn test_slice_substring_substr() {
    assert_eq!(eval_string("'abcdef'.slice(1, 4)"), "bcd");
    assert_eq!(eval_string("'abcdef'.slice(-2)"), "ef");
    assert_eq!(eval_string("'abcdef'.substring(4, 1)"), "bcd");
    assert_eq!(eval_string("'abcdef'.substring(-3, 2)"), "ab");
    assert_eq!(eval_string("'abcdef'.substr(2, 3)"), "cde");
    assert_eq!(eval_string("'abcdef'.substr(-3)"), "def");
}

#[test]
fn test_split() {
    assert_eq!(eval_string("'a,b,c'.split(',').join('|')"), "a|b|c");
    assert_eq!(eval("'a,b,c'.split(',').length"), JsValue::Number(3.0));
    assert_eq!(eval_string("'abc'.split('').join(' ')"), "a b c");
    assert_eq!(eval("'abc'.split().length"), JsValue::Number(1.0));
    assert_eq!(eval("'a,b,c'.split(',', 2).length"), JsValue::Number(2.0));
    assert_eq!(eval_string("'a,,b'.split(',').join('|')"), "a||b");
}

#[test]
fn test_case_conversion() {
    assert_eq!(eval_string("'Hello'.toUpperCase()"), "HELLO");
    assert_eq!(eval_string("'Hello'.toLowerCase()"), "hello");
    assert_eq!(eval_string("'MiXeD'.toLocaleLowerCase()"), "mixed");
}

#[test]
fn test_concat() {
    assert_eq!(eval_string("'a'.concat('b', 1, null)"), "ab1null");
}

#[test]
fn test_string_constructor() {
    assert_eq!(eval_string("String(123)"), "123");
    assert_eq!(eval_string("String(null)"), "null");
    assert_eq!(eval_string("String()"), "");
    assert_eq!(eval_string("typeof new String('x')"), "object");
    assert_eq!(eval("new String('ab').length"), JsValue::Number(2.0));
    assert_eq!(eval("new String('ab') == 'ab'"), JsValue::Boolean(true));
    assert_eq!(eval("new String('ab') === 'ab'"), JsValue::Boolean(false));
}

#[test]
fn test_from_char_code() {
    assert_eq!(eval_string("String.fromCharCode(72, 105)"), "Hi");
    assert_eq!(eval_string("String.fromCharCode()"), "");
}

#[test]
fn test_value_of_and_to_string() {
    assert_eq!(eval_string("new String('w').valueOf()"), "w");
    assert_eq!(eval_string("new String('w').toString()"), "w");
    assert!(throws_error(
        "String.prototype.toString.call({})",
        "TypeError"
    ));
}

#[test]
fn test_methods_apply_to_string_conversions() {
    assert_eq!(eval_string("String.prototype.charAt.call(12345, 2)"), "3");
    assert_eq!(eval("String.prototype.indexOf.call(true, 'u')"), JsValue::Number(2.0));
}

#[test]
fn test_string_escapes_in_source() {
    assert_eq!(eval("'a\\nb'.length"), JsValue::Number(3.0));
    assert_eq!(eval_string("'\\x41\\u0042'"), "AB");
}

#[test]
fn test_string_building_in_loop() {
    assert_eq!(
        eval("var s = ''; for (var i = 0; i < 100; i++) s += 'x'; s.length"),
        JsValue::Number(100.0)
    );
}

#[test]
fn test_from_char_code_surrogates() {
    assert_eq!(
        eval("String.fromCharCode(0xD83D, 0xDE00).charCodeAt(1)"),
        JsValue::Number(f64::from(0xDE00))
    );
    assert_eq!(eval("String.fromCharCode(0xD83D, 0xDE00).length"), JsValue::Number(2.0));
    // A lone surrogate is stored as U+FFFD
    assert_eq!(
        eval("String.fromCharCode(0xD800).charCodeAt(0)"),
        JsValue::Number(f64::from(0xFFFD))
    );
    assert_eq!(eval("String.fromCharCode(0xD800).length"), JsValue::Number(1.0));
}
