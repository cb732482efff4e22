//! Object tests: properties, attributes, prototype chain, wrappers

use super::{eval, eval_string, throws_error};
use jsrt::JsValue;

#[test]
fn test_object_literal_and_access() {
    assert_eq!(eval("var o = { a: 1, 'b c': 2, 3: 'three' }; o.a + o['b c']"), JsValue::Number(3.0));
    assert_eq!(eval_string("var o = { 3: 'three' }; o[3] + o['3']"), "threethree");
    assert_eq!(eval("var o = {}; o.missing"), JsValue::Undefined);
}

#[test]
fn test_property_assignment() {
    assert_eq!(eval("var o = {}; o.x = 1; o['y'] = 2; o.x + o.y"), JsValue::Number(3.0));
    assert_eq!(eval("var o = { x: 1 }; o.x = 5; o.x"), JsValue::Number(5.0));
}

#[test]
fn test_computed_keys_are_converted_to_strings() {
    assert_eq!(eval("var o = {}; o[1.5] = 'a'; o['1.5']"), JsValue::from("a"));
    assert_eq!(eval("var o = {}; o[{}] = 'b'; o['[object Object]']"), JsValue::from("b"));
}

#[test]
fn test_has_own_property() {
    assert_eq!(eval("({ a: 1 }).hasOwnProperty('a')"), JsValue::Boolean(true));
    assert_eq!(eval("({ a: 1 }).hasOwnProperty('toString')"), JsValue::Boolean(false));
    assert_eq!(eval("[1].hasOwnProperty('length')"), JsValue::Boolean(true));
}

#[test]
fn test_property_is_enumerable() {
    assert_eq!(eval("({ a: 1 }).propertyIsEnumerable('a')"), JsValue::Boolean(true));
    assert_eq!(eval("[1].propertyIsEnumerable('length')"), JsValue::Boolean(false));
    assert_eq!(
        eval("Object.prototype.propertyIsEnumerable('toString')"),
        JsValue::Boolean(false)
    );
}

#[test]
fn test_prototype_chain_lookup() {
    assert_eq!(
        eval(
            r#"
            function Animal() {}
            Animal.prototype.legs = 4;
            function Dog() {}
            Dog.prototype = new Animal();
            var d = new Dog();
            d.legs
            "#
        ),
        JsValue::Number(4.0)
    );
    assert_eq!(
        eval("function A() {} A.prototype.v = 1; var a = new A(); a.v = 2; a.v + A.prototype.v"),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_is_prototype_of() {
    assert_eq!(
        eval("function A() {} var a = new A(); A.prototype.isPrototypeOf(a)"),
        JsValue::Boolean(true)
    );
    assert_eq!(
        eval("Object.prototype.isPrototypeOf([])"),
        JsValue::Boolean(true)
    );
    assert_eq!(eval("Array.prototype.isPrototypeOf({})"), JsValue::Boolean(false));
}

#[test]
fn test_instanceof() {
    assert_eq!(eval("[] instanceof Array"), JsValue::Boolean(true));
    assert_eq!(eval("[] instanceof Object"), JsValue::Boolean(true));
    assert_eq!(eval("({}) instanceof Array"), JsValue::Boolean(false));
    assert_eq!(eval("'str' instanceof String"), JsValue::Boolean(false));
    assert_eq!(eval("new String('s') instanceof String"), JsValue::Boolean(true));
    assert!(throws_error("({}) instanceof 5", "TypeError"));
    assert!(throws_error("({}) instanceof {}", "TypeError"));
}

#[test]
fn test_delete() {
    assert_eq!(eval("var o = { a: 1 }; delete o.a; 'a' in o"), JsValue::Boolean(false));
    assert_eq!(eval("var o = { a: 1 }; delete o.a"), JsValue::Boolean(true));
    assert_eq!(eval("var o = {}; delete o.nothing"), JsValue::Boolean(true));
    assert_eq!(eval("delete 5"), JsValue::Boolean(true));
}

#[test]
fn test_delete_respects_dont_delete() {
    assert_eq!(eval("var v = 1; delete v"), JsValue::Boolean(false));
    assert_eq!(eval("var v = 1; delete v; v"), JsValue::Number(1.0));
    assert_eq!(eval("delete Math.PI"), JsValue::Boolean(false));
    assert_eq!(eval("var a = [1, 2]; delete a.length"), JsValue::Boolean(false));
    assert_eq!(eval("function f() {} delete f.prototype"), JsValue::Boolean(false));
}

#[test]
fn test_implicit_globals_are_deletable() {
    assert_eq!(eval("implicit = 1; delete implicit"), JsValue::Boolean(true));
    assert_eq!(
        eval_string("implicit = 1; delete implicit; typeof implicit"),
        "undefined"
    );
}

#[test]
fn test_read_only_assignment_is_ignored() {
    assert_eq!(eval("Math.PI = 3; Math.PI > 3.14"), JsValue::Boolean(true));
    assert_eq!(
        eval("var f = function g() { g = 1; return typeof g; }; f()"),
        JsValue::from("function")
    );
}

#[test]
fn test_inherited_read_only_blocks_assignment() {
    assert_eq!(
        eval("function C() {} C.prototype = Math; var c = new C(); c.PI = 1; c.hasOwnProperty('PI')"),
        JsValue::Boolean(false)
    );
}

#[test]
fn test_object_to_string() {
    assert_eq!(eval_string("({}).toString()"), "[object Object]");
    assert_eq!(eval_string("Object.prototype.toString.call([])"), "[object Array]");
    assert_eq!(eval_string("Object.prototype.toString.call(Math)"), "[object Math]");
    assert_eq!(
        eval_string("Object.prototype.toString.call(function () {})"),
        "[object Function]"
    );
    assert_eq!(
        eval_string("Object.prototype.toString.call(new Error('x'))"),
        "[object Error]"
    );
}

#[test]
fn test_object_constructor() {
    assert_eq!(eval_string("typeof new Object()"), "object");
    assert_eq!(eval_string("typeof Object(null)"), "object");
    assert_eq!(eval("var o = {}; Object(o) === o"), JsValue::Boolean(true));
    assert_eq!(eval_string("typeof Object(1)"), "object");
    assert_eq!(eval("Object('ab').length"), JsValue::Number(2.0));
}

#[test]
fn test_value_of_returns_self() {
    assert_eq!(eval("var o = {}; o.valueOf() === o"), JsValue::Boolean(true));
}

#[test]
fn test_primitive_wrappers() {
    assert_eq!(eval("'abc'.length"), JsValue::Number(3.0));
    assert_eq!(eval("(5).toString()"), JsValue::from("5"));
    assert_eq!(eval("true.toString()"), JsValue::from("true"));
    assert_eq!(eval("var s = 'abc'; s.extra = 1; s.extra"), JsValue::Undefined);
    assert_eq!(eval("new Number(4) + 1"), JsValue::Number(5.0));
    assert_eq!(eval("new Boolean(false) ? 'y' : 'n'"), JsValue::from("y"));
}

#[test]
fn test_constructor_property() {
    assert_eq!(eval("({}).constructor === Object"), JsValue::Boolean(true));
    assert_eq!(eval("[].constructor === Array"), JsValue::Boolean(true));
    assert_eq!(eval("'s'.constructor === String"), JsValue::Boolean(true));
    assert_eq!(eval("Function.prototype.constructor === Function"), JsValue::Boolean(true));
}

#[test]
fn test_builtin_prototype_extension() {
    assert_eq!(
        eval("Object.prototype.shared = 'yes'; var o = {}; o.shared"),
        JsValue::from("yes")
    );
    assert_eq!(
        eval("String.prototype.twice = function () { return this + this; }; 'ab'.twice()"),
        JsValue::from("abab")
    );
}

#[test]
fn test_proto_accessor_reads_prototype() {
    assert_eq!(eval("({}).__proto__ === Object.prototype"), JsValue::Boolean(true));
    assert_eq!(eval("[].__proto__ === Array.prototype"), JsValue::Boolean(true));
    assert_eq!(
        eval("function F() {} new F().__proto__ === F.prototype"),
        JsValue::Boolean(true)
    );
    assert_eq!(eval("Object.prototype.__proto__"), JsValue::Null);
}

#[test]
fn test_proto_assignment_rebinds_prototype() {
    assert_eq!(
        eval_string("var base = { greet: 'hi' }; var o = {}; o.__proto__ = base; o.greet"),
        "hi"
    );
    assert_eq!(
        eval("var base = {}; var o = {}; o.__proto__ = base; base.isPrototypeOf(o)"),
        JsValue::Boolean(true)
    );
    assert_eq!(
        eval("var o = {}; o.__proto__ = {}; o.hasOwnProperty('__proto__')"),
        JsValue::Boolean(false)
    );
    // Non-object values leave the prototype alone
    assert_eq!(
        eval("var o = {}; o.__proto__ = 5; o.__proto__ === Object.prototype"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_proto_set_to_null() {
    assert_eq!(eval("var o = {}; o.__proto__ = null; o.__proto__"), JsValue::Null);
    assert_eq!(
        eval_string("var o = { a: 1 }; o.__proto__ = null; typeof o.toString"),
        "undefined"
    );
    assert_eq!(
        eval("var o = {}; o.__proto__ = null; o instanceof Object"),
        JsValue::Boolean(false)
    );
}

#[test]
fn test_cyclic_prototype_chain_terminates() {
    let setup = "var a = { x: 1 }, b = { y: 2 }; a.__proto__ = b; b.__proto__ = a;";
    assert_eq!(
        eval_string(&format!("{} var k = ''; for (var p in a) k += p; k", setup)),
        "xy"
    );
    assert_eq!(eval(&format!("{} a.missing", setup)), JsValue::Undefined);
    assert_eq!(eval(&format!("{} a.y + b.x", setup)), JsValue::Number(3.0));
    assert_eq!(eval(&format!("{} 'missing' in a", setup)), JsValue::Boolean(false));
    assert_eq!(eval(&format!("{} a instanceof Array", setup)), JsValue::Boolean(false));
    assert_eq!(
        eval(&format!("{} a.missing = 3; a.missing", setup)),
        JsValue::Number(3.0)
    );
}
