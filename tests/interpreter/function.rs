//! Function tests: call protocol, arguments, closures, this binding, recursion limits

use super::{create_test_runtime, eval, eval_string, test_config, throws_error};
use jsrt::{Interpreter, JsError, JsValue, RuntimeConfig};

#[test]
fn test_function_declaration_and_call() {
    assert_eq!(
        eval("function add(a, b) { return a + b; } add(2, 3)"),
        JsValue::Number(5.0)
    );
    assert_eq!(eval("function f() {} f()"), JsValue::Undefined);
    assert_eq!(eval("function f() { return; } f()"), JsValue::Undefined);
}

#[test]
fn test_missing_arguments_are_undefined() {
    assert_eq!(eval("function f(a, b) { return b; } f(1)"), JsValue::Undefined);
    assert_eq!(
        eval("function f(a) { return arguments.length; } f(1, 2, 3)"),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_function_length() {
    assert_eq!(eval("function f(a, b, c) {} f.length"), JsValue::Number(3.0));
    assert_eq!(eval("Math.max.length"), JsValue::Number(2.0));
}

#[test]
fn test_arguments_aliases_parameters() {
    assert_eq!(
        eval("function f(a) { arguments[0] = 10; return a; } f(1)"),
        JsValue::Number(10.0)
    );
    assert_eq!(
        eval("function f(a) { a = 7; return arguments[0]; } f(1)"),
        JsValue::Number(7.0)
    );
}

#[test]
fn test_arguments_beyond_passed_are_not_aliased() {
    assert_eq!(
        eval("function f(a, b) { b = 2; return arguments[1]; } f(1)"),
        JsValue::Undefined
    );
    assert_eq!(
        eval("function f(a, b) { b = 2; return arguments.length; } f(1)"),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_arguments_object_properties() {
    assert_eq!(
        eval("function f() { return arguments.callee === f; } f()"),
        JsValue::Boolean(true)
    );
    assert_eq!(
        eval_string("function f() { return Object.prototype.toString.call(arguments); } f()"),
        "[object Object]"
    );
    assert_eq!(
        eval_string("function f() { var k = ''; for (var p in arguments) k += p; return k; } f(1, 2)"),
        ""
    );
}

#[test]
fn test_duplicate_parameters_last_wins() {
    assert_eq!(eval("function f(a, a) { return a; } f(1, 2)"), JsValue::Number(2.0));
    assert_eq!(eval("function f(a, a) { return a; } f(1)"), JsValue::Undefined);
}

#[test]
fn test_duplicate_parameter_aliasing() {
    // Only the last occurrence of a name is bound to its argument slot
    assert_eq!(
        eval("function f(a, a) { a = 'x'; return arguments[0] + arguments[1]; } f(1, 2)"),
        JsValue::from("1x")
    );
}

#[test]
fn test_closures() {
    assert_eq!(
        eval(
            r#"
            function counter() {
                var count = 0;
                return function () { count += 1; return count; };
            }
            var c = counter();
            c(); c();
            c()
            "#
        ),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_closures_are_independent() {
    assert_eq!(
        eval(
            r#"
            function make(start) { return function () { return start++; }; }
            var a = make(10), b = make(20);
            a(); a(); b();
            a() + b()
            "#
        ),
        JsValue::Number(33.0)
    );
}

#[test]
fn test_named_function_expression_sees_itself() {
    assert_eq!(
        eval("var fact = function f(n) { return n <= 1 ? 1 : n * f(n - 1); }; fact(5)"),
        JsValue::Number(120.0)
    );
    assert_eq!(eval_string("var g = function inner() {}; typeof inner"), "undefined");
}

#[test]
fn test_recursion() {
    assert_eq!(
        eval("function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); } fib(15)"),
        JsValue::Number(610.0)
    );
}

#[test]
fn test_runaway_recursion_is_range_error() {
    assert!(throws_error("function f() { return f(); } f()", "RangeError"));
    assert_eq!(
        eval("function f() { return f(); } try { f(); } catch (e) { e instanceof RangeError }"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_runtime_usable_after_depth_error() {
    let mut interp = create_test_runtime();
    assert!(interp.eval("function f() { return f(); } f()").is_err());
    assert_eq!(interp.eval("f.length + 1").ok(), Some(JsValue::Number(1.0)));
    assert_eq!(interp.context_depth(), 1);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_configured_call_depth() {
    let config = RuntimeConfig {
        max_call_depth: 10,
        ..test_config()
    };
    let mut interp = Interpreter::with_config(config).unwrap();
    let source = "function down(n) { return n == 0 ? 'done' : down(n - 1); }";
    interp.eval(source).unwrap();
    assert_eq!(interp.eval("down(5)").unwrap(), JsValue::from("done"));
    assert!(matches!(interp.eval("down(20)"), Err(JsError::Thrown(_))));
}

#[test]
fn test_this_binding() {
    assert_eq!(
        eval("var o = { v: 3, get: function () { return this.v; } }; o.get()"),
        JsValue::Number(3.0)
    );
    assert_eq!(
        eval("var v = 'global'; function f() { return this.v; } f()"),
        JsValue::from("global")
    );
    assert_eq!(
        eval("var o = { f: function () { return this; } }; var g = o.f; g() === this"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_primitive_this_is_wrapped() {
    assert_eq!(
        eval_string("function f() { return typeof this; } f.call(5)"),
        "object"
    );
    assert_eq!(
        eval("function f() { return this; } f.call(null) === this"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_call_and_apply() {
    assert_eq!(
        eval("function f(a, b) { return this.x + a + b; } f.call({ x: 1 }, 2, 3)"),
        JsValue::Number(6.0)
    );
    assert_eq!(
        eval("function f(a, b) { return this.x + a + b; } f.apply({ x: 1 }, [2, 3])"),
        JsValue::Number(6.0)
    );
    assert_eq!(
        eval("function f() { return arguments.length; } f.apply(null)"),
        JsValue::Number(0.0)
    );
    assert_eq!(
        eval("function g() { return arguments.length; } function f() { return g.apply(null, arguments); } f(1, 2)"),
        JsValue::Number(2.0)
    );
    assert!(throws_error("function f() {} f.apply(null, 5)", "TypeError"));
}

#[test]
fn test_constructor_call() {
    assert_eq!(
        eval("function P(x) { this.x = x; } var p = new P(4); p.x"),
        JsValue::Number(4.0)
    );
    assert_eq!(
        eval("function P() {} P.prototype.greet = function () { return 'hi'; }; new P().greet()"),
        JsValue::from("hi")
    );
    assert_eq!(
        eval("function P() {} var p = new P; p instanceof P && p.constructor === P"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_constructor_returning_object() {
    assert_eq!(
        eval("function P() { this.a = 1; return { a: 2 }; } new P().a"),
        JsValue::Number(2.0)
    );
    assert_eq!(
        eval("function P() { this.a = 1; return 5; } new P().a"),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_new_on_non_constructor() {
    assert!(throws_error("new 5", "TypeError"));
    assert!(throws_error("new Math.max()", "TypeError"));
}

#[test]
fn test_function_constructor() {
    assert_eq!(
        eval("var add = new Function('a', 'b', 'return a + b;'); add(2, 5)"),
        JsValue::Number(7.0)
    );
    assert_eq!(eval("Function('return 9')()"), JsValue::Number(9.0));
    assert_eq!(
        eval("var x = 'global'; function f() { var x = 'local'; return Function('return x')(); } f()"),
        JsValue::from("global")
    );
    assert!(throws_error("Function('return (')", "SyntaxError"));
}

#[test]
fn test_function_to_string() {
    assert_eq!(
        eval_string("function add(a, b) { return a + b; } add.toString()"),
        "function add(a, b) { return a + b; }"
    );
    assert!(eval_string("Math.max.toString()").contains("[native code]"));
}

#[test]
fn test_inner_functions_are_hoisted() {
    assert_eq!(
        eval("function outer() { return inner(); function inner() { return 'ok'; } } outer()"),
        JsValue::from("ok")
    );
}

#[test]
fn test_local_variables_do_not_leak() {
    assert_eq!(
        eval_string("function f() { var local = 1; } f(); typeof local"),
        "undefined"
    );
}

#[test]
fn test_host_call_and_construct() {
    let mut interp = create_test_runtime();
    let result = interp.eval(
        "function Point(x, y) { this.x = x; this.y = y; } function sum(a, b) { return a + b; }",
    );
    assert!(result.is_ok());

    let sum = interp.get_global("sum").ok();
    let called = sum.and_then(|f| {
        interp
            .call(&f, JsValue::Undefined, &[JsValue::Number(1.0), JsValue::Number(2.0)])
            .ok()
    });
    assert_eq!(called, Some(JsValue::Number(3.0)));

    let point = interp.get_global("Point").ok();
    let constructed = point.and_then(|p| {
        interp
            .construct(&p, &[JsValue::Number(5.0), JsValue::Number(6.0)])
            .ok()
    });
    let y = match constructed {
        Some(JsValue::Object(obj)) => interp.get(&obj, "y").ok(),
        _ => None,
    };
    assert_eq!(y, Some(JsValue::Number(6.0)));

    assert!(interp.call(&JsValue::Number(1.0), JsValue::Undefined, &[]).is_err());
}

#[test]
fn test_closure_sees_later_assignment() {
    assert_eq!(
        eval("var x = 1; function f() { return x + 1; } x = 10; f()"),
        JsValue::Number(11.0)
    );
}
