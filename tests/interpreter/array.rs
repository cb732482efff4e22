//! Array tests: literals, length semantics and Array.prototype methods

use super::{eval, eval_string, throws_error};
use jsrt::JsValue;

#[test]
fn test_array_literal() {
    assert_eq!(eval("[1, 2, 3].length"), JsValue::Number(3.0));
    assert_eq!(eval("[].length"), JsValue::Number(0.0));
    assert_eq!(eval("[1, , 3].length"), JsValue::Number(3.0));
    assert_eq!(eval("[1, , 3][1]"), JsValue::Undefined);
    assert_eq!(eval("1 in [1, , 3]"), JsValue::Boolean(false));
    assert_eq!(eval("[1, 2, ].length"), JsValue::Number(2.0));
}

#[test]
fn test_index_assignment_extends_length() {
    assert_eq!(eval("var a = []; a[4] = 'x'; a.length"), JsValue::Number(5.0));
    assert_eq!(eval("var a = [1]; a['2'] = 3; a.length"), JsValue::Number(3.0));
    assert_eq!(eval("var a = [1]; a.name = 'n'; a.length"), JsValue::Number(1.0));
}

#[test]
fn test_length_assignment_truncates() {
    assert_eq!(eval_string("var a = [1, 2, 3, 4]; a.length = 2; a.join()"), "1,2");
    assert_eq!(eval("var a = [1, 2, 3]; a.length = 1; a[2]"), JsValue::Undefined);
    assert_eq!(eval("var a = [1]; a.length = 3; a.length"), JsValue::Number(3.0));
    assert!(throws_error("var a = []; a.length = -1", "RangeError"));
    assert!(throws_error("var a = []; a.length = 1.5", "RangeError"));
}

#[test]
fn test_array_constructor() {
    assert_eq!(eval("new Array(5).length"), JsValue::Number(5.0));
    assert_eq!(eval("new Array(5)[0]"), JsValue::Undefined);
    assert_eq!(eval_string("new Array(1, 2, 3).join('-')"), "1-2-3");
    assert_eq!(eval_string("Array('a').join()"), "a");
    assert_eq!(eval("Array(2).length"), JsValue::Number(2.0));
    assert!(throws_error("new Array(-1)", "RangeError"));
    assert!(throws_error("new Array(2.5)", "Invalid array length"));
}

#[test]
fn test_join_and_to_string() {
    assert_eq!(eval_string("[1, 2, 3].join()"), "1,2,3");
    assert_eq!(eval_string("[1, 2, 3].join(' + ')"), "1 + 2 + 3");
    assert_eq!(eval_string("[1, null, undefined, 2].join('|')"), "1|||2");
    assert_eq!(eval_string("[[1, 2], [3]].toString()"), "1,2,3");
    assert_eq!(eval_string("String([])"), "");
}

#[test]
fn test_push_and_pop() {
    assert_eq!(eval("var a = [1]; a.push(2, 3)"), JsValue::Number(3.0));
    assert_eq!(eval_string("var a = [1]; a.push(2, 3); a.join()"), "1,2,3");
    assert_eq!(eval("var a = [1, 2]; a.pop()"), JsValue::Number(2.0));
    assert_eq!(eval("var a = [1, 2]; a.pop(); a.length"), JsValue::Number(1.0));
    assert_eq!(eval("[].pop()"), JsValue::Undefined);
}

#[test]
fn test_shift_and_unshift() {
    assert_eq!(eval("var a = [1, 2, 3]; a.shift()"), JsValue::Number(1.0));
    assert_eq!(eval_string("var a = [1, 2, 3]; a.shift(); a.join()"), "2,3");
    assert_eq!(eval("var a = [3]; a.unshift(1, 2)"), JsValue::Number(3.0));
    assert_eq!(eval_string("var a = [3]; a.unshift(1, 2); a.join()"), "1,2,3");
    assert_eq!(eval("[].shift()"), JsValue::Undefined);
}

#[test]
fn test_reverse() {
    assert_eq!(eval_string("[1, 2, 3, 4].reverse().join()"), "4,3,2,1");
    assert_eq!(eval("var a = [1, 2]; a.reverse() === a"), JsValue::Boolean(true));
    assert_eq!(eval("var a = [1, , 3, 4]; a.reverse(); 2 in a"), JsValue::Boolean(false));
}

#[test]
fn test_slice() {
    assert_eq!(eval_string("[1, 2, 3, 4, 5].slice(1, 3).join()"), "2,3");
    assert_eq!(eval_string("[1, 2, 3, 4, 5].slice(-2).join()"), "4,5");
    assert_eq!(eval_string("[1, 2, 3].slice().join()"), "1,2,3");
    assert_eq!(eval("[1, 2, 3].slice(2, 1).length"), JsValue::Number(0.0));
    assert_eq!(eval("var a = [1, 2]; a.slice() !== a"), JsValue::Boolean(true));
}

#[test]
fn test_concat() {
    assert_eq!(eval_string("[1, 2].concat([3, 4], 5).join()"), "1,2,3,4,5");
    assert_eq!(eval_string("[1].concat([[2, 3]])[1].join()"), "2,3");
    assert_eq!(eval("[1].concat().length"), JsValue::Number(1.0));
}

#[test]
fn test_sort_default_is_string_order() {
    assert_eq!(eval_string("[10, 9, 1, 100].sort().join()"), "1,10,100,9");
    assert_eq!(eval_string("['b', 'c', 'a'].sort().join()"), "a,b,c");
}

#[test]
fn test_sort_with_comparator() {
    assert_eq!(
        eval_string("[10, 9, 1, 100].sort(function (a, b) { return a - b; }).join()"),
        "1,9,10,100"
    );
    assert_eq!(
        eval_string("[1, 2, 3].sort(function (a, b) { return b - a; }).join()"),
        "3,2,1"
    );
}

#[test]
fn test_sort_is_stable() {
    let source = r#"
        var items = [
            { k: 1, v: 'a' }, { k: 0, v: 'b' }, { k: 1, v: 'c' },
            { k: 0, v: 'd' }, { k: 1, v: 'e' }
        ];
        items.sort(function (x, y) { return x.k - y.k; });
        var out = '';
        for (var i = 0; i < items.length; i++) out += items[i].v;
        out
    "#;
    assert_eq!(eval_string(source), "bdace");
}

#[test]
fn test_sort_puts_undefined_then_holes_last() {
    assert_eq!(
        eval_string("var a = [3, undefined, , 1]; a.sort(); a[0] + ',' + a[1] + ',' + a[2] + ',' + (3 in a)"),
        "1,3,undefined,false"
    );
    assert_eq!(eval("var a = [3, undefined, , 1]; a.sort(); a.length"), JsValue::Number(4.0));
}

#[test]
fn test_sort_rejects_non_function() {
    assert!(throws_error("[2, 1].sort(5)", "TypeError"));
}

#[test]
fn test_array_methods_are_generic() {
    assert_eq!(
        eval_string("var o = { length: 2, 0: 'x', 1: 'y' }; Array.prototype.join.call(o, '+')"),
        "x+y"
    );
    assert_eq!(
        eval("var o = { length: 0 }; Array.prototype.push.call(o, 'a'); o.length"),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_arrays_in_loops() {
    assert_eq!(
        eval(
            r#"
            var squares = [];
            for (var i = 0; i < 50; i++) squares.push(i * i);
            var sum = 0;
            for (var j = 0; j < squares.length; j++) sum += squares[j];
            sum
            "#
        ),
        JsValue::Number(40425.0)
    );
}
