//! Host API tests: evaluation entry points, globals, native functions,
//! prototypes and host-owned objects

use super::{create_test_runtime, test_config};
use jsrt::value::HeapValue;
use jsrt::{
    BuiltinPrototype, CodeType, Completion, ErrorKind, Heap, Interpreter, JsError, JsObject,
    JsString, JsValue, ObjectClass, PropertyAttributes, RuntimeConfig,
};

fn host_sum(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let mut total = 0.0;
    for arg in args {
        total += interp.to_number(arg)?;
    }
    Ok(JsValue::Number(total))
}

fn host_fail(
    _interp: &mut Interpreter,
    _this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Err(JsError::type_error("host refused"))
}

#[test]
fn test_evaluate_returns_completion_value() {
    let mut interp = create_test_runtime();
    match interp.evaluate("1 + 2", None) {
        Completion::Normal(Some(value)) => assert_eq!(value, JsValue::Number(3.0)),
        other => panic!("unexpected completion: {:?}", other),
    }
    assert!(matches!(
        interp.evaluate("var declared = 1;", None),
        Completion::Normal(None)
    ));
}

#[test]
fn test_evaluate_reports_throw() {
    let mut interp = create_test_runtime();
    let completion = interp.evaluate("throw 'boom'", None);
    assert!(completion.is_abrupt());
    match completion {
        Completion::Throw(value) => assert_eq!(value, JsValue::from("boom")),
        other => panic!("expected a throw, got {:?}", other),
    }
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_evaluate_with_custom_this() {
    let mut interp = create_test_runtime();
    let receiver = interp.create_object().unwrap();
    interp
        .put(&receiver, "tag", JsValue::from("custom"))
        .unwrap();

    let completion = interp.evaluate("this.tag", Some(JsValue::Object(receiver.clone())));
    assert!(matches!(
        completion,
        Completion::Normal(Some(JsValue::String(ref s))) if s.as_str() == "custom"
    ));

    // Declarations still land on the global object
    let completion = interp.evaluate("var placed = this.tag; placed", Some(JsValue::Object(receiver)));
    assert!(!completion.is_abrupt());
    assert_eq!(interp.get_global("placed").unwrap(), JsValue::from("custom"));

    // Without an explicit receiver `this` is the global object
    assert_eq!(
        interp.eval("this === (function () { return this; })()").unwrap(),
        JsValue::Boolean(true)
    );
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_globals_round_trip() {
    let mut interp = create_test_runtime();
    interp.set_global("fromHost", JsValue::Number(41.0)).unwrap();
    assert_eq!(interp.eval("fromHost + 1").unwrap(), JsValue::Number(42.0));

    interp.eval("var fromScript = 'hello';").unwrap();
    assert_eq!(interp.get_global("fromScript").unwrap(), JsValue::from("hello"));
    assert_eq!(interp.get_global("neverDefined").unwrap(), JsValue::Undefined);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_register_function() {
    let mut interp = create_test_runtime();
    interp.register_function("sum", host_sum, 2).unwrap();

    assert_eq!(interp.eval("sum(1, 2, '3')").unwrap(), JsValue::Number(6.0));
    assert_eq!(interp.eval("sum.length").unwrap(), JsValue::Number(2.0));
    assert_eq!(interp.eval("typeof sum").unwrap(), JsValue::from("function"));
    // Registered globals are not enumerable
    assert_eq!(
        interp
            .eval("var k = ''; for (var p in this) if (p == 'sum') k = p; k")
            .unwrap(),
        JsValue::from("")
    );
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_native_errors_are_catchable() {
    let mut interp = create_test_runtime();
    interp.register_function("fail", host_fail, 0).unwrap();
    assert_eq!(
        interp
            .eval("try { fail(); } catch (e) { e instanceof TypeError && e.message }")
            .unwrap(),
        JsValue::from("host refused")
    );
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_native_function_valueof_is_used() {
    let mut interp = create_test_runtime();
    interp.register_function("sum", host_sum, 0).unwrap();
    assert_eq!(
        interp
            .eval("sum({ valueOf: function () { return 10; } }, 5)")
            .unwrap(),
        JsValue::Number(15.0)
    );
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_create_object_and_array() {
    let mut interp = create_test_runtime();
    let obj = interp.create_object().unwrap();
    interp.put(&obj, "x", JsValue::Number(1.0)).unwrap();
    let array = interp
        .create_array(&[JsValue::from("a"), JsValue::Number(2.0)])
        .unwrap();

    interp.set_global("hostObject", JsValue::Object(obj)).unwrap();
    interp.set_global("hostArray", JsValue::Object(array)).unwrap();

    assert_eq!(interp.eval("hostObject.x").unwrap(), JsValue::Number(1.0));
    assert_eq!(interp.eval("hostArray.join('-')").unwrap(), JsValue::from("a-2"));
    assert_eq!(interp.eval("hostArray instanceof Array").unwrap(), JsValue::Boolean(true));
    assert_eq!(interp.eval("hostArray.length").unwrap(), JsValue::Number(2.0));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_register_method_and_define_value() {
    let mut interp = create_test_runtime();
    let obj = interp.create_object().unwrap();
    interp.register_method(&obj, "sum", host_sum, 2).unwrap();
    interp.define_value(
        &obj,
        "fixed",
        JsValue::Number(7.0),
        PropertyAttributes::READ_ONLY | PropertyAttributes::DONT_DELETE,
    );
    interp.set_global("tools", JsValue::Object(obj)).unwrap();

    assert_eq!(interp.eval("tools.sum(3, 4)").unwrap(), JsValue::Number(7.0));
    assert_eq!(interp.eval("tools.fixed = 1; tools.fixed").unwrap(), JsValue::Number(7.0));
    assert_eq!(interp.eval("delete tools.fixed").unwrap(), JsValue::Boolean(false));
    assert_eq!(
        interp.eval("tools.propertyIsEnumerable('sum')").unwrap(),
        JsValue::Boolean(false)
    );
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_internal_properties_are_hidden_from_scripts() {
    let mut interp = create_test_runtime();
    let obj = interp.create_object().unwrap();
    interp.set_internal(&obj, "secret", &JsValue::Number(99.0));
    interp.set_global("holder", JsValue::Object(obj.clone())).unwrap();

    assert_eq!(interp.eval("holder.secret").unwrap(), JsValue::Undefined);
    assert_eq!(interp.eval("'secret' in holder").unwrap(), JsValue::Boolean(false));
    assert_eq!(
        interp.eval("var k = ''; for (var p in holder) k += p; k").unwrap(),
        JsValue::from("")
    );

    interp.eval("holder.secret = 1; delete holder.secret;").unwrap();
    assert_eq!(interp.get_internal(&obj, "secret"), Some(JsValue::Number(99.0)));
    assert_eq!(interp.get_internal(&obj, "missing"), None);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_create_error_for_host() {
    let mut interp = create_test_runtime();
    let error = interp.create_error(ErrorKind::RangeError, "too far").unwrap();
    interp.set_global("hostError", JsValue::Object(error)).unwrap();
    assert_eq!(
        interp.eval("hostError instanceof RangeError").unwrap(),
        JsValue::Boolean(true)
    );
    assert_eq!(
        interp.eval("String(hostError)").unwrap(),
        JsValue::from("RangeError: too far")
    );
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_builtin_prototype_lookup() {
    let mut interp = create_test_runtime();
    let array_proto = interp.builtin_prototype(BuiltinPrototype::Array);
    interp
        .set_global("hostArrayProto", JsValue::Object(array_proto))
        .unwrap();
    assert_eq!(
        interp.eval("hostArrayProto === Array.prototype").unwrap(),
        JsValue::Boolean(true)
    );

    let type_error_proto = interp.builtin_prototype(BuiltinPrototype::Error(ErrorKind::TypeError));
    let name = interp.get(&type_error_proto, "name").unwrap();
    assert_eq!(name, JsValue::from("TypeError"));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_replaced_builtin_prototype_applies_to_new_objects() {
    let mut interp = create_test_runtime();
    interp.eval("var before = [];").unwrap();

    let replacement = interp.create_object().unwrap();
    interp
        .put(&replacement, "marker", JsValue::from("replaced"))
        .unwrap();
    interp.set_builtin_prototype(BuiltinPrototype::Array, &replacement);

    assert_eq!(interp.eval("[].marker").unwrap(), JsValue::from("replaced"));
    assert_eq!(interp.eval("before.marker").unwrap(), JsValue::Undefined);
    assert_eq!(interp.eval("typeof before.push").unwrap(), JsValue::from("function"));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_host_supplied_global_object() {
    let heap: Heap<JsObject> = Heap::new();
    let global = heap.alloc(JsObject::new(ObjectClass::Global, None)).unwrap();
    global.borrow_mut().define(
        JsString::from("hostName"),
        HeapValue::String(JsString::from("embedder")),
        PropertyAttributes::empty(),
    );

    let mut interp = Interpreter::with_global(global.clone(), test_config()).unwrap();
    assert_eq!(interp.eval("hostName").unwrap(), JsValue::from("embedder"));
    assert_eq!(interp.eval("typeof Math.max").unwrap(), JsValue::from("function"));

    interp.eval("var added = 5;").unwrap();
    assert!(global.borrow().has_own("added"));
    assert!(interp.global_object() == global);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_separate_runtimes_are_isolated() {
    let mut first = create_test_runtime();
    let mut second = create_test_runtime();

    first.eval("var shared = 'first'; Array.prototype.extra = 1;").unwrap();
    assert_eq!(second.get_global("shared").unwrap(), JsValue::Undefined);
    assert_eq!(second.eval("[].extra").unwrap(), JsValue::Undefined);
    assert_eq!(first.heap().registered_runtimes(), 1);
}

#[test]
fn test_global_context_at_rest() {
    let interp = create_test_runtime();
    assert_eq!(interp.context_depth(), 1);
    let Some(context) = interp.global_context() else {
        panic!("runtime has no global context");
    };
    assert_eq!(context.code_type, CodeType::Global);
    assert_eq!(context.variable_object, interp.global_object().id());
    assert_eq!(context.scope, vec![interp.global_object().id()]);
    assert!(context.function.is_none());
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_config_from_json() {
    let config = RuntimeConfig::from_json(r#"{ "max_call_depth": 25, "gc_threshold": 0 }"#).unwrap();
    let mut interp = Interpreter::with_config(config).unwrap();
    assert_eq!(interp.config().max_call_depth, 25);
    assert!(interp
        .eval("function down(n) { return n ? down(n - 1) : 0; } down(100)")
        .is_err());

    assert!(RuntimeConfig::from_json(r#"{ "no_such_setting": 1 }"#).is_err());
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_to_object_and_conversions() {
    let mut interp = create_test_runtime();
    let wrapped = interp.to_object(&JsValue::from("abc")).unwrap();
    assert_eq!(interp.get(&wrapped, "length").unwrap(), JsValue::Number(3.0));
    assert!(interp.to_object(&JsValue::Null).is_err());

    assert_eq!(interp.to_number(&JsValue::from(" 12 ")).unwrap(), 12.0);
    assert_eq!(
        interp.to_js_string(&JsValue::Number(0.5)).unwrap().as_str(),
        "0.5"
    );
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_syntax_error_runs_nothing() {
    let mut interp = create_test_runtime();
    let completion = interp.evaluate("var partial = 1;\n)(", None);
    let Completion::Throw(JsValue::Object(error)) = completion else {
        panic!("expected a thrown SyntaxError");
    };
    assert_eq!(interp.get(&error, "name").unwrap(), JsValue::from("SyntaxError"));
    assert_eq!(interp.get_global("partial").unwrap(), JsValue::Undefined);
    assert_eq!(interp.eval("typeof partial").unwrap(), JsValue::from("undefined"));
}
