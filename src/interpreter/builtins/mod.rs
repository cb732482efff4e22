//! Built-in objects
//!
//! Each module follows the same layout: `init_*_prototype` fills in a
//! prototype allocated at bootstrap, and `create_*_constructor` builds the
//! constructor function and links it to that prototype.

pub mod array;
pub mod boolean;
pub mod error;
pub mod function;
pub mod global;
pub mod math;
pub mod number;
pub mod object;
pub mod string;

use super::{Interpreter, Realm};
use crate::error::{ErrorKind, JsError};
use crate::gc::{Heap, ObjectId};
use crate::value::{
    CheapClone, FunctionKind, HeapValue, JsObject, JsObjectRef, JsString, JsValue, NativeFunction,
    ObjectClass, ObjectKind, PropertyAttributes,
};

/// Objects every runtime needs before any builtin can be created. The
/// handles keep them alive until the runtime's root set is registered.
pub(crate) struct CoreObjects {
    _handles: Vec<JsObjectRef>,
    realm: Realm,
}

impl CoreObjects {
    pub(crate) fn realm(&self) -> Realm {
        self.realm
    }
}

fn alloc_core(
    heap: &Heap<JsObject>,
    handles: &mut Vec<JsObjectRef>,
    object: JsObject,
) -> Result<ObjectId, JsError> {
    let obj = heap.alloc(object)?;
    let id = obj.id();
    handles.push(obj);
    Ok(id)
}

fn wrapper_prototype(proto: ObjectId, class: ObjectClass, primitive: HeapValue) -> JsObject {
    let mut object = JsObject::new(class, Some(proto));
    object.internal = Some(primitive);
    object
}

pub(crate) fn allocate_core_objects(
    heap: &Heap<JsObject>,
    global: Option<JsObjectRef>,
) -> Result<CoreObjects, JsError> {
    let mut handles = Vec::new();
    let h = &mut handles;

    let object_prototype = alloc_core(heap, h, JsObject::new(ObjectClass::Object, None))?;

    // Function.prototype is itself a function that returns undefined
    let mut function_prototype = JsObject::new(ObjectClass::Function, Some(object_prototype));
    function_prototype.kind = ObjectKind::Function(FunctionKind::Native(NativeFunction {
        name: JsString::from(""),
        arity: 0,
        call: function::function_prototype_call,
        construct: None,
    }));
    let function_prototype = alloc_core(heap, h, function_prototype)?;

    let array_prototype = alloc_core(
        heap,
        h,
        JsObject::new(ObjectClass::Array, Some(object_prototype)),
    )?;
    let string_prototype = alloc_core(
        heap,
        h,
        wrapper_prototype(
            object_prototype,
            ObjectClass::String,
            HeapValue::String(JsString::from("")),
        ),
    )?;
    let number_prototype = alloc_core(
        heap,
        h,
        wrapper_prototype(object_prototype, ObjectClass::Number, HeapValue::Number(0.0)),
    )?;
    let boolean_prototype = alloc_core(
        heap,
        h,
        wrapper_prototype(
            object_prototype,
            ObjectClass::Boolean,
            HeapValue::Boolean(false),
        ),
    )?;

    let error_prototype = alloc_core(
        heap,
        h,
        JsObject::new(ObjectClass::Error, Some(object_prototype)),
    )?;
    let mut native_error = || {
        alloc_core(
            heap,
            h,
            JsObject::new(ObjectClass::Error, Some(error_prototype)),
        )
    };
    let eval_error_prototype = native_error()?;
    let range_error_prototype = native_error()?;
    let reference_error_prototype = native_error()?;
    let syntax_error_prototype = native_error()?;
    let type_error_prototype = native_error()?;
    let uri_error_prototype = native_error()?;

    let global = match global {
        Some(global) => {
            let id = global.id();
            h.push(global);
            id
        }
        None => alloc_core(
            heap,
            h,
            JsObject::new(ObjectClass::Global, Some(object_prototype)),
        )?,
    };

    // Thrown when the heap refuses an allocation, so it must exist up front
    let mut out_of_memory = JsObject::new(ObjectClass::Error, Some(range_error_prototype));
    out_of_memory.define(
        JsString::from("message"),
        HeapValue::String(JsString::from("Out of memory")),
        PropertyAttributes::empty(),
    );
    let out_of_memory = alloc_core(heap, h, out_of_memory)?;

    Ok(CoreObjects {
        _handles: handles,
        realm: Realm {
            global,
            object_prototype,
            function_prototype,
            array_prototype,
            string_prototype,
            number_prototype,
            boolean_prototype,
            error_prototype,
            eval_error_prototype,
            range_error_prototype,
            reference_error_prototype,
            syntax_error_prototype,
            type_error_prototype,
            uri_error_prototype,
            out_of_memory,
        },
    })
}

/// Install every builtin onto the core objects and the global object.
pub(crate) fn init(interp: &mut Interpreter) -> Result<(), JsError> {
    object::init_object_prototype(interp)?;
    function::init_function_prototype(interp)?;
    array::init_array_prototype(interp)?;
    string::init_string_prototype(interp)?;
    number::init_number_prototype(interp)?;
    boolean::init_boolean_prototype(interp)?;
    error::init_error_prototypes(interp)?;

    let global = interp.global_object();
    let constructors = [
        ("Object", object::create_object_constructor(interp)?),
        ("Function", function::create_function_constructor(interp)?),
        ("Array", array::create_array_constructor(interp)?),
        ("String", string::create_string_constructor(interp)?),
        ("Number", number::create_number_constructor(interp)?),
        ("Boolean", boolean::create_boolean_constructor(interp)?),
    ];
    for (name, constructor) in constructors {
        interp.define_value(
            &global,
            name,
            JsValue::Object(constructor),
            PropertyAttributes::BUILTIN,
        );
    }
    for kind in ErrorKind::ALL {
        let constructor = error::create_error_constructor(interp, kind)?;
        interp.define_value(
            &global,
            kind.name(),
            JsValue::Object(constructor),
            PropertyAttributes::BUILTIN,
        );
    }

    global::init_global_object(interp, &global)?;
    let math = math::create_math_object(interp)?;
    interp.define_value(&global, "Math", JsValue::Object(math), PropertyAttributes::BUILTIN);
    Ok(())
}

/// Point `constructor.prototype` and `prototype.constructor` at each other.
pub(crate) fn link_constructor(
    interp: &mut Interpreter,
    constructor: &JsObjectRef,
    prototype: &JsObjectRef,
) {
    interp.define_value(
        constructor,
        "prototype",
        JsValue::Object(prototype.cheap_clone()),
        PropertyAttributes::FIXED,
    );
    interp.define_value(
        prototype,
        "constructor",
        JsValue::Object(constructor.cheap_clone()),
        PropertyAttributes::BUILTIN,
    );
}

/// Argument `index`, or undefined when absent
pub(crate) fn argument(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or_default()
}

/// Argument `index` converted with ToNumber, NaN when absent
pub(crate) fn number_argument(
    interp: &mut Interpreter,
    args: &[JsValue],
    index: usize,
) -> Result<f64, JsError> {
    match args.get(index) {
        Some(value) => interp.to_number(value),
        None => Ok(f64::NAN),
    }
}
