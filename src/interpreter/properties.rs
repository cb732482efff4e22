//! Property access and type conversions
//!
//! Everything that reads or writes object properties goes through these
//! methods so that `ReadOnly`, array `length`, argument aliasing and the
//! `__proto__` accessor behave the same for scripts, builtins and hosts.

use rustc_hash::FxHashSet;

use super::Interpreter;
use crate::error::JsError;
use crate::gc::{ObjectId, Space};
use crate::value::{
    CheapClone, HeapValue, JsObject, JsObjectRef, JsString, JsValue, ObjectClass, ObjectKind,
    PropertyAttributes, array_index, to_uint32,
};

/// Steps taken before a prototype walk starts remembering visited objects
const CYCLE_CHECK_AFTER: usize = 8;

/// Iterator over an object and its prototypes that stops on cycles.
pub(crate) struct PrototypeWalk {
    next: Option<ObjectId>,
    steps: usize,
    visited: Option<hashbrown::HashSet<ObjectId>>,
}

impl PrototypeWalk {
    pub(crate) fn new(start: Option<ObjectId>) -> Self {
        Self {
            next: start,
            steps: 0,
            visited: None,
        }
    }

    pub(crate) fn next(&mut self, space: &Space<JsObject>) -> Option<ObjectId> {
        let id = self.next.take()?;
        if !space.contains(id) {
            return None;
        }
        self.steps += 1;
        if self.steps > CYCLE_CHECK_AFTER {
            let visited = self.visited.get_or_insert_with(hashbrown::HashSet::new);
            if !visited.insert(id) {
                return None;
            }
        }
        self.next = space.get(id).prototype;
        Some(id)
    }
}

/// Preferred result type of ToPrimitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hint {
    Number,
    String,
}

impl Interpreter {
    // ═══════════════════════════════════════════════════════════════
    // Host-facing accessors
    // ═══════════════════════════════════════════════════════════════

    /// `obj[name]`, following the prototype chain.
    pub fn get(&mut self, obj: &JsObjectRef, name: &str) -> Result<JsValue, JsError> {
        Ok(self.get_property(obj, name))
    }

    /// `obj[name] = value` with ordinary assignment semantics.
    pub fn put(&mut self, obj: &JsObjectRef, name: &str, value: JsValue) -> Result<(), JsError> {
        self.put_property(obj, name, value)
    }

    // ═══════════════════════════════════════════════════════════════
    // [[Get]] / [[Put]] / [[Delete]] / [[HasProperty]]
    // ═══════════════════════════════════════════════════════════════

    /// Find `name` on the chain starting at `start`.
    fn lookup(&self, start: ObjectId, name: &str) -> Option<HeapValue> {
        let space = self.heap.space();
        let mut walk = PrototypeWalk::new(Some(start));
        while let Some(id) = walk.next(&space) {
            let object = space.get(id);
            if let ObjectKind::Arguments(args) = &object.kind {
                if let Some(param) = args.mapped_name(name) {
                    let activation = space.get(args.activation);
                    return Some(
                        activation
                            .properties
                            .get(param.as_str())
                            .map(|prop| prop.value.clone())
                            .unwrap_or_default(),
                    );
                }
            }
            if let Some(prop) = object.get_own(name) {
                return Some(prop.value.clone());
            }
        }
        None
    }

    pub(crate) fn get_property(&self, obj: &JsObjectRef, name: &str) -> JsValue {
        if name == "__proto__" {
            return match obj.borrow().prototype {
                Some(proto) => JsValue::Object(self.pin(proto)),
                None => JsValue::Null,
            };
        }
        match self.lookup(obj.id(), name) {
            Some(value) => value.to_value(&self.heap),
            None => JsValue::Undefined,
        }
    }

    /// Property read on any value. Primitives read from their prototype
    /// without allocating a wrapper.
    pub(crate) fn get_value_property(
        &mut self,
        base: &JsValue,
        name: &str,
    ) -> Result<JsValue, JsError> {
        let realm = self.realm();
        let proto = match base {
            JsValue::Object(obj) => return Ok(self.get_property(obj, name)),
            JsValue::String(s) => {
                if name == "length" {
                    return Ok(JsValue::Number(s.utf16_len() as f64));
                }
                if let Some(unit) = array_index(name).and_then(|i| s.code_unit_at(i as usize)) {
                    return Ok(JsValue::String(JsString::from_utf16(&[unit])));
                }
                realm.string_prototype
            }
            JsValue::Number(_) => realm.number_prototype,
            JsValue::Boolean(_) => realm.boolean_prototype,
            JsValue::Undefined | JsValue::Null => {
                return Err(JsError::type_error(format!(
                    "cannot read property '{}' of {}",
                    name,
                    base.primitive_to_string()
                )));
            }
        };
        Ok(self
            .lookup(proto, name)
            .map(|value| value.to_value(&self.heap))
            .unwrap_or_default())
    }

    /// Whether an ordinary assignment to `name` may proceed. The first
    /// property found on the chain decides.
    pub(crate) fn can_put(&self, start: ObjectId, name: &str) -> bool {
        let space = self.heap.space();
        let mut walk = PrototypeWalk::new(Some(start));
        while let Some(id) = walk.next(&space) {
            if let Some(prop) = space.get(id).properties.get(name) {
                return !(prop.is_read_only() || prop.is_internal());
            }
        }
        true
    }

    pub(crate) fn put_property(
        &mut self,
        obj: &JsObjectRef,
        name: &str,
        value: JsValue,
    ) -> Result<(), JsError> {
        if name == "__proto__" {
            match &value {
                JsValue::Object(proto) => obj.borrow_mut().prototype = Some(proto.id()),
                JsValue::Null => obj.borrow_mut().prototype = None,
                _ => {}
            }
            return Ok(());
        }
        if !self.can_put(obj.id(), name) {
            return Ok(());
        }

        let (class, alias) = {
            let object = obj.borrow();
            let alias = match &object.kind {
                ObjectKind::Arguments(args) => args
                    .mapped_name(name)
                    .map(|param| (args.activation, param.cheap_clone())),
                _ => None,
            };
            (object.class, alias)
        };

        if class == ObjectClass::Array {
            return self.put_array_property(obj, name, value);
        }
        if let Some((activation, param)) = alias {
            if let Some(mut activation) = self.heap.get_mut(activation) {
                match activation.properties.get_mut(param.as_str()) {
                    Some(prop) => prop.value = HeapValue::from(&value),
                    None => activation.define(param, HeapValue::from(&value), PropertyAttributes::empty()),
                }
            }
        }
        self.write_own(obj, name, &value);
        Ok(())
    }

    /// Store an own property, keeping the attributes of an existing one.
    fn write_own(&mut self, obj: &JsObjectRef, name: &str, value: &JsValue) {
        let mut object = obj.borrow_mut();
        if let Some(prop) = object.properties.get_mut(name) {
            prop.value = HeapValue::from(value);
            return;
        }
        drop(object);
        let key = self.intern(name);
        obj.borrow_mut()
            .define(key, HeapValue::from(value), PropertyAttributes::empty());
    }

    fn put_array_property(
        &mut self,
        obj: &JsObjectRef,
        name: &str,
        value: JsValue,
    ) -> Result<(), JsError> {
        if name == "length" {
            let requested = self.to_number(&value)?;
            let new_len = to_uint32(requested);
            if f64::from(new_len) != requested {
                return Err(JsError::range_error("Invalid array length"));
            }
            if new_len < self.array_length(obj) {
                obj.borrow_mut()
                    .properties
                    .retain(|key, prop| match array_index(key.as_str()) {
                        Some(index) if index >= new_len => !prop.is_deletable(),
                        _ => true,
                    });
            }
            self.write_own(obj, "length", &JsValue::Number(f64::from(new_len)));
            return Ok(());
        }

        self.write_own(obj, name, &value);
        if let Some(index) = array_index(name) {
            if index >= self.array_length(obj) {
                self.write_own(obj, "length", &JsValue::Number(f64::from(index) + 1.0));
            }
        }
        Ok(())
    }

    /// Own `length` of an array-like object as a uint32
    pub(crate) fn array_length(&self, obj: &JsObjectRef) -> u32 {
        match obj.borrow().get_own("length").map(|prop| &prop.value) {
            Some(HeapValue::Number(n)) => to_uint32(*n),
            _ => 0,
        }
    }

    /// `delete obj[name]`. Fails only for `DontDelete` properties.
    pub(crate) fn delete_property(&mut self, obj: &JsObjectRef, name: &str) -> bool {
        let mut object = obj.borrow_mut();
        let existing = object
            .properties
            .get(name)
            .map(|prop| (prop.is_internal(), prop.is_deletable()));
        match existing {
            None => {}
            Some((true, _)) => return true,
            Some((false, false)) => return false,
            Some((false, true)) => {
                object.remove(name);
            }
        }
        if let ObjectKind::Arguments(args) = &mut object.kind {
            args.unmap(name);
        }
        true
    }

    pub(crate) fn has_property(&self, start: ObjectId, name: &str) -> bool {
        let space = self.heap.space();
        let mut walk = PrototypeWalk::new(Some(start));
        while let Some(id) = walk.next(&space) {
            if space.get(id).has_own(name) {
                return true;
            }
        }
        false
    }

    /// Enumerable property names for `for-in`: own names first, then
    /// inherited ones when `recurse` is set. A name appears once, and a
    /// non-enumerable property hides an enumerable one further up the chain.
    pub(crate) fn prop_list(&self, obj: &JsObjectRef, recurse: bool) -> Vec<JsString> {
        let space = self.heap.space();
        let mut seen: FxHashSet<JsString> = FxHashSet::default();
        let mut names = Vec::new();
        let mut walk = PrototypeWalk::new(Some(obj.id()));
        while let Some(id) = walk.next(&space) {
            for (key, prop) in &space.get(id).properties {
                if prop.is_internal() {
                    continue;
                }
                if seen.insert(key.cheap_clone()) && prop.is_enumerable() {
                    names.push(key.cheap_clone());
                }
            }
            if !recurse {
                break;
            }
        }
        names
    }

    /// Whether `proto` appears on the prototype chain of `obj` (excluding
    /// `obj` itself).
    pub(crate) fn inherits_from(&self, obj: &JsObjectRef, proto: ObjectId) -> bool {
        let space = self.heap.space();
        let start = space.get(obj.id()).prototype;
        let mut walk = PrototypeWalk::new(start);
        while let Some(id) = walk.next(&space) {
            if id == proto {
                return true;
            }
        }
        false
    }

    // ═══════════════════════════════════════════════════════════════
    // Conversions
    // ═══════════════════════════════════════════════════════════════

    /// [[DefaultValue]]: try `toString`/`valueOf` in hint order.
    pub(crate) fn default_value(
        &mut self,
        obj: &JsObjectRef,
        hint: Hint,
    ) -> Result<JsValue, JsError> {
        let order = match hint {
            Hint::String => ["toString", "valueOf"],
            Hint::Number => ["valueOf", "toString"],
        };
        for method in order {
            if let JsValue::Object(func) = self.get_property(obj, method) {
                if func.borrow().is_callable() {
                    let result =
                        self.call_function(&func, JsValue::Object(obj.cheap_clone()), &[])?;
                    if !result.is_object() {
                        return Ok(result);
                    }
                }
            }
        }
        Err(JsError::type_error("cannot convert object to primitive value"))
    }

    pub(crate) fn to_primitive(&mut self, value: &JsValue, hint: Hint) -> Result<JsValue, JsError> {
        match value {
            JsValue::Object(obj) => self.default_value(obj, hint),
            primitive => Ok(primitive.clone()),
        }
    }

    /// ToNumber
    pub fn to_number(&mut self, value: &JsValue) -> Result<f64, JsError> {
        match value {
            JsValue::Object(_) => Ok(self.to_primitive(value, Hint::Number)?.primitive_to_number()),
            primitive => Ok(primitive.primitive_to_number()),
        }
    }

    /// ToString
    pub fn to_js_string(&mut self, value: &JsValue) -> Result<JsString, JsError> {
        match value {
            JsValue::Object(_) => Ok(self.to_primitive(value, Hint::String)?.primitive_to_string()),
            primitive => Ok(primitive.primitive_to_string()),
        }
    }

    /// ToObject. Primitives get a fresh wrapper; null and undefined fail.
    pub fn to_object(&mut self, value: &JsValue) -> Result<JsObjectRef, JsError> {
        let realm = self.realm();
        match value {
            JsValue::Object(obj) => Ok(obj.cheap_clone()),
            JsValue::Undefined | JsValue::Null => Err(JsError::type_error(format!(
                "{} has no properties",
                value.primitive_to_string()
            ))),
            JsValue::Boolean(b) => self.create_wrapper(
                ObjectClass::Boolean,
                realm.boolean_prototype,
                HeapValue::Boolean(*b),
            ),
            JsValue::Number(n) => self.create_wrapper(
                ObjectClass::Number,
                realm.number_prototype,
                HeapValue::Number(*n),
            ),
            JsValue::String(s) => self.create_wrapper(
                ObjectClass::String,
                realm.string_prototype,
                HeapValue::String(s.cheap_clone()),
            ),
        }
    }

    /// Wrapper object around a primitive (`new Number(1)`, ToObject).
    pub(crate) fn create_wrapper(
        &mut self,
        class: ObjectClass,
        proto: ObjectId,
        primitive: HeapValue,
    ) -> Result<JsObjectRef, JsError> {
        let mut wrapper = JsObject::new(class, Some(proto));
        if let HeapValue::String(s) = &primitive {
            wrapper.define(
                self.intern("length"),
                HeapValue::Number(s.utf16_len() as f64),
                PropertyAttributes::FIXED,
            );
        }
        wrapper.internal = Some(primitive);
        self.alloc(wrapper)
    }

    /// Primitive held by a wrapper object of the given class
    pub(crate) fn wrapped_primitive(&self, value: &JsValue, class: ObjectClass) -> Option<JsValue> {
        let obj = value.as_object()?;
        let object = obj.borrow();
        if object.class != class {
            return None;
        }
        let internal = object.internal.clone()?;
        drop(object);
        Some(internal.to_value(&self.heap))
    }
}
