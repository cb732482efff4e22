//! References: the storage location an identifier or member expression names

use super::Interpreter;
use crate::error::JsError;
use crate::value::{CheapClone, JsString, JsValue, ObjectClass};

/// A property of a base value, or an identifier no scope object has.
#[derive(Debug, Clone)]
pub enum Reference {
    Property { base: JsValue, name: JsString },
    Unresolved(JsString),
}

impl Reference {
    pub fn name(&self) -> &JsString {
        match self {
            Reference::Property { name, .. } | Reference::Unresolved(name) => name,
        }
    }
}

impl Interpreter {
    /// Search the current scope chain, innermost first.
    pub(crate) fn resolve_identifier(&self, name: &JsString) -> Reference {
        let contexts = self.roots.contexts.borrow();
        if let Some(context) = contexts.last() {
            for id in context.scope.iter().rev() {
                if self.has_property(*id, name.as_str()) {
                    return Reference::Property {
                        base: JsValue::Object(self.pin(*id)),
                        name: name.cheap_clone(),
                    };
                }
            }
        }
        Reference::Unresolved(name.cheap_clone())
    }

    /// GetValue. Unresolved identifiers read as undefined.
    pub(crate) fn get_reference(&mut self, reference: &Reference) -> Result<JsValue, JsError> {
        match reference {
            Reference::Property { base, name } => self.get_value_property(base, name.as_str()),
            Reference::Unresolved(_) => Ok(JsValue::Undefined),
        }
    }

    /// PutValue. Unresolved identifiers become properties of the global
    /// object; writes to primitive bases are dropped.
    pub(crate) fn put_reference(
        &mut self,
        reference: &Reference,
        value: JsValue,
    ) -> Result<(), JsError> {
        match reference {
            Reference::Property {
                base: JsValue::Object(obj),
                name,
            } => self.put_property(obj, name.as_str(), value),
            Reference::Property { base, name } if base.is_null_or_undefined() => {
                Err(JsError::type_error(format!(
                    "cannot set property '{}' of {}",
                    name,
                    base.primitive_to_string()
                )))
            }
            Reference::Property { .. } => Ok(()),
            Reference::Unresolved(name) => {
                let global = self.global_object();
                self.put_property(&global, name.as_str(), value)
            }
        }
    }

    pub(crate) fn delete_reference(&mut self, reference: &Reference) -> Result<bool, JsError> {
        match reference {
            Reference::Property { base, name } => {
                let obj = self.to_object(base)?;
                Ok(self.delete_property(&obj, name.as_str()))
            }
            Reference::Unresolved(_) => Ok(true),
        }
    }

    /// `this` for a call through `reference`: the base object, except that
    /// activation and other scope-record bases give way to the global object.
    pub(crate) fn reference_this(&self, reference: &Reference) -> JsValue {
        match reference {
            Reference::Property {
                base: JsValue::Object(obj),
                ..
            } if obj.borrow().class == ObjectClass::Activation => JsValue::Null,
            Reference::Property { base, .. } => base.clone(),
            Reference::Unresolved(_) => JsValue::Null,
        }
    }
}
