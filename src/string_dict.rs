//! Interning table for property names and identifiers.
//!
//! The lexer interns every identifier and string literal, and the runtime
//! interns the names of built-in properties, so repeated names share one
//! `Rc<str>` allocation.

use rustc_hash::FxHashMap;

use crate::value::{CheapClone, JsString};

/// Deduplicating store of [`JsString`] instances.
pub struct StringDict {
    /// Keyed by `Box<str>` so lookups by `&str` avoid an `Rc` indirection.
    strings: FxHashMap<Box<str>, JsString>,
}

impl StringDict {
    pub fn new() -> Self {
        Self {
            strings: FxHashMap::default(),
        }
    }

    /// A dictionary seeded with the names the runtime itself looks up.
    pub fn with_common_strings() -> Self {
        let mut dict = Self::new();
        for s in COMMON_STRINGS {
            dict.get_or_insert(s);
        }
        dict
    }

    /// Return the shared instance for `s`, inserting it on first use.
    pub fn get_or_insert(&mut self, s: &str) -> JsString {
        if let Some(existing) = self.strings.get(s) {
            return existing.cheap_clone();
        }
        let js_str = JsString::from(s);
        self.strings.insert(s.into(), js_str.cheap_clone());
        js_str
    }

    pub fn get(&self, s: &str) -> Option<JsString> {
        self.strings.get(s).map(|s| s.cheap_clone())
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringDict {
    fn default() -> Self {
        Self::new()
    }
}

const COMMON_STRINGS: &[&str] = &[
    // Properties the evaluator reads or installs
    "length",
    "prototype",
    "constructor",
    "__proto__",
    "arguments",
    "callee",
    "name",
    "message",
    "line",
    "sourceId",
    "toString",
    "valueOf",
    // typeof results
    "undefined",
    "object",
    "boolean",
    "number",
    "string",
    "function",
    // Constructors and globals
    "Object",
    "Function",
    "Array",
    "String",
    "Boolean",
    "Number",
    "Math",
    "Error",
    "EvalError",
    "RangeError",
    "ReferenceError",
    "SyntaxError",
    "TypeError",
    "URIError",
    "NaN",
    "Infinity",
    "eval",
    // Frequent script identifiers
    "i",
    "j",
    "k",
    "n",
    "x",
    "y",
    "obj",
    "result",
];
