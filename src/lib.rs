//! Embeddable ECMAScript 3 interpreter
//!
//! Scripts are parsed into an AST and evaluated by a tree-walking
//! interpreter over a mark-sweep garbage-collected object heap. Several
//! runtimes may share one heap; each registers its roots with it.
//!
//! # Example
//!
//! ```
//! use jsrt::{Interpreter, JsValue};
//!
//! let mut interp = Interpreter::new().unwrap();
//! let result = interp.eval("var x = 6; x * 7").unwrap();
//! assert_eq!(result, JsValue::Number(42.0));
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod gc;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod stack;
pub mod string_dict;
pub mod value;

pub use config::RuntimeConfig;
pub use error::{ErrorKind, JsError};
pub use gc::{GcStats, Heap};
pub use interpreter::{
    BuiltinPrototype, CodeType, Completion, DebugAction, Debugger, ExecutionContext, Interpreter,
    StatementEvent, TerminationHandle,
};
pub use value::{
    CheapClone, JsObject, JsObjectRef, JsString, JsValue, NativeFn, ObjectClass,
    PropertyAttributes,
};
