//! Error types for the interpreter

use std::fmt;

use thiserror::Error;

use crate::ast::SourceId;
use crate::gc::HeapError;
use crate::value::JsValue;

/// Source location information for error messages
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLocation {
    pub source: Option<SourceId>,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            Some(source) => write!(f, "<source {}>:{}:{}", source, self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

/// The native error constructors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Error,
    EvalError,
    RangeError,
    ReferenceError,
    SyntaxError,
    TypeError,
    UriError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Error,
        ErrorKind::EvalError,
        ErrorKind::RangeError,
        ErrorKind::ReferenceError,
        ErrorKind::SyntaxError,
        ErrorKind::TypeError,
        ErrorKind::UriError,
    ];

    /// Constructor name, also the `name` of its prototype
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::EvalError => "EvalError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::UriError => "URIError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Main error type for the interpreter
#[derive(Debug, Error)]
pub enum JsError {
    #[error("SyntaxError: {message} at {location}")]
    SyntaxError {
        message: String,
        location: SourceLocation,
    },

    #[error("TypeError: {message}")]
    TypeError { message: String },

    #[error("ReferenceError: {message}")]
    ReferenceError { message: String },

    #[error("RangeError: {message}")]
    RangeError { message: String },

    /// Error, EvalError and URIError
    #[error("{kind}: {message}")]
    Native { kind: ErrorKind, message: String },

    /// A script value in flight (`throw expr`)
    #[error("Uncaught {0:?}")]
    Thrown(JsValue),

    #[error("Out of memory")]
    OutOfMemory,

    #[error("Execution terminated")]
    Terminated,

    #[error("Execution aborted by debugger")]
    Aborted,
}

impl JsError {
    pub fn syntax_error(message: impl Into<String>, line: u32, column: u32) -> Self {
        JsError::SyntaxError {
            message: message.into(),
            location: SourceLocation {
                source: None,
                line,
                column,
            },
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        JsError::TypeError {
            message: message.into(),
        }
    }

    pub fn reference_error(message: impl Into<String>) -> Self {
        JsError::ReferenceError {
            message: message.into(),
        }
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        JsError::RangeError {
            message: message.into(),
        }
    }

    pub fn native(kind: ErrorKind, message: impl Into<String>) -> Self {
        match kind {
            ErrorKind::TypeError => JsError::type_error(message),
            ErrorKind::ReferenceError => JsError::reference_error(message),
            ErrorKind::RangeError => JsError::range_error(message),
            ErrorKind::SyntaxError => JsError::syntax_error(message, 0, 0),
            _ => JsError::Native {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn thrown(value: JsValue) -> Self {
        JsError::Thrown(value)
    }

    /// Native error constructor this error materializes as, if any.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            JsError::SyntaxError { .. } => Some(ErrorKind::SyntaxError),
            JsError::TypeError { .. } => Some(ErrorKind::TypeError),
            JsError::ReferenceError { .. } => Some(ErrorKind::ReferenceError),
            JsError::RangeError { .. } | JsError::OutOfMemory => Some(ErrorKind::RangeError),
            JsError::Native { kind, .. } => Some(*kind),
            JsError::Terminated | JsError::Aborted => Some(ErrorKind::Error),
            JsError::Thrown(_) => None,
        }
    }

    /// Message without the constructor prefix
    pub fn message(&self) -> String {
        match self {
            JsError::SyntaxError { message, .. }
            | JsError::TypeError { message }
            | JsError::ReferenceError { message }
            | JsError::RangeError { message }
            | JsError::Native { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Line number for syntax errors
    pub fn line(&self) -> Option<u32> {
        match self {
            JsError::SyntaxError { location, .. } => Some(location.line),
            _ => None,
        }
    }

    /// Errors that `catch` may not intercept
    pub fn is_uncatchable(&self) -> bool {
        matches!(self, JsError::Terminated | JsError::Aborted)
    }
}

impl From<HeapError> for JsError {
    fn from(_: HeapError) -> Self {
        JsError::OutOfMemory
    }
}
