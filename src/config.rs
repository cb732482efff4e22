//! Runtime configuration
//!
//! Every field has a default, so a JSON file only needs the keys it changes:
//!
//! ```json
//! { "gc_threshold": 200, "max_call_depth": 500, "timeout_ms": 2000 }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::JsError;
use crate::gc::{DEFAULT_GC_THRESHOLD, DEFAULT_MAX_LIVE};

/// Call depth at which a RangeError is thrown
pub const DEFAULT_MAX_CALL_DEPTH: usize = 400;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Allocations between automatic collections; 0 disables them
    pub gc_threshold: usize,
    /// Live objects allowed before the heap reports itself full
    pub max_heap_objects: usize,
    pub max_call_depth: usize,
    /// Wall-clock budget per top-level evaluation, enforced as a
    /// termination request
    pub timeout_ms: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            gc_threshold: DEFAULT_GC_THRESHOLD,
            max_heap_objects: DEFAULT_MAX_LIVE,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            timeout_ms: None,
        }
    }
}

impl RuntimeConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self, JsError> {
        serde_json::from_str(text)
            .map_err(|err| JsError::type_error(format!("invalid runtime config: {}", err)))
    }
}
