#![no_main]

use jsrt::{Interpreter, RuntimeConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only process valid UTF-8
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    // Smaller limit for interpreter (more expensive per byte)
    if source.len() > 10_000 {
        return;
    }

    // Infinite loops end through the timeout, runaway recursion through
    // the call depth limit, and allocation storms through the heap cap
    let config = RuntimeConfig {
        gc_threshold: 100,
        max_heap_objects: 100_000,
        max_call_depth: 200,
        timeout_ms: Some(200),
    };
    let Ok(mut interp) = Interpreter::with_config(config) else {
        return;
    };

    // Any completion is fine; only panics are bugs
    let _ = interp.evaluate(source, None);
    interp.collect_garbage();
});
