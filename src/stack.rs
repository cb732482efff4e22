//! Native stack guard for the recursive parser and evaluator.

/// Keep at least this much stack free before recursing.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, switching to a fresh stack segment first if the current one is
/// nearly exhausted. Deeply nested source then costs heap memory instead of
/// overflowing the thread stack.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
