// Calls nested deeper than this stop with a "stack overflow" runtime error.
pub(crate) const MAX_CALL_DEPTH: usize = 1024;

// Expressions nested deeper than this (parentheses, operands, blocks, literals) are rejected by
// the parser.
pub(crate) const MAX_NESTING_DEPTH: usize = 256;

// If less than this is left on the native stack, grow it before recursing further.
const RED_ZONE: usize = 100 * 1024;

// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Runs `f`, first moving to a freshly allocated stack segment when the current one is nearly
/// exhausted. Wrapped around every recursive step of the parser and the evaluator, so reaching
/// the depth limits above never overflows the native stack, whatever thread it runs on.
#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
