//! Stack growth for recursive node construction.
//!
//! Node trees nest as deeply as composite members nest, and building one
//! recursively builds the roots of every member type.

/// Keep at least this much stack before recursing (100KB).
const RED_ZONE: usize = 100 * 1024;

/// Grow by this much when the red zone is hit (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
