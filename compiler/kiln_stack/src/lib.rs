//! Stack safety utilities for deep recursion.
//!
//! Two separate concerns live here:
//!
//! - [`StackBudget`]: the *logical* bound a compile job imposes on recursive
//!   phases. Every recursive production charges a fixed frame cost; running
//!   past the job's `max_stack_bytes` is a reportable failure, not a crash.
//!   Costs are charged by accounting, not by measuring the native stack, so a
//!   given budget fails deterministically on every platform and thread.
//! - [`ensure_sufficient_stack`]: the *physical* guard. Worker threads often
//!   run with small native stacks; the `stacker` crate grows the stack on
//!   demand so that recursion the budget allows never overflows.
//!
//! # Configuration
//!
//! - **Red zone**: 100KB - If less than this remains, we grow the stack
//! - **Growth size**: 1MB - Each growth allocates this much additional space

mod budget;

pub use budget::{StackBudget, StackExhausted, DEFAULT_MAX_STACK_BYTES};

/// Minimum stack space to keep available (100KB red zone).
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
#[cfg(not(target_arch = "wasm32"))]
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Ensure sufficient stack space is available before executing `f`.
///
/// If the remaining stack is below the red zone threshold, this will
/// allocate additional stack space before calling `f`.
///
/// # Platform Behavior
///
/// - **Native**: Uses `stacker::maybe_grow` to dynamically grow the stack
/// - **WASM**: Simply calls `f()` directly (WASM manages its own stack)
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly (WASM has its own stack management).
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests;
