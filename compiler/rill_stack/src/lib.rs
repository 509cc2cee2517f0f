//! Stack safety for deep recursion.
//!
//! Every interpreted call runs the callee body on the native stack, so an
//! interpreted program that recurses deeply would overflow it. Callee bodies
//! are executed through [`ensure_sufficient_stack`], which grows the stack on
//! demand.
//!
//! - **Native targets**: uses the `stacker` crate.
//! - **WASM targets**: passthrough (WASM has its own stack management).

/// Minimum stack space to keep available (100KB red zone).
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
#[cfg(not(target_arch = "wasm32"))]
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Ensure sufficient stack space is available before executing `f`.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
