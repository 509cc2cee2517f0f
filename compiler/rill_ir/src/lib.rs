//! Rill IR - identifiers and source locations.
//!
//! This crate holds the small, `Copy` types every other Rill crate passes
//! around:
//! - `Span` for source locations
//! - `Name` for interned identifiers
//! - `StringInterner` / `SharedInterner` for resolving names to text
//!
//! Identifiers are interned once and compared as `u32`, so parameter and
//! argument name matching in the call-dispatch core never touches strings.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-copied types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod interner;
mod name;
mod span;

pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;
pub use span::Span;
