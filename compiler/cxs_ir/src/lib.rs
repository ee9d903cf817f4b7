//! Shared identifier types for the cxs semantic engine.
//!
//! - `Name`: 32-bit interned identifier, compared by index
//! - `StringInterner`: owner of the identifier text
//! - `AstLink`: opaque handle back to whatever parser node created a symbol
//!
//! The engine is single-threaded per translation unit, so the interner is
//! a plain owned value rather than a sharded, lock-protected one.

/// Compile-time assertion that a type has a specific size.
///
/// Used to keep frequently copied handles small.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod ast_link;
mod interner;
mod name;

pub use ast_link::AstLink;
pub use interner::{InternError, StringInterner};
pub use name::Name;

#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::{AstLink, Name};
    static_assert_size!(Name, 4);
    static_assert_size!(AstLink, 8);
}
