//! Semantic analysis engine for C++ declarations.
//!
//! A parser drives the [`SymbolTable`] incrementally as it walks tokens:
//! it creates symbols for declarations, resolves names against scope,
//! inheritance and namespace rules, resolves overloaded calls, and
//! instantiates templates on demand. Every mutation can be undone through
//! the mark/rollback/commit transaction log so the parser can backtrack
//! out of speculative parses.
//!
//! # Architecture
//!
//! Leaf-first:
//!
//! - [`ty`]: `TypeDesc`, the plain-data type descriptor
//! - [`symbol`]: `Symbol` and its kind-specific payloads, addressed by `SymbolId`
//! - `log`: undo records and marks
//! - `table`: the arena-owning `SymbolTable` (factories, mutators, queries)
//! - `lookup`: unqualified/qualified/prefix lookup, using-directives, bases
//! - `overload`: conversion costs and best-viable-function selection
//! - `template`: specialization selection, instantiation cache, deferred work
//! - `visibility`: member access through inheritance paths
//!
//! # Error taxonomy
//!
//! Recoverable semantic outcomes are returned as [`SemaError`]. Misuse of
//! the transaction log is a [`TransactionError`]. Internal invariant
//! violations and unsupported operations panic: they indicate a bug in the
//! driving parser, not a property of the program being analyzed.

mod config;
mod error;
mod log;
mod lookup;
mod overload;
mod stack;
pub mod symbol;
mod table;
mod template;
pub mod ty;
mod visibility;

pub use config::{Language, SemaConfig};
pub use error::{SemaError, SemaResult, TransactionError};
pub use log::Mark;
pub use lookup::{LookupEntry, LookupOptions, LookupResult, TypeFilter};
pub use overload::{Cost, Rank, UserDefined};
pub use symbol::{Access, ParentLink, Symbol, SymbolId, SymbolKind};
pub use table::SymbolTable;
pub use ty::{BaseKind, Cv, PtrOp, PtrOpKind, TypeDesc, TypeFlags};

#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::SymbolId;
    cxs_ir::static_assert_size!(SymbolId, 4);
    cxs_ir::static_assert_size!(Option<SymbolId>, 8);
}
