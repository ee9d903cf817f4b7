//! Recoverable semantic errors, transaction misuse, and internal failures.

use cxs_diagnostic::{Diagnostic, ErrorCode};
use cxs_ir::{Name, StringInterner};

/// Result of an engine operation that can fail for reasons of the program
/// being analyzed.
pub type SemaResult<T> = Result<T, SemaError>;

/// A recoverable semantic error. The caller decides whether it is fatal.
///
/// Every variant names the declaration involved, so a diagnostic can be
/// built without re-running the failed operation.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SemaError {
    /// A name or call resolves to more than one declaration.
    #[error("reference to {name:?} is ambiguous")]
    Ambiguous { name: Name },

    /// A descriptor or symbol cannot be used the way it was asked to be.
    #[error("bad type information for {name:?}")]
    BadTypeInfo { name: Name },

    /// Argument `index` does not match the template's parameter.
    #[error("bad argument {index} for template {template:?}")]
    BadTemplateArgument { template: Name, index: usize },

    /// The symbol is not a member reachable from the qualifying class.
    #[error("{name:?} is not visible through the qualifying class")]
    BadVisibility { name: Name },

    /// A class appears on its own inheritance path.
    #[error("circular inheritance through {class:?}")]
    CircularInheritance { class: Name },

    /// Deferred instantiation did not converge within the pass limit.
    #[error("instantiation of {template:?} does not terminate")]
    RecursiveTemplate { template: Name },

    /// An overload set was named without argument types to pick from.
    #[error("unable to resolve overloaded function {name:?}")]
    UnableToResolveFunction { name: Name },

    /// A declaration conflicts with an earlier one in the same scope.
    #[error("invalid redeclaration of {name:?}")]
    InvalidOverload { name: Name },

    /// A using-declaration names nothing in its qualifying scope.
    #[error("using-declaration of {name:?} names nothing")]
    InvalidUsing { name: Name },
}

impl SemaError {
    /// Stable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            SemaError::Ambiguous { .. } => ErrorCode::E2001,
            SemaError::BadTypeInfo { .. } => ErrorCode::E2002,
            SemaError::BadTemplateArgument { .. } => ErrorCode::E2003,
            SemaError::BadVisibility { .. } => ErrorCode::E2004,
            SemaError::CircularInheritance { .. } => ErrorCode::E2005,
            SemaError::RecursiveTemplate { .. } => ErrorCode::E2006,
            SemaError::UnableToResolveFunction { .. } => ErrorCode::E2007,
            SemaError::InvalidOverload { .. } => ErrorCode::E2008,
            SemaError::InvalidUsing { .. } => ErrorCode::E2009,
        }
    }

    /// The name the error is about.
    pub fn name(&self) -> Name {
        match *self {
            SemaError::Ambiguous { name }
            | SemaError::BadTypeInfo { name }
            | SemaError::BadVisibility { name }
            | SemaError::UnableToResolveFunction { name }
            | SemaError::InvalidOverload { name }
            | SemaError::InvalidUsing { name } => name,
            SemaError::BadTemplateArgument { template, .. }
            | SemaError::RecursiveTemplate { template } => template,
            SemaError::CircularInheritance { class } => class,
        }
    }

    /// Render into a diagnostic, resolving names through `interner`.
    #[cold]
    pub fn to_diagnostic(&self, interner: &StringInterner) -> Diagnostic {
        let name = interner.lookup(self.name());
        let diag = Diagnostic::error(self.code());
        match self {
            SemaError::Ambiguous { .. } => {
                diag.with_message(format!("reference to `{name}` is ambiguous"))
            }
            SemaError::BadTypeInfo { .. } => {
                diag.with_message(format!("`{name}` cannot be used here"))
            }
            SemaError::BadTemplateArgument { index, .. } => diag
                .with_message(format!("bad argument for template `{name}`"))
                .with_note(format!("argument {} does not match its parameter", index + 1)),
            SemaError::BadVisibility { .. } => {
                diag.with_message(format!("`{name}` is not a member of the qualifying class"))
            }
            SemaError::CircularInheritance { .. } => {
                diag.with_message(format!("`{name}` inherits from itself"))
            }
            SemaError::RecursiveTemplate { .. } => diag
                .with_message(format!("instantiation of `{name}` does not terminate"))
                .with_note("the instantiation was abandoned and its partial results discarded"),
            SemaError::UnableToResolveFunction { .. } => diag
                .with_message(format!("unable to resolve overloaded function `{name}`"))
                .with_note("no argument types are available to pick a candidate"),
            SemaError::InvalidOverload { .. } => {
                diag.with_message(format!("invalid redeclaration of `{name}`"))
            }
            SemaError::InvalidUsing { .. } => {
                diag.with_message(format!("using-declaration of `{name}` names nothing"))
            }
        }
    }
}

/// Misuse of the transaction log by the driving parser.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TransactionError {
    /// The mark was already committed or rolled back.
    #[error("mark {mark} is no longer live")]
    Stale { mark: u32 },

    /// Marks must be released innermost first.
    #[error("mark {mark} released while mark {innermost} is still live")]
    NotInnermost { mark: u32, innermost: u32 },
}

impl TransactionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TransactionError::Stale { .. } => ErrorCode::E3001,
            TransactionError::NotInnermost { .. } => ErrorCode::E3002,
        }
    }
}

/// Panic on a violated internal invariant.
///
/// Reached only when the driving parser breaks the engine's contract.
#[cold]
#[track_caller]
pub(crate) fn internal_invariant(message: &str) -> ! {
    tracing::error!(code = %ErrorCode::E9001, "{message}");
    panic!("internal invariant violated: {message}")
}

/// Panic on an operation the symbol's kind does not support.
#[cold]
#[track_caller]
pub(crate) fn unsupported(message: &str) -> ! {
    tracing::error!(code = %ErrorCode::E9002, "{message}");
    panic!("unsupported operation: {message}")
}
