//! Diagnostics for the cxs semantic engine.
//!
//! Every recoverable semantic error maps to a stable [`ErrorCode`] and can be
//! rendered into a [`Diagnostic`] without re-deriving why it happened:
//! - Error codes for searchability
//! - A one-line message (what went wrong)
//! - Notes (which declarations were involved)
//!
//! Source locations are not part of the engine; the parser attaches them
//! through the symbol's AST back-link.

mod diagnostic;
mod error_code;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
