//! Error codes for all semantic diagnostics.
//!
//! Format: E#### where the first digit indicates the category:
//! - E2xxx: Recoverable semantic errors (lookup, overloads, templates)
//! - E3xxx: Transaction misuse reported to the driving parser
//! - E9xxx: Internal engine errors

use std::fmt;

/// Error codes for all semantic diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Semantic Errors (E2xxx)
    /// Ambiguous name or overload
    E2001,
    /// Malformed or unusable type information
    E2002,
    /// Template argument does not match its parameter
    E2003,
    /// Member is not visible through the qualifying scope
    E2004,
    /// Class derives from itself
    E2005,
    /// Template instantiation did not terminate
    E2006,
    /// Overload set cannot be resolved without argument types
    E2007,
    /// Invalid redeclaration or overload
    E2008,
    /// Using-declaration names nothing
    E2009,

    // Transaction Errors (E3xxx)
    /// Mark already committed or rolled back
    E3001,
    /// Mark is not the innermost live mark
    E3002,

    // Internal Errors (E9xxx)
    /// Internal invariant violated
    E9001,
    /// Operation not supported by this symbol kind
    E9002,
}

impl ErrorCode {
    /// All error codes, in declaration order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E2005,
        ErrorCode::E2006,
        ErrorCode::E2007,
        ErrorCode::E2008,
        ErrorCode::E2009,
        ErrorCode::E3001,
        ErrorCode::E3002,
        ErrorCode::E9001,
        ErrorCode::E9002,
    ];

    /// Get the numeric code as a string (e.g., "E2001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E2007 => "E2007",
            ErrorCode::E2008 => "E2008",
            ErrorCode::E2009 => "E2009",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E9001 => "E9001",
            ErrorCode::E9002 => "E9002",
        }
    }

    /// Short description used as the default diagnostic title.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E2001 => "ambiguous reference",
            ErrorCode::E2002 => "bad type information",
            ErrorCode::E2003 => "bad template argument",
            ErrorCode::E2004 => "member not visible",
            ErrorCode::E2005 => "circular inheritance",
            ErrorCode::E2006 => "recursive template instantiation",
            ErrorCode::E2007 => "unable to resolve function",
            ErrorCode::E2008 => "invalid overload",
            ErrorCode::E2009 => "invalid using-declaration",
            ErrorCode::E3001 => "stale transaction mark",
            ErrorCode::E3002 => "transaction mark out of order",
            ErrorCode::E9001 => "internal invariant violated",
            ErrorCode::E9002 => "unsupported operation",
        }
    }

    /// Check if this is a recoverable semantic error.
    pub fn is_semantic_error(&self) -> bool {
        self.as_str().starts_with("E2")
    }

    /// Check if this is an internal engine error.
    pub fn is_internal_error(&self) -> bool {
        self.as_str().starts_with("E9")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse an error code string like `"E2001"`.
///
/// Case-insensitive. Derived from [`ErrorCode::ALL`] so new codes never
/// need a second table.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}
