//! Opaque back-links from symbols to the AST nodes that declared them.

/// Handle to an external AST node.
///
/// The engine never interprets the value; it only stores it on the symbol
/// and hands it back so the parser can map a resolved symbol to its source.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct AstLink(u64);

impl AstLink {
    /// Wrap a parser-defined node identifier.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        AstLink(raw)
    }

    /// The parser-defined node identifier.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}
