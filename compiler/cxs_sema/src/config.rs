//! Engine configuration fixed at table construction.

/// Source language. C skips using-directives and argument-dependent lookup.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Language {
    C,
    #[default]
    Cxx,
}

/// Configuration for a [`SymbolTable`](crate::SymbolTable).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SemaConfig {
    /// Source language mode.
    pub language: Language,
    /// Completion mode: enables prefix lookup and case-insensitive ordering
    /// of prefix results.
    pub completion: bool,
    /// Maximum number of deferred-instantiation drain passes before an
    /// instantiation is abandoned as a recursive template.
    pub deferred_pass_limit: usize,
}

impl SemaConfig {
    /// Default drain bound. Chains deeper than this are treated as
    /// non-terminating.
    pub const DEFAULT_DEFERRED_PASS_LIMIT: usize = 32;

    /// C++ mode, completion off, default drain bound.
    pub fn new() -> Self {
        SemaConfig {
            language: Language::Cxx,
            completion: false,
            deferred_pass_limit: Self::DEFAULT_DEFERRED_PASS_LIMIT,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    #[must_use]
    pub fn with_completion(mut self, completion: bool) -> Self {
        self.completion = completion;
        self
    }

    #[must_use]
    pub fn with_deferred_pass_limit(mut self, limit: usize) -> Self {
        self.deferred_pass_limit = limit;
        self
    }

    #[inline]
    pub fn is_cxx(&self) -> bool {
        self.language == Language::Cxx
    }
}

impl Default for SemaConfig {
    fn default() -> Self {
        Self::new()
    }
}
