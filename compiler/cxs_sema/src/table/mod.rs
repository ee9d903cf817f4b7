//! The symbol table: arena owner and context object for every engine call.
//!
//! All engine state for one translation unit lives here: the symbol arena,
//! the identifier interner, the undo log, the configuration and the
//! in-flight template instantiation state. There are no process-wide
//! singletons; embedding hosts serialize access per table.
//!
//! # Submodules
//!
//! - `factory`: symbol construction (never fails)
//! - `mutate`: shape-changing mutators, each undo-recorded while a mark is live
//! - `transaction`: `mark`/`rollback`/`commit`
//! - `types`: typedef flattening, parameter comparison, type rendering

mod factory;
mod mutate;
mod transaction;
mod types;

pub(crate) use mutate::DeclClass;

use cxs_ir::{Name, StringInterner};

use crate::config::SemaConfig;
use crate::log::UndoLog;
use crate::symbol::{Instantiation, ParentLink, Symbol, SymbolId, SymbolKind};
use crate::template::TemplateState;
use crate::ty::{BaseKind, TypeDesc};

/// Arena of symbols plus everything needed to analyze one translation unit.
pub struct SymbolTable {
    pub(crate) config: SemaConfig,
    pub(crate) interner: StringInterner,
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) global: SymbolId,
    pub(crate) log: UndoLog,
    pub(crate) templates: TemplateState,
}

impl SymbolTable {
    /// Create a table whose only symbol is the global namespace.
    pub fn new(config: SemaConfig) -> Self {
        let mut table = SymbolTable {
            config,
            interner: StringInterner::new(),
            symbols: Vec::with_capacity(256),
            global: SymbolId::from_raw(0),
            log: UndoLog::new(),
            templates: TemplateState::default(),
        };
        table.global = table.new_container_symbol(Name::EMPTY, BaseKind::Namespace);
        table
    }

    pub fn config(&self) -> &SemaConfig {
        &self.config
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    #[inline]
    pub fn global_scope(&self) -> SymbolId {
        self.global
    }

    /// Intern an identifier.
    pub fn intern(&mut self, text: &str) -> Name {
        self.interner.intern(text)
    }

    /// Text of an interned identifier.
    pub fn name_str(&self, name: Name) -> &str {
        self.interner.lookup(name)
    }

    /// Number of symbols in the arena.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Never true: the global scope always exists.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    // === Symbol access ===

    #[inline]
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    #[inline]
    pub(crate) fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub(crate) fn push_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let raw = u32::try_from(self.symbols.len()).unwrap_or_else(|_| {
            crate::error::internal_invariant("symbol arena exceeded u32::MAX entries")
        });
        self.symbols.push(symbol);
        SymbolId::from_raw(raw)
    }

    pub fn name_of(&self, id: SymbolId) -> &str {
        self.interner.lookup(self.symbol(id).name)
    }

    pub fn containing_scope(&self, id: SymbolId) -> Option<SymbolId> {
        self.symbol(id).scope
    }

    /// Number of declarations held directly by a scope.
    pub fn contained_count(&self, id: SymbolId) -> usize {
        self.symbol(id).container().map_or(0, |c| c.len())
    }

    /// Declarations named `name` held directly by `scope`.
    pub fn members(&self, scope: SymbolId, name: Name) -> &[SymbolId] {
        self.symbol(scope)
            .container()
            .map_or(&[][..], |c| c.get(name))
    }

    pub fn parameter_count(&self, id: SymbolId) -> usize {
        self.symbol(id).parameters().len()
    }

    pub fn parameters(&self, id: SymbolId) -> &[SymbolId] {
        self.symbol(id).parameters()
    }

    pub fn parents(&self, id: SymbolId) -> &[ParentLink] {
        self.symbol(id).parents()
    }

    pub fn return_type(&self, id: SymbolId) -> Option<&TypeDesc> {
        self.symbol(id).return_type()
    }

    /// The declaration a template introduces: its member of the same name.
    pub fn templated_symbol(&self, template: SymbolId) -> Option<SymbolId> {
        let sym = self.symbol(template);
        let data = sym.as_template()?;
        data.container.get(sym.name).first().copied()
    }

    /// Cached instantiations of a template.
    pub fn instances(&self, template: SymbolId) -> &[Instantiation] {
        self.symbol(template)
            .as_template()
            .map_or(&[][..], |t| t.instances())
    }

    // === Identity helpers ===

    /// The entity a symbol stands for: using-declaration aliases resolve to
    /// their target, completed forward declarations to their definition.
    pub(crate) fn canonical(&self, mut id: SymbolId) -> SymbolId {
        // Chains are acyclic when built through the mutators; the bound
        // guards against a malformed graph.
        for _ in 0..self.symbols.len() {
            let sym = self.symbol(id);
            match sym.alias_of.or(sym.forward_target) {
                Some(next) if next != id => id = next,
                _ => return id,
            }
        }
        id
    }

    /// The symbol a named type refers to after typedefs and forward
    /// declarations are seen through.
    pub(crate) fn class_of(&self, id: SymbolId) -> SymbolId {
        let id = self.canonical(id);
        let sym = self.symbol(id);
        if sym.ty.is_typedef() && !sym.ty.has_ptr_ops() {
            if let Some(link) = self.flatten_type(&sym.ty).link {
                return self.canonical(link);
            }
        }
        id
    }

    /// Depth of a scope below the global namespace.
    pub(crate) fn depth(&self, id: SymbolId) -> usize {
        let mut depth = 0;
        let mut current = self.symbol(id).scope;
        while let Some(scope) = current {
            depth += 1;
            current = self.symbol(scope).scope;
        }
        depth
    }

    /// Is `inner` declared (transitively) inside `outer`?
    pub(crate) fn is_within(&self, inner: SymbolId, outer: SymbolId) -> bool {
        let mut current = Some(inner);
        while let Some(id) = current {
            if id == outer {
                return true;
            }
            current = self.symbol(id).scope;
        }
        false
    }

    /// Is this symbol a template whose templated declaration is a function?
    pub(crate) fn is_function_template(&self, id: SymbolId) -> bool {
        self.symbol(id).is_template()
            && self
                .templated_symbol(id)
                .is_some_and(|t| self.symbol(t).is_function())
    }

    /// Is this symbol a template whose templated declaration is a class?
    pub(crate) fn is_class_template(&self, id: SymbolId) -> bool {
        self.symbol(id).is_template()
            && self
                .templated_symbol(id)
                .is_some_and(|t| self.symbol(t).ty.kind.is_class_or_enum())
    }

    /// Does a descriptor depend on a template parameter?
    pub(crate) fn is_dependent(&self, ty: &TypeDesc) -> bool {
        if ty.kind == BaseKind::TemplateParameter {
            return true;
        }
        if let Some(link) = ty.link {
            let sym = self.symbol(link);
            if sym.is_template_parameter()
                || matches!(sym.kind, SymbolKind::DeferredInstance(_))
            {
                return true;
            }
        }
        ty.template_args.iter().any(|arg| self.is_dependent(arg))
    }
}

impl std::fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolTable")
            .field("config", &self.config)
            .field("symbols", &self.symbols.len())
            .field("live_marks", &self.log.live_marks())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "Test code uses expect for clarity")]
mod tests;
