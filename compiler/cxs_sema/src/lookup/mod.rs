//! Name lookup.
//!
//! Given a name, a starting scope and [`LookupOptions`], produce the
//! visible declarations:
//!
//! 1. A namespace alias as starting scope is redirected to its namespace.
//! 2. The scope's own members are searched, plus function and template
//!    parameters and a template's definition-parameter remap.
//! 3. (C++) Using-directives are associated with the nearest scope that
//!    encloses both the directive and the nominated namespace, and applied
//!    when the walk reaches that scope. Each namespace is searched at most
//!    once per lookup.
//! 4. Base classes are searched depth-first when the class itself
//!    supplied nothing.
//! 5. Unqualified lookup continues outward until something is found or the
//!    stop scope is passed.
//!
//! Prefix mode (completion) matches every name starting with the given
//! text, never stops early, and records ambiguous names instead of failing.

mod collect;
mod convenience;
mod inherited;
mod using;

use cxs_ir::Name;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::error::{internal_invariant, SemaError, SemaResult};
use crate::symbol::{Symbol, SymbolId};
use crate::table::DeclClass;
use crate::ty::{BaseKind, TypeDesc};
use crate::SymbolTable;

/// Candidates for one name, in discovery order.
pub(crate) type Candidates = SmallVec<[SymbolId; 2]>;

/// Name to candidates for one scope level.
pub(crate) type Found = FxHashMap<Name, Candidates>;

/// Which declarations a lookup accepts.
#[derive(Copy, Clone, Debug, Default)]
pub enum TypeFilter {
    #[default]
    Any,
    /// Class, struct, union and enumeration names (elaborated specifiers).
    Tags,
    /// Anything that names a type.
    Types,
    Functions,
    Namespaces,
    /// Objects and enumerators.
    Variables,
    /// Names usable before `::`: namespaces, classes, enumerations,
    /// typedefs of classes, type template parameters.
    Scopes,
    Predicate(fn(&Symbol) -> bool),
}

impl TypeFilter {
    pub(crate) fn accepts(self, table: &SymbolTable, id: SymbolId) -> bool {
        let sym = table.symbol(id);
        let type_parameter = sym.is_template_parameter()
            && matches!(
                sym.ty.param_kind,
                Some(BaseKind::TypeName | BaseKind::Template)
            );
        match self {
            TypeFilter::Any => true,
            TypeFilter::Tags => table.decl_class(id) == DeclClass::Tag,
            TypeFilter::Types => {
                table.decl_class(id) == DeclClass::Tag || sym.ty.is_typedef() || type_parameter
            }
            TypeFilter::Functions => table.decl_class(id) == DeclClass::Function,
            TypeFilter::Namespaces => sym.ty.kind == BaseKind::Namespace,
            TypeFilter::Variables => {
                table.decl_class(id) == DeclClass::Object
                    && !sym.ty.is_typedef()
                    && !type_parameter
                    && !matches!(sym.ty.kind, BaseKind::Namespace | BaseKind::Block)
            }
            TypeFilter::Scopes => {
                sym.ty.kind == BaseKind::Namespace
                    || table.decl_class(id) == DeclClass::Tag
                    || type_parameter
                    || (sym.ty.is_typedef()
                        && !sym.ty.has_ptr_ops()
                        && table.symbol(table.class_of(id)).ty.kind.is_class_or_enum())
            }
            TypeFilter::Predicate(accept) => accept(sym),
        }
    }
}

/// Options for [`SymbolTable::lookup`].
#[derive(Clone, Debug, Default)]
pub struct LookupOptions {
    /// Search only the starting scope (and its bases or nominated
    /// namespaces), never enclosing scopes.
    pub qualified: bool,
    pub filter: TypeFilter,
    /// Match every name that starts with the given text, ignoring case.
    /// Requires completion mode.
    pub prefix: bool,
    /// Do not search above this scope.
    pub stop_scope: Option<SymbolId>,
    pub ignore_using_directives: bool,
    /// Fold function templates into results as-is rather than deducing
    /// their arguments from `arguments`.
    pub exact_function_match: bool,
    /// Call argument types, used to deduce function template arguments.
    pub arguments: Option<Vec<TypeDesc>>,
}

impl LookupOptions {
    /// Unqualified lookup accepting anything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Qualified lookup in the starting scope.
    pub fn qualified() -> Self {
        LookupOptions {
            qualified: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: TypeFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_prefix(mut self) -> Self {
        self.prefix = true;
        self
    }

    #[must_use]
    pub fn with_stop_scope(mut self, scope: SymbolId) -> Self {
        self.stop_scope = Some(scope);
        self
    }

    #[must_use]
    pub fn without_using_directives(mut self) -> Self {
        self.ignore_using_directives = true;
        self
    }

    #[must_use]
    pub fn with_exact_function_match(mut self) -> Self {
        self.exact_function_match = true;
        self
    }

    #[must_use]
    pub fn with_arguments(mut self, arguments: Vec<TypeDesc>) -> Self {
        self.arguments = Some(arguments);
        self
    }
}

/// Declarations found for one name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LookupEntry {
    pub name: Name,
    /// A single declaration, or an overload set in declaration order.
    pub symbols: Candidates,
}

/// Result of a lookup. Normal lookups produce at most one entry; prefix
/// lookups one per matching name, sorted by spelling.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LookupResult {
    entries: Vec<LookupEntry>,
    ambiguous: Vec<Name>,
}

impl LookupResult {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LookupEntry] {
        &self.entries
    }

    /// Declarations found for `name`.
    pub fn get(&self, name: Name) -> &[SymbolId] {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map_or(&[][..], |e| e.symbols.as_slice())
    }

    /// Declarations of the first (for a normal lookup, the only) entry.
    pub fn symbols(&self) -> &[SymbolId] {
        self.entries.first().map_or(&[][..], |e| e.symbols.as_slice())
    }

    /// Names a prefix lookup found ambiguous.
    pub fn ambiguous(&self) -> &[Name] {
        &self.ambiguous
    }
}

/// Per-lookup traversal state.
pub(crate) struct LookupState<'o> {
    pub(crate) name: Name,
    /// Lowercased prefix text in prefix mode.
    prefix: Option<String>,
    pub(crate) options: &'o LookupOptions,
    pub(crate) visited_namespaces: FxHashSet<SymbolId>,
    pub(crate) virtual_bases: FxHashSet<SymbolId>,
    pub(crate) acyclic: FxHashSet<SymbolId>,
    /// Nominated namespaces waiting for the walk to reach the scope they
    /// are associated with.
    pub(crate) pending: FxHashMap<SymbolId, Vec<SymbolId>>,
    pub(crate) ambiguous: Vec<Name>,
}

impl LookupState<'_> {
    #[inline]
    pub(crate) fn is_prefix(&self) -> bool {
        self.prefix.is_some()
    }

    /// Found everything this level needs to stop the walk?
    pub(crate) fn satisfied(&self, found: &FxHashMap<Name, Candidates>) -> bool {
        !self.is_prefix() && found.contains_key(&self.name)
    }

    /// Record an ambiguity: fatal in normal mode, collected in prefix mode.
    pub(crate) fn ambiguity(&mut self, name: Name) -> SemaResult<()> {
        if self.is_prefix() {
            if !self.ambiguous.contains(&name) {
                self.ambiguous.push(name);
            }
            Ok(())
        } else {
            Err(SemaError::Ambiguous { name })
        }
    }
}

impl SymbolTable {
    /// Look `name` up starting in `scope`.
    ///
    /// A name that exists nowhere produces an empty result, not an error.
    #[tracing::instrument(level = "trace", skip_all, fields(
        scope = scope.raw(),
        name = name.raw(),
        qualified = options.qualified,
        prefix = options.prefix,
    ))]
    pub fn lookup(
        &mut self,
        scope: SymbolId,
        name: Name,
        options: &LookupOptions,
    ) -> SemaResult<LookupResult> {
        let prefix = if options.prefix {
            if !self.config.completion {
                internal_invariant("prefix lookup requires completion mode");
            }
            Some(self.name_str(name).to_lowercase())
        } else {
            None
        };
        let mut state = LookupState {
            name,
            prefix,
            options,
            visited_namespaces: FxHashSet::default(),
            virtual_bases: FxHashSet::default(),
            acyclic: FxHashSet::default(),
            pending: FxHashMap::default(),
            ambiguous: Vec::new(),
        };

        let start = self.resolve_namespace_alias(scope);
        let found = if options.qualified {
            self.lookup_qualified_in(&mut state, start)?
        } else {
            self.lookup_unqualified_from(&mut state, start)?
        };

        let mut entries: Vec<LookupEntry> = found
            .into_iter()
            .map(|(name, symbols)| LookupEntry { name, symbols })
            .collect();
        if state.is_prefix() {
            entries.sort_by_cached_key(|e| {
                let text = self.name_str(e.name);
                (text.to_lowercase(), text.to_owned())
            });
        }
        state.ambiguous.sort_by_key(|&n| self.name_str(n).to_lowercase());
        Ok(LookupResult {
            entries,
            ambiguous: state.ambiguous,
        })
    }

    /// Walk outward from `start`.
    fn lookup_unqualified_from(
        &mut self,
        state: &mut LookupState<'_>,
        start: SymbolId,
    ) -> SemaResult<FxHashMap<Name, Candidates>> {
        let mut result: FxHashMap<Name, Candidates> = FxHashMap::default();
        let use_directives = self.config.is_cxx() && !state.options.ignore_using_directives;
        let mut scope = Some(start);

        while let Some(current) = scope {
            let mut level = Found::default();
            self.search_scope(state, current, &mut level);
            if use_directives {
                self.apply_using_directives(state, current, &mut level);
            }
            let mut collected = self.collect_level(state, level)?;
            self.add_inherited(state, current, &mut collected)?;

            for (name, symbols) in collected {
                result.entry(name).or_insert(symbols);
            }
            if state.satisfied(&result) || state.options.stop_scope == Some(current) {
                break;
            }
            scope = self.symbol(current).scope;
        }
        Ok(result)
    }

    /// Search only `scope`: its members, its bases, or the namespaces its
    /// using-directives nominate.
    fn lookup_qualified_in(
        &mut self,
        state: &mut LookupState<'_>,
        scope: SymbolId,
    ) -> SemaResult<FxHashMap<Name, Candidates>> {
        let mut level = Found::default();
        self.search_scope(state, scope, &mut level);

        let is_namespace = self.symbol(scope).ty.kind == BaseKind::Namespace;
        if is_namespace
            && self.config.is_cxx()
            && !state.options.ignore_using_directives
            && (level.is_empty() || state.is_prefix())
        {
            self.qualified_using_directives(state, scope, &mut level);
        }

        let mut collected = self.collect_level(state, level)?;
        self.add_inherited(state, scope, &mut collected)?;
        Ok(collected)
    }

    /// Merge base-class results into a class level that did not supply the
    /// name itself.
    fn add_inherited(
        &mut self,
        state: &mut LookupState<'_>,
        scope: SymbolId,
        collected: &mut FxHashMap<Name, Candidates>,
    ) -> SemaResult<()> {
        if self.symbol(scope).parents().is_empty() {
            return Ok(());
        }
        self.check_inheritance(state, scope)?;
        if state.satisfied(collected) {
            return Ok(());
        }
        let inherited = self.lookup_in_parents(state, scope)?;
        for (name, symbols) in inherited {
            collected.entry(name).or_insert(symbols);
        }
        Ok(())
    }

    /// Does `name` match what the lookup is looking for?
    pub(crate) fn name_matches(&self, state: &LookupState<'_>, name: Name) -> bool {
        match &state.prefix {
            None => name == state.name,
            Some(prefix) => {
                !name.is_empty() && self.name_str(name).to_lowercase().starts_with(prefix.as_str())
            }
        }
    }

    /// Declarations held directly by `scope` that match the lookup.
    pub(crate) fn search_scope(&self, state: &LookupState<'_>, scope: SymbolId, out: &mut Found) {
        let filter = state.options.filter;
        let mut push = |name: Name, id: SymbolId| {
            if filter.accepts(self, self.canonical(id)) {
                out.entry(name).or_default().push(id);
            }
        };

        let sym = self.symbol(scope);
        if let Some(container) = sym.container() {
            if state.is_prefix() {
                for &id in container.contents() {
                    let name = self.symbol(id).name;
                    if self.name_matches(state, name) {
                        push(name, id);
                    }
                }
            } else {
                for &id in container.get(state.name) {
                    push(state.name, id);
                }
            }
        }
        for &param in sym.parameters() {
            let name = self.symbol(param).name;
            if self.name_matches(state, name) {
                push(name, param);
            }
        }
        if let Some(template) = sym.as_template() {
            let mut remapped: Vec<(Name, SymbolId)> = template
                .definition_params
                .iter()
                .filter(|(&name, _)| self.name_matches(state, name))
                .map(|(&name, &param)| (name, param))
                .collect();
            remapped.sort_by_key(|&(name, _)| name);
            for (name, param) in remapped {
                push(name, param);
            }
        }
    }

    /// Nearest scope enclosing both `a` and `b`.
    pub(crate) fn nearest_common_enclosing(&self, a: SymbolId, b: SymbolId) -> SymbolId {
        let (mut a, mut b) = (a, b);
        let (mut depth_a, mut depth_b) = (self.depth(a), self.depth(b));
        while depth_a > depth_b {
            a = self.symbol(a).scope.unwrap_or(self.global);
            depth_a -= 1;
        }
        while depth_b > depth_a {
            b = self.symbol(b).scope.unwrap_or(self.global);
            depth_b -= 1;
        }
        while a != b {
            match (self.symbol(a).scope, self.symbol(b).scope) {
                (Some(pa), Some(pb)) => {
                    a = pa;
                    b = pb;
                }
                _ => return self.global,
            }
        }
        a
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "Test code uses expect for clarity")]
mod tests;
