//! Lookups a parser performs at specific syntactic positions.
//!
//! Each wraps [`SymbolTable::lookup`] with the options its position needs
//! and reduces the result to a single declaration.

use cxs_ir::Name;
use rustc_hash::FxHashSet;

use super::{LookupOptions, LookupResult, TypeFilter};
use crate::error::{SemaError, SemaResult};
use crate::symbol::SymbolId;
use crate::table::DeclClass;
use crate::ty::{BaseKind, TypeDesc, TypeFlags};
use crate::SymbolTable;

impl SymbolTable {
    /// Unqualified lookup of an identifier in an expression or declaration.
    ///
    /// An overload set without argument types to choose from is
    /// `UnableToResolveFunction`.
    pub fn lookup_name(&mut self, scope: SymbolId, name: Name) -> SemaResult<Option<SymbolId>> {
        let found = self.lookup(scope, name, &LookupOptions::new())?;
        self.resolve_single(name, found.symbols())
    }

    /// `qualifier::name`.
    pub fn qualified_lookup(
        &mut self,
        qualifier: SymbolId,
        name: Name,
    ) -> SemaResult<Option<SymbolId>> {
        let found = self.lookup(qualifier, name, &LookupOptions::qualified())?;
        self.resolve_single(name, found.symbols())
    }

    fn resolve_single(&mut self, name: Name, symbols: &[SymbolId]) -> SemaResult<Option<SymbolId>> {
        match symbols {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            _ if symbols
                .iter()
                .all(|&s| self.decl_class(s) == DeclClass::Function) =>
            {
                let symbols = symbols.to_vec();
                self.resolve_function(&symbols, None)
            }
            _ => Err(SemaError::Ambiguous { name }),
        }
    }

    /// Earlier declarations of `name` directly in `scope`, for matching an
    /// out-of-line definition against them. Friends are not members.
    pub fn lookup_member_for_definition(&self, scope: SymbolId, name: Name) -> Vec<SymbolId> {
        let scope = self.resolve_namespace_alias(scope);
        self.members(scope, name)
            .iter()
            .copied()
            .filter(|&m| !self.symbol(m).ty.flags.contains(TypeFlags::FRIEND))
            .collect()
    }

    /// The scope a name before `::` denotes.
    ///
    /// Namespace aliases and typedefs of classes are seen through. With
    /// `qualified`, only `scope` itself is searched.
    pub fn lookup_nested_name_specifier(
        &mut self,
        scope: SymbolId,
        name: Name,
        qualified: bool,
    ) -> SemaResult<Option<SymbolId>> {
        let options = if qualified {
            LookupOptions::qualified()
        } else {
            LookupOptions::new()
        }
        .with_filter(TypeFilter::Scopes);
        let found = self.lookup(scope, name, &options)?;
        match found.symbols() {
            [] => Ok(None),
            [only] => {
                let target = self.resolve_namespace_alias(*only);
                Ok(Some(self.class_of(target)))
            }
            _ => Err(SemaError::Ambiguous { name }),
        }
    }

    /// Resolve a call `name(args...)` made from `scope`.
    ///
    /// In C++, functions from the namespaces and classes associated with
    /// the argument types are added to the ordinary result, unless ordinary
    /// lookup found a class member or something that is not a function.
    pub fn lookup_function(
        &mut self,
        scope: SymbolId,
        name: Name,
        args: &[TypeDesc],
    ) -> SemaResult<Option<SymbolId>> {
        let options = LookupOptions::new().with_arguments(args.to_vec());
        let found = self.lookup(scope, name, &options)?;
        let mut candidates: Vec<SymbolId> = found.symbols().to_vec();

        if let Some(single) = self.non_function(name, &candidates)? {
            return Ok(Some(single));
        }

        let found_member = candidates.iter().any(|&c| {
            self.symbol(c)
                .scope
                .is_some_and(|s| self.symbol(s).ty.kind.is_class())
        });
        if self.config.is_cxx() && !found_member {
            for candidate in self.argument_dependent_candidates(name, args)? {
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }
        self.resolve_function(&candidates, Some(args))
    }

    /// Resolve a call `qualifier::name(args...)`. No argument-dependent
    /// lookup takes place.
    pub fn qualified_function_lookup(
        &mut self,
        qualifier: SymbolId,
        name: Name,
        args: &[TypeDesc],
    ) -> SemaResult<Option<SymbolId>> {
        let options = LookupOptions::qualified().with_arguments(args.to_vec());
        let found = self.lookup(qualifier, name, &options)?;
        let candidates = found.symbols().to_vec();
        if let Some(single) = self.non_function(name, &candidates)? {
            return Ok(Some(single));
        }
        self.resolve_function(&candidates, Some(args))
    }

    /// The constructor of `class` selected for `args`.
    pub fn lookup_constructor(
        &mut self,
        class: SymbolId,
        args: &[TypeDesc],
    ) -> SemaResult<Option<SymbolId>> {
        let class = self.class_of(class);
        let constructors = self
            .symbol(class)
            .as_derivable()
            .map(|d| d.constructors().to_vec())
            .unwrap_or_default();
        self.resolve_function(&constructors, Some(args))
    }

    /// `name<args...>`: the instantiation it denotes.
    pub fn lookup_template_id(
        &mut self,
        scope: SymbolId,
        name: Name,
        args: Vec<TypeDesc>,
    ) -> SemaResult<Option<SymbolId>> {
        let options = LookupOptions::new().with_exact_function_match();
        let found = self.lookup(scope, name, &options)?;
        let template = match found.symbols() {
            [] => return Ok(None),
            [only] if self.symbol(*only).is_template() => *only,
            [_] => return Err(SemaError::BadTypeInfo { name }),
            several => {
                let templates: Vec<SymbolId> = several
                    .iter()
                    .copied()
                    .filter(|&s| self.symbol(s).is_template())
                    .collect();
                match templates.as_slice() {
                    [only] => *only,
                    _ => return Err(SemaError::UnableToResolveFunction { name }),
                }
            }
        };
        self.instantiate(template, args).map(Some)
    }

    /// Every visible name in `scope` starting with `prefix`, ignoring case.
    /// Requires completion mode.
    pub fn lookup_prefix(
        &mut self,
        scope: SymbolId,
        prefix: &str,
        filter: TypeFilter,
    ) -> SemaResult<LookupResult> {
        let name = self.intern(prefix);
        let options = LookupOptions::new().with_prefix().with_filter(filter);
        self.lookup(scope, name, &options)
    }

    /// A lookup that found something other than functions names it
    /// directly.
    fn non_function(&self, name: Name, candidates: &[SymbolId]) -> SemaResult<Option<SymbolId>> {
        if candidates
            .iter()
            .all(|&c| self.decl_class(c) == DeclClass::Function)
        {
            return Ok(None);
        }
        match candidates {
            [only] => Ok(Some(*only)),
            _ => Err(SemaError::Ambiguous { name }),
        }
    }

    // === Argument-dependent lookup ===

    fn argument_dependent_candidates(
        &mut self,
        name: Name,
        args: &[TypeDesc],
    ) -> SemaResult<Vec<SymbolId>> {
        let mut classes = Vec::new();
        let mut seen = FxHashSet::default();
        for arg in args {
            self.associated_classes(arg, &mut classes, &mut seen);
        }

        let mut namespaces = Vec::new();
        for &class in &classes {
            if let Some(namespace) = self.enclosing_namespace(class) {
                if !namespaces.contains(&namespace) {
                    namespaces.push(namespace);
                }
            }
        }

        let mut candidates = Vec::new();
        let options = LookupOptions::qualified()
            .without_using_directives()
            .with_filter(TypeFilter::Functions)
            .with_arguments(args.to_vec());
        for namespace in namespaces {
            let found = self.lookup(namespace, name, &options)?;
            candidates.extend_from_slice(found.symbols());
        }
        for class in classes {
            // Friends declared in the class are found only this way.
            candidates.extend(self.members(class, name).iter().copied().filter(|&m| {
                let sym = self.symbol(m);
                sym.ty.flags.contains(TypeFlags::FRIEND)
                    && self.decl_class(m) == DeclClass::Function
            }));
        }
        Ok(candidates)
    }

    /// Classes associated with an argument type: the class itself, its
    /// bases, and the classes among an instance's template arguments.
    /// Enumerations contribute themselves so their namespace is searched.
    fn associated_classes(
        &self,
        ty: &TypeDesc,
        out: &mut Vec<SymbolId>,
        seen: &mut FxHashSet<SymbolId>,
    ) {
        let ty = self.flatten_type(ty);
        for arg in &ty.template_args {
            self.associated_classes(arg, out, seen);
        }
        let Some(link) = ty.link else {
            return;
        };
        let entity = self.class_of(link);
        if !seen.insert(entity) {
            return;
        }
        let sym = self.symbol(entity);
        if sym.ty.kind == BaseKind::Enumeration {
            out.push(entity);
            return;
        }
        if !sym.ty.kind.is_class() {
            return;
        }
        out.push(entity);
        if let Some(origin) = &sym.origin {
            for arg in &origin.args {
                self.associated_classes(arg, out, seen);
            }
        }
        for link in sym.parents() {
            self.associated_classes(&TypeDesc::named(link.parent), out, seen);
        }
    }

    fn enclosing_namespace(&self, id: SymbolId) -> Option<SymbolId> {
        let mut current = self.symbol(id).scope;
        while let Some(scope) = current {
            if self.symbol(scope).ty.kind == BaseKind::Namespace {
                return Some(scope);
            }
            current = self.symbol(scope).scope;
        }
        None
    }
}
