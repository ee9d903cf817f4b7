//! Using-directives and using-declarations.
//!
//! During unqualified lookup the members of a nominated namespace behave as
//! if declared in the nearest scope enclosing both the directive and the
//! namespace, so a directive is parked in `pending` until the outward walk
//! reaches that scope. Qualified lookup into a namespace follows its
//! directives only when the namespace itself has no match.

use std::collections::VecDeque;

use cxs_ir::Name;

use super::{Found, LookupOptions, LookupState};
use crate::error::{SemaError, SemaResult};
use crate::symbol::SymbolId;
use crate::table::DeclClass;
use crate::SymbolTable;

impl SymbolTable {
    /// Apply the directives that become active at `current`.
    pub(crate) fn apply_using_directives(
        &self,
        state: &mut LookupState<'_>,
        current: SymbolId,
        level: &mut Found,
    ) {
        for directive in self.symbol(current).using_directives() {
            let anchor = self.nearest_common_enclosing(current, directive.namespace);
            state
                .pending
                .entry(anchor)
                .or_default()
                .push(directive.namespace);
        }

        let mut worklist: VecDeque<SymbolId> =
            state.pending.remove(&current).unwrap_or_default().into();
        while let Some(namespace) = worklist.pop_front() {
            if !state.visited_namespaces.insert(namespace) {
                continue;
            }
            self.search_scope(state, namespace, level);

            for directive in self.symbol(namespace).using_directives() {
                let next = directive.namespace;
                if state.visited_namespaces.contains(&next) {
                    continue;
                }
                let anchor = self.nearest_common_enclosing(current, next);
                if anchor == current {
                    worklist.push_back(next);
                } else {
                    state.pending.entry(anchor).or_default().push(next);
                }
            }
        }
    }

    /// Follow the directives of `scope` for a qualified lookup.
    pub(crate) fn qualified_using_directives(
        &self,
        state: &mut LookupState<'_>,
        scope: SymbolId,
        level: &mut Found,
    ) {
        state.visited_namespaces.insert(scope);
        let mut queue: VecDeque<SymbolId> = self
            .symbol(scope)
            .using_directives()
            .iter()
            .map(|d| d.namespace)
            .collect();

        while let Some(namespace) = queue.pop_front() {
            if !state.visited_namespaces.insert(namespace) {
                continue;
            }
            let mut found = Found::default();
            self.search_scope(state, namespace, &mut found);
            let contributed = !found.is_empty();
            for (name, symbols) in found {
                level.entry(name).or_default().extend(symbols);
            }
            if !contributed || state.is_prefix() {
                queue.extend(
                    self.symbol(namespace)
                        .using_directives()
                        .iter()
                        .map(|d| d.namespace),
                );
            }
        }
    }

    /// `using qualifier::name;` in `scope`.
    ///
    /// Introduces one alias per declaration found, skipping entities that
    /// are already visible in `scope` under this name. Returns the new
    /// aliases.
    pub fn add_using_declaration(
        &mut self,
        scope: SymbolId,
        name: Name,
        qualifier: SymbolId,
    ) -> SemaResult<Vec<SymbolId>> {
        let options = LookupOptions::qualified().with_exact_function_match();
        let found = self.lookup(qualifier, name, &options)?;
        if found.is_empty() {
            return Err(SemaError::InvalidUsing { name });
        }

        let mut aliases = Vec::new();
        for &target in found.symbols() {
            let target = self.canonical(target);
            let existing: Vec<SymbolId> = self
                .members(scope, name)
                .iter()
                .map(|&m| self.canonical(m))
                .collect();
            if existing.contains(&target) {
                continue;
            }
            // A second object of the same name cannot be brought in.
            if self.decl_class(target) == DeclClass::Object
                && existing
                    .iter()
                    .any(|&m| self.decl_class(m) == DeclClass::Object)
            {
                return Err(SemaError::InvalidOverload { name });
            }

            let ty = self.symbol(target).ty.clone();
            let alias = self.new_symbol_with_type(name, ty);
            self.symbol_mut(alias).alias_of = Some(target);
            self.insert_member(scope, alias);
            aliases.push(alias);
        }
        tracing::debug!(
            scope = scope.raw(),
            aliases = aliases.len(),
            "using-declaration"
        );
        Ok(aliases)
    }
}
