//! Lookup through base classes.

use std::collections::hash_map::Entry;

use cxs_ir::Name;
use rustc_hash::{FxHashMap, FxHashSet};

use super::{Candidates, Found, LookupState};
use crate::error::{SemaError, SemaResult};
use crate::stack::ensure_sufficient_stack;
use crate::symbol::SymbolId;
use crate::table::DeclClass;
use crate::SymbolTable;

impl SymbolTable {
    /// Fail if `class` is on its own inheritance path.
    ///
    /// Classes proven acyclic are remembered for the rest of the lookup.
    pub(crate) fn check_inheritance(
        &self,
        state: &mut LookupState<'_>,
        class: SymbolId,
    ) -> SemaResult<()> {
        let mut path = FxHashSet::default();
        self.check_acyclic(&mut state.acyclic, class, &mut path)
    }

    fn check_acyclic(
        &self,
        acyclic: &mut FxHashSet<SymbolId>,
        class: SymbolId,
        path: &mut FxHashSet<SymbolId>,
    ) -> SemaResult<()> {
        ensure_sufficient_stack(|| {
            if acyclic.contains(&class) {
                return Ok(());
            }
            if !path.insert(class) {
                return Err(SemaError::CircularInheritance {
                    class: self.symbol(class).name,
                });
            }
            for link in self.symbol(class).parents() {
                let parent = self.class_of(link.parent);
                self.check_acyclic(acyclic, parent, path)?;
            }
            path.remove(&class);
            acyclic.insert(class);
            Ok(())
        })
    }

    /// Search the bases of `class`, depth first.
    ///
    /// A base that supplies the name ends the search along its branch.
    /// Results from sibling bases are merged; each virtual base is searched
    /// once.
    pub(crate) fn lookup_in_parents(
        &mut self,
        state: &mut LookupState<'_>,
        class: SymbolId,
    ) -> SemaResult<FxHashMap<Name, Candidates>> {
        let mut path = FxHashSet::default();
        path.insert(class);
        self.search_parents(state, class, &mut path)
    }

    fn search_parents(
        &mut self,
        state: &mut LookupState<'_>,
        class: SymbolId,
        path: &mut FxHashSet<SymbolId>,
    ) -> SemaResult<FxHashMap<Name, Candidates>> {
        ensure_sufficient_stack(|| {
            let mut merged: FxHashMap<Name, Candidates> = FxHashMap::default();
            let links = self.symbol(class).parents().to_vec();

            for link in links {
                let parent = self.class_of(link.parent);
                // Dependent bases have no members until instantiated.
                if !self.symbol(parent).ty.kind.is_class() {
                    continue;
                }
                if path.contains(&parent) {
                    return Err(SemaError::CircularInheritance {
                        class: self.symbol(parent).name,
                    });
                }
                if link.is_virtual && !state.virtual_bases.insert(parent) {
                    continue;
                }

                let mut level = Found::default();
                self.search_scope(state, parent, &mut level);
                let mut found = self.collect_level(state, level)?;

                if !state.satisfied(&found) && !self.symbol(parent).parents().is_empty() {
                    path.insert(parent);
                    let deeper = self.search_parents(state, parent, path)?;
                    path.remove(&parent);
                    for (name, symbols) in deeper {
                        found.entry(name).or_insert(symbols);
                    }
                }
                self.merge_sibling(state, &mut merged, found)?;
            }
            Ok(merged)
        })
    }

    /// Merge the result of one base into the results of its siblings.
    ///
    /// The same entity reached along two paths is not ambiguous when it is
    /// a static member, an enumerator or a nested type.
    fn merge_sibling(
        &self,
        state: &mut LookupState<'_>,
        merged: &mut FxHashMap<Name, Candidates>,
        found: FxHashMap<Name, Candidates>,
    ) -> SemaResult<()> {
        for (name, symbols) in found {
            match merged.entry(name) {
                Entry::Vacant(slot) => {
                    slot.insert(symbols);
                }
                Entry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    let same_entities = existing.len() == symbols.len()
                        && symbols.iter().all(|s| existing.contains(s));
                    if same_entities && symbols.iter().all(|&s| self.is_path_independent(s)) {
                        continue;
                    }
                    state.ambiguity(name)?;
                    for symbol in symbols {
                        if !existing.contains(&symbol) {
                            existing.push(symbol);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Members that denote the same entity in every base subobject.
    fn is_path_independent(&self, id: SymbolId) -> bool {
        let sym = self.symbol(id);
        sym.is_shared_member() || sym.ty.is_typedef() || self.decl_class(id) == DeclClass::Tag
    }
}
