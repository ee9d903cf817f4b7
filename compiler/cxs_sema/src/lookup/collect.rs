//! Merging and hiding rules for the candidates of one scope level.
//!
//! Candidates are classified into functions (plain and template), at most
//! one object and at most one tag:
//!
//! - A tag is hidden by an object or function declared in the same scope,
//!   and ambiguous with one from a different scope.
//! - Two distinct objects are ambiguous, as are an object and a function.
//! - Aliases and completed forward declarations collapse onto the entity
//!   they stand for.
//! - Friend declarations are invisible to ordinary lookup.
//! - Function templates are folded in as-is, or replaced by the
//!   instantiation deduced from the call's argument types.

use cxs_ir::Name;
use rustc_hash::{FxHashMap, FxHashSet};

use super::{Candidates, Found, LookupState};
use crate::error::{SemaError, SemaResult};
use crate::symbol::SymbolId;
use crate::table::DeclClass;
use crate::ty::TypeFlags;
use crate::SymbolTable;

impl SymbolTable {
    /// Apply `collect_symbol` to every name of a level.
    pub(crate) fn collect_level(
        &mut self,
        state: &mut LookupState<'_>,
        level: Found,
    ) -> SemaResult<FxHashMap<Name, Candidates>> {
        let mut collected = FxHashMap::default();
        for (name, candidates) in level {
            let symbols = self.collect_symbol(state, name, &candidates)?;
            if !symbols.is_empty() {
                collected.insert(name, symbols);
            }
        }
        Ok(collected)
    }

    /// Classify and merge the candidates found for `name`.
    pub(crate) fn collect_symbol(
        &mut self,
        state: &mut LookupState<'_>,
        name: Name,
        candidates: &[SymbolId],
    ) -> SemaResult<Candidates> {
        let mut seen = FxHashSet::default();
        let mut tag: Option<(SymbolId, Option<SymbolId>)> = None;
        let mut object: Option<(SymbolId, Option<SymbolId>)> = None;
        let mut functions: Vec<(SymbolId, Option<SymbolId>)> = Vec::new();
        let mut templates: Vec<SymbolId> = Vec::new();
        let mut visible = Candidates::new();
        let mut ambiguous = false;

        for &id in candidates {
            let entity = self.canonical(id);
            if !seen.insert(entity) {
                continue;
            }
            let sym = self.symbol(entity);
            if sym.ty.flags.contains(TypeFlags::FRIEND) {
                continue;
            }
            visible.push(entity);
            // Hiding is decided by where the name was declared, which for an
            // alias is the scope of the using-declaration.
            let declared_in = self.symbol(id).scope;

            match self.decl_class(entity) {
                DeclClass::Tag => match tag {
                    Some((existing, _)) if existing != entity => ambiguous = true,
                    _ => tag = Some((entity, declared_in)),
                },
                DeclClass::Function => {
                    if sym.is_template() {
                        templates.push(entity);
                    } else {
                        functions.push((entity, declared_in));
                    }
                }
                DeclClass::Object => {
                    if object.is_some() {
                        ambiguous = true;
                    } else {
                        object = Some((entity, declared_in));
                    }
                }
            }
        }

        if let Some((_, tag_scope)) = tag {
            let mut others = object
                .iter()
                .chain(functions.iter())
                .map(|&(_, scope)| scope)
                .chain(templates.iter().map(|&t| self.symbol(t).scope))
                .peekable();
            if others.peek().is_some() {
                if others.all(|scope| scope == tag_scope) {
                    tag = None;
                } else {
                    ambiguous = true;
                }
            }
        }
        if object.is_some() && !(functions.is_empty() && templates.is_empty()) {
            ambiguous = true;
        }

        if ambiguous {
            state.ambiguity(name)?;
            return Ok(visible);
        }

        if let Some((entity, _)) = object {
            return Ok(Candidates::from_slice(&[entity]));
        }
        let mut result: Candidates = functions.iter().map(|&(f, _)| f).collect();
        self.fold_templates(state, &templates, &mut result)?;
        if result.is_empty() {
            if let Some((entity, _)) = tag {
                result.push(entity);
            }
        }
        Ok(result)
    }

    /// Add function templates to an overload set.
    fn fold_templates(
        &mut self,
        state: &LookupState<'_>,
        templates: &[SymbolId],
        result: &mut Candidates,
    ) -> SemaResult<()> {
        let arguments = match &state.options.arguments {
            Some(arguments) if !state.options.exact_function_match => arguments,
            _ => {
                result.extend(templates.iter().copied());
                return Ok(());
            }
        };
        for &template in templates {
            let Some(deduced) = self.deduce_function_template_arguments(template, arguments) else {
                continue;
            };
            match self.instantiate(template, deduced) {
                Ok(instance) => result.push(instance),
                // A deduced argument that fails its parameter's constraints
                // removes the candidate rather than failing the lookup.
                Err(SemaError::BadTemplateArgument { .. }) => {}
                Err(error) => return Err(error),
            }
        }
        Ok(())
    }
}
