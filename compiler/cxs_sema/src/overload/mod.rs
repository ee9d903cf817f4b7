//! Overload resolution.
//!
//! Candidates are reduced to the viable ones by arity, each argument is
//! ranked with a [`Cost`], and the candidate that is at least as good for
//! every argument and better for one wins. Ties go to a non-template over
//! a template instance, then to the more specialized function template.

mod cost;

pub use cost::{Cost, Rank, UserDefined};

use std::cmp::Ordering;

use rustc_hash::FxHashSet;

use crate::error::{SemaError, SemaResult};
use crate::symbol::SymbolId;
use crate::ty::TypeDesc;
use crate::SymbolTable;

/// A candidate that accepts the call, with one cost per argument.
#[derive(Debug)]
struct Viable {
    function: SymbolId,
    costs: Vec<Cost>,
}

impl SymbolTable {
    /// Pick the function a call with argument types `args` resolves to.
    ///
    /// Without argument types a single candidate is returned as-is and
    /// several are `UnableToResolveFunction`. `Ok(None)` means no candidate
    /// is viable; the caller decides whether that is an error.
    #[tracing::instrument(level = "trace", skip_all, fields(
        candidates = candidates.len(),
        args = args.map_or(0, <[TypeDesc]>::len),
    ))]
    pub fn resolve_function(
        &mut self,
        candidates: &[SymbolId],
        args: Option<&[TypeDesc]>,
    ) -> SemaResult<Option<SymbolId>> {
        if let Some(args) = args {
            return self.resolve_overload(candidates, args, false);
        }
        match self.unique_candidates(candidates).as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            [first, ..] => Err(SemaError::UnableToResolveFunction {
                name: self.symbol(*first).name,
            }),
        }
    }

    /// Candidates with aliases and forward declarations collapsed onto the
    /// entity they declare, in order.
    fn unique_candidates(&self, candidates: &[SymbolId]) -> Vec<SymbolId> {
        let mut seen = FxHashSet::default();
        candidates
            .iter()
            .map(|&c| self.canonical(c))
            .filter(|&c| seen.insert(c))
            .collect()
    }

    /// `nested` is set while resolving constructors for a user-defined
    /// conversion.
    pub(crate) fn resolve_overload(
        &mut self,
        candidates: &[SymbolId],
        args: &[TypeDesc],
        nested: bool,
    ) -> SemaResult<Option<SymbolId>> {
        let unique = self.unique_candidates(candidates);
        let Some(&first) = unique.first() else {
            return Ok(None);
        };
        let name = self.symbol(first).name;
        if !args.iter().all(TypeDesc::is_valid) {
            return Err(SemaError::BadTypeInfo { name });
        }
        // `f(void)` calls with no arguments.
        let args = match args {
            [only] if only.is_plain_void() => &[][..],
            _ => args,
        };

        let mut viable: Vec<Viable> = Vec::new();
        for candidate in unique {
            let function = if self.is_function_template(candidate) {
                let Some(deduced) = self.deduce_function_template_arguments(candidate, args) else {
                    continue;
                };
                match self.instantiate(candidate, deduced) {
                    Ok(instance) => instance,
                    Err(SemaError::BadTemplateArgument { .. }) => continue,
                    Err(error) => return Err(error),
                }
            } else {
                candidate
            };
            if self.symbol(function).as_parameterized().is_none()
                || viable.iter().any(|v| v.function == function)
            {
                continue;
            }
            if let Some(costs) = self.candidate_costs(function, args, nested)? {
                viable.push(Viable { function, costs });
            }
        }
        tracing::trace!(viable = viable.len(), "viable candidates");

        if viable.is_empty() {
            return Ok(None);
        }
        let Some(winner) = self.best_viable(&viable) else {
            return Err(SemaError::Ambiguous { name });
        };
        // An ambiguous user-defined conversion only matters once it is
        // actually used.
        if winner
            .costs
            .iter()
            .any(|c| c.user_defined == UserDefined::Ambiguous)
        {
            return Err(SemaError::Ambiguous { name });
        }
        Ok(Some(winner.function))
    }

    /// Per-argument costs, or `None` if the candidate is not viable.
    fn candidate_costs(
        &mut self,
        function: SymbolId,
        args: &[TypeDesc],
        nested: bool,
    ) -> SemaResult<Option<Vec<Cost>>> {
        let params = self.signature(function);
        let sym = self.symbol(function);
        if !params.iter().all(TypeDesc::is_valid) {
            return Err(SemaError::BadTypeInfo { name: sym.name });
        }
        let varargs = sym.as_parameterized().is_some_and(|p| p.varargs);

        if args.len() > params.len() && !varargs {
            return Ok(None);
        }
        if args.len() < params.len() {
            let defaulted = sym.parameters()[args.len()..]
                .iter()
                .all(|&p| self.symbol(p).ty.default.is_some());
            if !defaulted {
                return Ok(None);
            }
        }

        let mut costs = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            let cost = match params.get(index) {
                Some(param) => self.conversion_cost(arg, param, nested)?,
                None => self.ellipsis_cost(arg),
            };
            if !cost.is_match() {
                return Ok(None);
            }
            costs.push(cost);
        }
        Ok(Some(costs))
    }

    /// The candidate better than every other, if there is one.
    fn best_viable<'v>(&self, viable: &'v [Viable]) -> Option<&'v Viable> {
        let (mut winner, rest) = viable.split_first()?;
        for candidate in rest {
            if self.is_better(candidate, winner) {
                winner = candidate;
            }
        }
        viable
            .iter()
            .all(|c| c.function == winner.function || self.is_better(winner, c))
            .then_some(winner)
    }

    fn is_better(&self, a: &Viable, b: &Viable) -> bool {
        match compare_costs(&a.costs, &b.costs) {
            Some(Ordering::Less) => true,
            Some(Ordering::Equal) => self.wins_tie(a.function, b.function),
            Some(Ordering::Greater) | None => false,
        }
    }

    /// Tie-breaks between candidates with equal costs.
    fn wins_tie(&self, a: SymbolId, b: SymbolId) -> bool {
        match (self.function_template_of(a), self.function_template_of(b)) {
            (None, Some(_)) => true,
            (Some(ta), Some(tb)) if ta != tb => {
                self.more_specialized_function(ta, tb) && !self.more_specialized_function(tb, ta)
            }
            _ => false,
        }
    }

    /// The function template an instance was produced from.
    fn function_template_of(&self, function: SymbolId) -> Option<SymbolId> {
        self.symbol(function)
            .origin
            .as_ref()
            .map(|origin| origin.template)
            .filter(|&t| self.is_function_template(t))
    }
}

/// `Less` if `a` is at least as good for every argument and better for
/// one; `None` if each is better somewhere.
fn compare_costs(a: &[Cost], b: &[Cost]) -> Option<Ordering> {
    let (mut better, mut worse) = (false, false);
    for (x, y) in a.iter().zip(b) {
        match x.compare(y) {
            Ordering::Less => better = true,
            Ordering::Greater => worse = true,
            Ordering::Equal => {}
        }
    }
    match (better, worse) {
        (true, true) => None,
        (true, false) => Some(Ordering::Less),
        (false, true) => Some(Ordering::Greater),
        (false, false) => Some(Ordering::Equal),
    }
}
