//! Template argument deduction.
//!
//! Deduction matches a pattern type written in terms of template
//! parameters against a concrete type and binds each parameter it reaches.
//! It is used three ways: to match partial specialization patterns against
//! instance arguments, to deduce function template arguments from call
//! argument types, and to order templates by specialization.

use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;

use super::ArgumentSort;
use crate::symbol::SymbolId;
use crate::ty::{BaseKind, Cv, TypeDesc, TypeFlags};
use crate::SymbolTable;

/// How strictly qualifiers must match.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum DeductionMode {
    /// Template arguments: qualifiers match exactly.
    Exact,
    /// Call arguments: the parameter may be more cv-qualified than the
    /// argument.
    Call,
}

type Bindings = FxHashMap<SymbolId, TypeDesc>;

impl SymbolTable {
    /// Bind `params` by matching `patterns` against `args` position by
    /// position. Every parameter must be bound.
    pub(super) fn deduce_from_patterns(
        &self,
        params: &[SymbolId],
        patterns: &[TypeDesc],
        args: &[TypeDesc],
    ) -> Option<Vec<TypeDesc>> {
        if patterns.len() != args.len() {
            return None;
        }
        let mut bindings = Bindings::default();
        for (pattern, arg) in patterns.iter().zip(args) {
            if !self.deduce_type(params, pattern, arg, DeductionMode::Exact, &mut bindings) {
                return None;
            }
        }
        params.iter().map(|p| bindings.get(p).cloned()).collect()
    }

    fn deduce_type(
        &self,
        params: &[SymbolId],
        pattern: &TypeDesc,
        arg: &TypeDesc,
        mode: DeductionMode,
        bindings: &mut Bindings,
    ) -> bool {
        let pattern = self.flatten_type(pattern);
        let arg = self.flatten_type(arg);

        if let Some(link) = pattern.link {
            if params.contains(&link) {
                return if pattern.template_args.is_empty() {
                    self.bind_parameter(link, &pattern, &arg, mode, bindings)
                } else {
                    self.deduce_template_id(params, &pattern, &arg, mode, bindings)
                };
            }
            if !pattern.template_args.is_empty() || self.symbol(link).as_deferred().is_some() {
                return self.deduce_template_id(params, &pattern, &arg, mode, bindings);
            }
        }

        let (mut pattern, mut arg) = (pattern, arg);
        pattern.strip_specifiers();
        arg.strip_specifiers();
        pattern == arg
    }

    /// Bind `param` to what is left of `arg` after the pattern's own
    /// operators and qualifiers are matched off.
    ///
    /// Operators are matched from the top level down, and the pattern's
    /// base qualifiers come off the level the parameter lands on:
    /// `const T *` against `const int *const *` binds `T = const int *`.
    fn bind_parameter(
        &self,
        param: SymbolId,
        pattern: &TypeDesc,
        arg: &TypeDesc,
        mode: DeductionMode,
        bindings: &mut Bindings,
    ) -> bool {
        let depth = pattern.ptr_ops.len();
        if arg.ptr_ops.len() < depth {
            return false;
        }
        for (p, a) in pattern.ptr_ops.iter().zip(&arg.ptr_ops) {
            if p.kind != a.kind || p.member_of != a.member_of || !cv_fits(p.cv, a.cv, mode) {
                return false;
            }
        }

        let mut bound = arg.clone();
        bound.ptr_ops = arg.ptr_ops[depth..].iter().copied().collect();
        bound.strip_specifiers();
        bound.default = None;

        let level_cv = bound.top_cv();
        let pattern_cv = pattern.base_cv();
        if mode == DeductionMode::Exact && !level_cv.contains(pattern_cv) {
            return false;
        }
        set_top_cv(&mut bound, level_cv.difference(pattern_cv));

        let expected = match self.symbol(param).ty.param_kind {
            Some(BaseKind::TypeName) | None => ArgumentSort::Type,
            Some(BaseKind::Template) => ArgumentSort::Template,
            Some(_) => ArgumentSort::Value,
        };
        if self.argument_sort(&bound) != expected {
            return false;
        }

        match bindings.entry(param) {
            Entry::Occupied(existing) => *existing.get() == bound,
            Entry::Vacant(slot) => {
                slot.insert(bound);
                true
            }
        }
    }

    /// Match a template-id pattern such as `S<T *>` or `TT<int>`.
    fn deduce_template_id(
        &self,
        params: &[SymbolId],
        pattern: &TypeDesc,
        arg: &TypeDesc,
        mode: DeductionMode,
        bindings: &mut Bindings,
    ) -> bool {
        let (Some((pattern_template, pattern_args)), Some((arg_template, arg_args))) =
            (self.template_id_parts(pattern), self.template_id_parts(arg))
        else {
            return false;
        };
        if !pattern.same_ptr_shape(arg)
            || !pattern
                .ptr_ops
                .iter()
                .zip(&arg.ptr_ops)
                .all(|(p, a)| cv_fits(p.cv, a.cv, mode))
            || !cv_fits(pattern.base_cv(), arg.base_cv(), mode)
        {
            return false;
        }

        let arg_template = self.canonical(arg_template);
        if params.contains(&pattern_template) {
            let bound = TypeDesc::named(arg_template);
            match bindings.entry(pattern_template) {
                Entry::Occupied(existing) if *existing.get() != bound => return false,
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(bound);
                }
            }
        } else if self.canonical(pattern_template) != arg_template {
            return false;
        }

        pattern_args.len() == arg_args.len()
            && pattern_args.iter().zip(&arg_args).all(|(p, a)| {
                self.deduce_type(params, p, a, DeductionMode::Exact, bindings)
            })
    }

    /// Template and arguments of a template-id, a placeholder or an
    /// instance.
    fn template_id_parts(&self, ty: &TypeDesc) -> Option<(SymbolId, Vec<TypeDesc>)> {
        let link = ty.link?;
        if !ty.template_args.is_empty() {
            return Some((link, ty.template_args.clone()));
        }
        let sym = self.symbol(self.canonical(link));
        if let Some(deferred) = sym.as_deferred() {
            return Some((deferred.template, deferred.args.clone()));
        }
        sym.origin
            .as_ref()
            .map(|origin| (origin.template, origin.args.clone()))
    }

    /// Template arguments of a call to function template `template` with
    /// argument types `args`, or `None` if deduction fails.
    ///
    /// Parameters that mention no template parameter take no part.
    /// Parameters left unbound must be trailing and have defaults; the
    /// result holds only the deduced prefix.
    pub fn deduce_function_template_arguments(
        &self,
        template: SymbolId,
        args: &[TypeDesc],
    ) -> Option<Vec<TypeDesc>> {
        let template = self.canonical(template);
        let params = self.symbol(template).parameters();
        let function = self.templated_symbol(template)?;
        let function_sym = self.symbol(function);
        let function_params = function_sym.parameters();
        let varargs = function_sym.as_parameterized().is_some_and(|p| p.varargs);
        if args.len() > function_params.len() && !varargs {
            return None;
        }

        let mut bindings = Bindings::default();
        for (&function_param, arg) in function_params.iter().zip(args) {
            let mut pattern = self.flatten_type(&self.symbol(function_param).ty);
            if !self.mentions_parameter(&pattern, params) {
                continue;
            }
            let mut arg = self.flatten_type(arg);
            arg.strip_reference();
            if !pattern.strip_reference() {
                arg.decay();
                arg.strip_top_cv();
                pattern.strip_top_cv();
            }
            if !self.deduce_type(params, &pattern, &arg, DeductionMode::Call, &mut bindings) {
                return None;
            }
        }

        let deduced: Vec<TypeDesc> = params
            .iter()
            .map_while(|p| bindings.get(p).cloned())
            .collect();
        let rest = &params[deduced.len()..];
        let complete = rest.iter().all(|p| {
            !bindings.contains_key(p) && self.symbol(*p).ty.default.is_some()
        });
        complete.then_some(deduced)
    }

    fn mentions_parameter(&self, ty: &TypeDesc, params: &[SymbolId]) -> bool {
        if let Some(link) = ty.link {
            if params.contains(&link) {
                return true;
            }
            if let Some(deferred) = self.symbol(link).as_deferred() {
                if params.contains(&deferred.template)
                    || deferred
                        .args
                        .iter()
                        .any(|arg| self.mentions_parameter(arg, params))
                {
                    return true;
                }
            }
        }
        ty.template_args
            .iter()
            .any(|arg| self.mentions_parameter(arg, params))
    }

    /// Is function template `a` at least as specialized as `b`?
    ///
    /// True when `b`'s parameters can be deduced from `a`'s parameter
    /// types, which stand for arbitrary unique types.
    pub(crate) fn more_specialized_function(&self, a: SymbolId, b: SymbolId) -> bool {
        let (Some(fa), Some(fb)) = (self.templated_symbol(a), self.templated_symbol(b)) else {
            return false;
        };
        let (pa, pb) = (self.symbol(fa).parameters(), self.symbol(fb).parameters());
        if pa.len() != pb.len() {
            return false;
        }
        let b_params = self.symbol(b).parameters();
        let mut bindings = Bindings::default();
        pa.iter().zip(pb).all(|(&x, &y)| {
            let mut arg = self.flatten_type(&self.symbol(x).ty);
            let mut pattern = self.flatten_type(&self.symbol(y).ty);
            arg.strip_reference();
            pattern.strip_reference();
            if !self.mentions_parameter(&pattern, b_params) {
                arg.strip_top_cv();
                pattern.strip_top_cv();
            }
            self.deduce_type(b_params, &pattern, &arg, DeductionMode::Exact, &mut bindings)
        })
    }
}

fn cv_fits(pattern: Cv, arg: Cv, mode: DeductionMode) -> bool {
    match mode {
        DeductionMode::Exact => pattern == arg,
        DeductionMode::Call => pattern.contains(arg),
    }
}

fn set_top_cv(ty: &mut TypeDesc, cv: Cv) {
    match ty.ptr_ops.first_mut() {
        Some(op) => op.cv = cv,
        None => {
            ty.flags.remove(TypeFlags::CV);
            ty.flags |= cv.as_flags();
        }
    }
}
