//! Template instantiation.
//!
//! `instantiate(template, args)` fills in default arguments, validates each
//! argument against its parameter, and returns the cached instance for an
//! equal argument tuple if there is one. Otherwise the most specialized
//! matching partial specialization (or the primary) is copied with every
//! template parameter replaced by its argument.
//!
//! Uses with arguments that still depend on template parameters produce a
//! `DeferredInstance` placeholder instead of an instance. Substitutions that
//! cannot finish during the copy (a member referring to an instance that
//! does not exist yet) are queued and drained once the outermost
//! instantiation has copied everything. The drain is bounded by
//! `SemaConfig::deferred_pass_limit`; exceeding it is `RecursiveTemplate`,
//! and everything the failed instantiation created is rolled back.

mod deduce;
mod subst;

use rustc_hash::FxHashMap;

use crate::error::{internal_invariant, SemaError, SemaResult};
use crate::log::UndoRecord;
use crate::symbol::{
    DeferredInstanceData, ExplicitSpecialization, InstanceOrigin, Instantiation, Symbol, SymbolId,
    SymbolKind,
};
use crate::table::DeclClass;
use crate::ty::{BaseKind, TypeDesc};
use crate::SymbolTable;

use subst::{DeferredWork, InstantiationContext};

/// In-flight instantiation state.
///
/// Contexts and queued work live until the outermost instantiation
/// finishes; work items refer to their context by index.
#[derive(Debug, Default)]
pub(crate) struct TemplateState {
    depth: usize,
    queue: Vec<DeferredWork>,
    contexts: Vec<InstantiationContext>,
}

/// What a template argument denotes.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum ArgumentSort {
    Type,
    Template,
    Value,
}

impl SymbolTable {
    /// The instance of `template` for `args`.
    ///
    /// Missing trailing arguments take their defaults. Arguments that
    /// depend on template parameters yield a `DeferredInstance`
    /// placeholder. An argument that does not fit its parameter is
    /// `BadTemplateArgument`.
    #[tracing::instrument(level = "trace", skip_all, fields(
        template = template.raw(),
        args = args.len(),
    ))]
    pub fn instantiate(&mut self, template: SymbolId, args: Vec<TypeDesc>) -> SemaResult<SymbolId> {
        let template = self.canonical(template);
        let sym = self.symbol(template);
        let name = sym.name;
        if sym.as_template().is_none() {
            return Err(SemaError::BadTypeInfo { name });
        }
        let is_parameter = sym.is_template_parameter();
        if !args.iter().all(TypeDesc::is_valid) {
            return Err(SemaError::BadTypeInfo { name });
        }

        let args = args
            .iter()
            .map(|arg| self.resolve_template_ids(arg))
            .collect::<SemaResult<Vec<_>>>()?;
        let args = self.complete_arguments(template, args)?;

        if is_parameter || args.iter().any(|arg| self.is_dependent(arg)) {
            return Ok(self.deferred_instance(template, args));
        }

        let params = self.symbol(template).parameters().to_vec();
        for (index, (&param, arg)) in params.iter().zip(&args).enumerate() {
            if !self.match_template_parameter_and_argument(param, arg) {
                return Err(SemaError::BadTemplateArgument {
                    template: name,
                    index,
                });
            }
        }

        if let Some(existing) = self.find_existing_instance(template, &args) {
            tracing::debug!(instance = existing.raw(), "instantiation cache hit");
            return Ok(existing);
        }

        if let Some((specialization, spec_args)) = self.select_specialization(template, &args)? {
            let instance = self.instantiate(specialization, spec_args)?;
            self.record_instance(template, args.clone(), instance);
            self.set_origin(instance, InstanceOrigin { template, args });
            return Ok(instance);
        }

        tracing::debug!("instantiation cache miss");
        self.instantiate_uncached(template, args)
    }

    /// Replace template-ids with non-dependent arguments by their
    /// instances, after flattening typedefs.
    pub(crate) fn resolve_template_ids(&mut self, ty: &TypeDesc) -> SemaResult<TypeDesc> {
        let mut ty = self.flatten_type(ty);
        if ty.template_args.is_empty() {
            return Ok(ty);
        }
        let args = std::mem::take(&mut ty.template_args)
            .iter()
            .map(|arg| self.resolve_template_ids(arg))
            .collect::<SemaResult<Vec<_>>>()?;

        let instantiable = ty
            .link
            .is_some_and(|link| self.symbol(self.canonical(link)).is_template())
            && !args.iter().any(|arg| self.is_dependent(arg));
        match ty.link {
            Some(link) if instantiable => ty.link = Some(self.instantiate(link, args)?),
            _ => ty.template_args = args,
        }
        Ok(ty)
    }

    /// One argument per parameter: explicit arguments first, then
    /// defaults, which may refer to earlier parameters.
    fn complete_arguments(
        &mut self,
        template: SymbolId,
        args: Vec<TypeDesc>,
    ) -> SemaResult<Vec<TypeDesc>> {
        let sym = self.symbol(template);
        let name = sym.name;
        let params = sym.parameters().to_vec();
        if args.len() > params.len() {
            return Err(SemaError::BadTemplateArgument {
                template: name,
                index: params.len(),
            });
        }

        let mut map = FxHashMap::default();
        let mut completed = Vec::with_capacity(params.len());
        let mut explicit = args.into_iter();
        for (index, &param) in params.iter().enumerate() {
            let mut arg = match explicit.next() {
                Some(arg) => arg,
                None => {
                    let Some(default) = self.symbol(param).ty.default.as_deref() else {
                        return Err(SemaError::BadTemplateArgument {
                            template: name,
                            index,
                        });
                    };
                    let default = self.substitute_parameters(default, &map);
                    self.resolve_template_ids(&default)?
                }
            };
            arg.default = None;
            map.insert(param, arg.clone());
            completed.push(arg);
        }
        Ok(completed)
    }

    /// Placeholder for `template<args>` with dependent arguments, shared by
    /// every use with equal arguments.
    fn deferred_instance(&mut self, template: SymbolId, args: Vec<TypeDesc>) -> SymbolId {
        let sym = self.symbol(template);
        if let Some(existing) = sym
            .as_template()
            .and_then(|data| data.deferred.iter().find(|d| d.args == args))
        {
            return existing.symbol;
        }

        let mut placeholder = Symbol::new(
            sym.name,
            TypeDesc::template_id(template, args.clone()),
            SymbolKind::DeferredInstance(Box::new(DeferredInstanceData {
                template,
                args: args.clone(),
            })),
        );
        placeholder.scope = sym.scope;
        placeholder.in_template = true;
        let symbol = self.push_symbol(placeholder);

        if let Some(data) = self.symbol_mut(template).as_template_mut() {
            data.deferred.push(Instantiation { args, symbol });
        }
        self.log.push(UndoRecord::AddDeferredInstance { template });
        symbol
    }

    fn record_instance(&mut self, template: SymbolId, args: Vec<TypeDesc>, symbol: SymbolId) {
        if let Some(data) = self.symbol_mut(template).as_template_mut() {
            data.instances.push(Instantiation { args, symbol });
        }
        self.log.push(UndoRecord::AddInstance { template });
    }

    /// Copy the templated declaration for `args` and drain deferred work.
    ///
    /// The outermost instantiation runs inside its own mark, so a failure
    /// anywhere below it discards every symbol and cache entry it made.
    fn instantiate_uncached(
        &mut self,
        template: SymbolId,
        args: Vec<TypeDesc>,
    ) -> SemaResult<SymbolId> {
        let name = self.symbol(template).name;
        let outermost = self.templates.depth == 0;
        let mark = outermost.then(|| self.mark());

        self.templates.depth += 1;
        let mut result = self.copy_template(template, args);
        if outermost && result.is_ok() {
            if let Err(error) = self.drain_deferred(name) {
                result = Err(error);
            }
        }
        self.templates.depth -= 1;

        let Some(mark) = mark else {
            return result;
        };
        self.templates.queue.clear();
        self.templates.contexts.clear();
        let released = match &result {
            Ok(_) => self.commit(mark),
            Err(error) => {
                tracing::warn!(
                    template = self.name_str(name),
                    %error,
                    "instantiation abandoned"
                );
                self.rollback(mark)
            }
        };
        if released.is_err() {
            internal_invariant("instantiation mark was not innermost when released");
        }
        result
    }

    /// Does `arg` fit template parameter `param`?
    ///
    /// A type parameter takes a type, a template template parameter a
    /// template with the same parameter sorts, and a non-type parameter a
    /// constant or enumerator of a compatible kind. Dependent arguments
    /// only need the right sort.
    pub fn match_template_parameter_and_argument(&self, param: SymbolId, arg: &TypeDesc) -> bool {
        let param_sym = self.symbol(param);
        let sort = self.argument_sort(arg);
        match param_sym.ty.param_kind {
            Some(BaseKind::TypeName) | None => sort == ArgumentSort::Type,
            Some(BaseKind::Template) => {
                sort == ArgumentSort::Template
                    && (self.is_dependent(arg)
                        || arg
                            .link
                            .is_some_and(|t| self.same_parameter_sorts(param, self.canonical(t))))
            }
            Some(kind) => {
                sort == ArgumentSort::Value
                    && (arg.constant.is_none()
                        || arg.kind == kind
                        || (kind.is_integral() && arg.kind.is_integral()))
            }
        }
    }

    fn argument_sort(&self, arg: &TypeDesc) -> ArgumentSort {
        if arg.constant.is_some() {
            return ArgumentSort::Value;
        }
        let Some(link) = arg.link else {
            return ArgumentSort::Type;
        };
        let sym = self.symbol(self.canonical(link));
        if sym.is_template_parameter() {
            return match sym.ty.param_kind {
                Some(BaseKind::TypeName) | None => ArgumentSort::Type,
                Some(BaseKind::Template) => ArgumentSort::Template,
                Some(_) => ArgumentSort::Value,
            };
        }
        if sym.ty.kind == BaseKind::Enumerator {
            ArgumentSort::Value
        } else if sym.is_template() && arg.template_args.is_empty() && !arg.has_ptr_ops() {
            ArgumentSort::Template
        } else {
            ArgumentSort::Type
        }
    }

    /// A template template parameter declared without parameters accepts
    /// any template.
    fn same_parameter_sorts(&self, param: SymbolId, template: SymbolId) -> bool {
        let expected = self.symbol(param).parameters();
        let actual = self.symbol(template).parameters();
        expected.is_empty()
            || (expected.len() == actual.len()
                && expected
                    .iter()
                    .zip(actual)
                    .all(|(&e, &a)| self.symbol(e).ty.param_kind == self.symbol(a).ty.param_kind))
    }

    /// The partial specialization of `template` to instantiate for `args`,
    /// with its own arguments deduced from them.
    ///
    /// Of several matching specializations the one more specialized than
    /// every other wins; without one the use is `Ambiguous`.
    pub fn select_specialization(
        &self,
        template: SymbolId,
        args: &[TypeDesc],
    ) -> SemaResult<Option<(SymbolId, Vec<TypeDesc>)>> {
        let sym = self.symbol(template);
        let Some(data) = sym.as_template() else {
            return Ok(None);
        };

        let mut matches: Vec<(SymbolId, Vec<TypeDesc>)> = Vec::new();
        for &specialization in &data.specializations {
            let Some(spec) = self.symbol(specialization).as_template() else {
                continue;
            };
            let Some(patterns) = &spec.spec_args else {
                continue;
            };
            if let Some(deduced) = self.deduce_from_patterns(&spec.params, patterns, args) {
                matches.push((specialization, deduced));
            }
        }

        if matches.len() <= 1 {
            return Ok(matches.pop());
        }
        let winners: Vec<usize> = (0..matches.len())
            .filter(|&i| {
                matches.iter().enumerate().all(|(j, other)| {
                    i == j
                        || (self.spec_at_least_as_specialized(matches[i].0, other.0)
                            && !self.spec_at_least_as_specialized(other.0, matches[i].0))
                })
            })
            .collect();
        match winners.as_slice() {
            [winner] => Ok(Some(matches.swap_remove(*winner))),
            _ => Err(SemaError::Ambiguous { name: sym.name }),
        }
    }

    /// `a` is at least as specialized as `b` when `b`'s patterns can be
    /// deduced from `a`'s.
    fn spec_at_least_as_specialized(&self, a: SymbolId, b: SymbolId) -> bool {
        let (Some(a), Some(b)) = (self.symbol(a).as_template(), self.symbol(b).as_template()) else {
            return false;
        };
        match (&a.spec_args, &b.spec_args) {
            (Some(a_patterns), Some(b_patterns)) => self
                .deduce_from_patterns(&b.params, b_patterns, a_patterns)
                .is_some(),
            _ => false,
        }
    }

    /// Explicit specialization or cached instance for exactly `args`.
    fn find_existing_instance(&self, template: SymbolId, args: &[TypeDesc]) -> Option<SymbolId> {
        let data = self.symbol(template).as_template()?;
        data.explicit
            .iter()
            .find(|e| e.args == args)
            .map(|e| e.symbol)
            .or_else(|| data.cached(args))
    }

    /// `template<> declaration` of `template<args>`.
    ///
    /// A function or variable specialized for a class template names a
    /// member of the class instance: it completes a forward-declared member
    /// with the same parameters, or replaces a defined one. Anything else
    /// specializes the whole template; the same arguments twice is
    /// `InvalidOverload`.
    pub fn add_explicit_specialization(
        &mut self,
        template: SymbolId,
        args: Vec<TypeDesc>,
        symbol: SymbolId,
    ) -> SemaResult<SymbolId> {
        let template = self.canonical(template);
        let name = self.symbol(template).name;
        let Some(templated) = self.templated_symbol(template) else {
            return Err(SemaError::BadTypeInfo { name });
        };
        if self.symbol(templated).ty.kind.is_class() && self.decl_class(symbol) != DeclClass::Tag {
            return self.specialize_member(template, args, symbol);
        }

        let args = self.complete_arguments(template, args)?;
        let duplicate = self
            .symbol(template)
            .as_template()
            .is_some_and(|data| data.explicit.iter().any(|e| e.args == args));
        if duplicate {
            return Err(SemaError::InvalidOverload { name });
        }
        if let Some(data) = self.symbol_mut(template).as_template_mut() {
            data.explicit.push(ExplicitSpecialization {
                args: args.clone(),
                symbol,
            });
        }
        self.log.push(UndoRecord::AddExplicitSpecialization { template });
        self.set_origin(symbol, InstanceOrigin { template, args });
        if self.symbol(symbol).scope.is_none() {
            let (scope, in_template) = (self.symbol(template).scope, self.symbol(symbol).in_template);
            self.set_scope(symbol, scope, in_template);
        }
        Ok(symbol)
    }

    fn specialize_member(
        &mut self,
        template: SymbolId,
        args: Vec<TypeDesc>,
        symbol: SymbolId,
    ) -> SemaResult<SymbolId> {
        let instance = self.instantiate(template, args)?;
        let name = self.symbol(symbol).name;
        let member = self.members(instance, name).iter().copied().find(|&m| {
            let sym = self.symbol(m);
            if self.symbol(symbol).is_function() {
                sym.is_function() && self.has_same_parameters(m, symbol)
            } else {
                !sym.is_function()
            }
        });
        let Some(member) = member else {
            return Err(SemaError::InvalidOverload { name });
        };

        if self.symbol(member).is_forward() && self.symbol(member).forward_target.is_none() {
            self.add_symbol(instance, symbol)?;
        } else {
            self.set_forward_target(member, symbol);
            self.insert_member(instance, symbol);
        }
        tracing::debug!(
            instance = instance.raw(),
            member = member.raw(),
            "member specialization"
        );
        Ok(symbol)
    }
}
