//! Copying a templated declaration with its parameters substituted.

use cxs_ir::Name;
use rustc_hash::FxHashMap;

use crate::error::{internal_invariant, SemaError, SemaResult};
use crate::stack::ensure_sufficient_stack;
use crate::symbol::{InstanceOrigin, SymbolId, SymbolKind, UsingDirective};
use crate::ty::TypeDesc;
use crate::SymbolTable;

/// One template being copied: parameter bindings and the originals
/// copied so far.
#[derive(Debug)]
pub(crate) struct InstantiationContext {
    templated: SymbolId,
    map: FxHashMap<SymbolId, TypeDesc>,
    /// Original symbol inside the templated declaration to its copy.
    remap: FxHashMap<SymbolId, SymbolId>,
}

/// Which part of a copied symbol a queued substitution completes.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum DeferredKind {
    Parent { index: usize },
    ReturnType,
    Type,
}

/// A substitution that could not finish during the copy.
#[derive(Debug)]
pub(crate) struct DeferredWork {
    target: SymbolId,
    kind: DeferredKind,
    ty: TypeDesc,
    context: usize,
}

impl SymbolTable {
    /// Copy the templated declaration of `template` with its parameters
    /// bound to `args`. The instance is cached before its members are
    /// copied so self-references find it.
    pub(super) fn copy_template(
        &mut self,
        template: SymbolId,
        args: Vec<TypeDesc>,
    ) -> SemaResult<SymbolId> {
        let sym = self.symbol(template);
        let (name, scope) = (sym.name, sym.scope);
        let Some(templated) = self.templated_symbol(template) else {
            return Err(SemaError::BadTypeInfo { name });
        };
        let map: FxHashMap<SymbolId, TypeDesc> = self
            .symbol(template)
            .parameters()
            .iter()
            .copied()
            .zip(args.iter().cloned())
            .collect();

        let instance = self.new_shell(templated);
        let inst = self.symbol_mut(instance);
        inst.scope = scope;
        inst.origin = Some(Box::new(InstanceOrigin {
            template,
            args: args.clone(),
        }));
        self.record_instance(template, args, instance);

        let mut remap = FxHashMap::default();
        remap.insert(templated, instance);
        self.templates.contexts.push(InstantiationContext {
            templated,
            map,
            remap,
        });
        let context = self.templates.contexts.len() - 1;

        self.copy_contents(context, templated, instance)?;
        self.link_forward_targets(context);
        tracing::debug!(
            template = self.name_str(name),
            instance = instance.raw(),
            "instantiated"
        );
        Ok(instance)
    }

    /// Fill the shell `copy` from `original`: type, parameters, return
    /// type, bases, members, using-directives, constructors and
    /// conversions.
    fn copy_contents(
        &mut self,
        context: usize,
        original: SymbolId,
        copy: SymbolId,
    ) -> SemaResult<()> {
        ensure_sufficient_stack(|| {
            let ty = self.symbol(original).ty.clone();
            self.substitute_into(context, copy, DeferredKind::Type, ty)?;

            let params = self.symbol(original).parameters().to_vec();
            for param in params {
                let param_copy = self.copy_member(context, param)?;
                self.symbol_mut(param_copy).scope = Some(copy);
                match &mut self.symbol_mut(copy).kind {
                    SymbolKind::Parameterized(data) => data.params.push(param_copy),
                    SymbolKind::Template(data) => data.params.push(param_copy),
                    _ => internal_invariant("copied parameters into a symbol without a parameter list"),
                }
            }

            if let Some(ret) = self.symbol(original).return_type().cloned() {
                if let Some(data) = self.symbol_mut(copy).as_parameterized_mut() {
                    data.return_type = Some(ret.clone());
                }
                self.substitute_into(context, copy, DeferredKind::ReturnType, ret)?;
            }

            let parents = self.symbol(original).parents().to_vec();
            for (index, link) in parents.into_iter().enumerate() {
                if let Some(data) = self.symbol_mut(copy).as_derivable_mut() {
                    data.parents.push(link);
                }
                let parent = TypeDesc::named(link.parent);
                self.substitute_into(context, copy, DeferredKind::Parent { index }, parent)?;
            }

            let members = self
                .symbol(original)
                .container()
                .map(|c| c.contents().to_vec())
                .unwrap_or_default();
            for member in members {
                let member_copy = self.copy_member(context, member)?;
                self.insert_member(copy, member_copy);
            }

            let usings = self.symbol(original).using_directives().to_vec();
            if let Some(container) = self.symbol_mut(copy).container_mut() {
                container
                    .usings
                    .extend(usings.into_iter().map(|u| UsingDirective {
                        scope: copy,
                        namespace: u.namespace,
                    }));
            }

            if let Some(data) = self.symbol(original).as_derivable() {
                let (constructors, conversions) =
                    (data.constructors.clone(), data.conversions.clone());
                for constructor in constructors {
                    let function = self.copy_member(context, constructor)?;
                    self.symbol_mut(function).scope = Some(copy);
                    if let Some(data) = self.symbol_mut(copy).as_derivable_mut() {
                        data.constructors.push(function);
                    }
                }
                for conversion in conversions {
                    let function = self.copy_member(context, conversion)?;
                    self.symbol_mut(function).scope = Some(copy);
                    if let Some(data) = self.symbol_mut(copy).as_derivable_mut() {
                        data.conversions.push(function);
                    }
                }
            }
            Ok(())
        })
    }

    /// The copy of `member`, made on first use.
    fn copy_member(&mut self, context: usize, member: SymbolId) -> SemaResult<SymbolId> {
        let ctx = &self.templates.contexts[context];
        if let Some(&copy) = ctx.remap.get(&member) {
            return Ok(copy);
        }
        let templated = ctx.templated;
        let in_template = self.inside_member_template(member, templated);

        let copy = self.new_shell(member);
        self.symbol_mut(copy).in_template = in_template;
        self.templates.contexts[context].remap.insert(member, copy);
        self.copy_contents(context, member, copy)?;
        Ok(copy)
    }

    /// Is there a template between `member` and `templated`? Such members
    /// stay dependent in the copy.
    fn inside_member_template(&self, member: SymbolId, templated: SymbolId) -> bool {
        let mut current = self.symbol(member).scope;
        while let Some(scope) = current {
            if scope == templated {
                return false;
            }
            if self.symbol(scope).is_template() {
                return true;
            }
            current = self.symbol(scope).scope;
        }
        false
    }

    /// Point forward declarations and aliases among the copies at the
    /// copies of their targets.
    fn link_forward_targets(&mut self, context: usize) {
        let ctx = &self.templates.contexts[context];
        let templated = ctx.templated;
        let links: Vec<(SymbolId, Option<SymbolId>, Option<SymbolId>)> = ctx
            .remap
            .iter()
            .filter(|(&original, _)| original != templated)
            .map(|(&original, &copy)| {
                let sym = self.symbol(original);
                let relink = |target: SymbolId| ctx.remap.get(&target).copied().unwrap_or(target);
                (copy, sym.forward_target.map(relink), sym.alias_of.map(relink))
            })
            .collect();
        for (copy, forward_target, alias_of) in links {
            let sym = self.symbol_mut(copy);
            sym.forward_target = forward_target;
            sym.alias_of = alias_of;
        }
    }

    /// `ty` with the context's parameters replaced by their arguments.
    ///
    /// `Ok(None)` means the result needs a symbol that does not exist yet:
    /// a member not copied so far or, unless `eager`, an instance not yet
    /// in the cache.
    fn substitute(
        &mut self,
        ty: &TypeDesc,
        context: usize,
        eager: bool,
    ) -> SemaResult<Option<TypeDesc>> {
        let mut result = ty.clone();

        let mut args = Vec::with_capacity(ty.template_args.len());
        for arg in &ty.template_args {
            let Some(arg) = self.substitute(arg, context, eager)? else {
                return Ok(None);
            };
            args.push(arg);
        }
        result.template_args = args;
        if let Some(default) = &ty.default {
            let Some(default) = self.substitute(default, context, eager)? else {
                return Ok(None);
            };
            result.default = Some(Box::new(default));
        }

        let ctx = &self.templates.contexts[context];
        for op in &mut result.ptr_ops {
            if let Some(class) = op.member_of {
                op.member_of = Some(ctx.remap.get(&class).copied().unwrap_or(class));
            }
        }

        let Some(link) = result.link else {
            return Ok(Some(result));
        };
        if let Some(replacement) = ctx.map.get(&link).cloned() {
            if result.template_args.is_empty() {
                return Ok(Some(result.substitute_base(&replacement)));
            }
            // `TT<args>` with `TT` a template template parameter.
            let Some(template) = replacement.link else {
                return Err(SemaError::BadTypeInfo {
                    name: self.symbol(link).name,
                });
            };
            let args = std::mem::take(&mut result.template_args);
            return self.relink(result, template, args, eager);
        }
        if let Some(&copy) = ctx.remap.get(&link) {
            result.link = Some(copy);
            return Ok(Some(result));
        }

        if let Some(deferred) = self.symbol(link).as_deferred() {
            let template = ctx
                .map
                .get(&deferred.template)
                .and_then(|t| t.link)
                .or_else(|| ctx.remap.get(&deferred.template).copied())
                .unwrap_or(deferred.template);
            let pending = deferred.args.clone();
            let mut args = Vec::with_capacity(pending.len());
            for arg in &pending {
                let Some(arg) = self.substitute(arg, context, eager)? else {
                    return Ok(None);
                };
                args.push(arg);
            }
            return self.relink(result, template, args, eager);
        }

        let templated = ctx.templated;
        if link != templated && self.is_within(link, templated) {
            return Ok(None);
        }
        if !result.template_args.is_empty() && self.symbol(self.canonical(link)).is_template() {
            let args = std::mem::take(&mut result.template_args);
            return self.relink(result, link, args, eager);
        }
        Ok(Some(result))
    }

    /// `result` with its base replaced by the instance `template<args>`.
    fn relink(
        &mut self,
        mut result: TypeDesc,
        template: SymbolId,
        args: Vec<TypeDesc>,
        eager: bool,
    ) -> SemaResult<Option<TypeDesc>> {
        Ok(self.resolve_instance(template, args, eager)?.map(|instance| {
            result.link = Some(instance);
            result
        }))
    }

    /// The instance for `template<args>`. Unless `eager`, only an existing
    /// instance is used, so that a class does not instantiate the classes
    /// it mentions while it is itself being copied.
    fn resolve_instance(
        &mut self,
        template: SymbolId,
        args: Vec<TypeDesc>,
        eager: bool,
    ) -> SemaResult<Option<SymbolId>> {
        if eager || args.iter().any(|arg| self.is_dependent(arg)) {
            return self.instantiate(template, args).map(Some);
        }
        let template = self.canonical(template);
        let args = args.iter().map(|arg| self.flatten_type(arg)).collect();
        let Ok(args) = self.complete_arguments(template, args) else {
            return Ok(None);
        };
        Ok(self.find_existing_instance(template, &args))
    }

    /// Substitute now if possible, otherwise queue the work.
    fn substitute_into(
        &mut self,
        context: usize,
        target: SymbolId,
        kind: DeferredKind,
        ty: TypeDesc,
    ) -> SemaResult<()> {
        match self.substitute(&ty, context, false)? {
            Some(resolved) => self.apply_substitution(target, kind, resolved),
            None => {
                self.templates.queue.push(DeferredWork {
                    target,
                    kind,
                    ty,
                    context,
                });
                Ok(())
            }
        }
    }

    fn apply_substitution(
        &mut self,
        target: SymbolId,
        kind: DeferredKind,
        ty: TypeDesc,
    ) -> SemaResult<()> {
        match kind {
            DeferredKind::Type => self.set_type(target, ty),
            DeferredKind::ReturnType => self.set_return_type(target, ty)?,
            DeferredKind::Parent { index } => {
                let Some(link) = ty.link else {
                    return Err(SemaError::BadTypeInfo {
                        name: self.symbol(target).name,
                    });
                };
                let parent = self.class_of(link);
                let current = self.symbol(target).parents().get(index).map(|l| l.parent);
                if current != Some(parent) {
                    self.set_parent(target, index, parent);
                }
            }
        }
        Ok(())
    }

    /// Complete queued substitutions, instantiating whatever they need.
    /// Completing one item may queue more.
    pub(super) fn drain_deferred(&mut self, template: Name) -> SemaResult<()> {
        let mut pass = 0;
        while !self.templates.queue.is_empty() {
            pass += 1;
            if pass > self.config.deferred_pass_limit {
                return Err(SemaError::RecursiveTemplate { template });
            }
            let work = std::mem::take(&mut self.templates.queue);
            tracing::debug!(pass, items = work.len(), "deferred instantiation pass");
            for item in work {
                self.complete_deferred(item)?;
            }
        }
        Ok(())
    }

    fn complete_deferred(&mut self, work: DeferredWork) -> SemaResult<()> {
        match self.substitute(&work.ty, work.context, true)? {
            Some(ty) => self.apply_substitution(work.target, work.kind, ty),
            None => {
                self.templates.queue.push(work);
                Ok(())
            }
        }
    }

    /// `ty` with parameters bound in `map` replaced, as used for default
    /// template arguments. Placeholders become template-ids again so they
    /// can be instantiated.
    pub(super) fn substitute_parameters(
        &self,
        ty: &TypeDesc,
        map: &FxHashMap<SymbolId, TypeDesc>,
    ) -> TypeDesc {
        let Some(link) = ty.link else {
            return ty.clone();
        };
        if let Some(replacement) = map.get(&link) {
            if ty.template_args.is_empty() {
                return ty.substitute_base(replacement);
            }
        }
        let mut result = ty.clone();
        if let Some(deferred) = self.symbol(link).as_deferred() {
            result.link = Some(deferred.template);
            result.template_args.clone_from(&deferred.args);
        }
        if let Some(template) = result.link.and_then(|l| map.get(&l)).and_then(|t| t.link) {
            result.link = Some(template);
        }
        result.template_args = result
            .template_args
            .iter()
            .map(|arg| self.substitute_parameters(arg, map))
            .collect();
        result
    }
}
