//! Shape-changing mutators.
//!
//! These are the only way to change a symbol's shape after construction.
//! Each pushes an undo record, which the log keeps only while a mark is
//! live. Misuse of a symbol kind (adding a plain parameter to a template,
//! members to a variable) is a programming error and panics.

use cxs_ir::Name;

use super::SymbolTable;
use crate::error::{unsupported, SemaError, SemaResult};
use crate::log::UndoRecord;
use crate::symbol::{Access, InstanceOrigin, ParentLink, SymbolId, SymbolKind, UsingDirective};
use crate::ty::{BaseKind, TypeDesc};

/// How a declaration takes part in redeclaration and hiding rules.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum DeclClass {
    /// Class, struct, union, enumeration, or class template.
    Tag,
    /// Function or function template.
    Function,
    /// Everything else: variables, typedefs, enumerators, namespaces.
    Object,
}

impl SymbolTable {
    pub(crate) fn decl_class(&self, id: SymbolId) -> DeclClass {
        let id = self.canonical(id);
        let sym = self.symbol(id);
        if sym.is_function() || self.is_function_template(id) {
            DeclClass::Function
        } else if (sym.ty.kind.is_class_or_enum() && !sym.ty.is_typedef())
            || self.is_class_template(id)
        {
            DeclClass::Tag
        } else {
            DeclClass::Object
        }
    }

    /// Declared but not defined. A template is forward when its templated
    /// declaration is.
    pub(crate) fn is_forward_declaration(&self, id: SymbolId) -> bool {
        let sym = self.symbol(id);
        if sym.is_template() {
            return self
                .templated_symbol(id)
                .is_some_and(|t| self.symbol(t).is_forward());
        }
        sym.is_forward()
    }

    /// Add `symbol` to `scope`, checking it against earlier declarations of
    /// the same name.
    ///
    /// A definition completes an earlier forward declaration instead of
    /// duplicating it; a forward declaration after the definition collapses
    /// onto it. Conflicting declarations are `InvalidOverload`.
    pub fn add_symbol(&mut self, scope: SymbolId, symbol: SymbolId) -> SemaResult<()> {
        if self.symbol(scope).container().is_none() {
            unsupported("add_symbol into a symbol that holds no members");
        }
        let name = self.symbol(symbol).name;
        if !name.is_empty() {
            self.check_redeclaration(scope, symbol)?;
        }
        self.insert_member(scope, symbol);
        Ok(())
    }

    /// Insert without redeclaration checks.
    pub(crate) fn insert_member(&mut self, scope: SymbolId, symbol: SymbolId) {
        let scope_sym = self.symbol(scope);
        let in_template = scope_sym.is_template() || scope_sym.in_template;

        let sym = self.symbol_mut(symbol);
        let name = sym.name;
        let previous_scope = sym.scope.replace(scope);
        let previous_in_template = std::mem::replace(&mut sym.in_template, in_template);

        match self.symbol_mut(scope).container_mut() {
            Some(container) => container.insert(name, symbol),
            None => unsupported("insert_member into a symbol that holds no members"),
        }
        self.log.push(UndoRecord::AddMember {
            scope,
            name,
            symbol,
            previous_scope,
            previous_in_template,
        });
    }

    fn check_redeclaration(&mut self, scope: SymbolId, new: SymbolId) -> SemaResult<()> {
        let name = self.symbol(new).name;
        let existing: Vec<SymbolId> = self.members(scope, name).to_vec();
        for old in existing {
            if old == new {
                continue;
            }
            match (self.decl_class(old), self.decl_class(new)) {
                (DeclClass::Tag, DeclClass::Tag) => self.redeclare_tag(old, new)?,
                (DeclClass::Function, DeclClass::Function) => self.redeclare_function(old, new)?,
                // A tag and a non-tag may share a name; the tag is hidden.
                (DeclClass::Tag, _) | (_, DeclClass::Tag) => {}
                (DeclClass::Object, DeclClass::Object) => self.redeclare_object(old, new)?,
                (DeclClass::Object, DeclClass::Function)
                | (DeclClass::Function, DeclClass::Object) => {
                    return Err(SemaError::InvalidOverload { name });
                }
            }
        }
        Ok(())
    }

    fn redeclare_tag(&mut self, old: SymbolId, new: SymbolId) -> SemaResult<()> {
        let name = self.symbol(new).name;
        let (old_sym, new_sym) = (self.symbol(old), self.symbol(new));
        if old_sym.alias_of.is_some() || new_sym.alias_of.is_some() {
            return if self.canonical(old) == self.canonical(new) {
                Ok(())
            } else {
                Err(SemaError::InvalidOverload { name })
            };
        }
        let same_key = old_sym.is_template() == new_sym.is_template()
            && (old_sym.ty.kind == BaseKind::Enumeration) == (new_sym.ty.kind == BaseKind::Enumeration);
        if !same_key {
            return Err(SemaError::InvalidOverload { name });
        }
        self.complete_forward(old, new, name)
    }

    fn redeclare_function(&mut self, old: SymbolId, new: SymbolId) -> SemaResult<()> {
        let name = self.symbol(new).name;
        if self.symbol(old).is_template() || self.symbol(new).is_template() {
            return Ok(());
        }
        if self.symbol(self.canonical(old)).is_template() || !self.has_same_parameters(old, new) {
            return Ok(());
        }
        if let (Some(a), Some(b)) = (self.return_type(old), self.return_type(new)) {
            if self.flatten_type(a) != self.flatten_type(b) {
                return Err(SemaError::InvalidOverload { name });
            }
        }
        self.complete_forward(old, new, name)
    }

    fn redeclare_object(&mut self, old: SymbolId, new: SymbolId) -> SemaResult<()> {
        let name = self.symbol(new).name;
        if self.canonical(old) == self.canonical(new) {
            return Ok(());
        }
        let (old_ty, new_ty) = (&self.symbol(old).ty, &self.symbol(new).ty);
        if old_ty.is_typedef() && new_ty.is_typedef() {
            return if self.flatten_type(old_ty) == self.flatten_type(new_ty) {
                self.set_forward_target(new, old);
                Ok(())
            } else {
                Err(SemaError::InvalidOverload { name })
            };
        }
        let extern_flag = crate::ty::TypeFlags::EXTERN;
        if new_ty.flags.contains(extern_flag) {
            self.set_forward_target(new, old);
            Ok(())
        } else if old_ty.flags.contains(extern_flag) && self.symbol(old).forward_target.is_none() {
            self.set_forward_target(old, new);
            Ok(())
        } else {
            Err(SemaError::InvalidOverload { name })
        }
    }

    /// Link a forward declaration and a definition of the same entity.
    fn complete_forward(&mut self, old: SymbolId, new: SymbolId, name: Name) -> SemaResult<()> {
        match (self.is_forward_declaration(old), self.is_forward_declaration(new)) {
            (_, true) => {
                self.set_forward_target(new, old);
                Ok(())
            }
            (true, false) => {
                if self.symbol(old).forward_target.is_none() {
                    self.set_forward_target(old, new);
                    Ok(())
                } else {
                    Err(SemaError::InvalidOverload { name })
                }
            }
            (false, false) => Err(SemaError::InvalidOverload { name }),
        }
    }

    /// Point `symbol` back at the scope that now owns it.
    pub(crate) fn set_scope(&mut self, symbol: SymbolId, scope: Option<SymbolId>, in_template: bool) {
        let sym = self.symbol_mut(symbol);
        let previous = std::mem::replace(&mut sym.scope, scope);
        let previous_in_template = std::mem::replace(&mut sym.in_template, in_template);
        self.log.push(UndoRecord::SetScope {
            symbol,
            previous,
            previous_in_template,
        });
    }

    pub(crate) fn set_forward_target(&mut self, symbol: SymbolId, target: SymbolId) {
        let previous = self.symbol_mut(symbol).forward_target.replace(target);
        self.log.push(UndoRecord::SetForwardTarget { symbol, previous });
    }

    pub(crate) fn set_origin(&mut self, symbol: SymbolId, origin: InstanceOrigin) {
        let previous = self.symbol_mut(symbol).origin.replace(Box::new(origin));
        self.log.push(UndoRecord::SetOrigin { symbol, previous });
    }

    pub(crate) fn set_type(&mut self, symbol: SymbolId, ty: TypeDesc) {
        let previous = std::mem::replace(&mut self.symbol_mut(symbol).ty, ty);
        self.log.push(UndoRecord::SetType { symbol, previous });
    }

    // === Functions ===

    /// Append a parameter to a function.
    ///
    /// # Panics
    /// Templates take parameters only through `add_template_parameter`.
    pub fn add_parameter(&mut self, function: SymbolId, param: SymbolId) {
        let in_template = self.symbol(function).in_template;
        match &mut self.symbol_mut(function).kind {
            SymbolKind::Parameterized(data) => data.params.push(param),
            SymbolKind::Template(_) => {
                unsupported("template parameters are added with add_template_parameter")
            }
            _ => unsupported("add_parameter on a symbol without a parameter list"),
        }
        self.log.push(UndoRecord::AddParameter { function });
        self.set_scope(param, Some(function), in_template);
    }

    /// Append an unnamed parameter of type `ty`.
    pub fn add_parameter_type(&mut self, function: SymbolId, ty: TypeDesc) -> SymbolId {
        let param = self.new_symbol_with_type(Name::EMPTY, ty);
        self.add_parameter(function, param);
        param
    }

    pub fn set_varargs(&mut self, function: SymbolId, varargs: bool) {
        let Some(data) = self.symbol_mut(function).as_parameterized_mut() else {
            unsupported("set_varargs on a symbol without a parameter list")
        };
        let previous = std::mem::replace(&mut data.varargs, varargs);
        self.log.push(UndoRecord::SetVarargs { function, previous });
    }

    /// A descriptor that names nothing is `BadTypeInfo`.
    pub fn set_return_type(&mut self, function: SymbolId, ty: TypeDesc) -> SemaResult<()> {
        if !ty.is_valid() {
            return Err(SemaError::BadTypeInfo {
                name: self.symbol(function).name,
            });
        }
        let Some(data) = self.symbol_mut(function).as_parameterized_mut() else {
            unsupported("set_return_type on a symbol without a parameter list")
        };
        let previous = data.return_type.replace(ty);
        self.log.push(UndoRecord::SetReturnType { function, previous });
        Ok(())
    }

    // === Classes ===

    /// Add a base class.
    ///
    /// The parent may be a class, a typedef of one, a type template
    /// parameter or a dependent template-id placeholder.
    pub fn add_parent(
        &mut self,
        class: SymbolId,
        parent: SymbolId,
        access: Access,
        is_virtual: bool,
    ) -> SemaResult<()> {
        let target = self.class_of(parent);
        let target_sym = self.symbol(target);
        let usable = target_sym.ty.kind.is_class()
            || target_sym.is_template_parameter()
            || matches!(target_sym.kind, SymbolKind::DeferredInstance(_));
        if !usable {
            return Err(SemaError::BadTypeInfo {
                name: self.symbol(parent).name,
            });
        }
        let Some(data) = self.symbol_mut(class).as_derivable_mut() else {
            unsupported("add_parent on a symbol that cannot have bases")
        };
        data.parents.push(ParentLink {
            parent: target,
            access,
            is_virtual,
        });
        self.log.push(UndoRecord::AddParent { class });
        Ok(())
    }

    /// Replace the parent of an existing base link. Used when a deferred
    /// base is resolved.
    pub(crate) fn set_parent(&mut self, class: SymbolId, index: usize, parent: SymbolId) {
        let Some(link) = self
            .symbol_mut(class)
            .as_derivable_mut()
            .and_then(|d| d.parents.get_mut(index))
        else {
            crate::error::internal_invariant("deferred base refers to a missing base link")
        };
        let previous = std::mem::replace(&mut link.parent, parent);
        self.log.push(UndoRecord::SetParent {
            class,
            index,
            previous,
        });
    }

    /// Register a constructor. Constructors not marked `explicit` take part
    /// in user-defined conversions.
    pub fn add_constructor(&mut self, class: SymbolId, constructor: SymbolId) {
        if self.symbol(constructor).as_parameterized().is_none() {
            unsupported("a constructor must be a function symbol");
        }
        let Some(data) = self.symbol_mut(class).as_derivable_mut() else {
            unsupported("add_constructor on a non-class symbol")
        };
        data.constructors.push(constructor);
        self.log.push(UndoRecord::AddConstructor { class });
        let in_template = self.symbol(constructor).in_template;
        self.set_scope(constructor, Some(class), in_template);
    }

    /// Register a conversion function; its return type is the conversion's
    /// target type.
    pub fn add_conversion(&mut self, class: SymbolId, conversion: SymbolId) {
        if self.symbol(conversion).as_parameterized().is_none() {
            unsupported("a conversion operator must be a function symbol");
        }
        let Some(data) = self.symbol_mut(class).as_derivable_mut() else {
            unsupported("add_conversion on a non-class symbol")
        };
        data.conversions.push(conversion);
        self.log.push(UndoRecord::AddConversion { class });
        let in_template = self.symbol(conversion).in_template;
        self.set_scope(conversion, Some(class), in_template);
    }

    // === Templates ===

    /// Append a template parameter.
    pub fn add_template_parameter(&mut self, template: SymbolId, param: SymbolId) -> SemaResult<()> {
        if !self.symbol(param).is_template_parameter() {
            return Err(SemaError::BadTypeInfo {
                name: self.symbol(param).name,
            });
        }
        let Some(data) = self.symbol_mut(template).as_template_mut() else {
            unsupported("add_template_parameter on a non-template symbol")
        };
        data.params.push(param);
        self.log.push(UndoRecord::AddTemplateParameter { template });
        self.set_scope(param, Some(template), true);
        Ok(())
    }

    /// Register a partial specialization created by `new_specialization`.
    pub fn add_template_specialization(
        &mut self,
        primary: SymbolId,
        specialization: SymbolId,
    ) -> SemaResult<()> {
        let primary_sym = self.symbol(primary);
        let Some(primary_data) = primary_sym.as_template() else {
            unsupported("add_template_specialization on a non-template symbol")
        };
        let arity = primary_data.params.len();
        let (name, scope) = (primary_sym.name, primary_sym.scope);

        let Some(spec_args) = self
            .symbol(specialization)
            .as_template()
            .and_then(|t| t.spec_args.as_ref())
        else {
            return Err(SemaError::BadTypeInfo {
                name: self.symbol(specialization).name,
            });
        };
        if spec_args.len() != arity {
            return Err(SemaError::BadTemplateArgument {
                template: name,
                index: spec_args.len().min(arity),
            });
        }

        let in_template = self.symbol(specialization).in_template;
        self.set_scope(specialization, scope, in_template);
        let previous = self
            .symbol_mut(specialization)
            .as_template_mut()
            .and_then(|data| data.primary.replace(primary));
        self.log.push(UndoRecord::SetPrimary {
            specialization,
            previous,
        });
        if let Some(data) = self.symbol_mut(primary).as_template_mut() {
            data.specializations.push(specialization);
        }
        self.log.push(UndoRecord::AddSpecialization { template: primary });
        Ok(())
    }

    /// Let an out-of-line member definition refer to template parameter
    /// `param` as `name`.
    pub fn map_definition_parameter(&mut self, template: SymbolId, name: Name, param: SymbolId) {
        let Some(data) = self.symbol_mut(template).as_template_mut() else {
            unsupported("map_definition_parameter on a non-template symbol")
        };
        let previous = data.definition_params.insert(name, param);
        self.log.push(UndoRecord::MapDefinitionParameter {
            template,
            name,
            previous,
        });
    }

    // === Namespaces ===

    /// Follow namespace aliases to the namespace they name.
    pub(crate) fn resolve_namespace_alias(&self, mut id: SymbolId) -> SymbolId {
        for _ in 0..self.symbols.len() {
            let sym = self.symbol(self.canonical(id));
            match sym.ty.link {
                Some(target) if sym.ty.kind == BaseKind::Namespace && target != id => id = target,
                _ => return self.canonical(id),
            }
        }
        id
    }

    /// `using namespace namespace;` in `scope`.
    pub fn add_using_directive(&mut self, scope: SymbolId, namespace: SymbolId) -> SemaResult<()> {
        let target = self.resolve_namespace_alias(namespace);
        if self.symbol(target).ty.kind != BaseKind::Namespace {
            return Err(SemaError::BadTypeInfo {
                name: self.symbol(namespace).name,
            });
        }
        let Some(container) = self.symbol_mut(scope).container_mut() else {
            unsupported("add_using_directive on a symbol that holds no members")
        };
        container.usings.push(UsingDirective {
            scope,
            namespace: target,
        });
        self.log.push(UndoRecord::AddUsingDirective { scope });
        Ok(())
    }

    /// `namespace name = target;` in `scope`.
    pub fn add_namespace_alias(
        &mut self,
        scope: SymbolId,
        name: Name,
        target: SymbolId,
    ) -> SemaResult<SymbolId> {
        let resolved = self.resolve_namespace_alias(target);
        if self.symbol(resolved).ty.kind != BaseKind::Namespace {
            return Err(SemaError::BadTypeInfo {
                name: self.symbol(target).name,
            });
        }
        let alias = self.new_container_symbol(name, BaseKind::Namespace);
        self.symbol_mut(alias).ty.link = Some(resolved);
        self.add_symbol(scope, alias)?;
        Ok(alias)
    }
}
