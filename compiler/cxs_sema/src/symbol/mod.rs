//! The symbol graph.
//!
//! Symbols live in an arena owned by the `SymbolTable` and refer to each
//! other through `SymbolId` handles: containing-scope back-references,
//! base-class links and template self-references are all plain indices, so
//! cyclic graphs need no shared ownership. Traversals that can meet a cycle
//! carry their own visited sets.
//!
//! # Symbol kinds
//!
//! One tagged variant replaces a deep class hierarchy:
//!
//! | Kind | Adds | Used for |
//! |------|------|----------|
//! | `Basic` | nothing | variables, typedefs, enumerators, type parameters |
//! | `Container` | member map, using-directives | namespaces, enums, blocks |
//! | `Derivable` | base classes, constructors, conversions | classes |
//! | `Parameterized` | parameters, return type | functions |
//! | `Template` | template parameters, instances, specializations | templates |
//! | `DeferredInstance` | template + dependent arguments | `S<T>` inside a template |
//!
//! The capability traits [`HasParameters`], [`HasParents`] and
//! [`HasUsingDirectives`] are implemented only by the kind data that has the
//! capability.

mod data;

pub use data::{
    Access, ContainerData, DeferredInstanceData, DerivableData, ExplicitSpecialization,
    HasParameters, HasParents, HasUsingDirectives, InstanceOrigin, Instantiation, ParameterizedData,
    ParentLink, TemplateData, UsingDirective,
};

use std::fmt;

use cxs_ir::{AstLink, Name};

use crate::ty::{BaseKind, TypeDesc};

/// Handle to a symbol in the table's arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct SymbolId(u32);

impl SymbolId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        SymbolId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

/// Kind-specific payload.
#[derive(Clone, Debug)]
pub enum SymbolKind {
    Basic,
    Container(ContainerData),
    Derivable(Box<DerivableData>),
    Parameterized(Box<ParameterizedData>),
    Template(Box<TemplateData>),
    DeferredInstance(Box<DeferredInstanceData>),
}

/// A declaration known to the engine.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: Name,
    /// Containing scope. `None` for the global scope and for clones that
    /// have not been re-parented yet.
    pub scope: Option<SymbolId>,
    pub ty: TypeDesc,
    /// Declared inside a template (and so possibly dependent).
    pub in_template: bool,
    /// Declared access inside its class.
    pub access: Access,
    /// Completed declaration of a forward-declared class or function.
    pub forward_target: Option<SymbolId>,
    /// Target of a using-declaration alias.
    pub alias_of: Option<SymbolId>,
    /// Template and arguments this symbol was instantiated from.
    pub origin: Option<Box<InstanceOrigin>>,
    pub ast_link: Option<AstLink>,
    pub kind: SymbolKind,
}

impl Symbol {
    pub(crate) fn new(name: Name, ty: TypeDesc, kind: SymbolKind) -> Self {
        Symbol {
            name,
            scope: None,
            ty,
            in_template: false,
            access: Access::Public,
            forward_target: None,
            alias_of: None,
            origin: None,
            ast_link: None,
            kind,
        }
    }

    #[inline]
    pub fn is_type(&self, kind: BaseKind) -> bool {
        self.ty.kind == kind
    }

    #[inline]
    pub fn is_forward(&self) -> bool {
        self.ty.is_forward()
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        self.ty.kind == BaseKind::Function
    }

    #[inline]
    pub fn is_template(&self) -> bool {
        matches!(self.kind, SymbolKind::Template(_))
    }

    /// A template parameter of any sort.
    #[inline]
    pub fn is_template_parameter(&self) -> bool {
        self.ty.kind == BaseKind::TemplateParameter
    }

    /// Static member or enumerator: the same entity no matter which
    /// inheritance path reaches it.
    #[inline]
    pub fn is_shared_member(&self) -> bool {
        self.ty.is_static() || self.ty.kind == BaseKind::Enumerator
    }

    /// Member map, for every kind that has one.
    pub fn container(&self) -> Option<&ContainerData> {
        match &self.kind {
            SymbolKind::Container(c) => Some(c),
            SymbolKind::Derivable(d) => Some(&d.container),
            SymbolKind::Parameterized(p) => Some(&p.container),
            SymbolKind::Template(t) => Some(&t.container),
            SymbolKind::Basic | SymbolKind::DeferredInstance(_) => None,
        }
    }

    pub(crate) fn container_mut(&mut self) -> Option<&mut ContainerData> {
        match &mut self.kind {
            SymbolKind::Container(c) => Some(c),
            SymbolKind::Derivable(d) => Some(&mut d.container),
            SymbolKind::Parameterized(p) => Some(&mut p.container),
            SymbolKind::Template(t) => Some(&mut t.container),
            SymbolKind::Basic | SymbolKind::DeferredInstance(_) => None,
        }
    }

    pub fn as_derivable(&self) -> Option<&DerivableData> {
        match &self.kind {
            SymbolKind::Derivable(d) => Some(d),
            _ => None,
        }
    }

    pub(crate) fn as_derivable_mut(&mut self) -> Option<&mut DerivableData> {
        match &mut self.kind {
            SymbolKind::Derivable(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_parameterized(&self) -> Option<&ParameterizedData> {
        match &self.kind {
            SymbolKind::Parameterized(p) => Some(p),
            _ => None,
        }
    }

    pub(crate) fn as_parameterized_mut(&mut self) -> Option<&mut ParameterizedData> {
        match &mut self.kind {
            SymbolKind::Parameterized(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_template(&self) -> Option<&TemplateData> {
        match &self.kind {
            SymbolKind::Template(t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn as_template_mut(&mut self) -> Option<&mut TemplateData> {
        match &mut self.kind {
            SymbolKind::Template(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_deferred(&self) -> Option<&DeferredInstanceData> {
        match &self.kind {
            SymbolKind::DeferredInstance(d) => Some(d),
            _ => None,
        }
    }

    /// Parameters of a function, or template parameters of a template.
    pub fn parameters(&self) -> &[SymbolId] {
        match &self.kind {
            SymbolKind::Parameterized(p) => p.parameters(),
            SymbolKind::Template(t) => t.parameters(),
            _ => &[],
        }
    }

    /// Base-class links of a class.
    pub fn parents(&self) -> &[ParentLink] {
        match &self.kind {
            SymbolKind::Derivable(d) => d.parents(),
            _ => &[],
        }
    }

    /// Using-directives introduced in this scope.
    pub fn using_directives(&self) -> &[UsingDirective] {
        self.container()
            .map_or(&[][..], HasUsingDirectives::using_directives)
    }

    /// Declared return type of a function.
    pub fn return_type(&self) -> Option<&TypeDesc> {
        self.as_parameterized().and_then(|p| p.return_type.as_ref())
    }
}

#[cfg(test)]
mod tests;
