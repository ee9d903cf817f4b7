//! Kind-specific symbol payloads and capability traits.

use cxs_ir::Name;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::SymbolId;
use crate::ty::TypeDesc;

/// Member access. Ordered from least to most restrictive.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

impl Access {
    /// Access of a member seen through a base-class link with access
    /// `through`.
    #[inline]
    #[must_use]
    pub fn through(self, through: Access) -> Access {
        self.max(through)
    }
}

/// `namespace` nominated by a using-directive in `scope`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct UsingDirective {
    pub scope: SymbolId,
    pub namespace: SymbolId,
}

/// A base-class link.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ParentLink {
    pub parent: SymbolId,
    pub access: Access,
    pub is_virtual: bool,
}

/// Declared members of a scope.
#[derive(Clone, Debug, Default)]
pub struct ContainerData {
    /// Name to declaration(s); several entries form an overload set or a
    /// tag/object pair.
    pub(crate) members: FxHashMap<Name, SmallVec<[SymbolId; 2]>>,
    /// Every member in insertion order.
    pub(crate) contents: Vec<SymbolId>,
    pub(crate) usings: Vec<UsingDirective>,
}

impl ContainerData {
    /// Declarations named `name`, in insertion order.
    pub fn get(&self, name: Name) -> &[SymbolId] {
        self.members.get(&name).map_or(&[][..], |ids| ids.as_slice())
    }

    /// All members in insertion order.
    pub fn contents(&self) -> &[SymbolId] {
        &self.contents
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub(crate) fn insert(&mut self, name: Name, symbol: SymbolId) {
        self.members.entry(name).or_default().push(symbol);
        self.contents.push(symbol);
    }

    /// Undo the most recent `insert` of `symbol` under `name`.
    pub(crate) fn remove(&mut self, name: Name, symbol: SymbolId) {
        if let Some(ids) = self.members.get_mut(&name) {
            if let Some(pos) = ids.iter().rposition(|&id| id == symbol) {
                ids.remove(pos);
            }
            if ids.is_empty() {
                self.members.remove(&name);
            }
        }
        if let Some(pos) = self.contents.iter().rposition(|&id| id == symbol) {
            self.contents.remove(pos);
        }
    }
}

/// A class: members plus base classes and the functions used for
/// user-defined conversions.
#[derive(Clone, Debug, Default)]
pub struct DerivableData {
    pub container: ContainerData,
    pub(crate) parents: Vec<ParentLink>,
    pub(crate) constructors: Vec<SymbolId>,
    pub(crate) conversions: Vec<SymbolId>,
}

impl DerivableData {
    pub fn constructors(&self) -> &[SymbolId] {
        &self.constructors
    }

    pub fn conversions(&self) -> &[SymbolId] {
        &self.conversions
    }
}

/// A function: ordered parameters, return type, and the block scope of its
/// body.
#[derive(Clone, Debug, Default)]
pub struct ParameterizedData {
    pub container: ContainerData,
    pub(crate) params: Vec<SymbolId>,
    pub return_type: Option<TypeDesc>,
    pub varargs: bool,
}

/// One cached instantiation: argument tuple (defaults filled in) to the
/// instantiated symbol.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instantiation {
    pub args: Vec<TypeDesc>,
    pub symbol: SymbolId,
}

/// `template<> ...` for one exact argument tuple.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExplicitSpecialization {
    pub args: Vec<TypeDesc>,
    pub symbol: SymbolId,
}

/// A template: its parameters, the templated declaration (held as the
/// member of the same name), specializations and instantiations.
#[derive(Clone, Debug, Default)]
pub struct TemplateData {
    pub container: ContainerData,
    pub(crate) params: Vec<SymbolId>,
    /// Pattern arguments of a partial specialization.
    pub spec_args: Option<Vec<TypeDesc>>,
    /// Primary template of a partial specialization.
    pub primary: Option<SymbolId>,
    pub(crate) specializations: Vec<SymbolId>,
    pub(crate) explicit: Vec<ExplicitSpecialization>,
    pub(crate) instances: Vec<Instantiation>,
    /// Placeholders for uses with dependent arguments.
    pub(crate) deferred: Vec<Instantiation>,
    /// Parameter names used by out-of-line member definitions.
    pub(crate) definition_params: FxHashMap<Name, SymbolId>,
}

impl TemplateData {
    pub fn specializations(&self) -> &[SymbolId] {
        &self.specializations
    }

    pub fn explicit_specializations(&self) -> &[ExplicitSpecialization] {
        &self.explicit
    }

    pub fn instances(&self) -> &[Instantiation] {
        &self.instances
    }

    pub(crate) fn cached(&self, args: &[TypeDesc]) -> Option<SymbolId> {
        self.instances
            .iter()
            .find(|inst| inst.args == args)
            .map(|inst| inst.symbol)
    }
}

/// Use of a template with arguments that depend on template parameters.
#[derive(Clone, Debug)]
pub struct DeferredInstanceData {
    pub template: SymbolId,
    pub args: Vec<TypeDesc>,
}

/// Template and arguments an instance was produced from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceOrigin {
    pub template: SymbolId,
    pub args: Vec<TypeDesc>,
}

/// Symbols with an ordered parameter list.
pub trait HasParameters {
    fn parameters(&self) -> &[SymbolId];
}

/// Symbols with base classes.
pub trait HasParents {
    fn parents(&self) -> &[ParentLink];
}

/// Scopes that can hold using-directives.
pub trait HasUsingDirectives {
    fn using_directives(&self) -> &[UsingDirective];
}

impl HasParameters for ParameterizedData {
    fn parameters(&self) -> &[SymbolId] {
        &self.params
    }
}

impl HasParameters for TemplateData {
    fn parameters(&self) -> &[SymbolId] {
        &self.params
    }
}

impl HasParents for DerivableData {
    fn parents(&self) -> &[ParentLink] {
        &self.parents
    }
}

impl HasUsingDirectives for ContainerData {
    fn using_directives(&self) -> &[UsingDirective] {
        &self.usings
    }
}
