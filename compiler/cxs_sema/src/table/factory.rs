//! Symbol construction.
//!
//! Factories only allocate: a new symbol belongs to no scope until it is
//! added with `add_symbol` (or a dedicated mutator). Construction never
//! fails, and needs no undo record because rollback truncates the arena.

use cxs_ir::{AstLink, Name};

use super::SymbolTable;
use crate::log::UndoRecord;
use crate::symbol::{
    Access, ContainerData, DerivableData, ParameterizedData, Symbol, SymbolId, SymbolKind,
    TemplateData,
};
use crate::ty::{BaseKind, TypeDesc};

impl SymbolTable {
    /// Basic symbol (variable, typedef, enumerator) of the given kind.
    pub fn new_symbol(&mut self, name: Name, kind: BaseKind) -> SymbolId {
        self.new_symbol_with_type(name, TypeDesc::new(kind))
    }

    /// Basic symbol with a full type descriptor.
    pub fn new_symbol_with_type(&mut self, name: Name, ty: TypeDesc) -> SymbolId {
        self.push_symbol(Symbol::new(name, ty, SymbolKind::Basic))
    }

    /// Scope without bases: namespace, enumeration, block, linkage block.
    pub fn new_container_symbol(&mut self, name: Name, kind: BaseKind) -> SymbolId {
        self.push_symbol(Symbol::new(
            name,
            TypeDesc::new(kind),
            SymbolKind::Container(ContainerData::default()),
        ))
    }

    /// Class, struct or union.
    pub fn new_derivable_container_symbol(&mut self, name: Name, kind: BaseKind) -> SymbolId {
        self.push_symbol(Symbol::new(
            name,
            TypeDesc::new(kind),
            SymbolKind::Derivable(Box::default()),
        ))
    }

    /// Function.
    pub fn new_parameterized_symbol(&mut self, name: Name, kind: BaseKind) -> SymbolId {
        self.push_symbol(Symbol::new(
            name,
            TypeDesc::new(kind),
            SymbolKind::Parameterized(Box::default()),
        ))
    }

    /// Template. Its parameters are added with `add_template_parameter` and
    /// the templated declaration with `add_symbol(template, ..)` under the
    /// same name.
    pub fn new_template_symbol(&mut self, name: Name) -> SymbolId {
        self.push_symbol(Symbol::new(
            name,
            TypeDesc::new(BaseKind::Template),
            SymbolKind::Template(Box::default()),
        ))
    }

    /// Type or non-type template parameter.
    ///
    /// `param_kind` is `TypeName` for `typename T`, or the declared type of
    /// a non-type parameter (`Int` for `int N`).
    pub fn new_template_parameter(&mut self, name: Name, param_kind: BaseKind) -> SymbolId {
        self.new_symbol_with_type(name, TypeDesc::template_parameter(param_kind))
    }

    /// Template template parameter. Its own parameters are added with
    /// `add_template_parameter`.
    pub fn new_template_template_parameter(&mut self, name: Name) -> SymbolId {
        self.push_symbol(Symbol::new(
            name,
            TypeDesc::template_parameter(BaseKind::Template),
            SymbolKind::Template(Box::default()),
        ))
    }

    /// Partial specialization matching the pattern `args`, registered on its
    /// primary with `add_template_specialization`.
    pub fn new_specialization(&mut self, name: Name, args: Vec<TypeDesc>) -> SymbolId {
        let data = TemplateData {
            spec_args: Some(args),
            ..TemplateData::default()
        };
        self.push_symbol(Symbol::new(
            name,
            TypeDesc::new(BaseKind::Template),
            SymbolKind::Template(Box::new(data)),
        ))
    }

    /// Copy a symbol's own collections into a fresh, unparented symbol.
    ///
    /// Parameter lists, member maps, base lists and instantiation caches are
    /// copied, not shared; the symbols they refer to are the same. The clone
    /// has no containing scope until it is added somewhere.
    pub fn clone_symbol(&mut self, id: SymbolId) -> SymbolId {
        let mut copy = self.symbol(id).clone();
        copy.scope = None;
        self.push_symbol(copy)
    }

    pub fn set_ast_link(&mut self, id: SymbolId, link: AstLink) {
        self.symbol_mut(id).ast_link = Some(link);
    }

    /// Declared access of a class member.
    pub fn set_access(&mut self, id: SymbolId, access: Access) {
        let previous = std::mem::replace(&mut self.symbol_mut(id).access, access);
        self.log.push(UndoRecord::SetAccess {
            symbol: id,
            previous,
        });
    }

    /// Allocate an instance shell: same name, type and kind as `original`
    /// but with every collection empty.
    pub(crate) fn new_shell(&mut self, original: SymbolId) -> SymbolId {
        let sym = self.symbol(original);
        let kind = match &sym.kind {
            SymbolKind::Basic | SymbolKind::DeferredInstance(_) => SymbolKind::Basic,
            SymbolKind::Container(_) => SymbolKind::Container(ContainerData::default()),
            SymbolKind::Derivable(_) => SymbolKind::Derivable(Box::<DerivableData>::default()),
            SymbolKind::Parameterized(p) => SymbolKind::Parameterized(Box::new(ParameterizedData {
                varargs: p.varargs,
                ..ParameterizedData::default()
            })),
            SymbolKind::Template(_) => SymbolKind::Template(Box::<TemplateData>::default()),
        };
        let mut shell = Symbol::new(sym.name, sym.ty.clone(), kind);
        shell.access = sym.access;
        shell.ast_link = sym.ast_link;
        self.push_symbol(shell)
    }
}
