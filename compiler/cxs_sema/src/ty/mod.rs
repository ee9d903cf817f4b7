//! Type descriptors.
//!
//! A `TypeDesc` captures a declaration's type as plain data: a base kind,
//! declaration flags, a chain of pointer-like operators, an optional link to
//! the symbol that names the type, and an optional default value.
//!
//! # Pointer-operator order
//!
//! `ptr_ops[0]` is the top-level operator, the one applied last when the
//! type is built from its base. `int *const &` is stored as
//! `[Reference, Pointer(const)]`, so stripping a leading reference means
//! removing index 0.
//!
//! # Equality
//!
//! Descriptors compare structurally. The default value is declaration
//! decoration and takes no part in equality or hashing, so `f(int = 0)` and
//! `f(int)` have equal parameter types and an argument tuple with or without
//! defaults filled in keys the same instantiation.

mod flags;

pub use flags::{Cv, TypeFlags};

use std::hash::{Hash, Hasher};

use cxs_ir::Name;
use smallvec::SmallVec;

use crate::SymbolId;

/// The base kind of a type, and of the symbol that carries it.
///
/// Symbols are classified by the kind of their own descriptor: a class
/// symbol has kind `Class`, a variable of that class has kind `Type` with a
/// link to the class symbol.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BaseKind {
    /// No type information yet.
    Undef,
    /// Named type; `link` names the declaring symbol.
    Type,
    Class,
    Struct,
    Union,
    Enumeration,
    Function,
    Bool,
    Char,
    WChar,
    Int,
    Float,
    Double,
    Void,
    Enumerator,
    /// Compound-statement scope.
    Block,
    /// Template symbol.
    Template,
    /// Template parameter; `param_kind` says which sort.
    TemplateParameter,
    /// `typename`/`class` template parameter sort.
    TypeName,
    Namespace,
    /// `extern "C"` linkage block.
    Linkage,
}

impl BaseKind {
    /// `class`, `struct` or `union`.
    #[inline]
    pub const fn is_class(self) -> bool {
        matches!(self, BaseKind::Class | BaseKind::Struct | BaseKind::Union)
    }

    /// A tag name: class, struct, union or enumeration.
    #[inline]
    pub const fn is_class_or_enum(self) -> bool {
        self.is_class() || matches!(self, BaseKind::Enumeration)
    }

    /// Builtin arithmetic type.
    #[inline]
    pub const fn is_arithmetic(self) -> bool {
        self.is_integral() || self.is_floating()
    }

    /// `bool`, `char`, `wchar_t` or `int`.
    #[inline]
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            BaseKind::Bool | BaseKind::Char | BaseKind::WChar | BaseKind::Int
        )
    }

    /// `float` or `double`.
    #[inline]
    pub const fn is_floating(self) -> bool {
        matches!(self, BaseKind::Float | BaseKind::Double)
    }

    /// Builtin fundamental type, `void` included.
    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.is_arithmetic() || matches!(self, BaseKind::Void)
    }

    /// Kinds whose symbols open a scope that can be named in a
    /// nested-name-specifier.
    #[inline]
    pub const fn is_scope(self) -> bool {
        self.is_class_or_enum() || matches!(self, BaseKind::Namespace | BaseKind::Template)
    }

    /// C++ spelling of builtin kinds and class keys.
    pub const fn keyword(self) -> &'static str {
        match self {
            BaseKind::Undef => "<undef>",
            BaseKind::Type => "<type>",
            BaseKind::Class => "class",
            BaseKind::Struct => "struct",
            BaseKind::Union => "union",
            BaseKind::Enumeration => "enum",
            BaseKind::Function => "<function>",
            BaseKind::Bool => "bool",
            BaseKind::Char => "char",
            BaseKind::WChar => "wchar_t",
            BaseKind::Int => "int",
            BaseKind::Float => "float",
            BaseKind::Double => "double",
            BaseKind::Void => "void",
            BaseKind::Enumerator => "<enumerator>",
            BaseKind::Block => "<block>",
            BaseKind::Template => "template",
            BaseKind::TemplateParameter => "<template parameter>",
            BaseKind::TypeName => "typename",
            BaseKind::Namespace => "namespace",
            BaseKind::Linkage => "extern",
        }
    }
}

/// Kind of a pointer-like operator.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PtrOpKind {
    Pointer,
    Reference,
    Array,
    /// `C::*`; `PtrOp::member_of` names `C`.
    MemberPointer,
}

/// One level of a pointer/reference/array/member-pointer chain.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct PtrOp {
    pub kind: PtrOpKind,
    pub cv: Cv,
    pub member_of: Option<SymbolId>,
}

impl PtrOp {
    pub const fn new(kind: PtrOpKind) -> Self {
        PtrOp {
            kind,
            cv: Cv::empty(),
            member_of: None,
        }
    }

    #[must_use]
    pub const fn with_cv(mut self, cv: Cv) -> Self {
        self.cv = cv;
        self
    }

    #[inline]
    pub fn is_const(&self) -> bool {
        self.cv.contains(Cv::CONST)
    }

    #[inline]
    pub fn is_volatile(&self) -> bool {
        self.cv.contains(Cv::VOLATILE)
    }
}

/// Pointer-operator chain; most types have at most two levels.
pub type PtrOps = SmallVec<[PtrOp; 2]>;

/// Structural description of a declaration's type.
#[derive(Clone, Debug)]
pub struct TypeDesc {
    pub kind: BaseKind,
    pub flags: TypeFlags,
    /// Top-level operator first.
    pub ptr_ops: PtrOps,
    /// Symbol naming the type (class, typedef, template parameter, ...).
    pub link: Option<SymbolId>,
    /// Arguments of a template-id whose template is `link`.
    pub template_args: Vec<TypeDesc>,
    /// For `TemplateParameter` descriptors: `TypeName`, `Template`, or the
    /// declared type of a non-type parameter.
    pub param_kind: Option<BaseKind>,
    /// Spelling of a constant (non-type template argument, default value).
    /// Constants are compared by spelling, never evaluated.
    pub constant: Option<Name>,
    pub default: Option<Box<TypeDesc>>,
}

impl TypeDesc {
    /// Descriptor of the given base kind with no qualifiers.
    pub fn new(kind: BaseKind) -> Self {
        TypeDesc {
            kind,
            flags: TypeFlags::empty(),
            ptr_ops: PtrOps::new(),
            link: None,
            template_args: Vec::new(),
            param_kind: None,
            constant: None,
            default: None,
        }
    }

    /// Named type referring to `symbol`.
    pub fn named(symbol: SymbolId) -> Self {
        let mut ty = TypeDesc::new(BaseKind::Type);
        ty.link = Some(symbol);
        ty
    }

    /// Template-id `template<args...>`.
    pub fn template_id(template: SymbolId, args: Vec<TypeDesc>) -> Self {
        let mut ty = TypeDesc::named(template);
        ty.template_args = args;
        ty
    }

    /// A constant of the given kind spelled `text` (e.g. `3` as a non-type
    /// template argument).
    pub fn constant(kind: BaseKind, text: Name) -> Self {
        let mut ty = TypeDesc::new(kind);
        ty.constant = Some(text);
        ty
    }

    /// Template parameter descriptor of the given sort.
    pub fn template_parameter(param_kind: BaseKind) -> Self {
        let mut ty = TypeDesc::new(BaseKind::TemplateParameter);
        ty.param_kind = Some(param_kind);
        ty
    }

    #[must_use]
    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: TypeDesc) -> Self {
        self.default = Some(Box::new(default));
        self
    }

    /// Wrap in a new top-level operator.
    #[must_use]
    pub fn with_ptr_op(mut self, op: PtrOp) -> Self {
        self.ptr_ops.insert(0, op);
        self
    }

    /// Pointer to this type.
    #[must_use]
    pub fn pointer(self) -> Self {
        self.with_ptr_op(PtrOp::new(PtrOpKind::Pointer))
    }

    /// Reference to this type.
    #[must_use]
    pub fn reference(self) -> Self {
        self.with_ptr_op(PtrOp::new(PtrOpKind::Reference))
    }

    /// Array of this type.
    #[must_use]
    pub fn array(self) -> Self {
        self.with_ptr_op(PtrOp::new(PtrOpKind::Array))
    }

    /// Pointer to member of `class` of this type.
    #[must_use]
    pub fn member_pointer(self, class: SymbolId) -> Self {
        let mut op = PtrOp::new(PtrOpKind::MemberPointer);
        op.member_of = Some(class);
        self.with_ptr_op(op)
    }

    /// Add cv-qualifiers at the top level.
    #[must_use]
    pub fn with_top_cv(mut self, cv: Cv) -> Self {
        match self.ptr_ops.first_mut() {
            Some(op) => op.cv |= cv,
            None => self.flags |= cv.as_flags(),
        }
        self
    }

    #[inline]
    pub fn is_type(&self, kind: BaseKind) -> bool {
        self.kind == kind
    }

    #[inline]
    pub fn has_ptr_ops(&self) -> bool {
        !self.ptr_ops.is_empty()
    }

    /// `void` itself; a lone `void` parameter or argument means none.
    #[inline]
    pub fn is_plain_void(&self) -> bool {
        self.kind == BaseKind::Void && !self.has_ptr_ops()
    }

    #[inline]
    pub fn is_forward(&self) -> bool {
        self.flags.contains(TypeFlags::FORWARD)
    }

    #[inline]
    pub fn is_typedef(&self) -> bool {
        self.flags.contains(TypeFlags::TYPEDEF)
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(TypeFlags::STATIC)
    }

    /// True if the top-level operator is a reference.
    pub fn is_reference(&self) -> bool {
        self.ptr_ops
            .first()
            .is_some_and(|op| op.kind == PtrOpKind::Reference)
    }

    /// Remove a top-level reference. Returns whether one was present.
    pub fn strip_reference(&mut self) -> bool {
        if self.is_reference() {
            self.ptr_ops.remove(0);
            true
        } else {
            false
        }
    }

    /// Array-to-pointer and function-to-pointer decay.
    pub fn decay(&mut self) {
        match self.ptr_ops.first_mut() {
            Some(op) if op.kind == PtrOpKind::Array => *op = PtrOp::new(PtrOpKind::Pointer),
            None if self.kind == BaseKind::Function => {
                self.ptr_ops.insert(0, PtrOp::new(PtrOpKind::Pointer));
            }
            _ => {}
        }
    }

    /// cv-qualifiers at the top level.
    pub fn top_cv(&self) -> Cv {
        match self.ptr_ops.first() {
            Some(op) => op.cv,
            None => self.base_cv(),
        }
    }

    /// cv-qualifiers of the base type (the innermost level).
    pub fn base_cv(&self) -> Cv {
        Cv::from_flags(self.flags)
    }

    /// Drop top-level cv-qualifiers.
    pub fn strip_top_cv(&mut self) {
        match self.ptr_ops.first_mut() {
            Some(op) => op.cv = Cv::empty(),
            None => self.flags.remove(TypeFlags::CV),
        }
    }

    /// Keep only the flags that make up the type: qualifiers and size/sign
    /// modifiers. Storage and declaration specifiers are dropped.
    pub fn strip_specifiers(&mut self) {
        self.flags &= TypeFlags::CV | TypeFlags::SIZE_SIGN;
    }

    /// Same operator kinds at every level, qualifiers ignored.
    pub fn same_ptr_shape(&self, other: &TypeDesc) -> bool {
        self.ptr_ops.len() == other.ptr_ops.len()
            && self
                .ptr_ops
                .iter()
                .zip(&other.ptr_ops)
                .all(|(a, b)| a.kind == b.kind && a.member_of == b.member_of)
    }

    /// Same base type: kind, link, size/sign modifiers, template arguments
    /// and constant. Qualifiers and pointer operators are ignored.
    pub fn same_base(&self, other: &TypeDesc) -> bool {
        self.kind == other.kind
            && self.link == other.link
            && self.flags.intersection(TypeFlags::SIZE_SIGN)
                == other.flags.intersection(TypeFlags::SIZE_SIGN)
            && self.template_args == other.template_args
            && self.constant == other.constant
    }

    /// A `Type` descriptor must name a symbol; a template parameter must say
    /// which sort it is.
    pub fn is_valid(&self) -> bool {
        match self.kind {
            BaseKind::Type => self.link.is_some(),
            BaseKind::TemplateParameter => self.param_kind.is_some(),
            _ => true,
        }
    }

    /// Replace this use-site's base with `replacement`, keeping the
    /// use-site's operators outermost.
    ///
    /// Used for typedef flattening and template-parameter substitution:
    /// with `T = int *`, the use `const T &` becomes `int *const &`.
    #[must_use]
    pub fn substitute_base(&self, replacement: &TypeDesc) -> TypeDesc {
        let mut result = replacement.clone();
        result.flags.remove(TypeFlags::TYPEDEF);

        let use_cv = self.base_cv();
        match result.ptr_ops.first_mut() {
            Some(op) => op.cv |= use_cv,
            None => result.flags |= use_cv.as_flags(),
        }
        result.flags |= self.flags.difference(TypeFlags::CV | TypeFlags::SIZE_SIGN);

        let mut ops = self.ptr_ops.clone();
        ops.extend(result.ptr_ops.iter().copied());
        result.ptr_ops = ops;
        result.default = self.default.clone();
        result
    }
}

impl PartialEq for TypeDesc {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.flags == other.flags
            && self.ptr_ops == other.ptr_ops
            && self.link == other.link
            && self.template_args == other.template_args
            && self.param_kind == other.param_kind
            && self.constant == other.constant
    }
}

impl Eq for TypeDesc {}

impl Hash for TypeDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.flags.hash(state);
        self.ptr_ops.hash(state);
        self.link.hash(state);
        self.template_args.hash(state);
        self.param_kind.hash(state);
        self.constant.hash(state);
    }
}

#[cfg(test)]
mod tests;
