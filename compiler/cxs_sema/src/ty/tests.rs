use super::*;
use pretty_assertions::assert_eq;

fn class(raw: u32) -> TypeDesc {
    TypeDesc::named(SymbolId::from_raw(raw))
}

#[test]
fn test_ptr_ops_are_top_level_first() {
    // int *const &
    let ty = TypeDesc::new(BaseKind::Int)
        .pointer()
        .with_top_cv(Cv::CONST)
        .reference();
    let kinds: Vec<PtrOpKind> = ty.ptr_ops.iter().map(|op| op.kind).collect();
    assert_eq!(kinds, vec![PtrOpKind::Reference, PtrOpKind::Pointer]);
    assert!(ty.ptr_ops[1].is_const());
    assert!(ty.is_reference());
}

#[test]
fn test_strip_reference_removes_only_top_level() {
    let mut ty = TypeDesc::new(BaseKind::Char).reference();
    assert!(ty.strip_reference());
    assert!(!ty.strip_reference());
    assert!(!ty.has_ptr_ops());
}

#[test]
fn test_top_cv_moves_with_pointer_levels() {
    let base_const = TypeDesc::new(BaseKind::Int).with_top_cv(Cv::CONST);
    assert_eq!(base_const.top_cv(), Cv::CONST);

    let pointer_to_const = base_const.clone().pointer();
    assert_eq!(pointer_to_const.top_cv(), Cv::empty());
    assert_eq!(pointer_to_const.base_cv(), Cv::CONST);

    let mut const_pointer = TypeDesc::new(BaseKind::Int)
        .pointer()
        .with_top_cv(Cv::CONST | Cv::VOLATILE);
    const_pointer.strip_top_cv();
    assert_eq!(const_pointer.top_cv(), Cv::empty());
}

#[test]
fn test_decay() {
    let mut array = TypeDesc::new(BaseKind::Int).array();
    array.decay();
    assert_eq!(array, TypeDesc::new(BaseKind::Int).pointer());

    let mut function = TypeDesc::new(BaseKind::Function);
    function.decay();
    assert_eq!(function, TypeDesc::new(BaseKind::Function).pointer());

    let mut plain = TypeDesc::new(BaseKind::Double);
    plain.decay();
    assert_eq!(plain, TypeDesc::new(BaseKind::Double));
}

#[test]
fn test_default_takes_no_part_in_equality() {
    let with_default = TypeDesc::new(BaseKind::Int)
        .with_default(TypeDesc::constant(BaseKind::Int, Name::from_raw(3)));
    assert_eq!(with_default, TypeDesc::new(BaseKind::Int));
}

#[test]
fn test_strip_specifiers_keeps_type_flags() {
    let mut ty = TypeDesc::new(BaseKind::Int)
        .with_flags(TypeFlags::STATIC | TypeFlags::CONST | TypeFlags::UNSIGNED | TypeFlags::INLINE);
    ty.strip_specifiers();
    assert_eq!(ty.flags, TypeFlags::CONST | TypeFlags::UNSIGNED);
}

#[test]
fn test_validity() {
    assert!(!TypeDesc::new(BaseKind::Type).is_valid());
    assert!(class(4).is_valid());
    assert!(!TypeDesc::new(BaseKind::TemplateParameter).is_valid());
    assert!(TypeDesc::template_parameter(BaseKind::TypeName).is_valid());
}

#[test]
fn test_substitute_base_keeps_use_site_outermost() {
    // T = int *, use site const T &  ->  int *const &
    let replacement = TypeDesc::new(BaseKind::Int).pointer();
    let use_site = class(9).with_flags(TypeFlags::CONST).reference();
    let result = use_site.substitute_base(&replacement);

    let expected = TypeDesc::new(BaseKind::Int)
        .pointer()
        .with_top_cv(Cv::CONST)
        .reference();
    assert_eq!(result, expected);
}

#[test]
fn test_substitute_base_drops_typedef_but_keeps_use_site_specifiers() {
    let alias = TypeDesc::new(BaseKind::Int).with_flags(TypeFlags::TYPEDEF | TypeFlags::UNSIGNED);
    let use_site = class(2).with_flags(TypeFlags::STATIC);
    let result = use_site.substitute_base(&alias);
    assert_eq!(result.flags, TypeFlags::UNSIGNED | TypeFlags::STATIC);
}

#[test]
fn test_same_base_ignores_qualifiers_and_operators() {
    let a = class(5).with_flags(TypeFlags::CONST).pointer();
    let b = class(5).reference();
    assert!(a.same_base(&b));
    assert!(!a.same_ptr_shape(&b));
    assert!(!class(5).same_base(&class(6)));

    let long = TypeDesc::new(BaseKind::Int).with_flags(TypeFlags::LONG);
    assert!(!long.same_base(&TypeDesc::new(BaseKind::Int)));
}

#[test]
fn test_member_pointer_shape_includes_class() {
    let a = TypeDesc::new(BaseKind::Int).member_pointer(SymbolId::from_raw(1));
    let b = TypeDesc::new(BaseKind::Int).member_pointer(SymbolId::from_raw(2));
    assert!(!a.same_ptr_shape(&b));
}

#[test]
fn test_base_kind_classification() {
    assert!(BaseKind::Struct.is_class());
    assert!(BaseKind::Enumeration.is_class_or_enum());
    assert!(!BaseKind::Enumeration.is_class());
    assert!(BaseKind::Bool.is_integral());
    assert!(BaseKind::Double.is_floating());
    assert!(BaseKind::Void.is_builtin());
    assert!(!BaseKind::Void.is_arithmetic());
    assert!(BaseKind::Namespace.is_scope());
    assert_eq!(BaseKind::WChar.keyword(), "wchar_t");
}
