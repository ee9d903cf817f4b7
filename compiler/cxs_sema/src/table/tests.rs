use super::*;
use crate::error::{SemaError, TransactionError};
use crate::symbol::Access;
use crate::ty::{Cv, TypeFlags};
use crate::SemaConfig;
use pretty_assertions::assert_eq;

fn table() -> SymbolTable {
    SymbolTable::new(SemaConfig::default())
}

fn function(table: &mut SymbolTable, scope: SymbolId, name: &str, params: &[TypeDesc]) -> SymbolId {
    let name = table.intern(name);
    let f = table.new_parameterized_symbol(name, BaseKind::Function);
    for ty in params {
        table.add_parameter_type(f, ty.clone());
    }
    table.add_symbol(scope, f).expect("function declares");
    f
}

fn class(table: &mut SymbolTable, scope: SymbolId, name: &str) -> SymbolId {
    let name = table.intern(name);
    let c = table.new_derivable_container_symbol(name, BaseKind::Class);
    table.add_symbol(scope, c).expect("class declares");
    c
}

fn int() -> TypeDesc {
    TypeDesc::new(BaseKind::Int)
}

#[test]
fn test_new_table_has_global_namespace() {
    let table = table();
    let global = table.global_scope();
    assert_eq!(table.len(), 1);
    assert!(table.symbol(global).is_type(BaseKind::Namespace));
    assert_eq!(table.containing_scope(global), None);
}

#[test]
fn test_overloads_share_a_name() {
    let mut table = table();
    let global = table.global_scope();
    function(&mut table, global, "f", &[int()]);
    function(&mut table, global, "f", &[TypeDesc::new(BaseKind::Double)]);
    let f = table.intern("f");
    assert_eq!(table.members(global, f).len(), 2);
}

#[test]
fn test_same_parameters_is_invalid_overload() {
    let mut table = table();
    let global = table.global_scope();
    function(&mut table, global, "f", &[int()]);

    let name = table.intern("f");
    let again = table.new_parameterized_symbol(name, BaseKind::Function);
    table.add_parameter_type(again, int().with_flags(TypeFlags::CONST));
    assert_eq!(
        table.add_symbol(global, again),
        Err(SemaError::InvalidOverload { name })
    );
}

#[test]
fn test_prototype_then_definition_completes_forward() {
    let mut table = table();
    let global = table.global_scope();
    let name = table.intern("f");
    let proto = table.new_parameterized_symbol(name, BaseKind::Function);
    table.symbol_mut(proto).ty.flags |= TypeFlags::FORWARD;
    table.add_parameter_type(proto, int());
    table.add_symbol(global, proto).expect("prototype");

    let definition = function(&mut table, global, "f", &[int()]);
    assert_eq!(table.symbol(proto).forward_target, Some(definition));
    assert_eq!(table.canonical(proto), definition);
}

#[test]
fn test_class_redefinition_is_invalid() {
    let mut table = table();
    let global = table.global_scope();
    class(&mut table, global, "A");
    let name = table.intern("A");
    let again = table.new_derivable_container_symbol(name, BaseKind::Class);
    assert!(matches!(
        table.add_symbol(global, again),
        Err(SemaError::InvalidOverload { .. })
    ));
}

#[test]
fn test_tag_and_object_may_share_a_name() {
    let mut table = table();
    let global = table.global_scope();
    class(&mut table, global, "stat");
    function(&mut table, global, "stat", &[int()]);
    let name = table.intern("stat");
    assert_eq!(table.members(global, name).len(), 2);
}

#[test]
fn test_object_and_function_conflict() {
    let mut table = table();
    let global = table.global_scope();
    let name = table.intern("x");
    let variable = table.new_symbol(name, BaseKind::Int);
    table.add_symbol(global, variable).expect("variable");
    let f = table.new_parameterized_symbol(name, BaseKind::Function);
    assert_eq!(
        table.add_symbol(global, f),
        Err(SemaError::InvalidOverload { name })
    );
}

#[test]
fn test_rollback_restores_counts() {
    let mut table = table();
    let global = table.global_scope();
    let base = class(&mut table, global, "Base");
    let derived = class(&mut table, global, "Derived");
    let f = function(&mut table, global, "f", &[int()]);
    let before = (
        table.contained_count(global),
        table.parameter_count(f),
        table.parents(derived).len(),
        table.len(),
    );

    let mark = table.mark();
    function(&mut table, global, "g", &[]);
    table.add_parameter_type(f, int());
    table.add_parent(derived, base, Access::Public, false).expect("base");
    table.rollback(mark).expect("innermost");

    let after = (
        table.contained_count(global),
        table.parameter_count(f),
        table.parents(derived).len(),
        table.len(),
    );
    assert_eq!(before, after);
    assert_eq!(table.live_marks(), 0);
}

#[test]
fn test_commit_keeps_mutations() {
    let mut table = table();
    let global = table.global_scope();
    let mark = table.mark();
    function(&mut table, global, "g", &[]);
    table.commit(mark).expect("innermost");
    assert_eq!(table.contained_count(global), 1);
    assert_eq!(table.rollback(mark), Err(TransactionError::Stale { mark: mark.id() }));
}

#[test]
fn test_inner_commit_is_undone_by_outer_rollback() {
    let mut table = table();
    let global = table.global_scope();
    let outer = table.mark();
    let inner = table.mark();
    assert!(matches!(
        table.rollback(outer),
        Err(TransactionError::NotInnermost { .. })
    ));
    function(&mut table, global, "g", &[]);
    table.commit(inner).expect("innermost");
    table.rollback(outer).expect("outer is innermost now");
    assert_eq!(table.contained_count(global), 0);
}

#[test]
fn test_rollback_restores_return_type_and_access() {
    let mut table = table();
    let global = table.global_scope();
    let f = function(&mut table, global, "f", &[]);
    table.set_return_type(f, int()).expect("return type");

    let mark = table.mark();
    table.set_return_type(f, TypeDesc::new(BaseKind::Void)).expect("return type");
    table.set_access(f, Access::Private);
    table.rollback(mark).expect("innermost");

    assert_eq!(table.return_type(f), Some(&int()));
    assert_eq!(table.symbol(f).access, Access::Public);
}

#[test]
fn test_flatten_typedef_chain() {
    let mut table = table();
    let global = table.global_scope();
    // typedef int *P; typedef P Q;
    let p_name = table.intern("P");
    let p = table.new_symbol_with_type(p_name, int().pointer().with_flags(TypeFlags::TYPEDEF));
    table.add_symbol(global, p).expect("typedef");
    let q_name = table.intern("Q");
    let q = table.new_symbol_with_type(q_name, TypeDesc::named(p).with_flags(TypeFlags::TYPEDEF));
    table.add_symbol(global, q).expect("typedef");

    // const Q &  ->  int *const &
    let use_site = TypeDesc::named(q).with_flags(TypeFlags::CONST).reference();
    let flat = table.flatten_type(&use_site);
    assert_eq!(flat, int().pointer().with_top_cv(Cv::CONST).reference());
    assert_eq!(table.type_to_string(&flat), "int *const &");
}

#[test]
fn test_has_same_parameters_adjusts_parameters() {
    let mut table = table();
    let global = table.global_scope();
    let scope_name = table.intern("N");
    let namespace = table.new_container_symbol(scope_name, BaseKind::Namespace);
    table.add_symbol(global, namespace).expect("namespace");

    let a = function(&mut table, global, "f", &[int().array()]);
    let b = function(&mut table, namespace, "f", &[int().pointer().with_top_cv(Cv::CONST)]);
    let c = function(&mut table, namespace, "g", &[int().with_flags(TypeFlags::CONST).pointer()]);
    assert!(table.has_same_parameters(a, b));
    assert!(!table.has_same_parameters(a, c));
}

#[test]
fn test_lone_void_parameter_means_none() {
    let mut table = table();
    let global = table.global_scope();
    let a = function(&mut table, global, "f", &[TypeDesc::new(BaseKind::Void)]);
    let scope_name = table.intern("N");
    let namespace = table.new_container_symbol(scope_name, BaseKind::Namespace);
    table.add_symbol(global, namespace).expect("namespace");
    let b = function(&mut table, namespace, "f", &[]);
    assert!(table.has_same_parameters(a, b));
}

#[test]
fn test_lone_void_argument_calls_without_arguments() {
    let mut table = table();
    let global = table.global_scope();
    let g = function(&mut table, global, "g", &[]);
    let h = function(&mut table, global, "h", &[TypeDesc::new(BaseKind::Void)]);
    let void = TypeDesc::new(BaseKind::Void);

    assert_eq!(table.resolve_function(&[g], Some(&[void.clone()])), Ok(Some(g)));
    assert_eq!(table.resolve_function(&[h], Some(&[])), Ok(Some(h)));
    assert_eq!(table.resolve_function(&[h], Some(&[void.clone()])), Ok(Some(h)));
    assert_eq!(table.resolve_function(&[g], Some(&[void.pointer()])), Ok(None));
}

#[test]
fn test_storage_specifiers_are_not_part_of_the_signature() {
    let mut table = table();
    let global = table.global_scope();
    let a = function(&mut table, global, "f", &[int().with_flags(TypeFlags::REGISTER)]);
    let scope_name = table.intern("N");
    let namespace = table.new_container_symbol(scope_name, BaseKind::Namespace);
    table.add_symbol(global, namespace).expect("namespace");
    let b = function(&mut table, namespace, "f", &[int()]);
    let c = function(&mut table, namespace, "g", &[int().with_flags(TypeFlags::AUTO | TypeFlags::UNSIGNED)]);
    assert!(table.has_same_parameters(a, b));
    assert!(!table.has_same_parameters(b, c));
}

#[test]
fn test_rollback_detaches_symbols_that_predate_the_mark() {
    let mut table = table();
    let global = table.global_scope();
    let param_name = table.intern("p");
    let param = table.new_symbol_with_type(param_name, int());
    let ctor_name = table.intern("C");
    let constructor = table.new_parameterized_symbol(ctor_name, BaseKind::Function);
    let t = table.intern("T");
    let t = table.new_template_parameter(t, BaseKind::TypeName);
    let s = table.intern("S");
    let spec = table.new_specialization(s, vec![int()]);
    let before = table.len();

    let mark = table.mark();
    let f = function(&mut table, global, "f", &[]);
    table.add_parameter(f, param);
    let c = class(&mut table, global, "C");
    table.add_constructor(c, constructor);
    let primary = table.new_template_symbol(s);
    table.add_template_parameter(primary, t).expect("parameter");
    let templated = table.new_derivable_container_symbol(s, BaseKind::Struct);
    table.add_symbol(primary, templated).expect("templated class");
    table.add_symbol(global, primary).expect("template declares");
    table.add_template_specialization(primary, spec).expect("specialization");
    assert_eq!(table.symbol(param).scope, Some(f));
    assert_eq!(table.symbol(spec).scope, Some(global));
    table.rollback(mark).expect("innermost");

    assert_eq!(table.len(), before);
    for symbol in [param, constructor, t, spec] {
        assert_eq!(table.symbol(symbol).scope, None);
        assert!(!table.symbol(symbol).in_template);
    }
    assert_eq!(table.symbol(spec).as_template().and_then(|d| d.primary), None);
}

#[test]
fn test_descriptor_naming_nothing_is_bad_type_info() {
    let mut table = table();
    let global = table.global_scope();
    let f = function(&mut table, global, "f", &[]);
    let name = table.intern("f");
    assert_eq!(
        table.set_return_type(f, TypeDesc::new(BaseKind::Type)),
        Err(SemaError::BadTypeInfo { name })
    );
    assert_eq!(table.return_type(f), None);

    let derived = class(&mut table, global, "Derived");
    let bogus_name = table.intern("Bogus");
    let bogus = table.new_symbol_with_type(bogus_name, TypeDesc::new(BaseKind::Type));
    assert_eq!(
        table.add_parent(derived, bogus, Access::Public, false),
        Err(SemaError::BadTypeInfo { name: bogus_name })
    );
    assert!(table.parents(derived).is_empty());
}

#[test]
fn test_type_to_string() {
    let mut table = table();
    let global = table.global_scope();
    let node = class(&mut table, global, "Node");
    let ty = TypeDesc::named(node)
        .with_flags(TypeFlags::CONST)
        .pointer()
        .reference();
    assert_eq!(table.type_to_string(&ty), "const Node *&");

    let unsigned = int().with_flags(TypeFlags::UNSIGNED | TypeFlags::LONG);
    assert_eq!(table.type_to_string(&unsigned), "unsigned long int");

    let member = int().member_pointer(node);
    assert_eq!(table.type_to_string(&member), "int Node::*");
}

#[test]
fn test_add_parent_rejects_non_class() {
    let mut table = table();
    let global = table.global_scope();
    let derived = class(&mut table, global, "D");
    let name = table.intern("x");
    let variable = table.new_symbol(name, BaseKind::Int);
    assert_eq!(
        table.add_parent(derived, variable, Access::Public, false),
        Err(SemaError::BadTypeInfo { name })
    );
}

#[test]
fn test_add_parent_sees_through_typedef() {
    let mut table = table();
    let global = table.global_scope();
    let base = class(&mut table, global, "Base");
    let alias_name = table.intern("Alias");
    let alias =
        table.new_symbol_with_type(alias_name, TypeDesc::named(base).with_flags(TypeFlags::TYPEDEF));
    table.add_symbol(global, alias).expect("typedef");
    let derived = class(&mut table, global, "Derived");
    table.add_parent(derived, alias, Access::Public, false).expect("base");
    assert_eq!(table.parents(derived)[0].parent, base);
}

#[test]
#[should_panic(expected = "unsupported operation")]
fn test_plain_parameter_on_template_panics() {
    let mut table = table();
    let name = table.intern("S");
    let template = table.new_template_symbol(name);
    let param_name = table.intern("x");
    let param = table.new_symbol(param_name, BaseKind::Int);
    table.add_parameter(template, param);
}

#[test]
fn test_specialization_arity_must_match_primary() {
    let mut table = table();
    let global = table.global_scope();
    let name = table.intern("S");
    let primary = table.new_template_symbol(name);
    let t = table.intern("T");
    let param = table.new_template_parameter(t, BaseKind::TypeName);
    table.add_template_parameter(primary, param).expect("parameter");
    table.add_symbol(global, primary).expect("template");

    let spec = table.new_specialization(name, vec![int(), int()]);
    assert_eq!(
        table.add_template_specialization(primary, spec),
        Err(SemaError::BadTemplateArgument {
            template: name,
            index: 1
        })
    );
}

#[test]
fn test_namespace_alias_and_using_directive() {
    let mut table = table();
    let global = table.global_scope();
    let long_name = table.intern("very_long_name");
    let namespace = table.new_container_symbol(long_name, BaseKind::Namespace);
    table.add_symbol(global, namespace).expect("namespace");

    let short = table.intern("v");
    let alias = table
        .add_namespace_alias(global, short, namespace)
        .expect("alias");
    assert_eq!(table.resolve_namespace_alias(alias), namespace);

    table.add_using_directive(global, alias).expect("directive");
    assert_eq!(table.symbol(global).using_directives()[0].namespace, namespace);

    let class = class(&mut table, global, "C");
    assert!(matches!(
        table.add_using_directive(global, class),
        Err(SemaError::BadTypeInfo { .. })
    ));
}

#[test]
fn test_map_definition_parameter_rolls_back() {
    let mut table = table();
    let name = table.intern("S");
    let template = table.new_template_symbol(name);
    let t = table.intern("T");
    let u = table.intern("U");
    let param = table.new_template_parameter(t, BaseKind::TypeName);
    table.add_template_parameter(template, param).expect("parameter");

    let mark = table.mark();
    table.map_definition_parameter(template, u, param);
    assert_eq!(
        table.symbol(template).as_template().map(|t| t.definition_params.len()),
        Some(1)
    );
    table.rollback(mark).expect("innermost");
    assert_eq!(
        table.symbol(template).as_template().map(|t| t.definition_params.len()),
        Some(0)
    );
}

#[test]
fn test_clone_symbol_copies_collections() {
    let mut table = table();
    let global = table.global_scope();
    let f = function(&mut table, global, "f", &[int(), int()]);
    let copy = table.clone_symbol(f);
    assert_eq!(table.parameter_count(copy), 2);
    assert_eq!(table.containing_scope(copy), None);
    table.add_parameter_type(copy, int());
    assert_eq!(table.parameter_count(f), 2);
}

#[test]
fn test_ast_link_follows_clones() {
    let mut table = table();
    let global = table.global_scope();
    let c = class(&mut table, global, "C");
    assert_eq!(table.symbol(c).ast_link, None);
    table.set_ast_link(c, cxs_ir::AstLink::new(42));
    let copy = table.clone_symbol(c);
    assert_eq!(table.symbol(copy).ast_link.map(cxs_ir::AstLink::raw), Some(42));
}
