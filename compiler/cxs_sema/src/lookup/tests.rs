use super::*;
use crate::config::Language;
use crate::symbol::Access;
use crate::ty::TypeFlags;
use crate::SemaConfig;
use pretty_assertions::assert_eq;

fn table() -> SymbolTable {
    SymbolTable::new(SemaConfig::default())
}

fn namespace(table: &mut SymbolTable, scope: SymbolId, name: &str) -> SymbolId {
    let name = table.intern(name);
    let ns = table.new_container_symbol(name, BaseKind::Namespace);
    table.add_symbol(scope, ns).expect("namespace declares");
    ns
}

fn class(table: &mut SymbolTable, scope: SymbolId, name: &str) -> SymbolId {
    let name = table.intern(name);
    let c = table.new_derivable_container_symbol(name, BaseKind::Struct);
    table.add_symbol(scope, c).expect("class declares");
    c
}

fn variable(table: &mut SymbolTable, scope: SymbolId, name: &str) -> SymbolId {
    let name = table.intern(name);
    let v = table.new_symbol(name, BaseKind::Int);
    table.add_symbol(scope, v).expect("variable declares");
    v
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

fn find(table: &mut SymbolTable, scope: SymbolId, name: &str) -> SemaResult<Vec<SymbolId>> {
    let name = table.intern(name);
    table
        .lookup(scope, name, &LookupOptions::new())
        .map(|r| r.symbols().to_vec())
}

fn find_in(table: &mut SymbolTable, scope: SymbolId, name: &str) -> SemaResult<Vec<SymbolId>> {
    let name = table.intern(name);
    table
        .lookup(scope, name, &LookupOptions::qualified())
        .map(|r| r.symbols().to_vec())
}

#[test]
fn test_unqualified_walks_outward_and_inner_hides_outer() {
    let mut table = table();
    let global = table.global_scope();
    let outer_x = variable(&mut table, global, "x");
    let n = namespace(&mut table, global, "N");
    let y = variable(&mut table, global, "y");
    let inner_x = variable(&mut table, n, "x");

    assert_eq!(find(&mut table, n, "x"), Ok(vec![inner_x]));
    assert_eq!(find(&mut table, n, "y"), Ok(vec![y]));
    assert_eq!(find(&mut table, global, "x"), Ok(vec![outer_x]));
    assert_eq!(find(&mut table, n, "missing"), Ok(vec![]));
}

#[test]
fn test_qualified_stays_in_scope() {
    let mut table = table();
    let global = table.global_scope();
    variable(&mut table, global, "y");
    let n = namespace(&mut table, global, "N");
    assert_eq!(find_in(&mut table, n, "y"), Ok(vec![]));
}

#[test]
fn test_stop_scope_bounds_the_walk() {
    let mut table = table();
    let global = table.global_scope();
    variable(&mut table, global, "x");
    let n = namespace(&mut table, global, "N");
    let name = table.intern("x");
    let options = LookupOptions::new().with_stop_scope(n);
    let found = table.lookup(n, name, &options).expect("lookup");
    assert!(found.is_empty());
}

#[test]
fn test_tag_hidden_by_function_in_same_scope() {
    let mut table = table();
    let global = table.global_scope();
    class(&mut table, global, "stat");
    let f = function(&mut table, global, "stat", &[TypeDesc::new(BaseKind::Int)]);
    assert_eq!(find(&mut table, global, "stat"), Ok(vec![f]));

    let name = table.intern("stat");
    let tags = LookupOptions::new().with_filter(TypeFilter::Tags);
    let found = table.lookup(global, name, &tags).expect("lookup");
    assert_eq!(found.symbols().len(), 1);
    assert!(table.symbol(found.symbols()[0]).ty.kind.is_class());
}

#[test]
fn test_objects_from_two_directives_are_ambiguous() {
    let mut table = table();
    let global = table.global_scope();
    let a = namespace(&mut table, global, "A");
    let b = namespace(&mut table, global, "B");
    variable(&mut table, a, "x");
    variable(&mut table, b, "x");
    table.add_using_directive(global, a).expect("directive");
    table.add_using_directive(global, b).expect("directive");

    let name = table.intern("x");
    assert_eq!(find(&mut table, global, "x"), Err(SemaError::Ambiguous { name }));
}

#[test]
fn test_directive_applies_at_nearest_common_scope() {
    // namespace A { int x; }  int x;  namespace B { using namespace A; }
    // From inside B, A::x behaves as if declared in the global namespace,
    // alongside ::x.
    let mut table = table();
    let global = table.global_scope();
    let a = namespace(&mut table, global, "A");
    variable(&mut table, a, "x");
    variable(&mut table, global, "x");
    let b = namespace(&mut table, global, "B");
    table.add_using_directive(b, a).expect("directive");
    let name = table.intern("x");
    assert_eq!(find(&mut table, b, "x"), Err(SemaError::Ambiguous { name }));

    // A declaration in B itself is found first.
    let own = variable(&mut table, b, "x");
    assert_eq!(find(&mut table, b, "x"), Ok(vec![own]));
}

#[test]
fn test_directive_cycle_terminates() {
    let mut table = table();
    let global = table.global_scope();
    let a = namespace(&mut table, global, "A");
    let b = namespace(&mut table, global, "B");
    table.add_using_directive(a, b).expect("directive");
    table.add_using_directive(b, a).expect("directive");
    let x = variable(&mut table, b, "x");

    assert_eq!(find(&mut table, a, "missing"), Ok(vec![]));
    assert_eq!(find_in(&mut table, a, "missing"), Ok(vec![]));
    assert_eq!(find_in(&mut table, a, "x"), Ok(vec![x]));
}

#[test]
fn test_qualified_directives_only_when_namespace_has_no_match() {
    let mut table = table();
    let global = table.global_scope();
    let a = namespace(&mut table, global, "A");
    let b = namespace(&mut table, global, "B");
    let own = variable(&mut table, a, "x");
    variable(&mut table, b, "x");
    table.add_using_directive(a, b).expect("directive");
    assert_eq!(find_in(&mut table, a, "x"), Ok(vec![own]));
}

#[test]
fn test_c_ignores_using_directives() {
    let mut table = SymbolTable::new(SemaConfig::default().with_language(Language::C));
    let global = table.global_scope();
    let a = namespace(&mut table, global, "A");
    variable(&mut table, a, "x");
    table.add_using_directive(global, a).expect("directive");
    assert_eq!(find(&mut table, global, "x"), Ok(vec![]));
}

#[test]
fn test_base_class_lookup() {
    let mut table = table();
    let global = table.global_scope();
    let base = class(&mut table, global, "Base");
    let derived = class(&mut table, global, "Derived");
    table.add_parent(derived, base, Access::Public, false).expect("base");
    let inherited = variable(&mut table, base, "value");
    assert_eq!(find_in(&mut table, derived, "value"), Ok(vec![inherited]));

    let own = variable(&mut table, derived, "value");
    assert_eq!(find_in(&mut table, derived, "value"), Ok(vec![own]));
}

#[test]
fn test_diamond_member_is_ambiguous_unless_shared() {
    let mut table = table();
    let global = table.global_scope();
    let base = class(&mut table, global, "Base");
    let left = class(&mut table, global, "Left");
    let right = class(&mut table, global, "Right");
    let bottom = class(&mut table, global, "Bottom");
    for mid in [left, right] {
        table.add_parent(mid, base, Access::Public, false).expect("base");
        table.add_parent(bottom, mid, Access::Public, false).expect("base");
    }
    variable(&mut table, base, "field");
    let count_name = table.intern("count");
    let count = table.new_symbol_with_type(
        count_name,
        TypeDesc::new(BaseKind::Int).with_flags(TypeFlags::STATIC),
    );
    table.add_symbol(base, count).expect("static member");

    let field = table.intern("field");
    assert_eq!(
        find_in(&mut table, bottom, "field"),
        Err(SemaError::Ambiguous { name: field })
    );
    assert_eq!(find_in(&mut table, bottom, "count"), Ok(vec![count]));
}

#[test]
fn test_virtual_base_searched_once() {
    let mut table = table();
    let global = table.global_scope();
    let base = class(&mut table, global, "Base");
    let left = class(&mut table, global, "Left");
    let right = class(&mut table, global, "Right");
    let bottom = class(&mut table, global, "Bottom");
    for mid in [left, right] {
        table.add_parent(mid, base, Access::Public, true).expect("base");
        table.add_parent(bottom, mid, Access::Public, false).expect("base");
    }
    let field = variable(&mut table, base, "field");
    assert_eq!(find_in(&mut table, bottom, "field"), Ok(vec![field]));
}

#[test]
fn test_circular_inheritance() {
    let mut table = table();
    let global = table.global_scope();
    let a = class(&mut table, global, "A");
    let b = class(&mut table, global, "B");
    table.add_parent(a, b, Access::Public, false).expect("base");
    table.add_parent(b, a, Access::Public, false).expect("base");
    variable(&mut table, a, "x");

    for start in [a, b] {
        assert!(matches!(
            find_in(&mut table, start, "x"),
            Err(SemaError::CircularInheritance { .. })
        ));
    }
}

#[test]
fn test_prefix_lookup_sorts_and_collects_ambiguity() {
    let mut table = SymbolTable::new(SemaConfig::default().with_completion(true));
    let global = table.global_scope();
    let a = namespace(&mut table, global, "A");
    let b = namespace(&mut table, global, "B");
    variable(&mut table, global, "alpha2");
    variable(&mut table, global, "Alpha");
    variable(&mut table, global, "beta");
    variable(&mut table, a, "alpha_x");
    variable(&mut table, b, "alpha_x");
    table.add_using_directive(global, a).expect("directive");
    table.add_using_directive(global, b).expect("directive");

    let found = table
        .lookup_prefix(global, "al", TypeFilter::Any)
        .expect("prefix lookup");
    let names: Vec<&str> = found
        .entries()
        .iter()
        .map(|e| table.name_str(e.name))
        .collect();
    assert_eq!(names, vec!["Alpha", "alpha2", "alpha_x"]);
    let alpha_x = table.intern("alpha_x");
    assert_eq!(found.ambiguous(), &[alpha_x]);
}

#[test]
#[should_panic(expected = "internal invariant violated")]
fn test_prefix_lookup_requires_completion() {
    let mut table = table();
    let global = table.global_scope();
    let _ = table.lookup_prefix(global, "a", TypeFilter::Any);
}

#[test]
fn test_using_declaration_aliases_collapse() {
    let mut table = table();
    let global = table.global_scope();
    let a = namespace(&mut table, global, "A");
    let f = function(&mut table, a, "f", &[TypeDesc::new(BaseKind::Int)]);
    let name = table.intern("f");

    let aliases = table
        .add_using_declaration(global, name, a)
        .expect("using-declaration");
    assert_eq!(aliases.len(), 1);
    table.add_using_directive(global, a).expect("directive");
    assert_eq!(find(&mut table, global, "f"), Ok(vec![f]));

    let missing = table.intern("missing");
    assert_eq!(
        table.add_using_declaration(global, missing, a),
        Err(SemaError::InvalidUsing { name: missing })
    );
}

#[test]
fn test_using_declaration_of_second_object_is_invalid() {
    let mut table = table();
    let global = table.global_scope();
    let a = namespace(&mut table, global, "A");
    let b = namespace(&mut table, global, "B");
    variable(&mut table, a, "x");
    variable(&mut table, b, "x");
    let name = table.intern("x");
    table.add_using_declaration(global, name, a).expect("first");
    assert_eq!(
        table.add_using_declaration(global, name, b),
        Err(SemaError::InvalidOverload { name })
    );
}

#[test]
fn test_namespace_alias_redirects_lookup() {
    let mut table = table();
    let global = table.global_scope();
    let n = namespace(&mut table, global, "long_name");
    let x = variable(&mut table, n, "x");
    let short = table.intern("ln");
    let alias = table.add_namespace_alias(global, short, n).expect("alias");
    assert_eq!(find_in(&mut table, alias, "x"), Ok(vec![x]));
}

#[test]
fn test_nested_name_specifier_sees_through_typedef() {
    let mut table = table();
    let global = table.global_scope();
    let c = class(&mut table, global, "C");
    variable(&mut table, global, "value");
    let alias_name = table.intern("Alias");
    let alias = table.new_symbol_with_type(
        alias_name,
        TypeDesc::named(c).with_flags(TypeFlags::TYPEDEF),
    );
    table.add_symbol(global, alias).expect("typedef");

    assert_eq!(
        table.lookup_nested_name_specifier(global, alias_name, false),
        Ok(Some(c))
    );
    let value = table.intern("value");
    assert_eq!(
        table.lookup_nested_name_specifier(global, value, false),
        Ok(None)
    );
}

#[test]
fn test_lookup_name_with_overloads_needs_arguments() {
    let mut table = table();
    let global = table.global_scope();
    function(&mut table, global, "f", &[TypeDesc::new(BaseKind::Int)]);
    function(&mut table, global, "f", &[TypeDesc::new(BaseKind::Double)]);
    let name = table.intern("f");
    assert_eq!(
        table.lookup_name(global, name),
        Err(SemaError::UnableToResolveFunction { name })
    );
}

#[test]
fn test_member_for_definition_skips_friends() {
    let mut table = table();
    let global = table.global_scope();
    let c = class(&mut table, global, "C");
    let name = table.intern("f");
    let friend = table.new_parameterized_symbol(name, BaseKind::Function);
    table.symbol_mut(friend).ty.flags |= TypeFlags::FRIEND;
    table.add_symbol(c, friend).expect("friend");
    assert!(table.lookup_member_for_definition(c, name).is_empty());

    let g = function(&mut table, c, "g", &[]);
    let g_name = table.intern("g");
    assert_eq!(table.lookup_member_for_definition(c, g_name), vec![g]);
}

#[test]
fn test_argument_dependent_lookup() {
    let mut table = table();
    let global = table.global_scope();
    let n = namespace(&mut table, global, "N");
    let s = class(&mut table, n, "S");
    let g = function(&mut table, n, "g", &[TypeDesc::named(s)]);
    let name = table.intern("g");

    assert_eq!(
        table.lookup_function(global, name, &[TypeDesc::named(s)]),
        Ok(Some(g))
    );
    assert_eq!(
        table.qualified_function_lookup(global, name, &[TypeDesc::named(s)]),
        Ok(None)
    );
}

#[test]
fn test_friend_found_only_by_argument_dependent_lookup() {
    let mut table = table();
    let global = table.global_scope();
    let s = class(&mut table, global, "S");
    let name = table.intern("swap");
    let friend = table.new_parameterized_symbol(name, BaseKind::Function);
    table.symbol_mut(friend).ty.flags |= TypeFlags::FRIEND;
    table.add_parameter_type(friend, TypeDesc::named(s).reference());
    table.add_symbol(s, friend).expect("friend");

    assert_eq!(find(&mut table, global, "swap"), Ok(vec![]));
    assert_eq!(
        table.lookup_function(global, name, &[TypeDesc::named(s)]),
        Ok(Some(friend))
    );
}

#[test]
fn test_parameters_are_visible_in_function_scope() {
    let mut table = table();
    let global = table.global_scope();
    let name = table.intern("f");
    let f = table.new_parameterized_symbol(name, BaseKind::Function);
    let arg_name = table.intern("arg");
    let arg = table.new_symbol(arg_name, BaseKind::Int);
    table.add_parameter(f, arg);
    table.add_symbol(global, f).expect("function");
    assert_eq!(find(&mut table, f, "arg"), Ok(vec![arg]));
}

#[test]
fn test_nearest_common_enclosing() {
    let mut table = table();
    let global = table.global_scope();
    let a = namespace(&mut table, global, "A");
    let a1 = namespace(&mut table, a, "A1");
    let a2 = namespace(&mut table, a, "A2");
    let deep = namespace(&mut table, a2, "Deep");
    let b = namespace(&mut table, global, "B");
    assert_eq!(table.nearest_common_enclosing(a1, deep), a);
    assert_eq!(table.nearest_common_enclosing(a1, b), global);
    assert_eq!(table.nearest_common_enclosing(deep, a2), a2);
}
