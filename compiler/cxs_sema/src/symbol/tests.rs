use super::*;
use pretty_assertions::assert_eq;

fn id(raw: u32) -> SymbolId {
    SymbolId::from_raw(raw)
}

#[test]
fn test_access_through_takes_most_restrictive() {
    assert_eq!(Access::Public.through(Access::Protected), Access::Protected);
    assert_eq!(Access::Private.through(Access::Public), Access::Private);
    assert_eq!(Access::Public.through(Access::Public), Access::Public);
}

#[test]
fn test_container_preserves_insertion_order() {
    let mut container = ContainerData::default();
    let f = Name::from_raw(1);
    let g = Name::from_raw(2);
    container.insert(f, id(10));
    container.insert(g, id(11));
    container.insert(f, id(12));

    assert_eq!(container.get(f), &[id(10), id(12)]);
    assert_eq!(container.contents(), &[id(10), id(11), id(12)]);
    assert_eq!(container.len(), 3);
}

#[test]
fn test_container_remove_undoes_latest_insert() {
    let mut container = ContainerData::default();
    let f = Name::from_raw(1);
    container.insert(f, id(10));
    container.insert(f, id(11));
    container.remove(f, id(11));
    assert_eq!(container.get(f), &[id(10)]);

    container.remove(f, id(10));
    assert!(container.get(f).is_empty());
    assert!(container.is_empty());
}

#[test]
fn test_capabilities_follow_kind() {
    let name = Name::from_raw(1);
    let class = Symbol::new(
        name,
        TypeDesc::new(BaseKind::Class),
        SymbolKind::Derivable(Box::default()),
    );
    assert!(class.container().is_some());
    assert!(class.as_derivable().is_some());
    assert!(class.as_parameterized().is_none());
    assert!(class.parameters().is_empty());

    let variable = Symbol::new(name, TypeDesc::new(BaseKind::Int), SymbolKind::Basic);
    assert!(variable.container().is_none());
    assert!(variable.using_directives().is_empty());
    assert!(variable.return_type().is_none());
}

#[test]
fn test_template_cache_matches_structurally() {
    let mut data = TemplateData::default();
    data.instances.push(Instantiation {
        args: vec![TypeDesc::new(BaseKind::Int).pointer()],
        symbol: id(7),
    });
    assert_eq!(data.cached(&[TypeDesc::new(BaseKind::Int).pointer()]), Some(id(7)));
    assert_eq!(data.cached(&[TypeDesc::new(BaseKind::Int)]), None);
}

#[test]
fn test_shared_members() {
    let name = Name::from_raw(1);
    let enumerator = Symbol::new(name, TypeDesc::new(BaseKind::Enumerator), SymbolKind::Basic);
    assert!(enumerator.is_shared_member());

    let field = Symbol::new(name, TypeDesc::new(BaseKind::Int), SymbolKind::Basic);
    assert!(!field.is_shared_member());

    let static_field = Symbol::new(
        name,
        TypeDesc::new(BaseKind::Int).with_flags(crate::ty::TypeFlags::STATIC),
        SymbolKind::Basic,
    );
    assert!(static_field.is_shared_member());
}

#[test]
fn test_symbol_id_debug() {
    assert_eq!(format!("{:?}", id(42)), "SymbolId(42)");
    assert_eq!(id(42).index(), 42);
}
