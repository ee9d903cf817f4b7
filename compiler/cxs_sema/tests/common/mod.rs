//! Shared setup for the integration tests: tracing and a small declaration
//! vocabulary over the public table API.

#![allow(dead_code, reason = "each test binary uses a subset of the helpers")]
#![allow(clippy::expect_used, reason = "Tests can panic")]

use std::sync::Once;

use cxs_sema::{BaseKind, SemaConfig, SymbolId, SymbolTable, TypeDesc};

static TRACING_INIT: Once = Once::new();

/// Route engine logs to the test output.
///
/// Enable with `RUST_LOG=cxs_sema=debug` or `RUST_LOG=cxs_sema=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_test_writer().with_target(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

/// A fresh C++ table with logging set up.
pub fn table() -> SymbolTable {
    init_tracing();
    SymbolTable::new(SemaConfig::default())
}

pub fn namespace(table: &mut SymbolTable, scope: SymbolId, name: &str) -> SymbolId {
    let name = table.intern(name);
    let ns = table.new_container_symbol(name, BaseKind::Namespace);
    table.add_symbol(scope, ns).expect("namespace declares");
    ns
}

pub fn class(table: &mut SymbolTable, scope: SymbolId, name: &str) -> SymbolId {
    let name = table.intern(name);
    let class = table.new_derivable_container_symbol(name, BaseKind::Class);
    table.add_symbol(scope, class).expect("class declares");
    class
}

pub fn variable(table: &mut SymbolTable, scope: SymbolId, name: &str, ty: TypeDesc) -> SymbolId {
    let name = table.intern(name);
    let var = table.new_symbol_with_type(name, ty);
    table.add_symbol(scope, var).expect("variable declares");
    var
}

/// Build a function without declaring it.
pub fn function_symbol(table: &mut SymbolTable, name: &str, params: &[TypeDesc]) -> SymbolId {
    let name = table.intern(name);
    let f = table.new_parameterized_symbol(name, BaseKind::Function);
    for ty in params {
        table.add_parameter_type(f, ty.clone());
    }
    f
}

pub fn function(table: &mut SymbolTable, scope: SymbolId, name: &str, params: &[TypeDesc]) -> SymbolId {
    let f = function_symbol(table, name, params);
    table.add_symbol(scope, f).expect("function declares");
    f
}

/// `template <typename T> struct name {};` in the global namespace.
/// Returns the template, its class and `T`.
pub fn class_template(table: &mut SymbolTable, name: &str) -> (SymbolId, SymbolId, SymbolId) {
    let global = table.global_scope();
    let name = table.intern(name);
    let template = table.new_template_symbol(name);
    let t = table.intern("T");
    let t = table.new_template_parameter(t, BaseKind::TypeName);
    table.add_template_parameter(template, t).expect("parameter");
    let class = table.new_derivable_container_symbol(name, BaseKind::Struct);
    table.add_symbol(template, class).expect("templated class");
    table.add_symbol(global, template).expect("template declares");
    (template, class, t)
}

pub fn int() -> TypeDesc {
    TypeDesc::new(BaseKind::Int)
}
