//! Property-based tests for the symbol table.
//!
//! These generate random declarations and check properties that must hold
//! for any input:
//! 1. Signature comparison is reflexive and symmetric
//! 2. Lookup through arbitrary (possibly cyclic) using-directive graphs
//!    terminates and agrees with plain reachability
//! 3. Rolling back a mark undoes any sequence of mutations

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::doc_markdown,
    clippy::redundant_closure_for_method_calls,
    clippy::cast_possible_truncation,
    reason = "Proptest macros generate code with these patterns"
)]

mod common;

use cxs_sema::{BaseKind, Cv, SymbolId, SymbolTable, TypeDesc};
use proptest::prelude::*;

// -- Strategies --

/// A parameter type: a fundamental base with an optional `const` and at
/// most one pointer or reference.
fn param_strategy() -> impl Strategy<Value = TypeDesc> {
    let base = prop_oneof![
        Just(BaseKind::Int),
        Just(BaseKind::Char),
        Just(BaseKind::Double),
        Just(BaseKind::Bool),
    ];
    (base, any::<bool>(), 0..3u8).prop_map(|(kind, is_const, shape)| {
        let mut ty = TypeDesc::new(kind);
        if is_const {
            ty = ty.with_top_cv(Cv::CONST);
        }
        match shape {
            1 => ty.pointer(),
            2 => ty.reference(),
            _ => ty,
        }
    })
}

fn params_strategy() -> impl Strategy<Value = Vec<TypeDesc>> {
    prop::collection::vec(param_strategy(), 0..4)
}

/// Directed using-directive edges among `count` sibling namespaces.
fn directive_graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>, usize)> {
    (2..6usize).prop_flat_map(|count| {
        let edge = (0..count, 0..count).prop_filter("no self-directive", |(a, b)| a != b);
        (
            Just(count),
            prop::collection::vec(edge, 0..10),
            0..count,
        )
    })
}

#[derive(Clone, Debug)]
enum Mutation {
    Namespace { scope: usize, name: u8 },
    Variable { scope: usize, name: u8 },
    Function { scope: usize, name: u8, params: Vec<TypeDesc> },
    Directive { scope: usize, target: usize },
}

fn mutation_strategy() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        (0..3usize, 0..4u8).prop_map(|(scope, name)| Mutation::Namespace { scope, name }),
        (0..3usize, 0..4u8).prop_map(|(scope, name)| Mutation::Variable { scope, name }),
        (0..3usize, 0..4u8, params_strategy())
            .prop_map(|(scope, name, params)| Mutation::Function { scope, name, params }),
        (0..3usize, 0..3usize).prop_map(|(scope, target)| Mutation::Directive { scope, target }),
    ]
}

// -- Helpers --

/// The global scope followed by two namespaces declared in it.
fn base_scopes(table: &mut SymbolTable) -> Vec<SymbolId> {
    let global = table.global_scope();
    let first = common::namespace(table, global, "first");
    let second = common::namespace(table, global, "second");
    vec![global, first, second]
}

/// Apply a mutation, ignoring semantic rejections: a rejected declaration
/// still leaves work for the rollback to undo.
fn apply(table: &mut SymbolTable, scopes: &[SymbolId], mutation: &Mutation) {
    match mutation {
        Mutation::Namespace { scope, name } => {
            let name = table.intern(&format!("n{name}"));
            let ns = table.new_container_symbol(name, BaseKind::Namespace);
            let _ = table.add_symbol(scopes[*scope], ns);
        }
        Mutation::Variable { scope, name } => {
            let name = table.intern(&format!("v{name}"));
            let var = table.new_symbol_with_type(name, common::int());
            let _ = table.add_symbol(scopes[*scope], var);
        }
        Mutation::Function { scope, name, params } => {
            let f = common::function_symbol(table, &format!("f{name}"), params);
            let _ = table.add_symbol(scopes[*scope], f);
        }
        Mutation::Directive { scope, target } => {
            // The global scope is not a namespace that can be nominated.
            let target = scopes[1 + target % 2];
            let _ = table.add_using_directive(scopes[*scope], target);
        }
    }
}

fn reachable(edges: &[(usize, usize)], from: usize, to: usize) -> bool {
    let mut seen = vec![from];
    let mut stack = vec![from];
    while let Some(node) = stack.pop() {
        if node == to {
            return true;
        }
        for &(a, b) in edges {
            if a == node && !seen.contains(&b) {
                seen.push(b);
                stack.push(b);
            }
        }
    }
    false
}

// -- Properties --

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    })]

    /// A signature always matches a copy of itself.
    #[test]
    fn prop_same_parameters_reflexive(params in params_strategy()) {
        let mut table = common::table();
        let f = common::function_symbol(&mut table, "f", &params);
        let g = common::function_symbol(&mut table, "f", &params);
        prop_assert!(table.has_same_parameters(f, f));
        prop_assert!(table.has_same_parameters(f, g));
    }

    /// Signature comparison does not depend on argument order.
    #[test]
    fn prop_same_parameters_symmetric(a in params_strategy(), b in params_strategy()) {
        let mut table = common::table();
        let f = common::function_symbol(&mut table, "f", &a);
        let g = common::function_symbol(&mut table, "f", &b);
        prop_assert_eq!(table.has_same_parameters(f, g), table.has_same_parameters(g, f));
        if a.len() != b.len() {
            prop_assert!(!table.has_same_parameters(f, g));
        }
    }

    /// `x` declared in namespace `holder` is visible from namespace 0 exactly
    /// when a chain of directives leads there, whatever cycles the graph has.
    #[test]
    fn prop_directive_graph_lookup((count, edges, holder) in directive_graph_strategy()) {
        let mut table = common::table();
        let global = table.global_scope();
        let namespaces: Vec<SymbolId> = (0..count)
            .map(|i| common::namespace(&mut table, global, &format!("ns{i}")))
            .collect();
        for &(from, to) in &edges {
            table
                .add_using_directive(namespaces[from], namespaces[to])
                .expect("directive");
        }
        let x = common::variable(&mut table, namespaces[holder], "x", common::int());

        let name = table.intern("x");
        let expected = reachable(&edges, 0, holder).then_some(x);
        prop_assert_eq!(table.lookup_name(namespaces[0], name), Ok(expected));
    }

    /// Rolling back restores the arena size and every scope's contents.
    #[test]
    fn prop_rollback_restores_table(mutations in prop::collection::vec(mutation_strategy(), 0..24)) {
        let mut table = common::table();
        let scopes = base_scopes(&mut table);
        let before_len = table.len();
        let before_counts: Vec<usize> = scopes.iter().map(|&s| table.contained_count(s)).collect();

        let mark = table.mark();
        for mutation in &mutations {
            apply(&mut table, &scopes, mutation);
        }
        table.rollback(mark).expect("rollback");

        prop_assert_eq!(table.len(), before_len);
        let after_counts: Vec<usize> = scopes.iter().map(|&s| table.contained_count(s)).collect();
        prop_assert_eq!(after_counts, before_counts);
        prop_assert_eq!(table.live_marks(), 0);
        for name in ["v0", "v1", "v2", "v3"] {
            let name = table.intern(name);
            prop_assert_eq!(table.lookup_name(scopes[0], name), Ok(None));
        }
    }
}
