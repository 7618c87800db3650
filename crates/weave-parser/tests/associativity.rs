//! Property coverage for expression associativity: a chain of same-precedence
//! binary operators always nests left, regardless of chain length.

use proptest::prelude::*;
use weave_ast::arena::Arena;
use weave_ast::{BinOp, Expr, VertexBlock};

fn condition_of<'a>(graph: &'a weave_ast::Graph<'a>) -> &'a Expr<'a> {
    match graph.get("START").unwrap() {
        VertexBlock::IfElse(if_else) => &if_else.branches[0].cond,
        other => panic!("expected an if/else vertex block, got {other:?}"),
    }
}

fn left_nested_chain(expr: &Expr, names: &[String]) -> bool {
    if names.len() == 1 {
        return matches!(expr, &Expr::Ident(n) if n == names[0]);
    }
    if let &Expr::Binary(BinOp::Sub, lhs, rhs) = expr {
        let last = names.last().unwrap().as_str();
        let rhs_matches = matches!(rhs, &Expr::Ident(n) if n == last);
        return rhs_matches && left_nested_chain(lhs, &names[..names.len() - 1]);
    }
    false
}

proptest! {
    #[test]
    fn subtraction_chains_nest_left(len in 2usize..6) {
        let names: Vec<String> = (0..len).map(|i| format!("v{i}")).collect();
        let chain = names.join(" - ");
        let source = format!(
            r#"START = if {chain} then <A: "t"> => EXIT else <A: "f"> => EXIT end"#
        );

        let arena = Arena::new();
        let (graph, errors) = weave_parser::parse(&arena, &source);
        prop_assert!(errors.is_empty(), "{:?}", errors.errors);
        prop_assert!(left_nested_chain(condition_of(&graph), &names));
    }
}

#[test]
fn and_binds_tighter_than_or() {
    let arena = Arena::new();
    let (graph, errors) = weave_parser::parse(
        &arena,
        r#"START = if a && b || c then <A: "t"> => EXIT else <A: "f"> => EXIT end"#,
    );
    assert!(errors.is_empty(), "{:?}", errors.errors);

    match condition_of(&graph) {
        &Expr::Binary(BinOp::Or, lhs, rhs) => {
            assert!(matches!(rhs, &Expr::Ident("c")));
            assert!(matches!(lhs, &Expr::Binary(BinOp::And, _, _)));
        }
        other => panic!("expected a top-level `||`, got {other:?}"),
    }
}
