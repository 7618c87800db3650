use crate::expr::Expr;

/// One mutation or emission inside an edge's `:: ...` effect block.
///
/// Resolves the source spec's open question about the effect grammar:
/// `ident (= | += | -=) expr` plus `event(strlit)`, comma-separated.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect<'a> {
    Assign { target: &'a str, value: Expr<'a> },
    AddAssign { target: &'a str, value: Expr<'a> },
    SubAssign { target: &'a str, value: Expr<'a> },
    Event { text: &'a str },
}
