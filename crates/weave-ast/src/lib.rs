//! Arena-allocated AST for Weave dialogue graphs.
//!
//! Every node borrows from a caller-owned [`arena::Arena`] rather than
//! owning its children, mirroring the lexer's borrow from the source text:
//! a `Graph<'a>` is only ever as long-lived as the arena it was built in.

pub mod arena;
pub mod block;
pub mod edge;
pub mod effect;
pub mod expr;
pub mod graph;
pub mod vertex;

pub use arena::Arena;
pub use block::{IfBranch, IfElse, Match, MatchArm};
pub use edge::{Edge, EdgeBlock};
pub use effect::Effect;
pub use expr::{BinOp, Expr, UnOp};
pub use graph::Graph;
pub use vertex::{LineSet, Vertex, VertexBlock, VertexTail};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_rejects_duplicate_names() {
        let arena = Arena::new();
        let mut graph = Graph::new();
        let name = arena::alloc_str(&arena, "intro");
        let vertex = VertexBlock::Vertex(Vertex {
            lines: &[],
            tail: VertexTail::Fallthrough("EXIT"),
        });
        assert!(graph.declare(name, vertex.clone()));
        assert!(!graph.declare(name, vertex));
        assert_eq!(graph.vertices.len(), 1);
    }

    #[test]
    fn resolve_follows_rename_table_once() {
        let mut graph: Graph = Graph::new();
        graph.declare(
            "real_name",
            VertexBlock::Vertex(Vertex {
                lines: &[],
                tail: VertexTail::Fallthrough("EXIT"),
            }),
        );
        graph.add_rename("old_name", "real_name");
        assert_eq!(graph.resolve("old_name"), Some("real_name"));
        assert_eq!(graph.resolve("real_name"), Some("real_name"));
        assert_eq!(graph.resolve("missing"), None);
    }

    #[test]
    fn resolve_always_accepts_sentinels() {
        let graph: Graph = Graph::new();
        assert_eq!(graph.resolve("START"), Some("START"));
        assert_eq!(graph.resolve("EXIT"), Some("EXIT"));
        assert_eq!(graph.resolve("ABORT"), Some("ABORT"));
    }

    #[test]
    fn expr_tree_allocates_in_arena() {
        let arena = Arena::new();
        let lhs = arena.alloc(Expr::Ident("flag"));
        let rhs = arena.alloc(Expr::Immediate(1));
        let cmp = Expr::Binary(BinOp::Eq, lhs, rhs);
        match cmp {
            Expr::Binary(BinOp::Eq, Expr::Ident(name), Expr::Immediate(v)) => {
                assert_eq!(*name, "flag");
                assert_eq!(*v, 1);
            }
            _ => panic!("unexpected shape"),
        }
    }
}
