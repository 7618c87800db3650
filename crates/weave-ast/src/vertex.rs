use crate::block::{IfElse, Match};
use crate::edge::EdgeBlock;

/// A speaker tag plus its lines, emitted in source order: `<SPEAKER: "a", "b">`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSet<'a> {
    pub speaker: &'a str,
    pub lines: &'a [&'a str],
}

/// Either the vertex offers a choice (`edges` non-empty) or it is a pure
/// monologue that jumps straight to `fallthrough`. The two are mutually
/// exclusive by construction: the parser builds one or the other, never both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VertexTail<'a> {
    Fallthrough(&'a str),
    Choice(&'a [EdgeBlock<'a>]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex<'a> {
    pub lines: &'a [LineSet<'a>],
    pub tail: VertexTail<'a>,
}

/// A vertex, or a conditional wrapper selecting between whole vertices.
/// Vertex-blocks only nest at the top level of a graph (one per declared
/// vertex name), never inside a vertex's own choice region.
#[derive(Debug, Clone, PartialEq)]
pub enum VertexBlock<'a> {
    Vertex(Vertex<'a>),
    Match(Match<'a, &'a VertexBlock<'a>>),
    IfElse(IfElse<'a, &'a VertexBlock<'a>>),
}
