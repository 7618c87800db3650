use crate::block::{IfElse, Match};
use crate::effect::Effect;

/// A player-visible choice: line text, optional side effect, and the
/// vertex it transitions to (`START`/`EXIT`/`ABORT` or a declared name).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge<'a> {
    pub line: &'a str,
    pub effect: Option<&'a [Effect<'a>]>,
    pub next: &'a str,
}

/// An edge, or a conditional wrapper around a list of edges/edge-blocks.
/// Edge-blocks nest arbitrarily within a vertex's choice region.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeBlock<'a> {
    Edges(&'a [Edge<'a>]),
    Match(Match<'a, &'a Edge<'a>>),
    IfElse(IfElse<'a, &'a [EdgeBlock<'a>]>),
}
