//! Recursive-descent parser for Weave dialogue graphs.
//!
//! [`parse`] turns source text into a [`weave_ast::Graph`] plus an
//! [`ErrorList`]; a non-empty list means the graph must not be handed to
//! codegen, whether or not parsing reached the end of the token stream.

mod effect;
mod error;
mod expr;
mod grammar;
mod stream;

pub use error::{Error, ErrorKind, ErrorList};
pub use grammar::parse;

pub type ParseResult<T> = Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use weave_ast::arena::Arena;
    use weave_ast::{EdgeBlock, VertexBlock, VertexTail};

    #[test]
    fn minimal_graph_parses_clean() {
        let arena = Arena::new();
        let (graph, errors) = parse(&arena, r#"START = <Narrator: "hi"> => EXIT"#);
        assert!(errors.is_empty(), "{:?}", errors.errors);
        assert!(graph.vert_names.contains_key("START"));
    }

    #[test]
    fn missing_start_is_recoverable_no_entry_point() {
        let arena = Arena::new();
        let (_graph, errors) = parse(&arena, r#"other = <Narrator: "hi"> => EXIT"#);
        assert!(errors
            .errors
            .iter()
            .any(|e| e.kind == ErrorKind::NoEntryPoint));
    }

    #[test]
    fn dangling_edge_is_recorded() {
        let arena = Arena::new();
        let (_graph, errors) = parse(&arena, r#"START = <Narrator: "hi"> => nowhere"#);
        assert!(errors
            .errors
            .iter()
            .any(|e| e.kind == ErrorKind::DanglingEdge));
    }

    #[test]
    fn duplicate_vertex_name_is_recorded() {
        let arena = Arena::new();
        let src = r#"
            START = <Narrator: "a"> => EXIT
            START = <Narrator: "b"> => EXIT
        "#;
        let (_graph, errors) = parse(&arena, src);
        assert!(errors
            .errors
            .iter()
            .any(|e| e.kind == ErrorKind::MultiVertexName));
    }

    #[test]
    fn rename_resolves_dangling_target() {
        let arena = Arena::new();
        let src = r#"
            rename real => alias
            START = <Narrator: "go"> => alias
            real = <Narrator: "done"> => EXIT
        "#;
        let (_graph, errors) = parse(&arena, src);
        assert!(errors.is_empty(), "{:?}", errors.errors);
    }

    #[test]
    fn choice_vertex_with_effect_parses() {
        let arena = Arena::new();
        let src = r#"
            START = (
                "take sword" :: gold -= 5, event("pickup") => EXIT
                "leave" => EXIT
            )
        "#;
        let (graph, errors) = parse(&arena, src);
        assert!(errors.is_empty(), "{:?}", errors.errors);
        let block = graph.get("START").unwrap();
        match block {
            VertexBlock::Vertex(v) => match &v.tail {
                VertexTail::Choice(blocks) => {
                    assert_eq!(blocks.len(), 1);
                    match &blocks[0] {
                        EdgeBlock::Edges(edges) => assert_eq!(edges.len(), 2),
                        _ => panic!("expected a flat edge list"),
                    }
                }
                _ => panic!("expected a choice tail"),
            },
            _ => panic!("expected a plain vertex"),
        }
    }

    #[test]
    fn if_without_else_reports_no_else() {
        let arena = Arena::new();
        let src = r#"
            START = if flag then
                => EXIT
            end
        "#;
        let (_graph, errors) = parse(&arena, src);
        assert!(errors.errors.iter().any(|e| e.kind == ErrorKind::NoElse));
    }

    #[test]
    fn match_without_catchall_reports_no_catchall() {
        let arena = Arena::new();
        let src = r#"
            START = match x with
                (1) => EXIT
            end
        "#;
        let (_graph, errors) = parse(&arena, src);
        assert!(errors
            .errors
            .iter()
            .any(|e| e.kind == ErrorKind::NoCatchall));
    }
}
