//! Bytecode code generator and binary file format for Weave.
//!
//! [`compile_from_ast`] lowers a parser-validated [`weave_ast::Graph`] to a
//! [`CompiledFile`] in one pass; [`compile_from_source`] chains a full
//! parse in front of it for callers that only have source text.

mod file;
mod header;
mod lower;
mod opcode;
mod symbol;
mod writer;

pub use file::{CompiledFile, LoadError};
pub use header::{Header, HeaderError, HEADER_LEN};
pub use lower::compile_from_ast;
pub use opcode::Opcode;
pub use symbol::{SymbolResolver, SymbolTable};

/// Parses `source` and lowers it straight to a [`CompiledFile`]. Returns the
/// parser's [`weave_parser::ErrorList`] unchanged when it is non-empty;
/// codegen never runs over an invalid graph.
pub fn compile_from_source(
    arena: &weave_ast::Arena,
    source: &str,
) -> Result<CompiledFile, weave_parser::ErrorList> {
    let (graph, errors) = weave_parser::parse(arena, source);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(compile_from_ast(&graph, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_ast::Arena;

    #[test]
    fn fallthrough_graph_compiles_and_ends_in_eof() {
        let arena = Arena::new();
        let file = compile_from_source(&arena, r#"START = <Narrator: "hi"> => EXIT"#).unwrap();
        let code = file.code();
        assert_eq!(code.last().copied(), Some(Opcode::Eof as u8));
        assert_eq!(code[0], Opcode::Line as u8);
    }

    #[test]
    fn choice_vertex_emits_pick_and_switch() {
        let arena = Arena::new();
        let src = r#"
            START = (
                "stay" => EXIT
                "go" => ABORT
            )
        "#;
        let file = compile_from_source(&arena, src).unwrap();
        let code = file.code();
        assert!(code.windows(2).any(|w| w == [Opcode::Prop as u8, 0]));
        assert!(code
            .windows(2)
            .any(|w| w == [Opcode::Pick as u8, Opcode::Switch as u8]));
    }

    #[test]
    fn effect_edge_lowers_to_a_thunk_that_jumps_to_its_target() {
        let arena = Arena::new();
        let src = r#"
            START = (
                "take" :: gold += 5 => EXIT
            )
        "#;
        let file = compile_from_source(&arena, src).unwrap();
        let code = file.code();
        assert!(code.contains(&(Opcode::Add as u8)));
        assert!(code.contains(&(Opcode::Store as u8)));
    }

    #[test]
    fn invalid_source_surfaces_the_parse_errors_without_compiling() {
        let arena = Arena::new();
        let result = compile_from_source(&arena, r#"START = <Narrator: "hi"> => nowhere"#);
        assert!(result.is_err());
    }

    #[test]
    fn round_trips_through_a_file_on_disk() {
        let arena = Arena::new();
        let file = compile_from_source(&arena, r#"START = <Narrator: "hi"> => EXIT"#).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bsi");
        file.save(&path).unwrap();
        let loaded = CompiledFile::load(&path).unwrap();
        assert_eq!(loaded.header(), file.header());
        assert_eq!(loaded.code(), file.code());
    }

    #[test]
    fn own_symbol_table_assigns_dense_first_seen_ids() {
        let arena = Arena::new();
        let src = r#"
            START = <Alice: "hi"> <Bob: "yo"> => EXIT
        "#;
        let file = compile_from_source(&arena, src).unwrap();
        assert!(file.header().sym_loc != 0);
        assert!(!file.symbols().unwrap().is_empty());
    }

    struct FixedResolver;
    impl SymbolResolver for FixedResolver {
        fn resolve(&mut self, _name: &str) -> u32 {
            7
        }
    }

    #[test]
    fn external_resolver_suppresses_the_symbol_section() {
        let arena = Arena::new();
        let (graph, errors) =
            weave_parser::parse(&arena, r#"START = <Alice: "hi"> => EXIT"#);
        assert!(errors.is_empty());
        let mut resolver = FixedResolver;
        let file = compile_from_ast(&graph, Some(&mut resolver));
        assert_eq!(file.header().sym_loc, 0);
        assert!(file.symbols().is_none());
    }
}
