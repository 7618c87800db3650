//! Law 1: `load(save(compile(S))).code() == compile(S).code()` for every
//! shape of graph the generator lowers differently (fallthrough, choice,
//! if/else, match, effects) — not just the single case the unit tests cover.

use weave_ast::Arena;
use weave_codegen::{compile_from_source, CompiledFile};

fn round_trips(source: &str) {
    let arena = Arena::new();
    let original = compile_from_source(&arena, source).expect("source must compile");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("story.bsi");
    original.save(&path).unwrap();
    let loaded = CompiledFile::load(&path).unwrap();

    assert_eq!(loaded.header(), original.header());
    assert_eq!(loaded.code(), original.code());
    assert_eq!(loaded.strings(), original.strings());
    assert_eq!(loaded.symbols(), original.symbols());
}

#[test]
fn fallthrough_vertex_round_trips() {
    round_trips(r#"START = <Narrator: "hi"> => EXIT"#);
}

#[test]
fn choice_vertex_round_trips() {
    round_trips(
        r#"
        START = (
            "stay" => EXIT
            "go" => ABORT
        )
        "#,
    );
}

#[test]
fn if_else_vertex_round_trips() {
    round_trips(
        r#"
        START = if flag == 1 then
            <A: "one"> => EXIT
        else
            <A: "other"> => EXIT
        end
        "#,
    );
}

#[test]
fn match_vertex_round_trips() {
    round_trips(
        r#"
        START = match x with
            (1) <A: "a"> => EXIT
            (2) <A: "b"> => EXIT
            (_) <A: "c"> => EXIT
        end
        "#,
    );
}

#[test]
fn effect_edge_round_trips() {
    round_trips(
        r#"
        START = (
            "take sword" :: gold -= 5, event("pickup") => EXIT
            "leave" => EXIT
        )
        "#,
    );
}
