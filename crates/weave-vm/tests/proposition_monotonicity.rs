//! Law 6: between two consecutive `Pick` up-calls, dequeued `edge_index`
//! values are `0, 1, 2, …` strictly increasing by one, regardless of how
//! many choices a vertex offers.

use proptest::prelude::*;
use weave_ast::Arena;
use weave_vm::{MapContext, UpCall, VirtualMachine};

fn compiled(source: &str) -> weave_codegen::CompiledFile {
    let arena = Arena::new();
    weave_codegen::compile_from_source(&arena, source).expect("source must compile")
}

proptest! {
    #[test]
    fn pick_indices_are_dense_from_zero(n_choices in 1usize..=16) {
        let edges: Vec<String> = (0..n_choices)
            .map(|i| format!(r#""opt{i}" => EXIT"#))
            .collect();
        let source = format!("START = (\n{}\n)", edges.join("\n"));

        let file = compiled(&source);
        let mut vm = VirtualMachine::new(file.data());
        let mut ctx = MapContext::new();

        prop_assert_eq!(vm.exec(&mut ctx), UpCall::Pick);
        prop_assert_eq!(vm.nq() as usize, n_choices);

        for expected in 0..n_choices as u8 {
            let (_, edge_index) = vm.deq_text();
            prop_assert_eq!(edge_index, expected);
        }
    }
}
