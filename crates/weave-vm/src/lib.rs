//! Stack-based interpreter for bytecode produced by `weave-codegen`.
//!
//! [`VirtualMachine`] executes a borrowed code buffer one up-call at a
//! time; the host drives it by calling [`VirtualMachine::exec`] and
//! reacting to the returned [`UpCall`].

mod context;
mod machine;

pub use context::{MapContext, VariableContext};
pub use machine::{UpCall, VirtualMachine};

#[cfg(test)]
mod tests {
    use super::*;
    use weave_ast::Arena;
    use weave_codegen::compile_from_source;

    fn compiled(source: &str) -> weave_codegen::CompiledFile {
        let arena = Arena::new();
        compile_from_source(&arena, source).expect("source should compile")
    }

    #[test]
    fn plain_line_then_exit() {
        let file = compiled(r#"START = <A: "hi"> => EXIT"#);
        let mut vm = VirtualMachine::new(file.data());
        let mut ctx = MapContext::new();

        assert_eq!(vm.exec(&mut ctx), UpCall::Line);
        assert_eq!(vm.line(), "hi");
        assert_eq!(vm.exec(&mut ctx), UpCall::Exit);
    }

    #[test]
    fn pick_enqueues_in_edge_index_order_and_switch_honors_choice() {
        let file = compiled(
            r#"
            START = (
                "yes" => EXIT
                "no" => ABORT
            )
            "#,
        );
        let mut vm = VirtualMachine::new(file.data());
        let mut ctx = MapContext::new();

        assert_eq!(vm.exec(&mut ctx), UpCall::Pick);
        assert_eq!(vm.nq(), 2);
        let (text0, idx0) = vm.deq_text();
        assert_eq!((text0, idx0), ("yes", 0));
        let (text1, idx1) = vm.deq_text();
        assert_eq!((text1, idx1), ("no", 1));

        vm.push(0);
        assert_eq!(vm.exec(&mut ctx), UpCall::Exit);
    }

    #[test]
    fn abort_branch_is_reachable_on_reset() {
        let file = compiled(
            r#"
            START = (
                "yes" => EXIT
                "no" => ABORT
            )
            "#,
        );
        let mut vm = VirtualMachine::new(file.data());
        let mut ctx = MapContext::new();
        vm.exec(&mut ctx);
        vm.deq_text();
        vm.deq_text();
        vm.push(1);
        assert_eq!(vm.exec(&mut ctx), UpCall::Abort);
    }

    #[test]
    fn if_else_branches_on_context_state() {
        let file = compiled(
            r#"
            START = if x == 1 then
                <A: "one"> => EXIT
            else
                <A: "other"> => EXIT
            end
            "#,
        );
        let mut ctx = MapContext::new().with(0, 1);
        let mut vm = VirtualMachine::new(file.data());
        assert_eq!(vm.exec(&mut ctx), UpCall::Line);
        assert_eq!(vm.line(), "one");
    }

    #[test]
    fn match_selects_the_matching_arm() {
        let file = compiled(
            r#"
            START = match x with
                (1) <A: "a"> => EXIT
                (2) <A: "b"> => EXIT
                (_) <A: "c"> => EXIT
            end
            "#,
        );
        let mut ctx = MapContext::new().with(0, 2);
        let mut vm = VirtualMachine::new(file.data());
        assert_eq!(vm.exec(&mut ctx), UpCall::Line);
        assert_eq!(vm.line(), "b");
    }

    #[test]
    fn effect_mutates_context_before_the_edge_target_runs() {
        let file = compiled(
            r#"
            START = (
                "take" :: gold += 5 => next
            )
            next = <A: "done"> => EXIT
            "#,
        );
        let mut ctx = MapContext::new().with(0, 10);
        let mut vm = VirtualMachine::new(file.data());
        vm.exec(&mut ctx);
        vm.deq_text();
        vm.push(0);
        assert_eq!(vm.exec(&mut ctx), UpCall::Line);
        assert_eq!(*ctx.cell(0, false), 15);
    }

    #[test]
    fn line_with_escaped_newline_decodes_to_a_real_newline() {
        let file = compiled(r#"START = <A: "line\nbreak"> => EXIT"#);
        let mut vm = VirtualMachine::new(file.data());
        let mut ctx = MapContext::new();
        vm.exec(&mut ctx);
        assert_eq!(vm.line(), "line\nbreak");
    }
}
