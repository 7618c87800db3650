//! Diagnostic disassembler for bytecode produced by `weave-codegen`.
//!
//! [`disassemble`] is not on the compile-or-run critical path — it exists
//! to inspect a compiled artifact and to sanity-check the generator
//! against the VM during development, the same role `prettyprint` plays
//! in the original.

use std::collections::HashMap;
use std::fmt::Write as _;

use weave_codegen::Opcode;

const V_START: u32 = 0;
const V_END: u32 = 0xFFFF_FFFF;
const V_ABORT: u32 = 0xFFFF_FFFE;

fn read_u8(code: &[u8], at: u32) -> u8 {
    code[at as usize]
}

fn read_u32(code: &[u8], at: u32) -> u32 {
    let at = at as usize;
    u32::from_le_bytes(code[at..at + 4].try_into().unwrap())
}

fn read_u64(code: &[u8], at: u32) -> u64 {
    let at = at as usize;
    u64::from_le_bytes(code[at..at + 8].try_into().unwrap())
}

fn cstr_at(code: &[u8], offset: u32) -> &str {
    let start = offset as usize;
    let len = code[start..].iter().position(|&b| b == 0).unwrap();
    std::str::from_utf8(&code[start..start + len]).unwrap()
}

/// First pass: walks the code section once, purely to discover every
/// address a `Jump`/`Jz`/`Jnz`/`Switch` can land on and assign it a label.
/// `Switch`'s table length isn't stored as an operand — it equals the
/// number of `Prop` instructions emitted since the last `Switch`, so this
/// pass tracks that count the same way codegen produced it.
fn discover_labels(code: &[u8]) -> HashMap<u32, String> {
    let mut labels = HashMap::new();
    labels.insert(V_START, "<START>".to_string());
    labels.insert(V_END, "<EXIT>".to_string());
    labels.insert(V_ABORT, "<ABORT>".to_string());

    let mut next_local = 0u32;
    let mut mark = |labels: &mut HashMap<u32, String>, addr: u32, next_local: &mut u32| {
        labels.entry(addr).or_insert_with(|| {
            let name = format!(".L{next_local}");
            *next_local += 1;
            name
        });
    };

    let mut pc = 0u32;
    let mut props_since_switch = 0u32;
    while (pc as usize) < code.len() {
        let opcode = Opcode::from_u8(read_u8(code, pc)).expect("invalid opcode in compiled artifact");
        pc += 1;
        match opcode {
            Opcode::Eof => break,
            Opcode::Jump | Opcode::Jz | Opcode::Jnz => {
                let target = read_u32(code, pc);
                mark(&mut labels, target, &mut next_local);
                pc += 4;
            }
            Opcode::Switch => {
                for _ in 0..props_since_switch {
                    let target = read_u32(code, pc);
                    mark(&mut labels, target, &mut next_local);
                    pc += 4;
                }
                props_since_switch = 0;
            }
            Opcode::Prop => {
                pc += 5;
                props_since_switch += 1;
            }
            Opcode::Push | Opcode::IeqV => pc += 8,
            Opcode::Load | Opcode::Store | Opcode::IeqK | Opcode::Event => pc += 4,
            Opcode::Line => pc += 8,
            Opcode::Pop
            | Opcode::Land
            | Opcode::Lor
            | Opcode::Lnot
            | Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Neg
            | Opcode::Equ
            | Opcode::Neq
            | Opcode::Leq
            | Opcode::Lth
            | Opcode::Geq
            | Opcode::Gth
            | Opcode::Pick => {}
        }
    }
    labels
}

/// Renders `code` as one line per instruction, with a label line wherever
/// the first pass found a jump target. Takes the full compiled payload
/// (`CompiledFile::data()`), not just the code section (`code()`): `Line`,
/// `Prop`, and `Event` operands are string offsets into the whole payload.
pub fn disassemble(code: &[u8]) -> String {
    let labels = discover_labels(code);
    let mut out = String::new();
    let mut pc = 0u32;
    let mut props_since_switch = 0u32;

    while (pc as usize) < code.len() {
        if let Some(label) = labels.get(&pc) {
            let _ = writeln!(out, "    {label}:");
        }
        let addr = pc;
        let opcode = Opcode::from_u8(read_u8(code, pc)).expect("invalid opcode in compiled artifact");
        pc += 1;

        match opcode {
            Opcode::Eof => {
                let _ = writeln!(out, "0x{addr:04X}    EOF");
                break;
            }
            Opcode::Push => {
                let imm = read_u64(code, pc);
                pc += 8;
                let _ = writeln!(out, "0x{addr:04X}    PUSH ${imm}");
            }
            Opcode::Pop => {
                let _ = writeln!(out, "0x{addr:04X}    POP");
            }
            Opcode::Load => {
                let sym = read_u32(code, pc);
                pc += 4;
                let _ = writeln!(out, "0x{addr:04X}    LOAD @{sym}");
            }
            Opcode::Store => {
                let sym = read_u32(code, pc);
                pc += 4;
                let _ = writeln!(out, "0x{addr:04X}    STORE @{sym}");
            }
            Opcode::Land => {
                let _ = writeln!(out, "0x{addr:04X}    LAND");
            }
            Opcode::Lor => {
                let _ = writeln!(out, "0x{addr:04X}    LOR");
            }
            Opcode::Lnot => {
                let _ = writeln!(out, "0x{addr:04X}    LNOT");
            }
            Opcode::Add => {
                let _ = writeln!(out, "0x{addr:04X}    ADD");
            }
            Opcode::Sub => {
                let _ = writeln!(out, "0x{addr:04X}    SUB");
            }
            Opcode::Mul => {
                let _ = writeln!(out, "0x{addr:04X}    MUL");
            }
            Opcode::Div => {
                let _ = writeln!(out, "0x{addr:04X}    DIV");
            }
            Opcode::Neg => {
                let _ = writeln!(out, "0x{addr:04X}    NEG");
            }
            Opcode::Equ => {
                let _ = writeln!(out, "0x{addr:04X}    EQU");
            }
            Opcode::Neq => {
                let _ = writeln!(out, "0x{addr:04X}    NEQ");
            }
            Opcode::IeqV => {
                let imm = read_u64(code, pc);
                pc += 8;
                let _ = writeln!(out, "0x{addr:04X}    IEQ  ${imm}");
            }
            Opcode::IeqK => {
                let sym = read_u32(code, pc);
                pc += 4;
                let _ = writeln!(out, "0x{addr:04X}    IEQ  {sym}");
            }
            Opcode::Leq => {
                let _ = writeln!(out, "0x{addr:04X}    LEQ");
            }
            Opcode::Lth => {
                let _ = writeln!(out, "0x{addr:04X}    LTH");
            }
            Opcode::Geq => {
                let _ = writeln!(out, "0x{addr:04X}    GEQ");
            }
            Opcode::Gth => {
                let _ = writeln!(out, "0x{addr:04X}    GTH");
            }
            Opcode::Jump => {
                let target = read_u32(code, pc);
                pc += 4;
                let _ = writeln!(out, "0x{addr:04X}    JUMP {}", labels[&target]);
            }
            Opcode::Jz => {
                let target = read_u32(code, pc);
                pc += 4;
                let _ = writeln!(out, "0x{addr:04X}    JZ   {}", labels[&target]);
            }
            Opcode::Jnz => {
                let target = read_u32(code, pc);
                pc += 4;
                let _ = writeln!(out, "0x{addr:04X}    JNZ  {}", labels[&target]);
            }
            Opcode::Switch => {
                let mut targets = Vec::with_capacity(props_since_switch as usize);
                for _ in 0..props_since_switch {
                    let target = read_u32(code, pc);
                    pc += 4;
                    targets.push(labels[&target].clone());
                }
                props_since_switch = 0;
                let _ = writeln!(out, "0x{addr:04X}    SWITCH [ {} ]", targets.join(", "));
            }
            Opcode::Prop => {
                let string_ref = read_u32(code, pc);
                pc += 4;
                let index = read_u8(code, pc);
                pc += 1;
                let text = cstr_at(code, string_ref);
                let _ = writeln!(out, "0x{addr:04X}    PROP \"{text}\", {index}");
                props_since_switch += 1;
            }
            Opcode::Pick => {
                let _ = writeln!(out, "0x{addr:04X}    PICK");
            }
            Opcode::Line => {
                let speaker = read_u32(code, pc);
                pc += 4;
                let string_ref = read_u32(code, pc);
                pc += 4;
                let text = cstr_at(code, string_ref);
                let _ = writeln!(out, "0x{addr:04X}    LINE {speaker}, \"{text}\"");
            }
            Opcode::Event => {
                let string_ref = read_u32(code, pc);
                pc += 4;
                let text = cstr_at(code, string_ref);
                let _ = writeln!(out, "0x{addr:04X}    EVENT \"{text}\"");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_ast::Arena;
    use weave_codegen::compile_from_source;

    #[test]
    fn labels_the_entry_point_and_prints_a_line_instruction() {
        let arena = Arena::new();
        let file = compile_from_source(&arena, r#"START = <A: "hi"> => EXIT"#).unwrap();
        let text = disassemble(file.data());
        assert!(text.contains("<START>:"));
        assert!(text.contains("LINE"));
        assert!(text.contains("\"hi\""));
        assert!(text.contains("EOF"));
    }

    #[test]
    fn choice_vertex_prints_prop_and_switch_with_resolved_labels() {
        let arena = Arena::new();
        let file = compile_from_source(
            &arena,
            r#"
            START = (
                "stay" => EXIT
                "go" => ABORT
            )
            "#,
        )
        .unwrap();
        let text = disassemble(file.data());
        assert!(text.contains("PROP \"stay\", 0"));
        assert!(text.contains("PROP \"go\", 1"));
        assert!(text.contains("SWITCH [ <EXIT>, <ABORT> ]"));
    }
}
