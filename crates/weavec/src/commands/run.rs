use std::io::{self, Write};
use std::path::Path;

use weave_vm::{MapContext, UpCall, VirtualMachine};

use super::load::load_or_compile;

/// Drives the VM over stdin/stdout: lines are printed as they're yielded,
/// choices are numbered from 1, and an `Event` up-call is surfaced as a
/// plain annotation since there is no embedder to act on it here.
pub fn run(path: &Path) -> Result<(), String> {
    let file = load_or_compile(path)?;
    let mut vm = VirtualMachine::new(file.data());
    let mut ctx = MapContext::new();

    loop {
        match vm.exec(&mut ctx) {
            UpCall::Line => {
                println!("{}: \"{}\"", vm.id(), vm.line());
            }
            UpCall::Pick => {
                let mut indices = Vec::with_capacity(vm.nq() as usize);
                for n in 1..=vm.nq() {
                    let (text, edge_index) = vm.deq_text();
                    println!("  {n}: \"{text}\"");
                    indices.push(edge_index);
                }
                print!("\n> ");
                io::stdout().flush().map_err(|e| e.to_string())?;
                let mut line = String::new();
                io::stdin().read_line(&mut line).map_err(|e| e.to_string())?;
                println!();
                let choice: usize = line.trim().parse().map_err(|_| "expected a number".to_string())?;
                let index = *indices
                    .get(choice.wrapping_sub(1))
                    .ok_or_else(|| "choice out of range".to_string())?;
                vm.push(index as u64);
            }
            UpCall::Event => {
                println!("EVENT: {}\n", vm.line());
            }
            UpCall::Exit | UpCall::Abort => {
                println!("\n[weavec] end of file reached");
                return Ok(());
            }
            UpCall::None => unreachable!("exec never returns UpCall::None"),
        }
    }
}
