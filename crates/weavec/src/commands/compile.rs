use std::path::Path;

use super::load::load_or_compile;

pub fn run(path: &Path) -> Result<(), String> {
    let file = load_or_compile(path)?;
    print!("{}", weave_fmt::disassemble(file.data()));
    Ok(())
}
