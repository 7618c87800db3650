use std::path::Path;

use weave_ast::Arena;
use weave_codegen::CompiledFile;

use crate::diagnostics;

/// Compiles a `.qsi` source file or loads a precompiled `.bsi` artifact,
/// dispatching on extension the way the original CLI does.
pub fn load_or_compile(path: &Path) -> Result<CompiledFile, String> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("bsi") => weave_codegen::CompiledFile::load(path).map_err(|e| e.to_string()),
        Some("qsi") => {
            let source = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
            let arena = Arena::new();
            let (graph, errors) = weave_parser::parse(&arena, &source);
            if !errors.is_empty() {
                diagnostics::print_all(&path.display().to_string(), &source, &errors);
                return Err("compilation failed".to_string());
            }
            Ok(weave_codegen::compile_from_ast(&graph, None))
        }
        _ => Err("unrecognized file extension (expected .qsi or .bsi)".to_string()),
    }
}
