use std::collections::HashMap;

use crate::vertex::VertexBlock;

/// A parsed dialogue graph: every declared vertex in source order, a name
/// index for `O(1)` lookup during validation and codegen, and the rename
/// table built from `rename OLD as NEW` directives.
///
/// `START` and the sentinels `EXIT`/`ABORT` are never entries in `vertices`;
/// they are resolved specially wherever a `next` name is looked up.
#[derive(Debug, Default)]
pub struct Graph<'a> {
    pub vertices: Vec<(&'a str, VertexBlock<'a>)>,
    pub vert_names: HashMap<&'a str, usize>,
    pub rename_table: HashMap<&'a str, &'a str>,
}

impl<'a> Graph<'a> {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            vert_names: HashMap::new(),
            rename_table: HashMap::new(),
        }
    }

    /// Declares a vertex. Returns `false` without inserting if `name` is
    /// already declared, letting the caller raise a `MultiVertexName` error.
    pub fn declare(&mut self, name: &'a str, block: VertexBlock<'a>) -> bool {
        if self.vert_names.contains_key(name) {
            return false;
        }
        let idx = self.vertices.len();
        self.vertices.push((name, block));
        self.vert_names.insert(name, idx);
        true
    }

    pub fn add_rename(&mut self, old: &'a str, new: &'a str) {
        self.rename_table.insert(old, new);
    }

    /// Resolves a `next` target through the rename table (renames are not
    /// chained: a name is rewritten at most once) and reports whether it
    /// names a declared vertex. `START`, `EXIT`, and `ABORT` always resolve.
    pub fn resolve(&self, name: &'a str) -> Option<&'a str> {
        let resolved = self.rename_table.get(name).copied().unwrap_or(name);
        if matches!(resolved, "START" | "EXIT" | "ABORT") || self.vert_names.contains_key(resolved)
        {
            Some(resolved)
        } else {
            None
        }
    }

    pub fn get(&self, name: &str) -> Option<&VertexBlock<'a>> {
        self.vert_names.get(name).map(|&idx| &self.vertices[idx].1)
    }
}
