use std::collections::HashMap;

use weave_ast::{
    BinOp, Edge, EdgeBlock, Effect, Expr, Graph, UnOp, Vertex, VertexBlock, VertexTail,
};

use crate::file::CompiledFile;
use crate::header::Header;
use crate::opcode::Opcode;
use crate::symbol::{SymbolResolver, SymbolTable};
use crate::writer::Writer;

fn binop_opcode(op: BinOp) -> Opcode {
    match op {
        BinOp::Or => Opcode::Lor,
        BinOp::And => Opcode::Land,
        BinOp::Eq => Opcode::Equ,
        BinOp::Ne => Opcode::Neq,
        BinOp::Lt => Opcode::Lth,
        BinOp::Gt => Opcode::Gth,
        BinOp::Le => Opcode::Leq,
        BinOp::Ge => Opcode::Geq,
        BinOp::Add => Opcode::Add,
        BinOp::Sub => Opcode::Sub,
        BinOp::Mul => Opcode::Mul,
        BinOp::Div => Opcode::Div,
    }
}

/// Decodes `\n`, `\"`, `\\` in a source string literal's body. The lexer
/// keeps literals raw (quotes and backslashes intact) so the generator is
/// the single place escapes are resolved, same division of labor as the
/// original's string-table writer.
fn decode_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

enum SymbolSource<'r> {
    Owned(SymbolTable),
    External(&'r mut dyn SymbolResolver),
}

/// Sentinel jump targets that never appear in `Graph::vertices`.
const EXIT_ADDR: u32 = 0xFFFF_FFFF;
const ABORT_ADDR: u32 = 0xFFFF_FFFE;

struct Lowerer<'a, 'r> {
    writer: Writer,
    labels: HashMap<String, u32>,
    jumps: Vec<(u32, String)>,
    strings: Vec<(u32, String)>,
    symbols: SymbolSource<'r>,
    label_index: u32,
    /// Switch targets for the vertex currently being compiled, in `Prop`
    /// index order.
    edges: Vec<String>,
    /// Effect-bearing edges of the current vertex get a generated label
    /// instead of jumping straight to their target; the thunk (run effect,
    /// then jump) is emitted right after that vertex's `Switch` table.
    thunks: Vec<(String, &'a [Effect<'a>], &'a str)>,
}

impl<'a, 'r> Lowerer<'a, 'r> {
    fn new(resolver: Option<&'r mut dyn SymbolResolver>) -> Self {
        let symbols = match resolver {
            Some(r) => SymbolSource::External(r),
            None => SymbolSource::Owned(SymbolTable::new()),
        };
        Self {
            writer: Writer::new(),
            labels: HashMap::new(),
            jumps: Vec::new(),
            strings: Vec::new(),
            symbols,
            label_index: 0,
            edges: Vec::new(),
            thunks: Vec::new(),
        }
    }

    fn gen_label(&mut self) -> String {
        let label = format!(".{}", self.label_index);
        self.label_index += 1;
        label
    }

    fn resolve_sym(&mut self, name: &str) -> u32 {
        match &mut self.symbols {
            SymbolSource::Owned(table) => table.resolve(name),
            SymbolSource::External(resolver) => resolver.resolve(name),
        }
    }

    fn compile_expr(&mut self, expr: &Expr<'a>, ieq: bool) {
        match expr {
            Expr::Ident(name) => {
                let sym = self.resolve_sym(name);
                self.writer
                    .push_u8(if ieq { Opcode::IeqK } else { Opcode::Load } as u8);
                self.writer.push_u32(sym);
            }
            Expr::Immediate(value) => {
                self.writer
                    .push_u8(if ieq { Opcode::IeqV } else { Opcode::Push } as u8);
                self.writer.push_u64(*value);
            }
            Expr::Unary(UnOp::Not, operand) => {
                self.compile_expr(operand, false);
                self.writer.push_u8(Opcode::Lnot as u8);
            }
            Expr::Binary(op, lhs, rhs) => {
                self.compile_expr(lhs, false);
                self.compile_expr(rhs, false);
                self.writer.push_u8(binop_opcode(*op) as u8);
            }
        }
    }

    fn compile_effects(&mut self, effects: &[Effect<'a>]) {
        for effect in effects {
            match effect {
                Effect::Assign { target, value } => {
                    self.compile_expr(value, false);
                    let sym = self.resolve_sym(target);
                    self.writer.push_u8(Opcode::Store as u8);
                    self.writer.push_u32(sym);
                }
                Effect::AddAssign { target, value } => {
                    let sym = self.resolve_sym(target);
                    self.writer.push_u8(Opcode::Load as u8);
                    self.writer.push_u32(sym);
                    self.compile_expr(value, false);
                    self.writer.push_u8(Opcode::Add as u8);
                    self.writer.push_u8(Opcode::Store as u8);
                    self.writer.push_u32(sym);
                }
                Effect::SubAssign { target, value } => {
                    let sym = self.resolve_sym(target);
                    self.writer.push_u8(Opcode::Load as u8);
                    self.writer.push_u32(sym);
                    self.compile_expr(value, false);
                    self.writer.push_u8(Opcode::Sub as u8);
                    self.writer.push_u8(Opcode::Store as u8);
                    self.writer.push_u32(sym);
                }
                Effect::Event { text } => {
                    self.writer.push_u8(Opcode::Event as u8);
                    let pos = self.writer.len();
                    self.strings.push((pos, (*text).to_string()));
                    self.writer.push_u32(0);
                }
            }
        }
    }

    /// Emits a `Prop` for one edge and records its eventual `Switch` target.
    /// Edges are visited (and thus indexed) in the same order regardless of
    /// `if`/`match` nesting, since the index is assigned from the length of
    /// `self.edges` at the moment each edge is reached.
    fn compile_edge(&mut self, edge: &Edge<'a>) {
        let index = self.edges.len() as u8;
        self.writer.push_u8(Opcode::Prop as u8);
        let pos = self.writer.len();
        self.strings.push((pos, edge.line.to_string()));
        self.writer.push_u32(0);
        self.writer.push_u8(index);

        let target = match edge.effect {
            Some(effects) => {
                let label = self.gen_label();
                self.thunks.push((label.clone(), effects, edge.next));
                label
            }
            None => edge.next.to_string(),
        };
        self.edges.push(target);
    }

    fn compile_eblock(&mut self, block: &EdgeBlock<'a>) {
        match block {
            EdgeBlock::Edges(edges) => {
                for edge in edges.iter() {
                    self.compile_edge(edge);
                }
            }
            EdgeBlock::IfElse(ie) => {
                let end_label = self.gen_label();
                let last = ie.branches.len() - 1;
                for (i, branch) in ie.branches.iter().enumerate() {
                    let next_label = self.gen_label();
                    self.compile_expr(&branch.cond, false);
                    self.writer.push_u8(Opcode::Jz as u8);
                    let pos = self.writer.len();
                    self.jumps.push((pos, next_label.clone()));
                    self.writer.push_u32(0);

                    for sub in branch.body.iter() {
                        self.compile_eblock(sub);
                    }
                    if i < last || ie.catchall.is_some() {
                        self.writer.push_u8(Opcode::Jump as u8);
                        let pos = self.writer.len();
                        self.jumps.push((pos, end_label.clone()));
                        self.writer.push_u32(0);
                    }
                    self.labels.insert(next_label, self.writer.len());
                }
                if let Some(catchall) = ie.catchall {
                    for sub in catchall.iter() {
                        self.compile_eblock(sub);
                    }
                }
                self.labels.insert(end_label, self.writer.len());
            }
            EdgeBlock::Match(m) => {
                let end_label = self.gen_label();
                self.compile_expr(&m.scrutinee, false);
                for arm in m.arms.iter() {
                    let next_label = self.gen_label();
                    self.compile_expr(&arm.pattern, true);
                    self.writer.push_u8(Opcode::Jz as u8);
                    let pos = self.writer.len();
                    self.jumps.push((pos, next_label.clone()));
                    self.writer.push_u32(0);

                    self.compile_edge(arm.body);
                    self.writer.push_u8(Opcode::Jump as u8);
                    let pos = self.writer.len();
                    self.jumps.push((pos, end_label.clone()));
                    self.writer.push_u32(0);
                    self.labels.insert(next_label, self.writer.len());
                }
                if let Some(catchall) = m.catchall {
                    self.compile_edge(catchall);
                }
                self.labels.insert(end_label, self.writer.len());
                self.writer.push_u8(Opcode::Pop as u8);
            }
        }
    }

    fn compile_vertex(&mut self, vertex: &Vertex<'a>) {
        for line_set in vertex.lines.iter() {
            let speaker = self.resolve_sym(line_set.speaker);
            for line in line_set.lines.iter() {
                self.writer.push_u8(Opcode::Line as u8);
                self.writer.push_u32(speaker);
                let pos = self.writer.len();
                self.strings.push((pos, (*line).to_string()));
                self.writer.push_u32(0);
            }
        }

        match vertex.tail {
            VertexTail::Fallthrough(next) => {
                self.writer.push_u8(Opcode::Jump as u8);
                let pos = self.writer.len();
                self.jumps.push((pos, next.to_string()));
                self.writer.push_u32(0);
            }
            VertexTail::Choice(blocks) => {
                self.edges.clear();
                self.thunks.clear();
                for block in blocks.iter() {
                    self.compile_eblock(block);
                }

                self.writer.push_u8(Opcode::Pick as u8);
                self.writer.push_u8(Opcode::Switch as u8);
                let targets = std::mem::take(&mut self.edges);
                for target in &targets {
                    let pos = self.writer.len();
                    self.jumps.push((pos, target.clone()));
                    self.writer.push_u32(0);
                }

                let thunks = std::mem::take(&mut self.thunks);
                for (label, effects, next) in thunks {
                    self.labels.insert(label, self.writer.len());
                    self.compile_effects(effects);
                    self.writer.push_u8(Opcode::Jump as u8);
                    let pos = self.writer.len();
                    self.jumps.push((pos, next.to_string()));
                    self.writer.push_u32(0);
                }
            }
        }
    }

    /// Conditional vertex-blocks never need a tail `Jump` past their body:
    /// a vertex body always ends in `Jump` or `Pick`+`Switch`, so control
    /// never falls through past one. `end_label` is placed for symmetry
    /// with the edge-block form but, like the source this is grounded on,
    /// nothing ever jumps to it.
    fn compile_vblock(&mut self, block: &VertexBlock<'a>) {
        match block {
            VertexBlock::Vertex(vertex) => self.compile_vertex(vertex),
            VertexBlock::IfElse(ie) => {
                let end_label = self.gen_label();
                for branch in ie.branches.iter() {
                    let next_label = self.gen_label();
                    self.compile_expr(&branch.cond, false);
                    self.writer.push_u8(Opcode::Jz as u8);
                    let pos = self.writer.len();
                    self.jumps.push((pos, next_label.clone()));
                    self.writer.push_u32(0);

                    self.compile_vblock(branch.body);
                    self.labels.insert(next_label, self.writer.len());
                }
                if let Some(catchall) = ie.catchall {
                    self.compile_vblock(catchall);
                }
                self.labels.insert(end_label, self.writer.len());
            }
            VertexBlock::Match(m) => {
                let end_label = self.gen_label();
                self.compile_expr(&m.scrutinee, false);
                for arm in m.arms.iter() {
                    let next_label = self.gen_label();
                    self.compile_expr(&arm.pattern, true);
                    self.writer.push_u8(Opcode::Jz as u8);
                    let pos = self.writer.len();
                    self.jumps.push((pos, next_label.clone()));
                    self.writer.push_u32(0);

                    self.writer.push_u8(Opcode::Pop as u8);
                    self.compile_vblock(arm.body);
                    self.labels.insert(next_label, self.writer.len());
                }
                if let Some(catchall) = m.catchall {
                    self.writer.push_u8(Opcode::Pop as u8);
                    self.compile_vblock(catchall);
                }
                self.labels.insert(end_label, self.writer.len());
            }
        }
    }
}

/// Lowers a parser-validated graph straight to a [`CompiledFile`]. Infallible:
/// a graph that reached this function already passed every check
/// `weave_parser::parse` performs (a resolvable `START`, no dangling edges),
/// and lowering introduces no new failure modes.
pub fn compile_from_ast<'a>(
    graph: &Graph<'a>,
    resolver: Option<&mut dyn SymbolResolver>,
) -> CompiledFile {
    let mut lowerer = Lowerer::new(resolver);
    lowerer.labels.insert("START".to_string(), 0);
    lowerer.labels.insert("EXIT".to_string(), EXIT_ADDR);
    lowerer.labels.insert("ABORT".to_string(), ABORT_ADDR);

    let start_idx = *graph
        .vert_names
        .get("START")
        .expect("compile_from_ast requires a graph with a resolvable START vertex");
    lowerer.compile_vblock(&graph.vertices[start_idx].1);

    for (i, (name, block)) in graph.vertices.iter().enumerate() {
        if i == start_idx {
            continue;
        }
        let pos = lowerer.writer.len();
        lowerer.labels.insert((*name).to_string(), pos);
        lowerer.compile_vblock(block);
    }
    lowerer.writer.push_u8(Opcode::Eof as u8);

    let str_loc = lowerer.writer.len();
    let pending_strings = std::mem::take(&mut lowerer.strings);
    for (operand_pos, raw) in pending_strings {
        let text_pos = lowerer.writer.len();
        lowerer.writer.patch_u32(operand_pos, text_pos);
        let decoded = decode_escapes(&raw);
        lowerer.writer.push_bytes(decoded.as_bytes());
        lowerer.writer.push_u8(0);
    }

    let sym_loc = match &mut lowerer.symbols {
        SymbolSource::Owned(table) => {
            let loc = lowerer.writer.len();
            for (name, id) in std::mem::take(table).into_sorted_entries() {
                lowerer.writer.push_bytes(name.as_bytes());
                lowerer.writer.push_u8(0);
                lowerer.writer.push_u32(id);
            }
            loc as u64
        }
        SymbolSource::External(_) => 0,
    };

    for (pos, label) in &lowerer.jumps {
        let addr = *lowerer
            .labels
            .get(label)
            .unwrap_or_else(|| panic!("codegen produced an unresolved label {label:?}"));
        lowerer.writer.patch_u32(*pos, addr);
    }

    let data = lowerer.writer.into_bytes();
    let header = Header {
        major: 0,
        minor: 1,
        patch: 0,
        data_len: data.len() as u64,
        str_loc: str_loc as u64,
        sym_loc,
    };
    CompiledFile::new(header, data)
}
