use weave_codegen::Opcode;

use crate::context::VariableContext;

const MAX_EXPRS: usize = 128;
const MAX_PROPS: usize = 16;
const V_END: u32 = 0xFFFF_FFFF;
const V_ABORT: u32 = 0xFFFF_FFFE;

/// What the VM is waiting on after a call to [`VirtualMachine::exec`].
/// `None` is an internal stepping state and never escapes `exec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpCall {
    None,
    Line,
    Pick,
    Event,
    Exit,
    Abort,
}

/// One enqueued choice: the string offset and the dense `Switch`-table
/// index it was authored at.
#[derive(Debug, Clone, Copy, Default)]
struct IProp {
    s: u32,
    i: u8,
}

/// Reads a NUL-terminated string out of `code` starting at `offset`.
/// Trusted input: a compiled artifact's string section is always valid
/// UTF-8 written by this crate's own codegen (see §7 of the design docs —
/// the VM does not re-validate codegen's output).
fn cstr_at(code: &[u8], offset: u32) -> &str {
    let start = offset as usize;
    let len = code[start..].iter().position(|&b| b == 0).unwrap();
    std::str::from_utf8(&code[start..start + len]).unwrap()
}

fn read_u32(code: &[u8], at: u32) -> u32 {
    let at = at as usize;
    u32::from_le_bytes(code[at..at + 4].try_into().unwrap())
}

fn read_u64(code: &[u8], at: u32) -> u64 {
    let at = at as usize;
    u64::from_le_bytes(code[at..at + 8].try_into().unwrap())
}

/// `0xFFFFFFFF`/`0xFFFFFFFE` resolve to the `Exit`/`Abort` up-calls wherever
/// a jump target lands on them, whether from `Jump`, `Jz`, `Jnz`, or `Switch`.
fn sentinel(addr: u32) -> Option<UpCall> {
    match addr {
        V_END => Some(UpCall::Exit),
        V_ABORT => Some(UpCall::Abort),
        _ => None,
    }
}

/// A stack machine over a borrowed, already-compiled artifact. `'code`
/// ties the machine's lifetime to the bytes it executes — there is no
/// owned copy, and a `VirtualMachine` cannot outlive its source
/// [`weave_codegen::CompiledFile`].
///
/// Construct with [`weave_codegen::CompiledFile::data`], not `code()`:
/// string operands are offsets into the full payload (code, strings, and
/// symbols back to back), not into the code section alone.
pub struct VirtualMachine<'code> {
    code: &'code [u8],
    expr: [u64; MAX_EXPRS],
    text: [IProp; MAX_PROPS],
    pc: u32,
    sp: u32,
    th: u32,
    tt: u32,
    a: u32,
    b: u32,
}

impl<'code> VirtualMachine<'code> {
    pub fn new(code: &'code [u8]) -> Self {
        Self {
            code,
            expr: [0; MAX_EXPRS],
            text: [IProp::default(); MAX_PROPS],
            pc: 0,
            sp: 0,
            th: 0,
            tt: 0,
            a: 0,
            b: 0,
        }
    }

    /// Rewinds execution to the start of a (possibly different) code buffer,
    /// clearing the value stack and proposition queue.
    pub fn reset(&mut self, code: &'code [u8]) {
        self.code = code;
        self.pc = 0;
        self.sp = 0;
        self.th = 0;
        self.tt = 0;
        self.a = 0;
        self.b = 0;
    }

    /// The current line's text, valid after an `UpCall::Line`.
    pub fn line(&self) -> &'code str {
        cstr_at(self.code, self.b)
    }

    /// The current line's speaker symbol id, valid after `UpCall::Line`.
    pub fn id(&self) -> u32 {
        self.a
    }

    /// The number of propositions enqueued before the most recent `Pick`.
    pub fn nq(&self) -> u32 {
        self.b
    }

    /// Pushes a value onto the expression stack — used by the host to
    /// supply the chosen choice index before resuming past a `Pick`.
    pub fn push(&mut self, value: u64) {
        debug_assert!((self.sp as usize) < MAX_EXPRS, "value stack overflow");
        self.expr[self.sp as usize] = value;
        self.sp += 1;
    }

    pub fn pop(&mut self) -> u64 {
        debug_assert!(self.sp > 0, "value stack underflow");
        self.sp -= 1;
        self.expr[self.sp as usize]
    }

    pub fn top(&self) -> u64 {
        debug_assert!(self.sp > 0, "value stack is empty");
        self.expr[self.sp as usize - 1]
    }

    /// Dequeues one proposition's text and its `Switch`-table index.
    fn deq_iprop(&mut self) -> IProp {
        debug_assert!(self.tt < self.th, "proposition queue is empty");
        let p = self.text[self.tt as usize];
        self.tt += 1;
        p
    }

    pub fn deq_text(&mut self) -> (&'code str, u8) {
        let p = self.deq_iprop();
        (cstr_at(self.code, p.s), p.i)
    }

    fn enq_iprop(&mut self, prop: IProp) {
        debug_assert!((self.th as usize) < MAX_PROPS, "proposition queue overflow");
        self.text[self.th as usize] = prop;
        self.th += 1;
    }

    fn fetch_u8(&mut self) -> u8 {
        let byte = self.code[self.pc as usize];
        self.pc += 1;
        byte
    }

    fn fetch_u32(&mut self) -> u32 {
        let value = read_u32(self.code, self.pc);
        self.pc += 4;
        value
    }

    fn fetch_u64(&mut self) -> u64 {
        let value = read_u64(self.code, self.pc);
        self.pc += 8;
        value
    }

    /// Jumps unconditionally to `target`, translating the sentinel
    /// addresses into the up-calls that end execution.
    fn jump_to(&mut self, target: u32) -> Option<UpCall> {
        self.pc = target;
        sentinel(target)
    }

    fn step(&mut self, ctx: &mut dyn VariableContext) -> UpCall {
        let opcode = Opcode::from_u8(self.fetch_u8()).expect("invalid opcode in compiled artifact");
        match opcode {
            Opcode::Eof => return UpCall::Exit,

            Opcode::Push => {
                let imm = self.fetch_u64();
                self.push(imm);
            }
            Opcode::Pop => {
                self.pop();
            }

            Opcode::Load => {
                let sym = self.fetch_u32();
                let value = *ctx.cell(sym, false);
                self.push(value);
            }
            Opcode::Store => {
                let sym = self.fetch_u32();
                let value = self.pop();
                *ctx.cell(sym, false) = value;
            }

            Opcode::Land => {
                let (rhs, lhs) = (self.pop(), self.pop());
                self.push((lhs != 0 && rhs != 0) as u64);
            }
            Opcode::Lor => {
                let (rhs, lhs) = (self.pop(), self.pop());
                self.push((lhs != 0 || rhs != 0) as u64);
            }
            Opcode::Lnot => {
                let lhs = self.pop();
                self.push((lhs == 0) as u64);
            }
            Opcode::Add => {
                let (rhs, lhs) = (self.pop(), self.pop());
                self.push(lhs.wrapping_add(rhs));
            }
            Opcode::Sub => {
                let (rhs, lhs) = (self.pop(), self.pop());
                self.push(lhs.wrapping_sub(rhs));
            }
            Opcode::Mul => {
                let (rhs, lhs) = (self.pop(), self.pop());
                self.push(lhs.wrapping_mul(rhs));
            }
            Opcode::Div => {
                let (rhs, lhs) = (self.pop(), self.pop());
                self.push(lhs / rhs);
            }
            Opcode::Neg => {
                let lhs = self.pop() as i64;
                self.push(lhs.wrapping_neg() as u64);
            }
            Opcode::Equ => {
                let (rhs, lhs) = (self.pop(), self.pop());
                self.push((lhs == rhs) as u64);
            }
            Opcode::Neq => {
                let (rhs, lhs) = (self.pop(), self.pop());
                self.push((lhs != rhs) as u64);
            }
            Opcode::IeqV => {
                let imm = self.fetch_u64();
                let lhs = self.top();
                self.push((lhs == imm) as u64);
            }
            Opcode::IeqK => {
                let sym = self.fetch_u32();
                let rhs = *ctx.cell(sym, false);
                let lhs = self.top();
                self.push((lhs == rhs) as u64);
            }
            Opcode::Leq => {
                let (rhs, lhs) = (self.pop(), self.pop());
                self.push((lhs <= rhs) as u64);
            }
            Opcode::Lth => {
                let (rhs, lhs) = (self.pop(), self.pop());
                self.push((lhs < rhs) as u64);
            }
            Opcode::Geq => {
                let (rhs, lhs) = (self.pop(), self.pop());
                self.push((lhs >= rhs) as u64);
            }
            Opcode::Gth => {
                let (rhs, lhs) = (self.pop(), self.pop());
                self.push((lhs > rhs) as u64);
            }

            Opcode::Jump => {
                let target = self.fetch_u32();
                if let Some(up) = self.jump_to(target) {
                    return up;
                }
            }
            Opcode::Jz => {
                let target = self.fetch_u32();
                if self.pop() == 0 {
                    if let Some(up) = self.jump_to(target) {
                        return up;
                    }
                }
            }
            Opcode::Jnz => {
                let target = self.fetch_u32();
                if self.pop() != 0 {
                    if let Some(up) = self.jump_to(target) {
                        return up;
                    }
                }
            }
            Opcode::Switch => {
                let index = self.pop() as u32;
                let target = read_u32(self.code, self.pc + index * 4);
                if let Some(up) = self.jump_to(target) {
                    return up;
                }
            }

            Opcode::Prop => {
                let s = self.fetch_u32();
                let i = self.fetch_u8();
                self.enq_iprop(IProp { s, i });
            }
            Opcode::Pick => {
                self.b = self.th;
                return UpCall::Pick;
            }
            Opcode::Line => {
                self.a = self.fetch_u32();
                self.b = self.fetch_u32();
                return UpCall::Line;
            }
            Opcode::Event => {
                self.b = self.fetch_u32();
                return UpCall::Event;
            }
        }
        UpCall::None
    }

    /// Single-steps until an up-call other than `None` is produced,
    /// resetting the proposition queue first. The host resumes execution
    /// by calling `exec` again — pushing a choice index beforehand if the
    /// previous up-call was `Pick`.
    pub fn exec(&mut self, ctx: &mut dyn VariableContext) -> UpCall {
        self.th = 0;
        self.tt = 0;
        loop {
            let up = self.step(ctx);
            tracing::trace!(target: "weave_vm", up_call = ?up, pc = self.pc, "vm up-call");
            if up != UpCall::None {
                return up;
            }
        }
    }
}
