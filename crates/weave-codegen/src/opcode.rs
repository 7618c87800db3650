/// Bytecode instruction mnemonics, in the exact discriminant order the
/// original format assigns them (`Eof = 0`); the disassembler and VM both
/// rely on this numbering being stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Eof = 0,

    Push,
    Pop,
    Load,
    Store,

    Land,
    Lor,
    Lnot,
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    Equ,
    Neq,
    IeqV,
    IeqK,
    Leq,
    Lth,
    Geq,
    Gth,

    Jump,
    Jz,
    Jnz,
    Switch,

    Prop,
    Pick,
    Line,
    Event,
}

impl Opcode {
    pub fn from_u8(byte: u8) -> Option<Opcode> {
        use Opcode::*;
        Some(match byte {
            0 => Eof,
            1 => Push,
            2 => Pop,
            3 => Load,
            4 => Store,
            5 => Land,
            6 => Lor,
            7 => Lnot,
            8 => Add,
            9 => Sub,
            10 => Mul,
            11 => Div,
            12 => Neg,
            13 => Equ,
            14 => Neq,
            15 => IeqV,
            16 => IeqK,
            17 => Leq,
            18 => Lth,
            19 => Geq,
            20 => Gth,
            21 => Jump,
            22 => Jz,
            23 => Jnz,
            24 => Switch,
            25 => Prop,
            26 => Pick,
            27 => Line,
            28 => Event,
            _ => return None,
        })
    }
}
