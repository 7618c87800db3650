use weave_ast::arena::{self, Arena};
use weave_ast::{BinOp, Expr, UnOp};
use weave_lexer::{Keyword, Token, TokenKind};

use crate::error::ErrorKind;
use crate::stream::Stream;
use crate::ParseResult;

/// Left/right binding power for a binary operator. `rbp = lbp - 0.1`
/// enforces left-associativity: when chaining `a - b - c`, the second `-`'s
/// `lbp` (6.0) is not allowed to win against the first `-`'s `rbp` (5.9), so
/// the first subtraction closes over `a - b` before `c` is consumed.
fn binding(kind: TokenKind) -> Option<(f32, f32, BinOp)> {
    use TokenKind::*;
    let (lbp, op) = match kind {
        OrOr => (1.0, BinOp::Or),
        AndAnd => (2.0, BinOp::And),
        EqEq => (4.0, BinOp::Eq),
        Ne => (4.0, BinOp::Ne),
        Lt => (5.0, BinOp::Lt),
        Gt => (5.0, BinOp::Gt),
        Le => (5.0, BinOp::Le),
        Ge => (5.0, BinOp::Ge),
        Plus => (6.0, BinOp::Add),
        Minus => (6.0, BinOp::Sub),
        Star => (7.0, BinOp::Mul),
        Slash => (7.0, BinOp::Div),
        _ => return None,
    };
    Some((lbp, lbp - 0.1, op))
}

/// Parses a `value` production: identifier, `true`/`false` (lowered to
/// 1/0), or a number literal. Used directly for match-arm patterns, which
/// never admit a compound expression.
pub fn parse_value<'a>(arena: &'a Arena, stream: &mut Stream<'a, '_>) -> ParseResult<Expr<'a>> {
    let tok = stream.next();
    match tok.kind {
        TokenKind::Ident => Ok(Expr::Ident(arena::alloc_str(arena, tok.lexeme))),
        TokenKind::Keyword(Keyword::True) => Ok(Expr::Immediate(1)),
        TokenKind::Keyword(Keyword::False) => Ok(Expr::Immediate(0)),
        TokenKind::Number => {
            let val: u64 = tok
                .lexeme
                .parse()
                .map_err(|_| stream.fail(ErrorKind::Unknown, tok.span))?;
            Ok(Expr::Immediate(val))
        }
        _ => Err(stream.fail(ErrorKind::Unknown, tok.span)),
    }
}

pub fn parse_expr<'a>(arena: &'a Arena, stream: &mut Stream<'a, '_>) -> ParseResult<Expr<'a>> {
    parse_expr_bp(arena, stream, 0.0)
}

fn parse_atom<'a>(arena: &'a Arena, stream: &mut Stream<'a, '_>) -> ParseResult<Expr<'a>> {
    let tok: Token = stream.peek();
    match tok.kind {
        TokenKind::LParen => {
            stream.next();
            let inner = parse_expr_bp(arena, stream, 0.0)?;
            stream.expect(TokenKind::RParen, ErrorKind::Unknown)?;
            Ok(inner)
        }
        TokenKind::Bang => {
            stream.next();
            let operand = parse_atom(arena, stream)?;
            Ok(Expr::Unary(UnOp::Not, arena.alloc(operand)))
        }
        TokenKind::Ident | TokenKind::Keyword(Keyword::True) | TokenKind::Keyword(Keyword::False)
        | TokenKind::Number => parse_value(arena, stream),
        _ => Err(stream.fail(ErrorKind::Unknown, tok.span)),
    }
}

fn parse_expr_bp<'a>(
    arena: &'a Arena,
    stream: &mut Stream<'a, '_>,
    min_bp: f32,
) -> ParseResult<Expr<'a>> {
    let mut lhs = parse_atom(arena, stream)?;

    loop {
        let op_tok = stream.peek();
        let Some((lbp, rbp, op)) = binding(op_tok.kind) else {
            break;
        };
        if lbp < min_bp {
            break;
        }
        stream.next();
        let rhs = parse_expr_bp(arena, stream, rbp)?;
        lhs = Expr::Binary(op, arena.alloc(lhs), arena.alloc(rhs));
    }

    Ok(lhs)
}
