use weave_ast::arena::{self, Arena};
use weave_ast::Effect;
use weave_lexer::TokenKind;

use crate::error::ErrorKind;
use crate::expr::parse_expr;
use crate::stream::Stream;
use crate::ParseResult;

/// `effect_block := effect { "," effect }`, consumed up to (not including)
/// the caller's closing delimiter.
pub fn parse_effect_block<'a>(
    arena: &'a Arena,
    stream: &mut Stream<'a, '_>,
) -> ParseResult<&'a [Effect<'a>]> {
    let mut effects = Vec::new();
    effects.push(parse_effect(arena, stream)?);
    while stream.peek().kind == TokenKind::Comma {
        stream.next();
        effects.push(parse_effect(arena, stream)?);
    }
    Ok(arena::alloc_slice(arena, effects))
}

/// `effect := ident ("=" | "+=" | "-=") expr | "event" "(" strlit ")"`.
/// `event` is not a reserved word — it is recognized here by lexeme, the
/// same way the grammar treats it as a contextual keyword.
fn parse_effect<'a>(arena: &'a Arena, stream: &mut Stream<'a, '_>) -> ParseResult<Effect<'a>> {
    let ident = stream.expect(TokenKind::Ident, ErrorKind::Unknown)?;

    if ident.lexeme == "event" && stream.peek().kind == TokenKind::LParen {
        stream.next();
        let text = stream.expect(TokenKind::Str, ErrorKind::Unknown)?;
        stream.expect(TokenKind::RParen, ErrorKind::Unknown)?;
        return Ok(Effect::Event {
            text: arena::alloc_str(arena, text.lexeme),
        });
    }

    let target = arena::alloc_str(arena, ident.lexeme);
    let op = stream.next();
    let value = parse_expr(arena, stream)?;
    match op.kind {
        TokenKind::Assign => Ok(Effect::Assign { target, value }),
        TokenKind::PlusEq => Ok(Effect::AddAssign { target, value }),
        TokenKind::MinusEq => Ok(Effect::SubAssign { target, value }),
        _ => Err(stream.fail(ErrorKind::Unknown, op.span)),
    }
}
