use weave_ast::arena::{self, Arena};
use weave_ast::{
    Edge, EdgeBlock, Graph, IfBranch, IfElse, LineSet, Match, MatchArm, Vertex, VertexBlock,
    VertexTail,
};
use weave_lexer::{Keyword, Span, TokenKind};

use crate::effect::parse_effect_block;
use crate::error::{ErrorKind, ErrorList};
use crate::expr::{parse_expr, parse_value};
use crate::stream::Stream;
use crate::ParseResult;

/// Parsing state threaded through every grammar production: the arena new
/// nodes allocate into, the token stream, and the running list of `(target,
/// span)` pairs recorded at every edge/fallthrough so `DanglingEdge` can be
/// checked once, after the whole graph is known.
struct Ctx<'a, 'src, 'e> {
    arena: &'a Arena,
    stream: Stream<'src, 'e>,
    edges: Vec<(&'a str, Span)>,
}

/// Parses a complete source file into a [`Graph`] plus whatever errors were
/// recorded. A non-empty `ErrorList` means the graph is not safe to hand to
/// codegen, even if parsing ran to completion (recoverable errors keep
/// going so the caller sees every defect in one pass, not just the first).
pub fn parse<'a>(arena: &'a Arena, source: &'a str) -> (Graph<'a>, ErrorList) {
    let mut errors = ErrorList::new();
    let mut graph = Graph::new();
    {
        let mut ctx = Ctx {
            arena,
            stream: Stream::new(source, &mut errors),
            edges: Vec::new(),
        };
        parse_graph(&mut ctx, &mut graph);

        if !ctx.stream.has_failed() {
            if !graph.vert_names.contains_key("START") {
                ctx.stream.warn(ErrorKind::NoEntryPoint, Span::default());
            }
            for (target, span) in &ctx.edges {
                if graph.resolve(target).is_none() {
                    ctx.stream.warn(ErrorKind::DanglingEdge, *span);
                }
            }
        }
    }
    (graph, errors)
}

fn parse_graph<'a>(ctx: &mut Ctx<'a, 'a, '_>, graph: &mut Graph<'a>) {
    loop {
        let tok = ctx.stream.peek();
        if tok.kind == TokenKind::Eof {
            return;
        }

        if tok.kind == TokenKind::Keyword(Keyword::Rename) {
            if parse_rename(ctx, graph).is_err() {
                return;
            }
            continue;
        }

        let name_tok = ctx.stream.next();
        if name_tok.kind != TokenKind::Ident {
            ctx.stream.fail(ErrorKind::BadVertexBegin, name_tok.span);
            return;
        }
        if ctx
            .stream
            .expect(TokenKind::Assign, ErrorKind::MisplacedToken)
            .is_err()
        {
            return;
        }

        let name = arena::alloc_str(ctx.arena, name_tok.lexeme);
        match parse_vblock(ctx) {
            Ok(block) => {
                if !graph.declare(name, block) {
                    ctx.stream.warn(ErrorKind::MultiVertexName, name_tok.span);
                }
            }
            Err(_) => return,
        }
        if ctx.stream.has_failed() {
            return;
        }
    }
}

/// `rename REAL => ALIAS`: edges may target `ALIAS`, which resolves to the
/// declared vertex `REAL`. The rename table is keyed by alias, so
/// `graph.add_rename` takes `(alias, real)`, the reverse of source order.
fn parse_rename<'a>(ctx: &mut Ctx<'a, 'a, '_>, graph: &mut Graph<'a>) -> ParseResult<()> {
    ctx.stream.next(); // "rename"
    let real = ctx.stream.expect(TokenKind::Ident, ErrorKind::BadRename)?;
    ctx.stream.expect(TokenKind::Arrow, ErrorKind::BadRename)?;
    let alias = ctx.stream.expect(TokenKind::Ident, ErrorKind::BadRename)?;
    graph.add_rename(
        arena::alloc_str(ctx.arena, alias.lexeme),
        arena::alloc_str(ctx.arena, real.lexeme),
    );
    Ok(())
}

fn parse_vblock<'a>(ctx: &mut Ctx<'a, 'a, '_>) -> ParseResult<VertexBlock<'a>> {
    let tok = ctx.stream.peek();
    match tok.kind {
        TokenKind::Keyword(Keyword::Match) => Ok(VertexBlock::Match(parse_vertex_match(ctx)?)),
        TokenKind::Keyword(Keyword::If) => Ok(VertexBlock::IfElse(parse_vertex_ifelse(ctx)?)),
        TokenKind::Lt => Ok(VertexBlock::Vertex(parse_vertex(ctx)?)),
        _ => Err(ctx.stream.fail(ErrorKind::Unknown, tok.span)),
    }
}

fn parse_vertex<'a>(ctx: &mut Ctx<'a, 'a, '_>) -> ParseResult<Vertex<'a>> {
    let mut lines = Vec::new();
    while ctx.stream.peek().kind == TokenKind::Lt {
        lines.push(parse_line_set(ctx)?);
    }
    let lines = arena::alloc_slice(ctx.arena, lines);

    let tok = ctx.stream.peek();
    let tail = match tok.kind {
        TokenKind::Arrow => {
            ctx.stream.next();
            let target = ctx.stream.expect(TokenKind::Ident, ErrorKind::Unknown)?;
            let name = arena::alloc_str(ctx.arena, target.lexeme);
            ctx.edges.push((name, target.span));
            VertexTail::Fallthrough(name)
        }
        TokenKind::LParen => {
            ctx.stream.next();
            let blocks = parse_edge_body(ctx, true)?;
            ctx.stream.expect(TokenKind::RParen, ErrorKind::Unknown)?;
            VertexTail::Choice(blocks)
        }
        _ => return Err(ctx.stream.fail(ErrorKind::Unknown, tok.span)),
    };

    Ok(Vertex { lines, tail })
}

fn parse_line_set<'a>(ctx: &mut Ctx<'a, 'a, '_>) -> ParseResult<LineSet<'a>> {
    ctx.stream.next(); // "<"
    let speaker_tok = ctx.stream.expect(TokenKind::Ident, ErrorKind::Unknown)?;
    let speaker = arena::alloc_str(ctx.arena, speaker_tok.lexeme);
    ctx.stream.expect(TokenKind::Colon, ErrorKind::Unknown)?;

    let mut lines = Vec::new();
    loop {
        let tok = ctx.stream.expect(TokenKind::Str, ErrorKind::Unknown)?;
        lines.push(arena::alloc_str(ctx.arena, tok.lexeme));
        let sep = ctx.stream.next();
        match sep.kind {
            TokenKind::Comma => continue,
            TokenKind::Gt => break,
            _ => return Err(ctx.stream.fail(ErrorKind::Unknown, sep.span)),
        }
    }

    Ok(LineSet {
        speaker,
        lines: arena::alloc_slice(ctx.arena, lines),
    })
}

/// `if expr then vblock { else if expr then vblock } else vblock end`.
/// The single final-else body is represented via [`IfElse::catchall`]
/// rather than as an always-true trailing branch, matching the code
/// generator's expectation that a branch list never has to special-case
/// its last element.
fn parse_vertex_ifelse<'a>(
    ctx: &mut Ctx<'a, 'a, '_>,
) -> ParseResult<IfElse<'a, &'a VertexBlock<'a>>> {
    let mut branches = Vec::new();
    let mut catchall = None;

    loop {
        ctx.stream.next(); // "if" / "if" after "else"
        let cond = parse_expr(ctx.arena, &mut ctx.stream)?;
        expect_keyword(ctx, Keyword::Then)?;
        let body = parse_vblock(ctx)?;
        branches.push(IfBranch {
            cond,
            body: &*ctx.arena.alloc(body),
        });

        let kw = expect_keyword_one_of(ctx, &[Keyword::Else, Keyword::End])?;
        if kw == Keyword::End {
            ctx.stream.warn(ErrorKind::NoElse, ctx.stream.peek().span);
            break;
        }
        // "else"
        if ctx.stream.peek().kind == TokenKind::Keyword(Keyword::If) {
            continue;
        }
        let body = parse_vblock(ctx)?;
        catchall = Some(&*ctx.arena.alloc(body));
        expect_keyword(ctx, Keyword::End)?;
        break;
    }

    Ok(IfElse {
        branches: arena::alloc_slice(ctx.arena, branches),
        catchall,
    })
}

fn parse_vertex_match<'a>(
    ctx: &mut Ctx<'a, 'a, '_>,
) -> ParseResult<Match<'a, &'a VertexBlock<'a>>> {
    ctx.stream.next(); // "match"
    let scrutinee = parse_expr(ctx.arena, &mut ctx.stream)?;
    expect_keyword(ctx, Keyword::With)?;

    let mut arms = Vec::new();
    let mut catchall = None;
    loop {
        let tok = ctx.stream.peek();
        match tok.kind {
            TokenKind::Keyword(Keyword::End) => {
                ctx.stream.next();
                if catchall.is_none() {
                    ctx.stream.warn(ErrorKind::NoCatchall, tok.span);
                }
                break;
            }
            TokenKind::LParen => {
                ctx.stream.next();
                if ctx.stream.peek().kind == TokenKind::Underscore {
                    ctx.stream.next();
                    ctx.stream.expect(TokenKind::RParen, ErrorKind::Unknown)?;
                    let body = parse_vblock(ctx)?;
                    catchall = Some(&*ctx.arena.alloc(body));
                } else {
                    let pattern = parse_value(ctx.arena, &mut ctx.stream)?;
                    ctx.stream.expect(TokenKind::RParen, ErrorKind::Unknown)?;
                    let body = parse_vblock(ctx)?;
                    arms.push(MatchArm {
                        pattern,
                        body: &*ctx.arena.alloc(body),
                    });
                }
            }
            _ => return Err(ctx.stream.fail(ErrorKind::Unknown, tok.span)),
        }
    }

    Ok(Match {
        scrutinee,
        arms: arena::alloc_slice(ctx.arena, arms),
        catchall,
    })
}

fn parse_edge<'a>(ctx: &mut Ctx<'a, 'a, '_>) -> ParseResult<Edge<'a>> {
    let line_tok = ctx.stream.expect(TokenKind::Str, ErrorKind::Unknown)?;
    let line = arena::alloc_str(ctx.arena, line_tok.lexeme);

    let mut effect = None;
    if ctx.stream.peek().kind == TokenKind::Join {
        ctx.stream.next();
        effect = Some(parse_effect_block(ctx.arena, &mut ctx.stream)?);
    }
    ctx.stream.expect(TokenKind::Arrow, ErrorKind::Unknown)?;
    let target = ctx.stream.expect(TokenKind::Ident, ErrorKind::Unknown)?;
    let next = arena::alloc_str(ctx.arena, target.lexeme);
    ctx.edges.push((next, target.span));

    Ok(Edge { line, effect, next })
}

/// `edge_body := { edge | eblock }`. `top` distinguishes a vertex's
/// top-level `(…)` choice list (terminated by `)`) from an `if`/`match`
/// body nested inside it (terminated by `else`/`end`).
fn parse_edge_body<'a>(ctx: &mut Ctx<'a, 'a, '_>, top: bool) -> ParseResult<&'a [EdgeBlock<'a>]> {
    let mut blocks: Vec<EdgeBlock<'a>> = Vec::new();
    let mut last_was_edges = false;

    loop {
        let tok = ctx.stream.peek();
        match tok.kind {
            TokenKind::RParen if top => break,
            TokenKind::Keyword(Keyword::Else) | TokenKind::Keyword(Keyword::End) if !top => break,
            TokenKind::Keyword(Keyword::Match) => {
                blocks.push(EdgeBlock::Match(parse_edge_match(ctx)?));
                last_was_edges = false;
            }
            TokenKind::Keyword(Keyword::If) => {
                blocks.push(EdgeBlock::IfElse(parse_edge_ifelse(ctx)?));
                last_was_edges = false;
            }
            TokenKind::Str => {
                let edge = parse_edge(ctx)?;
                if last_was_edges {
                    let Some(EdgeBlock::Edges(prev)) = blocks.pop() else {
                        unreachable!("last_was_edges only set after pushing EdgeBlock::Edges")
                    };
                    let mut merged: Vec<Edge<'a>> = prev.to_vec();
                    merged.push(edge);
                    blocks.push(EdgeBlock::Edges(arena::alloc_slice(ctx.arena, merged)));
                } else {
                    blocks.push(EdgeBlock::Edges(arena::alloc_slice(ctx.arena, vec![edge])));
                }
                last_was_edges = true;
            }
            _ => return Err(ctx.stream.fail(ErrorKind::Unknown, tok.span)),
        }
    }

    Ok(arena::alloc_slice(ctx.arena, blocks))
}

fn parse_edge_ifelse<'a>(
    ctx: &mut Ctx<'a, 'a, '_>,
) -> ParseResult<IfElse<'a, &'a [EdgeBlock<'a>]>> {
    let mut branches = Vec::new();
    let mut catchall = None;

    loop {
        ctx.stream.next(); // "if" / "if" after "else"
        let cond = parse_expr(ctx.arena, &mut ctx.stream)?;
        expect_keyword(ctx, Keyword::Then)?;
        let body = parse_edge_body(ctx, false)?;
        branches.push(IfBranch { cond, body });

        let kw = expect_keyword_one_of(ctx, &[Keyword::Else, Keyword::End])?;
        if kw == Keyword::End {
            ctx.stream.warn(ErrorKind::NoElse, ctx.stream.peek().span);
            break;
        }
        if ctx.stream.peek().kind == TokenKind::Keyword(Keyword::If) {
            continue;
        }
        catchall = Some(parse_edge_body(ctx, false)?);
        expect_keyword(ctx, Keyword::End)?;
        break;
    }

    Ok(IfElse {
        branches: arena::alloc_slice(ctx.arena, branches),
        catchall,
    })
}

fn parse_edge_match<'a>(ctx: &mut Ctx<'a, 'a, '_>) -> ParseResult<Match<'a, &'a Edge<'a>>> {
    ctx.stream.next(); // "match"
    let scrutinee = parse_expr(ctx.arena, &mut ctx.stream)?;
    expect_keyword(ctx, Keyword::With)?;

    let mut arms = Vec::new();
    let mut catchall = None;
    loop {
        let tok = ctx.stream.peek();
        match tok.kind {
            TokenKind::Keyword(Keyword::End) => {
                ctx.stream.next();
                if catchall.is_none() {
                    ctx.stream.warn(ErrorKind::NoCatchall, tok.span);
                }
                break;
            }
            TokenKind::LParen => {
                ctx.stream.next();
                if ctx.stream.peek().kind == TokenKind::Underscore {
                    ctx.stream.next();
                    ctx.stream.expect(TokenKind::RParen, ErrorKind::Unknown)?;
                    let edge = parse_edge(ctx)?;
                    catchall = Some(&*ctx.arena.alloc(edge));
                } else {
                    let pattern = parse_value(ctx.arena, &mut ctx.stream)?;
                    ctx.stream.expect(TokenKind::RParen, ErrorKind::Unknown)?;
                    let edge = parse_edge(ctx)?;
                    arms.push(MatchArm {
                        pattern,
                        body: &*ctx.arena.alloc(edge),
                    });
                }
            }
            _ => return Err(ctx.stream.fail(ErrorKind::Unknown, tok.span)),
        }
    }

    Ok(Match {
        scrutinee,
        arms: arena::alloc_slice(ctx.arena, arms),
        catchall,
    })
}

fn expect_keyword(ctx: &mut Ctx<'_, '_, '_>, kw: Keyword) -> ParseResult<()> {
    let tok = ctx.stream.next();
    if tok.kind == TokenKind::Keyword(kw) {
        Ok(())
    } else {
        Err(ctx.stream.fail(ErrorKind::Unknown, tok.span))
    }
}

fn expect_keyword_one_of(ctx: &mut Ctx<'_, '_, '_>, kws: &[Keyword]) -> ParseResult<Keyword> {
    let tok = ctx.stream.next();
    match tok.kind {
        TokenKind::Keyword(k) if kws.contains(&k) => Ok(k),
        _ => Err(ctx.stream.fail(ErrorKind::Unknown, tok.span)),
    }
}
