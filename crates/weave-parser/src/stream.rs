use weave_lexer::{Lexer, Token, TokenKind};

use crate::error::{Error, ErrorKind, ErrorList};

/// Thin wrapper over the lexer's one-token lookahead that also owns the
/// shared [`ErrorList`], so every parsing function can record a failure and
/// propagate it with `?` via [`crate::ParseResult`].
pub struct Stream<'src, 'e> {
    lexer: Lexer<'src>,
    errors: &'e mut ErrorList,
}

impl<'src, 'e> Stream<'src, 'e> {
    pub fn new(source: &'src str, errors: &'e mut ErrorList) -> Self {
        Self {
            lexer: Lexer::new(source),
            errors,
        }
    }

    pub fn peek(&self) -> Token<'src> {
        self.lexer.peek()
    }

    pub fn next(&mut self) -> Token<'src> {
        self.lexer.next()
    }

    /// Records `kind` at `span`, marking `ErrorList::fail` if critical, and
    /// returns the `Error` so the caller can `return Err(...)` in one step.
    pub fn fail(&mut self, kind: ErrorKind, span: weave_lexer::Span) -> Error {
        let err = Error::new(kind, span);
        self.errors.push(kind, span);
        err
    }

    /// Records a non-critical defect without unwinding the current parse.
    pub fn warn(&mut self, kind: ErrorKind, span: weave_lexer::Span) {
        self.errors.push(kind, span);
    }

    pub fn has_failed(&self) -> bool {
        self.errors.fail
    }

    /// Consumes the next token, failing with `on_mismatch` if it isn't `kind`.
    pub fn expect(&mut self, kind: TokenKind, on_mismatch: ErrorKind) -> crate::ParseResult<Token<'src>> {
        let tok = self.next();
        if tok.kind == kind {
            Ok(tok)
        } else {
            Err(self.fail(on_mismatch, tok.span))
        }
    }
}
