//! Lexer for the Weave dialogue-graph language.
//!
//! Source text goes in, a one-token-lookahead stream of [`Token`]s comes out.
//! Escape decoding, keyword classification beyond the fixed set, and all
//! semantic checks belong to later stages.

mod lexer;
mod token;

pub use lexer::Lexer;
pub use token::{Keyword, Span, Token, TokenKind};
