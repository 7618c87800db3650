use miette::Diagnostic;
use thiserror::Error;
use weave_lexer::Span;

/// One parse-time defect: a fixed `kind` plus the span it occurred at.
///
/// `miette::Diagnostic` is derived so `weavec` can render a caret-annotated
/// snippet without this crate depending on a terminal-rendering stack
/// itself — `#[source_code]`/`#[label]` are filled in by the caller, since
/// only the caller holds the original source text.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq)]
#[error("{kind}")]
#[diagnostic(code(weave::parse))]
pub struct Error {
    pub kind: ErrorKind,
    pub span: Span,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Kinds `EarlyEof`, `MisplacedToken`, `BadVertexBegin`, `BadRename`,
    /// and `Unknown` halt parsing immediately; every other kind is a
    /// structural validation recorded while parsing continues.
    pub fn is_critical(&self) -> bool {
        self.kind.is_critical()
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("unexpected end of file")]
    EarlyEof,
    #[error("misplaced token")]
    MisplacedToken,
    #[error("vertex declaration must begin with an identifier")]
    BadVertexBegin,
    #[error("malformed rename directive")]
    BadRename,
    #[error("if-chain has no final else")]
    NoElse,
    #[error("match has no catch-all arm")]
    NoCatchall,
    #[error("duplicate case in match")]
    CaseDuplicate,
    #[error("graph has no START vertex")]
    NoEntryPoint,
    #[error("vertex name declared more than once")]
    MultiVertexName,
    #[error("edge targets an undeclared vertex")]
    DanglingEdge,
    #[error("unexpected token")]
    Unknown,
}

impl ErrorKind {
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            ErrorKind::EarlyEof
                | ErrorKind::MisplacedToken
                | ErrorKind::BadVertexBegin
                | ErrorKind::BadRename
                | ErrorKind::Unknown
        )
    }
}

/// Accumulates recoverable errors and latches `fail` on the first critical
/// one, mirroring the original parser's `ErrorList`/`fail`-flag discipline.
#[derive(Debug, Default)]
pub struct ErrorList {
    pub errors: Vec<Error>,
    pub fail: bool,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ErrorKind, span: Span) {
        if kind.is_critical() {
            self.fail = true;
        }
        self.errors.push(Error::new(kind, span));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}
