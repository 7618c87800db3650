use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Wraps a [`weave_parser::Error`] with the source text it came from, so
/// `miette` can render a caret-annotated snippet — the parser crate itself
/// stays free of any terminal-rendering dependency.
#[derive(Debug, Error, Diagnostic)]
#[error("{inner}")]
#[diagnostic(code(weave::parse))]
pub struct RenderedError {
    inner: weave_parser::Error,
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    at: SourceSpan,
}

fn byte_offset(source: &str, row: u32, col: u32) -> usize {
    let mut offset = 0usize;
    for (i, line) in source.split('\n').enumerate() {
        if i as u32 == row {
            return offset + (col as usize).min(line.len());
        }
        offset += line.len() + 1;
    }
    source.len()
}

pub fn render(path: &str, source: &str, error: &weave_parser::Error) -> RenderedError {
    let offset = byte_offset(source, error.span.row, error.span.col);
    RenderedError {
        inner: error.clone(),
        src: NamedSource::new(path.to_string(), source.to_string()),
        at: (offset, 1).into(),
    }
}

pub fn print_all(path: &str, source: &str, errors: &weave_parser::ErrorList) {
    for error in &errors.errors {
        let report = miette::Report::new(render(path, source, error));
        eprintln!("{report:?}");
    }
}
