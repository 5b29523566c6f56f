//! Recursive descent parser for Kiln compilation units.
//!
//! [`parse_function`] turns the source range of one function unit into a
//! [`ParsedFunction`]: a flat AST, the unit's scope, and the interner both
//! refer to. It needs nothing but the source text, which is what makes it the
//! one compile phase that may run on a worker thread.
//!
//! The parser never reports anything itself. Syntax errors, running out of
//! stack budget, and abort requests all come back as a [`PhaseOutcome`] for
//! the caller to act on later.

mod grammar;
mod parsed;

use std::ops::Range;
use std::sync::atomic::AtomicBool;

use kiln_diagnostic::{Diagnostic, PhaseOutcome};
use kiln_ir::{StringInterner, TokenList};

pub use parsed::ParsedFunction;

/// Budget charged per nested statement, assignment or unary expression.
pub const PARSE_FRAME_BYTES: usize = 128;

/// Everything the parser needs, captured before parsing starts.
#[derive(Clone, Debug)]
pub struct ParseRequest<'a> {
    /// Full script source.
    pub source: &'a str,
    /// Byte range of the unit within `source`.
    pub range: Range<usize>,
    /// Stack budget in bytes.
    pub max_stack_bytes: usize,
    /// Polled at statement boundaries; parsing stops once it is set.
    pub abort: Option<&'a AtomicBool>,
}

/// Why parsing stopped early.
#[derive(Debug)]
pub(crate) enum ParseFailure {
    Diagnostic(Diagnostic),
    Aborted,
}

impl From<Diagnostic> for ParseFailure {
    fn from(diagnostic: Diagnostic) -> Self {
        ParseFailure::Diagnostic(diagnostic)
    }
}

pub(crate) type ParseResult<T> = Result<T, ParseFailure>;

/// Parse the function unit described by `request`.
pub fn parse_function(request: &ParseRequest<'_>) -> PhaseOutcome<ParsedFunction> {
    let text = request.source.get(request.range.clone()).unwrap_or_default();
    let base = u32::try_from(request.range.start).unwrap_or(u32::MAX);

    let mut interner = StringInterner::new();
    let tokens: TokenList = match kiln_lexer::lex(text, base, &mut interner) {
        Ok(tokens) => tokens,
        Err(diagnostic) => return PhaseOutcome::from_diagnostic(diagnostic),
    };

    let parser = grammar::Parser::new(&tokens, &interner, request);
    match parser.parse_unit() {
        Ok((arena, literal)) => {
            tracing::debug!(
                bytes = text.len(),
                tokens = tokens.len(),
                nodes = arena.node_count(),
                parameters = literal.scope.parameter_count(),
                "parsed function unit"
            );
            PhaseOutcome::Ok(ParsedFunction::new(interner, arena, literal))
        }
        Err(ParseFailure::Diagnostic(diagnostic)) => {
            tracing::debug!(code = %diagnostic.code, message = %diagnostic.message, "parse failed");
            PhaseOutcome::from_diagnostic(diagnostic)
        }
        Err(ParseFailure::Aborted) => {
            tracing::debug!("parse aborted");
            PhaseOutcome::Aborted
        }
    }
}

#[cfg(test)]
mod tests;
