//! Parser tests.
//!
//! - `parser`: grammar, precedence and syntax errors
//! - `scope`: declarations, references and free-variable resolution
//! - `limits`: stack budget and abort handling

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod limits;
mod parser;

use kiln_diagnostic::PhaseOutcome;
use kiln_stack::DEFAULT_MAX_STACK_BYTES;

use crate::{parse_function, ParseRequest, ParsedFunction};

fn parse_with_budget(source: &str, max_stack_bytes: usize) -> PhaseOutcome<ParsedFunction> {
    parse_function(&ParseRequest {
        source,
        range: 0..source.len(),
        max_stack_bytes,
        abort: None,
    })
}

fn parse(source: &str) -> PhaseOutcome<ParsedFunction> {
    parse_with_budget(source, DEFAULT_MAX_STACK_BYTES)
}

fn parse_ok(source: &str) -> ParsedFunction {
    match parse(source) {
        PhaseOutcome::Ok(parsed) => parsed,
        other => panic!("expected successful parse, got {:?}", other.diagnostic()),
    }
}
