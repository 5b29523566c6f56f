use std::sync::atomic::AtomicBool;

use kiln_diagnostic::{ErrorCode, PhaseOutcome};

use super::parse_with_budget;
use crate::{parse_function, ParseRequest, ParsedFunction};

const SMALL_BUDGET: usize = 100 * 1024;

#[test]
fn test_long_binary_chain_fits_small_budget() {
    let mut source = String::from("function f() { return ");
    for _ in 0..100_000 {
        source.push_str("'x' + ");
    }
    source.push_str("'x'; }");
    assert!(parse_with_budget(&source, SMALL_BUDGET).is_ok());
}

#[test]
fn test_deep_nesting_exhausts_budget() {
    let depth = 10_000;
    let source = format!(
        "function f() {{ return {}1{}; }}",
        "(".repeat(depth),
        ")".repeat(depth)
    );
    match parse_with_budget(&source, SMALL_BUDGET) {
        PhaseOutcome::ResourceExhausted(diagnostic) => {
            assert_eq!(diagnostic.code, ErrorCode::E5001);
            assert_eq!(diagnostic.message, "Maximum call stack size exceeded");
        }
        other => panic!("expected resource exhaustion, got ok={}", other.is_ok()),
    }
}

#[test]
fn test_deep_unary_nesting_exhausts_budget() {
    let source = format!("function f() {{ return {}1; }}", "!".repeat(10_000));
    assert!(matches!(
        parse_with_budget(&source, SMALL_BUDGET),
        PhaseOutcome::ResourceExhausted(_)
    ));
}

#[test]
fn test_abort_flag_stops_parsing() {
    let source = "function f() { return 1; }";
    let abort = AtomicBool::new(true);
    let outcome = parse_function(&ParseRequest {
        source,
        range: 0..source.len(),
        max_stack_bytes: SMALL_BUDGET,
        abort: Some(&abort),
    });
    assert!(matches!(outcome, PhaseOutcome::Aborted));
}

#[test]
fn test_parsed_function_is_send() {
    fn assert_send<T: Send + 'static>() {}
    assert_send::<ParsedFunction>();
}
