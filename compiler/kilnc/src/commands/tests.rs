#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use kiln_dispatch::DEFAULT_MAX_STACK_BYTES;
use pretty_assertions::assert_eq;

use super::{compile_and_run, parse_run_options, RunError, RunOptions};

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(ToString::to_string).collect()
}

fn options(args: &[&str]) -> RunOptions {
    parse_run_options(&strings(args), None).unwrap()
}

#[test]
fn test_parse_run_options() {
    let parsed = options(&["loop.kiln", "--background", "--trace-phases", "100", "-2.5"]);
    assert_eq!(
        parsed,
        RunOptions {
            path: "loop.kiln".to_string(),
            background: true,
            max_stack_bytes: DEFAULT_MAX_STACK_BYTES,
            trace_phases: true,
            print_bytecode: false,
            args: vec![100.0, -2.5],
        }
    );
}

#[test]
fn test_stack_size_from_env_and_flag() {
    let from_env = parse_run_options(&strings(&["f.kiln"]), Some("4096")).unwrap();
    assert_eq!(from_env.max_stack_bytes, 4096);

    let from_flag =
        parse_run_options(&strings(&["f.kiln", "--stack-size=8192"]), Some("4096")).unwrap();
    assert_eq!(from_flag.max_stack_bytes, 8192);
}

#[test]
fn test_invalid_options() {
    assert_eq!(
        parse_run_options(&strings(&[]), None).unwrap_err(),
        "missing file path"
    );
    assert_eq!(
        parse_run_options(&strings(&["f.kiln", "--stack-size=0"]), None).unwrap_err(),
        "invalid stack size '0'"
    );
    assert_eq!(
        parse_run_options(&strings(&["--fast", "f.kiln"]), None).unwrap_err(),
        "unknown option '--fast'"
    );
    assert_eq!(
        parse_run_options(&strings(&["f.kiln", "ten"]), None).unwrap_err(),
        "argument 'ten' is not a number"
    );
    assert!(parse_run_options(&strings(&["f.kiln"]), Some("lots")).is_err());
}

#[test]
fn test_compile_and_run() {
    let source = "function(a) { for (var i = 0; i < 3; i++) { a += 20; } return a; }";
    let output = compile_and_run(source, "loop.kiln", &options(&["loop.kiln", "100"])).unwrap();
    assert_eq!(output.value.as_number(), Some(160.0));
    let steps: Vec<&str> = output.timings.iter().map(|t| t.step).collect();
    assert_eq!(
        steps,
        [
            "prepare_to_parse",
            "parse",
            "finalize_parsing",
            "prepare_to_compile",
            "compile",
            "finalize_compiling"
        ]
    );
    assert!(output.timings.iter().any(|t| t.elapsed > Duration::ZERO));
    assert!(!output.parsed_in_background);
    assert!(output.bytecode.is_none());
}

#[test]
fn test_compile_and_run_in_background() {
    let source = "function mul(a, b) { return a * b; }";
    let run = options(&["mul.kiln", "--background", "--print-bytecode", "6", "7"]);
    let output = compile_and_run(source, "mul.kiln", &run).unwrap();
    assert_eq!(output.value.as_number(), Some(42.0));
    assert!(output.parsed_in_background);
    let bytecode = output.bytecode.unwrap();
    assert!(bytecode.starts_with("function mul (params: 2, locals: 0)"));
}

#[test]
fn test_syntax_error_is_reported() {
    let error = compile_and_run("^^^", "bad.kiln", &options(&["bad.kiln"])).unwrap_err();
    let RunError::Compile(message) = error else {
        panic!("expected a compile error, got {error:?}");
    };
    assert_eq!(
        message,
        "SyntaxError: Invalid or unexpected token '^' (bad.kiln:1:1)"
    );
}

#[test]
fn test_small_stack_is_a_range_error() {
    let mut source = String::from("() { return ");
    source.push_str(&"(".repeat(2000));
    source.push('1');
    source.push_str(&")".repeat(2000));
    source.push_str("; }");
    let run = options(&["deep.kiln", "--stack-size=10240"]);
    let error = compile_and_run(&source, "deep.kiln", &run).unwrap_err();
    assert!(error.to_string().starts_with("RangeError: "));
}

#[test]
fn test_runtime_error() {
    let error =
        compile_and_run("() { return missing; }", "g.kiln", &options(&["g.kiln"])).unwrap_err();
    assert!(matches!(error, RunError::Runtime(_)));
}
