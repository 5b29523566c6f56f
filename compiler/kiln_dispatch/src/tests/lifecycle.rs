use std::sync::Arc;
use std::time::Duration;

use kiln_ir::VariableLocation;
use kiln_runtime::{Runtime, Value};
use pretty_assertions::assert_eq;

use super::{add_function, external_function, run_to_completion};
use crate::{CompileJob, CompileJobStatus, JobTracer, DEFAULT_MAX_STACK_BYTES};

#[test]
fn test_construct() {
    let (runtime, function) = external_function("(x) { x * x; }");
    let job = CompileJob::new(&runtime, function, DEFAULT_MAX_STACK_BYTES);
    assert_eq!(job.status(), CompileJobStatus::Initial);
    assert_eq!(job.function(), function);
    assert_eq!(job.max_stack_bytes(), DEFAULT_MAX_STACK_BYTES);
    assert!(job.parsed_function().is_none());
    assert!(job.bytecode().is_none());
    assert!(job.failure().is_none());
}

#[test]
fn test_can_parse_on_background_thread() {
    let mut runtime = Runtime::new();
    let heap = runtime.new_heap_string("(x) { x; }");
    let heap_function = runtime.new_script_function("heap.js", heap, None).unwrap();
    let external_function = add_function(&mut runtime, "(x) { x; }", None);

    let heap_job = CompileJob::new(&runtime, heap_function, DEFAULT_MAX_STACK_BYTES);
    let external_job = CompileJob::new(&runtime, external_function, DEFAULT_MAX_STACK_BYTES);
    assert!(!heap_job.can_parse_on_background_thread());
    assert!(external_job.can_parse_on_background_thread());
}

#[test]
fn test_state_transitions() {
    let (mut runtime, function) = external_function("(x) { x * x; }");
    let mut job = CompileJob::new(&runtime, function, DEFAULT_MAX_STACK_BYTES);

    job.prepare_to_parse_on_main_thread(&runtime);
    assert_eq!(job.status(), CompileJobStatus::ReadyToParse);
    job.parse();
    assert_eq!(job.status(), CompileJobStatus::Parsed);
    assert!(job.parsed_function().is_some());
    job.finalize_parsing_on_main_thread(&mut runtime).unwrap();
    assert_eq!(job.status(), CompileJobStatus::ReadyToAnalyze);
    job.prepare_to_compile_on_main_thread(&mut runtime).unwrap();
    assert_eq!(job.status(), CompileJobStatus::ReadyToCompile);
    job.compile();
    assert_eq!(job.status(), CompileJobStatus::Compiled);
    assert!(job.bytecode().is_some());
    job.finalize_compiling_on_main_thread(&mut runtime).unwrap();
    assert_eq!(job.status(), CompileJobStatus::Done);

    assert!(!runtime.has_pending_error());
    assert!(runtime.is_compiled(function));

    job.reset_on_main_thread();
    assert_eq!(job.status(), CompileJobStatus::Initial);
    assert!(job.parsed_function().is_none());
}

#[test]
fn test_scope_chain() {
    let mut runtime = Runtime::new();
    let context = runtime.new_context(None, &[("g", Value::Number(2.0))]);
    let function = add_function(
        &mut runtime,
        "function f(x) { return x * g; }",
        Some(context),
    );
    let mut job = CompileJob::new(&runtime, function, DEFAULT_MAX_STACK_BYTES);

    job.prepare_to_parse_on_main_thread(&runtime);
    job.parse();
    job.finalize_parsing_on_main_thread(&mut runtime).unwrap();

    let parsed = job.parsed_function().unwrap();
    let x = parsed.lookup_variable("x").unwrap();
    assert_eq!(x.location, VariableLocation::Unallocated);
    let g = parsed.lookup_variable("g").unwrap();
    assert_eq!(g.location, VariableLocation::Context { depth: 0, slot: 0 });
    assert_eq!(job.name(), Some("f"));

    job.prepare_to_compile_on_main_thread(&mut runtime).unwrap();
    job.compile();
    job.finalize_compiling_on_main_thread(&mut runtime).unwrap();
    let result = runtime.call(function, &[Value::Number(3.0)]).unwrap();
    assert_eq!(result.as_number(), Some(6.0));
}

#[test]
fn test_compile_and_run() {
    let (mut runtime, function) = external_function(
        "function(a) { for (var i = 0; i < 3; i++) { a += 20; } return a; }",
    );
    let mut job = CompileJob::new(&runtime, function, DEFAULT_MAX_STACK_BYTES);
    run_to_completion(&mut job, &mut runtime).unwrap();
    assert_eq!(job.status(), CompileJobStatus::Done);

    let result = runtime.call(function, &[Value::Number(100.0)]).unwrap();
    assert_eq!(result.as_number(), Some(160.0));
}

#[test]
fn test_heap_source_compiles_on_owning_thread() {
    let mut runtime = Runtime::new();
    let text = runtime.new_heap_string("(a, b) { return a + b; }");
    let function = runtime.new_script_function("heap.js", text, None).unwrap();
    let mut job = CompileJob::new(&runtime, function, DEFAULT_MAX_STACK_BYTES);
    run_to_completion(&mut job, &mut runtime).unwrap();

    let result = runtime
        .call(function, &[Value::string("con"), Value::string("cat")])
        .unwrap();
    assert_eq!(result.as_str(), Some("concat"));
}

#[test]
fn test_reset_and_rerun() {
    let (mut runtime, function) = external_function("(x) { return x + 1; }");
    let mut job = CompileJob::new(&runtime, function, DEFAULT_MAX_STACK_BYTES);
    run_to_completion(&mut job, &mut runtime).unwrap();
    let first = job.bytecode().unwrap().clone();

    job.reset_on_main_thread();
    assert_eq!(job.status(), CompileJobStatus::Initial);
    assert!(job.bytecode().is_none());
    assert_eq!(job.function(), function);
    assert_eq!(job.max_stack_bytes(), DEFAULT_MAX_STACK_BYTES);

    run_to_completion(&mut job, &mut runtime).unwrap();
    assert_eq!(job.bytecode().unwrap(), &first);
    let result = runtime.call(function, &[Value::Number(41.0)]).unwrap();
    assert_eq!(result.as_number(), Some(42.0));
}

#[test]
fn test_tracer_estimates_after_run() {
    let tracer = Arc::new(JobTracer::new());
    let (mut runtime, function) =
        external_function("function f(n) { var s = 0; while (n > 0) { s += n; n--; } return s; }");
    let mut job = CompileJob::with_tracer(
        &runtime,
        function,
        DEFAULT_MAX_STACK_BYTES,
        Arc::clone(&tracer),
    );
    assert_eq!(job.estimate_runtime_of_next_step(), Duration::ZERO);

    run_to_completion(&mut job, &mut runtime).unwrap();
    assert_eq!(job.estimate_runtime_of_next_step(), Duration::ZERO);

    job.reset_on_main_thread();
    job.prepare_to_parse_on_main_thread(&runtime);
    assert!(job.estimate_runtime_of_next_step() > Duration::ZERO);
    assert!(tracer.estimate_compile(100) > Duration::ZERO);
}

#[test]
fn test_display() {
    let (mut runtime, function) = external_function("function square(x) { return x * x; }");
    let mut job = CompileJob::new(&runtime, function, DEFAULT_MAX_STACK_BYTES);
    assert_eq!(job.to_string(), format!("CompileJob({function:?}, Initial)"));

    run_to_completion(&mut job, &mut runtime).unwrap();
    assert_eq!(job.to_string(), "CompileJob(square, Done)");
}
