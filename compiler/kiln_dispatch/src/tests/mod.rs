//! Compile job tests.
//!
//! - `lifecycle`: the successful path, scope resolution, reset and tracing
//! - `failures`: syntax errors, budget exhaustion and abort
//! - `threading`: worker-thread parsing and contract violations

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod lifecycle;

use kiln_runtime::{ContextId, FunctionId, Runtime};

use crate::{CompileJob, JobError};

/// A runtime holding `source` as an external one-byte script function.
fn external_function(source: &str) -> (Runtime, FunctionId) {
    let mut runtime = Runtime::new();
    let function = add_function(&mut runtime, source, None);
    (runtime, function)
}

fn add_function(runtime: &mut Runtime, source: &str, context: Option<ContextId>) -> FunctionId {
    let text = runtime.new_external_string(source);
    runtime
        .new_script_function("test.js", text, context)
        .unwrap()
}

/// Drive `job` through every step on the current thread.
fn run_to_completion(job: &mut CompileJob, runtime: &mut Runtime) -> Result<(), JobError> {
    job.prepare_to_parse_on_main_thread(runtime);
    job.parse();
    job.finalize_parsing_on_main_thread(runtime)?;
    job.prepare_to_compile_on_main_thread(runtime)?;
    job.compile();
    job.finalize_compiling_on_main_thread(runtime)
}

/// `() { var a = 'x' + 'x' + ... ; }` with `terms` string operands.
fn deep_concatenation(terms: usize) -> String {
    let mut source = String::from("() { var a = 'x'");
    for _ in 1..terms {
        source.push_str(" + 'x'");
    }
    source.push_str("; }");
    source
}
