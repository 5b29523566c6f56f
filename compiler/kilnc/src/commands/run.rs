//! The `run` command: compile a file as one job and call it.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use kiln_dispatch::{CompileJob, JobError, JobTracer};
use kiln_runtime::{Runtime, RuntimeError, Value};

use super::{read_file, RunOptions};

/// Why `kiln run` failed.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The job failed; holds the pending error as reported by the runtime.
    #[error("{0}")]
    Compile(String),

    #[error("compilation was aborted")]
    Aborted,

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

/// Recorded duration of one job step.
#[derive(Clone, Debug)]
pub struct PhaseTiming {
    pub step: &'static str,
    pub elapsed: Duration,
}

/// Result of a successful run.
#[derive(Debug)]
pub struct RunOutput {
    pub value: Value,
    /// Disassembly, when requested.
    pub bytecode: Option<String>,
    pub timings: Vec<PhaseTiming>,
    /// Whether `parse` ran on a worker thread.
    pub parsed_in_background: bool,
}

/// Per-step durations as `tracer` reports them for a unit of this size.
///
/// The tracer has seen only this job, so each figure is the step's own time.
fn phase_timings(tracer: &JobTracer, source_bytes: usize, ast_nodes: usize) -> Vec<PhaseTiming> {
    [
        ("prepare_to_parse", tracer.estimate_prepare_to_parse()),
        ("parse", tracer.estimate_parse(source_bytes)),
        ("finalize_parsing", tracer.estimate_finalize_parsing()),
        ("prepare_to_compile", tracer.estimate_prepare_to_compile()),
        ("compile", tracer.estimate_compile(ast_nodes)),
        ("finalize_compiling", tracer.estimate_finalize_compiling()),
    ]
    .into_iter()
    .map(|(step, elapsed)| PhaseTiming { step, elapsed })
    .collect()
}

fn compile_error(runtime: &Runtime, error: JobError) -> RunError {
    match error {
        JobError::Aborted => RunError::Aborted,
        other => RunError::Compile(
            runtime
                .pending_error()
                .map_or_else(|| other.to_string(), ToString::to_string),
        ),
    }
}

/// Compile `source` as a single function unit and call it with the
/// options' arguments.
pub fn compile_and_run(
    source: &str,
    script_name: &str,
    options: &RunOptions,
) -> Result<RunOutput, RunError> {
    let mut runtime = Runtime::new();
    let text = runtime.new_external_string(source);
    let function = runtime.new_script_function(script_name, text, None)?;
    let tracer = Arc::new(JobTracer::new());
    let mut job = CompileJob::with_tracer(
        &runtime,
        function,
        options.max_stack_bytes,
        Arc::clone(&tracer),
    );

    job.prepare_to_parse_on_main_thread(&runtime);

    let parsed_in_background = options.background && job.can_parse_on_background_thread();
    if options.background && !parsed_in_background {
        tracing::debug!("source is not background-eligible, parsing on the owning thread");
    }
    if parsed_in_background {
        thread::scope(|scope| {
            scope.spawn(|| job.parse());
        });
    } else {
        job.parse();
    }

    job.finalize_parsing_on_main_thread(&mut runtime)
        .map_err(|e| compile_error(&runtime, e))?;
    job.prepare_to_compile_on_main_thread(&mut runtime)
        .map_err(|e| compile_error(&runtime, e))?;
    job.compile();
    job.finalize_compiling_on_main_thread(&mut runtime)
        .map_err(|e| compile_error(&runtime, e))?;

    let ast_nodes = job
        .parsed_function()
        .map_or(0, |parsed| parsed.arena().node_count());
    let timings = phase_timings(&tracer, source.len(), ast_nodes);

    let bytecode = if options.print_bytecode {
        job.bytecode().map(ToString::to_string)
    } else {
        None
    };

    let args: Vec<Value> = options.args.iter().copied().map(Value::Number).collect();
    let value = runtime.call(function, &args)?;
    Ok(RunOutput {
        value,
        bytecode,
        timings,
        parsed_in_background,
    })
}

/// Run the file named by `options`, printing the result.
pub fn run_file(options: &RunOptions) {
    let source = read_file(&options.path);
    match compile_and_run(&source, &options.path, options) {
        Ok(output) => {
            if let Some(bytecode) = &output.bytecode {
                print!("{bytecode}");
            }
            if options.trace_phases {
                for timing in &output.timings {
                    eprintln!("{:<20} {:?}", timing.step, timing.elapsed);
                }
                if output.parsed_in_background {
                    eprintln!("(parsed on a worker thread)");
                }
            }
            println!("{}", output.value);
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
