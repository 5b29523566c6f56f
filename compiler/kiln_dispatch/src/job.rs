use std::fmt;
use std::mem;
use std::ops::Range;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use kiln_codegen::{analyze, generate, BytecodeArray, CompilationInfo};
use kiln_diagnostic::{Diagnostic, PhaseOutcome};
use kiln_parse::{parse_function, ParseRequest, ParsedFunction};
use kiln_runtime::{ContextId, FunctionId, Runtime};

use crate::{AbortHandle, CompileJobStatus, JobError, JobTracer};

/// What the parser needs, copied out of the heap on the owning thread.
#[derive(Debug)]
struct ParseInput {
    source: Arc<str>,
    range: Range<usize>,
    context: Option<ContextId>,
}

/// Per-status storage. Each variant holds exactly what the next step needs.
#[derive(Debug, Default)]
enum JobState {
    #[default]
    Initial,
    ReadyToParse(ParseInput),
    Parsed {
        input: ParseInput,
        outcome: PhaseOutcome<ParsedFunction>,
    },
    ReadyToAnalyze(ParsedFunction),
    ReadyToCompile {
        parsed: ParsedFunction,
        info: CompilationInfo,
    },
    Compiled {
        parsed: ParsedFunction,
        outcome: PhaseOutcome<BytecodeArray>,
    },
    Done {
        parsed: ParsedFunction,
        code: Arc<BytecodeArray>,
    },
    /// `None` when the job was aborted.
    Failed(Option<Diagnostic>),
}

impl JobState {
    fn status(&self) -> CompileJobStatus {
        match self {
            JobState::Initial => CompileJobStatus::Initial,
            JobState::ReadyToParse(_) => CompileJobStatus::ReadyToParse,
            JobState::Parsed { .. } => CompileJobStatus::Parsed,
            JobState::ReadyToAnalyze(_) => CompileJobStatus::ReadyToAnalyze,
            JobState::ReadyToCompile { .. } => CompileJobStatus::ReadyToCompile,
            JobState::Compiled { .. } => CompileJobStatus::Compiled,
            JobState::Done { .. } => CompileJobStatus::Done,
            JobState::Failed(_) => CompileJobStatus::Failed,
        }
    }
}

/// Compiles one function in explicit steps.
///
/// See the crate docs for the step order and which thread may run each
/// step. The job is `Send` so that it can be handed to a worker for
/// [`parse`](CompileJob::parse); the runtime it compiles for is not.
#[derive(Debug)]
pub struct CompileJob {
    function: FunctionId,
    owner: ThreadId,
    max_stack_bytes: usize,
    background_eligible: bool,
    name: Option<Arc<str>>,
    state: JobState,
    abort: AbortHandle,
    tracer: Option<Arc<JobTracer>>,
}

impl CompileJob {
    pub fn new(runtime: &Runtime, function: FunctionId, max_stack_bytes: usize) -> Self {
        let background_eligible = runtime
            .function_source(function)
            .handle
            .is_background_safe();
        tracing::debug!(
            function = ?function,
            max_stack_bytes,
            background_eligible,
            "created compile job"
        );
        CompileJob {
            function,
            owner: runtime.owner_thread(),
            max_stack_bytes,
            background_eligible,
            name: None,
            state: JobState::Initial,
            abort: AbortHandle::default(),
            tracer: None,
        }
    }

    /// A job that records step durations into `tracer`.
    pub fn with_tracer(
        runtime: &Runtime,
        function: FunctionId,
        max_stack_bytes: usize,
        tracer: Arc<JobTracer>,
    ) -> Self {
        CompileJob {
            tracer: Some(tracer),
            ..Self::new(runtime, function, max_stack_bytes)
        }
    }

    // Accessors

    pub fn status(&self) -> CompileJobStatus {
        self.state.status()
    }

    pub fn can_parse_on_background_thread(&self) -> bool {
        self.background_eligible
    }

    pub fn max_stack_bytes(&self) -> usize {
        self.max_stack_bytes
    }

    pub fn function(&self) -> FunctionId {
        self.function
    }

    /// Name of the parsed unit, once finalize parsing has seen it.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parsed_function(&self) -> Option<&ParsedFunction> {
        match &self.state {
            JobState::Parsed {
                outcome: PhaseOutcome::Ok(parsed),
                ..
            }
            | JobState::ReadyToAnalyze(parsed)
            | JobState::ReadyToCompile { parsed, .. }
            | JobState::Compiled { parsed, .. }
            | JobState::Done { parsed, .. } => Some(parsed),
            _ => None,
        }
    }

    pub fn bytecode(&self) -> Option<&BytecodeArray> {
        match &self.state {
            JobState::Compiled {
                outcome: PhaseOutcome::Ok(code),
                ..
            } => Some(code),
            JobState::Done { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Diagnostic the job failed with; `None` unless `Failed`, or if aborted.
    pub fn failure(&self) -> Option<&Diagnostic> {
        match &self.state {
            JobState::Failed(diagnostic) => diagnostic.as_ref(),
            _ => None,
        }
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Expected duration of the step the job would run next.
    pub fn estimate_runtime_of_next_step(&self) -> Duration {
        let Some(tracer) = &self.tracer else {
            return Duration::ZERO;
        };
        match &self.state {
            JobState::Initial => tracer.estimate_prepare_to_parse(),
            JobState::ReadyToParse(input) => tracer.estimate_parse(input.range.len()),
            JobState::Parsed { .. } => tracer.estimate_finalize_parsing(),
            JobState::ReadyToAnalyze(_) => tracer.estimate_prepare_to_compile(),
            JobState::ReadyToCompile { parsed, .. } => {
                tracer.estimate_compile(parsed.arena().node_count())
            }
            JobState::Compiled { .. } => tracer.estimate_finalize_compiling(),
            JobState::Done { .. } | JobState::Failed(_) => Duration::ZERO,
        }
    }

    // Steps

    /// Snapshot the function's source, range and context.
    pub fn prepare_to_parse_on_main_thread(&mut self, runtime: &Runtime) {
        const OP: &str = "prepare_to_parse_on_main_thread";
        self.assert_runtime(OP, runtime);
        self.assert_status(OP, &[CompileJobStatus::Initial]);
        let start = Instant::now();

        let source = runtime.function_source(self.function);
        let input = ParseInput {
            source: runtime.flatten_source(&source.handle),
            range: source.range,
            context: source.context,
        };
        tracing::debug!(job = %self, bytes = input.range.len(), "prepared to parse");
        self.state = JobState::ReadyToParse(input);

        if let Some(tracer) = &self.tracer {
            tracer.record_prepare_to_parse(start.elapsed());
        }
    }

    /// Parse the snapshot. Failures are recorded for the finalize step.
    ///
    /// May run on a worker thread if the job is background-eligible.
    pub fn parse(&mut self) {
        const OP: &str = "parse";
        self.assert_status(OP, &[CompileJobStatus::ReadyToParse]);
        assert!(
            self.background_eligible || thread::current().id() == self.owner,
            "CompileJob::{OP} called off the owning thread for a source that is not \
             background-eligible"
        );
        let JobState::ReadyToParse(input) = mem::take(&mut self.state) else {
            unreachable!("status checked above");
        };
        let start = Instant::now();

        let outcome = parse_function(&ParseRequest {
            source: &input.source,
            range: input.range.clone(),
            max_stack_bytes: self.max_stack_bytes,
            abort: Some(self.abort.flag()),
        });

        if let Some(tracer) = &self.tracer {
            tracer.record_parse(start.elapsed(), input.range.len());
        }
        tracing::debug!(job = %self, ok = outcome.is_ok(), "parsed");
        self.state = JobState::Parsed { input, outcome };
    }

    /// Report a recorded parse failure, or bind free variables against the
    /// enclosing contexts.
    pub fn finalize_parsing_on_main_thread(
        &mut self,
        runtime: &mut Runtime,
    ) -> Result<(), JobError> {
        const OP: &str = "finalize_parsing_on_main_thread";
        self.assert_runtime(OP, runtime);
        self.assert_status(OP, &[CompileJobStatus::Parsed]);
        let JobState::Parsed { input, outcome } = mem::take(&mut self.state) else {
            unreachable!("status checked above");
        };
        let start = Instant::now();

        let result = match outcome {
            PhaseOutcome::Ok(mut parsed) => {
                let chain = runtime.scope_chain(input.context);
                let free = parsed.resolve_free_variables(&chain);
                self.name = parsed.name().map(Arc::from);
                tracing::debug!(job = %self, free, "finalized parsing");
                self.state = JobState::ReadyToAnalyze(parsed);
                Ok(())
            }
            PhaseOutcome::SyntaxError(diagnostic)
            | PhaseOutcome::ResourceExhausted(diagnostic)
            | PhaseOutcome::Internal(diagnostic) => Err(self.fail(runtime, diagnostic)),
            PhaseOutcome::Aborted => Err(self.fail_aborted()),
        };

        if let Some(tracer) = &self.tracer {
            tracer.record_finalize_parsing(start.elapsed());
        }
        result
    }

    /// Allocate frame slots and measure the AST.
    pub fn prepare_to_compile_on_main_thread(
        &mut self,
        runtime: &mut Runtime,
    ) -> Result<(), JobError> {
        const OP: &str = "prepare_to_compile_on_main_thread";
        self.assert_runtime(OP, runtime);
        self.assert_status(OP, &[CompileJobStatus::ReadyToAnalyze]);
        let JobState::ReadyToAnalyze(mut parsed) = mem::take(&mut self.state) else {
            unreachable!("status checked above");
        };
        let start = Instant::now();

        let result = match analyze(&mut parsed, self.max_stack_bytes) {
            Ok(info) => {
                tracing::debug!(
                    job = %self,
                    nodes = info.node_count,
                    depth = info.max_depth,
                    "prepared to compile"
                );
                self.state = JobState::ReadyToCompile { parsed, info };
                Ok(())
            }
            Err(diagnostic) => Err(self.fail(runtime, diagnostic)),
        };

        if let Some(tracer) = &self.tracer {
            tracer.record_prepare_to_compile(start.elapsed());
        }
        result
    }

    /// Generate bytecode. Failures are recorded for the finalize step.
    pub fn compile(&mut self) {
        const OP: &str = "compile";
        self.assert_owning_thread(OP);
        self.assert_status(OP, &[CompileJobStatus::ReadyToCompile]);
        let JobState::ReadyToCompile { parsed, info } = mem::take(&mut self.state) else {
            unreachable!("status checked above");
        };
        let start = Instant::now();

        let outcome = generate(&parsed, &info, self.max_stack_bytes);

        if let Some(tracer) = &self.tracer {
            tracer.record_compile(start.elapsed(), parsed.arena().node_count());
        }
        tracing::debug!(job = %self, ok = outcome.is_ok(), "compiled");
        self.state = JobState::Compiled { parsed, outcome };
    }

    /// Report a recorded codegen failure, or install the code.
    pub fn finalize_compiling_on_main_thread(
        &mut self,
        runtime: &mut Runtime,
    ) -> Result<(), JobError> {
        const OP: &str = "finalize_compiling_on_main_thread";
        self.assert_runtime(OP, runtime);
        self.assert_status(OP, &[CompileJobStatus::Compiled]);
        let JobState::Compiled { parsed, outcome } = mem::take(&mut self.state) else {
            unreachable!("status checked above");
        };
        let start = Instant::now();

        let result = match outcome {
            PhaseOutcome::Ok(code) => {
                let code = Arc::new(code);
                runtime.install_code(self.function, Arc::clone(&code));
                self.state = JobState::Done { parsed, code };
                tracing::debug!(job = %self, "finalized compiling");
                Ok(())
            }
            PhaseOutcome::SyntaxError(diagnostic)
            | PhaseOutcome::ResourceExhausted(diagnostic)
            | PhaseOutcome::Internal(diagnostic) => Err(self.fail(runtime, diagnostic)),
            PhaseOutcome::Aborted => Err(self.fail_aborted()),
        };

        if let Some(tracer) = &self.tracer {
            tracer.record_finalize_compiling(start.elapsed());
        }
        result
    }

    /// Drop all per-run state and return to `Initial`.
    ///
    /// The function's installed code and any pending error are left alone.
    pub fn reset_on_main_thread(&mut self) {
        const OP: &str = "reset_on_main_thread";
        self.assert_owning_thread(OP);
        let actual = self.status();
        assert!(
            actual.is_terminal(),
            "CompileJob::{OP} called in status {actual}, expected Done or Failed"
        );
        tracing::debug!(job = %self, "reset");
        self.state = JobState::Initial;
        self.name = None;
        self.abort.clear();
    }

    // Helpers

    fn fail(&mut self, runtime: &mut Runtime, diagnostic: Diagnostic) -> JobError {
        runtime.report_compile_error(self.function, &diagnostic);
        self.state = JobState::Failed(Some(diagnostic.clone()));
        tracing::debug!(job = %self, code = %diagnostic.code, "failed");
        JobError::from_diagnostic(diagnostic)
    }

    fn fail_aborted(&mut self) -> JobError {
        self.state = JobState::Failed(None);
        tracing::debug!(job = %self, "aborted");
        JobError::Aborted
    }

    fn assert_status(&self, operation: &str, expected: &[CompileJobStatus]) {
        let actual = self.status();
        assert!(
            expected.contains(&actual),
            "CompileJob::{operation} called in status {actual}, expected {}",
            expected
                .iter()
                .map(|status| status.as_str())
                .collect::<Vec<_>>()
                .join(" or ")
        );
    }

    fn assert_owning_thread(&self, operation: &str) {
        assert!(
            thread::current().id() == self.owner,
            "CompileJob::{operation} must run on the owning thread"
        );
    }

    fn assert_runtime(&self, operation: &str, runtime: &Runtime) {
        assert!(
            runtime.owner_thread() == self.owner,
            "CompileJob::{operation} given a runtime owned by another thread"
        );
    }
}

impl fmt::Display for CompileJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "CompileJob({name}, {})", self.status()),
            None => write!(f, "CompileJob({:?}, {})", self.function, self.status()),
        }
    }
}
