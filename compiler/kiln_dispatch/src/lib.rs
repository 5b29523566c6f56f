//! Deferred compilation jobs.
//!
//! A [`CompileJob`] carries one function through parsing and code generation
//! as seven explicit steps. The caller decides where each step runs:
//!
//! | status | next step | thread |
//! |---|---|---|
//! | `Initial` | [`prepare_to_parse_on_main_thread`] | owning |
//! | `ReadyToParse` | [`parse`] | owning, or a worker if background-eligible |
//! | `Parsed` | [`finalize_parsing_on_main_thread`] | owning |
//! | `ReadyToAnalyze` | [`prepare_to_compile_on_main_thread`] | owning |
//! | `ReadyToCompile` | [`compile`] | owning |
//! | `Compiled` | [`finalize_compiling_on_main_thread`] | owning |
//! | `Done` / `Failed` | [`reset_on_main_thread`] | owning |
//!
//! Failures in `parse` and `compile` are recorded, not raised. The finalize
//! step that follows reports them to the runtime's error sink and moves the
//! job to `Failed`. Calling a step out of order panics.
//!
//! [`prepare_to_parse_on_main_thread`]: CompileJob::prepare_to_parse_on_main_thread
//! [`parse`]: CompileJob::parse
//! [`finalize_parsing_on_main_thread`]: CompileJob::finalize_parsing_on_main_thread
//! [`prepare_to_compile_on_main_thread`]: CompileJob::prepare_to_compile_on_main_thread
//! [`compile`]: CompileJob::compile
//! [`finalize_compiling_on_main_thread`]: CompileJob::finalize_compiling_on_main_thread
//! [`reset_on_main_thread`]: CompileJob::reset_on_main_thread

mod abort;
mod error;
mod job;
mod status;
mod tracer;

pub use abort::AbortHandle;
pub use error::JobError;
pub use job::CompileJob;
pub use kiln_stack::DEFAULT_MAX_STACK_BYTES;
pub use status::CompileJobStatus;
pub use tracer::JobTracer;

#[cfg(test)]
mod tests;
