//! Runtime heap and interpreter for Kiln functions.
//!
//! The [`Runtime`] owns every heap object: strings, scripts, functions and
//! contexts, addressed by typed indices. It is pinned to the thread that
//! created it. Compile jobs read function sources through it, report failures
//! to its [`ErrorSink`], and install finished [`BytecodeArray`]s on its
//! functions, which [`Runtime::call`] then executes.
//!
//! [`BytecodeArray`]: kiln_codegen::BytecodeArray

mod error_sink;
mod errors;
mod heap;
mod interpreter;
mod runtime;
mod value;

pub use error_sink::{ErrorSink, PendingError, PendingErrorSlot};
pub use errors::RuntimeError;
pub use heap::{ContextId, FunctionId, ScriptId, StringId};
pub use interpreter::MAX_CALL_DEPTH;
pub use runtime::{FunctionSource, Runtime, SourceHandle};
pub use value::Value;
