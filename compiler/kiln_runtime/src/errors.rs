use std::sync::Arc;

/// Failure of a runtime operation or of executing compiled code.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("function {0:?} has not been compiled")]
    NotCompiled(crate::FunctionId),

    #[error("TypeError: {0} is not a function")]
    NotCallable(&'static str),

    #[error("ReferenceError: {0} is not defined")]
    UndefinedGlobal(Arc<str>),

    #[error("RangeError: Maximum call stack size exceeded")]
    CallDepthExceeded,

    #[error("source range {start}..{end} is not valid in a script of {len} bytes")]
    InvalidSourceRange { start: usize, end: usize, len: usize },

    #[error("context chain has no slot {slot} at depth {depth}")]
    InvalidContextSlot { depth: u32, slot: u32 },

    #[error("operand stack underflow")]
    StackUnderflow,
}
