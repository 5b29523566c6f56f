//! Diagnostic system for compile errors.
//!
//! - Error codes for searchability, grouped by phase
//! - An [`ErrorClass`] per code: the kind of runtime error a diagnostic turns
//!   into once it is reported to the runtime's pending-error slot
//! - [`PhaseOutcome`], the tagged result a parser or code generator run
//!   produces; it is stored unexamined until a finalize step inspects it

mod diagnostic;
mod error_code;
mod outcome;
pub mod span_utils;

pub use diagnostic::{
    expected_expression, expected_token, internal_limit, stack_overflow, unexpected_token,
    Diagnostic, Label,
};
pub use error_code::{ErrorClass, ErrorCode};
pub use outcome::PhaseOutcome;
