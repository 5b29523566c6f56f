//! Bytecode generation for Kiln compilation units.
//!
//! Two passes, both on the owning thread:
//!
//! - [`analyze`] allocates frame slots for parameters and locals and walks the
//!   AST once to measure it, producing [`CompilationInfo`].
//! - [`generate`] lowers the resolved AST into a [`BytecodeArray`] for the
//!   runtime's stack interpreter.
//!
//! Both passes recurse over the tree and charge a fixed frame cost per level
//! against the job's stack budget, so a deep expression fails with a
//! `RangeError` diagnostic instead of overflowing the native stack.

mod analysis;
mod bytecode;
mod generator;

pub use analysis::{analyze, CompilationInfo, ANALYSIS_FRAME_BYTES};
pub use bytecode::{BytecodeArray, Constant, Op};
pub use generator::{generate, CODEGEN_FRAME_BYTES, MAX_CONSTANTS};
