//! Kiln IR - Intermediate Representation Types
//!
//! Core data structures shared by the Kiln front end, code generator and
//! compile jobs:
//! - Spans for source locations
//! - Names for interned identifiers
//! - Tokens and `TokenList` for lexer output
//! - Flat AST nodes (Expr, Stmt, `FunctionLiteral`) stored in an `AstArena`
//! - The function scope tree (variables, references, allocation)
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: identifiers and string literals become `Name(u32)`
//! - **Flatten Everything**: no `Box<Expr>`, nodes refer to each other through
//!   `ExprId(u32)` / `StmtId(u32)` indices into the arena
//! - **Own Everything**: a parsed function owns its interner, arena and scope,
//!   so it can move between threads as one value
//!
//! The flat layout also matters for resource limits: very deep expressions are
//! dropped without recursion, because no node owns another.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod arena;
pub mod ast;
mod expr_id;
mod interner;
mod name;
pub mod scope;
mod span;
mod token;

pub use arena::AstArena;
pub use ast::{
    AssignOp, BinaryOp, Expr, ExprKind, FunctionLiteral, Stmt, StmtKind, UnaryOp, UpdateOp,
    VarDecl,
};
pub use expr_id::{ExprId, ExprRange, StmtId, StmtRange, VarDeclRange};
pub use interner::StringInterner;
pub use name::Name;
pub use scope::{
    ContextScope, FunctionScope, RefId, Reference, ScopeChain, VarId, Variable, VariableKind,
    VariableLocation,
};
pub use span::Span;
pub use token::{Token, TokenKind, TokenList};
