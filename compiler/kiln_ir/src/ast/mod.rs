//! AST node types.
//!
//! Nodes are stored flat in an [`AstArena`](crate::AstArena); children are
//! referenced by [`ExprId`] / [`StmtId`]. Identifiers are not stored by name:
//! each occurrence is a [`RefId`] into the owning function's scope, which is
//! what later resolution and allocation passes update.

mod operators;

pub use operators::{AssignOp, BinaryOp, UnaryOp, UpdateOp};

use std::fmt;

use crate::scope::{FunctionScope, RefId};
use crate::{ExprId, ExprRange, Name, Span, StmtId, StmtRange, VarDeclRange};

/// Expression node.
#[derive(Clone, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// Expression kinds.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ExprKind {
    /// Number literal, stored as `f64` bits so the node stays `Eq`.
    Number(u64),
    /// String literal (cooked contents).
    String(Name),
    Bool(bool),
    Null,
    Undefined,
    /// Identifier occurrence.
    Ident(RefId),
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    /// `target op= value`; only identifiers are assignable.
    Assign {
        op: AssignOp,
        target: RefId,
        value: ExprId,
    },
    /// `++x`, `x--`, ...
    Update {
        op: UpdateOp,
        prefix: bool,
        target: RefId,
    },
    Conditional {
        cond: ExprId,
        then_expr: ExprId,
        else_expr: ExprId,
    },
    Call {
        callee: ExprId,
        args: ExprRange,
    },
}

impl ExprKind {
    /// Build a number literal.
    pub fn number(value: f64) -> Self {
        ExprKind::Number(value.to_bits())
    }

    /// Value of a number literal.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ExprKind::Number(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }
}

/// Statement node.
#[derive(Clone, PartialEq, Eq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

impl fmt::Debug for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// Statement kinds.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum StmtKind {
    Expr(ExprId),
    /// `var a = 1, b;`
    Var(VarDeclRange),
    Return(Option<ExprId>),
    If {
        cond: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
    While {
        cond: ExprId,
        body: StmtId,
    },
    For {
        init: Option<StmtId>,
        cond: Option<ExprId>,
        update: Option<ExprId>,
        body: StmtId,
    },
    Break,
    Continue,
    Block(StmtRange),
    Empty,
}

/// One declarator of a `var` statement.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct VarDecl {
    pub name: Name,
    /// The binding occurrence, used when an initialiser stores to it.
    pub target: RefId,
    pub init: Option<ExprId>,
    pub span: Span,
}

/// The compilation unit: one function literal with its own scope.
#[derive(Clone, Debug)]
pub struct FunctionLiteral {
    pub name: Option<Name>,
    pub body: StmtRange,
    pub scope: FunctionScope,
    pub span: Span,
}
