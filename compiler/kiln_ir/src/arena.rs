//! Flat storage for the nodes of one function.

use crate::{
    Expr, ExprId, ExprRange, Stmt, StmtId, StmtRange, VarDecl, VarDeclRange,
};

/// Arena owning every expression, statement and list of a parsed function.
#[derive(Clone, Default, Debug)]
pub struct AstArena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    expr_lists: Vec<ExprId>,
    stmt_lists: Vec<StmtId>,
    var_decls: Vec<VarDecl>,
}

fn to_u32(len: usize, what: &str) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("AST arena exceeded u32::MAX {what}"))
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an expression, returning its ID.
    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(to_u32(self.exprs.len(), "expressions"));
        self.exprs.push(expr);
        id
    }

    /// Allocate a statement, returning its ID.
    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(to_u32(self.stmts.len(), "statements"));
        self.stmts.push(stmt);
        id
    }

    /// Copy a list of expressions into the list table.
    pub fn alloc_expr_list(&mut self, exprs: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let start = to_u32(self.expr_lists.len(), "list entries");
        self.expr_lists.extend(exprs);
        let len = to_u32(self.expr_lists.len(), "list entries") - start;
        ExprRange::new(start, len)
    }

    /// Copy a list of statements into the list table.
    pub fn alloc_stmt_list(&mut self, stmts: impl IntoIterator<Item = StmtId>) -> StmtRange {
        let start = to_u32(self.stmt_lists.len(), "list entries");
        self.stmt_lists.extend(stmts);
        let len = to_u32(self.stmt_lists.len(), "list entries") - start;
        StmtRange::new(start, len)
    }

    /// Copy the declarators of one `var` statement into the declaration table.
    pub fn alloc_var_decls(&mut self, decls: impl IntoIterator<Item = VarDecl>) -> VarDeclRange {
        let start = to_u32(self.var_decls.len(), "declarations");
        self.var_decls.extend(decls);
        let len = to_u32(self.var_decls.len(), "declarations") - start;
        VarDeclRange::new(start, len)
    }

    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    #[inline]
    pub fn expr_list(&self, range: ExprRange) -> &[ExprId] {
        &self.expr_lists[range.to_range()]
    }

    #[inline]
    pub fn stmt_list(&self, range: StmtRange) -> &[StmtId] {
        &self.stmt_lists[range.to_range()]
    }

    #[inline]
    pub fn var_decls(&self, range: VarDeclRange) -> &[VarDecl] {
        &self.var_decls[range.to_range()]
    }

    /// Total number of expression and statement nodes.
    pub fn node_count(&self) -> usize {
        self.exprs.len() + self.stmts.len()
    }
}
