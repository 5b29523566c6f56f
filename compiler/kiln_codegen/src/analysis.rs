//! Variable allocation and the measuring walk that precedes generation.

use kiln_diagnostic::{stack_overflow, Diagnostic};
use kiln_ir::{AstArena, ExprId, ExprKind, Span, StmtId, StmtKind};
use kiln_parse::ParsedFunction;
use kiln_stack::{ensure_sufficient_stack, StackBudget};

/// Budget charged per AST level by [`analyze`].
pub const ANALYSIS_FRAME_BYTES: usize = 64;

/// What code generation needs to know about a resolved unit.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CompilationInfo {
    /// Statements and expressions reachable from the body.
    pub node_count: usize,
    /// Deepest nesting of statements and expressions.
    pub max_depth: usize,
    pub parameter_count: u32,
    pub local_count: u32,
}

/// Allocate frame slots and measure the unit.
///
/// Free variables must already be resolved; allocation only touches the
/// unit's own parameters and locals.
pub fn analyze(
    parsed: &mut ParsedFunction,
    max_stack_bytes: usize,
) -> Result<CompilationInfo, Diagnostic> {
    parsed.allocate_variables();

    let mut walker = Walker {
        arena: parsed.arena(),
        budget: StackBudget::new(max_stack_bytes),
        depth: 0,
        node_count: 0,
        max_depth: 0,
    };
    let body = parsed.literal().body;
    for &stmt in parsed.arena().stmt_list(body) {
        walker.stmt(stmt)?;
    }

    let scope = parsed.scope();
    let info = CompilationInfo {
        node_count: walker.node_count,
        max_depth: walker.max_depth,
        parameter_count: scope.parameter_count(),
        local_count: scope.local_count(),
    };
    tracing::debug!(
        nodes = info.node_count,
        depth = info.max_depth,
        params = info.parameter_count,
        locals = info.local_count,
        "analyzed function"
    );
    Ok(info)
}

struct Walker<'a> {
    arena: &'a AstArena,
    budget: StackBudget,
    depth: usize,
    node_count: usize,
    max_depth: usize,
}

impl Walker<'_> {
    fn enter(&mut self, span: Span) -> Result<(), Diagnostic> {
        if self.budget.enter(ANALYSIS_FRAME_BYTES).is_err() {
            return Err(stack_overflow(span, "analyzing", self.budget.limit()));
        }
        self.depth += 1;
        self.node_count += 1;
        self.max_depth = self.max_depth.max(self.depth);
        Ok(())
    }

    fn exit(&mut self) {
        self.depth -= 1;
        self.budget.exit(ANALYSIS_FRAME_BYTES);
    }

    fn stmt(&mut self, id: StmtId) -> Result<(), Diagnostic> {
        let arena = self.arena;
        let stmt = arena.stmt(id);
        self.enter(stmt.span)?;
        let result = ensure_sufficient_stack(|| self.stmt_children(&stmt.kind));
        self.exit();
        result
    }

    fn stmt_children(&mut self, kind: &StmtKind) -> Result<(), Diagnostic> {
        let arena = self.arena;
        match *kind {
            StmtKind::Expr(expr) => self.expr(expr),
            StmtKind::Var(decls) => {
                for decl in arena.var_decls(decls) {
                    if let Some(init) = decl.init {
                        self.expr(init)?;
                    }
                }
                Ok(())
            }
            StmtKind::Return(value) => self.opt_expr(value),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.expr(cond)?;
                self.stmt(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.stmt(else_branch)?;
                }
                Ok(())
            }
            StmtKind::While { cond, body } => {
                self.expr(cond)?;
                self.stmt(body)
            }
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.stmt(init)?;
                }
                self.opt_expr(cond)?;
                self.opt_expr(update)?;
                self.stmt(body)
            }
            StmtKind::Block(stmts) => {
                for &stmt in arena.stmt_list(stmts) {
                    self.stmt(stmt)?;
                }
                Ok(())
            }
            StmtKind::Break | StmtKind::Continue | StmtKind::Empty => Ok(()),
        }
    }

    fn opt_expr(&mut self, expr: Option<ExprId>) -> Result<(), Diagnostic> {
        match expr {
            Some(expr) => self.expr(expr),
            None => Ok(()),
        }
    }

    fn expr(&mut self, id: ExprId) -> Result<(), Diagnostic> {
        let arena = self.arena;
        let expr = arena.expr(id);
        self.enter(expr.span)?;
        let result = ensure_sufficient_stack(|| self.expr_children(&expr.kind));
        self.exit();
        result
    }

    fn expr_children(&mut self, kind: &ExprKind) -> Result<(), Diagnostic> {
        let arena = self.arena;
        match *kind {
            ExprKind::Number(_)
            | ExprKind::String(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::Undefined
            | ExprKind::Ident(_)
            | ExprKind::Update { .. } => Ok(()),
            ExprKind::Binary { left, right, .. } => {
                self.expr(left)?;
                self.expr(right)
            }
            ExprKind::Unary { operand, .. } => self.expr(operand),
            ExprKind::Assign { value, .. } => self.expr(value),
            ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                self.expr(cond)?;
                self.expr(then_expr)?;
                self.expr(else_expr)
            }
            ExprKind::Call { callee, args } => {
                self.expr(callee)?;
                for &arg in arena.expr_list(args) {
                    self.expr(arg)?;
                }
                Ok(())
            }
        }
    }
}
