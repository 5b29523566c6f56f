//! Lowering of a resolved unit into bytecode.

use kiln_diagnostic::{internal_limit, stack_overflow, Diagnostic, PhaseOutcome};
use kiln_ir::{
    AstArena, BinaryOp, ExprId, ExprKind, Name, RefId, Span, StmtId, StmtKind,
    StringInterner, UnaryOp, UpdateOp, VariableLocation,
};
use kiln_parse::ParsedFunction;
use kiln_stack::{ensure_sufficient_stack, StackBudget};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{BytecodeArray, CompilationInfo, Constant, Op};

/// Budget charged per AST level by [`generate`].
pub const CODEGEN_FRAME_BYTES: usize = 256;

/// Largest constant pool a function may have.
pub const MAX_CONSTANTS: usize = 1 << 16;

type GenResult<T = ()> = Result<T, Diagnostic>;

/// Generate bytecode for an analyzed unit.
pub fn generate(
    parsed: &ParsedFunction,
    info: &CompilationInfo,
    max_stack_bytes: usize,
) -> PhaseOutcome<BytecodeArray> {
    let mut generator = Generator {
        arena: parsed.arena(),
        interner: parsed.interner(),
        parsed,
        parameter_count: info.parameter_count,
        ops: Vec::with_capacity(info.node_count * 2),
        constants: Vec::new(),
        constant_index: FxHashMap::default(),
        budget: StackBudget::new(max_stack_bytes),
        loops: Vec::new(),
        span: parsed.literal().span,
    };

    let result = generator.function_body();
    match result {
        Ok(()) => {
            let bytecode = BytecodeArray {
                name: parsed.literal().name.map(|name| parsed.interner().lookup_shared(name)),
                ops: generator.ops,
                constants: generator.constants,
                parameter_count: info.parameter_count,
                local_count: info.local_count,
            };
            tracing::debug!(
                ops = bytecode.len(),
                constants = bytecode.constants().len(),
                "generated bytecode"
            );
            PhaseOutcome::Ok(bytecode)
        }
        Err(diagnostic) => {
            tracing::debug!(code = %diagnostic.code, "code generation failed");
            PhaseOutcome::from_diagnostic(diagnostic)
        }
    }
}

/// Constant pool key; strings are keyed by interned name.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
enum ConstantKey {
    Number(u64),
    String(Name),
}

/// Pending jumps of the innermost loops, patched when the loop ends.
#[derive(Default)]
struct LoopLabels {
    breaks: SmallVec<[usize; 4]>,
    continues: SmallVec<[usize; 4]>,
}

struct Generator<'a> {
    arena: &'a AstArena,
    interner: &'a StringInterner,
    parsed: &'a ParsedFunction,
    parameter_count: u32,
    ops: Vec<Op>,
    constants: Vec<Constant>,
    constant_index: FxHashMap<ConstantKey, u32>,
    budget: StackBudget,
    loops: Vec<LoopLabels>,
    /// Span of the node being generated, for limit diagnostics.
    span: Span,
}

impl<'a> Generator<'a> {
    fn function_body(&mut self) -> GenResult {
        let arena = self.arena;
        for &stmt in arena.stmt_list(self.parsed.literal().body) {
            self.stmt(stmt)?;
        }
        self.emit(Op::PushUndefined);
        self.emit(Op::Return);
        self.check_code_size()
    }

    /// Run `f` one level deeper, charging the stack budget for it.
    fn nested(&mut self, span: Span, f: impl FnOnce(&mut Self) -> GenResult) -> GenResult {
        if self.budget.enter(CODEGEN_FRAME_BYTES).is_err() {
            return Err(stack_overflow(span, "generating code", self.budget.limit()));
        }
        let parent = std::mem::replace(&mut self.span, span);
        let result = ensure_sufficient_stack(|| f(self));
        self.span = parent;
        self.budget.exit(CODEGEN_FRAME_BYTES);
        result
    }

    // Statements

    fn stmt(&mut self, id: StmtId) -> GenResult {
        let arena = self.arena;
        let stmt = arena.stmt(id);
        self.nested(stmt.span, |this| this.stmt_inner(&stmt.kind))
    }

    fn stmt_inner(&mut self, kind: &'a StmtKind) -> GenResult {
        let arena = self.arena;
        match *kind {
            StmtKind::Expr(expr) => {
                self.expr(expr)?;
                self.emit(Op::Pop);
            }
            StmtKind::Var(decls) => {
                for decl in arena.var_decls(decls) {
                    if let Some(init) = decl.init {
                        self.expr(init)?;
                        self.store(decl.target)?;
                        self.emit(Op::Pop);
                    }
                }
            }
            StmtKind::Return(value) => {
                match value {
                    Some(value) => self.expr(value)?,
                    None => self.emit(Op::PushUndefined),
                }
                self.emit(Op::Return);
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.expr(cond)?;
                let to_else = self.emit_jump(Op::JumpIfFalse(0));
                self.stmt(then_branch)?;
                match else_branch {
                    Some(else_branch) => {
                        let to_end = self.emit_jump(Op::Jump(0));
                        self.patch_here(to_else)?;
                        self.stmt(else_branch)?;
                        self.patch_here(to_end)?;
                    }
                    None => self.patch_here(to_else)?,
                }
            }
            StmtKind::While { cond, body } => {
                let start = self.here()?;
                self.expr(cond)?;
                let exit = self.emit_jump(Op::JumpIfFalse(0));
                self.loops.push(LoopLabels::default());
                self.stmt(body)?;
                self.emit(Op::Jump(start));
                let labels = self.loops.pop().unwrap_or_default();
                self.patch_here(exit)?;
                let end = self.here()?;
                self.patch_all(&labels.breaks, end);
                self.patch_all(&labels.continues, start);
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
                let start = self.here()?;
                let exit = match cond {
                    Some(cond) => {
                        self.expr(cond)?;
                        Some(self.emit_jump(Op::JumpIfFalse(0)))
                    }
                    None => None,
                };
                self.loops.push(LoopLabels::default());
                self.stmt(body)?;
                let labels = self.loops.pop().unwrap_or_default();
                let next = self.here()?;
                self.patch_all(&labels.continues, next);
                if let Some(update) = update {
                    self.expr(update)?;
                    self.emit(Op::Pop);
                }
                self.emit(Op::Jump(start));
                if let Some(exit) = exit {
                    self.patch_here(exit)?;
                }
                let end = self.here()?;
                self.patch_all(&labels.breaks, end);
            }
            StmtKind::Break => {
                let jump = self.emit_jump(Op::Jump(0));
                if let Some(labels) = self.loops.last_mut() {
                    labels.breaks.push(jump);
                }
            }
            StmtKind::Continue => {
                let jump = self.emit_jump(Op::Jump(0));
                if let Some(labels) = self.loops.last_mut() {
                    labels.continues.push(jump);
                }
            }
            StmtKind::Block(stmts) => {
                for &stmt in arena.stmt_list(stmts) {
                    self.stmt(stmt)?;
                }
            }
            StmtKind::Empty => {}
        }
        Ok(())
    }

    // Expressions

    fn expr(&mut self, id: ExprId) -> GenResult {
        let arena = self.arena;
        let expr = arena.expr(id);
        self.nested(expr.span, |this| this.expr_inner(&expr.kind))
    }

    fn expr_inner(&mut self, kind: &'a ExprKind) -> GenResult {
        let arena = self.arena;
        match *kind {
            ExprKind::Number(bits) => {
                let index = self.constant(ConstantKey::Number(bits))?;
                self.emit(Op::PushConst(index));
            }
            ExprKind::String(name) => {
                let index = self.constant(ConstantKey::String(name))?;
                self.emit(Op::PushConst(index));
            }
            ExprKind::Bool(true) => self.emit(Op::PushTrue),
            ExprKind::Bool(false) => self.emit(Op::PushFalse),
            ExprKind::Null => self.emit(Op::PushNull),
            ExprKind::Undefined => self.emit(Op::PushUndefined),
            ExprKind::Ident(reference) => self.load(reference)?,
            ExprKind::Binary { op, left, right } if op.is_short_circuit() => {
                self.expr(left)?;
                self.emit(Op::Dup);
                let skip = if op == BinaryOp::And {
                    self.emit_jump(Op::JumpIfFalse(0))
                } else {
                    self.emit_jump(Op::JumpIfTrue(0))
                };
                self.emit(Op::Pop);
                self.expr(right)?;
                self.patch_here(skip)?;
            }
            ExprKind::Binary { op, left, right } => {
                self.expr(left)?;
                self.expr(right)?;
                self.emit(Op::Binary(op));
            }
            ExprKind::Unary { op, operand } => {
                self.expr(operand)?;
                self.emit(match op {
                    UnaryOp::Neg => Op::Neg,
                    UnaryOp::Plus => Op::ToNumber,
                    UnaryOp::Not => Op::Not,
                });
            }
            ExprKind::Assign { op, target, value } => {
                match op.binary_op() {
                    Some(binary) => {
                        self.load(target)?;
                        self.expr(value)?;
                        self.emit(Op::Binary(binary));
                    }
                    None => self.expr(value)?,
                }
                self.store(target)?;
            }
            ExprKind::Update { op, prefix, target } => self.update(op, prefix, target)?,
            ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                self.expr(cond)?;
                let to_else = self.emit_jump(Op::JumpIfFalse(0));
                self.expr(then_expr)?;
                let to_end = self.emit_jump(Op::Jump(0));
                self.patch_here(to_else)?;
                self.expr(else_expr)?;
                self.patch_here(to_end)?;
            }
            ExprKind::Call { callee, args } => {
                self.expr(callee)?;
                for &arg in arena.expr_list(args) {
                    self.expr(arg)?;
                }
                let argc = u32::try_from(args.len())
                    .map_err(|_| internal_limit(self.span, "too many call arguments"))?;
                self.emit(Op::Call(argc));
            }
        }
        Ok(())
    }

    /// `++x` leaves the new value, `x++` the old one; both convert to number.
    fn update(&mut self, op: UpdateOp, prefix: bool, target: RefId) -> GenResult {
        let one = self.constant(ConstantKey::Number(1f64.to_bits()))?;
        self.load(target)?;
        self.emit(Op::ToNumber);
        if !prefix {
            self.emit(Op::Dup);
        }
        self.emit(Op::PushConst(one));
        self.emit(Op::Binary(op.binary_op()));
        self.store(target)?;
        if !prefix {
            self.emit(Op::Pop);
        }
        Ok(())
    }

    // Variables

    fn load(&mut self, reference: RefId) -> GenResult {
        let op = match self.location(reference) {
            Some(VariableLocation::Parameter(index)) => Op::LoadLocal(index),
            Some(VariableLocation::Local(index)) => Op::LoadLocal(self.parameter_count + index),
            Some(VariableLocation::Context { depth, slot }) => Op::LoadContext { depth, slot },
            Some(VariableLocation::Global | VariableLocation::Unallocated) | None => {
                Op::LoadGlobal(self.global_name(reference)?)
            }
        };
        self.emit(op);
        Ok(())
    }

    fn store(&mut self, reference: RefId) -> GenResult {
        let op = match self.location(reference) {
            Some(VariableLocation::Parameter(index)) => Op::StoreLocal(index),
            Some(VariableLocation::Local(index)) => Op::StoreLocal(self.parameter_count + index),
            Some(VariableLocation::Context { depth, slot }) => Op::StoreContext { depth, slot },
            Some(VariableLocation::Global | VariableLocation::Unallocated) | None => {
                Op::StoreGlobal(self.global_name(reference)?)
            }
        };
        self.emit(op);
        Ok(())
    }

    fn location(&self, reference: RefId) -> Option<VariableLocation> {
        self.parsed
            .scope()
            .resolve(reference)
            .map(|variable| variable.location)
    }

    /// Unbound references fall back to a global lookup by name.
    fn global_name(&mut self, reference: RefId) -> GenResult<u32> {
        let name = self.parsed.scope().reference(reference).name;
        self.constant(ConstantKey::String(name))
    }

    // Emission

    fn constant(&mut self, key: ConstantKey) -> GenResult<u32> {
        if let Some(&index) = self.constant_index.get(&key) {
            return Ok(index);
        }
        if self.constants.len() >= MAX_CONSTANTS {
            return Err(internal_limit(self.span, "too many constants"));
        }
        let index = u32::try_from(self.constants.len())
            .map_err(|_| internal_limit(self.span, "too many constants"))?;
        self.constants.push(match key {
            ConstantKey::Number(bits) => Constant::Number(f64::from_bits(bits)),
            ConstantKey::String(name) => {
                Constant::String(self.interner.lookup_shared(name))
            }
        });
        self.constant_index.insert(key, index);
        Ok(index)
    }

    fn emit(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Emit a jump with a placeholder target; returns its position.
    fn emit_jump(&mut self, op: Op) -> usize {
        self.ops.push(op);
        self.ops.len() - 1
    }

    fn here(&self) -> GenResult<u32> {
        u32::try_from(self.ops.len()).map_err(|_| internal_limit(self.span, "code too large"))
    }

    fn patch_here(&mut self, jump: usize) -> GenResult {
        let target = self.here()?;
        self.patch(jump, target);
        Ok(())
    }

    fn patch_all(&mut self, jumps: &[usize], target: u32) {
        for &jump in jumps {
            self.patch(jump, target);
        }
    }

    fn patch(&mut self, jump: usize, target: u32) {
        if let Op::Jump(slot) | Op::JumpIfFalse(slot) | Op::JumpIfTrue(slot) = &mut self.ops[jump] {
            *slot = target;
        }
    }

    fn check_code_size(&self) -> GenResult {
        self.here().map(|_| ())
    }
}
