//! Stack interpreter for [`BytecodeArray`]s.

use std::sync::Arc;

use kiln_codegen::{BytecodeArray, Constant, Op};
use kiln_stack::ensure_sufficient_stack;

use crate::value::binary;
use crate::{ContextId, FunctionId, Runtime, RuntimeError, Value};

/// Deepest nesting of calls before a `RangeError`.
pub const MAX_CALL_DEPTH: usize = 512;

impl Runtime {
    /// Invoke a compiled function. Missing arguments are `undefined`, extra
    /// ones are ignored.
    pub fn call(&mut self, function: FunctionId, args: &[Value]) -> Result<Value, RuntimeError> {
        self.call_at_depth(function, args, 0)
    }

    fn call_at_depth(
        &mut self,
        function: FunctionId,
        args: &[Value],
        depth: usize,
    ) -> Result<Value, RuntimeError> {
        if depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::CallDepthExceeded);
        }
        let code = Arc::clone(self.code(function).ok_or(RuntimeError::NotCompiled(function))?);
        let mut frame = Frame {
            code: &code,
            context: self.function_context(function),
            slots: vec![Value::Undefined; code.frame_size()],
            stack: Vec::new(),
            depth,
        };
        let parameters = code.parameter_count() as usize;
        for (slot, arg) in frame.slots.iter_mut().zip(args.iter().take(parameters)) {
            slot.clone_from(arg);
        }
        ensure_sufficient_stack(|| frame.run(self))
    }
}

struct Frame<'c> {
    code: &'c BytecodeArray,
    context: Option<ContextId>,
    slots: Vec<Value>,
    stack: Vec<Value>,
    depth: usize,
}

impl Frame<'_> {
    fn run(&mut self, runtime: &mut Runtime) -> Result<Value, RuntimeError> {
        let code = self.code;
        let ops = code.ops();
        let mut pc = 0;
        while let Some(&op) = ops.get(pc) {
            pc += 1;
            match op {
                Op::PushConst(index) => {
                    let value = match code.constant(index) {
                        Constant::Number(n) => Value::Number(*n),
                        Constant::String(s) => Value::String(Arc::clone(s)),
                    };
                    self.stack.push(value);
                }
                Op::PushUndefined => self.stack.push(Value::Undefined),
                Op::PushNull => self.stack.push(Value::Null),
                Op::PushTrue => self.stack.push(Value::Bool(true)),
                Op::PushFalse => self.stack.push(Value::Bool(false)),
                Op::LoadLocal(slot) => {
                    let value = self.slots[slot as usize].clone();
                    self.stack.push(value);
                }
                Op::StoreLocal(slot) => {
                    let value = self.peek()?.clone();
                    self.slots[slot as usize] = value;
                }
                Op::LoadContext { depth, slot } => {
                    let value = runtime
                        .context_at(self.context, depth)
                        .and_then(|context| runtime.context_slot(context, slot))
                        .ok_or(RuntimeError::InvalidContextSlot { depth, slot })?
                        .clone();
                    self.stack.push(value);
                }
                Op::StoreContext { depth, slot } => {
                    let value = self.peek()?.clone();
                    let target = runtime
                        .context_at(self.context, depth)
                        .and_then(|context| runtime.context_slot_mut(context, slot))
                        .ok_or(RuntimeError::InvalidContextSlot { depth, slot })?;
                    *target = value;
                }
                Op::LoadGlobal(name) => {
                    let name = self.global_name(name);
                    let value = runtime
                        .globals
                        .get(&*name)
                        .cloned()
                        .ok_or(RuntimeError::UndefinedGlobal(name))?;
                    self.stack.push(value);
                }
                Op::StoreGlobal(name) => {
                    let name = self.global_name(name);
                    let value = self.peek()?.clone();
                    runtime.globals.insert(name, value);
                }
                Op::Binary(op) => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    self.stack.push(binary(op, &left, &right));
                }
                Op::Neg => {
                    let value = self.pop()?;
                    self.stack.push(Value::Number(-value.to_number()));
                }
                Op::ToNumber => {
                    let value = self.pop()?;
                    self.stack.push(Value::Number(value.to_number()));
                }
                Op::Not => {
                    let value = self.pop()?;
                    self.stack.push(Value::Bool(!value.is_truthy()));
                }
                Op::Jump(target) => pc = target as usize,
                Op::JumpIfFalse(target) => {
                    if !self.pop()?.is_truthy() {
                        pc = target as usize;
                    }
                }
                Op::JumpIfTrue(target) => {
                    if self.pop()?.is_truthy() {
                        pc = target as usize;
                    }
                }
                Op::Pop => {
                    self.pop()?;
                }
                Op::Dup => {
                    let value = self.peek()?.clone();
                    self.stack.push(value);
                }
                Op::Call(argc) => {
                    let argc = argc as usize;
                    if self.stack.len() <= argc {
                        return Err(RuntimeError::StackUnderflow);
                    }
                    let args = self.stack.split_off(self.stack.len() - argc);
                    let result = match self.pop()? {
                        Value::Function(callee) => {
                            runtime.call_at_depth(callee, &args, self.depth + 1)?
                        }
                        other => return Err(RuntimeError::NotCallable(other.type_name())),
                    };
                    self.stack.push(result);
                }
                Op::Return => return self.pop(),
            }
        }
        Ok(Value::Undefined)
    }

    fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    fn peek(&self) -> Result<&Value, RuntimeError> {
        self.stack.last().ok_or(RuntimeError::StackUnderflow)
    }

    fn global_name(&self, index: u32) -> Arc<str> {
        match self.code.constant(index) {
            Constant::String(name) => Arc::clone(name),
            Constant::Number(n) => Arc::from(n.to_string()),
        }
    }
}
