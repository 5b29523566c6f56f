//! Stack-machine instruction set.

use std::fmt;
use std::sync::Arc;

use kiln_ir::BinaryOp;

/// One instruction.
///
/// Jump targets are absolute instruction indices. `Store*` instructions leave
/// the stored value on the operand stack, since assignment is an expression.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Op {
    /// Push constant pool entry.
    PushConst(u32),
    PushUndefined,
    PushNull,
    PushTrue,
    PushFalse,

    /// Frame slot; parameters occupy the first slots, locals follow.
    LoadLocal(u32),
    StoreLocal(u32),
    LoadContext {
        depth: u32,
        slot: u32,
    },
    StoreContext {
        depth: u32,
        slot: u32,
    },
    /// Global named by a string constant.
    LoadGlobal(u32),
    StoreGlobal(u32),

    /// Pop two operands, push the result. Never a short-circuit operator.
    Binary(BinaryOp),
    Neg,
    /// Unary `+`.
    ToNumber,
    Not,

    Jump(u32),
    /// Pop the condition; jump if it is falsy.
    JumpIfFalse(u32),
    /// Pop the condition; jump if it is truthy.
    JumpIfTrue(u32),

    Pop,
    Dup,
    /// Pop `argc` arguments and the callee, push the result.
    Call(u32),
    Return,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Op::PushConst(index) => write!(f, "PushConst {index}"),
            Op::LoadLocal(slot) => write!(f, "LoadLocal {slot}"),
            Op::StoreLocal(slot) => write!(f, "StoreLocal {slot}"),
            Op::LoadContext { depth, slot } => write!(f, "LoadContext {depth}:{slot}"),
            Op::StoreContext { depth, slot } => write!(f, "StoreContext {depth}:{slot}"),
            Op::LoadGlobal(name) => write!(f, "LoadGlobal {name}"),
            Op::StoreGlobal(name) => write!(f, "StoreGlobal {name}"),
            Op::Binary(op) => write!(f, "Binary {}", op.as_symbol()),
            Op::Jump(target) => write!(f, "Jump @{target}"),
            Op::JumpIfFalse(target) => write!(f, "JumpIfFalse @{target}"),
            Op::JumpIfTrue(target) => write!(f, "JumpIfTrue @{target}"),
            Op::Call(argc) => write!(f, "Call {argc}"),
            other => fmt::Debug::fmt(&other, f),
        }
    }
}

/// Constant pool entry.
#[derive(Clone, PartialEq, Debug)]
pub enum Constant {
    Number(f64),
    String(Arc<str>),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Number(value) => write!(f, "{value}"),
            Constant::String(value) => write!(f, "{value:?}"),
        }
    }
}

/// Compiled code of one function.
#[derive(Clone, PartialEq, Debug)]
pub struct BytecodeArray {
    pub(crate) name: Option<Arc<str>>,
    pub(crate) ops: Vec<Op>,
    pub(crate) constants: Vec<Constant>,
    pub(crate) parameter_count: u32,
    pub(crate) local_count: u32,
}

impl BytecodeArray {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    pub fn constant(&self, index: u32) -> &Constant {
        &self.constants[index as usize]
    }

    pub fn parameter_count(&self) -> u32 {
        self.parameter_count
    }

    pub fn local_count(&self) -> u32 {
        self.local_count
    }

    /// Parameter plus local slots.
    pub fn frame_size(&self) -> usize {
        self.parameter_count as usize + self.local_count as usize
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Disassembly listing.
impl fmt::Display for BytecodeArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "function {} (params: {}, locals: {})",
            self.name().unwrap_or("<anonymous>"),
            self.parameter_count,
            self.local_count
        )?;
        for (index, op) in self.ops.iter().enumerate() {
            write!(f, "{index:>5}  {op}")?;
            match *op {
                Op::PushConst(constant) | Op::LoadGlobal(constant) | Op::StoreGlobal(constant) => {
                    writeln!(f, "  ; {}", self.constant(constant))?;
                }
                _ => writeln!(f)?,
            }
        }
        Ok(())
    }
}
