//! Heap object storage. Objects are never freed.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use kiln_codegen::BytecodeArray;

use crate::Value;

macro_rules! define_heap_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn from_index(index: usize) -> Self {
                $name(u32::try_from(index).unwrap_or_else(|_| {
                    panic!(concat!(stringify!($name), " arena exceeded u32::MAX entries"))
                }))
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

define_heap_id!(
    /// A string on the runtime heap.
    StringId
);
define_heap_id!(
    /// A script: a named source string.
    ScriptId
);
define_heap_id!(
    /// A function: one compilation unit inside a script.
    FunctionId
);
define_heap_id!(
    /// A context: named slots a function closes over.
    ContextId
);

pub(crate) enum HeapString {
    /// Supplied by the embedder; immutable and shareable across threads.
    External { text: Arc<str>, one_byte: bool },
    /// Owned by the runtime; only the owning thread may read it.
    Heap(String),
}

impl HeapString {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            HeapString::External { text, .. } => text,
            HeapString::Heap(text) => text,
        }
    }
}

pub(crate) struct Script {
    pub(crate) name: Arc<str>,
    pub(crate) source: StringId,
}

pub(crate) struct Function {
    pub(crate) script: ScriptId,
    pub(crate) range: Range<usize>,
    pub(crate) context: Option<ContextId>,
    pub(crate) code: Option<Arc<BytecodeArray>>,
}

pub(crate) struct Context {
    pub(crate) parent: Option<ContextId>,
    pub(crate) names: Vec<Arc<str>>,
    pub(crate) values: Vec<Value>,
}
