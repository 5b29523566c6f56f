use std::marker::PhantomData;
use std::ops::Range;
use std::rc::Rc;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use kiln_codegen::BytecodeArray;
use kiln_diagnostic::span_utils::span_start_line_col;
use kiln_diagnostic::Diagnostic;
use kiln_ir::{ContextScope, ScopeChain};
use rustc_hash::FxHashMap;

use crate::heap::{Context, Function, HeapString, Script};
use crate::{
    ContextId, ErrorSink, FunctionId, PendingError, PendingErrorSlot, RuntimeError, ScriptId,
    StringId, Value,
};

/// Handle to the source text of a script.
#[derive(Clone, Debug)]
pub enum SourceHandle {
    /// Embedder-supplied text, readable from any thread.
    External { text: Arc<str>, one_byte: bool },
    /// Runtime-owned text; must be copied out on the owning thread.
    Heap(StringId),
}

impl SourceHandle {
    /// Whether the text may be read off the owning thread without copying.
    pub fn is_background_safe(&self) -> bool {
        matches!(self, SourceHandle::External { one_byte: true, .. })
    }
}

/// What a compile job needs to know about a function's source.
#[derive(Clone, Debug)]
pub struct FunctionSource {
    pub handle: SourceHandle,
    /// Byte range of the unit within the script source.
    pub range: Range<usize>,
    pub context: Option<ContextId>,
}

/// The runtime heap and its pending-error sink.
///
/// Not `Send`: every object in it belongs to the thread that created it.
pub struct Runtime {
    strings: Vec<HeapString>,
    scripts: Vec<Script>,
    functions: Vec<Function>,
    contexts: Vec<Context>,
    pub(crate) globals: FxHashMap<Arc<str>, Value>,
    error_sink: Box<dyn ErrorSink>,
    owner: ThreadId,
    _not_send: PhantomData<Rc<()>>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// A runtime reporting into a [`PendingErrorSlot`].
    pub fn new() -> Self {
        Self::with_error_sink(PendingErrorSlot::default())
    }

    pub fn with_error_sink(error_sink: impl ErrorSink + 'static) -> Self {
        Runtime {
            strings: Vec::new(),
            scripts: Vec::new(),
            functions: Vec::new(),
            contexts: Vec::new(),
            globals: FxHashMap::default(),
            error_sink: Box::new(error_sink),
            owner: thread::current().id(),
            _not_send: PhantomData,
        }
    }

    /// The thread that created this runtime.
    pub fn owner_thread(&self) -> ThreadId {
        self.owner
    }

    // Strings and scripts

    /// Register embedder-owned text.
    pub fn new_external_string(&mut self, text: impl Into<Arc<str>>) -> StringId {
        let text = text.into();
        let one_byte = text.chars().all(|c| u32::from(c) < 0x100);
        self.push_string(HeapString::External { text, one_byte })
    }

    /// Allocate runtime-owned text.
    pub fn new_heap_string(&mut self, text: impl Into<String>) -> StringId {
        self.push_string(HeapString::Heap(text.into()))
    }

    fn push_string(&mut self, string: HeapString) -> StringId {
        let id = StringId::from_index(self.strings.len());
        self.strings.push(string);
        id
    }

    pub fn string(&self, id: StringId) -> &str {
        self.strings[id.index()].as_str()
    }

    pub fn new_script(&mut self, name: impl Into<Arc<str>>, source: StringId) -> ScriptId {
        let id = ScriptId::from_index(self.scripts.len());
        self.scripts.push(Script {
            name: name.into(),
            source,
        });
        id
    }

    pub fn script_source(&self, script: ScriptId) -> &str {
        self.string(self.scripts[script.index()].source)
    }

    // Contexts

    /// Allocate a context holding `slots`, enclosed by `parent`.
    pub fn new_context(&mut self, parent: Option<ContextId>, slots: &[(&str, Value)]) -> ContextId {
        let id = ContextId::from_index(self.contexts.len());
        self.contexts.push(Context {
            parent,
            names: slots.iter().map(|(name, _)| Arc::from(*name)).collect(),
            values: slots.iter().map(|(_, value)| value.clone()).collect(),
        });
        id
    }

    pub fn context_slot(&self, context: ContextId, slot: u32) -> Option<&Value> {
        self.contexts[context.index()].values.get(slot as usize)
    }

    /// The context `depth` levels out from `context`.
    pub(crate) fn context_at(&self, context: Option<ContextId>, depth: u32) -> Option<ContextId> {
        let mut current = context?;
        for _ in 0..depth {
            current = self.contexts[current.index()].parent?;
        }
        Some(current)
    }

    pub(crate) fn context_slot_mut(&mut self, context: ContextId, slot: u32) -> Option<&mut Value> {
        self.contexts[context.index()].values.get_mut(slot as usize)
    }

    /// Slot names of `context` and its parents, innermost first.
    pub fn scope_chain(&self, context: Option<ContextId>) -> ScopeChain {
        let mut scopes = Vec::new();
        let mut current = context;
        while let Some(id) = current {
            let context = &self.contexts[id.index()];
            scopes.push(ContextScope::new(context.names.clone()));
            current = context.parent;
        }
        ScopeChain::new(scopes)
    }

    // Globals

    pub fn set_global(&mut self, name: &str, value: Value) {
        self.globals.insert(Arc::from(name), value);
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    // Functions

    /// Register the unit at `range` of `script`, closing over `context`.
    pub fn new_function(
        &mut self,
        script: ScriptId,
        range: Range<usize>,
        context: Option<ContextId>,
    ) -> Result<FunctionId, RuntimeError> {
        let source = self.script_source(script);
        if range.start > range.end || source.get(range.clone()).is_none() {
            return Err(RuntimeError::InvalidSourceRange {
                start: range.start,
                end: range.end,
                len: source.len(),
            });
        }
        let id = FunctionId::from_index(self.functions.len());
        self.functions.push(Function {
            script,
            range,
            context,
            code: None,
        });
        Ok(id)
    }

    /// Register a whole script as a single function unit.
    pub fn new_script_function(
        &mut self,
        name: impl Into<Arc<str>>,
        source: StringId,
        context: Option<ContextId>,
    ) -> Result<FunctionId, RuntimeError> {
        let len = self.string(source).len();
        let script = self.new_script(name, source);
        self.new_function(script, 0..len, context)
    }

    /// Source handle, unit range and enclosing context of `function`.
    pub fn function_source(&self, function: FunctionId) -> FunctionSource {
        let function = &self.functions[function.index()];
        let source = self.scripts[function.script.index()].source;
        let handle = match &self.strings[source.index()] {
            HeapString::External { text, one_byte } => SourceHandle::External {
                text: Arc::clone(text),
                one_byte: *one_byte,
            },
            HeapString::Heap(_) => SourceHandle::Heap(source),
        };
        FunctionSource {
            handle,
            range: function.range.clone(),
            context: function.context,
        }
    }

    /// Text behind `handle` as a shareable string; heap text is copied.
    pub fn flatten_source(&self, handle: &SourceHandle) -> Arc<str> {
        match handle {
            SourceHandle::External { text, .. } => Arc::clone(text),
            SourceHandle::Heap(id) => Arc::from(self.string(*id)),
        }
    }

    pub fn code(&self, function: FunctionId) -> Option<&Arc<BytecodeArray>> {
        self.functions[function.index()].code.as_ref()
    }

    pub fn is_compiled(&self, function: FunctionId) -> bool {
        self.code(function).is_some()
    }

    /// Attach compiled code to `function`, replacing earlier code.
    pub fn install_code(&mut self, function: FunctionId, code: Arc<BytecodeArray>) {
        tracing::debug!(
            function = ?function,
            name = code.name().unwrap_or("<anonymous>"),
            ops = code.len(),
            "installed code"
        );
        self.functions[function.index()].code = Some(code);
    }

    pub(crate) fn function_context(&self, function: FunctionId) -> Option<ContextId> {
        self.functions[function.index()].context
    }

    // Errors

    /// Escalate a compile diagnostic for `function` to the error sink.
    pub fn report_compile_error(&mut self, function: FunctionId, diagnostic: &Diagnostic) {
        let script = &self.scripts[self.functions[function.index()].script.index()];
        let (line, column) = match diagnostic.primary_span() {
            Some(span) => span_start_line_col(self.string(script.source), span),
            None => (0, 0),
        };
        let error = PendingError {
            class: diagnostic.class(),
            message: diagnostic.message.clone(),
            script: Arc::clone(&script.name),
            line,
            column,
        };
        tracing::debug!(function = ?function, error = %error, "reported compile error");
        self.error_sink.report(error);
    }

    pub fn pending_error(&self) -> Option<&PendingError> {
        self.error_sink.pending()
    }

    pub fn has_pending_error(&self) -> bool {
        self.pending_error().is_some()
    }

    pub fn clear_pending_error(&mut self) {
        self.error_sink.clear();
    }
}
