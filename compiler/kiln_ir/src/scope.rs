//! Function scope tree.
//!
//! A compilation unit has exactly one function scope. The parser declares
//! parameters and `var`s into it and records every identifier occurrence as a
//! [`Reference`]. Resolution then happens in three steps, each owned by a
//! different job phase:
//!
//! 1. [`FunctionScope::bind_local_references`] (end of parsing, any thread):
//!    references to the unit's own declarations are bound.
//! 2. [`FunctionScope::resolve_free_variables`] (owning thread): remaining
//!    names are looked up in the enclosing context chain captured from the
//!    heap and become [`VariableLocation::Context`] or
//!    [`VariableLocation::Global`] bindings.
//! 3. [`FunctionScope::allocate_variables`] (owning thread, before code
//!    generation): parameters and locals receive frame slots.
//!
//! Until step 3 the unit's own variables stay [`VariableLocation::Unallocated`].

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::{Name, Span, StringInterner};

/// Index of a [`Variable`] in its scope.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct VarId(u32);

impl VarId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VarId({})", self.0)
    }
}

/// Index of a [`Reference`] in its scope.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct RefId(u32);

impl RefId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefId({})", self.0)
    }
}

/// How a variable came into the scope.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum VariableKind {
    Parameter,
    Var,
    /// Declared outside the unit; created during free-variable resolution.
    Free,
}

/// Where a variable lives at run time.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum VariableLocation {
    /// Storage not assigned yet.
    Unallocated,
    /// Argument slot `n` of the frame.
    Parameter(u32),
    /// Local slot `n` of the frame, after the parameters.
    Local(u32),
    /// Slot of an enclosing context. Depth 0 is the context the function
    /// closes over.
    Context { depth: u32, slot: u32 },
    /// Looked up by name in the global table.
    Global,
}

/// A binding visible in the function.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Variable {
    pub name: Name,
    pub kind: VariableKind,
    pub location: VariableLocation,
    /// Declaration site; `Span::DUMMY` for free variables.
    pub span: Span,
}

/// One identifier occurrence.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Reference {
    pub name: Name,
    pub span: Span,
    /// `None` until the reference is bound.
    pub var: Option<VarId>,
}

/// Slot names of one heap context, as seen from a compilation unit.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct ContextScope {
    slots: Vec<Arc<str>>,
}

impl ContextScope {
    pub fn new(slots: Vec<Arc<str>>) -> Self {
        ContextScope { slots }
    }

    /// Slot index of `name`, searching from the last declared slot.
    pub fn slot_of(&self, name: &str) -> Option<u32> {
        self.slots
            .iter()
            .rposition(|slot| &**slot == name)
            .and_then(|index| u32::try_from(index).ok())
    }

    pub fn slots(&self) -> &[Arc<str>] {
        &self.slots
    }
}

/// The enclosing context chain of a unit, innermost first.
///
/// Captured from the heap on the owning thread; it holds plain strings so it
/// can be used without further heap access.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct ScopeChain {
    contexts: Vec<ContextScope>,
}

impl ScopeChain {
    pub fn new(contexts: Vec<ContextScope>) -> Self {
        ScopeChain { contexts }
    }

    /// Find `name` in the chain as `(depth, slot)`.
    pub fn lookup(&self, name: &str) -> Option<(u32, u32)> {
        self.contexts.iter().enumerate().find_map(|(depth, context)| {
            let slot = context.slot_of(name)?;
            Some((u32::try_from(depth).ok()?, slot))
        })
    }

    pub fn depth(&self) -> usize {
        self.contexts.len()
    }
}

/// The scope of a compilation unit.
#[derive(Clone, Default, Debug)]
pub struct FunctionScope {
    variables: Vec<Variable>,
    by_name: FxHashMap<Name, VarId>,
    references: Vec<Reference>,
    parameter_count: u32,
    local_count: u32,
    allocated: bool,
}

fn next_index(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("scope exceeded u32::MAX entries"))
}

impl FunctionScope {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_variable(&mut self, variable: Variable) -> VarId {
        let id = VarId(next_index(self.variables.len()));
        self.by_name.insert(variable.name, id);
        self.variables.push(variable);
        id
    }

    /// Declare a parameter.
    ///
    /// Returns `Err` with the earlier declaration if the name is already a
    /// parameter.
    pub fn declare_parameter(&mut self, name: Name, span: Span) -> Result<VarId, VarId> {
        if let Some(&existing) = self.by_name.get(&name) {
            return Err(existing);
        }
        self.parameter_count += 1;
        Ok(self.push_variable(Variable {
            name,
            kind: VariableKind::Parameter,
            location: VariableLocation::Unallocated,
            span,
        }))
    }

    /// Declare a `var`. Redeclaring an existing name (including a parameter)
    /// yields the existing binding.
    pub fn declare_var(&mut self, name: Name, span: Span) -> VarId {
        if let Some(&existing) = self.by_name.get(&name) {
            return existing;
        }
        self.push_variable(Variable {
            name,
            kind: VariableKind::Var,
            location: VariableLocation::Unallocated,
            span,
        })
    }

    /// Record an identifier occurrence.
    pub fn add_reference(&mut self, name: Name, span: Span) -> RefId {
        let id = RefId(next_index(self.references.len()));
        self.references.push(Reference {
            name,
            span,
            var: None,
        });
        id
    }

    /// Bind every reference whose name is declared in this scope.
    ///
    /// `var` declarations are hoisted, so this runs once the whole body has
    /// been parsed.
    pub fn bind_local_references(&mut self) {
        for reference in &mut self.references {
            if reference.var.is_none() {
                reference.var = self.by_name.get(&reference.name).copied();
            }
        }
    }

    /// Names referenced but not declared in the unit, in first-use order.
    pub fn unresolved_names(&self) -> Vec<Name> {
        let mut seen = rustc_hash::FxHashSet::default();
        self.references
            .iter()
            .filter(|r| r.var.is_none())
            .filter(|r| seen.insert(r.name))
            .map(|r| r.name)
            .collect()
    }

    /// Bind the remaining references against the enclosing context chain.
    ///
    /// A name found in the chain becomes a context-allocated binding, anything
    /// else a global. Returns the number of free variables created.
    pub fn resolve_free_variables(
        &mut self,
        chain: &ScopeChain,
        interner: &StringInterner,
    ) -> usize {
        let names = self.unresolved_names();
        for &name in &names {
            let location = match chain.lookup(interner.lookup(name)) {
                Some((depth, slot)) => VariableLocation::Context { depth, slot },
                None => VariableLocation::Global,
            };
            self.push_variable(Variable {
                name,
                kind: VariableKind::Free,
                location,
                span: Span::DUMMY,
            });
        }
        self.bind_local_references();
        names.len()
    }

    /// Assign frame slots: parameters first, in declaration order, then
    /// locals. Free variables keep their resolved location. Idempotent.
    pub fn allocate_variables(&mut self) {
        if self.allocated {
            return;
        }
        let mut parameters = 0;
        let mut locals = 0;
        for variable in &mut self.variables {
            match variable.kind {
                VariableKind::Parameter => {
                    variable.location = VariableLocation::Parameter(parameters);
                    parameters += 1;
                }
                VariableKind::Var => {
                    variable.location = VariableLocation::Local(locals);
                    locals += 1;
                }
                VariableKind::Free => {}
            }
        }
        self.local_count = locals;
        self.allocated = true;
    }

    /// Look up a binding by name.
    pub fn lookup(&self, name: Name) -> Option<&Variable> {
        self.by_name.get(&name).map(|&id| &self.variables[id.index()])
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.index()]
    }

    pub fn reference(&self, id: RefId) -> &Reference {
        &self.references[id.index()]
    }

    /// The binding a reference resolved to, if any.
    pub fn resolve(&self, id: RefId) -> Option<&Variable> {
        self.reference(id).var.map(|var| self.variable(var))
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn parameter_count(&self) -> u32 {
        self.parameter_count
    }

    /// Number of local slots; zero until allocation.
    pub fn local_count(&self) -> u32 {
        self.local_count
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chain(contexts: &[&[&str]]) -> ScopeChain {
        ScopeChain::new(
            contexts
                .iter()
                .map(|slots| ContextScope::new(slots.iter().map(|s| Arc::from(*s)).collect()))
                .collect(),
        )
    }

    #[test]
    fn test_local_binding_is_hoisted() {
        let mut interner = StringInterner::new();
        let a = interner.intern("a");
        let mut scope = FunctionScope::new();
        let use_before_decl = scope.add_reference(a, Span::new(0, 1));
        let var = scope.declare_var(a, Span::new(5, 6));
        scope.bind_local_references();
        assert_eq!(scope.reference(use_before_decl).var, Some(var));
        assert!(scope.unresolved_names().is_empty());
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let mut interner = StringInterner::new();
        let x = interner.intern("x");
        let mut scope = FunctionScope::new();
        let first = scope.declare_parameter(x, Span::new(1, 2));
        assert!(first.is_ok());
        assert_eq!(scope.declare_parameter(x, Span::new(4, 5)), Err(first.unwrap()));
        assert_eq!(scope.parameter_count(), 1);
    }

    #[test]
    fn test_var_redeclaring_parameter_shares_binding() {
        let mut interner = StringInterner::new();
        let x = interner.intern("x");
        let mut scope = FunctionScope::new();
        let param = scope.declare_parameter(x, Span::DUMMY).unwrap();
        assert_eq!(scope.declare_var(x, Span::DUMMY), param);
    }

    #[test]
    fn test_free_variables_resolve_to_context_or_global() {
        let mut interner = StringInterner::new();
        let x = interner.intern("x");
        let g = interner.intern("g");
        let print = interner.intern("print");
        let mut scope = FunctionScope::new();
        scope.declare_parameter(x, Span::DUMMY).unwrap();
        scope.add_reference(x, Span::DUMMY);
        scope.add_reference(g, Span::DUMMY);
        scope.add_reference(print, Span::DUMMY);
        scope.add_reference(g, Span::DUMMY);
        scope.bind_local_references();

        let created = scope.resolve_free_variables(&chain(&[&[], &["h", "g"]]), &interner);
        assert_eq!(created, 2);
        assert_eq!(
            scope.lookup(g).map(|v| v.location),
            Some(VariableLocation::Context { depth: 1, slot: 1 })
        );
        assert_eq!(
            scope.lookup(print).map(|v| v.location),
            Some(VariableLocation::Global)
        );
        assert_eq!(
            scope.lookup(x).map(|v| v.location),
            Some(VariableLocation::Unallocated)
        );
        assert!(scope.references().iter().all(|r| r.var.is_some()));
    }

    #[test]
    fn test_allocation_orders_parameters_then_locals() {
        let mut interner = StringInterner::new();
        let names: Vec<Name> = ["a", "b", "t", "u"].iter().map(|s| interner.intern(s)).collect();
        let mut scope = FunctionScope::new();
        scope.declare_var(names[2], Span::DUMMY);
        scope.declare_parameter(names[0], Span::DUMMY).unwrap();
        scope.declare_parameter(names[1], Span::DUMMY).unwrap();
        scope.declare_var(names[3], Span::DUMMY);
        scope.allocate_variables();

        let locations: Vec<_> = names
            .iter()
            .map(|&n| scope.lookup(n).map(|v| v.location))
            .collect();
        assert_eq!(
            locations,
            vec![
                Some(VariableLocation::Parameter(0)),
                Some(VariableLocation::Parameter(1)),
                Some(VariableLocation::Local(0)),
                Some(VariableLocation::Local(1)),
            ]
        );
        assert_eq!(scope.local_count(), 2);
    }

    #[test]
    fn test_chain_prefers_innermost_context() {
        let chain = chain(&[&["v"], &["v", "w"]]);
        assert_eq!(chain.lookup("v"), Some((0, 0)));
        assert_eq!(chain.lookup("w"), Some((1, 1)));
        assert_eq!(chain.lookup("z"), None);
        assert_eq!(chain.depth(), 2);
    }
}
