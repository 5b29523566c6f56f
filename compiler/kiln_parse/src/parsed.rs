use std::fmt;

use kiln_ir::{AstArena, FunctionLiteral, FunctionScope, ScopeChain, StringInterner, Variable};

/// A successfully parsed compilation unit.
///
/// Owns everything it refers to, so it can be produced on one thread and
/// finished on another.
pub struct ParsedFunction {
    interner: StringInterner,
    arena: AstArena,
    literal: FunctionLiteral,
}

impl ParsedFunction {
    pub(crate) fn new(interner: StringInterner, arena: AstArena, literal: FunctionLiteral) -> Self {
        ParsedFunction {
            interner,
            arena,
            literal,
        }
    }

    /// Declared name of the function, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.literal.name.map(|name| self.interner.lookup(name))
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn arena(&self) -> &AstArena {
        &self.arena
    }

    pub fn literal(&self) -> &FunctionLiteral {
        &self.literal
    }

    pub fn scope(&self) -> &FunctionScope {
        &self.literal.scope
    }

    /// Look up a binding of the unit's scope by its source name.
    pub fn lookup_variable(&self, name: &str) -> Option<&Variable> {
        let name = self.interner.get(name)?;
        self.literal.scope.lookup(name)
    }

    /// Bind names not declared in the unit against the enclosing contexts.
    /// Returns the number of free variables.
    pub fn resolve_free_variables(&mut self, chain: &ScopeChain) -> usize {
        self.literal
            .scope
            .resolve_free_variables(chain, &self.interner)
    }

    /// Give parameters and locals their frame slots.
    pub fn allocate_variables(&mut self) {
        self.literal.scope.allocate_variables();
    }
}

impl fmt::Debug for ParsedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedFunction")
            .field("name", &self.name())
            .field("nodes", &self.arena.node_count())
            .field("variables", &self.literal.scope.variables().len())
            .finish()
    }
}
