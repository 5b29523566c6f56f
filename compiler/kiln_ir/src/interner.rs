//! String interner for identifiers and string literals.
//!
//! Unlike a process-wide interner, a `StringInterner` belongs to exactly one
//! parsed function. It is filled while parsing (possibly on a worker thread)
//! and travels with the parse result, so it needs no locking.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::Name;

/// Interner mapping strings to compact [`Name`]s.
#[derive(Clone)]
pub struct StringInterner {
    map: FxHashMap<Arc<str>, Name>,
    strings: Vec<Arc<str>>,
}

impl StringInterner {
    /// Create a new interner with the empty string pre-interned as
    /// [`Name::EMPTY`].
    pub fn new() -> Self {
        let empty: Arc<str> = Arc::from("");
        let mut map = FxHashMap::default();
        map.insert(Arc::clone(&empty), Name::EMPTY);
        StringInterner {
            map,
            strings: vec![empty],
        }
    }

    /// Intern a string, returning its Name.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` distinct strings are interned.
    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(&name) = self.map.get(s) {
            return name;
        }
        let raw = u32::try_from(self.strings.len())
            .unwrap_or_else(|_| panic!("interner exceeded {} strings", u32::MAX));
        let name = Name::from_raw(raw);
        let shared: Arc<str> = Arc::from(s);
        self.strings.push(Arc::clone(&shared));
        self.map.insert(shared, name);
        name
    }

    /// Look up a string without interning it.
    pub fn get(&self, s: &str) -> Option<Name> {
        self.map.get(s).copied()
    }

    /// Look up the string for a Name.
    pub fn lookup(&self, name: Name) -> &str {
        &self.strings[name.index()]
    }

    /// Look up the shared string for a Name.
    ///
    /// Used when a string has to outlive the interner, e.g. as a constant in
    /// generated code.
    pub fn lookup_shared(&self, name: Name) -> Arc<str> {
        Arc::clone(&self.strings[name.index()])
    }

    /// Number of interned strings, including the empty string.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Always false: the empty string is pre-interned.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StringInterner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringInterner")
            .field("len", &self.strings.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_idempotent() {
        let mut interner = StringInterner::new();
        let a = interner.intern("alpha");
        let b = interner.intern("beta");
        assert_ne!(a, b);
        assert_eq!(interner.intern("alpha"), a);
        assert_eq!(interner.lookup(b), "beta");
        assert_eq!(interner.len(), 3);
    }

    #[test]
    fn test_empty_is_preinterned() {
        let mut interner = StringInterner::new();
        assert_eq!(interner.intern(""), Name::EMPTY);
        assert_eq!(interner.lookup(Name::EMPTY), "");
    }

    #[test]
    fn test_get_does_not_intern() {
        let mut interner = StringInterner::new();
        assert_eq!(interner.get("x"), None);
        let x = interner.intern("x");
        assert_eq!(interner.get("x"), Some(x));
        assert_eq!(&*interner.lookup_shared(x), "x");
    }
}
