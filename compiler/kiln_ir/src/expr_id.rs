//! Node IDs and ranges for the flat AST.
//!
//! - `ExprId(u32)` / `StmtId(u32)` instead of `Box<Expr>` / `Box<Stmt>`
//! - `ExprRange` / `StmtRange` / `VarDeclRange` for lists, stored as a
//!   `(start, len)` window into the arena's side tables

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create a new ID from an arena index.
            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            /// Get the index into the arena.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Get the raw u32 value.
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

macro_rules! define_range {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
        pub struct $name {
            pub start: u32,
            pub len: u32,
        }

        impl $name {
            /// Empty range.
            pub const EMPTY: $name = $name { start: 0, len: 0 };

            /// Create a new range.
            #[inline]
            pub const fn new(start: u32, len: u32) -> Self {
                $name { start, len }
            }

            /// Check if the range is empty.
            #[inline]
            pub const fn is_empty(&self) -> bool {
                self.len == 0
            }

            /// Number of entries in the range.
            #[inline]
            pub const fn len(&self) -> usize {
                self.len as usize
            }

            /// The range as indices into the side table.
            #[inline]
            pub fn to_range(&self) -> std::ops::Range<usize> {
                self.start as usize..(self.start + self.len) as usize
            }
        }
    };
}

define_id!(
    /// Index into the expression arena.
    ExprId
);

define_id!(
    /// Index into the statement arena.
    StmtId
);

define_range!(
    /// Range of expressions in the arena's expression list table (call arguments).
    ExprRange
);

define_range!(
    /// Range of statements in the arena's statement list table (blocks, bodies).
    StmtRange
);

define_range!(
    /// Range of declarations in the arena's `var` declaration table.
    VarDeclRange
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip_and_debug() {
        let id = ExprId::new(7);
        assert_eq!(id.index(), 7);
        assert_eq!(id.raw(), 7);
        assert_eq!(format!("{:?}", StmtId::new(3)), "StmtId(3)");
    }

    #[test]
    fn test_range_indices() {
        let range = StmtRange::new(4, 3);
        assert_eq!(range.to_range(), 4..7);
        assert_eq!(range.len(), 3);
        assert!(ExprRange::EMPTY.is_empty());
    }
}
