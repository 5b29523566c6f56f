//! Byte cursor over the unit's source text.

/// Cursor over a source slice whose first byte sits at `base` in the script.
pub(crate) struct Cursor<'a> {
    bytes: &'a [u8],
    source: &'a str,
    pos: usize,
    base: u32,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(source: &'a str, base: u32) -> Self {
        Cursor {
            bytes: source.as_bytes(),
            source,
            pos: 0,
            base,
        }
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn current(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    pub(crate) fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    #[inline]
    pub(crate) fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    #[inline]
    pub(crate) fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.bytes.len());
    }

    /// Advance while `pred` holds for the current byte.
    pub(crate) fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.current().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    /// The char starting at the cursor (for non-ASCII input).
    pub(crate) fn current_char(&self) -> Option<char> {
        self.source.get(self.pos..).and_then(|rest| rest.chars().next())
    }

    /// Remaining bytes from the cursor.
    pub(crate) fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos.min(self.bytes.len())..]
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }

    /// Absolute script offset of a local position.
    #[inline]
    pub(crate) fn offset(&self, local: usize) -> u32 {
        self.base
            .saturating_add(u32::try_from(local).unwrap_or(u32::MAX))
    }
}
