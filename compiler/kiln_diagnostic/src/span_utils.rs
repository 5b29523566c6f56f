//! Line and column lookup for diagnostics.

use kiln_ir::Span;

/// Pre-computed line offset table for line/column lookup.
///
/// ```
/// use kiln_diagnostic::span_utils::LineOffsetTable;
///
/// let source = "line1\nline2\nline3";
/// let table = LineOffsetTable::build(source);
///
/// assert_eq!(table.offset_to_line_col(source, 0), (1, 1));
/// assert_eq!(table.offset_to_line_col(source, 6), (2, 1));
/// assert_eq!(table.offset_to_line_col(source, 14), (3, 3));
/// ```
#[derive(Clone, Debug, Default)]
pub struct LineOffsetTable {
    /// Byte offset of each line start; `offsets[0] == 0`.
    offsets: Vec<u32>,
}

impl LineOffsetTable {
    /// Build a line offset table from source text.
    pub fn build(source: &str) -> Self {
        let mut offsets = vec![0u32];
        offsets.extend(newline_offsets(source).filter_map(|i| u32::try_from(i + 1).ok()));
        LineOffsetTable { offsets }
    }

    /// Get 1-based line number from a byte offset using binary search.
    pub fn line_from_offset(&self, offset: u32) -> u32 {
        let line_idx = match self.offsets.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert.saturating_sub(1),
        };
        u32::try_from(line_idx).unwrap_or(u32::MAX - 1) + 1
    }

    /// Get 1-based (line, column) from a byte offset.
    ///
    /// The column counts characters, not bytes, from the start of the line.
    pub fn offset_to_line_col(&self, source: &str, offset: u32) -> (u32, u32) {
        let line = self.line_from_offset(offset);
        let line_start = self.offsets[(line - 1) as usize] as usize;
        let end = (offset as usize).min(source.len());
        let column = source
            .get(line_start..end)
            .map_or(0, |text| text.chars().count());
        (line, u32::try_from(column).unwrap_or(u32::MAX - 1) + 1)
    }
}

fn newline_offsets(source: &str) -> impl Iterator<Item = usize> + '_ {
    source
        .bytes()
        .enumerate()
        .filter_map(|(i, b)| (b == b'\n').then_some(i))
}

/// 1-based (line, column) of the start of `span`.
pub fn span_start_line_col(source: &str, span: Span) -> (u32, u32) {
    LineOffsetTable::build(source).offset_to_line_col(source, span.start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let source = "(x) { x*x; }";
        let table = LineOffsetTable::build(source);
        assert_eq!(table.offset_to_line_col(source, 6), (1, 7));
        assert_eq!(table.offset_to_line_col(source, 12), (1, 13));
    }

    #[test]
    fn test_offset_at_newline_belongs_to_line() {
        let source = "ab\ncd";
        let table = LineOffsetTable::build(source);
        assert_eq!(table.offset_to_line_col(source, 2), (1, 3));
        assert_eq!(table.offset_to_line_col(source, 3), (2, 1));
    }

    #[test]
    fn test_span_start() {
        assert_eq!(span_start_line_col("a\n  ^^^", Span::new(4, 7)), (2, 3));
    }
}
