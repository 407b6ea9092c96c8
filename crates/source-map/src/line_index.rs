//! Line index for offset ↔ line/column conversion.
//!
//! Columns come in two flavours: byte columns, used internally, and UTF-16
//! columns, which is how the external type checker counts characters in the
//! positions it reports.

use crate::ByteOffset;
use text_size::TextSize;

/// A line and column position (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed column.
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Byte offsets of every line start in a text, for O(log n) lookups.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// `line_starts[i]` is the offset where line `i` begins.
    line_starts: Vec<ByteOffset>,
    len: ByteOffset,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        line_starts.extend(
            text.match_indices('\n')
                .map(|(offset, _)| TextSize::from((offset + 1) as u32)),
        );

        Self {
            line_starts,
            len: TextSize::from(text.len() as u32),
        }
    }

    /// Returns the number of lines in the source.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset to a line and byte column.
    ///
    /// Returns `None` if the offset lies past the end of the text.
    pub fn line_col(&self, offset: ByteOffset) -> Option<LineCol> {
        if offset > self.len {
            return None;
        }
        let line = self.line_of(offset);
        let col = u32::from(offset) - u32::from(self.line_starts[line]);

        Some(LineCol {
            line: line as u32,
            col,
        })
    }

    /// Converts a line and byte column to a byte offset.
    ///
    /// Returns `None` if the line is out of bounds.
    pub fn offset(&self, line_col: LineCol) -> Option<ByteOffset> {
        let line_start = self.line_start(line_col.line)?;
        let offset = line_start + TextSize::from(line_col.col);
        (offset <= self.len).then_some(offset)
    }

    /// Converts a byte offset to a line and UTF-16 column.
    pub fn line_col_utf16(&self, text: &str, offset: ByteOffset) -> Option<LineCol> {
        let LineCol { line, col } = self.line_col(offset)?;
        let start = u32::from(self.line_starts[line as usize]) as usize;
        let prefix = text.get(start..start + col as usize)?;

        Some(LineCol {
            line,
            col: prefix.encode_utf16().count() as u32,
        })
    }

    /// Converts a line and UTF-16 column back to a byte offset.
    ///
    /// A column past the end of the line clamps to the line end.
    pub fn offset_utf16(&self, text: &str, line_col: LineCol) -> Option<ByteOffset> {
        let start = self.line_start(line_col.line)?;
        let end = self.line_end(line_col.line)?;
        let line_text = &text[u32::from(start) as usize..u32::from(end) as usize];

        let mut units = 0u32;
        for (byte, c) in line_text.char_indices() {
            if units >= line_col.col {
                return Some(start + TextSize::from(byte as u32));
            }
            units += c.len_utf16() as u32;
        }
        Some(end)
    }

    /// Returns the byte offset where a line starts.
    pub fn line_start(&self, line: u32) -> Option<ByteOffset> {
        self.line_starts.get(line as usize).copied()
    }

    /// Returns the byte offset where a line ends (before the newline).
    pub fn line_end(&self, line: u32) -> Option<ByteOffset> {
        let line = line as usize;
        if line >= self.line_starts.len() {
            return None;
        }

        let end = self
            .line_starts
            .get(line + 1)
            .map(|&next| next - TextSize::from(1))
            .unwrap_or(self.len);

        Some(end)
    }

    fn line_of(&self, offset: ByteOffset) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_lines() {
        let index = LineIndex::new("<template>\n  <div/>\n</template>");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_col(TextSize::from(0)), Some(LineCol::new(0, 0)));
        assert_eq!(index.line_col(TextSize::from(11)), Some(LineCol::new(1, 0)));
        assert_eq!(index.line_col(TextSize::from(13)), Some(LineCol::new(1, 2)));
        assert_eq!(index.line_col(TextSize::from(20)), Some(LineCol::new(2, 0)));
    }

    #[test]
    fn test_offset_out_of_bounds() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.line_col(TextSize::from(6)), None);
        assert_eq!(index.offset(LineCol::new(2, 0)), None);
        assert_eq!(index.offset(LineCol::new(1, 9)), None);
    }

    #[test]
    fn test_offset_roundtrip() {
        let text = "hello\nworld\nfoo";
        let index = LineIndex::new(text);

        for offset in 0..=text.len() {
            let offset = TextSize::from(offset as u32);
            let line_col = index.line_col(offset).unwrap();
            assert_eq!(index.offset(line_col), Some(offset));
        }
    }

    #[test]
    fn test_utf16_columns() {
        let text = "const a = '😀';\nb";
        let index = LineIndex::new(text);
        let quote_end = TextSize::from(text.find("';").unwrap() as u32);

        // The emoji is four bytes but two UTF-16 units.
        assert_eq!(index.line_col(quote_end), Some(LineCol::new(0, 15)));
        assert_eq!(
            index.line_col_utf16(text, quote_end),
            Some(LineCol::new(0, 13))
        );
        assert_eq!(
            index.offset_utf16(text, LineCol::new(0, 13)),
            Some(quote_end)
        );
        assert_eq!(
            index.offset_utf16(text, LineCol::new(0, 99)),
            index.line_end(0)
        );
    }

    #[test]
    fn test_line_end() {
        let index = LineIndex::new("hello\nworld\n");
        assert_eq!(index.line_end(0), Some(TextSize::from(5)));
        assert_eq!(index.line_end(1), Some(TextSize::from(11)));
        assert_eq!(index.line_end(2), Some(TextSize::from(12)));
        assert_eq!(index.line_end(3), None);
    }
}
