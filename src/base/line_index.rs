//! Byte offset to line/column conversion.

use text_size::{TextRange, TextSize};

use super::{Position, Span};

/// Line start table for one source text.
///
/// Columns are counted in bytes from the line start, which is what the CST
/// offsets give us. Lines are split on `\n`; a preceding `\r` stays part of
/// the previous line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(TextSize::new(offset as u32 + 1));
            }
        }
        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    /// Convert an offset into a position. Offsets past the end clamp to the end.
    pub fn position(&self, offset: TextSize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let column = offset - self.line_starts[line];
        Position::new(line, u32::from(column) as usize)
    }

    pub fn span(&self, range: TextRange) -> Span {
        Span::new(self.position(range.start()), self.position(range.end()))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
