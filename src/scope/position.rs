//! Line/column to character-offset conversion.
//!
//! The analysis process reports link sites as zero-based `(line, column)`
//! pairs; scope spans are character offsets. [`LineIndex`] is the bridge
//! between the two coordinate systems.

use crate::links::SourcePosition;

/// Precomputed line starts of a document.
///
/// `\n`, `\r\n` and a lone `\r` all end a line. Offsets and columns count
/// characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Offset of the first character of each line
    starts: Vec<usize>,
    /// Length of each line, excluding its line break
    lengths: Vec<usize>,
    /// Total number of characters in the document
    len: usize,
}

impl LineIndex {
    /// Index the given text.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        let mut lengths = Vec::new();
        let mut offset = 0usize;
        let mut line_start = 0usize;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\r' if chars.peek() == Some(&'\n') => {
                    chars.next();
                    lengths.push(offset - line_start);
                    offset += 2;
                    line_start = offset;
                    starts.push(line_start);
                }
                '\n' | '\r' => {
                    lengths.push(offset - line_start);
                    offset += 1;
                    line_start = offset;
                    starts.push(line_start);
                }
                _ => offset += 1,
            }
        }
        lengths.push(offset - line_start);

        Self {
            starts,
            lengths,
            len: offset,
        }
    }

    /// Number of lines (an empty document has one empty line).
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Number of characters in the document.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the document is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Character offset of a position.
    ///
    /// A column equal to the line length (the end of the line) is accepted.
    /// Returns `None` when the line does not exist or the column lies past the
    /// end of the line.
    #[must_use]
    pub fn offset(&self, position: SourcePosition) -> Option<usize> {
        let line = usize::try_from(position.line).ok()?;
        let column = usize::try_from(position.column).ok()?;
        let start = *self.starts.get(line)?;
        let length = *self.lengths.get(line)?;
        (column <= length).then_some(start + column)
    }

    /// Position of a character offset; `None` past the end of the document.
    ///
    /// Offsets inside a `\r\n` line break map to the end of their line.
    #[must_use]
    pub fn position(&self, offset: usize) -> Option<SourcePosition> {
        if offset > self.len {
            return None;
        }
        let line = match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let column = (offset - self.starts[line]).min(self.lengths[line]);
        Some(SourcePosition::new(
            u32::try_from(line).ok()?,
            u32::try_from(column).ok()?,
        ))
    }
}
