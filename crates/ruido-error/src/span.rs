//! Span - Source location
//!
//! A Span marks a region of IR text, used to report lexer and parser
//! errors precisely. Trees built in memory carry no spans.

/// A position in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Line (1-indexed)
    pub line: u32,
    /// Column (1-indexed)
    pub column: u32,
    /// Byte offset from the beginning of the file
    pub offset: usize,
}

impl Position {
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self { line, column, offset }
    }
}

/// A region in the source text (start to end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
    /// Source file ID (to support multiple files)
    pub file_id: u32,
}

impl Span {
    pub fn new(start: Position, end: Position, file_id: u32) -> Self {
        Self { start, end, file_id }
    }

    /// Smallest span covering both
    pub fn merge(self, other: Span) -> Span {
        debug_assert_eq!(self.file_id, other.file_id, "spans from different files");
        let start = if other.start.offset < self.start.offset { other.start } else { self.start };
        let end = if other.end.offset > self.end.offset { other.end } else { self.end };
        Span { start, end, file_id: self.file_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let open = Span::new(Position::new(1, 1, 0), Position::new(1, 2, 1), 0);
        let close = Span::new(Position::new(3, 4, 40), Position::new(3, 5, 41), 0);

        let merged = open.merge(close);
        assert_eq!(merged.start.offset, 0);
        assert_eq!(merged.end.offset, 41);
        assert_eq!(merged.end.line, 3);
        assert_eq!(close.merge(open), merged);
    }
}
