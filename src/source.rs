//! Source locations shared by every pipeline stage.

use std::fmt;

/// A 1-based line/column position within a named source file.
///
/// Columns count bytes, not code points (per the lexer's contract): a
/// multi-byte UTF-8 character advances `column` by its byte length, not by
/// one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLoc {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLoc {
    pub fn new(filename: impl Into<String>, line: u32, column: u32) -> Self {
        SourceLoc {
            filename: filename.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}
