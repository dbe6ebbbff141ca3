//! Parse Utilities
//!
//! Source positions shared by the template tree and the error type.

use serde::{Deserialize, Serialize};

use crate::chars;

/// A location within a source text.
///
/// `line` is 1-based; `index` and `column` are 0-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    pub index: usize,
    pub line: usize,
    pub column: usize,
}

impl SourcePosition {
    pub fn new(index: usize, line: usize, column: usize) -> Self {
        SourcePosition { index, line, column }
    }

    /// Computes the position of a character offset within `source`.
    pub fn locate(source: &str, offset: usize) -> Self {
        let mut line = 1;
        let mut column = 0;
        for (i, ch) in source.char_indices() {
            if i >= offset {
                break;
            }
            if ch == chars::LF {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }
        }
        SourcePosition::new(offset, line, column)
    }
}

impl std::fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
