//! Tokens and scan positions

use serde::Serialize;
use std::fmt;

/// Scan position inside a buffer.
///
/// `offset` is a byte offset, `line` and `col` are 1-based. Columns count
/// characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub const START: Position = Position {
        offset: 0,
        line: 1,
        col: 1,
    };

    /// Position after consuming `text`.
    ///
    /// Lines only advance when `line_breaks` is set for the rule that produced the
    /// text; the column then goes back to 1.
    pub fn advance(self, text: &str, line_breaks: bool) -> Position {
        let breaks = count_line_breaks(text);
        let (line, col) = if line_breaks && breaks > 0 {
            (self.line + breaks, 1)
        } else {
            (self.line, self.col + text.chars().count())
        };
        Position {
            offset: self.offset + text.len(),
            line,
            col,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// One recognized unit of input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Name of the rule that produced the token.
    #[serde(rename = "type")]
    pub kind: String,
    /// Transformed text (equal to `text` when the rule has no value transform).
    pub value: String,
    /// Raw matched text.
    pub text: String,
    /// Byte offset of the first character.
    pub offset: usize,
    pub line_breaks: usize,
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn position(&self) -> Position {
        Position {
            offset: self.offset,
            line: self.line,
            col: self.col,
        }
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {} {:?}",
            self.line, self.col, self.kind, self.value
        )
    }
}

pub fn count_line_breaks(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}
