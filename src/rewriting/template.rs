//! Text templates used as reducers
//!
//! A template is reducer output written as data: `{N}` is replaced with the value of
//! the N-th matched token (0-based), everything else is copied as-is.
//!
//! ```text
//! match: "asterisk asterisk text asterisk asterisk"
//! template: "<b>{2}</b>"
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\d+)\}").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Value(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    pieces: Vec<Piece>,
}

impl Template {
    pub fn parse(source: &str) -> Self {
        let mut pieces = Vec::new();
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(source) {
            let (Some(whole), Some(index)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            // Indices too large to parse can never be in range; keep them as text.
            let Ok(index) = index.as_str().parse::<usize>() else {
                continue;
            };
            if whole.start() > last {
                pieces.push(Piece::Text(source[last..whole.start()].to_string()));
            }
            pieces.push(Piece::Value(index));
            last = whole.end();
        }
        if last < source.len() {
            pieces.push(Piece::Text(source[last..].to_string()));
        }

        Self {
            source: source.to_string(),
            pieces,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Highest placeholder index, if the template has placeholders.
    pub fn max_index(&self) -> Option<usize> {
        self.pieces
            .iter()
            .filter_map(|piece| match piece {
                Piece::Value(index) => Some(*index),
                Piece::Text(_) => None,
            })
            .max()
    }

    /// Placeholders outside `values` render as nothing.
    pub fn render(&self, values: &[String]) -> String {
        self.pieces
            .iter()
            .map(|piece| match piece {
                Piece::Text(text) => text.as_str(),
                Piece::Value(index) => values.get(*index).map_or("", String::as_str),
            })
            .collect()
    }
}
