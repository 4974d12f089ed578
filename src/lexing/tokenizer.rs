//! Tokenizer
//!
//! A [`Tokenizer`] owns a buffer and a scan cursor and pulls tokens out of the
//! buffer one at a time using a shared [`CompiledRules`] table.
//!
//! Scanning is cursor-anchored: a token is produced only when the automaton matches
//! exactly at the cursor. When it does not, the same search already tells us where
//! the next match starts, which bounds the offending substring reported in
//! [`LexError::UnexpectedInput`].
//!
//! Tokens from `ignore` rules still advance the cursor (offset, line and column)
//! but are never returned by [`Tokenizer::next_token`].

use crate::error::{CompileError, LexError};
use crate::lexing::pattern::Rules;
use crate::lexing::rules::CompiledRules;
use crate::lexing::token::{count_line_breaks, Position, Token};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A match together with the index of the rule that produced it.
#[derive(Debug, Clone)]
pub(crate) struct Lexeme {
    pub rule: usize,
    pub token: Token,
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    rules: Arc<CompiledRules>,
    buffer: String,
    position: Position,
    halted: bool,
}

impl Tokenizer {
    /// Compile `rules` and create a tokenizer over an empty buffer.
    pub fn new(rules: &Rules) -> Result<Self, CompileError> {
        Ok(Self::from_compiled(Arc::new(CompiledRules::compile(rules)?)))
    }

    /// Create a tokenizer sharing an already compiled rule table.
    pub fn from_compiled(rules: Arc<CompiledRules>) -> Self {
        Self {
            rules,
            buffer: String::new(),
            position: Position::START,
            halted: false,
        }
    }

    /// Replace the buffer and rewind to line 1, column 1, offset 0.
    pub fn reset(&mut self, buffer: impl Into<String>) -> &mut Self {
        self.reset_at(buffer, Position::START)
    }

    /// Replace the buffer and continue from `position`.
    pub fn reset_at(&mut self, buffer: impl Into<String>, position: Position) -> &mut Self {
        self.buffer = buffer.into();
        self.position = position;
        self.halted = false;
        debug!(
            bytes = self.buffer.len(),
            offset = position.offset,
            "tokenizer reset"
        );
        self
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn rules(&self) -> &Arc<CompiledRules> {
        &self.rules
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Snapshot of the cursor. The buffer itself is not part of the snapshot.
    pub fn save(&self) -> Position {
        self.position
    }

    /// Move the cursor to a position previously obtained from [`Tokenizer::save`]
    /// (or from a sibling tokenizer scanning the same buffer).
    pub fn restore(&mut self, position: Position) {
        self.position = position;
        self.halted = false;
    }

    /// True once the cursor has reached the end of the buffer.
    pub fn is_done(&self) -> bool {
        self.position.offset >= self.buffer.len()
    }

    /// Produce the next non-ignored token, or `None` at the end of the buffer.
    ///
    /// On failure the cursor stays at the offending position.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        loop {
            match self.next_lexeme()? {
                None => return Ok(None),
                Some(lexeme) if self.is_ignored(lexeme.rule) => continue,
                Some(lexeme) => return Ok(Some(lexeme.token)),
            }
        }
    }

    pub(crate) fn is_ignored(&self, rule: usize) -> bool {
        self.rules.get(rule).is_some_and(|rule| rule.ignore)
    }

    /// Produce the next match, ignored rules included.
    pub(crate) fn next_lexeme(&mut self) -> Result<Option<Lexeme>, LexError> {
        if self.is_done() {
            return Ok(None);
        }

        let start = self.position;
        let matched = self
            .rules
            .automaton()
            .captures_at(&self.buffer, start.offset)
            .and_then(|caps| {
                let whole = caps.get(0)?;
                if whole.start() != start.offset || whole.is_empty() {
                    return None;
                }
                Some((self.rules.resolve(&caps)?, whole.end()))
            });

        let Some((index, end)) = matched else {
            return self.unexpected(start);
        };

        let rules = Arc::clone(&self.rules);
        let Some(rule) = rules.get(index) else {
            return self.unexpected(start);
        };

        let text = self.buffer[start.offset..end].to_string();
        let token = Token {
            kind: rule.name.clone(),
            value: rule.value_of(&text),
            line_breaks: count_line_breaks(&text),
            offset: start.offset,
            line: start.line,
            col: start.col,
            text,
        };
        self.position = start.advance(&token.text, rule.line_breaks);

        trace!(
            kind = %token.kind,
            line = token.line,
            col = token.col,
            offset = token.offset,
            ignored = rule.ignore,
            "token"
        );

        Ok(Some(Lexeme { rule: index, token }))
    }

    /// No rule matches at `start`: fall back to the error rule or report the input.
    fn unexpected(&mut self, start: Position) -> Result<Option<Lexeme>, LexError> {
        let rules = Arc::clone(&self.rules);
        if let Some((index, rule)) = rules
            .error_rule()
            .and_then(|index| rules.get(index).map(|rule| (index, rule)))
        {
            let text = self.buffer[start.offset..].to_string();
            warn!(
                kind = %rule.name,
                line = start.line,
                col = start.col,
                "no rule matches, emitting error token"
            );
            let token = Token {
                kind: rule.name.clone(),
                value: text.clone(),
                line_breaks: count_line_breaks(&text),
                offset: start.offset,
                line: start.line,
                col: start.col,
                text,
            };
            self.position = start.advance(&token.text, rule.line_breaks);
            return Ok(Some(Lexeme { rule: index, token }));
        }

        let end = self.resume_point(start.offset);
        Err(LexError::UnexpectedInput {
            line: start.line,
            col: start.col,
            offset: start.offset,
            text: self.buffer[start.offset..end].to_string(),
        })
    }

    /// First offset after `from` where some rule produces a non-empty match.
    fn resume_point(&self, from: usize) -> usize {
        let automaton = self.rules.automaton();
        let mut at = from;

        while at < self.buffer.len() {
            match automaton.find_at(&self.buffer, at) {
                Some(found) if found.start() > from && !found.is_empty() => return found.start(),
                Some(found) => at = next_boundary(&self.buffer, found.start().max(at)),
                None => break,
            }
        }

        self.buffer.len()
    }

    /// Match a single token at the start of `text`, independent of the cursor.
    ///
    /// Returns `None` when no rule matches a prefix of `text`.
    pub fn lex_one(&self, text: &str) -> Option<Token> {
        self.rules.classify(text).map(|(_, token)| token)
    }

    /// Tokenize the whole buffer from the start without disturbing the cursor.
    pub fn to_vec(&mut self) -> Result<Vec<Token>, LexError> {
        let saved = self.save();
        self.position = Position::START;

        let mut tokens = Vec::new();
        let result = loop {
            match self.next_token() {
                Ok(Some(token)) => tokens.push(token),
                Ok(None) => break Ok(tokens),
                Err(err) => break Err(err),
            }
        };

        self.restore(saved);
        result
    }
}

impl Iterator for Tokenizer {
    type Item = Result<Token, LexError>;

    /// Yields tokens until the buffer is exhausted. After an error the iterator
    /// stops; `reset` or `restore` rearms it.
    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        let item = self.next_token().transpose();
        if matches!(item, Some(Err(_))) {
            self.halted = true;
        }
        item
    }
}

fn next_boundary(text: &str, at: usize) -> usize {
    text[at..]
        .chars()
        .next()
        .map_or(text.len(), |c| at + c.len_utf8())
}
