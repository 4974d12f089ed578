//! Rewrite patterns
//!
//! A rewrite pattern is the sequence of token types a reduction waits for, written
//! as space-separated rule names:
//!
//! ```text
//! number times number
//! ```
//!
//! The source string is tokenized with a small logos lexer.

use crate::error::RewriteError;
use crate::lexing::rules::CompiledRules;
use logos::Logos;
use std::fmt;
use std::str::FromStr;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum PatternToken {
    #[regex(r"[^ \t\r\n]+", |lex| lex.slice().to_string())]
    Name(String),
}

/// Ordered, non-empty sequence of token type names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewritePattern {
    kinds: Vec<String>,
}

impl RewritePattern {
    pub fn parse(source: &str) -> Result<Self, RewriteError> {
        let mut lexer = PatternToken::lexer(source);
        let mut kinds = Vec::new();

        while let Some(result) = lexer.next() {
            match result {
                Ok(PatternToken::Name(name)) => kinds.push(name),
                Err(()) => {
                    return Err(RewriteError::InvalidPattern {
                        pattern: source.to_string(),
                        reason: format!("unexpected input at byte {}", lexer.span().start),
                    })
                }
            }
        }

        Self::from_kinds(kinds).map_err(|_| RewriteError::InvalidPattern {
            pattern: source.to_string(),
            reason: "pattern names no token types".to_string(),
        })
    }

    /// Build a pattern from already separated type names.
    pub fn from_kinds<I, S>(kinds: I) -> Result<Self, RewriteError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kinds: Vec<String> = kinds.into_iter().map(Into::into).collect();
        if kinds.is_empty() {
            return Err(RewriteError::InvalidPattern {
                pattern: String::new(),
                reason: "pattern names no token types".to_string(),
            });
        }
        if let Some(blank) = kinds.iter().find(|kind| kind.trim().is_empty()) {
            return Err(RewriteError::InvalidPattern {
                pattern: kinds.join(" "),
                reason: format!("blank token type {:?}", blank),
            });
        }
        Ok(Self { kinds })
    }

    /// Every type must be produced by `rules`, otherwise the pattern can never match.
    pub fn validate(&self, rules: &CompiledRules) -> Result<(), RewriteError> {
        match self.kinds.iter().find(|kind| !rules.contains(kind)) {
            Some(unknown) => Err(RewriteError::InvalidPattern {
                pattern: self.to_string(),
                reason: format!("unknown token type {}", unknown),
            }),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Always false: patterns are non-empty by construction.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.kinds.get(index).map(String::as_str)
    }

    pub fn first(&self) -> &str {
        &self.kinds[0]
    }
}

impl FromStr for RewritePattern {
    type Err = RewriteError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::parse(source)
    }
}

impl fmt::Display for RewritePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kinds.join(" "))
    }
}
