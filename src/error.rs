//! Error types
//!
//! Every layer of the crate reports failures through its own enum:
//!
//! - [`CompileError`]: a rule set or state table cannot be turned into an automaton.
//! - [`LexError`]: scanning failed at a concrete position in the buffer.
//! - [`RewriteError`]: a reduction pass was misconfigured or did not converge.
//! - [`DeclarationError`]: a rule file could not be read or converted.
//!
//! All of them are fatal for the call that raised them. Nothing is retried
//! internally and a failed scan leaves the cursor at the failure point.

use thiserror::Error;

/// Errors raised while compiling rules into an automaton.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The pattern is not one of the recognized shapes.
    #[error("Unexpected pattern type at {rule}: {reason}")]
    PatternType { rule: String, reason: String },

    #[error("Invalid regular expression for rule {rule}: {source}")]
    InvalidRegex {
        rule: String,
        #[source]
        source: regex::Error,
    },

    /// The pattern accepts the empty string and would never advance the cursor.
    #[error("Rule {rule} matches the empty string")]
    EmptyMatch { rule: String },

    #[error("Only one error rule is allowed per rule set (found {first} and {second})")]
    MultipleErrorRules { first: String, second: String },

    #[error("Failed to build the combined automaton: {0}")]
    Automaton(#[source] regex::Error),

    #[error("A stateful lexer needs at least one state")]
    NoStates,

    #[error("Rule {rule} in state {state} targets unknown state {target}")]
    UnknownState {
        state: String,
        rule: String,
        target: String,
    },

    /// A transition directive carries the wrong kind of value.
    #[error("Invalid {directive} value for rule {rule}: {reason}")]
    InvalidTransitionValue {
        rule: String,
        directive: String,
        reason: String,
    },
}

/// Errors raised while scanning a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// No rule matches at the cursor. `text` runs up to the next position
    /// where some rule could match again (or to the end of the buffer).
    #[error("Unexpected token at line {line} col {col}: \"{}\"", escape_newlines(.text))]
    UnexpectedInput {
        line: usize,
        col: usize,
        offset: usize,
        text: String,
    },

    /// A `pop` directive would leave the state stack empty.
    #[error("Rule {rule} pops {count} state(s) but the stack only holds {depth}")]
    StateStackUnderflow {
        rule: String,
        depth: usize,
        count: usize,
    },
}

/// Errors raised by the stream rewriter and the multi-pass driver.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Invalid rewrite pattern \"{pattern}\": {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The reducer produced text the driving rule set cannot lex.
    #[error("Reducer output \"{}\" is not tokenizable", escape_newlines(.value))]
    UnreducibleValue { value: String },

    #[error("Reduction did not converge after {limit} reductions")]
    ReductionLimit { limit: usize },

    #[error(transparent)]
    Lex(#[from] LexError),
}

/// Errors raised while loading a declaration file.
#[derive(Debug, Error)]
pub enum DeclarationError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML declaration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON declaration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported declaration format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid template for reduction {rule}: {reason}")]
    Template { rule: String, reason: String },

    #[error("Declaration defines neither rules nor states")]
    Empty,

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

/// Umbrella error for callers that drive the whole toolchain.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Render line breaks as `\n` so token text stays on one line.
pub fn escape_newlines(text: &str) -> String {
    text.replace('\n', "\\n")
}
