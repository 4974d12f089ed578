//! # cute
//!
//! A regex-driven tokenizer generator with a token-stream rewriting engine.
//!
//! Rules are compiled into one alternation automaton and matched at a cursor,
//! first declared rule wins. On top of that sit a stacked-state lexer, where
//! several rule sets take turns scanning one buffer, and a rewriter that folds runs
//! of tokens into new text and re-lexes it. Running reductions one pass per rule
//! in declaration order gives precedence without building a tree:
//!
//! ```rust,ignore
//! use cute::{Pattern, RecursiveLexer, ReductionRule, Rules, Tokenizer};
//!
//! let lexer = Tokenizer::new(
//!     &Rules::new()
//!         .add("number", Pattern::regex(r"\d+"))
//!         .add("plus", "+")
//!         .add("times", "*"),
//! )?;
//! let mut driver = RecursiveLexer::new(lexer, vec![
//!     ReductionRule::new("product", "number times number", |v: &[String]| {
//!         v[0].parse::<i64>().unwrap() * v[2].parse::<i64>().unwrap()
//!     })?,
//!     ReductionRule::new("sum", "number plus number", |v: &[String]| {
//!         v[0].parse::<i64>().unwrap() + v[2].parse::<i64>().unwrap()
//!     })?,
//! ])?;
//! driver.reset("1+2*3*4");
//! assert_eq!(driver.finish()?, "25");
//! ```
//!
//! Modules:
//! - [`lexing`]: rule compiler, tokenizer and stacked-state lexer.
//! - [`rewriting`]: stream rewriter and the multi-pass driver.
//! - [`declaration`]: rule sets and reductions loaded from YAML/JSON.
//! - [`config`]: layered runtime configuration.
//! - [`error`]: error types for every stage.

pub mod config;
pub mod declaration;
pub mod error;
pub mod lexing;
pub mod rewriting;

pub use error::{CompileError, DeclarationError, Error, LexError, RewriteError};
pub use lexing::{
    CompiledRules, Pattern, Position, RuleSpec, Rules, StatefulLexer, States, Token, Tokenizer,
};
pub use rewriting::{RecursiveLexer, ReductionRule, RewriteOptions, RewritePattern, Template};
