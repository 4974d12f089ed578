//! Lexing
//!
//! Rule declarations go in, positioned tokens come out.
//!
//! Structure:
//! 1. [`pattern`]: the declaration side, an ordered list of named patterns.
//! 2. [`rules`]: compiles a declaration into one alternation automaton.
//! 3. [`tokenizer`]: scans a buffer with a compiled automaton.
//! 4. [`states`]: several tokenizers taking turns on one buffer, driven by a
//!    state stack.
//!
//! Rule order decides ties. This is alternation, not longest match: when two rules
//! match the same prefix, the one declared first wins.

pub mod pattern;
pub mod rules;
pub mod states;
pub mod token;
pub mod tokenizer;

pub use pattern::{Pattern, RuleSpec, Rules, Transitions, ValueFn};
pub use rules::{CompiledRule, CompiledRules};
pub use states::{StatefulLexer, States};
pub use token::{Position, Token};
pub use tokenizer::Tokenizer;
