//! Rewriting
//!
//! Token-stream rewriting on top of the lexer: runs of tokens matching a type
//! sequence are folded into new text, the text is re-lexed with the same rules and
//! spliced back, and the stream is flattened into a new buffer.
//!
//! Structure:
//! 1. [`pattern`]: the type sequence a reduction waits for.
//! 2. [`mapper`]: the [`StreamMapper`] seam and the reduction pass itself, exposed
//!    as [`Tokenizer::transform`](crate::lexing::Tokenizer::transform).
//! 3. [`recursive`]: ordered reduction rules applied one pass each.
//! 4. [`template`]: reducers written as text with `{N}` placeholders.

pub mod mapper;
pub mod pattern;
pub mod recursive;
pub mod template;

pub use mapper::{walk_stream, ReductionMapper, RewriteOptions, StreamMapper};
pub use pattern::RewritePattern;
pub use recursive::{RecursiveLexer, Reducer, ReductionRule};
pub use template::Template;
