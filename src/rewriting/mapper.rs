//! Stream mapper trait and the reduction mapper
//!
//! A [`StreamMapper`] receives the full token stream of a buffer and returns a new
//! stream. [`walk_stream`] drives one mapper over a tokenizer: it tokenizes the
//! buffer, maps the tokens, concatenates the resulting values into a new buffer and
//! resets the tokenizer onto it, so passes chain naturally.
//!
//! # Reduction
//!
//! [`ReductionMapper`] folds every run of tokens whose types spell a
//! [`RewritePattern`] into the reducer's output:
//!
//! 1. Tokens are pulled from a worklist. A token extends the candidate window when
//!    its type equals the pattern element at the window's current length.
//! 2. On a mismatch the whole window is emitted unchanged and only the breaking
//!    token goes back to the front of the worklist, where it may open a new window.
//!    Tokens inside a broken window are not reconsidered as window starts.
//! 3. A full window is handed to the reducer. Its output is re-lexed with the same
//!    rule table and the resulting tokens are pushed to the front of the worklist,
//!    so a result whose first type starts the pattern opens a new window at once.
//!    This is how `number times number` keeps folding `2*3*4` into one number.
//! 4. A freshly reduced head never completes a window on its own; a further token
//!    must be consumed first. Single-element patterns thus replace each match once.
//!
//! A reducer whose output always re-matches would never finish, so the number of
//! reductions per pass is capped by [`RewriteOptions::max_reductions`].

use crate::error::RewriteError;
use crate::lexing::rules::CompiledRules;
use crate::lexing::token::Token;
use crate::lexing::tokenizer::Tokenizer;
use crate::rewriting::pattern::RewritePattern;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Transforms a flat token stream.
pub trait StreamMapper {
    fn map_flat(&mut self, tokens: Vec<Token>) -> Result<Vec<Token>, RewriteError>;
}

/// Run `mapper` over the whole buffer of `lexer` and reset `lexer` onto the result.
///
/// Ignored tokens are not part of the stream and therefore vanish from the
/// rewritten buffer. Returns the rewritten buffer.
pub fn walk_stream(
    lexer: &mut Tokenizer,
    mapper: &mut impl StreamMapper,
) -> Result<String, RewriteError> {
    let tokens = lexer.to_vec()?;
    let mapped = mapper.map_flat(tokens)?;
    let buffer: String = mapped.iter().map(|token| token.value.as_str()).collect();
    lexer.reset(buffer.clone());
    Ok(buffer)
}

/// Knobs for a reduction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Upper bound on reductions in a single pass.
    pub max_reductions: usize,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            max_reductions: 10_000,
        }
    }
}

/// Folds pattern matches into reducer output.
pub struct ReductionMapper<F> {
    rules: Arc<CompiledRules>,
    pattern: RewritePattern,
    reducer: F,
    options: RewriteOptions,
    reductions: usize,
}

impl<F, T> ReductionMapper<F>
where
    F: FnMut(&[String]) -> T,
    T: ToString,
{
    /// The pattern must only name types produced by `rules`.
    pub fn new(
        rules: Arc<CompiledRules>,
        pattern: RewritePattern,
        reducer: F,
        options: RewriteOptions,
    ) -> Result<Self, RewriteError> {
        pattern.validate(&rules)?;
        Ok(Self {
            rules,
            pattern,
            reducer,
            options,
            reductions: 0,
        })
    }

    /// Reductions performed so far.
    pub fn reductions(&self) -> usize {
        self.reductions
    }

    fn reduce(&mut self, window: Vec<Token>) -> Result<Vec<Token>, RewriteError> {
        self.reductions += 1;
        if self.reductions > self.options.max_reductions {
            return Err(RewriteError::ReductionLimit {
                limit: self.options.max_reductions,
            });
        }

        let values: Vec<String> = window.into_iter().map(|token| token.value).collect();
        let output = (self.reducer)(&values).to_string();
        debug!(pattern = %self.pattern, ?values, %output, "reduced");
        self.relex(&output)
    }

    /// Split reducer output into tokens with single-shot matches.
    fn relex(&self, output: &str) -> Result<Vec<Token>, RewriteError> {
        let unreducible = || RewriteError::UnreducibleValue {
            value: output.to_string(),
        };

        let mut tokens = Vec::new();
        let mut rest = output;
        while !rest.is_empty() {
            let (rule, token) = self.rules.classify(rest).ok_or_else(unreducible)?;
            rest = &rest[token.text.len()..];
            if !self.rules.get(rule).is_some_and(|rule| rule.ignore) {
                tokens.push(token);
            }
        }

        if tokens.is_empty() {
            return Err(unreducible());
        }
        Ok(tokens)
    }
}

impl<F, T> StreamMapper for ReductionMapper<F>
where
    F: FnMut(&[String]) -> T,
    T: ToString,
{
    fn map_flat(&mut self, tokens: Vec<Token>) -> Result<Vec<Token>, RewriteError> {
        let size = self.pattern.len();
        let mut pending: VecDeque<Token> = tokens.into();
        let mut window: Vec<Token> = Vec::with_capacity(size);
        let mut output = Vec::with_capacity(pending.len());

        while let Some(token) = pending.pop_front() {
            let expected = self.pattern.get(window.len());

            if expected.is_some_and(|kind| token.is(kind)) {
                window.push(token);
                if window.len() < size {
                    continue;
                }

                let replacement = self.reduce(std::mem::take(&mut window))?;
                let mut replacement = replacement.into_iter();
                let head = replacement.next();
                for token in replacement.rev() {
                    pending.push_front(token);
                }
                if let Some(head) = head {
                    if head.is(self.pattern.first()) {
                        window.push(head);
                    } else {
                        output.push(head);
                    }
                }
            } else if window.is_empty() {
                output.push(token);
            } else {
                output.extend(window.drain(..));
                pending.push_front(token);
            }
        }

        output.append(&mut window);
        Ok(output)
    }
}

impl Tokenizer {
    /// Fold every run of `pattern` (space-separated type names) in the buffer into
    /// the reducer's output, then reset onto the rewritten buffer.
    ///
    /// The reducer receives the matched tokens' values in order.
    pub fn transform<F, T>(&mut self, pattern: &str, reducer: F) -> Result<&mut Self, RewriteError>
    where
        F: FnMut(&[String]) -> T,
        T: ToString,
    {
        self.transform_with(pattern, reducer, RewriteOptions::default())
    }

    pub fn transform_with<F, T>(
        &mut self,
        pattern: &str,
        reducer: F,
        options: RewriteOptions,
    ) -> Result<&mut Self, RewriteError>
    where
        F: FnMut(&[String]) -> T,
        T: ToString,
    {
        let pattern = RewritePattern::parse(pattern)?;
        let mut mapper = ReductionMapper::new(Arc::clone(self.rules()), pattern, reducer, options)?;
        walk_stream(self, &mut mapper)?;
        Ok(self)
    }
}
