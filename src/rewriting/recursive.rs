//! Recursive multi-pass driver
//!
//! A [`RecursiveLexer`] applies an ordered list of [`ReductionRule`]s to a buffer,
//! one full rewrite pass per rule, in declaration order. Each pass re-lexes the
//! output of the previous one. Declaring a multiplication rule before an addition
//! rule therefore evaluates products first: precedence comes from pass order, no
//! tree is ever built.
//!
//! The driver is an iterator over intermediate buffers. It is finite (one item per
//! rule) and does not start over once exhausted; [`RecursiveLexer::finish`] drains
//! it and returns the fully reduced buffer.

use crate::error::RewriteError;
use crate::lexing::tokenizer::Tokenizer;
use crate::rewriting::mapper::{walk_stream, ReductionMapper, RewriteOptions};
use crate::rewriting::pattern::RewritePattern;
use crate::rewriting::template::Template;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Maps matched token values to replacement text.
pub type Reducer = Box<dyn FnMut(&[String]) -> String + Send>;

/// A named pattern/reducer pair.
pub struct ReductionRule {
    name: String,
    pattern: RewritePattern,
    reducer: Reducer,
}

impl ReductionRule {
    pub fn new<F, T>(name: impl Into<String>, pattern: &str, mut reducer: F) -> Result<Self, RewriteError>
    where
        F: FnMut(&[String]) -> T + Send + 'static,
        T: ToString,
    {
        Ok(Self {
            name: name.into(),
            pattern: RewritePattern::parse(pattern)?,
            reducer: Box::new(move |values: &[String]| reducer(values).to_string()),
        })
    }

    /// Reduction whose output is rendered from a template.
    pub fn from_template(
        name: impl Into<String>,
        pattern: &str,
        template: Template,
    ) -> Result<Self, RewriteError> {
        Self::new(name, pattern, move |values: &[String]| template.render(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &RewritePattern {
        &self.pattern
    }
}

impl fmt::Debug for ReductionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReductionRule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.to_string())
            .finish()
    }
}

pub struct RecursiveLexer {
    lexer: Tokenizer,
    rules: Vec<ReductionRule>,
    current: usize,
    options: RewriteOptions,
    halted: bool,
}

impl RecursiveLexer {
    /// Every rule's pattern must only name types produced by `lexer`.
    pub fn new(lexer: Tokenizer, rules: Vec<ReductionRule>) -> Result<Self, RewriteError> {
        for rule in &rules {
            rule.pattern.validate(lexer.rules())?;
        }
        Ok(Self {
            lexer,
            rules,
            current: 0,
            options: RewriteOptions::default(),
            halted: false,
        })
    }

    pub fn with_options(mut self, options: RewriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Load a new input buffer. The rule cursor is left where it is.
    pub fn reset(&mut self, buffer: impl Into<String>) -> &mut Self {
        self.lexer.reset(buffer);
        self
    }

    /// The current buffer: the input, or the output of the last pass.
    pub fn buffer(&self) -> &str {
        self.lexer.buffer()
    }

    pub fn lexer(&self) -> &Tokenizer {
        &self.lexer
    }

    pub fn rules(&self) -> &[ReductionRule] {
        &self.rules
    }

    /// Rules not applied yet.
    pub fn remaining(&self) -> usize {
        self.rules.len() - self.current
    }

    /// Run one pass with the next rule. `None` once every rule has been applied.
    pub fn next_pass(&mut self) -> Result<Option<String>, RewriteError> {
        let Some(rule) = self.rules.get_mut(self.current) else {
            return Ok(None);
        };

        debug!(
            rule = %rule.name,
            pattern = %rule.pattern,
            pass = self.current + 1,
            "reduction pass"
        );

        let reducer = &mut rule.reducer;
        let mut mapper = ReductionMapper::new(
            Arc::clone(self.lexer.rules()),
            rule.pattern.clone(),
            |values: &[String]| reducer(values),
            self.options,
        )?;
        let buffer = walk_stream(&mut self.lexer, &mut mapper)?;
        self.current += 1;

        Ok(Some(buffer))
    }

    /// Apply every remaining rule and return the final buffer.
    pub fn finish(&mut self) -> Result<String, RewriteError> {
        while self.next_pass()?.is_some() {}
        Ok(self.lexer.buffer().to_string())
    }
}

impl Iterator for RecursiveLexer {
    type Item = Result<String, RewriteError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        let item = self.next_pass().transpose();
        if matches!(item, Some(Err(_))) {
            self.halted = true;
        }
        item
    }
}

impl fmt::Debug for RecursiveLexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecursiveLexer")
            .field("rules", &self.rules)
            .field("current", &self.current)
            .field("options", &self.options)
            .finish()
    }
}
