//! Rule declarations
//!
//! A rule set is an ordered list of `(name, Pattern)` pairs. Order is significant:
//! the compiled automaton is an alternation, so an earlier rule shadows any later
//! rule that would match the same prefix.
//!
//! Patterns come in four shapes:
//!
//! - `Literal`: matched verbatim, regex metacharacters are escaped.
//! - `Regex`: a regular expression source used as-is.
//! - `Alternatives`: a set of literals, escaped and alternated in declaration order.
//! - `Rule`: a record carrying a `match` sub-pattern plus metadata (value transform,
//!   line-break tracking, ignore, error fallback and state transitions).

use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Transforms the matched text of a token into its value.
pub type ValueFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// One declared pattern.
#[derive(Clone)]
pub enum Pattern {
    Literal(String),
    Regex(String),
    Alternatives(Vec<String>),
    Rule(RuleSpec),
}

impl Pattern {
    /// Regular expression pattern from its source text.
    pub fn regex(source: impl Into<String>) -> Self {
        Pattern::Regex(source.into())
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Pattern::Literal(text.into())
    }

    pub fn alternatives<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Pattern::Alternatives(items.into_iter().map(Into::into).collect())
    }

    /// Short name of the shape, used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Pattern::Literal(_) => "literal",
            Pattern::Regex(_) => "regex",
            Pattern::Alternatives(_) => "alternatives",
            Pattern::Rule(_) => "rule",
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Pattern::Regex(source) => f.debug_tuple("Regex").field(source).finish(),
            Pattern::Alternatives(items) => f.debug_tuple("Alternatives").field(items).finish(),
            Pattern::Rule(spec) => f.debug_tuple("Rule").field(spec).finish(),
        }
    }
}

impl From<&str> for Pattern {
    fn from(text: &str) -> Self {
        Pattern::Literal(text.to_string())
    }
}

impl From<String> for Pattern {
    fn from(text: String) -> Self {
        Pattern::Literal(text)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Pattern::Regex(regex.as_str().to_string())
    }
}

impl From<Vec<&str>> for Pattern {
    fn from(items: Vec<&str>) -> Self {
        Pattern::alternatives(items)
    }
}

impl From<Vec<String>> for Pattern {
    fn from(items: Vec<String>) -> Self {
        Pattern::Alternatives(items)
    }
}

impl<const N: usize> From<[&str; N]> for Pattern {
    fn from(items: [&str; N]) -> Self {
        Pattern::alternatives(items)
    }
}

impl From<RuleSpec> for Pattern {
    fn from(spec: RuleSpec) -> Self {
        Pattern::Rule(spec)
    }
}

/// State transition directives attached to a rule.
///
/// Only the stateful lexer acts on them. They are applied in the order
/// `pop`, `push`, `next`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transitions {
    pub push: Option<String>,
    pub next: Option<String>,
    pub pop: Option<usize>,
}

impl Transitions {
    pub fn is_empty(&self) -> bool {
        self.push.is_none() && self.next.is_none() && self.pop.is_none()
    }
}

/// Rule record: a `match` sub-pattern plus metadata.
#[derive(Clone)]
pub struct RuleSpec {
    pub pattern: Box<Pattern>,
    pub value: Option<ValueFn>,
    pub line_breaks: bool,
    pub ignore: bool,
    pub error: bool,
    pub transitions: Transitions,
}

impl RuleSpec {
    pub fn new(pattern: impl Into<Pattern>) -> Self {
        Self {
            pattern: Box::new(pattern.into()),
            value: None,
            line_breaks: false,
            ignore: false,
            error: false,
            transitions: Transitions::default(),
        }
    }

    /// Transform applied to the matched text to produce the token value.
    pub fn value<F>(mut self, transform: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.value = Some(Arc::new(transform));
        self
    }

    pub fn line_breaks(mut self, line_breaks: bool) -> Self {
        self.line_breaks = line_breaks;
        self
    }

    pub fn ignore(mut self, ignore: bool) -> Self {
        self.ignore = ignore;
        self
    }

    /// Marks this rule as the fallback for untokenizable input.
    pub fn error(mut self, error: bool) -> Self {
        self.error = error;
        self
    }

    pub fn push(mut self, state: impl Into<String>) -> Self {
        self.transitions.push = Some(state.into());
        self
    }

    pub fn next(mut self, state: impl Into<String>) -> Self {
        self.transitions.next = Some(state.into());
        self
    }

    pub fn pop(mut self, count: usize) -> Self {
        self.transitions.pop = Some(count);
        self
    }
}

impl fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSpec")
            .field("pattern", &self.pattern)
            .field("value", &self.value.as_ref().map(|_| "<fn>"))
            .field("line_breaks", &self.line_breaks)
            .field("ignore", &self.ignore)
            .field("error", &self.error)
            .field("transitions", &self.transitions)
            .finish()
    }
}

/// Ordered rule set.
#[derive(Debug, Clone, Default)]
pub struct Rules {
    entries: Vec<(String, Pattern)>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Rules are tried in the order they are added.
    pub fn add(mut self, name: impl Into<String>, pattern: impl Into<Pattern>) -> Self {
        self.entries.push((name.into(), pattern.into()));
        self
    }

    pub fn push(&mut self, name: impl Into<String>, pattern: impl Into<Pattern>) {
        self.entries.push((name.into(), pattern.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Pattern)> {
        self.entries.iter().map(|(name, pattern)| (name.as_str(), pattern))
    }
}

impl<N, P> FromIterator<(N, P)> for Rules
where
    N: Into<String>,
    P: Into<Pattern>,
{
    fn from_iter<I: IntoIterator<Item = (N, P)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, pattern)| (name.into(), pattern.into()))
                .collect(),
        }
    }
}
