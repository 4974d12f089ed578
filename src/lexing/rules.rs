//! Rule compiler
//!
//! Turns an ordered [`Rules`] list into a [`CompiledRules`] table: one
//! [`CompiledRule`] per declared rule plus a single combined automaton.
//!
//! The automaton wraps every rule's regex fragment in its own capturing group and
//! joins the groups with alternation:
//!
//! ```text
//! (frag1)|(frag2)|(frag3)
//! ```
//!
//! The regex engine picks alternatives leftmost-first, so at any position exactly one
//! wrapper group participates in a match and the owning rule is the first one whose
//! wrapper group is non-empty. User regexes may contain their own groups; the
//! compiler records each wrapper group's index so those inner groups never shift the
//! mapping.
//!
//! A compiled table is immutable and shared (`Arc`) between every tokenizer built
//! from it.

use crate::error::CompileError;
use crate::lexing::pattern::{Pattern, Rules, Transitions, ValueFn};
use crate::lexing::token::{count_line_breaks, Token};
use regex::{Captures, Regex};
use std::fmt;

/// Never matches; used as the automaton of an empty rule set.
const NEVER: &str = r"\z.";

/// One rule after compilation.
#[derive(Clone)]
pub struct CompiledRule {
    pub name: String,
    /// The rule's own regex, independent of the combined automaton.
    pub matcher: Regex,
    pub value: Option<ValueFn>,
    pub line_breaks: bool,
    pub ignore: bool,
    pub error: bool,
    pub transitions: Transitions,
    group: usize,
}

impl CompiledRule {
    /// Index of this rule's wrapper group in the combined automaton.
    pub fn group(&self) -> usize {
        self.group
    }

    /// Apply the value transform (if any) to matched text.
    pub fn value_of(&self, text: &str) -> String {
        match &self.value {
            Some(transform) => transform(text),
            None => text.to_string(),
        }
    }
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("name", &self.name)
            .field("matcher", &self.matcher.as_str())
            .field("value", &self.value.as_ref().map(|_| "<fn>"))
            .field("line_breaks", &self.line_breaks)
            .field("ignore", &self.ignore)
            .field("error", &self.error)
            .field("transitions", &self.transitions)
            .field("group", &self.group)
            .finish()
    }
}

/// Ordered rule table plus the combined automaton.
pub struct CompiledRules {
    rules: Vec<CompiledRule>,
    automaton: Regex,
    anchored: Regex,
    error_rule: Option<usize>,
}

impl CompiledRules {
    pub fn compile(rules: &Rules) -> Result<Self, CompileError> {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut fragments = Vec::with_capacity(rules.len());
        let mut error_rule: Option<usize> = None;
        let mut next_group = 1;

        for (index, (name, pattern)) in rules.iter().enumerate() {
            let fragment = fragment_for(name, pattern, false)?;
            let matcher = Regex::new(&fragment).map_err(|source| CompileError::InvalidRegex {
                rule: name.to_string(),
                source,
            })?;

            if matcher.is_match("") {
                return Err(CompileError::EmptyMatch {
                    rule: name.to_string(),
                });
            }

            let (value, line_breaks, ignore, error, transitions) = match pattern {
                Pattern::Rule(spec) => (
                    spec.value.clone(),
                    spec.line_breaks,
                    spec.ignore,
                    spec.error,
                    spec.transitions.clone(),
                ),
                _ => (None, false, false, false, Transitions::default()),
            };

            if error {
                if let Some(first) = error_rule {
                    return Err(CompileError::MultipleErrorRules {
                        first: compiled_name(&compiled, first),
                        second: name.to_string(),
                    });
                }
                error_rule = Some(index);
            }

            // The wrapper group plus every group inside the fragment.
            let group = next_group;
            next_group += matcher.captures_len();

            fragments.push(format!("({})", fragment));
            compiled.push(CompiledRule {
                name: name.to_string(),
                matcher,
                value,
                line_breaks,
                ignore,
                error,
                transitions,
                group,
            });
        }

        let source = if fragments.is_empty() {
            NEVER.to_string()
        } else {
            fragments.join("|")
        };
        let automaton = Regex::new(&source).map_err(CompileError::Automaton)?;
        let anchored =
            Regex::new(&format!("^(?:{})", source)).map_err(CompileError::Automaton)?;

        Ok(Self {
            rules: compiled,
            automaton,
            anchored,
            error_rule,
        })
    }

    /// The combined, unanchored automaton.
    pub fn automaton(&self) -> &Regex {
        &self.automaton
    }

    /// Copy of the automaton anchored at the start of the haystack.
    pub fn anchored(&self) -> &Regex {
        &self.anchored
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn get(&self, index: usize) -> Option<&CompiledRule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.name == name)
    }

    /// Index of the rule flagged as error fallback, if any.
    pub fn error_rule(&self) -> Option<usize> {
        self.error_rule
    }

    /// Resolve the rule owning a match: the first rule whose wrapper group matched.
    pub fn resolve(&self, captures: &Captures<'_>) -> Option<usize> {
        self.rules
            .iter()
            .position(|rule| captures.get(rule.group).is_some())
    }

    /// Match one token at the start of `text` with the anchored automaton.
    ///
    /// The token is positioned at offset 0, line 1, column 1 of `text`.
    pub fn classify(&self, text: &str) -> Option<(usize, Token)> {
        let caps = self.anchored().captures(text)?;
        let whole = caps.get(0)?;
        if whole.is_empty() {
            return None;
        }
        let index = self.resolve(&caps)?;
        let rule = self.get(index)?;
        let matched = whole.as_str();

        Some((
            index,
            Token {
                kind: rule.name.clone(),
                value: rule.value_of(matched),
                text: matched.to_string(),
                offset: 0,
                line_breaks: count_line_breaks(matched),
                line: 1,
                col: 1,
            },
        ))
    }
}

impl fmt::Debug for CompiledRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRules")
            .field("rules", &self.rules)
            .field("automaton", &self.automaton.as_str())
            .field("error_rule", &self.error_rule)
            .finish()
    }
}

fn compiled_name(compiled: &[CompiledRule], index: usize) -> String {
    compiled
        .get(index)
        .map(|rule| rule.name.clone())
        .unwrap_or_default()
}

/// Derive the regex fragment for one pattern.
fn fragment_for(name: &str, pattern: &Pattern, nested: bool) -> Result<String, CompileError> {
    match pattern {
        Pattern::Literal(text) => Ok(regex::escape(text)),
        Pattern::Regex(source) => Ok(source.clone()),
        Pattern::Alternatives(items) => {
            if items.is_empty() {
                return Err(CompileError::PatternType {
                    rule: name.to_string(),
                    reason: "alternatives list is empty".to_string(),
                });
            }
            Ok(items
                .iter()
                .map(|item| regex::escape(item))
                .collect::<Vec<_>>()
                .join("|"))
        }
        Pattern::Rule(spec) => {
            if nested {
                return Err(CompileError::PatternType {
                    rule: name.to_string(),
                    reason: "a rule record cannot be the match of another record".to_string(),
                });
            }
            fragment_for(name, &spec.pattern, true)
        }
    }
}
