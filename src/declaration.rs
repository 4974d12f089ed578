//! Declaration files
//!
//! Rule sets, state tables and reduction rules written as data (YAML or JSON)
//! instead of Rust builders. A declaration is deserialized into plain serde
//! structs and then converted into the builder types of [`crate::lexing`] and
//! [`crate::rewriting`], so every check of the compiler still applies.
//!
//! ```yaml
//! rules:
//!   - name: number
//!     match: { regex: '\d+' }
//!   - name: keyword
//!     match: [if, else]
//!   - name: ws
//!     match: { regex: '[ \t]+' }
//!     ignore: true
//! reductions:
//!   - name: swap
//!     pattern: number plus number
//!     template: "{2}+{0}"
//! ```
//!
//! Lists keep declaration order, which is also match priority. A state table uses
//! `states:` instead of `rules:`, the first state is the initial one.

use crate::error::{CompileError, DeclarationError};
use crate::lexing::pattern::{Pattern, RuleSpec, Rules};
use crate::lexing::states::{StatefulLexer, States};
use crate::lexing::tokenizer::Tokenizer;
use crate::rewriting::pattern::RewritePattern;
use crate::rewriting::recursive::{RecursiveLexer, ReductionRule};
use crate::rewriting::template::Template;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Name of the single state wrapping a flat rule list.
pub const DEFAULT_STATE: &str = "main";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declaration {
    #[serde(default)]
    pub rules: Vec<RuleDeclaration>,
    #[serde(default)]
    pub states: Vec<StateDeclaration>,
    #[serde(default)]
    pub reductions: Vec<ReductionDeclaration>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateDeclaration {
    pub name: String,
    pub rules: Vec<RuleDeclaration>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDeclaration {
    pub name: String,
    #[serde(rename = "match")]
    pub pattern: PatternDeclaration,
    #[serde(default, rename = "lineBreaks", alias = "line_breaks")]
    pub line_breaks: bool,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub value: Option<ValueTransform>,
    #[serde(default)]
    pub push: Option<TransitionValue>,
    #[serde(default)]
    pub next: Option<TransitionValue>,
    #[serde(default)]
    pub pop: Option<TransitionValue>,
}

/// The `match` field of a rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PatternDeclaration {
    Literal(String),
    Alternatives(Vec<String>),
    Regex { regex: String },
    /// Anything else; rejected when the rule is converted.
    Other(serde_json::Value),
}

/// Named value transforms usable from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueTransform {
    Trim,
    Lowercase,
    Uppercase,
    /// Drops the first and last character, e.g. the quotes of a string literal.
    StripDelimiters,
}

impl ValueTransform {
    pub fn apply(self, text: &str) -> String {
        match self {
            ValueTransform::Trim => text.trim().to_string(),
            ValueTransform::Lowercase => text.to_lowercase(),
            ValueTransform::Uppercase => text.to_uppercase(),
            ValueTransform::StripDelimiters => {
                let mut chars = text.chars();
                chars.next();
                chars.next_back();
                chars.as_str().to_string()
            }
        }
    }
}

/// `push`/`next` take a state name, `pop` takes a count.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TransitionValue {
    Count(usize),
    State(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReductionDeclaration {
    pub name: String,
    pub pattern: String,
    pub template: String,
}

impl RuleDeclaration {
    pub fn into_spec(self) -> Result<RuleSpec, CompileError> {
        let name = self.name;
        let pattern = self.pattern.into_pattern(&name)?;
        let mut spec = RuleSpec::new(pattern)
            .line_breaks(self.line_breaks)
            .ignore(self.ignore)
            .error(self.error);

        if let Some(transform) = self.value {
            spec = spec.value(move |text| transform.apply(text));
        }
        if let Some(value) = self.push {
            spec = spec.push(state_name(&name, "push", value)?);
        }
        if let Some(value) = self.next {
            spec = spec.next(state_name(&name, "next", value)?);
        }
        if let Some(value) = self.pop {
            spec = spec.pop(pop_count(&name, value)?);
        }
        Ok(spec)
    }
}

impl PatternDeclaration {
    fn into_pattern(self, rule: &str) -> Result<Pattern, CompileError> {
        match self {
            PatternDeclaration::Literal(text) => Ok(Pattern::Literal(text)),
            PatternDeclaration::Alternatives(items) => Ok(Pattern::Alternatives(items)),
            PatternDeclaration::Regex { regex } => Ok(Pattern::Regex(regex)),
            PatternDeclaration::Other(value) => Err(CompileError::PatternType {
                rule: rule.to_string(),
                reason: format!(
                    "expected a string, a list of strings or {{regex: ...}}, found {}",
                    value
                ),
            }),
        }
    }
}

fn state_name(rule: &str, directive: &str, value: TransitionValue) -> Result<String, CompileError> {
    match value {
        TransitionValue::State(state) => Ok(state),
        TransitionValue::Count(count) => Err(CompileError::InvalidTransitionValue {
            rule: rule.to_string(),
            directive: directive.to_string(),
            reason: format!("expected a state name, found {}", count),
        }),
    }
}

fn pop_count(rule: &str, value: TransitionValue) -> Result<usize, CompileError> {
    match value {
        TransitionValue::Count(count) => Ok(count),
        TransitionValue::State(state) => Err(CompileError::InvalidTransitionValue {
            rule: rule.to_string(),
            directive: "pop".to_string(),
            reason: format!("expected a count, found \"{}\"", state),
        }),
    }
}

fn to_rules(rules: &[RuleDeclaration]) -> Result<Rules, CompileError> {
    rules
        .iter()
        .cloned()
        .map(|rule| Ok::<_, CompileError>((rule.name.clone(), rule.into_spec()?)))
        .collect()
}

impl ReductionDeclaration {
    /// Checks the pattern syntax and that every placeholder refers to a matched token.
    pub fn into_rule(self) -> Result<ReductionRule, DeclarationError> {
        let pattern = RewritePattern::parse(&self.pattern)?;
        let template = Template::parse(&self.template);
        if let Some(index) = template.max_index().filter(|&index| index >= pattern.len()) {
            return Err(DeclarationError::Template {
                rule: self.name,
                reason: format!(
                    "placeholder {{{}}} is out of range for a pattern of {} type(s)",
                    index,
                    pattern.len()
                ),
            });
        }
        Ok(ReductionRule::from_template(self.name, &self.pattern, template)?)
    }
}

impl Declaration {
    pub fn from_yaml_str(source: &str) -> Result<Self, DeclarationError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self, DeclarationError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Load a declaration file; the format follows the extension (`.yaml`, `.yml`, `.json`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DeclarationError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let read = || {
            fs::read_to_string(path).map_err(|source| DeclarationError::Io {
                path: path.display().to_string(),
                source,
            })
        };

        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&read()?),
            "json" => Self::from_json_str(&read()?),
            _ => Err(DeclarationError::UnsupportedFormat(
                path.display().to_string(),
            )),
        }
    }

    pub fn has_states(&self) -> bool {
        !self.states.is_empty()
    }

    /// The flat rule list as builder rules.
    pub fn to_rules(&self) -> Result<Rules, DeclarationError> {
        if self.rules.is_empty() {
            return Err(DeclarationError::Empty);
        }
        Ok(to_rules(&self.rules)?)
    }

    /// The state table. A flat rule list becomes a single [`DEFAULT_STATE`].
    pub fn to_states(&self) -> Result<States, DeclarationError> {
        if self.has_states() {
            return self
                .states
                .iter()
                .try_fold(States::new(), |states, state| {
                    Ok::<_, DeclarationError>(states.add(state.name.clone(), to_rules(&state.rules)?))
                });
        }
        Ok(States::new().add(DEFAULT_STATE, self.to_rules()?))
    }

    pub fn reduction_rules(&self) -> Result<Vec<ReductionRule>, DeclarationError> {
        self.reductions
            .iter()
            .cloned()
            .map(ReductionDeclaration::into_rule)
            .collect()
    }

    pub fn tokenizer(&self) -> Result<Tokenizer, DeclarationError> {
        Ok(Tokenizer::new(&self.to_rules()?)?)
    }

    pub fn stateful(&self) -> Result<StatefulLexer, DeclarationError> {
        Ok(StatefulLexer::new(&self.to_states()?)?)
    }

    /// Driver over the flat rule list running every declared reduction.
    pub fn recursive(&self) -> Result<RecursiveLexer, DeclarationError> {
        Ok(RecursiveLexer::new(self.tokenizer()?, self.reduction_rules()?)?)
    }
}
