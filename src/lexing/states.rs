//! Stacked-state lexer
//!
//! A [`StatefulLexer`] holds one [`Tokenizer`] per declared state and a stack of
//! state indices. The state on top of the stack scans; the rest wait.
//!
//! All tokenizers scan the same buffer, each with its own cursor. After every
//! match the active tokenizer's position is copied into every sibling, so a state
//! switch resumes exactly where the previous state stopped and never re-reads
//! consumed input.
//!
//! Transition directives of the rule that just matched are applied in the order
//! `pop`, `push`, `next`. Ignored rules switch states too, they just don't
//! surface as tokens.

use crate::error::{CompileError, LexError};
use crate::lexing::pattern::Rules;
use crate::lexing::token::{Position, Token};
use crate::lexing::tokenizer::Tokenizer;
use tracing::trace;

/// Ordered state table. The first state is the initial one.
#[derive(Debug, Clone, Default)]
pub struct States {
    entries: Vec<(String, Rules)>,
}

impl States {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, name: impl Into<String>, rules: Rules) -> Self {
        self.entries.push((name.into(), rules));
        self
    }

    pub fn push(&mut self, name: impl Into<String>, rules: Rules) {
        self.entries.push((name.into(), rules));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rules)> {
        self.entries.iter().map(|(name, rules)| (name.as_str(), rules))
    }
}

#[derive(Debug, Clone)]
struct LexerState {
    name: String,
    tokenizer: Tokenizer,
}

#[derive(Debug, Clone)]
pub struct StatefulLexer {
    states: Vec<LexerState>,
    stack: Vec<usize>,
    halted: bool,
}

impl StatefulLexer {
    pub fn new(states: &States) -> Result<Self, CompileError> {
        if states.is_empty() {
            return Err(CompileError::NoStates);
        }

        let states = states
            .iter()
            .map(|(name, rules)| {
                Ok(LexerState {
                    name: name.to_string(),
                    tokenizer: Tokenizer::new(rules)?,
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        let lexer = Self {
            states,
            stack: vec![0],
            halted: false,
        };
        lexer.validate()?;
        Ok(lexer)
    }

    /// Every push/next target must be a declared state and pops must remove something.
    fn validate(&self) -> Result<(), CompileError> {
        for state in &self.states {
            for rule in state.tokenizer.rules().rules() {
                let transitions = &rule.transitions;
                if transitions.pop == Some(0) {
                    return Err(CompileError::InvalidTransitionValue {
                        rule: rule.name.clone(),
                        directive: "pop".to_string(),
                        reason: "pop count must be at least 1".to_string(),
                    });
                }
                for target in [&transitions.push, &transitions.next].into_iter().flatten() {
                    if self.index_of(target).is_none() {
                        return Err(CompileError::UnknownState {
                            state: state.name.clone(),
                            rule: rule.name.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|state| state.name == name)
    }

    /// Load a new buffer into every state and return to the initial state.
    pub fn reset(&mut self, buffer: impl Into<String>) -> &mut Self {
        let buffer = buffer.into();
        for state in &mut self.states {
            state.tokenizer.reset(buffer.clone());
        }
        self.stack = vec![0];
        self.halted = false;
        self
    }

    fn active(&self) -> usize {
        self.stack.last().copied().unwrap_or(0)
    }

    /// Name of the state that will scan the next token.
    pub fn state(&self) -> &str {
        &self.states[self.active()].name
    }

    /// State names from bottom to top.
    pub fn stack(&self) -> Vec<&str> {
        self.stack
            .iter()
            .map(|&index| self.states[index].name.as_str())
            .collect()
    }

    pub fn position(&self) -> Position {
        self.states[self.active()].tokenizer.position()
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        Ok(self.next_entry()?.map(|(_, token)| token))
    }

    /// Like [`StatefulLexer::next_token`], also naming the state that produced the token.
    pub fn next_with_state(&mut self) -> Result<Option<(String, Token)>, LexError> {
        Ok(self
            .next_entry()?
            .map(|(state, token)| (self.states[state].name.clone(), token)))
    }

    fn next_entry(&mut self) -> Result<Option<(usize, Token)>, LexError> {
        loop {
            let active = self.active();
            let tokenizer = &mut self.states[active].tokenizer;
            let Some(lexeme) = tokenizer.next_lexeme()? else {
                return Ok(None);
            };
            let ignored = tokenizer.is_ignored(lexeme.rule);
            let position = tokenizer.save();

            for (index, state) in self.states.iter_mut().enumerate() {
                if index != active {
                    state.tokenizer.restore(position);
                }
            }

            self.apply_transitions(active, lexeme.rule)?;

            if !ignored {
                return Ok(Some((active, lexeme.token)));
            }
        }
    }

    fn apply_transitions(&mut self, active: usize, rule: usize) -> Result<(), LexError> {
        let Some((name, transitions)) = self.states[active]
            .tokenizer
            .rules()
            .get(rule)
            .map(|rule| (rule.name.clone(), rule.transitions.clone()))
        else {
            return Ok(());
        };
        if transitions.is_empty() {
            return Ok(());
        }

        if let Some(count) = transitions.pop {
            if count >= self.stack.len() {
                return Err(LexError::StateStackUnderflow {
                    rule: name,
                    depth: self.stack.len(),
                    count,
                });
            }
            self.stack.truncate(self.stack.len() - count);
        }

        if let Some(target) = transitions.push.as_deref().and_then(|t| self.index_of(t)) {
            self.stack.push(target);
        }

        if let Some(target) = transitions.next.as_deref().and_then(|t| self.index_of(t)) {
            if let Some(top) = self.stack.last_mut() {
                *top = target;
            }
        }

        trace!(stack = ?self.stack(), "state transition");
        Ok(())
    }
}

impl Iterator for StatefulLexer {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        let item = self.next_token().transpose();
        if matches!(item, Some(Err(_))) {
            self.halted = true;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexing::pattern::{Pattern, RuleSpec};

    fn digits_and_letters() -> States {
        States::new()
            .add(
                "numbers",
                Rules::new()
                    .add("one", RuleSpec::new("1").push("letters"))
                    .add("two", RuleSpec::new("2").pop(1))
                    .add("three", "3"),
            )
            .add(
                "letters",
                Rules::new()
                    .add("a", RuleSpec::new("a").push("numbers"))
                    .add("b", RuleSpec::new("b").pop(1))
                    .add("c", "c"),
            )
    }

    #[test]
    fn test_first_state_is_initial() {
        let lexer = StatefulLexer::new(&digits_and_letters()).unwrap();
        assert_eq!(lexer.state(), "numbers");
        assert_eq!(lexer.stack(), vec!["numbers"]);
    }

    #[test]
    fn test_push_and_pop() {
        let mut lexer = StatefulLexer::new(&digits_and_letters()).unwrap();
        lexer.reset("1cb3");
        lexer.next_token().unwrap();
        assert_eq!(lexer.stack(), vec!["numbers", "letters"]);
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        assert_eq!(lexer.stack(), vec!["numbers"]);
        assert_eq!(lexer.next_token().unwrap().unwrap().kind, "three");
        assert_eq!(lexer.next_token().unwrap(), None);
    }

    #[test]
    fn test_underflow_leaves_stack_untouched() {
        let mut lexer = StatefulLexer::new(&digits_and_letters()).unwrap();
        lexer.reset("2");
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, LexError::StateStackUnderflow { depth: 1, count: 1, .. }));
        assert_eq!(lexer.stack(), vec!["numbers"]);
    }

    #[test]
    fn test_next_replaces_top_of_stack() {
        let states = States::new()
            .add("a", Rules::new().add("go", RuleSpec::new(">").next("b")))
            .add("b", Rules::new().add("word", Pattern::regex("[a-z]+")));
        let mut lexer = StatefulLexer::new(&states).unwrap();
        lexer.reset(">abc");
        lexer.next_token().unwrap();
        assert_eq!(lexer.stack(), vec!["b"]);
        assert_eq!(lexer.next_token().unwrap().unwrap().text, "abc");
    }

    #[test]
    fn test_ignored_rules_still_switch_state() {
        let states = States::new()
            .add(
                "outer",
                Rules::new()
                    .add("open", RuleSpec::new("<").ignore(true).push("inner"))
                    .add("word", Pattern::regex("[a-z]+")),
            )
            .add(
                "inner",
                Rules::new()
                    .add("close", RuleSpec::new(">").ignore(true).pop(1))
                    .add("digits", Pattern::regex("[0-9]+")),
            );
        let mut lexer = StatefulLexer::new(&states).unwrap();
        lexer.reset("ab<12>cd");
        let entries: Vec<_> = std::iter::from_fn(|| lexer.next_with_state().unwrap())
            .map(|(state, token)| (state, token.kind))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("outer".to_string(), "word".to_string()),
                ("inner".to_string(), "digits".to_string()),
                ("outer".to_string(), "word".to_string()),
            ]
        );
    }

    #[test]
    fn test_unknown_target_state() {
        let states = States::new().add("main", Rules::new().add("x", RuleSpec::new("x").push("nowhere")));
        assert!(matches!(
            StatefulLexer::new(&states),
            Err(CompileError::UnknownState { target, .. }) if target == "nowhere"
        ));
    }

    #[test]
    fn test_zero_pop_is_invalid() {
        let states = States::new().add("main", Rules::new().add("x", RuleSpec::new("x").pop(0)));
        assert!(matches!(
            StatefulLexer::new(&states),
            Err(CompileError::InvalidTransitionValue { directive, .. }) if directive == "pop"
        ));
    }

    #[test]
    fn test_no_states() {
        assert!(matches!(
            StatefulLexer::new(&States::new()),
            Err(CompileError::NoStates)
        ));
    }

    #[test]
    fn test_reset_returns_to_initial_state() {
        let mut lexer = StatefulLexer::new(&digits_and_letters()).unwrap();
        lexer.reset("1");
        lexer.next_token().unwrap();
        assert_eq!(lexer.state(), "letters");
        lexer.reset("3");
        assert_eq!(lexer.state(), "numbers");
        assert_eq!(lexer.position(), Position::START);
    }
}
