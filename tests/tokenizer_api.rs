//! Tokenizer behavior against the documented moo-style API
//!
//! Covers token shape, rule priority, line/column tracking, value transforms and
//! reset semantics of the single-state tokenizer.

use cute::{LexError, Pattern, Position, RuleSpec, Rules, Token, Tokenizer};
use rstest::rstest;

fn usage_rules() -> Rules {
    Rules::new()
        .add("WS", Pattern::regex(r"[ \t]+"))
        .add("comment", Pattern::regex(r"//[^\n]*"))
        .add("number", Pattern::regex(r"0|[1-9][0-9]*"))
        .add("string", Pattern::regex(r#""(?:\\["\\]|[^\n"\\])*""#))
        .add("lparen", "(")
        .add("rparen", ")")
        .add("keyword", ["while", "if", "else", "moo", "cows"])
        .add("NL", RuleSpec::new("\n").line_breaks(true))
}

fn token(kind: &str, text: &str, offset: usize, line: usize, col: usize) -> Token {
    Token {
        kind: kind.to_string(),
        value: text.to_string(),
        text: text.to_string(),
        offset,
        line_breaks: text.matches('\n').count(),
        line,
        col,
    }
}

fn listing(lexer: &mut Tokenizer) -> String {
    lexer
        .map(|token| token.unwrap().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_usage_first_tokens() {
    let mut lexer = Tokenizer::new(&usage_rules()).unwrap();
    lexer.reset("while (10) cows\nmoo");

    assert_eq!(lexer.next_token().unwrap(), Some(token("keyword", "while", 0, 1, 1)));
    assert_eq!(lexer.next_token().unwrap(), Some(token("WS", " ", 5, 1, 6)));
    assert_eq!(lexer.next_token().unwrap(), Some(token("lparen", "(", 6, 1, 7)));
    assert_eq!(lexer.next_token().unwrap(), Some(token("number", "10", 7, 1, 8)));
}

#[test]
fn test_usage_listing() {
    let mut lexer = Tokenizer::new(&usage_rules()).unwrap();
    lexer.reset("while (10) cows\nmoo");

    insta::assert_snapshot!(listing(&mut lexer), @r#"
    1:1 keyword "while"
    1:6 WS " "
    1:7 lparen "("
    1:8 number "10"
    1:10 rparen ")"
    1:11 WS " "
    1:12 keyword "cows"
    1:16 NL "\n"
    2:1 keyword "moo"
    "#);
}

#[test]
fn test_greedy_and_lazy_quantifiers() {
    let mut greedy = Tokenizer::new(&Rules::new().add("string", Pattern::regex(r#"".*""#))).unwrap();
    greedy.reset(r#""foo" "bar""#);
    assert_eq!(
        greedy.next_token().unwrap(),
        Some(token("string", r#""foo" "bar""#, 0, 1, 1))
    );

    let mut lazy = Tokenizer::new(
        &Rules::new()
            .add("string", Pattern::regex(r#"".*?""#))
            .add("space", Pattern::regex(" +")),
    )
    .unwrap();
    lazy.reset(r#""foo" "bar""#);
    let tokens: Vec<Token> = lazy.map(Result::unwrap).collect();
    assert_eq!(
        tokens,
        vec![
            token("string", r#""foo""#, 0, 1, 1),
            token("space", " ", 5, 1, 6),
            token("string", r#""bar""#, 6, 1, 7),
        ]
    );
}

#[rstest]
#[case::identifier_first(&["identifier", "number"], "identifier")]
#[case::number_first(&["number", "identifier"], "number")]
fn test_rule_order_decides_ties(#[case] order: &[&str], #[case] expected: &str) {
    let rules: Rules = order
        .iter()
        .map(|name| {
            let source = if *name == "identifier" { "[a-z0-9]+" } else { "[0-9]+" };
            (name.to_string(), Pattern::regex(source))
        })
        .collect();
    let mut lexer = Tokenizer::new(&rules).unwrap();
    lexer.reset("42");
    assert_eq!(lexer.next_token().unwrap(), Some(token(expected, "42", 0, 1, 1)));
}

#[test]
fn test_line_numbers() {
    let mut lexer =
        Tokenizer::new(&Rules::new().add("newline", RuleSpec::new("\n").line_breaks(true))).unwrap();
    lexer.reset("\n\n\n");

    let tokens: Vec<Token> = lexer.map(Result::unwrap).collect();
    assert_eq!(
        tokens,
        vec![
            token("newline", "\n", 0, 1, 1),
            token("newline", "\n", 1, 2, 1),
            token("newline", "\n", 2, 3, 1),
        ]
    );
}

#[test]
fn test_column_after_multiline_token() {
    let mut lexer = Tokenizer::new(
        &Rules::new()
            .add("block", RuleSpec::new(Pattern::regex(r"\[[^\]]*\]")).line_breaks(true))
            .add("word", Pattern::regex("[a-z]+")),
    )
    .unwrap();
    lexer.reset("[a\nbc]de");

    let tokens: Vec<Token> = lexer.map(Result::unwrap).collect();
    assert_eq!(tokens[0].line_breaks, 1);
    assert_eq!((tokens[1].line, tokens[1].col, tokens[1].offset), (2, 1, 6));
}

#[test]
fn test_line_breaks_without_flag_keep_line() {
    let mut lexer = Tokenizer::new(
        &Rules::new()
            .add("space", Pattern::regex(r"\s+"))
            .add("word", Pattern::regex("[a-z]+")),
    )
    .unwrap();
    lexer.reset("a\nb");
    let tokens: Vec<Token> = lexer.map(Result::unwrap).collect();
    assert_eq!(tokens[1].line_breaks, 1);
    assert_eq!((tokens[2].line, tokens[2].col), (1, 3));
}

#[test]
fn test_columns_count_characters() {
    let mut lexer = Tokenizer::new(
        &Rules::new()
            .add("word", Pattern::regex(r"\w+"))
            .add("space", " "),
    )
    .unwrap();
    lexer.reset("héllo world");
    let tokens: Vec<Token> = lexer.map(Result::unwrap).collect();
    assert_eq!((tokens[2].offset, tokens[2].col), (7, 7));
}

#[test]
fn test_value_vs_text() {
    let mut lexer = Tokenizer::new(
        &Rules::new().add("ws", Pattern::regex(r"[ \t]+")).add(
            "string",
            RuleSpec::new(Pattern::regex(r#""(?:\\["\\]|[^\n"\\])*""#))
                .value(|text| text[1..text.len() - 1].to_string()),
        ),
    )
    .unwrap();
    lexer.reset(r#""test""#);

    let token = lexer.next_token().unwrap().unwrap();
    assert_eq!(token.value, "test");
    assert_eq!(token.text, r#""test""#);
    assert_eq!(token.position().offset, 0);
}

#[test]
fn test_reset_starts_over() {
    let mut lexer = Tokenizer::new(
        &Rules::new()
            .add("ws", Pattern::regex(r"[ \t]+"))
            .add("text", Pattern::regex(r"\w+"))
            .add("newline", RuleSpec::new("\n").line_breaks(true)),
    )
    .unwrap();

    lexer.reset("some line\n");
    assert_eq!(lexer.next_token().unwrap(), Some(token("text", "some", 0, 1, 1)));

    lexer.reset("a different line\n");
    assert_eq!(lexer.next_token().unwrap(), Some(token("text", "a", 0, 1, 1)));

    // Draining a multi-line buffer leaves the cursor past the last line.
    lexer.reset("one\ntwo\n");
    while lexer.next_token().unwrap().is_some() {}
    assert_eq!(lexer.position().line, 3);
    lexer.reset("three");
    assert_eq!(lexer.position(), Position::START);

    // A failed lexer starts over cleanly as well.
    lexer.reset("line\n??");
    assert!(lexer.next_token().unwrap().is_some());
    assert!(lexer.next_token().unwrap().is_some());
    assert!(lexer.next_token().is_err());
    lexer.reset("again");
    assert_eq!(lexer.position(), Position::START);
    assert_eq!(lexer.next_token().unwrap(), Some(token("text", "again", 0, 1, 1)));
}

#[test]
fn test_ignored_rules_advance_position() {
    let mut lexer = Tokenizer::new(
        &Rules::new()
            .add("ws", RuleSpec::new(Pattern::regex(r"\s+")).ignore(true).line_breaks(true))
            .add("word", Pattern::regex(r"\w+")),
    )
    .unwrap();
    lexer.reset("  a\n b");

    let tokens: Vec<Token> = lexer.map(Result::unwrap).collect();
    assert_eq!(tokens, vec![token("word", "a", 2, 1, 3), token("word", "b", 5, 2, 1)]);
}

#[test]
fn test_unexpected_input_reports_the_skipped_text() {
    let mut lexer = Tokenizer::new(&usage_rules()).unwrap();
    lexer.reset("if ?? (");

    assert!(lexer.next_token().unwrap().is_some());
    assert!(lexer.next_token().unwrap().is_some());
    let err = lexer.next_token().unwrap_err();
    assert_eq!(
        err,
        LexError::UnexpectedInput {
            line: 1,
            col: 4,
            offset: 3,
            text: "??".to_string(),
        }
    );
    assert_eq!(err.to_string(), r#"Unexpected token at line 1 col 4: "??""#);

    // The cursor does not move past the offending input.
    assert_eq!(lexer.position().offset, 3);
    assert!(lexer.next_token().is_err());
}

#[test]
fn test_iterator_stops_after_an_error() {
    let mut lexer = Tokenizer::new(&Rules::new().add("a", "a")).unwrap();
    lexer.reset("ab");
    assert!(matches!(lexer.next(), Some(Ok(_))));
    assert!(matches!(lexer.next(), Some(Err(_))));
    assert!(lexer.next().is_none());

    lexer.reset("aa");
    assert_eq!(lexer.count(), 2);
}

#[test]
fn test_error_rule_swallows_the_rest() {
    let mut lexer = Tokenizer::new(
        &Rules::new()
            .add("word", Pattern::regex("[a-z]+"))
            .add("invalid", RuleSpec::new("#").error(true)),
    )
    .unwrap();
    lexer.reset("abc123\ndef");

    let tokens: Vec<Token> = lexer.map(Result::unwrap).collect();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[1].kind, "invalid");
    assert_eq!(tokens[1].text, "123\ndef");
    assert_eq!(tokens[1].offset, 3);
}

#[test]
fn test_to_vec_keeps_the_cursor() {
    let mut lexer = Tokenizer::new(&usage_rules()).unwrap();
    lexer.reset("if (1)");
    lexer.next_token().unwrap();
    let saved = lexer.position();

    let all = lexer.to_vec().unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(lexer.position(), saved);
    assert_eq!(lexer.next_token().unwrap().map(|t| t.kind), Some("WS".to_string()));
}

#[test]
fn test_lex_one_ignores_the_cursor() {
    let mut lexer = Tokenizer::new(&usage_rules()).unwrap();
    lexer.reset("while");
    let token = lexer.lex_one("42 cows").unwrap();
    assert_eq!(token, token_at_origin("number", "42"));
    assert!(lexer.lex_one("??").is_none());
    assert_eq!(lexer.position().offset, 0);
}

fn token_at_origin(kind: &str, text: &str) -> Token {
    token(kind, text, 0, 1, 1)
}

#[test]
fn test_token_serializes_with_moo_field_names() {
    let mut lexer = Tokenizer::new(&usage_rules()).unwrap();
    lexer.reset("\n");
    let token = lexer.next_token().unwrap().unwrap();
    assert_eq!(
        serde_json::to_value(&token).unwrap(),
        serde_json::json!({
            "type": "NL",
            "value": "\n",
            "text": "\n",
            "offset": 0,
            "lineBreaks": 1,
            "line": 1,
            "col": 1
        })
    );
}
