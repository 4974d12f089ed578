//! Loading declarations and configuration from disk

use cute::config::{Loader, OutputFormat};
use cute::declaration::Declaration;
use cute::{DeclarationError, RewriteError, RewriteOptions};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const MARKDOWN_YAML: &str = r##"
rules:
  - name: asterisk
    match: "*"
  - name: hash
    match: "#"
  - name: html
    match: { regex: '<.*?</.*?>' }
  - name: newline
    match: "\n"
  - name: ws
    match: { regex: ' +' }
  - name: text
    match: { regex: '[\w\d ]+' }
reductions:
  - name: h1
    pattern: hash ws text newline
    template: "<h1>{2}</h1>"
  - name: bold
    pattern: asterisk asterisk text asterisk asterisk
    template: "<b>{2}</b>"
  - name: italic
    pattern: asterisk text asterisk
    template: "<i>{1}</i>"
"##;

#[test]
fn test_yaml_declaration_from_disk() {
    let file = write_file(".yaml", MARKDOWN_YAML);
    let declaration = Declaration::load(file.path()).unwrap();
    assert_eq!(declaration.rules.len(), 6);
    assert_eq!(declaration.reductions.len(), 3);

    let mut driver = declaration.recursive().unwrap();
    driver.reset("# Title\n**bold** and *italic*");
    assert_eq!(
        driver.finish().unwrap(),
        "<h1>Title</h1><b>bold</b> and <i>italic</i>"
    );
}

#[test]
fn test_json_declaration_from_disk() {
    let file = write_file(
        ".json",
        r#"{
            "rules": [
                {"name": "word", "match": {"regex": "[A-Za-z]+"}, "value": "uppercase"},
                {"name": "ws", "match": {"regex": "\\s+"}, "ignore": true, "lineBreaks": true}
            ]
        }"#,
    );
    let mut lexer = Declaration::load(file.path()).unwrap().tokenizer().unwrap();
    lexer.reset("hello\n  world");
    let tokens: Vec<_> = lexer.map(Result::unwrap).collect();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[1].value, "WORLD");
    assert_eq!((tokens[1].line, tokens[1].col), (2, 1));
}

#[test]
fn test_missing_file_names_the_path() {
    let err = Declaration::load("/nonexistent/rules.yaml").unwrap_err();
    assert!(matches!(err, DeclarationError::Io { ref path, .. } if path == "/nonexistent/rules.yaml"));
}

#[test]
fn test_malformed_yaml() {
    let file = write_file(".yml", "rules: [unclosed");
    assert!(matches!(
        Declaration::load(file.path()),
        Err(DeclarationError::Yaml(_))
    ));
}

#[test]
fn test_config_limits_reductions() {
    let config_file = write_file(".toml", "[rewrite]\nmax_reductions = 2\n");
    let config = Loader::new().with_file(config_file.path()).build().unwrap();
    assert_eq!(config.output.format, OutputFormat::Table);

    let declaration = Declaration::from_yaml_str(
        r#"
rules:
  - name: number
    match: { regex: '\d+' }
  - name: plus
    match: "+"
reductions:
  - name: echo
    pattern: number plus number
    template: "{0}+{2}"
"#,
    )
    .unwrap();
    let mut driver = declaration
        .recursive()
        .unwrap()
        .with_options(RewriteOptions::from(&config.rewrite));
    driver.reset("1+2");
    assert!(matches!(
        driver.finish(),
        Err(RewriteError::ReductionLimit { limit: 2 })
    ));
}
