//! Command-line interface for cute
//! Tokenizes input or runs reduction passes using rules loaded from a declaration file.
//!
//! Usage:
//!   cute tokens `<declaration>` [`<input>`]             - Print the token stream
//!   cute reduce `<declaration>` [`<input>`] [--passes]  - Run the declared reductions
//!
//! Input is read from stdin when no input file is given. A `cute.toml` in the working
//! directory and `--config <file>` are layered over the defaults, `-v` raises log
//! verbosity (repeatable).

use clap::{Arg, ArgAction, ArgMatches, Command};
use cute::config::{CuteConfig, Loader, OutputFormat};
use cute::declaration::Declaration;
use cute::error::{escape_newlines, Error};
use cute::lexing::Token;
use cute::rewriting::RewriteOptions;
use serde::Serialize;
use std::io::Read;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = Command::new("cute")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A regex-driven tokenizer with token-stream rewriting")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("TOML file layered over the default configuration"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)"),
        )
        .subcommand(
            Command::new("tokens")
                .about("Print the token stream of the input")
                .arg(declaration_arg())
                .arg(input_arg())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .value_parser(["table", "json"])
                        .help("Output format (overrides output.format)"),
                ),
        )
        .subcommand(
            Command::new("reduce")
                .about("Run the declared reduction rules over the input")
                .arg(declaration_arg())
                .arg(input_arg())
                .arg(
                    Arg::new("passes")
                        .long("passes")
                        .action(ArgAction::SetTrue)
                        .help("Print the buffer after every pass"),
                ),
        )
        .get_matches();

    init_logging(matches.get_count("verbose"));

    let result = match matches.subcommand() {
        Some(("tokens", sub)) => handle_tokens_command(&matches, sub),
        Some(("reduce", sub)) => handle_reduce_command(&matches, sub),
        _ => unreachable!(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn declaration_arg() -> Arg {
    Arg::new("declaration")
        .help("Rule declaration file (.yaml, .yml or .json)")
        .required(true)
        .index(1)
}

fn input_arg() -> Arg {
    Arg::new("input")
        .help("Input file (defaults to stdin)")
        .index(2)
}

/// `RUST_LOG` wins over `-v`; logs go to stderr so stdout stays parseable.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Defaults, then `./cute.toml`, then `--config`, then flag overrides.
fn load_config(matches: &ArgMatches, overrides: &[(&str, &str)]) -> Result<CuteConfig, Error> {
    let mut loader = Loader::new();
    if let Ok(dir) = std::env::current_dir() {
        loader = loader.with_directory(dir);
    }
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    for (key, value) in overrides {
        loader = loader.set_override(key, *value)?;
    }
    Ok(loader.build()?)
}

fn read_input(sub: &ArgMatches) -> Result<String, Error> {
    match sub.get_one::<String>("input") {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn load_declaration(sub: &ArgMatches) -> Result<Declaration, Error> {
    let path = sub
        .get_one::<String>("declaration")
        .map(String::as_str)
        .unwrap_or_default();
    let declaration = Declaration::load(path)?;
    debug!(
        path,
        rules = declaration.rules.len(),
        states = declaration.states.len(),
        reductions = declaration.reductions.len(),
        "loaded declaration"
    );
    Ok(declaration)
}

#[derive(Serialize)]
struct StatefulToken {
    state: String,
    #[serde(flatten)]
    token: Token,
}

/// Handle the tokens command
fn handle_tokens_command(matches: &ArgMatches, sub: &ArgMatches) -> Result<(), Error> {
    let overrides: Vec<(&str, &str)> = sub
        .get_one::<String>("format")
        .map(|format| ("output.format", format.as_str()))
        .into_iter()
        .collect();
    let config = load_config(matches, &overrides)?;
    let declaration = load_declaration(sub)?;
    let input = read_input(sub)?;

    let rows = if declaration.has_states() {
        let mut lexer = declaration.stateful()?;
        lexer.reset(input);
        let mut rows = Vec::new();
        while let Some((state, token)) = lexer.next_with_state()? {
            rows.push(StatefulToken { state, token });
        }
        rows
    } else {
        let mut lexer = declaration.tokenizer()?;
        lexer.reset(input);
        lexer
            .to_vec()?
            .into_iter()
            .map(|token| StatefulToken {
                state: String::new(),
                token,
            })
            .collect()
    };
    info!(count = rows.len(), "tokenized");

    match config.output.format {
        OutputFormat::Json if declaration.has_states() => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Json => {
            let tokens: Vec<&Token> = rows.iter().map(|row| &row.token).collect();
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }
        OutputFormat::Table => {
            for row in &rows {
                let token = &row.token;
                let value = if config.output.escape_newlines {
                    escape_newlines(&token.value)
                } else {
                    token.value.clone()
                };
                let location = token.position().to_string();
                if row.state.is_empty() {
                    println!("{:<8} {:<16} {}", location, token.kind, value);
                } else {
                    println!("{:<8} {:<12} {:<16} {}", location, row.state, token.kind, value);
                }
            }
        }
    }
    Ok(())
}

/// Handle the reduce command
fn handle_reduce_command(matches: &ArgMatches, sub: &ArgMatches) -> Result<(), Error> {
    let config = load_config(matches, &[])?;
    let declaration = load_declaration(sub)?;
    let input = read_input(sub)?;

    let mut driver = declaration
        .recursive()?
        .with_options(RewriteOptions::from(&config.rewrite));
    driver.reset(input);

    if sub.get_flag("passes") {
        let names: Vec<String> = driver.rules().iter().map(|r| r.name().to_string()).collect();
        for (name, buffer) in names.iter().zip(driver.by_ref()) {
            println!("{}: {}", name, buffer?);
        }
    } else {
        println!("{}", driver.finish()?);
    }
    Ok(())
}
