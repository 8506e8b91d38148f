/*
    This module parses grammar source files
*/

mod lexer;
mod verifier;

use std::fmt::Display;
use std::fs::File;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::error_handling::*;
use crate::grammar::*;
use itertools::Itertools;
use lexer::*;
use verifier::build_grammar;

#[derive(Debug)]
pub enum CompileErrorType {
    // A rule line has no `->`
    MissingArrow,
    // The left side of a rule is not a single symbol
    MissingNonterminal,
    // A nonterminals/terminals/start line is not well formed
    MalformedHeader,
    // A token that cannot appear inside a body
    UnexpectedToken(String),
    // There is an unclosed quote
    UnmatchedQuote,
    // Nothing between two `|`
    EmptyAlternative,
    // Epsilon written next to other symbols
    MisplacedEpsilon,
    // A symbol that is neither a declared terminal nor a nonterminal
    UnknownSymbol(String),
    // A name declared as both a terminal and a nonterminal
    SymbolCollision(String),
    // The start symbol is not a declared nonterminal
    UndeclaredStart(String),
    // No start symbol was given and none could be inferred
    MissingStart,
    // A blank line got too deep into the parser
    // This is a problem with cfgnorm, not the grammar
    UnexpectedBlankLine,
    // There was an issue with reading a file
    FileError(std::io::Error),
}

impl ErrorType for CompileErrorType {}

impl PartialEq for CompileErrorType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CompileErrorType::FileError(a), CompileErrorType::FileError(b)) => a.kind() == b.kind(),
            (CompileErrorType::UnexpectedToken(a), CompileErrorType::UnexpectedToken(b))
            | (CompileErrorType::UnknownSymbol(a), CompileErrorType::UnknownSymbol(b))
            | (CompileErrorType::SymbolCollision(a), CompileErrorType::SymbolCollision(b))
            | (CompileErrorType::UndeclaredStart(a), CompileErrorType::UndeclaredStart(b)) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl Display for CompileErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileErrorType::MissingArrow => write!(f, "Expected `->` after the nonterminal"),
            CompileErrorType::MissingNonterminal => write!(f, "Expected a single nonterminal before `->`"),
            CompileErrorType::MalformedHeader => write!(f, "Malformed declaration, expected `name = {{ a, b }}` or `start = S`"),
            CompileErrorType::UnexpectedToken(token) => write!(f, "Unexpected `{}` in a production body", token),
            CompileErrorType::UnmatchedQuote => write!(f, "Unmatched quotes"),
            CompileErrorType::EmptyAlternative => write!(f, "Empty alternative, write `&` for the empty string"),
            CompileErrorType::MisplacedEpsilon => write!(f, "Epsilon must be the only symbol of its alternative"),
            CompileErrorType::UnknownSymbol(symbol) => write!(f, "Unknown symbol `{}`", symbol),
            CompileErrorType::SymbolCollision(symbol) => write!(f, "`{}` is declared as both a terminal and a nonterminal", symbol),
            CompileErrorType::UndeclaredStart(symbol) => write!(f, "Start symbol `{}` is not a declared nonterminal", symbol),
            CompileErrorType::MissingStart => write!(f, "No start symbol declared and no rules to infer one from"),
            CompileErrorType::UnexpectedBlankLine => write!(f, "Blank line encountered in rule parser (this is a problem with cfgnorm, not the grammar)"),
            CompileErrorType::FileError(e) => write!(f, "File error: {}", e),
        }
    }
}

pub type CompileError = Error<CompileErrorType>;
pub type CompileErrors = Errors<CompileErrorType>;

fn io_error(error: std::io::Error, file: &Path) -> CompileError {
    CompileError {
        location: Location::whole_file(file),
        error: CompileErrorType::FileError(error),
    }
}

pub type Result<T> = std::result::Result<T, CompileErrorType>;
pub type LineResult<T> = std::result::Result<T, CompileError>;
pub type FileResult<T> = std::result::Result<T, CompileErrors>;

// A body symbol before names are resolved against the declarations
#[derive(PartialEq, Debug, Clone)]
enum RawSymbol {
    Name(String),
    Epsilon,
}

type RawBody = Vec<RawSymbol>;

#[derive(PartialEq, Debug)]
enum Statement {
    Nonterminals(Vec<String>),
    Terminals(Vec<String>),
    Start(String),
    // Optional line separating the declarations from the rules
    RulesMarker,
    Rule { head: String, alternatives: Vec<RawBody> },
}

#[derive(PartialEq, Debug)]
struct Line {
    statement: Statement,
    location: Location,
}

fn token_text(token: &Token) -> String {
    match token {
        Token::Arrow => "->".to_string(),
        Token::Or => "|".to_string(),
        Token::Equals => "=".to_string(),
        Token::OpenBrace => "{".to_string(),
        Token::CloseBrace => "}".to_string(),
        Token::Comma => ",".to_string(),
        Token::Epsilon => "&".to_string(),
        Token::Word(text) => text.clone(),
    }
}

fn parse_alternative(tokens: &[Token]) -> Result<RawBody> {
    let body: RawBody = tokens.iter().map(|t| match t {
        Token::Word(s) => Ok(RawSymbol::Name(s.clone())),
        Token::Epsilon => Ok(RawSymbol::Epsilon),
        other => Err(CompileErrorType::UnexpectedToken(token_text(other))),
    }).collect::<Result<_>>()?;

    if body.is_empty() {
        Err(CompileErrorType::EmptyAlternative)
    } else if body.len() > 1 && body.contains(&RawSymbol::Epsilon) {
        Err(CompileErrorType::MisplacedEpsilon)
    } else {
        Ok(body)
    }
}

fn parse_alternatives(tokens: &[Token]) -> Result<Vec<RawBody>> {
    tokens.split(|t| *t == Token::Or).map(parse_alternative).collect()
}

// `{ a, b, c }`
fn parse_name_set(tokens: &[Token]) -> Result<Vec<String>> {
    let [Token::OpenBrace, inner @ .., Token::CloseBrace] = tokens else {
        return Err(CompileErrorType::MalformedHeader);
    };
    if inner.is_empty() {
        return Ok(Vec::new());
    }

    inner.split(|t| *t == Token::Comma).map(|item| match item {
        [Token::Word(name)] => Ok(name.clone()),
        _ => Err(CompileErrorType::MalformedHeader),
    }).collect()
}

const RULES_MARKERS: [&str; 3] = ["rules", "productions", "regras"];

fn parse_header(keyword: &str, rest: &[Token]) -> Result<Statement> {
    match keyword.to_lowercase().as_str() {
        "nonterminals" | "variables" | "variaveis" => Ok(Statement::Nonterminals(parse_name_set(rest)?)),
        "terminals" | "alphabet" | "alfabeto" => Ok(Statement::Terminals(parse_name_set(rest)?)),
        "start" | "initial" | "inicial" => match rest {
            [Token::Word(symbol)] => Ok(Statement::Start(symbol.clone())),
            _ => Err(CompileErrorType::MalformedHeader),
        },
        // Looks like a rule written with `=`
        _ => Err(CompileErrorType::MissingArrow),
    }
}

fn parse_statement(tokens: &[Token]) -> Result<Statement> {
    match tokens {
        [] => Err(CompileErrorType::UnexpectedBlankLine),
        [Token::Word(keyword), Token::Equals, rest @ ..] => parse_header(keyword, rest),
        [Token::Word(word)] if RULES_MARKERS.contains(&word.to_lowercase().as_str()) => {
            Ok(Statement::RulesMarker)
        }
        [Token::Word(head), Token::Arrow, rest @ ..] => Ok(Statement::Rule {
            head: head.clone(),
            alternatives: parse_alternatives(rest)?,
        }),
        _ if tokens.contains(&Token::Arrow) => Err(CompileErrorType::MissingNonterminal),
        _ => Err(CompileErrorType::MissingArrow),
    }
}

fn parse_lex_line(line: &str, location: Location) -> LineResult<Line> {
    lexer::lex_line(line)
        .and_then(|lexed_line| parse_statement(&lexed_line))
        .map(|statement| Line { statement, location: location.clone() })
        .map_err(|error| CompileError { location, error })
}

fn is_statement_line(line: &String) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with(';') && !line.starts_with('#')
}

// Parses numbered lines, collecting every error instead of stopping at the
// first one
fn parse_lines(lines: impl Iterator<Item = (usize, LineResult<String>)>, path: &Path) -> FileResult<Grammar> {
    let parsed_lines = lines
        .filter(|(_, line)| line.as_ref().is_ok_and(is_statement_line) || line.is_err())
        .map(|(num, line_res)| {
            line_res.and_then(|line| parse_lex_line(&line, Location::at_line(path, num)))
        });

    let (lines, errors): (Vec<_>, Vec<_>) = parsed_lines.partition(LineResult::is_ok);
    if !errors.is_empty() {
        return Err(errors.into_iter().filter_map(LineResult::err).collect_vec());
    }
    let lines_unwrapped = lines.into_iter().filter_map(LineResult::ok).collect_vec();

    build_grammar(lines_unwrapped, path)
}

#[cfg(test)]
pub fn parse_str(source: &str, path: impl AsRef<Path>) -> FileResult<Grammar> {
    let lines = source
        .lines()
        .map(|line| Ok(line.to_string()))
        .enumerate()
        .map(|(num, line)| (num + 1, line));
    parse_lines(lines, path.as_ref())
}

pub fn parse_file(path: &PathBuf) -> FileResult<Grammar> {
    let file = File::open(path).map_err(|e| vec![io_error(e, path)])?;
    let lines = std::io::BufReader::new(file)
        .lines()
        .map(|line| line.map_err(|e| io_error(e, path)))
        .enumerate()
        .map(|(num, line)| (num + 1, line));

    parse_lines(lines, path)
}

/// Replaces the declared start symbol, e.g. from the command line
pub fn override_start(grammar: &mut Grammar, symbol: &str, path: &Path) -> LineResult<()> {
    match grammar.nonterminal(symbol) {
        Some(id) => {
            grammar.start = id;
            Ok(())
        }
        None => Err(CompileError {
            location: Location::whole_file(path),
            error: CompileErrorType::UndeclaredStart(symbol.to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(text: &str) -> RawSymbol {
        RawSymbol::Name(text.to_string())
    }

    fn word(text: &str) -> Token {
        Token::Word(text.to_string())
    }

    #[test]
    fn parse_normal_alternative() {
        assert_eq!(parse_alternative(&[word("A"), word("b")]), Ok(vec![name("A"), name("b")]));
        assert_eq!(parse_alternative(&[Token::Epsilon]), Ok(vec![RawSymbol::Epsilon]));
    }

    #[test]
    fn parse_malformed_alternative() {
        assert_eq!(parse_alternative(&[]), Err(CompileErrorType::EmptyAlternative));
        assert_eq!(parse_alternative(&[word("a"), Token::Epsilon]), Err(CompileErrorType::MisplacedEpsilon));
        assert_eq!(parse_alternative(&[Token::Equals]), Err(CompileErrorType::UnexpectedToken("=".to_string())));
    }

    #[test]
    fn parse_normal_statements() {
        let cases = vec![
            ("S -> A S | a", Statement::Rule {
                head: "S".to_string(),
                alternatives: vec![vec![name("A"), name("S")], vec![name("a")]],
            }),
            ("Variables = { S, A }", Statement::Nonterminals(vec!["S".to_string(), "A".to_string()])),
            ("terminals = {}", Statement::Terminals(Vec::new())),
            ("Start = S", Statement::Start("S".to_string())),
            ("Rules", Statement::RulesMarker),
            ("Alfabeto = {a, b}", Statement::Terminals(vec!["a".to_string(), "b".to_string()])),
            ("Inicial = S", Statement::Start("S".to_string())),
            ("Regras", Statement::RulesMarker),
        ];

        for (line, answer) in cases {
            assert_eq!(parse_statement(&lex_line(line).unwrap()), Ok(answer));
        }
    }

    #[test]
    fn parse_malformed_statements() {
        let cases = vec![
            ("S a b", CompileErrorType::MissingArrow),
            ("S = a b", CompileErrorType::MissingArrow),
            ("-> a", CompileErrorType::MissingNonterminal),
            ("A B -> a", CompileErrorType::MissingNonterminal),
            ("terminals = { a b }", CompileErrorType::MalformedHeader),
            ("start = S A", CompileErrorType::MalformedHeader),
            ("S -> a | | b", CompileErrorType::EmptyAlternative),
        ];

        for (line, answer) in cases {
            assert_eq!(parse_statement(&lex_line(line).unwrap()), Err(answer), "{}", line);
        }
        assert_eq!(parse_statement(&[]), Err(CompileErrorType::UnexpectedBlankLine));
    }

    #[test]
    fn parse_normal_file() {
        let path = PathBuf::from("example_data/textbook.txt");
        let grammar = parse_file(&path).unwrap();

        let s = grammar.nonterminal("S").unwrap();
        let a = grammar.nonterminal("A").unwrap();
        assert_eq!(grammar.start, s);
        assert_eq!(grammar.rendered_bodies(s), vec!["A S", "a"]);
        assert_eq!(grammar.rendered_bodies(a), vec!["&", "A A"]);
        assert_eq!(grammar.terminals.len(), 2);
        assert_eq!(grammar.validate(), Ok(()));
    }

    #[test]
    fn parse_malformed_file() {
        let path = PathBuf::from("example_data/malformed.txt");
        let errors = parse_file(&path).unwrap_err();

        assert_eq!(errors, vec![
            CompileError {
                location: Location::at_line(&path, 5),
                error: CompileErrorType::MissingArrow,
            },
            CompileError {
                location: Location::at_line(&path, 7),
                error: CompileErrorType::MisplacedEpsilon,
            },
        ]);
    }

    #[test]
    fn parse_portuguese_headers() {
        let path = PathBuf::from("example_data/portuguese_headers.txt");
        let grammar = parse_file(&path).unwrap();

        let s = grammar.nonterminal("S").unwrap();
        let a = grammar.nonterminal("A").unwrap();
        let b = grammar.nonterminal("B").unwrap();
        assert_eq!(grammar.start, s);
        assert_eq!(grammar.nonterminals.len(), 3);
        assert_eq!(grammar.terminals.len(), 2);
        assert_eq!(grammar.rendered_bodies(s), vec!["A B", "a"]);
        assert_eq!(grammar.rendered_bodies(a), vec!["&", "a A"]);
        assert_eq!(grammar.rendered_bodies(b), vec!["b"]);
        assert_eq!(grammar.validate(), Ok(()));
    }

    #[test]
    fn missing_file_is_reported() {
        let path = PathBuf::from("example_data/does_not_exist.txt");
        let errors = parse_file(&path).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].error, CompileErrorType::FileError(_)));
    }

    #[test]
    fn start_override() {
        let mut grammar = parse_str("S -> A | a\nA -> b", "inline").unwrap();
        let a = grammar.nonterminal("A").unwrap();

        assert_eq!(override_start(&mut grammar, "A", Path::new("inline")), Ok(()));
        assert_eq!(grammar.start, a);
        assert_eq!(
            override_start(&mut grammar, "b", Path::new("inline")).unwrap_err().error,
            CompileErrorType::UndeclaredStart("b".to_string())
        );
    }
}
