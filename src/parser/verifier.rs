use std::path::Path;

use itertools::Itertools;

use super::CompileErrorType::{MissingStart, SymbolCollision, UndeclaredStart, UnknownSymbol};
use super::{CompileError, CompileErrors, FileResult, Line, RawBody, RawSymbol, Statement};
use crate::error_handling::Location;
use crate::grammar::{Body, Grammar, NonterminalId, Symbol, SymbolTable};

// A rule whose names have not been resolved yet
struct RawRule<'a> {
    head: &'a str,
    alternatives: &'a [RawBody],
    location: &'a Location,
}

// Everything the source declares, with inferred defaults filled in
struct Declarations<'a> {
    nonterminals: Vec<(&'a str, &'a Location)>,
    terminals: Vec<(&'a str, &'a Location)>,
    start: Option<(&'a str, &'a Location)>,
    rules: Vec<RawRule<'a>>,
}

fn collect_declarations(lines: &[Line]) -> Declarations<'_> {
    // `None` until a declaration line shows up, so `terminals = {}` still
    // counts as declared
    let mut nonterminals: Option<Vec<_>> = None;
    let mut terminals: Option<Vec<_>> = None;
    let mut start = None;
    let mut rules = Vec::new();

    for line in lines {
        let location = &line.location;
        match &line.statement {
            Statement::Nonterminals(names) => nonterminals
                .get_or_insert_with(Vec::new)
                .extend(names.iter().map(|n| (n.as_str(), location))),
            Statement::Terminals(names) => terminals
                .get_or_insert_with(Vec::new)
                .extend(names.iter().map(|n| (n.as_str(), location))),
            Statement::Start(name) => start = Some((name.as_str(), location)),
            Statement::RulesMarker => {}
            Statement::Rule { head, alternatives } => rules.push(RawRule {
                head: head.as_str(),
                alternatives: alternatives.as_slice(),
                location,
            }),
        }
    }

    // Without a nonterminal declaration the heads of the rules are the
    // nonterminals, and without a terminal declaration every other body
    // symbol is a terminal
    let nonterminals = nonterminals.unwrap_or_else(|| {
        rules.iter().map(|rule| (rule.head, rule.location)).unique_by(|(n, _)| *n).collect()
    });
    let terminals = terminals.unwrap_or_else(|| {
        rules
            .iter()
            .flat_map(|rule| rule.alternatives.iter().flatten().map(move |s| (s, rule.location)))
            .filter_map(|(symbol, location)| match symbol {
                RawSymbol::Name(name) => Some((name.as_str(), location)),
                RawSymbol::Epsilon => None,
            })
            .filter(|(name, _)| !nonterminals.iter().any(|(n, _)| n == name))
            .unique_by(|(n, _)| *n)
            .collect()
    });

    Declarations { nonterminals, terminals, start, rules }
}

fn register_symbols(declarations: &Declarations, errors: &mut CompileErrors) -> SymbolTable {
    let mut symbols = SymbolTable::new();
    let is_nonterminal = |name: &str| declarations.nonterminals.iter().any(|(n, _)| *n == name);

    // Give the start symbol the first id so generated output is stable. An
    // undeclared start symbol is reported once the start is resolved.
    let start = declarations.start.map(|(name, _)| name).filter(|name| is_nonterminal(*name));
    for name in start.into_iter().chain(declarations.nonterminals.iter().map(|(n, _)| *n)) {
        symbols.insert_nonterminal(name);
    }

    for (name, location) in &declarations.terminals {
        if symbols.insert_terminal(name).is_none() {
            errors.push(CompileError {
                location: (*location).clone(),
                error: SymbolCollision(name.to_string()),
            });
        }
    }

    symbols
}

fn resolve_start(declarations: &Declarations, symbols: &SymbolTable, path: &Path) -> Result<NonterminalId, CompileError> {
    let declared = |name: &str| symbols.lookup(name).and_then(|symbol| symbol.as_nonterminal());

    match declarations.start {
        Some((name, location)) => declared(name).ok_or_else(|| CompileError {
            location: location.clone(),
            error: UndeclaredStart(name.to_string()),
        }),
        // Conventionally `S`, otherwise the first nonterminal
        None => declared("S")
            .or_else(|| declarations.nonterminals.first().and_then(|(name, _)| declared(*name)))
            .ok_or_else(|| CompileError {
                location: Location::whole_file(path),
                error: MissingStart,
            }),
    }
}

fn resolve_body(body: &RawBody, symbols: &SymbolTable, location: &Location) -> Result<Body, CompileErrors> {
    let (resolved, unknown): (Vec<_>, Vec<_>) = body
        .iter()
        .map(|symbol| match symbol {
            RawSymbol::Epsilon => Ok(Symbol::Epsilon),
            RawSymbol::Name(name) => symbols.lookup(name).ok_or_else(|| CompileError {
                location: location.clone(),
                error: UnknownSymbol(name.clone()),
            }),
        })
        .partition(Result::is_ok);

    if unknown.is_empty() {
        Ok(resolved.into_iter().filter_map(Result::ok).collect())
    } else {
        Err(unknown.into_iter().filter_map(Result::err).collect())
    }
}

fn add_rule(grammar: &mut Grammar, rule: &RawRule, errors: &mut CompileErrors) {
    let head = match grammar.symbols.lookup(rule.head) {
        Some(Symbol::Nonterminal(head)) => head,
        _ => {
            errors.push(CompileError {
                location: rule.location.clone(),
                error: UnknownSymbol(rule.head.to_string()),
            });
            return;
        }
    };

    for alternative in rule.alternatives {
        match resolve_body(alternative, &grammar.symbols, rule.location) {
            Ok(body) => grammar.add_production(head, body),
            Err(unknown) => errors.extend(unknown),
        }
    }
}

/// Turns parsed lines into a grammar, checking that every name is declared
/// exactly once and that the start symbol is a nonterminal.
pub fn build_grammar(lines: Vec<Line>, path: &Path) -> FileResult<Grammar> {
    let declarations = collect_declarations(&lines);
    let mut errors = Vec::new();

    let symbols = register_symbols(&declarations, &mut errors);
    let start = match resolve_start(&declarations, &symbols, path) {
        Ok(start) => start,
        Err(error) => {
            errors.push(error);
            return Err(errors);
        }
    };

    let mut grammar = Grammar::new(symbols, start);
    for (name, _) in &declarations.nonterminals {
        if let Some(id) = grammar.symbols.lookup(name).and_then(|symbol| symbol.as_nonterminal()) {
            grammar.add_nonterminal(id);
        }
    }
    grammar.terminals = declarations
        .terminals
        .iter()
        .filter_map(|(name, _)| match grammar.symbols.lookup(name) {
            Some(Symbol::Terminal(id)) => Some(id),
            _ => None,
        })
        .collect();

    for rule in &declarations.rules {
        add_rule(&mut grammar, rule, &mut errors);
    }

    if errors.is_empty() {
        Ok(grammar)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use crate::error_handling::Location;
    use crate::parser::{parse_str, CompileError, CompileErrorType};

    fn errors_of(source: &str) -> Vec<CompileErrorType> {
        parse_str(source, "inline")
            .unwrap_err()
            .into_iter()
            .map(|CompileError { error, .. }| error)
            .collect()
    }

    #[test]
    fn infers_declarations_from_rules() {
        let grammar = parse_str("A -> a B\nB -> b | &\nS -> A", "inline").unwrap();

        assert_eq!(grammar.start, grammar.nonterminal("S").unwrap());
        assert_eq!(grammar.nonterminals.len(), 3);
        assert_eq!(grammar.terminals.len(), 2);
        assert_eq!(grammar.validate(), Ok(()));
    }

    #[test]
    fn first_head_is_the_default_start() {
        let grammar = parse_str("E -> E plus T | T\nT -> id", "inline").unwrap();
        assert_eq!(grammar.nonterminal_name(grammar.start), "E");
    }

    #[test]
    fn declared_alphabet_is_kept() {
        let source = "nonterminals = { S }\nterminals = { a, b }\nstart = S\nS -> a S | a";
        let grammar = parse_str(source, "inline").unwrap();
        assert_eq!(grammar.terminals.len(), 2);
    }

    #[test]
    fn empty_alphabet_is_not_inferred() {
        let source = "nonterminals = { S }\nterminals = {}\nS -> a S | &";
        assert_eq!(errors_of(source), vec![CompileErrorType::UnknownSymbol("a".to_string())]);

        let grammar = parse_str("terminals = {}\nS -> &", "inline").unwrap();
        assert!(grammar.terminals.is_empty());
        assert_eq!(grammar.rendered_bodies(grammar.start), vec!["&"]);
    }

    #[test]
    fn unknown_symbols_are_rejected() {
        let source = "nonterminals = { S }\nterminals = { a }\nstart = S\nS -> a B | c\nA -> a";
        assert_eq!(errors_of(source), vec![
            CompileErrorType::UnknownSymbol("B".to_string()),
            CompileErrorType::UnknownSymbol("c".to_string()),
            CompileErrorType::UnknownSymbol("A".to_string()),
        ]);
    }

    #[test]
    fn undeclared_start_is_rejected() {
        let source = "nonterminals = { S }\nterminals = { a }\nstart = Q\nS -> a";
        let errors = parse_str(source, "inline").unwrap_err();
        assert_eq!(errors, vec![CompileError {
            location: Location::at_line("inline", 3),
            error: CompileErrorType::UndeclaredStart("Q".to_string()),
        }]);

        assert_eq!(errors_of("terminals = { a }\nstart = a"), vec![
            CompileErrorType::UndeclaredStart("a".to_string()),
        ]);
    }

    #[test]
    fn colliding_names_are_rejected() {
        let source = "nonterminals = { S, a }\nterminals = { a }\nS -> a";
        assert_eq!(errors_of(source), vec![CompileErrorType::SymbolCollision("a".to_string())]);
    }

    #[test]
    fn empty_source_has_no_start() {
        assert_eq!(errors_of("; nothing here\n"), vec![CompileErrorType::MissingStart]);
    }
}
