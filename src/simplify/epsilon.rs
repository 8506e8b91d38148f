use std::collections::BTreeSet;

use itertools::Itertools;
use log::{debug, info};

use crate::grammar::{epsilon_body, is_epsilon, Body, Grammar, NonterminalId, Origin, Symbol};

fn is_nullable_symbol(symbol: &Symbol, nullable: &BTreeSet<NonterminalId>) -> bool {
    matches!(symbol, Symbol::Nonterminal(id) if nullable.contains(id))
}

fn is_nullable_body(body: &[Symbol], nullable: &BTreeSet<NonterminalId>) -> bool {
    is_epsilon(body) || body.iter().all(|symbol| is_nullable_symbol(symbol, nullable))
}

/// Nonterminals that can derive the empty string
pub fn nullable_set(grammar: &Grammar) -> BTreeSet<NonterminalId> {
    let mut nullable = BTreeSet::new();
    loop {
        let next: BTreeSet<NonterminalId> = grammar
            .productions
            .iter()
            .filter(|(_, bodies)| bodies.iter().any(|body| is_nullable_body(body, &nullable)))
            .map(|(head, _)| *head)
            .collect();

        if next == nullable {
            return nullable;
        }
        nullable = next;
    }
}

// The body itself plus every body left after deleting some of its nullable
// symbols. Deleting all of them is never allowed to leave an empty body.
fn expand_nullable(body: &[Symbol], nullable: &BTreeSet<NonterminalId>) -> Vec<Body> {
    let positions = body.iter().positions(|symbol| is_nullable_symbol(symbol, nullable)).collect_vec();

    positions
        .into_iter()
        .powerset()
        .map(|dropped| {
            body.iter()
                .enumerate()
                .filter(|(i, _)| !dropped.contains(i))
                .map(|(_, symbol)| *symbol)
                .collect::<Body>()
        })
        .filter(|variant| !variant.is_empty())
        .collect()
}

/// Removes every epsilon production. When the start symbol derives the empty
/// string a new start symbol `S0 -> start | &` keeps it in the language.
pub fn remove_epsilon(mut grammar: Grammar) -> Grammar {
    let nullable = nullable_set(&grammar);
    debug!(
        "Nullable nonterminals: {}",
        nullable.iter().map(|&id| grammar.nonterminal_name(id)).join(", ")
    );

    grammar.productions = grammar
        .productions
        .iter()
        .map(|(head, bodies)| {
            let expanded = bodies
                .iter()
                .filter(|body| !is_epsilon(body))
                .flat_map(|body| expand_nullable(body, &nullable))
                .collect();
            (*head, expanded)
        })
        .collect();

    if nullable.contains(&grammar.start) {
        // A start symbol made by an earlier run is never used on a right-hand
        // side, so it can keep the empty string itself
        if *grammar.symbols.origin(grammar.start) == Origin::NewStart {
            grammar.add_production(grammar.start, epsilon_body());
        } else {
            let old_start = grammar.start;
            let new_start = grammar.fresh_nonterminal(Origin::NewStart);
            grammar.add_production(new_start, vec![Symbol::Nonterminal(old_start)]);
            grammar.add_production(new_start, epsilon_body());
            grammar.start = new_start;
        }
    }

    grammar.recompute_terminals();
    info!("Epsilon productions removed, {} productions remain", grammar.production_count());
    grammar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::sentences;
    use crate::parser::parse_str;

    fn nullable_names(grammar: &Grammar) -> Vec<&str> {
        nullable_set(grammar).iter().map(|&id| grammar.nonterminal_name(id)).sorted().collect()
    }

    #[test]
    fn nullable_set_follows_chains() {
        let grammar = parse_str("S -> A B | a\nA -> B B | a\nB -> & | b\nC -> C a | &", "inline").unwrap();
        assert_eq!(nullable_names(&grammar), vec!["A", "B", "C", "S"]);

        let grammar = parse_str("S -> A a\nA -> &", "inline").unwrap();
        assert_eq!(nullable_names(&grammar), vec!["A"]);
    }

    #[test]
    fn nullable_set_is_idempotent() {
        let grammar = parse_str("S -> A S | a\nA -> A A | &", "inline").unwrap();
        assert_eq!(nullable_set(&grammar), nullable_set(&grammar));
    }

    #[test]
    fn expands_every_subset_of_nullable_positions() {
        let grammar = parse_str("S -> A b A\nA -> a | &", "inline").unwrap();
        let s = grammar.start;
        let result = remove_epsilon(grammar);

        assert_eq!(result.start, s);
        assert_eq!(result.rendered_bodies(s), vec!["A b", "A b A", "b", "b A"]);
        assert!(result.epsilon_heads().is_empty());
    }

    #[test]
    fn nullable_sites_are_expanded_in_place() {
        let grammar = parse_str("S -> A S | a\nA -> A A | &", "inline").unwrap();
        let s = grammar.start;
        let a = grammar.nonterminal("A").unwrap();
        let result = remove_epsilon(grammar);

        assert_eq!(result.start, s);
        assert_eq!(result.rendered_bodies(s), vec!["A S", "S", "a"]);
        assert_eq!(result.rendered_bodies(a), vec!["A", "A A"]);
        assert!(result.epsilon_heads().is_empty());
        assert_eq!(result.validate(), Ok(()));
    }

    #[test]
    fn nullable_start_gets_a_new_start_symbol() {
        let grammar = parse_str("S -> a S b | &", "inline").unwrap();
        let old_start = grammar.start;
        let result = remove_epsilon(grammar);

        assert_eq!(result.nonterminal_name(result.start), "S0");
        assert_eq!(*result.symbols.origin(result.start), Origin::NewStart);
        assert_eq!(result.rendered_bodies(result.start), vec!["&", "S"]);
        assert_eq!(result.rendered_bodies(old_start), vec!["a S b", "a b"]);
        assert_eq!(result.epsilon_heads(), BTreeSet::from([result.start]));
        assert_eq!(result.validate(), Ok(()));
    }

    #[test]
    fn epsilon_only_nonterminal_keeps_no_bodies() {
        let grammar = parse_str("S -> a E\nE -> &", "inline").unwrap();
        let e = grammar.nonterminal("E").unwrap();
        let result = remove_epsilon(grammar);

        assert!(result.rendered_bodies(e).is_empty());
        assert_eq!(result.rendered_bodies(result.start), vec!["a", "a E"]);
    }

    #[test]
    fn running_twice_keeps_the_same_start() {
        let grammar = parse_str("S -> a S b | &", "inline").unwrap();
        let once = remove_epsilon(grammar);
        let twice = remove_epsilon(once.clone());

        assert_eq!(twice.start, once.start);
        assert_eq!(twice.productions, once.productions);
    }

    #[test]
    fn terminals_shrink_to_the_used_ones() {
        let grammar = parse_str("terminals = { a, b }\nS -> a", "inline").unwrap();
        let result = remove_epsilon(grammar);
        assert_eq!(result.terminals.len(), 1);
    }

    #[test]
    fn language_is_preserved() {
        let grammar = parse_str("S -> a S b S | b S a S | &", "inline").unwrap();
        let expected = sentences(&grammar, 6);
        assert_eq!(sentences(&remove_epsilon(grammar), 6), expected);
    }
}
