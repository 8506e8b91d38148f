use std::collections::{BTreeSet, VecDeque};
use std::fmt::Display;

use itertools::Itertools;
use log::{debug, info, warn};

use crate::grammar::{Grammar, NonterminalId, Symbol};

// Why useless-symbol removal left a grammar untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degeneracy {
    // No nonterminal derives any terminal string
    EmptyLanguage,
    // Some nonterminals generate, but the start symbol does not
    StartNotGenerating,
}

impl Display for Degeneracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Degeneracy::EmptyLanguage => write!(f, "no nonterminal generates a terminal string, the language is empty"),
            Degeneracy::StartNotGenerating => write!(f, "the start symbol generates no terminal string, the language is empty"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usefulness {
    Pruned,
    Degenerate(Degeneracy),
}

/// Nonterminals that derive some string of terminals. The empty body counts
/// as generating.
pub fn generating_set(grammar: &Grammar) -> BTreeSet<NonterminalId> {
    let mut generating = BTreeSet::new();
    loop {
        let next: BTreeSet<NonterminalId> = grammar
            .productions
            .iter()
            .filter(|(_, bodies)| {
                bodies.iter().any(|body| {
                    body.iter().all(|symbol| match symbol {
                        Symbol::Nonterminal(id) => generating.contains(id),
                        Symbol::Terminal(_) | Symbol::Epsilon => true,
                    })
                })
            })
            .map(|(head, _)| *head)
            .collect();

        if next == generating {
            return generating;
        }
        generating = next;
    }
}

/// Nonterminals that occur in some sentential form derived from the start
/// symbol
pub fn reachable_set(grammar: &Grammar) -> BTreeSet<NonterminalId> {
    let mut reachable = BTreeSet::from([grammar.start]);
    let mut queue = VecDeque::from([grammar.start]);

    while let Some(head) = queue.pop_front() {
        for id in grammar.bodies(head).flatten().filter_map(Symbol::as_nonterminal) {
            if reachable.insert(id) {
                queue.push_back(id);
            }
        }
    }

    reachable
}

fn names(grammar: &Grammar, ids: &BTreeSet<NonterminalId>) -> String {
    ids.iter().map(|&id| grammar.nonterminal_name(id)).sorted().join(", ")
}

/// Removes non-generating nonterminals, then nonterminals unreachable from the
/// start symbol. Reachability is computed on what survives the first step.
/// If the start symbol would be removed the grammar comes back unchanged.
pub fn remove_useless(mut grammar: Grammar) -> (Grammar, Usefulness) {
    let generating = generating_set(&grammar);
    debug!("Generating nonterminals: {}", names(&grammar, &generating));

    if generating.is_empty() {
        warn!("{}, leaving the grammar unchanged", Degeneracy::EmptyLanguage);
        return (grammar, Usefulness::Degenerate(Degeneracy::EmptyLanguage));
    }
    if !generating.contains(&grammar.start) {
        warn!("{}, leaving the grammar unchanged", Degeneracy::StartNotGenerating);
        return (grammar, Usefulness::Degenerate(Degeneracy::StartNotGenerating));
    }

    grammar.retain_nonterminals(&generating);

    let reachable = reachable_set(&grammar);
    debug!("Reachable nonterminals: {}", names(&grammar, &reachable));
    grammar.retain_nonterminals(&reachable);

    grammar.recompute_terminals();
    info!(
        "Useless symbols removed, {} nonterminals and {} productions remain",
        grammar.nonterminals.len(),
        grammar.production_count()
    );
    (grammar, Usefulness::Pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::sentences;
    use crate::parser::{parse_file, parse_str};

    fn set_names(grammar: &Grammar, ids: BTreeSet<NonterminalId>) -> String {
        names(grammar, &ids)
    }

    #[test]
    fn generating_set_fixed_point() {
        let grammar = parse_str("S -> A B | a\nA -> a A | b\nB -> B b\nC -> A A\nD -> &", "inline").unwrap();
        assert_eq!(set_names(&grammar, generating_set(&grammar)), "A, C, D, S");
    }

    #[test]
    fn reachable_set_is_breadth_first_from_start() {
        let grammar = parse_str("S -> a A\nA -> B b\nB -> b\nC -> S", "inline").unwrap();
        assert_eq!(set_names(&grammar, reachable_set(&grammar)), "A, B, S");
    }

    #[test]
    fn removes_non_generating_then_unreachable() {
        // B is reachable only through the non-generating detour through N
        let grammar = parse_str("S -> a | N B\nN -> N a\nB -> b\nU -> u", "inline").unwrap();
        let (result, usefulness) = remove_useless(grammar);

        assert_eq!(usefulness, Usefulness::Pruned);
        assert_eq!(set_names(&result, result.nonterminals.clone()), "S");
        assert_eq!(result.rendered_bodies(result.start), vec!["a"]);
        assert_eq!(result.terminals.len(), 1);
        assert_eq!(result.validate(), Ok(()));
    }

    #[test]
    fn every_remaining_nonterminal_is_useful() {
        let grammar = parse_str("S -> A B | C\nA -> a\nB -> B b\nC -> c D | c\nD -> d\nE -> e", "inline").unwrap();
        let (result, _) = remove_useless(grammar);

        assert_eq!(generating_set(&result), result.nonterminals);
        assert_eq!(reachable_set(&result), result.nonterminals);
        assert_eq!(set_names(&result, result.nonterminals.clone()), "C, D, S");
    }

    #[test]
    fn removal_is_idempotent() {
        let grammar = parse_str("S -> A B | C\nA -> a\nB -> B b\nC -> c D | c\nD -> d", "inline").unwrap();
        let (once, _) = remove_useless(grammar);
        let (twice, usefulness) = remove_useless(once.clone());

        assert_eq!(usefulness, Usefulness::Pruned);
        assert_eq!(twice, once);
    }

    #[test]
    fn empty_language_leaves_the_grammar_alone() {
        let grammar = parse_str("S -> a S\nA -> A a", "inline").unwrap();
        let (result, usefulness) = remove_useless(grammar.clone());

        assert_eq!(usefulness, Usefulness::Degenerate(Degeneracy::EmptyLanguage));
        assert_eq!(result, grammar);
    }

    #[test]
    fn non_generating_start_leaves_the_grammar_alone() {
        let grammar = parse_file(&"example_data/empty_language.txt".into()).unwrap();
        let (result, usefulness) = remove_useless(grammar.clone());
        assert_eq!(usefulness, Usefulness::Degenerate(Degeneracy::EmptyLanguage));
        assert_eq!(result, grammar);

        let grammar = parse_str("S -> a S | A\nA -> A a\nB -> b", "inline").unwrap();
        let (result, usefulness) = remove_useless(grammar.clone());
        assert_eq!(usefulness, Usefulness::Degenerate(Degeneracy::StartNotGenerating));
        assert_eq!(result, grammar);
    }

    #[test]
    fn language_is_preserved() {
        let grammar = parse_str("S -> A B | C\nA -> a\nB -> B b\nC -> c D | c\nD -> d", "inline").unwrap();
        let expected = sentences(&grammar, 4);
        let (result, _) = remove_useless(grammar);
        assert_eq!(sentences(&result, 4), expected);
    }
}
