/*
    This module lists the short sentences of a grammar's language
*/

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use crate::grammar::{Grammar, NonterminalId, Symbol, TerminalId};

type Sentences = BTreeSet<Vec<TerminalId>>;

// Every terminal string a body derives from the current approximation, cut
// off at max_len
fn expand_body(body: &[Symbol], derived: &BTreeMap<NonterminalId, Sentences>, max_len: usize) -> Sentences {
    body.iter().fold(Sentences::from([Vec::new()]), |prefixes, symbol| {
        let options: Vec<Vec<TerminalId>> = match symbol {
            Symbol::Terminal(id) => vec![vec![*id]],
            Symbol::Epsilon => vec![Vec::new()],
            Symbol::Nonterminal(id) => derived.get(id).into_iter().flatten().cloned().collect(),
        };

        prefixes
            .iter()
            .cartesian_product(options.iter())
            .map(|(prefix, option)| prefix.iter().chain(option).copied().collect_vec())
            .filter(|sentence| sentence.len() <= max_len)
            .collect()
    })
}

/// Every terminal string of at most `max_len` symbols the start symbol
/// derives, as sequences of terminal names.
///
/// Each round recomputes what every nonterminal derives from the previous
/// round's sets. The sets only grow and are bounded by `max_len`, so this
/// terminates even with cycles and nullable nonterminals.
pub fn sentences(grammar: &Grammar, max_len: usize) -> BTreeSet<Vec<String>> {
    let mut derived: BTreeMap<NonterminalId, Sentences> = BTreeMap::new();
    loop {
        let next: BTreeMap<NonterminalId, Sentences> = grammar
            .productions
            .iter()
            .map(|(head, bodies)| {
                let strings = bodies.iter().flat_map(|body| expand_body(body, &derived, max_len)).collect();
                (*head, strings)
            })
            .collect();

        if next == derived {
            break;
        }
        derived = next;
    }

    derived
        .get(&grammar.start)
        .into_iter()
        .flatten()
        .map(|sentence| sentence.iter().map(|&id| grammar.terminal_name(id).to_string()).collect())
        .collect()
}

/// Space separated terminal names, `&` for the empty string
pub fn render_sentence(sentence: &[String]) -> String {
    if sentence.is_empty() {
        "&".to_string()
    } else {
        sentence.join(" ")
    }
}
