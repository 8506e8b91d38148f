use std::collections::HashMap;

use itertools::Itertools;
use log::{debug, info, warn};

use crate::grammar::{Bodies, Grammar, NonterminalId, Origin, Symbol, TerminalId};

// Replaces every terminal inside a body of two or more symbols by a
// nonterminal that derives just that terminal. One such nonterminal is made
// per terminal and shared by every body.
fn isolate_terminals(grammar: &mut Grammar) {
    let mut isolated: HashMap<TerminalId, NonterminalId> = HashMap::new();

    for head in grammar.productions.keys().copied().collect_vec() {
        let mut rewritten = Bodies::new();
        for body in grammar.take_bodies(head) {
            if body.len() < 2 {
                rewritten.insert(body);
                continue;
            }

            let body = body
                .into_iter()
                .map(|symbol| match symbol {
                    Symbol::Terminal(t) => Symbol::Nonterminal(
                        *isolated
                            .entry(t)
                            .or_insert_with(|| grammar.fresh_nonterminal(Origin::TerminalIsolation(t))),
                    ),
                    other => other,
                })
                .collect();
            rewritten.insert(body);
        }
        grammar.productions.insert(head, rewritten);
    }

    for (&t, &id) in &isolated {
        debug!("{} stands for terminal {}", grammar.nonterminal_name(id), grammar.terminal_name(t));
        grammar.add_production(id, vec![Symbol::Terminal(t)]);
    }
}

// Splits bodies longer than two symbols by repeatedly folding their first two
// symbols into an auxiliary nonterminal. The same ordered pair always folds
// into the same auxiliary.
fn binarize(grammar: &mut Grammar) {
    let mut pairs: HashMap<(Symbol, Symbol), NonterminalId> = HashMap::new();

    for head in grammar.productions.keys().copied().collect_vec() {
        let mut rewritten = Bodies::new();
        for mut body in grammar.take_bodies(head) {
            while body.len() > 2 {
                let pair = (body[0], body[1]);
                let aux = match pairs.get(&pair) {
                    Some(&aux) => aux,
                    None => {
                        let aux = grammar.fresh_nonterminal(Origin::Pair(pair.0, pair.1));
                        grammar.add_production(aux, vec![pair.0, pair.1]);
                        debug!(
                            "{} stands for {} {}",
                            grammar.nonterminal_name(aux),
                            grammar.symbol_name(&pair.0),
                            grammar.symbol_name(&pair.1)
                        );
                        pairs.insert(pair, aux);
                        aux
                    }
                };
                body.splice(0..2, [Symbol::Nonterminal(aux)]);
            }
            rewritten.insert(body);
        }
        grammar.productions.insert(head, rewritten);
    }
}

/// Converts a grammar without epsilon or unit productions (apart from
/// `start -> &`) to Chomsky normal form. Running it on a grammar that still
/// has them only logs a warning, and the result will not be in normal form.
pub fn to_cnf(mut grammar: Grammar) -> Grammar {
    if grammar.epsilon_heads().iter().any(|&head| head != grammar.start) {
        warn!("Converting to Chomsky normal form with epsilon productions left in the grammar");
    }
    if grammar.has_unit_productions() {
        warn!("Converting to Chomsky normal form with unit productions left in the grammar");
    }

    isolate_terminals(&mut grammar);
    binarize(&mut grammar);
    grammar.recompute_terminals();

    info!(
        "Chomsky normal form has {} nonterminals and {} productions",
        grammar.nonterminals.len(),
        grammar.production_count()
    );
    grammar
}
