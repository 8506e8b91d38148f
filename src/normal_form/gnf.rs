use std::collections::HashMap;
use std::iter::once;

use itertools::Itertools;
use log::{debug, info, warn};

use crate::grammar::{epsilon_body, is_epsilon, Body, Bodies, Grammar, NonterminalId, Origin, Symbol};
use crate::simplify::useless::{remove_useless, Usefulness};

pub const ORDERED_SNAPSHOT_TITLE: &str = "After ordered substitution and left-recursion elimination";

// Start symbol first, the rest by name
fn nonterminal_order(grammar: &Grammar) -> Vec<NonterminalId> {
    let rest = grammar
        .nonterminals
        .iter()
        .copied()
        .filter(|&id| id != grammar.start)
        .sorted_by_key(|&id| grammar.nonterminal_name(id));
    once(grammar.start).chain(rest).collect()
}

/// Rewrites every body of `head` that starts with a nonterminal picked by
/// `expand` into that nonterminal's bodies followed by the rest of the body,
/// until no body starts with such a nonterminal. Left recursion on `head` is
/// never expanded.
///
/// An epsilon body of the expanded nonterminal contributes only the rest of the
/// body. If there is no rest the empty string is kept for the start symbol and
/// dropped everywhere else.
fn substitute_leading(grammar: &mut Grammar, head: NonterminalId, expand: impl Fn(NonterminalId) -> bool) {
    loop {
        let mut changed = false;
        let mut rewritten = Bodies::new();

        for body in grammar.take_bodies(head) {
            let lead = match body.first() {
                Some(Symbol::Nonterminal(lead)) if *lead != head && expand(*lead) => *lead,
                _ => {
                    rewritten.insert(body);
                    continue;
                }
            };

            changed = true;
            let rest = &body[1..];
            for expansion in grammar.bodies(lead) {
                if !is_epsilon(expansion) {
                    rewritten.insert(expansion.iter().chain(rest).copied().collect());
                } else if !rest.is_empty() {
                    rewritten.insert(rest.to_vec());
                } else if head == grammar.start {
                    rewritten.insert(epsilon_body());
                }
            }
        }

        grammar.productions.insert(head, rewritten);
        if !changed {
            return;
        }
    }
}

/// Replaces `A -> A a | b` by `A -> b | b Z` and `Z -> a | a Z`, returning Z.
/// Bodies `A -> A` carry nothing and are dropped.
fn eliminate_left_recursion(grammar: &mut Grammar, head: NonterminalId) -> Option<NonterminalId> {
    let (recursive, others): (Vec<Body>, Vec<Body>) = grammar
        .take_bodies(head)
        .into_iter()
        .partition(|body| body.first() == Some(&Symbol::Nonterminal(head)));

    let tails = recursive.into_iter().map(|body| body[1..].to_vec()).filter(|alpha| !alpha.is_empty()).collect_vec();
    if tails.is_empty() {
        grammar.productions.insert(head, others.into_iter().collect());
        return None;
    }

    let tail = grammar.fresh_nonterminal(Origin::LeftRecursion(head));
    debug!(
        "{} takes over the left recursion of {}",
        grammar.nonterminal_name(tail),
        grammar.nonterminal_name(head)
    );

    for beta in others {
        let followed = if is_epsilon(&beta) {
            vec![Symbol::Nonterminal(tail)]
        } else {
            beta.iter().copied().chain(once(Symbol::Nonterminal(tail))).collect()
        };
        grammar.add_production(head, beta);
        grammar.add_production(head, followed);
    }
    for alpha in tails {
        let followed = alpha.iter().copied().chain(once(Symbol::Nonterminal(tail))).collect();
        grammar.add_production(tail, alpha);
        grammar.add_production(tail, followed);
    }

    Some(tail)
}

#[cfg(test)]
pub fn to_gnf(grammar: Grammar) -> Grammar {
    to_gnf_with_snapshots(grammar, &mut |_: &str, _: &Grammar| {})
}

/// Converts a grammar in Chomsky normal form to Greibach normal form.
///
/// The nonterminals are ordered start first. Each one in turn has the bodies
/// led by an earlier nonterminal expanded and its left recursion moved into a
/// tail nonterminal, which leaves every body led by a terminal or a later
/// nonterminal. Walking the order backwards then expands the remaining leads,
/// and the tails are expanded last. The grammar after the first pass is handed
/// to `snapshot`.
///
/// Panics if the grammar is not in Chomsky normal form.
pub fn to_gnf_with_snapshots(mut grammar: Grammar, snapshot: &mut dyn FnMut(&str, &Grammar)) -> Grammar {
    assert!(grammar.is_cnf(), "Greibach normal form conversion needs a grammar in Chomsky normal form");

    let order = nonterminal_order(&grammar);
    let rank: HashMap<NonterminalId, usize> = order.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    let mut tails = Vec::new();

    for (i, &head) in order.iter().enumerate() {
        substitute_leading(&mut grammar, head, |lead| rank.get(&lead).is_some_and(|&j| j < i));
        tails.extend(eliminate_left_recursion(&mut grammar, head));
    }
    snapshot(ORDERED_SNAPSHOT_TITLE, &grammar);

    for &head in order.iter().rev().chain(&tails) {
        substitute_leading(&mut grammar, head, |_| true);
    }

    grammar.recompute_terminals();
    let (grammar, usefulness) = remove_useless(grammar);
    if let Usefulness::Degenerate(degeneracy) = usefulness {
        warn!("Greibach normal form cleanup skipped: {}", degeneracy);
    }

    info!(
        "Greibach normal form has {} nonterminals and {} productions",
        grammar.nonterminals.len(),
        grammar.production_count()
    );
    grammar
}
