use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};

use crate::grammar::{unit_target, Bodies, Grammar, NonterminalId};

/// For every nonterminal A, the nonterminals reachable from A through zero or
/// more unit productions. A is always in its own set.
pub fn unit_closure(grammar: &Grammar) -> BTreeMap<NonterminalId, BTreeSet<NonterminalId>> {
    let mut closure: BTreeMap<NonterminalId, BTreeSet<NonterminalId>> = grammar
        .nonterminals
        .iter()
        .map(|&id| (id, BTreeSet::from([id])))
        .collect();

    loop {
        let next: BTreeMap<NonterminalId, BTreeSet<NonterminalId>> = closure
            .iter()
            .map(|(&head, reached)| {
                let grown = reached
                    .iter()
                    .flat_map(|&id| grammar.bodies(id).filter_map(|body| unit_target(body)))
                    .chain(reached.iter().copied())
                    .collect();
                (head, grown)
            })
            .collect();

        if next == closure {
            return closure;
        }
        closure = next;
    }
}

/// Replaces unit productions `A -> B` by the non-unit bodies of everything A
/// reaches through them.
pub fn remove_unit(mut grammar: Grammar) -> Grammar {
    let closure = unit_closure(&grammar);

    let productions: BTreeMap<NonterminalId, Bodies> = closure
        .iter()
        .map(|(&head, reached)| {
            let bodies = reached
                .iter()
                .flat_map(|&id| grammar.bodies(id))
                .filter(|body| unit_target(body).is_none())
                .cloned()
                .collect();
            (head, bodies)
        })
        .collect();

    for (head, reached) in &closure {
        if reached.len() > 1 {
            debug!(
                "{} absorbs the bodies of {}",
                grammar.nonterminal_name(*head),
                reached.iter().filter(|id| *id != head).map(|&id| grammar.nonterminal_name(id)).collect::<Vec<_>>().join(", ")
            );
        }
    }

    grammar.productions = productions;
    grammar.recompute_terminals();
    info!("Unit productions removed, {} productions remain", grammar.production_count());
    grammar
}
