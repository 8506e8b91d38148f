/*
    This module removes epsilon productions, unit productions and useless
    symbols from a grammar
*/

pub mod epsilon;
pub mod unit;
pub mod useless;

use crate::grammar::Grammar;
pub use useless::{Degeneracy, Usefulness};

/// Runs the three simplification stages in order, handing the grammar after
/// each one to `snapshot` along with a title for the stage
pub fn simplify_with_snapshots(grammar: Grammar, snapshot: &mut dyn FnMut(&str, &Grammar)) -> (Grammar, Usefulness) {
    let grammar = epsilon::remove_epsilon(grammar);
    snapshot("After epsilon-production removal", &grammar);

    let grammar = unit::remove_unit(grammar);
    snapshot("After unit-production removal", &grammar);

    let (grammar, usefulness) = useless::remove_useless(grammar);
    snapshot("After useless-symbol removal", &grammar);
    (grammar, usefulness)
}

#[cfg(test)]
pub fn simplify(grammar: Grammar) -> (Grammar, Usefulness) {
    simplify_with_snapshots(grammar, &mut |_: &str, _: &Grammar| {})
}
