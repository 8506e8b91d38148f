/*
    This module runs the normalization stages in order and keeps a copy of the
    grammar after each one
*/

use std::path::Path;

use clap::ValueEnum;
use itertools::Itertools;
use log::{info, warn};

use crate::grammar::Grammar;
use crate::normal_form::{to_cnf, to_gnf_with_snapshots};
use crate::simplify::{simplify_with_snapshots, Degeneracy, Usefulness};

// How far down the pipeline to go
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Remove epsilon productions, unit productions and useless symbols
    Simplify,
    /// Simplify, then convert to Chomsky normal form
    Cnf,
    /// Simplify, convert to Chomsky normal form, then to Greibach normal form
    Gnf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub title: String,
    pub grammar: Grammar,
}

impl Snapshot {
    fn new(title: &str, grammar: &Grammar) -> Self {
        debug_assert_eq!(grammar.validate(), Ok(()), "{} broke the grammar invariants", title);
        Snapshot {
            title: title.to_string(),
            grammar: grammar.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalization {
    pub grammar: Grammar,
    pub snapshots: Vec<Snapshot>,
    // Set when useless-symbol removal found the language empty and left the
    // grammar alone
    pub degeneracy: Option<Degeneracy>,
}

impl Normalization {
    /// The audit log: every snapshot under a banner with its title
    pub fn render(&self) -> String {
        let banners = self
            .snapshots
            .iter()
            .map(|snapshot| format!("=== {} ===\n{}\n", snapshot.title, snapshot.grammar));
        let note = self
            .degeneracy
            .map(|degeneracy| format!("Note: {}, useless symbols were not removed\n", degeneracy));
        banners.chain(note).join("")
    }

    pub fn write_log(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.render())
    }
}

pub fn run(grammar: Grammar, mode: Mode) -> Normalization {
    let mut snapshots = vec![Snapshot::new("Original grammar", &grammar)];

    let (grammar, usefulness) = simplify_with_snapshots(grammar, &mut |title: &str, grammar: &Grammar| {
        snapshots.push(Snapshot::new(title, grammar))
    });
    let degeneracy = match usefulness {
        Usefulness::Pruned => None,
        Usefulness::Degenerate(degeneracy) => Some(degeneracy),
    };

    let grammar = if mode == Mode::Simplify {
        grammar
    } else {
        let grammar = to_cnf(grammar);
        snapshots.push(Snapshot::new("Chomsky normal form", &grammar));

        if mode == Mode::Cnf {
            grammar
        } else {
            let grammar = to_gnf_with_snapshots(grammar, &mut |title: &str, grammar: &Grammar| {
                snapshots.push(Snapshot::new(title, grammar))
            });
            snapshots.push(Snapshot::new("Greibach normal form", &grammar));
            if !grammar.is_gnf() {
                warn!("The result is not in Greibach normal form");
            }
            grammar
        }
    };

    info!(
        "Pipeline finished after {} snapshots with {} generated nonterminals",
        snapshots.len(),
        grammar.nonterminals.iter().filter(|&&id| grammar.symbols.is_generated(id)).count()
    );
    Normalization {
        grammar,
        snapshots,
        degeneracy,
    }
}
