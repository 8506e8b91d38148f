/*
    This module is for storing and manipulating grammars
*/

mod display;
mod symbols;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

pub use symbols::{Origin, SymbolTable};

pub type TerminalId = u32;
pub type NonterminalId = u32;

// The base unit in a production body
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Terminal(TerminalId),
    Nonterminal(NonterminalId),
    // Only ever appears alone, as the whole body
    Epsilon,
}

impl Symbol {
    pub fn is_nonterminal(&self) -> bool {
        matches!(self, Symbol::Nonterminal(_))
    }

    pub fn as_nonterminal(&self) -> Option<NonterminalId> {
        match self {
            Symbol::Nonterminal(id) => Some(*id),
            _ => None,
        }
    }
}

// The right-hand side of a single production
pub type Body = Vec<Symbol>;

// All bodies of one head
pub type Bodies = BTreeSet<Body>;

pub fn epsilon_body() -> Body {
    vec![Symbol::Epsilon]
}

pub fn is_epsilon(body: &[Symbol]) -> bool {
    body == [Symbol::Epsilon]
}

// The target of a unit production, if the body is one
pub fn unit_target(body: &[Symbol]) -> Option<NonterminalId> {
    match body {
        [Symbol::Nonterminal(id)] => Some(*id),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
    pub symbols: SymbolTable,
    pub nonterminals: BTreeSet<NonterminalId>,
    pub terminals: BTreeSet<TerminalId>,
    pub start: NonterminalId,
    pub productions: BTreeMap<NonterminalId, Bodies>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    // The start symbol is not one of the grammar's nonterminals
    StartNotNonterminal(String),
    // A head in the production map is not one of the grammar's nonterminals
    UnknownHead(String),
    // A body uses a symbol outside the terminal and nonterminal sets
    UnknownSymbol { head: String, symbol: String },
    // A body is an empty sequence instead of the epsilon marker
    EmptyBody(String),
    // The epsilon marker is mixed with other symbols
    MixedEpsilon(String),
}

impl Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvariantViolation::StartNotNonterminal(start) => write!(f, "Start symbol `{}` is not a nonterminal", start),
            InvariantViolation::UnknownHead(head) => write!(f, "Productions for `{}` which is not a nonterminal", head),
            InvariantViolation::UnknownSymbol { head, symbol } => write!(f, "A body of `{}` uses unknown symbol `{}`", head, symbol),
            InvariantViolation::EmptyBody(head) => write!(f, "`{}` has an empty body without the epsilon marker", head),
            InvariantViolation::MixedEpsilon(head) => write!(f, "A body of `{}` mixes epsilon with other symbols", head),
        }
    }
}

impl Grammar {
    /// Creates a grammar with no productions. The start symbol must already be
    /// registered in `symbols`.
    pub fn new(symbols: SymbolTable, start: NonterminalId) -> Self {
        Grammar {
            symbols,
            nonterminals: BTreeSet::from([start]),
            terminals: BTreeSet::new(),
            start,
            productions: BTreeMap::from([(start, Bodies::new())]),
        }
    }

    pub fn add_nonterminal(&mut self, id: NonterminalId) {
        self.nonterminals.insert(id);
        self.productions.entry(id).or_default();
    }

    pub fn add_production(&mut self, head: NonterminalId, body: Body) {
        self.add_nonterminal(head);
        self.productions.entry(head).or_default().insert(body);
    }

    /// Creates a nonterminal that is unique in this grammar and gives it an
    /// empty body set.
    pub fn fresh_nonterminal(&mut self, origin: Origin) -> NonterminalId {
        let id = self.symbols.fresh_nonterminal(origin);
        self.add_nonterminal(id);
        id
    }

    pub fn bodies(&self, head: NonterminalId) -> impl Iterator<Item = &Body> {
        self.productions.get(&head).into_iter().flatten()
    }

    // Removes the bodies of `head` so they can be rebuilt while the rest of
    // the grammar is still readable
    pub fn take_bodies(&mut self, head: NonterminalId) -> Bodies {
        self.productions.get_mut(&head).map(std::mem::take).unwrap_or_default()
    }

    pub fn production_count(&self) -> usize {
        self.productions.values().map(BTreeSet::len).sum()
    }

    pub fn nonterminal_name(&self, id: NonterminalId) -> &str {
        self.symbols.nonterminal_name(id)
    }

    pub fn terminal_name(&self, id: TerminalId) -> &str {
        self.symbols.terminal_name(id)
    }

    pub fn symbol_name(&self, symbol: &Symbol) -> &str {
        match symbol {
            Symbol::Terminal(id) => self.terminal_name(*id),
            Symbol::Nonterminal(id) => self.nonterminal_name(*id),
            Symbol::Epsilon => "&",
        }
    }

    /// Looks up a live nonterminal by name
    pub fn nonterminal(&self, name: &str) -> Option<NonterminalId> {
        self.symbols
            .lookup(name)
            .and_then(|symbol| symbol.as_nonterminal())
            .filter(|id| self.nonterminals.contains(id))
    }

    /// Terminals are the symbols used on right-hand sides that are not
    /// nonterminals, so this set can shrink when productions disappear.
    pub fn recompute_terminals(&mut self) {
        self.terminals = self
            .productions
            .values()
            .flatten()
            .flatten()
            .filter_map(|symbol| match symbol {
                Symbol::Terminal(id) => Some(*id),
                _ => None,
            })
            .collect();
    }

    /// Keeps only the given nonterminals, dropping every body that mentions
    /// one of the others.
    pub fn retain_nonterminals(&mut self, keep: &BTreeSet<NonterminalId>) {
        self.nonterminals.retain(|id| keep.contains(id));
        self.productions.retain(|head, _| keep.contains(head));
        for bodies in self.productions.values_mut() {
            bodies.retain(|body| {
                body.iter()
                    .filter_map(Symbol::as_nonterminal)
                    .all(|id| keep.contains(&id))
            });
        }
    }

    pub fn epsilon_heads(&self) -> BTreeSet<NonterminalId> {
        self.productions
            .iter()
            .filter(|(_, bodies)| bodies.iter().any(|body| is_epsilon(body)))
            .map(|(head, _)| *head)
            .collect()
    }

    pub fn has_unit_productions(&self) -> bool {
        self.productions.values().flatten().any(|body| unit_target(body).is_some())
    }

    pub fn start_on_right(&self) -> bool {
        self.productions.values().flatten().flatten().any(|symbol| *symbol == Symbol::Nonterminal(self.start))
    }

    /// Every body is one terminal or two nonterminals. `start -> &` is allowed
    /// as long as the start symbol appears in no body.
    pub fn is_cnf(&self) -> bool {
        let start_on_right = self.start_on_right();
        self.productions.iter().all(|(head, bodies)| {
            bodies.iter().all(|body| match body.as_slice() {
                [Symbol::Terminal(_)] => true,
                [Symbol::Nonterminal(_), Symbol::Nonterminal(_)] => true,
                [Symbol::Epsilon] => *head == self.start && !start_on_right,
                _ => false,
            })
        })
    }

    /// Every body is a terminal followed by nonterminals, apart from `start -> &`
    pub fn is_gnf(&self) -> bool {
        self.productions.iter().all(|(head, bodies)| {
            bodies.iter().all(|body| match body.split_first() {
                Some((Symbol::Terminal(_), rest)) => rest.iter().all(Symbol::is_nonterminal),
                Some((Symbol::Epsilon, [])) => *head == self.start,
                _ => false,
            })
        })
    }

    /// Checks the structural invariants every stage has to preserve
    pub fn validate(&self) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();

        if !self.nonterminals.contains(&self.start) {
            violations.push(InvariantViolation::StartNotNonterminal(
                self.nonterminal_name(self.start).to_string(),
            ));
        }

        for (head, bodies) in &self.productions {
            let head_name = self.nonterminal_name(*head).to_string();
            if !self.nonterminals.contains(head) {
                violations.push(InvariantViolation::UnknownHead(head_name.clone()));
            }

            for body in bodies {
                if body.is_empty() {
                    violations.push(InvariantViolation::EmptyBody(head_name.clone()));
                } else if body.len() > 1 && body.contains(&Symbol::Epsilon) {
                    violations.push(InvariantViolation::MixedEpsilon(head_name.clone()));
                }

                let unknown = body.iter().filter(|symbol| match symbol {
                    Symbol::Terminal(id) => !self.terminals.contains(id),
                    Symbol::Nonterminal(id) => !self.nonterminals.contains(id),
                    Symbol::Epsilon => false,
                });
                for symbol in unknown {
                    violations.push(InvariantViolation::UnknownSymbol {
                        head: head_name.clone(),
                        symbol: self.symbol_name(symbol).to_string(),
                    });
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
