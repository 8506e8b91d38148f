use std::collections::HashMap;

use super::{NonterminalId, Symbol, TerminalId};

// Where a nonterminal came from. Generated nonterminals keep the relationship
// to the symbols they stand for here instead of encoding it in their names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    // Written in the grammar source
    Declared,
    // Fresh start symbol added when the old start symbol was nullable
    NewStart,
    // Stands for a single terminal inside a longer body
    TerminalIsolation(TerminalId),
    // Stands for an ordered pair of symbols split off a long body
    Pair(Symbol, Symbol),
    // Tail nonterminal introduced to remove left recursion from the head
    LeftRecursion(NonterminalId),
}

#[derive(Debug, Clone, PartialEq)]
struct NonterminalEntry {
    name: String,
    origin: Origin,
}

/// Name tables for one grammar. Ids are never reused, so a symbol keeps its
/// id (and name) through every stage of a normalization run even after it
/// stops being used.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SymbolTable {
    terminals: Vec<String>,
    nonterminals: Vec<NonterminalEntry>,
    by_name: HashMap<String, Symbol>,
    counter: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a terminal, returning the existing id if the name is already
    /// a terminal and `None` if it is taken by a nonterminal.
    pub fn insert_terminal(&mut self, name: &str) -> Option<TerminalId> {
        match self.by_name.get(name) {
            Some(Symbol::Terminal(id)) => Some(*id),
            Some(_) => None,
            None => {
                let id = self.terminals.len() as TerminalId;
                self.terminals.push(name.to_string());
                self.by_name.insert(name.to_string(), Symbol::Terminal(id));
                Some(id)
            }
        }
    }

    /// Registers a declared nonterminal, returning the existing id if the name
    /// is already a nonterminal and `None` if it is taken by a terminal.
    pub fn insert_nonterminal(&mut self, name: &str) -> Option<NonterminalId> {
        match self.by_name.get(name) {
            Some(Symbol::Nonterminal(id)) => Some(*id),
            Some(_) => None,
            None => Some(self.push_nonterminal(name.to_string(), Origin::Declared)),
        }
    }

    fn push_nonterminal(&mut self, name: String, origin: Origin) -> NonterminalId {
        let id = self.nonterminals.len() as NonterminalId;
        self.by_name.insert(name.clone(), Symbol::Nonterminal(id));
        self.nonterminals.push(NonterminalEntry { name, origin });
        id
    }

    fn next_count(&mut self) -> usize {
        self.counter += 1;
        self.counter
    }

    /// Creates a nonterminal whose name collides with nothing registered so
    /// far. The preferred name depends on the origin; on a collision it gets
    /// a numeric suffix from the table's counter until it is unique.
    pub fn fresh_nonterminal(&mut self, origin: Origin) -> NonterminalId {
        let base = match &origin {
            Origin::Declared => format!("N{}", self.next_count()),
            Origin::NewStart => "S0".to_string(),
            Origin::TerminalIsolation(t) => format!("T_{}", self.terminal_name(*t)),
            Origin::Pair(..) => format!("X{}", self.next_count()),
            Origin::LeftRecursion(a) => format!("Z_{}", self.nonterminal_name(*a)),
        };

        let mut name = base.clone();
        while self.by_name.contains_key(&name) {
            name = format!("{}_{}", base, self.next_count());
        }

        self.push_nonterminal(name, origin)
    }

    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.by_name.get(name).copied()
    }

    pub fn terminal_name(&self, id: TerminalId) -> &str {
        &self.terminals[id as usize]
    }

    pub fn nonterminal_name(&self, id: NonterminalId) -> &str {
        &self.nonterminals[id as usize].name
    }

    pub fn origin(&self, id: NonterminalId) -> &Origin {
        &self.nonterminals[id as usize].origin
    }

    pub fn is_generated(&self, id: NonterminalId) -> bool {
        *self.origin(id) != Origin::Declared
    }
}
