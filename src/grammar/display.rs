use std::fmt::Display;

use itertools::Itertools;

use super::{Grammar, NonterminalId, Symbol};

impl Grammar {
    pub fn render_body(&self, body: &[Symbol]) -> String {
        body.iter().map(|symbol| self.symbol_name(symbol)).join(" ")
    }

    // Bodies of a head rendered and sorted, the way snapshots print them
    pub fn rendered_bodies(&self, head: NonterminalId) -> Vec<String> {
        self.bodies(head).map(|body| self.render_body(body)).sorted().collect()
    }

    // Heads in snapshot order: start first, the rest by name
    fn display_order(&self) -> Vec<NonterminalId> {
        let rest = self
            .nonterminals
            .iter()
            .filter(|&&id| id != self.start)
            .sorted_by_key(|&&id| self.nonterminal_name(id));
        std::iter::once(&self.start)
            .chain(rest)
            .filter(|&&id| self.nonterminals.contains(&id))
            .copied()
            .collect()
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let nonterminals = self.nonterminals.iter().map(|&id| self.nonterminal_name(id)).sorted();
        let terminals = self.terminals.iter().map(|&id| self.terminal_name(id)).sorted();

        writeln!(f, "Nonterminals: {}", nonterminals.format(", "))?;
        writeln!(f, "Terminals: {}", terminals.format(", "))?;
        writeln!(f, "Start: {}", self.nonterminal_name(self.start))?;
        writeln!(f, "Productions:")?;

        for head in self.display_order() {
            let bodies = self.rendered_bodies(head);
            if bodies.is_empty() {
                writeln!(f, "  {} ->", self.nonterminal_name(head))?;
            } else {
                writeln!(f, "  {} -> {}", self.nonterminal_name(head), bodies.join(" | "))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::{epsilon_body, Grammar, Symbol, SymbolTable};

    #[test]
    fn snapshot_text_is_sorted_with_start_first() {
        let mut symbols = SymbolTable::new();
        let s = symbols.insert_nonterminal("S").unwrap();
        let b = symbols.insert_nonterminal("B").unwrap();
        let a = symbols.insert_nonterminal("A").unwrap();
        let c = symbols.insert_nonterminal("C").unwrap();
        let x = symbols.insert_terminal("x").unwrap();
        let y = symbols.insert_terminal("y").unwrap();

        let mut grammar = Grammar::new(symbols, s);
        grammar.add_production(s, vec![Symbol::Nonterminal(b), Symbol::Nonterminal(a)]);
        grammar.add_production(s, vec![Symbol::Nonterminal(a), Symbol::Terminal(y)]);
        grammar.add_production(s, epsilon_body());
        grammar.add_production(b, vec![Symbol::Terminal(y)]);
        grammar.add_production(a, vec![Symbol::Terminal(x)]);
        grammar.add_nonterminal(c);
        grammar.recompute_terminals();

        assert_eq!(grammar.to_string(), "\
Nonterminals: A, B, C, S
Terminals: x, y
Start: S
Productions:
  S -> & | A y | B A
  A -> x
  B -> y
  C ->
");
    }
}
