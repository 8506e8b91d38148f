/*
    This module generates random sentences from a grammar
*/

use rand::prelude::*;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::PathBuf;

use crate::error_handling::*;
use crate::grammar::*;

#[derive(Debug, PartialEq)]
pub enum GenerateErrorType {
    // A nonterminal was used that has no bodies
    UndefinedNonterminal(String),
    // A nonterminal has no derivation that ends in terminals only
    NoTermination(String),
}

impl ErrorType for GenerateErrorType {}

impl Display for GenerateErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateErrorType::UndefinedNonterminal(nonterminal) => write!(f, "No definition for nonterminal `{}`", nonterminal),
            GenerateErrorType::NoTermination(nonterminal) => write!(f, "Nonterminal `{}` never derives a sentence", nonterminal),
        }
    }
}

pub type GenerateError = Error<GenerateErrorType>;
pub type GenResult = Result<Vec<String>, GenerateError>;

// Height of the shortest derivation tree a body starts, if it has a finite one
fn body_height(body: &[Symbol], finishing: &BTreeMap<NonterminalId, (usize, &Body)>) -> Option<usize> {
    body.iter()
        .try_fold(0, |height, symbol| match symbol {
            Symbol::Nonterminal(id) => finishing.get(id).map(|(h, _)| height.max(*h)),
            Symbol::Terminal(_) | Symbol::Epsilon => Some(height),
        })
        .map(|height| height + 1)
}

// For every nonterminal with a finite derivation, the body that finishes it
// with the shallowest tree
fn finishing_bodies(grammar: &Grammar) -> BTreeMap<NonterminalId, (usize, &Body)> {
    let mut finishing = BTreeMap::new();
    loop {
        let next: BTreeMap<NonterminalId, (usize, &Body)> = grammar
            .productions
            .iter()
            .filter_map(|(head, bodies)| {
                bodies
                    .iter()
                    .filter_map(|body| body_height(body, &finishing).map(|height| (height, body)))
                    .min_by_key(|(height, _)| *height)
                    .map(|best| (*head, best))
            })
            .collect();

        if next == finishing {
            return finishing;
        }
        finishing = next;
    }
}

struct Generator<'a, R: Rng> {
    grammar: &'a Grammar,
    finishing: BTreeMap<NonterminalId, (usize, &'a Body)>,
    max_depth: usize,
    rng: &'a mut R,
    location: Location,
}

impl<R: Rng> Generator<'_, R> {
    fn error(&self, error: GenerateErrorType) -> GenerateError {
        GenerateError {
            location: self.location.clone(),
            error,
        }
    }

    fn generate_nonterminal(&mut self, nonterminal: NonterminalId, depth: usize, sentence: &mut Vec<String>) -> Result<(), GenerateError> {
        let grammar = self.grammar;
        let name = grammar.nonterminal_name(nonterminal);

        let bodies = grammar
            .productions
            .get(&nonterminal)
            .filter(|bodies| !bodies.is_empty())
            .ok_or_else(|| self.error(GenerateErrorType::UndefinedNonterminal(name.to_string())))?;

        // Past the depth limit only the quickest way out is taken
        let body = if depth < self.max_depth {
            bodies.iter().choose(&mut *self.rng)
        } else {
            self.finishing.get(&nonterminal).map(|(_, body)| *body)
        }
        .ok_or_else(|| self.error(GenerateErrorType::NoTermination(name.to_string())))?;

        for symbol in body {
            match symbol {
                Symbol::Terminal(t) => sentence.push(grammar.terminal_name(*t).to_string()),
                Symbol::Nonterminal(n) => self.generate_nonterminal(*n, depth + 1, sentence)?,
                Symbol::Epsilon => {}
            }
        }

        Ok(())
    }
}

/// Derives a random sentence from the start symbol. Below `max_depth` every
/// body is equally likely. Deeper down each nonterminal takes its shallowest
/// finishing body, so generation always stops.
pub fn generate<R: Rng>(grammar: &Grammar, rng: &mut R, max_depth: usize, file: PathBuf) -> GenResult {
    let mut generator = Generator {
        grammar,
        finishing: finishing_bodies(grammar),
        max_depth,
        rng,
        location: Location::whole_file(file),
    };

    let mut sentence = Vec::new();
    generator.generate_nonterminal(grammar.start, 0, &mut sentence)?;
    Ok(sentence)
}
