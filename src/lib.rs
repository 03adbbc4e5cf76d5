#[macro_use]
extern crate lazy_static;

pub mod chart;
pub mod cky;
pub mod grammar;
pub mod grammars;
pub mod parse_grammar;
pub mod rules;
pub mod syntree;
pub mod utils;
pub mod viterbi;

use tracing::debug;

pub use crate::grammar::Grammar;
pub use crate::syntree::{ParseTree, SynTree, get_tree};
pub use crate::utils::Err;
pub use crate::viterbi::{Backpointer, BackpointerTable, LogProbTable, Scoring, ViterbiChart};

/// Probabilistic CKY parsing against one grammar.
#[derive(Debug, Clone, Copy)]
pub struct CkyParser<'g> {
  grammar: &'g Grammar,
  scoring: Scoring,
}

impl<'g> CkyParser<'g> {
  pub fn new(grammar: &'g Grammar) -> Self {
    Self {
      grammar,
      scoring: Scoring::default(),
    }
  }

  pub fn with_scoring(self, scoring: Scoring) -> Self {
    Self { scoring, ..self }
  }

  pub fn grammar(&self) -> &'g Grammar {
    self.grammar
  }

  pub fn scoring(&self) -> Scoring {
    self.scoring
  }

  pub fn is_in_language(&self, input: &[&str]) -> bool {
    cky::recognize(self.grammar, input)
  }

  /// The filled Viterbi chart, or None if the input isn't in the language
  pub fn chart(&self, input: &[&str]) -> Option<ViterbiChart<'g>> {
    if !self.is_in_language(input) {
      return None;
    }
    Some(ViterbiChart::fill(self.grammar, input, self.scoring))
  }

  /// Backpointer and log-probability tables for the input. Both are empty if
  /// the input isn't in the language.
  pub fn parse_with_backpointers(&self, input: &[&str]) -> (BackpointerTable, LogProbTable) {
    match self.chart(input) {
      Some(chart) => (chart.backpointers(), chart.log_probs()),
      None => (BackpointerTable::new(), LogProbTable::new()),
    }
  }

  /// The best tree for the whole input from the start symbol, with its
  /// log-probability under the configured scoring
  pub fn best_parse(&self, input: &[&str]) -> Option<(ParseTree, f64)> {
    let chart = self.chart(input)?;
    let log_prob = chart.best_log_prob()?;
    let tree = get_tree(&chart.backpointers(), 0, input.len(), self.grammar.start())
      .map_err(|e| debug!(error = %e, "best tree not rebuilt"))
      .ok()?;
    Some((tree, log_prob))
  }
}

impl Grammar {
  pub fn is_in_language(&self, input: &[&str]) -> bool {
    CkyParser::new(self).is_in_language(input)
  }

  pub fn parse(&self, input: &[&str]) -> Option<(ParseTree, f64)> {
    CkyParser::new(self).best_parse(input)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const FLIGHTS: &str = r#"
    TOP;1.0
    TOP -> NP VP ; 1.0
    NP -> flights ; 1.0
    VP -> leave ; 1.0
  "#;

  #[test]
  fn test_flights_leave() {
    let g: Grammar = FLIGHTS.parse().unwrap();
    let parser = CkyParser::new(&g);
    let input = ["flights", "leave"];

    assert!(parser.is_in_language(&input));
    let (table, probs) = parser.parse_with_backpointers(&input);
    assert!(table[&(0, 2)].contains_key("TOP"));
    assert_eq!(probs[&(0, 2)]["TOP"], 0.0);

    let tree = get_tree(&table, 0, 2, g.start()).unwrap();
    assert_eq!(tree.bracketed(), "(TOP (NP flights) (VP leave))");
  }

  #[test]
  fn test_leave_flights() {
    let g: Grammar = FLIGHTS.parse().unwrap();
    let parser = CkyParser::new(&g);
    let input = ["leave", "flights"];

    assert!(!parser.is_in_language(&input));
    let (table, probs) = parser.parse_with_backpointers(&input);
    assert!(table.is_empty());
    assert!(probs.is_empty());
    assert!(g.parse(&input).is_none());
  }

  #[test]
  fn test_unknown_and_empty_input() {
    let g: Grammar = FLIGHTS.parse().unwrap();
    for input in [&["flights", "depart"][..], &["paris"][..], &[][..]] {
      assert!(!g.is_in_language(input));
      assert_eq!(
        CkyParser::new(&g).parse_with_backpointers(input),
        (BackpointerTable::new(), LogProbTable::new())
      );
    }
  }

  #[test]
  fn test_scoring_builder() {
    let g: Grammar = FLIGHTS.parse().unwrap();
    let parser = CkyParser::new(&g);
    assert_eq!(parser.scoring(), Scoring::LocalRule);
    assert_eq!(parser.with_scoring(Scoring::Joint).scoring(), Scoring::Joint);

    let (tree, log_prob) = g.parse(&["flights", "leave"]).unwrap();
    assert_eq!(tree.leaves(), vec!["flights", "leave"]);
    assert_eq!(log_prob, 0.0);
  }
}
