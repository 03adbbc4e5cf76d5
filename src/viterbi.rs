use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace};

use crate::chart::{Cell, Chart, EntryDisplay, Span};
use crate::grammar::Grammar;
use crate::rules::NtId;

/// How competing derivations of the same (span, nonterminal) are ranked.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Scoring {
  /// Rank by the probability of the rule that combines the two children,
  /// ignoring how likely the children themselves are. The stored
  /// log-probability is that of the rule alone.
  #[default]
  LocalRule,
  /// Standard Viterbi: rank by the probability of the whole derivation, and
  /// store its log-probability.
  Joint,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Derivation {
  /// Derived from the token under the span by a lexical rule
  Lexical,
  /// `left` over `i..k` followed by `right` over `k..j`
  Split { k: usize, left: NtId, right: NtId },
}

/// The single derivation kept for a nonterminal over a span
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Entry {
  pub derivation: Derivation,
  pub log_prob: f64,
}

impl EntryDisplay for Entry {
  fn fmt_entry(&self, g: &Grammar, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.derivation {
      Derivation::Lexical => write!(f, " (lexical)")?,
      Derivation::Split { k, left, right } => write!(
        f,
        " -> {} {} @ {}",
        g.nonterminal(left),
        g.nonterminal(right),
        k
      )?,
    }
    write!(f, " [{:.4}]", self.log_prob)
  }
}

/// One end of a binary backpointer: `symbol` derives `start..end`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Child {
  pub symbol: String,
  pub start: usize,
  pub end: usize,
}

impl Child {
  pub fn new(symbol: &str, start: usize, end: usize) -> Self {
    Self {
      symbol: symbol.to_string(),
      start,
      end,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Backpointer {
  Terminal(String),
  Split(Child, Child),
}

/// span -> nonterminal -> how its best derivation was built
pub type BackpointerTable = HashMap<Span, HashMap<String, Backpointer>>;

/// span -> nonterminal -> log-probability of its best derivation, always <= 0
pub type LogProbTable = HashMap<Span, HashMap<String, f64>>;

#[derive(Debug)]
pub struct ViterbiChart<'g> {
  grammar: &'g Grammar,
  tokens: Vec<String>,
  chart: Chart<Entry>,
}

impl<'g> ViterbiChart<'g> {
  /// Fills the chart bottom-up. Does not check membership first: a cell no
  /// derivation reaches is simply empty.
  pub fn fill(grammar: &'g Grammar, input: &[&str], scoring: Scoring) -> Self {
    debug!(len = input.len(), ?scoring, "filling viterbi chart");

    let mut chart = Chart::new(input.len());
    if !input.is_empty() {
      chart.open_width(1);
    }

    for (i, token) in input.iter().enumerate() {
      let mut cell = Cell::new();
      // a later rule with the same lhs replaces an earlier one
      for parent in grammar.lexical(token).iter().filter(|p| p.prob > 0.0) {
        let entry = Entry {
          derivation: Derivation::Lexical,
          log_prob: parent.prob.ln(),
        };
        cell.insert(parent.lhs, entry);
      }
      chart.fill(i, i + 1, cell);
    }

    for width in 2..=input.len() {
      chart.open_width(width);
      trace!(width, "combining spans");

      for (i, j) in chart.spans(width).collect::<Vec<_>>() {
        let cell = Self::combine(grammar, &chart, i, j, scoring);
        chart.fill(i, j, cell);
      }
    }

    Self {
      grammar,
      tokens: input.iter().map(|t| t.to_string()).collect(),
      chart,
    }
  }

  fn combine(
    grammar: &Grammar,
    chart: &Chart<Entry>,
    i: usize,
    j: usize,
    scoring: Scoring,
  ) -> Cell<Entry> {
    let mut cell: Cell<Entry> = Cell::new();

    for k in i + 1..j {
      let (left, right) = (chart.cell(i, k), chart.cell(k, j));
      for (a, a_entry) in left.iter() {
        for (b, b_entry) in right.iter() {
          for parent in grammar.binary(a, b) {
            let rule_log_prob = parent.prob.ln();
            let log_prob = match scoring {
              Scoring::LocalRule => rule_log_prob,
              Scoring::Joint => rule_log_prob + a_entry.log_prob + b_entry.log_prob,
            };

            // strictly better only: on a tie the first derivation found stays
            let best = cell.get(parent.lhs).map_or(f64::NEG_INFINITY, |e| e.log_prob);
            if log_prob > best {
              let entry = Entry {
                derivation: Derivation::Split { k, left: a, right: b },
                log_prob,
              };
              cell.insert(parent.lhs, entry);
            }
          }
        }
      }
    }

    cell
  }

  pub fn len(&self) -> usize {
    self.tokens.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn grammar(&self) -> &'g Grammar {
    self.grammar
  }

  pub fn entry(&self, i: usize, j: usize, nt: NtId) -> Option<&Entry> {
    self.chart.cell(i, j).get(nt)
  }

  /// Log-probability of the best parse of the whole input from the start
  /// symbol, if there is one
  pub fn best_log_prob(&self) -> Option<f64> {
    if self.is_empty() {
      return None;
    }
    self
      .entry(0, self.len(), self.grammar.start_id())
      .map(|e| e.log_prob)
  }

  pub fn backpointers(&self) -> BackpointerTable {
    self.table(|i, j, entry| match entry.derivation {
      Derivation::Lexical => Backpointer::Terminal(self.tokens[i].clone()),
      Derivation::Split { k, left, right } => Backpointer::Split(
        Child::new(self.grammar.nonterminal(left), i, k),
        Child::new(self.grammar.nonterminal(right), k, j),
      ),
    })
  }

  pub fn log_probs(&self) -> LogProbTable {
    self.table(|_, _, entry| entry.log_prob)
  }

  /// Every span gets a (possibly empty) inner map
  fn table<V>(
    &self,
    value: impl Fn(usize, usize, &Entry) -> V,
  ) -> HashMap<Span, HashMap<String, V>> {
    self
      .chart
      .iter()
      .map(|((i, j), cell)| {
        let inner = cell
          .iter()
          .map(|(nt, entry)| (self.grammar.nonterminal(nt).to_string(), value(i, j, entry)))
          .collect();
        ((i, j), inner)
      })
      .collect()
  }
}

impl fmt::Display for ViterbiChart<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.chart.display(self.grammar))
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

  // S over "a b c" is either A (B C) or (A B) C. The second uses the likelier
  // S rule but a much less likely X.
  const SPLITS: &str = r#"
    S;1.0
    S -> X C ; 0.6
    S -> A Y ; 0.4
    X -> A B ; 0.1
    X -> B B ; 0.9
    Y -> B C ; 1.0
    A -> a ; 1.0
    B -> b ; 1.0
    C -> c ; 1.0
  "#;

  fn split(table: &BackpointerTable, span: Span, nt: &str) -> (String, usize, String) {
    match &table[&span][nt] {
      Backpointer::Split(l, r) => {
        assert_eq!((l.start, r.end), span);
        assert_eq!(l.end, r.start);
        (l.symbol.clone(), l.end, r.symbol.clone())
      }
      other => panic!("expected a split at {:?}, got {:?}", span, other),
    }
  }

  #[test]
  fn test_flights_tables() {
    let g: Grammar = FLIGHTS.parse().unwrap();
    let chart = ViterbiChart::fill(&g, &["flights", "leave"], Scoring::LocalRule);
    let table = chart.backpointers();
    let probs = chart.log_probs();

    assert_eq!(table.len(), 3);
    assert_eq!(
      table[&(0, 1)]["NP"],
      Backpointer::Terminal("flights".to_string())
    );
    assert_eq!(
      table[&(0, 2)]["TOP"],
      Backpointer::Split(Child::new("NP", 0, 1), Child::new("VP", 1, 2))
    );
    assert_eq!(probs[&(0, 2)]["TOP"], 0.0);
    assert_eq!(chart.best_log_prob(), Some(0.0));
  }

  #[test]
  fn test_local_and_joint_scoring_disagree() {
    let g: Grammar = SPLITS.parse().unwrap();
    let input = ["a", "b", "c"];

    let local = ViterbiChart::fill(&g, &input, Scoring::LocalRule);
    assert_eq!(split(&local.backpointers(), (0, 3), "S"), ("X".to_string(), 2, "C".to_string()));
    assert!((local.log_probs()[&(0, 3)]["S"] - 0.6f64.ln()).abs() < 1e-12);

    let joint = ViterbiChart::fill(&g, &input, Scoring::Joint);
    assert_eq!(split(&joint.backpointers(), (0, 3), "S"), ("A".to_string(), 1, "Y".to_string()));
    assert!((joint.best_log_prob().unwrap() - 0.4f64.ln()).abs() < 1e-12);
    // X over "a b" is 0.1 either way
    assert!((joint.log_probs()[&(0, 2)]["X"] - 0.1f64.ln()).abs() < 1e-12);
  }

  #[test]
  fn test_ties_keep_first_split() {
    // not normalized, but every derivation then scores exactly 0
    let g: Grammar = r#"
      S;1.0
      S -> S S ; 1.0
      S -> x ; 1.0
    "#
    .parse()
    .unwrap();

    for scoring in [Scoring::LocalRule, Scoring::Joint] {
      let chart = ViterbiChart::fill(&g, &["x", "x", "x"], scoring);
      // both splits of 0..3 score the same, so k = 1 is kept
      assert_eq!(split(&chart.backpointers(), (0, 3), "S"), ("S".to_string(), 1, "S".to_string()));
    }
  }

  #[test]
  fn test_later_lexical_rule_overwrites() {
    let g: Grammar = r#"
      N;1.0
      N -> fish ; 0.3
      N -> fish ; 0.7
    "#
    .parse()
    .unwrap();

    let chart = ViterbiChart::fill(&g, &["fish"], Scoring::LocalRule);
    let probs = chart.log_probs();
    assert_eq!(probs[&(0, 1)].len(), 1);
    assert!((probs[&(0, 1)]["N"] - 0.7f64.ln()).abs() < 1e-12);
  }

  #[test]
  fn test_log_probs_are_never_positive() {
    let g: Grammar = SPLITS.parse().unwrap();
    for scoring in [Scoring::LocalRule, Scoring::Joint] {
      let probs = ViterbiChart::fill(&g, &["a", "b", "c"], scoring).log_probs();
      for (span, cell) in probs.iter() {
        for (nt, lp) in cell.iter() {
          assert!(*lp <= 0.0, "{} at {:?} has log prob {}", nt, span, lp);
        }
      }
    }
  }

  #[test]
  fn test_children_are_narrower() {
    let g: Grammar = SPLITS.parse().unwrap();
    let table = ViterbiChart::fill(&g, &["a", "b", "c"], Scoring::Joint).backpointers();
    for (&(i, j), cell) in table.iter() {
      for bp in cell.values() {
        match bp {
          Backpointer::Terminal(_) => assert_eq!(j - i, 1),
          Backpointer::Split(l, r) => {
            assert!(l.end - l.start < j - i && r.end - r.start < j - i);
            assert!(table[&(l.start, l.end)].contains_key(&l.symbol));
            assert!(table[&(r.start, r.end)].contains_key(&r.symbol));
          }
        }
      }
    }
  }

  #[test]
  fn test_chart_display() {
    let g: Grammar = FLIGHTS.parse().unwrap();
    let chart = ViterbiChart::fill(&g, &["flights", "leave"], Scoring::LocalRule);
    let s = chart.to_string();
    assert!(s.contains("Span 0..2:\n  TOP -> NP VP @ 1 [0.0000]"), "{}", s);
    assert!(s.contains("  NP (lexical)"), "{}", s);
  }
}
