use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::Err;
use crate::rules::{NtId, Parent, Rhs, Rule};
use crate::utils::is_close;

/// Relative tolerance for the per-symbol probability sum
pub const PROB_SUM_TOLERANCE: f64 = 1e-9;

/// An immutable probabilistic grammar in Chomsky Normal Form, indexed for
/// the lookups the chart parsers need.
#[derive(Debug)]
pub struct Grammar {
  start: String,
  rules: Vec<Rule>,
  /// NtId -> name
  nonterminals: Vec<String>,
  nt_ids: HashMap<String, NtId>,
  /// rule indices, grouped by right-hand side and by left-hand side
  rhs_to_rules: HashMap<Rhs, Vec<usize>>,
  lhs_to_rules: HashMap<String, Vec<usize>>,
  /// hot-loop lookups keyed by terminal and by nonterminal pair
  lexicon: HashMap<String, Vec<Parent>>,
  binary: HashMap<(NtId, NtId), Vec<Parent>>,
}

impl Grammar {
  /// Builds the lookup indices. Every rule's lhs and every symbol of a
  /// binary rhs is a nonterminal; ids are assigned in order of appearance.
  pub fn new(start: String, rules: Vec<Rule>) -> Self {
    let mut nonterminals = Vec::new();
    let mut nt_ids = HashMap::new();
    let mut intern = |name: &str| -> NtId {
      *nt_ids.entry(name.to_string()).or_insert_with(|| {
        nonterminals.push(name.to_string());
        NtId((nonterminals.len() - 1) as u32)
      })
    };

    intern(start.as_str());

    let mut rhs_to_rules: HashMap<Rhs, Vec<usize>> = HashMap::new();
    let mut lhs_to_rules: HashMap<String, Vec<usize>> = HashMap::new();
    let mut lexicon: HashMap<String, Vec<Parent>> = HashMap::new();
    let mut binary: HashMap<(NtId, NtId), Vec<Parent>> = HashMap::new();

    for (idx, rule) in rules.iter().enumerate() {
      let parent = Parent {
        lhs: intern(rule.symbol_str()),
        prob: rule.prob,
      };

      match &rule.rhs {
        Rhs::Terminal(w) => lexicon.entry(w.clone()).or_default().push(parent),
        Rhs::Binary(l, r) => {
          let key = (intern(l.name.as_str()), intern(r.name.as_str()));
          binary.entry(key).or_default().push(parent);
        }
      }

      rhs_to_rules.entry(rule.rhs.clone()).or_default().push(idx);
      lhs_to_rules
        .entry(rule.symbol.name.clone())
        .or_default()
        .push(idx);
    }

    Self {
      start,
      rules,
      nonterminals,
      nt_ids,
      rhs_to_rules,
      lhs_to_rules,
      lexicon,
      binary,
    }
  }

  pub fn read_from_file<P: AsRef<Path>>(filename: P) -> Result<Self, Err> {
    let filename = filename.as_ref();
    let src = fs::read_to_string(filename)
      .map_err(|e| -> Err { format!("reading {}: {}", filename.display(), e).into() })?;
    src.parse()
  }

  pub fn start(&self) -> &str {
    &self.start
  }

  pub fn start_id(&self) -> NtId {
    // interned first in new()
    NtId(0)
  }

  pub fn rules(&self) -> &[Rule] {
    &self.rules
  }

  pub fn nonterminal_count(&self) -> usize {
    self.nonterminals.len()
  }

  pub fn nonterminal(&self, id: NtId) -> &str {
    &self.nonterminals[id.index()]
  }

  pub fn nt_id(&self, name: &str) -> Option<NtId> {
    self.nt_ids.get(name).copied()
  }

  /// Rules of the form `A -> terminal`, in file order
  pub fn lexical(&self, terminal: &str) -> &[Parent] {
    self.lexicon.get(terminal).map(Vec::as_slice).unwrap_or_default()
  }

  /// Rules of the form `A -> left right`, in file order
  pub fn binary(&self, left: NtId, right: NtId) -> &[Parent] {
    self.binary.get(&(left, right)).map(Vec::as_slice).unwrap_or_default()
  }

  pub fn rules_for_rhs(&self, rhs: &Rhs) -> Vec<&Rule> {
    self.indexed(self.rhs_to_rules.get(rhs))
  }

  pub fn rules_for_lhs(&self, symbol: &str) -> Vec<&Rule> {
    self.indexed(self.lhs_to_rules.get(symbol))
  }

  fn indexed(&self, idxs: Option<&Vec<usize>>) -> Vec<&Rule> {
    idxs
      .map(|idxs| idxs.iter().map(|&idx| &self.rules[idx]).collect())
      .unwrap_or_default()
  }

  fn is_defined(&self, symbol: &str) -> bool {
    self.lhs_to_rules.contains_key(symbol)
  }

  /// Checks that this is a PCFG in Chomsky Normal Form: binary rules only
  /// name symbols that have rules of their own, lexical rules never name
  /// such a symbol, every probability is in (0, 1], and the rules for each
  /// symbol sum to 1. Reports the first problem found.
  pub fn verify(&self) -> Result<(), Err> {
    if !self.is_defined(&self.start) {
      return Err(format!("start symbol {} has no rules", self.start).into());
    }

    for rule in self.rules.iter() {
      let proper = match &rule.rhs {
        Rhs::Binary(l, r) => self.is_defined(&l.name) && self.is_defined(&r.name),
        Rhs::Terminal(w) => !self.is_defined(w),
      };
      if !proper {
        return Err(format!("improper form: {}", rule).into());
      }
      if !(rule.prob > 0.0 && rule.prob <= 1.0) {
        return Err(format!("probability out of range: {}", rule).into());
      }
    }

    // walk lhs symbols in first-appearance order so errors are stable
    for symbol in self.nonterminals.iter().filter(|s| self.is_defined(s)) {
      let sum = self
        .rules_for_lhs(symbol)
        .iter()
        .map(|rule| rule.prob)
        .sum::<f64>();
      if !is_close(sum, 1.0, PROB_SUM_TOLERANCE) {
        return Err(format!("probabilities for {} sum to {}, not 1", symbol, sum).into());
      }
    }

    Ok(())
  }
}

impl fmt::Display for Grammar {
  /// Writes the grammar back out in the format `parse_grammar` reads
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{};1.0", self.start)?;
    for rule in self.rules.iter() {
      writeln!(f, "{}", rule)?;
    }
    Ok(())
  }
}
