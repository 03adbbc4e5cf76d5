use std::fmt;

/// Dense index of a nonterminal in a grammar's vocabulary
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NtId(pub u32);

impl NtId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
  pub name: String,
}

impl Symbol {
  pub fn new(name: String) -> Self {
    Self { name }
  }
}

impl fmt::Display for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

/// Right-hand side of a rule in Chomsky Normal Form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rhs {
  /// A -> w
  Terminal(String),
  /// A -> B C
  Binary(Symbol, Symbol),
}

impl Rhs {
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Terminal(_))
  }

  pub fn is_binary(&self) -> bool {
    matches!(self, Self::Binary(_, _))
  }

  pub fn arity(&self) -> usize {
    match self {
      Self::Terminal(_) => 1,
      Self::Binary(_, _) => 2,
    }
  }
}

impl fmt::Display for Rhs {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Terminal(w) => write!(f, "{}", w),
      Self::Binary(l, r) => write!(f, "{} {}", l, r),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
  pub symbol: Symbol,
  pub rhs: Rhs,
  pub prob: f64,
}

impl Rule {
  pub fn new(symbol: &str, rhs: Rhs, prob: f64) -> Self {
    Self {
      symbol: Symbol::new(symbol.to_string()),
      rhs,
      prob,
    }
  }

  pub fn is_lexical(&self) -> bool {
    self.rhs.is_terminal()
  }

  pub fn symbol_str(&self) -> &str {
    &self.symbol.name
  }
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} -> {} ; {}", self.symbol, self.rhs, self.prob)
  }
}

/// What a right-hand-side lookup hands back: the rule's left-hand side and
/// its probability.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Parent {
  pub lhs: NtId,
  pub prob: f64,
}

#[test]
fn test_rule_shapes() {
  let lexical = Rule::new("NP", Rhs::Terminal("flights".into()), 0.25);
  let binary = Rule::new(
    "TOP",
    Rhs::Binary(Symbol::new("NP".into()), Symbol::new("VP".into())),
    1.0,
  );

  assert!(lexical.is_lexical() && lexical.rhs.is_terminal());
  assert!(!binary.is_lexical() && binary.rhs.is_binary());
  assert_eq!((lexical.rhs.arity(), binary.rhs.arity()), (1, 2));
  assert_eq!(binary.symbol_str(), "TOP");
  assert_eq!(lexical.to_string(), "NP -> flights ; 0.25");
  assert_eq!(binary.to_string(), "TOP -> NP VP ; 1");
  assert_eq!(NtId(7).index(), 7);
}
