use std::fmt;

use crate::Err;
use crate::viterbi::{Backpointer, BackpointerTable};

#[derive(Debug, PartialEq, Clone)]
pub struct Constituent<T> {
  pub value: T,
  pub span: (usize, usize),
}

impl<T> fmt::Display for Constituent<T>
where
  T: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.value)
  }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Word<U> {
  pub value: U,
  pub span: (usize, usize),
}

impl<U> fmt::Display for Word<U>
where
  U: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.value)
  }
}

/// A binary-branching parse tree. Every leaf is a preterminal over exactly
/// one word.
#[derive(Debug, PartialEq, Clone)]
pub enum SynTree<T, U> {
  Branch(Constituent<T>, Box<SynTree<T, U>>, Box<SynTree<T, U>>),
  Leaf(Constituent<T>, Word<U>),
}

/// Nonterminal names over token strings
pub type ParseTree = SynTree<String, String>;

impl<T, U> SynTree<T, U> {
  pub fn is_leaf(&self) -> bool {
    matches!(self, Self::Leaf(_, _))
  }

  pub fn is_branch(&self) -> bool {
    matches!(self, Self::Branch(_, _, _))
  }

  pub fn constituent(&self) -> &Constituent<T> {
    match self {
      Self::Branch(c, _, _) | Self::Leaf(c, _) => c,
    }
  }

  pub fn value(&self) -> &T {
    &self.constituent().value
  }

  pub fn span(&self) -> (usize, usize) {
    self.constituent().span
  }

  pub fn get_leaf(&self) -> Option<&Word<U>> {
    match self {
      Self::Leaf(_, w) => Some(w),
      _ => None,
    }
  }

  pub fn get_branch(&self) -> Option<(&SynTree<T, U>, &SynTree<T, U>)> {
    match self {
      Self::Branch(_, l, r) => Some((&**l, &**r)),
      _ => None,
    }
  }

  /// The words under this tree, left to right
  pub fn leaves(&self) -> Vec<&U> {
    let mut words = Vec::new();
    let mut stack = vec![self];
    while let Some(node) = stack.pop() {
      match node {
        Self::Leaf(_, w) => words.push(&w.value),
        Self::Branch(_, l, r) => {
          stack.push(r);
          stack.push(l);
        }
      }
    }
    words
  }

  pub fn leaf_count(&self) -> usize {
    match self {
      Self::Leaf(_, _) => 1,
      Self::Branch(_, l, r) => l.leaf_count() + r.leaf_count(),
    }
  }

  pub fn branch_count(&self) -> usize {
    match self {
      Self::Leaf(_, _) => 0,
      Self::Branch(_, l, r) => 1 + l.branch_count() + r.branch_count(),
    }
  }
}

impl<T, U> SynTree<T, U>
where
  T: fmt::Display,
  U: fmt::Display,
{
  /// Single-line bracketed form: `(TOP (NP flights) (VP leave))`
  pub fn bracketed(&self) -> String {
    match self {
      Self::Leaf(c, w) => format!("({} {})", c.value, w),
      Self::Branch(c, l, r) => format!("({} {} {})", c.value, l.bracketed(), r.bracketed()),
    }
  }
}

impl<T, U> fmt::Display for SynTree<T, U>
where
  T: fmt::Display,
  U: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf(c, w) => write!(f, "({} {})", c, w),
      Self::Branch(c, l, r) => {
        write!(f, "({}", c)?;
        for t in [l, r] {
          let fmt = format!("{}", t);
          for line in fmt.lines() {
            write!(f, "\n  {}", line)?;
          }
        }
        write!(f, ")")
      }
    }
  }
}

/// Rebuilds the tree rooted at `nt` over `i..j` by following backpointers.
/// Errors if `nt` has no entry at that span.
pub fn get_tree(table: &BackpointerTable, i: usize, j: usize, nt: &str) -> Result<ParseTree, Err> {
  let bp = table
    .get(&(i, j))
    .and_then(|cell| cell.get(nt))
    .ok_or_else(|| -> Err { format!("no entry for {} at {}..{}", nt, i, j).into() })?;

  let cons = Constituent {
    value: nt.to_string(),
    span: (i, j),
  };

  match bp {
    Backpointer::Terminal(w) => Ok(SynTree::Leaf(
      cons,
      Word {
        value: w.clone(),
        span: (i, j),
      },
    )),
    Backpointer::Split(left, right) => {
      let left = get_tree(table, left.start, left.end, &left.symbol)?;
      let right = get_tree(table, right.start, right.end, &right.symbol)?;
      Ok(SynTree::Branch(cons, Box::new(left), Box::new(right)))
    }
  }
}
