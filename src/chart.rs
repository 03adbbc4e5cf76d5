use std::fmt;

use crate::grammar::Grammar;
use crate::rules::NtId;

/// Half-open token range `(i, j)`, `i < j`
pub type Span = (usize, usize);

/// The nonterminals present over one span, each with a payload. Iterates in
/// the order nonterminals were first inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell<T> {
  order: Vec<NtId>,
  slots: Vec<Option<T>>,
}

impl<T> Default for Cell<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Cell<T> {
  pub fn new() -> Self {
    Self {
      order: Vec::new(),
      slots: Vec::new(),
    }
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn get(&self, nt: NtId) -> Option<&T> {
    self.slots.get(nt.index()).and_then(Option::as_ref)
  }

  pub fn has(&self, nt: NtId) -> bool {
    self.get(nt).is_some()
  }

  /// Sets the payload for `nt`, returning the old one. Replacing keeps the
  /// nonterminal's original position in the iteration order.
  pub fn insert(&mut self, nt: NtId, value: T) -> Option<T> {
    if self.slots.len() <= nt.index() {
      self.slots.resize_with(nt.index() + 1, || None);
    }

    let prev = self.slots[nt.index()].replace(value);
    if prev.is_none() {
      self.order.push(nt);
    }
    prev
  }

  pub fn nonterminals(&self) -> impl Iterator<Item = NtId> + '_ {
    self.order.iter().copied()
  }

  pub fn iter(&self) -> impl Iterator<Item = (NtId, &T)> + '_ {
    self
      .order
      .iter()
      .filter_map(move |&nt| self.get(nt).map(|v| (nt, v)))
  }
}

/// A triangular table of cells over every span of an input, stored flat.
///
/// Cells are filled one width at a time: `open_width` must be called with
/// 1, 2, 3, ... in turn, and `fill` only accepts spans of the open width, so
/// every narrower span is final once a wider one is being built.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart<T> {
  len: usize,
  cells: Vec<Cell<T>>,
  frontier: usize,
}

impl<T> Chart<T> {
  pub fn new(len: usize) -> Self {
    Self {
      len,
      cells: (0..len * len).map(|_| Cell::new()).collect(),
      frontier: 0,
    }
  }

  /// Length of the input this chart covers
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Width of the spans currently being filled, 0 before anything is filled
  pub fn frontier(&self) -> usize {
    self.frontier
  }

  fn offset(&self, i: usize, j: usize) -> usize {
    assert!(i < j && j <= self.len, "span {}..{} out of range", i, j);
    i * self.len + (j - 1)
  }

  pub fn cell(&self, i: usize, j: usize) -> &Cell<T> {
    &self.cells[self.offset(i, j)]
  }

  /// All spans of `width` tokens, left to right
  pub fn spans(&self, width: usize) -> impl Iterator<Item = Span> {
    let count = (self.len + 1).saturating_sub(width);
    (0..count).map(move |i| (i, i + width))
  }

  pub fn open_width(&mut self, width: usize) {
    assert_eq!(width, self.frontier + 1, "span widths filled out of order");
    assert!(width <= self.len, "width {} wider than input", width);
    self.frontier = width;
  }

  pub fn fill(&mut self, i: usize, j: usize, cell: Cell<T>) {
    assert_eq!(
      j - i,
      self.frontier,
      "span {}..{} is not at the open width",
      i,
      j
    );
    let offset = self.offset(i, j);
    self.cells[offset] = cell;
  }

  /// Every span with its cell, narrowest spans first
  pub fn iter(&self) -> impl Iterator<Item = (Span, &Cell<T>)> + '_ {
    (1..=self.len)
      .flat_map(move |width| self.spans(width))
      .map(move |(i, j)| ((i, j), self.cell(i, j)))
  }

  pub fn display<'a>(&'a self, g: &'a Grammar) -> ChartDisplay<'a, T> {
    ChartDisplay { chart: self, g }
  }
}

/// How a cell payload renders next to its nonterminal in a chart dump
pub trait EntryDisplay {
  fn fmt_entry(&self, g: &Grammar, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl EntryDisplay for () {
  fn fmt_entry(&self, _: &Grammar, _: &mut fmt::Formatter<'_>) -> fmt::Result {
    Ok(())
  }
}

pub struct ChartDisplay<'a, T> {
  chart: &'a Chart<T>,
  g: &'a Grammar,
}

impl<T: EntryDisplay> fmt::Display for ChartDisplay<'_, T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for ((i, j), cell) in self.chart.iter() {
      if cell.is_empty() {
        continue;
      }
      writeln!(f, "Span {}..{}:", i, j)?;
      for (nt, entry) in cell.iter() {
        write!(f, "  {}", self.g.nonterminal(nt))?;
        entry.fmt_entry(self.g, f)?;
        writeln!(f)?;
      }
    }
    Ok(())
  }
}
