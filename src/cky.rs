use tracing::{debug, trace};

use crate::chart::{Cell, Chart};
use crate::grammar::Grammar;

/// For every span, which nonterminals can derive it. No probabilities.
pub type RecognitionChart = Chart<()>;

/// Fills a recognition chart bottom-up, narrowest spans first.
///
/// Returns `None` as soon as a token has no lexical rule, without looking at
/// any wider span.
pub fn recognition_chart(g: &Grammar, input: &[&str]) -> Option<RecognitionChart> {
  let mut chart = Chart::new(input.len());
  if input.is_empty() {
    return Some(chart);
  }

  chart.open_width(1);
  for (i, token) in input.iter().enumerate() {
    let parents = g.lexical(token);
    if parents.is_empty() {
      debug!(token = *token, position = i, "no lexical rule for token");
      return None;
    }

    let mut cell = Cell::new();
    for parent in parents {
      cell.insert(parent.lhs, ());
    }
    chart.fill(i, i + 1, cell);
  }

  for width in 2..=input.len() {
    chart.open_width(width);
    trace!(width, "recognizing spans");

    for (i, j) in chart.spans(width).collect::<Vec<_>>() {
      let mut cell = Cell::new();
      for k in i + 1..j {
        let (left, right) = (chart.cell(i, k), chart.cell(k, j));
        for a in left.nonterminals() {
          for b in right.nonterminals() {
            for parent in g.binary(a, b) {
              cell.insert(parent.lhs, ());
            }
          }
        }
      }
      chart.fill(i, j, cell);
    }
  }

  Some(chart)
}

/// Whether the grammar's start symbol derives the whole input. The empty
/// input is never in the language.
pub fn recognize(g: &Grammar, input: &[&str]) -> bool {
  if input.is_empty() {
    debug!("empty input is not in the language");
    return false;
  }

  let accepted = recognition_chart(g, input)
    .is_some_and(|chart| chart.cell(0, input.len()).has(g.start_id()));
  debug!(len = input.len(), accepted, "recognized");
  accepted
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

  // S -> S S | x, the classic ambiguous grammar
  const XS: &str = r#"
    S;1.0
    S -> S S ; 0.4
    S -> x ; 0.6
  "#;

  #[test]
  fn test_recognize_scenarios() {
    let g: Grammar = FLIGHTS.parse().unwrap();
    assert!(recognize(&g, &["flights", "leave"]));
    assert!(!recognize(&g, &["leave", "flights"]));
    assert!(!recognize(&g, &["flights", "depart"]));
    assert!(!recognize(&g, &["flights"]));
    assert!(!recognize(&g, &[]));
  }

  #[test]
  fn test_unknown_token_stops_early() {
    let g: Grammar = FLIGHTS.parse().unwrap();
    assert!(recognition_chart(&g, &["paris", "flights", "leave"]).is_none());
    assert!(recognition_chart(&g, &["flights", "leave", "paris"]).is_none());
  }

  #[test]
  fn test_chart_contents() {
    let g: Grammar = XS.parse().unwrap();
    let s = g.nt_id("S").unwrap();
    let chart = recognition_chart(&g, &["x", "x", "x"]).unwrap();

    assert_eq!(chart.frontier(), 3);
    for ((i, j), cell) in chart.iter() {
      assert!(cell.has(s), "S missing at {}..{}", i, j);
      assert_eq!(cell.len(), 1, "duplicate nonterminals at {}..{}", i, j);
    }
    assert!(recognize(&g, &["x"; 7]));
    assert!(!recognize(&g, &["x", "y"]));
  }

  #[test]
  fn test_start_symbol_must_cover_everything() {
    // B derives "b b" but only A B is a sentence
    let g: Grammar = r#"
      S;1.0
      S -> A B ; 1.0
      B -> B B ; 0.5
      A -> a ; 1.0
      B -> b ; 0.5
    "#
    .parse()
    .unwrap();

    assert!(recognize(&g, &["a", "b"]));
    assert!(recognize(&g, &["a", "b", "b", "b"]));
    assert!(!recognize(&g, &["b", "b"]));
    assert!(!recognize(&g, &["a", "a", "b"]));
  }
}
