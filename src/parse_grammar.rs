use regex::{Captures, Regex};
/// Line-based parsing of PCFG grammar files
use std::str::FromStr;

use crate::Err;
use crate::grammar::Grammar;
use crate::rules::{Rhs, Rule, Symbol};

impl FromStr for Grammar {
  type Err = Err;

  /// Parses a grammar from a string. Uses the last start declaration, or
  /// the first rule's symbol if there is none.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (start, rules) = parse(s)?;

    if rules.is_empty() {
      return Err("empty ruleset".into());
    }

    let start = start.unwrap_or_else(|| rules[0].symbol_str().to_string());
    Ok(Self::new(start, rules))
  }
}

type ParseResult<T> = Result<T, Err>;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// Match a whole line, failing if it doesn't match
fn needed_re<'a>(re: &'static Regex, what: &str, s: &'a str) -> ParseResult<Captures<'a>> {
  re.captures(s)
    .ok_or_else(|| format!("couldn't match {} at {:?}", what, s).into())
}

/// A symbol is a single non-empty run of non-whitespace characters
fn parse_name(s: &str) -> ParseResult<&str> {
  regex_static!(NAME, r"^\S+$");
  let s = s.trim();
  needed_re(&NAME, "name", s)?;
  Ok(s)
}

fn parse_prob(s: &str) -> ParseResult<f64> {
  let s = s.trim();
  s.parse::<f64>()
    .map_err(|e| format!("probability {:?}: {}", s, e).into())
}

fn parse_rhs(s: &str) -> ParseResult<Rhs> {
  let symbols = s.split_whitespace().collect::<Vec<_>>();
  match symbols.as_slice() {
    [w] => Ok(Rhs::Terminal(w.to_string())),
    [l, r] => Ok(Rhs::Binary(
      Symbol::new(l.to_string()),
      Symbol::new(r.to_string()),
    )),
    _ => Err(
      format!(
        "expected 1 or 2 symbols in CNF, got {} in {:?}",
        symbols.len(),
        s.trim()
      )
      .into(),
    ),
  }
}

/// LHS -> SYM1 [SYM2] ; PROB
///
/// The probability is whatever follows the last `;`, so `;` itself can be a
/// terminal.
fn parse_rule(line: &str) -> ParseResult<Rule> {
  regex_static!(RULE, r"^(.*?)->(.*);([^;]*)$");

  let caps = needed_re(&RULE, "rule", line)?;
  let symbol = parse_name(&caps[1]).map_err(|e| -> Err { format!("rule symbol: {}", e).into() })?;
  let rhs = parse_rhs(&caps[2]).map_err(|e| -> Err { format!("rule rhs: {}", e).into() })?;
  let prob = parse_prob(&caps[3]).map_err(|e| -> Err { format!("rule: {}", e).into() })?;

  Ok(Rule::new(symbol, rhs, prob))
}

/// SYMBOL;PROB
fn parse_start(line: &str) -> ParseResult<String> {
  regex_static!(START, r"^([^;]*);([^;]*)$");

  let caps = needed_re(&START, "start symbol", line)?;
  let symbol = parse_name(&caps[1]).map_err(|e| -> Err { format!("start symbol: {}", e).into() })?;
  parse_prob(&caps[2]).map_err(|e| -> Err { format!("start symbol: {}", e).into() })?;

  Ok(symbol.to_string())
}

/// Parses a str into a tuple of (start symbol, rules)
/// Errors if any line is malformed, naming the line
pub fn parse(s: &str) -> ParseResult<(Option<String>, Vec<Rule>)> {
  let mut start = None;
  let mut rules = Vec::new();

  for (idx, line) in s.lines().enumerate() {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
      continue;
    }

    let at_line = |e: Err| -> Err { format!("line {}: {}", idx + 1, e).into() };
    if line.contains("->") {
      rules.push(parse_rule(line).map_err(at_line)?);
    } else {
      start = Some(parse_start(line).map_err(at_line)?);
    }
  }

  Ok((start, rules))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_rules() {
    let (start, rules) = parse(
      r#"
      # a comment
      TOP;1.0

      TOP -> NP VP ; 1.0
      NP -> flights;0.5
      NP -> ; ; 0.5
      "#,
    )
    .unwrap();

    assert_eq!(start.as_deref(), Some("TOP"));
    assert_eq!(
      rules,
      vec![
        Rule::new(
          "TOP",
          Rhs::Binary(Symbol::new("NP".into()), Symbol::new("VP".into())),
          1.0
        ),
        Rule::new("NP", Rhs::Terminal("flights".into()), 0.5),
        Rule::new("NP", Rhs::Terminal(";".into()), 0.5),
      ]
    );
  }

  #[test]
  fn test_start_defaults_to_first_rule() {
    let g: Grammar = "S -> A A ; 1.0\nA -> a ; 1.0".parse().unwrap();
    assert_eq!(g.start(), "S");
  }

  #[test]
  fn test_parse_errors() {
    let err = parse("S;1.0\nS -> A B C ; 1.0").unwrap_err().to_string();
    assert!(err.starts_with("line 2:"), "{}", err);
    assert!(err.contains("expected 1 or 2 symbols"), "{}", err);

    let err = parse("S -> a ; lots").unwrap_err().to_string();
    assert!(err.starts_with("line 1:"), "{}", err);
    assert!(err.contains("probability"), "{}", err);

    assert!(parse("S -> a").is_err());
    assert!(parse("TOP PP;1.0").is_err());
    assert!("# nothing here\n".parse::<Grammar>().is_err());
  }
}
