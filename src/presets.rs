#![allow(dead_code)]

/*!
  Preset combinator shorthands: `letters`, `digits`, `whitespace`,
  `ident_chars`, `ident_start_chars`, `ident`, `natural`. Each is expressed as
  a combinator call over [`charset::presets`], not a special engine case, so
  the programmatic entry point and the textual compiler's built-in
  resolution stay observably consistent: `parse("\\d+")` and
  `greedy_plus(digits())` compile to structurally identical IR.
*/

use crate::charset::presets as sets;
use crate::node::{self, Node};

pub fn letters() -> Node {
  node::char_set(sets::letters())
}

pub fn digits() -> Node {
  node::char_set(sets::digits())
}

pub fn whitespace() -> Node {
  node::char_set(sets::whitespace())
}

/// `[A-Za-z_]`, the leading character of `\ident`: letters and
/// underscore, no digits.
pub fn ident_start_chars() -> Node {
  node::char_set(sets::ident_start_chars())
}

/// `[A-Za-z0-9_]`, the continuation characters of `\ident`.
pub fn ident_chars() -> Node {
  node::char_set(sets::ident_chars())
}

/// `[A-Za-z_][A-Za-z0-9_]*`, identical to the `\ident` built-in.
pub fn ident() -> Node {
  node::sequence(vec![
    ident_start_chars(),
    node::greedy_rep(ident_chars()).expect("a single character class never matches the empty string"),
  ])
}

/// `[0-9]+`, a non-empty run of decimal digits.
pub fn natural() -> Node {
  node::greedy_plus(digits()).expect("a single character class never matches the empty string")
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::matcher;

  #[test]
  fn ident_matches_identifier_shape() {
    let pat = ident();
    let m = matcher::run(&pat, b"snake_case2 rest", 0).unwrap();
    assert_eq!(m.end, 11);
  }

  #[test]
  fn natural_requires_at_least_one_digit() {
    assert!(matcher::run(&natural(), b"", 0).is_none());
    let m = matcher::run(&natural(), b"0158787x", 0).unwrap();
    assert_eq!(m.end, 7);
  }

  #[test]
  fn letters_excludes_digits_and_underscore() {
    let pat = letters();
    assert!(matcher::run(&pat, b"a", 0).is_some());
    assert!(matcher::run(&pat, b"_", 0).is_none());
    assert!(matcher::run(&pat, b"5", 0).is_none());
  }
}
