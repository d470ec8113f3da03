#![allow(dead_code)]

/*!
  Error types raised while compiling a grammar, either from textual PEG
  source (`GrammarError`, carrying a line/column) or from the programmatic
  combinator API (`ConstructionError`, raised when a combinator is asked to
  build an illegal IR shape).

  Neither error type is ever produced by the matching engine itself: match
  failure is encoded as `None`/`-1`, never as an `Err`.
*/

use std::fmt::{Display, Formatter};

/// A 1-based line/column source position, as tracked by the lexer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Position {
  pub line: u32,
  pub col:  u32,
}

impl Position {
  pub fn new(line: u32, col: u32) -> Position {
    Position { line, col }
  }
}

impl Display for Position {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "({}, {})", self.line, self.col)
  }
}

/// Errors raised while compiling textual PEG source or while resolving the
/// non-terminal table.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum GrammarError {
  InvalidToken(Position, String),
  UnexpectedToken(Position, String),
  UndeclaredRule(Position, String),
  UnusedRule(Position, String),
  UnknownBuiltin(Position, String),
  RedefinedRule(Position, String),
  NulInClass(Position),
  InvalidBackreference(Position, u32),
  /// `*`/`+` applied (via textual source) to a sub-pattern that already
  /// matches the empty string; the programmatic equivalent is
  /// `ConstructionError::RepeatOfNullable`.
  NonTerminatingRepeat(Position),
  EmptyGrammar,
}

impl GrammarError {
  /// The source position at which the error occurred, if any (a handful of
  /// whole-grammar errors, like an empty source file, have none).
  pub fn position(&self) -> Option<Position> {
    match self {
      GrammarError::InvalidToken(p, _)
      | GrammarError::UnexpectedToken(p, _)
      | GrammarError::UndeclaredRule(p, _)
      | GrammarError::UnusedRule(p, _)
      | GrammarError::UnknownBuiltin(p, _)
      | GrammarError::RedefinedRule(p, _)
      | GrammarError::NulInClass(p)
      | GrammarError::InvalidBackreference(p, _)
      | GrammarError::NonTerminatingRepeat(p) => Some(*p),
      GrammarError::EmptyGrammar => None,
    }
  }

  fn message(&self) -> String {
    match self {
      GrammarError::InvalidToken(_, lexeme) => {
        format!("invalid token `{}`", lexeme)
      }
      GrammarError::UnexpectedToken(_, found) => {
        format!("unexpected token `{}`", found)
      }
      GrammarError::UndeclaredRule(_, name) => {
        format!("rule `{}` is used but never declared", name)
      }
      GrammarError::UnusedRule(_, name) => {
        format!("rule `{}` is declared but never used", name)
      }
      GrammarError::UnknownBuiltin(_, name) => {
        format!("unknown built-in `\\{}`", name)
      }
      GrammarError::RedefinedRule(_, name) => {
        format!("rule `{}` is defined more than once", name)
      }
      GrammarError::NulInClass(_) => {
        "the NUL byte cannot appear in a character class".to_string()
      }
      GrammarError::InvalidBackreference(_, n) => {
        format!("back-reference ${} refers to a capture that has not occurred yet", n)
      }
      GrammarError::NonTerminatingRepeat(_) => {
        "cannot repeat a sub-pattern that already matches the empty string".to_string()
      }
      GrammarError::EmptyGrammar => "grammar source contains no rules or expression".to_string(),
    }
  }
}

impl Display for GrammarError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.position() {
      Some(pos) => write!(f, "{} Error: {}", pos, self.message()),
      None => write!(f, "Error: {}", self.message()),
    }
  }
}

impl GrammarError {
  /// Renders this error as `file(line, col) Error: message`, the format a
  /// caller that actually has a filename in hand (`Peg::compile_file`) is
  /// expected to produce. Plain `Display` omits the file component, since
  /// most callers (`Peg::compile`, the combinator API) never have one.
  pub fn display_with_file(&self, file: &str) -> String {
    match self.position() {
      Some(pos) => format!("{}{} Error: {}", file, pos, self.message()),
      None => format!("{} Error: {}", file, self.message()),
    }
  }
}

impl std::error::Error for GrammarError {}

/// Raised by the programmatic combinator API when asked to build a node
/// shape that can never terminate, e.g. `greedy_rep` applied to a node that
/// already matches the empty string.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ConstructionError {
  /// Attempted to repeat (`*`) a sub-pattern that can already match empty,
  /// which would loop forever without consuming input.
  RepeatOfNullable,
}

impl Display for ConstructionError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      ConstructionError::RepeatOfNullable => {
        write!(f, "Error: cannot repeat a sub-pattern that already matches the empty string")
      }
    }
  }
}

impl std::error::Error for ConstructionError {}
