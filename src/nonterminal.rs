#![allow(dead_code)]

/*!
  The non-terminal table links identifiers used in a PEG (as rule heads or as
  references to rule bodies) to a single shared `NonTerminalRecord` per
  name. Records are created eagerly on first reference — whether that
  reference is the rule's own declaration (`name <- ...`) or a forward use
  inside another rule's body — so recursive and mutually-recursive rules
  resolve without a second pass.

  Sharing is by reference (`ValueCell`, an `Rc<RefCell<_>>` with
  pointer-identity `Hash`/`Eq`), which lets every `NonTerminal` IR node that
  mentions a given name observe the same record once its body is filled in
  by the parser.
*/

use crate::error::{GrammarError, Position};
use crate::node::Node;
use crate::valuecell::ValueCell;

/// A declared-or-referenced rule name together with its resolution state.
#[derive(Debug, Default)]
pub struct NonTerminalRecord {
  pub name: String,
  /// Where the name was first seen (declaration or first use, whichever
  /// comes first in source order).
  pub position: Position,
  pub declared: bool,
  pub used: bool,
  /// The rule body, set exactly once when its `<-` definition is parsed.
  pub rule: Option<Node>,
}

/// Shared handle to a `NonTerminalRecord`. Cheap to clone; clones alias the
/// same record.
pub type NonTerminalRef = ValueCell<NonTerminalRecord>;

/// Unicode-aware, underscore-insensitive comparison used for rule names
/// (the glossary's "style-insensitive comparison"), so `my_rule`, `MyRule`,
/// and `MYRULE` all name the same non-terminal.
pub fn style_insensitive_eq(a: &str, b: &str) -> bool {
  let mut ac = a.chars().filter(|&c| c != '_').flat_map(char::to_lowercase);
  let mut bc = b.chars().filter(|&c| c != '_').flat_map(char::to_lowercase);
  loop {
    match (ac.next(), bc.next()) {
      (Some(x), Some(y)) => {
        if x != y {
          return false;
        }
      }
      (None, None) => return true,
      _ => return false,
    }
  }
}

#[derive(Default, Clone)]
pub struct NonTerminalTable {
  records: Vec<NonTerminalRef>,
}

impl NonTerminalTable {
  pub fn new() -> NonTerminalTable {
    NonTerminalTable::default()
  }

  /// Returns the existing record for `name`, or creates a fresh
  /// (undeclared, unused) one.
  pub fn lookup_or_create(&mut self, name: &str, position: Position) -> NonTerminalRef {
    for record in &self.records {
      if style_insensitive_eq(&record.borrow().name, name) {
        return record.clone();
      }
    }
    let record = ValueCell::new(NonTerminalRecord {
      name: name.to_string(),
      position,
      declared: false,
      used: false,
      rule: None,
    });
    self.records.push(record.clone());
    record
  }

  pub fn mark_declared(&self, record: &NonTerminalRef) {
    record.borrow_mut().declared = true;
  }

  pub fn mark_used(&self, record: &NonTerminalRef) {
    record.borrow_mut().used = true;
  }

  /// Enforces the declared/used invariant: every record must have been
  /// declared, and every record other than `start` must have been used.
  pub fn check(&self, start: &NonTerminalRef) -> Result<(), GrammarError> {
    for record in &self.records {
      let rec = record.borrow();
      if !rec.declared {
        return Err(GrammarError::UndeclaredRule(rec.position, rec.name.clone()));
      }
      if !rec.used && record != start {
        return Err(GrammarError::UnusedRule(rec.position, rec.name.clone()));
      }
    }
    Ok(())
  }

  pub fn iter(&self) -> impl Iterator<Item = &NonTerminalRef> {
    self.records.iter()
  }
}
