#![allow(dead_code)]

/*!
  The PEG intermediate representation: a closed, tagged-variant tree
  of `PegNode`s. Constructors here perform peephole optimizations —
  flattening nested sequences/choices, fusing adjacent literals
  and character classes, and specializing repetition into the "superop"
  forms `GreedyRepChar`/`GreedyRepSet`/`GreedyAny` — so callers never build
  an unoptimized tree by hand.

  Dispatch on `PegNode` is a `match` on the tag, not a visitor: the matcher
  is hot code and per-kind branches are cheaper than indirection.
*/

use std::rc::Rc;

use crate::charset::ByteSet;
use crate::error::ConstructionError;
use crate::nonterminal::NonTerminalRef;

/// Shared, immutable handle to a compiled IR subtree. Cheap to clone: a
/// grammar is a DAG (not always a tree, once rule inlining or `CharChoice`
/// sharing with `GreedyRepSet` is accounted for) of these handles.
pub type Node = Rc<PegNode>;

#[derive(Debug)]
pub enum PegNode {
  Empty,
  Any,
  AnyRune,
  NewLine,
  Terminal(Vec<u8>),
  TerminalIgnoreCase(Vec<u8>),
  TerminalIgnoreStyle(Vec<u8>),
  Char(u8),
  CharChoice(Rc<ByteSet>),
  NonTerminal(NonTerminalRef),
  Sequence(Vec<Node>),
  OrderedChoice(Vec<Node>),
  GreedyRep(Node),
  GreedyRepChar(u8),
  GreedyRepSet(Rc<ByteSet>),
  GreedyAny,
  Option(Node),
  AndPredicate(Node),
  NotPredicate(Node),
  /// A numbered capture. The slot a given `Capture` writes is *not* fixed
  /// here at parse time: it is the match closure's dynamic `ml` counter at
  /// the moment this node is entered (reserved on entry, rewound on
  /// backtrack), so which slot a capture lands in depends on which other
  /// `Capture` nodes actually executed before it along the path the
  /// matcher took, not on the node's position in the grammar text.
  Capture(Node),
  /// Zero-based capture slot index (surfaced as 1-based `$n` at the API
  /// boundary).
  BackRef(u32),
  BackRefIgnoreCase(u32),
  BackRefIgnoreStyle(u32),
  Search(Node),
}

fn is_repeat_or_option(node: &Node) -> bool {
  matches!(
    node.as_ref(),
    PegNode::GreedyRep(_)
      | PegNode::GreedyRepChar(_)
      | PegNode::GreedyRepSet(_)
      | PegNode::GreedyAny
      | PegNode::Option(_)
      | PegNode::Empty
  )
}

// region Leaf constructors

pub fn empty() -> Node {
  Rc::new(PegNode::Empty)
}

pub fn any() -> Node {
  Rc::new(PegNode::Any)
}

pub fn any_rune() -> Node {
  Rc::new(PegNode::AnyRune)
}

pub fn new_line() -> Node {
  Rc::new(PegNode::NewLine)
}

pub fn non_terminal(record: NonTerminalRef) -> Node {
  Rc::new(PegNode::NonTerminal(record))
}

// endregion

// region Literal constructors

/// A one-byte literal collapses to `Char`, the engine's fast path.
pub fn term(bytes: impl Into<Vec<u8>>) -> Node {
  let bytes = bytes.into();
  if bytes.len() == 1 {
    Rc::new(PegNode::Char(bytes[0]))
  } else {
    Rc::new(PegNode::Terminal(bytes))
  }
}

pub fn term_ignore_case(bytes: impl Into<Vec<u8>>) -> Node {
  Rc::new(PegNode::TerminalIgnoreCase(bytes.into()))
}

pub fn term_ignore_style(bytes: impl Into<Vec<u8>>) -> Node {
  Rc::new(PegNode::TerminalIgnoreStyle(bytes.into()))
}

/// A one-member set collapses to `Char`; otherwise builds `CharChoice`.
pub fn char_set(set: ByteSet) -> Node {
  match set.single() {
    Some(c) => Rc::new(PegNode::Char(c)),
    None => Rc::new(PegNode::CharChoice(Rc::new(set))),
  }
}

// endregion

// region Sequence / ordered choice, with flattening and fusion

fn flatten<F>(items: Vec<Node>, is_same_kind: F) -> Vec<Node>
where
  F: Fn(&PegNode) -> Option<&Vec<Node>>,
{
  let mut out = Vec::with_capacity(items.len());
  for item in items {
    if let Some(children) = is_same_kind(&item) {
      out.extend(children.iter().cloned());
    } else {
      out.push(item);
    }
  }
  out
}

fn terminal_bytes(node: &PegNode) -> Option<Vec<u8>> {
  match node {
    PegNode::Terminal(bytes) => Some(bytes.clone()),
    PegNode::Char(c) => Some(vec![*c]),
    _ => None,
  }
}

/// Merges adjacent plain-terminal-like nodes (`Terminal`/`Char` pairs) in a
/// sequence into a single `Terminal`.
fn fuse_adjacent_terminals(items: Vec<Node>) -> Vec<Node> {
  let mut out: Vec<Node> = Vec::with_capacity(items.len());
  for item in items {
    if let (Some(prev_bytes), Some(cur_bytes)) =
      (out.last().and_then(|n: &Node| terminal_bytes(n)), terminal_bytes(&item))
    {
      let mut merged = prev_bytes;
      merged.extend(cur_bytes);
      out.pop();
      out.push(Rc::new(PegNode::Terminal(merged)));
    } else {
      out.push(item);
    }
  }
  out
}

fn char_choice_set(node: &PegNode) -> Option<ByteSet> {
  match node {
    PegNode::CharChoice(set) => Some(**set),
    PegNode::Char(c) => {
      let mut set = ByteSet::new();
      set.insert(*c);
      Some(set)
    }
    _ => None,
  }
}

/// Merges adjacent `CharChoice`/`Char` alternatives in an ordered choice by
/// set union (`'a' / 'b' / [c-d]` becomes one `CharChoice`).
fn fuse_adjacent_char_choices(items: Vec<Node>) -> Vec<Node> {
  let mut out: Vec<Node> = Vec::with_capacity(items.len());
  for item in items {
    if let (Some(prev_set), Some(cur_set)) =
      (out.last().and_then(|n: &Node| char_choice_set(n)), char_choice_set(&item))
    {
      out.pop();
      out.push(char_set(prev_set.union(&cur_set)));
    } else {
      out.push(item);
    }
  }
  out
}

pub fn sequence(items: Vec<Node>) -> Node {
  let flattened = flatten(items, |n| match n {
    PegNode::Sequence(children) => Some(children),
    _ => None,
  });
  let fused = fuse_adjacent_terminals(flattened);
  match fused.len() {
    0 => empty(),
    1 => fused.into_iter().next().unwrap(),
    _ => Rc::new(PegNode::Sequence(fused)),
  }
}

pub fn ordered_choice(items: Vec<Node>) -> Node {
  let flattened = flatten(items, |n| match n {
    PegNode::OrderedChoice(children) => Some(children),
    _ => None,
  });
  let fused = fuse_adjacent_char_choices(flattened);
  match fused.len() {
    0 => empty(),
    1 => fused.into_iter().next().unwrap(),
    _ => Rc::new(PegNode::OrderedChoice(fused)),
  }
}

// endregion

// region Repetition and option, with superop specialization

/// `a*`. Specializes to `GreedyRepChar`/`GreedyRepSet`/`GreedyAny`.
/// Fails if `a` already matches the empty string unconditionally — repeating
/// it would never terminate by consuming input, and the matcher's
/// "`a` returning 0 terminates the loop" rule only protects *execution*, not
/// construction of a node that is pure dead weight.
pub fn greedy_rep(child: Node) -> Result<Node, ConstructionError> {
  if is_repeat_or_option(&child) {
    return Err(ConstructionError::RepeatOfNullable);
  }
  Ok(match child.as_ref() {
    PegNode::Char(c) => Rc::new(PegNode::GreedyRepChar(*c)),
    PegNode::CharChoice(set) => Rc::new(PegNode::GreedyRepSet(set.clone())),
    PegNode::Any | PegNode::AnyRune => Rc::new(PegNode::GreedyAny),
    _ => Rc::new(PegNode::GreedyRep(child)),
  })
}

/// `a+`, defined as `(a, a*)`.
pub fn greedy_plus(child: Node) -> Result<Node, ConstructionError> {
  let rep = greedy_rep(child.clone())?;
  Ok(sequence(vec![child, rep]))
}

/// `a?`. A child that already matches empty (another `Option` or any greedy
/// repetition) is returned unchanged.
pub fn option(child: Node) -> Node {
  if is_repeat_or_option(&child) {
    child
  } else {
    Rc::new(PegNode::Option(child))
  }
}

// endregion

// region One-child wrappers: no collapsing

pub fn and_predicate(child: Node) -> Node {
  Rc::new(PegNode::AndPredicate(child))
}

pub fn not_predicate(child: Node) -> Node {
  Rc::new(PegNode::NotPredicate(child))
}

pub fn search(child: Node) -> Node {
  Rc::new(PegNode::Search(child))
}

pub fn capture(child: Node) -> Node {
  Rc::new(PegNode::Capture(child))
}

// endregion

// region Back-references

/// `index` is zero-based (capture slot), matching `Capture`'s allocation
/// order; callers translating from 1-based `$n` syntax subtract one.
pub fn backref(index: u32) -> Node {
  Rc::new(PegNode::BackRef(index))
}

pub fn backref_ignore_case(index: u32) -> Node {
  Rc::new(PegNode::BackRefIgnoreCase(index))
}

pub fn backref_ignore_style(index: u32) -> Node {
  Rc::new(PegNode::BackRefIgnoreStyle(index))
}

// endregion

/// Counts leaf nodes reachable from `node`, treating any `NonTerminal` as
/// automatically exceeding `threshold` (so recursive rules are never
/// inlined). Used by the rule-inlining decision in `nonterminal`'s
/// consumers.
pub fn space_cost(node: &Node, threshold: usize) -> usize {
  fn go(node: &Node, budget: &mut usize, threshold: usize) {
    if *budget >= threshold {
      return;
    }
    match node.as_ref() {
      PegNode::NonTerminal(_) => *budget = threshold,
      PegNode::Sequence(children) | PegNode::OrderedChoice(children) => {
        for child in children {
          go(child, budget, threshold);
          if *budget >= threshold {
            return;
          }
        }
      }
      PegNode::GreedyRep(child)
      | PegNode::Option(child)
      | PegNode::AndPredicate(child)
      | PegNode::NotPredicate(child)
      | PegNode::Capture(child)
      | PegNode::Search(child) => go(child, budget, threshold),
      _ => *budget += 1,
    }
  }
  let mut budget = 0;
  go(node, &mut budget, threshold);
  budget
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn one_char_terminal_becomes_char() {
    let n = term(b"a".to_vec());
    assert!(matches!(*n, PegNode::Char(b'a')));
  }

  #[test]
  fn sequence_flattens_and_fuses() {
    let n = sequence(vec![term(b"ab".to_vec()), sequence(vec![term(b"c".to_vec()), term(b"d".to_vec())])]);
    match n.as_ref() {
      PegNode::Terminal(bytes) => assert_eq!(bytes, b"abcd"),
      other => panic!("expected fused Terminal, got {:?}", other),
    }
  }

  #[test]
  fn sequence_singleton_unwraps() {
    let n = sequence(vec![term(b"a".to_vec())]);
    assert!(matches!(*n, PegNode::Char(b'a')));
  }

  #[test]
  fn ordered_choice_merges_char_choices() {
    let mut set = ByteSet::new();
    set.insert_range(b'c', b'd');
    let n = ordered_choice(vec![term(b"a".to_vec()), term(b"b".to_vec()), char_set(set)]);
    match n.as_ref() {
      PegNode::CharChoice(s) => {
        assert!(s.contains(b'a'));
        assert!(s.contains(b'b'));
        assert!(s.contains(b'c'));
        assert!(s.contains(b'd'));
        assert!(!s.contains(b'e'));
      }
      other => panic!("expected fused CharChoice, got {:?}", other),
    }
  }

  #[test]
  fn greedy_rep_specializes() {
    assert!(matches!(*greedy_rep(term(b"a".to_vec())).unwrap(), PegNode::GreedyRepChar(b'a')));
    assert!(matches!(*greedy_rep(any()).unwrap(), PegNode::GreedyAny));
  }

  #[test]
  fn greedy_rep_of_greedy_rep_is_construction_error() {
    let inner = greedy_rep(any()).unwrap();
    assert_eq!(greedy_rep(inner).unwrap_err(), ConstructionError::RepeatOfNullable);
  }

  #[test]
  fn option_of_option_is_unchanged() {
    let opt = option(term(b"a".to_vec()));
    let opt2 = option(opt.clone());
    assert!(Rc::ptr_eq(&opt, &opt2));
  }

  #[test]
  fn greedy_rep_of_empty_is_construction_error() {
    assert_eq!(greedy_rep(empty()).unwrap_err(), ConstructionError::RepeatOfNullable);
  }

  #[test]
  fn option_of_empty_is_unchanged() {
    let e = empty();
    let opt = option(e.clone());
    assert!(Rc::ptr_eq(&e, &opt));
  }
}
