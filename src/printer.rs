#![allow(dead_code)]

/*!
  Renders a compiled IR node back to canonical PEG text: literals
  re-escaped through the same escape table the lexer accepts, character
  classes rendered as `[...]` with ranges collapsed, sequences/choices joined
  with implicit concatenation and `/` respectively, repetitions/options
  suffixed, predicates prefixed, captures wrapped in `{}`, non-terminals by
  name.

  Two entry points: [`print_node`], a single-node printer (error messages,
  tests), and [`print_grammar`], a whole-grammar printer that emits one
  `name <- body` line per declared rule, start rule first — what invariant 8
  (`parse(print(g)) ≡ g`) round-trips through.
*/

use std::rc::Rc;

use crate::charset::ByteSet;
use crate::node::{Node, PegNode};
use crate::nonterminal::NonTerminalTable;

/// Renders a single node as a top-level PEG expression (an `expr` in the
/// textual grammar: an ordered choice of sequences).
pub fn print_node(node: &Node) -> String {
  print_expr(node)
}

/// Renders the whole compiled grammar: one `name <- body` line per declared
/// rule (start rule first), or — in "bare expression" mode, when the
/// grammar declares no rules at all — just the expression text.
pub fn print_grammar(start: &Node, table: &NonTerminalTable) -> String {
  if table.iter().next().is_none() {
    return print_expr(start);
  }

  let start_name = match start.as_ref() {
    PegNode::NonTerminal(record) => Some(record.borrow().name.clone()),
    _ => None,
  };

  let mut lines = Vec::new();
  if let Some(name) = &start_name {
    for record in table.iter() {
      let rec = record.borrow();
      if &rec.name == name {
        if let Some(body) = &rec.rule {
          lines.push(format!("{} <- {}", rec.name, print_expr(body)));
        }
        break;
      }
    }
  }
  for record in table.iter() {
    let rec = record.borrow();
    if Some(&rec.name) == start_name.as_ref() {
      continue;
    }
    if let Some(body) = &rec.rule {
      lines.push(format!("{} <- {}", rec.name, print_expr(body)));
    }
  }
  lines.join("\n")
}

fn print_expr(node: &Node) -> String {
  match node.as_ref() {
    PegNode::OrderedChoice(items) => items.iter().map(print_seq).collect::<Vec<_>>().join(" / "),
    _ => print_seq(node),
  }
}

fn print_seq(node: &Node) -> String {
  match node.as_ref() {
    PegNode::Sequence(items) => {
      let mut out = Vec::with_capacity(items.len());
      let mut i = 0;
      while i < items.len() {
        if i + 1 < items.len() {
          if let Some(plus) = try_print_plus(&items[i], &items[i + 1]) {
            out.push(plus);
            i += 2;
            continue;
          }
        }
        out.push(print_prefixed(&items[i]));
        i += 1;
      }
      out.join(" ")
    }
    _ => print_prefixed(node),
  }
}

/// Recognizes the `a+` shape `greedy_plus` builds — `a` immediately followed
/// by `a*` — and prints it back as a single `+`-suffixed atom. Without this,
/// a capturing `a` would print twice (`{...}  {...}*`), and reparsing would
/// assign the two copies different capture indices, breaking invariant 8.
fn try_print_plus(a: &Node, b: &Node) -> Option<String> {
  let is_match = match b.as_ref() {
    PegNode::GreedyRep(c) => Rc::ptr_eq(a, c),
    PegNode::GreedyRepChar(c) => matches!(a.as_ref(), PegNode::Char(c2) if c2 == c),
    PegNode::GreedyRepSet(set) => matches!(a.as_ref(), PegNode::CharChoice(set2) if Rc::ptr_eq(set, set2)),
    PegNode::GreedyAny => matches!(a.as_ref(), PegNode::Any | PegNode::AnyRune),
    _ => false,
  };
  if is_match {
    Some(format!("{}+", print_atom(a)))
  } else {
    None
  }
}

fn print_prefixed(node: &Node) -> String {
  match node.as_ref() {
    PegNode::AndPredicate(child) => format!("&{}", print_suffixed(child)),
    PegNode::NotPredicate(child) => format!("!{}", print_suffixed(child)),
    PegNode::Search(child) => format!("@{}", print_suffixed(child)),
    _ => print_suffixed(node),
  }
}

fn print_suffixed(node: &Node) -> String {
  match node.as_ref() {
    PegNode::GreedyRep(child) => format!("{}*", print_atom(child)),
    PegNode::GreedyRepChar(c) => format!("{}*", escape_string(&[*c])),
    PegNode::GreedyRepSet(set) => format!("{}*", print_charset(set)),
    PegNode::GreedyAny => "_*".to_string(),
    PegNode::Option(child) => format!("{}?", print_atom(child)),
    _ => print_atom(node),
  }
}

/// Renders a node in atom position, parenthesizing anything that isn't
/// already a single lexical unit (a bare sequence or choice needs `(...)` to
/// bind as one atom to a following suffix, e.g. `(a b)*`).
fn print_atom(node: &Node) -> String {
  match node.as_ref() {
    PegNode::Empty => String::new(),
    PegNode::Any => "_".to_string(),
    PegNode::AnyRune => ".".to_string(),
    PegNode::NewLine => "\\n".to_string(),
    PegNode::Terminal(bytes) => escape_string(bytes),
    PegNode::TerminalIgnoreCase(bytes) => format!("i{}", escape_string(bytes)),
    PegNode::TerminalIgnoreStyle(bytes) => format!("y{}", escape_string(bytes)),
    PegNode::Char(c) => escape_string(&[*c]),
    PegNode::CharChoice(set) => print_charset(set),
    PegNode::NonTerminal(record) => record.borrow().name.clone(),
    PegNode::Capture(child) => format!("{{{}}}", print_expr(child)),
    PegNode::BackRef(idx) => format!("${}", idx + 1),
    PegNode::BackRefIgnoreCase(idx) => format!("i${}", idx + 1),
    PegNode::BackRefIgnoreStyle(idx) => format!("y${}", idx + 1),
    PegNode::Sequence(_) | PegNode::OrderedChoice(_) => format!("({})", print_expr(node)),
    PegNode::GreedyRep(_)
    | PegNode::GreedyRepChar(_)
    | PegNode::GreedyRepSet(_)
    | PegNode::GreedyAny
    | PegNode::Option(_)
    | PegNode::AndPredicate(_)
    | PegNode::NotPredicate(_)
    | PegNode::Search(_) => format!("({})", print_prefixed(node)),
  }
}

fn print_charset(set: &ByteSet) -> String {
  let mut out = String::from("[");
  for (lo, hi) in set.to_ranges() {
    if lo == hi {
      out.push_str(&escape_class_byte(lo));
    } else {
      out.push_str(&escape_class_byte(lo));
      out.push('-');
      out.push_str(&escape_class_byte(hi));
    }
  }
  out.push(']');
  out
}

/// The named escapes the lexer accepts, inverted: byte value to the
/// letter that follows a backslash.
fn named_escape_letter(b: u8) -> Option<char> {
  match b {
    0x0D => Some('r'),
    0x0A => Some('l'),
    0x0C => Some('f'),
    0x1B => Some('e'),
    0x07 => Some('a'),
    0x08 => Some('b'),
    0x0B => Some('v'),
    0x09 => Some('t'),
    _ => None,
  }
}

fn escape_plain_byte(b: u8) -> String {
  if let Some(letter) = named_escape_letter(b) {
    format!("\\{}", letter)
  } else if b.is_ascii_graphic() || b == b' ' {
    (b as char).to_string()
  } else {
    format!("\\x{:02x}", b)
  }
}

/// Escapes one byte for a quoted string literal: `'` and `\` always need a
/// backslash; everything else falls through to [`escape_plain_byte`].
fn escape_string(bytes: &[u8]) -> String {
  let mut s = String::from("'");
  for &b in bytes {
    match b {
      b'\'' => s.push_str("\\'"),
      b'\\' => s.push_str("\\\\"),
      _ => s.push_str(&escape_plain_byte(b)),
    }
  }
  s.push('\'');
  s
}

/// Escapes one byte for a character class: `]`, `-`, `^`, and `\` need a
/// backslash there instead of `'`.
fn escape_class_byte(b: u8) -> String {
  match b {
    b']' | b'-' | b'^' | b'\\' => format!("\\{}", b as char),
    _ => escape_plain_byte(b),
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::parser;

  #[test]
  fn prints_terminal_sequence() {
    let g = parser::parse("'foo' 'bar'").unwrap();
    assert_eq!(print_node(&g.start), "'foobar'");
  }

  #[test]
  fn prints_ordered_choice_and_charset() {
    let g = parser::parse("[a-z] / 'x'").unwrap();
    assert_eq!(print_node(&g.start), "[a-z] / 'x'");
  }

  #[test]
  fn prints_capture_and_backref() {
    let g = parser::parse(r#"{\w+} "=" $1"#).unwrap();
    let text = print_node(&g.start);
    assert!(text.contains("{"));
    assert!(text.contains("$1"));
  }

  #[test]
  fn prints_whole_grammar_start_first() {
    let g = parser::parse("a <- 'x' b\nb <- 'y'*").unwrap();
    let text = print_grammar(&g.start, &g.table);
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("a <-"));
    assert!(lines.iter().any(|l| l.starts_with("b <-")));
  }

  #[test]
  fn round_trips_through_reparse() {
    let sources = [
      "'(' @ ')'",
      r"\d+",
      r#"{'a'}'bc' 'xyz' / {\ident}"#,
      "'aa' !. / ({'a'})+",
    ];
    for src in sources {
      let g1 = parser::parse(src).unwrap();
      let printed = print_node(&g1.start);
      let g2 = parser::parse(&printed).unwrap();
      assert_eq!(
        print_node(&g1.start),
        print_node(&g2.start),
        "round trip mismatch for {:?}: printed {:?}",
        src,
        printed
      );
    }
  }
}
