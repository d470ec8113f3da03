#![allow(dead_code)]

/*!
  Recursive-descent parser for textual PEG source, driven by
  [`lexer::Lexer`] with a single token of look-ahead. Two extra peeks are
  needed beyond that one token: distinguishing a rule head (`name <- ...`)
  from a non-terminal reference inside a sequence requires seeing past the
  identifier to check for an `Arrow`, so [`Lexer`] is `Copy` and the parser
  snapshots it to peek without consuming.

  Grammar (informally):

  ```text
  grammar    ::= globalModifier? rule+ | expr
  rule       ::= Identifier Arrow expr
  expr       ::= seq (Slash seq)*
  seq        ::= prefix+
  prefix     ::= (Amp | Bang)? suffix
  suffix     ::= atom (Star | Plus | Question)?
  atom       ::= '(' expr ')' | '{' expr '}' | At atom
               | Identifier | StringLit | CharClass | Dollar
               | Builtin | Escaped | Dot | Underscore
  ```
*/

use std::collections::HashMap;
use std::rc::Rc;

use crate::charset::presets;
use crate::error::GrammarError;
use crate::lexer::{Lexer, Modifier, Token, TokenKind};
use crate::limits::INLINE_THRESHOLD;
use crate::node::{self, Node, PegNode};
use crate::nonterminal::{NonTerminalRef, NonTerminalTable};
use crate::options::CompileOptions;

/// A compiled grammar: its start pattern and the table of rule records it
/// refers to. In "bare expression" mode (no `name <- ...` rules at all) the
/// table is empty and `start` is the compiled expression directly.
pub struct Grammar {
  pub start: Node,
  pub table: NonTerminalTable,
}

pub fn parse(src: &str) -> Result<Grammar, GrammarError> {
  parse_with_options(src, &CompileOptions::default())
}

pub fn parse_with_options(src: &str, options: &CompileOptions) -> Result<Grammar, GrammarError> {
  let grammar = Parser::new(src, *options)?.parse_grammar()?;
  Ok(inline_rules(grammar, INLINE_THRESHOLD))
}

/// Rewrites every `NonTerminal` reference whose rule body's `space_cost` is
/// below `threshold` into that body, in place.
/// `NonTerminal` nodes saturate `space_cost` to the threshold, so a
/// recursive rule's body never qualifies and is never traversed into here —
/// the substitution can't loop.
fn inline_rules(mut grammar: Grammar, threshold: usize) -> Grammar {
  let mut memo: HashMap<*const PegNode, Node> = HashMap::new();
  let bodies: Vec<(NonTerminalRef, Option<Node>)> =
    grammar.table.iter().map(|r| (r.clone(), r.borrow().rule.clone())).collect();
  for (record, body) in bodies {
    if let Some(body) = body {
      let rewritten = inline_node(&body, threshold, &mut memo);
      record.borrow_mut().rule = Some(rewritten);
    }
  }
  grammar.start = inline_node(&grammar.start, threshold, &mut memo);
  grammar
}

fn inline_node(node: &Node, threshold: usize, memo: &mut HashMap<*const PegNode, Node>) -> Node {
  let key = Rc::as_ptr(node);
  if let Some(hit) = memo.get(&key) {
    return hit.clone();
  }
  let result = match node.as_ref() {
    PegNode::NonTerminal(record) => {
      let rule = record.borrow().rule.clone();
      match rule {
        Some(body) if node::space_cost(&body, threshold) < threshold => {
          log::trace!("inlining rule `{}` ({} leaf nodes)", record.borrow().name, node::space_cost(&body, threshold));
          inline_node(&body, threshold, memo)
        }
        _ => node.clone(),
      }
    }
    PegNode::Sequence(items) => {
      node::sequence(items.iter().map(|c| inline_node(c, threshold, memo)).collect())
    }
    PegNode::OrderedChoice(items) => {
      node::ordered_choice(items.iter().map(|c| inline_node(c, threshold, memo)).collect())
    }
    PegNode::GreedyRep(c) => Rc::new(PegNode::GreedyRep(inline_node(c, threshold, memo))),
    PegNode::Option(c) => Rc::new(PegNode::Option(inline_node(c, threshold, memo))),
    PegNode::AndPredicate(c) => Rc::new(PegNode::AndPredicate(inline_node(c, threshold, memo))),
    PegNode::NotPredicate(c) => Rc::new(PegNode::NotPredicate(inline_node(c, threshold, memo))),
    PegNode::Search(c) => Rc::new(PegNode::Search(inline_node(c, threshold, memo))),
    PegNode::Capture(c) => Rc::new(PegNode::Capture(inline_node(c, threshold, memo))),
    _ => node.clone(),
  };
  memo.insert(key, result.clone());
  result
}

struct Parser<'a> {
  lexer: Lexer<'a>,
  current: Token,
  table: NonTerminalTable,
  capture_count: u32,
  global_modifier: Option<Modifier>,
  options: CompileOptions,
}

impl<'a> Parser<'a> {
  fn new(src: &'a str, options: CompileOptions) -> Result<Parser<'a>, GrammarError> {
    let mut lexer = Lexer::new(src);
    let current = lexer.next_token()?;
    Ok(Parser {
      lexer,
      current,
      table: NonTerminalTable::new(),
      capture_count: 0,
      global_modifier: None,
      options,
    })
  }

  fn bump(&mut self) -> Result<Token, GrammarError> {
    let next = self.lexer.next_token()?;
    Ok(std::mem::replace(&mut self.current, next))
  }

  /// Looks one token past `current` without consuming anything.
  fn peek_second(&self) -> Result<Token, GrammarError> {
    let mut probe = self.lexer;
    probe.next_token()
  }

  fn current_is_rule_head(&self) -> Result<bool, GrammarError> {
    if matches!(self.current.kind, TokenKind::Identifier(_)) {
      Ok(matches!(self.peek_second()?.kind, TokenKind::Arrow))
    } else {
      Ok(false)
    }
  }

  fn expect_eof(&self) -> Result<(), GrammarError> {
    match self.current.kind {
      TokenKind::Eof => Ok(()),
      _ => Err(GrammarError::UnexpectedToken(self.current.pos, describe(&self.current.kind))),
    }
  }

  fn parse_grammar(mut self) -> Result<Grammar, GrammarError> {
    if let TokenKind::Builtin(name) = &self.current.kind {
      match name.as_str() {
        "i" => {
          self.global_modifier = Some(Modifier::CaseInsensitive);
          self.bump()?;
        }
        "y" => {
          self.global_modifier = Some(Modifier::StyleInsensitive);
          self.bump()?;
        }
        _ => {}
      }
    }

    if matches!(self.current.kind, TokenKind::Eof) {
      return Err(GrammarError::EmptyGrammar);
    }

    if self.current_is_rule_head()? {
      let mut start: Option<NonTerminalRef> = None;
      while !matches!(self.current.kind, TokenKind::Eof) {
        let record = self.parse_rule()?;
        if start.is_none() {
          start = Some(record);
        }
      }
      let start = start.expect("rule mode entered only when at least one rule head was seen");
      self.table.check(&start)?;
      Ok(Grammar { start: node::non_terminal(start), table: self.table })
    } else {
      self.capture_count = 0;
      let body = self.parse_expr()?;
      self.expect_eof()?;
      // A bare expression declares no rules; any non-terminal it referenced
      // was created by `lookup_or_create` but never declared, so surface
      // that here exactly as the rule-mode path would via `table.check`.
      if let Some(undeclared) = self.table.iter().find(|r| !r.borrow().declared) {
        let rec = undeclared.borrow();
        return Err(GrammarError::UndeclaredRule(rec.position, rec.name.clone()));
      }
      Ok(Grammar { start: body, table: self.table })
    }
  }

  fn parse_rule(&mut self) -> Result<NonTerminalRef, GrammarError> {
    let name_tok = self.bump()?;
    let name = match name_tok.kind {
      TokenKind::Identifier(s) => s,
      other => return Err(GrammarError::UnexpectedToken(name_tok.pos, describe(&other))),
    };
    match self.current.kind {
      TokenKind::Arrow => {
        self.bump()?;
      }
      _ => return Err(GrammarError::UnexpectedToken(self.current.pos, describe(&self.current.kind))),
    }
    let record = self.table.lookup_or_create(&name, name_tok.pos);
    if record.borrow().declared {
      return Err(GrammarError::RedefinedRule(name_tok.pos, name));
    }
    self.capture_count = 0;
    let body = self.parse_expr()?;
    log::debug!("declaring rule `{}` at {}", name, name_tok.pos);
    record.borrow_mut().rule = Some(body);
    self.table.mark_declared(&record);
    Ok(record)
  }

  fn parse_expr(&mut self) -> Result<Node, GrammarError> {
    let mut alts = vec![self.parse_seq()?];
    while matches!(self.current.kind, TokenKind::Slash) {
      self.bump()?;
      alts.push(self.parse_seq()?);
    }
    Ok(node::ordered_choice(alts))
  }

  fn starts_prefix(&self) -> bool {
    matches!(
      self.current.kind,
      TokenKind::Amp
        | TokenKind::Bang
        | TokenKind::At
        | TokenKind::Identifier(_)
        | TokenKind::StringLit(_, _)
        | TokenKind::CharClass(_)
        | TokenKind::Builtin(_)
        | TokenKind::Escaped(_)
        | TokenKind::Dollar(_, _)
        | TokenKind::Dot
        | TokenKind::Underscore
        | TokenKind::LParen
        | TokenKind::LBrace
    )
  }

  fn parse_seq(&mut self) -> Result<Node, GrammarError> {
    let mut items = Vec::new();
    while self.starts_prefix() && !self.current_is_rule_head()? {
      items.push(self.parse_prefix()?);
    }
    if items.is_empty() {
      return Err(GrammarError::UnexpectedToken(self.current.pos, describe(&self.current.kind)));
    }
    Ok(node::sequence(items))
  }

  fn parse_prefix(&mut self) -> Result<Node, GrammarError> {
    match self.current.kind {
      TokenKind::Amp => {
        self.bump()?;
        Ok(node::and_predicate(self.parse_suffix()?))
      }
      TokenKind::Bang => {
        self.bump()?;
        Ok(node::not_predicate(self.parse_suffix()?))
      }
      TokenKind::At => {
        self.bump()?;
        Ok(node::search(self.parse_suffix()?))
      }
      _ => self.parse_suffix(),
    }
  }

  fn parse_suffix(&mut self) -> Result<Node, GrammarError> {
    let atom = self.parse_atom()?;
    let pos = self.current.pos;
    match self.current.kind {
      TokenKind::Star => {
        self.bump()?;
        node::greedy_rep(atom).map_err(|_| GrammarError::NonTerminatingRepeat(pos))
      }
      TokenKind::Plus => {
        self.bump()?;
        node::greedy_plus(atom).map_err(|_| GrammarError::NonTerminatingRepeat(pos))
      }
      TokenKind::Question => {
        self.bump()?;
        Ok(node::option(atom))
      }
      _ => Ok(atom),
    }
  }

  fn parse_atom(&mut self) -> Result<Node, GrammarError> {
    let tok = self.bump()?;
    match tok.kind {
      TokenKind::LParen => {
        let inner = self.parse_expr()?;
        self.expect_rparen()?;
        Ok(inner)
      }
      TokenKind::LBrace => {
        // `capture_count` only tracks how many `{`s have been seen so far,
        // for validating `$N` back-reference indices (§4.4): the slot a
        // capture actually writes is assigned dynamically at match time
        // (see `PegNode::Capture`), not here.
        self.capture_count += 1;
        let inner = self.parse_expr()?;
        self.expect_rbrace()?;
        Ok(node::capture(inner))
      }
      TokenKind::Identifier(name) => {
        let record = self.table.lookup_or_create(&name, tok.pos);
        self.table.mark_used(&record);
        Ok(node::non_terminal(record))
      }
      TokenKind::StringLit(bytes, modifier) => Ok(self.build_terminal(bytes, modifier)),
      TokenKind::CharClass(set) => Ok(node::char_set(set)),
      TokenKind::Dot => Ok(if self.options.unicode { node::any_rune() } else { node::any() }),
      TokenKind::Underscore => Ok(node::any()),
      TokenKind::Escaped(byte) => Ok(node::term(vec![byte])),
      TokenKind::Builtin(name) => self.build_builtin(&name, tok.pos),
      TokenKind::Dollar(index, modifier) => self.build_backref(index, modifier, tok.pos),
      other => Err(GrammarError::UnexpectedToken(tok.pos, describe(&other))),
    }
  }

  fn expect_rparen(&mut self) -> Result<(), GrammarError> {
    match self.current.kind {
      TokenKind::RParen => {
        self.bump()?;
        Ok(())
      }
      _ => Err(GrammarError::UnexpectedToken(self.current.pos, "expected `)`".to_string())),
    }
  }

  fn expect_rbrace(&mut self) -> Result<(), GrammarError> {
    match self.current.kind {
      TokenKind::RBrace => {
        self.bump()?;
        Ok(())
      }
      _ => Err(GrammarError::UnexpectedToken(self.current.pos, "expected `}`".to_string())),
    }
  }

  fn effective_modifier(&self, token_modifier: Option<Modifier>) -> Option<Modifier> {
    token_modifier.or(self.global_modifier)
  }

  fn build_terminal(&self, bytes: Vec<u8>, token_modifier: Option<Modifier>) -> Node {
    match self.effective_modifier(token_modifier) {
      Some(Modifier::CaseInsensitive) => node::term_ignore_case(bytes),
      Some(Modifier::StyleInsensitive) => node::term_ignore_style(bytes),
      Some(Modifier::Verbatim) | None => node::term(bytes),
    }
  }

  fn build_backref(
    &self,
    index: u32,
    token_modifier: Option<Modifier>,
    pos: crate::error::Position,
  ) -> Result<Node, GrammarError> {
    if index == 0 || index > self.capture_count {
      return Err(GrammarError::InvalidBackreference(pos, index));
    }
    let slot = index - 1; // zero-based internally
    Ok(match self.effective_modifier(token_modifier) {
      Some(Modifier::CaseInsensitive) => node::backref_ignore_case(slot),
      Some(Modifier::StyleInsensitive) => node::backref_ignore_style(slot),
      Some(Modifier::Verbatim) | None => node::backref(slot),
    })
  }

  fn build_builtin(&self, name: &str, pos: crate::error::Position) -> Result<Node, GrammarError> {
    match name {
      "n" => Ok(node::new_line()),
      "d" => Ok(node::char_set(presets::digits())),
      "D" => Ok(node::char_set(presets::digits().negate())),
      "s" => Ok(node::char_set(presets::whitespace())),
      "S" => Ok(node::char_set(presets::whitespace().negate())),
      "w" => Ok(node::char_set(presets::word_chars())),
      "W" => Ok(node::char_set(presets::word_chars().negate())),
      "ident" => Ok(node::sequence(vec![
        node::char_set(presets::ident_start_chars()),
        node::greedy_rep(node::char_set(presets::ident_chars()))
          .expect("a single character class never matches the empty string"),
      ])),
      _ => Err(GrammarError::UnknownBuiltin(pos, name.to_string())),
    }
  }
}

fn describe(kind: &TokenKind) -> String {
  match kind {
    TokenKind::Identifier(s) => format!("identifier `{}`", s),
    TokenKind::Arrow => "`<-`".to_string(),
    TokenKind::Slash => "`/`".to_string(),
    TokenKind::Amp => "`&`".to_string(),
    TokenKind::Bang => "`!`".to_string(),
    TokenKind::At => "`@`".to_string(),
    TokenKind::Question => "`?`".to_string(),
    TokenKind::Star => "`*`".to_string(),
    TokenKind::Plus => "`+`".to_string(),
    TokenKind::LParen => "`(`".to_string(),
    TokenKind::RParen => "`)`".to_string(),
    TokenKind::LBrace => "`{`".to_string(),
    TokenKind::RBrace => "`}`".to_string(),
    TokenKind::Dot => "`.`".to_string(),
    TokenKind::Underscore => "`_`".to_string(),
    TokenKind::StringLit(_, _) => "a string literal".to_string(),
    TokenKind::CharClass(_) => "a character class".to_string(),
    TokenKind::Builtin(name) => format!("`\\{}`", name),
    TokenKind::Escaped(b) => format!("`\\{}`", *b as char),
    TokenKind::Dollar(n, _) => format!("`${}`", n),
    TokenKind::Eof => "end of input".to_string(),
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::node::PegNode;

  #[test]
  fn bare_expression_compiles_without_rules() {
    let g = parse("'a' 'b'").unwrap();
    match g.start.as_ref() {
      PegNode::Terminal(bytes) => assert_eq!(bytes, b"ab"),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn rule_mode_with_recursion() {
    let g = parse("expr <- '(' expr ')' / 'x'").unwrap();
    match g.start.as_ref() {
      PegNode::NonTerminal(_) => {}
      other => panic!("expected NonTerminal start, got {:?}", other),
    }
  }

  #[test]
  fn undeclared_rule_is_an_error() {
    let err = parse("a <- b").unwrap_err();
    assert!(matches!(err, GrammarError::UndeclaredRule(_, ref name) if name == "b"));
  }

  #[test]
  fn unused_rule_is_an_error() {
    let err = parse("a <- 'x'\nb <- 'y'").unwrap_err();
    assert!(matches!(err, GrammarError::UnusedRule(_, ref name) if name == "b"));
  }

  #[test]
  fn redefined_rule_is_an_error() {
    let err = parse("a <- 'x'\na <- 'y'").unwrap_err();
    assert!(matches!(err, GrammarError::RedefinedRule(_, ref name) if name == "a"));
  }

  #[test]
  fn capture_and_backreference() {
    let g = parse(r"a <- {'x'} $1").unwrap();
    match g.start.as_ref() {
      PegNode::NonTerminal(_) => {}
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn forward_backreference_is_rejected() {
    let err = parse(r"a <- $1 {'x'}").unwrap_err();
    assert!(matches!(err, GrammarError::InvalidBackreference(_, 1)));
  }

  #[test]
  fn style_modifier_string_and_global_modifier() {
    let g = parse(r"\i a <- 'ABC'").unwrap();
    match g.table.iter().next().unwrap().borrow().rule.as_ref().unwrap().as_ref() {
      PegNode::TerminalIgnoreCase(bytes) => assert_eq!(bytes, b"ABC"),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn verbatim_modifier_overrides_global() {
    let g = parse(r"\i a <- v'ABC'").unwrap();
    match g.table.iter().next().unwrap().borrow().rule.as_ref().unwrap().as_ref() {
      PegNode::Terminal(bytes) => assert_eq!(bytes, b"ABC"),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn non_terminating_repeat_is_rejected() {
    let err = parse("a <- ('x'?)*").unwrap_err();
    assert!(matches!(err, GrammarError::NonTerminatingRepeat(_)));
  }

  #[test]
  fn builtin_ident_expands() {
    let g = parse(r"a <- \ident").unwrap();
    match g.table.iter().next().unwrap().borrow().rule.as_ref().unwrap().as_ref() {
      PegNode::Sequence(items) => assert_eq!(items.len(), 2),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn unknown_builtin_is_an_error() {
    let err = parse(r"a <- \q").unwrap_err();
    assert!(matches!(err, GrammarError::UnknownBuiltin(_, ref name) if name == "q"));
  }

  #[test]
  fn search_prefix_binds_looser_than_suffix() {
    // `@` is a prefix, like `&`/`!`: a trailing suffix binds to the atom
    // first, and `@` wraps the whole suffixed atom, so `@'a'+` means
    // "search for a run of one or more `a`s", not "repeatedly search for a
    // single `a`".
    let g = parse("@'a'+").unwrap();
    match g.start.as_ref() {
      PegNode::Search(child) => assert!(matches!(child.as_ref(), PegNode::Sequence(_))),
      other => panic!("expected Search wrapping the suffixed atom, got {:?}", other),
    }
  }
}
