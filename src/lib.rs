#![allow(dead_code)]

/*!
  `pegex` compiles textual Parsing Expression Grammars to a tagged-variant IR
  tree and matches it against byte strings with a non-memoizing
  recursive-descent engine.

  The [`Peg`] type is the crate's main entry point: [`Peg::compile`] turns PEG
  source into a ready-to-match pattern, and its methods (`matches`,
  `find`, `captures`, `replace`, `split`, ...) cover the derived string
  operations this crate builds on the matching engine. Programmatic grammar
  construction (building an IR tree directly with [`node`]'s constructors,
  bypassing the textual compiler) is also supported for callers who want to
  build patterns without parsing text.

  ```
  use pegex::Peg;

  let digits = Peg::compile(r"\d+").unwrap();
  assert!(digits.matches(b"42"));
  assert_eq!(digits.find(b"abc 42 def"), Some(4));
  ```
*/

pub mod charset;
pub mod error;
pub mod lexer;
mod limits;
pub mod matcher;
pub mod node;
pub mod nonterminal;
pub mod options;
pub mod parser;
pub mod presets;
pub mod printer;
pub mod strops;
mod valuecell;

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

pub use error::{ConstructionError, GrammarError, Position};
pub use matcher::Match;
pub use node::{Node, PegNode};
pub use options::{CompileOptions, MatchOptions};
pub use parser::Grammar;

/// A compiled pattern, ready to match. Wraps the IR tree [`parser::parse`]
/// (or a caller-built [`node`] tree) produces and the string operations
/// that run against it.
#[derive(Clone)]
pub struct Peg {
  grammar_start: Node,
  table: nonterminal::NonTerminalTable,
}

impl Peg {
  /// Compiles textual PEG source with default [`CompileOptions`].
  pub fn compile(src: &str) -> Result<Peg, GrammarError> {
    Self::compile_with_options(src, &CompileOptions::default())
  }

  /// Compiles textual PEG source with explicit [`CompileOptions`] (notably
  /// `unicode`, which controls what `.` compiles to).
  pub fn compile_with_options(src: &str, options: &CompileOptions) -> Result<Peg, GrammarError> {
    let grammar = parser::parse_with_options(src, options)?;
    Ok(Peg { grammar_start: grammar.start, table: grammar.table })
  }

  /// Reads a file and compiles its contents as PEG source. A grammar error
  /// carries the path, so `PegError`'s `Display` reads
  /// `path(line, col) Error: message`.
  pub fn compile_file(path: impl AsRef<Path>) -> Result<Peg, PegError> {
    let path = path.as_ref();
    let src = fs::read_to_string(path)?;
    Peg::compile(&src).map_err(|e| PegError::GrammarInFile(path.display().to_string(), e))
  }

  /// Wraps an already-built IR tree (from [`node`]'s constructors, or from
  /// [`parser::Grammar`]) without going through the textual compiler.
  pub fn from_node(node: Node) -> Peg {
    Peg { grammar_start: node, table: nonterminal::NonTerminalTable::new() }
  }

  /// The compiled pattern's root node.
  pub fn root(&self) -> &Node {
    &self.grammar_start
  }

  /// Runs the engine once starting at byte offset `start`, returning the
  /// match (span and captures) on success.
  pub fn exec(&self, input: &[u8], options: MatchOptions) -> Option<Match> {
    matcher::run(&self.grammar_start, input, options.start)
  }

  /// Does the pattern match starting at byte 0?
  pub fn matches(&self, input: &[u8]) -> bool {
    strops::matches(input, &self.grammar_start, 0)
  }

  /// Length of the longest match starting at byte 0, if any.
  pub fn match_len(&self, input: &[u8]) -> Option<usize> {
    strops::match_len(input, &self.grammar_start, 0)
  }

  /// Byte offset of the first match anywhere in `input`, if any.
  pub fn find(&self, input: &[u8]) -> Option<usize> {
    strops::find(input, &self.grammar_start, 0)
  }

  /// Byte offset of the first match at or after `start`, if any.
  pub fn find_from(&self, input: &[u8], start: usize) -> Option<usize> {
    strops::find(input, &self.grammar_start, start)
  }

  /// Does the pattern occur anywhere in `input`?
  pub fn contains(&self, input: &[u8]) -> bool {
    strops::contains(input, &self.grammar_start)
  }

  /// Does `input` start with a match?
  pub fn starts_with(&self, input: &[u8]) -> bool {
    strops::starts_with(input, &self.grammar_start)
  }

  /// Does `input` end with a match?
  pub fn ends_with(&self, input: &[u8]) -> bool {
    strops::ends_with(input, &self.grammar_start)
  }

  /// Replaces every non-overlapping match with `template`, expanding `$n`
  /// back-references against that match's captures.
  pub fn replace(&self, input: &[u8], template: &[u8]) -> Vec<u8> {
    strops::replace(input, &self.grammar_start, template)
  }

  /// Splits `input` on every non-overlapping match of this pattern,
  /// returning the text between separators.
  pub fn split<'s, 'p>(&'p self, input: &'s [u8]) -> strops::Split<'s, 'p> {
    strops::split(input, &self.grammar_start)
  }

  /// Renders this pattern back to canonical PEG text. Round-trips
  /// through [`Peg::compile`] modulo pretty-printer canonicalization
  /// (invariant 8).
  pub fn to_source(&self) -> String {
    printer::print_grammar(&self.grammar_start, &self.table)
  }
}

impl fmt::Display for Peg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_source())
  }
}

impl fmt::Debug for Peg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Peg").field("source", &self.to_source()).finish()
  }
}

/// Replaces matches of several patterns in a single left-to-right pass,
/// first-listed pattern winning ties at a given offset.
pub fn parallel_replace(input: &[u8], subs: &[(&Peg, &[u8])]) -> Vec<u8> {
  let node_subs: Vec<(&Node, &[u8])> = subs.iter().map(|(peg, template)| (&peg.grammar_start, *template)).collect();
  strops::parallel_replace(input, &node_subs)
}

/// Errors [`Peg::compile_file`] can produce: either the file couldn't be
/// read, or its contents didn't compile as a grammar.
#[derive(Debug)]
pub enum PegError {
  Io(io::Error),
  Grammar(GrammarError),
  /// A grammar error encountered while compiling a named file. `Display`
  /// prepends the path, producing `path(line, col) Error: message` instead
  /// of the bare `(line, col) Error: message` the plain `Grammar` variant
  /// renders.
  GrammarInFile(String, GrammarError),
}

impl fmt::Display for PegError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PegError::Io(e) => write!(f, "{}", e),
      PegError::Grammar(e) => write!(f, "{}", e),
      PegError::GrammarInFile(file, e) => write!(f, "{}", e.display_with_file(file)),
    }
  }
}

impl std::error::Error for PegError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      PegError::Io(e) => Some(e),
      PegError::Grammar(e) => Some(e),
      PegError::GrammarInFile(_, e) => Some(e),
    }
  }
}

impl From<io::Error> for PegError {
  fn from(e: io::Error) -> PegError {
    PegError::Io(e)
  }
}

impl From<GrammarError> for PegError {
  fn from(e: GrammarError) -> PegError {
    PegError::Grammar(e)
  }
}
