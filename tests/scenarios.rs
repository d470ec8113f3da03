//! Integration tests over the public [`pegex::Peg`] surface, exercising the
//! concrete matching scenarios and cross-cutting invariants this crate is
//! built against.

use pegex::options::MatchOptions;
use pegex::Peg;

#[test]
fn scenario_1_search_between_parens() {
  let pat = Peg::compile("'(' @ ')'").unwrap();
  let m = pat.exec(b"(a b c)", MatchOptions::default()).unwrap();
  assert_eq!(m.end - m.start, 7);
}

#[test]
fn scenario_2_3_style_insensitive_keyword() {
  let pat = Peg::compile(r"\y 'while'").unwrap();
  let m = pat.exec(b"W_HI_Le", MatchOptions::default()).unwrap();
  assert_eq!(m.end, 7);
  assert!(pat.exec(b"W_HI_L", MatchOptions::default()).is_none());
}

#[test]
fn scenario_4_verbatim_overrides_global_style_modifier() {
  let pat = Peg::compile(r"\y v'while'").unwrap();
  assert!(pat.exec(b"W_HI_Le", MatchOptions::default()).is_none());
}

#[test]
fn scenario_5_digit_run_full_match() {
  let pat = Peg::compile(r"\d+").unwrap();
  assert!(pat.matches(b"0158787"));
}

#[test]
fn scenario_6_word_run_then_digit_run() {
  let pat = Peg::compile(r"\w+\s+\d+").unwrap();
  assert!(pat.matches(b"ABC 0232"));
}

#[test]
fn scenario_7_find_after_leading_filler() {
  let pat = Peg::compile("'abc'").unwrap();
  assert_eq!(pat.find(b"_____abc_______"), Some(5));
}

#[test]
fn scenario_8_ordered_choice_falls_through_to_builtin() {
  // The first alternative's capture reserves slot 0, then the alternative
  // fails further down the sequence, so the reservation is rewound along
  // with everything else the attempt did. The second alternative's capture
  // is the only one that ever completes, so it lands in slot 0 too.
  let pat = Peg::compile(r"{'a'}'bc' 'xyz' / {\ident}").unwrap();
  let m = pat.exec(b"abc", MatchOptions::default()).unwrap();
  assert_eq!(m.capture(b"abc", 0), Some(&b"abc"[..]));
  assert_eq!(m.capture(b"abc", 1), None);
}

#[test]
fn scenario_9_replace_duplicates_captured_value() {
  let pat = Peg::compile(r"{\ident}'='{\ident}").unwrap();
  let out = pat.replace(b"var1=key; var2=key2", b"$1<-$2$2");
  assert_eq!(out, b"var1<-keykey; var2<-key2key2");
}

#[test]
fn scenario_10_repeated_capture_keeps_only_last_iteration() {
  let pat = Peg::compile("'aa' !. / ({'a'})+").unwrap();
  let m = pat.exec(b"aaaaaa", MatchOptions::default()).unwrap();
  assert_eq!(m.end, 6);
  assert_eq!(m.capture(b"aaaaaa", 0), Some(&b"a"[..]));
}

#[test]
fn scenario_11_recursive_grammar_full_match() {
  let pat = Peg::compile("S <- A B / C D\nA <- 'a'+\nB <- 'b'+\nC <- 'c'+\nD <- 'd'+").unwrap();
  assert!(pat.matches(b"cccccdddddd"));
  assert!(!pat.matches(b"cccccaaaaaa"));
}

#[test]
fn scenario_12_split_on_digit_runs() {
  let pat = Peg::compile(r"\d+").unwrap();
  let pieces: Vec<&[u8]> = pat.split(b"00232this02939is39an22example111").collect();
  assert_eq!(pieces, vec![&b"this"[..], b"is", b"an", b"example"]);
}

#[test]
fn invariant_1_match_len_is_bounded_or_absent() {
  // At every start offset, a match either fails outright or consumes no
  // more than what's left of the input from that offset.
  let pat = Peg::compile(r"\d+").unwrap();
  let input = b"12 345 x 6789";
  for i in 0..=input.len() {
    if let Some(m) = pat.exec(input, MatchOptions::at(i)) {
      assert!(m.start == i);
      assert!(m.end - m.start <= input.len() - i);
    }
  }
}

#[test]
fn invariant_2_capture_spans_stay_within_the_match_and_are_densely_numbered() {
  // Two captures complete on the winning path, so they occupy slots 0 and
  // 1 with no gap, and every recorded span falls inside the overall match.
  let pat = Peg::compile(r"({\d+} '-' {\d+}) / {\w+}").unwrap();
  let m = pat.exec(b"12-34", MatchOptions::default()).unwrap();
  assert_eq!(m.capture(b"12-34", 0), Some(&b"12"[..]));
  assert_eq!(m.capture(b"12-34", 1), Some(&b"34"[..]));
  assert_eq!(m.capture(b"12-34", 2), None);
  for idx in 0..2 {
    let (first, last) = m.capture_span(idx).unwrap();
    assert!(m.start <= first);
    assert!(last <= m.end);
  }
}

#[test]
fn invariant_3_ordered_choice_resumes_from_original_state() {
  // The first alternative partially matches then fails further down the
  // sequence; the second alternative must see the original, unconsumed
  // input rather than wherever the first alternative left off.
  let pat = Peg::compile("'ab' 'x' / 'a'").unwrap();
  let m = pat.exec(b"ac", MatchOptions::default()).unwrap();
  assert_eq!(m.end, 1);
}

#[test]
fn invariant_4_predicates_do_not_consume_or_capture() {
  // The predicate's `{\ident}` reserves and fills slot 0, but `&` always
  // restores the whole closure on exit regardless of whether the child
  // matched, so the reservation is undone along with the captured span.
  // The real, committed capture after the predicate then reserves slot 0
  // again, not slot 1 — capture numbering is per-path, not per-textual-`{`.
  let pat = Peg::compile(r"&{\ident} {\ident}").unwrap();
  let m = pat.exec(b"abc", MatchOptions::default()).unwrap();
  assert_eq!(m.end, 3);
  assert_eq!(m.capture(b"abc", 0), Some(&b"abc"[..]));
  assert_eq!(m.capture(b"abc", 1), None);
}

#[test]
fn invariant_5_repetition_and_option_are_idempotent_under_reparse() {
  let once = Peg::compile("'a'*").unwrap();
  let twice_printed = once.to_source();
  assert_eq!(twice_printed, "'a'*");

  let opt = Peg::compile("'a'?").unwrap();
  assert_eq!(opt.to_source(), "'a'?");
}

#[test]
fn invariant_6_find_and_contains_agree() {
  let pat = Peg::compile("'needle'").unwrap();
  assert_eq!(pat.find(b"hay needle hay").is_some(), pat.contains(b"hay needle hay"));
  assert_eq!(pat.find(b"hay hay").is_some(), pat.contains(b"hay hay"));
}

#[test]
fn invariant_7_split_pieces_never_contain_the_separator() {
  let sep = Peg::compile(r"\s+").unwrap();
  let pieces: Vec<&[u8]> = sep.split(b"one  two   three").collect();
  for piece in pieces {
    assert!(sep.find(piece).is_none());
  }
}

#[test]
fn invariant_8_round_trip_through_print_and_reparse() {
  for src in [
    "'(' @ ')'",
    r"\d+",
    "S <- A B / C D\nA <- 'a'+\nB <- 'b'+\nC <- 'c'+\nD <- 'd'+",
  ] {
    let first = Peg::compile(src).unwrap();
    let printed = first.to_source();
    let second = Peg::compile(&printed).unwrap();
    assert_eq!(second.to_source(), printed);
  }
}
