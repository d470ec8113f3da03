//! Compile-time constants that bound grammar size and matching behavior.

/// Maximum number of numbered captures a single match closure can record.
/// Captures beyond this index are still matched but silently dropped.
pub const MAX_SUBPATTERNS: usize = 10;

/// A `NonTerminal` constructor inlines the referenced rule's body in place of
/// the reference when the body's leaf-node count is strictly below this
/// threshold. Recursive rules are never inlined regardless of size.
pub const INLINE_THRESHOLD: usize = 5;
