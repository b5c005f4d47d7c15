//! Knobs that change how patterns are compiled

use std::fmt;

use crate::utils::boxed_iter::BoxedIter;

/// What to do when the same variable name appears more than once in a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DuplicateVars {
  /// The pattern is malformed
  Reject,
  /// Every occurrence must bind an equal value
  #[default]
  RequireEqual,
}

/// Search order of a quantifier. Greedy quantifiers try to consume as many
/// values as possible first, lazy ones as few as possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Greed {
  #[default]
  Greedy,
  Lazy,
}

impl Greed {
  /// Produces a decreasing sequence when greedy and an increasing one when
  /// lazy
  pub fn walk<'a, I: DoubleEndedIterator + 'a>(&self, iter: I) -> BoxedIter<'a, I::Item> {
    match self {
      Self::Lazy => Box::new(iter),
      Self::Greedy => Box::new(iter.rev()),
    }
  }
}

impl fmt::Display for Greed {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Greedy => write!(f, "greedy"),
      Self::Lazy => write!(f, "lazy"),
    }
  }
}

/// Options for [crate::Pattern::compile]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options {
  /// Policy for variables that share a name
  pub duplicates: DuplicateVars,
  /// Search order of quantifiers that were built without an explicit one
  pub default_greed: Greed,
}

impl Options {
  /// Replace the duplicate variable policy
  pub fn duplicates(self, duplicates: DuplicateVars) -> Self { Self { duplicates, ..self } }
  /// Replace the default quantifier search order
  pub fn default_greed(self, default_greed: Greed) -> Self { Self { default_greed, ..self } }
}

#[cfg(test)]
mod test {
  use itertools::Itertools;

  use super::*;

  /// Greedy must try the longest prefix first
  #[test]
  fn test_walk() {
    assert_eq!(Greed::Greedy.walk(0..=3).collect_vec(), vec![3, 2, 1, 0], "greedy walks down");
    assert_eq!(Greed::Lazy.walk(0..=3).collect_vec(), vec![0, 1, 2, 3], "lazy walks up")
  }

  #[test]
  fn defaults() {
    let opts = Options::default();
    assert_eq!(opts.duplicates, DuplicateVars::RequireEqual);
    assert_eq!(opts.default_greed, Greed::Greedy);
    assert_eq!(opts.duplicates(DuplicateVars::Reject).duplicates, DuplicateVars::Reject);
  }
}
