//! Errors raised while building and running patterns. A failed match is not
//! an error; these are reserved for mistakes in pattern authoring and for a
//! clause list that runs out of clauses.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use intern_all::Tok;

use crate::pattern::NodePath;
use crate::syntax::ParseError;
use crate::value::Value;

/// A reason why a pattern is malformed. Each reason is its own type so that
/// callers can test for a specific one with [Malformed::is].
pub trait MalformedKind: Sized + 'static {
  /// A general description of this type of error
  const DESCRIPTION: &'static str;
  /// A formatted message that includes specific parameters
  #[must_use]
  fn message(&self) -> String { Self::DESCRIPTION.to_string() }
  /// Attach the location of the offending node
  #[must_use]
  fn at(self, path: NodePath) -> Malformed { Malformed { path, reason: Rc::new(self) } }
}

/// Object-safe version of [MalformedKind]. Implement that instead of this.
pub trait DynMalformedKind {
  /// Access type information about this reason
  #[must_use]
  fn as_any(&self) -> &dyn Any;
  /// A general description of this type of error
  #[must_use]
  fn description(&self) -> &'static str;
  /// A formatted message that includes specific parameters
  #[must_use]
  fn message(&self) -> String;
}

impl<T: MalformedKind> DynMalformedKind for T {
  fn as_any(&self) -> &dyn Any { self }
  fn description(&self) -> &'static str { T::DESCRIPTION }
  fn message(&self) -> String { MalformedKind::message(self) }
}

/// A structural mistake in a pattern, found before any value is matched
#[derive(Clone)]
pub struct Malformed {
  /// Child indices leading from the root to the offending node
  pub path: NodePath,
  reason: Rc<dyn DynMalformedKind>,
}
impl Malformed {
  /// Test the reason
  pub fn is<T: MalformedKind>(&self) -> bool { self.reason.as_any().is::<T>() }
  /// Access the reason if it is of the specified type
  pub fn downcast<T: MalformedKind>(&self) -> Option<&T> { self.reason.as_any().downcast_ref() }
  pub fn description(&self) -> &'static str { self.reason.description() }
  pub fn message(&self) -> String { self.reason.message() }
}

impl fmt::Display for Malformed {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Malformed pattern at {}: {}", self.path, self.message())
  }
}

impl fmt::Debug for Malformed {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Malformed({}, {:?})", self.path, self.message())
  }
}

impl std::error::Error for Malformed {}

/// Two variables share a name while duplicates are rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateVariable {
  pub name: Tok<String>,
}
impl MalformedKind for DuplicateVariable {
  const DESCRIPTION: &'static str = "A variable name occurs more than once";
  fn message(&self) -> String { format!("The variable {} is bound more than once", self.name.as_str()) }
}

/// A quantifier is the first item of its list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingQuantifier;
impl MalformedKind for DanglingQuantifier {
  const DESCRIPTION: &'static str = "A quantifier has nothing to repeat";
}

/// Two quantifiers in a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackedQuantifier;
impl MalformedKind for StackedQuantifier {
  const DESCRIPTION: &'static str = "A quantifier directly follows another quantifier";
}

/// A quantifier outside a deconstructor or sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MisplacedQuantifier;
impl MalformedKind for MisplacedQuantifier {
  const DESCRIPTION: &'static str =
    "Quantifiers may only appear among the items of a deconstructor or a sequence";
}

/// And, Or or Not without operands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyComposite {
  pub operator: &'static str,
}
impl MalformedKind for EmptyComposite {
  const DESCRIPTION: &'static str = "A composite pattern has no operands";
  fn message(&self) -> String { format!("{} needs at least one operand", self.operator) }
}

/// A variable inside Or or Not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInAlternative {
  pub name: Tok<String>,
  pub operator: &'static str,
}
impl MalformedKind for BindingInAlternative {
  const DESCRIPTION: &'static str = "Variables cannot be bound inside Or or Not";
  fn message(&self) -> String {
    format!("The variable {} is bound inside {}", self.name.as_str(), self.operator)
  }
}

/// Not with more than one operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotArity {
  pub count: usize,
}
impl MalformedKind for NotArity {
  const DESCRIPTION: &'static str = "Not takes exactly one operand";
  fn message(&self) -> String { format!("Not takes exactly one operand, got {}", self.count) }
}

/// A sequence without items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptySequence;
impl MalformedKind for EmptySequence {
  const DESCRIPTION: &'static str = "A sequence has no items";
}

/// A sequence that is not an item of a deconstructor or another sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MisplacedSequence;
impl MalformedKind for MisplacedSequence {
  const DESCRIPTION: &'static str =
    "Sequences may only appear among the items of a deconstructor or a sequence";
}

/// A condition that is not at the tail of the pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MisplacedCondition;
impl MalformedKind for MisplacedCondition {
  const DESCRIPTION: &'static str = "Conditions may only appear at the end of a pattern";
}

/// A keyed deconstructor without entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedArity;
impl MalformedKind for KeyedArity {
  const DESCRIPTION: &'static str = "A keyed deconstructor needs at least one entry";
}

/// The same key twice in a keyed deconstructor
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateKey {
  pub key: Value,
}
impl MalformedKind for DuplicateKey {
  const DESCRIPTION: &'static str = "A key occurs more than once in a keyed deconstructor";
  fn message(&self) -> String { format!("The key {} occurs more than once", self.key) }
}

/// A record field named by something other than a string or symbol
#[derive(Debug, Clone, PartialEq)]
pub struct BadFieldKey {
  pub key: Value,
}
impl MalformedKind for BadFieldKey {
  const DESCRIPTION: &'static str = "Record fields must be named by a string or a symbol";
  fn message(&self) -> String { format!("{} cannot name a record field", self.key) }
}

/// Any error this library can raise
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
  #[error("{0}")]
  Malformed(#[from] Malformed),
  /// No decomposer is registered under the name of a deconstructor
  #[error("No decomposer is registered for the shape {}", .0.as_str())]
  UnimplementedShape(Tok<String>),
  /// Every clause was tried and none matched
  #[error("No pattern matched {0}")]
  NoMatchingPattern(Value),
  #[error(transparent)]
  Regex(#[from] regex::Error),
  #[error(transparent)]
  Parse(#[from] ParseError),
}

impl Error {
  /// The malformed pattern error if this is one
  pub fn malformed(&self) -> Option<&Malformed> {
    match self {
      Self::Malformed(m) => Some(m),
      _ => None,
    }
  }
}
